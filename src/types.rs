/*
 * Platform-agnostic types shared by the template builder, the modal engine and
 * the host implementations. Style and identifier constants mirror the Win32
 * values so that templates can be built and inspected on any platform.
 */

use std::collections::HashSet;

/// Opaque native window handle (an `HWND` on Windows).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub isize);

impl WindowHandle {
    pub fn raw(self) -> isize {
        self.0
    }
}

/// Point size the dialog manager treats as "no font".
pub const FONT_SIZE_SENTINEL: u16 = u16::MAX;
pub const DEFAULT_FONT_FACE: &str = "Segoe UI";
pub const DEFAULT_FONT_POINT_SIZE: u16 = 9;

/// Typeface and point size written into the template when `DS_SETFONT` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontSpec {
    pub face: String,
    pub point_size: u16,
}

impl FontSpec {
    pub fn new(face: impl Into<String>, point_size: u16) -> Self {
        Self {
            face: face.into(),
            point_size,
        }
    }

    /// A font is only announced in the template when both parts are meaningful.
    pub fn is_usable(&self) -> bool {
        !self.face.is_empty() && self.point_size != FONT_SIZE_SENTINEL
    }
}

impl Default for FontSpec {
    fn default() -> Self {
        Self::new(DEFAULT_FONT_FACE, DEFAULT_FONT_POINT_SIZE)
    }
}

// Dialog-manager result identifiers.
pub const IDOK: u16 = 1;
pub const IDCANCEL: u16 = 2;

// Common style constants. Values match the Win32 headers.
pub mod styles {
    pub const WS_POPUP: u32 = 0x8000_0000;
    pub const WS_CHILD: u32 = 0x4000_0000;
    pub const WS_VISIBLE: u32 = 0x1000_0000;
    pub const WS_CAPTION: u32 = 0x00C0_0000;
    pub const WS_BORDER: u32 = 0x0080_0000;
    pub const WS_SYSMENU: u32 = 0x0008_0000;
    pub const WS_TABSTOP: u32 = 0x0001_0000;

    pub const DS_SETFONT: u32 = 0x0000_0040;
    pub const DS_MODALFRAME: u32 = 0x0000_0080;

    pub const WS_EX_DLGMODALFRAME: u32 = 0x0000_0001;

    pub const SS_LEFT: u32 = 0x0000_0000;
    pub const ES_LEFT: u32 = 0x0000_0000;
    pub const ES_AUTOHSCROLL: u32 = 0x0000_0080;
    pub const ES_NUMBER: u32 = 0x0000_2000;
    pub const BS_PUSHBUTTON: u32 = 0x0000_0000;
    pub const BS_DEFPUSHBUTTON: u32 = 0x0000_0001;
    pub const BS_FLAT: u32 = 0x0000_8000;
    // Shares its bit with SS_ENDELLIPSIS on static controls.
    pub const BF_FLAT: u32 = 0x0000_4000;
}

/*
 * Walks a window's parent chain up to the top-level window. The chain is
 * followed iteratively and stops if a handle repeats, so a malformed owner graph
 * cannot loop forever. Returns `None` only when `start` itself is not a window.
 */
pub fn root_window<F, V>(
    start: WindowHandle,
    is_window: V,
    mut parent_of: F,
) -> Option<WindowHandle>
where
    F: FnMut(WindowHandle) -> Option<WindowHandle>,
    V: Fn(WindowHandle) -> bool,
{
    if !is_window(start) {
        return None;
    }

    let mut visited = HashSet::new();
    let mut current = start;
    visited.insert(current);
    while let Some(parent) = parent_of(current) {
        if !is_window(parent) {
            break;
        }
        if !visited.insert(parent) {
            log::warn!("root_window: parent chain of {start:?} cycles at {parent:?}");
            break;
        }
        current = parent;
    }
    Some(current)
}

/// Top-left position that centres a `width` x `height` window on the screen.
pub fn centered_origin(screen: (i32, i32), width: i32, height: i32) -> (i32, i32) {
    ((screen.0 - width) / 2, (screen.1 - height) / 2)
}

/*
 * Converts a logical font height (as stored in LOGFONT) into points for the
 * given vertical DPI, rounding like `MulDiv(-height, 72, dpi)`.
 */
pub fn font_height_to_points(height: i32, dpi_y: i32) -> Option<u16> {
    if dpi_y <= 0 {
        return None;
    }
    let numerator = -(height as i64) * 72;
    let half = (dpi_y as i64) / 2;
    let rounded = if numerator >= 0 {
        (numerator + half) / dpi_y as i64
    } else {
        (numerator - half) / dpi_y as i64
    };
    u16::try_from(rounded).ok().filter(|points| *points > 0)
}
