/*
 * The seam between the portable template/modal logic and the windowing host.
 * `HostMemory` supplies the movable, lockable allocation the template is built
 * in; `DialogHost` runs the modal loop over it. During the loop the host hands
 * each lifecycle event to a `DialogProcedure` together with a `DialogWindow`
 * through which the procedure reads and changes the live dialog.
 *
 * The procedure object is the per-invocation context. Hosts must deliver it
 * with every event of the dialog it was passed for, never through shared
 * process-wide state, so that nested modal calls stay independent.
 */

use crate::error::{DialogError, Result};
use crate::types::{FontSpec, WindowHandle};

use std::fmt;
use std::ptr::NonNull;

/// Platform error code (`GetLastError()` value on Windows).
pub type PlatformCode = u32;

/*
 * Movable, zero-initialised memory blocks.
 *
 * # Safety
 * Implementors guarantee that a pointer returned by `lock` addresses at least
 * the number of bytes requested from `allocate_movable_zeroed`, that those
 * bytes are writable and not aliased by the host until the matching `unlock`,
 * and that freshly allocated blocks read as zero.
 */
pub unsafe trait HostMemory {
    type Memory: Copy + fmt::Debug;

    fn allocate_movable_zeroed(
        &self,
        size: usize,
    ) -> std::result::Result<Self::Memory, PlatformCode>;
    fn lock(&self, memory: Self::Memory) -> std::result::Result<NonNull<u8>, PlatformCode>;
    fn unlock(&self, memory: Self::Memory);
    fn free(&self, memory: Self::Memory) -> std::result::Result<(), PlatformCode>;
}

pub trait DialogHost: HostMemory {
    /*
     * Creates a modal dialog from the template in `template` and pumps events
     * to `procedure` until the dialog ends. Returns the code passed to
     * `DialogWindow::end_dialog`, or the host's own failure sentinel when the
     * dialog could not be created.
     */
    fn run_modal(
        &self,
        template: Self::Memory,
        procedure: &mut dyn DialogProcedure,
        parent: Option<WindowHandle>,
    ) -> isize;

    /// Last platform error observed by the host on this thread.
    fn last_error(&self) -> PlatformCode;

    fn window_font(&self, _window: WindowHandle) -> Option<FontSpec> {
        None
    }

    fn active_window(&self) -> Option<WindowHandle> {
        None
    }
}

/// Operations on the live dialog, available while events are being handled.
pub trait DialogWindow {
    fn handle(&self) -> WindowHandle;
    fn set_item_text(&mut self, item: u16, text: &str) -> Result<()>;
    fn item_text(&self, item: u16) -> Result<String>;
    fn center_on_screen(&mut self) -> Result<()>;
    fn focus_item(&mut self, item: u16) -> Result<()>;
    fn end_dialog(&mut self, code: isize) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogEvent {
    /// The dialog and its controls exist but are not yet visible.
    Init,
    /// A control (or accelerator) issued a command.
    Command { id: u16, notification: u16 },
    /// The user asked to close the window.
    Close,
    Other { message: u32 },
}

pub trait DialogProcedure {
    /// Returns `true` when the event was handled.
    fn handle(&mut self, window: &mut dyn DialogWindow, event: DialogEvent) -> bool;
}

impl<F> DialogProcedure for F
where
    F: FnMut(&mut dyn DialogWindow, DialogEvent) -> bool,
{
    fn handle(&mut self, window: &mut dyn DialogWindow, event: DialogEvent) -> bool {
        self(window, event)
    }
}

/*
 * Reads a control's full text through injected length/copy primitives, so
 * text longer than any fixed buffer is never truncated.
 */
#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
pub(crate) fn read_window_text_with<FLen, FGet>(get_len: FLen, get_text: FGet) -> Result<String>
where
    FLen: Fn() -> i32,
    FGet: Fn(&mut [u16]) -> i32,
{
    let len = get_len();
    if len < 0 {
        return Err(DialogError::OperationFailed(
            "GetWindowTextLengthW returned negative length".into(),
        ));
    }

    let mut buffer = vec![0u16; len as usize + 1];
    let copied = get_text(&mut buffer);
    if copied < 0 {
        return Err(DialogError::OperationFailed(
            "GetWindowTextW returned negative length".into(),
        ));
    }

    buffer.truncate(copied as usize);
    Ok(String::from_utf16_lossy(&buffer))
}

/*
 * Names of the window messages a dialog procedure commonly sees, for
 * diagnostics.
 */
pub fn message_name(message: u32) -> &'static str {
    match message {
        0x0002 => "WM_DESTROY",
        0x0005 => "WM_SIZE",
        0x0006 => "WM_ACTIVATE",
        0x0007 => "WM_SETFOCUS",
        0x0008 => "WM_KILLFOCUS",
        0x000F => "WM_PAINT",
        0x0010 => "WM_CLOSE",
        0x0018 => "WM_SHOWWINDOW",
        0x0020 => "WM_SETCURSOR",
        0x0030 => "WM_SETFONT",
        0x0046 => "WM_WINDOWPOSCHANGING",
        0x0047 => "WM_WINDOWPOSCHANGED",
        0x0082 => "WM_NCDESTROY",
        0x0086 => "WM_NCACTIVATE",
        0x0110 => "WM_INITDIALOG",
        0x0111 => "WM_COMMAND",
        0x0112 => "WM_SYSCOMMAND",
        0x0133 => "WM_CTLCOLOREDIT",
        0x0136 => "WM_CTLCOLORDLG",
        0x0138 => "WM_CTLCOLORSTATIC",
        0x0200 => "WM_MOUSEMOVE",
        _ => "<unknown>",
    }
}
