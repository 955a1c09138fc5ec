/*
 * Win32 implementation of the dialog host. Template memory comes from
 * `GlobalAlloc(GMEM_MOVEABLE | GMEM_ZEROINIT)`, the run-loop is
 * `DialogBoxIndirectParamW`, and events reach the caller's procedure through
 * `dialog_proc_router`.
 *
 * The procedure travels as the `WM_INITDIALOG` init parameter and is then
 * stored in the dialog's own `GWLP_USERDATA`, mirroring how the main window
 * procedure keeps its creation context. There is no process-wide slot, so a
 * dialog opened from inside another dialog's procedure resolves its own
 * context. Messages that arrive before `WM_INITDIALOG` carry no context and are
 * left to the dialog manager.
 */

use crate::error::{DialogError, Result as DialogResult};
use crate::host::{
    DialogEvent, DialogHost, DialogProcedure, DialogWindow, HostMemory, PlatformCode,
    message_name, read_window_text_with,
};
use crate::types::{FontSpec, WindowHandle, centered_origin, font_height_to_points, root_window};

use windows::Win32::{
    Foundation::{GetLastError, GlobalFree, HGLOBAL, HINSTANCE, HWND, LPARAM, RECT, WPARAM},
    Graphics::Gdi::{GetDC, GetDeviceCaps, GetObjectW, HGDIOBJ, LOGFONTW, LOGPIXELSY, ReleaseDC},
    System::LibraryLoader::GetModuleHandleW,
    System::Memory::{GMEM_MOVEABLE, GMEM_ZEROINIT, GlobalAlloc, GlobalLock, GlobalUnlock},
    UI::Input::KeyboardAndMouse::{GetActiveWindow, SetFocus},
    UI::WindowsAndMessaging::{
        DLGTEMPLATE, DialogBoxIndirectParamW, EndDialog, GWLP_USERDATA, GetDlgItem, GetParent,
        GetSystemMetrics, GetWindowLongPtrW, GetWindowRect, GetWindowTextLengthW, GetWindowTextW,
        IsWindow, SM_CXSCREEN, SM_CYSCREEN, SWP_NOSIZE, SWP_NOZORDER, SendMessageW,
        SetWindowLongPtrW, SetWindowPos, SetWindowTextW, WM_CLOSE, WM_COMMAND, WM_GETFONT,
        WM_INITDIALOG, WM_NCDESTROY,
    },
};
use windows::core::HSTRING;

use std::cell::Cell;
use std::ffi::c_void;
use std::ptr::NonNull;

fn hwnd_of(window: WindowHandle) -> HWND {
    HWND(window.raw() as *mut c_void)
}

fn handle_of(hwnd: HWND) -> WindowHandle {
    WindowHandle(hwnd.0 as isize)
}

fn last_error_code() -> PlatformCode {
    unsafe { GetLastError() }.0
}

#[inline]
fn loword_from_wparam(wparam: WPARAM) -> u16 {
    (wparam.0 & 0xFFFF) as u16
}

#[inline]
fn hiword_from_wparam(wparam: WPARAM) -> u16 {
    ((wparam.0 >> 16) & 0xFFFF) as u16
}

/// Dialog host backed by the Win32 dialog manager of the calling thread.
#[derive(Debug, Default)]
pub struct Win32Host {
    _not_send: std::marker::PhantomData<*const ()>,
}

impl Win32Host {
    pub fn new() -> Self {
        Self::default()
    }

    /// Top-level window that `window` belongs to, following parents.
    pub fn main_window(&self, window: WindowHandle) -> Option<WindowHandle> {
        root_window(
            window,
            |w| unsafe { IsWindow(Some(hwnd_of(w))) }.as_bool(),
            |w| unsafe { GetParent(hwnd_of(w)) }.ok().map(handle_of),
        )
    }
}

// SAFETY: GlobalLock on a GMEM_MOVEABLE block returns a pointer to the whole
// block (at least the requested size, zeroed by GMEM_ZEROINIT) that stays valid
// until the lock count drops back to zero.
unsafe impl HostMemory for Win32Host {
    type Memory = HGLOBAL;

    fn allocate_movable_zeroed(&self, size: usize) -> Result<HGLOBAL, PlatformCode> {
        unsafe { GlobalAlloc(GMEM_MOVEABLE | GMEM_ZEROINIT, size) }.map_err(|err| {
            log::error!("Win32Host: GlobalAlloc({size}) failed: {err:?}");
            last_error_code()
        })
    }

    fn lock(&self, memory: HGLOBAL) -> Result<NonNull<u8>, PlatformCode> {
        let ptr = unsafe { GlobalLock(memory) } as *mut u8;
        NonNull::new(ptr).ok_or_else(|| {
            let code = last_error_code();
            log::error!("Win32Host: GlobalLock({memory:?}) failed: {code:#x}");
            code
        })
    }

    fn unlock(&self, memory: HGLOBAL) {
        // GlobalUnlock reports "failure" with NO_ERROR once the lock count
        // reaches zero, which is the normal case here.
        let _ = unsafe { GlobalUnlock(memory) };
    }

    fn free(&self, memory: HGLOBAL) -> Result<(), PlatformCode> {
        match unsafe { GlobalFree(Some(memory)) } {
            Ok(_) => Ok(()),
            Err(err) => {
                log::error!("Win32Host: GlobalFree({memory:?}) failed: {err:?}");
                Err(last_error_code())
            }
        }
    }
}

impl DialogHost for Win32Host {
    fn run_modal(
        &self,
        template: HGLOBAL,
        procedure: &mut dyn DialogProcedure,
        parent: Option<WindowHandle>,
    ) -> isize {
        let h_instance = match unsafe { GetModuleHandleW(None) } {
            Ok(module) => HINSTANCE(module.0),
            Err(err) => {
                log::error!("Win32Host: GetModuleHandleW failed: {err:?}");
                return -1;
            }
        };

        // The dialog manager reads the template through a plain pointer, so the
        // block is pinned (read-only) for the lifetime of the dialog.
        let template_ptr = unsafe { GlobalLock(template) } as *const DLGTEMPLATE;
        if template_ptr.is_null() {
            log::error!(
                "Win32Host: could not pin template {template:?}: {:#x}",
                last_error_code()
            );
            return -1;
        }

        let mut context = ModalContext {
            procedure,
            dispatching: Cell::new(false),
        };
        let result = unsafe {
            DialogBoxIndirectParamW(
                Some(h_instance),
                template_ptr,
                parent.map(hwnd_of),
                Some(dialog_proc_router),
                LPARAM(&mut context as *mut ModalContext<'_> as isize),
            )
        };
        if result == -1 {
            log::error!(
                "Win32Host: DialogBoxIndirectParamW failed: {:#x}",
                last_error_code()
            );
        }

        let _ = unsafe { GlobalUnlock(template) };
        result
    }

    fn last_error(&self) -> PlatformCode {
        last_error_code()
    }

    fn window_font(&self, window: WindowHandle) -> Option<FontSpec> {
        let hwnd = hwnd_of(window);
        if !unsafe { IsWindow(Some(hwnd)) }.as_bool() {
            return None;
        }

        let font = unsafe { SendMessageW(hwnd, WM_GETFONT, None, None) };
        if font.0 == 0 {
            return None;
        }
        let mut logfont = LOGFONTW::default();
        let copied = unsafe {
            GetObjectW(
                HGDIOBJ(font.0 as *mut c_void),
                std::mem::size_of::<LOGFONTW>() as i32,
                Some(&mut logfont as *mut LOGFONTW as *mut c_void),
            )
        };
        if copied == 0 {
            log::warn!("Win32Host: GetObjectW failed for font of {hwnd:?}");
            return None;
        }

        let hdc = unsafe { GetDC(Some(hwnd)) };
        let dpi_y = unsafe { GetDeviceCaps(Some(hdc), LOGPIXELSY) };
        unsafe { ReleaseDC(Some(hwnd), hdc) };

        let face_len = logfont
            .lfFaceName
            .iter()
            .position(|c| *c == 0)
            .unwrap_or(logfont.lfFaceName.len());
        let face = String::from_utf16_lossy(&logfont.lfFaceName[..face_len]);
        let point_size = font_height_to_points(logfont.lfHeight, dpi_y)?;
        Some(FontSpec::new(face, point_size))
    }

    fn active_window(&self) -> Option<WindowHandle> {
        let hwnd = unsafe { GetActiveWindow() };
        (!hwnd.is_invalid()).then(|| handle_of(hwnd))
    }
}

struct ModalContext<'a> {
    procedure: *mut (dyn DialogProcedure + 'a),
    // Set while the procedure runs. Messages the procedure itself causes to be
    // sent back to the dialog (EN_SETFOCUS from SetFocus, for example) are not
    // dispatched re-entrantly.
    dispatching: Cell<bool>,
}

unsafe extern "system" fn dialog_proc_router(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> isize {
    let context_ptr = if msg == WM_INITDIALOG {
        let raw = lparam.0 as *const ModalContext<'static>;
        unsafe { SetWindowLongPtrW(hwnd, GWLP_USERDATA, raw as isize) };
        raw
    } else {
        unsafe { GetWindowLongPtrW(hwnd, GWLP_USERDATA) as *const ModalContext<'static> }
    };

    if context_ptr.is_null() {
        return 0;
    }
    // SAFETY: the pointer was installed from `run_modal`'s stack frame, which
    // outlives the dialog because DialogBoxIndirectParamW blocks until the
    // dialog is destroyed. It is cleared again on WM_NCDESTROY.
    let context = unsafe { &*context_ptr };

    let event = match msg {
        WM_INITDIALOG => DialogEvent::Init,
        WM_COMMAND => DialogEvent::Command {
            id: loword_from_wparam(wparam),
            notification: hiword_from_wparam(wparam),
        },
        WM_CLOSE => DialogEvent::Close,
        other => DialogEvent::Other { message: other },
    };

    let handled = if context.dispatching.replace(true) {
        log::trace!(
            "Win32Host: {} ({msg:#06x}) for {hwnd:?} arrived during dispatch, skipped",
            message_name(msg)
        );
        false
    } else {
        log::trace!("Win32Host: {} ({msg:#06x}) for {hwnd:?}", message_name(msg));
        let mut window = Win32DialogWindow { hwnd };
        // SAFETY: `dispatching` guarantees this is the only live reference to
        // the procedure; nested dialogs have their own context.
        let procedure = unsafe { &mut *context.procedure };
        let handled = procedure.handle(&mut window, event);
        context.dispatching.set(false);
        handled
    };

    if msg == WM_NCDESTROY {
        unsafe { SetWindowLongPtrW(hwnd, GWLP_USERDATA, 0) };
    }

    match event {
        // Returning FALSE from WM_INITDIALOG keeps the focus the procedure set.
        DialogEvent::Init => isize::from(!handled),
        _ => isize::from(handled),
    }
}

struct Win32DialogWindow {
    hwnd: HWND,
}

impl Win32DialogWindow {
    fn item(&self, item: u16) -> DialogResult<HWND> {
        unsafe { GetDlgItem(Some(self.hwnd), item as i32) }.map_err(|err| {
            DialogError::InvalidHandle(format!(
                "dialog item {item:#x} of {:?} not found: {err}",
                self.hwnd
            ))
        })
    }
}

impl DialogWindow for Win32DialogWindow {
    fn handle(&self) -> WindowHandle {
        handle_of(self.hwnd)
    }

    fn set_item_text(&mut self, item: u16, text: &str) -> DialogResult<()> {
        let hwnd_item = self.item(item)?;
        unsafe { SetWindowTextW(hwnd_item, &HSTRING::from(text))? };
        Ok(())
    }

    fn item_text(&self, item: u16) -> DialogResult<String> {
        let hwnd_item = self.item(item)?;
        read_window_text_with(
            || unsafe { GetWindowTextLengthW(hwnd_item) },
            |buf| unsafe { GetWindowTextW(hwnd_item, buf) },
        )
    }

    fn center_on_screen(&mut self) -> DialogResult<()> {
        let mut rect = RECT::default();
        unsafe { GetWindowRect(self.hwnd, &mut rect)? };
        let screen = unsafe { (GetSystemMetrics(SM_CXSCREEN), GetSystemMetrics(SM_CYSCREEN)) };
        let (x, y) = centered_origin(screen, rect.right - rect.left, rect.bottom - rect.top);
        unsafe { SetWindowPos(self.hwnd, None, x, y, 0, 0, SWP_NOZORDER | SWP_NOSIZE)? };
        Ok(())
    }

    fn focus_item(&mut self, item: u16) -> DialogResult<()> {
        let hwnd_item = self.item(item)?;
        unsafe { SetFocus(Some(hwnd_item))? };
        Ok(())
    }

    fn end_dialog(&mut self, code: isize) -> DialogResult<()> {
        if self.hwnd.is_invalid() {
            return Err(DialogError::InvalidHandle(format!(
                "cannot end dialog {:?}",
                self.hwnd
            )));
        }
        unsafe { EndDialog(self.hwnd, code)? };
        Ok(())
    }
}
