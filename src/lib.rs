/*
 * Builds Win32 dialog templates in memory and runs them as modal dialogs,
 * without any resource script. A `DialogDescriptor` holds the dialog and its
 * `ControlDescriptor`s, serializes them into the binary DLGTEMPLATE layout the
 * dialog manager reads, and `ModalEngine` moves that layout through a movable
 * host allocation into the host's modal loop. `InputDialog` is a ready-made
 * single-line prompt built on top.
 *
 * Everything except `win32_host` is platform-agnostic. Templates can be
 * built, measured and inspected on any platform, and the modal flow is tested
 * against an in-process host; only the Windows build talks to the real dialog
 * manager.
 */
pub mod arena;
pub mod byte_writer;
pub mod control;
pub mod dialog;
pub mod dialogs;
pub mod error;
pub mod host;
pub mod modal;
#[cfg(test)]
mod test_host;
pub mod types;
#[cfg(target_os = "windows")]
pub mod win32_host;

pub use control::{ControlClass, ControlDescriptor};
pub use dialog::{DialogDescriptor, HOST_FAILURE};
pub use dialogs::{DialogOutcome, InputDialog, InputDialogOptions, InputState};
pub use error::{DialogError, Result as DialogResult};
pub use host::{DialogEvent, DialogHost, DialogProcedure, DialogWindow, HostMemory};
pub use modal::ModalEngine;
pub use types::{FontSpec, IDCANCEL, IDOK, WindowHandle, styles};
#[cfg(target_os = "windows")]
pub use win32_host::Win32Host;
