/*
 * Ready-made dialogs assembled from in-memory templates.
 */
pub mod input_dialog;

pub use input_dialog::{DialogOutcome, InputDialog, InputDialogOptions, InputState};
