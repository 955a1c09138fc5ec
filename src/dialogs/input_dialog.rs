/*
 * A prompt dialog built entirely in memory: a label, a single-line edit field
 * and OK/Cancel buttons. The dialog procedure is a small state machine,
 *
 *   Initializing --Init--> AwaitingInput --OK--> Closed(Accepted)
 *                                        --Cancel/Close--> Closed(Cancelled)
 *
 * and every other event leaves the state untouched. The entered text is only
 * kept when the user accepts.
 */

use crate::control::{ControlClass, ControlDescriptor};
use crate::dialog::DialogDescriptor;
use crate::host::{DialogEvent, DialogHost, DialogProcedure, DialogWindow};
use crate::types::{IDCANCEL, IDOK, WindowHandle, styles};

pub const IDC_LABEL: u16 = 0x1001;
pub const IDC_INPUT: u16 = 0x1002;

const DEFAULT_CAPTION: &str = "Input Dialog";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDialogOptions {
    pub caption: String,
    pub prompt: String,
    /// Restricts the edit field to digits (`ES_NUMBER`).
    pub number_only: bool,
    pub parent: Option<WindowHandle>,
}

impl Default for InputDialogOptions {
    fn default() -> Self {
        Self {
            caption: DEFAULT_CAPTION.to_string(),
            prompt: String::new(),
            number_only: false,
            parent: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogOutcome {
    Accepted,
    Cancelled,
}

impl DialogOutcome {
    pub fn code(self) -> isize {
        match self {
            Self::Accepted => IDOK as isize,
            Self::Cancelled => IDCANCEL as isize,
        }
    }

    pub fn from_code(code: isize) -> Option<Self> {
        match code {
            c if c == IDOK as isize => Some(Self::Accepted),
            c if c == IDCANCEL as isize => Some(Self::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputState {
    Initializing,
    AwaitingInput,
    Closed(DialogOutcome),
}

#[derive(Debug)]
struct InputSession {
    prompt: String,
    input: Option<String>,
    state: InputState,
}

impl InputSession {
    fn reset(&mut self) {
        self.input = None;
        self.state = InputState::Initializing;
    }

    fn on_init(&mut self, window: &mut dyn DialogWindow) {
        if let Err(err) = window.set_item_text(IDC_LABEL, &self.prompt) {
            log::warn!("InputDialog: could not set prompt: {err}");
        }
        if let Err(err) = window.center_on_screen() {
            log::warn!("InputDialog: could not center {:?}: {err}", window.handle());
        }
        if let Err(err) = window.focus_item(IDC_INPUT) {
            log::warn!("InputDialog: could not focus input field: {err}");
        }
        self.state = InputState::AwaitingInput;
        log::debug!("InputDialog: {:?} awaiting input", window.handle());
    }

    fn accept(&mut self, window: &mut dyn DialogWindow) -> bool {
        let text = match window.item_text(IDC_INPUT) {
            Ok(text) => text,
            Err(err) => {
                log::error!("InputDialog: could not read input field: {err}");
                return false;
            }
        };
        self.close(window, DialogOutcome::Accepted, Some(text))
    }

    fn close(
        &mut self,
        window: &mut dyn DialogWindow,
        outcome: DialogOutcome,
        input: Option<String>,
    ) -> bool {
        if let Err(err) = window.end_dialog(outcome.code()) {
            log::error!("InputDialog: could not end {:?}: {err}", window.handle());
            return false;
        }
        self.input = input;
        self.state = InputState::Closed(outcome);
        log::debug!("InputDialog: {:?} closed as {outcome:?}", window.handle());
        true
    }
}

impl DialogProcedure for InputSession {
    fn handle(&mut self, window: &mut dyn DialogWindow, event: DialogEvent) -> bool {
        match (self.state, event) {
            (InputState::Initializing, DialogEvent::Init) => {
                self.on_init(window);
                true
            }
            (InputState::AwaitingInput, DialogEvent::Command { id: IDOK, .. }) => {
                self.accept(window)
            }
            (InputState::AwaitingInput, DialogEvent::Command { id: IDCANCEL, .. })
            | (InputState::AwaitingInput, DialogEvent::Close) => {
                self.close(window, DialogOutcome::Cancelled, None)
            }
            (state, event) => {
                log::trace!("InputDialog: ignoring {event:?} in {state:?}");
                false
            }
        }
    }
}

#[derive(Debug)]
pub struct InputDialog {
    descriptor: DialogDescriptor,
    session: InputSession,
}

impl InputDialog {
    pub fn new(prompt: &str, parent: Option<WindowHandle>) -> Self {
        Self::with_options(InputDialogOptions {
            prompt: prompt.to_string(),
            parent,
            ..Default::default()
        })
    }

    pub fn with_options(options: InputDialogOptions) -> Self {
        let mut descriptor = DialogDescriptor::new(
            &options.caption,
            styles::DS_MODALFRAME | styles::WS_POPUP | styles::WS_CAPTION | styles::WS_SYSMENU,
            styles::WS_EX_DLGMODALFRAME,
            0,
            0,
            179,
            60,
            options.parent,
        );

        let child = styles::WS_CHILD | styles::WS_VISIBLE;
        let number = if options.number_only {
            styles::ES_NUMBER
        } else {
            0
        };
        descriptor.add(ControlDescriptor::new(
            "Label",
            ControlClass::Static,
            IDC_LABEL,
            7,
            5,
            165,
            8,
            child | styles::SS_LEFT | styles::BF_FLAT,
            0,
        ));
        descriptor.add(ControlDescriptor::new(
            "",
            ControlClass::Edit,
            IDC_INPUT,
            7,
            18,
            165,
            14,
            child | styles::ES_LEFT | styles::WS_BORDER | number,
            0,
        ));
        descriptor.add(ControlDescriptor::new(
            "OK",
            ControlClass::Button,
            IDOK,
            66,
            39,
            50,
            14,
            child | styles::BS_PUSHBUTTON | styles::BS_FLAT,
            0,
        ));
        descriptor.add(ControlDescriptor::new(
            "Cancel",
            ControlClass::Button,
            IDCANCEL,
            121,
            39,
            50,
            14,
            child | styles::BS_PUSHBUTTON | styles::BS_FLAT,
            0,
        ));

        Self {
            descriptor,
            session: InputSession {
                prompt: options.prompt,
                input: None,
                state: InputState::Initializing,
            },
        }
    }

    pub fn prompt(&self) -> &str {
        &self.session.prompt
    }

    pub fn set_prompt(&mut self, prompt: &str) {
        self.session.prompt = prompt.to_string();
    }

    /// Text entered by the user, present only after an accepted run.
    pub fn input(&self) -> Option<&str> {
        self.session.input.as_deref()
    }

    pub fn state(&self) -> InputState {
        self.session.state
    }

    pub fn descriptor(&self) -> &DialogDescriptor {
        &self.descriptor
    }

    /*
     * Shows the dialog and blocks until it is dismissed. Returns `IDOK` or
     * `IDCANCEL`, or -1 when the dialog could not be shown (see
     * `descriptor().last_error()`).
     */
    pub fn do_modal<H: DialogHost + ?Sized>(&mut self, host: &H) -> isize {
        self.session.reset();
        self.descriptor.inherit_parent_font(host);
        self.descriptor.do_modal(host, &mut self.session)
    }
}
