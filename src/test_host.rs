/*
 * In-process host used by the unit tests. Memory blocks live on the heap and
 * are tracked so tests can check lock state and release counts. Each
 * `run_modal` parses the submitted template, builds a fake dialog from its
 * controls and replays the next queued script of typed text and events
 * through the procedure, the same way the dialog manager would deliver them.
 */

use crate::error::{DialogError, Result};
use crate::host::{DialogEvent, DialogHost, DialogProcedure, DialogWindow, HostMemory, PlatformCode};
use crate::types::{FontSpec, WindowHandle};

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};
use std::ptr::NonNull;

const ERROR_INVALID_HANDLE: u32 = 6;
const ERROR_NOT_LOCKED: u32 = 158;

#[derive(Debug, Clone)]
pub(crate) enum Step {
    /// Replace the text of a control, as if the user typed it.
    Type { item: u16, text: String },
    Event(DialogEvent),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParsedControl {
    pub offset: usize,
    pub style: u32,
    pub extended_style: u32,
    pub x: i16,
    pub y: i16,
    pub cx: i16,
    pub cy: i16,
    pub id: u16,
    pub class_atom: Option<u16>,
    pub class_name: Option<String>,
    pub caption: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParsedTemplate {
    pub style: u32,
    pub extended_style: u32,
    pub item_count: u16,
    pub cx: i16,
    pub cy: i16,
    pub caption: String,
    pub font: Option<(String, u16)>,
    pub controls: Vec<ParsedControl>,
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Reader<'_> {
    fn u16(&mut self) -> u16 {
        let v = u16::from_le_bytes([self.bytes[self.pos], self.bytes[self.pos + 1]]);
        self.pos += 2;
        v
    }

    fn i16(&mut self) -> i16 {
        self.u16() as i16
    }

    fn u32(&mut self) -> u32 {
        let lo = self.u16() as u32;
        let hi = self.u16() as u32;
        lo | (hi << 16)
    }

    fn string(&mut self) -> String {
        let mut units = Vec::new();
        loop {
            let unit = self.u16();
            if unit == 0 {
                break;
            }
            units.push(unit);
        }
        String::from_utf16_lossy(&units)
    }

    fn align4(&mut self) {
        self.pos = (self.pos + 3) & !3;
    }
}

/// Decodes a template the way the dialog manager reads it. Panics on
/// malformed input, including trailing bytes.
pub(crate) fn parse_template(bytes: &[u8]) -> ParsedTemplate {
    let mut r = Reader { bytes, pos: 0 };
    let style = r.u32();
    let extended_style = r.u32();
    let item_count = r.u16();
    let _x = r.i16();
    let _y = r.i16();
    let cx = r.i16();
    let cy = r.i16();
    assert_eq!(r.u16(), 0, "menu must be empty");
    assert_eq!(r.u16(), 0, "class must be the default dialog class");
    let caption = r.string();
    let font = if style & crate::types::styles::DS_SETFONT != 0 {
        let size = r.u16();
        Some((r.string(), size))
    } else {
        None
    };

    let mut controls = Vec::new();
    for _ in 0..item_count {
        r.align4();
        let offset = r.pos;
        let style = r.u32();
        let extended_style = r.u32();
        let x = r.i16();
        let y = r.i16();
        let cx_c = r.i16();
        let cy_c = r.i16();
        let id = r.u16();
        let (class_atom, class_name) = if r.bytes[r.pos..r.pos + 2] == [0xFF, 0xFF] {
            r.pos += 2;
            (Some(r.u16()), None)
        } else {
            (None, Some(r.string()))
        };
        let caption = r.string();
        assert_eq!(r.u16(), 0, "creation data must be empty");
        controls.push(ParsedControl {
            offset,
            style,
            extended_style,
            x,
            y,
            cx: cx_c,
            cy: cy_c,
            id,
            class_atom,
            class_name,
            caption,
        });
    }
    assert_eq!(r.pos, bytes.len(), "trailing bytes after template");

    ParsedTemplate {
        style,
        extended_style,
        item_count,
        cx,
        cy,
        caption,
        font,
        controls,
    }
}

/// State of a fake dialog when its run ended.
#[derive(Debug, Clone)]
pub(crate) struct WindowRecord {
    pub handle: WindowHandle,
    pub parent: Option<WindowHandle>,
    pub template: ParsedTemplate,
    pub items: HashMap<u16, String>,
    pub focused: Option<u16>,
    pub centered: bool,
    pub ended: Option<isize>,
}

impl DialogWindow for WindowRecord {
    fn handle(&self) -> WindowHandle {
        self.handle
    }

    fn set_item_text(&mut self, item: u16, text: &str) -> Result<()> {
        let slot = self.items.get_mut(&item).ok_or_else(|| {
            DialogError::InvalidHandle(format!("no item {item:#x} in {:?}", self.handle))
        })?;
        *slot = text.to_owned();
        Ok(())
    }

    fn item_text(&self, item: u16) -> Result<String> {
        self.items.get(&item).cloned().ok_or_else(|| {
            DialogError::InvalidHandle(format!("no item {item:#x} in {:?}", self.handle))
        })
    }

    fn center_on_screen(&mut self) -> Result<()> {
        self.centered = true;
        Ok(())
    }

    fn focus_item(&mut self, item: u16) -> Result<()> {
        if !self.items.contains_key(&item) {
            return Err(DialogError::InvalidHandle(format!("no item {item:#x}")));
        }
        self.focused = Some(item);
        Ok(())
    }

    fn end_dialog(&mut self, code: isize) -> Result<()> {
        self.ended = Some(code);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct ScriptedHost {
    blocks: RefCell<HashMap<usize, Box<[u8]>>>,
    locked: RefCell<HashSet<usize>>,
    next_block: Cell<usize>,
    allocation_sizes: RefCell<Vec<usize>>,
    frees: Cell<usize>,
    fail_allocation: Cell<Option<u32>>,
    fail_lock: Cell<Option<u32>>,
    refuse_dialogs: Cell<Option<u32>>,
    last_error: Cell<u32>,
    scripts: RefCell<VecDeque<Vec<Step>>>,
    templates_seen: RefCell<Vec<Vec<u8>>>,
    locked_during_run: RefCell<Vec<bool>>,
    windows_created: Cell<usize>,
    finished: RefCell<Vec<WindowRecord>>,
    fonts: RefCell<HashMap<WindowHandle, FontSpec>>,
    active_window: Cell<Option<WindowHandle>>,
}

impl ScriptedHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_script(&self, steps: Vec<Step>) {
        self.scripts.borrow_mut().push_back(steps);
    }

    pub fn fail_allocation_with(&self, code: u32) {
        self.fail_allocation.set(Some(code));
    }

    pub fn fail_lock_with(&self, code: u32) {
        self.fail_lock.set(Some(code));
    }

    pub fn refuse_dialogs_with(&self, code: u32) {
        self.refuse_dialogs.set(Some(code));
    }

    pub fn clear_failures(&self) {
        self.fail_allocation.set(None);
        self.fail_lock.set(None);
        self.refuse_dialogs.set(None);
    }

    pub fn set_window_font(&self, window: WindowHandle, font: FontSpec) {
        self.fonts.borrow_mut().insert(window, font);
    }

    pub fn set_active_window(&self, window: Option<WindowHandle>) {
        self.active_window.set(window);
    }

    pub fn is_locked(&self, block: usize) -> bool {
        self.locked.borrow().contains(&block)
    }

    pub fn contents(&self, block: usize) -> Vec<u8> {
        self.blocks.borrow()[&block].to_vec()
    }

    pub fn live_allocations(&self) -> usize {
        self.blocks.borrow().len()
    }

    pub fn allocation_sizes(&self) -> Vec<usize> {
        self.allocation_sizes.borrow().clone()
    }

    pub fn frees(&self) -> usize {
        self.frees.get()
    }

    pub fn windows_created(&self) -> usize {
        self.windows_created.get()
    }

    pub fn templates_seen(&self) -> Vec<Vec<u8>> {
        self.templates_seen.borrow().clone()
    }

    pub fn locked_during_run(&self) -> Vec<bool> {
        self.locked_during_run.borrow().clone()
    }

    /// Dialogs in the order they ended.
    pub fn finished_windows(&self) -> Vec<WindowRecord> {
        self.finished.borrow().clone()
    }
}

// SAFETY: blocks are boxed slices of exactly the requested size that are only
// freed by `free`; a locked pointer addresses the box's heap storage, which
// does not move when the map rehashes.
unsafe impl HostMemory for ScriptedHost {
    type Memory = usize;

    fn allocate_movable_zeroed(&self, size: usize) -> std::result::Result<usize, PlatformCode> {
        if let Some(code) = self.fail_allocation.get() {
            self.last_error.set(code);
            return Err(code);
        }
        let block = self.next_block.get() + 1;
        self.next_block.set(block);
        self.blocks
            .borrow_mut()
            .insert(block, vec![0u8; size].into_boxed_slice());
        self.allocation_sizes.borrow_mut().push(size);
        Ok(block)
    }

    fn lock(&self, block: usize) -> std::result::Result<NonNull<u8>, PlatformCode> {
        if let Some(code) = self.fail_lock.get() {
            self.last_error.set(code);
            return Err(code);
        }
        let mut blocks = self.blocks.borrow_mut();
        let storage = blocks.get_mut(&block).ok_or(ERROR_INVALID_HANDLE)?;
        if !self.locked.borrow_mut().insert(block) {
            return Err(ERROR_NOT_LOCKED);
        }
        NonNull::new(storage.as_mut_ptr()).ok_or(ERROR_INVALID_HANDLE)
    }

    fn unlock(&self, block: usize) {
        self.locked.borrow_mut().remove(&block);
    }

    fn free(&self, block: usize) -> std::result::Result<(), PlatformCode> {
        self.locked.borrow_mut().remove(&block);
        match self.blocks.borrow_mut().remove(&block) {
            Some(_) => {
                self.frees.set(self.frees.get() + 1);
                Ok(())
            }
            None => Err(ERROR_INVALID_HANDLE),
        }
    }
}

impl DialogHost for ScriptedHost {
    fn run_modal(
        &self,
        template: usize,
        procedure: &mut dyn DialogProcedure,
        parent: Option<WindowHandle>,
    ) -> isize {
        if let Some(code) = self.refuse_dialogs.get() {
            self.last_error.set(code);
            return -1;
        }

        self.locked_during_run.borrow_mut().push(self.is_locked(template));
        let bytes = self.contents(template);
        let parsed = parse_template(&bytes);
        self.templates_seen.borrow_mut().push(bytes);
        let script = self.scripts.borrow_mut().pop_front().unwrap_or_default();

        let created = self.windows_created.get() + 1;
        self.windows_created.set(created);
        let mut window = WindowRecord {
            handle: WindowHandle(0x1000 + created as isize),
            parent,
            items: parsed
                .controls
                .iter()
                .map(|c| (c.id, c.caption.clone()))
                .collect(),
            template: parsed,
            focused: None,
            centered: false,
            ended: None,
        };

        // No host borrows are held while the procedure runs; it may start a
        // nested modal loop on this host.
        procedure.handle(&mut window, DialogEvent::Init);
        for step in script {
            if window.ended.is_some() {
                break;
            }
            match step {
                Step::Type { item, text } => {
                    window.items.insert(item, text);
                }
                Step::Event(event) => {
                    procedure.handle(&mut window, event);
                }
            }
        }

        let Some(code) = window.ended else {
            panic!("script ran out before dialog {:?} ended", window.handle);
        };
        self.finished.borrow_mut().push(window);
        code
    }

    fn last_error(&self) -> PlatformCode {
        self.last_error.get()
    }

    fn window_font(&self, window: WindowHandle) -> Option<FontSpec> {
        self.fonts.borrow().get(&window).cloned()
    }

    fn active_window(&self) -> Option<WindowHandle> {
        self.active_window.get()
    }
}
