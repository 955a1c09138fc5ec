/*
 * Dialog-level record of an in-memory template plus the ordered list of its
 * controls. Insertion order is serialisation order, which the dialog manager
 * turns into tab order and z-order. The item count in the header is always the
 * length of that list; `add` is the only way to change it.
 *
 * Whether the header carries font fields is derived from the font itself:
 * `DS_SETFONT` is forced on when a usable font is present and forced off
 * otherwise, so the header never promises bytes that are not written.
 */

use crate::byte_writer::{ByteWriter, Record, utf16};
use crate::control::ControlDescriptor;
use crate::error::{DialogError, Result};
use crate::host::{DialogHost, DialogProcedure};
use crate::modal::ModalEngine;
use crate::types::{FontSpec, WindowHandle, styles::DS_SETFONT};

/// Result of a modal run that never showed a dialog.
pub const HOST_FAILURE: isize = -1;

/// Geometry, styles and item count of a dialog (`DLGTEMPLATE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialogShape {
    pub x: i16,
    pub y: i16,
    pub cx: i16,
    pub cy: i16,
    pub style: u32,
    pub extended_style: u32,
    pub item_count: u16,
}

impl Record for DialogShape {
    const SIZE: usize = 18;

    fn write_fields(&self, writer: &mut ByteWriter<'_>) -> Result<()> {
        writer.write_u32(self.style)?;
        writer.write_u32(self.extended_style)?;
        writer.write_u16(self.item_count)?;
        writer.write_i16(self.x)?;
        writer.write_i16(self.y)?;
        writer.write_i16(self.cx)?;
        writer.write_i16(self.cy)
    }
}

#[derive(Debug, Clone)]
pub struct DialogDescriptor {
    x: i16,
    y: i16,
    cx: i16,
    cy: i16,
    style: u32,
    extended_style: u32,
    caption: String,
    caption_units: Vec<u16>,
    font: Option<FontSpec>,
    parent: Option<WindowHandle>,
    controls: Vec<ControlDescriptor>,
    last_error: Option<DialogError>,
}

impl DialogDescriptor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        caption: &str,
        style: u32,
        extended_style: u32,
        x: i16,
        y: i16,
        cx: i16,
        cy: i16,
        parent: Option<WindowHandle>,
    ) -> Self {
        Self {
            x,
            y,
            cx,
            cy,
            style,
            extended_style,
            caption: caption.to_owned(),
            caption_units: utf16(caption),
            font: Some(FontSpec::default()),
            parent,
            controls: Vec::new(),
            last_error: None,
        }
    }

    pub fn add(&mut self, control: ControlDescriptor) {
        self.controls.push(control);
    }

    pub fn controls(&self) -> &[ControlDescriptor] {
        &self.controls
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }

    pub fn parent(&self) -> Option<WindowHandle> {
        self.parent
    }

    /// Font written into the template, if any.
    pub fn font(&self) -> Option<&FontSpec> {
        self.font.as_ref().filter(|font| font.is_usable())
    }

    pub fn set_font(&mut self, font: Option<FontSpec>) {
        self.font = font;
    }

    /*
     * Adopts the font of the parent window, or of the host's active window when
     * no parent was given. Keeps the current font when neither yields one.
     */
    pub fn inherit_parent_font<H: DialogHost + ?Sized>(&mut self, host: &H) {
        let source = self.parent.or_else(|| host.active_window());
        match source.and_then(|window| host.window_font(window)) {
            Some(font) if font.is_usable() => {
                log::debug!("DialogDescriptor: using font {font:?} from window {source:?}");
                self.font = Some(font);
            }
            _ => log::debug!(
                "DialogDescriptor: no usable font from {source:?}, keeping {:?}",
                self.font
            ),
        }
    }

    /// Header record as it will be written.
    pub fn shape(&self) -> Result<DialogShape> {
        let item_count =
            u16::try_from(self.controls.len()).map_err(|_| DialogError::TooManyControls {
                count: self.controls.len(),
            })?;
        let style = if self.font().is_some() {
            self.style | DS_SETFONT
        } else {
            self.style & !DS_SETFONT
        };
        Ok(DialogShape {
            x: self.x,
            y: self.y,
            cx: self.cx,
            cy: self.cy,
            style,
            extended_style: self.extended_style,
            item_count,
        })
    }

    pub fn serialize(&self, writer: &mut ByteWriter<'_>) -> Result<()> {
        let shape = self.shape()?;
        writer.write(&shape)?;
        // No menu, default dialog class.
        writer.write_u16(0)?;
        writer.write_u16(0)?;
        writer.write_string(&self.caption_units)?;
        if let Some(font) = self.font() {
            writer.write_u16(font.point_size)?;
            writer.write_string(&utf16(&font.face))?;
        }
        for control in &self.controls {
            control.serialize(writer)?;
        }
        Ok(())
    }

    /// Exact number of bytes `serialize` produces.
    pub fn serialized_size(&self) -> Result<usize> {
        let mut writer = ByteWriter::measuring();
        self.serialize(&mut writer)?;
        Ok(writer.position())
    }

    /// Serialises into a fresh buffer of exactly the required size.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = vec![0u8; self.serialized_size()?];
        self.serialize(&mut ByteWriter::new(&mut bytes))?;
        Ok(bytes)
    }

    /*
     * Runs the dialog modally. Returns the code the dialog ended with, the
     * host's sentinel if it could not create the dialog, or -1 when the
     * template could not be prepared. In the last case nothing is shown and the
     * failure is available from `last_error`.
     */
    pub fn do_modal<H: DialogHost + ?Sized>(
        &mut self,
        host: &H,
        procedure: &mut dyn DialogProcedure,
    ) -> isize {
        match self.try_do_modal(host, procedure) {
            Ok(code) => code,
            Err(err) => {
                log::error!("DialogDescriptor: '{}' not shown: {err}", self.caption);
                self.last_error = Some(err);
                HOST_FAILURE
            }
        }
    }

    pub fn try_do_modal<H: DialogHost + ?Sized>(
        &mut self,
        host: &H,
        procedure: &mut dyn DialogProcedure,
    ) -> Result<isize> {
        self.last_error = None;
        let parent = self.parent;
        let result = ModalEngine::new(host).run(self, procedure, parent)?;
        if result == HOST_FAILURE {
            self.last_error = Some(DialogError::HostRefused {
                code: host.last_error(),
            });
        }
        Ok(result)
    }

    pub fn last_error(&self) -> Option<&DialogError> {
        self.last_error.as_ref()
    }

    pub fn last_error_code(&self) -> Option<u32> {
        self.last_error.as_ref().and_then(DialogError::code)
    }
}
