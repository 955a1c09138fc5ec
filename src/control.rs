/*
 * One child control of an in-memory dialog template. A descriptor owns its
 * caption and class already converted to UTF-16 and is never edited after it
 * has been added to a dialog; changing geometry or style means building a new
 * descriptor.
 */

use crate::byte_writer::{ByteWriter, Record, utf16};
use crate::error::Result;

const CLASS_ATOM_SENTINEL: u16 = 0xFFFF;

/// Class of a child control: one of the dialog manager's predefined classes or
/// a registered class name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlClass {
    Button,
    Edit,
    Static,
    ListBox,
    ScrollBar,
    ComboBox,
    Custom(String),
}

impl ControlClass {
    /// Predefined class atom, or `None` for a custom class.
    pub fn atom(&self) -> Option<u16> {
        match self.reference() {
            ClassReference::Atom(atom) => Some(atom),
            ClassReference::Named(_) => None,
        }
    }

    fn reference(&self) -> ClassReference<'_> {
        match self {
            Self::Button => ClassReference::Atom(0x0080),
            Self::Edit => ClassReference::Atom(0x0081),
            Self::Static => ClassReference::Atom(0x0082),
            Self::ListBox => ClassReference::Atom(0x0083),
            Self::ScrollBar => ClassReference::Atom(0x0084),
            Self::ComboBox => ClassReference::Atom(0x0085),
            Self::Custom(name) => ClassReference::Named(name),
        }
    }
}

/// How the class is written into the control record.
enum ClassReference<'a> {
    Atom(u16),
    Named(&'a str),
}

/// Geometry, identifier and styles of a control (`DLGITEMTEMPLATE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlShape {
    pub x: i16,
    pub y: i16,
    pub cx: i16,
    pub cy: i16,
    pub id: u16,
    pub style: u32,
    pub extended_style: u32,
}

impl Record for ControlShape {
    const SIZE: usize = 18;

    fn write_fields(&self, writer: &mut ByteWriter<'_>) -> Result<()> {
        writer.write_u32(self.style)?;
        writer.write_u32(self.extended_style)?;
        writer.write_i16(self.x)?;
        writer.write_i16(self.y)?;
        writer.write_i16(self.cx)?;
        writer.write_i16(self.cy)?;
        writer.write_u16(self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlDescriptor {
    shape: ControlShape,
    class: ControlClass,
    caption: String,
    caption_units: Vec<u16>,
}

impl ControlDescriptor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        caption: &str,
        class: ControlClass,
        id: u16,
        x: i16,
        y: i16,
        cx: i16,
        cy: i16,
        style: u32,
        extended_style: u32,
    ) -> Self {
        Self {
            shape: ControlShape {
                x,
                y,
                cx,
                cy,
                id,
                style,
                extended_style,
            },
            class,
            caption: caption.to_owned(),
            caption_units: utf16(caption),
        }
    }

    pub fn id(&self) -> u16 {
        self.shape.id
    }

    pub fn shape(&self) -> &ControlShape {
        &self.shape
    }

    pub fn class(&self) -> &ControlClass {
        &self.class
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }

    pub fn serialize(&self, writer: &mut ByteWriter<'_>) -> Result<()> {
        writer.align(4)?;
        writer.write(&self.shape)?;
        match self.class.reference() {
            ClassReference::Atom(atom) => {
                writer.write_u16(CLASS_ATOM_SENTINEL)?;
                writer.write_u16(atom)?;
            }
            ClassReference::Named(name) => writer.write_string(&utf16(name))?,
        }
        writer.write_string(&self.caption_units)?;
        // No creation data follows the control.
        writer.write_u16(0)
    }
}
