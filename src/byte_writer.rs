/*
 * Appends typed fields to a template buffer. A writer either measures (no
 * backing storage, cursor only) or writes into a borrowed slice. Both modes run
 * the exact same serialisation code, which is how the required arena capacity
 * is computed before any memory is acquired.
 *
 * A bounded writer checks every append against its slice and fails with
 * `SerializationOverflow` before touching memory, so an undersized buffer can
 * never be overrun. All integers are little-endian, the byte order of every
 * Windows target.
 */

use crate::error::{DialogError, Result};

/// Converts text to the UTF-16 code units stored in templates (no terminator).
pub fn utf16(text: &str) -> Vec<u16> {
    text.encode_utf16().collect()
}

/// Bytes a null-terminated UTF-16 string occupies in a template.
pub fn utf16z_len(units: &[u16]) -> usize {
    (units.len() + 1) * 2
}

/// A fixed-size structured record. `write_fields` must advance the writer by
/// exactly `SIZE` bytes.
pub trait Record {
    const SIZE: usize;

    fn write_fields(&self, writer: &mut ByteWriter<'_>) -> Result<()>;
}

#[derive(Debug)]
pub struct ByteWriter<'a> {
    buffer: Option<&'a mut [u8]>,
    cursor: usize,
}

impl ByteWriter<'static> {
    /// A writer that only counts bytes.
    pub fn measuring() -> Self {
        Self {
            buffer: None,
            cursor: 0,
        }
    }
}

impl<'a> ByteWriter<'a> {
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self {
            buffer: Some(buffer),
            cursor: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Size of the backing slice; `None` while measuring.
    pub fn capacity(&self) -> Option<usize> {
        self.buffer.as_ref().map(|b| b.len())
    }

    /// Advances to the next multiple of `boundary`, zero-filling the gap.
    pub fn align(&mut self, boundary: usize) -> Result<()> {
        debug_assert!(boundary.is_power_of_two());
        let aligned = (self.cursor + boundary - 1) & !(boundary - 1);
        self.reserve(aligned - self.cursor)?;
        while self.cursor < aligned {
            self.put(&[0])?;
        }
        Ok(())
    }

    pub fn write<R: Record>(&mut self, record: &R) -> Result<()> {
        let start = self.cursor;
        record.write_fields(self)?;
        debug_assert_eq!(self.cursor - start, R::SIZE, "record size mismatch");
        Ok(())
    }

    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        self.put(&value.to_le_bytes())
    }

    pub fn write_i16(&mut self, value: i16) -> Result<()> {
        self.put(&value.to_le_bytes())
    }

    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.put(&value.to_le_bytes())
    }

    /// Writes the code units followed by one null unit. No alignment.
    pub fn write_string(&mut self, units: &[u16]) -> Result<()> {
        self.reserve(utf16z_len(units))?;
        for unit in units {
            self.write_u16(*unit)?;
        }
        self.write_u16(0)
    }

    fn reserve(&self, len: usize) -> Result<()> {
        match &self.buffer {
            Some(buffer) if self.cursor + len > buffer.len() => {
                Err(DialogError::SerializationOverflow {
                    required: self.cursor + len,
                    capacity: buffer.len(),
                })
            }
            _ => Ok(()),
        }
    }

    fn put(&mut self, bytes: &[u8]) -> Result<()> {
        self.reserve(bytes.len())?;
        if let Some(buffer) = self.buffer.as_deref_mut() {
            buffer[self.cursor..self.cursor + bytes.len()].copy_from_slice(bytes);
        }
        self.cursor += bytes.len();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Pair(u16, u32);

    impl Record for Pair {
        const SIZE: usize = 6;

        fn write_fields(&self, writer: &mut ByteWriter<'_>) -> Result<()> {
            writer.write_u16(self.0)?;
            writer.write_u32(self.1)
        }
    }

    #[test]
    fn writes_little_endian_fields_and_advances() {
        let mut buf = [0xAAu8; 8];
        let mut writer = ByteWriter::new(&mut buf);

        writer.write(&Pair(0x1234, 0xDEADBEEF)).unwrap();
        writer.write_i16(-2).unwrap();

        assert_eq!(writer.position(), 8);
        assert_eq!(buf, [0x34, 0x12, 0xEF, 0xBE, 0xAD, 0xDE, 0xFE, 0xFF]);
    }

    #[test]
    fn string_is_null_terminated_and_unaligned() {
        let mut buf = [0xFFu8; 7];
        let mut writer = ByteWriter::new(&mut buf);
        writer.put(&[1]).unwrap();

        writer.write_string(&utf16("OK")).unwrap();

        assert_eq!(writer.position(), 7);
        assert_eq!(buf, [1, b'O', 0, b'K', 0, 0, 0]);
    }

    #[test]
    fn align_zero_fills_to_boundary() {
        let mut buf = [0xFFu8; 8];
        let mut writer = ByteWriter::new(&mut buf);
        writer.write_u16(7).unwrap();

        writer.align(4).unwrap();
        assert_eq!(writer.position(), 4);
        writer.align(4).unwrap();
        assert_eq!(writer.position(), 4);

        assert_eq!(&buf[..4], &[7, 0, 0, 0]);
    }

    #[test]
    fn measuring_writer_counts_without_storage() {
        let mut writer = ByteWriter::measuring();
        writer.write_u16(1).unwrap();
        writer.align(4).unwrap();
        writer.write_string(&utf16("Cancel")).unwrap();

        assert_eq!(writer.capacity(), None);
        assert_eq!(writer.position(), 4 + 14);
    }

    #[test]
    fn overflowing_append_fails_before_writing() {
        let mut buf = [0u8; 5];
        let mut writer = ByteWriter::new(&mut buf);
        writer.write_u32(1).unwrap();

        let err = writer.write_string(&utf16("x")).unwrap_err();

        assert_eq!(
            err,
            DialogError::SerializationOverflow {
                required: 8,
                capacity: 5
            }
        );
        assert_eq!(writer.position(), 4);
        assert_eq!(buf[4], 0);
    }
}
