//! Checked big-endian field reader shared by the codecs.

use mikta_common::{Result, error::Error};

/// Reads fixed-width big-endian fields from a byte slice, failing with
/// `Corrupt` on truncation.
pub(crate) struct Reader<'a> {
    element: &'static str,
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    pub fn new(element: &'static str, bytes: &'a [u8]) -> Reader<'a> {
        Reader {
            element,
            bytes,
            offset: 0,
        }
    }

    /// Reads the leading i32 element count and verifies that the stream
    /// holds exactly `count * element_size` further bytes.
    pub fn read_count(&mut self, element_size: usize) -> Result<usize> {
        let count = self.read_i32()?;
        if count < 0 {
            return Err(self.corrupt(format!("negative element count {count}")));
        }
        let count = count as usize;
        let expected = 4 + count * element_size;
        if self.bytes.len() != expected {
            return Err(self.corrupt(format!(
                "expected {expected} bytes for {count} elements, got {}",
                self.bytes.len()
            )));
        }
        Ok(count)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_be_bytes(self.read_array()?))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(i64::from_be_bytes(self.read_array()?))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_be_bytes(self.read_array()?))
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let end = self.offset + N;
        if end > self.bytes.len() {
            return Err(self.corrupt(format!("truncated at byte {}", self.offset)));
        }
        let array = self.bytes[self.offset..end]
            .try_into()
            .expect("length checked");
        self.offset = end;
        Ok(array)
    }

    pub fn corrupt(&self, message: impl Into<String>) -> Error {
        Error::corrupt(self.element, message)
    }
}
