//! Resettable in-memory byte sink shared between writer and readers.

use std::cell::RefCell;
use std::fmt;
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use std::rc::Rc;

/// A seekable byte buffer holding one encoded photo.
///
/// Cloning yields another handle to the same bytes, so a capture sequence
/// can write into the buffer that the UI later reads. Only one writer should
/// be active at a time.
#[derive(Clone, Default)]
pub struct PhotoBuffer {
    inner: Rc<RefCell<Cursor<Vec<u8>>>>,
}

impl PhotoBuffer {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard the contents and move the position back to the start.
    pub fn reset(&self) {
        let mut cursor = self.inner.borrow_mut();
        cursor.get_mut().clear();
        cursor.set_position(0);
    }

    /// Move the position back to the start, keeping the contents.
    pub fn rewind(&self) {
        self.inner.borrow_mut().set_position(0);
    }

    /// Current read/write position.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.inner.borrow().position()
    }

    /// Number of bytes held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().get_ref().len()
    }

    /// Whether the buffer holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy out the whole contents, independent of the position.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.inner.borrow().get_ref().clone()
    }

    /// Whether both handles point at the same bytes.
    #[must_use]
    pub fn same_buffer(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for PhotoBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhotoBuffer")
            .field("len", &self.len())
            .field("position", &self.position())
            .finish()
    }
}

impl Write for PhotoBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.borrow_mut().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Read for PhotoBuffer {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.borrow_mut().read(buf)
    }
}

impl Seek for PhotoBuffer {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.borrow_mut().seek(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_drops_stale_tail() {
        let mut buffer = PhotoBuffer::new();
        buffer.write_all(b"a much longer previous photo").unwrap();
        buffer.reset();
        buffer.write_all(b"short").unwrap();
        assert_eq!(buffer.to_vec(), b"short");
    }

    #[test]
    fn clones_share_bytes() {
        let buffer = PhotoBuffer::new();
        let mut writer = buffer.clone();
        writer.write_all(b"frame").unwrap();
        assert!(buffer.same_buffer(&writer));
        assert_eq!(buffer.len(), 5);

        buffer.rewind();
        let mut reader = buffer.clone();
        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();
        assert_eq!(out, "frame");
    }
}
