use crate::error::{Error, Result};

/// A byte buffer a [`Writer`](crate::Writer) can extend on demand.
///
/// `bytes` is everything committed so far, including the byte the cursor is
/// currently filling.
pub trait Grower {
    fn bytes(&self) -> &[u8];

    fn bytes_mut(&mut self) -> &mut [u8];

    /// Appends `additional` zero bytes, or fails with [`Error::Capacity`]
    /// leaving the buffer untouched.
    fn grow(&mut self, additional: usize) -> Result<()>;
}

impl Grower for Vec<u8> {
    fn bytes(&self) -> &[u8] {
        self
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        self
    }

    fn grow(&mut self, additional: usize) -> Result<()> {
        self.try_reserve(additional).map_err(|_| Error::Capacity { written: 0 })?;
        self.resize(self.len() + additional, 0);
        Ok(())
    }
}

/// Caller-owned storage of a fixed size. Only the first `len` bytes count as
/// written.
pub struct FixedBuffer<'a> {
    buf: &'a mut [u8],
    len: usize,
}

impl<'a> FixedBuffer<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        FixedBuffer { buf, len: 0 }
    }

    /// Takes the first `len` bytes of `buf` as already written.
    pub fn with_len(buf: &'a mut [u8], len: usize) -> Self {
        assert!(len <= buf.len(), "{len} written bytes exceed capacity {}", buf.len());
        FixedBuffer { buf, len }
    }

    /// Marks up to `len` bytes as written without touching their contents.
    pub(crate) fn keep(&mut self, len: usize) {
        self.len = self.len.max(len.min(self.buf.len()));
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn into_inner(self) -> &'a mut [u8] {
        let FixedBuffer { buf, len } = self;
        &mut buf[..len]
    }
}

impl Grower for FixedBuffer<'_> {
    fn bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.buf[..self.len]
    }

    fn grow(&mut self, additional: usize) -> Result<()> {
        let end = match self.len.checked_add(additional) {
            Some(end) if end <= self.buf.len() => end,
            _ => return Err(Error::Capacity { written: 0 }),
        };
        self.buf[self.len..end].fill(0);
        self.len = end;
        Ok(())
    }
}

/// A `Vec`-backed [`Grower`] with an upper bound on its length.
#[derive(Debug, Default, Clone)]
pub struct GrowableBuffer {
    buf: Vec<u8>,
    limit: Option<usize>,
}

impl GrowableBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: usize) -> Self {
        GrowableBuffer { buf: Vec::new(), limit: Some(limit) }
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

impl Grower for GrowableBuffer {
    fn bytes(&self) -> &[u8] {
        &self.buf
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }

    fn grow(&mut self, additional: usize) -> Result<()> {
        if self.limit.is_some_and(|limit| self.buf.len().saturating_add(additional) > limit) {
            return Err(Error::Capacity { written: 0 });
        }
        self.buf.grow(additional)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_grows_with_zeros() {
        let mut buf: Vec<u8> = vec![0xaa];
        buf.grow(2).unwrap();
        assert_eq!(buf, [0xaa, 0, 0]);
    }

    #[test]
    fn fixed_buffer_refuses_overflow() {
        let mut storage = [0xff; 2];
        let mut buf = FixedBuffer::new(&mut storage);
        assert!(buf.bytes().is_empty());
        buf.grow(1).unwrap();
        assert_eq!(buf.bytes(), [0]);
        assert!(matches!(buf.grow(2), Err(Error::Capacity { written: 0 })));
        assert_eq!(buf.bytes().len(), 1);
        buf.grow(1).unwrap();
        assert_eq!(buf.into_inner(), [0, 0]);
    }

    #[test]
    fn fixed_buffer_keeps_written_prefix() {
        let mut storage: [u8; 3] = [0xab, 0xcd, 0xef];
        let mut buf = FixedBuffer::with_len(&mut storage, 1);
        assert_eq!(buf.bytes(), [0xab]);
        buf.keep(2);
        buf.keep(1);
        assert_eq!(buf.bytes(), [0xab, 0xcd]);
        buf.keep(10);
        assert_eq!(buf.bytes().len(), 3);
        assert!(buf.grow(1).is_err());
        assert_eq!(buf.into_inner(), [0xab, 0xcd, 0xef]);
    }

    #[test]
    #[should_panic(expected = "exceed capacity")]
    fn fixed_buffer_len_past_capacity_panics() {
        let mut storage = [0u8; 2];
        FixedBuffer::with_len(&mut storage, 3);
    }

    #[test]
    fn fixed_buffer_rejects_overflowing_request() {
        let mut storage = [0; 1];
        let mut buf = FixedBuffer::new(&mut storage);
        assert!(buf.grow(usize::MAX).is_err());
        assert_eq!(buf.capacity(), 1);
    }

    #[test]
    fn growable_buffer_limit() {
        let mut buf = GrowableBuffer::with_limit(3);
        buf.grow(3).unwrap();
        assert!(matches!(buf.grow(1), Err(Error::Capacity { .. })));
        assert_eq!(buf.len(), 3);

        let mut unbounded = GrowableBuffer::new();
        unbounded.grow(1024).unwrap();
        assert_eq!(unbounded.limit(), None);
        assert_eq!(unbounded.into_inner().len(), 1024);
    }
}
