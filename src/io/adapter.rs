use std::io::{self, Seek, SeekFrom, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Wraps a `Write + Seek` sink and tracks how many bytes reached it.
///
/// The count is the furthest offset written past the sink's starting
/// position, so seeking back to patch a header does not inflate it.
/// Used in front of `zip::ZipWriter` so the archive size is known even when
/// writing fails halfway; [`CountingWriter::counter`] stays readable after
/// the writer itself has been consumed.
pub struct CountingWriter<W> {
    inner: W,
    start: u64,
    position: u64,
    written: ByteCounter,
}

/// Shared view of a [`CountingWriter`]'s byte count.
#[derive(Debug, Clone, Default)]
pub struct ByteCounter(Arc<AtomicU64>);

impl ByteCounter {
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    fn raise_to(&self, value: u64) {
        self.0.fetch_max(value, Ordering::Relaxed);
    }
}

impl<W: Write + Seek> CountingWriter<W> {
    pub fn new(mut inner: W) -> io::Result<Self> {
        let start = inner.stream_position()?;
        Ok(Self {
            inner,
            start,
            position: start,
            written: ByteCounter::default(),
        })
    }

    /// Handle on the byte count that stays valid after the writer is gone.
    pub fn counter(&self) -> ByteCounter {
        self.written.clone()
    }

}

impl<W: Write + Seek> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.position += n as u64;
        self.written.raise_to(self.position.saturating_sub(self.start));
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W: Write + Seek> Seek for CountingWriter<W> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.position = self.inner.seek(pos)?;
        Ok(self.position)
    }
}
