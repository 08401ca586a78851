//! IO abstractions: where media bytes come from and where archive bytes go.

mod adapter;
mod byte_source;

pub use adapter::{ByteCounter, CountingWriter};
pub use byte_source::{ByteSource, FileSource, MemorySource};
