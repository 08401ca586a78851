//! # bindery
//!
//! Assemble EPUB 3 publications from nested sections and media files.
//!
//! ## Features
//!
//! - Arbitrarily nested sections, flattened into reading order
//! - EPUB 3 navigation document plus an NCX table of contents for older readers
//! - Cover image and cover page handling
//! - Fonts, images, video, audio, and stylesheets fetched through a pluggable
//!   [`ByteSource`](io::ByteSource)
//! - Deterministic manifest ids and archive entry order
//!
//! ## Quick Start
//!
//! ```no_run
//! use bindery::{Epub, Section};
//!
//! let mut epub = Epub::new("My Book");
//! epub.set_author("Author Name");
//! epub.set_cover("cover.jpg", "assets/cover.jpg")?;
//! let css = epub.add_css("main.css", "assets/main.css")?;
//!
//! epub.add_section(Section::new("one.xhtml", "Chapter 1", "<h1>Chapter 1</h1>").with_css(&css))?;
//! epub.add_subsection("one.xhtml", Section::new("one-a.xhtml", "Part A", "<p>…</p>"))?;
//!
//! epub.write("my-book.epub")?;
//! # Ok::<(), bindery::Error>(())
//! ```
//!
//! ## In-memory output
//!
//! ```
//! use std::io::Cursor;
//! use bindery::io::MemorySource;
//! use bindery::{Epub, Section};
//!
//! let source = MemorySource::new().with("logo", b"\x89PNG\r\n\x1a\n".to_vec());
//! let mut epub = Epub::new("Tiny").with_source(source);
//! epub.add_image("logo.png", "logo")?;
//! epub.add_section(Section::new("s.xhtml", "Only", "<p>Hi</p>"))?;
//!
//! let mut out = Cursor::new(Vec::new());
//! let written = epub.write_to(&mut out)?;
//! assert_eq!(written, out.get_ref().len() as u64);
//! # Ok::<(), bindery::Error>(())
//! ```

pub mod book;
pub mod epub;
pub mod error;
pub mod io;
pub(crate) mod util;

#[cfg(feature = "cli")]
pub mod recipe;

pub use book::{MediaAsset, MediaClass, Metadata, Section};
pub use epub::{Epub, EpubConfig};
pub use error::{Error, Result};
