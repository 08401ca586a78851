//! EPUB 3 document assembly and writing.
//!
//! An [`Epub`] collects metadata, a tree of [`Section`]s and media assets.
//! Rendering stages everything in a temporary directory, builds the package
//! document and both tables of contents, and zips the result.

mod archive;
mod id;
mod media;
mod package;
mod render;
mod sections;
mod staging;
mod toc;
mod xhtml;

use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;

use parking_lot::Mutex;

use crate::book::{MediaAsset, MediaClass, Metadata, Section};
use crate::error::{Error, Result};
use crate::io::{ByteSource, FileSource};
use crate::util::{basename, check_filename, encode_href};

pub use archive::write_archive;
pub use id::xml_id;
pub use media::{MediaRegistrar, detect_media_type};
pub use package::{ManifestEntry, PackageBuilder};
pub use sections::{FlatSection, Parent, SectionId, SectionRegistry};
pub use staging::StagingDir;
pub use toc::{TableOfContents, TocEntry};

pub const MIMETYPE_FILENAME: &str = "mimetype";
pub const EPUB_MEDIA_TYPE: &str = "application/epub+zip";
pub const XHTML_MEDIA_TYPE: &str = "application/xhtml+xml";
pub const META_INF_FOLDER: &str = "META-INF";
pub const CONTAINER_FILENAME: &str = "container.xml";
/// Folder holding the package document and all publication resources.
pub const CONTENT_FOLDER: &str = "EPUB";
pub const PACKAGE_FILENAME: &str = "package.opf";
pub const XHTML_FOLDER: &str = "xhtml";
pub const NAV_FILENAME: &str = "nav.xhtml";
pub const NCX_FILENAME: &str = "toc.ncx";
pub const COVER_SECTION_FILENAME: &str = "cover.xhtml";

/// Configuration for EPUB output.
#[derive(Debug, Clone, Default)]
pub struct EpubConfig {
    /// Compression level for deflated entries (0-9, default 6).
    pub compression_level: Option<i64>,
}

/// Everything a render reads. Guarded by the document lock in [`Epub`].
#[derive(Debug, Default)]
struct Document {
    metadata: Metadata,
    sections: SectionRegistry,
    media: Vec<MediaAsset>,
}

/// An EPUB under construction.
///
/// # Example
///
/// ```no_run
/// use bindery::{Epub, Section};
///
/// let mut epub = Epub::new("My Book");
/// epub.set_author("Me");
/// epub.add_section(Section::new("ch1.xhtml", "Chapter 1", "<p>Hello</p>"))?;
/// epub.add_subsection("ch1.xhtml", Section::new("ch1-1.xhtml", "Part 1", "<p>…</p>"))?;
/// epub.write("output.epub")?;
/// # Ok::<(), bindery::Error>(())
/// ```
pub struct Epub {
    document: Mutex<Document>,
    source: Box<dyn ByteSource>,
    config: EpubConfig,
}

impl Epub {
    /// Create an empty book. Media locators are read as filesystem paths
    /// until [`Epub::with_source`] says otherwise.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            document: Mutex::new(Document {
                metadata: Metadata::new(title),
                ..Default::default()
            }),
            source: Box::new(FileSource::new()),
            config: EpubConfig::default(),
        }
    }

    pub fn with_source(mut self, source: impl ByteSource + 'static) -> Self {
        self.source = Box::new(source);
        self
    }

    pub fn with_config(mut self, config: EpubConfig) -> Self {
        self.config = config;
        self
    }

    fn doc(&mut self) -> &mut Document {
        self.document.get_mut()
    }

    pub fn metadata(&self) -> Metadata {
        self.document.lock().metadata.clone()
    }

    pub fn set_metadata(&mut self, metadata: Metadata) {
        self.doc().metadata = metadata;
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.doc().metadata.title = title.into();
    }

    /// Add an author (`dc:creator`).
    pub fn set_author(&mut self, author: impl Into<String>) {
        self.doc().metadata.authors.push(author.into());
    }

    pub fn set_language(&mut self, language: impl Into<String>) {
        self.doc().metadata.language = language.into();
    }

    pub fn set_identifier(&mut self, identifier: impl Into<String>) {
        self.doc().metadata.identifier = identifier.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.doc().metadata.description = Some(description.into());
    }

    /// Set the page progression direction (`ltr`, `rtl` or `default`).
    pub fn set_ppd(&mut self, direction: impl Into<String>) {
        self.doc().metadata.ppd = Some(direction.into());
    }

    /// Set `dcterms:modified` instead of using the render time.
    pub fn set_modified(&mut self, timestamp: impl Into<String>) {
        self.doc().metadata.modified = Some(timestamp.into());
    }

    /// Add a top-level section and return its filename.
    pub fn add_section(&mut self, section: Section) -> Result<String> {
        let sections = &mut self.doc().sections;
        let id = sections.add_section(section)?;
        Ok(sections.section(id).filename.clone())
    }

    /// Add a section nested under `parent_filename` and return its filename.
    pub fn add_subsection(&mut self, parent_filename: &str, section: Section) -> Result<String> {
        let sections = &mut self.doc().sections;
        let id = sections.add_subsection(parent_filename, section)?;
        Ok(sections.section(id).filename.clone())
    }

    /// Add a media asset. Filenames must be a single path component, unique
    /// within a class, and at most one asset may be the cover.
    pub fn add_media(&mut self, asset: MediaAsset) -> Result<()> {
        check_filename(&asset.filename)?;
        let media = &mut self.doc().media;
        if media
            .iter()
            .any(|a| a.class == asset.class && a.filename == asset.filename)
        {
            return Err(Error::DuplicateFilename(asset.href()));
        }
        if asset.is_cover && media.iter().any(|a| a.is_cover) {
            return Err(Error::MultipleCovers);
        }
        media.push(asset);
        Ok(())
    }

    /// Add a stylesheet and return its path relative to a section file.
    ///
    /// An empty `filename` defaults to the last segment of `source`; the
    /// same applies to the other `add_*` media methods and [`Epub::set_cover`].
    pub fn add_css(&mut self, filename: &str, source: impl Into<String>) -> Result<String> {
        self.add_class(MediaClass::Css, filename, source)
    }

    pub fn add_font(&mut self, filename: &str, source: impl Into<String>) -> Result<String> {
        self.add_class(MediaClass::Font, filename, source)
    }

    pub fn add_image(&mut self, filename: &str, source: impl Into<String>) -> Result<String> {
        self.add_class(MediaClass::Image, filename, source)
    }

    pub fn add_video(&mut self, filename: &str, source: impl Into<String>) -> Result<String> {
        self.add_class(MediaClass::Video, filename, source)
    }

    pub fn add_audio(&mut self, filename: &str, source: impl Into<String>) -> Result<String> {
        self.add_class(MediaClass::Audio, filename, source)
    }

    fn add_class(
        &mut self,
        class: MediaClass,
        filename: &str,
        source: impl Into<String>,
    ) -> Result<String> {
        let source = source.into();
        let filename = match filename {
            "" => basename(&source).to_string(),
            name => name.to_string(),
        };
        let asset = MediaAsset::new(class, filename, source);
        let href = asset.href();
        self.add_media(asset)?;
        Ok(format!("../{}", encode_href(&href)))
    }

    /// Use an image as the cover: it is added with the `cover-image`
    /// property and a cover page showing it opens the reading order.
    ///
    /// Returns the cover page filename.
    pub fn set_cover(&mut self, image_filename: &str, source: impl Into<String>) -> Result<String> {
        let doc = self.doc();
        if doc.media.iter().any(|a| a.is_cover) || doc.sections.cover().is_some() {
            return Err(Error::MultipleCovers);
        }

        let source = source.into();
        let image_filename = match image_filename {
            "" => basename(&source),
            name => name,
        };
        let mut image = MediaAsset::new(MediaClass::Image, image_filename, source.as_str());
        image.is_cover = true;
        let image_href = format!("../{}", encode_href(&image.href()));

        let mut page = Section::new(
            COVER_SECTION_FILENAME,
            "Cover",
            xhtml::cover_body(&image_href, "Cover image"),
        );
        page.is_cover = true;

        self.add_media(image)?;
        let added = self.add_section(page);
        if added.is_err() {
            // Keep the document as it was before the call.
            self.doc().media.retain(|a| !a.is_cover);
        }
        added
    }

    /// Render the EPUB into `sink` and return the number of bytes written.
    ///
    /// Holds the document lock for the whole render, so concurrent renders
    /// of the same document run one after the other.
    pub fn write_to<W: Write + Seek>(&self, sink: W) -> Result<u64> {
        let document = self.document.lock();
        render::render(&document, self.source.as_ref(), &self.config, sink)
    }

    /// Render the EPUB to a file, creating or truncating it.
    ///
    /// A failed render may leave a partial file behind.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| Error::DestinationCreation {
            path: path.to_path_buf(),
            source,
        })?;
        let written = self.write_to(file)?;
        log::info!("wrote {} ({written} bytes)", path.display());
        Ok(())
    }
}
