//! The render pipeline: stage every file of the publication, then archive.
//!
//! The table of contents is built before anything touches the filesystem.
//! Media and sections then register manifest entries, and the package
//! document is written last from everything registered before it.

use std::fs;
use std::io::{Seek, Write};
use std::path::Path;

use crate::book::Metadata;
use crate::error::{Error, Result};
use crate::io::ByteSource;

use super::archive::write_archive;
use super::id::xml_id;
use super::media::MediaRegistrar;
use super::package::{self, ManifestEntry, NAV_PROPERTY, NCX_MEDIA_TYPE, PackageBuilder};
use super::sections::FlatSection;
use super::staging::StagingDir;
use super::toc::TableOfContents;
use super::xhtml::xhtml_document;
use super::{
    CONTAINER_FILENAME, CONTENT_FOLDER, Document, EPUB_MEDIA_TYPE, EpubConfig, META_INF_FOLDER,
    MIMETYPE_FILENAME, NAV_FILENAME, NCX_FILENAME, PACKAGE_FILENAME, XHTML_FOLDER,
    XHTML_MEDIA_TYPE,
};

const NAV_ID: &str = "nav";
const NCX_ID: &str = "ncx";
const NAV_TITLE: &str = "Table of Contents";

pub(super) fn render<W: Write + Seek>(
    doc: &Document,
    source: &dyn ByteSource,
    config: &EpubConfig,
    sink: W,
) -> Result<u64> {
    let flat = doc.sections.flatten();
    let toc = TableOfContents::build(&flat, &doc.sections.parent_map())?;
    // The navigation document needs at least one entry.
    if toc.is_empty() {
        return Err(Error::NoSections);
    }

    let staging = StagingDir::create()?;
    let root = staging.path();

    write_mimetype(root)?;
    create_folders(root)?;
    write_container(root)?;

    let content_dir = root.join(CONTENT_FOLDER);
    let mut pkg = PackageBuilder::new();

    MediaRegistrar::new(source).register(&doc.media, &content_dir, &mut pkg)?;

    write_sections(&content_dir, &doc.metadata, &flat, &mut pkg)?;
    write_toc(&content_dir, &doc.metadata, &toc, &mut pkg)?;

    let opf = pkg.finish(&doc.metadata)?;
    fs::write(content_dir.join(PACKAGE_FILENAME), opf).map_err(Error::Staging)?;

    log::debug!(
        "staged {} sections, {} media files, {} toc entries",
        flat.len(),
        doc.media.len(),
        toc.entries().len()
    );
    write_archive(root, sink, config.compression_level)
}

fn write_mimetype(root: &Path) -> Result<()> {
    fs::write(root.join(MIMETYPE_FILENAME), EPUB_MEDIA_TYPE).map_err(Error::Staging)
}

fn create_folders(root: &Path) -> Result<()> {
    for dir in [
        root.join(CONTENT_FOLDER),
        root.join(CONTENT_FOLDER).join(XHTML_FOLDER),
        root.join(META_INF_FOLDER),
    ] {
        fs::create_dir(&dir).map_err(Error::Staging)?;
    }
    Ok(())
}

/// `META-INF/container.xml`, pointing at the package document.
fn write_container(root: &Path) -> Result<()> {
    let container = container_xml(&format!("{CONTENT_FOLDER}/{PACKAGE_FILENAME}"));
    fs::write(root.join(META_INF_FOLDER).join(CONTAINER_FILENAME), container)
        .map_err(Error::Staging)
}

fn container_xml(package_path: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="{package_path}" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>
"#
    )
}

/// Write one XHTML file per section and register it in manifest and spine.
///
/// The cover page always opens the spine, wherever it sits in the tree.
fn write_sections(
    content_dir: &Path,
    metadata: &Metadata,
    flat: &[FlatSection<'_>],
    pkg: &mut PackageBuilder,
) -> Result<()> {
    let xhtml_dir = content_dir.join(XHTML_FOLDER);
    let language = package::language(metadata);

    if let Some(cover) = flat.iter().find(|f| f.section.is_cover) {
        pkg.add_to_spine(xml_id(&cover.section.filename)?);
    }

    for item in flat {
        let section = item.section;
        let id = xml_id(&section.filename)?;

        // The cover page carries the book title.
        let title = if section.is_cover {
            metadata.title.as_str()
        } else {
            section.title.as_str()
        };
        let document = xhtml_document(title, language, section.css.as_deref(), &section.body);
        fs::write(xhtml_dir.join(&section.filename), document).map_err(|source| {
            Error::SectionWrite {
                filename: section.filename.clone(),
                source,
            }
        })?;

        pkg.add_to_manifest(ManifestEntry::new(
            id.clone(),
            format!("{XHTML_FOLDER}/{}", section.filename),
            XHTML_MEDIA_TYPE,
        ))?;
        if !section.is_cover {
            pkg.add_to_spine(id);
        }
    }
    Ok(())
}

/// Write `nav.xhtml` and `toc.ncx` and register both.
fn write_toc(
    content_dir: &Path,
    metadata: &Metadata,
    toc: &TableOfContents,
    pkg: &mut PackageBuilder,
) -> Result<()> {
    pkg.add_to_manifest(
        ManifestEntry::new(NAV_ID, NAV_FILENAME, XHTML_MEDIA_TYPE).with_properties(NAV_PROPERTY),
    )?;
    pkg.add_to_manifest(ManifestEntry::new(NCX_ID, NCX_FILENAME, NCX_MEDIA_TYPE))?;

    let nav = toc.to_nav_xhtml(NAV_TITLE, package::language(metadata));
    fs::write(content_dir.join(NAV_FILENAME), nav).map_err(|source| Error::SectionWrite {
        filename: NAV_FILENAME.to_string(),
        source,
    })?;

    let ncx = toc.to_ncx(&metadata.title, &package::identifier(metadata));
    fs::write(content_dir.join(NCX_FILENAME), ncx).map_err(|source| Error::SectionWrite {
        filename: NCX_FILENAME.to_string(),
        source,
    })
}
