//! Package document (`package.opf`): metadata, manifest, and spine.

use std::collections::HashSet;

use chrono::Utc;

use crate::book::Metadata;
use crate::error::{Error, Result};
use crate::util::{encode_href, escape_xml, format_modified};

use super::id::name_uuid;

pub const NAV_PROPERTY: &str = "nav";
pub const COVER_IMAGE_PROPERTY: &str = "cover-image";
pub const NCX_MEDIA_TYPE: &str = "application/x-dtbncx+xml";

/// A resource listed in the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub id: String,
    /// Path relative to the package document, unencoded.
    pub href: String,
    pub media_type: String,
    pub properties: Option<String>,
}

impl ManifestEntry {
    pub fn new(id: impl Into<String>, href: impl Into<String>, media_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            href: href.into(),
            media_type: media_type.into(),
            properties: None,
        }
    }

    pub fn with_properties(mut self, properties: impl Into<String>) -> Self {
        self.properties = Some(properties.into());
        self
    }
}

/// Collects manifest and spine contributions during a render.
#[derive(Debug, Default)]
pub struct PackageBuilder {
    manifest: Vec<ManifestEntry>,
    ids: HashSet<String>,
    spine: Vec<String>,
}

impl PackageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a manifest entry; ids must be unique.
    pub fn add_to_manifest(&mut self, entry: ManifestEntry) -> Result<()> {
        if !self.ids.insert(entry.id.clone()) {
            return Err(Error::Package(format!(
                "duplicate manifest id {:?} ({})",
                entry.id, entry.href
            )));
        }
        log::debug!("manifest: {} -> {}", entry.id, entry.href);
        self.manifest.push(entry);
        Ok(())
    }

    /// Append an id to the reading order.
    pub fn add_to_spine(&mut self, id: impl Into<String>) {
        self.spine.push(id.into());
    }

    pub fn manifest(&self) -> &[ManifestEntry] {
        &self.manifest
    }

    pub fn spine(&self) -> &[String] {
        &self.spine
    }

    /// Validate the collected entries and render the package document.
    ///
    /// Consumes the builder: a render emits its package document once.
    pub fn finish(self, metadata: &Metadata) -> Result<String> {
        self.validate()?;
        Ok(self.render(metadata))
    }

    fn validate(&self) -> Result<()> {
        let nav = self
            .manifest
            .iter()
            .filter(|e| e.properties.as_deref() == Some(NAV_PROPERTY))
            .count();
        if nav != 1 {
            return Err(Error::Package(format!(
                "expected exactly one navigation document, found {nav}"
            )));
        }

        let ncx = self
            .manifest
            .iter()
            .filter(|e| e.media_type == NCX_MEDIA_TYPE)
            .count();
        if ncx != 1 {
            return Err(Error::Package(format!(
                "expected exactly one NCX document, found {ncx}"
            )));
        }

        if self.spine.is_empty() {
            return Err(Error::Package("spine is empty".to_string()));
        }
        let mut seen = HashSet::new();
        for id in &self.spine {
            if !self.ids.contains(id) {
                return Err(Error::Package(format!("spine references unknown id {id:?}")));
            }
            if !seen.insert(id.as_str()) {
                return Err(Error::Package(format!("spine references {id:?} twice")));
            }
        }
        Ok(())
    }

    fn render(&self, metadata: &Metadata) -> String {
        let mut opf = String::new();

        opf.push_str(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="pub-id">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
"#,
        );

        opf.push_str(&format!(
            "    <dc:identifier id=\"pub-id\">{}</dc:identifier>\n",
            escape_xml(&identifier(metadata))
        ));
        opf.push_str(&format!(
            "    <dc:title>{}</dc:title>\n",
            escape_xml(&metadata.title)
        ));
        opf.push_str(&format!(
            "    <dc:language>{}</dc:language>\n",
            escape_xml(language(metadata))
        ));
        for author in &metadata.authors {
            opf.push_str(&format!(
                "    <dc:creator>{}</dc:creator>\n",
                escape_xml(author)
            ));
        }
        if let Some(ref description) = metadata.description {
            opf.push_str(&format!(
                "    <dc:description>{}</dc:description>\n",
                escape_xml(description)
            ));
        }
        let modified = metadata
            .modified
            .clone()
            .unwrap_or_else(|| format_modified(Utc::now()));
        opf.push_str(&format!(
            "    <meta property=\"dcterms:modified\">{}</meta>\n",
            escape_xml(&modified)
        ));
        // EPUB 2 readers look for the cover through this meta.
        if let Some(cover) = self
            .manifest
            .iter()
            .find(|e| e.properties.as_deref() == Some(COVER_IMAGE_PROPERTY))
        {
            opf.push_str(&format!(
                "    <meta name=\"cover\" content=\"{}\"/>\n",
                escape_xml(&cover.id)
            ));
        }
        opf.push_str("  </metadata>\n");

        opf.push_str("  <manifest>\n");
        for entry in &self.manifest {
            opf.push_str(&format!(
                "    <item id=\"{}\" href=\"{}\" media-type=\"{}\"",
                escape_xml(&entry.id),
                escape_xml(&encode_href(&entry.href)),
                escape_xml(&entry.media_type)
            ));
            if let Some(ref properties) = entry.properties {
                opf.push_str(&format!(" properties=\"{}\"", escape_xml(properties)));
            }
            opf.push_str("/>\n");
        }
        opf.push_str("  </manifest>\n");

        let ncx_id = self
            .manifest
            .iter()
            .find(|e| e.media_type == NCX_MEDIA_TYPE)
            .map(|e| e.id.as_str())
            .unwrap_or("ncx");
        opf.push_str(&format!("  <spine toc=\"{}\"", escape_xml(ncx_id)));
        if let Some(ref ppd) = metadata.ppd {
            opf.push_str(&format!(
                " page-progression-direction=\"{}\"",
                escape_xml(ppd)
            ));
        }
        opf.push_str(">\n");
        for id in &self.spine {
            opf.push_str(&format!("    <itemref idref=\"{}\"/>\n", escape_xml(id)));
        }
        opf.push_str("  </spine>\n");

        opf.push_str("</package>\n");
        opf
    }
}

/// The publication identifier, derived from the title when unset.
pub fn identifier(metadata: &Metadata) -> String {
    if metadata.identifier.is_empty() {
        format!("urn:uuid:{}", name_uuid(&metadata.title))
    } else {
        metadata.identifier.clone()
    }
}

pub fn language(metadata: &Metadata) -> &str {
    if metadata.language.is_empty() {
        "en"
    } else {
        &metadata.language
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder_with_toc() -> PackageBuilder {
        let mut pkg = PackageBuilder::new();
        pkg.add_to_manifest(
            ManifestEntry::new("nav", "nav.xhtml", "application/xhtml+xml")
                .with_properties(NAV_PROPERTY),
        )
        .unwrap();
        pkg.add_to_manifest(ManifestEntry::new("ncx", "toc.ncx", NCX_MEDIA_TYPE))
            .unwrap();
        pkg
    }

    fn metadata() -> Metadata {
        let mut metadata = Metadata::new("Test & Title").with_author("Ann Author");
        metadata.modified = Some("2024-05-01T12:00:00Z".to_string());
        metadata
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut pkg = PackageBuilder::new();
        pkg.add_to_manifest(ManifestEntry::new("a", "a.xhtml", "application/xhtml+xml"))
            .unwrap();
        let err = pkg
            .add_to_manifest(ManifestEntry::new("a", "b.xhtml", "application/xhtml+xml"))
            .unwrap_err();
        assert!(matches!(err, Error::Package(_)));
        assert_eq!(pkg.manifest().len(), 1);
    }

    #[test]
    fn test_requires_single_nav_and_ncx() {
        let pkg = PackageBuilder::new();
        assert!(matches!(pkg.finish(&metadata()), Err(Error::Package(_))));

        let mut pkg = PackageBuilder::new();
        pkg.add_to_manifest(
            ManifestEntry::new("nav", "nav.xhtml", "application/xhtml+xml")
                .with_properties(NAV_PROPERTY),
        )
        .unwrap();
        assert!(matches!(pkg.finish(&metadata()), Err(Error::Package(_))));
    }

    #[test]
    fn test_spine_must_reference_manifest_once() {
        let mut pkg = builder_with_toc();
        pkg.add_to_spine("missing");
        assert!(pkg.finish(&metadata()).is_err());

        let mut pkg = builder_with_toc();
        pkg.add_to_manifest(ManifestEntry::new("a", "xhtml/a.xhtml", "application/xhtml+xml"))
            .unwrap();
        pkg.add_to_spine("a");
        pkg.add_to_spine("a");
        assert!(pkg.finish(&metadata()).is_err());
    }

    #[test]
    fn test_empty_spine_rejected() {
        let pkg = builder_with_toc();
        assert!(matches!(
            pkg.finish(&metadata()),
            Err(Error::Package(ref msg)) if msg.contains("spine")
        ));
    }

    #[test]
    fn test_render_package_document() {
        let mut pkg = builder_with_toc();
        pkg.add_to_manifest(
            ManifestEntry::new("img", "images/my cover.jpg", "image/jpeg")
                .with_properties(COVER_IMAGE_PROPERTY),
        )
        .unwrap();
        pkg.add_to_manifest(ManifestEntry::new("a", "xhtml/a.xhtml", "application/xhtml+xml"))
            .unwrap();
        pkg.add_to_spine("a");

        let opf = pkg.finish(&metadata()).unwrap();

        assert!(opf.contains("<dc:title>Test &amp; Title</dc:title>"));
        assert!(opf.contains("<dc:creator>Ann Author</dc:creator>"));
        assert!(opf.contains("<dc:language>en</dc:language>"));
        assert!(opf.contains("<meta property=\"dcterms:modified\">2024-05-01T12:00:00Z</meta>"));
        assert!(opf.contains("<meta name=\"cover\" content=\"img\"/>"));
        assert!(opf.contains(
            "<item id=\"img\" href=\"images/my%20cover.jpg\" media-type=\"image/jpeg\" properties=\"cover-image\"/>"
        ));
        assert!(opf.contains(
            "<item id=\"nav\" href=\"nav.xhtml\" media-type=\"application/xhtml+xml\" properties=\"nav\"/>"
        ));
        assert!(opf.contains("<spine toc=\"ncx\">\n    <itemref idref=\"a\"/>\n  </spine>"));
    }

    #[test]
    fn test_identifier_defaults_to_title_uuid() {
        let metadata = Metadata::new("My Book");
        assert_eq!(
            identifier(&metadata),
            "urn:uuid:4a2dab8e-44ea-52f7-9b39-4a323bbce7e1"
        );
        let metadata = metadata.with_identifier("isbn:123");
        assert_eq!(identifier(&metadata), "isbn:123");
    }

    #[test]
    fn test_page_progression_direction() {
        let mut pkg = builder_with_toc();
        let mut metadata = metadata();
        metadata.ppd = Some("rtl".to_string());
        pkg.add_to_spine("nav");
        let opf = pkg.finish(&metadata).unwrap();
        assert!(opf.contains("<spine toc=\"ncx\" page-progression-direction=\"rtl\">"));
    }
}
