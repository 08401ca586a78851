//! Table of contents: the EPUB 3 navigation document and the NCX fallback.
//!
//! Both are rendered from one [`TableOfContents`], so they share entry order
//! and numbering.

use std::collections::HashMap;

use super::XHTML_FOLDER;
use super::sections::{FlatSection, Parent};
use super::xhtml::xhtml_document;
use crate::error::{Error, Result};
use crate::util::{encode_href, escape_xml};

/// One navigation entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    /// Pre-order index of the section this entry points at.
    pub order: usize,
    pub title: String,
    /// Href relative to the package document.
    pub href: String,
    /// Index of the parent entry in [`TableOfContents::entries`].
    pub parent: Option<usize>,
    /// Nesting depth; top-level entries are at depth 1.
    pub depth: usize,
    children: Vec<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct TableOfContents {
    entries: Vec<TocEntry>,
    roots: Vec<usize>,
}

impl TableOfContents {
    /// Build the table of contents from pre-ordered sections.
    ///
    /// The cover section is reading-order content only and gets no entry.
    /// Every other section nests under the entry of its parent, which
    /// pre-order guarantees has already been inserted.
    pub fn build(flat: &[FlatSection<'_>], parents: &HashMap<&str, Parent<'_>>) -> Result<Self> {
        let mut toc = TableOfContents::default();
        let mut by_filename: HashMap<&str, usize> = HashMap::new();

        for item in flat {
            let section = item.section;
            if section.is_cover {
                continue;
            }

            let parent = match parents.get(section.filename.as_str()) {
                Some(Parent::Section(parent)) => {
                    let index = by_filename
                        .get(parent)
                        .copied()
                        .ok_or_else(|| Error::TocParentMissing(parent.to_string()))?;
                    Some(index)
                }
                Some(Parent::Root) | None => None,
            };

            let index = toc.entries.len();
            let depth = parent.map_or(1, |p| toc.entries[p].depth + 1);
            toc.entries.push(TocEntry {
                order: item.order,
                title: section.title.clone(),
                href: encode_href(&format!("{XHTML_FOLDER}/{}", section.filename)),
                parent,
                depth,
                children: Vec::new(),
            });
            match parent {
                Some(p) => toc.entries[p].children.push(index),
                None => toc.roots.push(index),
            }
            by_filename.insert(section.filename.as_str(), index);
        }

        Ok(toc)
    }

    /// All entries in reading order (the flat NCX sequence).
    pub fn entries(&self) -> &[TocEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Top-level entries in order.
    pub fn top_level(&self) -> impl Iterator<Item = &TocEntry> {
        self.roots.iter().map(|&i| &self.entries[i])
    }

    /// Direct children of `entry` in order.
    pub fn children<'a>(&'a self, entry: &'a TocEntry) -> impl Iterator<Item = &'a TocEntry> {
        entry.children.iter().map(|&i| &self.entries[i])
    }

    pub fn max_depth(&self) -> usize {
        self.entries.iter().map(|e| e.depth).max().unwrap_or(1)
    }

    /// Render `nav.xhtml`.
    pub fn to_nav_xhtml(&self, title: &str, language: &str) -> String {
        let mut body = String::new();
        body.push_str("    <nav epub:type=\"toc\" id=\"toc\">\n");
        body.push_str(&format!("      <h1>{}</h1>\n", escape_xml(title)));
        self.write_nav_list(&mut body, &self.roots, 3);
        body.push_str("    </nav>\n");

        xhtml_document(title, language, None, &body)
    }

    fn write_nav_list(&self, out: &mut String, indices: &[usize], indent: usize) {
        let pad = "  ".repeat(indent);
        out.push_str(&format!("{pad}<ol>\n"));
        for &i in indices {
            let entry = &self.entries[i];
            out.push_str(&format!(
                "{pad}  <li><a href=\"{}\">{}</a>",
                escape_xml(&entry.href),
                escape_xml(&entry.title)
            ));
            if entry.children.is_empty() {
                out.push_str("</li>\n");
            } else {
                out.push('\n');
                self.write_nav_list(out, &entry.children, indent + 2);
                out.push_str(&format!("{pad}  </li>\n"));
            }
        }
        out.push_str(&format!("{pad}</ol>\n"));
    }

    /// Render `toc.ncx`.
    pub fn to_ncx(&self, title: &str, identifier: &str) -> String {
        let mut ncx = String::new();

        ncx.push_str(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head>
    <meta name="dtb:uid" content=""#,
        );
        ncx.push_str(&escape_xml(identifier));
        ncx.push_str(&format!(
            r#""/>
    <meta name="dtb:depth" content="{}"/>
    <meta name="dtb:totalPageCount" content="0"/>
    <meta name="dtb:maxPageNumber" content="0"/>
  </head>
  <docTitle>
    <text>"#,
            self.max_depth()
        ));
        ncx.push_str(&escape_xml(title));
        ncx.push_str(
            r#"</text>
  </docTitle>
  <navMap>
"#,
        );

        let mut play_order = 1;
        self.write_nav_points(&mut ncx, &self.roots, &mut play_order, 2);

        ncx.push_str("  </navMap>\n</ncx>\n");
        ncx
    }

    /// Recursively write navPoint elements.
    fn write_nav_points(
        &self,
        ncx: &mut String,
        indices: &[usize],
        play_order: &mut usize,
        indent: usize,
    ) {
        let indent_str = "  ".repeat(indent);

        for &i in indices {
            let entry = &self.entries[i];
            ncx.push_str(&format!(
                "{}<navPoint id=\"navPoint-{}\" playOrder=\"{}\">\n",
                indent_str, entry.order, play_order
            ));
            ncx.push_str(&format!(
                "{}  <navLabel><text>{}</text></navLabel>\n",
                indent_str,
                escape_xml(&entry.title)
            ));
            ncx.push_str(&format!(
                "{}  <content src=\"{}\"/>\n",
                indent_str,
                escape_xml(&entry.href)
            ));

            *play_order += 1;

            if !entry.children.is_empty() {
                self.write_nav_points(ncx, &entry.children, play_order, indent + 1);
            }

            ncx.push_str(&format!("{}</navPoint>\n", indent_str));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::Section;
    use crate::epub::sections::SectionRegistry;

    fn sample_registry() -> SectionRegistry {
        let mut registry = SectionRegistry::new();
        let mut cover = Section::new("cover.xhtml", "Cover", "");
        cover.is_cover = true;
        registry.add_section(cover).unwrap();
        registry.add_section(Section::new("A.xhtml", "A", "")).unwrap();
        registry.add_section(Section::new("B.xhtml", "B", "")).unwrap();
        registry
            .add_subsection("B.xhtml", Section::new("B1.xhtml", "B1", ""))
            .unwrap();
        registry
    }

    fn build(registry: &SectionRegistry) -> TableOfContents {
        TableOfContents::build(&registry.flatten(), &registry.parent_map()).unwrap()
    }

    #[test]
    fn test_hierarchy_and_cover_exclusion() {
        let registry = sample_registry();
        let toc = build(&registry);

        let top: Vec<_> = toc.top_level().map(|e| e.title.as_str()).collect();
        assert_eq!(top, ["A", "B"]);

        let b = toc.top_level().nth(1).unwrap();
        let nested: Vec<_> = toc.children(b).map(|e| e.title.as_str()).collect();
        assert_eq!(nested, ["B1"]);

        assert!(toc.entries().iter().all(|e| e.title != "Cover"));
    }

    #[test]
    fn test_flat_sequence_shares_order_index() {
        let registry = sample_registry();
        let toc = build(&registry);

        let flat: Vec<_> = toc
            .entries()
            .iter()
            .map(|e| (e.order, e.title.as_str(), e.depth))
            .collect();
        // Order 0 belongs to the cover, which has no entry.
        assert_eq!(flat, [(1, "A", 1), (2, "B", 1), (3, "B1", 2)]);
        assert_eq!(toc.entries()[2].parent, Some(1));
        assert_eq!(toc.max_depth(), 2);
    }

    #[test]
    fn test_missing_parent_entry() {
        let section = Section::new("child.xhtml", "Child", "");
        let flat = [FlatSection {
            order: 0,
            depth: 2,
            parent: Parent::Section("ghost.xhtml"),
            section: &section,
        }];
        let parents = HashMap::from([("child.xhtml", Parent::Section("ghost.xhtml"))]);

        assert!(matches!(
            TableOfContents::build(&flat, &parents),
            Err(Error::TocParentMissing(p)) if p == "ghost.xhtml"
        ));
    }

    #[test]
    fn test_nav_document() {
        let registry = sample_registry();
        let nav = build(&registry).to_nav_xhtml("Contents", "en");

        assert!(nav.contains("<nav epub:type=\"toc\" id=\"toc\">"));
        assert!(nav.contains("<li><a href=\"xhtml/A.xhtml\">A</a></li>"));
        assert!(nav.contains("<li><a href=\"xhtml/B.xhtml\">B</a>\n"));
        assert!(nav.contains("<li><a href=\"xhtml/B1.xhtml\">B1</a></li>"));
        assert!(!nav.contains("cover.xhtml"));
        let b = nav.find("B.xhtml").unwrap();
        let b1 = nav.find("B1.xhtml").unwrap();
        assert!(b < b1);
    }

    #[test]
    fn test_ncx_document() {
        let registry = sample_registry();
        let ncx = build(&registry).to_ncx("Book", "urn:uuid:x");

        assert!(ncx.contains("<meta name=\"dtb:uid\" content=\"urn:uuid:x\"/>"));
        assert!(ncx.contains("<meta name=\"dtb:depth\" content=\"2\"/>"));
        assert!(ncx.contains("<navPoint id=\"navPoint-1\" playOrder=\"1\">"));
        assert!(ncx.contains("<navPoint id=\"navPoint-2\" playOrder=\"2\">"));
        assert!(ncx.contains("<navPoint id=\"navPoint-3\" playOrder=\"3\">"));
        assert!(ncx.contains("<content src=\"xhtml/B1.xhtml\"/>"));
        assert!(!ncx.contains("cover.xhtml"));
    }

    #[test]
    fn test_hrefs_are_percent_encoded() {
        let mut registry = SectionRegistry::new();
        registry
            .add_section(Section::new("chapter one.xhtml", "One", ""))
            .unwrap();
        let toc = build(&registry);
        assert_eq!(toc.entries()[0].href, "xhtml/chapter%20one.xhtml");
    }
}
