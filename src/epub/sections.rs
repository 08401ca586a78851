//! Section tree storage.
//!
//! Sections live in a flat arena; each node records its parent index and the
//! indices of its children in insertion order. Nothing points back up the
//! tree by reference, so a cycle cannot be expressed.

use std::collections::HashMap;

use crate::book::Section;
use crate::error::{Error, Result};
use crate::util::check_filename;

/// Index of a section inside a [`SectionRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SectionId(usize);

/// Parent of a section in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parent<'a> {
    /// Top-level section.
    Root,
    /// Nested under the section with this filename.
    Section(&'a str),
}

/// One section in pre-order, as produced by [`SectionRegistry::flatten`].
#[derive(Debug, Clone, Copy)]
pub struct FlatSection<'a> {
    /// Position in pre-order, starting at 0.
    pub order: usize,
    /// Nesting depth; top-level sections are at depth 1.
    pub depth: usize,
    pub parent: Parent<'a>,
    pub section: &'a Section,
}

#[derive(Debug, Clone)]
struct Node {
    section: Section,
    parent: Option<SectionId>,
    children: Vec<SectionId>,
}

#[derive(Debug, Clone, Default)]
pub struct SectionRegistry {
    nodes: Vec<Node>,
    roots: Vec<SectionId>,
    by_filename: HashMap<String, SectionId>,
}

impl SectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a top-level section.
    ///
    /// An empty filename is replaced by the next free `sectionNNNN.xhtml`.
    /// A cover section is always kept in front of the other top-level
    /// sections.
    pub fn add_section(&mut self, section: Section) -> Result<SectionId> {
        let is_cover = section.is_cover;
        let id = self.insert(section, None)?;
        if is_cover {
            self.roots.insert(0, id);
        } else {
            self.roots.push(id);
        }
        Ok(id)
    }

    /// Append a section as the last child of `parent_filename`.
    pub fn add_subsection(&mut self, parent_filename: &str, section: Section) -> Result<SectionId> {
        let parent = *self
            .by_filename
            .get(parent_filename)
            .ok_or_else(|| Error::ParentNotFound(parent_filename.to_string()))?;
        if self.nodes[parent.0].section.is_cover {
            return Err(Error::ParentNotFound(format!(
                "{parent_filename} (cover sections cannot have children)"
            )));
        }
        if section.is_cover {
            return Err(Error::Package(format!(
                "cover section {:?} must be top-level",
                section.filename
            )));
        }
        let id = self.insert(section, Some(parent))?;
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    pub fn section(&self, id: SectionId) -> &Section {
        &self.nodes[id.0].section
    }

    /// The section flagged as cover, if any.
    pub fn cover(&self) -> Option<&Section> {
        self.nodes
            .iter()
            .map(|node| &node.section)
            .find(|section| section.is_cover)
    }

    /// Walk the tree depth-first, emitting each section before its children.
    pub fn flatten(&self) -> Vec<FlatSection<'_>> {
        let mut out = Vec::with_capacity(self.nodes.len());
        // Stack holds (node, depth); children are pushed in reverse so the
        // first child is visited first.
        let mut stack: Vec<(SectionId, usize)> =
            self.roots.iter().rev().map(|&id| (id, 1)).collect();

        while let Some((id, depth)) = stack.pop() {
            let node = &self.nodes[id.0];
            out.push(FlatSection {
                order: out.len(),
                depth,
                parent: self.parent_of(node),
                section: &node.section,
            });
            stack.extend(node.children.iter().rev().map(|&child| (child, depth + 1)));
        }
        out
    }

    /// Map every section filename to its parent.
    pub fn parent_map(&self) -> HashMap<&str, Parent<'_>> {
        self.nodes
            .iter()
            .map(|node| (node.section.filename.as_str(), self.parent_of(node)))
            .collect()
    }

    fn parent_of(&self, node: &Node) -> Parent<'_> {
        match node.parent {
            Some(parent) => Parent::Section(&self.nodes[parent.0].section.filename),
            None => Parent::Root,
        }
    }

    fn insert(&mut self, mut section: Section, parent: Option<SectionId>) -> Result<SectionId> {
        if section.filename.is_empty() {
            section.filename = self.next_free_filename();
        }
        check_filename(&section.filename)?;
        if self.by_filename.contains_key(&section.filename) {
            return Err(Error::DuplicateFilename(section.filename));
        }
        if section.is_cover && self.cover().is_some() {
            return Err(Error::MultipleCovers);
        }

        let id = SectionId(self.nodes.len());
        self.by_filename.insert(section.filename.clone(), id);
        self.nodes.push(Node {
            section,
            parent,
            children: Vec::new(),
        });
        Ok(id)
    }

    fn next_free_filename(&self) -> String {
        (self.nodes.len() + 1..)
            .map(|n| format!("section{n:04}.xhtml"))
            .find(|name| !self.by_filename.contains_key(name))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn section(name: &str) -> Section {
        Section::new(name, name.to_uppercase(), "<p/>")
    }

    fn filenames(registry: &SectionRegistry) -> Vec<&str> {
        registry
            .flatten()
            .into_iter()
            .map(|flat| flat.section.filename.as_str())
            .collect()
    }

    #[test]
    fn test_flatten_is_preorder() {
        let mut registry = SectionRegistry::new();
        registry.add_section(section("a")).unwrap();
        registry.add_section(section("b")).unwrap();
        registry.add_section(section("c")).unwrap();
        // Children added after later siblings still appear right after
        // their parent.
        registry.add_subsection("a", section("a1")).unwrap();
        registry.add_subsection("a1", section("a1x")).unwrap();
        registry.add_subsection("a", section("a2")).unwrap();
        registry.add_subsection("b", section("b1")).unwrap();

        assert_eq!(
            filenames(&registry),
            ["a", "a1", "a1x", "a2", "b", "b1", "c"]
        );

        let flat = registry.flatten();
        let orders: Vec<_> = flat.iter().map(|f| f.order).collect();
        assert_eq!(orders, [0, 1, 2, 3, 4, 5, 6]);
        let depths: Vec<_> = flat.iter().map(|f| f.depth).collect();
        assert_eq!(depths, [1, 2, 3, 2, 1, 2, 1]);
    }

    #[test]
    fn test_parent_map() {
        let mut registry = SectionRegistry::new();
        registry.add_section(section("a")).unwrap();
        registry.add_section(section("b")).unwrap();
        registry.add_subsection("b", section("b1")).unwrap();
        registry.add_subsection("b1", section("b1a")).unwrap();

        let parents = registry.parent_map();
        assert_eq!(parents.len(), 4);
        assert_eq!(parents["a"], Parent::Root);
        assert_eq!(parents["b"], Parent::Root);
        assert_eq!(parents["b1"], Parent::Section("b"));
        assert_eq!(parents["b1a"], Parent::Section("b1"));
    }

    #[test]
    fn test_duplicate_filename_rejected_anywhere_in_tree() {
        let mut registry = SectionRegistry::new();
        registry.add_section(section("a")).unwrap();
        registry.add_subsection("a", section("a1")).unwrap();

        assert!(matches!(
            registry.add_section(section("a1")),
            Err(Error::DuplicateFilename(name)) if name == "a1"
        ));
        assert!(matches!(
            registry.add_subsection("a1", section("a")),
            Err(Error::DuplicateFilename(_))
        ));
    }

    #[test]
    fn test_unknown_parent() {
        let mut registry = SectionRegistry::new();
        assert!(matches!(
            registry.add_subsection("nope", section("a")),
            Err(Error::ParentNotFound(_))
        ));
        assert!(registry.flatten().is_empty());
    }

    #[test]
    fn test_path_like_filenames_rejected() {
        let mut registry = SectionRegistry::new();
        registry.add_section(section("a")).unwrap();

        assert!(matches!(
            registry.add_section(section("/tmp/escaped.xhtml")),
            Err(Error::InvalidFilename(ref name)) if name == "/tmp/escaped.xhtml"
        ));
        assert!(matches!(
            registry.add_subsection("a", section("../escaped.xhtml")),
            Err(Error::InvalidFilename(_))
        ));
        assert!(matches!(
            registry.add_section(section("nested/child.xhtml")),
            Err(Error::InvalidFilename(_))
        ));
        assert_eq!(filenames(&registry), ["a"]);
    }

    #[test]
    fn test_generated_filenames() {
        let mut registry = SectionRegistry::new();
        registry.add_section(section("section0002.xhtml")).unwrap();
        registry.add_section(Section::new("", "One", "")).unwrap();
        registry.add_section(Section::new("", "Two", "")).unwrap();

        assert_eq!(
            filenames(&registry),
            ["section0002.xhtml", "section0003.xhtml", "section0004.xhtml"]
        );
    }

    #[test]
    fn test_cover_goes_first() {
        let mut registry = SectionRegistry::new();
        registry.add_section(section("a")).unwrap();
        let mut cover = section("cover.xhtml");
        cover.is_cover = true;
        registry.add_section(cover.clone()).unwrap();

        assert_eq!(filenames(&registry), ["cover.xhtml", "a"]);
        assert_eq!(registry.cover().map(|s| s.filename.as_str()), Some("cover.xhtml"));

        cover.filename = "cover2.xhtml".to_string();
        assert!(matches!(registry.add_section(cover), Err(Error::MultipleCovers)));
        assert!(registry.add_subsection("cover.xhtml", section("x")).is_err());
    }

    /// Shape of a generated tree: each entry is the index of the parent among
    /// previously created nodes, or `None` for a top-level node.
    fn tree_shape() -> impl Strategy<Value = Vec<Option<usize>>> {
        prop::collection::vec(any::<Option<prop::sample::Index>>(), 1..40).prop_map(|picks| {
            picks
                .into_iter()
                .enumerate()
                .map(|(i, pick)| match pick {
                    Some(index) if i > 0 => Some(index.index(i)),
                    _ => None,
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_flatten_visits_parents_first(shape in tree_shape()) {
            let mut registry = SectionRegistry::new();
            for (i, parent) in shape.iter().enumerate() {
                let name = format!("s{i}");
                match parent {
                    Some(p) => registry.add_subsection(&format!("s{p}"), section(&name)).unwrap(),
                    None => registry.add_section(section(&name)).unwrap(),
                };
            }

            let flat = registry.flatten();
            prop_assert_eq!(flat.len(), shape.len());

            let position: HashMap<&str, usize> = flat
                .iter()
                .map(|f| (f.section.filename.as_str(), f.order))
                .collect();
            let parents = registry.parent_map();

            for (i, parent) in shape.iter().enumerate() {
                let name = format!("s{i}");
                match parent {
                    Some(p) => {
                        let parent_name = format!("s{p}");
                        prop_assert_eq!(parents[name.as_str()], Parent::Section(parent_name.as_str()));
                        prop_assert!(position[parent_name.as_str()] < position[name.as_str()]);
                    }
                    None => prop_assert_eq!(parents[name.as_str()], Parent::Root),
                }
            }

            // Every subtree is contiguous in pre-order: a node's descendants
            // directly follow it at greater depth.
            for (i, f) in flat.iter().enumerate() {
                if let Some(next) = flat.get(i + 1)
                    && next.depth > f.depth
                {
                    prop_assert_eq!(next.depth, f.depth + 1);
                    prop_assert_eq!(next.parent, Parent::Section(f.section.filename.as_str()));
                }
            }
        }
    }
}
