//! JSON book description used by the `bindery` binary.
//!
//! ```json
//! {
//!   "title": "Short Works",
//!   "authors": ["Epictetus"],
//!   "cover": "img/cover.jpg",
//!   "css": [{ "source": "style/main.css" }],
//!   "sections": [
//!     { "filename": "intro.xhtml", "title": "Introduction", "body_file": "text/intro.html", "css": "main.css" },
//!     { "title": "Discourses", "body": "<h1>Discourses</h1>", "children": [
//!       { "title": "Book I", "body_file": "text/book1.html" }
//!     ] }
//!   ]
//! }
//! ```
//!
//! Relative locators and `body_file` paths resolve against the recipe's
//! directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::book::{MediaAsset, MediaClass, Metadata, Section};
use crate::epub::{Epub, EpubConfig};
use crate::io::FileSource;
use crate::util::{basename, encode_href};

#[derive(Error, Debug)]
pub enum RecipeError {
    #[error("cannot read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid recipe: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Epub(#[from] crate::Error),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Recipe {
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    pub language: Option<String>,
    pub identifier: Option<String>,
    pub description: Option<String>,
    pub ppd: Option<String>,
    pub modified: Option<String>,
    /// Locator of the cover image.
    pub cover: Option<String>,
    #[serde(default)]
    pub css: Vec<RecipeAsset>,
    #[serde(default)]
    pub fonts: Vec<RecipeAsset>,
    #[serde(default)]
    pub images: Vec<RecipeAsset>,
    #[serde(default)]
    pub videos: Vec<RecipeAsset>,
    #[serde(default)]
    pub audio: Vec<RecipeAsset>,
    #[serde(default)]
    pub sections: Vec<RecipeSection>,
    pub compression_level: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecipeAsset {
    pub source: String,
    /// Name inside the book; the last path segment of `source` by default.
    pub filename: Option<String>,
}

impl RecipeAsset {
    fn filename(&self) -> String {
        self.filename
            .clone()
            .unwrap_or_else(|| basename(&self.source).to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecipeSection {
    #[serde(default)]
    pub filename: String,
    pub title: String,
    pub body: Option<String>,
    pub body_file: Option<String>,
    /// Filename of one of the recipe's stylesheets.
    pub css: Option<String>,
    #[serde(default)]
    pub children: Vec<RecipeSection>,
}

impl Recipe {
    pub fn from_json(json: &str) -> Result<Self, RecipeError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, RecipeError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| RecipeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Build an [`Epub`] whose media and body files resolve against `base`.
    pub fn build(&self, base: &Path) -> Result<Epub, RecipeError> {
        let config = EpubConfig {
            compression_level: self.compression_level,
        };
        let mut epub = Epub::new(&self.title)
            .with_source(FileSource::with_base(base))
            .with_config(config);

        epub.set_metadata(Metadata {
            title: self.title.clone(),
            authors: self.authors.clone(),
            language: self.language.clone().unwrap_or_default(),
            identifier: self.identifier.clone().unwrap_or_default(),
            description: self.description.clone(),
            ppd: self.ppd.clone(),
            modified: self.modified.clone(),
        });

        if let Some(ref cover) = self.cover {
            epub.set_cover(basename(cover), cover.as_str())?;
        }

        let classes = [
            (MediaClass::Css, &self.css),
            (MediaClass::Font, &self.fonts),
            (MediaClass::Image, &self.images),
            (MediaClass::Video, &self.videos),
            (MediaClass::Audio, &self.audio),
        ];
        for (class, assets) in classes {
            for asset in assets {
                epub.add_media(MediaAsset::new(class, asset.filename(), asset.source.as_str()))?;
            }
        }

        for section in &self.sections {
            add_section(&mut epub, None, section, base)?;
        }
        Ok(epub)
    }
}

fn add_section(
    epub: &mut Epub,
    parent: Option<&str>,
    recipe: &RecipeSection,
    base: &Path,
) -> Result<(), RecipeError> {
    let body = match (&recipe.body, &recipe.body_file) {
        (_, Some(file)) => {
            let path = base.join(file);
            fs::read_to_string(&path).map_err(|source| RecipeError::Io { path, source })?
        }
        (Some(body), None) => body.clone(),
        (None, None) => String::new(),
    };

    let mut section = Section::new(recipe.filename.as_str(), recipe.title.as_str(), body);
    if let Some(ref css) = recipe.css {
        section = section.with_css(format!(
            "../{}",
            encode_href(&format!("{}/{css}", MediaClass::Css.folder()))
        ));
    }

    let filename = match parent {
        Some(parent) => epub.add_subsection(parent, section)?,
        None => epub.add_section(section)?,
    };
    for child in &recipe.children {
        add_section(epub, Some(&filename), child, base)?;
    }
    Ok(())
}
