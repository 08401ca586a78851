//! Content units that make up a book: metadata, sections, and media assets.

/// Book-level metadata written into the package document.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    pub title: String,
    pub authors: Vec<String>,
    /// BCP 47 language tag; `en` when empty.
    pub language: String,
    /// Unique identifier; derived from the title when empty.
    pub identifier: String,
    pub description: Option<String>,
    /// Page progression direction (`ltr`, `rtl` or `default`).
    pub ppd: Option<String>,
    /// `dcterms:modified` value; the render time when unset.
    pub modified: Option<String>,
}

impl Metadata {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.authors.push(author.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = identifier.into();
        self
    }
}

/// A unit of reading-order content, written as one XHTML file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    /// Filename inside the `xhtml` folder; unique across the whole book.
    pub filename: String,
    pub title: String,
    /// XHTML fragment placed inside `<body>`.
    pub body: String,
    /// Stylesheet href relative to the section file, e.g. `../css/main.css`.
    pub css: Option<String>,
    pub is_cover: bool,
}

impl Section {
    pub fn new(filename: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            title: title.into(),
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn with_css(mut self, css: impl Into<String>) -> Self {
        self.css = Some(css.into());
        self
    }
}

/// Kind of media asset; each kind is staged into its own subfolder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaClass {
    Css,
    Font,
    Image,
    Video,
    Audio,
}

impl MediaClass {
    /// Registration order used when staging media.
    pub const ALL: [MediaClass; 5] = [
        MediaClass::Css,
        MediaClass::Font,
        MediaClass::Image,
        MediaClass::Video,
        MediaClass::Audio,
    ];

    /// Subfolder of the content folder holding this class.
    pub fn folder(self) -> &'static str {
        match self {
            MediaClass::Css => "css",
            MediaClass::Font => "fonts",
            MediaClass::Image => "images",
            MediaClass::Video => "videos",
            MediaClass::Audio => "audio",
        }
    }
}

/// An external file copied into the book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAsset {
    /// Filename inside the class folder.
    pub filename: String,
    /// Where the bytes come from; interpreted by the [`ByteSource`](crate::io::ByteSource).
    pub source: String,
    pub class: MediaClass,
    pub is_cover: bool,
}

impl MediaAsset {
    pub fn new(class: MediaClass, filename: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            source: source.into(),
            class,
            is_cover: false,
        }
    }

    /// Path relative to the package document, e.g. `images/cover.jpg`.
    pub fn href(&self) -> String {
        format!("{}/{}", self.class.folder(), self.filename)
    }
}
