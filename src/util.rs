//! Small helpers shared by the document writers.

use std::borrow::Cow;
use std::path::{Component, Path};

use chrono::{DateTime, Utc};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::error::{Error, Result};

/// Characters left as-is in a path segment of an href.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Escape XML special characters.
pub fn escape_xml(s: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(s)
}

/// Percent-encode each segment of a relative path, keeping the slashes.
pub fn encode_href(path: &str) -> String {
    path.split('/')
        .map(|segment| utf8_percent_encode(segment, PATH_SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// Check that `name` can be staged as-is inside a single folder.
///
/// Separators of either platform, `.`/`..`, drive prefixes and NUL bytes are
/// all rejected, so joining the name onto a folder never leaves that folder.
pub fn check_filename(name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    let single = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !single || name.contains(['/', '\\', '\0']) {
        return Err(Error::InvalidFilename(name.to_string()));
    }
    Ok(())
}

/// Last path segment of a locator, accepting both separators.
pub fn basename(locator: &str) -> &str {
    locator.rsplit(['/', '\\']).next().unwrap_or(locator)
}

/// `dcterms:modified` form of a UTC instant: `YYYY-MM-DDThh:mm:ssZ`.
pub fn format_modified(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
