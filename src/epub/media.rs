//! Media staging: fetch each asset, store it in its class folder, and list it
//! in the manifest.

use std::fs;
use std::path::Path;

use crate::book::{MediaAsset, MediaClass};
use crate::error::{Error, Result};
use crate::io::ByteSource;
use crate::util::check_filename;

use super::id::xml_id;
use super::package::{COVER_IMAGE_PROPERTY, ManifestEntry, PackageBuilder};

pub struct MediaRegistrar<'a> {
    source: &'a dyn ByteSource,
}

impl<'a> MediaRegistrar<'a> {
    pub fn new(source: &'a dyn ByteSource) -> Self {
        Self { source }
    }

    /// Stage `assets` under `content_dir` and add one manifest entry per asset.
    ///
    /// Classes are processed in [`MediaClass::ALL`] order and assets in
    /// input order. A class folder is only created when the class has
    /// assets. The first failed fetch stops registration; entries added
    /// before it stay in `pkg`.
    pub fn register(
        &self,
        assets: &[MediaAsset],
        content_dir: &Path,
        pkg: &mut PackageBuilder,
    ) -> Result<()> {
        if assets.iter().filter(|a| a.is_cover).count() > 1 {
            return Err(Error::MultipleCovers);
        }

        for class in MediaClass::ALL {
            let mut class_assets = assets.iter().filter(|a| a.class == class).peekable();
            if class_assets.peek().is_none() {
                continue;
            }

            let folder = content_dir.join(class.folder());
            fs::create_dir(&folder).map_err(Error::Staging)?;

            for asset in class_assets {
                self.register_one(asset, &folder, pkg)?;
            }
        }
        Ok(())
    }

    fn register_one(&self, asset: &MediaAsset, folder: &Path, pkg: &mut PackageBuilder) -> Result<()> {
        check_filename(&asset.filename)?;
        let id = xml_id(&asset.filename)?;
        let data = self
            .source
            .fetch(&asset.source)
            .map_err(|source| Error::MediaFetch {
                filename: asset.filename.clone(),
                locator: asset.source.clone(),
                source,
            })?;
        log::debug!(
            "fetched {} ({} bytes) from {} source",
            asset.filename,
            data.len(),
            self.source.name()
        );

        fs::write(folder.join(&asset.filename), &data).map_err(Error::Staging)?;

        let media_type = detect_media_type(&data, &asset.filename, asset.class);
        let mut entry = ManifestEntry::new(id, asset.href(), media_type);
        if asset.is_cover {
            entry = entry.with_properties(COVER_IMAGE_PROPERTY);
        }
        pkg.add_to_manifest(entry)
    }
}

/// Determine a media type from content, falling back to the file extension.
pub fn detect_media_type(data: &[u8], filename: &str, class: MediaClass) -> String {
    sniff_media_type(data, class)
        .map(str::to_string)
        .unwrap_or_else(|| guess_media_type(filename))
}

fn sniff_media_type(data: &[u8], class: MediaClass) -> Option<&'static str> {
    let media_type = match data {
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => "image/png",
        [b'G', b'I', b'F', b'8', b'7' | b'9', b'a', ..] => "image/gif",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        [b'w', b'O', b'F', b'F', ..] => "font/woff",
        [b'w', b'O', b'F', b'2', ..] => "font/woff2",
        [b'O', b'T', b'T', b'O', ..] => "font/otf",
        [0x00, 0x01, 0x00, 0x00, ..] if class == MediaClass::Font => "font/ttf",
        [b'I', b'D', b'3', ..] => "audio/mpeg",
        [b'O', b'g', b'g', b'S', ..] if class == MediaClass::Video => "video/ogg",
        [b'O', b'g', b'g', b'S', ..] => "audio/ogg",
        [0x1A, 0x45, 0xDF, 0xA3, ..] => "video/webm",
        [_, _, _, _, b'f', b't', b'y', b'p', b'M', b'4', b'A', ..] => "audio/mp4",
        [_, _, _, _, b'f', b't', b'y', b'p', ..] => "video/mp4",
        _ => return None,
    };
    Some(media_type)
}

/// Guess media type from file extension.
fn guess_media_type(path: &str) -> String {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "xhtml" | "html" | "htm" => "application/xhtml+xml",
        "css" => "text/css",
        "js" => "application/javascript",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "ogg" | "oga" => "audio/ogg",
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        _ => "application/octet-stream",
    }
    .to_string()
}
