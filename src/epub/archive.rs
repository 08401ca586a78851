//! OCF archiver: turns a staged directory into an EPUB ZIP stream.

use std::fs::File;
use std::io::{self, Seek, Write};
use std::path::Path;

use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::{Error, Result};
use crate::io::CountingWriter;

use super::MIMETYPE_FILENAME;

/// Zip the staging tree rooted at `root` into `sink`.
///
/// The `mimetype` file is written first and stored uncompressed; every other
/// regular file follows deflated, in file-name-sorted traversal order.
/// Directories and non-regular files (symlinks, devices) get no entry.
///
/// Returns the number of bytes written to `sink`. On failure the ZIP writer
/// is still finished before the error is returned, and the error carries the
/// relative path of the file being added and the bytes written so far.
pub fn write_archive<W: Write + Seek>(
    root: &Path,
    sink: W,
    compression_level: Option<i64>,
) -> Result<u64> {
    let counter = CountingWriter::new(sink).map_err(|source| Error::ArchiveWrite {
        path: String::new(),
        bytes_written: 0,
        source,
    })?;
    let written = counter.counter();
    let mut zip = ZipWriter::new(counter);

    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let deflated = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(compression_level);

    let result = add_mimetype(&mut zip, root, stored)
        .and_then(|()| add_tree(&mut zip, root, deflated));

    match result {
        Ok(()) => match zip.finish() {
            Ok(_) => Ok(written.get()),
            Err(e) => Err(Error::ArchiveWrite {
                path: String::new(),
                bytes_written: written.get(),
                source: io::Error::other(e),
            }),
        },
        Err((path, source)) => {
            if let Err(e) = zip.finish() {
                log::warn!("error closing EPUB archive: {e}");
            }
            Err(Error::ArchiveWrite {
                path,
                bytes_written: written.get(),
                source,
            })
        }
    }
}

type EntryResult = std::result::Result<(), (String, io::Error)>;

fn add_mimetype<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    root: &Path,
    options: SimpleFileOptions,
) -> EntryResult {
    add_file(zip, &root.join(MIMETYPE_FILENAME), MIMETYPE_FILENAME, options)
        .map_err(|e| (MIMETYPE_FILENAME.to_string(), e))
}

fn add_tree<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    root: &Path,
    options: SimpleFileOptions,
) -> EntryResult {
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e
                .path()
                .and_then(|p| p.strip_prefix(root).ok())
                .map(relative_name)
                .unwrap_or_default();
            (path, io::Error::from(e))
        })?;

        // Only regular files; walkdir does not follow symlinks, so links
        // show up with their own file type and are skipped here too.
        if !entry.file_type().is_file() {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let name = relative_name(relative);
        if name == MIMETYPE_FILENAME {
            continue;
        }

        add_file(zip, entry.path(), &name, options).map_err(|e| (name, e))?;
    }
    Ok(())
}

fn add_file<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    path: &Path,
    name: &str,
    options: SimpleFileOptions,
) -> io::Result<()> {
    let mut file = File::open(path)?;
    zip.start_file(name, options).map_err(io::Error::other)?;
    io::copy(&mut file, zip)?;
    Ok(())
}

/// Forward-slash form of a path relative to the staging root.
fn relative_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
