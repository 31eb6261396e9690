//! Zip packaging of the staging tree

use crate::requests::Result;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use std::fs::File;
use std::io::Write as _;
use std::path::Path;

/// Walks `staging` recursively and writes every regular file into a zip
/// container at `output`, named by its path relative to `staging`.
///
/// Symlinks are skipped, as are files that disappear between listing and
/// reading. The parent directory of `output` is created when missing.
/// A failed write is surfaced as is, already staged files are not touched.
pub fn compress_directory(output: &Path, staging: &Path) -> Result<()> {
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = File::create(output)?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);

    add_directory(&mut zip, staging, "", options)?;

    zip.finish()?;

    Ok(())
}

fn add_directory(
    zip: &mut ZipWriter<File>,
    dir: &Path,
    prefix: &str,
    options: SimpleFileOptions,
) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;

        if file_type.is_symlink() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        let entry_name = if prefix.is_empty() {
            name
        } else {
            format!("{prefix}/{name}")
        };

        if file_type.is_dir() {
            add_directory(zip, &entry.path(), &entry_name, options)?;
        } else if file_type.is_file() {
            let data = match std::fs::read(entry.path()) {
                Ok(data) => data,
                // listed but already gone, nothing to archive
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };

            zip.start_file(entry_name.as_str(), options)?;
            zip.write_all(&data)?;
        }
    }

    Ok(())
}
