//! Zip archive of a token's attachments

use crate::domain::errors::BurstError;
use crate::domain::Result;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Bundles `files` into a deflated zip at `target`
///
/// Entries are stored flat under their file names; a name already present
/// in the archive is skipped.
pub fn archive_attachments(files: &[PathBuf], target: &Path) -> Result<PathBuf> {
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let file = File::create(target)?;
    let mut writer = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut names = Vec::with_capacity(files.len());
    for path in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| BurstError::Io(format!("Cannot archive '{}': no file name", path.display())))?;
        if names.contains(&name) {
            tracing::warn!(attachment = %path.display(), "Duplicate attachment name, skipped");
            continue;
        }

        writer.start_file(name.as_str(), options)?;
        let mut source = File::open(path)?;
        io::copy(&mut source, &mut writer)?;
        names.push(name);
    }

    writer.finish()?;
    tracing::debug!(archive = %target.display(), entries = names.len(), "Attachments archived");
    Ok(target.to_path_buf())
}
