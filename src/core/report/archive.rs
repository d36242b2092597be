//! Single-entry gzip tar archives
//!
//! The tabular file is stored under its base name only, so extracting the
//! archive anywhere reproduces `rprt_<name><date>.csv` with no directories.

use crate::domain::{ReporterError, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Size and digest of a finished archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveInfo {
    /// Archive path
    pub path: PathBuf,

    /// Size in bytes
    pub bytes: u64,

    /// SHA-256 of the archive, hex encoded
    pub sha256: String,
}

/// Compress `source` into `archive_path` as a one-entry tar.gz
///
/// Runs on the blocking thread pool.
///
/// # Errors
///
/// Returns `ReporterError::Archive` if the source cannot be read or the
/// archive cannot be written.
pub async fn create_archive(source: &Path, archive_path: &Path) -> Result<ArchiveInfo> {
    let source = source.to_path_buf();
    let archive_path = archive_path.to_path_buf();

    tokio::task::spawn_blocking(move || create_archive_blocking(&source, &archive_path))
        .await
        .map_err(|e| ReporterError::archive("Archive task failed").with_source(e))?
}

fn create_archive_blocking(source: &Path, archive_path: &Path) -> Result<ArchiveInfo> {
    let entry_name = source.file_name().ok_or_else(|| {
        ReporterError::archive(format!("{} has no file name", source.display()))
    })?;

    let file = File::create(archive_path).map_err(|e| archive_error(archive_path, "create", e))?;
    let encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    let mut builder = tar::Builder::new(encoder);

    builder
        .append_path_with_name(source, entry_name)
        .map_err(|e| archive_error(source, "add", e))?;

    let encoder = builder
        .into_inner()
        .map_err(|e| archive_error(archive_path, "finish", e))?;
    let mut writer = encoder
        .finish()
        .map_err(|e| archive_error(archive_path, "compress", e))?;
    writer
        .flush()
        .map_err(|e| archive_error(archive_path, "flush", e))?;
    drop(writer);

    let (bytes, sha256) = digest_file(archive_path)?;

    Ok(ArchiveInfo {
        path: archive_path.to_path_buf(),
        bytes,
        sha256,
    })
}

/// Calculate size and SHA-256 checksum of a file
fn digest_file(path: &Path) -> Result<(u64, String)> {
    let mut file = File::open(path).map_err(|e| archive_error(path, "read back", e))?;
    let mut hasher = Sha256::new();
    let bytes =
        std::io::copy(&mut file, &mut hasher).map_err(|e| archive_error(path, "read back", e))?;
    let result = hasher.finalize();

    Ok((bytes, format!("{result:x}")))
}

fn archive_error(path: &Path, action: &str, e: std::io::Error) -> ReporterError {
    ReporterError::archive(format!("Failed to {} {}", action, path.display())).with_source(e)
}
