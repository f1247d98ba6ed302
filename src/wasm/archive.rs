//! Packaged WASM bundles.
//!
//! A bundle is a tar archive, plain or gzip-compressed, holding
//! `<stem>.html`, `<stem>.js` and the module itself. It is unpacked into a
//! fresh, unpredictably named temporary directory owned by the caller.
use crate::detect::{sniff, Kind};
use crate::error::LaunchError;
use anyhow::Result;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const SCRATCH_PREFIX: &str = "wasm_runner_";

/// Suffixes stripped from an archive name to get the bundle stem.
const COMPRESSED_SUFFIXES: [&str; 2] = [".tar.gz", ".tgz"];

/// True when the file parses as a tar archive with at least one entry.
pub fn is_tar(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    let Ok(mut archive) = open_archive(path) else {
        return false;
    };
    let Ok(mut entries) = archive.entries() else {
        return false;
    };
    matches!(entries.next(), Some(Ok(_)))
}

/// Tar reader over `path`, decompressing when the file starts with gzip magic.
fn open_archive(path: &Path) -> io::Result<tar::Archive<Box<dyn Read>>> {
    let file = File::open(path)?;
    let reader: Box<dyn Read> = if sniff(path) == Some(Kind::Gzip) {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };
    Ok(tar::Archive::new(reader))
}

/// `bundle` for `bundle`, `bundle.tar`, `bundle.tar.gz` and `bundle.tgz`.
pub fn bundle_stem(archive: &Path) -> Option<String> {
    let name = archive.file_name()?.to_string_lossy();
    let compressed = COMPRESSED_SUFFIXES
        .iter()
        .filter_map(|suffix| name.strip_suffix(suffix))
        .find(|stem| !stem.is_empty());
    match compressed {
        Some(stem) => Some(stem.to_string()),
        None => Path::new(name.as_ref())
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned()),
    }
}

#[derive(Debug)]
pub struct Extracted {
    pub dir: TempDir,
    pub markup: PathBuf,
}

/// Unpack `archive` and locate `<stem>.html` at the top of the extraction.
pub fn extract_bundle(archive: &Path) -> Result<Extracted> {
    let dir = tempfile::Builder::new()
        .prefix(SCRATCH_PREFIX)
        .tempdir()
        .map_err(|err| archive_error(archive, &std::env::temp_dir(), err.to_string()))?;
    tracing::debug!("Extracting {} to {}", archive.display(), dir.path().display());

    open_archive(archive)
        .and_then(|mut tar| tar.unpack(dir.path()))
        .map_err(|err| archive_error(archive, dir.path(), err.to_string()))?;

    let stem = bundle_stem(archive)
        .ok_or_else(|| archive_error(archive, dir.path(), "archive has no file name".into()))?;
    let markup_name = format!("{stem}.html");
    let markup = dir.path().join(&markup_name);
    if !markup.is_file() {
        return Err(archive_error(
            archive,
            dir.path(),
            format!("HTML file not found in TAR: {markup_name}"),
        )
        .into());
    }
    tracing::debug!("Extracted HTML file: {}", markup.display());
    Ok(Extracted { dir, markup })
}

fn archive_error(archive: &Path, destination: &Path, message: String) -> LaunchError {
    LaunchError::Archive {
        archive: archive.to_path_buf(),
        destination: destination.to_path_buf(),
        message,
    }
}
