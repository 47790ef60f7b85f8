use std::env;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tempfile::TempDir;

pub const REPORT_FILENAME: &str = "merged_table_colored.pdf";

pub fn now_utc_string() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn ensure_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("failed to create directory: {}", path.display()))
}

pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)
        .with_context(|| format!("failed to open file for hashing: {}", path.display()))?;

    let mut hasher = Sha256::new();
    let mut buf = [0_u8; 8192];

    loop {
        let count = file
            .read(&mut buf)
            .with_context(|| format!("failed to read file for hashing: {}", path.display()))?;
        if count == 0 {
            break;
        }
        hasher.update(&buf[..count]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        ensure_directory(parent)?;
    }

    let data = serde_json::to_vec_pretty(value)
        .with_context(|| format!("failed to serialize json: {}", path.display()))?;

    let mut file = File::create(path)
        .with_context(|| format!("failed to create json file: {}", path.display()))?;
    file.write_all(&data)
        .with_context(|| format!("failed to write json file: {}", path.display()))?;
    file.write_all(b"\n")
        .with_context(|| format!("failed to finalize json file: {}", path.display()))?;

    Ok(())
}

/// The user's download folder: `%USERPROFILE%\Downloads` on Windows, `~/Downloads` elsewhere.
pub fn downloads_dir() -> PathBuf {
    let home_var = if cfg!(windows) { "USERPROFILE" } else { "HOME" };
    downloads_dir_from(env::var_os(home_var).map(PathBuf::from))
}

fn downloads_dir_from(home: Option<PathBuf>) -> PathBuf {
    match home {
        Some(home) if !home.as_os_str().is_empty() => home.join("Downloads"),
        _ => PathBuf::from("."),
    }
}

pub fn default_report_path() -> PathBuf {
    downloads_dir().join(REPORT_FILENAME)
}

pub fn is_stdin_marker(path: &Path) -> bool {
    path.as_os_str() == "-"
}

/// Document bytes read from stdin, parked in a temporary directory for the lifetime of the
/// request. The directory is removed when this value is dropped.
pub struct SpooledInput {
    _dir: TempDir,
    path: PathBuf,
}

impl SpooledInput {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub fn spool_reader<R: Read>(mut reader: R, filename: &str) -> Result<SpooledInput> {
    let dir = tempfile::Builder::new()
        .prefix("kitpick_upload_")
        .tempdir()
        .context("failed to create temporary upload directory")?;
    let path = dir.path().join(filename);

    let mut file = File::create(&path)
        .with_context(|| format!("failed to create spooled input: {}", path.display()))?;
    let copied = io::copy(&mut reader, &mut file)
        .with_context(|| format!("failed to spool input into {}", path.display()))?;
    file.flush()
        .with_context(|| format!("failed to flush spooled input: {}", path.display()))?;

    tracing::debug!(bytes = copied, path = %path.display(), "spooled input");

    Ok(SpooledInput { _dir: dir, path })
}
