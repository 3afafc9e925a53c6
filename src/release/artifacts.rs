//! Release asset discovery and checksum verification

use crate::core::error::{ReleaseError, ReleaseResult, ResultExt, ValidationError};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

/// Name of the checksum manifest shipped alongside archives
pub const CHECKSUMS_FILE: &str = "checksums.txt";

/// Files directly inside `dir` that are uploadable release assets, sorted by name.
///
/// Assets are `*.tar.gz`, `*.zip` and `checksums.txt`; a missing directory yields none.
pub fn collect_release_assets(dir: &Path) -> ReleaseResult<Vec<PathBuf>> {
  if !dir.is_dir() {
    tracing::debug!(dir = %dir.display(), "release asset directory missing");
    return Ok(Vec::new());
  }

  let mut assets = Vec::new();
  for entry in fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))? {
    let entry = entry?;
    if !entry.file_type()?.is_file() {
      continue;
    }
    let name = entry.file_name().to_string_lossy().to_string();
    if is_release_asset(&name) {
      assets.push(entry.path());
    }
  }
  assets.sort();
  Ok(assets)
}

fn is_release_asset(name: &str) -> bool {
  name.ends_with(".tar.gz") || name.ends_with(".zip") || name == CHECKSUMS_FILE
}

/// File name of an asset path
pub fn asset_name(path: &Path) -> String {
  path
    .file_name()
    .map(|n| n.to_string_lossy().to_string())
    .unwrap_or_default()
}

/// Hex SHA-256 of a file
pub fn sha256_file(path: &Path) -> ReleaseResult<String> {
  let mut file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
  let mut hasher = Sha256::new();
  io::copy(&mut file, &mut hasher).with_context(|| format!("Failed to hash {}", path.display()))?;
  Ok(format!("{:x}", hasher.finalize()))
}

/// Verify every archive listed in `checksums.txt` against its digest.
///
/// Lines are `<sha256>  <filename>`. Entries naming files that are not present
/// or lines that do not parse are skipped with a warning. Returns the number of
/// verified files.
pub fn verify_checksums(dir: &Path) -> ReleaseResult<usize> {
  let manifest = dir.join(CHECKSUMS_FILE);
  if !manifest.exists() {
    return Ok(0);
  }

  let content = fs::read_to_string(&manifest).with_context(|| format!("Failed to read {}", manifest.display()))?;
  let mut verified = 0;

  for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
    let Some((expected, file)) = parse_checksum_line(line) else {
      tracing::warn!(line, "skipping malformed checksum line");
      continue;
    };

    let path = dir.join(file);
    if !path.is_file() {
      tracing::warn!(file, "checksum entry without matching file");
      continue;
    }

    let actual = sha256_file(&path)?;
    if !actual.eq_ignore_ascii_case(expected) {
      return Err(ReleaseError::Validation(ValidationError::ChecksumMismatch {
        file: file.to_string(),
        expected: expected.to_lowercase(),
        actual,
      }));
    }
    verified += 1;
  }

  Ok(verified)
}

/// `<hex>  <name>` or `<hex> *<name>` (binary mode marker)
fn parse_checksum_line(line: &str) -> Option<(&str, &str)> {
  let (digest, rest) = line.split_once(char::is_whitespace)?;
  let name = rest.trim_start().trim_start_matches('*');
  let valid_digest = digest.len() == 64 && digest.chars().all(|c| c.is_ascii_hexdigit());
  (valid_digest && !name.is_empty() && !name.contains('/')).then_some((digest, name))
}
