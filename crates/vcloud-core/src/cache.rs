// ── Inventory cache ──
//
// One JSON file per (org, username) holding the last snapshot and the time
// it was generated. Each refresh replaces the whole file: the record is
// written to a uniquely named temp file in the same directory and renamed
// over the target, so concurrent writers never share a partial file.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::CoreError;
use crate::snapshot::Snapshot;

/// How long a cache record is served before a refresh.
pub const MAX_AGE: Duration = Duration::from_secs(900);

const CACHE_EXTENSION: &str = "cache";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    pub generated_at: DateTime<Utc>,
    pub snapshot: Snapshot,
}

impl CacheRecord {
    /// Stamp `snapshot` with the current time.
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            generated_at: Utc::now(),
            snapshot,
        }
    }

    /// Whether the record is younger than `max_age` at `now`. A record
    /// exactly `max_age` old is expired.
    pub fn is_fresh_at(&self, max_age: Duration, now: DateTime<Utc>) -> bool {
        let Ok(max_age) = TimeDelta::from_std(max_age) else {
            return false;
        };
        self.generated_at
            .checked_add_signed(max_age)
            .is_some_and(|expiry| expiry > now)
    }
}

/// `{org}-{username}.cache`, with path separators in either part replaced
/// by `_`.
pub fn file_name(org: &str, username: &str) -> String {
    let clean = |s: &str| s.replace(['/', '\\'], "_");
    format!("{}-{}.{CACHE_EXTENSION}", clean(org), clean(username))
}

/// Cache location for a principal. Pure: nothing is touched on disk.
pub fn path_for(cache_dir: &Path, org: &str, username: &str) -> PathBuf {
    cache_dir.join(file_name(org, username))
}

/// True iff a record exists at `path`, parses, and is fresh now.
pub fn is_valid(path: &Path, max_age: Duration) -> bool {
    is_valid_at(path, max_age, Utc::now())
}

pub fn is_valid_at(path: &Path, max_age: Duration, now: DateTime<Utc>) -> bool {
    match read(path) {
        Ok(record) => record.is_fresh_at(max_age, now),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "cache not usable");
            false
        }
    }
}

/// Replace the cache at `path` with `snapshot`, stamped now.
pub fn write(snapshot: &Snapshot, path: &Path) -> Result<CacheRecord, CoreError> {
    let record = CacheRecord::new(snapshot.clone());
    write_record(&record, path)?;
    Ok(record)
}

/// Write `record` as pretty, key-sorted JSON, creating the directory first.
pub fn write_record(record: &CacheRecord, path: &Path) -> Result<(), CoreError> {
    let io_err = |source| CoreError::CacheIo {
        path: path.to_path_buf(),
        source,
    };
    let format_err = |source| CoreError::CacheFormat {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(io_err)?;

    // Round-trip through `Value` so object keys come out sorted.
    let value = serde_json::to_value(record).map_err(format_err)?;
    let mut body = serde_json::to_string_pretty(&value).map_err(format_err)?;
    body.push('\n');

    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(body.as_bytes()).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;

    debug!(path = %path.display(), "cache written");
    Ok(())
}

/// Load the record at `path`. A missing or corrupt file is an error.
pub fn read(path: &Path) -> Result<CacheRecord, CoreError> {
    let body = std::fs::read_to_string(path).map_err(|source| CoreError::CacheIo {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&body).map_err(|source| CoreError::CacheFormat {
        path: path.to_path_buf(),
        source,
    })
}
