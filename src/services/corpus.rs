use std::path::{Path, PathBuf};

use crate::{error::AppResult, models::RatingRecord};

/// Loads the bulk ratings corpus from a CSV file with a
/// `username,movie_slug,rating` header.
///
/// Read once at startup; the request-time path never writes to it.
pub fn load(path: &Path) -> AppResult<Vec<RatingRecord>> {
    let mut reader = csv::Reader::from_path(path)?;

    let mut records = Vec::new();
    for result in reader.deserialize() {
        records.push(result?);
    }

    tracing::info!(
        path = %path.display(),
        records = records.len(),
        "Loaded ratings corpus"
    );
    Ok(records)
}

/// Writes scraped ratings to CSV, never overwriting an existing file.
///
/// If `path` already exists the filename gets a `_1`, `_2`, ... suffix
/// until a free name is found. Returns the path actually written.
pub fn save(records: &[RatingRecord], path: &Path) -> AppResult<PathBuf> {
    let target = next_free_path(path);

    let mut writer = csv::Writer::from_path(&target)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    tracing::info!(
        path = %target.display(),
        records = records.len(),
        "Saved ratings corpus"
    );
    Ok(target)
}

fn next_free_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut i = 1;
    loop {
        let filename = if extension.is_empty() {
            format!("{}_{}", stem, i)
        } else {
            format!("{}_{}.{}", stem, i, extension)
        };
        let candidate = path.with_file_name(filename);
        if !candidate.exists() {
            return candidate;
        }
        i += 1;
    }
}
