use std::collections::BTreeSet;

use enserver_object_store::ObjectStore;

/// Path of the canonical filename-list blob for one config (spec §4.5
/// step 6).
pub fn index_path(filename_root: &str) -> String {
    format!("{filename_root}/index.txt")
}

/// Filenames are bare (no `filenameRoot` prefix — each config's index
/// lives under its own `{filenameRoot}/` directory already) and encode
/// `{start_unix}-{end_unix}-{batch_num}.zip`.
fn sort_key(filename: &str) -> (i64, i32) {
    let stem = filename.strip_suffix(".zip").unwrap_or(filename);
    let mut parts = stem.split('-');
    let start = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);
    let _end = parts.next();
    let batch_num = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);
    (start, batch_num)
}

/// Reads the index, adds `new_filenames` (deduplicated), re-sorts by
/// start_unix then batch_num ascending, and writes it back (spec §4.5 step
/// 6: "read-modify-write; canonical newline-separated list ... sorted by
/// start_unix ascending, batch_num ascending").
pub async fn append(
    store: &dyn ObjectStore,
    bucket: &str,
    filename_root: &str,
    new_filenames: &[String],
) -> enserver_object_store::Result<()> {
    let path = index_path(filename_root);
    let existing = match store.get_object(bucket, &path).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).to_string(),
        Err(enserver_object_store::ObjectStoreError::NotFound(_)) => String::new(),
        Err(err) => return Err(err),
    };

    let mut filenames: BTreeSet<String> = existing
        .lines()
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    filenames.extend(new_filenames.iter().cloned());

    let mut ordered: Vec<String> = filenames.into_iter().collect();
    ordered.sort_by_key(|name| sort_key(name));

    let content = ordered.join("\n");
    store.create_object(bucket, &path, content.as_bytes()).await
}

/// Removes `removed_filenames` from the index (C12 cleanup, spec §4.6:
/// "remove from index.txt").
pub async fn remove(
    store: &dyn ObjectStore,
    bucket: &str,
    filename_root: &str,
    removed_filenames: &[String],
) -> enserver_object_store::Result<()> {
    let path = index_path(filename_root);
    let existing = match store.get_object(bucket, &path).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).to_string(),
        Err(enserver_object_store::ObjectStoreError::NotFound(_)) => return Ok(()),
        Err(err) => return Err(err),
    };

    let mut ordered: Vec<String> = existing
        .lines()
        .filter(|line| !line.is_empty() && !removed_filenames.iter().any(|r| r == line))
        .map(str::to_string)
        .collect();
    ordered.sort_by_key(|name| sort_key(name));

    let content = ordered.join("\n");
    store.create_object(bucket, &path, content.as_bytes()).await
}
