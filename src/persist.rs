// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::{Path, PathBuf};

use tokio::fs;

/// Suffix of files that are still being written
pub const PARTIAL_SUFFIX: &str = ".partial";

/// Path of the in-progress sibling for `path`
pub fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}

/// Write `contents` to `path` via a `.partial` sibling and a rename, so readers
/// never observe a half-written file.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let partial = partial_path(path);

    if let Err(e) = fs::write(&partial, contents).await {
        let _ = fs::remove_file(&partial).await;
        return Err(e);
    }

    if let Err(e) = fs::rename(&partial, path).await {
        let _ = fs::remove_file(&partial).await;
        return Err(e);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn write_atomic_replaces_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, b"old").unwrap();

        write_atomic(&path, b"new").await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"new");
        assert!(!partial_path(&path).exists());
    }

    #[tokio::test]
    async fn write_atomic_fails_for_missing_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("cache.json");

        assert!(write_atomic(&path, b"data").await.is_err());
        assert!(!path.exists());
    }

    #[test]
    fn partial_path_appends_suffix() {
        assert_eq!(
            partial_path(Path::new("/out/feed.xml")),
            PathBuf::from("/out/feed.xml.partial")
        );
    }
}
