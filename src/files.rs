//! Reading, writing and removing the site's generated files.
//!
//! Every JSON document is pretty-printed with two-space indentation and replaced
//! as a whole: bytes go to a temp file in the destination directory, which is
//! then renamed over the target.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FileError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Malformed JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Read `path` as JSON. A missing file yields `Ok(None)`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, FileError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|source| FileError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

/// Mode of every file published through [`temp_file_in`].
#[cfg(unix)]
pub const PUBLISHED_MODE: u32 = 0o644;

/// A temp file in `dir`, to be persisted over a file in the same directory.
///
/// `NamedTempFile` starts out owner-only; the mode is widened to
/// [`PUBLISHED_MODE`] so the persisted file is readable by the web server.
pub fn temp_file_in(dir: &Path) -> io::Result<NamedTempFile> {
    let tmp = NamedTempFile::new_in(dir)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(PUBLISHED_MODE))?;
    }
    Ok(tmp)
}

/// Serialize `value` as pretty JSON and atomically replace `path` with it.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    let dir = path.parent().unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir)?;
    let mut tmp = temp_file_in(dir)?;
    tmp.write_all(json.as_bytes())?;
    tmp.write_all(b"\n")?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Delete `path` if it exists. A missing file is not an error.
pub fn remove_if_exists(path: &Path) -> io::Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[test]
    fn missing_file_reads_as_none() {
        let tmp = TempDir::new().unwrap();
        let result: Option<BTreeMap<String, u32>> =
            read_json(&tmp.path().join("nope.json")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn write_is_two_space_pretty_and_creates_parents() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("gen/manifests/a.json");
        let mut value = BTreeMap::new();
        value.insert("count", 2);

        write_json(&path, &value).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "{\n  \"count\": 2\n}\n");
    }

    #[test]
    fn overwrite_replaces_whole_document() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("doc.json");
        write_json(&path, &vec!["a", "b", "c"]).unwrap();
        write_json(&path, &vec!["z"]).unwrap();

        let back: Vec<String> = read_json(&path).unwrap().unwrap();
        assert_eq!(back, vec!["z"]);
    }

    #[test]
    fn malformed_json_is_reported_with_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        let result: Result<Option<BTreeMap<String, u32>>, _> = read_json(&path);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("bad.json"));
    }

    #[cfg(unix)]
    #[test]
    fn written_documents_are_world_readable() {
        use std::os::unix::fs::PermissionsExt;
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("gen/site-index.json");
        write_json(&path, &vec![1, 2]).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, PUBLISHED_MODE);
    }

    #[test]
    fn remove_if_exists_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("x.json");
        std::fs::write(&path, "{}").unwrap();
        remove_if_exists(&path).unwrap();
        remove_if_exists(&path).unwrap();
        assert!(!path.exists());
    }
}
