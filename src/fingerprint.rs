//! Content fingerprints and file metadata.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::error::FingerprintError;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Hex SHA-256 of the whole file. Always 64 lowercase hex characters.
pub fn fingerprint(path: &Path) -> Result<String, FingerprintError> {
    let read_err = |source| FingerprintError::Read {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).map_err(read_err)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];

    loop {
        let bytes_read = match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(read_err(e)),
        };
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

pub fn fingerprint_bytes(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// Modification time in whole seconds since the epoch.
///
/// `Ok(None)` means the file is gone, which happens when it is removed between
/// enumeration and stat. Any other failure is returned as is.
pub fn mod_time(path: &Path) -> std::io::Result<Option<i64>> {
    let metadata = match std::fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    let modified: DateTime<Utc> = metadata.modified()?.into();
    Ok(Some(modified.timestamp()))
}

/// Extension of the last path component, without the dot.
///
/// Leading dots belong to the name, so `.bashrc` has no extension while
/// `.config.toml` has `toml`.
pub fn file_extension(path: &Path) -> String {
    let Some(name) = path.file_name() else {
        return String::new();
    };
    let name = name.to_string_lossy();

    name.trim_start_matches('.')
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn extension_edge_cases() {
        assert_eq!(file_extension(Path::new("abc.txt")), "txt");
        assert_eq!(file_extension(Path::new("abc")), "");
        assert_eq!(file_extension(Path::new(".abc")), "");
        assert_eq!(file_extension(Path::new(".abc.def")), "def");
        assert_eq!(file_extension(Path::new("archive.tar.gz")), "gz");
        assert_eq!(file_extension(Path::new("trailing.")), "");
    }

    #[test]
    fn extension_uses_final_component_only() {
        assert_eq!(file_extension(Path::new("/some.dir/file")), "");
        assert_eq!(file_extension(Path::new("/some.dir/file.rs")), "rs");
    }

    #[test]
    fn empty_file_hashes_to_empty_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty");
        fs::write(&path, b"").unwrap();

        let digest = fingerprint(&path).unwrap();
        assert_eq!(
            digest,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(digest, fingerprint_bytes(b""));
    }

    #[test]
    fn same_content_same_digest() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        fs::write(&a, b"hello world").unwrap();
        fs::write(&b, b"hello world").unwrap();

        assert_eq!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());
        assert_eq!(fingerprint(&a).unwrap(), fingerprint(&a).unwrap());
    }

    #[test]
    fn one_byte_difference_changes_digest() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        fs::write(&a, b"hello world").unwrap();
        fs::write(&b, b"hello worle").unwrap();

        let digest = fingerprint(&a).unwrap();
        assert_eq!(digest.len(), 64);
        assert_ne!(digest, fingerprint(&b).unwrap());
    }

    #[test]
    fn large_file_is_hashed_in_full() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.bin");
        let mut data = vec![7u8; READ_BUFFER_SIZE * 3 + 17];
        fs::write(&path, &data).unwrap();
        let before = fingerprint(&path).unwrap();

        *data.last_mut().unwrap() = 8;
        fs::write(&path, &data).unwrap();

        assert_ne!(before, fingerprint(&path).unwrap());
        assert_eq!(fingerprint(&path).unwrap(), fingerprint_bytes(&data));
    }

    #[test]
    fn missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = fingerprint(&dir.path().join("gone")).unwrap_err();
        assert!(matches!(err, FingerprintError::Read { .. }));
    }

    #[test]
    fn mod_time_of_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(mod_time(&dir.path().join("gone")).unwrap(), None);
    }

    #[test]
    fn mod_time_is_whole_seconds_near_now() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f");
        fs::write(&path, b"x").unwrap();

        let mtime = mod_time(&path).unwrap().unwrap();
        let now = Utc::now().timestamp();
        assert!((now - mtime).abs() < 60);
    }
}
