//! Whole-file UTF-8 reads and replace-by-rename writes.

use std::{
    fs,
    io::{self, Write as _},
    path::Path,
};

use crate::{FileError, MAX_FILE_BYTES};

/// Read `path` as UTF-8, refusing anything over [`MAX_FILE_BYTES`].
pub fn read_utf8(path: &Path) -> Result<String, FileError> {
    let read_err = |source| FileError::Read {
        path: path.to_path_buf(),
        source,
    };

    let len = fs::metadata(path).map_err(read_err)?.len();
    if len > MAX_FILE_BYTES {
        return Err(FileError::TooLarge {
            path: path.to_path_buf(),
            len,
        });
    }

    let bytes = fs::read(path).map_err(read_err)?;
    String::from_utf8(bytes).map_err(|_| FileError::InvalidUtf8 {
        path: path.to_path_buf(),
    })
}

/// Write `contents` to `path` through a sibling temp file and a rename, so a
/// failed write leaves any existing file intact.
///
/// An existing `path` is resolved first: saving through a symlink updates
/// the file it points at and leaves the link in place.
pub fn write_utf8(path: &Path, contents: &str) -> Result<(), FileError> {
    let write_err = |source| FileError::Write {
        path: path.to_path_buf(),
        source,
    };

    let target = match fs::canonicalize(path) {
        Ok(resolved) => resolved,
        Err(err) if err.kind() == io::ErrorKind::NotFound => path.to_path_buf(),
        Err(err) => return Err(write_err(err)),
    };
    if target.file_name().is_none() {
        return Err(write_err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "path is missing a file name",
        )));
    }
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut staged = tempfile::Builder::new()
        .prefix(".mdpane-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(write_err)?;
    staged.write_all(contents.as_bytes()).map_err(write_err)?;
    staged.as_file().sync_all().map_err(write_err)?;

    // Keep the permissions of the file being replaced.
    if let Ok(meta) = fs::metadata(&target) {
        let _ = fs::set_permissions(staged.path(), meta.permissions());
    }

    staged
        .persist(&target)
        .map(drop)
        .map_err(|err| write_err(err.error))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_creates_and_overwrites() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let path = dir.path().join("test.md");

        assert!(write_utf8(&path, "first").is_ok());
        assert_eq!(fs::read_to_string(&path).unwrap_or_default(), "first");

        assert!(write_utf8(&path, "second").is_ok());
        assert_eq!(fs::read_to_string(&path).unwrap_or_default(), "second");

        let leftovers = fs::read_dir(dir.path()).map_or(0, Iterator::count);
        assert_eq!(leftovers, 1, "temp files must not linger");
    }

    #[test]
    fn write_rejects_missing_filename() {
        let result = write_utf8(Path::new("/"), "data");
        assert!(matches!(result, Err(FileError::Write { .. })));
    }

    #[test]
    fn write_into_missing_directory_fails() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let path = dir.path().join("nope").join("test.md");
        let result = write_utf8(&path, "data");
        assert!(matches!(result, Err(FileError::Write { .. })));
    }

    #[test]
    fn read_missing_file_is_read_error() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let result = read_utf8(&dir.path().join("missing.md"));
        assert!(matches!(result, Err(FileError::Read { .. })));
    }

    #[test]
    fn read_invalid_utf8_is_reported() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let path = dir.path().join("bad.md");
        fs::write(&path, [0x66, 0x6f, 0xff, 0xfe]).ok();

        let result = read_utf8(&path);
        assert!(matches!(result, Err(FileError::InvalidUtf8 { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn write_through_symlink_updates_target() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let real = dir.path().join("real.md");
        let link = dir.path().join("link.md");
        fs::write(&real, "old").ok();
        assert!(std::os::unix::fs::symlink(&real, &link).is_ok());

        assert!(write_utf8(&link, "new").is_ok());

        let still_link = fs::symlink_metadata(&link).is_ok_and(|m| m.file_type().is_symlink());
        assert!(still_link, "link must survive the save");
        assert_eq!(fs::read_to_string(&real).unwrap_or_default(), "new");
    }

    #[test]
    fn read_refuses_oversized_file() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let path = dir.path().join("huge.md");
        let sized = fs::File::create(&path).and_then(|f| f.set_len(MAX_FILE_BYTES + 1));
        assert!(sized.is_ok());

        let result = read_utf8(&path);
        assert!(matches!(
            result,
            Err(FileError::TooLarge { len, .. }) if len == MAX_FILE_BYTES + 1
        ));
    }

    #[test]
    fn round_trip_preserves_bytes() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let path = dir.path().join("mixed.md");
        let cases = ["", "a\r\nb\nc\r\n", "héllo wörld 日本語 🦀\n", "no newline"];

        for text in cases {
            assert!(write_utf8(&path, text).is_ok());
            let back = read_utf8(&path);
            assert!(back.is_ok(), "read failed: {back:?}");
            assert_eq!(back.ok().as_deref(), Some(text));
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(32))]

            #[test]
            fn any_utf8_round_trips(text in any::<String>()) {
                let dir = tempfile::tempdir().map_err(|e| TestCaseError::fail(e.to_string()))?;
                let path = dir.path().join("prop.md");
                prop_assert!(write_utf8(&path, &text).is_ok());
                let back = read_utf8(&path).map_err(|e| TestCaseError::fail(e.to_string()))?;
                prop_assert_eq!(back, text);
            }
        }
    }
}
