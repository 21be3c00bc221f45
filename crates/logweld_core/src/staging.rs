//! Copying segments between the live, working and backup directories.

use crate::error::{CombineResult, IoResultExt};
use std::fs::{self, File};
use std::io;
use std::path::Path;
use tracing::info;

/// Copies one file, syncing the destination before returning.
///
/// Both handles are closed on every exit path.
pub fn copy_file(src: &Path, dst: &Path) -> CombineResult<u64> {
    let mut reader = File::open(src).at(src)?;
    let mut writer = File::create(dst).at(dst)?;
    let copied = io::copy(&mut reader, &mut writer).at(dst)?;
    writer.sync_all().at(dst)?;
    Ok(copied)
}

/// Copies the named segments from `source_dir` into `dest_dir`.
///
/// Stops at the first failure: a partially staged batch must never be
/// consolidated. Returns the number of bytes copied.
pub fn copy_segments<S: AsRef<str>>(
    files: &[S],
    source_dir: &Path,
    dest_dir: &Path,
) -> CombineResult<u64> {
    let mut total = 0u64;
    for file in files {
        let file = file.as_ref();
        let bytes = copy_file(&source_dir.join(file), &dest_dir.join(file))?;
        info!(file, bytes, "copied commit log");
        total += bytes;
    }
    Ok(total)
}

/// Lists regular files in `dir`, sorted by name.
pub fn list_files(dir: &Path) -> CombineResult<Vec<String>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).at(dir)? {
        let entry = entry.at(dir)?;
        if !entry.file_type().at(&entry.path())?.is_file() {
            continue;
        }
        if let Ok(name) = entry.file_name().into_string() {
            files.push(name);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CombineError;
    use tempfile::tempdir;

    #[test]
    fn copies_contents_and_reports_bytes() {
        let src = tempdir().unwrap();
        let dst = tempdir().unwrap();
        fs::write(src.path().join("1710000001"), b"alpha").unwrap();
        fs::write(src.path().join("1710000002"), b"beta").unwrap();

        let bytes = copy_segments(&["1710000001", "1710000002"], src.path(), dst.path()).unwrap();
        assert_eq!(bytes, 9);
        assert_eq!(fs::read(dst.path().join("1710000001")).unwrap(), b"alpha");
        assert_eq!(fs::read(dst.path().join("1710000002")).unwrap(), b"beta");
    }

    #[test]
    fn missing_source_stops_the_batch() {
        let src = tempdir().unwrap();
        let dst = tempdir().unwrap();
        fs::write(src.path().join("1710000001"), b"alpha").unwrap();
        fs::write(src.path().join("1710000003"), b"gamma").unwrap();

        let err = copy_segments(
            &["1710000001", "1710000002", "1710000003"],
            src.path(),
            dst.path(),
        )
        .unwrap_err();

        assert!(matches!(err, CombineError::Io { .. }));
        assert!(dst.path().join("1710000001").exists());
        assert!(!dst.path().join("1710000003").exists());
    }

    #[test]
    fn round_trip_is_byte_identical() {
        let live = tempdir().unwrap();
        let working = tempdir().unwrap();
        let names = ["1710000001", "1710000002"];
        let contents: [&[u8]; 2] = [&[0u8, 1, 2, 255, 254], &[7u8; 4096]];
        for (name, data) in names.iter().zip(contents) {
            fs::write(live.path().join(name), data).unwrap();
        }

        copy_segments(&names, live.path(), working.path()).unwrap();
        for name in names {
            fs::remove_file(live.path().join(name)).unwrap();
        }
        let back = list_files(working.path()).unwrap();
        copy_segments(&back, working.path(), live.path()).unwrap();

        for (name, data) in names.iter().zip(contents) {
            assert_eq!(fs::read(live.path().join(name)).unwrap(), data);
        }
    }

    #[test]
    fn list_files_skips_dirs() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("b"), b"").unwrap();
        fs::write(temp.path().join("a"), b"").unwrap();
        fs::create_dir(temp.path().join("c")).unwrap();
        assert_eq!(list_files(temp.path()).unwrap(), vec!["a", "b"]);
    }
}
