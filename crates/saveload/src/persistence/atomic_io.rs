use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Replaces `path` with `bytes` via a sibling temp file, so a reader never
/// observes a half-written record.
pub(crate) fn write_record_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = temp_path_for(path);
    fs::write(&tmp_path, bytes)?;
    replace_file(&tmp_path, path)
}

/// `Ok(None)` when the file does not exist.
pub(crate) fn read_record_bytes(path: &Path) -> io::Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(error) => Err(error),
    }
}

fn replace_file(tmp_path: &Path, final_path: &Path) -> io::Result<()> {
    if let Err(error) = fs::rename(tmp_path, final_path) {
        let _ = fs::remove_file(tmp_path);
        return Err(error);
    }
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("record");
    let tmp_name = format!("{file_name}.tmp");
    match path.parent() {
        Some(parent) => parent.join(tmp_name),
        None => PathBuf::from(tmp_name),
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn write_replaces_contents_and_leaves_no_temp_file() {
        let temp = TempDir::new().expect("temp");
        let path = temp.path().join("nested").join("settings");
        write_record_atomic(&path, b"first record, longer").expect("first write");
        write_record_atomic(&path, b"second").expect("second write");

        assert_eq!(fs::read(&path).expect("read"), b"second");
        assert!(!temp.path().join("nested").join("settings.tmp").exists());
    }

    #[test]
    fn failed_replace_keeps_previous_record() {
        let temp = TempDir::new().expect("temp");
        let path = temp.path().join("save");
        write_record_atomic(&path, b"previous").expect("first write");

        let blocker = temp.path().join("blocker");
        fs::create_dir(&blocker).expect("dir");
        fs::write(blocker.join("inner"), b"x").expect("fill dir");
        let tmp_path = temp_path_for(&path);
        fs::write(&tmp_path, b"next").expect("tmp");

        replace_file(&tmp_path, &blocker).expect_err("rename over non-empty dir");
        assert!(!tmp_path.exists());
        assert_eq!(fs::read(&path).expect("read"), b"previous");
    }

    #[test]
    fn missing_file_reads_as_none() {
        let temp = TempDir::new().expect("temp");
        let read = read_record_bytes(&temp.path().join("save")).expect("read");
        assert!(read.is_none());
    }
}
