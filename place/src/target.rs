use anyhow::{Context, Result, anyhow};
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::group::Group;

/// Move every file of `group` into `dst`, keeping file names.
///
/// `dst` is created when missing. In test mode nothing is created or moved.
/// Returns the number of files handled.
pub fn place(group: &Group, dst: &Path, test: bool) -> Result<usize> {
    if test {
        for path in &group.paths {
            info!("[TEST] skip move {} -> {}", path.display(), dst.display());
        }
        return Ok(group.paths.len());
    }

    std::fs::create_dir_all(dst)
        .with_context(|| format!("failed to create {}", dst.display()))?;

    for path in &group.paths {
        let name = path
            .file_name()
            .ok_or_else(|| anyhow!("no file name in {}", path.display()))?;
        let to = dst.join(name);
        move_file(path, &to)?;
        debug!(from = ?path, to = ?to, "moved");
    }
    Ok(group.paths.len())
}

/// Rename `src` to `dst`, copying across filesystems.
///
/// An existing `dst` is handled by the platform rename: replaced on unix,
/// an error on windows.
pub fn move_file(src: &Path, dst: &Path) -> Result<()> {
    match std::fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::CrossesDevices => {
            debug!(from = ?src, to = ?dst, "rename crosses devices, copy instead");
            move_across(src, dst)
        }
        Err(e) => Err(e).with_context(|| {
            format!("failed to move {} to {}", src.display(), dst.display())
        }),
    }
}

/// Copy `src` to `dst` with its times, then remove `src`.
fn move_across(src: &Path, dst: &Path) -> Result<()> {
    copy_file_with_times(src, dst)?;
    std::fs::remove_file(src).with_context(|| format!("failed to remove {}", src.display()))
}

fn copy_file_with_times(src: &Path, dst: &Path) -> Result<()> {
    std::fs::copy(src, dst)
        .with_context(|| format!("failed to copy {} to {}", src.display(), dst.display()))?;

    let src_meta = std::fs::metadata(src)?;
    let mut times = std::fs::FileTimes::new();
    if let Ok(atime) = src_meta.accessed() {
        times = times.set_accessed(atime);
    } else {
        warn!(file = ?src, "💡 accessed time not found");
    }
    if let Ok(mtime) = src_meta.modified() {
        times = times.set_modified(mtime);
    } else {
        warn!(file = ?src, "💡 modified time not found");
    }
    std::fs::File::options()
        .write(true)
        .open(dst)?
        .set_times(times)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::{Duration, SystemTime};

    fn group_in(dir: &Path, names: &[&str]) -> Group {
        let paths: Vec<PathBuf> = names.iter().map(|n| dir.join(n)).collect();
        for p in &paths {
            std::fs::write(p, p.file_name().unwrap().as_encoded_bytes()).unwrap();
        }
        Group {
            key: "IMG001".into(),
            paths,
        }
    }

    #[test]
    fn test_place() {
        let dir = tempfile::tempdir().unwrap();
        let group = group_in(dir.path(), &["IMG001.jpg", "IMG001.xmp", "IMG001.jpg.bak"]);
        let dst = dir.path().join("202305").join("14");

        assert_eq!(place(&group, &dst, false).unwrap(), 3);
        for name in ["IMG001.jpg", "IMG001.xmp", "IMG001.jpg.bak"] {
            assert!(!dir.path().join(name).exists());
            assert_eq!(std::fs::read_to_string(dst.join(name)).unwrap(), name);
        }
    }

    #[test]
    fn test_place_into_existing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let dst = dir.path().join("202305").join("14");
        std::fs::create_dir_all(&dst).unwrap();
        std::fs::write(dst.join("IMG000.jpg"), b"old").unwrap();

        let group = group_in(dir.path(), &["IMG001.jpg"]);
        assert_eq!(place(&group, &dst, false).unwrap(), 1);
        assert!(dst.join("IMG000.jpg").is_file());
        assert!(dst.join("IMG001.jpg").is_file());
    }

    #[test]
    fn test_place_test_mode() {
        let dir = tempfile::tempdir().unwrap();
        let group = group_in(dir.path(), &["IMG001.jpg", "IMG001.xmp"]);
        let dst = dir.path().join("202305").join("14");

        assert_eq!(place(&group, &dst, true).unwrap(), 2);
        assert!(!dst.exists());
        assert!(dir.path().join("IMG001.jpg").is_file());
    }

    #[test]
    fn test_move_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let err = move_file(&dir.path().join("gone.jpg"), &dir.path().join("to.jpg")).unwrap_err();
        assert!(err.to_string().contains("failed to move"));
    }

    #[cfg(unix)]
    #[test]
    fn test_move_replaces_existing() {
        let dir = tempfile::tempdir().unwrap();
        let (src, dst) = (dir.path().join("a.jpg"), dir.path().join("b.jpg"));
        std::fs::write(&src, b"new").unwrap();
        std::fs::write(&dst, b"old").unwrap();
        move_file(&src, &dst).unwrap();
        assert!(!src.exists());
        assert_eq!(std::fs::read(&dst).unwrap(), b"new");
    }

    #[test]
    fn test_copy_file_with_times() {
        let dir = tempfile::tempdir().unwrap();
        let (src, dst) = (dir.path().join("a.jpg"), dir.path().join("b.jpg"));
        std::fs::write(&src, b"data").unwrap();
        let mtime = SystemTime::UNIX_EPOCH + Duration::from_secs(1_684_059_751);
        std::fs::File::options()
            .write(true)
            .open(&src)
            .unwrap()
            .set_modified(mtime)
            .unwrap();

        copy_file_with_times(&src, &dst).unwrap();
        assert_eq!(std::fs::read(&dst).unwrap(), b"data");
        assert_eq!(std::fs::metadata(&dst).unwrap().modified().unwrap(), mtime);
    }

    #[test]
    fn test_move_across() {
        let dir = tempfile::tempdir().unwrap();
        let (src, dst) = (dir.path().join("a.jpg"), dir.path().join("b.jpg"));
        std::fs::write(&src, b"data").unwrap();
        let mtime = SystemTime::UNIX_EPOCH + Duration::from_secs(1_684_059_751);
        std::fs::File::options()
            .write(true)
            .open(&src)
            .unwrap()
            .set_modified(mtime)
            .unwrap();

        move_across(&src, &dst).unwrap();
        assert!(!src.exists());
        assert_eq!(std::fs::read(&dst).unwrap(), b"data");
        assert_eq!(std::fs::metadata(&dst).unwrap().modified().unwrap(), mtime);

        let err = move_across(&src, &dir.path().join("c.jpg")).unwrap_err();
        assert!(err.to_string().contains("failed to copy"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_move_file_across_devices() {
        use std::os::unix::fs::MetadataExt;

        let shm = Path::new("/dev/shm");
        let dir = tempfile::tempdir().unwrap();
        let Ok(other) = tempfile::tempdir_in(shm) else {
            println!("no /dev/shm, skip");
            return;
        };
        let dev = |p: &Path| std::fs::metadata(p).unwrap().dev();
        if dev(dir.path()) == dev(other.path()) {
            println!("{} is on the same device, skip", shm.display());
            return;
        }

        let (src, dst) = (dir.path().join("a.jpg"), other.path().join("a.jpg"));
        std::fs::write(&src, b"data").unwrap();
        move_file(&src, &dst).unwrap();
        assert!(!src.exists());
        assert_eq!(std::fs::read(&dst).unwrap(), b"data");
    }
}
