use anyhow::{Context, Result};
use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Files sharing one stem, in the order they were listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub key: OsString,
    pub paths: Vec<PathBuf>,
}

/// The part of `name` before its first `.`, or the whole name.
///
/// Works on the raw name, so stems that are not valid unicode stay apart.
pub fn group_key(name: &OsStr) -> &OsStr {
    let bytes = name.as_encoded_bytes();
    match bytes.iter().position(|&b| b == b'.') {
        // SAFETY: the split is right before an ascii `.`
        Some(end) => unsafe { OsStr::from_encoded_bytes_unchecked(&bytes[..end]) },
        None => name,
    }
}

/// Regular files directly inside `dir`, in enumeration order.
pub fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.with_context(|| format!("failed to list {}", dir.display()))?;
        // follows symlinks, a link to a file is a file
        if entry.path().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Partition `paths` by [`group_key`] of their file name.
pub fn group_files(paths: Vec<PathBuf>) -> Vec<Group> {
    let mut index: HashMap<OsString, usize> = HashMap::new();
    let mut groups: Vec<Group> = Vec::new();
    for path in paths {
        let key = match path.file_name() {
            Some(name) => group_key(name).to_os_string(),
            None => continue,
        };
        match index.get(&key) {
            Some(&i) => groups[i].paths.push(path),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(Group {
                    key,
                    paths: vec![path],
                });
            }
        }
    }
    groups
}
