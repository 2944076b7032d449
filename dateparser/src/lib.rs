use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Split a metadata timestamp like `2023:05:14 10:22:31-04:00` at the first
/// `-` into the local time and the timezone suffix.
pub fn split_timezone(input: &str) -> (&str, Option<&str>) {
    match input.split_once('-') {
        Some((time, tz)) => (time, Some(tz)),
        None => (input, None),
    }
}

/// Parse the time part of a metadata timestamp with `fmt`.
///
/// The timezone suffix is dropped, not applied: the result is the wall clock
/// time the file carries. A value that does not match `fmt` is an error.
pub fn parse(input: &str, fmt: &str) -> Result<NaiveDateTime> {
    let (time, tz) = split_timezone(input.trim());
    debug!(time, tz = ?tz, "split timestamp");
    NaiveDateTime::parse_from_str(time.trim(), fmt)
        .with_context(|| format!("malformed timestamp {:?}, expected {:?}", input, fmt))
}

/// Render `dt` with the `/` separated strftime `layout` as a path below `root`.
/// The layout must have been validated, chrono panics on unknown specifiers.
pub fn destination(root: &Path, dt: &NaiveDateTime, layout: &str) -> PathBuf {
    let rendered = dt.format(layout).to_string();
    rendered.split('/').fold(root.to_path_buf(), |mut path, part| {
        path.push(part);
        path
    })
}
