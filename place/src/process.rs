use anyhow::Result;
use std::path::Path;
use tracing::{debug, debug_span, info};
use tracing_futures::Instrument;

use crate::group::{Group, group_files, list_files};
use crate::resolve::resolve;
use crate::target::place;
use config::Config;
use tools::Extractor;

/// What one run did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Summary {
    /// regular files found in the start directory
    pub files: usize,
    pub groups: usize,
    /// groups that resolved a destination
    pub placed: usize,
    /// groups left in place
    pub skipped: usize,
    /// files moved, or that would move in test mode
    pub moved: usize,
}

pub async fn do_process<E: Extractor>(
    input: &Path,
    config: &Config,
    extractor: &E,
    test: bool,
) -> Result<Summary> {
    let files = list_files(input)?;
    let mut summary = Summary {
        files: files.len(),
        ..Default::default()
    };
    let groups = group_files(files);
    summary.groups = groups.len();
    info!(input = ?input, files = summary.files, groups = summary.groups, test, "start process");

    for group in &groups {
        let span = debug_span!("group", key = %group.key.to_string_lossy());
        match do_place(group, input, config, extractor, test)
            .instrument(span)
            .await?
        {
            Some(moved) => {
                summary.placed += 1;
                summary.moved += moved;
            }
            None => summary.skipped += 1,
        }
    }

    info!(
        placed = summary.placed,
        skipped = summary.skipped,
        moved = summary.moved,
        "finished"
    );
    Ok(summary)
}

async fn do_place<E: Extractor>(
    group: &Group,
    input: &Path,
    config: &Config,
    extractor: &E,
    test: bool,
) -> Result<Option<usize>> {
    let Some(dt) = resolve(group, extractor, config).await? else {
        debug!(paths = ?group.paths, "no destination, left in place");
        return Ok(None);
    };
    let relative = dateparser::destination(Path::new(""), &dt, &config.layout);
    info!(
        "moving {} group to {}",
        group.key.to_string_lossy(),
        relative.display()
    );
    place(group, &input.join(&relative), test).map(Some)
}
