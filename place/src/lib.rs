use anyhow::{Result, bail};
use std::path::Path;

use config::Config;
use tools::Extractor;

#[cfg(test)]
mod fake;
mod group;
mod process;
mod resolve;
mod target;

pub use group::{Group, group_files, group_key, list_files};
pub use process::Summary;
pub use resolve::resolve;
pub use target::{move_file, place};

/// Sort the files directly inside `input` into date directories below it.
pub async fn process<E: Extractor>(
    input: &Path,
    config: &Config,
    extractor: &E,
    test: bool,
) -> Result<Summary> {
    if !input.is_dir() {
        bail!("input {} is not a directory", input.display());
    }
    process::do_process(input, config, extractor, test).await
}
