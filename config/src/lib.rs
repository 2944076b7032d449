use anyhow::{Context, Result, bail};
use chrono::format::{Item, StrftimeItems};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// ExifTool program used when the config does not name one.
pub static EXIFTOOL: Lazy<String> =
    Lazy::new(|| std::env::var("EXIFSORT_EXIFTOOL").unwrap_or_else(|_| "exiftool".to_string()));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// the metadata extractor program.
    pub exiftool: String,
    /// metadata field read from the group representative, `Group:Tag`.
    pub field: String,
    /// suffix a file name must end with to be read for metadata.
    pub extension: String,
    /// strptime format of the field, without the timezone suffix.
    pub strptime: String,
    /// strftime layout of the destination, `/` separated.
    pub layout: String,
    /// keep looking at later candidates when one has no usable field.
    pub scan_all_candidates: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            exiftool: EXIFTOOL.clone(),
            field: "File:FileAccessDate".to_string(),
            extension: ".jpg".to_string(),
            strptime: "%Y:%m:%d %H:%M:%S".to_string(),
            layout: "%Y%m/%d".to_string(),
            scan_all_candidates: false,
        }
    }
}

impl Config {
    /// Load the config from `file`, or from `config.toml` beside the
    /// executable, or fall back to the defaults.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let file = match file {
            Some(f) => Some(f.to_path_buf()),
            None => beside_exe().filter(|f| f.is_file()),
        };
        let config = match file {
            Some(f) => {
                debug!(path = ?f, "loading config");
                let content = std::fs::read_to_string(&f)
                    .with_context(|| format!("failed to read config {}", f.display()))?;
                Self::parse(&content)
                    .with_context(|| format!("failed to parse config {}", f.display()))?
            }
            None => {
                debug!("no config file, using defaults");
                Self::default()
            }
        };
        config.validate()?;
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.field.is_empty() {
            bail!("config `field` must not be empty");
        }
        if self.exiftool.is_empty() {
            bail!("config `exiftool` must not be empty");
        }
        check_format("strptime", &self.strptime)?;
        check_format("layout", &self.layout)?;
        if self.layout.split('/').any(|p| p.is_empty()) {
            bail!("config `layout` has an empty path level: {:?}", self.layout);
        }
        Ok(())
    }
}

fn beside_exe() -> Option<PathBuf> {
    let mut work_dir = std::env::current_exe().ok()?;
    work_dir.pop();
    Some(work_dir.join("config.toml"))
}

// chrono only reports a bad specifier when formatting, reject it up front
fn check_format(name: &str, fmt: &str) -> Result<()> {
    if StrftimeItems::new(fmt).any(|i| matches!(i, Item::Error)) {
        bail!("config `{}` is not a valid time format: {:?}", name, fmt);
    }
    Ok(())
}
