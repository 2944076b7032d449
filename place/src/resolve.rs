use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use std::path::Path;
use tracing::{debug, info};

use crate::group::Group;
use config::Config;
use tools::{Extractor, Session};

fn is_candidate(path: &Path, extension: &str) -> bool {
    path.file_name()
        .is_some_and(|n| n.as_encoded_bytes().ends_with(extension.as_bytes()))
}

/// Resolve the date of `group` from its first candidate file.
///
/// One session is opened for the group and closed before returning, also
/// when resolving fails.
pub async fn resolve<E: Extractor>(
    group: &Group,
    extractor: &E,
    config: &Config,
) -> Result<Option<NaiveDateTime>> {
    let mut session = extractor.open().await?;
    let resolved = resolve_with(&mut session, group, config).await;
    let closed = session.close().await;
    let resolved = resolved?;
    closed?;
    Ok(resolved)
}

async fn resolve_with<S: Session>(
    session: &mut S,
    group: &Group,
    config: &Config,
) -> Result<Option<NaiveDateTime>> {
    for path in group
        .paths
        .iter()
        .filter(|p| is_candidate(p, &config.extension))
    {
        match session.field(path, &config.field).await? {
            Some(raw) => {
                debug!(path = ?path, field = %config.field, raw = %raw, "read timestamp");
                let dt = dateparser::parse(&raw, &config.strptime)
                    .with_context(|| format!("bad {} in {}", config.field, path.display()))?;
                return Ok(Some(dt));
            }
            None => {
                info!("no exif for {}", path.display());
                // the first candidate decides unless asked to keep looking
                if !config.scan_all_candidates {
                    return Ok(None);
                }
            }
        }
    }
    Ok(None)
}
