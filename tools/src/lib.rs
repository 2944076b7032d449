use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

mod metadata;

pub use metadata::{ExifTool, ExifToolExtractor};

/// Fields reported for one file, keyed `Group:Tag`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Metadata(HashMap<String, Value>);

impl Metadata {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// The field as text, `None` when it is missing, null or empty.
    pub fn text(&self, field: &str) -> Option<String> {
        let text = match self.0.get(field)? {
            Value::Null => return None,
            Value::String(s) => s.trim().to_string(),
            other => other.to_string(),
        };
        if text.is_empty() { None } else { Some(text) }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Value)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A live connection to a metadata extractor.
///
/// A session must be closed with [`Session::close`] once done. Dropping it
/// unclosed tears the backing process down without the orderly shutdown.
#[async_trait]
pub trait Session: Send {
    async fn metadata(&mut self, path: &Path) -> Result<Metadata>;

    /// Read one field of `path`, `None` when the file does not carry it.
    async fn field(&mut self, path: &Path, field: &str) -> Result<Option<String>> {
        Ok(self.metadata(path).await?.text(field))
    }

    /// Release the session. Closing twice is a no-op.
    async fn close(&mut self) -> Result<()>;
}

/// Opens metadata sessions.
#[async_trait]
pub trait Extractor: Send + Sync {
    type Session: Session;

    async fn open(&self) -> Result<Self::Session>;
}
