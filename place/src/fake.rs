//! In-memory extractor serving canned timestamps by file name.

use anyhow::{Result, bail};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tools::{Extractor, Metadata, Session};

pub(crate) const FIELD: &str = "File:FileAccessDate";

#[derive(Debug, Default, Clone)]
pub(crate) struct FakeExtractor {
    stamps: HashMap<String, String>,
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
    reads: Arc<Mutex<Vec<String>>>,
    broken: bool,
}

impl FakeExtractor {
    pub fn new(stamps: &[(&str, &str)]) -> Self {
        Self {
            stamps: stamps
                .iter()
                .map(|(n, s)| (n.to_string(), s.to_string()))
                .collect(),
            ..Default::default()
        }
    }

    /// An extractor whose sessions fail to open.
    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Default::default()
        }
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn reads(&self) -> Vec<String> {
        self.reads.lock().unwrap().clone()
    }
}

pub(crate) struct FakeSession {
    extractor: FakeExtractor,
}

#[async_trait]
impl Extractor for FakeExtractor {
    type Session = FakeSession;

    async fn open(&self) -> Result<FakeSession> {
        if self.broken {
            bail!("failed to launch exiftool");
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(FakeSession {
            extractor: self.clone(),
        })
    }
}

#[async_trait]
impl Session for FakeSession {
    async fn metadata(&mut self, path: &Path) -> Result<Metadata> {
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        self.extractor.reads.lock().unwrap().push(name.clone());
        let mut fields = vec![(
            "SourceFile".to_string(),
            Value::String(path.display().to_string()),
        )];
        if let Some(stamp) = self.extractor.stamps.get(&name) {
            fields.push((FIELD.to_string(), Value::String(stamp.clone())));
        }
        Ok(fields.into_iter().collect())
    }

    async fn close(&mut self) -> Result<()> {
        self.extractor.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
