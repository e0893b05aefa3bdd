//! Debate archive - durable copies of finished debates
//!
//! Records are stored under their archive key (`debate_<ROOM KEY>`). Writing is
//! best effort from the service's point of view: the in-memory record is
//! authoritative and a failed write is only logged.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::{debug, instrument};

use crate::error::{Error, Result};
use crate::models::DebateRecord;

pub trait DebateArchive: Send + Sync {
    fn persist(&self, record: &DebateRecord, key: &str) -> Result<()>;

    fn load(&self, key: &str) -> Result<Option<DebateRecord>>;
}

/// Replace characters that are unsafe in file names
fn sanitize_key(key: &str) -> Result<String> {
    let clean: String = key
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '.' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    if clean.is_empty() {
        return Err(Error::Validation("archive key is empty".into()));
    }
    Ok(clean)
}

/// One pretty-printed JSON file per debate
pub struct FileArchive {
    base_path: PathBuf,
}

impl FileArchive {
    pub fn new(base_path: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        Ok(self.base_path.join(format!("{}.json", sanitize_key(key)?)))
    }
}

impl DebateArchive for FileArchive {
    #[instrument(skip(self, record))]
    fn persist(&self, record: &DebateRecord, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(record)?;
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        debug!(path = %path.display(), "Debate archived");
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<DebateRecord>> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Volatile archive for tests and throwaway servers
#[derive(Default)]
pub struct MemoryArchive {
    records: Mutex<HashMap<String, DebateRecord>>,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DebateArchive for MemoryArchive {
    fn persist(&self, record: &DebateRecord, key: &str) -> Result<()> {
        let key = sanitize_key(key)?;
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, record.clone());
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<DebateRecord>> {
        let key = sanitize_key(key)?;
        Ok(self
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        OverallScore, Outcome, ParticipantId, ParticipantRecord, RoomKey, Score, VerdictSource,
    };
    use chrono::Utc;
    use tempfile::TempDir;

    fn record() -> DebateRecord {
        let side = |id: &str| ParticipantRecord {
            id: ParticipantId::new(id),
            arguments: vec!["point".into()],
            turn_scores: vec![Score::NEUTRAL],
            overall: OverallScore::from_turns(&[Score::NEUTRAL]),
            rounds_won: 0,
        };
        DebateRecord {
            room_key: Some(RoomKey::new("ARCH01")),
            topic: "Is a hot dog a sandwich?".into(),
            participant1: side("alice"),
            participant2: side("bob"),
            rounds: vec![],
            outcome: Outcome::Tie,
            reason: "Both players had equal scores of 15.0.".into(),
            verdict_source: VerdictSource::Fallback,
            completed_at: Utc::now(),
        }
    }

    #[test]
    fn test_file_archive_persist_and_load() {
        let dir = TempDir::new().unwrap();
        let archive = FileArchive::new(dir.path().join("debates")).unwrap();
        let rec = record();

        archive.persist(&rec, &rec.archive_key()).unwrap();

        assert!(archive.base_path().join("debate_ARCH01.json").exists());
        assert_eq!(archive.load("debate_ARCH01").unwrap(), Some(rec));
    }

    #[test]
    fn test_file_archive_missing_key() {
        let dir = TempDir::new().unwrap();
        let archive = FileArchive::new(dir.path().to_path_buf()).unwrap();
        assert_eq!(archive.load("debate_NOPE").unwrap(), None);
    }

    #[test]
    fn test_keys_cannot_escape_directory() {
        let dir = TempDir::new().unwrap();
        let archive = FileArchive::new(dir.path().join("a")).unwrap();
        archive.persist(&record(), "../../escape").unwrap();
        assert!(!dir.path().join("escape.json").exists());
        assert!(archive.load("../../escape").unwrap().is_some());
    }

    #[test]
    fn test_memory_archive() {
        let archive = MemoryArchive::new();
        archive.persist(&record(), "debate_ARCH01").unwrap();
        assert_eq!(archive.len(), 1);
        assert!(archive.load("debate_ARCH01").unwrap().is_some());
        assert!(archive.load("debate_OTHER").unwrap().is_none());
    }
}
