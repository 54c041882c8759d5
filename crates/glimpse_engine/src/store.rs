//! Prediction record storage.
//!
//! The store owns durable records; the engine only ever sees snapshots.
//! Two adapters: in-memory, and an append-only JSONL file with one record
//! per line. Both keep insertion order and assign increasing ids.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::error::{EngineError, EngineResult};
use crate::history::History;
use crate::types::{NewRecord, PredictionRecord, RecordId, StoredRecord};

pub trait RecordStore {
    /// All persisted entries in insertion order, malformed ones included.
    fn list(&self) -> EngineResult<Vec<StoredRecord>>;

    /// Persist a new record and return it with its assigned id.
    fn append(&self, record: NewRecord) -> EngineResult<PredictionRecord>;

    /// Validated history built from `list`
    fn load(&self) -> EngineResult<History> {
        Ok(History::from_stored(self.list()?))
    }
}

fn next_id(entries: &[StoredRecord]) -> EngineResult<RecordId> {
    let max = entries.iter().filter_map(|e| e.id).max().unwrap_or(0);
    max.checked_add(1)
        .map(RecordId)
        .ok_or_else(|| EngineError::Store(format!("record id space exhausted after {}", max)))
}

/// True when the file is empty or its last byte is a newline
fn ends_with_newline(file: &mut File) -> std::io::Result<bool> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(true);
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::Start(len - 1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

/// Store kept in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<Vec<StoredRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with raw entries, e.g. a fixture with broken rows
    pub fn with_entries(entries: Vec<StoredRecord>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or_else(|p| p.into_inner().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordStore for MemoryStore {
    fn list(&self) -> EngineResult<Vec<StoredRecord>> {
        let entries = self.entries.read().unwrap_or_else(|p| p.into_inner());
        Ok(entries.clone())
    }

    fn append(&self, record: NewRecord) -> EngineResult<PredictionRecord> {
        let mut entries = self.entries.write().unwrap_or_else(|p| p.into_inner());
        let record = record.into_record(next_id(&entries)?);
        entries.push(StoredRecord::from(&record));
        debug!("Appended record {} to memory store", record.id);
        Ok(record)
    }
}

/// Append-only JSONL file store
pub struct JsonlStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> EngineResult<Vec<StoredRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let mut entries = Vec::new();

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<StoredRecord>(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    // Keep a placeholder so the entry is counted as excluded
                    warn!(
                        "Unreadable history line {} in {}: {}",
                        line_no + 1,
                        self.path.display(),
                        e
                    );
                    entries.push(StoredRecord::default());
                }
            }
        }

        Ok(entries)
    }
}

impl RecordStore for JsonlStore {
    fn list(&self) -> EngineResult<Vec<StoredRecord>> {
        self.read_entries()
    }

    fn append(&self, record: NewRecord) -> EngineResult<PredictionRecord> {
        let _guard = self.write_lock.lock().unwrap_or_else(|p| p.into_inner());

        let record = record.into_record(next_id(&self.read_entries()?)?);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)?;

        // An unterminated tail (torn write, hand edit) must stay its own line
        let mut line = String::new();
        if !ends_with_newline(&mut file)? {
            warn!("{} does not end in a newline, terminating it", self.path.display());
            line.push('\n');
        }
        line.push_str(&serde_json::to_string(&record)?);
        line.push('\n');

        file.write_all(line.as_bytes())?;
        file.sync_all()?;

        info!(
            "Recorded {} prediction {} ({})",
            record.assessment_type, record.id, record.risk_tier
        );
        Ok(record)
    }
}
