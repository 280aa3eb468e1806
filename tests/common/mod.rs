//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use lifecache::cache::KvConnection;
use lifecache::intercept::{Document, DocumentStore, WriteResponse};
use lifecache::{CacheError, Result};

// == Counting Database ==

/// Error returned by [`CountingDatabase`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbError {
    Conflict(String),
    NotFound(String),
}

/// In-memory document database that counts every call it receives.
#[derive(Default)]
pub struct CountingDatabase {
    docs: Mutex<HashMap<String, Document>>,
    calls: Mutex<HashMap<&'static str, usize>>,
    revision: AtomicUsize,
}

impl CountingDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of calls received for `method`.
    pub fn calls(&self, method: &str) -> usize {
        self.calls.lock().get(method).copied().unwrap_or(0)
    }

    /// Inserts `doc` directly, bypassing counters and any cache.
    pub fn seed(&self, doc: Document) {
        self.docs.lock().insert(doc.id.clone(), doc);
    }

    fn count(&self, method: &'static str) {
        *self.calls.lock().entry(method).or_insert(0) += 1;
    }

    fn write(&self, doc: &Document) -> WriteResponse {
        let rev = format!("{}-rev", self.revision.fetch_add(1, Ordering::SeqCst) + 1);
        let mut stored = doc.clone();
        stored.rev = Some(rev.clone());
        self.docs.lock().insert(doc.id.clone(), stored);
        WriteResponse {
            id: doc.id.clone(),
            rev,
        }
    }
}

impl DocumentStore for CountingDatabase {
    type Error = DbError;

    fn find(&self, id: &str) -> std::result::Result<Option<Document>, DbError> {
        self.count("find");
        Ok(self.docs.lock().get(id).cloned())
    }

    fn find_any(&self, uri: &str) -> std::result::Result<Option<Document>, DbError> {
        self.count("find_any");
        Ok(self.docs.lock().get(uri).cloned())
    }

    fn contains(&self, id: &str) -> std::result::Result<bool, DbError> {
        self.count("contains");
        Ok(self.docs.lock().contains_key(id))
    }

    fn save(&self, doc: &Document) -> std::result::Result<WriteResponse, DbError> {
        self.count("save");
        if self.docs.lock().contains_key(&doc.id) {
            return Err(DbError::Conflict(doc.id.clone()));
        }
        Ok(self.write(doc))
    }

    fn update(&self, doc: &Document) -> std::result::Result<WriteResponse, DbError> {
        self.count("update");
        if !self.docs.lock().contains_key(&doc.id) {
            return Err(DbError::NotFound(doc.id.clone()));
        }
        Ok(self.write(doc))
    }

    fn remove(&self, doc: &Document) -> std::result::Result<WriteResponse, DbError> {
        self.count("remove");
        match self.docs.lock().remove(&doc.id) {
            Some(removed) => Ok(WriteResponse {
                id: removed.id,
                rev: removed.rev.unwrap_or_default(),
            }),
            None => Err(DbError::NotFound(doc.id.clone())),
        }
    }
}

// == Shared Connection ==

/// In-memory key-value server whose state stays observable after the
/// connection has been handed to a cache.
#[derive(Clone, Default)]
pub struct SharedConnection {
    data: Arc<Mutex<HashMap<Vec<u8>, Vec<u8>>>>,
    round_trips: Arc<AtomicUsize>,
    unreachable: Arc<AtomicBool>,
}

impl SharedConnection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn round_trips(&self) -> usize {
        self.round_trips.load(Ordering::SeqCst)
    }

    pub fn stored_keys(&self) -> usize {
        self.data.lock().len()
    }

    /// Makes every later request fail as a connection error.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    fn trip(&self) -> Result<()> {
        self.round_trips.fetch_add(1, Ordering::SeqCst);
        if self.unreachable.load(Ordering::SeqCst) {
            Err(CacheError::Connection("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

impl KvConnection for SharedConnection {
    fn get(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.trip()?;
        Ok(self.data.lock().get(key).cloned())
    }

    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.trip()?;
        self.data.lock().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn del(&mut self, key: &[u8]) -> Result<()> {
        self.trip()?;
        self.data.lock().remove(key);
        Ok(())
    }

    fn flush_db(&mut self) -> Result<()> {
        self.trip()?;
        self.data.lock().clear();
        Ok(())
    }

    fn flush_all(&mut self) -> Result<()> {
        self.flush_db()
    }

    fn db_size(&mut self) -> Result<u64> {
        self.trip()?;
        Ok(self.data.lock().len() as u64)
    }

    fn info(&mut self) -> Result<String> {
        self.trip()?;
        Ok("# Stats\r\nkeyspace_hits:0\r\nkeyspace_misses:0\r\n".to_string())
    }

    fn select(&mut self, _db: i64) -> Result<()> {
        self.trip()
    }
}
