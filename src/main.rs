//! Lifecache sample program
//!
//! Exercises the configured cache backend directly, then through a cached
//! document store wrapped around an in-memory database.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context};
use parking_lot::Mutex;
use serde_json::json;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lifecache::intercept::{CachedDocumentStore, Document, DocumentStore, WriteResponse};
use lifecache::{CacheStore, Config};

/// Entry lifetime used by the sample puts.
const SAMPLE_LIFETIME_MS: i64 = 3_000;

fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lifecache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("invalid cache configuration")?;
    info!(
        "Configuration loaded: backend={:?}, max_objects={}, default_lifetime={}ms",
        config.backend, config.max_objects, config.default_lifetime_ms
    );

    run_store_sample(&config)?;
    run_document_sample(&config)?;

    info!("Sample finished");
    Ok(())
}

/// Puts a few values, reads them back and reports statistics.
fn run_store_sample(config: &Config) -> anyhow::Result<()> {
    let store = config.open_store::<String, i64>()?;
    let sample_keys = ["key1", "key2", "key3"].map(String::from);
    store.delete_all(&sample_keys)?;

    store.put_with_lifetime("key1".to_string(), 42, SAMPLE_LIFETIME_MS)?;
    info!("key1 -> {:?}", store.get(&"key1".to_string())?);
    info!("key2 -> {:?}", store.get(&"key2".to_string())?);

    store.put_all_with_lifetime(
        HashMap::from([("key2".to_string(), 43), ("key3".to_string(), 44)]),
        SAMPLE_LIFETIME_MS,
    )?;

    if let Some(entry) = store.get_entry(&"key3".to_string())? {
        info!("key3 expires at {}", entry.expiration_time());
    }

    let stats = store.statistics()?;
    info!(
        "Cache size: {}, hit rate: {:?}",
        store.size()?,
        stats.hit_rate()
    );

    store.delete_all(&sample_keys)?;
    Ok(())
}

/// Saves, reads and removes a document through the caching wrapper.
fn run_document_sample(config: &Config) -> anyhow::Result<()> {
    let cache: Arc<dyn CacheStore<String, Document>> =
        Arc::from(config.open_store::<String, Document>()?);
    let db = CachedDocumentStore::new(SampleDatabase::default(), cache);

    let rectangle = Document::new("rect1", json!({"length": 5, "width": 6}));
    let saved = db.save(&rectangle)?;
    info!("Saved {} at revision {}", saved.id, saved.rev);

    let found = db.find("rect1")?;
    info!(
        "Found rect1 (cached: {}): {:?}",
        db.cache_get("rect1")?.is_some(),
        found.map(|doc| doc.body)
    );

    db.remove(&rectangle)?;
    info!("Removed rect1, still cached: {}", db.cache_get("rect1")?.is_some());
    Ok(())
}

// == Sample Database ==
/// In-memory document database standing in for a real one.
#[derive(Default)]
struct SampleDatabase {
    docs: Mutex<HashMap<String, Document>>,
    revisions: AtomicU64,
}

impl SampleDatabase {
    fn write(&self, doc: &Document) -> WriteResponse {
        let rev = format!("{}-sample", self.revisions.fetch_add(1, Ordering::SeqCst) + 1);
        let mut stored = doc.clone();
        stored.rev = Some(rev.clone());
        self.docs.lock().insert(doc.id.clone(), stored);
        WriteResponse {
            id: doc.id.clone(),
            rev,
        }
    }
}

impl DocumentStore for SampleDatabase {
    type Error = anyhow::Error;

    fn find(&self, id: &str) -> anyhow::Result<Option<Document>> {
        Ok(self.docs.lock().get(id).cloned())
    }

    fn find_any(&self, uri: &str) -> anyhow::Result<Option<Document>> {
        let id = uri.rsplit('/').next().unwrap_or(uri);
        self.find(id)
    }

    fn contains(&self, id: &str) -> anyhow::Result<bool> {
        Ok(self.docs.lock().contains_key(id))
    }

    fn save(&self, doc: &Document) -> anyhow::Result<WriteResponse> {
        if self.docs.lock().contains_key(&doc.id) {
            bail!("document {} already exists", doc.id);
        }
        Ok(self.write(doc))
    }

    fn update(&self, doc: &Document) -> anyhow::Result<WriteResponse> {
        if !self.docs.lock().contains_key(&doc.id) {
            bail!("document {} does not exist", doc.id);
        }
        Ok(self.write(doc))
    }

    fn remove(&self, doc: &Document) -> anyhow::Result<WriteResponse> {
        match self.docs.lock().remove(&doc.id) {
            Some(removed) => Ok(WriteResponse {
                id: removed.id,
                rev: removed.rev.unwrap_or_default(),
            }),
            None => bail!("document {} does not exist", doc.id),
        }
    }
}
