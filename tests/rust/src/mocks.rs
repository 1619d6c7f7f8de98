//! Mock cache handlers for testing
//!
//! In-memory `CacheHandler` implementations that count calls, for fast,
//! isolated session and dispatcher tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use spotmux_core::{CacheError, CacheHandler, TokenRecord, TransportError};

// ============================================================================
// InMemoryCacheHandler
// ============================================================================

#[derive(Default)]
pub struct InMemoryCacheHandler {
    record: RwLock<Option<TokenRecord>>,
    saved: RwLock<Vec<TokenRecord>>,
    gets: AtomicUsize,
    fail_saves: bool,
}

impl InMemoryCacheHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(self, record: TokenRecord) -> Self {
        *self.record.write().unwrap() = Some(record);
        self
    }

    /// Every `save()` fails as if the backend were down
    pub fn failing_saves(mut self) -> Self {
        self.fail_saves = true;
        self
    }

    pub fn current(&self) -> Option<TokenRecord> {
        self.record.read().unwrap().clone()
    }

    pub fn saved(&self) -> Vec<TokenRecord> {
        self.saved.read().unwrap().clone()
    }

    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn save_count(&self) -> usize {
        self.saved.read().unwrap().len()
    }
}

#[async_trait]
impl CacheHandler for InMemoryCacheHandler {
    async fn get(&self) -> Result<Option<TokenRecord>, CacheError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        Ok(self.record.read().unwrap().clone())
    }

    async fn save(&self, record: &TokenRecord) -> Result<(), CacheError> {
        self.saved.write().unwrap().push(record.clone());
        if self.fail_saves {
            return Err(CacheError::Unavailable(TransportError::status(
                503,
                "backend unavailable",
            )));
        }
        *self.record.write().unwrap() = Some(record.clone());
        Ok(())
    }
}

// ============================================================================
// UnavailableCacheHandler
// ============================================================================

/// Every read and write fails with a timeout
#[derive(Default)]
pub struct UnavailableCacheHandler {
    gets: AtomicUsize,
    saves: AtomicUsize,
}

impl UnavailableCacheHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CacheHandler for UnavailableCacheHandler {
    async fn get(&self) -> Result<Option<TokenRecord>, CacheError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::Unavailable(TransportError::timeout(
            "request timed out",
        )))
    }

    async fn save(&self, _record: &TokenRecord) -> Result<(), CacheError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::Unavailable(TransportError::timeout(
            "request timed out",
        )))
    }
}
