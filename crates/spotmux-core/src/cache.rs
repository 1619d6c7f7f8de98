//! Token cache capability
//!
//! The session manager's only storage backend. Implementations must not
//! memoize reads: other processes may have replaced the record since the
//! last call.

use async_trait::async_trait;

use crate::domain::TokenRecord;
use crate::error::CacheError;

/// Storage for the shared token record
#[async_trait]
pub trait CacheHandler: Send + Sync {
    /// Read the current record; `None` when the identity never authenticated
    async fn get(&self) -> Result<Option<TokenRecord>, CacheError>;

    /// Persist a record (last writer wins)
    async fn save(&self, record: &TokenRecord) -> Result<(), CacheError>;
}
