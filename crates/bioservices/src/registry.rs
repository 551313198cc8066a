//! Lookup tables fetched once per client
//!
//! Several services validate parameters against lists that only the remote
//! API knows (KEGG organisms, EUtils databases, PSICQUIC services...). A
//! [`Registry`] fetches such a list on first use and keeps it for the life
//! of the client. A failed fetch is not stored, so the next call retries.

use crate::error::Result;
use std::future::Future;
use tokio::sync::OnceCell;

#[derive(Debug)]
pub struct Registry<T> {
    cell: OnceCell<T>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// The stored value, fetching it with `fetch` the first time
    pub async fn get_or_fetch<F, Fut>(&self, fetch: F) -> Result<&T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.cell.get_or_try_init(fetch).await
    }

    /// The stored value if it was already fetched
    pub fn get(&self) -> Option<&T> {
        self.cell.get()
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }
}
