// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Lance Authors

//! Pool of catalog clients with scoped leases.
//!
//! Every catalog step borrows a client through [`CatalogClientPool::get_client`]
//! and holds the returned [`PooledClient`] for as long as it talks to the
//! catalog. Dropping the lease hands the client back to the pool, whether the
//! step finished normally or bailed out with an error.

use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::catalog_client::{CatalogClient, CatalogResult};
use crate::properties::{Properties, DEFAULT_METASTORE_URI, HIVE_METASTORE_URI_KEY};
use crate::rest_catalog::{RestCatalogClient, RestCatalogConfig};

/// Upper bound on clients kept idle between leases.
pub const DEFAULT_MAX_IDLE: usize = 8;

/// Creates new catalog clients when the pool has no idle one to hand out.
pub trait CatalogClientFactory: Send + Sync {
    fn create_client(&self) -> CatalogResult<Arc<dyn CatalogClient>>;
}

impl<F> CatalogClientFactory for F
where
    F: Fn() -> CatalogResult<Arc<dyn CatalogClient>> + Send + Sync,
{
    fn create_client(&self) -> CatalogResult<Arc<dyn CatalogClient>> {
        self()
    }
}

struct PoolInner {
    factory: Box<dyn CatalogClientFactory>,
    idle: Mutex<Vec<Arc<dyn CatalogClient>>>,
    max_idle: usize,
    leased: AtomicUsize,
}

/// A cheaply cloneable handle to a shared pool of catalog clients.
#[derive(Clone)]
pub struct CatalogClientPool {
    inner: Arc<PoolInner>,
}

impl std::fmt::Debug for CatalogClientPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClientPool")
            .field("idle", &self.idle_count())
            .field("leased", &self.leased_count())
            .field("max_idle", &self.inner.max_idle)
            .finish()
    }
}

impl CatalogClientPool {
    pub fn new(factory: impl CatalogClientFactory + 'static) -> Self {
        Self::with_max_idle(factory, DEFAULT_MAX_IDLE)
    }

    pub fn with_max_idle(factory: impl CatalogClientFactory + 'static, max_idle: usize) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                factory: Box::new(factory),
                idle: Mutex::new(Vec::new()),
                max_idle,
                leased: AtomicUsize::new(0),
            }),
        }
    }

    /// A pool that always leases the same shared client.
    pub fn single(client: Arc<dyn CatalogClient>) -> Self {
        Self::new(move || -> CatalogResult<Arc<dyn CatalogClient>> { Ok(client.clone()) })
    }

    /// Build a pool of [`RestCatalogClient`]s pointed at
    /// `hive.dataset.hive.metastore.uri`, or the default metastore endpoint.
    pub fn from_properties(properties: &Properties) -> CatalogResult<Self> {
        let uri = properties.get_or(HIVE_METASTORE_URI_KEY, DEFAULT_METASTORE_URI);
        let config = RestCatalogConfig::new(uri);
        // Fail fast on an unusable endpoint instead of on the first lease.
        let first: Arc<dyn CatalogClient> = Arc::new(RestCatalogClient::new(config.clone())?);
        let pool = Self::new(move || -> CatalogResult<Arc<dyn CatalogClient>> {
            Ok(Arc::new(RestCatalogClient::new(config.clone())?))
        });
        pool.inner.idle.lock().push(first);
        Ok(pool)
    }

    /// Lease a client. It returns to the pool when the guard is dropped.
    pub fn get_client(&self) -> CatalogResult<PooledClient> {
        let reused = self.inner.idle.lock().pop();
        let client = match reused {
            Some(client) => client,
            None => self.inner.factory.create_client()?,
        };
        self.inner.leased.fetch_add(1, Ordering::SeqCst);
        Ok(PooledClient {
            client,
            pool: self.inner.clone(),
        })
    }

    pub fn idle_count(&self) -> usize {
        self.inner.idle.lock().len()
    }

    /// Number of leases currently outstanding.
    pub fn leased_count(&self) -> usize {
        self.inner.leased.load(Ordering::SeqCst)
    }
}

/// A leased catalog client. Derefs to [`CatalogClient`].
pub struct PooledClient {
    client: Arc<dyn CatalogClient>,
    pool: Arc<PoolInner>,
}

impl PooledClient {
    pub fn get(&self) -> &dyn CatalogClient {
        self.client.as_ref()
    }
}

impl Deref for PooledClient {
    type Target = dyn CatalogClient;

    fn deref(&self) -> &Self::Target {
        self.client.as_ref()
    }
}

impl Drop for PooledClient {
    fn drop(&mut self) {
        self.pool.leased.fetch_sub(1, Ordering::SeqCst);
        let mut idle = self.pool.idle.lock();
        if idle.len() < self.pool.max_idle {
            idle.push(self.client.clone());
        }
    }
}
