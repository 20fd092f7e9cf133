// ─── Refreshing Caches ───
// An expiring snapshot swapped atomically behind a RwLock, refreshed through
// a single flight. Shared by the release catalog and the taxonomy caches.

pub mod single_flight;

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::core::error::{ResolveError, ResolveResult};

pub use single_flight::SingleFlight;

/// How long a snapshot lives, and how long before expiry it is refreshed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshPolicy {
    pub ttl: TimeDelta,
    pub lead: TimeDelta,
}

impl RefreshPolicy {
    pub fn from_hours(ttl_hours: u64, lead_hours: u64) -> Self {
        Self {
            ttl: hours(ttl_hours),
            lead: hours(lead_hours),
        }
    }
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self::from_hours(24, 2)
    }
}

fn hours(n: u64) -> TimeDelta {
    i64::try_from(n)
        .ok()
        .and_then(TimeDelta::try_hours)
        .unwrap_or(TimeDelta::MAX)
}

/// One wholesale fetch of a cache's data.
#[derive(Debug)]
pub struct Snapshot<T> {
    pub data: T,
    pub expires: DateTime<Utc>,
}

impl<T> Snapshot<T> {
    /// No refresh needed yet.
    pub fn is_fresh(&self, now: DateTime<Utc>, lead: TimeDelta) -> bool {
        match self.expires.checked_sub_signed(lead) {
            Some(due) => now < due,
            None => false,
        }
    }

    /// May still be served, possibly while a refresh is failing.
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        now < self.expires
    }
}

pub struct RefreshCell<T> {
    name: &'static str,
    policy: RefreshPolicy,
    snapshot: RwLock<Option<Arc<Snapshot<T>>>>,
    flight: SingleFlight<Arc<ResolveError>>,
}

impl<T> RefreshCell<T>
where
    T: Send + Sync + 'static,
{
    pub fn new(name: &'static str, policy: RefreshPolicy) -> Self {
        Self {
            name,
            policy,
            snapshot: RwLock::new(None),
            flight: SingleFlight::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whatever snapshot is held, expired or not.
    pub async fn snapshot(&self) -> Option<Arc<Snapshot<T>>> {
        self.snapshot.read().await.clone()
    }

    /// The held snapshot if it has not expired.
    pub async fn current(&self) -> ResolveResult<Arc<Snapshot<T>>> {
        match self.snapshot().await {
            Some(snapshot) if snapshot.is_usable(Utc::now()) => Ok(snapshot),
            _ => Err(ResolveError::CacheUnavailable { cache: self.name }),
        }
    }

    /// Make sure a fresh snapshot is held, running or joining a refresh.
    ///
    /// `fetch` is only invoked when this caller starts the refresh. If the
    /// refresh fails the previous snapshot is returned while it is unexpired.
    pub async fn ensure_fresh<F, Fut>(self: &Arc<Self>, fetch: F) -> ResolveResult<Arc<Snapshot<T>>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ResolveResult<T>> + Send + 'static,
    {
        if let Some(snapshot) = self.snapshot().await {
            if snapshot.is_fresh(Utc::now(), self.policy.lead) {
                return Ok(snapshot);
            }
        }

        let outcome = self
            .flight
            .run_or_join(|| {
                let cell = Arc::clone(self);
                let pending = fetch();
                async move { cell.install(pending).await }
            })
            .await;

        let held = self.snapshot().await;
        match (outcome, held) {
            (Ok(()), Some(snapshot)) => Ok(snapshot),
            (Ok(()), None) => Err(ResolveError::CacheUnavailable { cache: self.name }),
            (Err(_), Some(snapshot)) if snapshot.is_usable(Utc::now()) => {
                debug!("Serving stale {} cache after failed refresh", self.name);
                Ok(snapshot)
            }
            (Err(source), _) => Err(ResolveError::CacheFetchFailed {
                cache: self.name,
                source,
            }),
        }
    }

    async fn install<Fut>(&self, pending: Fut) -> Result<(), Arc<ResolveError>>
    where
        Fut: Future<Output = ResolveResult<T>>,
    {
        // A flight that finished just before this one started may have
        // already refreshed.
        if let Some(snapshot) = self.snapshot().await {
            if snapshot.is_fresh(Utc::now(), self.policy.lead) {
                return Ok(());
            }
        }

        debug!("Refreshing {} cache...", self.name);
        match pending.await {
            Ok(data) => {
                let now = Utc::now();
                let expires = now
                    .checked_add_signed(self.policy.ttl)
                    .unwrap_or(DateTime::<Utc>::MAX_UTC);
                let snapshot = Arc::new(Snapshot { data, expires });
                *self.snapshot.write().await = Some(snapshot);
                info!("Refreshed {} cache, valid until {}", self.name, expires);
                Ok(())
            }
            Err(e) => {
                warn!("Refreshing {} cache failed: {}", self.name, e);
                Err(Arc::new(e))
            }
        }
    }
}
