//! The sync orchestrator.
//!
//! A pass fetches the remote listing and the local listing concurrently on
//! blocking workers, waits for both under a timeout, then plans and applies
//! the changes. Every failure is classified and counted; a pass never
//! returns an error.

use crate::config::SyncConfig;
use crate::error::{FetchError, FetchResult, SyncError};
use crate::listing::{plan, ChangeSet, Listing};
use crate::result::{SyncAccumulator, SyncResult};
use crate::transport::{Headers, Http, API_KEY_HEADER};
use std::sync::Arc;
use tokio::runtime::{Handle, Runtime};
use tokio::task::JoinError;
use tracing::{debug, info, warn};

/// The local side of a sync pass.
pub trait LocalReplica: Send + Sync {
    /// Summarizes the locally cached entries.
    fn listing(&self) -> FetchResult<Listing>;

    /// Applies a change set atomically.
    fn apply(&self, changes: &ChangeSet) -> FetchResult<()>;
}

/// Something that can be synchronized on demand.
pub trait Syncable {
    /// Runs one sync pass. `force` rewrites entries even when versions match.
    fn sync(&self, force: bool) -> SyncResult;
}

/// Runs sync passes between an [`Http`] remote and a [`LocalReplica`].
///
/// Dropping the orchestrator does not wait for units still running after a
/// timed-out pass; their results are discarded.
pub struct SyncOrchestrator<H, R> {
    config: SyncConfig,
    http: Arc<H>,
    replica: Arc<R>,
    // Only `None` while dropping
    runtime: Option<Runtime>,
}

impl<H, R> SyncOrchestrator<H, R>
where
    H: Http + 'static,
    R: LocalReplica + 'static,
{
    /// Creates an orchestrator with its own worker runtime.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Runtime`] if the runtime cannot be built.
    pub fn new(config: SyncConfig, http: Arc<H>, replica: Arc<R>) -> Result<Self, SyncError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(config.worker_threads.max(1))
            .thread_name("resroute-sync")
            .enable_time()
            .build()?;

        Ok(Self {
            config,
            http,
            replica,
            runtime: Some(runtime),
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Returns the remote client.
    pub fn http(&self) -> &Arc<H> {
        &self.http
    }

    /// Returns the local replica.
    pub fn replica(&self) -> &Arc<R> {
        &self.replica
    }

    /// Runs one sync pass and returns its counters.
    ///
    /// The calling thread blocks until the pass ends. When called from
    /// inside an async runtime the pass is driven from a helper thread.
    pub fn sync(&self, force: bool) -> SyncResult {
        let acc = Arc::new(SyncAccumulator::new());
        let Some(runtime) = self.runtime.as_ref() else {
            acc.record_error(FetchError::Worker("runtime shut down".into()).class());
            return acc.snapshot();
        };
        debug!(force, url = %self.config.listing_url(), "sync pass starting");

        let remote_unit = {
            let http = Arc::clone(&self.http);
            let acc = Arc::clone(&acc);
            let url = self.config.listing_url();
            let headers = self.request_headers();
            move || {
                run_unit("remote", &acc, || {
                    let document = http.get(&url, headers.as_ref(), None)?;
                    Listing::from_remote(&document)
                })
            }
        };
        let local_unit = {
            let replica = Arc::clone(&self.replica);
            let acc = Arc::clone(&acc);
            move || run_unit("local", &acc, || replica.listing())
        };

        let timeout = self.config.timeout;
        let pass = move || {
            runtime.block_on(async move {
                let remote = tokio::task::spawn_blocking(remote_unit);
                let local = tokio::task::spawn_blocking(local_unit);
                tokio::time::timeout(timeout, async { tokio::join!(remote, local) }).await
            })
        };

        let joined = if Handle::try_current().is_ok() {
            debug!("sync called from an async context, using a helper thread");
            match std::thread::scope(|scope| scope.spawn(pass).join()) {
                Ok(joined) => joined,
                Err(_) => {
                    let err = FetchError::Worker("sync helper thread panicked".into());
                    warn!(error = %err, "sync worker failed");
                    acc.record_error(err.class());
                    return acc.snapshot();
                }
            }
        } else {
            pass()
        };

        let (remote, local) = match joined {
            Ok((remote, local)) => (joined_unit(&acc, remote), joined_unit(&acc, local)),
            Err(_) => {
                warn!(timeout = ?self.config.timeout, "sync pass timed out");
                acc.record_timeout();
                return acc.snapshot();
            }
        };

        if let (Some(remote), Some(local)) = (remote, local) {
            let changes = plan(&local, &remote, force);
            acc.record_plan(&changes);

            if !changes.is_empty() || changes.version != local.version {
                if let Err(err) = self.replica.apply(&changes) {
                    warn!(class = %err.class(), error = %err, "applying changes failed");
                    acc.record_error(err.class());
                }
            }
        }

        let result = acc.snapshot();
        info!(
            inserts = result.inserts,
            updates = result.updates,
            deletes = result.deletes,
            errors = result.error_count(),
            "sync pass finished"
        );
        result
    }

    fn request_headers(&self) -> Option<Headers> {
        self.config.api_key.as_ref().map(|key| {
            let mut headers = Headers::new();
            headers.insert(API_KEY_HEADER.to_string(), key.clone());
            headers
        })
    }
}

impl<H, R> Syncable for SyncOrchestrator<H, R>
where
    H: Http + 'static,
    R: LocalReplica + 'static,
{
    fn sync(&self, force: bool) -> SyncResult {
        SyncOrchestrator::sync(self, force)
    }
}

impl<H, R> Drop for SyncOrchestrator<H, R> {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl<H, R> std::fmt::Debug for SyncOrchestrator<H, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncOrchestrator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn run_unit<F>(name: &'static str, acc: &SyncAccumulator, unit: F) -> Option<Listing>
where
    F: FnOnce() -> FetchResult<Listing>,
{
    match unit() {
        Ok(listing) => {
            debug!(unit = name, entries = listing.len(), "fetched listing");
            Some(listing)
        }
        Err(err) => {
            warn!(unit = name, class = %err.class(), error = %err, "fetch failed");
            acc.record_error(err.class());
            None
        }
    }
}

fn joined_unit(
    acc: &SyncAccumulator,
    joined: Result<Option<Listing>, JoinError>,
) -> Option<Listing> {
    joined.unwrap_or_else(|err| {
        let err = FetchError::Worker(err.to_string());
        warn!(error = %err, "sync worker failed");
        acc.record_error(err.class());
        None
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HttpError;
    use crate::listing::Entry;
    use crate::transport::MockHttp;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::time::{Duration, Instant};

    const ENDPOINT: &str = "https://data.example.com";
    const URL: &str = "https://data.example.com/listing.json";

    #[derive(Default)]
    struct MemoryReplica {
        listing: Mutex<Listing>,
        fail_listing: bool,
        fail_apply: bool,
        delay: Option<Duration>,
        applied: Mutex<Vec<ChangeSet>>,
    }

    impl LocalReplica for MemoryReplica {
        fn listing(&self) -> FetchResult<Listing> {
            if let Some(delay) = self.delay {
                std::thread::sleep(delay);
            }
            if self.fail_listing {
                return Err(FetchError::local(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "disk gone",
                )));
            }
            Ok(self.listing.lock().clone())
        }

        fn apply(&self, changes: &ChangeSet) -> FetchResult<()> {
            if self.fail_apply {
                return Err(FetchError::local(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "read-only",
                )));
            }
            let mut listing = self.listing.lock();
            for key in &changes.deletes {
                listing.entries.remove(key);
            }
            for (key, entry) in changes.inserts.iter().chain(&changes.updates) {
                listing.entries.insert(key.clone(), entry.clone());
            }
            listing.version = changes.version.clone();
            self.applied.lock().push(changes.clone());
            Ok(())
        }
    }

    fn orchestrator(
        http: MockHttp,
        replica: MemoryReplica,
    ) -> SyncOrchestrator<MockHttp, MemoryReplica> {
        let config = SyncConfig::new(ENDPOINT).with_timeout(Duration::from_secs(5));
        SyncOrchestrator::new(config, Arc::new(http), Arc::new(replica)).unwrap()
    }

    fn remote_doc() -> serde_json::Value {
        json!({
            "version": "2",
            "data": {
                "Ahri": {"key": "103"},
                "Brand": {"key": "63"}
            }
        })
    }

    #[test]
    fn successful_pass_applies_changes() {
        let http = MockHttp::new();
        http.respond(URL, Ok(remote_doc()));
        let sync = orchestrator(http, MemoryReplica::default());

        let result = sync.sync(false);
        assert_eq!(result.inserts, 2);
        assert!(!result.has_errors());
        assert_eq!(sync.replica().listing.lock().version.as_deref(), Some("2"));

        let again = sync.sync(false);
        assert_eq!(again.change_count(), 0);
        assert_eq!(sync.replica().applied.lock().len(), 1);
    }

    #[test]
    fn forced_pass_updates_everything() {
        let http = MockHttp::new();
        http.respond(URL, Ok(remote_doc()));
        let sync = orchestrator(http, MemoryReplica::default());
        sync.sync(false);

        let result = sync.sync(true);
        assert_eq!(result.updates, 2);
        assert_eq!(result.inserts, 0);
    }

    #[test]
    fn network_failure_with_local_success() {
        let http = MockHttp::new();
        http.respond(URL, Err(HttpError::unreachable("offline")));
        let sync = orchestrator(http, MemoryReplica::default());

        let result = sync.sync(false);
        assert_eq!(result.network_errors, 1);
        assert_eq!(result.authentication_errors, 0);
        assert_eq!(result.other_errors, 0);
        assert_eq!(result.change_count(), 0);
        assert!(sync.replica().applied.lock().is_empty());
    }

    #[test]
    fn network_failure_regardless_of_finish_order() {
        let http = MockHttp::new();
        http.respond(URL, Err(HttpError::status(503, "maintenance")));
        http.set_delay(Some(Duration::from_millis(50)));
        let fast_local = orchestrator(http, MemoryReplica::default());
        assert_eq!(fast_local.sync(false).network_errors, 1);

        let http = MockHttp::new();
        http.respond(URL, Err(HttpError::status(503, "maintenance")));
        let slow_local = orchestrator(
            http,
            MemoryReplica {
                delay: Some(Duration::from_millis(50)),
                ..MemoryReplica::default()
            },
        );
        assert_eq!(slow_local.sync(false).network_errors, 1);
    }

    #[test]
    fn authentication_and_local_failures_both_count() {
        let http = MockHttp::new();
        http.respond(URL, Err(HttpError::status(401, "bad key")));
        let sync = orchestrator(
            http,
            MemoryReplica {
                fail_listing: true,
                ..MemoryReplica::default()
            },
        );

        let result = sync.sync(false);
        assert_eq!(result.authentication_errors, 1);
        assert_eq!(result.other_errors, 1);
    }

    #[test]
    fn malformed_remote_is_other_error() {
        let http = MockHttp::new();
        http.respond(URL, Ok(json!({"version": "1"})));
        let result = orchestrator(http, MemoryReplica::default()).sync(false);
        assert_eq!(result.other_errors, 1);
    }

    #[test]
    fn apply_failure_is_counted() {
        let http = MockHttp::new();
        http.respond(URL, Ok(remote_doc()));
        let sync = orchestrator(
            http,
            MemoryReplica {
                fail_apply: true,
                ..MemoryReplica::default()
            },
        );

        let result = sync.sync(false);
        assert_eq!(result.inserts, 2);
        assert_eq!(result.other_errors, 1);
    }

    #[test]
    fn timeout_is_counted() {
        let http = MockHttp::new();
        http.respond(URL, Ok(remote_doc()));
        http.set_delay(Some(Duration::from_millis(300)));
        let config = SyncConfig::new(ENDPOINT).with_timeout(Duration::from_millis(20));
        let sync = SyncOrchestrator::new(
            config,
            Arc::new(http),
            Arc::new(MemoryReplica::default()),
        )
        .unwrap();

        let result = sync.sync(false);
        assert_eq!(result.timeouts, 1);
        assert_eq!(result.change_count(), 0);
        assert!(result.has_errors());
    }

    #[test]
    fn drop_after_timeout_does_not_wait_for_units() {
        let http = MockHttp::new();
        http.respond(URL, Ok(remote_doc()));
        let config = SyncConfig::new(ENDPOINT).with_timeout(Duration::from_millis(20));
        let sync = SyncOrchestrator::new(
            config,
            Arc::new(http),
            Arc::new(MemoryReplica {
                delay: Some(Duration::from_secs(3)),
                ..MemoryReplica::default()
            }),
        )
        .unwrap();

        assert_eq!(sync.sync(false).timeouts, 1);

        let started = Instant::now();
        drop(sync);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn sync_from_async_context() {
        let http = MockHttp::new();
        http.respond(URL, Ok(remote_doc()));
        let sync = orchestrator(http, MemoryReplica::default());

        let outer = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let result = outer.block_on(async { sync.sync(false) });
        assert_eq!(result.inserts, 2);
        assert!(!result.has_errors());
    }

    #[test]
    fn api_key_header_is_sent() {
        let http = MockHttp::new();
        http.respond(URL, Ok(remote_doc()));
        let config = SyncConfig::new(ENDPOINT).with_api_key("secret");
        let sync = SyncOrchestrator::new(
            config,
            Arc::new(http),
            Arc::new(MemoryReplica::default()),
        )
        .unwrap();
        sync.sync(false);

        let requests = sync.http().requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, URL);
        assert_eq!(
            requests[0].headers.as_ref().unwrap()[API_KEY_HEADER],
            "secret"
        );
    }

    #[test]
    fn syncable_object() {
        let http = MockHttp::new();
        http.respond(URL, Ok(remote_doc()));
        let mut replica = MemoryReplica::default();
        replica
            .listing
            .get_mut()
            .insert("Zed", Entry::from_payload(json!({"key": "238"})));

        let sync: Box<dyn Syncable> = Box::new(orchestrator(http, replica));
        let result = sync.sync(false);
        assert_eq!((result.inserts, result.deletes), (2, 1));
    }
}
