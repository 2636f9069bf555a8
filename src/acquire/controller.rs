use log::{debug, error, info, warn};
use serde::Serialize;
use std::sync::Arc;
use tokio::task::spawn_blocking;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::acquire::{AcquireError, RetryPolicy};
use crate::catalog::{CatalogQuery, ElementSource, FetchOutcome, TrackingElementSet};
use crate::store::{ElementStore, Freshness, PutOutcome, StoreError};

/// Element set chosen for a request together with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub elements: TrackingElementSet,
    pub freshness: Freshness,
    /// The stored set that preceded `elements`, if any.
    pub previous: Option<TrackingElementSet>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefreshSummary {
    pub stored: usize,
    pub unchanged: usize,
    pub rejected: usize,
}

/// Fetches from the catalog with bounded retries and falls back to the
/// element store once the attempts are spent.
pub struct ResilienceController {
    source: Arc<dyn ElementSource>,
    store: Arc<ElementStore>,
    policy: RetryPolicy,
}

impl ResilienceController {
    pub fn new(source: Arc<dyn ElementSource>, store: Arc<ElementStore>, policy: RetryPolicy) -> Self {
        Self {
            source,
            store,
            policy,
        }
    }

    pub fn store(&self) -> &ElementStore {
        &self.store
    }

    pub async fn resolve(&self, catalog_id: u32) -> Result<Resolved, AcquireError> {
        let live = self
            .fetch_with_retry(CatalogQuery::Id(catalog_id), |outcome| {
                outcome.newest_for(catalog_id).cloned()
            })
            .await;

        match live {
            Some(elements) => Ok(self.record_live(catalog_id, elements).await),
            None => self.fallback(catalog_id),
        }
    }

    /// Like [`resolve`](Self::resolve) but gives up as soon as `cancel`
    /// fires. An abandoned resolution never writes to the store.
    pub async fn resolve_cancellable(
        &self,
        catalog_id: u32,
        cancel: &CancellationToken,
    ) -> Result<Resolved, AcquireError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Catalog {}: resolution cancelled", catalog_id);
                Err(AcquireError::Cancelled)
            }
            result = self.resolve(catalog_id) => result,
        }
    }

    /// Pulls the whole configured catalog and stores every valid record.
    pub async fn refresh_all(&self) -> Result<RefreshSummary, AcquireError> {
        let outcome = self
            .fetch_with_retry(CatalogQuery::All, |outcome| {
                (!outcome.sets.is_empty()).then_some(outcome)
            })
            .await
            .ok_or(AcquireError::SourceExhausted(self.policy.attempts))?;

        let rejected = outcome.rejected.len();
        let store = self.store.clone();
        let sets = outcome.sets;
        let mut summary = spawn_blocking(move || -> Result<RefreshSummary, StoreError> {
            let mut summary = RefreshSummary::default();
            for set in sets {
                match store.put(set.catalog_id, set)? {
                    PutOutcome::Stored(_) => summary.stored += 1,
                    PutOutcome::Unchanged(_) => summary.unchanged += 1,
                }
            }
            Ok(summary)
        })
        .await??;
        summary.rejected = rejected;

        info!(
            "Catalog refresh: {} stored, {} unchanged, {} rejected",
            summary.stored, summary.unchanged, summary.rejected
        );
        Ok(summary)
    }

    async fn fetch_with_retry<T>(
        &self,
        query: CatalogQuery,
        mut accept: impl FnMut(FetchOutcome) -> Option<T>,
    ) -> Option<T> {
        let mut attempt = 1;
        loop {
            match self.source.fetch(query).await {
                Ok(outcome) => {
                    if let Some(value) = accept(outcome) {
                        return Some(value);
                    }
                    warn!(
                        "{:?}: no usable element set (attempt {}/{})",
                        query, attempt, self.policy.attempts
                    );
                }
                Err(e) => warn!("{:?}: {} (attempt {}/{})", query, e, attempt, self.policy.attempts),
            }

            let delay = self.policy.delay_after(attempt)?;
            info!("{:?}: retrying in {:?}", query, delay);
            sleep(delay).await;
            attempt += 1;
        }
    }

    /// Store writes do file IO under a per-id lock, so they run on the
    /// blocking pool rather than a runtime worker.
    async fn put_blocking(
        &self,
        catalog_id: u32,
        elements: TrackingElementSet,
    ) -> Result<PutOutcome, AcquireError> {
        let store = self.store.clone();
        Ok(spawn_blocking(move || store.put(catalog_id, elements)).await??)
    }

    async fn record_live(&self, catalog_id: u32, elements: TrackingElementSet) -> Resolved {
        match self.put_blocking(catalog_id, elements.clone()).await {
            Ok(outcome) => {
                if !outcome.is_stored() {
                    debug!(
                        "Catalog {}: upstream epoch {} is not newer than stored {}",
                        catalog_id,
                        elements.epoch,
                        outcome.entry().elements.epoch
                    );
                }
                let entry = outcome.into_entry();
                Resolved {
                    elements: entry.elements,
                    freshness: Freshness::Live,
                    previous: entry.previous,
                }
            }
            Err(e) => {
                error!("Catalog {}: failed to cache live elements: {}", catalog_id, e);
                let previous = self
                    .store
                    .get(catalog_id)
                    .map(|entry| entry.elements)
                    .filter(|stored| stored.epoch < elements.epoch);
                Resolved {
                    elements,
                    freshness: Freshness::Live,
                    previous,
                }
            }
        }
    }

    fn fallback(&self, catalog_id: u32) -> Result<Resolved, AcquireError> {
        let entry = self
            .store
            .get(catalog_id)
            .ok_or(AcquireError::Unavailable(catalog_id))?
            .as_fallback();

        warn!(
            "Catalog {}: using cached elements from epoch {} (fetched {})",
            catalog_id, entry.elements.epoch, entry.fetched_at
        );

        Ok(Resolved {
            elements: entry.elements,
            freshness: entry.freshness,
            previous: entry.previous,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{fixtures, SourceError};
    use crate::catalog::fixtures::{ScriptedSource, StaticSource};
    use std::time::Duration;

    fn controller(source: Arc<ScriptedSource>, store: Arc<ElementStore>) -> ResilienceController {
        ResilienceController::new(source, store, RetryPolicy::default())
    }

    fn empty_store() -> Arc<ElementStore> {
        Arc::new(ElementStore::open(fixtures::temp_folder()).unwrap())
    }

    fn unavailable() -> Result<FetchOutcome, SourceError> {
        Err(SourceError::Unavailable("timeout".into()))
    }

    fn serving(sets: Vec<TrackingElementSet>) -> Result<FetchOutcome, SourceError> {
        Ok(FetchOutcome {
            sets,
            rejected: Vec::new(),
        })
    }

    fn assert_close(actual: Duration, expected: Duration) {
        let diff = actual.abs_diff(expected);
        assert!(diff < Duration::from_millis(50), "{:?} != {:?}", actual, expected);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_with_backoff_then_goes_live() {
        let source = Arc::new(ScriptedSource::new(vec![
            unavailable(),
            unavailable(),
            serving(vec![fixtures::iss()]),
        ]));
        let store = empty_store();
        let controller = controller(source.clone(), store.clone());

        let resolved = controller.resolve(25544).await.unwrap();
        assert_eq!(resolved.freshness, Freshness::Live);
        assert_eq!(resolved.elements, fixtures::iss());

        let calls = source.call_times();
        assert_eq!(calls.len(), 3);
        assert_close(calls[1] - calls[0], Duration::from_secs(1));
        assert_close(calls[2] - calls[1], Duration::from_secs(2));
        assert_eq!(store.get(25544).unwrap().elements, fixtures::iss());
    }

    #[tokio::test(start_paused = true)]
    async fn first_valid_record_short_circuits() {
        let source = Arc::new(ScriptedSource::new(vec![serving(vec![fixtures::iss()])]));
        let controller = controller(source.clone(), empty_store());

        let start = tokio::time::Instant::now();
        controller.resolve(25544).await.unwrap();
        assert_eq!(source.call_times().len(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn response_without_requested_id_counts_as_failure() {
        let source = Arc::new(ScriptedSource::new(vec![
            serving(vec![fixtures::hubble()]),
            Err(SourceError::Malformed {
                rejected: 1,
                reason: "bad checksum".into(),
            }),
            serving(vec![fixtures::iss()]),
        ]));
        let controller = controller(source.clone(), empty_store());

        let resolved = controller.resolve(25544).await.unwrap();
        assert_eq!(resolved.freshness, Freshness::Live);
        assert_eq!(source.queries(), vec![CatalogQuery::Id(25544); 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn falls_back_to_cached_entry() {
        let store = empty_store();
        store.put(25544, fixtures::iss()).unwrap();
        let source = Arc::new(ScriptedSource::failing());
        let controller = controller(source.clone(), store);

        let start = tokio::time::Instant::now();
        let resolved = controller.resolve(25544).await.unwrap();
        assert_eq!(resolved.freshness, Freshness::Fallback);
        assert_eq!(resolved.elements, fixtures::iss());
        assert_eq!(source.call_times().len(), 3);
        assert_close(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn unavailable_without_cache() {
        let source = Arc::new(ScriptedSource::failing());
        let controller = controller(source, empty_store());

        let err = controller.resolve(25544).await.unwrap_err();
        assert!(matches!(err, AcquireError::Unavailable(25544)));
    }

    #[tokio::test(start_paused = true)]
    async fn stale_upstream_epoch_keeps_newer_cached_set() {
        let store = empty_store();
        store.put(25544, fixtures::iss()).unwrap();
        let source = Arc::new(ScriptedSource::serving(vec![fixtures::iss_prior()]));
        let controller = controller(source, store.clone());

        let resolved = controller.resolve(25544).await.unwrap();
        assert_eq!(resolved.freshness, Freshness::Live);
        assert_eq!(resolved.elements.epoch, fixtures::iss().epoch);
        assert_eq!(store.get(25544).unwrap().elements.epoch, fixtures::iss().epoch);
    }

    #[tokio::test(start_paused = true)]
    async fn live_update_reports_previous_set() {
        let store = empty_store();
        store.put(25544, fixtures::iss_prior()).unwrap();
        let source = Arc::new(ScriptedSource::serving(vec![fixtures::iss()]));
        let controller = controller(source, store);

        let resolved = controller.resolve(25544).await.unwrap();
        assert_eq!(resolved.previous, Some(fixtures::iss_prior()));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_during_backoff_leaves_store_untouched() {
        let store = empty_store();
        let source = Arc::new(ScriptedSource::new(vec![
            unavailable(),
            serving(vec![fixtures::iss()]),
        ]));
        let controller = controller(source.clone(), store.clone());
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(500)).await;
            trigger.cancel();
        });

        let err = controller.resolve_cancellable(25544, &cancel).await.unwrap_err();
        assert!(matches!(err, AcquireError::Cancelled));
        assert_eq!(source.call_times().len(), 1);
        assert!(store.get(25544).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_stores_every_valid_record() {
        let store = empty_store();
        store.put(25544, fixtures::iss()).unwrap();
        let source = Arc::new(ScriptedSource::new(vec![Ok(FetchOutcome {
            sets: vec![fixtures::iss(), fixtures::hubble(), fixtures::chaser()],
            rejected: vec![crate::catalog::MalformedRecord {
                label: "BROKEN".into(),
                reason: "bad checksum".into(),
            }],
        })]));
        let controller = controller(source.clone(), store.clone());

        let summary = controller.refresh_all().await.unwrap();
        assert_eq!(
            summary,
            RefreshSummary {
                stored: 2,
                unchanged: 1,
                rejected: 1
            }
        );
        assert_eq!(source.queries(), vec![CatalogQuery::All]);
        assert_eq!(store.ids(), vec![20580, 25544, 90001]);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn concurrent_live_writes_land_on_a_single_worker() {
        let store = empty_store();
        let source = Arc::new(StaticSource::new(vec![fixtures::iss(), fixtures::hubble()]));
        let controller = ResilienceController::new(source, store.clone(), RetryPolicy::default());

        let (iss, hubble) = tokio::join!(controller.resolve(25544), controller.resolve(20580));

        assert_eq!(iss.unwrap().freshness, Freshness::Live);
        assert_eq!(hubble.unwrap().freshness, Freshness::Live);
        assert_eq!(store.ids(), vec![20580, 25544]);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_fails_when_source_never_answers() {
        let controller = controller(Arc::new(ScriptedSource::failing()), empty_store());
        let err = controller.refresh_all().await.unwrap_err();
        assert!(matches!(err, AcquireError::SourceExhausted(3)));
    }
}
