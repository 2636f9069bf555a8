use chrono::{DateTime, Days, Utc};
use futures::future::join_all;
use log::{info, warn};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::acquire::{AcquireError, RefreshSummary, ResilienceController, Resolved};
use crate::catalog::{CelestrakSource, ElementSource, OrbitClass, TrackingElementSet};
use crate::config::Config;
use crate::propagate::{
    ground_track, propagate, to_earth_fixed, to_geodetic, GeodeticPosition, PropagationConfig,
    PropagationError, StateVector, TrackPoint,
};
use crate::risk::{assess, screen_pair, Conjunction, RiskAssessment, RiskConfig};
use crate::store::{ElementStore, Freshness, StoreError};
use crate::trend::{forecast, TrendConfig, TrendError, TrendSeries};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Acquire(#[from] AcquireError),
    #[error(transparent)]
    Propagation(#[from] PropagationError),
    #[error(transparent)]
    Trend(#[from] TrendError),
    #[error("element store: {0}")]
    Store(#[from] StoreError),
    #[error("HTTP client: {0}")]
    Client(#[from] reqwest::Error),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Position of one object at a requested instant in every frame we report.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedState {
    pub catalog_id: u32,
    pub name: String,
    pub orbit_class: OrbitClass,
    pub element_epoch: DateTime<Utc>,
    pub inertial: StateVector,
    pub speed_km_s: f64,
    pub earth_fixed: StateVector,
    pub geodetic: GeodeticPosition,
    pub freshness: Freshness,
    pub degraded_accuracy: bool,
}

/// Sampled path of one object, for plotting.
#[derive(Debug, Clone, Serialize)]
pub struct Trajectory {
    pub catalog_id: u32,
    pub name: String,
    pub freshness: Freshness,
    pub points: Vec<TrackPoint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CachedObject {
    pub catalog_id: u32,
    pub name: String,
    pub orbit_class: OrbitClass,
    pub epoch: DateTime<Utc>,
    pub fetched_at: DateTime<Utc>,
    pub period_minutes: f64,
    pub perigee_km: f64,
    pub apogee_km: f64,
    pub has_previous: bool,
}

pub struct RiskService {
    controller: ResilienceController,
    neighbors: Vec<u32>,
    propagation: PropagationConfig,
    risk: RiskConfig,
    trend: TrendConfig,
    cancel: CancellationToken,
}

impl RiskService {
    pub fn new(source: Arc<dyn ElementSource>, store: Arc<ElementStore>, config: &Config) -> Self {
        info!(
            "Catalog retries: {} attempts, up to {:?} of backoff per object",
            config.retry.attempts,
            config.retry.worst_case_backoff()
        );
        Self {
            controller: ResilienceController::new(source, store, config.retry.clone()),
            neighbors: config.catalog.neighbors.clone(),
            propagation: config.propagation.clone(),
            risk: config.risk.clone(),
            trend: config.trend.clone(),
            cancel: CancellationToken::new(),
        }
    }

    /// Token that abandons every in-flight resolution when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    async fn resolve(&self, catalog_id: u32) -> Result<Resolved, AcquireError> {
        self.controller
            .resolve_cancellable(catalog_id, &self.cancel)
            .await
    }

    /// Wires the CelesTrak source and the on-disk store named by `config`.
    pub fn from_config(config: &Config) -> Result<Self, ServiceError> {
        let source = Arc::new(CelestrakSource::new(&config.catalog)?);
        let store = Arc::new(ElementStore::open(config.store.folder.clone())?);
        Ok(Self::new(source, store, config))
    }

    pub async fn resolve_state(
        &self,
        catalog_id: u32,
        at: DateTime<Utc>,
    ) -> Result<ResolvedState, ServiceError> {
        let resolved = self.resolve(catalog_id).await?;
        let propagated = propagate(&resolved.elements, at, &self.propagation)?;
        let earth_fixed = to_earth_fixed(&propagated.state)?;
        let geodetic = to_geodetic(&earth_fixed)?;

        Ok(ResolvedState {
            catalog_id,
            name: resolved.elements.name,
            orbit_class: resolved.elements.orbit_class,
            element_epoch: resolved.elements.epoch,
            inertial: propagated.state,
            speed_km_s: propagated.state.speed_km_s(),
            earth_fixed,
            geodetic,
            freshness: resolved.freshness,
            degraded_accuracy: propagated.degraded_accuracy,
        })
    }

    /// Samples `steps` points of the object's path over `span`, the first at
    /// `start`.
    pub async fn trajectory(
        &self,
        catalog_id: u32,
        start: DateTime<Utc>,
        span: Duration,
        steps: usize,
    ) -> Result<Trajectory, ServiceError> {
        let step = u32::try_from(steps)
            .ok()
            .filter(|n| *n > 0)
            .map(|n| span / n)
            .ok_or_else(|| ServiceError::InvalidRequest(format!("{} trajectory steps", steps)))?;

        let resolved = self.resolve(catalog_id).await?;
        let points = ground_track(&resolved.elements, start, step, steps)?;
        Ok(Trajectory {
            catalog_id,
            name: resolved.elements.name,
            freshness: resolved.freshness,
            points,
        })
    }

    pub async fn conjunction(&self, primary: u32, secondary: u32) -> Result<Conjunction, ServiceError> {
        self.conjunction_at(primary, secondary, Utc::now()).await
    }

    /// Screens two objects against each other over the horizon starting at
    /// `start`. Both must resolve.
    pub async fn conjunction_at(
        &self,
        primary: u32,
        secondary: u32,
        start: DateTime<Utc>,
    ) -> Result<Conjunction, ServiceError> {
        if primary == secondary {
            return Err(ServiceError::InvalidRequest(format!(
                "catalog {} cannot be screened against itself",
                primary
            )));
        }
        let (first, second) = tokio::join!(self.resolve(primary), self.resolve(secondary));
        let (first, second) = (first?, second?);
        if first.freshness != Freshness::Live || second.freshness != Freshness::Live {
            warn!(
                "Screening {} ({}) against {} ({})",
                primary, first.freshness, secondary, second.freshness
            );
        }
        Ok(screen_pair(&first.elements, &second.elements, start, &self.propagation)?)
    }

    pub async fn assess_risk(&self, catalog_id: u32) -> Result<RiskAssessment, ServiceError> {
        self.assess_risk_at(catalog_id, Utc::now()).await
    }

    /// Scores `catalog_id` over the horizon starting at `start`.
    pub async fn assess_risk_at(
        &self,
        catalog_id: u32,
        start: DateTime<Utc>,
    ) -> Result<RiskAssessment, ServiceError> {
        let subject = self.resolve(catalog_id).await?;
        let neighbors = self.resolve_neighbors(catalog_id).await;
        Ok(self.assess_resolved(&subject, &neighbors, start)?)
    }

    pub async fn forecast_trend(&self, catalog_id: u32) -> Result<TrendSeries, ServiceError> {
        self.forecast_trend_at(catalog_id, Utc::now()).await
    }

    /// Assesses the object once per day over the configured history window
    /// ending at `now`, oldest first, and forecasts from that history.
    pub async fn forecast_trend_at(
        &self,
        catalog_id: u32,
        now: DateTime<Utc>,
    ) -> Result<TrendSeries, ServiceError> {
        let subject = self.resolve(catalog_id).await?;
        let neighbors = self.resolve_neighbors(catalog_id).await;

        let mut history = Vec::with_capacity(self.trend.history_days as usize);
        for days_back in (0..self.trend.history_days).rev() {
            let Some(start) = now.checked_sub_days(Days::new(days_back.into())) else {
                continue;
            };
            history.push(self.assess_resolved(&subject, &neighbors, start)?);
        }

        Ok(forecast(&history, &self.trend)?)
    }

    pub async fn refresh(&self) -> Result<RefreshSummary, ServiceError> {
        let summary = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(AcquireError::Cancelled.into()),
            summary = self.controller.refresh_all() => summary?,
        };
        info!("Element store holds {} objects", self.controller.store().len());
        Ok(summary)
    }

    pub fn cached(&self) -> Vec<CachedObject> {
        let store = self.controller.store();
        if store.is_empty() {
            warn!("Element store is empty, run refresh first");
        }
        store
            .ids()
            .into_iter()
            .filter_map(|id| store.get(id))
            .map(|entry| CachedObject {
                catalog_id: entry.elements.catalog_id,
                name: entry.elements.name.clone(),
                orbit_class: entry.elements.orbit_class,
                epoch: entry.elements.epoch,
                fetched_at: entry.fetched_at,
                period_minutes: entry.elements.period_minutes(),
                perigee_km: entry.elements.perigee_km(),
                apogee_km: entry.elements.apogee_km(),
                has_previous: entry.previous.is_some(),
            })
            .collect()
    }

    fn assess_resolved(
        &self,
        subject: &Resolved,
        neighbors: &[TrackingElementSet],
        start: DateTime<Utc>,
    ) -> Result<RiskAssessment, PropagationError> {
        assess(
            &subject.elements,
            subject.previous.as_ref(),
            neighbors,
            subject.freshness,
            start,
            &self.propagation,
            &self.risk,
        )
    }

    /// Resolves the configured neighbors concurrently. Objects that cannot be
    /// resolved are left out of the assessment.
    async fn resolve_neighbors(&self, catalog_id: u32) -> Vec<TrackingElementSet> {
        let ids: Vec<u32> = self
            .neighbors
            .iter()
            .copied()
            .filter(|id| *id != catalog_id)
            .collect();

        let results = join_all(ids.iter().map(|id| self.resolve(*id))).await;

        let mut sets = Vec::with_capacity(ids.len());
        for (id, result) in ids.iter().zip(results) {
            match result {
                Ok(resolved) => sets.push(resolved.elements),
                Err(e) => warn!("Catalog {}: neighbor {} skipped: {}", catalog_id, id, e),
            }
        }
        info!(
            "Catalog {}: {} of {} neighbors resolved",
            catalog_id,
            sets.len(),
            ids.len()
        );
        sets
    }
}
