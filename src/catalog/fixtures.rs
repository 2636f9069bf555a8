//! Element sets and catalog doubles shared by the unit tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;
use tokio::time::Instant;

use crate::catalog::{CatalogQuery, ElementSource, FetchOutcome, SourceError, TrackingElementSet};

pub const ISS_LINE1: &str =
    "1 25544U 98067A   24046.55184560  .00016717  00000-0  10270-3 0  9995";
pub const ISS_LINE2: &str =
    "2 25544  51.6416 179.3142 0001713  97.0425  83.7431 15.49673964439816";

/// The ISS set one day before `ISS_LINE1`.
pub const ISS_PRIOR_LINE1: &str =
    "1 25544U 98067A   24045.55184560  .00016717  00000-0  10270-3 0  9994";
pub const ISS_PRIOR_LINE2: &str =
    "2 25544  51.6418 184.2871 0001702  96.8811  83.7402 15.49670012439657";

/// Same orbit as the ISS, trailing it by 0.1 degrees of mean anomaly.
pub const CHASER_LINE1: &str =
    "1 90001U 98067A   24046.55184560  .00016717  00000-0  10270-3 0  9995";
pub const CHASER_LINE2: &str =
    "2 90001  51.6416 179.3142 0001713  97.0425  83.8431 15.49673964  1003";

/// ISS-like orbit with the node rotated by ten degrees.
pub const CROSSER_LINE1: &str =
    "1 90002U 98067A   24046.55184560  .00016717  00000-0  10270-3 0  9996";
pub const CROSSER_LINE2: &str =
    "2 90002  51.6416 189.3142 0001713  97.0425  83.7431 15.49673964  1004";

pub const HST_LINE1: &str =
    "1 20580U 98067A   24046.22557572  .00016717  00000-0  10270-3 0  9991";
pub const HST_LINE2: &str =
    "2 20580  28.4691  29.1764 0002824 100.9571 259.1869 15.09247167851618";

pub fn iss() -> TrackingElementSet {
    TrackingElementSet::from_tle(Some("ISS (ZARYA)".into()), ISS_LINE1, ISS_LINE2).unwrap()
}

pub fn iss_prior() -> TrackingElementSet {
    TrackingElementSet::from_tle(Some("ISS (ZARYA)".into()), ISS_PRIOR_LINE1, ISS_PRIOR_LINE2)
        .unwrap()
}

pub fn chaser() -> TrackingElementSet {
    TrackingElementSet::from_tle(Some("CHASER".into()), CHASER_LINE1, CHASER_LINE2).unwrap()
}

pub fn crosser() -> TrackingElementSet {
    TrackingElementSet::from_tle(Some("CROSSER".into()), CROSSER_LINE1, CROSSER_LINE2).unwrap()
}

pub fn hubble() -> TrackingElementSet {
    TrackingElementSet::from_tle(Some("HST".into()), HST_LINE1, HST_LINE2).unwrap()
}

/// A set whose fields describe an open orbit; propagation must refuse it.
pub fn hyperbolic() -> TrackingElementSet {
    let mut set = hubble();
    set.catalog_id = 90009;
    set.name = "HYPERBOLIC".into();
    set.eccentricity = 1.2;
    set
}

pub fn tle_body(sets: &[&TrackingElementSet]) -> String {
    sets.iter()
        .map(|s| format!("{}\n{}\n{}\n", s.name, s.line1, s.line2))
        .collect()
}

pub fn temp_folder() -> PathBuf {
    std::env::temp_dir().join(format!("bellatrix-test-{}", uuid::Uuid::new_v4()))
}

/// Replays a fixed sequence of fetch results and records when each call
/// arrived. Once the script runs out every call fails.
pub struct ScriptedSource {
    script: Mutex<VecDeque<Result<FetchOutcome, SourceError>>>,
    calls: Mutex<Vec<(CatalogQuery, Instant)>>,
}

impl ScriptedSource {
    pub fn new(script: Vec<Result<FetchOutcome, SourceError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self::new(Vec::new())
    }

    pub fn serving(sets: Vec<TrackingElementSet>) -> Self {
        Self::new(vec![Ok(FetchOutcome {
            sets,
            rejected: Vec::new(),
        })])
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|(_, t)| *t).collect()
    }

    pub fn queries(&self) -> Vec<CatalogQuery> {
        self.calls.lock().unwrap().iter().map(|(q, _)| *q).collect()
    }
}

#[async_trait]
impl ElementSource for ScriptedSource {
    async fn fetch(&self, query: CatalogQuery) -> Result<FetchOutcome, SourceError> {
        self.calls.lock().unwrap().push((query, Instant::now()));
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(SourceError::Unavailable("connection refused".into())))
    }
}

/// Always answers with whatever subset of its catalog the query selects.
pub struct StaticSource {
    catalog: Vec<TrackingElementSet>,
}

impl StaticSource {
    pub fn new(catalog: Vec<TrackingElementSet>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl ElementSource for StaticSource {
    async fn fetch(&self, query: CatalogQuery) -> Result<FetchOutcome, SourceError> {
        let sets = self
            .catalog
            .iter()
            .filter(|s| query.matches(s.catalog_id))
            .cloned()
            .collect();
        Ok(FetchOutcome {
            sets,
            rejected: Vec::new(),
        })
    }
}
