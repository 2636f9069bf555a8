use async_trait::async_trait;
use log::{debug, warn};

use crate::catalog::{parse_catalog, MalformedRecord, SourceError, TrackingElementSet};
use crate::config::CatalogConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogQuery {
    All,
    Id(u32),
}

impl CatalogQuery {
    pub fn matches(&self, catalog_id: u32) -> bool {
        match self {
            CatalogQuery::All => true,
            CatalogQuery::Id(id) => *id == catalog_id,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    pub sets: Vec<TrackingElementSet>,
    pub rejected: Vec<MalformedRecord>,
}

impl FetchOutcome {
    /// Builds an outcome from a raw catalog body. A body that contained
    /// records but none usable is reported as malformed.
    pub fn from_body(body: &str) -> Result<Self, SourceError> {
        let (sets, rejected) = parse_catalog(body);
        if sets.is_empty() && !rejected.is_empty() {
            return Err(SourceError::Malformed {
                rejected: rejected.len(),
                reason: rejected[0].reason.clone(),
            });
        }
        Ok(FetchOutcome { sets, rejected })
    }

    /// Newest valid set for `catalog_id`, if the response carried one.
    pub fn newest_for(&self, catalog_id: u32) -> Option<&TrackingElementSet> {
        self.sets
            .iter()
            .filter(|s| CatalogQuery::Id(catalog_id).matches(s.catalog_id))
            .max_by_key(|s| s.epoch)
    }
}

/// Upstream provider of tracking elements.
#[async_trait]
pub trait ElementSource: Send + Sync {
    async fn fetch(&self, query: CatalogQuery) -> Result<FetchOutcome, SourceError>;
}

/// Reads element sets from a CelesTrak-style GP endpoint in TLE format.
#[derive(Debug, Clone)]
pub struct CelestrakSource {
    client: reqwest::Client,
    base_url: String,
    group: String,
}

impl CelestrakSource {
    pub fn new(config: &CatalogConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            group: config.group.clone(),
        })
    }

    fn query_params(&self, query: CatalogQuery) -> Vec<(&'static str, String)> {
        let selector = match query {
            CatalogQuery::All => ("GROUP", self.group.clone()),
            CatalogQuery::Id(id) => ("CATNR", id.to_string()),
        };
        vec![selector, ("FORMAT", "tle".to_string())]
    }
}

#[async_trait]
impl ElementSource for CelestrakSource {
    async fn fetch(&self, query: CatalogQuery) -> Result<FetchOutcome, SourceError> {
        debug!("Fetching {:?} from {}", query, self.base_url);

        let resp = self
            .client
            .get(&self.base_url)
            .query(&self.query_params(query))
            .send()
            .await
            .map_err(|e| SourceError::Unavailable(format!("{:?}: {}", query, e)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::Unavailable(format!(
                "{:?}: catalog returned {}",
                query, status
            )));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| SourceError::Unavailable(format!("{:?}: {}", query, e)))?;

        let outcome = FetchOutcome::from_body(&body)?;
        if !outcome.rejected.is_empty() {
            warn!(
                "{:?}: {} element records rejected, {} accepted",
                query,
                outcome.rejected.len(),
                outcome.sets.len()
            );
        }
        Ok(outcome)
    }
}
