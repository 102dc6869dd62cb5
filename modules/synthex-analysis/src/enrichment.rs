use brightdata_client::{DatasetKind, JobPoller};
use serde_json::Value;
use tracing::{info, warn};

use synthex_common::{DetailEntry, EnrichmentSource, RankedSelection};

use crate::error::EnrichmentError;
use crate::normalize::{record_list, structure_name};
use crate::ranking::enrichment_candidates;

/// Outcome of the detail stage. `source` tells whether `entries` holds
/// provider detail rows or the basic selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Enrichment {
    pub entries: Vec<DetailEntry>,
    pub source: EnrichmentSource,
}

impl Enrichment {
    fn fallback(selection: &RankedSelection) -> Self {
        Self {
            entries: selection
                .combined()
                .into_iter()
                .map(DetailEntry::Basic)
                .collect(),
            source: EnrichmentSource::Fallback,
        }
    }
}

/// Runs a second collection over the selected videos. Never fails: every
/// problem degrades to the unenriched selection.
#[derive(Clone)]
pub struct EnrichmentCoordinator {
    poller: Option<JobPoller>,
}

impl EnrichmentCoordinator {
    pub fn new(poller: JobPoller) -> Self {
        Self {
            poller: Some(poller),
        }
    }

    /// Coordinator with no detail dataset; always returns the fallback.
    pub fn disabled() -> Self {
        Self { poller: None }
    }

    pub async fn enrich(&self, selection: &RankedSelection) -> Enrichment {
        let Some(poller) = &self.poller else {
            info!("Video detail collection disabled, using basic data");
            return Enrichment::fallback(selection);
        };

        let candidates = enrichment_candidates(selection);
        if candidates.is_empty() {
            info!("No valid video URLs to enrich, using basic data");
            return Enrichment::fallback(selection);
        }

        info!(count = candidates.len(), "Collecting video details");
        match fetch_details(poller, &candidates).await {
            Ok(rows) => {
                info!(count = rows.len(), "Video details collected");
                Enrichment {
                    entries: rows.into_iter().map(DetailEntry::Detail).collect(),
                    source: EnrichmentSource::Enriched,
                }
            }
            Err(e) => {
                warn!(error = %e, "Video detail collection failed, continuing with basic data");
                Enrichment::fallback(selection)
            }
        }
    }
}

async fn fetch_details(poller: &JobPoller, urls: &[String]) -> Result<Vec<Value>, EnrichmentError> {
    let snapshot = poller.run(DatasetKind::VideoDetail, urls).await?;
    if snapshot.partial {
        warn!(job_id = %snapshot.job_id, "Detail snapshot accepted as partial");
    }
    detail_rows(&snapshot.payload)
}

/// Detail rows from an array, a `data` array, or a `data` object.
fn detail_rows(payload: &Value) -> Result<Vec<Value>, EnrichmentError> {
    record_list(payload, false)
        .map(|rows| rows.into_iter().cloned().collect::<Vec<_>>())
        .filter(|rows| !rows.is_empty())
        .ok_or(EnrichmentError::UnrecognizedShape {
            structure: structure_name(payload),
        })
}
