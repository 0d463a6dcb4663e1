use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use dealhound_models::config::PlannerConfig;
use dealhound_models::listing::{Listing, Opportunity};
use dealhound_models::memory::Memory;
use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::AgentError;
use crate::estimator::PriceEstimator;
use crate::notifier::Notifier;
use crate::source::DealSource;

/// Phase of a planning cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanState {
    Idle,
    Scanning,
    Pricing,
    Ranking,
    Alerting,
}

/// Outcome of one planning cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub cycle_id: Uuid,
    pub started_at: DateTime<Utc>,
    /// Candidates returned by the source after deduplication.
    pub scanned: usize,
    pub priced: usize,
    pub failed: usize,
    /// Priced opportunities, best discount first.
    pub ranked: Vec<Opportunity>,
    pub alerted: Option<Opportunity>,
    pub elapsed_ms: u64,
}

/// Runs scan, price, rank and alert for one cycle at a time.
pub struct Planner {
    source: Arc<dyn DealSource>,
    pricer: Arc<dyn PriceEstimator>,
    notifier: Arc<dyn Notifier>,
    config: PlannerConfig,
}

impl Planner {
    pub fn new(
        source: Arc<dyn DealSource>,
        pricer: Arc<dyn PriceEstimator>,
        notifier: Arc<dyn Notifier>,
        config: PlannerConfig,
    ) -> Self {
        Self {
            source,
            pricer,
            notifier,
            config,
        }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// One cycle. Returns the alerted opportunity, if any.
    pub async fn plan(&self, memory: &Memory) -> Result<Option<Opportunity>, AgentError> {
        Ok(self.run_cycle(memory).await?.alerted)
    }

    /// One cycle with its full report. A source failure aborts the cycle; a
    /// failed candidate is only dropped.
    pub async fn run_cycle(&self, memory: &Memory) -> Result<CycleReport, AgentError> {
        let start = Instant::now();
        let cycle_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(cycle = %cycle_id, state = ?PlanState::Scanning, remembered = memory.len(), "Starting planning cycle");

        let scanned = self.source.scan(memory).await?;
        let candidates = self.select_candidates(scanned, memory);
        let scanned = candidates.len();
        let candidates: Vec<Listing> = candidates
            .into_iter()
            .take(self.config.max_candidates)
            .collect();

        info!(cycle = %cycle_id, state = ?PlanState::Pricing, candidates = candidates.len(), "Pricing candidates");

        // Fan-out to the pricer, one task per candidate
        let mut handles = Vec::new();
        for listing in candidates {
            let pricer = Arc::clone(&self.pricer);
            handles.push(tokio::spawn(async move {
                let started = Instant::now();
                let result = pricer.price(&listing.description).await;
                (listing, result, started.elapsed())
            }));
        }

        // Collect in source order
        let mut opportunities: Vec<Opportunity> = Vec::new();
        let mut failed = 0usize;
        for handle in handles {
            match handle.await {
                Ok((listing, Ok(estimate), elapsed)) => {
                    let opportunity = Opportunity::new(listing, estimate.value());
                    debug!(
                        url = %opportunity.url(),
                        estimate = %opportunity.estimate,
                        discount = %opportunity.discount,
                        elapsed_ms = elapsed.as_millis(),
                        "Candidate priced"
                    );
                    opportunities.push(opportunity);
                }
                Ok((listing, Err(e), elapsed)) => {
                    warn!(url = %listing.url, error = %e, elapsed_ms = elapsed.as_millis(), "Candidate pricing failed");
                    failed += 1;
                }
                Err(e) => {
                    error!(error = %e, "Pricing task panicked");
                    failed += 1;
                }
            }
        }
        let priced = opportunities.len();

        info!(cycle = %cycle_id, state = ?PlanState::Ranking, priced, failed, "Ranking opportunities");
        // Stable: equal discounts keep source order
        opportunities.sort_by(|a, b| b.discount.cmp(&a.discount));

        let alerted = match opportunities.first() {
            Some(best) if best.discount > self.config.deal_threshold => {
                info!(
                    cycle = %cycle_id,
                    state = ?PlanState::Alerting,
                    url = %best.url(),
                    discount = %best.discount,
                    "Deal above threshold"
                );
                self.notifier.alert(best).await;
                Some(best.clone())
            }
            Some(best) => {
                info!(
                    cycle = %cycle_id,
                    best_discount = %best.discount,
                    threshold = %self.config.deal_threshold,
                    "No deal above threshold"
                );
                None
            }
            None => {
                info!(cycle = %cycle_id, "No candidates priced");
                None
            }
        };

        let elapsed_ms = start.elapsed().as_millis() as u64;
        info!(cycle = %cycle_id, state = ?PlanState::Idle, elapsed_ms, "Planning cycle complete");

        Ok(CycleReport {
            cycle_id,
            started_at,
            scanned,
            priced,
            failed,
            ranked: opportunities,
            alerted,
            elapsed_ms,
        })
    }

    /// Drop anything the source should already have filtered: remembered URLs
    /// and repeats within the batch.
    fn select_candidates(&self, listings: Vec<Listing>, memory: &Memory) -> Vec<Listing> {
        let known = memory.urls();
        let mut seen: HashSet<String> = HashSet::new();
        let mut selected = Vec::with_capacity(listings.len());
        for listing in listings {
            if known.contains(listing.url.as_str()) {
                warn!(url = %listing.url, "Source returned a remembered listing, skipping");
                continue;
            }
            if !seen.insert(listing.url.clone()) {
                warn!(url = %listing.url, "Source returned a duplicate listing, skipping");
                continue;
            }
            selected.push(listing);
        }
        selected
    }
}
