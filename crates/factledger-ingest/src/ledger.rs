//! The ledger: matcher decisions and analyst actions written to the event log

use std::collections::HashMap;
use std::fmt::Display;
use std::time::Instant;

use chrono::Utc;
use factledger_domain::traits::{EventQuery, FactEventStore};
use factledger_domain::{
    CurrentFact, DealId, DomainError, EventId, EventType, ExtractedFact, FactEvent, FactKey,
    FactSource, FactValue,
};
use factledger_matcher::{BatchMatch, MatchResult, MatchType, Matcher, MatcherConfig};
use factledger_projector::{current_facts, pending_reviews, project};
use tracing::{debug, info, warn};

use crate::{
    DisputeResolution, IngestConfig, IngestError, IngestMetadata, IngestRequest, IngestResult,
    Rejection, ReviewDecision, SubmittedFact,
};

/// Write path over a [`FactEventStore`]
///
/// Ingestion runs every candidate through the [`Matcher`] against the deal's
/// current facts and appends the accepted decisions in one atomic batch.
/// Analyst actions append single human-originated events. Nothing is ever
/// updated in place.
pub struct FactLedger<S> {
    store: S,
    matcher: Matcher,
    config: IngestConfig,
}

impl<S> FactLedger<S>
where
    S: FactEventStore,
    S::Error: Display,
{
    /// Create a ledger, rejecting invalid configuration
    pub fn new(store: S, matcher_config: MatcherConfig, config: IngestConfig) -> Result<Self, IngestError> {
        config.validate().map_err(IngestError::Config)?;
        let matcher = Matcher::new(matcher_config)?;
        Ok(Self {
            store,
            matcher,
            config,
        })
    }

    /// Create a ledger with default matcher and ingest settings
    pub fn with_defaults(store: S) -> Self {
        Self {
            store,
            matcher: Matcher::default(),
            config: IngestConfig::default(),
        }
    }

    /// Get the underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get the underlying store mutably
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Take back the store
    pub fn into_store(self) -> S {
        self.store
    }

    /// Get the matcher
    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// Get the ingest configuration
    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Current facts for a deal, recomputed from the log
    pub fn current_facts(&self, deal_id: &DealId) -> Result<Vec<CurrentFact>, IngestError> {
        Ok(current_facts(&self.store, deal_id)?)
    }

    /// PENDING_REVIEW events of a deal that are still open, newest first
    pub fn open_reviews(&self, deal_id: &DealId) -> Result<Vec<FactEvent>, IngestError> {
        let events = self.store.events_for_deal(deal_id).map_err(store_error)?;
        Ok(pending_reviews(&events))
    }

    /// Ingest one extraction batch
    ///
    /// Candidates failing taxonomy validation are reported as rejections and
    /// do not stop the rest. NEW becomes CREATED, SUPERSEDE becomes SUPERSEDED
    /// pointing at the frontier event, REVIEW_NEEDED becomes PENDING_REVIEW
    /// (when recorded) and IGNORE writes nothing.
    ///
    /// Candidates are matched in submission order. A candidate accepted
    /// earlier in the batch becomes the frontier later candidates for its key
    /// are matched against, so priority and review rules hold within a batch
    /// as well as across batches.
    ///
    /// All events are appended in one batch: either every event is visible
    /// afterwards or none is.
    pub fn ingest(&mut self, request: IngestRequest) -> Result<IngestResult, IngestError> {
        let started = Instant::now();
        let received_at = Utc::now();
        let total_submitted = request.facts.len();

        if total_submitted > self.config.max_batch_size {
            return Err(IngestError::BatchTooLarge(total_submitted, self.config.max_batch_size));
        }

        info!(deal = %request.deal_id, facts = total_submitted, "ingesting extraction batch");

        let (candidates, rejected) = validate_all(request.facts);
        let mut frontier: HashMap<FactKey, CurrentFact> = current_facts(&self.store, &request.deal_id)?
            .into_iter()
            .map(|fact| (fact.fact_key, fact))
            .collect();

        let mut batch = BatchMatch::default();
        let mut writer = BatchWriter::new(request.deal_id.clone());
        for candidate in candidates {
            let (result, check) = self.matcher.decide(&candidate, frontier.get(&candidate.fact_key));
            match result.match_type {
                MatchType::New | MatchType::Supersede => {
                    let accepted = writer.accept(&candidate, &result);
                    if let Some(fact) = project(std::slice::from_ref(accepted)).pop() {
                        frontier.insert(fact.fact_key, fact);
                    }
                }
                MatchType::ReviewNeeded if self.config.record_pending_reviews => {
                    writer.hold(&candidate, &result);
                }
                MatchType::ReviewNeeded | MatchType::Ignore => {}
            }
            batch.record(candidate, result, check);
        }
        info!("{}", batch.summary());

        let events = writer.into_events();
        let ids_of = |event_type: EventType| -> Vec<EventId> {
            events
                .iter()
                .filter(|e| e.event_type == event_type)
                .map(|e| e.id)
                .collect()
        };
        let created = ids_of(EventType::Created);
        let superseded = ids_of(EventType::Superseded);
        let pending_review = ids_of(EventType::PendingReview);

        if !events.is_empty() {
            self.store.append_batch(events).map_err(store_error)?;
        }

        let result = IngestResult {
            created,
            superseded,
            pending_review,
            ignored: batch.to_ignore,
            needs_review: batch.needs_review,
            rejected,
            contradictions: batch.contradictions,
            metadata: IngestMetadata {
                deal_id: request.deal_id,
                received_at,
                total_submitted,
                processing_time_ms: started.elapsed().as_millis() as u64,
            },
        };

        info!("Ingestion complete: {}", result.summary());
        Ok(result)
    }

    /// Record an analyst correction
    ///
    /// Bypasses the matcher: a BA_OVERRIDE event at confidence 100 supersedes
    /// the frontier, or creates the key when it has no current value.
    pub fn record_override(
        &mut self,
        deal_id: &DealId,
        fact_key: FactKey,
        value: FactValue,
        display_value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Result<EventId, IngestError> {
        if !value.conforms_to(fact_key.kind()) {
            return Err(DomainError::InvalidValue {
                fact_key: fact_key.to_string(),
                kind: fact_key.kind(),
                reason: format!("{} payload does not fit", value.type_name()),
            }
            .into());
        }

        let current = self.current_fact(deal_id, fact_key)?;
        let event_type = if current.is_some() {
            EventType::Superseded
        } else {
            EventType::Created
        };
        let mut event = FactEvent::new(
            deal_id.clone(),
            fact_key,
            value,
            display_value,
            FactSource::BaOverride,
            100,
            event_type,
        )
        .by_human()
        .with_reason(reason);
        if let Some(current) = current {
            event = event.superseding(current.current_event_id);
        }

        self.append(event, "recorded analyst override")
    }

    /// Settle an open PENDING_REVIEW event
    ///
    /// Accepting makes the held-back candidate current; rejecting re-asserts
    /// the current value. Either way a RESOLVED event supersedes the frontier,
    /// which closes the review.
    pub fn resolve_review(
        &mut self,
        deal_id: &DealId,
        review_id: EventId,
        decision: ReviewDecision,
        reason: impl Into<String>,
    ) -> Result<EventId, IngestError> {
        let review = self
            .store
            .get_event(review_id)
            .map_err(store_error)?
            .filter(|e| e.deal_id == *deal_id && e.event_type == EventType::PendingReview)
            .ok_or(IngestError::ReviewNotFound(review_id))?;

        let history = self.key_history(deal_id, review.fact_key)?;
        if !pending_reviews(&history).iter().any(|e| e.id == review_id) {
            return Err(IngestError::ReviewNotFound(review_id));
        }
        let current = project(&history).into_iter().next();

        let (event, verb) = match decision {
            ReviewDecision::Accept => (restate_event(&review, EventType::Resolved), "accepted"),
            ReviewDecision::Reject => {
                let current = current.as_ref().ok_or_else(|| IngestError::NoCurrentFact {
                    deal_id: deal_id.clone(),
                    fact_key: review.fact_key,
                })?;
                (restate_current(current, EventType::Resolved), "rejected")
            }
        };

        let mut event = event
            .by_human()
            .with_reason(format!("{} review {}: {}", verb, review_id, reason.into()));
        if let Some(current) = &current {
            event = event.superseding(current.current_event_id);
        }

        self.append(event, "resolved pending review")
    }

    /// Flag the current value of a key as contradicted by another observation
    ///
    /// The DISPUTED event records the conflicting observation and points at
    /// the frontier without superseding it: the current value is unchanged
    /// until the dispute is resolved.
    pub fn mark_disputed(
        &mut self,
        deal_id: &DealId,
        conflicting: &ExtractedFact,
        reason: impl Into<String>,
    ) -> Result<EventId, IngestError> {
        conflicting.validate()?;
        let current = self.require_current(deal_id, conflicting.fact_key)?;
        let event = FactEvent::from_extracted(deal_id.clone(), conflicting, EventType::Disputed)
            .superseding(current.current_event_id)
            .with_reason(reason);

        self.append(event, "marked fact disputed")
    }

    /// Settle the newest unresolved dispute on a key
    pub fn resolve_dispute(
        &mut self,
        deal_id: &DealId,
        fact_key: FactKey,
        resolution: DisputeResolution,
        reason: impl Into<String>,
    ) -> Result<EventId, IngestError> {
        let current = self.require_current(deal_id, fact_key)?;
        let open = current.dispute_details.as_ref().is_some_and(|d| !d.resolved);
        let dispute = current
            .event_history
            .iter()
            .find(|e| e.event_type == EventType::Disputed)
            .filter(|_| open)
            .ok_or(IngestError::NotDisputed(fact_key))?;

        let event = match resolution {
            DisputeResolution::KeepCurrent => restate_current(&current, EventType::Resolved),
            DisputeResolution::AcceptConflicting => restate_event(dispute, EventType::Resolved),
        }
        .superseding(current.current_event_id)
        .by_human()
        .with_reason(reason);

        self.append(event, "resolved dispute")
    }

    /// Logically remove the current value of a key
    ///
    /// The DELETED event copies the frontier value and supersedes it. The
    /// key drops out of the projection while its history stays in the log.
    pub fn delete_fact(
        &mut self,
        deal_id: &DealId,
        fact_key: FactKey,
        reason: impl Into<String>,
    ) -> Result<EventId, IngestError> {
        let current = self.require_current(deal_id, fact_key)?;
        let event = restate_current(&current, EventType::Deleted)
            .superseding(current.current_event_id)
            .by_human()
            .with_reason(reason);

        self.append(event, "deleted fact")
    }

    fn key_history(&self, deal_id: &DealId, fact_key: FactKey) -> Result<Vec<FactEvent>, IngestError> {
        self.store
            .query_events(&EventQuery {
                deal_id: Some(deal_id.clone()),
                fact_key: Some(fact_key),
                ..Default::default()
            })
            .map_err(store_error)
    }

    fn current_fact(&self, deal_id: &DealId, fact_key: FactKey) -> Result<Option<CurrentFact>, IngestError> {
        let history = self.key_history(deal_id, fact_key)?;
        Ok(project(&history).into_iter().next())
    }

    fn require_current(&self, deal_id: &DealId, fact_key: FactKey) -> Result<CurrentFact, IngestError> {
        self.current_fact(deal_id, fact_key)?
            .ok_or_else(|| IngestError::NoCurrentFact {
                deal_id: deal_id.clone(),
                fact_key,
            })
    }

    fn append(&mut self, event: FactEvent, action: &str) -> Result<EventId, IngestError> {
        let (deal_id, fact_key, event_type) = (event.deal_id.clone(), event.fact_key, event.event_type);
        let id = self.store.append_event(event).map_err(store_error)?;
        info!(deal = %deal_id, fact_key = %fact_key, event_type = %event_type, event_id = %id, "{}", action);
        Ok(id)
    }
}

/// Events for one ingestion
struct BatchWriter {
    deal_id: DealId,
    events: Vec<FactEvent>,
}

impl BatchWriter {
    fn new(deal_id: DealId) -> Self {
        Self {
            deal_id,
            events: Vec::new(),
        }
    }

    /// Queue a value-carrying event for a NEW or SUPERSEDE decision
    fn accept(&mut self, candidate: &ExtractedFact, result: &MatchResult) -> &FactEvent {
        let predecessor = result.existing.as_ref().map(|f| f.current_event_id);
        let event_type = if predecessor.is_some() {
            EventType::Superseded
        } else {
            EventType::Created
        };

        let mut event = FactEvent::from_extracted(self.deal_id.clone(), candidate, event_type)
            .with_reason(result.reason.clone());
        if let Some(predecessor) = predecessor {
            event = event.superseding(predecessor);
        }
        debug!(fact_key = %candidate.fact_key, event_type = %event_type, "queued event");

        self.events.push(event);
        &self.events[self.events.len() - 1]
    }

    /// Queue a PENDING_REVIEW annotation for a REVIEW_NEEDED decision
    fn hold(&mut self, candidate: &ExtractedFact, result: &MatchResult) {
        let mut event = FactEvent::from_extracted(self.deal_id.clone(), candidate, EventType::PendingReview)
            .with_reason(result.reason.clone());
        if let Some(existing) = &result.existing {
            event = event.superseding(existing.current_event_id);
        }
        debug!(fact_key = %candidate.fact_key, "queued pending review");
        self.events.push(event);
    }

    fn into_events(self) -> Vec<FactEvent> {
        self.events
    }
}

/// Split submitted candidates into validated facts and rejections
fn validate_all(facts: Vec<SubmittedFact>) -> (Vec<ExtractedFact>, Vec<Rejection>) {
    let mut valid = Vec::with_capacity(facts.len());
    let mut rejected = Vec::new();

    for submitted in facts {
        let fact_key = submitted.fact_key();
        let checked = match submitted {
            SubmittedFact::Typed(fact) => fact.validate().map(|()| fact),
            SubmittedFact::Raw(raw) => ExtractedFact::try_from(raw),
        };
        match checked {
            Ok(fact) => valid.push(fact),
            Err(e) => {
                warn!(fact_key = %fact_key, error = %e, "rejected candidate");
                rejected.push(Rejection {
                    fact_key,
                    reason: e.to_string(),
                });
            }
        }
    }

    (valid, rejected)
}

/// New event carrying another event's observation
fn restate_event(template: &FactEvent, event_type: EventType) -> FactEvent {
    let mut event = FactEvent::new(
        template.deal_id.clone(),
        template.fact_key,
        template.value.clone(),
        template.display_value.clone(),
        template.source,
        template.source_confidence,
        event_type,
    );
    event.unit = template.unit.clone();
    event.source_document_id = template.source_document_id.clone();
    event.extracted_text = template.extracted_text.clone();
    event.reliability = template.reliability;
    event
}

/// New event carrying a key's current value
fn restate_current(fact: &CurrentFact, event_type: EventType) -> FactEvent {
    let mut event = FactEvent::new(
        fact.deal_id.clone(),
        fact.fact_key,
        fact.current_value.clone(),
        fact.current_display_value.clone(),
        fact.current_source,
        fact.current_confidence,
        event_type,
    );
    event.unit = fact.unit.clone();
    event.reliability = fact.reliability.as_ref().map(|c| c.reliability);
    event
}

fn store_error<E: Display>(e: E) -> IngestError {
    IngestError::Store(e.to_string())
}
