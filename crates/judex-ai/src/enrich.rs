//! Batch enrichment: one summary per eligible judgment, sequentially.

use std::time::Duration;

use async_trait::async_trait;
use judex_core::{Document, Paragraphs, SummaryEntry};
use judex_store::{DocumentRepository, Store};
use tracing::{error, info, warn};

use crate::{
    build_prompt, parse_summary, ContentError, EnrichError, RetryPolicy, RetryState,
    ServiceError, Summarizer,
};

#[derive(Debug, Clone)]
pub struct EnrichConfig {
    /// A judgment qualifies when its operative text contains any of these.
    pub keywords: Vec<String>,
    /// The reasoning section is the first whose title contains this.
    pub reasoning_marker: String,
    /// Pause between two judgments that each called the service.
    pub request_delay: Duration,
    pub retry: RetryPolicy,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            keywords: vec!["撤銷".to_string(), "廢棄".to_string()],
            reasoning_marker: "理由".to_string(),
            request_delay: Duration::from_millis(5_000),
            retry: RetryPolicy::default(),
        }
    }
}

/// Suspends the run between requests.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real time, via `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoReasoningSection,
    EmptyReasoning,
    /// The identifier also names an earlier record, which is the one lookups
    /// see, and that record is not (or no longer) eligible.
    RepeatedIdentifier,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoReasoningSection => f.write_str("no reasoning section"),
            Self::EmptyReasoning => f.write_str("reasoning section is empty"),
            Self::RepeatedIdentifier => {
                f.write_str("identifier repeated and its first record is not eligible")
            }
        }
    }
}

/// What happened to one judgment.
#[derive(Debug)]
pub enum Outcome {
    /// Summary stored and flushed.
    Summarised { points: usize, retries: u32 },
    Skipped(SkipReason),
    /// The service answered but the text is not a summary.
    InvalidContent(ContentError),
    /// A non-retryable service error.
    Failed(ServiceError),
    /// Still throttled after every allowed retry.
    Exhausted { retries: u32, last: ServiceError },
}

impl Outcome {
    /// True when the service was called for this judgment.
    pub fn requested(&self) -> bool {
        !matches!(self, Self::Skipped(_))
    }
}

/// Per-judgment outcomes of a run, in processing order.
#[derive(Debug, Default)]
pub struct EnrichStats {
    pub outcomes: Vec<(String, Outcome)>,
}

impl EnrichStats {
    pub fn eligible(&self) -> usize {
        self.outcomes.len()
    }

    pub fn summarised(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Summarised { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.eligible() - self.summarised() - self.skipped()
    }

    pub fn outcome(&self, id: &str) -> Option<&Outcome> {
        self.outcomes
            .iter()
            .find(|(doc, _)| doc == id)
            .map(|(_, outcome)| outcome)
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }
}

/// Drives summarisation over a repository.
pub struct Enricher<S, P = TokioPacer> {
    summarizer: S,
    pacer: P,
    config: EnrichConfig,
}

impl<S: Summarizer> Enricher<S> {
    pub fn new(summarizer: S, config: EnrichConfig) -> Self {
        Self::with_pacer(summarizer, TokioPacer, config)
    }
}

impl<S: Summarizer, P: Pacer> Enricher<S, P> {
    pub fn with_pacer(summarizer: S, pacer: P, config: EnrichConfig) -> Self {
        Self {
            summarizer,
            pacer,
            config,
        }
    }

    pub fn config(&self) -> &EnrichConfig {
        &self.config
    }

    /// Identifiers of judgments that qualify and have no summary, in store
    /// order.
    pub fn eligible(&self, store: &Store) -> Vec<String> {
        store
            .iter()
            .filter(|d| d.is_eligible(&self.config.keywords))
            .map(|d| d.id().to_string())
            .collect()
    }

    /// The prompt for `doc`, or why there is none.
    pub fn prepare(&self, doc: &Document) -> Result<String, SkipReason> {
        let (_, text) = doc
            .reasoning_section(&self.config.reasoning_marker)
            .ok_or(SkipReason::NoReasoningSection)?;
        build_prompt(&Paragraphs::from_text(text)).ok_or(SkipReason::EmptyReasoning)
    }

    /// Summarise every eligible judgment in `repo`.
    ///
    /// Each summary is written to the repository before the next judgment is
    /// attempted. Only repository failures end the run early.
    pub async fn run<R: DocumentRepository>(&self, repo: &mut R) -> Result<EnrichStats, EnrichError> {
        let mut store = repo.load()?;
        let targets = self.eligible(&store);
        let mut stats = EnrichStats::default();

        if targets.is_empty() {
            info!("no judgments need a summary");
            return Ok(stats);
        }
        info!(
            count = targets.len(),
            keywords = ?self.config.keywords,
            delay_ms = self.config.request_delay.as_millis() as u64,
            "judgments need a summary"
        );

        let total = targets.len();
        for (i, id) in targets.iter().enumerate() {
            let prepared = match store.find_by_id(id) {
                Some(doc) if doc.is_eligible(&self.config.keywords) => {
                    info!(
                        "[{}/{total}] processing {}",
                        i + 1,
                        doc.meta.title.as_deref().unwrap_or(id)
                    );
                    self.prepare(doc)
                }
                _ => {
                    warn!(
                        %id,
                        "[{}/{total}] identifier repeated in the store; run `judex dedup`",
                        i + 1
                    );
                    Err(SkipReason::RepeatedIdentifier)
                }
            };

            let outcome = match prepared {
                Err(reason) => Outcome::Skipped(reason),
                Ok(prompt) => match self.request(&prompt).await {
                    Ok((entries, retries)) => {
                        let points = entries.len();
                        if let Some(doc) = store.find_by_id_mut(id) {
                            doc.ai_summary = Some(entries);
                        }
                        repo.save(&store)?;
                        Outcome::Summarised { points, retries }
                    }
                    Err(outcome) => outcome,
                },
            };
            log_outcome(id, &outcome);

            let requested = outcome.requested();
            stats.outcomes.push((id.clone(), outcome));
            if requested && i + 1 < total {
                self.pacer.sleep(self.config.request_delay).await;
            }
        }

        info!(
            summarised = stats.summarised(),
            skipped = stats.skipped(),
            failed = stats.failed(),
            "enrichment complete"
        );
        Ok(stats)
    }

    /// Call the service under the retry policy and parse the result.
    async fn request(&self, prompt: &str) -> Result<(Vec<SummaryEntry>, u32), Outcome> {
        let policy = &self.config.retry;
        let mut retries = 0;
        loop {
            let result = self.summarizer.generate(prompt).await;
            let state = policy.step(retries, &result);
            if let RetryState::Waiting { retries: next, delay } = state {
                if let Err(e) = &result {
                    warn!(
                        retry = next,
                        max = policy.max_retries,
                        wait_ms = delay.as_millis() as u64,
                        error = %e,
                        "rate limited, waiting"
                    );
                }
                self.pacer.sleep(delay).await;
                retries = next;
                continue;
            }

            return match (state, result) {
                (_, Ok(text)) => parse_summary(&text)
                    .map(|entries| (entries, retries))
                    .map_err(Outcome::InvalidContent),
                (RetryState::FailedAfterRetries, Err(last)) => {
                    Err(Outcome::Exhausted { retries, last })
                }
                (_, Err(e)) => Err(Outcome::Failed(e)),
            };
        }
    }
}

fn log_outcome(id: &str, outcome: &Outcome) {
    match outcome {
        Outcome::Summarised { points, retries } => info!(%id, points, retries, "summary saved"),
        Outcome::Skipped(reason) => info!(%id, %reason, "skipped"),
        Outcome::InvalidContent(e) => {
            if let ContentError::UnparsableJson { raw, .. } = e {
                warn!(%id, %raw, "unparsable response");
            }
            error!(%id, error = %e, "response is not a summary");
        }
        Outcome::Failed(e) => error!(%id, error = %e, "request failed"),
        Outcome::Exhausted { retries, last } => {
            error!(%id, retries, error = %last, "still rate limited, giving up");
        }
    }
}
