//! Summarisation of judgment reasoning through a generative language model.
//!
//! [`Enricher`] walks a judgment collection, sends the reasoning section of
//! each eligible judgment to a [`Summarizer`], and writes the parsed summary
//! back through the repository one judgment at a time.

mod enrich;
mod error;
mod gemini;
mod prompt;
mod retry;

pub use enrich::{
    EnrichConfig, EnrichStats, Enricher, Outcome, Pacer, SkipReason, TokioPacer,
};
pub use error::{ContentError, EnrichError, ServiceError};
pub use gemini::{GeminiClient, GeminiConfig, Summarizer, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use prompt::{build_prompt, parse_summary, strip_fences};
pub use retry::{RetryPolicy, RetryState};
