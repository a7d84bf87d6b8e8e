mod controller;
mod error;
mod llm;
pub mod tracing;
pub mod view;

pub use controller::{Phase, RequestId, SessionState, Submission, SummaryController};
pub use error::SummaryError;
pub use llm::gemini;
pub use llm::summarizer::{Summarizer, SummaryResponse};
