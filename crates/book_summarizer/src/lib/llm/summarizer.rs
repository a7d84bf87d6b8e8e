use std::{fmt::Display, future::Future};

use serde::Deserialize;

/// A remote text-generation capability that turns a book title into a summary.
pub trait Summarizer {
    const SUMMARIZER_MODEL: &'static str;

    type Error: Display + Send + 'static;

    /// Issues exactly one request for `title`; no retries.
    fn summarize(
        &self,
        title: &str,
    ) -> impl Future<Output = Result<SummaryResponse, Self::Error>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SummaryResponse {
    pub summary: String,
}
