use std::sync::{Arc, Mutex};

use book_summarizer::{Summarizer, SummaryResponse};
use tokio::sync::Semaphore;

#[derive(Clone)]
pub struct MockSummarizer {
    /// `None` echoes the requested title back as `summary of {title}`
    pub summary: Option<String>,
    pub calls: Arc<Mutex<Vec<String>>>,
    pub fail_with: Option<String>,
    pub panic_with: Option<String>,
    pub gate: Option<Arc<Semaphore>>,
}

impl Default for MockSummarizer {
    fn default() -> Self {
        Self {
            summary: None,
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
            panic_with: None,
            gate: None,
        }
    }
}

impl MockSummarizer {
    pub fn new(summary: &str) -> Self {
        Self {
            summary: Some(summary.to_string()),
            ..Default::default()
        }
    }

    pub fn echo() -> Self {
        Self::default()
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Default::default()
        }
    }

    pub fn panicking(msg: &str) -> Self {
        Self {
            panic_with: Some(msg.to_string()),
            ..Default::default()
        }
    }

    /// Holds every call until a permit is added to `gate`.
    pub fn with_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }
}

impl Summarizer for MockSummarizer {
    const SUMMARIZER_MODEL: &'static str = "mock-gemini";
    type Error = anyhow::Error;

    async fn summarize(&self, title: &str) -> Result<SummaryResponse, Self::Error> {
        self.calls.lock().unwrap().push(title.to_string());

        if let Some(ref gate) = self.gate {
            gate.acquire().await?.forget();
        }
        if let Some(ref msg) = self.panic_with {
            panic!("{}", msg);
        }
        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }

        let summary = match self.summary {
            Some(ref summary) => summary.clone(),
            None => format!("summary of {title}"),
        };
        Ok(SummaryResponse { summary })
    }
}
