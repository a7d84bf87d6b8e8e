use std::sync::Arc;

use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::{error::SummaryError, Summarizer, SummaryResponse};

/// Where the session is in its request lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    /// Transient: set and replaced within a single `on_submit` call.
    Validating,
    Pending,
    Success,
    Failed,
}

/// Everything the presentation layer renders from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    title: String,
    summary: String,
    is_loading: bool,
    error: Option<SummaryError>,
}

impl SessionState {
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Empty unless the most recent request succeeded.
    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error(&self) -> Option<&SummaryError> {
        self.error.as_ref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// The title failed validation; no request was issued.
    Rejected,
    Started(RequestId),
}

// `None` when the request was superseded before it settled
type Outcome<E> = Option<Result<SummaryResponse, E>>;

struct InFlight<E> {
    id: RequestId,
    cancel: CancellationToken,
    handle: JoinHandle<Outcome<E>>,
}

/// Owns one session's state and drives the summarize request lifecycle.
///
/// At most one request is tracked at a time: submitting again while a request
/// is pending cancels the older one, so a stale response can never overwrite
/// the result of a newer submission.
pub struct SummaryController<S>
where
    S: Summarizer + Send + Sync + 'static,
{
    summarizer: Arc<S>,
    state: SessionState,
    phase: Phase,
    in_flight: Option<InFlight<S::Error>>,
    next_request: u64,
}

impl<S> SummaryController<S>
where
    S: Summarizer + Send + Sync + 'static,
{
    pub fn new(summarizer: S) -> Self {
        Self::with_shared(Arc::new(summarizer))
    }

    pub fn with_shared(summarizer: Arc<S>) -> Self {
        SummaryController {
            summarizer,
            state: SessionState::default(),
            phase: Phase::Idle,
            in_flight: None,
            next_request: 0,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn title(&self) -> &str {
        self.state.title()
    }

    pub fn summary(&self) -> &str {
        self.state.summary()
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    pub fn error(&self) -> Option<&SummaryError> {
        self.state.error()
    }

    /// Replaces the title. Never triggers a request.
    pub fn on_change(&mut self, title: impl Into<String>) {
        self.state.title = title.into();
    }

    /// Validates the current title and, if it is non-blank, starts a request
    /// for it in the background. State reflects the new attempt as soon as
    /// this returns; call [`settle`](Self::settle) to apply the outcome.
    ///
    /// Must be called from within a tokio runtime.
    #[tracing::instrument(skip(self), fields(title = %self.state.title))]
    pub fn on_submit(&mut self) -> Submission {
        self.phase = Phase::Validating;
        self.supersede_in_flight();

        if self.state.title.trim().is_empty() {
            self.state.is_loading = false;
            self.state.error = Some(SummaryError::EmptyTitle);
            self.phase = Phase::Failed;
            tracing::debug!("Rejected blank title");
            return Submission::Rejected;
        }

        self.state.error = None;
        self.state.summary.clear();
        self.state.is_loading = true;
        self.phase = Phase::Pending;

        let id = RequestId(self.next_request);
        self.next_request += 1;

        let cancel = CancellationToken::new();
        let handle = tokio::spawn({
            let summarizer = Arc::clone(&self.summarizer);
            // the raw title goes out; trimming is only for validation
            let title = self.state.title.clone();
            let cancel = cancel.clone();
            async move {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    res = summarizer.summarize(&title) => Some(res),
                }
            }
        });

        tracing::debug!(request = ?id, model = S::SUMMARIZER_MODEL, "Started summary request");
        self.in_flight = Some(InFlight { id, cancel, handle });

        Submission::Started(id)
    }

    /// Waits for the pending request, if any, and applies its outcome.
    ///
    /// Cancel safe: dropping the returned future leaves the request pending.
    pub async fn settle(&mut self) -> &SessionState {
        if let Some(in_flight) = self.in_flight.as_mut() {
            let outcome = (&mut in_flight.handle).await;
            let id = in_flight.id;
            self.in_flight = None;
            self.apply(id, outcome);
        }
        &self.state
    }

    /// `on_submit` followed by `settle`.
    pub async fn submit(&mut self) -> &SessionState {
        self.on_submit();
        self.settle().await
    }

    fn supersede_in_flight(&mut self) {
        if let Some(stale) = self.in_flight.take() {
            tracing::debug!(request = ?stale.id, "Cancelling superseded summary request");
            stale.cancel.cancel();
        }
    }

    fn apply(&mut self, id: RequestId, outcome: Result<Outcome<S::Error>, JoinError>) {
        self.state.is_loading = false;

        match outcome {
            Ok(Some(Ok(response))) => {
                tracing::debug!(request = ?id, "Summary request succeeded");
                self.state.summary = response.summary;
                self.phase = Phase::Success;
            }
            Ok(Some(Err(e))) => {
                tracing::debug!(request = ?id, error = %e, "Summary request failed");
                self.state.error = Some(SummaryError::Remote(e.to_string()));
                self.phase = Phase::Failed;
            }
            // only superseded tasks resolve to `None`, and those are never awaited
            Ok(None) => {
                tracing::warn!(request = ?id, "Settled a cancelled summary request");
            }
            Err(e) => {
                tracing::debug!(request = ?id, error = %e, "Summary task did not complete");
                self.state.error = Some(SummaryError::Unexpected);
                self.phase = Phase::Failed;
            }
        }
    }
}

impl<S> Drop for SummaryController<S>
where
    S: Summarizer + Send + Sync + 'static,
{
    fn drop(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.cancel.cancel();
            tracing::debug!(request = ?in_flight.id, "Cancelled pending request on drop");
        }
    }
}
