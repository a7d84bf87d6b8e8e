/// User-facing failure of a summarization attempt.
///
/// The `Display` output is exactly what the session shows to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SummaryError {
    #[error("Please enter a book title.")]
    EmptyTitle,
    #[error("Failed to generate summary: {0}. Ensure your API key is set correctly.")]
    Remote(String),
    #[error("An unexpected error occurred. Please try again.")]
    Unexpected,
}
