//! # View
//!
//! Plain-text rendering of a [`SessionState`] for terminal front ends.

use chrono::Datelike;

use crate::SessionState;

pub const APP_NAME: &str = "5-Minute Book Summarizer";
pub const TAGLINE: &str = "Get the essence of any book in just five minutes. Powered by Gemini AI.";
pub const LOADING_NOTICE: &str = "Generating your summary...";
pub const PLACEHOLDER: &str = "Enter a book title above to get a 5-minute summary.";

pub fn banner() -> String {
    format!("{APP_NAME}\n{TAGLINE}")
}

pub fn footer() -> String {
    footer_for_year(chrono::Local::now().year())
}

fn footer_for_year(year: i32) -> String {
    format!("\u{a9} {year} {APP_NAME}. All rights reserved.")
}

/// Renders the summary panel.
///
/// Loading wins over everything else, then an error, then the summary.
pub fn render(state: &SessionState) -> String {
    if state.is_loading() {
        LOADING_NOTICE.to_string()
    } else if let Some(error) = state.error() {
        format!("Error: {error}")
    } else if !state.summary().is_empty() {
        state.summary().to_string()
    } else {
        PLACEHOLDER.to_string()
    }
}

const SPINNER_FRAMES: [&str; 4] = ["|", "/", "-", "\\"];

/// Single-line loading indicator for a terminal.
#[derive(Debug, Default)]
pub struct Spinner {
    tick: usize,
}

impl Spinner {
    /// Next frame, prefixed with a carriage return so it overwrites the last.
    pub fn next_frame(&mut self) -> String {
        let frame = SPINNER_FRAMES[self.tick % SPINNER_FRAMES.len()];
        self.tick += 1;
        format!("\r{frame} {LOADING_NOTICE}")
    }

    /// Blanks the spinner line, or `None` when no frame was ever drawn.
    pub fn clear(&self) -> Option<String> {
        (self.tick > 0).then(|| format!("\r{}\r", " ".repeat(LOADING_NOTICE.len() + 2)))
    }
}
