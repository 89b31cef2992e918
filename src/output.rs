//! CLI output formatting for resize runs.
//!
//! # Information-First Display
//!
//! Every request is shown by its positional index and file name, with the
//! full source path and the outcome as indented context lines:
//!
//! ```text
//! 001 IMG_0001.jpg → scaled_IMG_0001.jpg
//!     Source: /picked/IMG_0001.jpg
//!     Size: 1024x768 (jpeg q80)
//!     EXIF: copied
//! 002 logo.svg
//!     Source: /picked/logo.svg
//!     Unchanged: .svg is not resizable
//! 003 notes.jpg
//!     Source: /picked/notes.jpg
//!     Not an image
//!
//! Resized 1, unchanged 1, not images 1, failed 0
//! ```
//!
//! # Architecture
//!
//! Each piece of output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::resizer::{ResizeError, ResizeEvent, ResizeOutcome, SkipReason};
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn skip_reason(reason: &SkipReason) -> String {
    match reason {
        SkipReason::NothingRequested => "nothing requested".to_string(),
        SkipReason::NonResizableExtension(ext) => format!(".{} is not resizable", ext),
        SkipReason::Animated => "animated".to_string(),
    }
}

/// Format one finished request as display lines.
pub fn format_event(event: &ResizeEvent) -> Vec<String> {
    let name = file_name(&event.source);
    let mut lines = Vec::new();

    match &event.result {
        Ok(ResizeOutcome::Scaled(scaled)) => {
            lines.push(format!(
                "{} {} \u{2192} {}",
                format_index(event.index),
                name,
                file_name(&scaled.path)
            ));
            lines.push(format!("    Source: {}", event.source.display()));
            lines.push(format!(
                "    Size: {}x{} ({})",
                scaled.width, scaled.height, scaled.format
            ));
            let exif = if scaled.exif_copied { "copied" } else { "none" };
            lines.push(format!("    EXIF: {}", exif));
        }
        Ok(ResizeOutcome::Unchanged { reason, .. }) => {
            lines.push(format!("{} {}", format_index(event.index), name));
            lines.push(format!("    Source: {}", event.source.display()));
            lines.push(format!("    Unchanged: {}", skip_reason(reason)));
        }
        Ok(ResizeOutcome::Undecodable { .. }) => {
            lines.push(format!("{} {}", format_index(event.index), name));
            lines.push(format!("    Source: {}", event.source.display()));
            lines.push("    Not an image".to_string());
        }
        Err(message) => {
            lines.push(format!("{} {}", format_index(event.index), name));
            lines.push(format!("    Source: {}", event.source.display()));
            lines.push(format!("    Error: {}", message));
        }
    }
    lines
}

/// Tally of a finished batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub resized: usize,
    pub unchanged: usize,
    pub undecodable: usize,
    pub failed: usize,
}

impl Summary {
    pub fn from_results(results: &[Result<ResizeOutcome, ResizeError>]) -> Self {
        let mut summary = Self::default();
        for result in results {
            match result {
                Ok(ResizeOutcome::Scaled(_)) => summary.resized += 1,
                Ok(ResizeOutcome::Unchanged { .. }) => summary.unchanged += 1,
                Ok(ResizeOutcome::Undecodable { .. }) => summary.undecodable += 1,
                Err(_) => summary.failed += 1,
            }
        }
        summary
    }

    /// Error text for a run where any request failed.
    pub fn failure_message(&self) -> Option<String> {
        let total = self.resized + self.unchanged + self.undecodable + self.failed;
        (self.failed > 0).then(|| format!("{} of {} requests failed", self.failed, total))
    }
}

pub fn format_summary(summary: &Summary) -> Vec<String> {
    vec![
        String::new(),
        format!(
            "Resized {}, unchanged {}, not images {}, failed {}",
            summary.resized, summary.unchanged, summary.undecodable, summary.failed
        ),
    ]
}

pub fn print_event(event: &ResizeEvent) {
    for line in format_event(event) {
        println!("{}", line);
    }
}

pub fn print_summary(summary: &Summary) {
    for line in format_summary(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
