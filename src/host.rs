//! Side effects the pipeline asks its host to perform.

use std::collections::BTreeMap;

use crate::model::MarkMode;

/// Error overlay key for invalid input data.
pub const DATA_ERROR_KEY: &str = "data";
/// Error overlay key for failures inside a render pass.
pub const PIPELINE_ERROR_KEY: &str = "pipeline";

/// Everything the pipeline can ask of the surrounding application.
///
/// Error overlays are keyed: showing or hiding one key leaves the others
/// untouched.
pub trait Host {
    fn show_tooltip(&mut self, text: &str);
    fn hide_tooltip(&mut self);

    fn mark_rows(&mut self, ids: &[String], mode: MarkMode);
    fn clear_marking(&mut self);

    fn show_busy(&mut self);
    fn hide_busy(&mut self);

    fn show_error(&mut self, key: &str, message: &str);
    fn hide_error(&mut self, key: &str);

    /// Informational notice, e.g. when not every word could be placed.
    fn show_notice(&mut self, text: &str);
    fn hide_notice(&mut self);

    /// Route pointer move/up events to the pipeline while a drag runs.
    fn capture_pointer(&mut self);
    fn release_pointer(&mut self);

    fn render_complete(&mut self);
}

/// Host that records side effects through `tracing` and otherwise does
/// nothing. Used by the CLI.
#[derive(Debug, Default)]
pub struct LogHost {
    pub notice: Option<String>,
    pub errors: Vec<(String, String)>,
    pub completed: usize,
}

impl Host for LogHost {
    fn show_tooltip(&mut self, text: &str) {
        tracing::trace!(text, "show tooltip");
    }

    fn hide_tooltip(&mut self) {}

    fn mark_rows(&mut self, ids: &[String], mode: MarkMode) {
        tracing::info!(count = ids.len(), ?mode, "mark rows");
    }

    fn clear_marking(&mut self) {
        tracing::info!("clear marking");
    }

    fn show_busy(&mut self) {
        tracing::debug!("layout is taking a while");
    }

    fn hide_busy(&mut self) {}

    fn show_error(&mut self, key: &str, message: &str) {
        tracing::error!(key, message, "render error");
        self.errors.retain(|(existing, _)| existing != key);
        self.errors.push((key.to_string(), message.to_string()));
    }

    fn hide_error(&mut self, key: &str) {
        self.errors.retain(|(existing, _)| existing != key);
    }

    fn show_notice(&mut self, text: &str) {
        tracing::warn!("{text}");
        self.notice = Some(text.to_string());
    }

    fn hide_notice(&mut self) {
        self.notice = None;
    }

    fn capture_pointer(&mut self) {}

    fn release_pointer(&mut self) {}

    fn render_complete(&mut self) {
        self.completed += 1;
    }
}

/// Host that remembers every side effect. Handy for embedding tests.
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub tooltip: Option<String>,
    pub tooltips: Vec<String>,
    pub marks: Vec<(Vec<String>, MarkMode)>,
    pub cleared: usize,
    pub busy: bool,
    pub busy_shown: usize,
    pub busy_hidden: usize,
    pub errors: BTreeMap<String, String>,
    pub notice: Option<String>,
    pub captured: bool,
    pub captures: usize,
    pub releases: usize,
    pub completed: usize,
}

impl RecordingHost {
    /// Captures minus releases. Zero whenever no drag is running.
    pub fn capture_balance(&self) -> i64 {
        self.captures as i64 - self.releases as i64
    }
}

impl Host for RecordingHost {
    fn show_tooltip(&mut self, text: &str) {
        self.tooltip = Some(text.to_string());
        self.tooltips.push(text.to_string());
    }

    fn hide_tooltip(&mut self) {
        self.tooltip = None;
    }

    fn mark_rows(&mut self, ids: &[String], mode: MarkMode) {
        self.marks.push((ids.to_vec(), mode));
    }

    fn clear_marking(&mut self) {
        self.cleared += 1;
    }

    fn show_busy(&mut self) {
        self.busy = true;
        self.busy_shown += 1;
    }

    fn hide_busy(&mut self) {
        self.busy = false;
        self.busy_hidden += 1;
    }

    fn show_error(&mut self, key: &str, message: &str) {
        self.errors.insert(key.to_string(), message.to_string());
    }

    fn hide_error(&mut self, key: &str) {
        self.errors.remove(key);
    }

    fn show_notice(&mut self, text: &str) {
        self.notice = Some(text.to_string());
    }

    fn hide_notice(&mut self) {
        self.notice = None;
    }

    fn capture_pointer(&mut self) {
        self.captured = true;
        self.captures += 1;
    }

    fn release_pointer(&mut self) {
        self.captured = false;
        self.releases += 1;
    }

    fn render_complete(&mut self) {
        self.completed += 1;
    }
}
