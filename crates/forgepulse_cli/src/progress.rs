//! Progress output for aggregation cycles.
//!
//! Spinners when stderr is a terminal, `tracing` records when it is not, and
//! nothing when stdout carries JSON.

mod interactive;
mod logging;

use std::sync::Arc;

use console::Term;
use forgepulse::{ProgressCallback, PulseProgress};

pub use interactive::InteractiveReporter;
pub use logging::LoggingReporter;

use crate::commands::shared::OutputFormat;

pub enum ProgressReporter {
    Interactive(InteractiveReporter),
    Logging(LoggingReporter),
    Silent,
}

impl ProgressReporter {
    /// Pick spinners or log records from whether stderr is a terminal.
    pub fn new() -> Self {
        match Term::stderr().is_term() {
            true => Self::Interactive(InteractiveReporter::new()),
            false => Self::Logging(LoggingReporter::new()),
        }
    }

    /// Reporter for a command printing `output`; JSON output stays quiet.
    pub(crate) fn shared_for(output: OutputFormat) -> Arc<Self> {
        Arc::new(match output {
            OutputFormat::Json => Self::Silent,
            OutputFormat::Table => Self::new(),
        })
    }

    pub fn handle(&self, event: PulseProgress) {
        match self {
            Self::Interactive(spinners) => spinners.handle(event),
            Self::Logging(log) => log.handle(event),
            Self::Silent => {}
        }
    }

    /// Library callback that forwards into this reporter.
    pub fn as_callback(self: &Arc<Self>) -> ProgressCallback {
        let target = Arc::clone(self);
        Box::new(move |event| target.handle(event))
    }

    pub fn finish(&self) {
        if let Self::Interactive(spinners) = self {
            spinners.finish();
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}
