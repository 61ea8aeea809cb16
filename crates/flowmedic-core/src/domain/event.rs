//! Raw failure description consumed at pipeline entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A failure reported by the orchestration platform.
///
/// Immutable once ingested; the pipeline only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEvent {
    /// Free-text error message, the primary matching input.
    pub message: String,
    #[serde(default)]
    pub workflow: Option<String>,
    #[serde(default)]
    pub activity: Option<String>,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub run_id: Option<String>,
    #[serde(default)]
    pub occurred_at: Option<DateTime<Utc>>,
}

impl ErrorEvent {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            workflow: None,
            activity: None,
            error_code: None,
            run_id: None,
            occurred_at: None,
        }
    }

    pub fn with_workflow(mut self, workflow: impl Into<String>) -> Self {
        self.workflow = Some(workflow.into());
        self
    }

    pub fn with_activity(mut self, activity: impl Into<String>) -> Self {
        self.activity = Some(activity.into());
        self
    }

    pub fn with_error_code(mut self, code: impl Into<String>) -> Self {
        self.error_code = Some(code.into());
        self
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    /// Full matching text: message plus the structured fields that carry
    /// error vocabulary.
    pub fn matching_text(&self) -> String {
        let mut text = self.message.clone();
        if let Some(code) = &self.error_code {
            text.push(' ');
            text.push_str(code);
        }
        if let Some(activity) = &self.activity {
            text.push(' ');
            text.push_str(activity);
        }
        text
    }
}
