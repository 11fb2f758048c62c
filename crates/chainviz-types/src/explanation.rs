//! Explanation response shape handed back to the UI

use serde::{Deserialize, Serialize};

/// Placeholder used whenever an explanation would otherwise be empty
pub const DEFAULT_EXPLANATION: &str = "No explanation is available for this step.";

/// Structured explanation for one flow step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplanationResponse {
    #[serde(default)]
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technical_details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technical_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simplified_explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub what_if_scenarios: Option<Vec<String>>,
}

impl ExplanationResponse {
    pub fn new(explanation: impl Into<String>) -> Self {
        Self {
            explanation: explanation.into(),
            technical_details: None,
            technical_code: None,
            simplified_explanation: None,
            what_if_scenarios: None,
        }
    }

    pub fn with_technical_details(mut self, details: impl Into<String>) -> Self {
        self.technical_details = Some(details.into());
        self
    }

    pub fn with_technical_code(mut self, code: impl Into<String>) -> Self {
        self.technical_code = Some(code.into());
        self
    }

    pub fn with_simplified(mut self, simplified: impl Into<String>) -> Self {
        self.simplified_explanation = Some(simplified.into());
        self
    }

    pub fn with_what_if_scenarios(mut self, scenarios: Vec<String>) -> Self {
        self.what_if_scenarios = Some(scenarios);
        self
    }

    /// Guarantee a non-empty `explanation` before the value leaves the resolver
    pub fn normalized(mut self) -> Self {
        if self.explanation.trim().is_empty() {
            self.explanation = DEFAULT_EXPLANATION.to_string();
        }
        self
    }
}

impl Default for ExplanationResponse {
    fn default() -> Self {
        Self::new(DEFAULT_EXPLANATION)
    }
}
