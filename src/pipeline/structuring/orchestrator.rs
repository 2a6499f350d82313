use std::sync::Arc;

use super::parser::{parse_lab_response, ParsedLabData};
use super::prompt::build_lab_extraction_prompt;
use super::StructuringError;
use crate::models::LabResult;
use crate::pipeline::llm::{LlmClient, LlmError};

/// Turns report text into validated lab results with one generation call.
///
/// Never fails. Anything that goes wrong (no client, network, unparsable
/// reply) is logged and comes back as an empty list.
pub struct LabDataExtractor {
    llm: Option<Arc<dyn LlmClient>>,
    model: String,
}

impl LabDataExtractor {
    /// `model` is the primary model; extraction does not walk the fallback list.
    pub fn new(llm: Option<Arc<dyn LlmClient>>, model: &str) -> Self {
        Self {
            llm,
            model: model.to_string(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.llm.is_some()
    }

    pub fn extract_structured(&self, text: &str) -> Vec<LabResult> {
        self.extract_with_report(text).results
    }

    /// Like [`Self::extract_structured`], also reporting how many elements
    /// the validator dropped.
    pub fn extract_with_report(&self, text: &str) -> ParsedLabData {
        if text.trim().is_empty() {
            return ParsedLabData::default();
        }

        match self.try_extract(text) {
            Ok(parsed) => {
                tracing::info!(
                    model = %self.model,
                    kept = parsed.results.len(),
                    dropped = parsed.dropped,
                    "Lab data extracted"
                );
                if parsed.dropped > 0 {
                    tracing::warn!(dropped = parsed.dropped, "Incomplete lab results discarded");
                }
                parsed
            }
            Err(e) => {
                tracing::warn!(model = %self.model, error = %e, "Lab data extraction failed");
                ParsedLabData::default()
            }
        }
    }

    fn try_extract(&self, text: &str) -> Result<ParsedLabData, StructuringError> {
        let llm = self.llm.as_ref().ok_or(LlmError::NotConfigured)?;
        let prompt = build_lab_extraction_prompt(text);
        let response = llm.generate(&self.model, &prompt)?;
        parse_lab_response(&response)
    }
}
