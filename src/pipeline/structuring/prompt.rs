pub const LAB_EXTRACTION_PROMPT: &str = r#"You are a medical data extraction specialist. Extract lab test results from the provided medical report text.

INSTRUCTIONS:
1. Extract ONLY laboratory test results with numerical values
2. For each test, extract: test name, patient value, unit, reference range, and status
3. Classify each result as NORMAL, SLIGHTLY_ABNORMAL, or CRITICAL based on reference ranges
4. Return ONLY valid JSON array format - no markdown, no explanations

JSON FORMAT REQUIRED:
[
  {
    "test": "Test Name",
    "value": numeric_value,
    "unit": "unit",
    "range": "reference_range",
    "status": "NORMAL|SLIGHTLY_ABNORMAL|CRITICAL",
    "explanation": "Brief explanation of what this test measures"
  }
]

CLASSIFICATION RULES:
- NORMAL: Value within reference range
- SLIGHTLY_ABNORMAL: Value 10-30% outside reference range
- CRITICAL: Value >30% outside reference range or clinically dangerous
"#;

/// Build the lab extraction prompt. The report text goes in verbatim.
pub fn build_lab_extraction_prompt(report_text: &str) -> String {
    format!(
        "{LAB_EXTRACTION_PROMPT}\nMEDICAL REPORT TEXT:\n{report_text}\n\nExtract lab data as JSON array:"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_text_verbatim() {
        let text = "Glucose  110 mg/dL  (70-100)\n  {odd} [chars]";
        let prompt = build_lab_extraction_prompt(text);
        assert!(prompt.contains(text));
        assert!(prompt.ends_with("Extract lab data as JSON array:"));
    }

    #[test]
    fn prompt_states_classification_rules_and_fields() {
        let prompt = build_lab_extraction_prompt("x");
        assert!(prompt.contains("SLIGHTLY_ABNORMAL: Value 10-30% outside reference range"));
        assert!(prompt.contains("CRITICAL: Value >30% outside"));
        for field in ["\"test\"", "\"value\"", "\"unit\"", "\"range\"", "\"status\"", "\"explanation\""] {
            assert!(prompt.contains(field), "missing {field}");
        }
        assert!(prompt.contains("no markdown"));
    }
}
