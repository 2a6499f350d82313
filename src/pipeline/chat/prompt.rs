use crate::models::{ConversationRole, ConversationTurn};

/// Turns of history included in a chat prompt (5 exchanges).
pub const PROMPT_HISTORY_TURNS: usize = 10;

/// Build the grounded chat prompt: persona, the report, recent history,
/// then the new question left open for the assistant to answer.
pub fn build_chat_prompt(
    source_text: &str,
    conversation: &[ConversationTurn],
    message: &str,
    language: &str,
) -> String {
    let mut prompt = format!(
        r#"
You are a medical assistant that simplifies medical reports for patients.

### Guidelines
1. Respond in {language}.
2. Use **plain, to-the-point explanations**.
   - Example: "Your vitamin D is low → may cause tiredness and weak bones."
3. For lab values, categorize as:
   - NORMAL, SLIGHTLY_ABNORMAL, CRITICAL
   - Format: **[TYPE:value]**
4. After each result:
   - Explain in plain English
   - Cite a trusted source (Mayo Clinic, CDC, NIH, etc.)
   - Give simple lifestyle advice if relevant
5. Be empathetic but concise.
6. Always advise consulting a healthcare provider.
7. If user asks unrelated questions → redirect to the report.

### Formatting
- Use ## for main sections, ### for subsections
- Bold key terms and values
- Bullets for lists
- Plain English + Lifestyle tips under each abnormal finding

### Example
## Your Test Results

- **Glucose**: **[SLIGHTLY_ABNORMAL:110 mg/dL]**
  *Plain English:* Slightly high blood sugar, may mean risk of diabetes.
  *(Source: CDC)*
  *Lifestyle Tip:* Cut down on sweets, walk daily.

- **Cholesterol**: **[CRITICAL:280 mg/dL]**
  *Plain English:* Very high cholesterol, raises heart disease risk.
  *(Source: AHA)*
  *Lifestyle Tip:* Eat more vegetables, avoid fried foods, see your doctor soon.

---

MEDICAL REPORT CONTEXT:
{source_text}

CONVERSATION HISTORY:
"#
    );

    let start = conversation.len().saturating_sub(PROMPT_HISTORY_TURNS);
    for turn in &conversation[start..] {
        let speaker = match turn.role {
            ConversationRole::User => "Patient",
            ConversationRole::Assistant => "Assistant",
        };
        prompt.push_str(speaker);
        prompt.push_str(": ");
        prompt.push_str(&turn.content);
        prompt.push('\n');
    }

    prompt.push_str("\nPatient: ");
    prompt.push_str(message);
    prompt.push_str("\nAssistant:");
    prompt
}
