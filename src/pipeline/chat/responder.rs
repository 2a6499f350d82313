use std::sync::Arc;

use super::prompt::build_chat_prompt;
use crate::models::ConversationTurn;
use crate::pipeline::fallback::run_chain;
use crate::pipeline::llm::{LlmClient, LlmError};

/// Answers patient questions about one report.
///
/// Tries each configured model in order and never fails: a missing client
/// or an exhausted model list turns into a fixed explanatory reply.
pub struct ChatResponder {
    llm: Option<Arc<dyn LlmClient>>,
    models: Vec<String>,
}

impl ChatResponder {
    pub fn new(llm: Option<Arc<dyn LlmClient>>, models: Vec<String>) -> Self {
        Self { llm, models }
    }

    pub fn respond(
        &self,
        source_text: &str,
        conversation: &[ConversationTurn],
        message: &str,
        language: &str,
    ) -> String {
        let Some(llm) = self.llm.as_ref() else {
            return not_configured_reply(language);
        };

        let prompt = build_chat_prompt(source_text, conversation, message, language);
        let outcome = run_chain(
            "chat_models",
            self.models.iter(),
            |model| model.to_string(),
            |model| llm.generate(model, &prompt).map(Some),
        );

        match outcome {
            Ok(hit) => hit.value,
            Err(exhausted) => {
                let reason = exhausted
                    .first_error()
                    .map(LlmError::to_string)
                    .unwrap_or_else(|| "no models configured".to_string());
                tracing::error!(error = %reason, "Every chat model failed");
                apology_reply(&reason)
            }
        }
    }
}

pub fn not_configured_reply(language: &str) -> String {
    format!(
        "I understand your question about the medical report. However, the AI service is not \
         configured. Please set up your API key to get personalized medical explanations in \
         {language}. In the meantime, I recommend discussing your report with your healthcare \
         provider."
    )
}

pub fn apology_reply(reason: &str) -> String {
    format!(
        "I apologize, but I'm having trouble generating a response right now. Please try again \
         or consult with your healthcare provider. Error: {reason}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::llm::MockLlmClient;

    fn models() -> Vec<String> {
        vec!["m1".into(), "m2".into(), "m3".into()]
    }

    fn responder(mock: MockLlmClient) -> (ChatResponder, Arc<MockLlmClient>) {
        let mock = Arc::new(mock);
        (ChatResponder::new(Some(mock.clone()), models()), mock)
    }

    #[test]
    fn primary_model_answers() {
        let (responder, mock) = responder(MockLlmClient::new("Your glucose is slightly high."));
        let reply = responder.respond("Glucose 110", &[], "Is my glucose ok?", "English");
        assert_eq!(reply, "Your glucose is slightly high.");
        assert_eq!(mock.call_count(), 1);
    }

    #[test]
    fn falls_back_to_next_model() {
        let (responder, mock) = responder(
            MockLlmClient::new("unused")
                .failing_for("m1")
                .with_response("m2", "from m2"),
        );
        let reply = responder.respond("r", &[], "q", "English");
        assert_eq!(reply, "from m2");
        let called: Vec<String> = mock.calls().into_iter().map(|(m, _)| m).collect();
        assert_eq!(called, vec!["m1", "m2"]);
    }

    #[test]
    fn all_models_failing_embeds_first_error() {
        let (responder, mock) = responder(
            MockLlmClient::new("unused")
                .failing_for("m1")
                .failing_for("m2")
                .failing_for("m3"),
        );
        let reply = responder.respond("r", &[], "q", "English");
        assert!(reply.starts_with("I apologize"));
        assert!(reply.contains("m1 unavailable"), "got: {reply}");
        assert_eq!(mock.call_count(), 3);
    }

    #[test]
    fn unconfigured_reply_names_language() {
        let responder = ChatResponder::new(None, models());
        let reply = responder.respond("r", &[], "q", "French");
        assert!(reply.contains("not configured"));
        assert!(reply.contains("in French."));
    }

    #[test]
    fn prompt_carries_question_and_language() {
        let (responder, mock) = responder(MockLlmClient::new("ok"));
        responder.respond("TSH 5.1", &[], "What is TSH?", "German");
        let prompt = &mock.calls()[0].1;
        assert!(prompt.contains("Respond in German."));
        assert!(prompt.contains("TSH 5.1"));
        assert!(prompt.ends_with("Patient: What is TSH?\nAssistant:"));
    }
}
