//! Follow-up questions about an uploaded report.

use serde::Serialize;

use crate::core_state::{CoreError, CoreState};

#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub session_id: String,
    pub response: String,
}

/// Answer `message` in the context of the session's report.
///
/// The whole read-generate-append cycle runs under the session's turn lock,
/// so two questions on one session are answered one after the other and
/// both exchanges land in the history. The session's language is updated to
/// `language` before generating.
pub fn send_chat_message(
    state: &CoreState,
    session_id: &str,
    message: &str,
    language: Option<&str>,
) -> Result<ChatReply, CoreError> {
    let message = message.trim();
    if message.is_empty() {
        return Err(CoreError::InvalidInput("Message is required".into()));
    }
    let language = language
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or(state.config.default_language.as_str())
        .to_string();

    let response = state.sessions.serialized(session_id, || -> Result<String, CoreError> {
        let (source_text, conversation) = state.sessions.update(session_id, |record| {
            record.language = language.clone();
            (record.source_text.clone(), record.conversation.clone())
        })?;

        let response = state
            .responder
            .respond(&source_text, &conversation, message, &language);

        state
            .sessions
            .update(session_id, |record| record.append_exchange(message, &response))?;
        Ok(response)
    })??;

    state.persist_sessions();
    tracing::info!(session_id, language = %language, "Chat reply generated");

    Ok(ChatReply {
        session_id: session_id.to_string(),
        response,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_state::test_support::state_with;
    use crate::models::{ConversationRole, SessionRecord, MAX_CONVERSATION_TURNS};
    use crate::pipeline::llm::MockLlmClient;
    use std::sync::Arc;

    fn seeded(mock: MockLlmClient) -> (CoreState, Arc<MockLlmClient>) {
        let mock = Arc::new(mock);
        let state = state_with(mock.clone());
        state
            .sessions
            .create_or_replace(SessionRecord::new(
                "s1",
                "report.pdf",
                "Glucose 110 mg/dL".into(),
                vec![],
            ))
            .unwrap();
        (state, mock)
    }

    #[test]
    fn reply_is_appended_to_history() {
        let (state, _) = seeded(MockLlmClient::new("Slightly high."));
        let reply = send_chat_message(&state, "s1", "  Is glucose ok?  ", Some("English")).unwrap();
        assert_eq!(reply.response, "Slightly high.");

        let record = state.sessions.get("s1").unwrap();
        assert_eq!(record.conversation.len(), 2);
        assert_eq!(record.conversation[0].role, ConversationRole::User);
        assert_eq!(record.conversation[0].content, "Is glucose ok?");
        assert_eq!(record.conversation[1].content, "Slightly high.");
    }

    #[test]
    fn unknown_session_is_not_found_and_not_created() {
        let (state, mock) = seeded(MockLlmClient::new("x"));
        let err = send_chat_message(&state, "missing", "hello", None).unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
        assert!(!state.sessions.contains("missing"));
        assert_eq!(state.sessions.len(), 1);
        assert_eq!(mock.call_count(), 0);
    }

    #[test]
    fn empty_message_is_invalid() {
        let (state, mock) = seeded(MockLlmClient::new("x"));
        let err = send_chat_message(&state, "s1", "   ", None).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
        assert_eq!(mock.call_count(), 0);
        assert!(state.sessions.get("s1").unwrap().conversation.is_empty());
    }

    #[test]
    fn language_is_recorded_and_used() {
        let (state, mock) = seeded(MockLlmClient::new("Hola"));
        send_chat_message(&state, "s1", "hola", Some("Spanish")).unwrap();
        assert_eq!(state.sessions.get("s1").unwrap().language, "Spanish");
        assert!(mock.calls()[0].1.contains("Respond in Spanish."));
    }

    #[test]
    fn missing_language_uses_default() {
        let (state, _) = seeded(MockLlmClient::new("ok"));
        send_chat_message(&state, "s1", "q", None).unwrap();
        assert_eq!(state.sessions.get("s1").unwrap().language, "English");
    }

    #[test]
    fn history_is_capped() {
        let (state, _) = seeded(MockLlmClient::new("a"));
        for i in 0..13 {
            send_chat_message(&state, "s1", &format!("q{i}"), None).unwrap();
        }
        let record = state.sessions.get("s1").unwrap();
        assert_eq!(record.conversation.len(), MAX_CONVERSATION_TURNS);
        assert_eq!(record.conversation[0].content, "q3");
        assert_eq!(record.conversation[18].content, "q12");
    }

    #[test]
    fn model_failure_still_records_apology() {
        let (state, _) = seeded(
            MockLlmClient::new("x")
                .failing_for("gemini-2.0-flash")
                .failing_for("gemini-1.5-flash")
                .failing_for("gemini-1.5-pro")
                .failing_for("gemini-pro"),
        );
        let reply = send_chat_message(&state, "s1", "q", None).unwrap();
        assert!(reply.response.starts_with("I apologize"));
        assert_eq!(state.sessions.get("s1").unwrap().conversation.len(), 2);
    }

    #[test]
    fn concurrent_chats_keep_both_exchanges() {
        let (state, _) = seeded(MockLlmClient::new("answer"));
        let state = Arc::new(state);

        let handles: Vec<_> = ["first question", "second question"]
            .into_iter()
            .map(|question| {
                let state = state.clone();
                std::thread::spawn(move || send_chat_message(&state, "s1", question, None).unwrap())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let record = state.sessions.get("s1").unwrap();
        assert_eq!(record.conversation.len(), 4);
        let users: Vec<&str> = record
            .conversation
            .iter()
            .filter(|t| t.role == ConversationRole::User)
            .map(|t| t.content.as_str())
            .collect();
        assert!(users.contains(&"first question"));
        assert!(users.contains(&"second question"));
        // exchanges never interleave
        for pair in record.conversation.chunks(2) {
            assert_eq!(pair[0].role, ConversationRole::User);
            assert_eq!(pair[1].role, ConversationRole::Assistant);
        }
    }
}
