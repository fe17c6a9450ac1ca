use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who wrote a `Message`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

serde_plain::derive_display_from_serialize!(Role);

/// One entry in the conversation with the finance coach.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up_questions: Option<Vec<String>>,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            recommendations: None,
            follow_up_questions: None,
        }
    }

    /// A message typed by the user.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// A message written by the client on behalf of the assistant, such as the greeting or the
    /// apology shown when a request fails.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// The assistant's answer built from a chat reply. Empty lists are dropped.
    pub fn from_reply(reply: ChatReply) -> Self {
        let mut message = Self::assistant(reply.response);
        message.recommendations = reply.recommendations.filter(|r| !r.is_empty());
        message.follow_up_questions = reply.follow_up_questions.filter(|q| !q.is_empty());
        message
    }
}

/// The body of `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// The trailing slice of the conversation that precedes `message`.
    pub conversation_history: Vec<Message>,
}

/// The successful response of `POST /api/chat`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up_questions: Option<Vec<String>>,
}

impl ChatReply {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_ignores_charts() {
        let json = r#"{
            "response": "Cut back on coffee.",
            "recommendations": ["Brew at home"],
            "charts": {"type": "pie"},
            "follow_up_questions": []
        }"#;
        let reply: ChatReply = serde_json::from_str(json).unwrap();
        let message = Message::from_reply(reply);
        assert_eq!(Role::Assistant, message.role);
        assert_eq!(Some(vec!["Brew at home".to_string()]), message.recommendations);
        assert_eq!(None, message.follow_up_questions);
    }

    #[test]
    fn test_reply_requires_response() {
        assert!(serde_json::from_str::<ChatReply>(r#"{"recommendations": []}"#).is_err());
    }

    #[test]
    fn test_request_wire_format() {
        let request = ChatRequest {
            message: "How am I doing?".into(),
            conversation_history: vec![Message::user("hi")],
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!("How am I doing?", value["message"]);
        let first = &value["conversation_history"][0];
        assert_eq!("user", first["role"]);
        assert_eq!("hi", first["content"]);
        assert!(first.get("recommendations").is_none());
        assert!(first["timestamp"].is_string());
    }
}
