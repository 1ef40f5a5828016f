use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Title given to conversations saved without one
pub const DEFAULT_TITLE: &str = "Untitled";

/// Full persisted state of one conversation
///
/// `settings` and `messages` are opaque to the gateway and stored verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationDocument {
    /// Opaque lowercase-hex identifier, immutable once created
    pub id: String,
    /// User-facing title
    pub title: String,
    /// First-save timestamp (ISO-8601, UTC)
    pub created_at: String,
    /// Last-save timestamp (ISO-8601, UTC)
    pub updated_at: String,
    /// System prompt
    #[serde(default)]
    pub system: String,
    /// Model and generation parameters
    #[serde(default)]
    pub settings: Map<String, Value>,
    /// Ordered chat messages
    #[serde(default)]
    pub messages: Vec<Value>,
}

/// Summary projection of a conversation kept in the index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Conversation id
    pub id: String,
    /// Title at the most recent save
    pub title: String,
    /// First-save timestamp
    pub created_at: String,
    /// Most recent save timestamp
    pub updated_at: String,
}

impl From<&ConversationDocument> for IndexEntry {
    fn from(doc: &ConversationDocument) -> Self {
        Self {
            id: doc.id.clone(),
            title: doc.title.clone(),
            created_at: doc.created_at.clone(),
            updated_at: doc.updated_at.clone(),
        }
    }
}

/// Body accepted by the save operation
///
/// Every field is optional; missing, null or empty values fall back to the
/// defaults applied by `ConversationStore::save`. Unknown fields (including a
/// client-supplied `updated_at`) are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConversationInput {
    pub id: Option<String>,
    pub title: Option<String>,
    pub created_at: Option<String>,
    pub system: Option<String>,
    pub settings: Option<Map<String, Value>>,
    pub messages: Option<Vec<Value>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_input_accepts_partial_body() {
        let input: ConversationInput =
            serde_json::from_value(json!({"title": "Demo", "updated_at": "ignored"})).unwrap();
        assert_eq!(input.title.as_deref(), Some("Demo"));
        assert!(input.id.is_none());
        assert!(input.messages.is_none());
    }

    #[test]
    fn test_input_treats_null_as_missing() {
        let input: ConversationInput =
            serde_json::from_value(json!({"system": null, "settings": null})).unwrap();
        assert!(input.system.is_none());
        assert!(input.settings.is_none());
    }

    #[test]
    fn test_document_field_order_on_disk() {
        let doc = ConversationDocument {
            id: "abc".to_string(),
            title: DEFAULT_TITLE.to_string(),
            created_at: "t0".to_string(),
            updated_at: "t1".to_string(),
            system: String::new(),
            settings: Map::new(),
            messages: vec![],
        };
        let text = serde_json::to_string(&doc).unwrap();
        assert_eq!(
            text,
            r#"{"id":"abc","title":"Untitled","created_at":"t0","updated_at":"t1","system":"","settings":{},"messages":[]}"#
        );
    }

    #[test]
    fn test_index_entry_projection() {
        let doc = ConversationDocument {
            id: "abc".to_string(),
            title: "Demo".to_string(),
            created_at: "t0".to_string(),
            updated_at: "t1".to_string(),
            system: "be brief".to_string(),
            settings: Map::new(),
            messages: vec![json!({"role": "user", "content": "hi"})],
        };
        let entry = IndexEntry::from(&doc);
        assert_eq!(entry.id, "abc");
        assert_eq!(entry.title, "Demo");
        assert_eq!(entry.updated_at, "t1");
    }
}
