use serde_json::Value;
use uuid::Uuid;

use crate::llm::ChatMessage;

/// State for one interactive session: the published schema data and the
/// chat transcript about it.
///
/// Schema data can only be set through [`Session::publish`], which clears the
/// transcript in the same call.
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    schema_data: Option<Value>,
    transcript: Vec<ChatMessage>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            schema_data: None,
            transcript: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn schema_data(&self) -> Option<&Value> {
        self.schema_data.as_ref()
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    /// Replace the schema data and start a fresh transcript.
    pub fn publish(&mut self, schema_data: Value) {
        self.schema_data = Some(schema_data);
        self.transcript.clear();
        tracing::info!(session_id = %self.id, "schema data published, transcript cleared");
    }

    pub(crate) fn push_turn(&mut self, message: ChatMessage) {
        self.transcript.push(message);
    }
}
