use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use switchyard_core::Value;

pub type Metadata = serde_json::Map<String, Value>;

/// A call on its way to an agent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentRequest {
    pub agent_name: String,
    pub payload: Value,
    pub correlation_id: Uuid,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl AgentRequest {
    pub fn new(agent_name: impl Into<String>, payload: impl Into<Value>) -> Self {
        Self {
            agent_name: agent_name.into(),
            payload: payload.into(),
            correlation_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// The agent's answer, carrying the correlation id of the request it answers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentResponse {
    pub agent_name: String,
    pub payload: Value,
    pub correlation_id: Uuid,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl AgentResponse {
    pub fn for_request(request: &AgentRequest, payload: impl Into<Value>) -> Self {
        Self {
            agent_name: request.agent_name.clone(),
            payload: payload.into(),
            correlation_id: request.correlation_id,
            timestamp: Utc::now(),
            metadata: Metadata::new(),
        }
    }
}
