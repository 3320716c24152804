use chrono::{Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};
use uuid::Uuid;

/// Who authored a message. Serialized with the provider's role names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    /// Label shown above a message bubble.
    pub fn display_name(&self) -> &'static str {
        match self {
            Role::User => "나",
            Role::Model => "독도 바이브 봇",
        }
    }
}

/// A web page the provider cited while grounding an answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub uri: String,
}

/// One entry of the conversation. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<Source>>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl Message {
    fn new(role: Role, text: String, sources: Option<Vec<Source>>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            text,
            sources,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text.into(), None)
    }

    /// Assistant message without citations (greeting, error notice).
    pub fn model(text: impl Into<String>) -> Self {
        Self::new(Role::Model, text.into(), None)
    }

    /// Assistant message built from a provider answer. The source list is
    /// always present, possibly empty.
    pub fn answer(text: impl Into<String>, sources: Vec<Source>) -> Self {
        Self::new(Role::Model, text.into(), Some(sources))
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    /// Sources to display; empty for user messages and uncited answers.
    pub fn cited_sources(&self) -> &[Source] {
        match (&self.role, &self.sources) {
            (Role::Model, Some(sources)) => sources,
            _ => &[],
        }
    }

    /// `HH:MM` in local time, as shown under each bubble.
    pub fn clock_time(&self) -> String {
        match Local.timestamp_millis_opt(self.timestamp).single() {
            Some(time) => time.format("%H:%M").to_string(),
            None => String::from("--:--"),
        }
    }
}
