//! Storage-shaped records, one per table.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::audit::Audit;

/// Risk classification of a conversation type.
///
/// Spelled lowercase everywhere it is written; any casing is read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[serde(alias = "Low", alias = "LOW")]
    Low,
    #[serde(alias = "Medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "High", alias = "HIGH")]
    High,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for RiskLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(format!("Unknown risk level: {}", s)),
        }
    }
}

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    #[default]
    User,
    Assistant,
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

impl std::str::FromStr for Sender {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            _ => Err(format!("Unknown sender: {}", s)),
        }
    }
}

/// A registered generative model.
#[derive(Debug, Clone, PartialEq)]
pub struct GenAiModel {
    pub id: i64,
    pub name: String,
    pub provider: Option<String>,
    pub version: Option<String>,
    pub license: Option<String>,
    pub is_active: bool,
    pub audit: Audit,
}

/// A category of conversation with its default system prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationType {
    pub id: i64,
    pub name: String,
    pub default_system_prompt: String,
    pub version: i32,
    pub is_active: bool,
    pub risk_level: Option<RiskLevel>,
    pub use_case_category: Option<String>,
    pub audit: Audit,
}

/// A conversation session.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    pub id: Uuid,
    pub user_id: String,
    pub conversation_type_id: i64,
    pub started_at: DateTime<Utc>,
    pub audit: Audit,
    /// Loaded only when the query joined it.
    pub conversation_type: Option<ConversationType>,
}

/// A per-conversation replacement for the default system prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemPromptOverride {
    pub id: i64,
    pub conversation_id: Uuid,
    pub overridden_prompt: String,
    pub prompt_type: Option<String>,
    pub reason_for_override: Option<String>,
    pub version: i32,
    pub set_at: DateTime<Utc>,
    pub audit: Audit,
}

/// One turn of a conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender: Sender,
    pub message_sequence: i32,
    pub content: String,
    pub relevance_percentage: Option<Decimal>,
    pub model_id: Option<i64>,
    pub was_decision_made: bool,
    pub requires_human_review: bool,
    pub is_final_output: bool,
    pub audit: Audit,
    /// Loaded only when the query joined it.
    pub model: Option<GenAiModel>,
}

/// A source cited by a message.
#[derive(Debug, Clone, PartialEq)]
pub struct Citation {
    pub id: i64,
    pub message_id: Uuid,
    pub source_url: String,
    pub description: Option<String>,
    pub audit: Audit,
}

/// A user's rating of a message.
#[derive(Debug, Clone, PartialEq)]
pub struct UserFeedback {
    pub id: i64,
    pub message_id: Uuid,
    /// Expected 1-5; not checked.
    pub rating: i32,
    pub feedback_type: Option<String>,
    pub comments: Option<String>,
    pub feedback_source: Option<String>,
    pub submitted_by: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub audit: Audit,
}
