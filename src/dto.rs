//! Transfer shapes exchanged with callers.
//!
//! Every DTO flattens the [`Audit`] fields into itself on the wire. Nested
//! expansions are left out of the JSON entirely when the relation was not
//! loaded.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::audit::Audit;
use crate::entities::{RiskLevel, Sender};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenAiModelDto {
    pub id: i64,
    pub name: String,
    pub provider: Option<String>,
    pub version: Option<String>,
    pub license: Option<String>,
    pub is_active: bool,
    #[serde(flatten)]
    pub audit: Audit,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationTypeDto {
    pub id: i64,
    pub name: String,
    pub default_system_prompt: String,
    pub version: i32,
    pub is_active: bool,
    pub risk_level: Option<RiskLevel>,
    pub use_case_category: Option<String>,
    #[serde(flatten)]
    pub audit: Audit,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationDto {
    pub id: Uuid,
    pub user_id: String,
    pub conversation_type_id: i64,
    pub started_at: DateTime<Utc>,
    #[serde(flatten)]
    pub audit: Audit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_type: Option<ConversationTypeDto>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemPromptOverrideDto {
    pub id: i64,
    pub conversation_id: Uuid,
    pub overridden_prompt: String,
    /// e.g. "Temperature"
    pub prompt_type: Option<String>,
    pub reason_for_override: Option<String>,
    pub version: i32,
    pub set_at: DateTime<Utc>,
    #[serde(flatten)]
    pub audit: Audit,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
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
    #[serde(flatten)]
    pub audit: Audit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<GenAiModelDto>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CitationDto {
    pub id: i64,
    pub message_id: Uuid,
    pub source_url: String,
    pub description: Option<String>,
    #[serde(flatten)]
    pub audit: Audit,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFeedbackDto {
    pub id: i64,
    pub message_id: Uuid,
    pub rating: i32,
    /// thumbs_up, flagged, ...
    pub feedback_type: Option<String>,
    pub comments: Option<String>,
    /// UI, API, Slack, ...
    pub feedback_source: Option<String>,
    pub submitted_by: Option<String>,
    pub submitted_at: DateTime<Utc>,
    #[serde(flatten)]
    pub audit: Audit,
}
