//! Per-conversation system prompt overrides.

use libsql::Value;
use tracing::debug;
use uuid::Uuid;

use crate::audit::WriteOutcome;
use crate::dto::SystemPromptOverrideDto;
use crate::entities::SystemPromptOverride;
use crate::error::DatabaseError;
use crate::store::DataContext;
use crate::store::query::{Key, PROMPT_OVERRIDES};
use crate::store::row::{self, RowReader};

pub struct PromptOverrideService<'a> {
    ctx: &'a DataContext,
}

impl<'a> PromptOverrideService<'a> {
    pub fn new(ctx: &'a DataContext) -> Self {
        Self { ctx }
    }

    /// Active overrides for a conversation, in the order they were set.
    pub async fn get_overrides_by_conversation(
        &self,
        conversation_id: Uuid,
    ) -> Result<Vec<SystemPromptOverrideDto>, DatabaseError> {
        let sql = format!(
            "{} ORDER BY o.set_at, o.id",
            PROMPT_OVERRIDES.select_active("o", &[], Some("o.conversation_id = ?1"))
        );
        let overrides = self
            .ctx
            .query_all(
                "get_overrides_by_conversation",
                &sql,
                vec![row::uuid(&conversation_id)],
                read_override,
            )
            .await?;
        Ok(overrides.iter().map(SystemPromptOverrideDto::from).collect())
    }

    pub async fn get_override(
        &self,
        id: i64,
    ) -> Result<Option<SystemPromptOverrideDto>, DatabaseError> {
        let sql = PROMPT_OVERRIDES.select_active("o", &[], Some("o.id = ?1"));
        let found = self
            .ctx
            .query_one("get_override", &sql, vec![row::int(id)], read_override)
            .await?;
        Ok(found.as_ref().map(SystemPromptOverrideDto::from))
    }

    pub async fn add_override(&self, dto: &SystemPromptOverrideDto) -> Result<i64, DatabaseError> {
        let prompt_override = SystemPromptOverride::from(dto);
        let id = self
            .ctx
            .insert("add_override", &PROMPT_OVERRIDES, override_params(&prompt_override))
            .await?;
        debug!(
            id,
            conversation_id = %prompt_override.conversation_id,
            "Prompt override inserted into DB"
        );
        Ok(id)
    }

    pub async fn delete_override(
        &self,
        id: i64,
        deleted_by: Option<&str>,
    ) -> Result<WriteOutcome, DatabaseError> {
        self.ctx
            .soft_delete(&PROMPT_OVERRIDES, Key::Int(id), deleted_by)
            .await
    }
}

fn read_override(r: &mut RowReader<'_>) -> Result<SystemPromptOverride, DatabaseError> {
    Ok(SystemPromptOverride {
        id: r.int()?,
        conversation_id: r.uuid()?,
        overridden_prompt: r.text()?,
        prompt_type: r.opt_text()?,
        reason_for_override: r.opt_text()?,
        version: r.int32()?,
        set_at: r.timestamp()?,
        audit: r.audit()?,
    })
}

fn override_params(o: &SystemPromptOverride) -> Vec<Value> {
    let mut params = vec![
        row::rowid(o.id),
        row::uuid(&o.conversation_id),
        row::text(&o.overridden_prompt),
        row::opt_text(o.prompt_type.as_deref()),
        row::opt_text(o.reason_for_override.as_deref()),
        row::int(o.version),
        row::timestamp(&o.set_at),
    ];
    params.extend(row::audit(&o.audit));
    params
}
