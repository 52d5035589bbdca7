//! Conversation session access.
//!
//! Reads eager-load the conversation type. Conversations are the one record
//! family with an in-place update.

use chrono::Utc;
use libsql::Value;
use tracing::debug;
use uuid::Uuid;

use crate::audit::WriteOutcome;
use crate::dto::ConversationDto;
use crate::entities::Conversation;
use crate::error::DatabaseError;
use crate::services::conversation_types::read_conversation_type;
use crate::store::DataContext;
use crate::store::query::{CONVERSATION_TYPES, CONVERSATIONS, Join, Key};
use crate::store::row::{self, RowReader};

const WITH_TYPE: [Join<'static>; 1] = [Join {
    table: &CONVERSATION_TYPES,
    alias: "t",
    foreign_key: "conversation_type_id",
}];

pub struct ConversationService<'a> {
    ctx: &'a DataContext,
}

impl<'a> ConversationService<'a> {
    pub fn new(ctx: &'a DataContext) -> Self {
        Self { ctx }
    }

    /// A user's active conversations, most recently started first.
    pub async fn get_conversations_by_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<ConversationDto>, DatabaseError> {
        let sql = format!(
            "{} ORDER BY c.started_at DESC",
            CONVERSATIONS.select_active("c", &WITH_TYPE, Some("c.user_id = ?1"))
        );
        let conversations = self
            .ctx
            .query_all(
                "get_conversations_by_user",
                &sql,
                vec![row::text(user_id)],
                read_conversation_with_type,
            )
            .await?;
        Ok(conversations.iter().map(ConversationDto::from).collect())
    }

    pub async fn get_conversation(
        &self,
        id: Uuid,
    ) -> Result<Option<ConversationDto>, DatabaseError> {
        let sql = CONVERSATIONS.select_active("c", &WITH_TYPE, Some("c.id = ?1"));
        let found = self
            .ctx
            .query_one(
                "get_conversation",
                &sql,
                vec![row::uuid(&id)],
                read_conversation_with_type,
            )
            .await?;
        Ok(found.as_ref().map(ConversationDto::from))
    }

    /// Insert a conversation. A nil `id` gets a fresh UUID.
    pub async fn create_conversation(&self, dto: &ConversationDto) -> Result<Uuid, DatabaseError> {
        let mut conversation = Conversation::from(dto);
        if conversation.id.is_nil() {
            conversation.id = Uuid::new_v4();
        }
        self.ctx
            .insert(
                "create_conversation",
                &CONVERSATIONS,
                conversation_params(&conversation),
            )
            .await?;
        debug!(id = %conversation.id, user_id = %conversation.user_id, "Conversation inserted into DB");
        Ok(conversation.id)
    }

    /// Overwrite the mutable fields of an active conversation.
    ///
    /// `modified_by` comes from the DTO; `modified_at` is stamped now. The
    /// nested type expansion, if any, is ignored.
    pub async fn update_conversation(
        &self,
        dto: &ConversationDto,
    ) -> Result<WriteOutcome, DatabaseError> {
        let conversation = Conversation::from(dto);
        let key = Key::Uuid(conversation.id);
        let changed = self
            .ctx
            .execute(
                "update_conversation",
                "UPDATE conversations SET user_id = ?1, conversation_type_id = ?2, started_at = ?3,
                    modified_by = ?4, modified_at = ?5
                 WHERE id = ?6 AND is_deleted = 0",
                vec![
                    row::text(&conversation.user_id),
                    row::int(conversation.conversation_type_id),
                    row::timestamp(&conversation.started_at),
                    row::opt_text(conversation.audit.modified_by.as_deref()),
                    row::timestamp(&Utc::now()),
                    key.into(),
                ],
            )
            .await?;

        let outcome = if changed > 0 {
            WriteOutcome::Applied
        } else {
            self.ctx.explain_skipped_write(&CONVERSATIONS, key).await?
        };
        if outcome.is_applied() {
            debug!(id = %conversation.id, "Conversation updated");
        } else {
            debug!(id = %conversation.id, ?outcome, "Conversation update skipped");
        }
        Ok(outcome)
    }

    pub async fn delete_conversation(
        &self,
        id: Uuid,
        deleted_by: Option<&str>,
    ) -> Result<WriteOutcome, DatabaseError> {
        self.ctx
            .soft_delete(&CONVERSATIONS, Key::Uuid(id), deleted_by)
            .await
    }
}

fn read_conversation(r: &mut RowReader<'_>) -> Result<Conversation, DatabaseError> {
    Ok(Conversation {
        id: r.uuid()?,
        user_id: r.text()?,
        conversation_type_id: r.int()?,
        started_at: r.timestamp()?,
        audit: r.audit()?,
        conversation_type: None,
    })
}

fn read_conversation_with_type(r: &mut RowReader<'_>) -> Result<Conversation, DatabaseError> {
    let mut conversation = read_conversation(r)?;
    if r.peek_null() {
        r.skip(CONVERSATION_TYPES.columns.len());
    } else {
        conversation.conversation_type = Some(read_conversation_type(r)?);
    }
    Ok(conversation)
}

fn conversation_params(c: &Conversation) -> Vec<Value> {
    let mut params = vec![
        row::uuid(&c.id),
        row::text(&c.user_id),
        row::int(c.conversation_type_id),
        row::timestamp(&c.started_at),
    ];
    params.extend(row::audit(&c.audit));
    params
}
