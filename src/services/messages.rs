//! Message log access.
//!
//! Messages are read back with the generating model attached, when the
//! message names one.

use libsql::Value;
use tracing::debug;
use uuid::Uuid;

use crate::audit::WriteOutcome;
use crate::dto::MessageDto;
use crate::entities::Message;
use crate::error::DatabaseError;
use crate::services::models::read_model;
use crate::store::DataContext;
use crate::store::query::{Join, Key, MESSAGES, MODELS};
use crate::store::row::{self, RowReader};

const WITH_MODEL: [Join<'static>; 1] = [Join {
    table: &MODELS,
    alias: "m",
    foreign_key: "model_id",
}];

pub struct MessageService<'a> {
    ctx: &'a DataContext,
}

impl<'a> MessageService<'a> {
    pub fn new(ctx: &'a DataContext) -> Self {
        Self { ctx }
    }

    /// Active messages of a conversation, by sequence number.
    pub async fn get_messages_by_conversation(
        &self,
        conversation_id: Uuid,
    ) -> Result<Vec<MessageDto>, DatabaseError> {
        let sql = format!(
            "{} ORDER BY msg.message_sequence, msg.created_at, msg.id",
            MESSAGES.select_active("msg", &WITH_MODEL, Some("msg.conversation_id = ?1"))
        );
        let messages = self
            .ctx
            .query_all(
                "get_messages_by_conversation",
                &sql,
                vec![row::uuid(&conversation_id)],
                read_message_with_model,
            )
            .await?;
        Ok(messages.iter().map(MessageDto::from).collect())
    }

    pub async fn get_message(&self, id: Uuid) -> Result<Option<MessageDto>, DatabaseError> {
        let sql = MESSAGES.select_active("msg", &WITH_MODEL, Some("msg.id = ?1"));
        let found = self
            .ctx
            .query_one(
                "get_message",
                &sql,
                vec![row::uuid(&id)],
                read_message_with_model,
            )
            .await?;
        Ok(found.as_ref().map(MessageDto::from))
    }

    /// Append a message. A nil `id` gets a fresh UUID.
    pub async fn add_message(&self, dto: &MessageDto) -> Result<Uuid, DatabaseError> {
        let mut message = Message::from(dto);
        if message.id.is_nil() {
            message.id = Uuid::new_v4();
        }
        self.ctx
            .insert("add_message", &MESSAGES, message_params(&message))
            .await?;
        debug!(
            id = %message.id,
            conversation_id = %message.conversation_id,
            sequence = message.message_sequence,
            sender = %message.sender,
            "Message inserted into DB"
        );
        Ok(message.id)
    }

    pub async fn delete_message(
        &self,
        id: Uuid,
        deleted_by: Option<&str>,
    ) -> Result<WriteOutcome, DatabaseError> {
        self.ctx
            .soft_delete(&MESSAGES, Key::Uuid(id), deleted_by)
            .await
    }
}

fn read_message(r: &mut RowReader<'_>) -> Result<Message, DatabaseError> {
    Ok(Message {
        id: r.uuid()?,
        conversation_id: r.uuid()?,
        sender: r.parsed()?,
        message_sequence: r.int32()?,
        content: r.text()?,
        relevance_percentage: r.opt_decimal()?,
        model_id: r.opt_int()?,
        was_decision_made: r.flag()?,
        requires_human_review: r.flag()?,
        is_final_output: r.flag()?,
        audit: r.audit()?,
        model: None,
    })
}

fn read_message_with_model(r: &mut RowReader<'_>) -> Result<Message, DatabaseError> {
    let mut message = read_message(r)?;
    if r.peek_null() {
        r.skip(MODELS.columns.len());
    } else {
        message.model = Some(read_model(r)?);
    }
    Ok(message)
}

fn message_params(m: &Message) -> Vec<Value> {
    let mut params = vec![
        row::uuid(&m.id),
        row::uuid(&m.conversation_id),
        row::text(&m.sender.to_string()),
        row::int(m.message_sequence),
        row::text(&m.content),
        row::opt_decimal(m.relevance_percentage.as_ref()),
        row::opt_int(m.model_id),
        row::flag(m.was_decision_made),
        row::flag(m.requires_human_review),
        row::flag(m.is_final_output),
    ];
    params.extend(row::audit(&m.audit));
    params
}
