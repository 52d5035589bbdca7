//! User feedback on messages.
//!
//! Feedback is accepted for any message id; nothing checks that the
//! message exists.

use libsql::Value;
use tracing::debug;
use uuid::Uuid;

use crate::audit::WriteOutcome;
use crate::dto::UserFeedbackDto;
use crate::entities::UserFeedback;
use crate::error::DatabaseError;
use crate::store::DataContext;
use crate::store::query::{Key, USER_FEEDBACK};
use crate::store::row::{self, RowReader};

pub struct FeedbackService<'a> {
    ctx: &'a DataContext,
}

impl<'a> FeedbackService<'a> {
    pub fn new(ctx: &'a DataContext) -> Self {
        Self { ctx }
    }

    /// Active feedback for a message, oldest submission first.
    pub async fn get_feedback_by_message(
        &self,
        message_id: Uuid,
    ) -> Result<Vec<UserFeedbackDto>, DatabaseError> {
        let sql = format!(
            "{} ORDER BY f.submitted_at, f.id",
            USER_FEEDBACK.select_active("f", &[], Some("f.message_id = ?1"))
        );
        let feedback = self
            .ctx
            .query_all(
                "get_feedback_by_message",
                &sql,
                vec![row::uuid(&message_id)],
                read_feedback,
            )
            .await?;
        Ok(feedback.iter().map(UserFeedbackDto::from).collect())
    }

    pub async fn get_feedback(&self, id: i64) -> Result<Option<UserFeedbackDto>, DatabaseError> {
        let sql = USER_FEEDBACK.select_active("f", &[], Some("f.id = ?1"));
        let found = self
            .ctx
            .query_one("get_feedback", &sql, vec![row::int(id)], read_feedback)
            .await?;
        Ok(found.as_ref().map(UserFeedbackDto::from))
    }

    pub async fn submit_feedback(&self, dto: &UserFeedbackDto) -> Result<i64, DatabaseError> {
        let feedback = UserFeedback::from(dto);
        let id = self
            .ctx
            .insert("submit_feedback", &USER_FEEDBACK, feedback_params(&feedback))
            .await?;
        debug!(
            id,
            message_id = %feedback.message_id,
            rating = feedback.rating,
            "Feedback inserted into DB"
        );
        Ok(id)
    }

    pub async fn delete_feedback(
        &self,
        id: i64,
        deleted_by: Option<&str>,
    ) -> Result<WriteOutcome, DatabaseError> {
        self.ctx
            .soft_delete(&USER_FEEDBACK, Key::Int(id), deleted_by)
            .await
    }
}

fn read_feedback(r: &mut RowReader<'_>) -> Result<UserFeedback, DatabaseError> {
    Ok(UserFeedback {
        id: r.int()?,
        message_id: r.uuid()?,
        rating: r.int32()?,
        feedback_type: r.opt_text()?,
        comments: r.opt_text()?,
        feedback_source: r.opt_text()?,
        submitted_by: r.opt_text()?,
        submitted_at: r.timestamp()?,
        audit: r.audit()?,
    })
}

fn feedback_params(f: &UserFeedback) -> Vec<Value> {
    let mut params = vec![
        row::rowid(f.id),
        row::uuid(&f.message_id),
        row::int(f.rating),
        row::opt_text(f.feedback_type.as_deref()),
        row::opt_text(f.comments.as_deref()),
        row::opt_text(f.feedback_source.as_deref()),
        row::opt_text(f.submitted_by.as_deref()),
        row::timestamp(&f.submitted_at),
    ];
    params.extend(row::audit(&f.audit));
    params
}
