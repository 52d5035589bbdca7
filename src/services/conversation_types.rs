//! Conversation type catalog access.

use libsql::Value;
use tracing::debug;

use crate::audit::WriteOutcome;
use crate::dto::ConversationTypeDto;
use crate::entities::ConversationType;
use crate::error::DatabaseError;
use crate::store::DataContext;
use crate::store::query::{CONVERSATION_TYPES, Key};
use crate::store::row::{self, RowReader};

pub struct ConversationTypeService<'a> {
    ctx: &'a DataContext,
}

impl<'a> ConversationTypeService<'a> {
    pub fn new(ctx: &'a DataContext) -> Self {
        Self { ctx }
    }

    pub async fn list_conversation_types(&self) -> Result<Vec<ConversationTypeDto>, DatabaseError> {
        let sql = format!(
            "{} ORDER BY t.name, t.id",
            CONVERSATION_TYPES.select_active("t", &[], None)
        );
        let types = self
            .ctx
            .query_all("list_conversation_types", &sql, Vec::new(), read_conversation_type)
            .await?;
        Ok(types.iter().map(ConversationTypeDto::from).collect())
    }

    pub async fn get_conversation_type(
        &self,
        id: i64,
    ) -> Result<Option<ConversationTypeDto>, DatabaseError> {
        let sql = CONVERSATION_TYPES.select_active("t", &[], Some("t.id = ?1"));
        let found = self
            .ctx
            .query_one("get_conversation_type", &sql, vec![row::int(id)], read_conversation_type)
            .await?;
        Ok(found.as_ref().map(ConversationTypeDto::from))
    }

    pub async fn add_conversation_type(
        &self,
        dto: &ConversationTypeDto,
    ) -> Result<i64, DatabaseError> {
        let conversation_type = ConversationType::from(dto);
        let id = self
            .ctx
            .insert(
                "add_conversation_type",
                &CONVERSATION_TYPES,
                conversation_type_params(&conversation_type),
            )
            .await?;
        debug!(id, name = %conversation_type.name, "Conversation type inserted into DB");
        Ok(id)
    }

    pub async fn delete_conversation_type(
        &self,
        id: i64,
        deleted_by: Option<&str>,
    ) -> Result<WriteOutcome, DatabaseError> {
        self.ctx
            .soft_delete(&CONVERSATION_TYPES, Key::Int(id), deleted_by)
            .await
    }
}

pub(crate) fn read_conversation_type(
    r: &mut RowReader<'_>,
) -> Result<ConversationType, DatabaseError> {
    Ok(ConversationType {
        id: r.int()?,
        name: r.text()?,
        default_system_prompt: r.text()?,
        version: r.int32()?,
        is_active: r.flag()?,
        risk_level: r.opt_parsed()?,
        use_case_category: r.opt_text()?,
        audit: r.audit()?,
    })
}

fn conversation_type_params(t: &ConversationType) -> Vec<Value> {
    let risk_level = t.risk_level.map(|level| level.to_string());
    let mut params = vec![
        row::rowid(t.id),
        row::text(&t.name),
        row::text(&t.default_system_prompt),
        row::int(t.version),
        row::flag(t.is_active),
        row::opt_text(risk_level.as_deref()),
        row::opt_text(t.use_case_category.as_deref()),
    ];
    params.extend(row::audit(&t.audit));
    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::Audit;
    use crate::entities::RiskLevel;

    fn dto(name: &str, risk_level: Option<RiskLevel>) -> ConversationTypeDto {
        ConversationTypeDto {
            name: name.into(),
            default_system_prompt: format!("You are the {name} assistant."),
            version: 1,
            is_active: true,
            risk_level,
            use_case_category: Some("support".into()),
            audit: Audit::new(Some("admin")),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn stores_risk_level_and_optional_fields() {
        let ctx = DataContext::new_memory().await.unwrap();
        let svc = ConversationTypeService::new(&ctx);

        let high = svc
            .add_conversation_type(&dto("Claims", Some(RiskLevel::High)))
            .await
            .unwrap();
        let unrated = svc.add_conversation_type(&dto("Chit-chat", None)).await.unwrap();

        let stored = ctx
            .query_one(
                "risk_level",
                "SELECT risk_level FROM conversation_types WHERE id = ?1",
                vec![row::int(high)],
                |r| r.text(),
            )
            .await
            .unwrap()
            .unwrap();
        let high = svc.get_conversation_type(high).await.unwrap().unwrap();
        assert_eq!(high.risk_level, Some(RiskLevel::High));
        // Column text and JSON agree on the spelling.
        assert_eq!(
            serde_json::to_value(high.risk_level).unwrap(),
            serde_json::json!(stored)
        );
        assert_eq!(high.default_system_prompt, "You are the Claims assistant.");

        let unrated = svc.get_conversation_type(unrated).await.unwrap().unwrap();
        assert_eq!(unrated.risk_level, None);
    }

    #[tokio::test]
    async fn list_is_sorted_by_name_and_skips_deleted() {
        let ctx = DataContext::new_memory().await.unwrap();
        let svc = ConversationTypeService::new(&ctx);

        svc.add_conversation_type(&dto("Underwriting", Some(RiskLevel::Medium)))
            .await
            .unwrap();
        let gone = svc
            .add_conversation_type(&dto("Legacy", Some(RiskLevel::Low)))
            .await
            .unwrap();
        svc.add_conversation_type(&dto("Claims", Some(RiskLevel::High)))
            .await
            .unwrap();
        svc.delete_conversation_type(gone, None).await.unwrap();

        let names: Vec<String> = svc
            .list_conversation_types()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["Claims", "Underwriting"]);
    }

    #[tokio::test]
    async fn delete_of_unknown_type_is_not_an_error() {
        let ctx = DataContext::new_memory().await.unwrap();
        let svc = ConversationTypeService::new(&ctx);

        let outcome = svc.delete_conversation_type(404, Some("admin")).await.unwrap();
        assert_eq!(outcome, WriteOutcome::NotFound);
    }
}
