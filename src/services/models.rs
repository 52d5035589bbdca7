//! Model registry access.

use libsql::Value;
use tracing::debug;

use crate::audit::WriteOutcome;
use crate::dto::GenAiModelDto;
use crate::entities::GenAiModel;
use crate::error::DatabaseError;
use crate::store::DataContext;
use crate::store::query::{Key, MODELS};
use crate::store::row::{self, RowReader};

pub struct ModelService<'a> {
    ctx: &'a DataContext,
}

impl<'a> ModelService<'a> {
    pub fn new(ctx: &'a DataContext) -> Self {
        Self { ctx }
    }

    /// All active models, by id.
    pub async fn list_models(&self) -> Result<Vec<GenAiModelDto>, DatabaseError> {
        let sql = format!("{} ORDER BY m.id", MODELS.select_active("m", &[], None));
        let models = self
            .ctx
            .query_all("list_models", &sql, Vec::new(), read_model)
            .await?;
        Ok(models.iter().map(GenAiModelDto::from).collect())
    }

    pub async fn get_model(&self, id: i64) -> Result<Option<GenAiModelDto>, DatabaseError> {
        let sql = MODELS.select_active("m", &[], Some("m.id = ?1"));
        let model = self
            .ctx
            .query_one("get_model", &sql, vec![row::int(id)], read_model)
            .await?;
        Ok(model.as_ref().map(GenAiModelDto::from))
    }

    /// Insert a model. An `id` of 0 gets the next identity.
    pub async fn add_model(&self, dto: &GenAiModelDto) -> Result<i64, DatabaseError> {
        let model = GenAiModel::from(dto);
        let id = self
            .ctx
            .insert("add_model", &MODELS, model_params(&model))
            .await?;
        debug!(id, name = %model.name, "Model inserted into DB");
        Ok(id)
    }

    pub async fn delete_model(
        &self,
        id: i64,
        deleted_by: Option<&str>,
    ) -> Result<WriteOutcome, DatabaseError> {
        self.ctx.soft_delete(&MODELS, Key::Int(id), deleted_by).await
    }
}

pub(crate) fn read_model(r: &mut RowReader<'_>) -> Result<GenAiModel, DatabaseError> {
    Ok(GenAiModel {
        id: r.int()?,
        name: r.text()?,
        provider: r.opt_text()?,
        version: r.opt_text()?,
        license: r.opt_text()?,
        is_active: r.flag()?,
        audit: r.audit()?,
    })
}

fn model_params(m: &GenAiModel) -> Vec<Value> {
    let mut params = vec![
        row::rowid(m.id),
        row::text(&m.name),
        row::opt_text(m.provider.as_deref()),
        row::opt_text(m.version.as_deref()),
        row::opt_text(m.license.as_deref()),
        row::flag(m.is_active),
    ];
    params.extend(row::audit(&m.audit));
    params
}
