//! Source citations attached to messages.

use libsql::Value;
use tracing::debug;
use uuid::Uuid;

use crate::audit::WriteOutcome;
use crate::dto::CitationDto;
use crate::entities::Citation;
use crate::error::DatabaseError;
use crate::store::DataContext;
use crate::store::query::{CITATIONS, Key};
use crate::store::row::{self, RowReader};

pub struct CitationService<'a> {
    ctx: &'a DataContext,
}

impl<'a> CitationService<'a> {
    pub fn new(ctx: &'a DataContext) -> Self {
        Self { ctx }
    }

    pub async fn get_citations_by_message(
        &self,
        message_id: Uuid,
    ) -> Result<Vec<CitationDto>, DatabaseError> {
        let sql = format!(
            "{} ORDER BY ci.id",
            CITATIONS.select_active("ci", &[], Some("ci.message_id = ?1"))
        );
        let citations = self
            .ctx
            .query_all(
                "get_citations_by_message",
                &sql,
                vec![row::uuid(&message_id)],
                read_citation,
            )
            .await?;
        Ok(citations.iter().map(CitationDto::from).collect())
    }

    pub async fn get_citation(&self, id: i64) -> Result<Option<CitationDto>, DatabaseError> {
        let sql = CITATIONS.select_active("ci", &[], Some("ci.id = ?1"));
        let found = self
            .ctx
            .query_one("get_citation", &sql, vec![row::int(id)], read_citation)
            .await?;
        Ok(found.as_ref().map(CitationDto::from))
    }

    pub async fn add_citation(&self, dto: &CitationDto) -> Result<i64, DatabaseError> {
        let citation = Citation::from(dto);
        let id = self
            .ctx
            .insert("add_citation", &CITATIONS, citation_params(&citation))
            .await?;
        debug!(id, message_id = %citation.message_id, "Citation inserted into DB");
        Ok(id)
    }

    pub async fn delete_citation(
        &self,
        id: i64,
        deleted_by: Option<&str>,
    ) -> Result<WriteOutcome, DatabaseError> {
        self.ctx
            .soft_delete(&CITATIONS, Key::Int(id), deleted_by)
            .await
    }
}

fn read_citation(r: &mut RowReader<'_>) -> Result<Citation, DatabaseError> {
    Ok(Citation {
        id: r.int()?,
        message_id: r.uuid()?,
        source_url: r.text()?,
        description: r.opt_text()?,
        audit: r.audit()?,
    })
}

fn citation_params(c: &Citation) -> Vec<Value> {
    let mut params = vec![
        row::rowid(c.id),
        row::uuid(&c.message_id),
        row::text(&c.source_url),
        row::opt_text(c.description.as_deref()),
    ];
    params.extend(row::audit(&c.audit));
    params
}
