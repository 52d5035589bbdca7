//! Table catalog and the soft-delete visibility predicate.
//!
//! Every read goes through [`active`] so a soft-deleted row can't leak out
//! of a query that forgot its filter.

use libsql::Value;
use uuid::Uuid;

/// A table and its columns in read/write order. The audit columns are
/// always the last five.
pub(crate) struct Table {
    pub name: &'static str,
    pub columns: &'static [&'static str],
}

impl Table {
    /// `alias.col, alias.col, ...`
    pub(crate) fn select_list(&self, alias: &str) -> String {
        self.columns
            .iter()
            .map(|c| format!("{alias}.{c}"))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `SELECT <columns> FROM <table> <alias>` with `joins` appended and the
    /// root rows restricted to active ones plus `filter`.
    pub(crate) fn select_active(&self, alias: &str, joins: &[Join<'_>], filter: Option<&str>) -> String {
        let mut select = self.select_list(alias);
        let mut from = format!("{} {alias}", self.name);
        for join in joins {
            select.push_str(", ");
            select.push_str(&join.table.select_list(join.alias));
            from.push_str(&format!(
                " LEFT JOIN {} {} ON {}.id = {alias}.{}",
                join.table.name, join.alias, join.alias, join.foreign_key
            ));
        }
        let mut sql = format!("SELECT {select} FROM {from} WHERE {}", active(alias));
        if let Some(filter) = filter {
            sql.push_str(" AND ");
            sql.push_str(filter);
        }
        sql
    }

    pub(crate) fn insert(&self) -> String {
        let placeholders = (1..=self.columns.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "INSERT INTO {} ({}) VALUES ({placeholders})",
            self.name,
            self.columns.join(", ")
        )
    }
}

/// One level of eager loading: `LEFT JOIN table alias ON alias.id = root.foreign_key`.
///
/// The joined row is loaded whatever its own soft-delete state.
pub(crate) struct Join<'a> {
    pub table: &'a Table,
    pub alias: &'a str,
    pub foreign_key: &'a str,
}

/// The visibility predicate for rows of `alias`.
pub(crate) fn active(alias: &str) -> String {
    format!("{alias}.is_deleted = 0")
}

/// Primary key of a row, integer or UUID.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Key {
    Int(i64),
    Uuid(Uuid),
}

impl From<Key> for Value {
    fn from(key: Key) -> Self {
        match key {
            Key::Int(id) => Value::Integer(id),
            Key::Uuid(id) => Value::Text(id.to_string()),
        }
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{id}"),
            Self::Uuid(id) => write!(f, "{id}"),
        }
    }
}

pub(crate) const MODELS: Table = Table {
    name: "genai_models",
    columns: &[
        "id", "name", "provider", "version", "license", "is_active",
        "created_by", "created_at", "modified_by", "modified_at", "is_deleted",
    ],
};

pub(crate) const CONVERSATION_TYPES: Table = Table {
    name: "conversation_types",
    columns: &[
        "id", "name", "default_system_prompt", "version", "is_active", "risk_level",
        "use_case_category",
        "created_by", "created_at", "modified_by", "modified_at", "is_deleted",
    ],
};

pub(crate) const CONVERSATIONS: Table = Table {
    name: "conversations",
    columns: &[
        "id", "user_id", "conversation_type_id", "started_at",
        "created_by", "created_at", "modified_by", "modified_at", "is_deleted",
    ],
};

pub(crate) const PROMPT_OVERRIDES: Table = Table {
    name: "system_prompt_overrides",
    columns: &[
        "id", "conversation_id", "overridden_prompt", "prompt_type", "reason_for_override",
        "version", "set_at",
        "created_by", "created_at", "modified_by", "modified_at", "is_deleted",
    ],
};

pub(crate) const MESSAGES: Table = Table {
    name: "messages",
    columns: &[
        "id", "conversation_id", "sender", "message_sequence", "content",
        "relevance_percentage", "model_id", "was_decision_made", "requires_human_review",
        "is_final_output",
        "created_by", "created_at", "modified_by", "modified_at", "is_deleted",
    ],
};

pub(crate) const CITATIONS: Table = Table {
    name: "citations",
    columns: &[
        "id", "message_id", "source_url", "description",
        "created_by", "created_at", "modified_by", "modified_at", "is_deleted",
    ],
};

pub(crate) const USER_FEEDBACK: Table = Table {
    name: "user_feedback",
    columns: &[
        "id", "message_id", "rating", "feedback_type", "comments", "feedback_source",
        "submitted_by", "submitted_at",
        "created_by", "created_at", "modified_by", "modified_at", "is_deleted",
    ],
};

/// All audited tables, in dependency order.
pub(crate) const ALL_TABLES: [&Table; 7] = [
    &MODELS,
    &CONVERSATION_TYPES,
    &CONVERSATIONS,
    &PROMPT_OVERRIDES,
    &MESSAGES,
    &CITATIONS,
    &USER_FEEDBACK,
];
