use serde::Deserialize;
use std::fmt;

/// How statements are grouped into transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitMode {
    /// Every statement runs in its own transaction and is committed right after it succeeds.
    #[default]
    PerStatement,
    /// The whole run is one transaction, rolled back on the first failure.
    SingleTransaction,
}

impl fmt::Display for CommitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommitMode::PerStatement => f.write_str("per_statement"),
            CommitMode::SingleTransaction => f.write_str("single_transaction"),
        }
    }
}

/// SQL flavor used when rendering table definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlDialect {
    #[default]
    Redshift,
    /// Plain Postgres, used to exercise the schema and transforms without a cluster.
    Postgres,
}

impl fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlDialect::Redshift => f.write_str("redshift"),
            SqlDialect::Postgres => f.write_str("postgres"),
        }
    }
}

/// Order in which the fact and dimension tables are populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertOrder {
    /// Fact table first, then dimensions.
    #[default]
    Declared,
    /// Referenced tables before the tables that reference them.
    Dependency,
}

impl fmt::Display for InsertOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsertOrder::Declared => f.write_str("declared"),
            InsertOrder::Dependency => f.write_str("dependency"),
        }
    }
}

/// The optional `[RUN]` section.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub commit_mode: CommitMode,
    pub dialect: SqlDialect,
    pub insert_order: InsertOrder,
}
