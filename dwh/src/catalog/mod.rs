//! Statement catalog for the star schema.
//!
//! [`StatementCatalog`] holds the four ordered statement lists the runners execute. It is built
//! once from a [`CatalogConfig`] and never reads global state or the filesystem.

mod copy;
mod dependency;
mod insert;
pub mod table;
pub mod tables;

use std::fmt;

use dwh_config::shared::{DwhConfig, InsertOrder, SqlDialect};
use dwh_postgres::schema::TableName;

pub use copy::{CopySource, JsonFormat, copy_sources};
pub use dependency::DependencyGraph;
pub use table::{ColumnDefinition, DataType, ForeignKey, TableDefinition, TableRole};

use crate::error::DwhResult;

/// Values the catalog is rendered with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    pub iam_role_arn: String,
    pub log_data: String,
    pub log_jsonpath: String,
    pub song_data: String,
    pub region: String,
    pub dialect: SqlDialect,
    pub insert_order: InsertOrder,
}

impl From<&DwhConfig> for CatalogConfig {
    fn from(config: &DwhConfig) -> Self {
        CatalogConfig {
            iam_role_arn: config.iam_role.arn.clone(),
            log_data: config.s3.log_data.clone(),
            log_jsonpath: config.s3.log_jsonpath.clone(),
            song_data: config.s3.song_data.clone(),
            region: config.s3.region.clone(),
            dialect: config.run.dialect,
            insert_order: config.run.insert_order,
        }
    }
}

/// Phase a statement belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Drop,
    Create,
    Copy,
    Insert,
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatementKind::Drop => f.write_str("drop"),
            StatementKind::Create => f.write_str("create"),
            StatementKind::Copy => f.write_str("copy"),
            StatementKind::Insert => f.write_str("insert"),
        }
    }
}

/// A single SQL statement targeting one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    kind: StatementKind,
    table: TableName,
    sql: String,
}

impl Statement {
    pub fn new(kind: StatementKind, table: impl Into<TableName>, sql: impl Into<String>) -> Self {
        Self {
            kind,
            table: table.into(),
            sql: sql.into(),
        }
    }

    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    pub fn table(&self) -> &TableName {
        &self.table
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }
}

/// An insert that populates `table` before `referenced`, a table it has a foreign key to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertOrderHazard {
    pub table: TableName,
    pub referenced: TableName,
}

impl fmt::Display for InsertOrderHazard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "`{}` is populated before `{}`, which it references",
            self.table, self.referenced
        )
    }
}

/// The ordered drop, create, copy and insert statements.
#[derive(Debug, Clone)]
pub struct StatementCatalog {
    drop: Vec<Statement>,
    create: Vec<Statement>,
    copy: Vec<Statement>,
    insert: Vec<Statement>,
    hazards: Vec<InsertOrderHazard>,
}

impl StatementCatalog {
    /// Builds the catalog for the star schema.
    pub fn build(config: &CatalogConfig) -> DwhResult<StatementCatalog> {
        Self::build_for_tables(config, &tables::star_schema())
    }

    fn build_for_tables(
        config: &CatalogConfig,
        definitions: &[TableDefinition],
    ) -> DwhResult<StatementCatalog> {
        let graph = DependencyGraph::from_tables(definitions)?;
        let definition = |name: &TableName| definitions.iter().find(|d| &d.name == name);

        let drop = graph
            .drop_order()?
            .iter()
            .filter_map(definition)
            .map(|d| Statement::new(StatementKind::Drop, d.name.clone(), d.drop_sql()))
            .collect();

        let create_order = graph.create_order()?;
        let create = create_order
            .iter()
            .filter_map(definition)
            .map(|d| {
                Statement::new(
                    StatementKind::Create,
                    d.name.clone(),
                    d.create_sql(config.dialect),
                )
            })
            .collect();

        let mut insert: Vec<Statement> = insert::declared_inserts()
            .into_iter()
            .map(|(table, sql)| Statement::new(StatementKind::Insert, table, sql))
            .collect();

        if config.insert_order == InsertOrder::Dependency {
            let position = |table: &TableName| create_order.iter().position(|t| t == table);
            insert.sort_by_key(|statement| position(statement.table()));
        }

        let hazards = find_insert_hazards(&graph, &insert);

        Ok(StatementCatalog {
            drop,
            create,
            copy: copy::copy_statements(config),
            insert,
            hazards,
        })
    }

    pub fn drop_statements(&self) -> &[Statement] {
        &self.drop
    }

    pub fn create_statements(&self) -> &[Statement] {
        &self.create
    }

    pub fn copy_statements(&self) -> &[Statement] {
        &self.copy
    }

    pub fn insert_statements(&self) -> &[Statement] {
        &self.insert
    }

    /// Returns the inserts that run before a table they reference has been populated.
    ///
    /// The order is reported, not corrected. Set the insert order to `dependency` to avoid it.
    pub fn insert_order_hazards(&self) -> &[InsertOrderHazard] {
        &self.hazards
    }
}

fn find_insert_hazards(graph: &DependencyGraph, inserts: &[Statement]) -> Vec<InsertOrderHazard> {
    let mut hazards = Vec::new();
    for (index, statement) in inserts.iter().enumerate() {
        for later in &inserts[index + 1..] {
            if graph.references(statement.table(), later.table()) {
                hazards.push(InsertOrderHazard {
                    table: statement.table().clone(),
                    referenced: later.table().clone(),
                });
            }
        }
    }

    hazards
}
