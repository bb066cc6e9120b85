use dwh_postgres::schema::{TableName, quote_value};

use crate::catalog::tables::{STAGING_EVENTS, STAGING_SONGS};
use crate::catalog::{CatalogConfig, Statement, StatementKind};

/// How the warehouse maps JSON documents to staging columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonFormat {
    /// Match JSON keys to column names.
    Auto,
    /// Use the JSONPaths file at the given object storage URI.
    JsonPaths(String),
}

/// A bulk copy of JSON documents from object storage into a staging table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopySource {
    pub table: TableName,
    pub source_uri: String,
    pub format: JsonFormat,
}

impl CopySource {
    /// Renders the warehouse-native `COPY` for this source.
    pub fn to_sql(&self, iam_role_arn: &str, region: &str) -> String {
        let format = match &self.format {
            JsonFormat::Auto => quote_value("auto"),
            JsonFormat::JsonPaths(uri) => quote_value(uri),
        };

        format!(
            "COPY {}\nFROM {}\nCREDENTIALS {}\nREGION {}\nFORMAT AS JSON {}",
            self.table.as_quoted_identifier(),
            quote_value(&self.source_uri),
            quote_value(&format!("aws_iam_role={iam_role_arn}")),
            quote_value(region),
            format
        )
    }
}

/// Returns the sources for both staging tables, events first.
pub fn copy_sources(config: &CatalogConfig) -> Vec<CopySource> {
    vec![
        CopySource {
            table: STAGING_EVENTS.into(),
            source_uri: config.log_data.clone(),
            format: JsonFormat::JsonPaths(config.log_jsonpath.clone()),
        },
        CopySource {
            table: STAGING_SONGS.into(),
            source_uri: config.song_data.clone(),
            format: JsonFormat::Auto,
        },
    ]
}

pub(crate) fn copy_statements(config: &CatalogConfig) -> Vec<Statement> {
    copy_sources(config)
        .into_iter()
        .map(|source| {
            let sql = source.to_sql(&config.iam_role_arn, &config.region);
            Statement::new(StatementKind::Copy, source.table, sql)
        })
        .collect()
}
