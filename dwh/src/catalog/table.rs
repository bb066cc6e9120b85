use std::fmt;

use dwh_config::shared::SqlDialect;
use dwh_postgres::schema::{TableName, quote_column};

/// Column types used by the warehouse tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    /// Variable length text, with an optional maximum length.
    Varchar(Option<u16>),
    SmallInt,
    Int,
    BigInt,
    Float,
    Decimal,
    Timestamp,
    Boolean,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Varchar(Some(length)) => write!(f, "VARCHAR({length})"),
            DataType::Varchar(None) => f.write_str("VARCHAR"),
            DataType::SmallInt => f.write_str("SMALLINT"),
            DataType::Int => f.write_str("INT"),
            DataType::BigInt => f.write_str("BIGINT"),
            DataType::Float => f.write_str("FLOAT"),
            DataType::Decimal => f.write_str("DECIMAL"),
            DataType::Timestamp => f.write_str("TIMESTAMP"),
            DataType::Boolean => f.write_str("BOOLEAN"),
        }
    }
}

/// Role a table plays in the star schema.
///
/// The ordering of the variants is the order in which tables are dropped when the dependency graph
/// leaves a choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TableRole {
    Staging,
    Fact,
    Dimension,
}

impl fmt::Display for TableRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableRole::Staging => f.write_str("staging"),
            TableRole::Fact => f.write_str("fact"),
            TableRole::Dimension => f.write_str("dimension"),
        }
    }
}

/// A foreign key from a column to a column of another table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub table: TableName,
    pub column: String,
}

/// Definition of a single column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
    pub primary_key: bool,
    /// Auto generated, starting at zero and incremented by one.
    pub identity: bool,
    pub dist_key: bool,
    pub sort_key: bool,
    pub references: Option<ForeignKey>,
}

impl ColumnDefinition {
    /// Creates a nullable column without constraints.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
            primary_key: false,
            identity: false,
            dist_key: false,
            sort_key: false,
            references: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Marks the column as the primary key, which also makes it non-nullable.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    pub fn identity(mut self) -> Self {
        self.identity = true;
        self
    }

    pub fn dist_key(mut self) -> Self {
        self.dist_key = true;
        self
    }

    pub fn sort_key(mut self) -> Self {
        self.sort_key = true;
        self
    }

    /// Adds a foreign key to the column of the same name in `table`.
    pub fn references(mut self, table: impl Into<TableName>) -> Self {
        self.references = Some(ForeignKey {
            table: table.into(),
            column: self.name.clone(),
        });
        self
    }

    /// Renders the column as it appears inside `CREATE TABLE`.
    fn render(&self, dialect: SqlDialect) -> String {
        let mut sql = format!("{} {}", quote_column(&self.name), self.data_type);

        if self.identity {
            match dialect {
                SqlDialect::Redshift => sql.push_str(" IDENTITY(0,1)"),
                SqlDialect::Postgres => {
                    sql.push_str(" GENERATED BY DEFAULT AS IDENTITY (START WITH 0 MINVALUE 0)")
                }
            }
        }

        // Distribution and sort keys only exist on Redshift and must precede the constraints.
        if dialect == SqlDialect::Redshift {
            if self.dist_key {
                sql.push_str(" DISTKEY");
            }
            if self.sort_key {
                sql.push_str(" SORTKEY");
            }
        }

        if self.primary_key {
            sql.push_str(" PRIMARY KEY");
        } else if !self.nullable {
            sql.push_str(" NOT NULL");
        }

        if let Some(foreign_key) = &self.references {
            sql.push_str(&format!(
                " REFERENCES {} ({})",
                foreign_key.table.as_quoted_identifier(),
                quote_column(&foreign_key.column)
            ));
            if dialect == SqlDialect::Postgres {
                sql.push_str(" DEFERRABLE INITIALLY DEFERRED");
            }
        }

        sql
    }
}

/// Definition of a warehouse table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDefinition {
    pub name: TableName,
    pub role: TableRole,
    pub columns: Vec<ColumnDefinition>,
}

impl TableDefinition {
    pub fn new(
        name: impl Into<TableName>,
        role: TableRole,
        columns: Vec<ColumnDefinition>,
    ) -> Self {
        Self {
            name: name.into(),
            role,
            columns,
        }
    }

    /// Returns the distinct tables this table has foreign keys to, in column order.
    pub fn referenced_tables(&self) -> Vec<&TableName> {
        let mut referenced: Vec<&TableName> = Vec::new();
        for foreign_key in self.columns.iter().filter_map(|c| c.references.as_ref()) {
            if !referenced.contains(&&foreign_key.table) {
                referenced.push(&foreign_key.table);
            }
        }

        referenced
    }

    /// Returns the column names in declaration order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|column| column.name.as_str())
    }

    pub fn drop_sql(&self) -> String {
        format!("DROP TABLE IF EXISTS {}", self.name.as_quoted_identifier())
    }

    pub fn create_sql(&self, dialect: SqlDialect) -> String {
        let columns = self
            .columns
            .iter()
            .map(|column| format!("    {}", column.render(dialect)))
            .collect::<Vec<_>>()
            .join(",\n");

        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n{}\n)",
            self.name.as_quoted_identifier(),
            columns
        )
    }
}
