// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::config::Dialect;

/// Maximum length of the `level` column.
pub const LEVEL_MAX_LEN: usize = 5;

/// Maximum length of the `ip_address` column.
pub const IP_ADDRESS_MAX_LEN: usize = 15;

/// Maximum length of the `session_id` column.
pub const SESSION_ID_MAX_LEN: usize = 24;

/// Maximum length of the `host` column.
pub const HOST_MAX_LEN: usize = 255;

/// SQL type of a column, rendered differently per dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// Auto incrementing integer primary key.
    Id,

    /// String with a maximum length.
    VarChar(usize),

    /// Unbounded text.
    Text,

    /// Point in time with millisecond precision.
    Timestamp,
}

impl ColumnType {
    fn sql(&self, dialect: Dialect) -> String {
        match (self, dialect) {
            (ColumnType::Id, Dialect::Sqlite) => "INTEGER PRIMARY KEY AUTOINCREMENT".into(),
            (ColumnType::Id, Dialect::Postgres) => "BIGSERIAL PRIMARY KEY".into(),
            (ColumnType::Id, Dialect::Mysql) => "BIGINT AUTO_INCREMENT PRIMARY KEY".into(),
            (ColumnType::VarChar(len), _) => format!("VARCHAR({})", len),
            (ColumnType::Text, _) => "TEXT".into(),
            // SQLite has no dedicated type, timestamps are stored as sortable text
            (ColumnType::Timestamp, Dialect::Sqlite) => "TEXT".into(),
            (ColumnType::Timestamp, Dialect::Postgres) => "TIMESTAMP".into(),
            (ColumnType::Timestamp, Dialect::Mysql) => "DATETIME(3)".into(),
        }
    }
}

/// Column of the log table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    /// Column name.
    pub name: &'static str,

    /// SQL type.
    pub column_type: ColumnType,

    /// Whether the column accepts NULL.
    pub nullable: bool,
}

const fn column(name: &'static str, column_type: ColumnType, nullable: bool) -> Column {
    Column {
        name,
        column_type,
        nullable,
    }
}

/// All columns of the log table in declaration order.
pub const COLUMNS: [Column; 12] = [
    column("id", ColumnType::Id, false),
    column("level", ColumnType::VarChar(LEVEL_MAX_LEN), false),
    column("msg", ColumnType::Text, false),
    column("meta", ColumnType::Text, true),
    column("created_at", ColumnType::Timestamp, false),
    column("ip_address", ColumnType::VarChar(IP_ADDRESS_MAX_LEN), true),
    column("session_id", ColumnType::VarChar(SESSION_ID_MAX_LEN), true),
    column("route", ColumnType::Text, true),
    column("query", ColumnType::Text, true),
    column("body", ColumnType::Text, true),
    column("host", ColumnType::VarChar(HOST_MAX_LEN), true),
    column("url", ColumnType::Text, true),
];

/// Columns every insert binds, in this order, before any of the optional ones.
pub const REQUIRED_INSERT_COLUMNS: [&str; 3] = ["level", "msg", "created_at"];

/// Table log records are persisted in, knows how to render its statements for a dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    name: String,
    dialect: Dialect,
}

impl TableSchema {
    /// Schema of the log table with the given name.
    ///
    /// The name is expected to be validated already, see `Configuration::validate`.
    pub fn new(name: &str, dialect: Dialect) -> Self {
        Self {
            name: name.to_owned(),
            dialect,
        }
    }

    /// Name of the table.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Database dialect statements are rendered for.
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Columns of the table.
    pub fn columns(&self) -> &'static [Column] {
        &COLUMNS
    }

    /// Statement declaring the table, does nothing when it exists already.
    pub fn create_table_sql(&self) -> String {
        let columns: Vec<String> = self
            .columns()
            .iter()
            .map(|column| {
                let mut definition = format!(
                    "{} {}",
                    self.quote(column.name),
                    column.column_type.sql(self.dialect)
                );

                if !column.nullable && column.column_type != ColumnType::Id {
                    definition.push_str(" NOT NULL");
                }

                definition
            })
            .collect();

        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            self.quote(&self.name),
            columns.join(", ")
        )
    }

    /// Statement inserting one row.
    ///
    /// Binds the required columns first, followed by the given optional columns. On PostgreSQL the
    /// statement returns the assigned id, the other dialects report it through the query result.
    pub fn insert_sql(&self, optional_columns: &[&str]) -> String {
        let names: Vec<&str> = REQUIRED_INSERT_COLUMNS
            .iter()
            .chain(optional_columns.iter())
            .copied()
            .collect();

        let columns: Vec<String> = names.iter().map(|name| self.quote(name)).collect();

        let values: Vec<String> = names
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let placeholder = self.placeholder(index + 1);

                if *name == "created_at" {
                    self.timestamp_value(&placeholder)
                } else {
                    placeholder
                }
            })
            .collect();

        let mut sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.quote(&self.name),
            columns.join(", "),
            values.join(", ")
        );

        if self.dialect == Dialect::Postgres {
            sql.push_str(" RETURNING \"id\"");
        }

        sql
    }

    fn quote(&self, identifier: &str) -> String {
        match self.dialect {
            Dialect::Mysql => format!("`{}`", identifier),
            Dialect::Postgres | Dialect::Sqlite => format!("\"{}\"", identifier),
        }
    }

    fn placeholder(&self, position: usize) -> String {
        match self.dialect {
            Dialect::Mysql => "?".into(),
            Dialect::Postgres | Dialect::Sqlite => format!("${}", position),
        }
    }

    fn timestamp_value(&self, placeholder: &str) -> String {
        match self.dialect {
            Dialect::Sqlite => placeholder.to_owned(),
            Dialect::Postgres => format!("CAST({} AS TIMESTAMP)", placeholder),
            Dialect::Mysql => format!("CAST({} AS DATETIME(3))", placeholder),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use crate::config::Dialect;

    use super::TableSchema;

    #[test]
    fn create_table_sqlite() {
        let schema = TableSchema::new("log", Dialect::Sqlite);

        assert_eq!(
            schema.create_table_sql(),
            "CREATE TABLE IF NOT EXISTS \"log\" (\
            \"id\" INTEGER PRIMARY KEY AUTOINCREMENT, \
            \"level\" VARCHAR(5) NOT NULL, \
            \"msg\" TEXT NOT NULL, \
            \"meta\" TEXT, \
            \"created_at\" TEXT NOT NULL, \
            \"ip_address\" VARCHAR(15), \
            \"session_id\" VARCHAR(24), \
            \"route\" TEXT, \
            \"query\" TEXT, \
            \"body\" TEXT, \
            \"host\" VARCHAR(255), \
            \"url\" TEXT)"
        );
    }

    #[rstest]
    #[case(Dialect::Postgres, "\"id\" BIGSERIAL PRIMARY KEY", "\"created_at\" TIMESTAMP NOT NULL")]
    #[case(
        Dialect::Mysql,
        "`id` BIGINT AUTO_INCREMENT PRIMARY KEY",
        "`created_at` DATETIME(3) NOT NULL"
    )]
    fn create_table_per_dialect(
        #[case] dialect: Dialect,
        #[case] id_column: &str,
        #[case] created_at_column: &str,
    ) {
        let sql = TableSchema::new("app_log", dialect).create_table_sql();

        assert!(sql.contains(id_column));
        assert!(sql.contains(created_at_column));
        assert!(!sql.contains("\"id\" BIGSERIAL PRIMARY KEY NOT NULL"));
    }

    #[test]
    fn insert_all_columns_postgres() {
        let schema = TableSchema::new("log", Dialect::Postgres);

        assert_eq!(
            schema.insert_sql(&["meta", "ip_address"]),
            "INSERT INTO \"log\" (\"level\", \"msg\", \"created_at\", \"meta\", \"ip_address\") \
            VALUES ($1, $2, CAST($3 AS TIMESTAMP), $4, $5) RETURNING \"id\""
        );
    }

    #[test]
    fn insert_mysql() {
        let schema = TableSchema::new("log", Dialect::Mysql);

        assert_eq!(
            schema.insert_sql(&["url"]),
            "INSERT INTO `log` (`level`, `msg`, `created_at`, `url`) \
            VALUES (?, ?, CAST(? AS DATETIME(3)), ?)"
        );
    }

    #[test]
    fn insert_required_only_sqlite() {
        let schema = TableSchema::new("log", Dialect::Sqlite);

        assert_eq!(
            schema.insert_sql(&[]),
            "INSERT INTO \"log\" (\"level\", \"msg\", \"created_at\") VALUES ($1, $2, $3)"
        );
    }
}
