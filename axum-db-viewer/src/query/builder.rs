//! Parameterized SELECT construction
//!
//! Identifiers that reach the SQL text are quoted and have already been
//! checked against introspected metadata by the caller. Every value coming
//! from a request is bound.

use chrono::NaiveDate;
use serde_json::Value;

use crate::database::{Driver, SqlValue, Statement};
use crate::query::filter::{
    coerce_value, escape_like, has_utc_offset, value_as_text, FilterOperator,
};
use crate::query::params::SortDirection;
use crate::schema::{ColumnMetadata, SemanticType, TableName};

/// Accumulates WHERE conditions, ordering and bind values for one table
#[derive(Debug, Clone)]
pub struct SelectBuilder {
    driver: Driver,
    table: String,
    conditions: Vec<String>,
    order_by: Option<String>,
    bindings: Vec<SqlValue>,
}

impl SelectBuilder {
    pub fn new(driver: Driver, table: &TableName) -> Self {
        let table = driver.quote_identifier(table.as_str());
        Self {
            driver,
            table,
            conditions: Vec::new(),
            order_by: None,
            bindings: Vec::new(),
        }
    }

    fn bind(&mut self, value: SqlValue) -> String {
        self.bindings.push(value);
        self.driver.placeholder(self.bindings.len())
    }

    fn bind_timestamp(&mut self, value: SqlValue) -> String {
        self.bindings.push(value);
        self.driver.timestamp_placeholder(self.bindings.len())
    }

    fn bind_zoned_timestamp(&mut self, value: SqlValue) -> String {
        self.bindings.push(value);
        self.driver.zoned_timestamp_placeholder(self.bindings.len())
    }

    /// Case-insensitive substring match of `term` against any of `columns`
    ///
    /// Both sides are lowered by the database, so engines whose `LOWER` only
    /// folds ASCII still match text written the same way.
    pub fn where_search(&mut self, term: &str, columns: &[&ColumnMetadata]) {
        if columns.is_empty() {
            return;
        }

        let pattern = format!("%{}%", escape_like(term));
        let mut clauses = Vec::with_capacity(columns.len());
        for column in columns {
            let target = self
                .driver
                .text_cast(&self.driver.quote_identifier(&column.name));
            let placeholder = self.bind(SqlValue::Text(pattern.clone()));
            clauses.push(format!(
                "LOWER({}) LIKE LOWER({}) ESCAPE '!'",
                target, placeholder
            ));
        }

        self.conditions.push(format!("({})", clauses.join(" OR ")));
    }

    /// Add one advanced filter condition
    ///
    /// Returns `false`, leaving the builder untouched, when a value operator
    /// gets no value. A comparison value that doesn't fit the column type is
    /// compared against the column's text form instead.
    pub fn where_filter(
        &mut self,
        column: &ColumnMetadata,
        operator: FilterOperator,
        value: &Value,
    ) -> bool {
        let quoted = self.driver.quote_identifier(&column.name);

        let condition = match operator {
            FilterOperator::Null => format!("{} IS NULL", quoted),
            FilterOperator::NotNull => format!("{} IS NOT NULL", quoted),
            FilterOperator::Like
            | FilterOperator::NotLike
            | FilterOperator::StartsWith
            | FilterOperator::EndsWith => {
                let Some(text) = value_as_text(value) else {
                    return false;
                };
                let Some(pattern) = operator.like_pattern(&escape_like(&text)) else {
                    return false;
                };
                let keyword = if operator == FilterOperator::NotLike {
                    "NOT LIKE"
                } else {
                    "LIKE"
                };
                let target = self.driver.text_cast(&quoted);
                let placeholder = self.bind(SqlValue::Text(pattern));
                format!(
                    "LOWER({}) {} LOWER({}) ESCAPE '!'",
                    target, keyword, placeholder
                )
            }
            comparison => {
                let Some(sql_operator) = comparison.comparison_sql() else {
                    return false;
                };
                let Some(text) = value_as_text(value) else {
                    return false;
                };
                let (target, placeholder) = match coerce_value(value, column.semantic_type) {
                    Some(bound) => match column.semantic_type {
                        SemanticType::Json => (self.driver.text_cast(&quoted), self.bind(bound)),
                        SemanticType::Datetime if has_utc_offset(&text) => {
                            (quoted, self.bind_zoned_timestamp(bound))
                        }
                        SemanticType::Datetime => (quoted, self.bind_timestamp(bound)),
                        SemanticType::String => (
                            self.driver.text_comparison_operand(&quoted),
                            self.bind(bound),
                        ),
                        _ => (quoted, self.bind(bound)),
                    },
                    None => (
                        self.driver.text_cast(&quoted),
                        self.bind(SqlValue::Text(text)),
                    ),
                };
                format!("{} {} {}", target, sql_operator, placeholder)
            }
        };

        self.conditions.push(condition);
        true
    }

    /// Restrict a date/time column to whole days between `start` and `end`
    pub fn where_day_range(
        &mut self,
        column: &ColumnMetadata,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) {
        let quoted = self.driver.quote_identifier(&column.name);
        if let Some(start) = start {
            let placeholder =
                self.bind_timestamp(SqlValue::Text(start.format("%Y-%m-%d").to_string()));
            self.conditions.push(format!("{} >= {}", quoted, placeholder));
        }
        if let Some(end) = end {
            let placeholder =
                self.bind_timestamp(SqlValue::Text(end.format("%Y-%m-%d 23:59:59").to_string()));
            self.conditions.push(format!("{} <= {}", quoted, placeholder));
        }
    }

    /// Sort by a column; replaces any earlier ordering
    pub fn order_by(&mut self, column: &ColumnMetadata, direction: SortDirection) {
        self.order_by = Some(format!(
            "{} {}",
            self.driver.quote_identifier(&column.name),
            direction.as_sql()
        ));
    }

    fn where_sql(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.conditions.join(" AND "))
        }
    }

    fn order_sql(&self) -> String {
        self.order_by
            .as_ref()
            .map(|order| format!(" ORDER BY {}", order))
            .unwrap_or_default()
    }

    /// `SELECT COUNT(*)` over the filtered rows
    pub fn count_statement(&self) -> Statement {
        Statement::new(
            format!(
                "SELECT COUNT(*) AS aggregate FROM {}{}",
                self.table,
                self.where_sql()
            ),
            self.bindings.clone(),
        )
    }

    /// One page of filtered, ordered rows
    ///
    /// Values beyond `i64::MAX` are clamped to it.
    pub fn page_statement(&self, limit: u64, offset: u64) -> Statement {
        let mut bindings = self.bindings.clone();
        bindings.push(SqlValue::Int(i64::try_from(limit).unwrap_or(i64::MAX)));
        let limit_placeholder = self.driver.placeholder(bindings.len());
        bindings.push(SqlValue::Int(i64::try_from(offset).unwrap_or(i64::MAX)));
        let offset_placeholder = self.driver.placeholder(bindings.len());

        Statement::new(
            format!(
                "SELECT * FROM {}{}{} LIMIT {} OFFSET {}",
                self.table,
                self.where_sql(),
                self.order_sql(),
                limit_placeholder,
                offset_placeholder
            ),
            bindings,
        )
    }

    /// The first matching row
    pub fn first_statement(&self) -> Statement {
        Statement::new(
            format!(
                "SELECT * FROM {}{}{} LIMIT 1",
                self.table,
                self.where_sql(),
                self.order_sql()
            ),
            self.bindings.clone(),
        )
    }

    /// Row counts per calendar day of `column`, oldest day first
    pub fn day_bucket_statement(&self, column: &ColumnMetadata) -> Statement {
        let bucket = self
            .driver
            .day_bucket_expression(&self.driver.quote_identifier(&column.name));
        Statement::new(
            format!(
                "SELECT {bucket} AS group_date, COUNT(*) AS aggregate_count FROM {}{} GROUP BY {bucket} ORDER BY group_date ASC",
                self.table,
                self.where_sql(),
                bucket = bucket
            ),
            self.bindings.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn column(name: &str, semantic_type: SemanticType) -> ColumnMetadata {
        ColumnMetadata {
            name: name.to_string(),
            semantic_type,
            nullable: true,
            default_value: None,
        }
    }

    fn products() -> TableName {
        TableName::verified("products")
    }

    #[test]
    fn test_empty_builder() {
        let builder = SelectBuilder::new(Driver::Sqlite, &products());
        let count = builder.count_statement();
        assert_eq!(count.sql, "SELECT COUNT(*) AS aggregate FROM \"products\"");
        assert!(count.bindings.is_empty());

        let page = builder.page_statement(25, 50);
        assert_eq!(page.sql, "SELECT * FROM \"products\" LIMIT ? OFFSET ?");
        assert_eq!(page.bindings, vec![SqlValue::Int(25), SqlValue::Int(50)]);
    }

    #[test]
    fn test_search_binds_one_pattern_per_column() {
        let name = column("name", SemanticType::String);
        let meta = column("meta", SemanticType::Json);
        let mut builder = SelectBuilder::new(Driver::Postgres, &products());
        builder.where_search("Mac_", &[&name, &meta]);

        let count = builder.count_statement();
        assert_eq!(
            count.sql,
            "SELECT COUNT(*) AS aggregate FROM \"products\" WHERE (LOWER(CAST(\"name\" AS TEXT)) LIKE LOWER($1) ESCAPE '!' OR LOWER(CAST(\"meta\" AS TEXT)) LIKE LOWER($2) ESCAPE '!')"
        );
        assert_eq!(
            count.bindings,
            vec![
                SqlValue::Text("%Mac!_%".to_string()),
                SqlValue::Text("%Mac!_%".to_string())
            ]
        );
    }

    #[test]
    fn test_filters_and_order_numbering() {
        let price = column("price", SemanticType::Float);
        let created = column("created_at", SemanticType::Datetime);
        let mut builder = SelectBuilder::new(Driver::Postgres, &products());
        assert!(builder.where_filter(&price, FilterOperator::Gte, &json!("1000")));
        assert!(builder.where_filter(&created, FilterOperator::Lt, &json!("2024-01-01")));
        builder.order_by(&price, SortDirection::Desc);

        let page = builder.page_statement(10, 0);
        assert_eq!(
            page.sql,
            "SELECT * FROM \"products\" WHERE \"price\" >= $1 AND \"created_at\" < CAST($2 AS TIMESTAMP) ORDER BY \"price\" DESC LIMIT $3 OFFSET $4"
        );
        assert_eq!(page.bindings[0], SqlValue::Float(1000.0));
        assert_eq!(page.bindings[2], SqlValue::Int(10));
    }

    #[test]
    fn test_missing_value_leaves_builder_untouched() {
        let price = column("price", SemanticType::Float);
        let mut builder = SelectBuilder::new(Driver::Sqlite, &products());
        assert!(!builder.where_filter(&price, FilterOperator::Gt, &json!("")));
        assert!(!builder.where_filter(&price, FilterOperator::Like, &Value::Null));
        assert!(builder.count_statement().bindings.is_empty());
        assert!(!builder.count_statement().sql.contains("WHERE"));
    }

    #[test]
    fn test_mismatched_value_compares_as_text() {
        let price = column("price", SemanticType::Float);
        let mut builder = SelectBuilder::new(Driver::Postgres, &products());
        assert!(builder.where_filter(&price, FilterOperator::Gt, &json!("cheap")));

        let count = builder.count_statement();
        assert!(count.sql.ends_with("WHERE CAST(\"price\" AS TEXT) > $1"));
        assert_eq!(count.bindings, vec![SqlValue::Text("cheap".to_string())]);
    }

    #[test]
    fn test_datetime_with_offset_binds_zoned_timestamp() {
        let created = column("created_at", SemanticType::Datetime);
        let mut builder = SelectBuilder::new(Driver::Postgres, &products());
        assert!(builder.where_filter(
            &created,
            FilterOperator::Gte,
            &json!("2024-03-01T10:30:00+02:00")
        ));
        assert!(builder.where_filter(
            &created,
            FilterOperator::Lt,
            &json!("2024-03-02 09:00:00.500")
        ));

        let count = builder.count_statement();
        assert!(count.sql.ends_with(
            "WHERE \"created_at\" >= CAST($1 AS TIMESTAMPTZ) AND \"created_at\" < CAST($2 AS TIMESTAMP)"
        ));
        assert_eq!(
            count.bindings,
            vec![
                SqlValue::Text("2024-03-01T10:30:00+02:00".to_string()),
                SqlValue::Text("2024-03-02 09:00:00.500".to_string())
            ]
        );
    }

    #[test]
    fn test_page_statement_clamps_offset() {
        let builder = SelectBuilder::new(Driver::Postgres, &products());
        let page = builder.page_statement(10, u64::MAX);
        assert_eq!(page.bindings, vec![SqlValue::Int(10), SqlValue::Int(i64::MAX)]);
    }

    #[test]
    fn test_null_and_pattern_operators() {
        let name = column("name", SemanticType::String);
        let mut builder = SelectBuilder::new(Driver::MySql, &products());
        assert!(builder.where_filter(&name, FilterOperator::NotNull, &Value::Null));
        assert!(builder.where_filter(&name, FilterOperator::EndsWith, &json!("PRO")));
        assert!(builder.where_filter(&name, FilterOperator::NotLike, &json!("50%")));

        let statement = builder.first_statement();
        assert_eq!(
            statement.sql,
            "SELECT * FROM `products` WHERE `name` IS NOT NULL AND LOWER(CAST(`name` AS CHAR)) LIKE LOWER(?) ESCAPE '!' AND LOWER(CAST(`name` AS CHAR)) NOT LIKE LOWER(?) ESCAPE '!' LIMIT 1"
        );
        assert_eq!(
            statement.bindings,
            vec![
                SqlValue::Text("%PRO".to_string()),
                SqlValue::Text("%50!%%".to_string())
            ]
        );
    }

    #[test]
    fn test_json_comparison_casts_column() {
        let meta = column("meta", SemanticType::Json);
        let mut builder = SelectBuilder::new(Driver::Sqlite, &products());
        assert!(builder.where_filter(&meta, FilterOperator::Eq, &json!("{}")));
        assert!(builder
            .count_statement()
            .sql
            .ends_with("WHERE CAST(\"meta\" AS TEXT) = ?"));
    }

    #[test]
    fn test_postgres_text_comparison_casts_column() {
        let token = column("token", SemanticType::String);
        let mut builder = SelectBuilder::new(Driver::Postgres, &products());
        assert!(builder.where_filter(&token, FilterOperator::NotEq, &json!("abc")));
        assert!(builder
            .count_statement()
            .sql
            .ends_with("WHERE CAST(\"token\" AS TEXT) != $1"));
    }

    #[test]
    fn test_day_bucket_statement() {
        let created = column("created_at", SemanticType::Datetime);
        let mut builder = SelectBuilder::new(Driver::Sqlite, &TableName::verified("orders"));
        builder.where_day_range(
            &created,
            NaiveDate::from_ymd_opt(2024, 3, 1),
            NaiveDate::from_ymd_opt(2024, 3, 31),
        );

        let statement = builder.day_bucket_statement(&created);
        assert_eq!(
            statement.sql,
            "SELECT strftime('%Y-%m-%d', \"created_at\") AS group_date, COUNT(*) AS aggregate_count FROM \"orders\" WHERE \"created_at\" >= ? AND \"created_at\" <= ? GROUP BY strftime('%Y-%m-%d', \"created_at\") ORDER BY group_date ASC"
        );
        assert_eq!(
            statement.bindings,
            vec![
                SqlValue::Text("2024-03-01".to_string()),
                SqlValue::Text("2024-03-31 23:59:59".to_string())
            ]
        );
    }
}
