//! Query Builder - table handle and SELECT rendering

use super::Statement;
use crate::backends::{DatabaseValue, SqlDialect};
use crate::record::Record;

/// Statement builder bound to one table and dialect
#[derive(Debug, Clone, Copy)]
pub struct TableQuery<'a> {
    pub(crate) table: &'a str,
    pub(crate) dialect: SqlDialect,
}

impl<'a> TableQuery<'a> {
    pub fn new(table: &'a str, dialect: SqlDialect) -> Self {
        Self { table, dialect }
    }

    /// `SELECT <column> FROM <table> WHERE <field> = ? LIMIT 1`
    pub fn first_by(&self, column: &str, field: &str, value: &DatabaseValue) -> Statement {
        let mut sql = format!(
            "SELECT {} FROM {}",
            self.dialect.quote_identifier(column),
            self.dialect.quote_identifier(self.table)
        );
        let mut params = Vec::new();

        sql.push_str(" WHERE ");
        self.push_condition(&mut sql, &mut params, field, value);
        sql.push_str(" LIMIT 1");

        Statement { sql, params }
    }

    /// First row matching every field of `filter`, with `null_fields`
    /// additionally required to be NULL
    pub fn first_where(&self, filter: &Record, null_fields: &[&str]) -> Statement {
        let mut sql = format!("SELECT * FROM {}", self.dialect.quote_identifier(self.table));
        let mut params = Vec::new();
        let mut conditions = 0;

        for (field, value) in filter.iter() {
            sql.push_str(if conditions == 0 { " WHERE " } else { " AND " });
            self.push_condition(&mut sql, &mut params, field, value);
            conditions += 1;
        }

        for field in null_fields {
            sql.push_str(if conditions == 0 { " WHERE " } else { " AND " });
            self.push_condition(&mut sql, &mut params, field, &DatabaseValue::Null);
            conditions += 1;
        }

        sql.push_str(" LIMIT 1");

        Statement { sql, params }
    }

    /// Render `<field> = ?`, or `<field> IS NULL` for a null value
    pub(crate) fn push_condition(
        &self,
        sql: &mut String,
        params: &mut Vec<DatabaseValue>,
        field: &str,
        value: &DatabaseValue,
    ) {
        sql.push_str(&self.dialect.quote_identifier(field));
        if value.is_null() {
            sql.push_str(" IS NULL");
        } else {
            sql.push_str(" = ");
            sql.push_str(&self.dialect.parameter_placeholder(params.len()));
            params.push(value.clone());
        }
    }

    /// Render a value in a VALUES or SET list
    pub(crate) fn push_value(&self, sql: &mut String, params: &mut Vec<DatabaseValue>, value: &DatabaseValue) {
        if value.is_null() {
            sql.push_str("NULL");
        } else {
            sql.push_str(&self.dialect.parameter_placeholder(params.len()));
            params.push(value.clone());
        }
    }
}
