//! Query Builder DML operations (INSERT, UPDATE, DELETE)

use super::builder::TableQuery;
use super::Statement;
use crate::backends::DatabaseValue;
use crate::record::Record;

impl<'a> TableQuery<'a> {
    /// `INSERT INTO <table> (...) VALUES (...) RETURNING <returning>`
    pub fn insert(&self, record: &Record, returning: &str) -> Statement {
        let mut sql = format!("INSERT INTO {}", self.dialect.quote_identifier(self.table));
        let mut params = Vec::new();

        if record.is_empty() {
            sql.push_str(" DEFAULT VALUES");
        } else {
            let columns: Vec<String> = record
                .fields()
                .map(|field| self.dialect.quote_identifier(field))
                .collect();
            sql.push_str(" (");
            sql.push_str(&columns.join(", "));
            sql.push_str(") VALUES (");
            for (i, (_, value)) in record.iter().enumerate() {
                if i > 0 {
                    sql.push_str(", ");
                }
                self.push_value(&mut sql, &mut params, value);
            }
            sql.push(')');
        }

        sql.push_str(" RETURNING ");
        sql.push_str(&self.dialect.quote_identifier(returning));

        Statement { sql, params }
    }

    /// `UPDATE <table> SET ... WHERE <field> = ?`
    pub fn update_by(&self, field: &str, value: &DatabaseValue, record: &Record) -> Statement {
        let mut sql = format!("UPDATE {} SET ", self.dialect.quote_identifier(self.table));
        let mut params = Vec::new();

        for (i, (column, column_value)) in record.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push_str(&self.dialect.quote_identifier(column));
            sql.push_str(" = ");
            self.push_value(&mut sql, &mut params, column_value);
        }

        sql.push_str(" WHERE ");
        self.push_condition(&mut sql, &mut params, field, value);

        Statement { sql, params }
    }

    /// `DELETE FROM <table> WHERE <field> = ?`
    pub fn delete_by(&self, field: &str, value: &DatabaseValue) -> Statement {
        let mut sql = format!("DELETE FROM {} WHERE ", self.dialect.quote_identifier(self.table));
        let mut params = Vec::new();
        self.push_condition(&mut sql, &mut params, field, value);

        Statement { sql, params }
    }
}
