//! Per-call options for model operations

use crate::backends::Database;

/// Options for `fetch`, `fetch_or_fail` and `delete`
#[derive(Clone, Copy, Default)]
pub struct QueryOptions<'a> {
    /// Run against this handle (typically a transaction) instead of the
    /// model's own
    pub db: Option<&'a dyn Database>,
}

impl<'a> QueryOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_db(mut self, db: &'a dyn Database) -> Self {
        self.db = Some(db);
        self
    }
}

/// Options for `save` and `save_and_fetch`
#[derive(Clone, Copy, Default)]
pub struct SaveOptions<'a> {
    /// Fetch and return the stored row after writing
    pub return_new: bool,
    pub db: Option<&'a dyn Database>,
}

impl<'a> SaveOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn return_new(mut self) -> Self {
        self.return_new = true;
        self
    }

    pub fn with_db(mut self, db: &'a dyn Database) -> Self {
        self.db = Some(db);
        self
    }

    pub fn query(&self) -> QueryOptions<'a> {
        QueryOptions { db: self.db }
    }
}

impl<'a> From<QueryOptions<'a>> for SaveOptions<'a> {
    fn from(opts: QueryOptions<'a>) -> Self {
        Self {
            return_new: false,
            db: opts.db,
        }
    }
}
