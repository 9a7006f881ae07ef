use super::*;

use crate::stmt::Filter;

#[derive(Debug, Clone)]
pub struct Fetch {
    /// Which table to read from
    pub table: String,

    /// Which rows to return. Values are already in parameter form.
    pub filter: Filter,

    /// Maximum number of rows to return
    pub limit: Option<usize>,
}

impl From<Fetch> for Operation {
    fn from(value: Fetch) -> Self {
        Self::Fetch(value)
    }
}
