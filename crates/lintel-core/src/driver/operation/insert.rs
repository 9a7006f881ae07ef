use super::*;

use crate::stmt::Row;

#[derive(Debug, Clone)]
pub struct Insert {
    /// Which table to write to
    pub table: String,

    /// Stored scalars by column, in table order
    pub row: Row,
}

impl From<Insert> for Operation {
    fn from(value: Insert) -> Self {
        Self::Insert(value)
    }
}
