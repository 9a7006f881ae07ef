use super::*;

use crate::stmt::Row;

#[derive(Debug, Clone)]
pub struct UpdateByKey {
    /// Which table to update
    pub table: String,

    /// Primary key columns and the stored values identifying the row
    pub key: Row,

    /// Replacement row, in table order
    pub row: Row,
}

impl From<UpdateByKey> for Operation {
    fn from(value: UpdateByKey) -> Self {
        Self::UpdateByKey(value)
    }
}
