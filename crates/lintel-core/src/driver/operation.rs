mod fetch;
pub use fetch::Fetch;

mod insert;
pub use insert::Insert;

mod update_by_key;
pub use update_by_key::UpdateByKey;

#[derive(Debug, Clone)]
pub enum Operation {
    /// Read the rows of one table matching a filter
    Fetch(Fetch),

    /// Store one row
    Insert(Insert),

    /// Replace the row with the given primary key
    UpdateByKey(UpdateByKey),
}

impl Operation {
    /// Name of the table the operation reads or writes.
    pub fn table(&self) -> &str {
        match self {
            Self::Fetch(op) => &op.table,
            Self::Insert(op) => &op.table,
            Self::UpdateByKey(op) => &op.table,
        }
    }
}
