use crate::stmt::Row;

#[derive(Debug)]
pub struct Response {
    pub rows: Rows,
}

#[derive(Debug)]
pub enum Rows {
    /// Number of rows impacted by the operation
    Count(u64),

    /// Rows returned by a fetch
    Values(Vec<Row>),
}

impl Response {
    pub fn count(count: u64) -> Self {
        Self {
            rows: Rows::Count(count),
        }
    }

    pub fn rows(rows: Vec<Row>) -> Self {
        Self {
            rows: Rows::Values(rows),
        }
    }
}

impl Rows {
    pub fn is_count(&self) -> bool {
        matches!(self, Self::Count(_))
    }

    pub fn is_values(&self) -> bool {
        matches!(self, Self::Values(_))
    }

    /// Returns the fetched rows, failing if the driver answered with a count.
    pub fn into_values(self) -> crate::Result<Vec<Row>> {
        match self {
            Self::Values(rows) => Ok(rows),
            Self::Count(count) => Err(crate::Error::invalid_result(format!(
                "expected rows, driver returned a count of {count}"
            ))),
        }
    }

    pub fn into_count(self) -> crate::Result<u64> {
        match self {
            Self::Count(count) => Ok(count),
            Self::Values(rows) => Ok(rows.len() as u64),
        }
    }
}
