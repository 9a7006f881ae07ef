use super::{BinaryOp, Row, Value};
use crate::Result;

use indexmap::IndexMap;

/// A storage-level predicate over the columns of one table.
///
/// Filters reference physical column names and hold values already converted
/// to their parameter representation. They are what a driver receives.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every row
    True,

    /// Matches no row
    False,

    /// `column <op> value`
    Compare {
        column: String,
        op: BinaryOp,
        value: Value,
    },

    /// `column IS NULL`
    IsNull(String),

    /// `column IN (values...)`
    InList { column: String, values: Vec<Value> },

    /// `(columns...) IN (SELECT target_columns... FROM table WHERE filter)`
    InSubquery(FilterSubquery),

    And(Vec<Filter>),

    Or(Vec<Filter>),

    Not(Box<Filter>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterSubquery {
    /// Columns of the outer row
    pub columns: Vec<String>,

    /// Table the subquery selects from
    pub table: String,

    /// Columns of the subquery's table compared to `columns`
    pub target_columns: Vec<String>,

    pub filter: Box<Filter>,
}

/// Resolves table contents for subqueries during [`Filter::eval`].
pub trait Tables {
    /// Returns the rows of `table`, or `None` if there is no such table.
    fn rows(&self, table: &str) -> Option<&[Row]>;
}

impl Tables for IndexMap<String, Vec<Row>> {
    fn rows(&self, table: &str) -> Option<&[Row]> {
        self.get(table).map(Vec::as_slice)
    }
}

impl Filter {
    pub fn compare(column: impl Into<String>, op: BinaryOp, value: impl Into<Value>) -> Self {
        Self::Compare {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, BinaryOp::Eq, value)
    }

    pub fn is_null(column: impl Into<String>) -> Self {
        Self::IsNull(column.into())
    }

    /// `column IN (values...)`, collapsing the degenerate cases.
    pub fn in_list(column: impl Into<String>, values: Vec<Value>) -> Self {
        match values.len() {
            0 => Self::False,
            1 => Self::eq(column, values.into_iter().next().unwrap_or_default()),
            _ => Self::InList {
                column: column.into(),
                values,
            },
        }
    }

    /// Conjunction of `filters`, flattening nested conjunctions and folding
    /// constants.
    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        let mut operands = vec![];

        for filter in filters {
            match filter {
                Self::True => {}
                Self::False => return Self::False,
                Self::And(nested) => operands.extend(nested),
                filter => operands.push(filter),
            }
        }

        match operands.len() {
            0 => Self::True,
            1 => operands.pop().unwrap_or(Self::True),
            _ => Self::And(operands),
        }
    }

    /// Disjunction of `filters`, flattening nested disjunctions and folding
    /// constants.
    pub fn or(filters: impl IntoIterator<Item = Filter>) -> Self {
        let mut operands = vec![];

        for filter in filters {
            match filter {
                Self::False => {}
                Self::True => return Self::True,
                Self::Or(nested) => operands.extend(nested),
                filter => operands.push(filter),
            }
        }

        match operands.len() {
            0 => Self::False,
            1 => operands.pop().unwrap_or(Self::False),
            _ => Self::Or(operands),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(filter: Filter) -> Self {
        match filter {
            Self::True => Self::False,
            Self::False => Self::True,
            Self::Not(inner) => *inner,
            filter => Self::Not(Box::new(filter)),
        }
    }

    pub fn is_true(&self) -> bool {
        matches!(self, Self::True)
    }

    pub fn is_false(&self) -> bool {
        matches!(self, Self::False)
    }

    /// Evaluates the filter against a row.
    ///
    /// Comparisons involving null never match. Subqueries are resolved through
    /// `tables`.
    pub fn eval(&self, row: &Row, tables: &dyn Tables) -> Result<bool> {
        Ok(match self {
            Self::True => true,
            Self::False => false,
            Self::Compare { column, op, value } => row
                .get(column)
                .compare(value)
                .is_some_and(|ordering| op.holds(ordering)),
            Self::IsNull(column) => row.get(column).is_null(),
            Self::InList { column, values } => {
                let stored = row.get(column);
                values.iter().any(|value| stored.sql_eq(value))
            }
            Self::InSubquery(subquery) => subquery.eval(row, tables)?,
            Self::And(filters) => {
                for filter in filters {
                    if !filter.eval(row, tables)? {
                        return Ok(false);
                    }
                }
                true
            }
            Self::Or(filters) => {
                for filter in filters {
                    if filter.eval(row, tables)? {
                        return Ok(true);
                    }
                }
                false
            }
            Self::Not(filter) => !filter.eval(row, tables)?,
        })
    }
}

impl FilterSubquery {
    fn eval(&self, row: &Row, tables: &dyn Tables) -> Result<bool> {
        if self.columns.len() != self.target_columns.len() {
            crate::bail!(
                "subquery compares {} columns against {}",
                self.columns.len(),
                self.target_columns.len()
            );
        }

        let outer: Vec<&Value> = self.columns.iter().map(|column| row.get(column)).collect();

        if outer.iter().any(|value| value.is_null()) {
            return Ok(false);
        }

        let Some(rows) = tables.rows(&self.table) else {
            crate::bail!("subquery references unknown table `{}`", self.table);
        };

        for candidate in rows {
            let keys_match = self
                .target_columns
                .iter()
                .zip(&outer)
                .all(|(column, value)| candidate.get(column).sql_eq(value));

            if keys_match && self.filter.eval(candidate, tables)? {
                return Ok(true);
            }
        }

        Ok(false)
    }
}
