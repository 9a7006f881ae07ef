use indexmap::IndexMap;
use lintel_core::{
    async_trait, bail,
    driver::{operation, Driver, Operation, Response},
    schema::db::Schema,
    stmt::Row,
    Result,
};
use std::sync::{Arc, Mutex};

/// A row source keeping every table in memory.
///
/// Clones share the same tables, so a test can keep a handle to seed or
/// inspect rows directly while a [`Db`](lintel::Db) owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryDriver {
    tables: Arc<Mutex<IndexMap<String, Vec<Row>>>>,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a raw row, bypassing the mapping.
    pub fn push_row(&self, table: &str, row: Row) {
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .push(row);
    }

    /// Returns a copy of the rows stored in `table`.
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    fn fetch(&self, op: &operation::Fetch) -> Result<Vec<Row>> {
        let tables = self.tables.lock().unwrap();

        let Some(rows) = tables.get(&op.table) else {
            bail!("no such table `{}`", op.table);
        };

        let mut matches = vec![];

        for row in rows {
            if op.limit.is_some_and(|limit| matches.len() >= limit) {
                break;
            }

            if op.filter.eval(row, &*tables)? {
                matches.push(row.clone());
            }
        }

        Ok(matches)
    }

    fn insert(&self, schema: &Schema, op: &operation::Insert) -> Result<()> {
        let Some(table) = schema.tables.get(&op.table) else {
            bail!("no such table `{}`", op.table);
        };

        for (column, value) in op.row.iter() {
            let Some(db_column) = table.column(column) else {
                bail!("table `{}` has no column `{column}`", table.name);
            };

            if value.is_null() && !db_column.nullable {
                bail!("column `{}`.`{column}` is not nullable", table.name);
            }
        }

        self.push_row(&op.table, op.row.clone());
        Ok(())
    }

    fn update_by_key(&self, op: &operation::UpdateByKey) -> Result<u64> {
        let mut tables = self.tables.lock().unwrap();

        let Some(rows) = tables.get_mut(&op.table) else {
            bail!("no such table `{}`", op.table);
        };

        let mut count = 0;

        for row in rows.iter_mut() {
            if op.key.iter().all(|(column, value)| row.get(column) == value) {
                *row = op.row.clone();
                count += 1;
            }
        }

        Ok(count)
    }
}

#[async_trait]
impl Driver for MemoryDriver {
    async fn exec(&self, schema: &Arc<Schema>, op: Operation) -> Result<Response> {
        match op {
            Operation::Fetch(op) => Ok(Response::rows(self.fetch(&op)?)),
            Operation::Insert(op) => {
                self.insert(schema, &op)?;
                Ok(Response::count(1))
            }
            Operation::UpdateByKey(op) => Ok(Response::count(self.update_by_key(&op)?)),
        }
    }

    async fn reset_db(&self, schema: &Schema) -> Result<()> {
        let mut tables = self.tables.lock().unwrap();
        tables.clear();

        for table in schema.tables() {
            tables.insert(table.name.clone(), vec![]);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lintel_core::stmt::{BinaryOp, Filter};

    #[test]
    fn fetch_applies_filter_and_limit() {
        let driver = MemoryDriver::new();
        for id in 1..=3 {
            driver.push_row("T", Row::new().with("Id", id));
        }

        let rows = driver
            .fetch(&operation::Fetch {
                table: "T".to_string(),
                filter: Filter::compare("Id", BinaryOp::Ge, 2),
                limit: Some(1),
            })
            .unwrap();

        assert_eq!(rows, vec![Row::new().with("Id", 2)]);
    }

    #[test]
    fn update_replaces_rows_matching_the_key() {
        let driver = MemoryDriver::new();
        driver.push_row("T", Row::new().with("Id", 1).with("Name", "a"));
        driver.push_row("T", Row::new().with("Id", 2).with("Name", "b"));

        let count = driver
            .update_by_key(&operation::UpdateByKey {
                table: "T".to_string(),
                key: Row::new().with("Id", 2),
                row: Row::new().with("Id", 2).with("Name", "c"),
            })
            .unwrap();

        assert_eq!(count, 1);
        assert_eq!(
            driver.rows("T"),
            vec![
                Row::new().with("Id", 1).with("Name", "a"),
                Row::new().with("Id", 2).with("Name", "c"),
            ]
        );
    }

    #[test]
    fn fetch_from_unknown_table_fails() {
        let driver = MemoryDriver::new();
        let err = driver
            .fetch(&operation::Fetch {
                table: "Missing".to_string(),
                filter: Filter::True,
                limit: None,
            })
            .unwrap_err();

        assert_eq!(err.to_string(), "no such table `Missing`");
    }
}
