use crate::logging_driver::DriverOp;
use lintel_core::{
    driver::{
        operation::{Fetch, UpdateByKey},
        Operation, Response,
    },
    stmt::Filter,
};
use std::sync::{Arc, Mutex};

/// A wrapper around the operations log that provides a clean API for tests
pub struct ExecLog {
    ops: Arc<Mutex<Vec<DriverOp>>>,
}

impl ExecLog {
    pub(crate) fn new(ops: Arc<Mutex<Vec<DriverOp>>>) -> Self {
        Self { ops }
    }

    /// Get the number of logged operations
    pub fn len(&self) -> usize {
        self.ops.lock().unwrap().len()
    }

    /// Check if the log is empty
    pub fn is_empty(&self) -> bool {
        self.ops.lock().unwrap().is_empty()
    }

    /// Count operations matching the given predicate
    pub fn count<F>(&self, predicate: F) -> usize
    where
        F: Fn(&Operation) -> bool,
    {
        self.ops
            .lock()
            .unwrap()
            .iter()
            .filter(|op| predicate(&op.operation))
            .count()
    }

    /// Number of fetches issued against `table`
    pub fn fetches_from(&self, table: &str) -> usize {
        self.count(|op| matches!(op, Operation::Fetch(fetch) if fetch.table == table))
    }

    /// Filters of every fetch, in issue order
    pub fn fetch_filters(&self) -> Vec<(String, Filter)> {
        self.fetches()
            .into_iter()
            .map(|fetch| (fetch.table, fetch.filter))
            .collect()
    }

    pub fn fetches(&self) -> Vec<Fetch> {
        self.ops
            .lock()
            .unwrap()
            .iter()
            .filter_map(|op| match &op.operation {
                Operation::Fetch(fetch) => Some(fetch.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn updates(&self) -> Vec<UpdateByKey> {
        self.ops
            .lock()
            .unwrap()
            .iter()
            .filter_map(|op| match &op.operation {
                Operation::UpdateByKey(update) => Some(update.clone()),
                _ => None,
            })
            .collect()
    }

    /// Clear the log
    pub fn clear(&mut self) {
        self.ops.lock().unwrap().clear();
    }

    /// Remove and return the first operation from the log
    /// Returns None if the log is empty
    pub fn pop(&mut self) -> Option<(Operation, Response)> {
        let mut ops = self.ops.lock().unwrap();
        if ops.is_empty() {
            None
        } else {
            let driver_op = ops.remove(0);
            Some((driver_op.operation, driver_op.response))
        }
    }
}
