mod response;
pub use response::{Response, Rows};

pub mod operation;
pub use operation::Operation;

use crate::{async_trait, schema::db::Schema};

use std::{fmt::Debug, sync::Arc};

/// The row source the engine executes storage operations against.
#[async_trait]
pub trait Driver: Debug + Send + Sync + 'static {
    /// Execute a storage operation
    async fn exec(&self, schema: &Arc<Schema>, op: Operation) -> crate::Result<Response>;

    /// Drops all stored rows and recreates the schema's tables.
    async fn reset_db(&self, schema: &Schema) -> crate::Result<()>;
}
