use super::{Config, Db};

use lintel_core::{driver::Driver, Schema};

use std::sync::Arc;

/// What the materializer does with a row whose discriminator value has no
/// registered model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnresolvedDiscriminator {
    /// Fail the query with an unresolved discriminator error
    #[default]
    Error,

    /// Materialize the row as the queried model and log a warning
    Fallback,
}

/// How a predicate that accesses a member through a downcast is scoped when
/// the same conjunction carries no type check for the cast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CastScope {
    /// Restrict the predicate to rows whose discriminator is compatible with
    /// the cast
    #[default]
    Implicit,

    /// Emit only the column reference; the caller adds any type check
    Caller,
}

#[derive(Debug, Default)]
pub struct Builder {
    config: Config,
}

impl Builder {
    pub fn unresolved_discriminator(&mut self, policy: UnresolvedDiscriminator) -> &mut Self {
        self.config.unresolved_discriminator = policy;
        self
    }

    pub fn cast_scope(&mut self, policy: CastScope) -> &mut Self {
        self.config.cast_scope = policy;
        self
    }

    pub fn build(&self, schema: Schema, driver: impl Driver) -> Db {
        Db {
            schema: Arc::new(schema),
            driver: Arc::new(driver),
            config: self.config,
        }
    }
}
