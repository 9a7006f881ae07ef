//! Common imports for test files
//!
//! This module provides a convenient way to import frequently used items
//! in test files with `use tests::prelude::*;`

pub use crate::zoo::{self, Zoo};
pub use crate::{DbTest, ExecLog};

pub use lintel::db::{CastScope, UnresolvedDiscriminator};
pub use lintel::schema::{db, Cardinality, ModelId};
pub use lintel::stmt::{BinaryOp, Expr, Filter, FilterSubquery, Object, Path, Row, Type, Value};
pub use lintel::{Converters, Db, Query, Schema};
