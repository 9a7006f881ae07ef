//! Values, objects, rows and the expression trees that describe queries.

mod expr;
pub use expr::{Expr, ExprBinaryOp, ExprInList, ExprIsType};

mod field_path;
pub use field_path::FieldPath;

mod filter;
pub use filter::{Filter, FilterSubquery, Tables};

mod object;
pub use object::Object;

mod op_binary;
pub use op_binary::BinaryOp;

mod path;
pub use path::{LoadPath, Path, PathStep};

mod row;
pub use row::Row;

mod ty;
pub use ty::Type;

mod ty_enum;
pub use ty_enum::{EnumId, TypeEnum};

mod value;
pub use value::Value;

mod value_cmp;

mod value_enum;
pub use value_enum::ValueEnum;
