use super::{BinaryOp, Path, Value};
use crate::schema::ModelId;

/// A predicate over the queried object.
///
/// Member references carry explicit casts (see [`Path`]) instead of relying
/// on runtime reflection. The engine translates the tree into a storage
/// [`Filter`](super::Filter).
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// All sub-expressions hold
    And(Vec<Expr>),

    /// At least one sub-expression holds
    Or(Vec<Expr>),

    /// Negation
    Not(Box<Expr>),

    /// Comparison of a member against a value
    BinaryOp(ExprBinaryOp),

    /// The member holds null (for a navigation: the owner's key is null)
    IsNull(Path),

    /// The member's value is one of a list of values
    InList(ExprInList),

    /// The object referenced by the path is an instance of a type
    IsType(ExprIsType),

    /// A member reference
    Member(Path),

    /// A literal or captured runtime value
    Value(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprBinaryOp {
    pub lhs: Box<Expr>,
    pub op: BinaryOp,
    pub rhs: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprInList {
    pub path: Path,
    pub values: Vec<Value>,
}

/// `x is T`, where `x` is the object the path references.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprIsType {
    pub path: Path,
    pub ty: ModelId,
}

impl Expr {
    pub fn member(path: impl Into<Path>) -> Self {
        Self::Member(path.into())
    }

    pub fn value(value: impl Into<Value>) -> Self {
        Self::Value(value.into())
    }

    pub fn binary_op(lhs: impl Into<Self>, op: BinaryOp, rhs: impl Into<Self>) -> Self {
        ExprBinaryOp {
            lhs: Box::new(lhs.into()),
            op,
            rhs: Box::new(rhs.into()),
        }
        .into()
    }

    pub fn eq(lhs: impl Into<Self>, rhs: impl Into<Self>) -> Self {
        Self::binary_op(lhs, BinaryOp::Eq, rhs)
    }

    pub fn ne(lhs: impl Into<Self>, rhs: impl Into<Self>) -> Self {
        Self::binary_op(lhs, BinaryOp::Ne, rhs)
    }

    pub fn gt(lhs: impl Into<Self>, rhs: impl Into<Self>) -> Self {
        Self::binary_op(lhs, BinaryOp::Gt, rhs)
    }

    pub fn ge(lhs: impl Into<Self>, rhs: impl Into<Self>) -> Self {
        Self::binary_op(lhs, BinaryOp::Ge, rhs)
    }

    pub fn lt(lhs: impl Into<Self>, rhs: impl Into<Self>) -> Self {
        Self::binary_op(lhs, BinaryOp::Lt, rhs)
    }

    pub fn le(lhs: impl Into<Self>, rhs: impl Into<Self>) -> Self {
        Self::binary_op(lhs, BinaryOp::Le, rhs)
    }

    /// `lhs && rhs`. Nested conjunctions are flattened.
    pub fn and(lhs: impl Into<Self>, rhs: impl Into<Self>) -> Self {
        let mut operands = vec![];

        for expr in [lhs.into(), rhs.into()] {
            match expr {
                Self::And(nested) => operands.extend(nested),
                expr => operands.push(expr),
            }
        }

        Self::And(operands)
    }

    /// `lhs || rhs`. Nested disjunctions are flattened.
    pub fn or(lhs: impl Into<Self>, rhs: impl Into<Self>) -> Self {
        let mut operands = vec![];

        for expr in [lhs.into(), rhs.into()] {
            match expr {
                Self::Or(nested) => operands.extend(nested),
                expr => operands.push(expr),
            }
        }

        Self::Or(operands)
    }

    pub fn not(expr: impl Into<Self>) -> Self {
        Self::Not(Box::new(expr.into()))
    }

    pub fn is_null(path: impl Into<Path>) -> Self {
        Self::IsNull(path.into())
    }

    pub fn in_list(path: impl Into<Path>, values: impl IntoIterator<Item = Value>) -> Self {
        ExprInList {
            path: path.into(),
            values: values.into_iter().collect(),
        }
        .into()
    }

    pub fn is_type(path: impl Into<Path>, ty: ModelId) -> Self {
        ExprIsType {
            path: path.into(),
            ty,
        }
        .into()
    }

    pub fn is_value(&self) -> bool {
        matches!(self, Self::Value(_))
    }
}

impl From<ExprBinaryOp> for Expr {
    fn from(value: ExprBinaryOp) -> Self {
        Self::BinaryOp(value)
    }
}

impl From<ExprInList> for Expr {
    fn from(value: ExprInList) -> Self {
        Self::InList(value)
    }
}

impl From<ExprIsType> for Expr {
    fn from(value: ExprIsType) -> Self {
        Self::IsType(value)
    }
}

impl From<Path> for Expr {
    fn from(value: Path) -> Self {
        Self::Member(value)
    }
}

impl From<Value> for Expr {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<bool> for Expr {
    fn from(value: bool) -> Self {
        Self::Value(value.into())
    }
}

impl From<i32> for Expr {
    fn from(value: i32) -> Self {
        Self::Value(value.into())
    }
}

impl From<i64> for Expr {
    fn from(value: i64) -> Self {
        Self::Value(value.into())
    }
}
