use super::Value;

use std::cmp::Ordering;

impl Value {
    /// Compares two stored scalars the way a filter does.
    ///
    /// Integers of different widths compare by value. Returns `None` when
    /// either side is null or the values are not comparable.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => None,
            (Value::Bool(lhs), Value::Bool(rhs)) => Some(lhs.cmp(rhs)),
            (Value::String(lhs), Value::String(rhs)) => Some(lhs.cmp(rhs)),
            (Value::Enum(lhs), Value::Enum(rhs)) if lhs.ty == rhs.ty => {
                Some(lhs.variant.cmp(&rhs.variant))
            }
            (lhs, rhs) => Some(lhs.as_i64()?.cmp(&rhs.as_i64()?)),
        }
    }

    /// Filter equality: null never equals anything.
    pub fn sql_eq(&self, other: &Value) -> bool {
        self.compare(other) == Some(Ordering::Equal)
    }
}
