//! Bidirectional scalar conversion between property types and their storage
//! and filter-parameter representations.

use crate::stmt::{EnumId, Type, TypeEnum, Value};
use crate::{Error, Result};

use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// A pure value-to-value conversion.
pub type ConvertFn = Arc<dyn Fn(&Value) -> Result<Value> + Send + Sync>;

/// How an enum degrades to a scalar when no explicit converter exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumRepr {
    /// The variant's name as text
    Name,

    /// The variant's ordinal as an integer
    Ordinal,
}

/// Registry-wide conversion settings, fixed at construction.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConvertConfig {
    /// Representation applied to enums that have no per-enum policy. When
    /// unset, enums only convert to text through an explicit converter or a
    /// per-enum policy.
    pub default_enum_repr: Option<EnumRepr>,
}

/// The type converter registry.
///
/// Resolution order for `convert(value, source, target)`:
///
/// 1. `Null` passes through unchanged.
/// 2. The converter registered for exactly `(source, target)`.
/// 3. Identity when `source == target`.
/// 4. Enum default policy: enum to/from text by variant name.
/// 5. Built-in scalar casts: integer widths, bool to/from 0 and 1, enum
///    to/from ordinal.
///
/// Anything else is a conversion error.
#[derive(Clone, Default)]
pub struct Converters {
    config: ConvertConfig,

    enums: IndexMap<EnumId, TypeEnum>,

    converters: IndexMap<(Type, Type), ConvertFn>,

    policies: IndexMap<EnumId, EnumRepr>,
}

impl Converters {
    pub fn new(config: ConvertConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &ConvertConfig {
        &self.config
    }

    /// Registers an enum-like type and returns its identifier.
    pub fn register_enum<S: Into<String>>(
        &mut self,
        name: impl Into<String>,
        variants: impl IntoIterator<Item = S>,
    ) -> EnumId {
        let id = EnumId(self.enums.len());
        self.enums.insert(
            id,
            TypeEnum {
                id,
                name: name.into(),
                variants: variants.into_iter().map(Into::into).collect(),
            },
        );
        id
    }

    /// # Panics
    ///
    /// Panics if the enum was not registered with this registry.
    #[track_caller]
    pub fn enum_ty(&self, id: EnumId) -> &TypeEnum {
        self.enums.get(&id).expect("invalid enum ID")
    }

    pub fn enums(&self) -> impl Iterator<Item = &TypeEnum> + '_ {
        self.enums.values()
    }

    /// Registers the converter for `(source, target)`, replacing any previous
    /// registration for the same pair.
    pub fn register(
        &mut self,
        source: Type,
        target: Type,
        f: impl Fn(&Value) -> Result<Value> + Send + Sync + 'static,
    ) -> &mut Self {
        self.converters.insert((source, target), Arc::new(f));
        self
    }

    /// Sets how `ty` degrades to a scalar when no exact converter exists.
    pub fn set_default_policy(&mut self, ty: EnumId, repr: EnumRepr) -> &mut Self {
        self.policies.insert(ty, repr);
        self
    }

    /// Returns the effective policy for `ty`: its own policy, else the
    /// registry-wide default.
    pub fn policy(&self, ty: EnumId) -> Option<EnumRepr> {
        self.policies
            .get(&ty)
            .copied()
            .or(self.config.default_enum_repr)
    }

    /// Returns the exact converter for `(source, target)`, if registered.
    pub fn exact(&self, source: &Type, target: &Type) -> Option<&ConvertFn> {
        self.converters.get(&(source.clone(), target.clone()))
    }

    pub fn convert(&self, value: Value, source: &Type, target: &Type) -> Result<Value> {
        if value.is_null() {
            return Ok(value);
        }

        if let Some(f) = self.exact(source, target) {
            return f(&value);
        }

        if source == target {
            return Ok(value);
        }

        if let Some(converted) = self.convert_by_policy(&value, source, target) {
            return converted;
        }

        self.convert_builtin(value, source, target)
    }

    /// Converts a stored scalar read from a row into the property's type.
    pub fn from_storage(&self, value: Value, storage: &Type, ty: &Type) -> Result<Value> {
        // The stored value's own type takes precedence over the declared
        // storage type so that drivers returning a wider integer still match.
        let source = value.infer_ty().unwrap_or_else(|| storage.clone());
        self.convert(value, &source, ty)
    }

    /// Converts a property value into the scalar written to storage.
    pub fn to_storage(&self, value: Value, ty: &Type, storage: &Type) -> Result<Value> {
        self.convert(value, ty, storage)
    }

    /// Converts a property value into a filter parameter.
    ///
    /// A converter registered for `(ty, Type::Param)` wins. Otherwise the
    /// value is converted as it would be stored, so the parameter compares
    /// equal to stored data.
    pub fn to_param(&self, value: Value, ty: &Type, storage: &Type) -> Result<Value> {
        if value.is_null() {
            return Ok(value);
        }

        match self.exact(ty, &Type::Param) {
            Some(f) => f(&value),
            None => self.to_storage(value, ty, storage),
        }
    }

    fn convert_by_policy(&self, value: &Value, source: &Type, target: &Type) -> Option<Result<Value>> {
        match (source, target) {
            (Type::Enum(id), Type::String | Type::Param)
                if self.policy(*id) == Some(EnumRepr::Name) =>
            {
                let ty = self.enums.get(id)?;
                Some(
                    ty.name_of(value)
                        .map(Value::from)
                        .ok_or_else(|| Error::conversion(value, source, target)),
                )
            }
            (Type::String, Type::Enum(id)) if self.policy(*id) == Some(EnumRepr::Name) => {
                let ty = self.enums.get(id)?;
                Some(
                    value
                        .as_str()
                        .and_then(|name| ty.parse(name, false))
                        .ok_or_else(|| Error::conversion(value, source, target)),
                )
            }
            (Type::Enum(id), Type::Param) if self.policy(*id) == Some(EnumRepr::Ordinal) => {
                Some(self.convert_builtin(value.clone(), source, &Type::I64))
            }
            _ => None,
        }
    }

    fn convert_builtin(&self, value: Value, source: &Type, target: &Type) -> Result<Value> {
        let converted = match (&value, target) {
            (Value::I32(v), Type::I64) => Some(Value::I64(i64::from(*v))),
            (Value::I64(v), Type::I32) => i32::try_from(*v).ok().map(Value::I32),
            (Value::Enum(v), Type::I64) if source.as_enum() == Some(v.ty) => {
                i64::try_from(v.variant).ok().map(Value::I64)
            }
            (Value::Enum(v), Type::I32) if source.as_enum() == Some(v.ty) => {
                i32::try_from(v.variant).ok().map(Value::I32)
            }
            (Value::Bool(v), Type::I32) => Some(Value::I32(i32::from(*v))),
            (Value::Bool(v), Type::I64) => Some(Value::I64(i64::from(*v))),
            (Value::I32(_) | Value::I64(_), Type::Bool) => match value.as_i64() {
                Some(0) => Some(Value::Bool(false)),
                Some(1) => Some(Value::Bool(true)),
                _ => None,
            },
            (Value::I32(_) | Value::I64(_), Type::Enum(id)) => {
                let ordinal = value.as_i64().unwrap_or(-1);
                self.enums.get(id).and_then(|ty| ty.from_ordinal(ordinal))
            }
            _ => None,
        };

        converted.ok_or_else(|| Error::conversion(&value, source, target))
    }
}

impl fmt::Debug for Converters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converters")
            .field("config", &self.config)
            .field("enums", &self.enums)
            .field("converters", &self.converters.keys().collect::<Vec<_>>())
            .field("policies", &self.policies)
            .finish()
    }
}
