use super::{FieldPath, Value};
use crate::schema::ModelId;

use indexmap::IndexMap;

/// An instance of a mapped model, or a nested value object.
///
/// A field that was never assigned is *unset*, which is distinct from a field
/// holding [`Value::Null`]. Navigation properties stay unset unless eager
/// loading fills them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Object {
    /// Concrete model of an entity; `None` for nested value objects
    model: Option<ModelId>,

    fields: IndexMap<String, Value>,
}

impl Object {
    /// Creates an empty instance of `model`.
    pub fn new(model: ModelId) -> Self {
        Self {
            model: Some(model),
            fields: IndexMap::new(),
        }
    }

    /// Creates an empty nested value object.
    pub fn embedded() -> Self {
        Self::default()
    }

    pub fn model(&self) -> Option<ModelId> {
        self.model
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the field, or `None` when it is unset.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields.get_mut(name)
    }

    pub fn is_set(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Returns the value at a nested path, or `None` if any step is unset or
    /// passes through something other than an object.
    pub fn get_path(&self, path: &FieldPath) -> Option<&Value> {
        let (last, init) = path.segments().split_last()?;
        let mut object = self;

        for segment in init {
            object = object.get(segment)?.as_object()?;
        }

        object.get(last)
    }

    /// Returns the related object held by a navigation property.
    pub fn related(&self, name: &str) -> Option<&Object> {
        self.get(name)?.as_object()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Builder-style variant of [`set`](Self::set).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Sets the value at a nested path.
    ///
    /// Intermediate value objects are allocated the first time a path
    /// traverses them and reused afterwards.
    pub fn set_path(&mut self, path: &FieldPath, value: impl Into<Value>) {
        let Some((last, init)) = path.segments().split_last() else {
            return;
        };

        let mut object = self;

        for segment in init {
            let slot = object
                .fields
                .entry(segment.clone())
                .or_insert_with(|| Value::Object(Object::embedded()));

            if !slot.is_object() {
                *slot = Value::Object(Object::embedded());
            }

            object = match slot {
                Value::Object(nested) => nested,
                _ => unreachable!(),
            };
        }

        object.fields.insert(last.clone(), value.into());
    }

    /// Clears a field back to unset, returning its previous value.
    pub fn unset(&mut self, name: &str) -> Option<Value> {
        self.fields.shift_remove(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }
}
