use crate::schema::ModelId;

use std::fmt;

/// A member access chain rooted at the queried object, possibly qualified by
/// casts, e.g. `((Dog)x.TestAnimal).Bla`.
///
/// Each step names a property of the current object. A step may carry the
/// runtime type the current object is cast to before the property is
/// accessed.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Path {
    pub steps: Vec<PathStep>,
}

/// A navigation chain requested for eager loading.
///
/// Load paths share the representation of member paths: each step is a
/// navigation property and its optional cast is the runtime type the owner
/// must have for the step to apply.
pub type LoadPath = Path;

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PathStep {
    /// Runtime type required of the current object, from a cast
    pub cast: Option<ModelId>,

    /// Property accessed on the (cast) object
    pub field: String,
}

impl Path {
    /// The path referencing the queried object itself.
    pub fn root() -> Self {
        Self::default()
    }

    /// Appends access to `field`, e.g. `x.field`.
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.steps.push(PathStep {
            cast: None,
            field: field.into(),
        });
        self
    }

    /// Appends access to `field` on the current object cast to `ty`, e.g.
    /// `((Dog)x).field`.
    pub fn field_as(mut self, ty: ModelId, field: impl Into<String>) -> Self {
        self.steps.push(PathStep {
            cast: Some(ty),
            field: field.into(),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Property names traversed by the path, casts omitted.
    pub fn fields(&self) -> impl Iterator<Item = &str> + '_ {
        self.steps.iter().map(|step| step.field.as_str())
    }
}

impl From<&str> for Path {
    /// Parses an uncast dotted member path.
    fn from(value: &str) -> Self {
        value
            .split('.')
            .filter(|segment| !segment.is_empty())
            .fold(Path::root(), Path::field)
    }
}

impl From<PathStep> for Path {
    fn from(value: PathStep) -> Self {
        Self { steps: vec![value] }
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rendered = String::from("x");

        for step in &self.steps {
            rendered = match step.cast {
                Some(ty) => format!("(({ty:?}){rendered}).{}", step.field),
                None => format!("{rendered}.{}", step.field),
            };
        }

        f.write_str(&rendered)
    }
}

impl fmt::Debug for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cast {
            Some(ty) => write!(f, "({ty:?}).{}", self.field),
            None => write!(f, ".{}", self.field),
        }
    }
}
