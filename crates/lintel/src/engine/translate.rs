//! Compiles predicate expressions into storage filters.
//!
//! A member path is resolved level by level. The queried object is the first
//! level; each hop through a to-one association opens a new level, which is
//! compiled to a semi-join on the association's keys. Casts change the model a
//! level's members are resolved against, and a downcast that no type check in
//! the enclosing conjunction vouches for scopes its level to the discriminator
//! values of the cast type (see [`CastScope`]).

use super::{key_columns, Engine};
use crate::{db::CastScope, Result};

use lintel_core::{
    err,
    schema::{Association, Column, ModelId},
    stmt::{
        BinaryOp, Expr, ExprBinaryOp, ExprInList, ExprIsType, FieldPath, Filter, FilterSubquery,
        Path, Type, Value,
    },
    Error, Schema,
};

impl Engine<'_> {
    /// Compiles `expr`, a predicate over instances of `model`.
    pub(crate) fn translate(&self, model: ModelId, expr: &Expr) -> Result<Filter> {
        Translate {
            engine: self,
            model,
        }
        .expr(expr, &[])
    }
}

struct Translate<'a, 'e> {
    engine: &'a Engine<'e>,
    model: ModelId,
}

/// A type check known to hold for the object at `fields`.
#[derive(Debug, Clone)]
struct Guard {
    fields: Vec<String>,
    ty: ModelId,
}

/// A member path resolved against the mapping.
struct Resolved<'e> {
    /// Levels left through an association, outermost first
    outer: Vec<Level<'e>>,

    /// Level the path ends on
    current: Level<'e>,

    leaf: Leaf<'e>,
}

struct Level<'e> {
    /// Model members are resolved against, after casts
    model: ModelId,

    /// Downcast the level's rows must satisfy
    scope: Option<ModelId>,

    /// How the level was reached from the previous one
    entered: Option<Hop<'e>>,
}

struct Hop<'e> {
    owner: ModelId,
    association: &'e Association,
}

enum Leaf<'e> {
    Column(&'e Column),

    /// The level's object itself
    Object,

    /// A nested value object
    Embedded(FieldPath),

    /// A navigation property of the level's object
    Association(&'e Association),
}

impl Guard {
    fn from_expr(expr: &Expr) -> Option<Guard> {
        match expr {
            Expr::IsType(is_type) => Some(Guard {
                fields: is_type.path.fields().map(String::from).collect(),
                ty: is_type.ty,
            }),
            _ => None,
        }
    }

    fn covers(&self, schema: &Schema, fields: &[&str], ty: ModelId) -> bool {
        self.fields.iter().map(String::as_str).eq(fields.iter().copied())
            && schema.is_subtype(self.ty, ty)
    }
}

impl<'e> Level<'e> {
    fn new(model: ModelId, entered: Option<Hop<'e>>) -> Self {
        Level {
            model,
            scope: None,
            entered,
        }
    }
}

impl<'e> Resolved<'e> {
    /// Steps through the association the path ends on, making its target the
    /// current object.
    fn enter_association(&mut self) -> Result<()> {
        let Leaf::Association(association) = self.leaf else {
            return Ok(());
        };

        if association.is_many() {
            return Err(Error::invalid_expression(format!(
                "`{}` holds a list and cannot be navigated in a predicate",
                association.name
            )));
        }

        let next = Level::new(
            association.target,
            Some(Hop {
                owner: self.current.model,
                association,
            }),
        );
        self.outer.push(std::mem::replace(&mut self.current, next));
        self.leaf = Leaf::Object;

        Ok(())
    }
}

impl<'e> Translate<'_, 'e> {
    fn schema(&self) -> &'e Schema {
        self.engine.schema
    }

    fn expr(&self, expr: &Expr, guards: &[Guard]) -> Result<Filter> {
        match expr {
            Expr::And(operands) => {
                let mut scoped = guards.to_vec();
                scoped.extend(operands.iter().filter_map(Guard::from_expr));

                let filters = operands
                    .iter()
                    .map(|operand| self.expr(operand, &scoped))
                    .collect::<Result<Vec<_>>>()?;

                Ok(Filter::and(filters))
            }
            Expr::Or(operands) => {
                let filters = operands
                    .iter()
                    .map(|operand| self.expr(operand, guards))
                    .collect::<Result<Vec<_>>>()?;

                Ok(Filter::or(filters))
            }
            Expr::Not(operand) => Ok(Filter::not(self.expr(operand, guards)?)),
            Expr::BinaryOp(expr) => self.binary_op(expr, guards),
            Expr::IsNull(path) => self.is_null(path, guards),
            Expr::InList(expr) => self.in_list(expr, guards),
            Expr::IsType(expr) => self.is_type(expr, guards),
            Expr::Member(path) => self.member(path, guards),
            Expr::Value(Value::Bool(true)) => Ok(Filter::True),
            Expr::Value(Value::Bool(false)) => Ok(Filter::False),
            Expr::Value(value) => Err(Error::invalid_expression(format!(
                "{value} is not a predicate"
            ))),
        }
    }

    fn binary_op(&self, expr: &ExprBinaryOp, guards: &[Guard]) -> Result<Filter> {
        let (path, op, value) = match (&*expr.lhs, &*expr.rhs) {
            (Expr::Member(path), Expr::Value(value)) => (path, expr.op, value),
            (Expr::Value(value), Expr::Member(path)) => (path, expr.op.commute(), value),
            (Expr::Value(lhs), Expr::Value(rhs)) => {
                let holds = lhs
                    .compare(rhs)
                    .is_some_and(|ordering| expr.op.holds(ordering));
                return Ok(if holds { Filter::True } else { Filter::False });
            }
            _ => {
                return Err(Error::invalid_expression(format!(
                    "`{:?} {} {:?}` must compare a member with a value",
                    expr.lhs, expr.op, expr.rhs
                )))
            }
        };

        let resolved = self.resolve(path, guards)?;

        let leaf = match &resolved.leaf {
            Leaf::Column(column) => self.compare(column, op, value)?,
            Leaf::Association(association) if value.is_null() && (op.is_eq() || op.is_ne()) => {
                let is_null = self.association_is_null(resolved.current.model, association)?;
                if op.is_eq() {
                    is_null
                } else {
                    Filter::not(is_null)
                }
            }
            _ => {
                return Err(Error::invalid_expression(format!(
                    "`{path:?}` is not a column and cannot be compared with {value}"
                )))
            }
        };

        self.wrap(&resolved, leaf)
    }

    fn is_null(&self, path: &Path, guards: &[Guard]) -> Result<Filter> {
        let resolved = self.resolve(path, guards)?;

        let leaf = match &resolved.leaf {
            Leaf::Column(column) => Filter::is_null(&column.name),
            Leaf::Association(association) => {
                self.association_is_null(resolved.current.model, association)?
            }
            Leaf::Embedded(prefix) => Filter::and(
                self.schema()
                    .model(resolved.current.model)
                    .columns()
                    .filter(|column| is_under(&column.path, prefix))
                    .map(|column| Filter::is_null(&column.name)),
            ),
            // The queried object itself is never null
            Leaf::Object => Filter::False,
        };

        self.wrap(&resolved, leaf)
    }

    fn in_list(&self, expr: &ExprInList, guards: &[Guard]) -> Result<Filter> {
        let resolved = self.resolve(&expr.path, guards)?;

        let Leaf::Column(column) = resolved.leaf else {
            return Err(Error::invalid_expression(format!(
                "`{:?}` is not a column and cannot be matched against a list",
                expr.path
            )));
        };

        let values = expr
            .values
            .iter()
            .map(|value| self.param(column, value))
            .collect::<Result<Vec<_>>>()?;

        self.wrap(&resolved, Filter::in_list(column.name.clone(), values))
    }

    fn is_type(&self, expr: &ExprIsType, guards: &[Guard]) -> Result<Filter> {
        let mut resolved = self.resolve(&expr.path, guards)?;
        resolved.enter_association()?;

        if !matches!(resolved.leaf, Leaf::Object) {
            return Err(Error::invalid_expression(format!(
                "`{:?}` does not reference an entity",
                expr.path
            )));
        }

        let schema = self.schema();
        let current = resolved.current.model;

        let leaf = if schema.is_subtype(current, expr.ty) {
            Filter::True
        } else if schema.is_related(current, expr.ty) {
            self.engine.discriminator_filter(expr.ty)?
        } else {
            return Err(Error::invalid_expression(format!(
                "`{}` can never be a `{}`",
                schema.model(current).name,
                schema.model(expr.ty).name
            )));
        };

        self.wrap(&resolved, leaf)
    }

    /// A boolean member used as a predicate on its own.
    fn member(&self, path: &Path, guards: &[Guard]) -> Result<Filter> {
        let resolved = self.resolve(path, guards)?;

        match resolved.leaf {
            Leaf::Column(column) if column.ty == Type::Bool => {
                let leaf = self.compare(column, BinaryOp::Eq, &Value::Bool(true))?;
                self.wrap(&resolved, leaf)
            }
            _ => Err(Error::invalid_expression(format!(
                "`{path:?}` is not a boolean column"
            ))),
        }
    }

    fn compare(&self, column: &Column, op: BinaryOp, value: &Value) -> Result<Filter> {
        if value.is_null() {
            return Ok(match op {
                BinaryOp::Eq => Filter::is_null(&column.name),
                BinaryOp::Ne => Filter::not(Filter::is_null(&column.name)),
                _ => Filter::False,
            });
        }

        let filter = Filter::compare(column.name.clone(), op, self.param(column, value)?);

        // A stored comparison never matches NULL, yet a missing value differs
        // from every literal.
        if op == BinaryOp::Ne && column.nullable {
            return Ok(Filter::or([filter, Filter::is_null(&column.name)]));
        }

        Ok(filter)
    }

    /// Converts a value compared against `column` with the parameter-oriented
    /// converters.
    fn param(&self, column: &Column, value: &Value) -> Result<Value> {
        self.schema()
            .converters
            .to_param(value.clone(), &column.ty, &column.stored_ty())
            .map_err(|e| e.context(err!("filtering on `{}`", column.path)))
    }

    fn association_is_null(&self, owner: ModelId, association: &Association) -> Result<Filter> {
        let owner = self.schema().model(owner);
        let keys = key_columns(owner, &association.owner_keys)?;

        Ok(Filter::or(
            keys.into_iter().map(|column| Filter::is_null(&column.name)),
        ))
    }

    fn resolve(&self, path: &Path, guards: &[Guard]) -> Result<Resolved<'e>> {
        let schema = self.schema();
        let mut outer = vec![];
        let mut current = Level::new(self.model, None);
        let mut nested: Vec<&str> = vec![];

        for (i, step) in path.steps.iter().enumerate() {
            let is_last = i + 1 == path.steps.len();

            if let Some(ty) = step.cast {
                if !nested.is_empty() {
                    return Err(Error::invalid_expression(format!(
                        "`{path:?}` casts a nested value object"
                    )));
                }

                let prefix: Vec<&str> = path.steps[..i]
                    .iter()
                    .map(|step| step.field.as_str())
                    .collect();

                self.cast(&mut current, ty, &prefix, guards)?;
            }

            let model = schema.model(current.model);

            if nested.is_empty() {
                if let Some(association) = model.association(&step.field) {
                    let mut resolved = Resolved {
                        outer,
                        current,
                        leaf: Leaf::Association(association),
                    };

                    if is_last {
                        return Ok(resolved);
                    }

                    resolved.enter_association()?;
                    outer = resolved.outer;
                    current = resolved.current;
                    continue;
                }
            }

            nested.push(&step.field);

            if let Some(column) = model.column_by_names(&nested) {
                if !is_last {
                    return Err(Error::invalid_expression(format!(
                        "`{}` is a column of `{}` and has no members",
                        column.path, model.name
                    )));
                }

                return Ok(Resolved {
                    outer,
                    current,
                    leaf: Leaf::Column(column),
                });
            }

            let prefix = FieldPath::new(nested.iter().copied());
            if !model.columns().any(|column| is_under(&column.path, &prefix)) {
                return Err(Error::invalid_expression(format!(
                    "`{}` has no mapped member `{prefix}`",
                    model.name
                )));
            }
        }

        let leaf = if nested.is_empty() {
            Leaf::Object
        } else {
            Leaf::Embedded(FieldPath::new(nested))
        };

        Ok(Resolved {
            outer,
            current,
            leaf,
        })
    }

    /// Applies `(ty)` to the object of `level`, found at `fields`.
    fn cast(&self, level: &mut Level<'e>, ty: ModelId, fields: &[&str], guards: &[Guard]) -> Result<()> {
        let schema = self.schema();

        // Upcasts never restrict which members resolve
        if schema.is_subtype(level.model, ty) {
            return Ok(());
        }

        if !schema.is_subtype(ty, level.model) {
            return Err(Error::invalid_expression(format!(
                "cannot cast `{}` to `{}`",
                schema.model(level.model).name,
                schema.model(ty).name
            )));
        }

        level.model = ty;

        let guarded = guards.iter().any(|guard| guard.covers(schema, fields, ty));

        if !guarded && self.engine.config.cast_scope == CastScope::Implicit {
            level.scope = Some(ty);
        }

        Ok(())
    }

    /// Wraps a leaf filter in the scopes and semi-joins of the levels leading
    /// to it.
    fn wrap(&self, resolved: &Resolved<'e>, leaf: Filter) -> Result<Filter> {
        let schema = self.schema();
        let mut filter = leaf;

        for level in std::iter::once(&resolved.current).chain(resolved.outer.iter().rev()) {
            if let Some(ty) = level.scope {
                filter = Filter::and([self.engine.discriminator_filter(ty)?, filter]);
            }

            let Some(hop) = &level.entered else {
                continue;
            };

            let owner = schema.model(hop.owner);
            let target = schema.model(hop.association.target);

            filter = Filter::InSubquery(FilterSubquery {
                columns: column_names(key_columns(owner, &hop.association.owner_keys)?),
                table: target.table.clone(),
                target_columns: column_names(key_columns(target, &hop.association.target_keys)?),
                filter: Box::new(Filter::and([self.engine.scope(target.id)?, filter])),
            });
        }

        Ok(filter)
    }
}

/// Returns true if `path` is a leaf below the nested value object `prefix`.
fn is_under(path: &FieldPath, prefix: &FieldPath) -> bool {
    path.len() > prefix.len() && path.segments().starts_with(prefix.segments())
}

fn column_names(columns: Vec<&Column>) -> Vec<String> {
    columns.into_iter().map(|column| column.name.clone()).collect()
}
