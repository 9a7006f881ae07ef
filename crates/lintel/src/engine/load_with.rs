//! Eager loading of navigation paths.
//!
//! Load paths are merged into a tree of phases. A phase loads one
//! association for the objects produced by its parent phase (or by the
//! primary fetch), so phases run strictly in creation order: a phase's fetch
//! keys are read off its parent's materialized results.
//!
//! Fetched objects are kept in one arena level per phase and linked to their
//! owners by index. Once every phase has run, the levels are folded back into
//! their owners deepest first, which yields the final object graph.

use super::{key_columns, Engine};
use crate::Result;

use indexmap::{IndexMap, IndexSet};
use lintel_core::{
    schema::{Association, Column, ModelId},
    stmt::{Filter, LoadPath, Object, Value},
    Error, Schema,
};
use tracing::debug;

#[derive(Debug)]
pub(super) struct Plan<'a> {
    phases: Vec<Phase<'a>>,
    state: State,
}

#[derive(Debug)]
struct Phase<'a> {
    /// Phase whose fetched objects own the navigation. `None` when the owners
    /// are the primary results.
    parent: Option<usize>,

    /// Runtime type an owner must have for the step to apply
    owner: ModelId,

    association: &'a Association,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Planned,
    PrimaryFetched,
    Stitching(usize),
    Done,
}

/// What a single owner's navigation property receives.
#[derive(Debug)]
enum Link {
    One(usize),

    /// Key set but no related row
    Null,

    Many(Vec<usize>),
}

/// Result of running one phase.
struct Loaded {
    objects: Vec<Object>,

    /// Owner index in the parent level, and the link to set on it
    links: Vec<(usize, Link)>,
}

impl<'a> Plan<'a> {
    pub(super) fn new(schema: &'a Schema, root: ModelId, paths: &[LoadPath]) -> Result<Self> {
        let mut phases: Vec<Phase<'a>> = vec![];

        for path in paths {
            let mut parent = None;
            let mut current = root;

            for step in &path.steps {
                let owner = match step.cast {
                    None => current,
                    // An upcast never narrows the eligible owners
                    Some(ty) if schema.is_subtype(current, ty) => current,
                    Some(ty) if schema.is_related(current, ty) => ty,
                    Some(ty) => {
                        return Err(Error::invalid_expression(format!(
                            "cannot cast `{}` to `{}` in load path {path:?}",
                            schema.model(current).name,
                            schema.model(ty).name
                        )))
                    }
                };

                let association = schema
                    .model(owner)
                    .association(&step.field)
                    .ok_or_else(|| {
                        Error::invalid_expression(format!(
                            "`{}` is not a navigation property of `{}`",
                            step.field,
                            schema.model(owner).name
                        ))
                    })?;

                let existing = phases.iter().position(|phase| {
                    phase.parent == parent
                        && phase.owner == owner
                        && phase.association.name == association.name
                });

                let index = match existing {
                    Some(index) => index,
                    None => {
                        phases.push(Phase {
                            parent,
                            owner,
                            association,
                        });
                        phases.len() - 1
                    }
                };

                parent = Some(index);
                current = association.target;
            }
        }

        debug!(phases = phases.len(), "planned eager load");

        Ok(Plan {
            phases,
            state: State::Planned,
        })
    }

    /// Loads every phase for the primary results in `objects` and stitches
    /// the related objects onto them.
    pub(super) async fn exec(&mut self, engine: &Engine<'_>, objects: &mut Vec<Object>) -> Result<()> {
        self.transition(State::PrimaryFetched);

        let mut arena = vec![std::mem::take(objects)];
        let mut links = Vec::with_capacity(self.phases.len());

        for i in 0..self.phases.len() {
            self.transition(State::Stitching(i));

            let phase = &self.phases[i];
            let owners = &arena[phase.parent.map_or(0, |parent| parent + 1)];
            let loaded = load(engine, phase, owners).await?;

            arena.push(loaded.objects);
            links.push(loaded.links);
        }

        *objects = self.assemble(arena, links);
        self.transition(State::Done);

        Ok(())
    }

    /// Folds each phase's objects into their owners, deepest phases first.
    fn assemble(&self, mut arena: Vec<Vec<Object>>, links: Vec<Vec<(usize, Link)>>) -> Vec<Object> {
        for (i, (phase, links)) in self.phases.iter().zip(links).enumerate().rev() {
            let (head, tail) = arena.split_at_mut(i + 1);
            let fetched = &tail[0];
            let owners = &mut head[phase.parent.map_or(0, |parent| parent + 1)];

            for (owner, link) in links {
                let value = match link {
                    Link::One(index) => Value::Object(fetched[index].clone()),
                    Link::Null => Value::Null,
                    Link::Many(indices) => Value::List(
                        indices
                            .into_iter()
                            .map(|index| Value::Object(fetched[index].clone()))
                            .collect(),
                    ),
                };

                owners[owner].set(phase.association.name.clone(), value);
            }
        }

        arena.into_iter().next().unwrap_or_default()
    }

    fn transition(&mut self, to: State) {
        debug!(from = ?self.state, ?to, "eager load");
        self.state = to;
    }
}

/// Runs one phase against its owners.
async fn load(engine: &Engine<'_>, phase: &Phase<'_>, owners: &[Object]) -> Result<Loaded> {
    let schema: &Schema = engine.schema;
    let association = phase.association;

    let owner_keys = key_columns(schema.model(phase.owner), &association.owner_keys)?;
    let target_keys = key_columns(schema.model(association.target), &association.target_keys)?;

    let mut keys = IndexSet::new();
    let mut owner_links = vec![];

    for (index, owner) in owners.iter().enumerate() {
        let eligible = owner
            .model()
            .is_some_and(|ty| schema.is_subtype(ty, phase.owner));

        if !eligible {
            continue;
        }

        // Owners with a null key keep the navigation unset
        let Some(key) = engine.key_values(owner, &owner_keys, &target_keys)? else {
            continue;
        };

        keys.insert(key.clone());
        owner_links.push((index, key));
    }

    debug!(
        association = %association.name,
        owners = owner_links.len(),
        keys = keys.len(),
        "collected keys"
    );

    if keys.is_empty() {
        debug!(association = %association.name, "no keys; skipping fetch");
        return Ok(Loaded {
            objects: vec![],
            links: vec![],
        });
    }

    let filter = Filter::and([
        engine.scope(association.target)?,
        key_filter(schema, &target_keys, &keys)?,
    ]);

    let objects = engine
        .fetch(association.target, filter, None)
        .await?
        .iter()
        .map(|row| engine.materialize(row, association.target))
        .collect::<Result<Vec<_>>>()?;

    let mut by_key: IndexMap<Vec<Value>, Vec<usize>> = IndexMap::new();

    for (index, object) in objects.iter().enumerate() {
        let key = target_keys
            .iter()
            .map(|column| object.get_path(&column.path).cloned().unwrap_or_default())
            .collect();

        by_key.entry(key).or_default().push(index);
    }

    let links = owner_links
        .into_iter()
        .map(|(owner, key)| {
            let matches = by_key.get(&key).map(Vec::as_slice).unwrap_or_default();

            let link = match matches {
                _ if association.is_many() => Link::Many(matches.to_vec()),
                [] => Link::Null,
                [index] => Link::One(*index),
                _ => {
                    return Err(Error::invalid_result(format!(
                        "`{}` matched {} rows but holds at most one",
                        association.name,
                        matches.len()
                    )))
                }
            };

            Ok((owner, link))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Loaded { objects, links })
}

/// `target_keys IN keys`, with values in parameter form.
fn key_filter(schema: &Schema, target_keys: &[&Column], keys: &IndexSet<Vec<Value>>) -> Result<Filter> {
    let param = |column: &Column, value: &Value| {
        schema
            .converters
            .to_param(value.clone(), &column.ty, &column.stored_ty())
    };

    if let [column] = target_keys {
        let values = keys
            .iter()
            .map(|key| param(*column, &key[0]))
            .collect::<Result<Vec<_>>>()?;

        return Ok(Filter::in_list(column.name.clone(), values));
    }

    let alternatives = keys
        .iter()
        .map(|key| {
            let parts = target_keys
                .iter()
                .zip(key)
                .map(|(column, value)| Ok(Filter::eq(column.name.clone(), param(*column, value)?)))
                .collect::<Result<Vec<_>>>()?;

            Ok(Filter::and(parts))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Filter::or(alternatives))
}
