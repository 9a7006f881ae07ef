mod model;
pub use model::{AssociationBuilder, ColumnBuilder, ModelBuilder};

use super::{db, Association, Column, Discriminator, Hierarchy, Model, ModelId, Schema};
use crate::stmt::{FieldPath, Value};
use crate::{Converters, Error, Result};

use indexmap::IndexMap;
use std::sync::Arc;

/// Accumulates entity registrations and converts them into an immutable
/// [`Schema`].
#[derive(Debug)]
pub struct Builder {
    converters: Converters,

    /// Declarations by model name, in registration order
    models: IndexMap<String, ModelDecl>,
}

#[derive(Debug, Default)]
pub(super) struct ModelDecl {
    name: String,
    table: Option<String>,
    parent: Option<String>,
    discriminator_value: Option<Value>,
    subtypes: Vec<(String, Value)>,
    columns: Vec<ColumnBuilder>,
    excluded: Vec<FieldPath>,
    associations: Vec<AssociationBuilder>,
}

/// Used to track state during the build process
struct BuildSchema<'a> {
    converters: &'a Converters,
    decls: Vec<ModelDecl>,
    ids: IndexMap<String, ModelId>,
    parents: Vec<Option<ModelId>>,
    values: Vec<Option<Value>>,
    roots: Vec<ModelId>,
    /// Model indices ordered so that parents precede children
    order: Vec<usize>,
}

impl Builder {
    pub fn new(converters: Converters) -> Self {
        Self {
            converters,
            models: IndexMap::new(),
        }
    }

    pub fn converters(&self) -> &Converters {
        &self.converters
    }

    /// Registers `name`, or reopens its registration, and returns a builder
    /// accumulating its mapping.
    pub fn model(&mut self, name: &str) -> ModelBuilder<'_> {
        let decl = self
            .models
            .entry(name.to_string())
            .or_insert_with(|| ModelDecl {
                name: name.to_string(),
                ..ModelDecl::default()
            });

        ModelBuilder { decl }
    }

    /// Validates the registrations and freezes them into a [`Schema`].
    pub fn build(self) -> Result<Schema> {
        let Builder { converters, models } = self;

        let mut build = BuildSchema {
            converters: &converters,
            ids: models
                .keys()
                .enumerate()
                .map(|(index, name)| (name.clone(), ModelId(index)))
                .collect(),
            parents: vec![None; models.len()],
            values: models
                .values()
                .map(|decl| decl.discriminator_value.clone())
                .collect(),
            roots: vec![],
            order: vec![],
            decls: models.into_values().collect(),
        };

        build.resolve_inheritance()?;
        let tables = build.resolve_tables()?;
        let (columns, associations) = build.merge_mappings()?;
        build.verify_association_keys(&columns, &associations)?;

        let mut schema_models = IndexMap::new();

        for (index, decl) in build.decls.iter().enumerate() {
            let id = ModelId(index);
            schema_models.insert(
                id,
                Model {
                    id,
                    name: decl.name.clone(),
                    table: tables[index].clone(),
                    parent: build.parents[index],
                    children: (0..build.decls.len())
                        .filter(|child| build.parents[*child] == Some(id))
                        .map(ModelId)
                        .collect(),
                    root: build.roots[index],
                    discriminator_value: build.values[index].clone(),
                    columns: columns[index].clone(),
                    associations: associations[index].clone(),
                },
            );
        }

        let hierarchies = build_hierarchies(&schema_models)?;
        let db = build_tables(&schema_models, &hierarchies)?;

        Ok(Schema {
            models: schema_models,
            hierarchies,
            db: Arc::new(db),
            converters,
        })
    }
}

impl BuildSchema<'_> {
    fn lookup(&self, name: &str, referrer: &str) -> Result<ModelId> {
        self.ids.get(name).copied().ok_or_else(|| {
            Error::invalid_mapping(format!("`{referrer}` references unknown model `{name}`"))
        })
    }

    fn name(&self, id: ModelId) -> &str {
        &self.decls[id.0].name
    }

    /// Links parents, collects discriminator values declared from ancestors,
    /// rejects cycles, and orders models parents first.
    fn resolve_inheritance(&mut self) -> Result<()> {
        for (index, decl) in self.decls.iter().enumerate() {
            if let Some(parent) = &decl.parent {
                self.parents[index] = Some(self.lookup(parent, &decl.name)?);
            }
        }

        let mut declared_from = vec![];

        for (index, decl) in self.decls.iter().enumerate() {
            for (subtype, value) in &decl.subtypes {
                let sub = self.lookup(subtype, &decl.name)?;

                match &self.values[sub.0] {
                    Some(existing) if existing != value => {
                        return Err(Error::invalid_mapping(format!(
                            "`{subtype}` declares discriminator value {existing} but `{}` assigns it {value}",
                            decl.name
                        )));
                    }
                    _ => self.values[sub.0] = Some(value.clone()),
                }

                if sub.0 != index && self.parents[sub.0].is_none() {
                    self.parents[sub.0] = Some(ModelId(index));
                }

                declared_from.push((ModelId(index), sub));
            }
        }

        let mut depths = vec![0; self.decls.len()];

        for index in 0..self.decls.len() {
            let mut current = ModelId(index);

            while let Some(parent) = self.parents[current.0] {
                depths[index] += 1;
                if depths[index] > self.decls.len() {
                    return Err(Error::invalid_mapping(format!(
                        "inheritance cycle through `{}`",
                        self.decls[index].name
                    )));
                }
                current = parent;
            }

            self.roots.push(current);
        }

        for (ancestor, sub) in declared_from {
            if !self.is_ancestor_or_self(ancestor, sub) {
                return Err(Error::invalid_mapping(format!(
                    "`{}` declares inheritance for `{}`, which does not derive from it",
                    self.name(ancestor),
                    self.name(sub)
                )));
            }
        }

        self.order = (0..self.decls.len()).collect();
        self.order.sort_by_key(|index| depths[*index]);

        Ok(())
    }

    fn is_ancestor_or_self(&self, ancestor: ModelId, model: ModelId) -> bool {
        let mut current = Some(model);

        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parents[id.0];
        }

        false
    }

    /// Resolves each model's table: the root's table (or the root's name),
    /// which subtypes may only repeat.
    fn resolve_tables(&self) -> Result<Vec<String>> {
        let mut tables = vec![];
        let mut owners: IndexMap<String, ModelId> = IndexMap::new();

        for (index, decl) in self.decls.iter().enumerate() {
            let root = &self.decls[self.roots[index].0];
            let table = root.table.clone().unwrap_or_else(|| root.name.clone());

            if let Some(own) = &decl.table {
                if *own != table {
                    return Err(Error::invalid_mapping(format!(
                        "`{}` maps to table `{own}` but its hierarchy is stored in `{table}`",
                        decl.name
                    )));
                }
            }

            if let Some(owner) = owners.insert(table.clone(), self.roots[index]) {
                if owner != self.roots[index] {
                    return Err(Error::invalid_mapping(format!(
                        "table `{table}` is shared by the hierarchies of `{}` and `{}`",
                        self.name(owner),
                        self.name(self.roots[index])
                    )));
                }
            }

            tables.push(table);
        }

        Ok(tables)
    }

    /// Builds each model's merged column and association lists from its
    /// parent's merged lists and its own declarations.
    #[allow(clippy::type_complexity)]
    fn merge_mappings(&self) -> Result<(Vec<Vec<Column>>, Vec<Vec<Association>>)> {
        let mut columns: Vec<Vec<Column>> = vec![vec![]; self.decls.len()];
        let mut associations: Vec<Vec<Association>> = vec![vec![]; self.decls.len()];

        for &index in &self.order {
            let id = ModelId(index);
            let decl = &self.decls[index];

            let (mut merged, mut navigations) = match self.parents[index] {
                Some(parent) => (columns[parent.0].clone(), associations[parent.0].clone()),
                None => (vec![], vec![]),
            };

            for declared in &decl.columns {
                let column = self.build_column(id, declared)?;

                match merged.iter_mut().find(|existing| existing.path == column.path) {
                    Some(existing) => *existing = column,
                    None => merged.push(column),
                }
            }

            for path in &decl.excluded {
                for column in merged.iter_mut().filter(|column| &column.path == path) {
                    if column.discriminator {
                        return Err(Error::invalid_mapping(format!(
                            "`{}` excludes the discriminator `{path}`",
                            decl.name
                        )));
                    }
                    column.excluded = true;
                }
            }

            for declared in &decl.associations {
                let association = self.build_association(id, declared)?;

                match navigations
                    .iter_mut()
                    .find(|existing| existing.name == association.name)
                {
                    Some(existing) => *existing = association,
                    None => navigations.push(association),
                }
            }

            for association in &navigations {
                if merged
                    .iter()
                    .any(|column| !column.excluded && column.path.head() == association.name)
                {
                    return Err(Error::invalid_mapping(format!(
                        "`{}.{}` is declared both as a column and as an association",
                        decl.name, association.name
                    )));
                }
            }

            if merged.iter().filter(|column| column.discriminator).count() > 1 {
                return Err(Error::invalid_mapping(format!(
                    "`{}` declares more than one discriminator column",
                    decl.name
                )));
            }

            columns[index] = merged;
            associations[index] = navigations;
        }

        Ok((columns, associations))
    }

    fn build_column(&self, id: ModelId, declared: &ColumnBuilder) -> Result<Column> {
        let decl = &self.decls[id.0];

        if declared.path.is_empty() {
            return Err(Error::invalid_mapping(format!(
                "`{}` declares a column with an empty property path",
                decl.name
            )));
        }

        if decl.excluded.contains(&declared.path) {
            return Err(Error::invalid_mapping(format!(
                "`{}.{}` is declared both as a column and as excluded",
                decl.name, declared.path
            )));
        }

        if declared.discriminator && self.parents[id.0].is_some() {
            return Err(Error::invalid_mapping(format!(
                "`{}` declares discriminator `{}` but is not a hierarchy root",
                decl.name, declared.path
            )));
        }

        if !declared.ty.is_scalar() {
            return Err(Error::invalid_mapping(format!(
                "`{}.{}` has type {:?}, which cannot be stored in a column",
                decl.name, declared.path, declared.ty
            )));
        }

        let storage_ty = match declared.storage_ty {
            Some(storage_ty) => storage_ty,
            None => db::Type::from_app(&declared.ty, self.converters)?,
        };

        Ok(Column {
            name: declared
                .name
                .clone()
                .unwrap_or_else(|| declared.path.segments().join("_")),
            path: declared.path.clone(),
            ty: declared.ty.clone(),
            storage_ty,
            nullable: declared.nullable,
            primary_key: declared.primary_key,
            discriminator: declared.discriminator,
            excluded: false,
            declared_by: id,
        })
    }

    fn build_association(&self, id: ModelId, declared: &AssociationBuilder) -> Result<Association> {
        let decl = &self.decls[id.0];
        let target = self.lookup(&declared.target, &decl.name)?;

        if declared.owner_keys.len() != declared.target_keys.len() {
            return Err(Error::invalid_mapping(format!(
                "association `{}.{}` pairs {} owner keys with {} target keys",
                decl.name,
                declared.name,
                declared.owner_keys.len(),
                declared.target_keys.len()
            )));
        }

        if declared.owner_keys.is_empty() {
            return Err(Error::invalid_mapping(format!(
                "association `{}.{}` declares no keys",
                decl.name, declared.name
            )));
        }

        Ok(Association {
            name: declared.name.clone(),
            target,
            owner_keys: declared.owner_keys.clone(),
            target_keys: declared.target_keys.clone(),
            cardinality: declared.cardinality,
            declared_by: id,
        })
    }

    /// Association keys must be stored columns on both ends.
    fn verify_association_keys(
        &self,
        columns: &[Vec<Column>],
        associations: &[Vec<Association>],
    ) -> Result<()> {
        let is_stored = |model: ModelId, path: &FieldPath| {
            columns[model.0]
                .iter()
                .any(|column| !column.excluded && &column.path == path)
        };

        for (index, navigations) in associations.iter().enumerate() {
            for association in navigations {
                for (owner_key, target_key) in association.key_pairs() {
                    if !is_stored(ModelId(index), owner_key) {
                        return Err(Error::invalid_mapping(format!(
                            "association `{}.{}` uses `{owner_key}`, which is not a column of `{}`",
                            self.decls[index].name,
                            association.name,
                            self.decls[index].name
                        )));
                    }

                    if !is_stored(association.target, target_key) {
                        return Err(Error::invalid_mapping(format!(
                            "association `{}.{}` targets `{target_key}`, which is not a column of `{}`",
                            self.decls[index].name,
                            association.name,
                            self.name(association.target)
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}

fn build_hierarchies(models: &IndexMap<ModelId, Model>) -> Result<IndexMap<ModelId, Hierarchy>> {
    let mut hierarchies = IndexMap::new();

    for root in models.values().filter(|model| model.is_root()) {
        let discriminator = root.discriminator_column().map(|column| Discriminator {
            path: column.path.clone(),
            column: column.name.clone(),
            ty: column.ty.clone(),
            storage_ty: column.storage_ty,
        });

        let mut values: IndexMap<Value, ModelId> = IndexMap::new();

        for model in models.values().filter(|model| model.root == root.id) {
            let Some(value) = &model.discriminator_value else {
                continue;
            };

            let Some(discriminator) = &discriminator else {
                return Err(Error::invalid_mapping(format!(
                    "`{}` has discriminator value {value} but `{}` declares no discriminator column",
                    model.name, root.name
                )));
            };

            if value.is_null() || !value.is_a(&discriminator.ty) {
                return Err(Error::invalid_mapping(format!(
                    "discriminator value {value} of `{}` is not a {:?}",
                    model.name, discriminator.ty
                )));
            }

            if let Some(existing) = values.insert(value.clone(), model.id) {
                return Err(Error::invalid_mapping(format!(
                    "discriminator value {value} is used by both `{}` and `{}`",
                    models[&existing].name, model.name
                )));
            }
        }

        hierarchies.insert(
            root.id,
            Hierarchy {
                root: root.id,
                table: root.table.clone(),
                discriminator,
                values,
            },
        );
    }

    Ok(hierarchies)
}

/// Derives one table per hierarchy from the union of its models' columns.
///
/// A column is nullable unless every model in the hierarchy stores it as
/// non-nullable.
fn build_tables(
    models: &IndexMap<ModelId, Model>,
    hierarchies: &IndexMap<ModelId, Hierarchy>,
) -> Result<db::Schema> {
    let mut tables = IndexMap::new();

    for hierarchy in hierarchies.values() {
        let members: Vec<&Model> = models
            .values()
            .filter(|model| model.root == hierarchy.root)
            .collect();

        let mut columns: Vec<db::Column> = vec![];
        let mut mapped_by: IndexMap<String, &Column> = IndexMap::new();

        for model in &members {
            for column in model.columns() {
                if let Some(existing) = mapped_by.get(&column.name) {
                    if existing.path != column.path || existing.storage_ty != column.storage_ty {
                        return Err(Error::invalid_mapping(format!(
                            "column `{}` of table `{}` is mapped by both `{}` and `{}`",
                            column.name, hierarchy.table, existing.path, column.path
                        )));
                    }
                    continue;
                }

                mapped_by.insert(column.name.clone(), column);

                let nullable = members.iter().any(|member| {
                    member
                        .column(&column.path)
                        .map_or(true, |mapped| mapped.nullable)
                });

                columns.push(db::Column {
                    name: column.name.clone(),
                    ty: column.storage_ty,
                    nullable,
                    primary_key: column.primary_key,
                });
            }
        }

        tables.insert(
            hierarchy.table.clone(),
            db::Table {
                name: hierarchy.table.clone(),
                columns,
            },
        );
    }

    Ok(db::Schema { tables })
}
