//! Attribute introspection for SeaORM entities.
//!
//! A [`RecordSchema`] is rebuilt from the entity definition on every query,
//! so it is always in sync with the model and needs no registry. Only basic
//! attributes (table columns) are queryable; relations are listed so callers
//! can see them, but filters and sort keys naming them are dropped.

use std::collections::HashMap;

use query_core::AttrType;
use sea_orm::sea_query::ColumnType;
use sea_orm::{ColumnTrait, EntityName, EntityTrait, Iden, IdenStatic, Iterable, PrimaryKeyToColumn};

use crate::error::{DaoError, DaoResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttributeKind {
    Basic,
    Relational,
}

/// Public view of one record attribute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeMeta {
    pub name: String,
    pub kind: AttributeKind,
    /// `None` for relations and for columns whose type has no comparison support.
    pub attr_type: Option<AttrType>,
    pub primary_key: bool,
}

/// A queryable column together with its introspected metadata.
#[derive(Clone)]
pub struct Field<E: EntityTrait> {
    pub col: E::Column,
    pub meta: AttributeMeta,
}

impl<E: EntityTrait> Field<E> {
    pub fn name(&self) -> &str {
        &self.meta.name
    }

    pub fn attr_type(&self) -> Option<&AttrType> {
        self.meta.attr_type.as_ref()
    }
}

#[derive(Clone)]
pub struct RecordSchema<E: EntityTrait> {
    table: String,
    fields: Vec<Field<E>>,
    index: HashMap<String, usize>,
    relations: Vec<AttributeMeta>,
}

impl<E: EntityTrait> RecordSchema<E> {
    pub fn of() -> Self {
        let key_columns: Vec<String> = E::PrimaryKey::iter()
            .map(|pk| pk.into_column().as_str().to_owned())
            .collect();

        let fields: Vec<Field<E>> = E::Column::iter()
            .map(|col| {
                let name = col.as_str().to_owned();
                let primary_key = key_columns.contains(&name);
                Field {
                    col,
                    meta: AttributeMeta {
                        name,
                        kind: AttributeKind::Basic,
                        attr_type: attr_type_of(col.def().get_column_type()),
                        primary_key,
                    },
                }
            })
            .collect();

        let index = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.meta.name.clone(), i))
            .collect();

        let relations = E::Relation::iter()
            .map(|rel| AttributeMeta {
                name: snake_case(&format!("{rel:?}")),
                kind: AttributeKind::Relational,
                attr_type: None,
                primary_key: false,
            })
            .collect();

        Self {
            table: table_name::<E>(),
            fields,
            index,
            relations,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Basic attributes first, then relations, each in declaration order.
    pub fn attributes(&self) -> impl Iterator<Item = &AttributeMeta> {
        self.fields
            .iter()
            .map(|f| &f.meta)
            .chain(self.relations.iter())
    }

    /// Exact-name lookup of a queryable attribute.
    pub fn field(&self, name: &str) -> Option<&Field<E>> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    /// True only for a basic attribute with this exact name.
    pub fn is_queryable(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Basic attributes of string type, the targets of keyword search.
    pub fn string_fields(&self) -> impl Iterator<Item = &Field<E>> {
        self.fields
            .iter()
            .filter(|f| matches!(f.meta.attr_type, Some(AttrType::String)))
    }

    pub fn primary_key(&self) -> DaoResult<Vec<E::Column>> {
        let cols = self
            .fields
            .iter()
            .filter(|f| f.meta.primary_key)
            .map(|f| f.col)
            .collect();
        require_key(&self.table, cols)
    }
}

/// A record type without key columns cannot be looked up, merged or removed.
fn require_key<C>(table: &str, cols: Vec<C>) -> DaoResult<Vec<C>> {
    if cols.is_empty() {
        return Err(DaoError::Schema(format!(
            "record type `{table}` declares no key attribute"
        )));
    }
    Ok(cols)
}

/// Shorthand for `RecordSchema::<E>::of().is_queryable(name)`.
pub fn is_queryable<E: EntityTrait>(name: &str) -> bool {
    RecordSchema::<E>::of().is_queryable(name)
}

pub(crate) fn table_name<E: EntityTrait>() -> String {
    E::default().table_name().to_owned()
}

fn attr_type_of(column_type: &ColumnType) -> Option<AttrType> {
    let attr = match column_type {
        ColumnType::Char(_) | ColumnType::String(_) | ColumnType::Text => AttrType::String,
        ColumnType::TinyInteger => AttrType::TinyInt,
        // unsigned columns widen into the next signed type
        ColumnType::SmallInteger | ColumnType::TinyUnsigned => AttrType::SmallInt,
        ColumnType::Integer | ColumnType::SmallUnsigned => AttrType::Int,
        ColumnType::BigInteger | ColumnType::Unsigned => AttrType::BigInt,
        ColumnType::Float => AttrType::Float,
        ColumnType::Double => AttrType::Double,
        ColumnType::Decimal(_) | ColumnType::Money(_) => AttrType::Decimal,
        ColumnType::Boolean => AttrType::Bool,
        ColumnType::Uuid => AttrType::Uuid,
        ColumnType::Date => AttrType::Date,
        ColumnType::Time => AttrType::Time,
        ColumnType::DateTime | ColumnType::Timestamp => AttrType::DateTime,
        ColumnType::TimestampWithTimeZone => AttrType::DateTimeUtc,
        ColumnType::Enum { variants, .. } => {
            AttrType::Enum(variants.iter().map(|v| v.to_string()).collect())
        }
        _ => return None,
    };
    Some(attr)
}

fn snake_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for (i, ch) in s.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}
