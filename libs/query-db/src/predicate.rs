//! Directives → `sea_orm::Condition` compiler.
//!
//! Every directive compiles on its own; the surviving conditions are AND-ed.
//! A directive that cannot be compiled (unknown attribute, uncoercible value,
//! operator/type mismatch) is logged and dropped, so a bad directive narrows
//! nothing instead of failing the whole query.

use query_core::{
    accent_folds, coerce, coerce_many, keyword_pattern, AttrType, Directive, DirectiveError, DirectiveResult,
    DirectiveSet, FilterDirective, Operator, SortDir, TypedValue,
};
use sea_orm::sea_query::{Alias, Expr, Func, LikeExpr, Order, SimpleExpr};
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryOrder, Select, Value};
use tracing::debug;

use crate::schema::RecordSchema;

/// Converts a coerced directive value into a store value.
pub fn to_sea_value(v: TypedValue) -> Value {
    match v {
        TypedValue::String(s) | TypedValue::Enum(s) => s.into(),
        TypedValue::TinyInt(i) => i.into(),
        TypedValue::SmallInt(i) => i.into(),
        TypedValue::Int(i) => i.into(),
        TypedValue::BigInt(i) => i.into(),
        TypedValue::Float(f) => f.into(),
        TypedValue::Double(f) => f.into(),
        TypedValue::Decimal(d) => d.into(),
        TypedValue::Bool(b) => b.into(),
        TypedValue::Uuid(u) => u.into(),
        TypedValue::Date(d) => d.into(),
        TypedValue::Time(t) => t.into(),
        TypedValue::DateTime(dt) => dt.into(),
        TypedValue::DateTimeUtc(dt) => dt.into(),
    }
}

/// Compiles one filter against a resolved column.
///
/// `attr` is the column's introspected type; `None` means the column cannot
/// be compared and the filter is rejected.
pub fn filter_condition<C>(
    directive: &FilterDirective,
    col: C,
    attr: Option<&AttrType>,
) -> DirectiveResult<Condition>
where
    C: ColumnTrait + Copy,
{
    let attr = attr.ok_or_else(|| DirectiveError::Incomparable(directive.name().to_owned()))?;
    let values = directive.values();

    Ok(match directive.op() {
        Operator::Equal => any_value(col, attr, values, |e, v| e.eq(v))?,
        Operator::NotEqual => any_value(col, attr, values, |e, v| e.eq(v))?.not(),
        Operator::Like => like(col, attr, directive)?,
        Operator::NotLike => like(col, attr, directive)?.not(),
        Operator::GreaterThan => any_value(col, attr, values, |e, v| e.gt(v))?,
        Operator::GreaterThanOrEqual => any_value(col, attr, values, |e, v| e.gte(v))?,
        Operator::LessThan => any_value(col, attr, values, |e, v| e.lt(v))?,
        Operator::LessThanOrEqual => any_value(col, attr, values, |e, v| e.lte(v))?,
        Operator::In => in_list(col, attr, values)?,
        Operator::NotIn => in_list(col, attr, values)?.not(),
        Operator::Between => between(col, attr, directive)?,
        Operator::NotBetween => between(col, attr, directive)?.not(),
    })
}

/// Case- and accent-insensitive substring match across `cols`.
///
/// Both sides are folded the same way: the keyword in Rust, each column in
/// SQL through `folded`.
///
/// With no string columns there is nothing to narrow by, so the result is
/// the always-true empty conjunction.
pub fn keyword_condition<C, I>(keyword: &str, cols: I) -> DirectiveResult<Condition>
where
    C: ColumnTrait + Copy,
    I: IntoIterator<Item = C>,
{
    let pattern = keyword_pattern(keyword).ok_or(DirectiveError::BlankKeyword)?;

    let mut any = Condition::any();
    let mut matched = false;
    for col in cols {
        any = any.add(
            Expr::expr(folded(col))
                .like(LikeExpr::new(pattern.clone()).escape('\\')),
        );
        matched = true;
    }
    Ok(if matched { any } else { Condition::all() })
}

/// `LOWER(REPLACE(..REPLACE(col, 'À', 'a')..))` over every accent fold.
///
/// `LOWER` alone only folds ASCII on SQLite, so accented capitals are
/// replaced before it runs.
fn folded<C>(col: C) -> SimpleExpr
where
    C: ColumnTrait + Copy,
{
    let replaced = accent_folds()
        .iter()
        .fold(SimpleExpr::from(Expr::col(col)), |expr, (from, to)| {
            Func::cust(Alias::new("REPLACE"))
                .arg(expr)
                .arg(Expr::val(from.as_str()))
                .arg(Expr::val(to.as_str()))
                .into()
        });
    Func::lower(replaced).into()
}

/// AND of every filter and keyword directive that compiles against `schema`.
pub fn build_condition<E>(schema: &RecordSchema<E>, directives: &DirectiveSet) -> Condition
where
    E: EntityTrait,
{
    let mut cond = Condition::all();
    for directive in directives.iter() {
        match directive {
            Directive::Filter(f) => {
                let Some(field) = schema.field(f.name()) else {
                    debug!(
                        table = schema.table_name(),
                        attribute = f.name(),
                        "dropping filter on non-queryable attribute"
                    );
                    continue;
                };
                match filter_condition(f, field.col, field.attr_type()) {
                    Ok(c) => cond = cond.add(c),
                    Err(e) => debug!(
                        table = schema.table_name(),
                        attribute = f.name(),
                        op = %f.op(),
                        error = %e,
                        "dropping filter"
                    ),
                }
            }
            Directive::Keyword(k) => {
                let cols = schema.string_fields().map(|f| f.col);
                match keyword_condition(k.value(), cols) {
                    Ok(c) => cond = cond.add(c),
                    Err(e) => debug!(table = schema.table_name(), error = %e, "dropping keyword"),
                }
            }
            Directive::Sort(_) | Directive::Paging(_) => {}
        }
    }
    cond
}

/// Applies sort directives in order; earlier keys take precedence.
pub fn apply_sorts<E>(
    mut query: Select<E>,
    schema: &RecordSchema<E>,
    directives: &DirectiveSet,
) -> Select<E>
where
    E: EntityTrait,
{
    for sort in directives.sorts() {
        let Some(field) = schema.field(&sort.name) else {
            debug!(
                table = schema.table_name(),
                attribute = %sort.name,
                "dropping sort on non-queryable attribute"
            );
            continue;
        };
        let order = match sort.dir {
            SortDir::Asc => Order::Asc,
            SortDir::Desc => Order::Desc,
        };
        query = query.order_by(field.col, order);
    }
    query
}

/// OR of `cmp` over the coerced values; no values means "attribute is null".
fn any_value<C, F>(col: C, attr: &AttrType, values: &[String], cmp: F) -> DirectiveResult<Condition>
where
    C: ColumnTrait + Copy,
    F: Fn(Expr, Value) -> SimpleExpr,
{
    let typed = coerce_many(attr, values)?;
    if typed.is_empty() {
        return Ok(Condition::all().add(Expr::col(col).is_null()));
    }
    Ok(typed.into_iter().fold(Condition::any(), |cond, v| {
        cond.add(cmp(Expr::col(col), to_sea_value(v)))
    }))
}

/// Patterns are used as given: `%` and `_` keep their wildcard meaning.
fn like<C>(col: C, attr: &AttrType, directive: &FilterDirective) -> DirectiveResult<Condition>
where
    C: ColumnTrait + Copy,
{
    if !attr.is_text() {
        return Err(DirectiveError::NotText {
            op: directive.op(),
            name: directive.name().to_owned(),
            attr: attr.name(),
        });
    }
    let values = directive.values();
    if values.is_empty() {
        return Ok(Condition::all().add(Expr::col(col).is_null()));
    }
    Ok(values.iter().fold(Condition::any(), |cond, pattern| {
        cond.add(Expr::col(col).like(pattern.clone()))
    }))
}

fn in_list<C>(col: C, attr: &AttrType, values: &[String]) -> DirectiveResult<Condition>
where
    C: ColumnTrait + Copy,
{
    let typed = coerce_many(attr, values)?;
    if typed.is_empty() {
        // IN () → always false
        return Ok(Condition::all().add(Expr::cust("1=0")));
    }
    let vals: Vec<Value> = typed.into_iter().map(to_sea_value).collect();
    Ok(Condition::all().add(Expr::col(col).is_in(vals)))
}

fn between<C>(col: C, attr: &AttrType, directive: &FilterDirective) -> DirectiveResult<Condition>
where
    C: ColumnTrait + Copy,
{
    let (low, high) = directive.between_pair().ok_or(DirectiveError::BetweenArity {
        op: directive.op(),
        got: directive.values().len(),
    })?;
    let low = to_sea_value(coerce(attr, low)?);
    let high = to_sea_value(coerce(attr, high)?);
    Ok(Condition::all().add(Expr::col(col).between(low, high)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, QueryFilter, QueryTrait};

    mod item {
        use sea_orm::entity::prelude::*;

        #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
        #[sea_orm(table_name = "items")]
        pub struct Model {
            #[sea_orm(primary_key, auto_increment = false)]
            pub id: i64,
            pub title: String,
            pub note: Option<String>,
            pub qty: i32,
            pub active: bool,
            pub payload: Option<Vec<u8>>,
        }

        #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
        pub enum Relation {}

        impl ActiveModelBehavior for ActiveModel {}
    }

    fn sql(directives: &DirectiveSet) -> String {
        let schema = RecordSchema::<item::Entity>::of();
        let cond = build_condition(&schema, directives);
        item::Entity::find()
            .filter(cond)
            .build(DbBackend::Sqlite)
            .to_string()
    }

    #[test]
    fn equal_with_several_values_is_a_disjunction() {
        let s = sql(&DirectiveSet::new().filter("qty", Operator::Equal, ["1", "2"]));
        assert!(s.contains(r#""qty" = 1 OR "qty" = 2"#), "sql: {s}");
    }

    #[test]
    fn equal_without_values_is_null_check() {
        let s = sql(&DirectiveSet::new().filter("note", Operator::Equal, Vec::<String>::new()));
        assert!(s.contains(r#""note" IS NULL"#), "sql: {s}");

        let s = sql(&DirectiveSet::new().filter("note", Operator::NotEqual, Vec::<String>::new()));
        assert!(s.contains("NOT"), "sql: {s}");
        assert!(s.contains(r#""note" IS NULL"#), "sql: {s}");
    }

    #[test]
    fn empty_in_list_matches_nothing() {
        let s = sql(&DirectiveSet::new().filter("qty", Operator::In, Vec::<String>::new()));
        assert!(s.contains("1=0"), "sql: {s}");
    }

    #[test]
    fn between_compiles_with_two_values() {
        let s = sql(&DirectiveSet::new().with(FilterDirective::between("qty", "3", "9")));
        assert!(s.contains(r#""qty" BETWEEN 3 AND 9"#), "sql: {s}");
    }

    #[test]
    fn between_with_wrong_arity_is_rejected() {
        let d = FilterDirective::new("qty", Operator::Between, ["3"]);
        let err = filter_condition(&d, item::Column::Qty, Some(&AttrType::Int)).unwrap_err();
        assert_eq!(
            err,
            DirectiveError::BetweenArity {
                op: Operator::Between,
                got: 1
            }
        );
    }

    #[test]
    fn like_on_non_text_attribute_is_rejected() {
        let d = FilterDirective::new("qty", Operator::Like, ["1%"]);
        let err = filter_condition(&d, item::Column::Qty, Some(&AttrType::Int)).unwrap_err();
        assert!(matches!(err, DirectiveError::NotText { .. }));
    }

    #[test]
    fn uncoercible_value_drops_the_filter() {
        let s = sql(
            &DirectiveSet::new()
                .filter("qty", Operator::GreaterThan, ["many"])
                .filter("active", Operator::Equal, ["true"]),
        );
        assert!(!s.contains(r#""qty""#), "sql: {s}");
        assert!(s.contains(r#""active" = "#), "sql: {s}");
    }

    #[test]
    fn unknown_attribute_is_dropped() {
        let s = sql(&DirectiveSet::new().filter("password", Operator::Equal, ["x"]));
        assert!(!s.contains("WHERE"), "sql: {s}");
    }

    #[test]
    fn keyword_targets_every_string_column() {
        let s = sql(&DirectiveSet::new().keyword("Zoë"));
        assert!(s.contains(r#"REPLACE("title", 'À', 'a')"#), "sql: {s}");
        assert!(s.contains(r#"REPLACE("note", 'À', 'a')"#), "sql: {s}");
        assert!(s.contains("'ë', 'e'"), "sql: {s}");
        assert!(s.contains("'É', 'e'"), "sql: {s}");
        assert!(s.contains("LOWER(REPLACE("), "sql: {s}");
        assert_eq!(s.matches("LIKE '%zoe%'").count(), 2, "sql: {s}");
        assert!(!s.contains(r#""qty""#), "sql: {s}");
        assert!(!s.contains(r#""payload""#), "sql: {s}");
    }

    #[test]
    fn filter_on_column_without_comparable_type_is_dropped() {
        let schema = RecordSchema::<item::Entity>::of();
        let field = schema.field("payload").unwrap();
        assert_eq!(field.attr_type(), None);

        let s = sql(&DirectiveSet::new().filter("payload", Operator::Equal, ["00ff"]));
        assert!(!s.contains("WHERE"), "sql: {s}");

        let d = FilterDirective::new("payload", Operator::Equal, ["00ff"]);
        let err = filter_condition(&d, item::Column::Payload, field.attr_type()).unwrap_err();
        assert_eq!(err, DirectiveError::Incomparable("payload".into()));
    }

    #[test]
    fn sort_on_column_without_comparable_type_is_kept() {
        let schema = RecordSchema::<item::Entity>::of();
        let set = DirectiveSet::new().sort("payload", SortDir::Asc);
        let s = apply_sorts(item::Entity::find(), &schema, &set)
            .build(DbBackend::Sqlite)
            .to_string();
        assert!(s.contains(r#"ORDER BY "items"."payload" ASC"#), "sql: {s}");
    }

    #[test]
    fn blank_keyword_is_dropped() {
        let s = sql(&DirectiveSet::new().keyword("   "));
        assert!(!s.contains("WHERE"), "sql: {s}");
    }

    #[test]
    fn keyword_without_string_columns_is_always_true() {
        let cond = keyword_condition("abc", Vec::<item::Column>::new()).unwrap();
        assert!(cond.is_empty());
    }

    #[test]
    fn sorts_apply_in_order() {
        let schema = RecordSchema::<item::Entity>::of();
        let set = DirectiveSet::new()
            .sort("qty", SortDir::Desc)
            .sort("nope", SortDir::Asc)
            .sort("id", SortDir::Asc);
        let s = apply_sorts(item::Entity::find(), &schema, &set)
            .build(DbBackend::Sqlite)
            .to_string();
        assert!(
            s.contains(r#"ORDER BY "items"."qty" DESC, "items"."id" ASC"#),
            "sql: {s}"
        );
    }
}
