//! Request directives: attribute filters, sort keys, keyword search and paging.
//!
//! A [`DirectiveSet`] is built fresh for every request, consumed once by the
//! query layer and then dropped. Nothing here knows about a concrete record
//! type; attribute names are checked against the schema later and silently
//! discarded when they do not resolve.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DirectiveError;

/// Comparison operators available to attribute filters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operator {
    Equal,
    NotEqual,
    Like,
    NotLike,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    In,
    NotIn,
    Between,
    NotBetween,
}

impl Operator {
    pub const ALL: [Operator; 12] = [
        Operator::Equal,
        Operator::NotEqual,
        Operator::Like,
        Operator::NotLike,
        Operator::GreaterThan,
        Operator::GreaterThanOrEqual,
        Operator::LessThan,
        Operator::LessThanOrEqual,
        Operator::In,
        Operator::NotIn,
        Operator::Between,
        Operator::NotBetween,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Equal => "EQUAL",
            Operator::NotEqual => "NOT_EQUAL",
            Operator::Like => "LIKE",
            Operator::NotLike => "NOT_LIKE",
            Operator::GreaterThan => "GREATER_THAN",
            Operator::GreaterThanOrEqual => "GREATER_THAN_OR_EQUAL",
            Operator::LessThan => "LESS_THAN",
            Operator::LessThanOrEqual => "LESS_THAN_OR_EQUAL",
            Operator::In => "IN",
            Operator::NotIn => "NOT_IN",
            Operator::Between => "BETWEEN",
            Operator::NotBetween => "NOT_BETWEEN",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts the canonical names in any case, plus the short comparison
/// aliases (`eq`, `ne`, `gt`, `ge`, `lt`, `le`).
impl FromStr for Operator {
    type Err = DirectiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let op = match upper.as_str() {
            "EQ" => Operator::Equal,
            "NE" => Operator::NotEqual,
            "GT" => Operator::GreaterThan,
            "GE" => Operator::GreaterThanOrEqual,
            "LT" => Operator::LessThan,
            "LE" => Operator::LessThanOrEqual,
            other => Operator::ALL
                .into_iter()
                .find(|op| op.as_str() == other)
                .ok_or_else(|| DirectiveError::UnknownOperator(s.to_string()))?,
        };
        Ok(op)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

impl SortDir {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDir::Asc => "asc",
            SortDir::Desc => "desc",
        }
    }
}

impl FromStr for SortDir {
    type Err = DirectiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDir::Asc),
            "desc" | "descending" => Ok(SortDir::Desc),
            _ => Err(DirectiveError::UnknownSortDir(s.to_string())),
        }
    }
}

/// One attribute-scoped filter. Several raw values are OR-ed by the
/// predicate builder; BETWEEN operators expect exactly two.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterDirective {
    name: String,
    op: Operator,
    #[serde(default)]
    values: Vec<String>,
}

impl FilterDirective {
    pub fn new<I, V>(name: impl Into<String>, op: Operator, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Self {
            name: name.into(),
            op,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn between(name: impl Into<String>, low: impl Into<String>, high: impl Into<String>) -> Self {
        Self::new(name, Operator::Between, [low.into(), high.into()])
    }

    pub fn not_between(
        name: impl Into<String>,
        low: impl Into<String>,
        high: impl Into<String>,
    ) -> Self {
        Self::new(name, Operator::NotBetween, [low.into(), high.into()])
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn op(&self) -> Operator {
        self.op
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Lower and upper bound of a BETWEEN filter; `None` unless exactly two
    /// values are present.
    pub fn between_pair(&self) -> Option<(&str, &str)> {
        match self.values.as_slice() {
            [low, high] => Some((low.as_str(), high.as_str())),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortDirective {
    pub name: String,
    #[serde(default)]
    pub dir: SortDir,
}

impl SortDirective {
    pub fn new(name: impl Into<String>, dir: SortDir) -> Self {
        Self {
            name: name.into(),
            dir,
        }
    }

    pub fn asc(name: impl Into<String>) -> Self {
        Self::new(name, SortDir::Asc)
    }

    pub fn desc(name: impl Into<String>) -> Self {
        Self::new(name, SortDir::Desc)
    }
}

/// Paging and distinct settings. Unset fields fall back to the configured
/// page limits when the page request is resolved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingDirective {
    pub page_number: Option<u64>,
    pub page_size: Option<u64>,
    #[serde(default)]
    pub distinct: bool,
}

impl PagingDirective {
    pub fn new(page_number: u64, page_size: u64) -> Self {
        Self {
            page_number: Some(page_number),
            page_size: Some(page_size),
            distinct: false,
        }
    }

    pub fn with_distinct(mut self, distinct: bool) -> Self {
        self.distinct = distinct;
        self
    }
}

/// Free-text search over every string attribute of the record type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeywordDirective(String);

impl KeywordDirective {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn value(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Directive {
    Filter(FilterDirective),
    Sort(SortDirective),
    Keyword(KeywordDirective),
    Paging(PagingDirective),
}

impl From<FilterDirective> for Directive {
    fn from(d: FilterDirective) -> Self {
        Directive::Filter(d)
    }
}

impl From<SortDirective> for Directive {
    fn from(d: SortDirective) -> Self {
        Directive::Sort(d)
    }
}

impl From<KeywordDirective> for Directive {
    fn from(d: KeywordDirective) -> Self {
        Directive::Keyword(d)
    }
}

impl From<PagingDirective> for Directive {
    fn from(d: PagingDirective) -> Self {
        Directive::Paging(d)
    }
}

/// All directives extracted from one request.
///
/// Insertion order is kept so sort keys apply in the order they were given.
/// When more than one paging directive is present the last one wins.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DirectiveSet {
    directives: Vec<Directive>,
}

impl DirectiveSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, directive: impl Into<Directive>) {
        self.directives.push(directive.into());
    }

    pub fn with(mut self, directive: impl Into<Directive>) -> Self {
        self.push(directive);
        self
    }

    pub fn filter<I, V>(self, name: impl Into<String>, op: Operator, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.with(FilterDirective::new(name, op, values))
    }

    pub fn sort(self, name: impl Into<String>, dir: SortDir) -> Self {
        self.with(SortDirective::new(name, dir))
    }

    pub fn keyword(self, value: impl Into<String>) -> Self {
        self.with(KeywordDirective::new(value))
    }

    pub fn page(self, page_number: u64, page_size: u64) -> Self {
        let distinct = self.is_distinct();
        self.with(PagingDirective::new(page_number, page_size).with_distinct(distinct))
    }

    /// Sets the distinct flag on the effective paging directive, adding an
    /// otherwise empty one if none exists yet.
    pub fn distinct(mut self, distinct: bool) -> Self {
        let paging = self.directives.iter_mut().rev().find_map(|d| match d {
            Directive::Paging(p) => Some(p),
            _ => None,
        });
        match paging {
            Some(p) => p.distinct = distinct,
            None => self.push(PagingDirective::default().with_distinct(distinct)),
        }
        self
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Directive> {
        self.directives.iter()
    }

    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    pub fn filters(&self) -> impl Iterator<Item = &FilterDirective> {
        self.directives.iter().filter_map(|d| match d {
            Directive::Filter(f) => Some(f),
            _ => None,
        })
    }

    pub fn sorts(&self) -> impl Iterator<Item = &SortDirective> {
        self.directives.iter().filter_map(|d| match d {
            Directive::Sort(s) => Some(s),
            _ => None,
        })
    }

    pub fn keywords(&self) -> impl Iterator<Item = &KeywordDirective> {
        self.directives.iter().filter_map(|d| match d {
            Directive::Keyword(k) => Some(k),
            _ => None,
        })
    }

    pub fn paging(&self) -> Option<&PagingDirective> {
        self.directives.iter().rev().find_map(|d| match d {
            Directive::Paging(p) => Some(p),
            _ => None,
        })
    }

    pub fn is_distinct(&self) -> bool {
        self.paging().is_some_and(|p| p.distinct)
    }
}

impl FromIterator<Directive> for DirectiveSet {
    fn from_iter<T: IntoIterator<Item = Directive>>(iter: T) -> Self {
        Self {
            directives: iter.into_iter().collect(),
        }
    }
}

impl Extend<Directive> for DirectiveSet {
    fn extend<T: IntoIterator<Item = Directive>>(&mut self, iter: T) {
        self.directives.extend(iter);
    }
}

impl<'a> IntoIterator for &'a DirectiveSet {
    type Item = &'a Directive;
    type IntoIter = std::slice::Iter<'a, Directive>;

    fn into_iter(self) -> Self::IntoIter {
        self.directives.iter()
    }
}

impl IntoIterator for DirectiveSet {
    type Item = Directive;
    type IntoIter = std::vec::IntoIter<Directive>;

    fn into_iter(self) -> Self::IntoIter {
        self.directives.into_iter()
    }
}
