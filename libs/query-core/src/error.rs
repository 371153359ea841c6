use thiserror::Error;

use crate::directive::Operator;
use crate::value::ValueCoercionError;

/// Reasons a single directive cannot be turned into a predicate.
///
/// These never abort a query: the query layer logs them and drops the
/// offending directive.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectiveError {
    #[error(transparent)]
    Coercion(#[from] ValueCoercionError),

    #[error("{op} requires exactly two values, got {got}")]
    BetweenArity { op: Operator, got: usize },

    #[error("{op} requires a string attribute, `{name}` is {attr}")]
    NotText {
        op: Operator,
        name: String,
        attr: &'static str,
    },

    #[error("attribute `{0}` has no comparable type")]
    Incomparable(String),

    #[error("keyword is blank")]
    BlankKeyword,

    #[error("unknown operator: {0}")]
    UnknownOperator(String),

    #[error("unknown sort direction: {0}")]
    UnknownSortDir(String),
}

pub type DirectiveResult<T> = Result<T, DirectiveError>;
