//! Store-agnostic half of the dynamic query engine.
//!
//! Holds the directive model (filters, sort keys, keyword search, paging),
//! attribute types with coercion of raw request text into them, and the
//! pagination arithmetic shared by every record type. Turning directives
//! into store predicates lives in `query-db`.

pub mod directive;
pub mod error;
pub mod keyword;
pub mod page;
pub mod value;


pub use directive::{
    Directive, DirectiveSet, FilterDirective, KeywordDirective, Operator, PagingDirective,
    SortDir, SortDirective,
};
pub use error::{DirectiveError, DirectiveResult};
pub use keyword::{accent_folds, keyword_pattern, strip_accents};
pub use page::{
    clamp_page_size, page_count, Page, PageInfo, PageLimits, PageRequest, DEFAULT_PAGE_SIZE,
    MAX_OFFSET, MAX_PAGE_SIZE,
};
pub use value::{coerce, coerce_many, AttrType, CoercionResult, TypedValue, ValueCoercionError};
