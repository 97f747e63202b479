//! Dialect-aware SQL generation for cube queries.
//!
//! - [`query`]: the SELECT builder the planner threads through its stages
//! - [`expr`]: columns, literals and the few operators cuts and joins use
//! - [`token`]: dialect-agnostic tokens, serialized per dialect
//! - [`dialect`]: quoting, date literals and paging per backend

pub mod dialect;
pub mod expr;
pub mod query;
pub mod token;

pub use dialect::{Dialect, DialectCapabilities, SqlDialect};
pub use expr::{
    avg, col, count, count_star, func, lit_date, lit_int, lit_str, max, min, star, sum, table_col,
    BinaryOperator, Expr, ExprExt, Literal,
};
pub use query::{Cte, Join, LimitOffset, OrderByExpr, Query, SelectExpr, SortDir, TableRef};
pub use token::{Token, TokenStream};
