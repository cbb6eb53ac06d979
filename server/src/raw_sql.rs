//! SQL that Diesel's type-safe DSL has no builder for.
//!
//! Nothing in this module interpolates user input. Values always go through
//! bind parameters.

use diesel::dsl::sql;
use diesel::expression::SqlLiteral;
use diesel::sql_types::{BigInt, Text};

/// Window function for counting total rows across the full result set.
///
/// Returns `COUNT(*) OVER()` which gives the total count before LIMIT/OFFSET.
/// Diesel doesn't support window functions natively.
pub fn count_over() -> SqlLiteral<BigInt> {
    sql::<BigInt>("COUNT(*) OVER()")
}

diesel::define_sql_function! {
    /// Postgres `LOWER()`, matching the case-insensitive username index.
    fn lower(x: Text) -> Text;
}
