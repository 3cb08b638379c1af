//! Boolean filters over comparable values.
//!
//! A `Predicate` binds one reference value and tests a supplied value against
//! it. An `Expression` is the conjunction of zero or more predicates. A
//! `SystemEventFilterExpression` is the same thing used to decide whether a
//! system event handler fires for a given payload.
//!
//! Nothing here allocates during evaluation or mutates state, so filters can be
//! shared freely across readers once built.

pub mod comparable;
pub mod expression;
pub mod predicate;

pub use comparable::Comparable;
pub use expression::{Expression, SystemEventFilterExpression};
pub use predicate::Predicate;
