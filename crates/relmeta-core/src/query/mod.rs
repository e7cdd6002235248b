//! Query building for relmeta.
//!
//! Joins and predicates are resolved from the schema registry alone; the
//! resulting [`QueryPlan`] is executed elsewhere.

mod join;
mod planner;
mod predicate;

pub use join::{Join, JoinCondition, JoinPath};
pub use planner::{JoinEdge, QueryBuilder, QueryPlan};
pub use predicate::{ColumnRef, CompareOp, Condition, KeyArgs, KeyConstraint, Predicate};
