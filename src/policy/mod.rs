//! Tag optimization: the sub-tag kind table and the engine that applies an
//! [`OptimizationPolicy`](crate::config::OptimizationPolicy) to one field.

pub mod engine;
pub mod kinds;

pub use engine::PolicyEngine;
pub use kinds::{kind_for, SubTagKind, KINDS};
