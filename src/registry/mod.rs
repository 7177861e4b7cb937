//! # Registry
//!
//! Lookup tables consulted by workers. Currently a single one: the
//! [`FunctionRegistry`] resolving named targets to callables.

pub mod function_registry;

pub use function_registry::FunctionRegistry;
