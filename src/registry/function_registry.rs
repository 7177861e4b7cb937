//! # Function Registry
//!
//! Name -> callable lookup used by workers to resolve [`Target::Named`]
//! invocations. Thread-safe; registration and lookup may happen concurrently
//! with running workers.
//!
//! ## Usage
//!
//! ```rust
//! use multiqueue::registry::FunctionRegistry;
//! use serde_json::json;
//!
//! let registry = FunctionRegistry::new();
//! registry
//!     .register("math.double", |args, _| {
//!         Ok(json!(args[0].as_f64().unwrap_or_default() * 2.0))
//!     })
//!     .unwrap();
//! assert!(registry.contains("math.double"));
//! ```
//!
//! [`Target::Named`]: crate::messaging::Target::Named

use crate::error::{MultiQueueError, Result};
use crate::messaging::{Args, Kwargs, TaskFn, Target};
use dashmap::DashMap;
use serde_json::Value;
use tracing::{debug, info};

#[derive(Debug, Default)]
pub struct FunctionRegistry {
    functions: DashMap<String, TaskFn>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `func` under `name`; fails if the name is taken
    pub fn register<F>(&self, name: impl Into<String>, func: F) -> Result<()>
    where
        F: Fn(&Args, &Kwargs) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.register_fn(TaskFn::new(name, func))
    }

    pub fn register_fn(&self, func: TaskFn) -> Result<()> {
        let name = func.name().to_string();
        match self.functions.entry(name.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(MultiQueueError::registry(format!(
                "function \"{name}\" is already registered"
            ))),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(func);
                info!(function = %name, "Function registered");
                Ok(())
            }
        }
    }

    /// Register or overwrite
    pub fn replace(&self, func: TaskFn) -> Option<TaskFn> {
        debug!(function = %func.name(), "Function replaced");
        self.functions.insert(func.name().to_string(), func)
    }

    pub fn unregister(&self, name: &str) -> Option<TaskFn> {
        self.functions.remove(name).map(|(_, func)| func)
    }

    pub fn get(&self, name: &str) -> Option<TaskFn> {
        self.functions.get(name).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Resolve a target to something runnable; direct callables resolve to
    /// themselves
    pub fn resolve(&self, target: &Target) -> Option<TaskFn> {
        match target {
            Target::Function(func) => Some(func.clone()),
            Target::Named(name) => self.get(name),
        }
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.functions.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_register_and_resolve_by_name() {
        let registry = FunctionRegistry::new();
        registry.register("one", |_, _| Ok(json!(1))).unwrap();

        let func = registry.resolve(&Target::named("one")).unwrap();
        assert_eq!(func.call(&Args::new(), &Kwargs::new()).unwrap(), json!(1));
        assert!(registry.resolve(&Target::named("two")).is_none());
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let registry = FunctionRegistry::new();
        registry.register("dup", |_, _| Ok(json!(1))).unwrap();
        let err = registry.register("dup", |_, _| Ok(json!(2))).unwrap_err();
        assert!(matches!(err, MultiQueueError::Registry { .. }));

        registry.replace(TaskFn::new("dup", |_, _| Ok(json!(2))));
        let func = registry.get("dup").unwrap();
        assert_eq!(func.call(&Args::new(), &Kwargs::new()).unwrap(), json!(2));
    }

    #[test]
    fn test_direct_targets_bypass_registry() {
        let registry = FunctionRegistry::new();
        let target = Target::function("inline", |_, _| Ok(json!("ok")));
        assert!(registry.resolve(&target).is_some());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_names_are_sorted() {
        let registry = FunctionRegistry::new();
        registry.register("b", |_, _| Ok(Value::Null)).unwrap();
        registry.register("a", |_, _| Ok(Value::Null)).unwrap();
        assert_eq!(registry.names(), vec!["a".to_string(), "b".to_string()]);
        assert!(registry.unregister("a").is_some());
        assert_eq!(registry.len(), 1);
    }
}
