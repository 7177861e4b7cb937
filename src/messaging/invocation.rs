//! # Invocations and Argument Sets
//!
//! An [`Invocation`] is one function-call request: a [`Target`] plus positional
//! and keyword arguments. [`ArgumentSets`] describes a whole batch of argument
//! sets, including the broadcasting shapes where one side (positional or
//! keyword) is shared by every job.
//!
//! ## Usage
//!
//! ```rust
//! use multiqueue::messaging::{ArgumentSet, ArgumentSets};
//! use serde_json::json;
//!
//! let sets = ArgumentSets::each(vec![
//!     ArgumentSet::positional(vec![json!([0, 11])]),
//!     ArgumentSet::positional(vec![json!([2, 12])]),
//! ]);
//! assert_eq!(sets.expand().unwrap().len(), 2);
//!
//! // No argument sets at all still means one call
//! assert_eq!(ArgumentSets::default().expand().unwrap().len(), 1);
//! ```

use crate::error::{MultiQueueError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Positional arguments for one call
pub type Args = Vec<Value>;

/// Keyword arguments for one call
pub type Kwargs = Map<String, Value>;

type TaskFnInner = dyn Fn(&Args, &Kwargs) -> anyhow::Result<Value> + Send + Sync;

/// A named callable that a worker can run directly
#[derive(Clone)]
pub struct TaskFn {
    name: String,
    func: Arc<TaskFnInner>,
}

impl TaskFn {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Args, &Kwargs) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, args: &Args, kwargs: &Kwargs) -> anyhow::Result<Value> {
        (self.func)(args, kwargs)
    }
}

impl fmt::Debug for TaskFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskFn").field("name", &self.name).finish()
    }
}

/// What a job runs: a callable handed over by value, or a name the worker
/// resolves against its own registry
#[derive(Debug, Clone)]
pub enum Target {
    Named(String),
    Function(TaskFn),
}

impl Target {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn function<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Args, &Kwargs) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self::Function(TaskFn::new(name, func))
    }

    /// Stable name used for routing and logs
    pub fn name(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::Function(func) => func.name(),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => write!(f, "{name}"),
            Self::Function(func) => write!(f, "fn:{}", func.name()),
        }
    }
}

impl From<&str> for Target {
    fn from(name: &str) -> Self {
        Self::Named(name.to_string())
    }
}

impl From<String> for Target {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

impl From<TaskFn> for Target {
    fn from(func: TaskFn) -> Self {
        Self::Function(func)
    }
}

/// Positional and keyword arguments for a single job
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArgumentSet {
    #[serde(default)]
    pub args: Args,
    #[serde(default)]
    pub kwargs: Kwargs,
}

impl ArgumentSet {
    pub fn new(args: Args, kwargs: Kwargs) -> Self {
        Self { args, kwargs }
    }

    pub fn positional(args: Args) -> Self {
        Self {
            args,
            kwargs: Kwargs::new(),
        }
    }

    pub fn keyword(kwargs: Kwargs) -> Self {
        Self {
            args: Args::new(),
            kwargs,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

/// The argument sets for a whole batch
///
/// Every shape that would produce zero jobs produces exactly one job instead,
/// carrying whatever part is shared.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgumentSets {
    /// One job per explicit pair
    Each(Vec<ArgumentSet>),
    /// Positional and keyword sequences zipped together; lengths must match
    Parallel { args: Vec<Args>, kwargs: Vec<Kwargs> },
    /// One job per positional set, same keyword arguments for all
    SharedKwargs { args: Vec<Args>, kwargs: Kwargs },
    /// One job per keyword set, same positional arguments for all
    SharedArgs { args: Args, kwargs: Vec<Kwargs> },
}

impl Default for ArgumentSets {
    fn default() -> Self {
        Self::Each(Vec::new())
    }
}

impl ArgumentSets {
    pub fn each(sets: Vec<ArgumentSet>) -> Self {
        Self::Each(sets)
    }

    /// One job per positional set, no keyword arguments
    pub fn positional(args: Vec<Args>) -> Self {
        Self::SharedKwargs {
            args,
            kwargs: Kwargs::new(),
        }
    }

    pub fn parallel(args: Vec<Args>, kwargs: Vec<Kwargs>) -> Self {
        Self::Parallel { args, kwargs }
    }

    pub fn shared_kwargs(args: Vec<Args>, kwargs: Kwargs) -> Self {
        Self::SharedKwargs { args, kwargs }
    }

    pub fn shared_args(args: Args, kwargs: Vec<Kwargs>) -> Self {
        Self::SharedArgs { args, kwargs }
    }

    /// Expand into one [`ArgumentSet`] per job, in submission order
    ///
    /// Fails with `InvalidArgumentShape` when parallel sequences differ in
    /// length; nothing has been enqueued at that point.
    pub fn expand(self) -> Result<Vec<ArgumentSet>> {
        let sets = match self {
            Self::Each(sets) => sets,
            Self::Parallel { args, kwargs } => {
                if args.len() != kwargs.len() {
                    return Err(MultiQueueError::invalid_argument_shape(format!(
                        "positional and keyword sequences must be the same length (got {} and {})",
                        args.len(),
                        kwargs.len()
                    )));
                }
                args.into_iter()
                    .zip(kwargs)
                    .map(|(a, k)| ArgumentSet::new(a, k))
                    .collect()
            }
            Self::SharedKwargs { args, kwargs } => {
                if args.is_empty() {
                    vec![ArgumentSet::keyword(kwargs)]
                } else {
                    args.into_iter()
                        .map(|a| ArgumentSet::new(a, kwargs.clone()))
                        .collect()
                }
            }
            Self::SharedArgs { args, kwargs } => {
                if kwargs.is_empty() {
                    vec![ArgumentSet::positional(args)]
                } else {
                    kwargs
                        .into_iter()
                        .map(|k| ArgumentSet::new(args.clone(), k))
                        .collect()
                }
            }
        };

        if sets.is_empty() {
            return Ok(vec![ArgumentSet::empty()]);
        }
        Ok(sets)
    }
}

impl From<Vec<ArgumentSet>> for ArgumentSets {
    fn from(sets: Vec<ArgumentSet>) -> Self {
        Self::Each(sets)
    }
}

/// One function-call request, immutable once built
#[derive(Debug, Clone)]
pub struct Invocation {
    target: Target,
    args: Args,
    kwargs: Kwargs,
}

impl Invocation {
    pub fn new(target: Target, arguments: ArgumentSet) -> Self {
        Self {
            target,
            args: arguments.args,
            kwargs: arguments.kwargs,
        }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn args(&self) -> &Args {
        &self.args
    }

    pub fn kwargs(&self) -> &Kwargs {
        &self.kwargs
    }
}
