#![allow(dead_code)]

pub mod mock_queue;
pub mod strategies;

pub use mock_queue::*;

use multiqueue::execution::{InMemoryQueue, LocalWorkerPool};
use multiqueue::messaging::{ArgumentSet, ArgumentSets, TaskFn};
use multiqueue::registry::FunctionRegistry;
use serde_json::{json, Value};
use std::sync::Arc;

/// Means of `(0,11), (2,12), ..., (18,20)`
pub const EXPECTED_MEANS: [f64; 10] = [5.5, 7.0, 8.5, 10.0, 11.5, 13.0, 14.5, 16.0, 17.5, 19.0];

/// Arithmetic mean of the numbers in the first positional argument
pub fn mean_fn() -> TaskFn {
    TaskFn::new("mean", |args, _| {
        let numbers: Vec<f64> = args
            .first()
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_f64).collect())
            .unwrap_or_default();
        anyhow::ensure!(!numbers.is_empty(), "mean of an empty sequence");
        Ok(json!(numbers.iter().sum::<f64>() / numbers.len() as f64))
    })
}

/// `[(0,11)], [(2,12)], ..., [(18,20)]`, one pair per job
pub fn mean_argument_sets() -> ArgumentSets {
    ArgumentSets::each(
        (0..20)
            .step_by(2)
            .zip(11..21)
            .map(|(i, j)| ArgumentSet::positional(vec![json!([i, j])]))
            .collect(),
    )
}

pub fn expected_means() -> Vec<Value> {
    EXPECTED_MEANS.iter().map(|m| json!(m)).collect()
}

/// In-memory queue with a running worker pool and a registry holding `mean`
pub struct LocalCluster {
    pub queue: Arc<InMemoryQueue>,
    pub registry: Arc<FunctionRegistry>,
    pub workers: LocalWorkerPool,
}

impl LocalCluster {
    pub fn start(concurrency: usize) -> Self {
        let queue = Arc::new(InMemoryQueue::new("test"));
        let registry = Arc::new(FunctionRegistry::new());
        registry
            .register_fn(mean_fn())
            .expect("mean registers once");
        let workers = LocalWorkerPool::start(queue.clone(), registry.clone(), concurrency);
        Self {
            queue,
            registry,
            workers,
        }
    }

    pub async fn shutdown(self) {
        self.workers.shutdown().await;
    }
}
