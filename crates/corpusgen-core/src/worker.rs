//! Unit-of-work dispatch shared by both pipeline stages.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use rayon::prelude::*;
use tracing::warn;

use crate::config::Execution;
use crate::errors::{CorpusError, CorpusResult};

/// Rendering and tree conversion are iterative, but the parser and serde
/// still recurse on pathological inputs.
const WORKER_STACK_SIZE: usize = 16 * 1024 * 1024;

/// Apply `f` to every item, sequentially in input order or on a Rayon pool of
/// `workers` threads. Falls back to sequential execution if the pool cannot
/// be built.
pub fn run_units<T, R, F>(items: &[T], execution: Execution, workers: usize, f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(usize, &T) -> R + Sync + Send,
{
    if items.is_empty() {
        return vec![];
    }

    if execution == Execution::Sequential {
        return items.iter().enumerate().map(|(i, item)| f(i, item)).collect();
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .stack_size(WORKER_STACK_SIZE)
        .build();

    match pool {
        Ok(pool) => pool.install(|| {
            items
                .par_iter()
                .enumerate()
                .map(|(i, item)| f(i, item))
                .collect()
        }),
        Err(e) => {
            warn!(error = %e, "Worker pool unavailable, running sequentially");
            items.iter().enumerate().map(|(i, item)| f(i, item)).collect()
        }
    }
}

/// Run one unit, turning a panic into [`CorpusError::Panicked`] so it stays
/// inside the unit.
pub fn isolate<R>(unit: impl FnOnce() -> CorpusResult<R>) -> CorpusResult<R> {
    match panic::catch_unwind(AssertUnwindSafe(unit)) {
        Ok(result) => result,
        Err(payload) => Err(CorpusError::Panicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
