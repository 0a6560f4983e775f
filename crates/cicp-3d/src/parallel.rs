use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during parallel execution.
#[derive(Error, Debug, PartialEq)]
pub enum ParallelError {
    /// The thread pool failed to build.
    #[error("failed to build thread pool: {0}")]
    BuildError(String),

    /// The requested thread count is invalid.
    #[error("thread count must be > 0, got {0}")]
    InvalidThreadCount(usize),

    /// The chunk size used to split the work must be valid.
    #[error("chunk size must be > 0")]
    InvalidChunkSize,
}

/// Controls how the data-parallel passes are executed.
///
/// Every pass is a full barrier: all the elements of a pass complete before
/// the function driving it returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExecutionStrategy {
    /// Use the global Rayon thread pool to process every element in parallel.
    #[default]
    ParallelElements,

    /// Run sequentially on the current thread.
    ///
    /// Useful for small inputs, debugging, or reproducible reductions.
    Serial,

    /// Run on a local thread pool with `n` threads.
    ///
    /// # Warning
    /// Creates a new thread pool on every call, which has significant overhead.
    Fixed(usize),
}

impl ExecutionStrategy {
    /// Run `op` inside the thread pool selected by the strategy.
    fn install<R, F>(self, op: F) -> Result<R, ParallelError>
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        match self {
            ExecutionStrategy::Fixed(n) => {
                if n == 0 {
                    return Err(ParallelError::InvalidThreadCount(n));
                }
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| ParallelError::BuildError(e.to_string()))?;
                Ok(pool.install(op))
            }
            _ => Ok(op()),
        }
    }
}

/// Apply `op` to every element of `data` together with its index.
pub fn for_each_mut<T, F>(
    strategy: ExecutionStrategy,
    data: &mut [T],
    op: F,
) -> Result<(), ParallelError>
where
    T: Send,
    F: Fn(usize, &mut T) + Sync + Send,
{
    match strategy {
        ExecutionStrategy::Serial => {
            data.iter_mut().enumerate().for_each(|(i, v)| op(i, v));
            Ok(())
        }
        _ => strategy.install(|| {
            data.par_iter_mut()
                .enumerate()
                .for_each(|(i, v)| op(i, v));
        }),
    }
}

/// Apply `op` to every `chunk_size` long chunk of `data` together with the chunk index.
pub fn for_each_chunk_mut<T, F>(
    strategy: ExecutionStrategy,
    data: &mut [T],
    chunk_size: usize,
    op: F,
) -> Result<(), ParallelError>
where
    T: Send,
    F: Fn(usize, &mut [T]) + Sync + Send,
{
    map_chunks_mut(strategy, data, chunk_size, op).map(|_| ())
}

/// Apply `op` to every `chunk_size` long chunk of `data` and collect the
/// per-chunk outputs in chunk order.
pub fn map_chunks_mut<T, R, F>(
    strategy: ExecutionStrategy,
    data: &mut [T],
    chunk_size: usize,
    op: F,
) -> Result<Vec<R>, ParallelError>
where
    T: Send,
    R: Send,
    F: Fn(usize, &mut [T]) -> R + Sync + Send,
{
    if chunk_size == 0 {
        return Err(ParallelError::InvalidChunkSize);
    }

    match strategy {
        ExecutionStrategy::Serial => Ok(data
            .chunks_mut(chunk_size)
            .enumerate()
            .map(|(i, chunk)| op(i, chunk))
            .collect()),
        _ => strategy.install(|| {
            data.par_chunks_mut(chunk_size)
                .enumerate()
                .map(|(i, chunk)| op(i, chunk))
                .collect()
        }),
    }
}

/// Fold every element of `data` into an accumulator and combine the partial
/// accumulators with `reduce`.
///
/// `reduce` must be associative and `identity` must be its neutral element,
/// the parallel strategies split the fold at arbitrary positions.
pub fn fold_reduce<T, A, ID, FO, RE>(
    strategy: ExecutionStrategy,
    data: &[T],
    identity: ID,
    fold: FO,
    reduce: RE,
) -> Result<A, ParallelError>
where
    T: Sync,
    A: Send,
    ID: Fn() -> A + Sync + Send,
    FO: Fn(A, usize, &T) -> A + Sync + Send,
    RE: Fn(A, A) -> A + Sync + Send,
{
    match strategy {
        ExecutionStrategy::Serial => Ok(data
            .iter()
            .enumerate()
            .fold(identity(), |acc, (i, v)| fold(acc, i, v))),
        _ => strategy.install(|| {
            data.par_iter()
                .enumerate()
                .fold(&identity, |acc, (i, v)| fold(acc, i, v))
                .reduce(&identity, &reduce)
        }),
    }
}
