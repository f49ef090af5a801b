//! Bulk parallel iteration and reduction over a pool.
//!
//! Both drivers partition `[start, end)` into fixed-size chunks, dispatch
//! each chunk through [`ThreadPool::submit_task`], and block on the
//! handles in submission order. Ranges no larger than one chunk run
//! inline on the caller without touching the pool.

use crate::error::Result;
use crate::pool::ThreadPool;
use std::sync::Arc;

/// Default number of indices per submitted chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Applies `body` to every index in `[start, end)`, fanning chunks out
/// over the pool.
///
/// Blocks until every chunk has finished. Indices within a chunk run in
/// order on one worker; chunks run in any order relative to each other.
///
/// # Errors
///
/// A panic inside `body` surfaces as
/// [`ErrorKind::TaskPanicked`](crate::ErrorKind::TaskPanicked) once its
/// chunk is joined, and as
/// [`ErrorKind::ShuttingDown`](crate::ErrorKind::ShuttingDown) when the
/// pool refuses a chunk.
pub fn parallel_for<F>(
    pool: &ThreadPool,
    start: usize,
    end: usize,
    body: F,
    chunk_size: usize,
) -> Result<()>
where
    F: Fn(usize) + Send + Sync + 'static,
{
    if start >= end {
        return Ok(());
    }
    let chunk_size = chunk_size.max(1);
    let range = end - start;
    if range <= chunk_size {
        for i in start..end {
            body(i);
        }
        return Ok(());
    }

    let body = Arc::new(body);
    let num_chunks = range.div_ceil(chunk_size);
    let mut handles = Vec::with_capacity(num_chunks);
    for chunk in 0..num_chunks {
        let chunk_start = start + chunk * chunk_size;
        let chunk_end = (chunk_start + chunk_size).min(end);
        let body = Arc::clone(&body);
        handles.push(pool.submit_task(move || {
            for i in chunk_start..chunk_end {
                body(i);
            }
        })?);
    }

    for handle in handles {
        handle.join()?;
    }
    Ok(())
}

/// Folds `map` over `[start, end)` and combines chunk partials with
/// `reduce`.
///
/// Each chunk folds its indices seeded with `init.clone()`; the driver
/// then combines the partials in submission order, seeded with `init`.
/// `reduce` must be associative for a deterministic result;
/// commutativity is not required because partials are combined in
/// submission order, not completion order.
///
/// # Errors
///
/// As [`parallel_for`].
pub fn parallel_reduce<T, M, R>(
    pool: &ThreadPool,
    start: usize,
    end: usize,
    init: T,
    map: M,
    reduce: R,
    chunk_size: usize,
) -> Result<T>
where
    T: Clone + Send + 'static,
    M: Fn(usize) -> T + Send + Sync + 'static,
    R: Fn(T, T) -> T + Send + Sync + 'static,
{
    if start >= end {
        return Ok(init);
    }
    let chunk_size = chunk_size.max(1);
    let range = end - start;
    if range <= chunk_size {
        let mut result = init;
        for i in start..end {
            result = reduce(result, map(i));
        }
        return Ok(result);
    }

    let map = Arc::new(map);
    let reduce = Arc::new(reduce);
    let num_chunks = range.div_ceil(chunk_size);
    let mut handles = Vec::with_capacity(num_chunks);
    for chunk in 0..num_chunks {
        let chunk_start = start + chunk * chunk_size;
        let chunk_end = (chunk_start + chunk_size).min(end);
        let map = Arc::clone(&map);
        let reduce = Arc::clone(&reduce);
        let seed = init.clone();
        handles.push(pool.submit_task(move || {
            let mut partial = seed;
            for i in chunk_start..chunk_end {
                partial = reduce(partial, map(i));
            }
            partial
        })?);
    }

    let mut result = init;
    for handle in handles {
        result = reduce(result, handle.join()?);
    }
    Ok(result)
}

/// Sums `map` over `[start, end)`: [`parallel_reduce`] specialised to
/// addition.
///
/// # Errors
///
/// As [`parallel_for`].
pub fn parallel_map_reduce<T, M>(
    pool: &ThreadPool,
    start: usize,
    end: usize,
    init: T,
    map: M,
    chunk_size: usize,
) -> Result<T>
where
    T: Clone + Send + std::ops::Add<Output = T> + 'static,
    M: Fn(usize) -> T + Send + Sync + 'static,
{
    parallel_reduce(pool, start, end, init, map, |acc, value| acc + value, chunk_size)
}
