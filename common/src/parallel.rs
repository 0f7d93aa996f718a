//! Parallel iteration helpers built on rayon.

use rayon::prelude::*;

/// Maps `f` over `items` in parallel, with at most `max_concurrent` items in flight.
///
/// Output order matches input order. Items are processed in chunks of
/// `max_concurrent`, which bounds the number of live per-item resources
/// (e.g. one tile pipeline per worker). Stops after the first chunk that
/// contains an error and returns it.
///
/// # Panics
///
/// Panics if `max_concurrent` is 0.
pub fn try_par_map_limited<T, R, E, F>(
    items: &[T],
    max_concurrent: usize,
    f: F,
) -> Result<Vec<R>, E>
where
    T: Sync,
    R: Send,
    E: Send,
    F: Fn(&T) -> Result<R, E> + Sync,
{
    assert!(max_concurrent > 0, "max_concurrent must be > 0");

    let mut results = Vec::with_capacity(items.len());
    for chunk in items.chunks(max_concurrent) {
        let chunk_results: Result<Vec<R>, E> = chunk.par_iter().map(&f).collect();
        results.extend(chunk_results?);
    }
    Ok(results)
}

/// Runs `f(y, row)` for every row of a row-major buffer in parallel.
///
/// Zero-width buffers are a no-op.
pub fn par_rows_mut<T, F>(data: &mut [T], width: usize, f: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Sync + Send,
{
    if width == 0 {
        return;
    }
    data.par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| f(y, row));
}
