use std::future::Future;

use futures::future::join_all;

/// Bounded concurrent map over a slice
///
/// Processes `items` in fixed-size chunks: every call within a chunk runs
/// concurrently and the chunk is jointly awaited (all-settled) before the
/// next chunk starts. `after_batch` receives the running count of settled
/// items after each chunk, which is what gives callers batch-granular,
/// monotonic progress.
///
/// Results come back in input order regardless of completion order inside a
/// chunk. Individual outcomes are whatever `op` returns; this utility never
/// aborts a chunk because one member failed.
pub async fn run_in_batches<'a, T, R, F, Fut>(
    items: &'a [T],
    batch_size: usize,
    op: F,
    mut after_batch: impl FnMut(usize),
) -> Vec<R>
where
    F: Fn(&'a T) -> Fut,
    Fut: Future<Output = R>,
{
    let mut results = Vec::with_capacity(items.len());
    let mut settled = 0;

    for chunk in items.chunks(batch_size.max(1)) {
        let outcomes = join_all(chunk.iter().map(&op)).await;
        settled += chunk.len();
        results.extend(outcomes);
        after_batch(settled);
    }

    results
}
