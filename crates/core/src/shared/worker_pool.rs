use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;

use thiserror::Error;

/// A worker thread panicked while processing a task.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("worker thread panicked")]
pub struct WorkerPanicked;

/// Fixed-size pool of scoped worker threads for one tracking run.
///
/// Workers pull task indices from a shared counter until it is exhausted, so
/// uneven per-task cost balances itself. With a single thread every task runs
/// inline on the caller's thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkerPool {
    num_threads: usize,
}

impl WorkerPool {
    pub fn new(num_threads: usize) -> Self {
        Self {
            num_threads: num_threads.max(1),
        }
    }

    pub fn single_threaded() -> Self {
        Self::new(1)
    }

    /// One worker per available core.
    pub fn with_available_parallelism() -> Self {
        Self::new(available_parallelism())
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Runs `task(i)` for every `i` in `0..count` and returns the results in
    /// index order.
    pub fn map_indexed<R, F>(&self, count: usize, task: F) -> Result<Vec<R>, WorkerPanicked>
    where
        R: Send,
        F: Fn(usize) -> R + Sync,
    {
        let never = AtomicBool::new(false);
        let slots = self.map_indexed_until(count, &never, task)?;
        Ok(slots.into_iter().flatten().collect())
    }

    /// Like [`map_indexed`](Self::map_indexed), but workers stop pulling new
    /// indices once `cancelled` is set. Tasks already started run to
    /// completion; skipped indices yield `None`.
    pub fn map_indexed_until<R, F>(
        &self,
        count: usize,
        cancelled: &AtomicBool,
        task: F,
    ) -> Result<Vec<Option<R>>, WorkerPanicked>
    where
        R: Send,
        F: Fn(usize) -> R + Sync,
    {
        let mut slots: Vec<Option<R>> = (0..count).map(|_| None).collect();
        let workers = self.num_threads.min(count);

        if workers <= 1 {
            for (i, slot) in slots.iter_mut().enumerate() {
                if cancelled.load(Ordering::Relaxed) {
                    break;
                }
                *slot = Some(task(i));
            }
            return Ok(slots);
        }

        let cursor = &AtomicUsize::new(0);
        let task = &task;
        let produced = thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    scope.spawn(move || {
                        let mut done = Vec::new();
                        while !cancelled.load(Ordering::Relaxed) {
                            let i = cursor.fetch_add(1, Ordering::Relaxed);
                            if i >= count {
                                break;
                            }
                            done.push((i, task(i)));
                        }
                        done
                    })
                })
                .collect();
            join_all(handles)
        })?;

        for (i, result) in produced.into_iter().flatten() {
            slots[i] = Some(result);
        }
        Ok(slots)
    }

    /// Hands every item of `items` to exactly one call of `task`.
    ///
    /// Workers take the next item from the shared iterator under a short
    /// lock, then process it without holding the lock. Items are typically
    /// disjoint mutable rows of a matrix, so no two workers write the same
    /// cell.
    pub fn for_each_pulled<I, F>(&self, items: I, task: F) -> Result<(), WorkerPanicked>
    where
        I: Iterator + Send,
        I::Item: Send,
        F: Fn(I::Item) + Sync,
    {
        if self.num_threads <= 1 {
            items.for_each(task);
            return Ok(());
        }

        let source = Mutex::new(items);
        let next = &|| match source.lock() {
            Ok(mut guard) => guard.next(),
            Err(poisoned) => poisoned.into_inner().next(),
        };
        let task = &task;
        thread::scope(|scope| {
            let handles: Vec<_> = (0..self.num_threads)
                .map(|_| {
                    scope.spawn(move || {
                        while let Some(item) = next() {
                            task(item);
                        }
                    })
                })
                .collect();
            join_all(handles).map(|_| ())
        })
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::with_available_parallelism()
    }
}

/// Number of cores reported by the OS, or 1 if unknown.
pub fn available_parallelism() -> usize {
    thread::available_parallelism().map_or(1, |n| n.get())
}

fn join_all<T>(handles: Vec<thread::ScopedJoinHandle<'_, T>>) -> Result<Vec<T>, WorkerPanicked> {
    let mut results = Vec::with_capacity(handles.len());
    let mut panicked = false;
    for handle in handles {
        match handle.join() {
            Ok(result) => results.push(result),
            Err(_) => panicked = true,
        }
    }
    if panicked {
        log::error!("A tracking worker thread panicked");
        return Err(WorkerPanicked);
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(8)]
    fn test_map_indexed_preserves_order(#[case] threads: usize) {
        let pool = WorkerPool::new(threads);
        let squares = pool.map_indexed(100, |i| i * i).unwrap();
        assert_eq!(squares, (0..100).map(|i| i * i).collect::<Vec<_>>());
    }

    #[test]
    fn test_map_indexed_empty() {
        let pool = WorkerPool::new(4);
        let out: Vec<usize> = pool.map_indexed(0, |i| i).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_zero_threads_clamped_to_one() {
        assert_eq!(WorkerPool::new(0).num_threads(), 1);
    }

    #[test]
    fn test_cancelled_before_start_runs_nothing() {
        let pool = WorkerPool::new(4);
        let cancelled = AtomicBool::new(true);
        let out = pool.map_indexed_until(10, &cancelled, |i| i).unwrap();
        assert_eq!(out.len(), 10);
        assert!(out.iter().all(Option::is_none));
    }

    #[test]
    fn test_cancel_midway_leaves_later_tasks_unrun() {
        let pool = WorkerPool::single_threaded();
        let cancelled = AtomicBool::new(false);
        let out = pool
            .map_indexed_until(10, &cancelled, |i| {
                if i == 3 {
                    cancelled.store(true, Ordering::Relaxed);
                }
                i
            })
            .unwrap();
        assert_eq!(out[..4], [Some(0), Some(1), Some(2), Some(3)]);
        assert!(out[4..].iter().all(Option::is_none));
    }

    #[rstest]
    #[case(1)]
    #[case(4)]
    fn test_for_each_pulled_writes_disjoint_rows(#[case] threads: usize) {
        let pool = WorkerPool::new(threads);
        let mut data = vec![0usize; 5 * 7];
        pool.for_each_pulled(data.chunks_mut(7).enumerate(), |(row, cells)| {
            for (col, cell) in cells.iter_mut().enumerate() {
                *cell = row * 10 + col;
            }
        })
        .unwrap();
        assert_eq!(data[0], 0);
        assert_eq!(data[7 * 3 + 2], 32);
        assert_eq!(data[34], 46);
    }

    #[test]
    fn test_panicking_task_reported() {
        let pool = WorkerPool::new(2);
        let result = pool.map_indexed(4, |i| {
            if i == 2 {
                panic!("boom");
            }
            i
        });
        assert_eq!(result, Err(WorkerPanicked));
    }
}
