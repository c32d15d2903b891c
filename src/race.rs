// Lost-update race demonstration
//
// Several tasks bump one shared counter. The unguarded counter splits the
// read-modify-write into a load, a yield and a store, so increments made by
// other tasks in between are overwritten. The guarded counters make the
// update indivisible and always reach tasks * iterations.

use crate::error::Result;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

pub trait Counter: Send + Sync {
    fn name(&self) -> &'static str;
    /// One increment. Async so an unguarded implementation can yield mid-update.
    fn increment(&self) -> impl std::future::Future<Output = ()> + Send;
    fn value(&self) -> u64;
}

#[derive(Debug, Default)]
pub struct UnguardedCounter {
    value: AtomicU64,
}

impl Counter for UnguardedCounter {
    fn name(&self) -> &'static str {
        "unguarded"
    }

    async fn increment(&self) {
        let current = self.value.load(Ordering::Relaxed);
        tokio::task::yield_now().await;
        self.value.store(current + 1, Ordering::Relaxed);
    }

    fn value(&self) -> u64 {
        self.value.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
pub struct AtomicCounter {
    value: AtomicU64,
}

impl Counter for AtomicCounter {
    fn name(&self) -> &'static str {
        "atomic"
    }

    async fn increment(&self) {
        self.value.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
    }

    fn value(&self) -> u64 {
        self.value.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
pub struct MutexCounter {
    value: Mutex<u64>,
}

impl Counter for MutexCounter {
    fn name(&self) -> &'static str {
        "mutex"
    }

    async fn increment(&self) {
        {
            // A poisoned lock still holds a valid count.
            let mut guard = self.value.lock().unwrap_or_else(|p| p.into_inner());
            *guard += 1;
        }
        tokio::task::yield_now().await;
    }

    fn value(&self) -> u64 {
        *self.value.lock().unwrap_or_else(|p| p.into_inner())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RaceReport {
    pub counter: &'static str,
    pub expected: u64,
    pub observed: u64,
}

impl RaceReport {
    pub fn lost_updates(&self) -> u64 {
        self.expected.saturating_sub(self.observed)
    }
}

/// Run `tasks` tokio tasks, each incrementing `counter` `iterations` times.
///
/// A task that panics fails the run with `Error::Task` rather than showing up
/// as lost updates.
pub async fn run_counter<C>(counter: Arc<C>, tasks: usize, iterations: u64) -> Result<RaceReport>
where
    C: Counter + 'static,
{
    let mut handles = Vec::with_capacity(tasks);
    for _ in 0..tasks {
        let counter = Arc::clone(&counter);
        handles.push(tokio::spawn(async move {
            for _ in 0..iterations {
                counter.increment().await;
            }
        }));
    }
    for handle in handles {
        handle.await?;
    }

    let report = RaceReport {
        counter: counter.name(),
        expected: tasks as u64 * iterations,
        observed: counter.value(),
    };
    debug!(
        counter = report.counter,
        expected = report.expected,
        observed = report.observed,
        "race run finished"
    );
    Ok(report)
}

/// Run the same workload against all three counters.
pub async fn compare_counters(tasks: usize, iterations: u64) -> Result<Vec<RaceReport>> {
    Ok(vec![
        run_counter(Arc::new(UnguardedCounter::default()), tasks, iterations).await?,
        run_counter(Arc::new(AtomicCounter::default()), tasks, iterations).await?,
        run_counter(Arc::new(MutexCounter::default()), tasks, iterations).await?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn single_task_never_loses() {
        let report = run_counter(Arc::new(UnguardedCounter::default()), 1, 500).await.unwrap();
        assert_eq!(report.observed, 500);
        assert_eq!(report.lost_updates(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn guarded_counters_are_exact() {
        let atomic = run_counter(Arc::new(AtomicCounter::default()), 2, 1000).await.unwrap();
        assert_eq!(atomic.observed, 2000);
        let mutex = run_counter(Arc::new(MutexCounter::default()), 2, 1000).await.unwrap();
        assert_eq!(mutex.observed, 2000);
    }

    #[tokio::test]
    async fn interleaved_tasks_lose_updates() {
        // On one thread every yield hands over to the other task, so the
        // stores overwrite each other deterministically.
        let report = run_counter(Arc::new(UnguardedCounter::default()), 2, 1000).await.unwrap();
        assert!(report.observed < report.expected);
    }
}
