mod task;

use std::sync::Arc;
use std::sync::Condvar;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::thread::JoinHandle;

/* -------------------------------- Mod: Task ------------------------------- */

pub use task::TaskDependency;
pub use task::TaskHandle;
pub use task::TaskStatus;

/* -------------------------------------------------------------------------- */
/*                             Struct: ThreadPool                             */
/* -------------------------------------------------------------------------- */

/// `ThreadPool` runs submitted tasks on a fixed set of OS threads. Tasks
/// declare dependencies on other tasks; a task only starts once every
/// dependency has completed. Submission can be paused so a whole batch lands
/// in the queue before workers start competing for it.
pub struct ThreadPool {
    shared: Arc<PoolShared>,
    workers: Vec<JoinHandle<()>>,
}

/* ----------------------------- Struct: PoolShared -------------------------- */

struct PoolShared {
    done_cv: Condvar,
    state: Mutex<PoolState>,
    work_cv: Condvar,
}

struct PoolState {
    active: usize,
    pending: Vec<PendingTask>,
    running: bool,
    shutdown: bool,
}

struct PendingTask {
    dependencies: Vec<TaskDependency>,
    job: Box<dyn FnOnce() + Send>,
    name: String,
}

fn lock(state: &Mutex<PoolState>) -> MutexGuard<'_, PoolState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/* ----------------------------- Impl: ThreadPool ---------------------------- */

impl ThreadPool {
    /// `new` spawns a pool with the given number of worker threads.
    pub fn new(workers: usize) -> Self {
        let shared = Arc::new(PoolShared {
            done_cv: Condvar::new(),
            state: Mutex::new(PoolState {
                active: 0,
                pending: Vec::new(),
                running: true,
                shutdown: false,
            }),
            work_cv: Condvar::new(),
        });

        let workers = (0..workers.max(1))
            .map(|_| {
                let shared = shared.clone();
                std::thread::spawn(move || worker_loop(&shared))
            })
            .collect();

        ThreadPool { shared, workers }
    }

    /// `with_default_workers` sizes the pool to the machine's logical CPU
    /// count.
    pub fn with_default_workers() -> Self {
        ThreadPool::new(num_cpus::get())
    }

    /// `submit` enqueues a task that runs `job` once every dependency has
    /// completed, returning the typed handle to its result.
    pub fn submit<T, F>(
        &self,
        name: impl Into<String>,
        dependencies: Vec<TaskDependency>,
        job: F,
    ) -> TaskHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let slot = Arc::new(Mutex::new(None));
        let status = Arc::new(TaskStatus::new());

        let handle = TaskHandle {
            slot: slot.clone(),
            status: status.clone(),
        };

        let job = Box::new(move || {
            let value = job();
            *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(value);
            status.mark_done();
        });

        {
            let mut state = lock(&self.shared.state);
            state.pending.push(PendingTask {
                dependencies,
                job,
                name: name.into(),
            });
        }

        self.shared.work_cv.notify_all();
        handle
    }

    /// `set_running` pauses (`false`) or resumes (`true`) task consumption.
    /// Pending tasks stay queued while paused.
    pub fn set_running(&self, running: bool) {
        lock(&self.shared.state).running = running;
        self.shared.work_cv.notify_all();
    }

    /// `join` blocks until the pool is quiescent: no task running, and no
    /// runnable task queued.
    pub fn join(&self) {
        let mut state = lock(&self.shared.state);

        while state.active > 0 || (state.running && !state.pending.is_empty()) {
            state = self
                .shared
                .done_cv
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        {
            let mut state = lock(&self.shared.state);
            state.shutdown = true;
        }
        self.shared.work_cv.notify_all();

        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

/* ------------------------------ Fn: worker_loop ---------------------------- */

fn worker_loop(shared: &PoolShared) {
    loop {
        let task = {
            let mut state = lock(&shared.state);

            loop {
                if state.shutdown {
                    return;
                }

                if state.running {
                    let ready = state.pending.iter().position(|task| {
                        task.dependencies.iter().all(|dep| dep.is_done())
                    });

                    if let Some(index) = ready {
                        state.active += 1;
                        break state.pending.remove(index);
                    }
                }

                state = shared
                    .work_cv
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        };

        tracing::trace!("running task '{}'", task.name);
        (task.job)();

        {
            let mut state = lock(&shared.state);
            state.active -= 1;
        }

        // A completed task may satisfy dependencies of queued tasks.
        shared.work_cv.notify_all();
        shared.done_cv.notify_all();
    }
}

/* -------------------------------------------------------------------------- */
/*                                 Mod: Tests                                 */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use super::*;

    #[test]
    fn test_submit_returns_typed_result() {
        // Given: A pool with a single worker.
        let pool = ThreadPool::new(1);

        // When: Submitting a task with no dependencies.
        let task = pool.submit("answer", Vec::new(), || 41 + 1);
        pool.join();

        // Then: The typed result is retrievable exactly once.
        assert_eq!(task.take_result(), Some(42));
        assert_eq!(task.take_result(), None);
    }

    #[test]
    fn test_dependent_task_sees_dependency_result() {
        // Given: A parse-like task and a generate-like task depending on it.
        let pool = ThreadPool::new(4);

        let parse = pool.submit("parse", Vec::new(), || "entities".to_string());
        let parse_handle = parse.clone();
        let generate = pool.submit("generate", vec![parse.dependency()], move || {
            // The dependency completed before this runs, so the result is
            // immediately available.
            let input = parse_handle.take_result();
            format!("generated from {}", input.as_deref().unwrap_or("nothing"))
        });

        // When: Waiting for quiescence.
        pool.join();

        // Then: The dependent observed the dependency's value.
        assert_eq!(
            generate.take_result(),
            Some("generated from entities".to_string())
        );
    }

    #[test]
    fn test_paused_pool_defers_execution() {
        // Given: A paused pool and a counter task batch.
        let pool = ThreadPool::new(2);
        pool.set_running(false);

        let counter = Arc::new(AtomicUsize::new(0));
        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let counter = counter.clone();
                pool.submit(format!("task {i}"), Vec::new(), move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
            })
            .collect();

        // When: Still paused, nothing has run.
        std::thread::sleep(std::time::Duration::from_millis(20));
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        // When: Resuming and joining.
        pool.set_running(true);
        pool.join();

        // Then: Every task ran exactly once.
        assert_eq!(counter.load(Ordering::SeqCst), 8);
        assert!(tasks.iter().all(|t| t.take_result().is_some()));
    }

    #[test]
    fn test_dependencies_order_execution() {
        // Given: A chain of three tasks appending to a shared log.
        let pool = ThreadPool::new(4);
        let log = Arc::new(Mutex::new(Vec::new()));

        let first = {
            let log = log.clone();
            pool.submit("first", Vec::new(), move || {
                log.lock().unwrap().push(1);
            })
        };
        let second = {
            let log = log.clone();
            pool.submit("second", vec![first.dependency()], move || {
                log.lock().unwrap().push(2);
            })
        };
        let _third = {
            let log = log.clone();
            pool.submit("third", vec![second.dependency()], move || {
                log.lock().unwrap().push(3);
            })
        };

        // When: Waiting for quiescence.
        pool.join();

        // Then: Execution followed the dependency chain.
        assert_eq!(*log.lock().unwrap(), vec![1, 2, 3]);
    }
}
