use std::sync::Arc;
use std::sync::Condvar;
use std::sync::Mutex;
use std::sync::PoisonError;

/* -------------------------------------------------------------------------- */
/*                             Struct: TaskStatus                             */
/* -------------------------------------------------------------------------- */

/// `TaskStatus` is the per-task completion signal. The scheduler consults it
/// to gate dependent tasks, and result retrieval blocks on it.
pub struct TaskStatus {
    cv: Condvar,
    done: Mutex<bool>,
}

impl TaskStatus {
    pub(super) fn new() -> Self {
        TaskStatus {
            cv: Condvar::new(),
            done: Mutex::new(false),
        }
    }

    pub fn is_done(&self) -> bool {
        *self.done.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) fn mark_done(&self) {
        *self.done.lock().unwrap_or_else(PoisonError::into_inner) = true;
        self.cv.notify_all();
    }

    fn wait(&self) {
        let mut done = self.done.lock().unwrap_or_else(PoisonError::into_inner);
        while !*done {
            done = self.cv.wait(done).unwrap_or_else(PoisonError::into_inner);
        }
    }
}

/// `TaskDependency` is the type-erased handle a task lists the tasks it must
/// run after by.
pub type TaskDependency = Arc<TaskStatus>;

/* -------------------------------------------------------------------------- */
/*                             Struct: TaskHandle                             */
/* -------------------------------------------------------------------------- */

/// `TaskHandle` is the typed handle to one submitted task's result. Handles
/// are cheap to clone; whichever holder calls [`TaskHandle::take_result`]
/// first gets the value.
pub struct TaskHandle<T> {
    pub(super) slot: Arc<Mutex<Option<T>>>,
    pub(super) status: Arc<TaskStatus>,
}

impl<T> Clone for TaskHandle<T> {
    fn clone(&self) -> Self {
        TaskHandle {
            slot: self.slot.clone(),
            status: self.status.clone(),
        }
    }
}

impl<T> TaskHandle<T> {
    /// `dependency` returns the handle dependents are gated on.
    pub fn dependency(&self) -> TaskDependency {
        self.status.clone()
    }

    /// `take_result` blocks until the task completed, then moves its result
    /// out. Returns `None` when another holder already took it.
    pub fn take_result(&self) -> Option<T> {
        self.status.wait();
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}
