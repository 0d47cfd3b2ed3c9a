//! Idle-time scheduling used for deferred commits.

use alloc::{boxed::Box, collections::VecDeque, rc::Rc};
use core::{cell::RefCell, fmt};

/// Work handed to the host's idle slot.
pub type Task = Box<dyn FnOnce()>;

/// The host's idle/yield primitive.
///
/// Implementations must eventually run every task exactly once. No ordering is guaranteed
/// between tasks queued by different components.
pub trait IdleScheduler {
    /// Queues `task` for the next idle point.
    fn request_idle(&self, task: Task);
}

impl fmt::Debug for dyn IdleScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("dyn IdleScheduler")
    }
}

/// A FIFO idle queue drained explicitly by the host loop.
#[derive(Clone, Default)]
pub struct IdleQueue {
    tasks: Rc<RefCell<VecDeque<Task>>>,
}

impl fmt::Debug for IdleQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdleQueue")
            .field("pending", &self.len())
            .finish()
    }
}

impl IdleQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// Returns `true` when nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.borrow().is_empty()
    }

    /// Runs the tasks queued before this call. Tasks they queue wait for the next call.
    ///
    /// Returns the number of tasks run.
    pub fn run_pending(&self) -> usize {
        let due = self.len();
        for _ in 0..due {
            let task = self.tasks.borrow_mut().pop_front();
            match task {
                Some(task) => task(),
                None => return due,
            }
        }
        due
    }

    /// Drains the queue completely, including tasks queued while draining.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while !self.is_empty() {
            ran += self.run_pending();
        }
        ran
    }
}

impl IdleScheduler for IdleQueue {
    fn request_idle(&self, task: Task) {
        self.tasks.borrow_mut().push_back(task);
    }
}
