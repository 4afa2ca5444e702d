//! Deferred continuations.
//!
//! Fields never mutate their controls from inside a change reaction. They
//! schedule a task instead, which the host runs once the current call stack
//! has unwound. Tasks scheduled in the same turn run in FIFO order.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;

pub type Task = Box<dyn FnOnce()>;

pub trait TaskQueue {
    fn schedule(&self, task: Task);
}

/// FIFO queue drained explicitly by the host (a microtask checkpoint).
#[derive(Default)]
pub struct MicrotaskQueue {
    tasks: RefCell<VecDeque<Task>>,
    draining: Cell<bool>,
}

impl MicrotaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.tasks.borrow().len()
    }

    pub fn is_idle(&self) -> bool {
        self.tasks.borrow().is_empty()
    }

    /// Runs queued tasks, including tasks they schedule, until none remain.
    /// Returns how many ran. A nested call from inside a task is a no-op.
    pub fn run_until_idle(&self) -> usize {
        if self.draining.replace(true) {
            return 0;
        }
        let _draining = DrainGuard(&self.draining);
        let mut ran = 0;
        loop {
            // Pop before running so the task can schedule more work.
            let next = self.tasks.borrow_mut().pop_front();
            let Some(task) = next else {
                break;
            };
            task();
            ran += 1;
        }
        ran
    }
}

// Clears the draining flag even when a task panics.
struct DrainGuard<'a>(&'a Cell<bool>);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl TaskQueue for MicrotaskQueue {
    fn schedule(&self, task: Task) {
        self.tasks.borrow_mut().push_back(task);
    }
}

impl fmt::Debug for MicrotaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MicrotaskQueue")
            .field("pending", &self.pending())
            .finish()
    }
}

/// Runs every task as soon as it is scheduled.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImmediateQueue;

impl TaskQueue for ImmediateQueue {
    fn schedule(&self, task: Task) {
        task();
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;

    #[test]
    fn microtasks_run_in_fifo_order() {
        let queue = MicrotaskQueue::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for n in 0..3 {
            let log = Rc::clone(&log);
            queue.schedule(Box::new(move || log.borrow_mut().push(n)));
        }
        assert_eq!(queue.pending(), 3);
        assert!(log.borrow().is_empty());
        assert_eq!(queue.run_until_idle(), 3);
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
        assert!(queue.is_idle());
    }

    #[test]
    fn queue_drains_again_after_a_panicking_task() {
        let queue = MicrotaskQueue::new();
        queue.schedule(Box::new(|| panic!("validator failure")));
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            queue.run_until_idle();
        }));
        assert!(outcome.is_err());

        let ran = Rc::new(Cell::new(false));
        let flag = Rc::clone(&ran);
        queue.schedule(Box::new(move || flag.set(true)));
        assert_eq!(queue.run_until_idle(), 1);
        assert!(ran.get());
    }

    #[test]
    fn tasks_scheduled_while_draining_run_last() {
        let queue = Rc::new(MicrotaskQueue::new());
        let log = Rc::new(RefCell::new(Vec::new()));

        let inner_queue = Rc::clone(&queue);
        let inner_log = Rc::clone(&log);
        queue.schedule(Box::new(move || {
            inner_log.borrow_mut().push("first");
            let nested = Rc::clone(&inner_log);
            inner_queue.schedule(Box::new(move || nested.borrow_mut().push("nested")));
        }));
        let tail = Rc::clone(&log);
        queue.schedule(Box::new(move || tail.borrow_mut().push("second")));

        assert_eq!(queue.run_until_idle(), 3);
        assert_eq!(*log.borrow(), vec!["first", "second", "nested"]);
    }

    #[test]
    fn immediate_queue_runs_inline() {
        let hit = Rc::new(Cell::new(false));
        let flag = Rc::clone(&hit);
        ImmediateQueue.schedule(Box::new(move || flag.set(true)));
        assert!(hit.get());
    }
}
