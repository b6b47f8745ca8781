//! As-soon-as-possible task queue
//!
//! Coalesced store emissions are not delivered inside the `set_state`
//! call that caused them. They are pushed onto this thread-local queue and
//! run at the next drain, the equivalent of a microtask checkpoint. All
//! writes issued between two drains form one scheduling tick.
//!
//! The host decides when a tick ends by calling [`tick`] or
//! [`run_until_idle`] from its event loop.

use std::cell::RefCell;
use std::collections::VecDeque;

type Task = Box<dyn FnOnce()>;

thread_local! {
    static QUEUE: RefCell<VecDeque<Task>> = RefCell::new(VecDeque::new());
}

/// Queue a task to run at the next drain
pub fn schedule(task: impl FnOnce() + 'static) {
    QUEUE.with(|queue| queue.borrow_mut().push_back(Box::new(task)));
}

/// Number of tasks waiting to run
pub fn pending() -> usize {
    QUEUE.with(|queue| queue.borrow().len())
}

fn pop() -> Option<Task> {
    QUEUE.with(|queue| queue.borrow_mut().pop_front())
}

/// Run the tasks that were queued when this call started
///
/// Tasks scheduled while these run wait for the next tick. Returns the
/// number of tasks executed.
pub fn tick() -> usize {
    let due = pending();
    for _ in 0..due {
        match pop() {
            Some(task) => task(),
            None => break,
        }
    }
    if due > 0 {
        log::trace!("scheduler tick ran {} task(s)", due);
    }
    due
}

/// Run tasks until the queue is empty, including ones scheduled meanwhile
///
/// Returns the number of tasks executed.
pub fn run_until_idle() -> usize {
    let mut ran = 0;
    while let Some(task) = pop() {
        task();
        ran += 1;
    }
    if ran > 0 {
        log::trace!("scheduler drained {} task(s)", ran);
    }
    ran
}
