//! Single-threaded cooperative run loop
//!
//! A task is a closure returning `true` when it's done. Every pass polls
//! each pending task once, in insertion order, and drops the finished
//! ones. Tasks posted while a pass is running are polled on the next pass.
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::mem;
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use crate::config::Config;


/// A polling closure. Returns `true` when done and removable.
pub type Task = Box<dyn FnMut() -> bool>;

type Queue = VecDeque<Task>;


/// The run loop
///
/// Owns the queue of pending tasks. Components never keep a reference
/// to the loop itself, they post through a `Handle`.
pub struct Loop {
    queue: Rc<RefCell<Queue>>,
    poll_interval: Duration,
}

/// Cloneable handle to post tasks into a `Loop`
///
/// May be used from inside a running task.
#[derive(Clone)]
pub struct Handle {
    queue: Rc<RefCell<Queue>>,
}

impl Loop {
    pub fn new(config: &Config) -> Loop {
        Loop {
            queue: Rc::new(RefCell::new(VecDeque::new())),
            poll_interval: config.poll_interval,
        }
    }
    pub fn handle(&self) -> Handle {
        Handle { queue: self.queue.clone() }
    }
    pub fn post<F>(&self, task: F)
        where F: FnMut() -> bool + 'static
    {
        self.queue.borrow_mut().push_back(Box::new(task));
    }
    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }
    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }
    /// Runs a single pass over the queue
    ///
    /// Returns `true` if some tasks are still pending afterwards.
    pub fn turn(&self) -> bool {
        let mut pass = mem::take(&mut *self.queue.borrow_mut());
        if pass.is_empty() {
            return false;
        }
        pass.retain_mut(|task| !task());
        let mut queue = self.queue.borrow_mut();
        // Whatever was posted during the pass goes after the survivors
        let posted = mem::replace(&mut *queue, pass);
        queue.extend(posted);
        trace!("scheduler pass done, {} tasks pending", queue.len());
        !queue.is_empty()
    }
    /// Runs passes until the queue is empty
    ///
    /// Sleeps for the configured poll interval between passes, or just
    /// yields the thread when the interval is zero.
    pub fn run(&self) {
        while self.turn() {
            if self.poll_interval == Duration::new(0, 0) {
                thread::yield_now();
            } else {
                thread::sleep(self.poll_interval);
            }
        }
    }
}

impl Handle {
    pub fn post<F>(&self, task: F)
        where F: FnMut() -> bool + 'static
    {
        self.queue.borrow_mut().push_back(Box::new(task));
    }
}

impl fmt::Debug for Loop {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Loop")
            .field("pending", &self.len())
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Handle")
            .field("pending", &self.queue.borrow().len())
            .finish()
    }
}


#[cfg(test)]
mod test {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use std::time::Duration;

    use crate::config::Config;
    use super::Loop;

    fn fast_loop() -> Loop {
        Loop::new(&Config::new().poll_interval(Duration::new(0, 0)))
    }

    #[test]
    fn test_empty_run_returns() {
        let lp = fast_loop();
        lp.run();
        assert!(lp.is_empty());
        assert!(!lp.turn());
    }

    #[test]
    fn test_task_polled_until_done() {
        let lp = fast_loop();
        let polls = Rc::new(Cell::new(0));
        let p = polls.clone();
        lp.post(move || {
            p.set(p.get() + 1);
            p.get() == 3
        });
        lp.run();
        assert_eq!(polls.get(), 3);
    }

    #[test]
    fn test_insertion_order_within_pass() {
        let lp = fast_loop();
        let log = Rc::new(RefCell::new(Vec::new()));
        for i in 0..3 {
            let log = log.clone();
            lp.post(move || { log.borrow_mut().push(i); true });
        }
        assert!(!lp.turn());
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn test_post_from_inside_task() {
        let lp = fast_loop();
        let handle = lp.handle();
        let done = Rc::new(Cell::new(false));
        let d = done.clone();
        lp.post(move || {
            let d = d.clone();
            handle.post(move || { d.set(true); true });
            true
        });
        assert!(lp.turn());
        assert!(!done.get());
        assert!(!lp.turn());
        assert!(done.get());
    }

    #[test]
    fn test_stuck_task_does_not_block_others() {
        let lp = fast_loop();
        let finished = Rc::new(Cell::new(0));
        lp.post(|| false);
        for _ in 0..2 {
            let f = finished.clone();
            lp.post(move || { f.set(f.get() + 1); true });
        }
        for _ in 0..10 {
            assert!(lp.turn());
        }
        assert_eq!(finished.get(), 2);
        assert_eq!(lp.len(), 1);
    }
}
