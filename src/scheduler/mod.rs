//! Single-threaded event queue
//!
//! All timing in the core (pulse staging, debounced persistence, batch
//! expansion) runs through one logical clock with millisecond granularity.
//! The driver advances the clock: a UI shell advances it with wall time,
//! tests advance it virtually, which makes every timing-dependent behavior
//! deterministic.

use std::cell::RefCell;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::mem;
use std::rc::Rc;

struct Timer {
    due_ms: u64,
    seq: u64,
    callback: Box<dyn FnOnce()>,
}

impl PartialEq for Timer {
    fn eq(&self, other: &Self) -> bool {
        self.due_ms == other.due_ms && self.seq == other.seq
    }
}

impl Eq for Timer {}

impl PartialOrd for Timer {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timer {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.due_ms, self.seq).cmp(&(other.due_ms, other.seq))
    }
}

struct SchedulerInner {
    now_ms: u64,
    next_seq: u64,
    queue: BinaryHeap<Reverse<Timer>>,
}

/// Cooperative timer queue over a logical millisecond clock.
#[derive(Clone)]
pub struct Scheduler {
    inner: Rc<RefCell<SchedulerInner>>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    /// Create a scheduler with its clock at zero.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(SchedulerInner {
                now_ms: 0,
                next_seq: 0,
                queue: BinaryHeap::new(),
            })),
        }
    }

    /// The current logical time in milliseconds.
    pub fn now(&self) -> u64 {
        self.inner.borrow().now_ms
    }

    /// Run `callback` once `delay_ms` milliseconds have elapsed. Timers with
    /// the same deadline fire in scheduling order.
    pub fn schedule(&self, delay_ms: u64, callback: impl FnOnce() + 'static) {
        let mut inner = self.inner.borrow_mut();
        let due_ms = inner.now_ms + delay_ms;
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.queue.push(Reverse(Timer {
            due_ms,
            seq,
            callback: Box::new(callback),
        }));
    }

    /// Number of timers still pending.
    pub fn pending(&self) -> usize {
        self.inner.borrow().queue.len()
    }

    /// Advance the clock by `delta_ms`, firing every timer that becomes due,
    /// in deadline order. Callbacks may schedule further timers; those are
    /// fired too when they fall inside the advanced window.
    pub fn advance(&self, delta_ms: u64) {
        let target_ms = self.inner.borrow().now_ms + delta_ms;

        loop {
            let timer = {
                let mut inner = self.inner.borrow_mut();
                match inner.queue.peek() {
                    Some(Reverse(timer)) if timer.due_ms <= target_ms => {
                        let Reverse(timer) = inner.queue.pop().unwrap();
                        inner.now_ms = timer.due_ms;
                        timer
                    }
                    _ => break,
                }
            };
            (timer.callback)();
        }

        self.inner.borrow_mut().now_ms = target_ms;
    }
}

struct DebounceInner<T> {
    pending: Option<T>,
    last_fed_ms: u64,
    armed: bool,
}

/// Trailing-edge debouncer: the action runs with the last fed value once a
/// full quiet window has elapsed without another feed.
pub struct Debounce<T> {
    scheduler: Scheduler,
    window_ms: u64,
    action: Rc<dyn Fn(T)>,
    inner: Rc<RefCell<DebounceInner<T>>>,
}

impl<T> Clone for Debounce<T> {
    fn clone(&self) -> Self {
        Self {
            scheduler: self.scheduler.clone(),
            window_ms: self.window_ms,
            action: Rc::clone(&self.action),
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: 'static> Debounce<T> {
    /// Create a debouncer that runs `action` after `window_ms` of quiet.
    pub fn new(scheduler: Scheduler, window_ms: u64, action: impl Fn(T) + 'static) -> Self {
        Self {
            scheduler,
            window_ms,
            action: Rc::new(action),
            inner: Rc::new(RefCell::new(DebounceInner {
                pending: None,
                last_fed_ms: 0,
                armed: false,
            })),
        }
    }

    /// Record a value and restart the quiet window.
    pub fn feed(&self, value: T) {
        let arm = {
            let mut inner = self.inner.borrow_mut();
            inner.pending = Some(value);
            inner.last_fed_ms = self.scheduler.now();
            !mem::replace(&mut inner.armed, true)
        };
        if arm {
            self.arm_timer(self.window_ms);
        }
    }

    fn arm_timer(&self, delay_ms: u64) {
        let this = self.clone();
        self.scheduler.schedule(delay_ms, move || this.fire());
    }

    fn fire(&self) {
        let now = self.scheduler.now();
        let fired = {
            let mut inner = self.inner.borrow_mut();
            let elapsed = now - inner.last_fed_ms;
            if elapsed >= self.window_ms {
                inner.armed = false;
                inner.pending.take()
            } else {
                // fed again inside the window, try again when it elapses
                let remaining = self.window_ms - elapsed;
                drop(inner);
                self.arm_timer(remaining);
                None
            }
        };
        if let Some(value) = fired {
            (self.action)(value);
        }
    }
}
