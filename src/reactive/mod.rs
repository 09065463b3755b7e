//! Explicit publish/subscribe primitive
//!
//! [`Signal`] replaces composable-observable sugar with a small behavior-style
//! subject: it retains the latest value, replays it to new observers, and
//! carries an end-of-life notification. Node positions, the selection, and the
//! traffic feeds are all published through signals; edges tie their own
//! lifetime to the completion of the position signals they observe.
//!
//! Dispatch is single-threaded. Callbacks may subscribe to or cancel
//! subscriptions on the signal currently dispatching; both are handled by
//! swapping the observer list out for the duration of a dispatch.

use std::cell::RefCell;
use std::mem;
use std::rc::{Rc, Weak};

struct Observer<T> {
    id: u64,
    callback: Box<dyn FnMut(&T)>,
}

struct Completion {
    id: u64,
    callback: Option<Box<dyn FnOnce()>>,
}

struct SignalCore<T> {
    latest: Option<T>,
    completed: bool,
    next_id: u64,
    observers: Vec<Observer<T>>,
    completions: Vec<Completion>,
    /// Ids cancelled while the observer list is swapped out for dispatch.
    cancelled: Vec<u64>,
    dispatching: bool,
}

impl<T> SignalCore<T> {
    fn new() -> Self {
        Self {
            latest: None,
            completed: false,
            next_id: 0,
            observers: Vec::new(),
            completions: Vec::new(),
            cancelled: Vec::new(),
            dispatching: false,
        }
    }
}

/// A single-threaded, behavior-style event stream.
pub struct Signal<T> {
    core: Rc<RefCell<SignalCore<T>>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            core: Rc::clone(&self.core),
        }
    }
}

impl<T: Clone + 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> Signal<T> {
    /// Create a signal with no value yet.
    pub fn new() -> Self {
        Self {
            core: Rc::new(RefCell::new(SignalCore::new())),
        }
    }

    /// The most recently emitted value, if any.
    pub fn latest(&self) -> Option<T> {
        self.core.borrow().latest.clone()
    }

    /// Whether the signal has ended.
    pub fn is_completed(&self) -> bool {
        self.core.borrow().completed
    }

    /// Publish a value to all observers, in subscription order.
    ///
    /// Panics when the signal has already completed: emitting past
    /// end-of-life is a use-after-destroy programming error.
    pub fn emit(&self, value: T) {
        let mut observers = {
            let mut core = self.core.borrow_mut();
            assert!(!core.completed, "emit on a completed signal");
            core.latest = Some(value.clone());
            core.dispatching = true;
            mem::take(&mut core.observers)
        };

        for observer in observers.iter_mut() {
            let skip = self.core.borrow().cancelled.contains(&observer.id);
            if !skip {
                (observer.callback)(&value);
            }
        }

        let mut core = self.core.borrow_mut();
        core.dispatching = false;
        let cancelled = mem::take(&mut core.cancelled);
        observers.retain(|o| !cancelled.contains(&o.id));
        // observers added during dispatch were collected in core.observers
        let added = mem::take(&mut core.observers);
        core.observers = observers;
        core.observers.extend(added);
    }

    /// Register a value observer. The latest value, when present, is replayed
    /// immediately. Subscribing to a completed signal replays the latest value
    /// and returns an inert subscription.
    pub fn subscribe(&self, mut callback: impl FnMut(&T) + 'static) -> Subscription {
        if let Some(value) = self.latest() {
            callback(&value);
        }
        if self.is_completed() {
            return Subscription::inert();
        }

        let id = {
            let mut core = self.core.borrow_mut();
            let id = core.next_id;
            core.next_id += 1;
            core.observers.push(Observer {
                id,
                callback: Box::new(callback),
            });
            id
        };
        self.canceller(id)
    }

    /// Register a completion observer. Fires immediately when the signal has
    /// already completed.
    pub fn on_complete(&self, callback: impl FnOnce() + 'static) -> Subscription {
        if self.is_completed() {
            callback();
            return Subscription::inert();
        }

        let id = {
            let mut core = self.core.borrow_mut();
            let id = core.next_id;
            core.next_id += 1;
            core.completions.push(Completion {
                id,
                callback: Some(Box::new(callback)),
            });
            id
        };
        self.canceller(id)
    }

    /// End the signal: no further emissions are possible, all value observers
    /// are dropped and every completion observer fires once. Idempotent.
    pub fn complete(&self) {
        let completions = {
            let mut core = self.core.borrow_mut();
            if core.completed {
                return;
            }
            core.completed = true;
            core.observers.clear();
            mem::take(&mut core.completions)
        };

        for completion in completions {
            if let Some(callback) = completion.callback {
                callback();
            }
        }
    }

    fn canceller(&self, id: u64) -> Subscription {
        let weak: Weak<RefCell<SignalCore<T>>> = Rc::downgrade(&self.core);
        Subscription::new(move || {
            if let Some(core) = weak.upgrade() {
                let mut core = core.borrow_mut();
                if core.dispatching {
                    core.cancelled.push(id);
                } else {
                    core.observers.retain(|o| o.id != id);
                    core.completions.retain(|c| c.id != id);
                }
            }
        })
    }
}

/// Handle to a registered observer. Cancels the registration on drop.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription that is not connected to anything.
    pub fn inert() -> Self {
        Self { cancel: None }
    }

    /// Cancel the registration now.
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    /// Keep the registration alive for the lifetime of the signal without
    /// holding on to this handle.
    pub fn detach(mut self) {
        self.cancel = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}
