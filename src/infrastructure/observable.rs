//! Observable values.
//!
//! An [`Observable`] holds a value and notifies subscribers when it changes.
//! Subscribing delivers the current value immediately. The returned
//! [`Subscription`] unsubscribes when dropped.
//!
//! Subscribers run after the value borrow is released, so a subscriber may
//! read the observable (or set it again) without panicking.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

type Subscriber<T> = Rc<dyn Fn(&T)>;

struct Shared<T> {
    value: RefCell<T>,
    subscribers: RefCell<Vec<(u64, Subscriber<T>)>>,
    next_id: Cell<u64>,
}

/// A shared, subscribable value.
///
/// Clones share the same value and subscriber list.
///
/// # Example
///
/// ```
/// use paletta::Observable;
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// let open = Observable::new(false);
/// let seen = Rc::new(RefCell::new(Vec::new()));
/// let log = Rc::clone(&seen);
/// let subscription = open.subscribe(move |value| log.borrow_mut().push(*value));
///
/// open.set(true);
/// open.set(true);
/// drop(subscription);
/// open.set(false);
///
/// assert_eq!(*seen.borrow(), [false, true]);
/// ```
pub struct Observable<T> {
    shared: Rc<Shared<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            shared: Rc::new(Shared {
                value: RefCell::new(value),
                subscribers: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
            }),
        }
    }

    /// Returns a copy of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.shared.value.borrow().clone()
    }

    /// Stores `value` and notifies subscribers if it differs from the
    /// current one.
    pub fn set(&self, value: T) {
        {
            let mut current = self.shared.value.borrow_mut();
            if *current == value {
                return;
            }
            *current = value;
        }
        self.notify();
    }

    /// Applies `f` to the current value and stores the result.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let next = f(&self.shared.value.borrow());
        self.set(next);
    }

    /// Registers `subscriber` and calls it with the current value.
    pub fn subscribe(&self, subscriber: impl Fn(&T) + 'static) -> Subscription {
        let id = self.shared.next_id.get();
        self.shared.next_id.set(id + 1);
        let subscriber: Subscriber<T> = Rc::new(subscriber);
        self.shared
            .subscribers
            .borrow_mut()
            .push((id, Rc::clone(&subscriber)));

        let value = self.get();
        subscriber(&value);

        let shared: Weak<Shared<T>> = Rc::downgrade(&self.shared);
        Subscription {
            release: Some(Box::new(move || {
                if let Some(shared) = shared.upgrade() {
                    shared.subscribers.borrow_mut().retain(|(sid, _)| *sid != id);
                }
            })),
        }
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.shared.subscribers.borrow().len()
    }

    fn notify(&self) {
        let subscribers: Vec<Subscriber<T>> = self
            .shared
            .subscribers
            .borrow()
            .iter()
            .map(|(_, subscriber)| Rc::clone(subscriber))
            .collect();
        let value = self.get();
        for subscriber in subscribers {
            subscriber(&value);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("value", &*self.shared.value.borrow())
            .field("subscribers", &self.shared.subscribers.borrow().len())
            .finish()
    }
}

/// Live subscription to an [`Observable`]. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribers_may_read_during_notification() {
        let text = Observable::new(String::new());
        let reader = text.clone();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        let _sub = text.subscribe(move |value: &String| {
            assert_eq!(*value, reader.get());
            log.borrow_mut().push(value.clone());
        });

        text.set("a".to_string());
        text.update(|value| format!("{value}b"));
        assert_eq!(*seen.borrow(), ["", "a", "ab"]);
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let counter = Observable::new(0_u32);
        let calls = Rc::new(Cell::new(0));
        let hits = Rc::clone(&calls);
        let sub = counter.subscribe(move |_| hits.set(hits.get() + 1));
        assert_eq!(counter.subscriber_count(), 1);

        sub.unsubscribe();
        counter.set(5);
        assert_eq!(calls.get(), 1);
        assert_eq!(counter.subscriber_count(), 0);
    }
}
