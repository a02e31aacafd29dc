// Copyright (C) 2026  Caprica Software Limited
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Observable values with explicit subscriptions.
//!
//! This module provides [`Bindable`], a shared value that notifies a list of
//! subscribers whenever it is assigned. It is the building block for the
//! filter criteria and selection state, where several collaborators need to
//! react to the same edit without any implicit event wiring.
//!
//! Subscriptions are explicit: [`Bindable::subscribe`] returns a
//! [`Subscription`] guard that removes the callback when dropped, and
//! [`Bindable::close`] severs every remaining subscriber at teardown so no
//! callback can outlive the component that registered it.
//!
//! # Ordering
//!
//! `set` commits the new value and releases the value lock *before* any
//! subscriber runs. Callbacks therefore always observe the committed value
//! and may freely read this or any other bindable without deadlocking.
//! Notification is unconditional: assigning a value equal to the current one
//! still notifies, which callers rely on to re-fire downstream work.

use std::{
    fmt,
    sync::{
        Arc, Mutex, Weak,
        atomic::{AtomicU64, Ordering},
    },
};

type Callback<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// A registered list of callbacks, shared by [`Bindable`] and the result-set
/// change notifications.
pub(crate) struct SubscriberList<E> {
    entries: Mutex<Vec<(u64, Callback<E>)>>,
    next_id: AtomicU64,
}

impl<E: 'static> SubscriberList<E> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Mutex::new(vec![]),
            next_id: AtomicU64::new(0),
        }
    }

    /// Registers a callback and returns the guard that removes it again.
    ///
    /// The guard holds only a weak reference, so an outstanding
    /// [`Subscription`] does not keep the subscriber list alive.
    pub(crate) fn subscribe(
        list: &Arc<Self>,
        callback: impl Fn(&E) + Send + Sync + 'static,
    ) -> Subscription {
        let id = list.next_id.fetch_add(1, Ordering::Relaxed);
        list.entries
            .lock()
            .unwrap()
            .push((id, Arc::new(callback)));

        let weak: Weak<Self> = Arc::downgrade(list);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(list) = weak.upgrade() {
                    list.entries
                        .lock()
                        .unwrap()
                        .retain(|(entry_id, _)| *entry_id != id);
                }
            })),
        }
    }

    /// Invokes every callback with `event`.
    ///
    /// The list is snapshotted first so callbacks run without the entries
    /// lock held and may subscribe or unsubscribe re-entrantly.
    pub(crate) fn emit(&self, event: &E) {
        let callbacks: Vec<Callback<E>> = self
            .entries
            .lock()
            .unwrap()
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        for callback in callbacks {
            callback(event);
        }
    }

    pub(crate) fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

/// A guard for one registered callback.
///
/// Dropping the guard (or calling [`Subscription::unsubscribe`]) removes the
/// callback. Holders collect these and drop them on teardown.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Removes the callback now instead of at drop time.
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

/// A shared observable value.
///
/// Clones are handles to the same underlying value and subscriber list.
pub struct Bindable<T> {
    value: Arc<Mutex<T>>,
    subscribers: Arc<SubscriberList<T>>,
}

impl<T> Clone for Bindable<T> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            subscribers: Arc::clone(&self.subscribers),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Bindable<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: Arc::new(Mutex::new(value)),
            subscribers: Arc::new(SubscriberList::new()),
        }
    }

    /// Returns a clone of the current value.
    pub fn get(&self) -> T {
        self.value.lock().unwrap().clone()
    }

    /// Assigns a new value and notifies every subscriber.
    ///
    /// The value is committed and its lock released before any callback
    /// runs, so subscribers observe the assignment as already complete.
    pub fn set(&self, value: T) {
        {
            let mut slot = self.value.lock().unwrap();
            *slot = value;
        }

        let committed = self.get();
        self.subscribers.emit(&committed);
    }

    /// Registers `callback` to run after every assignment.
    pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        SubscriberList::subscribe(&self.subscribers, callback)
    }

    /// Severs every subscriber. Used at teardown; the value itself remains
    /// readable.
    pub fn close(&self) {
        self.subscribers.clear();
    }
}

impl<T: fmt::Debug> fmt::Debug for Bindable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Bindable").field(&*self.value.lock().unwrap()).finish()
    }
}
