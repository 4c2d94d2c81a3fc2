//! Duplicate call suppression.
//!
//! A [`Group`] makes sure that only one execution of an operation is in flight for a given key at
//! a time. Callers arriving while the operation runs wait for it and receive a clone of the same
//! result, including the same error. Nothing is remembered once the call has finished: the next
//! call for the key runs the operation again.
//!
//! ```
//! use plain_groupcache::singleflight::Group;
//!
//! let group: Group<String, std::io::ErrorKind> = Group::new();
//!
//! let value = group.call("user:42", || Ok(String::from("Ferris")));
//! assert_eq!(value, Ok(String::from("Ferris")));
//! assert_eq!(group.in_flight(), 0);
//! ```

use crate::RandomState;
use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

enum State<V, E> {
    Pending,
    Done(Result<V, E>),
    Abandoned,
}

/// An in-flight call. Waiters block on `done` until the executor publishes a result.
struct Call<V, E> {
    state: Mutex<State<V, E>>,
    done: Condvar,
    dups: AtomicUsize,
}

impl<V, E> Call<V, E> {
    fn new() -> Self {
        Self {
            state: Mutex::new(State::Pending),
            done: Condvar::new(),
            dups: AtomicUsize::new(0),
        }
    }

    fn publish(&self, state: State<V, E>) {
        *self.state.lock() = state;
        self.done.notify_all();
    }

    /// Blocks until the call finished. Returns `None` if the executor panicked.
    fn wait(&self) -> Option<Result<V, E>>
    where
        V: Clone,
        E: Clone,
    {
        let mut state = self.state.lock();
        while matches!(*state, State::Pending) {
            self.done.wait(&mut state);
        }

        match &*state {
            State::Done(result) => Some(result.clone()),
            _ => None,
        }
    }
}

/// A namespace in which units of work are executed with duplicate suppression.
///
/// The registry of in-flight calls is guarded by a single lock that is never held while an
/// operation runs, so a slow operation for one key does not hold back other keys.
pub struct Group<V, E> {
    calls: Mutex<HashMap<String, Arc<Call<V, E>>, RandomState>>,
}

impl<V, E> Group<V, E> {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(HashMap::default()),
        }
    }

    /// Number of keys with an operation currently running.
    pub fn in_flight(&self) -> usize {
        self.calls.lock().len()
    }
}

impl<V, E> Group<V, E>
where
    V: Clone,
    E: Clone,
{
    /// Runs `operation` unless a call for `key` is already in flight, in which case it waits for
    /// that call and returns a clone of its result.
    ///
    /// There is no timeout. If the running operation never returns, every caller waiting on the
    /// same key blocks as well.
    ///
    /// # Panics
    ///
    /// Panics if the operation of the call this caller waited on panicked.
    pub fn call<F>(&self, key: &str, operation: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        let call = {
            let mut calls = self.calls.lock();

            if let Some(call) = calls.get(key) {
                let call = Arc::clone(call);
                call.dups.fetch_add(1, Ordering::AcqRel);
                drop(calls);

                tracing::trace!(key, "joining in-flight call");

                return match call.wait() {
                    Some(result) => result,
                    None => panic!("in-flight call for key {key:?} panicked"),
                };
            }

            let call = Arc::new(Call::new());
            calls.insert(key.to_owned(), Arc::clone(&call));
            call
        };

        let mut flight = Flight {
            group: self,
            key,
            call,
            finished: false,
        };

        let result = operation();
        flight.finish(result.clone());
        drop(flight);

        result
    }
}

impl<V, E> Default for Group<V, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, E> fmt::Debug for Group<V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group")
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

/// Held by the executor while its operation runs. Dropping it releases the waiters and removes
/// the call from the registry, also when the operation unwinds.
struct Flight<'a, V, E> {
    group: &'a Group<V, E>,
    key: &'a str,
    call: Arc<Call<V, E>>,
    finished: bool,
}

impl<V, E> Flight<'_, V, E> {
    fn finish(&mut self, result: Result<V, E>) {
        self.call.publish(State::Done(result));
        self.finished = true;
    }
}

impl<V, E> Drop for Flight<'_, V, E> {
    fn drop(&mut self) {
        if !self.finished {
            self.call.publish(State::Abandoned);
        }

        let mut calls = self.group.calls.lock();
        if calls
            .get(self.key)
            .is_some_and(|call| Arc::ptr_eq(call, &self.call))
        {
            calls.remove(self.key);
        }
        drop(calls);

        tracing::debug!(
            key = self.key,
            duplicates = self.call.dups.load(Ordering::Acquire),
            panicked = !self.finished,
            "coalesced call finished"
        );
    }
}
