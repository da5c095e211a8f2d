//! Breaking cycles of recursive types during one compile.
//!
//! Every key being compiled is recorded with the productive depth it was
//! entered at. Entering an object, a collection, a mapping or a tuple is a
//! productive step. Revisiting an in-progress key deeper than it started
//! yields a [`LazyMethod`] bound once the key completes; revisiting it at
//! the same depth means the cycle never produces a value.

use alloc::sync::{Arc, Weak};
use alloc::vec::Vec;
use core::hash::Hash;

use once_cell::sync::OnceCell;

use crate::hash::HashMap;

// -----------------------------------------------------------------------------
// LazyMethod

/// Indirection to a procedure still being compiled.
///
/// It holds a weak reference: the procedure at the head of the cycle owns
/// its descendants, never the other way round.
pub(crate) struct LazyMethod<M: ?Sized> {
    target: OnceCell<Weak<M>>,
}

impl<M: ?Sized> LazyMethod<M> {
    #[inline]
    pub(crate) const fn new() -> Self {
        Self {
            target: OnceCell::new(),
        }
    }

    /// Binds the indirection. Later binds are ignored.
    pub(crate) fn bind(&self, method: &Arc<M>) {
        let _ = self.target.set(Arc::downgrade(method));
    }

    /// The bound procedure, if it is bound and still alive.
    #[inline]
    pub(crate) fn get(&self) -> Option<Arc<M>> {
        self.target.get().and_then(Weak::upgrade)
    }
}

// -----------------------------------------------------------------------------
// RecursionGuard

struct Frame<M: ?Sized> {
    depth: usize,
    lazy: Option<Arc<LazyMethod<M>>>,
}

/// Outcome of entering a key.
pub(crate) enum Visit<M: ?Sized> {
    /// Not seen yet: compile it, then call [`RecursionGuard::exit`].
    Fresh(Mark),
    /// Already compiled during this visit.
    Done(Arc<M>),
    /// In progress further up: use the indirection.
    Cycle(Arc<LazyMethod<M>>),
    /// In progress at the same depth.
    NonTerminating,
}

/// Position of the memo trail when a key was entered.
#[must_use]
pub(crate) struct Mark(usize);

/// The per-compile recursion bookkeeping.
pub(crate) struct RecursionGuard<K, M: ?Sized> {
    in_progress: HashMap<K, Frame<M>>,
    memo: HashMap<K, Arc<M>>,
    trail: Vec<K>,
    depth: usize,
}

impl<K: Clone + Eq + Hash, M: ?Sized> RecursionGuard<K, M> {
    pub(crate) fn new() -> Self {
        Self {
            in_progress: HashMap::default(),
            memo: HashMap::default(),
            trail: Vec::new(),
            depth: 0,
        }
    }

    pub(crate) fn enter(&mut self, key: &K) -> Visit<M> {
        if let Some(method) = self.memo.get(key) {
            return Visit::Done(method.clone());
        }
        if let Some(frame) = self.in_progress.get_mut(key) {
            if frame.depth == self.depth {
                return Visit::NonTerminating;
            }
            let lazy = frame.lazy.get_or_insert_with(|| Arc::new(LazyMethod::new()));
            return Visit::Cycle(lazy.clone());
        }
        self.in_progress.insert(
            key.clone(),
            Frame {
                depth: self.depth,
                lazy: None,
            },
        );
        Visit::Fresh(Mark(self.trail.len()))
    }

    /// Completes `key`.
    ///
    /// On success the indirections handed out for it are bound and the
    /// result is memoized. On failure every procedure memoized since `key`
    /// was entered is forgotten, as it may hold an indirection that will
    /// never be bound.
    pub(crate) fn exit<E>(&mut self, key: K, mark: Mark, result: &Result<Arc<M>, E>) {
        let frame = self.in_progress.remove(&key);
        match result {
            Ok(method) => {
                if let Some(lazy) = frame.and_then(|frame| frame.lazy) {
                    lazy.bind(method);
                }
                self.memo.insert(key.clone(), method.clone());
                self.trail.push(key);
            }
            Err(_) => {
                for stale in self.trail.drain(mark.0..) {
                    self.memo.remove(&stale);
                }
            }
        }
    }

    /// Enters a productive step; paired with [`ascend`](Self::ascend).
    #[inline]
    pub(crate) fn descend(&mut self) {
        self.depth += 1;
    }

    #[inline]
    pub(crate) fn ascend(&mut self) {
        self.depth -= 1;
    }
}
