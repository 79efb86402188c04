//! The source side of a coalescer: anything that can be read synchronously and
//! pushes change notifications.

use std::marker::PhantomData;

use crate::signal::{ReadSignal, Signal, SubId};

pub trait Source<T>: 'static {
    /// Current value. A panic here unwinds to whoever triggered the read.
    fn read(&self) -> T;
    fn watch(&self, on_change: Box<dyn Fn()>) -> SubId;
    /// Returns `false` if `id` was already removed.
    fn unwatch(&self, id: SubId) -> bool;
}

impl<T: Clone + 'static> Source<T> for Signal<T> {
    fn read(&self) -> T {
        self.get()
    }

    fn watch(&self, on_change: Box<dyn Fn()>) -> SubId {
        self.subscribe(move |_| on_change())
    }

    fn unwatch(&self, id: SubId) -> bool {
        self.unsubscribe(id)
    }
}

impl<T: Clone + 'static> Source<T> for ReadSignal<T> {
    fn read(&self) -> T {
        self.get()
    }

    fn watch(&self, on_change: Box<dyn Fn()>) -> SubId {
        self.subscribe(move |_| on_change())
    }

    fn unwatch(&self, id: SubId) -> bool {
        self.unsubscribe(id)
    }
}

/// A source whose value is `f` applied to another source's value.
pub struct Map<S, F, U> {
    inner: S,
    f: F,
    _from: PhantomData<fn() -> U>,
}

impl<S, F, U, T> Source<T> for Map<S, F, U>
where
    S: Source<U>,
    F: Fn(U) -> T + 'static,
    U: 'static,
{
    fn read(&self) -> T {
        (self.f)(self.inner.read())
    }

    fn watch(&self, on_change: Box<dyn Fn()>) -> SubId {
        self.inner.watch(on_change)
    }

    fn unwatch(&self, id: SubId) -> bool {
        self.inner.unwatch(id)
    }
}

pub trait SourceExt<U>: Source<U> + Sized {
    fn map<T, F: Fn(U) -> T + 'static>(self, f: F) -> Map<Self, F, U> {
        Map {
            inner: self,
            f,
            _from: PhantomData,
        }
    }
}

impl<U, S: Source<U>> SourceExt<U> for S {}
