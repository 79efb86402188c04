//! Trailing-edge debounce: publish only after a quiet period.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use web_time::Duration;

use crate::error::{Result, millis};
use crate::signal::{ReadSignal, Signal};
use crate::source::Source;
use crate::teardown::{Teardown, attach_to_scope};
use crate::timer::{TimerHandle, TimerHost};

/// A debounced callback. Each `call` cancels the pending invocation and
/// schedules a new one with the latest argument.
///
/// The pending timer holds only a weak reference: once every handle is
/// dropped, nothing fires.
pub struct DebouncedFn<A: 'static> {
    inner: Rc<FnInner<A>>,
}

impl<A> Clone for DebouncedFn<A> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

struct FnInner<A> {
    host: Rc<dyn TimerHost>,
    delay: Duration,
    callback: Box<dyn Fn(A)>,
    pending: RefCell<Option<TimerHandle>>,
    latest: RefCell<Option<A>>,
    live: Cell<bool>,
}

impl<A: 'static> FnInner<A> {
    fn cancel_timer(&self) -> bool {
        let pending = self.pending.borrow_mut().take();
        match pending {
            Some(handle) => {
                handle.cancel();
                true
            }
            None => false,
        }
    }

    fn fire(&self) {
        // The timer already left the queue; only the handle is stale.
        self.pending.borrow_mut().take();
        let arg = self.latest.borrow_mut().take();
        if let Some(arg) = arg {
            if self.live.get() {
                log::trace!("debounce: quiet for {:?}, firing", self.delay);
                (self.callback)(arg);
            }
        }
    }
}

impl<A: 'static> DebouncedFn<A> {
    /// Fails with `InvalidArgument` when `delay_ms` is negative.
    pub fn new(host: Rc<dyn TimerHost>, delay_ms: i64, f: impl Fn(A) + 'static) -> Result<Self> {
        let delay = millis("delay_ms", delay_ms)?;
        Ok(Self::with_delay(host, delay, f))
    }

    pub fn with_delay(host: Rc<dyn TimerHost>, delay: Duration, f: impl Fn(A) + 'static) -> Self {
        let this = Self::build(host, delay, f);
        let weak = Rc::downgrade(&this.inner);
        attach_to_scope(&Teardown::new(move || {
            if let Some(inner) = weak.upgrade() {
                DebouncedFn { inner }.shutdown();
            }
        }));
        this
    }

    fn build(host: Rc<dyn TimerHost>, delay: Duration, f: impl Fn(A) + 'static) -> Self {
        Self {
            inner: Rc::new(FnInner {
                host,
                delay,
                callback: Box::new(f),
                pending: RefCell::new(None),
                latest: RefCell::new(None),
                live: Cell::new(true),
            }),
        }
    }

    pub fn call(&self, arg: A) {
        let inner = &self.inner;
        if !inner.live.get() {
            log::trace!("debounce: call after shutdown ignored");
            return;
        }
        let replaced = inner.cancel_timer();
        let _previous = inner.latest.replace(Some(arg));

        let weak = Rc::downgrade(inner);
        let handle = TimerHandle::schedule(&inner.host, inner.delay, move || {
            if let Some(inner) = weak.upgrade() {
                inner.fire();
            }
        });
        *inner.pending.borrow_mut() = Some(handle);

        if replaced {
            log::trace!("debounce: pending call replaced, window restarted");
        }
    }

    /// Drops the pending invocation. Returns whether one was pending.
    pub fn cancel(&self) -> bool {
        let had = self.inner.cancel_timer();
        let _dropped = self.inner.latest.borrow_mut().take();
        had
    }

    /// Runs the pending invocation now instead of waiting out the delay.
    /// Returns whether one was pending.
    pub fn flush(&self) -> bool {
        if !self.inner.cancel_timer() {
            return false;
        }
        let arg = self.inner.latest.borrow_mut().take();
        match arg {
            Some(arg) if self.inner.live.get() => {
                (self.inner.callback)(arg);
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.inner.pending.borrow().is_some()
    }

    pub fn delay(&self) -> Duration {
        self.inner.delay
    }

    pub fn is_live(&self) -> bool {
        self.inner.live.get()
    }

    /// Cancels anything pending and ignores every later call. Idempotent.
    pub fn shutdown(&self) {
        if self.inner.live.replace(false) {
            self.cancel();
        }
    }
}

/// A value that follows `source`, but only after `source` has stopped
/// changing for the configured delay.
///
/// The output starts at the source's current value. Each change restarts the
/// delay; when it elapses the output takes the source's value at that moment,
/// so intermediate values are never published.
///
/// It stops at whichever comes first: [`Debounced::teardown`], disposal of the
/// [`Scope`](crate::Scope) it was built in, or dropping this handle.
pub struct Debounced<T: 'static> {
    output: Signal<T>,
    trigger: DebouncedFn<()>,
    teardown: Teardown,
}

impl<T: Clone + 'static> Debounced<T> {
    /// Fails with `InvalidArgument` when `delay_ms` is negative, before
    /// subscribing to `source`.
    pub fn new(source: impl Source<T>, delay_ms: i64, host: Rc<dyn TimerHost>) -> Result<Self> {
        let delay = millis("delay_ms", delay_ms)?;
        Ok(Self::with_delay(source, delay, host))
    }

    pub fn with_delay(source: impl Source<T>, delay: Duration, host: Rc<dyn TimerHost>) -> Self {
        let source: Rc<dyn Source<T>> = Rc::new(source);
        let output = Signal::new(source.read());

        let trigger = DebouncedFn::build(host, delay, {
            let source = source.clone();
            let output = output.clone();
            move |()| output.set(source.read())
        });

        // Weak: the trigger's callback owns the source, which owns this closure.
        let sub = source.watch(Box::new({
            let trigger = Rc::downgrade(&trigger.inner);
            move || {
                if let Some(inner) = trigger.upgrade() {
                    DebouncedFn { inner }.call(());
                }
            }
        }));

        let teardown = Teardown::new({
            let trigger = trigger.clone();
            let source = source.clone();
            move || {
                trigger.shutdown();
                source.unwatch(sub);
                log::debug!("debounce: torn down");
            }
        });
        attach_to_scope(&teardown);

        log::debug!("debounce: created with delay {delay:?}");
        Self {
            output,
            trigger,
            teardown,
        }
    }

    pub fn output(&self) -> ReadSignal<T> {
        self.output.read_only()
    }

    pub fn get(&self) -> T {
        self.output.get()
    }

    pub fn delay(&self) -> Duration {
        self.trigger.delay()
    }

    pub fn is_pending(&self) -> bool {
        self.trigger.is_pending()
    }

    /// Publish the source's current value now if a publish is pending.
    pub fn flush(&self) -> bool {
        self.trigger.flush()
    }

    /// Forget the pending publish; the output keeps its current value.
    pub fn cancel(&self) -> bool {
        self.trigger.cancel()
    }

    /// Unsubscribe and cancel the pending publish. Safe to call repeatedly;
    /// returns `true` only on the call that actually tore down.
    pub fn teardown(&self) -> bool {
        self.teardown.run()
    }

    pub fn teardown_handle(&self) -> Teardown {
        self.teardown.clone()
    }

    pub fn is_live(&self) -> bool {
        !self.teardown.is_done()
    }
}

impl<T: 'static> Drop for Debounced<T> {
    fn drop(&mut self) {
        self.teardown.run();
    }
}
