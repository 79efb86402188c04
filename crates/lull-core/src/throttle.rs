//! Leading-edge throttle: accept at most one update per window.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use web_time::{Duration, Instant};

use crate::error::{Result, millis};
use crate::signal::{ReadSignal, Signal};
use crate::source::Source;
use crate::teardown::{Teardown, attach_to_scope};
use crate::timer::{TimerHandle, TimerHost};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ThrottleOptions {
    pub window: Duration,
    /// Publish the latest dropped update once the window reopens.
    /// Off by default: dropped updates are lost.
    pub trailing: bool,
}

impl ThrottleOptions {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            trailing: false,
        }
    }

    pub fn from_millis(window_ms: i64) -> Result<Self> {
        Ok(Self::new(millis("window_ms", window_ms)?))
    }

    pub fn with_trailing(mut self, trailing: bool) -> Self {
        self.trailing = trailing;
        self
    }
}

/// A throttled callback. A call runs immediately if the window since the last
/// accepted call has elapsed; otherwise it is dropped (or, with `trailing`,
/// held as the latest value for one publish when the window reopens).
pub struct ThrottledFn<A: 'static> {
    inner: Rc<FnInner<A>>,
}

impl<A> Clone for ThrottledFn<A> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

struct FnInner<A> {
    host: Rc<dyn TimerHost>,
    options: ThrottleOptions,
    callback: Box<dyn Fn(A)>,
    last_fire: Cell<Option<Instant>>,
    trailing_timer: RefCell<Option<TimerHandle>>,
    latest: RefCell<Option<A>>,
    live: Cell<bool>,
}

impl<A: 'static> FnInner<A> {
    fn cancel_trailing(&self) -> bool {
        let pending = self.trailing_timer.borrow_mut().take();
        let _dropped = self.latest.borrow_mut().take();
        match pending {
            Some(handle) => {
                handle.cancel();
                true
            }
            None => false,
        }
    }

    /// Opens a new window at `now` and runs the callback. A callback that
    /// unwinds leaves the previous window in place.
    fn accept(&self, now: Instant, arg: A) {
        let _rollback = Rollback {
            last_fire: &self.last_fire,
            previous: self.last_fire.replace(Some(now)),
        };
        (self.callback)(arg);
    }

    fn fire_trailing(&self) {
        self.trailing_timer.borrow_mut().take();
        let arg = self.latest.borrow_mut().take();
        if let Some(arg) = arg {
            if self.live.get() {
                log::trace!("throttle: window reopened, publishing trailing value");
                self.accept(self.host.now(), arg);
            }
        }
    }
}

// `last_fire` is set before the callback so re-entrant calls see the new window.
struct Rollback<'a> {
    last_fire: &'a Cell<Option<Instant>>,
    previous: Option<Instant>,
}

impl Drop for Rollback<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.last_fire.set(self.previous);
        }
    }
}

impl<A: 'static> ThrottledFn<A> {
    /// Fails with `InvalidArgument` when `window_ms` is negative.
    pub fn new(host: Rc<dyn TimerHost>, window_ms: i64, f: impl Fn(A) + 'static) -> Result<Self> {
        Ok(Self::with_options(
            host,
            ThrottleOptions::from_millis(window_ms)?,
            f,
        ))
    }

    pub fn with_options(
        host: Rc<dyn TimerHost>,
        options: ThrottleOptions,
        f: impl Fn(A) + 'static,
    ) -> Self {
        let this = Self::build(host, options, f);
        let weak = Rc::downgrade(&this.inner);
        attach_to_scope(&Teardown::new(move || {
            if let Some(inner) = weak.upgrade() {
                ThrottledFn { inner }.shutdown();
            }
        }));
        this
    }

    fn build(host: Rc<dyn TimerHost>, options: ThrottleOptions, f: impl Fn(A) + 'static) -> Self {
        Self {
            inner: Rc::new(FnInner {
                host,
                options,
                callback: Box::new(f),
                last_fire: Cell::new(None),
                trailing_timer: RefCell::new(None),
                latest: RefCell::new(None),
                live: Cell::new(true),
            }),
        }
    }

    /// Returns `true` if `f` ran for this call.
    pub fn call(&self, arg: A) -> bool {
        let inner = &self.inner;
        if !inner.live.get() {
            log::trace!("throttle: call after shutdown ignored");
            return false;
        }

        let now = inner.host.now();
        let window = inner.options.window;
        let elapsed = inner
            .last_fire
            .get()
            .map(|last| now.saturating_duration_since(last));

        match elapsed {
            Some(elapsed) if elapsed < window => {
                if inner.options.trailing {
                    let _previous = inner.latest.replace(Some(arg));
                    if inner.trailing_timer.borrow().is_none() {
                        let weak = Rc::downgrade(inner);
                        let handle =
                            TimerHandle::schedule(&inner.host, window.saturating_sub(elapsed), {
                                move || {
                                    if let Some(inner) = weak.upgrade() {
                                        inner.fire_trailing();
                                    }
                                }
                            });
                        *inner.trailing_timer.borrow_mut() = Some(handle);
                    }
                } else {
                    log::trace!("throttle: dropped, {elapsed:?} of {window:?} elapsed");
                }
                false
            }
            _ => {
                // A newer accepted value supersedes any held trailing value.
                inner.cancel_trailing();
                inner.accept(now, arg);
                true
            }
        }
    }

    /// Drops a held trailing value. Returns whether one was scheduled.
    pub fn cancel(&self) -> bool {
        self.inner.cancel_trailing()
    }

    pub fn is_pending(&self) -> bool {
        self.inner.trailing_timer.borrow().is_some()
    }

    pub fn last_fire(&self) -> Option<Instant> {
        self.inner.last_fire.get()
    }

    pub fn options(&self) -> ThrottleOptions {
        self.inner.options
    }

    pub fn is_live(&self) -> bool {
        self.inner.live.get()
    }

    /// Cancels the trailing publish and ignores every later call. Idempotent.
    pub fn shutdown(&self) {
        if self.inner.live.replace(false) {
            self.cancel();
        }
    }
}

/// A value that follows `source` at most once per window.
///
/// The output starts at the source's current value. The first change always
/// goes through; after an accepted change, further changes are dropped until
/// the window has elapsed. No trailing publish happens unless
/// [`ThrottleOptions::trailing`] is set.
///
/// It stops at whichever comes first: [`Throttled::teardown`], disposal of the
/// [`Scope`](crate::Scope) it was built in, or dropping this handle.
pub struct Throttled<T: 'static> {
    output: Signal<T>,
    gate: ThrottledFn<()>,
    teardown: Teardown,
}

impl<T: Clone + 'static> Throttled<T> {
    /// Fails with `InvalidArgument` when `window_ms` is negative, before
    /// subscribing to `source`.
    pub fn new(source: impl Source<T>, window_ms: i64, host: Rc<dyn TimerHost>) -> Result<Self> {
        let options = ThrottleOptions::from_millis(window_ms)?;
        Ok(Self::with_options(source, options, host))
    }

    pub fn with_options(
        source: impl Source<T>,
        options: ThrottleOptions,
        host: Rc<dyn TimerHost>,
    ) -> Self {
        let source: Rc<dyn Source<T>> = Rc::new(source);
        let output = Signal::new(source.read());

        let gate = ThrottledFn::build(host, options, {
            let source = source.clone();
            let output = output.clone();
            move |()| output.set(source.read())
        });

        // Weak: the gate's callback owns the source, which owns this closure.
        let sub = source.watch(Box::new({
            let gate = Rc::downgrade(&gate.inner);
            move || {
                if let Some(inner) = gate.upgrade() {
                    ThrottledFn { inner }.call(());
                }
            }
        }));

        let teardown = Teardown::new({
            let gate = gate.clone();
            let source = source.clone();
            move || {
                gate.shutdown();
                source.unwatch(sub);
                log::debug!("throttle: torn down");
            }
        });
        attach_to_scope(&teardown);

        log::debug!(
            "throttle: created with window {:?} (trailing: {})",
            options.window,
            options.trailing
        );
        Self {
            output,
            gate,
            teardown,
        }
    }

    pub fn output(&self) -> ReadSignal<T> {
        self.output.read_only()
    }

    pub fn get(&self) -> T {
        self.output.get()
    }

    pub fn options(&self) -> ThrottleOptions {
        self.gate.options()
    }

    pub fn last_fire(&self) -> Option<Instant> {
        self.gate.last_fire()
    }

    pub fn is_pending(&self) -> bool {
        self.gate.is_pending()
    }

    /// Unsubscribe and cancel any trailing publish. Safe to call repeatedly;
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

impl<T: 'static> Drop for Throttled<T> {
    fn drop(&mut self) {
        self.teardown.run();
    }
}
