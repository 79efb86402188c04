use std::cell::RefCell;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;
use std::rc::Rc;

use slotmap::{SlotMap, new_key_type};
use web_time::{Duration, Instant};

use crate::clock::{Clock, ManualClock, SystemClock};

new_key_type! {
    pub struct TimerId;
}

/// Upper bound on callbacks fired by a single `run_due`/`advance` pass.
pub const MAX_TIMERS_PER_TICK: usize = 10_000;

thread_local! {
    static CURRENT_HOST: RefCell<Option<Rc<dyn TimerHost>>> = const { RefCell::new(None) };
}

/// The host scheduler: a monotonic clock plus cancellable one-shot callbacks.
///
/// Callbacks never run synchronously inside `schedule_after`, even with a zero
/// delay; they run on a later tick of whatever drives the host.
pub trait TimerHost {
    fn now(&self) -> Instant;
    fn schedule_after(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimerId;
    /// Returns `false` if the timer already fired or was cancelled.
    fn cancel(&self, id: TimerId) -> bool;
}

/// An outstanding timer, owned by whoever scheduled it.
///
/// Dropping the handle does not cancel the timer.
pub struct TimerHandle {
    id: TimerId,
    host: Rc<dyn TimerHost>,
}

impl TimerHandle {
    pub fn schedule(
        host: &Rc<dyn TimerHost>,
        delay: Duration,
        callback: impl FnOnce() + 'static,
    ) -> Self {
        let id = host.schedule_after(delay, Box::new(callback));
        Self {
            id,
            host: host.clone(),
        }
    }

    pub fn id(&self) -> TimerId {
        self.id
    }

    pub fn cancel(self) -> bool {
        self.host.cancel(self.id)
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TimerHandle").field(&self.id).finish()
    }
}

struct Timer {
    callback: Box<dyn FnOnce()>,
}

// Heap order is (deadline, seq): equal deadlines fire in scheduling order.
#[derive(PartialEq, Eq, PartialOrd, Ord)]
struct Slot {
    deadline: Instant,
    seq: u64,
    id: TimerId,
}

#[derive(Default)]
struct Queue {
    timers: SlotMap<TimerId, Timer>,
    heap: BinaryHeap<Reverse<Slot>>,
    next_seq: u64,
}

impl Queue {
    /// Removes the earliest live timer due at or before `limit` (no limit
    /// when `None`). Cancelled entries are pruned from the heap on the way.
    fn pop_due(&mut self, limit: Option<Instant>) -> Option<(Instant, Timer)> {
        while let Some(Reverse(slot)) = self.heap.peek() {
            let (id, deadline) = (slot.id, slot.deadline);
            if !self.timers.contains_key(id) {
                self.heap.pop();
                continue;
            }
            if limit.is_some_and(|limit| deadline > limit) {
                return None;
            }
            self.heap.pop();
            return self.timers.remove(id).map(|timer| (deadline, timer));
        }
        None
    }

    fn has_due(&mut self, limit: Option<Instant>) -> bool {
        self.next_deadline()
            .is_some_and(|deadline| limit.is_none_or(|limit| deadline <= limit))
    }

    fn next_deadline(&mut self) -> Option<Instant> {
        while let Some(Reverse(slot)) = self.heap.peek() {
            let (id, deadline) = (slot.id, slot.deadline);
            if self.timers.contains_key(id) {
                return Some(deadline);
            }
            self.heap.pop();
        }
        None
    }
}

/// Single-threaded timer queue. Nothing fires until the owner ticks it with
/// `run_due` (or `advance` for a manual clock).
pub struct TimerQueue<C: Clock = SystemClock> {
    clock: C,
    queue: RefCell<Queue>,
}

impl<C: Clock> TimerQueue<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            queue: RefCell::new(Queue::default()),
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Number of timers that have neither fired nor been cancelled.
    pub fn pending(&self) -> usize {
        self.queue.borrow().timers.len()
    }

    pub fn is_idle(&self) -> bool {
        self.pending() == 0
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.queue.borrow_mut().next_deadline()
    }

    /// Fires every timer due at the current time, in deadline order.
    /// Timers scheduled by those callbacks fire too if they are already due.
    pub fn run_due(&self) -> usize {
        let mut fired = 0;
        while fired < MAX_TIMERS_PER_TICK {
            let now = self.clock.now();
            // The borrow ends here; callbacks may schedule or cancel.
            let next = self.queue.borrow_mut().pop_due(Some(now));
            let Some((_, timer)) = next else {
                return fired;
            };
            (timer.callback)();
            fired += 1;
        }
        if self.queue.borrow_mut().has_due(Some(self.clock.now())) {
            log::warn!(
                "timer queue: {MAX_TIMERS_PER_TICK} callbacks fired in one tick; deferring the rest"
            );
        }
        fired
    }
}

impl TimerQueue<SystemClock> {
    pub fn system() -> Self {
        Self::new(SystemClock)
    }
}

impl Default for TimerQueue<SystemClock> {
    fn default() -> Self {
        Self::system()
    }
}

impl TimerQueue<ManualClock> {
    pub fn manual() -> Self {
        Self::new(ManualClock::new())
    }

    /// Moves time forward by `by`, firing due timers in order. The clock reads
    /// each timer's deadline while its callback runs.
    ///
    /// If `now + by` is past the last representable instant, every scheduled
    /// timer fires and the clock stops at the last deadline.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.clock.now().checked_add(by);
        let mut fired = 0;
        while fired < MAX_TIMERS_PER_TICK {
            let next = self.queue.borrow_mut().pop_due(target);
            let Some((deadline, timer)) = next else {
                break;
            };
            self.clock.set(deadline);
            (timer.callback)();
            fired += 1;
        }
        if fired == MAX_TIMERS_PER_TICK && self.queue.borrow_mut().has_due(target) {
            log::warn!(
                "timer queue: {MAX_TIMERS_PER_TICK} callbacks fired in one advance; deferring the rest"
            );
        }
        match target {
            Some(target) => self.clock.set(target),
            None => log::debug!("timer queue: advance by {by:?} overflows the clock"),
        }
        fired
    }
}

impl<C: Clock> TimerHost for TimerQueue<C> {
    fn now(&self) -> Instant {
        self.clock.now()
    }

    /// A delay that overflows the clock yields a timer that is never due. It
    /// stays pending until cancelled.
    fn schedule_after(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimerId {
        let deadline = self.clock.now().checked_add(delay);
        let mut q = self.queue.borrow_mut();
        let seq = q.next_seq;
        q.next_seq += 1;
        let id = q.timers.insert(Timer { callback });
        match deadline {
            Some(deadline) => {
                q.heap.push(Reverse(Slot { deadline, seq, id }));
                log::trace!("timer {id:?} scheduled in {delay:?}");
            }
            None => log::debug!("timer {id:?}: delay {delay:?} overflows the clock, never due"),
        }
        id
    }

    fn cancel(&self, id: TimerId) -> bool {
        // Drop the callback outside the borrow; its captures may touch the queue.
        let removed = self.queue.borrow_mut().timers.remove(id);
        if removed.is_some() {
            log::trace!("timer {id:?} cancelled");
        }
        removed.is_some()
    }
}

/// Install the thread's ambient timer host, returning the previous one.
pub fn set_host(host: Rc<dyn TimerHost>) -> Option<Rc<dyn TimerHost>> {
    CURRENT_HOST.with(|h| h.borrow_mut().replace(host))
}

pub fn clear_host() -> Option<Rc<dyn TimerHost>> {
    CURRENT_HOST.with(|h| h.borrow_mut().take())
}

pub fn current_host() -> Option<Rc<dyn TimerHost>> {
    CURRENT_HOST.with(|h| h.borrow().clone())
}
