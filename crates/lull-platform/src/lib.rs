//! Platform runner: drives a [`TimerQueue`] against the wall clock.

use std::rc::Rc;
use std::thread;

use lull_core::{SystemClock, TimerHandle, TimerHost, TimerQueue, set_host};
use web_time::{Duration, Instant};

/// Initialise `env_logger`, defaulting to `info` unless `RUST_LOG` says otherwise.
/// Safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

/// Single-threaded event loop. Sleeps until the next timer is due, fires it,
/// and repeats.
pub struct EventLoop {
    queue: Rc<TimerQueue<SystemClock>>,
}

impl EventLoop {
    pub fn new() -> Self {
        Self {
            queue: Rc::new(TimerQueue::system()),
        }
    }

    pub fn host(&self) -> Rc<dyn TimerHost> {
        self.queue.clone()
    }

    pub fn queue(&self) -> &TimerQueue<SystemClock> {
        &self.queue
    }

    /// Make this loop the thread's ambient host for `use_debounced` and friends.
    pub fn install(&self) {
        if set_host(self.host()).is_some() {
            log::debug!("event loop: replaced a previously installed timer host");
        }
    }

    pub fn schedule(&self, delay: Duration, f: impl FnOnce() + 'static) -> TimerHandle {
        TimerHandle::schedule(&self.host(), delay, f)
    }

    /// Run until no timers remain. Returns how many fired.
    pub fn run_until_idle(&self) -> usize {
        self.run(None)
    }

    /// Run until no timers remain or `limit` of wall time has passed,
    /// whichever comes first.
    pub fn run_for(&self, limit: Duration) -> usize {
        self.run(Instant::now().checked_add(limit))
    }

    fn run(&self, stop_at: Option<Instant>) -> usize {
        let mut fired = 0;
        loop {
            fired += self.queue.run_due();
            let Some(next) = self.queue.next_deadline() else {
                break;
            };
            let now = Instant::now();
            let wake = match stop_at {
                Some(stop) if stop <= now => break,
                Some(stop) => next.min(stop),
                None => next,
            };
            if wake > now {
                thread::sleep(wake - now);
            }
        }
        log::debug!(
            "event loop: stopped after {fired} timers, {} pending",
            self.queue.pending()
        );
        fired
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}
