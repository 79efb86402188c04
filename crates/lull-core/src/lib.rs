//! # Signals, Timers, and Coalescers
//!
//! Lull turns a value that changes often into one that changes less often.
//! There are four pieces:
//!
//! - `Signal<T>`: observable value with explicit subscribe/unsubscribe.
//! - `TimerHost`: the clock plus cancellable one-shot timers the coalescers
//!   schedule on. `TimerQueue` is the single-threaded implementation.
//! - `Debounced` / `Throttled`: the two coalescing policies.
//! - `Scope` / `Teardown`: lifecycle, so nothing fires into a detached output.
//!
//! ## Debounce
//!
//! The output follows the source only once the source has been quiet for the
//! whole delay. Intermediate values are never published:
//!
//! ```rust
//! use std::rc::Rc;
//! use lull_core::*;
//!
//! let queue = Rc::new(TimerQueue::manual());
//! let query = signal(String::from("r"));
//! let debounced = Debounced::new(query.clone(), 300, queue.clone())?;
//!
//! query.set("ru".into());
//! query.set("rust".into());
//! queue.advance(Duration::from_millis(299));
//! assert_eq!(debounced.get(), "r");
//!
//! queue.advance(Duration::from_millis(1));
//! assert_eq!(debounced.get(), "rust");
//! # Ok::<(), CoalesceError>(())
//! ```
//!
//! ## Throttle
//!
//! The first change goes straight through; changes inside the window after it
//! are dropped:
//!
//! ```rust
//! use std::rc::Rc;
//! use lull_core::*;
//!
//! let queue = Rc::new(TimerQueue::manual());
//! let scroll = signal(0u32);
//! let throttled = Throttled::new(scroll.clone(), 100, queue.clone())?;
//!
//! scroll.set(10);
//! scroll.set(20);
//! assert_eq!(throttled.get(), 10);
//!
//! queue.advance(Duration::from_millis(100));
//! scroll.set(30);
//! assert_eq!(throttled.get(), 30);
//! # Ok::<(), CoalesceError>(())
//! ```
//!
//! ## Lifecycle
//!
//! Coalescers built inside [`Scope::run`] are torn down with the scope:
//!
//! ```rust
//! use std::rc::Rc;
//! use lull_core::*;
//!
//! let queue = Rc::new(TimerQueue::manual());
//! let source = signal(1);
//! let scope = Scope::new();
//! let debounced = scope.run(|| Debounced::new(source.clone(), 50, queue.clone()))?;
//!
//! source.set(2);
//! scope.dispose();
//! queue.advance(Duration::from_millis(50));
//! assert_eq!(debounced.get(), 1);
//! assert!(!debounced.is_live());
//! # Ok::<(), CoalesceError>(())
//! ```
//!
//! Nothing here is `Send`: sources, timers and outputs all live on the thread
//! that drives the [`TimerHost`].

pub mod clock;
pub mod coalesce;
pub mod debounce;
pub mod error;
pub mod prelude;
pub mod scope;
pub mod signal;
pub mod source;
pub mod teardown;
pub mod throttle;
pub mod timer;

pub use clock::*;
pub use coalesce::*;
pub use debounce::*;
pub use error::*;
pub use prelude::*;
pub use scope::*;
pub use signal::*;
pub use source::*;
pub use teardown::Teardown;
pub use throttle::*;
pub use timer::*;

pub use web_time::{Duration, Instant};
