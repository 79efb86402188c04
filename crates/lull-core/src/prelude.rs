pub use crate::clock::{Clock, ManualClock, SystemClock};
pub use crate::coalesce::{
    CoalesceSpec, Coalesced, Policy, use_coalesced, use_debounced, use_throttled,
};
pub use crate::debounce::{Debounced, DebouncedFn};
pub use crate::error::{CoalesceError, Result};
pub use crate::scope::{Scope, current_scope};
pub use crate::signal::{ReadSignal, Signal, SubId, signal};
pub use crate::source::{Source, SourceExt};
pub use crate::teardown::Teardown;
pub use crate::throttle::{ThrottleOptions, Throttled, ThrottledFn};
pub use crate::timer::{TimerHandle, TimerHost, TimerId, TimerQueue, current_host, set_host};
pub use web_time::{Duration, Instant};
