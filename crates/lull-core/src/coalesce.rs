use std::rc::Rc;

use web_time::Duration;

use crate::debounce::Debounced;
use crate::error::{CoalesceError, Result, millis};
use crate::signal::ReadSignal;
use crate::source::Source;
use crate::throttle::{ThrottleOptions, Throttled};
use crate::timer::{TimerHost, current_host};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum Policy {
    Debounce,
    Throttle,
}

/// Which coalescing policy to apply, and over what window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CoalesceSpec {
    pub policy: Policy,
    #[cfg_attr(feature = "serde", serde(rename = "window_ms", with = "window_millis"))]
    pub window: Duration,
    /// Throttle only: publish the latest dropped value when the window reopens.
    #[cfg_attr(feature = "serde", serde(default))]
    pub trailing: bool,
}

impl Default for CoalesceSpec {
    fn default() -> Self {
        Self {
            policy: Policy::Debounce,
            window: Duration::from_millis(300),
            trailing: false,
        }
    }
}

impl CoalesceSpec {
    pub fn debounce(delay_ms: i64) -> Result<Self> {
        Ok(Self {
            policy: Policy::Debounce,
            window: millis("delay_ms", delay_ms)?,
            trailing: false,
        })
    }

    pub fn throttle(window_ms: i64) -> Result<Self> {
        Ok(Self {
            policy: Policy::Throttle,
            window: millis("window_ms", window_ms)?,
            trailing: false,
        })
    }

    pub fn fast() -> Self {
        Self {
            window: Duration::from_millis(150),
            ..Self::default()
        }
    }

    pub fn slow() -> Self {
        Self {
            window: Duration::from_millis(600),
            ..Self::default()
        }
    }

    pub fn with_trailing(mut self, trailing: bool) -> Self {
        self.trailing = trailing;
        self
    }

    pub fn apply<T: Clone + 'static>(
        &self,
        source: impl Source<T>,
        host: Rc<dyn TimerHost>,
    ) -> Coalesced<T> {
        match self.policy {
            Policy::Debounce => {
                if self.trailing {
                    log::debug!("coalesce: `trailing` has no effect on a debounce");
                }
                Coalesced::Debounced(Debounced::with_delay(source, self.window, host))
            }
            Policy::Throttle => Coalesced::Throttled(Throttled::with_options(
                source,
                ThrottleOptions::new(self.window).with_trailing(self.trailing),
                host,
            )),
        }
    }
}

/// Either coalescer, chosen at runtime from a [`CoalesceSpec`].
pub enum Coalesced<T: 'static> {
    Debounced(Debounced<T>),
    Throttled(Throttled<T>),
}

impl<T: Clone + 'static> Coalesced<T> {
    pub fn policy(&self) -> Policy {
        match self {
            Coalesced::Debounced(_) => Policy::Debounce,
            Coalesced::Throttled(_) => Policy::Throttle,
        }
    }

    pub fn output(&self) -> ReadSignal<T> {
        match self {
            Coalesced::Debounced(d) => d.output(),
            Coalesced::Throttled(t) => t.output(),
        }
    }

    pub fn get(&self) -> T {
        match self {
            Coalesced::Debounced(d) => d.get(),
            Coalesced::Throttled(t) => t.get(),
        }
    }

    pub fn teardown(&self) -> bool {
        match self {
            Coalesced::Debounced(d) => d.teardown(),
            Coalesced::Throttled(t) => t.teardown(),
        }
    }

    pub fn is_live(&self) -> bool {
        match self {
            Coalesced::Debounced(d) => d.is_live(),
            Coalesced::Throttled(t) => t.is_live(),
        }
    }
}

fn ambient_host() -> Result<Rc<dyn TimerHost>> {
    current_host().ok_or(CoalesceError::NoTimerHost)
}

/// [`Debounced::new`] against the thread's ambient host (see [`set_host`](crate::set_host)).
pub fn use_debounced<T: Clone + 'static>(
    source: impl Source<T>,
    delay_ms: i64,
) -> Result<Debounced<T>> {
    let delay = millis("delay_ms", delay_ms)?;
    Ok(Debounced::with_delay(source, delay, ambient_host()?))
}

/// [`Throttled::new`] against the thread's ambient host.
pub fn use_throttled<T: Clone + 'static>(
    source: impl Source<T>,
    window_ms: i64,
) -> Result<Throttled<T>> {
    let options = ThrottleOptions::from_millis(window_ms)?;
    Ok(Throttled::with_options(source, options, ambient_host()?))
}

pub fn use_coalesced<T: Clone + 'static>(
    source: impl Source<T>,
    spec: &CoalesceSpec,
) -> Result<Coalesced<T>> {
    Ok(spec.apply(source, ambient_host()?))
}

#[cfg(feature = "serde")]
mod window_millis {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};
    use web_time::Duration;

    pub fn serialize<S: Serializer>(window: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(window.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let ms = i64::deserialize(d)?;
        crate::error::millis("window_ms", ms).map_err(D::Error::custom)
    }
}
