//! Implementations for the current limiter state machines

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;
use serde::Serialize;

// Internal
use super::LimiterClassParams;
use hil_if::NUM_JOINTS;
use util::maths::saturate;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Thermal state of a joint motor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LimiterState {
    /// Current limited to the peak limit, waiting for it to exceed the sustained limit.
    Normal,

    /// Current limited to the peak limit, timing how long it stays above the sustained limit.
    PeakTiming,

    /// Current limited to the sustained limit while the motor cools down.
    Cooldown,
}

/// Limit applied to a current on a given tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Clamp {
    /// The current was passed through unchanged.
    None,

    /// The current was saturated to the peak limit.
    Peak,

    /// The current was saturated to the sustained limit.
    Sustained,
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Current limiter of a single joint.
#[derive(Debug, Clone, Copy)]
pub struct JointLimiter {
    params: LimiterClassParams,

    state: LimiterState,

    /// Sum of the current magnitudes since entering `PeakTiming`, and their mean once the peak
    /// timeout has elapsed.
    mean_a: f64,

    /// Time spent in the current state.
    elapsed_s: f64,

    /// Number of ticks spent in the current state.
    count: u64,
}

/// The current limiters of all joints of the wand.
#[derive(Debug, Clone)]
pub struct LimiterBank {
    limiters: [JointLimiter; NUM_JOINTS],
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for LimiterState {
    fn default() -> Self {
        LimiterState::Normal
    }
}

impl Default for Clamp {
    fn default() -> Self {
        Clamp::None
    }
}

impl JointLimiter {
    /// Create a new limiter in the `Normal` state.
    pub fn new(params: LimiterClassParams) -> Self {
        Self {
            params,
            state: LimiterState::Normal,
            mean_a: 0.0,
            elapsed_s: 0.0,
            count: 0,
        }
    }

    pub fn state(&self) -> LimiterState {
        self.state
    }

    /// Limit the desired `current_a` of this tick, `dt_s` after the previous one.
    ///
    /// Returns the limited current, which keeps the sign of the desired current, and the limit
    /// which was applied.
    pub fn limit(&mut self, current_a: f64, dt_s: f64) -> (f64, Clamp) {
        let magnitude = current_a.abs();
        let sustained = self.params.sustained_limit_a;

        match self.state {
            LimiterState::Normal => {
                if magnitude > sustained {
                    self.enter_peak_timing(magnitude);
                    return self.clamp(current_a, Clamp::Peak);
                }
            }
            LimiterState::PeakTiming => {
                self.mean_a += magnitude;
                self.elapsed_s += dt_s;
                self.count += 1;

                if self.elapsed_s < self.params.peak_timeout_s {
                    return self.clamp(current_a, Clamp::Peak);
                }

                self.mean_a /= (self.count + 1) as f64;
                if self.mean_a > sustained {
                    self.state = LimiterState::Cooldown;
                    self.elapsed_s = 0.0;
                    self.count = 0;
                    return self.clamp(current_a, Clamp::Sustained);
                }

                self.state = LimiterState::Normal;
            }
            LimiterState::Cooldown => {
                self.elapsed_s += dt_s;
                self.count += 1;

                if self.elapsed_s < self.params.cooldown_timeout_s {
                    return self.clamp(current_a, Clamp::Sustained);
                }

                if magnitude > sustained {
                    self.enter_peak_timing(magnitude);
                    return self.clamp(current_a, Clamp::Peak);
                }

                self.state = LimiterState::Normal;
            }
        }

        (current_a, Clamp::None)
    }

    fn enter_peak_timing(&mut self, magnitude: f64) {
        self.state = LimiterState::PeakTiming;
        self.elapsed_s = 0.0;
        self.count = 0;
        self.mean_a = magnitude;
    }

    /// Saturate `current_a` to the given limit, reporting `Clamp::None` if it was within it.
    fn clamp(&self, current_a: f64, clamp: Clamp) -> (f64, Clamp) {
        let limit = match clamp {
            Clamp::None => return (current_a, Clamp::None),
            Clamp::Peak => self.params.peak_limit_a,
            Clamp::Sustained => self.params.sustained_limit_a,
        };

        if current_a.abs() > limit {
            (saturate(current_a, limit), clamp)
        } else {
            (current_a, Clamp::None)
        }
    }
}

impl LimiterBank {
    /// Create a new bank with every joint in the `Normal` state.
    pub fn new(classes: &[LimiterClassParams; NUM_JOINTS]) -> Self {
        let mut limiters = [JointLimiter::new(classes[0]); NUM_JOINTS];
        for (l, c) in limiters.iter_mut().zip(classes.iter()) {
            *l = JointLimiter::new(*c);
        }

        Self { limiters }
    }

    /// Limit the desired currents of all joints for this tick.
    pub fn limit(
        &mut self,
        currents_a: &[f64; NUM_JOINTS],
        dt_s: f64,
    ) -> ([f64; NUM_JOINTS], [Clamp; NUM_JOINTS]) {
        let mut limited = [0.0; NUM_JOINTS];
        let mut clamps = [Clamp::None; NUM_JOINTS];

        for (i, limiter) in self.limiters.iter_mut().enumerate() {
            let prev_state = limiter.state();

            let (current, clamp) = limiter.limit(currents_a[i], dt_s);
            limited[i] = current;
            clamps[i] = clamp;

            if limiter.state() != prev_state {
                debug!(
                    "Joint {} current limiter {:?} -> {:?} (desired {:.3} A)",
                    i,
                    prev_state,
                    limiter.state(),
                    currents_a[i]
                );
            }
        }

        (limited, clamps)
    }

    /// Current state of each joint limiter.
    pub fn states(&self) -> [LimiterState; NUM_JOINTS] {
        let mut states = [LimiterState::Normal; NUM_JOINTS];
        for (s, l) in states.iter_mut().zip(self.limiters.iter()) {
            *s = l.state();
        }
        states
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
