//! Per-frame gesture dispatch with a global cooldown.
//!
//! `DispatchLoop` consumes one landmark snapshot (or its absence) per
//! tick, classifies it, and invokes the bound action at most once per
//! cooldown window.  The cooldown is shared by all gestures: a different
//! gesture recognized mid-window is suppressed just like a repeat.

pub mod action;

use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::hand::{GestureClassifier, GestureId, LandmarkPoint, LandmarkSnapshot};

pub use action::{Action, ActionRegistry, Detached};

/// Default cooldown between two dispatches.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(1);

// ── Cooldown state ─────────────────────────────────────────

/// Time of the last dispatch and the window it opens.
#[derive(Debug, Clone)]
pub struct CooldownState {
    /// Monotonic time of the last dispatch; `None` before the first one.
    pub last_dispatch: Option<Instant>,
    /// Minimum time between dispatches.
    pub duration: Duration,
}

impl Default for CooldownState {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}

impl CooldownState {
    pub fn new(duration: Duration) -> Self {
        Self {
            last_dispatch: None,
            duration,
        }
    }

    /// Whether a dispatch at `now` would be suppressed.
    ///
    /// The window is closed at its end: a dispatch exactly `duration`
    /// after the last one is still blocked.
    pub fn is_active(&self, now: Instant) -> bool {
        match self.last_dispatch {
            Some(last) => now.saturating_duration_since(last) <= self.duration,
            None => false,
        }
    }

    /// Time left before the next dispatch is allowed.
    pub fn remaining(&self, now: Instant) -> Duration {
        match self.last_dispatch {
            Some(last) => self
                .duration
                .saturating_sub(now.saturating_duration_since(last)),
            None => Duration::ZERO,
        }
    }

    /// Open a new window starting at `now`.
    pub fn start(&mut self, now: Instant) {
        self.last_dispatch = Some(now);
    }

    pub fn reset(&mut self) {
        self.last_dispatch = None;
    }
}

// ── Outcomes ───────────────────────────────────────────────

/// Dispatch phase, derived from the cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Ready to dispatch.
    Idle,
    /// Inside the cooldown window of the last dispatch.
    Dispatched,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Dispatched => "dispatched",
        }
    }
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The loop is stopped; the frame was ignored.
    Stopped,
    /// No hand in this frame.
    Absent,
    /// The landmarks did not form a valid snapshot.
    InvalidSnapshot,
    /// A hand was present but matched no gesture.
    NoGesture,
    /// A gesture was recognized inside the cooldown window.
    Suppressed(GestureId),
    /// A gesture was recognized but nothing is bound to it.
    Unregistered(GestureId),
    /// The bound action ran successfully.
    Dispatched(GestureId),
    /// The bound action returned an error or panicked.
    ActionFailed(GestureId),
}

impl DispatchOutcome {
    /// Whether an action was invoked on this tick.
    pub fn invoked(&self) -> bool {
        matches!(self, Self::Dispatched(_) | Self::ActionFailed(_))
    }

    pub fn gesture(&self) -> Option<GestureId> {
        match self {
            Self::Suppressed(g)
            | Self::Unregistered(g)
            | Self::Dispatched(g)
            | Self::ActionFailed(g) => Some(*g),
            _ => None,
        }
    }
}

// ── Statistics ─────────────────────────────────────────────

/// Running counters for status reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub ticks: u64,
    pub absent: u64,
    pub invalid: u64,
    pub suppressed: u64,
    pub unregistered: u64,
    pub dispatched: u64,
    pub failed: u64,
}

impl DispatchStats {
    fn record(&mut self, outcome: &DispatchOutcome) {
        self.ticks += 1;
        match outcome {
            DispatchOutcome::Stopped | DispatchOutcome::NoGesture => {}
            DispatchOutcome::Absent => self.absent += 1,
            DispatchOutcome::InvalidSnapshot => self.invalid += 1,
            DispatchOutcome::Suppressed(_) => self.suppressed += 1,
            DispatchOutcome::Unregistered(_) => self.unregistered += 1,
            DispatchOutcome::Dispatched(_) => self.dispatched += 1,
            DispatchOutcome::ActionFailed(_) => self.failed += 1,
        }
    }

    pub fn to_sexp(&self) -> String {
        format!(
            "(:ticks {} :absent {} :invalid {} :suppressed {} :unregistered {} :dispatched {} :failed {})",
            self.ticks,
            self.absent,
            self.invalid,
            self.suppressed,
            self.unregistered,
            self.dispatched,
            self.failed,
        )
    }
}

// ── Loop ───────────────────────────────────────────────────

/// Classify-and-dispatch controller driven by one consumer.
pub struct DispatchLoop {
    classifier: GestureClassifier,
    registry: ActionRegistry,
    cooldown: CooldownState,
    running: bool,
    last_gesture: Option<GestureId>,
    stats: DispatchStats,
}

impl DispatchLoop {
    /// Create a running loop.
    pub fn new(classifier: GestureClassifier, registry: ActionRegistry, cooldown: Duration) -> Self {
        info!(
            "Dispatch loop ready: {} action(s), cooldown {:?}",
            registry.len(),
            cooldown
        );
        Self {
            classifier,
            registry,
            cooldown: CooldownState::new(cooldown),
            running: true,
            last_gesture: None,
            stats: DispatchStats::default(),
        }
    }

    pub fn start(&mut self) {
        if !self.running {
            info!("Dispatch loop started");
        }
        self.running = true;
    }

    pub fn stop(&mut self) {
        if self.running {
            info!("Dispatch loop stopped");
        }
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Process one frame.
    pub fn tick(&mut self, snapshot: Option<&LandmarkSnapshot>, now: Instant) -> DispatchOutcome {
        let outcome = self.process(snapshot, now);
        self.stats.record(&outcome);
        outcome
    }

    /// Process one frame of raw capture-order points.
    ///
    /// Points that do not form a snapshot count as "no gesture" for this
    /// frame; the cooldown is left alone.
    pub fn tick_points(&mut self, points: Option<&[LandmarkPoint]>, now: Instant) -> DispatchOutcome {
        let snapshot = match points.map(LandmarkSnapshot::from_points) {
            Some(Ok(snapshot)) => Some(snapshot),
            Some(Err(e)) if self.running => {
                debug!("Dropping frame: {}", e);
                let outcome = DispatchOutcome::InvalidSnapshot;
                self.stats.record(&outcome);
                return outcome;
            }
            Some(Err(_)) | None => None,
        };
        self.tick(snapshot.as_ref(), now)
    }

    fn process(&mut self, snapshot: Option<&LandmarkSnapshot>, now: Instant) -> DispatchOutcome {
        if !self.running {
            return DispatchOutcome::Stopped;
        }

        let Some(snapshot) = snapshot else {
            return DispatchOutcome::Absent;
        };

        let Some(gesture) = self.classifier.classify(snapshot) else {
            return DispatchOutcome::NoGesture;
        };

        if self.cooldown.is_active(now) {
            debug!(
                "Gesture {} suppressed, cooldown {:?} remaining",
                gesture,
                self.cooldown.remaining(now)
            );
            return DispatchOutcome::Suppressed(gesture);
        }

        let Some(action) = self.registry.get_mut(gesture) else {
            warn!("No action registered for gesture {}", gesture);
            return DispatchOutcome::Unregistered(gesture);
        };

        info!("Dispatching {} ({})", gesture, gesture.display_name());
        let result = panic::catch_unwind(AssertUnwindSafe(|| action.invoke(gesture)));

        // Set even on failure so a broken action cannot fire every frame.
        self.cooldown.start(now);
        self.last_gesture = Some(gesture);

        match result {
            Ok(Ok(())) => DispatchOutcome::Dispatched(gesture),
            Ok(Err(e)) => {
                error!("Action for {} failed: {:#}", gesture, e);
                DispatchOutcome::ActionFailed(gesture)
            }
            Err(_) => {
                error!("Action for {} panicked", gesture);
                DispatchOutcome::ActionFailed(gesture)
            }
        }
    }

    /// Current dispatch phase.
    pub fn phase(&self, now: Instant) -> Phase {
        if self.cooldown.is_active(now) {
            Phase::Dispatched
        } else {
            Phase::Idle
        }
    }

    pub fn cooldown(&self) -> &CooldownState {
        &self.cooldown
    }

    pub fn stats(&self) -> &DispatchStats {
        &self.stats
    }

    /// Clear the cooldown and counters.
    pub fn reset(&mut self) {
        self.cooldown.reset();
        self.last_gesture = None;
        self.stats = DispatchStats::default();
    }

    /// Generate s-expression for status reporting.
    pub fn status_sexp(&self, now: Instant) -> String {
        format!(
            "(:running {} :phase :{} :last-gesture {} :cooldown-remaining-ms {} :stats {})",
            if self.running { "t" } else { "nil" },
            self.phase(now).as_str(),
            self.last_gesture
                .map(|g| format!(":{}", g.as_str()))
                .unwrap_or_else(|| "nil".to_string()),
            self.cooldown.remaining(now).as_millis(),
            self.stats.to_sexp(),
        )
    }
}

// ── Tests ──────────────────────────────────────────────────
