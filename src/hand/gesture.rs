//! Static gesture classification from hand landmarks.
//!
//! Recognizes V sign, thumbs up, OK, call-me and wave from a single
//! `LandmarkSnapshot` using fixed geometric rules.  Classification is
//! pure: the same snapshot and config always give the same answer.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use super::landmarks::{Finger, HandJoint, LandmarkPoint, LandmarkSnapshot, SnapshotError};

// ── Gesture ids ────────────────────────────────────────────

/// Recognized gestures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GestureId {
    /// Index and middle extended, ring and pinky curled.
    VSign,
    /// Thumb extended upward, all other fingers curled.
    Like,
    /// Thumb and index tips touching, other three fingers extended.
    Ok,
    /// Thumb and pinky extended, the rest curled.
    Call,
    /// Whole hand open with fingers spread.
    Wave,
}

impl GestureId {
    pub const ALL: [GestureId; 5] = [
        GestureId::VSign,
        GestureId::Like,
        GestureId::Ok,
        GestureId::Call,
        GestureId::Wave,
    ];

    /// Stable identifier used in config files and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VSign => "v-sign",
            Self::Like => "like",
            Self::Ok => "ok",
            Self::Call => "call",
            Self::Wave => "wave",
        }
    }

    /// Human-readable name for presentation.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::VSign => "V sign",
            Self::Like => "Thumbs up",
            Self::Ok => "OK",
            Self::Call => "Call me",
            Self::Wave => "Wave",
        }
    }
}

impl fmt::Display for GestureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("unknown gesture {0:?}")]
pub struct UnknownGesture(pub String);

impl FromStr for GestureId {
    type Err = UnknownGesture;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GestureId::ALL
            .iter()
            .copied()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| UnknownGesture(s.to_string()))
    }
}

// ── Config ─────────────────────────────────────────────────

/// Thresholds for the distance-based rules, in normalized image units.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
    /// Thumb-tip to index-tip distance below which the hand counts as pinched (OK).
    pub ok_pinch_threshold: f32,
    /// Minimum `index_tip.x - pinky_tip.x` for an open hand to count as a wave.
    pub wave_spread_threshold: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            ok_pinch_threshold: 0.05,
            wave_spread_threshold: 0.2,
        }
    }
}

// ── Finger state ───────────────────────────────────────────

/// Extended/curled state of every finger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FingerStates {
    pub thumb: bool,
    pub index: bool,
    pub middle: bool,
    pub ring: bool,
    pub pinky: bool,
}

impl FingerStates {
    pub fn from_snapshot(snapshot: &LandmarkSnapshot) -> Self {
        Self {
            thumb: is_extended(snapshot, Finger::Thumb),
            index: is_extended(snapshot, Finger::Index),
            middle: is_extended(snapshot, Finger::Middle),
            ring: is_extended(snapshot, Finger::Ring),
            pinky: is_extended(snapshot, Finger::Pinky),
        }
    }

    /// Compact form for logs, e.g. `T I M - -`.
    pub fn summary(&self) -> String {
        [
            (self.thumb, 'T'),
            (self.index, 'I'),
            (self.middle, 'M'),
            (self.ring, 'R'),
            (self.pinky, 'P'),
        ]
        .iter()
        .map(|(up, c)| if *up { c.to_string() } else { "-".to_string() })
        .collect::<Vec<_>>()
        .join(" ")
    }
}

/// Whether a finger points upward in the (mirrored, upright) image.
///
/// Image y grows downward, so the tip being above its reference joint
/// means a smaller y.
pub fn is_extended(snapshot: &LandmarkSnapshot, finger: Finger) -> bool {
    snapshot.point(finger.tip()).y < snapshot.point(finger.reference()).y
}

/// 3D distance between the thumb tip and the index tip.
pub fn thumb_index_distance(snapshot: &LandmarkSnapshot) -> f32 {
    snapshot.joint_distance(HandJoint::ThumbTip, HandJoint::IndexTip)
}

// ── Classifier ─────────────────────────────────────────────

/// Rule-based gesture classifier.
#[derive(Debug, Clone, Default)]
pub struct GestureClassifier {
    pub config: ClassifierConfig,
}

impl GestureClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// Classify a snapshot.
    ///
    /// Rules are checked in a fixed priority order and the first match
    /// wins; several rules can hold for the same hand.
    pub fn classify(&self, snapshot: &LandmarkSnapshot) -> Option<GestureId> {
        let f = FingerStates::from_snapshot(snapshot);

        if f.index && f.middle && !f.ring && !f.pinky {
            return Some(GestureId::VSign);
        }

        if f.thumb && !f.index && !f.middle && !f.ring && !f.pinky {
            return Some(GestureId::Like);
        }

        if thumb_index_distance(snapshot) < self.config.ok_pinch_threshold
            && f.middle
            && f.ring
            && f.pinky
        {
            return Some(GestureId::Ok);
        }

        if f.thumb && !f.index && !f.middle && !f.ring && f.pinky {
            return Some(GestureId::Call);
        }

        let spread = snapshot.point(HandJoint::IndexTip).x - snapshot.point(HandJoint::PinkyTip).x;
        if f.thumb && f.index && f.middle && f.ring && f.pinky
            && spread > self.config.wave_spread_threshold
        {
            return Some(GestureId::Wave);
        }

        None
    }

    /// Classify raw capture-order points, validating them first.
    pub fn classify_points(
        &self,
        points: &[LandmarkPoint],
    ) -> Result<Option<GestureId>, SnapshotError> {
        let snapshot = LandmarkSnapshot::from_points(points)?;
        Ok(self.classify(&snapshot))
    }
}

// ── Test helpers ───────────────────────────────────────────

/// Build a hand with the given fingers extended and the rest curled.
///
/// Reference joints sit at y=0.5; extended tips at y=0.4, curled tips at
/// y=0.6.  Tip x positions run thumb 0.75, index 0.625, middle 0.5625,
/// ring 0.5, pinky 0.4375, so the default spread is 0.1875.
#[cfg(test)]
pub(crate) fn make_hand(extended: &[Finger]) -> Vec<LandmarkPoint> {
    use super::landmarks::JOINT_COUNT;

    let mut points = vec![LandmarkPoint::new(0.5, 0.8, 0.0); JOINT_COUNT];
    for (finger, x) in [
        (Finger::Thumb, 0.75),
        (Finger::Index, 0.625),
        (Finger::Middle, 0.5625),
        (Finger::Ring, 0.5),
        (Finger::Pinky, 0.4375),
    ] {
        let tip_y = if extended.contains(&finger) { 0.4 } else { 0.6 };
        points[finger.reference().index()] = LandmarkPoint::new(x, 0.5, 0.0);
        points[finger.tip().index()] = LandmarkPoint::new(x, tip_y, 0.0);
    }
    points
}

#[cfg(test)]
pub(crate) fn set_joint(points: &mut [LandmarkPoint], joint: HandJoint, x: f32, y: f32, z: f32) {
    points[joint.index()] = LandmarkPoint::new(x, y, z);
}

#[cfg(test)]
fn snapshot(points: &[LandmarkPoint]) -> LandmarkSnapshot {
    LandmarkSnapshot::from_points(points).unwrap()
}

// ── Tests ──────────────────────────────────────────────────
