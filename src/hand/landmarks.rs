//! Hand landmark data structures.
//!
//! Models the 21 joints per hand produced by MediaPipe-style hand
//! landmark models, in normalized image coordinates.  Joints are
//! addressed by `HandJoint` key; snapshots are only built through
//! validating constructors, so a `LandmarkSnapshot` always holds
//! exactly one point per joint.

use thiserror::Error;

// ── Joint definitions ──────────────────────────────────────

/// The 21 hand joints, in landmark-model capture order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandJoint {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexMcp,
    IndexPip,
    IndexDip,
    IndexTip,
    MiddleMcp,
    MiddlePip,
    MiddleDip,
    MiddleTip,
    RingMcp,
    RingPip,
    RingDip,
    RingTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

/// Total number of joints per hand.
pub const JOINT_COUNT: usize = 21;

/// All joints in capture order, matching `HandJoint::index`.
pub const ALL_JOINTS: [HandJoint; JOINT_COUNT] = [
    HandJoint::Wrist,
    HandJoint::ThumbCmc,
    HandJoint::ThumbMcp,
    HandJoint::ThumbIp,
    HandJoint::ThumbTip,
    HandJoint::IndexMcp,
    HandJoint::IndexPip,
    HandJoint::IndexDip,
    HandJoint::IndexTip,
    HandJoint::MiddleMcp,
    HandJoint::MiddlePip,
    HandJoint::MiddleDip,
    HandJoint::MiddleTip,
    HandJoint::RingMcp,
    HandJoint::RingPip,
    HandJoint::RingDip,
    HandJoint::RingTip,
    HandJoint::PinkyMcp,
    HandJoint::PinkyPip,
    HandJoint::PinkyDip,
    HandJoint::PinkyTip,
];

impl HandJoint {
    /// Position of this joint in capture order (0-20).
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Stable joint name used in config and frame files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wrist => "wrist",
            Self::ThumbCmc => "thumb-cmc",
            Self::ThumbMcp => "thumb-mcp",
            Self::ThumbIp => "thumb-ip",
            Self::ThumbTip => "thumb-tip",
            Self::IndexMcp => "index-mcp",
            Self::IndexPip => "index-pip",
            Self::IndexDip => "index-dip",
            Self::IndexTip => "index-tip",
            Self::MiddleMcp => "middle-mcp",
            Self::MiddlePip => "middle-pip",
            Self::MiddleDip => "middle-dip",
            Self::MiddleTip => "middle-tip",
            Self::RingMcp => "ring-mcp",
            Self::RingPip => "ring-pip",
            Self::RingDip => "ring-dip",
            Self::RingTip => "ring-tip",
            Self::PinkyMcp => "pinky-mcp",
            Self::PinkyPip => "pinky-pip",
            Self::PinkyDip => "pinky-dip",
            Self::PinkyTip => "pinky-tip",
        }
    }

    /// Parse a joint name.
    pub fn from_name(s: &str) -> Option<HandJoint> {
        ALL_JOINTS.iter().copied().find(|j| j.as_str() == s)
    }
}

// ── Fingers ────────────────────────────────────────────────

/// One of the five fingers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub fn tip(&self) -> HandJoint {
        match self {
            Self::Thumb => HandJoint::ThumbTip,
            Self::Index => HandJoint::IndexTip,
            Self::Middle => HandJoint::MiddleTip,
            Self::Ring => HandJoint::RingTip,
            Self::Pinky => HandJoint::PinkyTip,
        }
    }

    /// Joint the tip is compared against to decide extension.
    ///
    /// The thumb has no PIP, so its IP joint takes that role.
    pub fn reference(&self) -> HandJoint {
        match self {
            Self::Thumb => HandJoint::ThumbIp,
            Self::Index => HandJoint::IndexPip,
            Self::Middle => HandJoint::MiddlePip,
            Self::Ring => HandJoint::RingPip,
            Self::Pinky => HandJoint::PinkyPip,
        }
    }
}

// ── Points ─────────────────────────────────────────────────

/// A landmark in normalized camera coordinates.
///
/// `x` and `y` are image-space fractions (y grows downward), `z` is a
/// relative depth with no metric meaning.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LandmarkPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl LandmarkPoint {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance in all three axes.
    pub fn distance(&self, other: &LandmarkPoint) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

impl From<[f32; 3]> for LandmarkPoint {
    fn from(p: [f32; 3]) -> Self {
        Self::new(p[0], p[1], p[2])
    }
}

// ── Errors ─────────────────────────────────────────────────

/// Reasons a set of landmarks cannot form a snapshot.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SnapshotError {
    /// Wrong number of points in a capture-order slice.
    #[error("invalid snapshot: expected {expected} joints, got {actual}")]
    JointCount { expected: usize, actual: usize },

    /// A named point does not correspond to any joint.
    #[error("invalid snapshot: unknown joint {0:?}")]
    UnknownJoint(String),

    /// The same joint was supplied twice.
    #[error("invalid snapshot: duplicate joint {}", .0.as_str())]
    DuplicateJoint(HandJoint),

    /// A joint was never supplied.
    #[error("invalid snapshot: missing joint {}", .0.as_str())]
    MissingJoint(HandJoint),
}

// ── Snapshot ───────────────────────────────────────────────

/// All 21 landmarks of one hand at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSnapshot {
    points: [LandmarkPoint; JOINT_COUNT],
}

impl LandmarkSnapshot {
    /// Build a snapshot from points in capture order.
    pub fn from_points(points: &[LandmarkPoint]) -> Result<Self, SnapshotError> {
        let points: [LandmarkPoint; JOINT_COUNT] =
            points.try_into().map_err(|_| SnapshotError::JointCount {
                expected: JOINT_COUNT,
                actual: points.len(),
            })?;
        Ok(Self { points })
    }

    /// Build a snapshot from `(joint-name, point)` pairs in any order.
    pub fn from_named<'a, I>(named: I) -> Result<Self, SnapshotError>
    where
        I: IntoIterator<Item = (&'a str, LandmarkPoint)>,
    {
        let mut slots: [Option<LandmarkPoint>; JOINT_COUNT] = [None; JOINT_COUNT];
        for (name, point) in named {
            let joint = HandJoint::from_name(name)
                .ok_or_else(|| SnapshotError::UnknownJoint(name.to_string()))?;
            let slot = &mut slots[joint.index()];
            if slot.is_some() {
                return Err(SnapshotError::DuplicateJoint(joint));
            }
            *slot = Some(point);
        }

        let mut points = [LandmarkPoint::default(); JOINT_COUNT];
        for joint in ALL_JOINTS {
            points[joint.index()] =
                slots[joint.index()].ok_or(SnapshotError::MissingJoint(joint))?;
        }
        Ok(Self { points })
    }

    /// Position of a joint.
    pub fn point(&self, joint: HandJoint) -> LandmarkPoint {
        self.points[joint.index()]
    }

    /// Euclidean distance between two joints.
    pub fn joint_distance(&self, a: HandJoint, b: HandJoint) -> f32 {
        self.point(a).distance(&self.point(b))
    }
}

// ── Tests ──────────────────────────────────────────────────
