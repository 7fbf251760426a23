//! Hand landmarks and gesture classification.
//!
//! Provides:
//! - `landmarks`: 21-joint hand snapshot and validation
//! - `gesture`: rule-based static gesture classifier

pub mod gesture;
pub mod landmarks;

pub use gesture::{ClassifierConfig, FingerStates, GestureClassifier, GestureId, UnknownGesture};
pub use landmarks::{Finger, HandJoint, LandmarkPoint, LandmarkSnapshot, SnapshotError, JOINT_COUNT};
