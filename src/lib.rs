//! handsign - hand gesture recognition and cooldown-gated action dispatch.
//!
//! Landmark snapshots go through a fixed rule classifier; the dispatch
//! loop fires at most one host-supplied action per cooldown window.

pub mod config;
pub mod dispatch;
pub mod hand;
pub mod host;
pub mod sexp;

pub use config::HandsignConfig;
pub use dispatch::{Action, ActionRegistry, DispatchLoop, DispatchOutcome};
pub use hand::{GestureClassifier, GestureId, LandmarkPoint, LandmarkSnapshot};
