//! Host-side collaborators: a landmark source and concrete actions.
//!
//! Nothing here is needed by the classifier or the dispatch loop; the
//! `handsign` binary wires these into a `DispatchLoop`.

pub mod command;
pub mod replay;

pub use command::{build_registry, ActionMode, CommandAction, LogAction};
pub use replay::{replay, Frame, FrameReader, ReplaySummary};
