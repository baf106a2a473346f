//! Placement state machine
//!
//! - [`PlacementIndex`]: which id sits in which bucket
//! - [`Board`]: session cache kept in step with a gateway
//! - [`DragController`]: drag gesture reduced to (id, source, target)

pub mod board;
pub mod drag;
pub mod index;

pub use board::{Board, Capability};
pub use drag::{DragController, DragState, DropIntent};
pub use index::{IndexViolation, PlacementIndex};
