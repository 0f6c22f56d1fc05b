//! Domain types for Hindsight

pub mod bar;
pub mod order;
pub mod position;
pub mod trade;

pub use bar::Bar;
pub use order::{ExitReason, Order, PendingOrder};
pub use position::{ExposureState, Position, PositionSide};
pub use trade::{EquityPoint, Trade};
