//! Domain types: ticks, OHLC bars, calendar units, and the bar table.

pub mod bar;
pub mod table;
pub mod tick;
pub mod unit;

pub use bar::Bar;
pub use table::{BarTable, BarTableError};
pub use tick::Tick;
pub use unit::{CalendarUnit, UnknownUnit};

/// Number of fractional digits carried by every price.
pub const PRICE_SCALE: u32 = 3;
