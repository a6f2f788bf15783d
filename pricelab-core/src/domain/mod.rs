//! Domain types for PriceLab

pub mod bar;
pub mod series;
pub mod timeframe;

pub use bar::Bar;
pub use series::{Series, UnorderedSeries};
pub use timeframe::{Interval, Period, TimeframeError};

/// Symbol type alias
pub type Symbol = String;
