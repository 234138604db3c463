//! Lightweight directional models over a candle series.
//!
//! `trend` fits a line through recent closes, `features` blends that with
//! indicator, volume and sentiment inputs, and `levels` classifies volatility
//! and clusters swing highs/lows.

pub mod features;
pub mod levels;
pub mod trend;

pub use features::*;
pub use levels::*;
pub use trend::*;
