//! Domain types for the scanner.

pub mod candle;
pub mod timeframe;

pub use candle::Candle;
pub use timeframe::{Timeframe, TimeframeError};

/// Display symbol, e.g. `BTC/USDT`.
pub type Symbol = String;
