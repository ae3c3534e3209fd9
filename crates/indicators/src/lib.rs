pub mod classify;
pub mod process;

pub use classify::{classify_atr, classify_macd, classify_rsi, Classification};
pub use process::readings_for;
