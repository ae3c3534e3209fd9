pub mod config;
pub mod error;
pub mod pairs;
pub mod source;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use pairs::{PairBook, PairSpec};
pub use source::QuoteSource;
pub use types::*;
