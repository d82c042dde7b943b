//! Core EOS types.
//!
//! This module contains the primitive values that appear in action payloads
//! and transaction envelopes: names, token quantities and timestamps.

mod asset;
mod name;
mod time;

pub use asset::{Asset, MAX_SYMBOL_LENGTH};
pub use name::{Name, MAX_NAME_LENGTH, NAME_CHARSET};
pub use time::TimePointSec;
