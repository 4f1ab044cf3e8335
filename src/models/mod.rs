//! Data models for the Lean Coffee board.
//!
//! JSON shapes use camelCase to match the browser client.

mod board;
mod card;
mod requests;

pub use board::*;
pub use card::*;
pub use requests::*;
