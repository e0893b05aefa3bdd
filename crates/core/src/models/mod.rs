//! Data models for Agora

mod participant;
mod player;
mod record;
mod room_key;
mod score;

pub use participant::*;
pub use player::*;
pub use record::*;
pub use room_key::*;
pub use score::*;
