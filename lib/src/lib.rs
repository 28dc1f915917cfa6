mod api;
mod config;
mod error;
mod message;
mod player;
mod score;

pub use api::*;
pub use config::*;
pub use error::*;
pub use message::*;
pub use player::*;
pub use score::*;
