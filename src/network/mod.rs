//! Network Layer
//!
//! WebSocket gateway for real-time participant connections. This layer owns
//! every socket and channel; all game logic runs through `game/`.

pub mod protocol;
pub mod server;

pub use protocol::{ClientMessage, SelectionRequest, ServerMessage};
pub use server::{Gateway, GatewayError, ServerConfig};
