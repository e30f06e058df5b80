//! Wire protocol and the WebSocket transport that carries it (spec.md
//! §5, §6.1): one connection, one bidirectional JSON stream, no separate
//! HTTP routes per action. Grounded on the earlier `hosting` module,
//! generalized from its three-route (`/start`, `/enter`, `/leave`) split
//! to a single upgrade endpoint that dispatches on message type instead.

pub mod messages;
pub mod server;
pub mod session;

pub use messages::{InboundMessage, ServerMessage};
