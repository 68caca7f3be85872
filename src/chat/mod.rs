//! Chat — transport adapter for the streaming text-generation endpoint.
//!
//! DESIGN
//! ======
//! `ChatTransport` is the seam between the exchange controller and the
//! network. `HttpChatClient` is the production implementation; tests plug
//! in scripted transports. Decoding lives here too because it is the only
//! interpretation the body ever gets.

pub mod decode;
pub mod http;
pub mod types;

pub use http::HttpChatClient;
pub use types::{ChatError, ChatRequest, ChatSettings, ChatTransport, ChunkStream, HistoryEntry, Role};
