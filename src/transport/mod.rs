//! Node-to-node message protocol
//!
//! A typed, length-delimited binary protocol: the `Message` envelope
//! with its closed kind set, the configuration-aware `Codec`, and the
//! `BatchFramer` that groups messages per destination. Protocol
//! violations are fatal by design; see `violation`.

mod batch;
mod codec;
mod cursor;
mod message;
mod violation;

pub use batch::BatchFramer;
pub use codec::Codec;
pub use cursor::ByteReader;
pub use message::{
    AckBody, ClientQueryBody, ClientResponseBody, FinishBody, LogWriteBody, Message, MessageBody,
    MessageKind, QueryResponseBody, RemoteQueryBody,
};
pub use violation::ProtocolViolation;
