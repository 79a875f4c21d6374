//! Conversation orchestration for Mostrador.
//!
//! [`MessageHandler`] takes one inbound chat message through classification,
//! follow-up resolution, product or order lookup and context update, and
//! returns a typed [`HandledMessage`] for whatever composes the reply.

pub mod handler;
pub mod message;

pub use handler::MessageHandler;
pub use message::{HandledMessage, InboundMessage, OrderOutcome, Outcome, ProductOutcome};
