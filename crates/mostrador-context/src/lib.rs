//! Conversation context for Mostrador.
//!
//! Remembers, per user and for a few minutes, what the last product question
//! was about so that short follow-ups ("¿y la corporal?") can be resolved.
//! Expired entries are evicted lazily on read, bounded by a maximum size, and
//! optionally swept by a cancellable background task.

pub mod store;

pub use store::{ContextPatch, ContextStore, ConversationContext};
