//! # Mostrador NLP
//!
//! Deterministic language handling for Spanish storefront chat.
//!
//! - **Normalization**: lower-case, accent-free, punctuation-free text that
//!   every matcher in the workspace compares against
//! - **Intent classification**: an explicitly ordered table of keyword rules
//! - **Query cleaning**: strips intent vocabulary, units and filler so only the
//!   product words remain
//! - **Follow-up shape**: recognizes short continuations like "¿y la corporal?"
//!
//! ## Example
//!
//! ```rust
//! use mostrador_core::IntentKind;
//! use mostrador_nlp::detect_intent;
//!
//! let intent = detect_intent("hola, precio de Iuven");
//! assert_eq!(intent.intent, IntentKind::Price);
//! ```

pub mod followup;
pub mod intent;
pub mod lexicon;
pub mod normalize;
pub mod query;

pub use followup::{compose_follow_up_query, is_continuation};
pub use intent::{detect_intent, IntentClassifier, IntentRule, MessageText};
pub use normalize::{contains_any, contains_term, normalize, normalize_opt};
pub use query::clean_query;
