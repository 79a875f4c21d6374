//! Intent classification module.
//!
//! Classification is a single pass over an explicitly ordered rule table.
//! Buckets overlap ("cuanto sale" vs. "hot sale", "descuento por
//! transferencia" vs. "descuentos"), so the first rule that matches wins and
//! the order of [`DEFAULT_RULES`] is the whole disambiguation policy.

use lazy_static::lazy_static;
use mostrador_core::{Intent, IntentKind};
use regex::Regex;
use tracing::{debug, trace};

use crate::followup::is_continuation;
use crate::lexicon::{self, greeting_hints};
use crate::normalize::{contains_any, contains_term, normalize};

lazy_static! {
    /// A 4 to 10 digit run standing on its own.
    static ref ORDER_ID: Regex = Regex::new(r"\b([0-9]{4,10})\b").unwrap();

    static ref DEFAULT_CLASSIFIER: IntentClassifier = IntentClassifier::new();
}

/// Greetings longer than this need a pleasantry to still count as bare.
const MAX_BARE_GREETING_LEN: usize = 20;

/// A message as seen by the rule predicates.
#[derive(Debug, Clone)]
pub struct MessageText<'a> {
    raw: &'a str,
    normalized: String,
}

impl<'a> MessageText<'a> {
    pub fn new(raw: &'a str) -> Self {
        Self {
            raw,
            normalized: normalize(raw),
        }
    }

    pub fn raw(&self) -> &str {
        self.raw
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    pub fn has_any(&self, terms: &[&str]) -> bool {
        contains_any(&self.normalized, terms)
    }

    /// The first qualifying digit run in the raw text.
    pub fn order_id(&self) -> Option<&str> {
        ORDER_ID
            .captures(self.raw)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

/// One entry of the ordered rule table.
#[derive(Clone, Copy)]
pub struct IntentRule {
    pub name: &'static str,
    pub intent: IntentKind,
    pub matches: fn(&MessageText<'_>) -> bool,
}

impl IntentRule {
    pub fn new(name: &'static str, intent: IntentKind, matches: fn(&MessageText<'_>) -> bool) -> Self {
        Self {
            name,
            intent,
            matches,
        }
    }
}

impl std::fmt::Debug for IntentRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntentRule")
            .field("name", &self.name)
            .field("intent", &self.intent)
            .finish()
    }
}

/// Evaluation order. Brand rules sit ahead of generic price so that
/// "cuanto sale el sunstick" keeps its brand while still being price-bearing.
pub static DEFAULT_RULES: &[IntentRule] = &[
    IntentRule { name: "greet_only", intent: IntentKind::Greet, matches: is_greeting_only },
    IntentRule { name: "discounted_transfer", intent: IntentKind::Payments, matches: is_discounted_transfer },
    IntentRule { name: "promos", intent: IntentKind::Promos, matches: mentions_promos },
    IntentRule { name: "installments", intent: IntentKind::Installments, matches: mentions_installments },
    IntentRule { name: "payments", intent: IntentKind::Payments, matches: mentions_payments },
    IntentRule { name: "shipping", intent: IntentKind::Shipping, matches: mentions_shipping },
    IntentRule { name: "order", intent: IntentKind::Order, matches: asks_for_order },
    IntentRule { name: "sunstick_look", intent: IntentKind::Sunstick, matches: asks_how_stick_looks },
    IntentRule { name: "ozone", intent: IntentKind::Ozone, matches: mentions_ozone },
    IntentRule { name: "price", intent: IntentKind::Price, matches: asks_price },
    IntentRule { name: "info", intent: IntentKind::Info, matches: asks_info },
    IntentRule { name: "spf_faq", intent: IntentKind::Faq, matches: asks_spf },
    IntentRule { name: "sun", intent: IntentKind::Sun, matches: mentions_sun },
];

fn is_greeting_only(message: &MessageText<'_>) -> bool {
    let text = message.normalized();
    let opens_with_greeting = lexicon::GREETINGS.iter().any(|greeting| {
        text.strip_prefix(greeting)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(' '))
    });

    opens_with_greeting
        && !greeting_hints().any(|hint| contains_term(text, hint))
        && message.order_id().is_none()
        && (text.len() <= MAX_BARE_GREETING_LEN || message.has_any(lexicon::PLEASANTRIES))
}

fn is_discounted_transfer(message: &MessageText<'_>) -> bool {
    message.has_any(lexicon::DISCOUNT) && message.has_any(lexicon::TRANSFER)
}

fn mentions_promos(message: &MessageText<'_>) -> bool {
    message.has_any(lexicon::PROMOS)
}

fn mentions_installments(message: &MessageText<'_>) -> bool {
    message.has_any(lexicon::INSTALLMENTS)
}

fn mentions_payments(message: &MessageText<'_>) -> bool {
    message.has_any(lexicon::PAYMENTS)
}

fn mentions_shipping(message: &MessageText<'_>) -> bool {
    message.has_any(lexicon::SHIPPING)
}

fn asks_for_order(message: &MessageText<'_>) -> bool {
    message.has_any(lexicon::ORDER) || message.order_id().is_some()
}

fn asks_how_stick_looks(message: &MessageText<'_>) -> bool {
    message.has_any(lexicon::OZONE) && message.has_any(lexicon::LOOK)
}

fn mentions_ozone(message: &MessageText<'_>) -> bool {
    message.has_any(lexicon::OZONE)
}

fn asks_price(message: &MessageText<'_>) -> bool {
    message.has_any(lexicon::PRICE)
}

fn asks_info(message: &MessageText<'_>) -> bool {
    message.has_any(lexicon::INFO)
}

fn asks_spf(message: &MessageText<'_>) -> bool {
    message.has_any(lexicon::FAQ)
}

fn mentions_sun(message: &MessageText<'_>) -> bool {
    message.has_any(lexicon::SUN)
}

/// Rule-table intent classifier.
#[derive(Debug, Clone)]
pub struct IntentClassifier {
    rules: Vec<IntentRule>,
}

impl IntentClassifier {
    /// Creates a classifier over [`DEFAULT_RULES`].
    pub fn new() -> Self {
        Self::with_rules(DEFAULT_RULES.to_vec())
    }

    /// Creates a classifier over a custom rule table, evaluated in order.
    pub fn with_rules(rules: Vec<IntentRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[IntentRule] {
        &self.rules
    }

    /// Classifies one raw message. Never fails; no match yields `unknown`.
    pub fn classify(&self, text: &str) -> Intent {
        let message = MessageText::new(text);
        trace!(normalized = %message.normalized(), "Classifying message");

        let mut intent = match self.rules.iter().find(|rule| (rule.matches)(&message)) {
            Some(rule) => Intent::new(rule.intent).with_rule(rule.name),
            None => Intent::unknown(),
        };

        if intent.intent == IntentKind::Order {
            intent.entities.order_id = message.order_id().map(str::to_string);
        }
        intent.entities.kids = intent.intent.is_sun_family() && message.has_any(lexicon::KIDS);
        intent.entities.follow_up = is_continuation(message.normalized());

        debug!(
            intent = %intent.intent,
            rule = intent.rule.unwrap_or("default"),
            "Classified message"
        );
        intent
    }
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Classifies a message with the default rule table.
pub fn detect_intent(text: &str) -> Intent {
    DEFAULT_CLASSIFIER.classify(text)
}
