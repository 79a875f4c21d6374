//! Spanish reply texts.
//!
//! Kept deliberately thin: every decision has already been made by the
//! message handler, this only phrases it. Prices are rendered exclusively
//! through [`PriceNormalizer::display`].

use lazy_static::lazy_static;
use mostrador_conversation::{HandledMessage, OrderOutcome, Outcome, ProductOutcome};
use mostrador_core::{CatalogEntry, IntentKind, LinksConfig, Order, PriceNormalizer};
use mostrador_nlp::{contains_any, lexicon, normalize};
use regex::Regex;
use serde::Serialize;

/// Longest product description quoted in an info reply.
pub const MAX_DESCRIPTION_CHARS: usize = 520;

lazy_static! {
    static ref HTML_TAG: Regex = Regex::new(r"<[^>]*>").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

const GREETING: &str = "¡Hola! Soy el asistente de la tienda. Te puedo ayudar con precios, \
                        envíos, medios de pago y el estado de tu pedido. ¿Qué estás buscando?";
const PROMOS: &str = "Las promociones vigentes están publicadas en la tienda online. \
                      Además, pagando por transferencia tenés un descuento especial.";
const PAYMENTS: &str = "Aceptamos tarjetas de crédito y débito, transferencia bancaria, \
                        Mercado Pago y efectivo en puntos de pago.";
const INSTALLMENTS: &str = "Podés pagar en cuotas con tarjeta de crédito. Las opciones \
                            disponibles aparecen al finalizar la compra.";
const SHIPPING: &str = "Hacemos envíos a todo el país. El costo y la demora se calculan con \
                        tu código postal al finalizar la compra.";
const UNKNOWN: &str = "No estoy seguro de haberte entendido. ¿Me contás qué producto buscás \
                       o en qué te puedo ayudar?";
const SPF_USAGE_TIP: &str = "Para una protección pareja aplicalo 20 minutos antes de salir y \
                             renovalo cada dos horas.";
const NO_SPF_ADVICE: &str = "Para el sol te recomiendo sumar un Sunstick de Ozone, que tiene \
                             FPS alto y color.";
pub const INVALID_MESSAGE: &str = "No pude leer tu mensaje. ¿Me lo enviás de nuevo?";
pub const INTERNAL_FAILURE: &str = "Tuvimos un problema para responderte. Probá de nuevo en \
                                    unos minutos, por favor.";

/// A reply ready to send back through the channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply {
    pub text: String,
    pub links: Vec<String>,
}

impl Reply {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            links: Vec::new(),
        }
    }

    fn with_link(mut self, link: Option<&str>) -> Self {
        if let Some(link) = link.filter(|l| !l.trim().is_empty()) {
            self.links.push(link.to_string());
        }
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReplyComposer {
    pricing: PriceNormalizer,
    links: LinksConfig,
}

impl ReplyComposer {
    pub fn new(pricing: PriceNormalizer) -> Self {
        Self {
            pricing,
            links: LinksConfig::default(),
        }
    }

    /// Store pages attached to promo, payment and shipping replies.
    pub fn with_links(mut self, links: LinksConfig) -> Self {
        self.links = links;
        self
    }

    pub fn compose(&self, handled: &HandledMessage) -> Reply {
        let kind = handled.intent.intent;
        match &handled.outcome {
            Outcome::Product(outcome) => self.product(kind, handled.intent.entities.kids, outcome),
            Outcome::Order(outcome) => order(outcome),
            Outcome::Canned => Reply::text(canned(kind)).with_link(self.canned_link(kind)),
        }
    }

    fn canned_link(&self, kind: IntentKind) -> Option<&str> {
        match kind {
            IntentKind::Promos => self.links.promos_url.as_deref(),
            IntentKind::Payments | IntentKind::Installments => self.links.payments_url.as_deref(),
            IntentKind::Shipping => self.links.shipping_url.as_deref(),
            _ => None,
        }
    }

    fn product(&self, kind: IntentKind, kids: bool, outcome: &ProductOutcome) -> Reply {
        let product = match outcome {
            ProductOutcome::Found { product, .. } => product,
            ProductOutcome::NotFound { query } => {
                return Reply::text(format!(
                    "No encontré un producto que coincida con \"{query}\". ¿Me pasás el nombre \
                     como figura en la tienda?"
                ))
            }
            ProductOutcome::MissingQuery => return Reply::text(missing_query(kind)),
        };

        let text = match kind {
            IntentKind::Info => self.info(product),
            IntentKind::Faq => match spf_info(product) {
                Some(true) => format!("Sí, {} tiene protección solar. {}", product.name, SPF_USAGE_TIP),
                Some(false) => {
                    return Reply::text(format!("{} no tiene protección solar. {}", product.name, NO_SPF_ADVICE))
                }
                None => format!(
                    "No tengo confirmado si {} tiene SPF. Si querés, te cuento cómo usarlo o te \
                     paso opciones con protección.",
                    product.name
                ),
            },
            IntentKind::Sunstick => format!(
                "{} tiene color y se integra con la piel, no deja rastro blanco. {}",
                product.name,
                self.price_line(product)
            ),
            IntentKind::Sun | IntentKind::Ozone if kids => {
                format!("Para los chicos te recomiendo {}. {}", product.name, self.price_line(product))
            }
            _ => self.price_line(product),
        };

        Reply::text(text).with_link(product.url.as_deref())
    }

    fn price_line(&self, product: &CatalogEntry) -> String {
        let regular = self.pricing.display(product.price);
        let promotional = self
            .pricing
            .display(product.promotional_price)
            .filter(|promo| Some(promo) != regular.as_ref());

        match (regular, promotional) {
            (Some(regular), Some(promo)) => {
                format!("{}: {} (precio de lista {}).", product.name, promo, regular)
            }
            (Some(price), None) | (None, Some(price)) => format!("{}: {}.", product.name, price),
            (None, None) => format!(
                "{}: no tengo el precio a mano, lo podés ver en la tienda.",
                product.name
            ),
        }
    }

    fn info(&self, product: &CatalogEntry) -> String {
        let description = truncate(&strip_html(&product.description), MAX_DESCRIPTION_CHARS);
        if description.is_empty() {
            format!("{}. Te dejo el link con toda la información.", product.name)
        } else {
            format!("{}: {}", product.name, description)
        }
    }
}

/// Whether a product protects from the sun: the upstream flag when there is
/// one, otherwise `Some(true)` when its wording says so and `None` when
/// nothing does.
pub fn spf_info(product: &CatalogEntry) -> Option<bool> {
    if product.spf.is_some() {
        return product.spf;
    }

    let description = strip_html(&product.description);
    let haystack = [product.name.as_str(), description.as_str()]
        .into_iter()
        .chain(product.tags.iter().map(String::as_str))
        .map(normalize)
        .collect::<Vec<_>>()
        .join(" ");

    contains_any(&haystack, lexicon::SPF_POSITIVE).then_some(true)
}

fn canned(kind: IntentKind) -> &'static str {
    match kind {
        IntentKind::Greet => GREETING,
        IntentKind::Promos => PROMOS,
        IntentKind::Payments => PAYMENTS,
        IntentKind::Installments => INSTALLMENTS,
        IntentKind::Shipping => SHIPPING,
        _ => UNKNOWN,
    }
}

fn missing_query(kind: IntentKind) -> &'static str {
    match kind {
        IntentKind::Info => "¿Sobre qué producto querés información?",
        IntentKind::Faq => "¿Sobre qué protector querés saber el factor de protección?",
        _ => "¿De qué producto querés saber el precio?",
    }
}

fn order(outcome: &OrderOutcome) -> Reply {
    match outcome {
        OrderOutcome::Found { order } => found_order(order),
        OrderOutcome::NotFound { order_id } => Reply::text(format!(
            "No encontré el pedido #{order_id}. ¿Podés revisar el número?"
        )),
        OrderOutcome::Unavailable { order_id } => Reply::text(format!(
            "No pude consultar el pedido #{order_id} en este momento. Probá de nuevo en unos \
             minutos, por favor."
        )),
        OrderOutcome::NeedsOrderId => {
            Reply::text("Pasame el número de pedido y lo reviso enseguida.")
        }
    }
}

fn found_order(order: &Order) -> Reply {
    let id = order.id.as_deref().unwrap_or("");
    let mut text = match order.status.as_deref() {
        Some(status) => format!("Tu pedido #{id} está: {status}."),
        None => format!("Encontré tu pedido #{id}."),
    };
    if !order.items.is_empty() {
        text.push_str(&format!(" Incluye: {}.", order.items.join(", ")));
    }

    let tracking = order.tracking.as_deref();
    if tracking.is_some() {
        text.push_str(" Podés seguir el envío desde el link.");
    }
    Reply::text(text).with_link(tracking)
}

/// Drops markup and common entities, collapsing whitespace.
pub fn strip_html(html: &str) -> String {
    let text = HTML_TAG.replace_all(html, " ");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">");
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

/// Cuts to at most `max` characters, ending in an ellipsis when shortened.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", cut.trim_end())
}
