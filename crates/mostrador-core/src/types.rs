use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

// Intent types

/// Closed set of business intents a chat message can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentKind {
    Price,
    Order,
    Shipping,
    Payments,
    Installments,
    Promos,
    Info,
    Faq,
    Sun,
    Ozone,
    Sunstick,
    Greet,
    Unknown,
}

impl IntentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Price => "price",
            Self::Order => "order",
            Self::Shipping => "shipping",
            Self::Payments => "payments",
            Self::Installments => "installments",
            Self::Promos => "promos",
            Self::Info => "info",
            Self::Faq => "faq",
            Self::Sun => "sun",
            Self::Ozone => "ozone",
            Self::Sunstick => "sunstick",
            Self::Greet => "greet",
            Self::Unknown => "unknown",
        }
    }

    /// Intents whose answer is a price, so a short follow-up can inherit them.
    pub fn is_price_bearing(&self) -> bool {
        matches!(self, Self::Price | Self::Ozone | Self::Sunstick)
    }

    /// Intents that need a catalog entry to be answered.
    pub fn is_product_bearing(&self) -> bool {
        matches!(
            self,
            Self::Price | Self::Info | Self::Faq | Self::Sun | Self::Ozone | Self::Sunstick
        )
    }

    /// The sun-protection product family.
    pub fn is_sun_family(&self) -> bool {
        matches!(self, Self::Sun | Self::Ozone | Self::Sunstick)
    }
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entities extracted alongside an intent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entities {
    pub order_id: Option<String>,
    #[serde(default)]
    pub follow_up: bool,
    /// The message refers to the kids variant of the sun-protection family
    #[serde(default)]
    pub kids: bool,
}

/// Result of classifying one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Intent {
    pub intent: IntentKind,
    pub entities: Entities,
    /// Name of the rule that fired, `None` for the default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<&'static str>,
}

impl Intent {
    pub fn new(intent: IntentKind) -> Self {
        Self {
            intent,
            entities: Entities::default(),
            rule: None,
        }
    }

    pub fn unknown() -> Self {
        Self::new(IntentKind::Unknown)
    }

    pub fn with_rule(mut self, rule: &'static str) -> Self {
        self.rule = Some(rule);
        self
    }
}

// Per-language values

/// A field the commerce platform reports either as a plain value or as a map
/// keyed by language code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Localized<T> {
    Scalar(T),
    PerLanguage(BTreeMap<String, Option<T>>),
}

/// Language preference used when projecting a per-language map.
pub const LANGUAGE_PREFERENCE: [&str; 3] = ["es", "pt", "en"];

impl<T> Localized<T> {
    /// Projects to a single value: the scalar, or the first present language
    /// in [`LANGUAGE_PREFERENCE`], or any present language.
    pub fn project(&self) -> Option<&T> {
        self.project_where(|_| true)
    }

    fn project_where(&self, usable: impl Fn(&T) -> bool) -> Option<&T> {
        match self {
            Self::Scalar(value) => Some(value).filter(|v| usable(*v)),
            Self::PerLanguage(map) => LANGUAGE_PREFERENCE
                .iter()
                .find_map(|lang| map.get(*lang).and_then(Option::as_ref).filter(|v| usable(*v)))
                .or_else(|| map.values().flatten().find(|v| usable(*v))),
        }
    }
}

impl Localized<String> {
    /// Projects to non-blank text.
    pub fn text(&self) -> Option<&str> {
        self.project_where(|s| !s.trim().is_empty())
            .map(|s| s.trim())
    }
}

impl Localized<Amount> {
    /// Projects to a numeric amount.
    pub fn amount(&self) -> Option<f64> {
        self.project_where(|a| a.value().is_some())
            .and_then(Amount::value)
    }
}

/// An amount reported either as a JSON number or as a numeric string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Number(f64),
    Text(String),
}

impl Amount {
    pub fn value(&self) -> Option<f64> {
        let value = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

// Catalog wire shape

/// A product as reported by an upstream catalog, before ingestion.
///
/// Upstreams disagree on field names, so every alias seen in practice is a
/// separate optional field; ingestion picks the first usable one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductRecord {
    pub id: Option<Value>,
    pub product_id: Option<Value>,
    #[serde(rename = "_id")]
    pub object_id: Option<Value>,

    pub name: Option<Localized<String>>,
    pub title: Option<Localized<String>>,
    pub product_name: Option<Localized<String>>,
    pub nombre: Option<Localized<String>>,

    pub slug: Option<Localized<String>>,
    pub handle: Option<Localized<String>>,

    pub description: Option<Localized<String>>,
    pub descripcion: Option<Localized<String>>,

    pub price: Option<Localized<Amount>>,
    pub precio: Option<Localized<Amount>>,
    pub amount: Option<Localized<Amount>>,
    pub promotional_price: Option<Localized<Amount>>,

    pub url: Option<String>,
    pub permalink: Option<String>,
    pub canonical_url: Option<String>,
    pub link: Option<String>,

    pub tags: Option<Value>,
    pub etiquetas: Option<Value>,

    pub variants: Option<Vec<VariantRecord>>,
    pub variantes: Option<Vec<VariantRecord>>,

    pub spf: Option<bool>,
    pub has_spf: Option<bool>,
}

impl ProductRecord {
    /// First non-blank name among the known aliases.
    pub fn display_name(&self) -> Option<&str> {
        [&self.name, &self.title, &self.product_name, &self.nombre]
            .into_iter()
            .find_map(|field| field.as_ref().and_then(Localized::text))
    }

    /// Explicit sun-protection flag, when the upstream reports one.
    pub fn spf_flag(&self) -> Option<bool> {
        self.spf.or(self.has_spf)
    }
}

/// A product variant as reported upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariantRecord {
    pub id: Option<Value>,
    pub name: Option<Localized<String>>,
    pub sku: Option<String>,
    pub price: Option<Localized<Amount>>,
    pub promotional_price: Option<Localized<Amount>>,
}

/// Renders a JSON identifier (number or string) as text.
pub fn id_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// Catalog entries

/// A sellable item after ingestion. `name` is never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub promotional_price: Option<f64>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub variants: Vec<Variant>,
    /// Sun protection as declared upstream; `None` when not reported
    #[serde(default)]
    pub spf: Option<bool>,
}

impl CatalogEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            slug: String::new(),
            url: None,
            price: None,
            promotional_price: None,
            description: String::new(),
            tags: Vec::new(),
            variants: Vec::new(),
            spf: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = slug.into();
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_spf(mut self, spf: bool) -> Self {
        self.spf = Some(spf);
        self
    }

    /// Entries with a blank name are never stored or matched against.
    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
}

// Orders

/// Order status as reported by the order collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: Option<String>,
    pub status: Option<String>,
    pub tracking: Option<String>,
    #[serde(default)]
    pub items: Vec<String>,
    pub created_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_intent_kind_serializes_lowercase() {
        assert_eq!(serde_json::to_value(IntentKind::Installments).unwrap(), json!("installments"));
        assert_eq!(IntentKind::Sunstick.to_string(), "sunstick");
    }

    #[test]
    fn test_intent_kind_groups() {
        assert!(IntentKind::Price.is_price_bearing());
        assert!(IntentKind::Ozone.is_price_bearing());
        assert!(!IntentKind::Info.is_price_bearing());
        assert!(IntentKind::Info.is_product_bearing());
        assert!(!IntentKind::Shipping.is_product_bearing());
        assert!(IntentKind::Sun.is_sun_family());
    }

    #[test]
    fn test_localized_scalar_and_map() {
        let scalar: Localized<String> = serde_json::from_value(json!("Sérum")).unwrap();
        assert_eq!(scalar.text(), Some("Sérum"));

        let map: Localized<String> =
            serde_json::from_value(json!({"en": "Serum", "pt": "Sérum PT"})).unwrap();
        assert_eq!(map.text(), Some("Sérum PT"));

        let blank_es: Localized<String> =
            serde_json::from_value(json!({"es": "  ", "en": "Serum"})).unwrap();
        assert_eq!(blank_es.text(), Some("Serum"));

        let only_other: Localized<String> =
            serde_json::from_value(json!({"fr": "Sérum FR", "es": null})).unwrap();
        assert_eq!(only_other.text(), Some("Sérum FR"));
    }

    #[test]
    fn test_localized_amount() {
        let number: Localized<Amount> = serde_json::from_value(json!(35595)).unwrap();
        assert_eq!(number.amount(), Some(35595.0));

        let text: Localized<Amount> = serde_json::from_value(json!("35595.00")).unwrap();
        assert_eq!(text.amount(), Some(35595.0));

        let per_lang: Localized<Amount> = serde_json::from_value(json!({"es": "120.5"})).unwrap();
        assert_eq!(per_lang.amount(), Some(120.5));

        let garbage: Localized<Amount> = serde_json::from_value(json!("consultar")).unwrap();
        assert_eq!(garbage.amount(), None);
    }

    #[test]
    fn test_product_record_tolerates_unknown_fields() {
        let record: ProductRecord = serde_json::from_value(json!({
            "id": 42,
            "name": {"es": "Sérum Iuven 30ml"},
            "canonical_url": "https://tienda/iuven",
            "stock": 3,
            "variants": [{"id": 1, "price": "35595.00", "sku": null}]
        }))
        .unwrap();

        assert_eq!(record.id.as_ref().and_then(id_to_string), Some("42".to_string()));
        assert_eq!(record.name.as_ref().and_then(Localized::text), Some("Sérum Iuven 30ml"));
        assert_eq!(record.variants.as_ref().map(Vec::len), Some(1));
        assert_eq!(record.spf_flag(), None);
    }

    #[test]
    fn test_product_record_name_aliases() {
        let titled: ProductRecord = serde_json::from_value(json!({"name": " ", "title": "Sérum"})).unwrap();
        assert_eq!(titled.display_name(), Some("Sérum"));

        let nombre: ProductRecord =
            serde_json::from_value(json!({"nombre": {"es": "Piel Iluminada"}, "has_spf": false})).unwrap();
        assert_eq!(nombre.display_name(), Some("Piel Iluminada"));
        assert_eq!(nombre.spf_flag(), Some(false));

        assert_eq!(ProductRecord::default().display_name(), None);
    }

    #[test]
    fn test_catalog_entry_validity() {
        assert!(CatalogEntry::new("Sérum").is_valid());
        assert!(!CatalogEntry::new("   ").is_valid());
    }
}
