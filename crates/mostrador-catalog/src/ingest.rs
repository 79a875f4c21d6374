//! Record ingestion.
//!
//! Upstream product records disagree on field names and value shapes. This
//! module projects them onto [`CatalogEntry`], picking the first usable alias
//! for each field.

use mostrador_core::{
    id_to_string, Amount, CatalogEntry, Localized, ProductRecord, Variant, VariantRecord,
};
use serde_json::Value;
use tracing::debug;

/// Projects a record without validating it. The name may be blank, which is
/// how partial live lookups are represented.
pub fn project(record: &ProductRecord) -> CatalogEntry {
    let variants: Vec<Variant> = record
        .variants
        .as_ref()
        .or(record.variantes.as_ref())
        .map(|variants| variants.iter().map(project_variant).collect())
        .unwrap_or_default();

    let promotional_price = amount(&record.promotional_price);
    let price = first_amount(&[&record.price, &record.precio, &record.amount])
        .or(promotional_price)
        .or_else(|| variants.first().and_then(|v| v.price));

    CatalogEntry {
        id: [&record.id, &record.product_id, &record.object_id]
            .into_iter()
            .flatten()
            .find_map(id_to_string),
        name: record.display_name().unwrap_or_default().to_string(),
        slug: first_text(&[&record.slug, &record.handle]).unwrap_or_default(),
        url: [&record.url, &record.permalink, &record.canonical_url, &record.link]
            .into_iter()
            .flatten()
            .map(|url| url.trim())
            .find(|url| !url.is_empty())
            .map(str::to_string),
        price,
        promotional_price,
        description: first_text(&[&record.description, &record.descripcion]).unwrap_or_default(),
        tags: record
            .tags
            .as_ref()
            .or(record.etiquetas.as_ref())
            .map(parse_tags)
            .unwrap_or_default(),
        variants,
        spf: record.spf_flag(),
    }
}

/// Projects and validates a record. Nameless records yield `None`.
pub fn normalize_record(record: &ProductRecord) -> Option<CatalogEntry> {
    Some(project(record)).filter(CatalogEntry::is_valid)
}

/// Normalizes a whole listing, discarding nameless records.
pub fn normalize_records(records: &[ProductRecord]) -> Vec<CatalogEntry> {
    let entries: Vec<CatalogEntry> = records.iter().filter_map(normalize_record).collect();
    if entries.len() < records.len() {
        debug!(
            discarded = records.len() - entries.len(),
            "Discarded catalog records without a name"
        );
    }
    entries
}

fn project_variant(record: &VariantRecord) -> Variant {
    Variant {
        id: record.id.as_ref().and_then(id_to_string),
        name: record
            .name
            .as_ref()
            .and_then(Localized::text)
            .unwrap_or_default()
            .to_string(),
        sku: record.sku.clone().filter(|sku| !sku.trim().is_empty()),
        price: amount(&record.price).or_else(|| amount(&record.promotional_price)),
    }
}

fn first_text(candidates: &[&Option<Localized<String>>]) -> Option<String> {
    candidates
        .iter()
        .find_map(|&field| field.as_ref().and_then(Localized::text))
        .map(str::to_string)
}

fn amount(field: &Option<Localized<Amount>>) -> Option<f64> {
    field.as_ref().and_then(Localized::amount)
}

fn first_amount(candidates: &[&Option<Localized<Amount>>]) -> Option<f64> {
    candidates.iter().find_map(|&field| amount(field))
}

/// Tags arrive as an array of strings or as one comma-separated string.
fn parse_tags(value: &Value) -> Vec<String> {
    let raw: Vec<&str> = match value {
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        Value::String(joined) => joined.split(',').collect(),
        _ => Vec::new(),
    };
    raw.into_iter()
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}
