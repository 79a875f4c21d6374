//! Order wire shape.

use mostrador_core::{id_to_string, Order};
use serde::Deserialize;
use serde_json::Value;

/// An order as reported upstream, with every field alias seen in practice.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OrderRecord {
    pub id: Option<Value>,
    pub order_id: Option<Value>,
    #[serde(rename = "_id")]
    pub object_id: Option<Value>,

    pub status: Option<String>,
    pub estado: Option<String>,

    pub tracking: Option<String>,
    pub tracking_url: Option<String>,
    pub envio: Option<String>,

    pub items: Option<Vec<Value>>,
    pub line_items: Option<Vec<Value>>,
    pub productos: Option<Vec<Value>>,

    pub created_at: Option<String>,
    pub fecha: Option<String>,
}

impl OrderRecord {
    pub fn into_order(self) -> Order {
        let id = [&self.id, &self.order_id, &self.object_id]
            .into_iter()
            .flatten()
            .find_map(id_to_string);

        let items = self
            .items
            .or(self.line_items)
            .or(self.productos)
            .unwrap_or_default()
            .iter()
            .filter_map(item_label)
            .collect();

        Order {
            id,
            status: first_text([self.status, self.estado]),
            tracking: first_text([self.tracking, self.tracking_url, self.envio]),
            items,
            created_at: first_text([self.created_at, self.fecha]),
        }
    }
}

fn first_text<const N: usize>(candidates: [Option<String>; N]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .map(|s| s.trim().to_string())
        .find(|s| !s.is_empty())
}

/// Line items come as plain names or as objects with a name and quantity.
fn item_label(item: &Value) -> Option<String> {
    match item {
        Value::String(name) if !name.trim().is_empty() => Some(name.trim().to_string()),
        Value::Object(map) => {
            let name = ["name", "title", "nombre", "product_name"]
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_str))
                .map(str::trim)
                .filter(|name| !name.is_empty())?;
            match map.get("quantity").and_then(Value::as_u64) {
                Some(quantity) if quantity > 1 => Some(format!("{} x{}", name, quantity)),
                _ => Some(name.to_string()),
            }
        }
        _ => None,
    }
}
