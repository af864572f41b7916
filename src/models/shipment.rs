use serde::{Deserialize, Serialize};

use super::common as lenient;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub attention_name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub address_line1: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub address_line2: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub city: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub state: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub postal_code: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub country_code: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub phone: String,
}

impl Address {
    /// Non-empty street lines, in order.
    pub fn address_lines(&self) -> Vec<String> {
        [&self.address_line1, &self.address_line2]
            .into_iter()
            .filter(|line| !line.is_empty())
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(default, deserialize_with = "lenient::string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub quantity: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub weight_kg: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub weight_lbs: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub length: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub width: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub height: Option<f64>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub packaging_code: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub packaging_description: String,
}

impl LineItem {
    /// Description, falling back to the product name.
    pub fn label(&self) -> &str {
        if self.description.is_empty() {
            &self.name
        } else {
            &self.description
        }
    }

    pub fn quantity_or_one(&self) -> f64 {
        self.quantity.filter(|q| *q > 0.0).unwrap_or(1.0)
    }

    /// `LxWxH` using whichever dimensions were supplied, or "" when none were.
    pub fn dimensions(&self) -> String {
        let parts: Vec<String> = [self.length, self.width, self.height]
            .into_iter()
            .map(|d| d.map(lenient::format_amount).unwrap_or_default())
            .collect();
        if parts.iter().all(String::is_empty) {
            String::new()
        } else {
            parts.join(" x ")
        }
    }

    /// Weight as printed on the item table, preferring kilograms.
    pub fn weight(&self) -> String {
        match (self.weight_kg, self.weight_lbs) {
            (Some(kg), _) => format!("{} kg", lenient::format_amount(kg)),
            (None, Some(lbs)) => format!("{} lbs", lenient::format_amount(lbs)),
            (None, None) => String::new(),
        }
    }
}

/// Order-level amounts as sent by the storefront.
///
/// Storefronts send either the long or the short key for several amounts
/// (`invoice_subtotal` or `subtotal`, `discount_rebate` or `discount`, ...),
/// sometimes both. Each spelling is kept separately and the long key wins in
/// [`OrderTotals::resolve`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderTotals {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::number")]
    pub invoice_subtotal: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub subtotal: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::number")]
    pub discount_rebate: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub discount: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub freight: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub insurance: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub others: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::number")]
    pub other: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::number")]
    pub total_invoice_amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub total: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedTotals {
    pub subtotal: f64,
    pub discount: f64,
    pub freight: f64,
    pub insurance: f64,
    pub other: f64,
    pub total: f64,
}

impl OrderTotals {
    /// Fills in absent amounts with zero and derives the grand total when it
    /// was not supplied: `subtotal - discount + freight + insurance + other`.
    /// An explicit total is used as sent, zero included.
    pub fn resolve(&self) -> ResolvedTotals {
        let subtotal = self.invoice_subtotal.or(self.subtotal).unwrap_or(0.0);
        let discount = self.discount_rebate.or(self.discount).unwrap_or(0.0);
        let freight = self.freight.unwrap_or(0.0);
        let insurance = self.insurance.unwrap_or(0.0);
        let other = self.others.or(self.other).unwrap_or(0.0);
        let total = self
            .total_invoice_amount
            .or(self.total)
            .unwrap_or(subtotal - discount + freight + insurance + other);

        ResolvedTotals {
            subtotal,
            discount,
            freight,
            insurance,
            other,
            total,
        }
    }
}

/// Everything known about one shipment, as received from the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentRecord {
    #[serde(default, deserialize_with = "lenient::string")]
    pub shipment_number: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub tracking_number: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub customer_context: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub shipper_name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub shipper_phone: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub ship_to_phone: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub service_description: String,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub ship_from: Address,
    /// Ship-to address.
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub address: Address,
    #[serde(default, deserialize_with = "lenient::seq")]
    pub items: Vec<LineItem>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub order: OrderTotals,
}

impl ShipmentRecord {
    /// Returns a copy carrying the carrier-issued shipment number.
    pub fn with_shipment_number(&self, shipment_number: &str) -> Self {
        ShipmentRecord {
            shipment_number: shipment_number.to_string(),
            ..self.clone()
        }
    }

    /// Returns a copy restricted to the given items.
    pub fn with_items(&self, items: &[LineItem]) -> Self {
        ShipmentRecord {
            items: items.to_vec(),
            ..self.clone()
        }
    }

    pub fn tracking_number_or(&self, fallback: &str) -> String {
        if self.tracking_number.is_empty() {
            fallback.to_string()
        } else {
            self.tracking_number.clone()
        }
    }

    /// `Desc x2; Other x1`, used as the shipment description fallback.
    pub fn items_summary(&self) -> String {
        self.items
            .iter()
            .map(|item| {
                let label = if item.label().is_empty() { "Item" } else { item.label() };
                format!("{} x{}", label, lenient::format_amount(item.quantity_or_one()))
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn derives_total_when_absent() {
        let order = OrderTotals {
            subtotal: Some(100.0),
            discount: Some(10.0),
            freight: Some(5.0),
            insurance: Some(2.0),
            others: Some(1.0),
            ..Default::default()
        };
        assert_eq!(order.resolve().total, 98.0);
    }

    #[test]
    fn explicit_total_wins() {
        let order = OrderTotals {
            subtotal: Some(100.0),
            total: Some(120.0),
            ..Default::default()
        };
        assert_eq!(order.resolve().total, 120.0);
    }

    #[test]
    fn accepts_long_key_spellings_and_numeric_strings() {
        let order: OrderTotals = serde_json::from_value(json!({
            "invoice_subtotal": "100",
            "discount_rebate": 10,
            "freight": null,
            "total_invoice_amount": "n/a"
        }))
        .unwrap();

        let resolved = order.resolve();
        assert_eq!(resolved.subtotal, 100.0);
        assert_eq!(resolved.discount, 10.0);
        assert_eq!(order.freight, None);
        assert_eq!(order.total_invoice_amount, None);
        assert_eq!(resolved.total, 90.0);
    }

    #[test]
    fn both_key_spellings_are_accepted_and_the_long_one_wins() {
        let order: OrderTotals = serde_json::from_value(json!({
            "invoice_subtotal": 200,
            "subtotal": 100,
            "discount_rebate": "20",
            "discount": 10,
            "others": 3,
            "other": 1,
            "total_invoice_amount": 250,
            "total": 120
        }))
        .unwrap();

        let resolved = order.resolve();
        assert_eq!(resolved.subtotal, 200.0);
        assert_eq!(resolved.discount, 20.0);
        assert_eq!(resolved.other, 3.0);
        assert_eq!(resolved.total, 250.0);
    }

    #[test]
    fn short_keys_fill_in_when_long_keys_are_unusable() {
        let order: OrderTotals = serde_json::from_value(json!({
            "invoice_subtotal": null,
            "subtotal": 100,
            "discount_rebate": "n/a",
            "discount": 10
        }))
        .unwrap();

        let resolved = order.resolve();
        assert_eq!(resolved.subtotal, 100.0);
        assert_eq!(resolved.discount, 10.0);
        assert_eq!(resolved.total, 90.0);
    }

    #[test]
    fn explicit_zero_total_is_kept() {
        let order: OrderTotals = serde_json::from_value(json!({ "subtotal": 100, "total": 0 })).unwrap();
        assert_eq!(order.resolve().total, 0.0);
    }

    #[test]
    fn malformed_fields_degrade_to_empty_strings() {
        let record: ShipmentRecord = serde_json::from_value(json!({
            "address": { "name": null, "city": 42, "phone": 5551234 },
            "items": null,
            "order": null
        }))
        .unwrap();

        assert_eq!(record.address.name, "");
        assert_eq!(record.address.city, "42");
        assert_eq!(record.address.phone, "5551234");
        assert!(record.items.is_empty());
        assert_eq!(record.order, OrderTotals::default());
    }

    #[test]
    fn item_label_falls_back_to_name() {
        let item = LineItem {
            name: "Widget".into(),
            ..Default::default()
        };
        assert_eq!(item.label(), "Widget");
        assert_eq!(item.dimensions(), "");
        assert_eq!(item.quantity_or_one(), 1.0);
    }

    #[test]
    fn items_summary_lists_quantities() {
        let record = ShipmentRecord {
            items: vec![
                LineItem {
                    description: "Resin".into(),
                    quantity: Some(2.0),
                    ..Default::default()
                },
                LineItem::default(),
            ],
            ..Default::default()
        };
        assert_eq!(record.items_summary(), "Resin x2; Item x1");
    }
}
