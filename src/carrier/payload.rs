//! Request bodies for the shipping and paperless-documents APIs, and the
//! few fields read back from their responses.

use std::path::PathBuf;

use serde_json::{json, Value};

use crate::models::common::format_amount;
use crate::models::{Address, DocumentArtifact, LineItem, ShipmentRecord};

const LBS_PER_KG: f64 = 2.20462262;
const KG_PER_LB: f64 = 0.45359237;
const MAX_PHONE_DIGITS: usize = 15;
const DEFAULT_PHONE: &str = "0000000000";

/// Units the shipper account is billed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitSystem {
    /// Pounds and inches.
    Imperial,
    /// Kilograms and centimetres.
    Metric,
}

impl UnitSystem {
    pub fn for_country(country_code: &str) -> Self {
        match country_code.to_ascii_uppercase().as_str() {
            "US" | "PR" => UnitSystem::Imperial,
            _ => UnitSystem::Metric,
        }
    }

    fn weight_unit(&self) -> (&'static str, &'static str) {
        match self {
            UnitSystem::Imperial => ("LBS", "Pounds"),
            UnitSystem::Metric => ("KGS", "Kilograms"),
        }
    }

    fn length_unit(&self) -> (&'static str, &'static str) {
        match self {
            UnitSystem::Imperial => ("IN", "Inches"),
            UnitSystem::Metric => ("CM", "Centimeters"),
        }
    }

    fn default_dimension(&self) -> f64 {
        match self {
            UnitSystem::Imperial => 4.0,
            UnitSystem::Metric => 10.0,
        }
    }

    /// Package weight in this system's unit, converting when only the other
    /// unit was supplied. Items without any weight count as 1.
    pub fn package_weight(&self, item: &LineItem) -> f64 {
        match (self, item.weight_lbs, item.weight_kg) {
            (UnitSystem::Imperial, Some(lbs), _) => lbs,
            (UnitSystem::Imperial, None, Some(kg)) => kg * LBS_PER_KG,
            (UnitSystem::Metric, _, Some(kg)) => kg,
            (UnitSystem::Metric, Some(lbs), None) => lbs * KG_PER_LB,
            (_, None, None) => 1.0,
        }
    }
}

/// A generated document on its way to the carrier.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadDocument {
    pub path: PathBuf,
    pub file_name: String,
    pub file_format: String,
    pub document_type: String,
    pub customer_context: String,
}

impl UploadDocument {
    pub fn from_artifact(artifact: &DocumentArtifact, customer_context: &str) -> Self {
        UploadDocument {
            path: artifact.path.clone(),
            file_name: artifact.file_name(),
            file_format: "pdf".to_string(),
            document_type: artifact.kind.document_type().to_string(),
            customer_context: customer_context.to_string(),
        }
    }
}

/// Association of an uploaded document with a shipment.
#[derive(Debug, Clone, PartialEq)]
pub struct PushDocument {
    pub document_id: String,
    pub shipment_identifier: String,
    pub tracking_number: String,
    /// `YYYY-MM-DD-HH.MM.SS`
    pub shipment_date_time: String,
    pub customer_context: String,
}

/// Phone number as the carrier accepts it: digits only, at most 15.
pub fn phone_digits(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).take(MAX_PHONE_DIGITS).collect()
}

fn first_non_empty<'a>(candidates: &[&'a str], fallback: &'a str) -> &'a str {
    candidates.iter().copied().find(|c| !c.is_empty()).unwrap_or(fallback)
}

fn phone(candidates: &[&str]) -> String {
    let digits = phone_digits(first_non_empty(candidates, DEFAULT_PHONE));
    if digits.is_empty() {
        DEFAULT_PHONE.to_string()
    } else {
        digits
    }
}

fn address_block(address: &Address, country_code: &str) -> Value {
    json!({
        "AddressLine": address.address_lines(),
        "City": address.city,
        "StateProvinceCode": address.state,
        "PostalCode": address.postal_code,
        "CountryCode": country_code,
    })
}

fn package(item: &LineItem, units: UnitSystem) -> Value {
    let (weight_code, weight_name) = units.weight_unit();
    let (length_code, length_name) = units.length_unit();
    let dimension = |value: Option<f64>| format_amount(value.unwrap_or_else(|| units.default_dimension()));
    let description = first_non_empty(&[&item.description], " ");

    json!({
        "Description": description,
        "Packaging": {
            "Code": first_non_empty(&[&item.packaging_code], "02"),
            "Description": first_non_empty(&[&item.packaging_description], "Customer Supplied Package"),
        },
        "Dimensions": {
            "UnitOfMeasurement": { "Code": length_code, "Description": length_name },
            "Length": dimension(item.length),
            "Width": dimension(item.width),
            "Height": dimension(item.height),
        },
        "PackageWeight": {
            "UnitOfMeasurement": { "Code": weight_code, "Description": weight_name },
            "Weight": format_amount(units.package_weight(item)),
        },
    })
}

/// Account country: configured value, else the ship-from country, else `US`.
pub fn account_country(record: &ShipmentRecord, configured: Option<&str>) -> String {
    first_non_empty(&[configured.unwrap_or_default(), &record.ship_from.country_code], "US").to_ascii_uppercase()
}

/// Builds the `ShipmentRequest` body. Shipper and ship-from share the
/// account's country.
pub fn shipment_request(record: &ShipmentRecord, account_number: &str, account_country: &str) -> Value {
    let units = UnitSystem::for_country(account_country);
    let from = &record.ship_from;
    let to = &record.address;
    let summary = record.items_summary();
    let packages: Vec<Value> = record.items.iter().map(|item| package(item, units)).collect();

    json!({
        "ShipmentRequest": {
            "Request": {
                "SubVersion": "1801",
                "RequestOption": "nonvalidate",
                "TransactionReference": { "CustomerContext": record.customer_context },
            },
            "Shipment": {
                "Shipper": {
                    "Name": first_non_empty(&[&record.shipper_name], "Your Company"),
                    "ShipperNumber": account_number,
                    "Address": address_block(from, account_country),
                    "AttentionName": first_non_empty(
                        &[&from.attention_name, &from.name, &record.shipper_name],
                        "Shipping Dept",
                    ),
                    "Phone": { "Number": phone(&[&from.phone, &record.shipper_phone]) },
                },
                "ShipFrom": {
                    "Name": first_non_empty(&[&from.name, &record.shipper_name], "Your Company"),
                    "Address": address_block(from, account_country),
                    "AttentionName": first_non_empty(&[&from.attention_name, &from.name], "Warehouse"),
                    "Phone": { "Number": phone(&[&from.phone, &record.shipper_phone]) },
                },
                "ShipTo": {
                    "Name": to.name,
                    "Address": address_block(to, first_non_empty(&[&to.country_code], "US")),
                    "AttentionName": first_non_empty(&[&to.attention_name, &to.name], "Receiver"),
                    "Phone": { "Number": phone(&[&to.phone, &record.ship_to_phone]) },
                },
                "Description": first_non_empty(&[&record.description, &summary], "Merchandise"),
                "Service": {
                    "Code": "65",
                    "Description": first_non_empty(&[&record.service_description], "Ground"),
                },
                "PaymentInformation": {
                    "ShipmentCharge": {
                        "Type": "01",
                        "BillShipper": { "AccountNumber": account_number },
                    },
                },
                "Package": packages,
            },
            "LabelSpecification": {
                "LabelImageFormat": { "Code": "GIF", "Description": "GIF" },
                "HTTPUserAgent": "Mozilla/4.5",
            },
        }
    })
}

pub fn upload_request(document: &UploadDocument, encoded_file: &str, shipper_number: &str) -> Value {
    json!({
        "UploadRequest": {
            "Request": { "TransactionReference": { "CustomerContext": document.customer_context } },
            "UserCreatedForm": [{
                "UserCreatedFormFileName": document.file_name,
                "UserCreatedFormFileFormat": document.file_format,
                "UserCreatedFormDocumentType": document.document_type,
                "UserCreatedFormFile": encoded_file,
            }],
            "ShipperNumber": shipper_number,
        }
    })
}

pub fn push_request(push: &PushDocument) -> Value {
    json!({
        "PushToImageRepositoryRequest": {
            "Request": { "TransactionReference": { "CustomerContext": push.customer_context } },
            "FormsHistoryDocumentID": { "DocumentID": push.document_id },
            "ShipmentIdentifier": push.shipment_identifier,
            "ShipmentDateAndTime": push.shipment_date_time,
            "ShipmentType": "1",
            "TrackingNumber": push.tracking_number,
        }
    })
}

/// `ShipmentResponse.ShipmentResults.ShipmentIdentificationNumber`
pub fn shipment_number(response: &Value) -> Option<String> {
    response
        .pointer("/ShipmentResponse/ShipmentResults/ShipmentIdentificationNumber")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// `UploadResponse.FormsHistoryDocumentID.DocumentID`; the first entry when
/// the carrier returns a list.
pub fn document_id(response: &Value) -> Option<String> {
    let id = response.pointer("/UploadResponse/FormsHistoryDocumentID/DocumentID")?;
    let id = match id {
        Value::Array(ids) => ids.first()?,
        other => other,
    };
    match id {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record() -> ShipmentRecord {
        ShipmentRecord {
            shipper_name: "Acme".into(),
            ship_from: Address {
                address_line1: "1 Main St".into(),
                city: "Phoenix".into(),
                country_code: "us".into(),
                phone: "+1 (602) 555-0100".into(),
                ..Default::default()
            },
            address: Address {
                name: "Receiver GmbH".into(),
                city: "Berlin".into(),
                state: "BE".into(),
                postal_code: "10115".into(),
                country_code: "DE".into(),
                ..Default::default()
            },
            items: vec![
                LineItem {
                    description: "Resin".into(),
                    weight_kg: Some(2.0),
                    ..Default::default()
                },
                LineItem {
                    weight_lbs: Some(3.0),
                    length: Some(12.0),
                    ..Default::default()
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn unit_system_follows_account_country() {
        assert_eq!(UnitSystem::for_country("US"), UnitSystem::Imperial);
        assert_eq!(UnitSystem::for_country("pr"), UnitSystem::Imperial);
        assert_eq!(UnitSystem::for_country("DE"), UnitSystem::Metric);
    }

    #[test]
    fn weights_are_converted_into_the_account_unit() {
        let kg_only = LineItem {
            weight_kg: Some(1.0),
            ..Default::default()
        };
        let lbs_only = LineItem {
            weight_lbs: Some(1.0),
            ..Default::default()
        };
        assert_eq!(UnitSystem::Imperial.package_weight(&kg_only), 2.20462262);
        assert_eq!(UnitSystem::Metric.package_weight(&lbs_only), 0.45359237);
        assert_eq!(UnitSystem::Metric.package_weight(&LineItem::default()), 1.0);
    }

    #[test]
    fn phone_numbers_keep_at_most_fifteen_digits() {
        assert_eq!(phone_digits("+1 (602) 555-0100"), "16025550100");
        assert_eq!(phone_digits("1234567890123456789"), "123456789012345");
        assert_eq!(phone(&["", "n/a"]), DEFAULT_PHONE);
    }

    #[test]
    fn imperial_shipment_payload() {
        let record = record();
        let country = account_country(&record, None);
        assert_eq!(country, "US");

        let body = shipment_request(&record, "0AB297", &country);
        let shipment = &body["ShipmentRequest"]["Shipment"];

        assert_eq!(body["ShipmentRequest"]["Request"]["RequestOption"], "nonvalidate");
        assert_eq!(shipment["Service"]["Code"], "65");
        assert_eq!(shipment["Shipper"]["Phone"]["Number"], "16025550100");
        assert_eq!(shipment["Shipper"]["Address"]["AddressLine"], json!(["1 Main St"]));
        assert_eq!(shipment["Description"], "Resin x1; Item x1");

        // ship-to uses the caller's own state and postal code
        assert_eq!(shipment["ShipTo"]["Address"]["StateProvinceCode"], "BE");
        assert_eq!(shipment["ShipTo"]["Address"]["PostalCode"], "10115");
        assert_eq!(shipment["ShipTo"]["Address"]["CountryCode"], "DE");

        let packages = shipment["Package"].as_array().unwrap();
        assert_eq!(packages.len(), 2);
        assert_eq!(packages[0]["PackageWeight"]["UnitOfMeasurement"]["Code"], "LBS");
        assert_eq!(packages[0]["PackageWeight"]["Weight"], "4.40924524");
        assert_eq!(packages[0]["Dimensions"]["Length"], "4");
        assert_eq!(packages[1]["Dimensions"]["Length"], "12");
        assert_eq!(packages[1]["Description"], " ");
        assert_eq!(packages[1]["Packaging"]["Code"], "02");
    }

    #[test]
    fn configured_country_overrides_ship_from() {
        let record = record();
        let country = account_country(&record, Some("de"));
        let body = shipment_request(&record, "X", &country);
        let package = &body["ShipmentRequest"]["Shipment"]["Package"][0];
        assert_eq!(package["PackageWeight"]["Weight"], "2");
        assert_eq!(package["Dimensions"]["UnitOfMeasurement"]["Code"], "CM");
        assert_eq!(package["Dimensions"]["Width"], "10");
    }

    #[test]
    fn reads_ids_out_of_responses() {
        let shipped = json!({"ShipmentResponse": {"ShipmentResults": {"ShipmentIdentificationNumber": "1Z123"}}});
        assert_eq!(shipment_number(&shipped).as_deref(), Some("1Z123"));

        let uploaded = json!({"UploadResponse": {"FormsHistoryDocumentID": {"DocumentID": "2013-12-04-00.15.33.207814"}}});
        assert_eq!(document_id(&uploaded).as_deref(), Some("2013-12-04-00.15.33.207814"));

        let listed = json!({"UploadResponse": {"FormsHistoryDocumentID": {"DocumentID": ["A", "B"]}}});
        assert_eq!(document_id(&listed).as_deref(), Some("A"));
        assert_eq!(document_id(&json!({"UploadResponse": {}})), None);
    }

    #[test]
    fn push_request_carries_shipment_type_one() {
        let body = push_request(&PushDocument {
            document_id: "D1".into(),
            shipment_identifier: "1Z1".into(),
            tracking_number: "1Z1".into(),
            shipment_date_time: "2024-03-07-10.11.12".into(),
            customer_context: String::new(),
        });
        let request = &body["PushToImageRepositoryRequest"];
        assert_eq!(request["ShipmentType"], "1");
        assert_eq!(request["FormsHistoryDocumentID"]["DocumentID"], "D1");
        assert_eq!(request["ShipmentDateAndTime"], "2024-03-07-10.11.12");
    }
}
