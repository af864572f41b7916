#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use customs_docs::carrier::{CarrierClient, CarrierError, CarrierResult, PushDocument, UploadDocument};
use customs_docs::core::{AppConfig, DocumentError, DocumentResult};
use customs_docs::pdf::renderer::paginate;
use customs_docs::pdf::{TableOptions, TableRenderer};
use customs_docs::{FormKind, LineItem, ShipmentCreated, ShipmentRecord};
use lopdf::{Dictionary, Document, Object, Stream};
use serde_json::Value;

/// A PDF whose page `n` draws `{prefix}-{n}`.
pub fn labeled_pdf(pages: usize, prefix: &str) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for n in 1..=pages {
        let content = format!("BT /F1 12 Tf 50 700 Td ({}-{}) Tj ET", prefix, n);
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

        let mut page = Dictionary::new();
        page.set("Type", Object::Name(b"Page".to_vec()));
        page.set("Parent", Object::Reference(pages_id));
        page.set("Contents", Object::Reference(content_id));
        let media_box = [0, 0, 612, 792].into_iter().map(Object::Integer).collect();
        page.set("MediaBox", Object::Array(media_box));
        kids.push(Object::Reference(doc.add_object(page)));
    }

    let mut pages_dict = Dictionary::new();
    pages_dict.set("Type", Object::Name(b"Pages".to_vec()));
    pages_dict.set("Count", Object::Integer(pages as i64));
    pages_dict.set("Kids", Object::Array(kids));
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", Object::Reference(catalog_id));
    doc
}

pub fn write_pdf(path: &Path, pages: usize, prefix: &str) {
    labeled_pdf(pages, prefix).save(path).unwrap();
}

/// Invoice blank with two pages, one-page 232 and TSCA blanks.
pub fn write_blanks(dir: &Path) {
    write_pdf(&dir.join(FormKind::CommercialInvoice.blank_file()), 2, "INV");
    write_pdf(&dir.join(FormKind::Section232.blank_file()), 1, "S232");
    write_pdf(&dir.join(FormKind::Tsca.blank_file()), 1, "TSCA");
}

pub struct Workspace {
    pub dir: tempfile::TempDir,
    pub config: Arc<AppConfig>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// Carrier calls slower than `timeout` are abandoned.
    pub fn with_carrier_timeout(timeout: Duration) -> Self {
        Self::with_config(|config| config.carrier.timeout = timeout)
    }

    fn with_config(adjust: impl FnOnce(&mut AppConfig)) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let blanks = dir.path().join("blanks");
        std::fs::create_dir_all(&blanks).unwrap();
        write_blanks(&blanks);

        let mut config = AppConfig {
            blanks_dir: blanks,
            output_dir: dir.path().join("out"),
            ..Default::default()
        };
        adjust(&mut config);
        Workspace {
            dir,
            config: Arc::new(config),
        }
    }

    pub fn output(&self, name: &str) -> PathBuf {
        self.config.output_dir.join(name)
    }
}

/// The label of every page in order, read from the first string drawn on it.
pub fn page_labels(path: &Path) -> Vec<String> {
    let doc = Document::load(path).unwrap();
    doc.get_pages()
        .into_values()
        .map(|id| {
            let content = String::from_utf8_lossy(&doc.get_page_content(id).unwrap()).into_owned();
            content
                .split('(')
                .nth(1)
                .and_then(|rest| rest.split(')').next())
                .unwrap_or_default()
                .to_string()
        })
        .collect()
}

/// Every string drawn on the given page.
pub fn drawn_strings(path: &Path, page: usize) -> Vec<String> {
    let doc = Document::load(path).unwrap();
    let id = doc.get_pages().into_values().nth(page).unwrap();
    let content = String::from_utf8_lossy(&doc.get_page_content(id).unwrap()).into_owned();
    content
        .split("Tj")
        .filter_map(|segment| {
            let start = segment.rfind('(')?;
            let end = segment.rfind(')')?;
            (start < end).then(|| segment[start + 1..end].to_string())
        })
        .collect()
}

pub fn items(n: usize) -> Vec<LineItem> {
    (0..n)
        .map(|i| LineItem {
            description: format!("Product {} industrial solvent blend", i),
            quantity: Some(1.0),
            weight_kg: Some(0.5),
            ..Default::default()
        })
        .collect()
}

pub fn shipment(item_count: usize) -> ShipmentRecord {
    let mut record: ShipmentRecord = serde_json::from_value(serde_json::json!({
        "customerContext": "order-42",
        "address": {
            "name": "Receiver GmbH",
            "addressLine1": "Hauptstr. 1",
            "city": "Berlin",
            "countryCode": "DE"
        },
        "order": { "subtotal": 100, "discount": "10", "freight": 5, "insurance": 2, "others": 1 }
    }))
    .unwrap();
    record.items = items(item_count);
    record
}

/// Writes one labelled page per table page instead of launching a browser.
#[derive(Default)]
pub struct TableStub {
    pub calls: AtomicUsize,
}

#[async_trait]
impl TableRenderer for TableStub {
    async fn render(&self, items: &[LineItem], options: &TableOptions, out: &Path) -> DocumentResult<PathBuf> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let pages = paginate(items, options.rows_per_page).len();
        write_pdf(out, pages, "T");
        Ok(out.to_path_buf())
    }
}

pub struct BrokenRenderer;

#[async_trait]
impl TableRenderer for BrokenRenderer {
    async fn render(&self, _: &[LineItem], _: &TableOptions, _: &Path) -> DocumentResult<PathBuf> {
        Err(DocumentError::Render("chrome exited".into()))
    }
}

/// Authenticates fine but rejects every upload.
pub struct RejectingCarrier;

#[async_trait]
impl CarrierClient for RejectingCarrier {
    async fn access_token(&self) -> CarrierResult<Option<String>> {
        Ok(Some("token".into()))
    }

    async fn create_shipment(&self, _: &ShipmentRecord) -> CarrierResult<ShipmentCreated> {
        Err(CarrierError::Http {
            status: 400,
            body: "{\"code\":\"120100\"}".into(),
        })
    }

    async fn upload_document(&self, _: &UploadDocument) -> CarrierResult<Option<Value>> {
        Err(CarrierError::Http {
            status: 500,
            body: "upstream unavailable".into(),
        })
    }

    async fn push_document(&self, _: &PushDocument) -> CarrierResult<Option<Value>> {
        unreachable!("nothing was uploaded")
    }
}

/// Answers every upload long after any sensible deadline.
pub struct StalledCarrier {
    pub delay: Duration,
}

#[async_trait]
impl CarrierClient for StalledCarrier {
    async fn access_token(&self) -> CarrierResult<Option<String>> {
        Ok(Some("token".into()))
    }

    async fn create_shipment(&self, _: &ShipmentRecord) -> CarrierResult<ShipmentCreated> {
        tokio::time::sleep(self.delay).await;
        Err(CarrierError::Timeout("create shipment".into()))
    }

    async fn upload_document(&self, _: &UploadDocument) -> CarrierResult<Option<Value>> {
        tokio::time::sleep(self.delay).await;
        Ok(Some(serde_json::json!({ "late": true })))
    }

    async fn push_document(&self, _: &PushDocument) -> CarrierResult<Option<Value>> {
        unreachable!("no upload finishes in time")
    }
}
