//! Generates every customs document for a shipment and hands each one to the carrier.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;

use crate::carrier::{payload, CarrierClient, CarrierError, CarrierResult, PushDocument, UploadDocument};
use crate::core::{AppConfig, DocumentError, DocumentResult};
use crate::metrics;
use crate::models::{DocumentArtifact, FormKind, FormResult, GenerationResponse, ShipmentRecord, TextField};
use crate::pdf::{composer, stamper, TableOptions, TableRenderer};
use crate::templates::mapper::{group_items, map_fields, MappingContext};

/// Outcome of generating one instance of a form.
type Generated = (Option<usize>, DocumentResult<DocumentArtifact>);

pub struct DocumentPipeline {
    config: Arc<AppConfig>,
    carrier: Arc<dyn CarrierClient>,
    renderer: Arc<dyn TableRenderer>,
}

impl DocumentPipeline {
    pub fn new(config: Arc<AppConfig>, carrier: Arc<dyn CarrierClient>, renderer: Arc<dyn TableRenderer>) -> Self {
        DocumentPipeline {
            config,
            carrier,
            renderer,
        }
    }

    /// Generates the invoice, Section 232 and TSCA forms in that order and
    /// uploads each one. Only a bad shipment number or a missing blank fails
    /// the whole request; everything else is reported per form.
    pub async fn generate_and_upload(
        &self,
        shipment_number: &str,
        record: ShipmentRecord,
    ) -> DocumentResult<GenerationResponse> {
        validate_shipment_number(shipment_number)?;
        let record = record.with_shipment_number(shipment_number);
        self.ensure_blanks()?;
        tokio::fs::create_dir_all(&self.config.output_dir).await?;

        let ctx = MappingContext::now();
        tracing::info!(
            shipment_number,
            items = record.items.len(),
            invoice_number = %ctx.invoice_number,
            "generating customs documents"
        );

        let mut upload_results = Vec::new();
        for kind in FormKind::ALL {
            for (sequence, generated) in self.generate(kind, &record, &ctx).await {
                let result = match generated {
                    Ok(artifact) => {
                        metrics::DOCUMENTS_GENERATED.with_label_values(&[&kind.to_string()]).inc();
                        self.deliver(&artifact, &record).await
                    }
                    Err(e) => {
                        metrics::GENERATION_FAILURES.with_label_values(&[&kind.to_string()]).inc();
                        tracing::error!("Failed to generate {} for {}: {}", kind, shipment_number, e);
                        FormResult::failed(kind, sequence, e)
                    }
                };
                upload_results.push(result);
            }
        }

        Ok(GenerationResponse {
            shipment_number: shipment_number.to_string(),
            upload_results,
        })
    }

    fn blank_path(&self, kind: FormKind) -> PathBuf {
        self.config.blanks_dir.join(kind.blank_file())
    }

    fn ensure_blanks(&self) -> DocumentResult<()> {
        for kind in FormKind::ALL {
            let blank = self.blank_path(kind);
            if !blank.exists() {
                return Err(DocumentError::TemplateMissing(blank));
            }
        }
        Ok(())
    }

    /// `<stem>_<shipment>.pdf`, or `<stem>_<shipment>_<n>.pdf` for numbered instances.
    fn output_path(&self, kind: FormKind, shipment_number: &str, suffix: Option<usize>) -> PathBuf {
        let name = match suffix {
            Some(n) => format!("{}_{}_{}.pdf", kind.stem(), shipment_number, n),
            None => format!("{}_{}.pdf", kind.stem(), shipment_number),
        };
        self.config.output_dir.join(name)
    }

    /// Kinds with an item capacity are split into several forms; the others
    /// produce one, with the item table spliced in when the kind carries one.
    async fn generate(&self, kind: FormKind, record: &ShipmentRecord, ctx: &MappingContext) -> Vec<Generated> {
        if let Some(capacity) = kind.item_capacity() {
            return self.split_forms(kind, capacity, record, ctx).await;
        }
        let generated = if kind.has_item_table() {
            self.with_item_table(kind, record, ctx).await
        } else {
            self.single_form(kind, record, ctx).await
        };
        vec![(None, generated)]
    }

    async fn single_form(&self, kind: FormKind, record: &ShipmentRecord, ctx: &MappingContext) -> DocumentResult<DocumentArtifact> {
        let out = self.output_path(kind, &record.shipment_number, None);
        let fields = map_fields(record, kind, ctx);
        stamp_blocking(self.blank_path(kind), fields, out.clone()).await?;
        Ok(artifact(kind, record, out, None))
    }

    /// Stamps the blank, then splices the rendered item table in after its
    /// first page.
    async fn with_item_table(&self, kind: FormKind, record: &ShipmentRecord, ctx: &MappingContext) -> DocumentResult<DocumentArtifact> {
        let artifact = self.single_form(kind, record, ctx).await?;
        if record.items.is_empty() {
            tracing::debug!("no line items, skipping the item table");
            return Ok(artifact);
        }

        let id = &record.shipment_number;
        let table = self.config.output_dir.join(format!("INVOICE_ITEMS_{}.pdf", id));
        let options = TableOptions::from(&self.config.render);
        self.renderer.render(&record.items, &options, &table).await?;

        let merged = self.config.output_dir.join(format!("{}_{}_MERGED.pdf", kind.stem(), id));
        let (base, insert, spliced) = (artifact.path.clone(), table.clone(), merged.clone());
        blocking(move || composer::insert_after(&base, &insert, 0, &spliced)).await?;
        tokio::fs::rename(&merged, &artifact.path).await?;

        tracing::info!("Item table merged into {}", artifact.path.display());
        Ok(artifact)
    }

    /// One form per group of at most `item_capacity` items. No items, no forms.
    async fn split_forms(
        &self,
        kind: FormKind,
        capacity: usize,
        record: &ShipmentRecord,
        ctx: &MappingContext,
    ) -> Vec<Generated> {
        let groups = group_items(&record.items, capacity);
        let numbered = groups.len() > 1;

        let mut generated = Vec::with_capacity(groups.len());
        for (i, group) in groups.into_iter().enumerate() {
            let sequence = numbered.then_some(i + 1);
            let out = self.output_path(kind, &record.shipment_number, sequence);
            let fields = map_fields(&record.with_items(group), kind, ctx);
            let blank = self.blank_path(kind);

            let stamped = {
                let out = out.clone();
                blocking(move || {
                    composer::copy(&blank, &out)?;
                    stamper::stamp(&out, &fields, &out)
                })
                .await
            };
            generated.push((sequence, stamped.map(|_| artifact(kind, record, out, sequence))));
        }
        generated
    }

    /// Uploads the artifact and, when the carrier hands back a document id,
    /// associates it with the shipment. Carrier failures are recorded on the
    /// result instead of being returned.
    async fn deliver(&self, artifact: &DocumentArtifact, record: &ShipmentRecord) -> FormResult {
        let mut result = FormResult::generated(artifact);
        match self.upload_and_push(artifact, record).await {
            Ok((upload, push)) => {
                result.upload_response = upload;
                result.push_response = push;
            }
            Err(e) => {
                metrics::UPLOAD_FAILURES.with_label_values(&[&artifact.kind.to_string()]).inc();
                tracing::warn!(document = %artifact.label(), error = %e, "carrier rejected document");
                result.error = Some(e.to_string());
            }
        }
        result
    }

    async fn upload_and_push(
        &self,
        artifact: &DocumentArtifact,
        record: &ShipmentRecord,
    ) -> CarrierResult<(Option<serde_json::Value>, Option<serde_json::Value>)> {
        let document = UploadDocument::from_artifact(artifact, &record.customer_context);
        let upload = self
            .bounded("document upload", self.carrier.upload_document(&document))
            .await?;

        let Some(document_id) = upload.as_ref().and_then(payload::document_id) else {
            return Ok((upload, None));
        };

        let push = PushDocument {
            document_id,
            shipment_identifier: artifact.shipment_number.clone(),
            tracking_number: record.tracking_number_or(&artifact.shipment_number),
            shipment_date_time: shipment_timestamp(),
            customer_context: record.customer_context.clone(),
        };
        let pushed = self
            .bounded("document association", self.carrier.push_document(&push))
            .await?;
        tracing::info!("Uploaded {} as {}", artifact.file_name(), push.document_id);
        Ok((upload, pushed))
    }

    async fn bounded<T>(&self, what: &str, call: impl Future<Output = CarrierResult<T>>) -> CarrierResult<T> {
        let limit = self.config.carrier.timeout;
        tokio::time::timeout(limit, call)
            .await
            .map_err(|_| CarrierError::Timeout(format!("{} exceeded {:?}", what, limit)))?
    }
}

fn artifact(kind: FormKind, record: &ShipmentRecord, path: PathBuf, sequence: Option<usize>) -> DocumentArtifact {
    DocumentArtifact {
        path,
        kind,
        shipment_number: record.shipment_number.clone(),
        sequence,
    }
}

/// Shipment numbers end up in file names, so only a conservative alphabet is accepted.
pub fn validate_shipment_number(shipment_number: &str) -> DocumentResult<()> {
    let valid = !shipment_number.is_empty()
        && shipment_number.len() <= 64
        && shipment_number
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(DocumentError::Validation(format!("invalid shipment number: {:?}", shipment_number)))
    }
}

/// Local time as `YYYY-MM-DD-HH.MM.SS`.
pub fn shipment_timestamp() -> String {
    Local::now().format("%Y-%m-%d-%H.%M.%S").to_string()
}

async fn blocking<T, F>(work: F) -> DocumentResult<T>
where
    F: FnOnce() -> DocumentResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await?
}

async fn stamp_blocking(blank: PathBuf, fields: Vec<TextField>, out: PathBuf) -> DocumentResult<PathBuf> {
    blocking(move || stamper::stamp(Path::new(&blank), &fields, &out)).await
}
