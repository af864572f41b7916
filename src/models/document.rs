use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// The customs documents this service knows how to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FormKind {
    /// Commercial invoice with the paginated item table spliced in.
    CommercialInvoice,
    /// Section 232 steel/aluminium declaration.
    #[serde(rename = "SECTION_232")]
    Section232,
    /// TSCA chemical certification, at most four products per form.
    Tsca,
}

impl FormKind {
    /// Generation order within a request.
    pub const ALL: [FormKind; 3] = [FormKind::CommercialInvoice, FormKind::Section232, FormKind::Tsca];

    pub fn blank_file(&self) -> &'static str {
        match self {
            FormKind::CommercialInvoice => "INVOICES_BLANK.pdf",
            FormKind::Section232 => "232_FORM_BLANK.pdf",
            FormKind::Tsca => "TSCA_BLANK.pdf",
        }
    }

    /// File stem shared by every output generated from this kind's blank.
    pub fn stem(&self) -> &'static str {
        self.blank_file().trim_end_matches(".pdf")
    }

    /// Maximum number of line items one instance of the form can carry.
    pub fn item_capacity(&self) -> Option<usize> {
        match self {
            FormKind::Tsca => Some(4),
            FormKind::CommercialInvoice | FormKind::Section232 => None,
        }
    }

    pub fn has_item_table(&self) -> bool {
        matches!(self, FormKind::CommercialInvoice)
    }

    /// Paperless-documents type code; all of these are user-created forms.
    pub fn document_type(&self) -> &'static str {
        "013"
    }
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormKind::CommercialInvoice => write!(f, "COMMERCIAL_INVOICE"),
            FormKind::Section232 => write!(f, "SECTION_232"),
            FormKind::Tsca => write!(f, "TSCA"),
        }
    }
}

/// A generated PDF, ready to be handed to the carrier.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentArtifact {
    pub path: PathBuf,
    pub kind: FormKind,
    pub shipment_number: String,
    /// 1-based instance number when the kind was split across several forms.
    pub sequence: Option<usize>,
}

impl DocumentArtifact {
    /// Human-readable label used in responses and logs, e.g. `TSCA_BLANK.pdf (Form 2)`.
    pub fn label(&self) -> String {
        match self.sequence {
            Some(n) => format!("{} (Form {})", self.kind.blank_file(), n),
            None => self.kind.blank_file().to_string(),
        }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// One entry of the generate-and-upload response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormResult {
    pub template: String,
    pub form_kind: FormKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_response: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_response: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FormResult {
    pub fn generated(artifact: &DocumentArtifact) -> Self {
        FormResult {
            template: artifact.label(),
            form_kind: artifact.kind,
            sequence: artifact.sequence,
            output_path: Some(artifact.path.clone()),
            upload_response: None,
            push_response: None,
            error: None,
        }
    }

    pub fn failed(kind: FormKind, sequence: Option<usize>, error: impl fmt::Display) -> Self {
        let template = match sequence {
            Some(n) => format!("{} (Form {})", kind.blank_file(), n),
            None => kind.blank_file().to_string(),
        };
        FormResult {
            template,
            form_kind: kind,
            sequence,
            output_path: None,
            upload_response: None,
            push_response: None,
            error: Some(error.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    pub shipment_number: String,
    pub upload_results: Vec<FormResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentCreated {
    pub shipment_number: Option<String>,
    pub raw: serde_json::Value,
}
