//! Field positions for each blank form.
//!
//! Coordinates are PDF points measured on the blanks shipped in `BLANKS_DIR`.
//! Moving a box on a blank means editing a row here, nothing else.

use std::path::Path;

use crate::core::{DocumentError, DocumentResult};
use crate::models::{FormKind, Origin};
use crate::pdf::composer;

/// Logical values a form can print.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    RecipientName,
    RecipientStreet,
    RecipientCity,
    RecipientCountry,
    IssueDate,
    InvoiceNumber,
    ShipmentNumber,
    Subtotal,
    Discount,
    Freight,
    Insurance,
    Other,
    Total,
    ItemCount,
    TotalWeight,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub slot: Slot,
    pub x: f32,
    pub y: f32,
    pub page: usize,
}

macro_rules! at {
    ($slot:ident, $x:expr, $y:expr, $page:expr) => {
        Placement {
            slot: Slot::$slot,
            x: $x,
            y: $y,
            page: $page,
        }
    };
}

/// Position of one product row on a capacity-limited form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemRow {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct FormLayout {
    pub kind: FormKind,
    pub origin: Origin,
    pub font_size: Option<f32>,
    pub placements: &'static [Placement],
    pub item_rows: &'static [ItemRow],
    /// Product descriptions are cut to this many words to fit a row.
    pub item_words: usize,
}

const INVOICE_PLACEMENTS: &[Placement] = &[
    at!(RecipientName, 84.0, 512.0, 0),
    at!(RecipientStreet, 23.0, 500.0, 0),
    at!(RecipientCity, 23.0, 488.0, 0),
    at!(RecipientCountry, 23.0, 476.0, 0),
    at!(IssueDate, 333.0, 655.0, 0),
    at!(InvoiceNumber, 358.0, 645.0, 0),
    at!(Subtotal, 448.0, 690.0, 1),
    at!(Discount, 448.0, 676.0, 1),
    at!(Subtotal, 448.0, 662.0, 1),
    at!(Freight, 448.0, 649.0, 1),
    at!(Insurance, 448.0, 635.0, 1),
    at!(Other, 448.0, 622.0, 1),
    at!(Total, 448.0, 608.0, 1),
    at!(ShipmentNumber, 359.0, 712.0, 0),
    at!(TotalWeight, 448.0, 577.0, 1),
    at!(ItemCount, 448.0, 589.0, 1),
];

const SECTION_232_PLACEMENTS: &[Placement] = &[at!(IssueDate, 77.0, 690.0, 0)];

const TSCA_PLACEMENTS: &[Placement] = &[
    at!(ShipmentNumber, 240.0, 127.0, 0),
    at!(IssueDate, 327.0, 720.0, 0),
];

const TSCA_ROWS: &[ItemRow] = &[
    ItemRow { x: 50.0, y: 539.0 },
    ItemRow { x: 50.0, y: 554.0 },
    ItemRow { x: 50.0, y: 569.0 },
    ItemRow { x: 50.0, y: 584.0 },
];

pub const INVOICE_LAYOUT: FormLayout = FormLayout {
    kind: FormKind::CommercialInvoice,
    origin: Origin::Bottom,
    font_size: None,
    placements: INVOICE_PLACEMENTS,
    item_rows: &[],
    item_words: 0,
};

pub const SECTION_232_LAYOUT: FormLayout = FormLayout {
    kind: FormKind::Section232,
    origin: Origin::Bottom,
    font_size: None,
    placements: SECTION_232_PLACEMENTS,
    item_rows: &[],
    item_words: 0,
};

pub const TSCA_LAYOUT: FormLayout = FormLayout {
    kind: FormKind::Tsca,
    origin: Origin::Top,
    font_size: Some(10.0),
    placements: TSCA_PLACEMENTS,
    item_rows: TSCA_ROWS,
    item_words: 4,
};

pub fn layout(kind: FormKind) -> &'static FormLayout {
    match kind {
        FormKind::CommercialInvoice => &INVOICE_LAYOUT,
        FormKind::Section232 => &SECTION_232_LAYOUT,
        FormKind::Tsca => &TSCA_LAYOUT,
    }
}

impl FormLayout {
    /// Number of pages the blank must have for every placement to land where intended.
    pub fn required_pages(&self) -> usize {
        self.placements.iter().map(|p| p.page + 1).max().unwrap_or(1)
    }

    pub fn validate(&self, page_count: usize) -> DocumentResult<()> {
        if let Some(capacity) = self.kind.item_capacity() {
            if capacity != self.item_rows.len() {
                return Err(DocumentError::Validation(format!(
                    "{} layout has {} item rows but capacity {}",
                    self.kind,
                    self.item_rows.len(),
                    capacity
                )));
            }
        }

        let required = self.required_pages();
        if page_count < required {
            return Err(DocumentError::Validation(format!(
                "{} needs {} page(s) but the blank has {}",
                self.kind.blank_file(),
                required,
                page_count
            )));
        }
        Ok(())
    }
}

/// Checks every layout against its blank. Blanks that are not present are
/// skipped here; requests fail on them later with a template-missing error.
pub fn validate_blanks(blanks_dir: &Path) -> DocumentResult<Vec<FormKind>> {
    let mut checked = Vec::new();
    for kind in FormKind::ALL {
        let path = blanks_dir.join(kind.blank_file());
        if !path.exists() {
            tracing::warn!(blank = %path.display(), "blank template not found, skipping layout check");
            continue;
        }
        let pages = composer::page_count(&path)?;
        layout(kind).validate(pages)?;
        tracing::debug!(%kind, pages, "layout validated");
        checked.push(kind);
    }
    Ok(checked)
}
