//! Turns a shipment into the text stamped on each form.

use chrono::{Local, NaiveDate, Utc};
use rand::Rng;

use super::layout::{self, FormLayout, Slot};
use crate::models::common::format_amount;
use crate::models::{FormKind, LineItem, ResolvedTotals, ShipmentRecord, TextField};

/// The non-deterministic inputs of a mapping, fixed once per request.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingContext {
    pub issued_on: NaiveDate,
    pub invoice_number: String,
}

impl MappingContext {
    pub fn now() -> Self {
        let suffix: u16 = rand::thread_rng().gen_range(0..1000);
        MappingContext {
            issued_on: Local::now().date_naive(),
            invoice_number: format!("INV-{}-{}", Utc::now().timestamp_millis(), suffix),
        }
    }

    /// US-style date printed on every form.
    pub fn issue_date(&self) -> String {
        self.issued_on.format("%m/%d/%Y").to_string()
    }
}

pub fn map_fields(shipment: &ShipmentRecord, kind: FormKind, ctx: &MappingContext) -> Vec<TextField> {
    match kind {
        FormKind::CommercialInvoice => map_invoice(shipment, ctx),
        FormKind::Section232 => map_section_232(shipment, ctx),
        FormKind::Tsca => map_tsca(shipment, ctx),
    }
}

fn map_invoice(shipment: &ShipmentRecord, ctx: &MappingContext) -> Vec<TextField> {
    let totals = shipment.order.resolve();
    place(&layout::INVOICE_LAYOUT, |slot| slot_text(slot, shipment, &totals, ctx))
}

fn map_section_232(shipment: &ShipmentRecord, ctx: &MappingContext) -> Vec<TextField> {
    let totals = shipment.order.resolve();
    place(&layout::SECTION_232_LAYOUT, |slot| slot_text(slot, shipment, &totals, ctx))
}

/// Only the first rows' worth of items is placed; callers split larger
/// item lists into groups and map each group separately.
fn map_tsca(shipment: &ShipmentRecord, ctx: &MappingContext) -> Vec<TextField> {
    let layout = &layout::TSCA_LAYOUT;
    let totals = shipment.order.resolve();
    let mut fields = place(layout, |slot| slot_text(slot, shipment, &totals, ctx));

    for (row, item) in layout.item_rows.iter().zip(&shipment.items) {
        let field = TextField::at(short_description(item, layout.item_words), row.x, row.y);
        fields.push(styled(field, layout));
    }
    fields
}

fn place(layout: &FormLayout, value: impl Fn(Slot) -> String) -> Vec<TextField> {
    layout
        .placements
        .iter()
        .map(|p| styled(TextField::at(value(p.slot), p.x, p.y).on_page(p.page), layout))
        .collect()
}

fn styled(mut field: TextField, layout: &FormLayout) -> TextField {
    field.origin = layout.origin;
    field.font_size = layout.font_size;
    field
}

fn slot_text(slot: Slot, shipment: &ShipmentRecord, totals: &ResolvedTotals, ctx: &MappingContext) -> String {
    let address = &shipment.address;
    match slot {
        Slot::RecipientName => address.name.clone(),
        Slot::RecipientStreet => address.address_line1.clone(),
        Slot::RecipientCity => address.city.clone(),
        Slot::RecipientCountry => address.country_code.clone(),
        Slot::IssueDate => ctx.issue_date(),
        Slot::InvoiceNumber => ctx.invoice_number.clone(),
        Slot::ShipmentNumber => shipment.shipment_number.clone(),
        Slot::Subtotal => format_amount(totals.subtotal),
        Slot::Discount => format_amount(totals.discount),
        Slot::Freight => format_amount(totals.freight),
        Slot::Insurance => format_amount(totals.insurance),
        Slot::Other => format_amount(totals.other),
        Slot::Total => format_amount(totals.total),
        Slot::ItemCount => match shipment.items.len() {
            0 => String::new(),
            n => n.to_string(),
        },
        Slot::TotalWeight => shipment
            .order
            .weight
            .filter(|w| *w != 0.0)
            .map(format_amount)
            .unwrap_or_default(),
    }
}

fn short_description(item: &LineItem, words: usize) -> String {
    item.label().split_whitespace().take(words).collect::<Vec<_>>().join(" ")
}

/// Splits items into consecutive groups of at most `capacity`, keeping order.
pub fn group_items(items: &[LineItem], capacity: usize) -> Vec<&[LineItem]> {
    items.chunks(capacity.max(1)).collect()
}
