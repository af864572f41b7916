//! Draws text fields on top of the pages of an existing PDF.

use std::path::{Path, PathBuf};

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use super::metrics::{encode_win_ansi, text_width};
use super::pages;
use crate::core::{DocumentError, DocumentResult};
use crate::models::{Origin, TextField};

pub const DEFAULT_X: f32 = 40.0;
/// Distance from the top edge used when a field has no `y`.
pub const DEFAULT_TOP_OFFSET: f32 = 40.0;
pub const DEFAULT_FONT_SIZE: f32 = 8.0;
pub const DEFAULT_LINE_HEIGHT: f32 = 10.0;

/// Resource name of the overlay font. Unlikely to clash with names the blank uses.
const FONT_RESOURCE: &str = "FStamp";

/// One line of text resolved to PDF user space.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub font_size: f32,
}

/// Stamps `fields` onto a copy of `blank` written to `out`.
pub fn stamp(blank: &Path, fields: &[TextField], out: &Path) -> DocumentResult<PathBuf> {
    if !blank.exists() {
        return Err(DocumentError::TemplateMissing(blank.to_path_buf()));
    }

    let mut doc = Document::load(blank)?;
    let page_ids = pages::page_ids(&doc);
    if page_ids.is_empty() {
        return Err(DocumentError::Pdf(format!("{} has no pages", blank.display())));
    }

    let mut per_page: Vec<Vec<PlacedLine>> = vec![Vec::new(); page_ids.len()];
    for field in fields {
        let index = field.page.min(page_ids.len() - 1);
        let [_, lly, _, ury] = pages::media_box(&doc, page_ids[index]);
        per_page[index].extend(field_lines(field, ury - lly));
    }

    let font_id = doc.add_object(helvetica());
    for (page_id, lines) in page_ids.iter().zip(&per_page) {
        if lines.is_empty() {
            continue;
        }
        register_font(&mut doc, *page_id, font_id)?;
        overlay_page(&mut doc, *page_id, &overlay_ops(lines))?;
    }

    doc.save(out)?;
    tracing::debug!(blank = %blank.display(), out = %out.display(), fields = fields.len(), "stamped");
    Ok(out.to_path_buf())
}

/// Resolves a field to the lines that will be drawn for it.
pub fn field_lines(field: &TextField, page_height: f32) -> Vec<PlacedLine> {
    let font_size = field.font_size.unwrap_or(DEFAULT_FONT_SIZE);
    let line_height = field.line_height.unwrap_or(DEFAULT_LINE_HEIGHT);
    let x = field.x.unwrap_or(DEFAULT_X);
    let y = match (field.y, field.origin) {
        (None, _) => page_height - DEFAULT_TOP_OFFSET,
        (Some(y), Origin::Bottom) => y,
        (Some(y), Origin::Top) => page_height - y,
    };

    let lines = match field.max_width {
        Some(width) if width > 0.0 => wrap_text(&field.text, width, font_size),
        _ if field.text.is_empty() => Vec::new(),
        _ => vec![field.text.clone()],
    };

    lines
        .into_iter()
        .enumerate()
        .map(|(i, text)| PlacedLine {
            text,
            x,
            y: y - i as f32 * line_height,
            font_size,
        })
        .collect()
}

/// Greedy word wrap by Helvetica advance widths. A word wider than
/// `max_width` gets a line of its own rather than being split.
pub fn wrap_text(text: &str, max_width: f32, font_size: f32) -> Vec<String> {
    let space = text_width(" ", font_size);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0.0;

    for word in text.split_whitespace() {
        let word_width = text_width(word, font_size);
        if current.is_empty() {
            current.push_str(word);
            current_width = word_width;
        } else if current_width + space + word_width <= max_width {
            current.push(' ');
            current.push_str(word);
            current_width += space + word_width;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_width = word_width;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn helvetica() -> Dictionary {
    let mut font = Dictionary::new();
    font.set("Type", Object::Name(b"Font".to_vec()));
    font.set("Subtype", Object::Name(b"Type1".to_vec()));
    font.set("BaseFont", Object::Name(b"Helvetica".to_vec()));
    font.set("Encoding", Object::Name(b"WinAnsiEncoding".to_vec()));
    font
}

/// Adds the overlay font to the page's own resources. Shared or inherited
/// resource dictionaries are copied, never edited in place.
fn register_font(doc: &mut Document, page_id: ObjectId, font_id: ObjectId) -> DocumentResult<()> {
    let mut resources = match pages::inherited(doc, page_id, b"Resources").and_then(|o| pages::resolve(doc, &o)) {
        Some(Object::Dictionary(dict)) => dict,
        _ => Dictionary::new(),
    };
    let mut fonts = match resources.get(b"Font").ok().and_then(|o| pages::resolve(doc, o)) {
        Some(Object::Dictionary(dict)) => dict,
        _ => Dictionary::new(),
    };
    fonts.set(FONT_RESOURCE, Object::Reference(font_id));
    resources.set("Font", Object::Dictionary(fonts));

    page_dict_mut(doc, page_id)?.set("Resources", Object::Dictionary(resources));
    Ok(())
}

/// Wraps the existing content in `q … Q` and appends `ops` after it.
fn overlay_page(doc: &mut Document, page_id: ObjectId, ops: &[u8]) -> DocumentResult<()> {
    let existing: Vec<Object> = match doc.get_dictionary(page_id)?.get(b"Contents").ok().cloned() {
        Some(Object::Array(items)) => items,
        Some(Object::Reference(id)) => match doc.get_object(id)? {
            Object::Array(items) => items.clone(),
            _ => vec![Object::Reference(id)],
        },
        _ => Vec::new(),
    };

    let contents = if existing.is_empty() {
        vec![Object::Reference(doc.add_object(Stream::new(Dictionary::new(), ops.to_vec())))]
    } else {
        let save = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        let mut restore_then_draw = b"Q\n".to_vec();
        restore_then_draw.extend_from_slice(ops);
        let overlay = doc.add_object(Stream::new(Dictionary::new(), restore_then_draw));

        let mut contents = Vec::with_capacity(existing.len() + 2);
        contents.push(Object::Reference(save));
        contents.extend(existing);
        contents.push(Object::Reference(overlay));
        contents
    };

    page_dict_mut(doc, page_id)?.set("Contents", Object::Array(contents));
    Ok(())
}

fn page_dict_mut(doc: &mut Document, page_id: ObjectId) -> DocumentResult<&mut Dictionary> {
    match doc.get_object_mut(page_id)? {
        Object::Dictionary(dict) => Ok(dict),
        _ => Err(DocumentError::Pdf(format!("page {:?} is not a dictionary", page_id))),
    }
}

fn overlay_ops(lines: &[PlacedLine]) -> Vec<u8> {
    let mut ops = b"0 0 0 rg\n".to_vec();
    for line in lines {
        ops.extend_from_slice(
            format!("BT\n/{} {} Tf\n{} {} Td\n(", FONT_RESOURCE, line.font_size, line.x, line.y).as_bytes(),
        );
        ops.extend(escape(&encode_win_ansi(&line.text)));
        ops.extend_from_slice(b") Tj\nET\n");
    }
    ops
}

fn escape(bytes: &[u8]) -> Vec<u8> {
    let mut escaped = Vec::with_capacity(bytes.len());
    for &b in bytes {
        if matches!(b, b'(' | b')' | b'\\') {
            escaped.push(b'\\');
        }
        escaped.push(b);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::pages::testing::{drawn_strings, page_labels, write_labeled_pdf};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn defaults_place_text_near_the_top_left() {
        let field = TextField {
            text: "hello".into(),
            ..Default::default()
        };
        let lines = field_lines(&field, 792.0);
        assert_eq!(
            lines,
            vec![PlacedLine {
                text: "hello".into(),
                x: 40.0,
                y: 752.0,
                font_size: 8.0
            }]
        );
    }

    #[test]
    fn top_origin_is_measured_down_from_the_top_edge() {
        let field = TextField::at("1Z", 240.0, 127.0).from_top().size(10.0);
        let lines = field_lines(&field, 792.0);
        assert_eq!(lines[0].y, 665.0);
        assert_eq!(lines[0].font_size, 10.0);
    }

    #[test]
    fn wrapped_lines_step_down_by_line_height() {
        let field = TextField::at("one two three four", 10.0, 500.0).wrapped(30.0, Some(12.0));
        let lines = field_lines(&field, 792.0);
        assert!(lines.len() > 1);
        for (i, line) in lines.iter().enumerate() {
            assert_eq!(line.y, 500.0 - 12.0 * i as f32);
        }
    }

    #[test]
    fn empty_text_draws_nothing() {
        assert!(field_lines(&TextField::at("", 1.0, 1.0), 792.0).is_empty());
    }

    #[test]
    fn overlong_words_get_their_own_line() {
        let lines = wrap_text("a supercalifragilistic b", 20.0, 8.0);
        assert_eq!(lines, vec!["a", "supercalifragilistic", "b"]);
    }

    #[test]
    fn escapes_pdf_string_delimiters() {
        assert_eq!(escape(b"a(b)c\\"), b"a\\(b\\)c\\\\".to_vec());
    }

    #[test]
    fn stamps_on_the_requested_page_and_keeps_original_content() {
        let dir = tempfile::tempdir().unwrap();
        let blank = write_labeled_pdf(dir.path(), "blank.pdf", 2, "B");
        let out = dir.path().join("out.pdf");

        let fields = vec![
            TextField::at("first", 10.0, 10.0),
            TextField::at("second", 10.0, 10.0).on_page(1),
            TextField::at("clamped", 10.0, 20.0).on_page(9),
        ];
        stamp(&blank, &fields, &out).unwrap();

        assert_eq!(page_labels(&out), vec!["B-1", "B-2"]);
        assert_eq!(drawn_strings(&out, 0), vec!["B-1", "first"]);
        assert_eq!(drawn_strings(&out, 1), vec!["B-2", "second", "clamped"]);
        // the blank itself is left alone
        assert_eq!(drawn_strings(&blank, 0), vec!["B-1"]);
    }

    #[test]
    fn stamped_page_declares_the_overlay_font() {
        let dir = tempfile::tempdir().unwrap();
        let blank = write_labeled_pdf(dir.path(), "blank.pdf", 1, "B");
        let out = dir.path().join("out.pdf");
        stamp(&blank, &[TextField::at("x", 1.0, 1.0)], &out).unwrap();

        let doc = Document::load(&out).unwrap();
        let page = pages::page_ids(&doc)[0];
        let resources = doc.get_dictionary(page).unwrap().get(b"Resources").unwrap().as_dict().unwrap();
        let fonts = resources.get(b"Font").unwrap().as_dict().unwrap();
        assert!(fonts.has(FONT_RESOURCE.as_bytes()));
    }

    #[test]
    fn missing_blank_is_reported_by_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.pdf");
        let err = stamp(&missing, &[], &dir.path().join("out.pdf")).unwrap_err();
        assert!(matches!(err, DocumentError::TemplateMissing(p) if p == missing));
    }

    proptest! {
        #[test]
        fn wrapping_respects_width_and_is_minimal(
            words in prop::collection::vec("[a-z]{1,6}", 1..30),
            max_width in 40.0f32..200.0,
        ) {
            let text = words.join(" ");
            let lines = wrap_text(&text, max_width, 8.0);

            // short words always fit, so no line may overflow
            for line in &lines {
                prop_assert!(text_width(line, 8.0) <= max_width + 1e-3);
            }
            // greedy: the first word of each line would not have fit on the previous one
            for pair in lines.windows(2) {
                let next_word = pair[1].split(' ').next().unwrap();
                let joined = format!("{} {}", pair[0], next_word);
                prop_assert!(text_width(&joined, 8.0) > max_width);
            }
            prop_assert_eq!(lines.join(" "), text);
        }
    }
}
