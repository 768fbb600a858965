//! Pure-Rust glyph reader. Behind feature `pure-pdf`.
//!
//! Walks each page content stream with `lopdf` and tracks just enough of the
//! text state (font, size, text line matrix, leading) to place every shown
//! character on a vertical position. Horizontal advance is not tracked, and
//! `cm` transforms are ignored.

#![cfg(feature = "pure-pdf")]

use std::collections::BTreeMap;

use crate::reader_pdf::PdfError;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId};
use section_model::GlyphChar;

const DEFAULT_PAGE_HEIGHT: f64 = 792.0;
const MAX_PARENT_DEPTH: usize = 32;

pub fn read_pdf_glyphs_pure(path: &str) -> Result<Vec<GlyphChar>, PdfError> {
    let doc = Document::load(path)
        .map_err(|err| PdfError::Open { path: path.to_string(), message: err.to_string() })?;

    let mut out = Vec::new();
    for (page_num, page_id) in doc.get_pages() {
        let height = page_height(&doc, page_id);
        let fonts = page_font_names(&doc, page_id);
        let bytes = doc
            .get_page_content(page_id)
            .map_err(|err| PdfError::Page { page: page_num, message: err.to_string() })?;
        let content = Content::decode(&bytes)
            .map_err(|err| PdfError::Page { page: page_num, message: err.to_string() })?;

        let mut state = TextState::new(page_num, height);
        for op in &content.operations {
            state.apply(op, &fonts, &mut out);
        }
    }
    tracing::debug!(path, glyphs = out.len(), "lopdf glyphs read");
    Ok(out)
}

struct TextState {
    page: u32,
    page_height: f64,
    font_name: String,
    font_size: f64,
    leading: f64,
    /// Text line matrix `[a b c d e f]`.
    tlm: [f64; 6],
}

const IDENTITY: [f64; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

impl TextState {
    fn new(page: u32, page_height: f64) -> Self {
        Self {
            page,
            page_height,
            font_name: String::new(),
            font_size: 0.0,
            leading: 0.0,
            tlm: IDENTITY,
        }
    }

    fn apply(&mut self, op: &Operation, fonts: &BTreeMap<Vec<u8>, String>, out: &mut Vec<GlyphChar>) {
        let nums: Vec<f64> = op.operands.iter().filter_map(number).collect();
        match op.operator.as_str() {
            "BT" => self.tlm = IDENTITY,
            "Tf" => {
                if let Some(Object::Name(name)) = op.operands.first() {
                    self.font_name = fonts
                        .get(name)
                        .cloned()
                        .unwrap_or_else(|| String::from_utf8_lossy(name).into_owned());
                }
                if let Some(size) = op.operands.get(1).and_then(number) {
                    self.font_size = size;
                }
            }
            "TL" => {
                if let Some(&l) = nums.first() { self.leading = l; }
            }
            "Tm" if nums.len() == 6 => {
                self.tlm = [nums[0], nums[1], nums[2], nums[3], nums[4], nums[5]];
            }
            "Td" if nums.len() == 2 => self.translate(nums[0], nums[1]),
            "TD" if nums.len() == 2 => {
                self.leading = -nums[1];
                self.translate(nums[0], nums[1]);
            }
            "T*" => self.next_line(),
            "Tj" => {
                if let Some(Object::String(bytes, _)) = op.operands.first() {
                    self.show(bytes, out);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = op.operands.first() {
                    for item in items {
                        if let Object::String(bytes, _) = item {
                            self.show(bytes, out);
                        }
                    }
                }
            }
            "'" => {
                self.next_line();
                if let Some(Object::String(bytes, _)) = op.operands.first() {
                    self.show(bytes, out);
                }
            }
            "\"" => {
                self.next_line();
                if let Some(Object::String(bytes, _)) = op.operands.get(2) {
                    self.show(bytes, out);
                }
            }
            _ => {}
        }
    }

    fn translate(&mut self, tx: f64, ty: f64) {
        let [a, b, c, d, e, f] = self.tlm;
        self.tlm = [a, b, c, d, tx * a + ty * c + e, tx * b + ty * d + f];
    }

    fn next_line(&mut self) {
        self.translate(0.0, -self.leading);
    }

    fn show(&self, bytes: &[u8], out: &mut Vec<GlyphChar>) {
        let [_, b, _, d, _, f] = self.tlm;
        let size = self.font_size * b.hypot(d);
        let top = self.page_height - (f + size);
        for ch in decode_pdf_string(bytes) {
            if ch.is_control() {
                continue;
            }
            out.push(GlyphChar::new(ch, top, size, self.font_name.clone(), self.page));
        }
    }
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

/// UTF-16BE when BOM-prefixed, otherwise one char per byte.
fn decode_pdf_string(bytes: &[u8]) -> Vec<char> {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks(2)
            .map(|pair| u16::from_be_bytes([pair[0], *pair.get(1).unwrap_or(&0)]))
            .collect();
        return char::decode_utf16(units)
            .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect();
    }
    bytes.iter().map(|&b| b as char).collect()
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

/// Look up `key` on the page dictionary, then up the `Parent` chain.
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current: &Dictionary = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_PARENT_DEPTH {
        if let Ok(value) = current.get(key) {
            return resolve(doc, value);
        }
        let parent = match current.get(b"Parent") {
            Ok(Object::Reference(id)) => *id,
            _ => return None,
        };
        current = doc.get_dictionary(parent).ok()?;
    }
    None
}

fn page_height(doc: &Document, page_id: ObjectId) -> f64 {
    match inherited(doc, page_id, b"MediaBox") {
        Some(Object::Array(items)) if items.len() == 4 => {
            let coords: Vec<f64> = items.iter().filter_map(|o| resolve(doc, o).and_then(number)).collect();
            if coords.len() == 4 { (coords[3] - coords[1]).abs() } else { DEFAULT_PAGE_HEIGHT }
        }
        _ => DEFAULT_PAGE_HEIGHT,
    }
}

/// Map font resource names (`F1`) to their `BaseFont` names.
fn page_font_names(doc: &Document, page_id: ObjectId) -> BTreeMap<Vec<u8>, String> {
    let mut out = BTreeMap::new();
    let Some(Object::Dictionary(resources)) = inherited(doc, page_id, b"Resources") else {
        return out;
    };
    let Some(Object::Dictionary(fonts)) = resources.get(b"Font").ok().and_then(|o| resolve(doc, o)) else {
        return out;
    };
    for (name, value) in fonts.iter() {
        if let Some(Object::Dictionary(font)) = resolve(doc, value) {
            if let Ok(Object::Name(base)) = font.get(b"BaseFont") {
                out.insert(name.clone(), String::from_utf8_lossy(base).into_owned());
            }
        }
    }
    out
}
