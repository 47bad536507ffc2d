//! Text form of marshalled values.
//!
//! The layout matches the backing store driver's serializer, so a fragment
//! spliced into a query reads the same as one the driver would produce:
//!
//! ```text
//! { "name" : "Alice" , "tags" : [ "a" , "b"] , "_id" : { "$oid" : "47cc67093475061e3d95369d"}}
//! ```

use crate::common::{Value, OID};
use crate::document::Document;
use itertools::Itertools;
use std::fmt::Write;

/// Renders any value in fragment text form.
pub fn to_fragment(value: &Value) -> String {
    let mut out = String::new();
    write_fragment(value, &mut out);
    out
}

pub fn document_fragment(doc: &Document) -> String {
    let mut out = String::new();
    write_document(doc, &mut out);
    out
}

pub fn write_fragment(value: &Value, out: &mut String) {
    match value {
        Value::Char(c) => write_json_string(&c.to_string(), out),
        Value::String(s) => write_json_string(s, out),
        Value::Document(doc) => write_document(doc, out),
        Value::Array(items) => write_array(items.iter().map(to_fragment), out),
        Value::Bytes(bytes) => write_array(bytes.iter().map(|b| b.to_string()), out),
        Value::Map(map) => {
            if map.is_empty() {
                out.push_str("{ }");
                return;
            }
            out.push_str("{ ");
            let body = map
                .iter()
                .map(|(k, v)| {
                    let key = match k {
                        Value::String(s) => s.clone(),
                        Value::Char(c) => c.to_string(),
                        other => to_fragment(other),
                    };
                    let mut entry = String::new();
                    write_json_string(&key, &mut entry);
                    entry.push_str(" : ");
                    write_fragment(v, &mut entry);
                    entry
                })
                .join(" , ");
            out.push_str(&body);
            out.push('}');
        }
        Value::ObjectId(id) => {
            let _ = write!(out, "{{ \"{}\" : \"{}\"}}", OID, id.to_hex());
        }
        other => {
            if let Some(literal) = scalar_literal(other) {
                out.push_str(&literal);
            }
        }
    }
}

/// Canonical literal text of null, booleans and numbers.
///
/// Floats always carry a decimal point, also in exponent form (`1.0e-7`), so
/// they read back as floats. Non-finite floats are written `NaN`, `Infinity`
/// and `-Infinity`.
pub fn scalar_literal(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => "null".to_string(),
        Value::Bool(v) => v.to_string(),
        Value::I8(v) => v.to_string(),
        Value::U8(v) => v.to_string(),
        Value::I16(v) => v.to_string(),
        Value::U16(v) => v.to_string(),
        Value::I32(v) => v.to_string(),
        Value::U32(v) => v.to_string(),
        Value::I64(v) => v.to_string(),
        Value::U64(v) => v.to_string(),
        Value::I128(v) => v.to_string(),
        Value::U128(v) => v.to_string(),
        Value::ISize(v) => v.to_string(),
        Value::USize(v) => v.to_string(),
        Value::F32(v) => float_literal(*v as f64, format!("{:?}", v)),
        Value::F64(v) => float_literal(*v, format!("{:?}", v)),
        _ => return None,
    };
    Some(text)
}

fn float_literal(v: f64, debug: String) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v.is_infinite() {
        if v > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if debug.contains('.') {
        debug
    } else {
        match debug.find('e') {
            Some(exponent) => format!("{}.0{}", &debug[..exponent], &debug[exponent..]),
            None => format!("{}.0", debug),
        }
    }
}

fn write_document(doc: &Document, out: &mut String) {
    if doc.is_empty() {
        out.push_str("{ }");
        return;
    }

    out.push_str("{ ");
    let body = doc
        .iter()
        .map(|(k, v)| {
            let mut entry = String::new();
            write_json_string(k, &mut entry);
            entry.push_str(" : ");
            write_fragment(v, &mut entry);
            entry
        })
        .join(" , ");
    out.push_str(&body);
    out.push('}');
}

fn write_array(mut items: impl Iterator<Item = String>, out: &mut String) {
    let body = items.join(" , ");
    if body.is_empty() {
        out.push_str("[ ]");
    } else {
        out.push_str("[ ");
        out.push_str(&body);
        out.push(']');
    }
}

/// Writes `s` as a double-quoted JSON string.
pub fn write_json_string(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0C}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}
