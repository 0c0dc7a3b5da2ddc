//! XML element projection
//!
//! Converts `book` elements into JSON-like values for the export writers.
//! The conversion rules mirror the catalog's document shape:
//!
//! - attributes merge into a map
//! - child elements nest under their tag; repeated tags collect into a list
//! - a childless element collapses to its text content, or keeps the text
//!   under a `"text"` key when it also has attributes
//! - an element with children discards its own stray text

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};

use super::{OutputError, OutputResult};

/// Extract every `book` element in the document, in document order.
pub fn extract_books(payload: &[u8]) -> OutputResult<Vec<Value>> {
    let mut reader = Reader::from_reader(payload);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut books = Vec::new();
    loop {
        let event = reader.read_event_into(&mut buf).map_err(xml_error)?;
        match event {
            Event::Start(ref element) if element.local_name().as_ref() == b"book" => {
                books.push(element_to_value(&mut reader, element)?);
            }
            Event::Empty(ref element) if element.local_name().as_ref() == b"book" => {
                books.push(Value::Object(attributes_map(element)?));
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(books)
}

/// Convert one element (whose `Start` event has already been consumed) into
/// a value, reading up to and including its matching `End` event.
fn element_to_value(reader: &mut Reader<&[u8]>, start: &BytesStart<'_>) -> OutputResult<Value> {
    let mut map = attributes_map(start)?;
    let mut text = String::new();
    let mut has_children = false;

    let mut buf = Vec::new();
    loop {
        let event = reader.read_event_into(&mut buf).map_err(xml_error)?;
        match event {
            Event::Start(ref element) => {
                has_children = true;
                let tag = qualified_name(element);
                let child = element_to_value(reader, element)?;
                insert_child(&mut map, tag, child);
            }
            Event::Empty(ref element) => {
                has_children = true;
                let tag = qualified_name(element);
                let child = Value::Object(attributes_map(element)?);
                insert_child(&mut map, tag, child);
            }
            Event::Text(ref t) => {
                text.push_str(&t.unescape().map_err(xml_error)?);
            }
            Event::CData(t) => {
                text.push_str(&String::from_utf8_lossy(&t.into_inner()));
            }
            Event::End(_) => break,
            Event::Eof => {
                return Err(OutputError::XmlError(
                    "unexpected end of document inside element".to_string(),
                ))
            }
            _ => {}
        }
        buf.clear();
    }

    if !has_children && !text.is_empty() {
        if map.is_empty() {
            return Ok(Value::String(text));
        }
        map.insert("text".to_string(), Value::String(text));
    }
    Ok(Value::Object(map))
}

/// Merge a child value into its parent's map, grouping repeated tags into a
/// list.
fn insert_child(map: &mut Map<String, Value>, tag: String, child: Value) {
    match map.get_mut(&tag) {
        Some(Value::Array(items)) => items.push(child),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, child]);
        }
        None => {
            map.insert(tag, child);
        }
    }
}

fn attributes_map(element: &BytesStart<'_>) -> OutputResult<Map<String, Value>> {
    let mut map = Map::new();
    for attribute in element.attributes() {
        let attribute =
            attribute.map_err(|e| OutputError::XmlError(format!("malformed attribute: {e}")))?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .map_err(xml_error)?
            .into_owned();
        map.insert(key, Value::String(value));
    }
    Ok(map)
}

fn qualified_name(element: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(element.name().as_ref()).into_owned()
}

fn xml_error(e: quick_xml::Error) -> OutputError {
    OutputError::XmlError(e.to_string())
}
