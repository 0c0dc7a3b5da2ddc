//! Batch response parsing
//!
//! A `getdb` response is an XML document whose root element carries a
//! `transactionId` attribute and contains zero or more `book` elements, each
//! with an `indeks` attribute. The download cycle only needs three facts from
//! it (the transaction id, how many books arrived, and the first book's
//! index), so parsing is a single streaming pass that never builds a tree.
//!
//! The same pass runs over persisted artifacts when the ledger re-extracts
//! the last batch's first index on resume: artifacts are verbatim response
//! bodies, so one parser serves both.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::{FetcherError, FetcherResult};

/// The facts the download cycle extracts from one `getdb` response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedBatch {
    /// `transactionId` attribute of the root element, if present.
    pub transaction_id: Option<String>,
    /// Number of `book` elements in the document, at any depth.
    pub book_count: usize,
    /// `indeks` attribute of the first `book` element. `None` when the batch
    /// is empty or the first book carries no index.
    pub first_index: Option<String>,
}

/// Parse a batch document.
///
/// Missing attributes are `None`, never errors; a document that is not
/// well-formed XML (or has no root element at all) is a [`FetcherError::ParseError`],
/// which the cycle treats as fatal for the run.
pub fn parse_batch(payload: &[u8]) -> FetcherResult<ParsedBatch> {
    let mut reader = Reader::from_reader(payload);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut transaction_id = None;
    let mut first_index = None;
    let mut book_count = 0usize;
    let mut saw_root = false;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| FetcherError::ParseError(format!("invalid XML: {e}")))?;
        match event {
            Event::Start(ref element) | Event::Empty(ref element) => {
                if !saw_root {
                    // The root never counts as a book itself; books are
                    // descendants of it.
                    saw_root = true;
                    transaction_id = attribute_value(element, b"transactionId")?;
                } else if element.local_name().as_ref() == b"book" {
                    book_count += 1;
                    if book_count == 1 {
                        first_index = attribute_value(element, b"indeks")?;
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err(FetcherError::ParseError(
            "document has no root element".to_string(),
        ));
    }

    Ok(ParsedBatch {
        transaction_id,
        book_count,
        first_index,
    })
}

/// Look up one attribute by name, unescaping its value.
fn attribute_value(element: &BytesStart<'_>, name: &[u8]) -> FetcherResult<Option<String>> {
    for attribute in element.attributes() {
        let attribute =
            attribute.map_err(|e| FetcherError::ParseError(format!("malformed attribute: {e}")))?;
        if attribute.key.as_ref() == name {
            let value = attribute.unescape_value().map_err(|e| {
                FetcherError::ParseError(format!("malformed attribute value: {e}"))
            })?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}
