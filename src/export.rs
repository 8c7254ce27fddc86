//! Streaming reader for quantity records in a health export document
//!
//! The export is one large XML document whose interesting content is flat
//! `<Record .../>` elements carrying everything as attributes. The reader
//! makes a single forward pass, captures only `Record` open tags whose
//! `type` attribute matches the configured quantity type, and never
//! materializes the rest of the document. Attribute values are entity-decoded
//! so downstream sees the text the exporter meant.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use thiserror::Error;

use crate::record::RawRecord;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("read error: {0}")]
    Io(#[from] io::Error),
    #[error("unterminated element at end of document")]
    UnterminatedElement,
    #[error("malformed attribute near {0:?}")]
    MalformedAttribute(String),
}

/// Streaming iterator over the matching records of one export document.
pub struct ExportReader<R: Read> {
    bytes: io::Bytes<R>,
    quantity_type: String,
    done: bool,
}

impl ExportReader<BufReader<File>> {
    /// Open an export file for scanning.
    pub fn open(path: &Path, quantity_type: &str) -> Result<Self, ExportError> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file), quantity_type))
    }
}

impl<R: Read> ExportReader<R> {
    pub fn new(input: R, quantity_type: &str) -> Self {
        Self {
            bytes: input.bytes(),
            quantity_type: quantity_type.to_string(),
            done: false,
        }
    }

    fn next_byte(&mut self) -> Result<Option<u8>, ExportError> {
        match self.bytes.next() {
            Some(Ok(byte)) => Ok(Some(byte)),
            Some(Err(err)) => Err(ExportError::Io(err)),
            None => Ok(None),
        }
    }

    /// Skip a comment body; the leading `<!--` has already been consumed.
    fn skip_comment(&mut self) -> Result<(), ExportError> {
        let mut tail = [0u8; 2];
        loop {
            match self.next_byte()? {
                None => return Err(ExportError::UnterminatedElement),
                Some(b'>') if tail == *b"--" => return Ok(()),
                Some(byte) => tail = [tail[1], byte],
            }
        }
    }

    /// Skip to the end of a tag, honoring quoted attribute values (a `>`
    /// inside quotes does not close the tag).
    fn skip_tag(&mut self) -> Result<(), ExportError> {
        let mut quote: Option<u8> = None;
        loop {
            match self.next_byte()? {
                None => return Err(ExportError::UnterminatedElement),
                Some(byte) => match quote {
                    Some(q) if byte == q => quote = None,
                    Some(_) => {}
                    None if byte == b'"' || byte == b'\'' => quote = Some(byte),
                    None if byte == b'>' => return Ok(()),
                    None => {}
                },
            }
        }
    }

    /// Capture a tag body up to its closing `>`, quote-aware.
    fn capture_tag(&mut self) -> Result<String, ExportError> {
        let mut body = Vec::new();
        let mut quote: Option<u8> = None;
        loop {
            match self.next_byte()? {
                None => return Err(ExportError::UnterminatedElement),
                Some(byte) => {
                    match quote {
                        Some(q) if byte == q => quote = None,
                        Some(_) => {}
                        None if byte == b'"' || byte == b'\'' => quote = Some(byte),
                        None if byte == b'>' => {
                            return Ok(String::from_utf8_lossy(&body).into_owned())
                        }
                        None => {}
                    }
                    body.push(byte);
                }
            }
        }
    }

    /// Advance to the next `Record` open tag and return its attribute text
    /// (everything between the tag name and the closing `>`), or `None` at
    /// end of document.
    fn next_record_body(&mut self) -> Result<Option<String>, ExportError> {
        loop {
            // Scan forward to the next tag.
            loop {
                match self.next_byte()? {
                    None => return Ok(None),
                    Some(b'<') => break,
                    Some(_) => {}
                }
            }

            // Classify by the first byte after '<'.
            let first = match self.next_byte()? {
                None => return Err(ExportError::UnterminatedElement),
                Some(byte) => byte,
            };
            match first {
                b'!' => {
                    // Comment or declaration. Comments may contain '>'.
                    let second = self.next_byte()?;
                    let third = self.next_byte()?;
                    if second == Some(b'-') && third == Some(b'-') {
                        self.skip_comment()?;
                    } else if second != Some(b'>') && third != Some(b'>') {
                        self.skip_tag()?;
                    }
                    continue;
                }
                b'?' | b'/' => {
                    self.skip_tag()?;
                    continue;
                }
                _ => {}
            }

            // Element name, then either attributes or an immediate close.
            let mut name = vec![first];
            let mut closed = false;
            loop {
                match self.next_byte()? {
                    None => return Err(ExportError::UnterminatedElement),
                    Some(b'>') => {
                        closed = true;
                        break;
                    }
                    Some(byte) if byte.is_ascii_whitespace() || byte == b'/' => break,
                    Some(byte) => name.push(byte),
                }
            }

            if name != b"Record" {
                if !closed {
                    self.skip_tag()?;
                }
                continue;
            }

            if closed {
                return Ok(Some(String::new()));
            }
            return self.capture_tag().map(Some);
        }
    }
}

impl<R: Read> Iterator for ExportReader<R> {
    type Item = Result<RawRecord, ExportError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let body = match self.next_record_body() {
                Ok(Some(body)) => body,
                Ok(None) => {
                    self.done = true;
                    return None;
                }
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            };
            let attrs = match parse_attributes(&body) {
                Ok(attrs) => attrs,
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            };
            let record_type = attrs
                .iter()
                .find(|(key, _)| key == "type")
                .map(|(_, value)| value.as_str());
            if record_type != Some(self.quantity_type.as_str()) {
                continue;
            }
            return Some(Ok(record_from_attrs(attrs)));
        }
    }
}

/// Parse `key="value"` pairs out of a tag body. A trailing `/` from a
/// self-closing tag is ignored.
fn parse_attributes(body: &str) -> Result<Vec<(String, String)>, ExportError> {
    let mut attrs = Vec::new();
    let mut rest = body.trim_start();

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix('/') {
            rest = after.trim_start();
            continue;
        }
        let eq = rest
            .find('=')
            .ok_or_else(|| ExportError::MalformedAttribute(rest.to_string()))?;
        let key = rest[..eq].trim_end().to_string();
        rest = rest[eq + 1..].trim_start();

        let quote = rest
            .chars()
            .next()
            .filter(|c| *c == '"' || *c == '\'')
            .ok_or_else(|| ExportError::MalformedAttribute(rest.to_string()))?;
        let after_quote = &rest[1..];
        let close = after_quote
            .find(quote)
            .ok_or_else(|| ExportError::MalformedAttribute(rest.to_string()))?;

        attrs.push((key, unescape(&after_quote[..close])));
        rest = after_quote[close + 1..].trim_start();
    }

    Ok(attrs)
}

/// Decode the predefined XML entities plus numeric character references.
/// Unknown entities are left as written.
fn unescape(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        let Some(semi) = rest.find(';') else {
            break;
        };
        match &rest[1..semi] {
            "lt" => out.push('<'),
            "gt" => out.push('>'),
            "amp" => out.push('&'),
            "quot" => out.push('"'),
            "apos" => out.push('\''),
            entity => {
                let decoded = entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32);
                match decoded {
                    Some(c) => out.push(c),
                    None => out.push_str(&rest[..=semi]),
                }
            }
        }
        rest = &rest[semi + 1..];
    }
    out.push_str(rest);
    out
}

/// Build a raw record from an attribute list. Absent fields stay empty,
/// except `value` which defaults to `"0"`.
fn record_from_attrs(attrs: Vec<(String, String)>) -> RawRecord {
    let mut record = RawRecord {
        value: "0".to_string(),
        ..RawRecord::default()
    };
    for (key, value) in attrs {
        match key.as_str() {
            "startDate" => record.start_date = value,
            "endDate" => record.end_date = value,
            "creationDate" => record.creation_date = value,
            "value" => record.value = value,
            "unit" => record.unit = value,
            "sourceName" => record.source_name = value,
            "sourceVersion" => record.source_version = value,
            "device" => record.device = value,
            _ => {}
        }
    }
    record
}
