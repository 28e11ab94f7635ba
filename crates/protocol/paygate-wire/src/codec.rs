//! Envelope encoding and decoding.

use paygate_types::{constants::XML_ROOT, FieldMap};
use quick_xml::events::{BytesCData, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{WireError, WireResult};

/// Prefix that marks a provider XML envelope in endpoints that otherwise
/// return raw report bodies.
const ENVELOPE_PREFIX: &[u8] = b"<xml>";

// =============================================================================
// Encoding
// =============================================================================

/// Encode a field mapping as a `<xml>` envelope.
///
/// Fields are written in canonical order. Values made only of ASCII digits
/// are plain text; all others are CDATA.
pub fn encode(fields: &FieldMap) -> WireResult<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());
    write(&mut writer, Event::Start(BytesStart::new(XML_ROOT)))?;

    for (name, value) in fields.iter() {
        if !is_valid_name(name) {
            return Err(WireError::InvalidFieldName(name.to_string()));
        }
        write(&mut writer, Event::Start(BytesStart::new(name)))?;
        if is_numeric(value) {
            write(&mut writer, Event::Text(BytesText::new(value)))?;
        } else {
            write_cdata(&mut writer, value)?;
        }
        write(&mut writer, Event::End(BytesEnd::new(name)))?;
    }

    write(&mut writer, Event::End(BytesEnd::new(XML_ROOT)))?;
    Ok(writer.into_inner())
}

/// Render a field mapping as `k1=v1&k2=v2`, in canonical order, without
/// percent-encoding. Used for QR-code payment URLs.
pub fn to_query_string(fields: &FieldMap) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Whether a raw body is a provider XML envelope rather than report content.
pub fn is_xml_envelope(body: &[u8]) -> bool {
    body.starts_with(ENVELOPE_PREFIX)
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> WireResult<()> {
    writer
        .write_event(event)
        .map_err(|e| WireError::Encode(e.to_string()))
}

/// CDATA cannot contain `]]>`; split the value so each section stays valid.
fn write_cdata(writer: &mut Writer<Vec<u8>>, value: &str) -> WireResult<()> {
    let mut rest = value;
    while let Some(pos) = rest.find("]]>") {
        write(writer, Event::CData(BytesCData::new(&rest[..pos + 2])))?;
        rest = &rest[pos + 2..];
    }
    write(writer, Event::CData(BytesCData::new(rest)))
}

/// Field names are restricted to `[A-Za-z_][A-Za-z0-9_.-]*`.
fn is_valid_name(name: &str) -> bool {
    let mut bytes = name.bytes();
    match bytes.next() {
        Some(first) if first.is_ascii_alphabetic() || first == b'_' => {}
        _ => return false,
    }
    bytes.all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'-'))
}

fn is_numeric(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

// =============================================================================
// Decoding
// =============================================================================

enum State {
    BeforeRoot,
    InRoot,
    InField { name: String, value: String },
    AfterRoot,
}

/// Decode a `<xml>` envelope into a field mapping.
///
/// The root element name is not checked; every child of it becomes one
/// field. Empty elements decode to empty strings. Field text is kept
/// verbatim; only whitespace between elements is skipped.
pub fn decode(bytes: &[u8]) -> WireResult<FieldMap> {
    let text = std::str::from_utf8(bytes).map_err(|_| WireError::InvalidUtf8)?;
    let mut reader = Reader::from_str(text);

    let mut fields = FieldMap::new();
    let mut state = State::BeforeRoot;

    loop {
        let event = reader.read_event()?;
        state = match (state, event) {
            (_, Event::DocType(_)) => return Err(WireError::DocTypeForbidden),
            (_, Event::PI(_)) => return Err(WireError::ProcessingInstructionForbidden),
            (state, Event::Decl(_) | Event::Comment(_)) => state,
            (state, Event::Text(e))
                if !matches!(state, State::InField { .. }) && is_blank(&e) =>
            {
                state
            }

            (State::BeforeRoot, Event::Start(_)) => State::InRoot,
            (State::BeforeRoot, Event::Empty(_)) => State::AfterRoot,

            (State::InRoot, Event::Start(e)) => State::InField {
                name: element_name(e.name().as_ref())?,
                value: String::new(),
            },
            (State::InRoot, Event::Empty(e)) => {
                insert_unique(&mut fields, element_name(e.name().as_ref())?, String::new())?;
                State::InRoot
            }
            (State::InRoot, Event::End(_)) => State::AfterRoot,

            (State::InField { name, mut value }, Event::Text(e)) => {
                let text = e
                    .unescape()
                    .map_err(|err| WireError::Malformed(err.to_string()))?;
                value.push_str(&text);
                State::InField { name, value }
            }
            (State::InField { name, mut value }, Event::CData(e)) => {
                let raw = e.into_inner();
                value.push_str(std::str::from_utf8(&raw).map_err(|_| WireError::InvalidUtf8)?);
                State::InField { name, value }
            }
            (State::InField { name, value }, Event::End(_)) => {
                insert_unique(&mut fields, name, value)?;
                State::InRoot
            }
            (State::InField { name, .. }, Event::Start(_) | Event::Empty(_)) => {
                return Err(WireError::NestedElement(name));
            }

            (State::AfterRoot, Event::Eof) => return Ok(fields),
            (State::AfterRoot, Event::Start(_) | Event::Empty(_)) => {
                return Err(WireError::Structure("multiple root elements".to_string()));
            }
            (_, Event::Eof) => {
                return Err(WireError::Structure("unexpected end of document".to_string()));
            }
            (_, Event::Text(_) | Event::CData(_)) => {
                return Err(WireError::Structure("text outside a field element".to_string()));
            }
            (_, Event::End(_)) => {
                return Err(WireError::Structure("unbalanced end tag".to_string()));
            }
        };
    }
}

fn is_blank(text: &[u8]) -> bool {
    text.iter().all(u8::is_ascii_whitespace)
}

fn element_name(raw: &[u8]) -> WireResult<String> {
    std::str::from_utf8(raw)
        .map(str::to_string)
        .map_err(|_| WireError::InvalidUtf8)
}

fn insert_unique(fields: &mut FieldMap, name: String, value: String) -> WireResult<()> {
    if fields.contains_key(&name) {
        return Err(WireError::DuplicateField(name));
    }
    fields.insert(name, value);
    Ok(())
}
