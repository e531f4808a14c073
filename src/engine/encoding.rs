//! Decoding raw XML bytes into the UTF-8 text the store keeps.
//!
//! The encoding comes from a byte-order mark or, failing that, the
//! `encoding` pseudo-attribute of the XML declaration. UTF-8 is assumed when
//! neither is present.

use crate::error::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Utf8,
    Utf16Le,
    Utf16Be,
    Latin1,
    Ascii,
}

/// Decode `bytes` for the document `name`.
///
/// Encodings other than UTF-8, UTF-16, ISO-8859-1 and US-ASCII are rejected
/// as malformed.
pub fn decode_xml(name: &str, bytes: &[u8]) -> Result<String, StoreError> {
    let malformed = |message: String| StoreError::MalformedXml {
        name: name.to_string(),
        message,
    };

    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return decode(rest, Encoding::Utf8).map_err(malformed);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        return decode(rest, Encoding::Utf16Le).map_err(malformed);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        return decode(rest, Encoding::Utf16Be).map_err(malformed);
    }

    let encoding = match declared_encoding(bytes) {
        Some(label) => lookup(&label)
            .ok_or_else(|| malformed(format!("Unsupported encoding: {}", label)))?,
        None => Encoding::Utf8,
    };
    decode(bytes, encoding).map_err(malformed)
}

fn lookup(label: &str) -> Option<Encoding> {
    Some(match label.to_ascii_lowercase().as_str() {
        "utf-8" | "utf8" => Encoding::Utf8,
        "utf-16le" => Encoding::Utf16Le,
        "utf-16" | "utf-16be" => Encoding::Utf16Be,
        "iso-8859-1" | "iso8859-1" | "iso_8859-1" | "latin1" | "latin-1" | "l1" => {
            Encoding::Latin1
        }
        "us-ascii" | "ascii" => Encoding::Ascii,
        _ => return None,
    })
}

/// The `encoding="..."` value of a leading `<?xml ... ?>` declaration.
fn declared_encoding(bytes: &[u8]) -> Option<String> {
    let rest = bytes.strip_prefix(b"<?xml")?;
    let end = rest.windows(2).position(|w| w == b"?>")?;
    let decl = std::str::from_utf8(&rest[..end]).ok()?;

    let after = &decl[decl.find("encoding")? + "encoding".len()..];
    let after = after.trim_start().strip_prefix('=')?.trim_start();
    let quote = after.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let value = &after[1..];
    Some(value[..value.find(quote)?].to_string())
}

fn decode(bytes: &[u8], encoding: Encoding) -> Result<String, String> {
    match encoding {
        Encoding::Utf8 => String::from_utf8(bytes.to_vec())
            .map_err(|e| format!("Invalid UTF-8: {}", e)),
        Encoding::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
        Encoding::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
            Some(at) => Err(format!("Non-ASCII byte at offset {}", at)),
            None => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
        },
        Encoding::Utf16Le | Encoding::Utf16Be => {
            if bytes.len() % 2 != 0 {
                return Err("Odd number of bytes in UTF-16 input".to_string());
            }
            let units = bytes.chunks_exact(2).map(|pair| match encoding {
                Encoding::Utf16Le => u16::from_le_bytes([pair[0], pair[1]]),
                _ => u16::from_be_bytes([pair[0], pair[1]]),
            });
            char::decode_utf16(units)
                .collect::<Result<String, _>>()
                .map_err(|e| format!("Invalid UTF-16: {}", e))
        }
    }
}
