//! The cursor wire grammar: how a
//! [`rebac_model::Cursor`]'s section stack and version tag flatten to the
//! opaque string a client holds between pages.
//!
//! Layout (before base64): `v<version>\x01<section>\x01<section>...`. The
//! version prefix lets [`decode`] reject a cursor minted under an encoding
//! this binary no longer understands without guessing; a cursor minted
//! under a different *dispatch* version (stale relative to the schema or
//! ring topology) decodes fine but is caught by
//! [`rebac_model::Cursor::is_stale`] at the call site —
//! only malformed bytes are an error here.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rebac_model::Cursor;

use crate::error::{Result, StreamError};

const SECTION_SEPARATOR: char = '\u{1}';
/// This module's own encoding format version, independent of
/// `Cursor::dispatch_version` (which tracks schema/topology staleness, not
/// wire format).
const WIRE_VERSION: u32 = 1;

#[must_use]
pub fn encode(cursor: &Cursor) -> String {
    if cursor.is_start() {
        return String::new();
    }
    let mut plain = format!("w{WIRE_VERSION}:{}", cursor.dispatch_version);
    for section in &cursor.sections {
        plain.push(SECTION_SEPARATOR);
        plain.push_str(section);
    }
    URL_SAFE_NO_PAD.encode(plain)
}

pub fn decode(token: &str) -> Result<Cursor> {
    if token.is_empty() {
        return Ok(Cursor::default());
    }
    let plain = URL_SAFE_NO_PAD.decode(token)?;
    let plain = String::from_utf8(plain).map_err(|err| StreamError::Malformed(err.to_string()))?;

    let mut parts = plain.split(SECTION_SEPARATOR);
    let header = parts.next().ok_or_else(|| StreamError::Malformed("empty cursor".into()))?;
    let (wire_tag, dispatch_version) = header
        .split_once(':')
        .ok_or_else(|| StreamError::Malformed(format!("missing header separator in {header:?}")))?;
    if wire_tag != format!("w{WIRE_VERSION}") {
        return Err(StreamError::Malformed(format!("unsupported cursor wire version {wire_tag}")));
    }
    let dispatch_version: u32 = dispatch_version
        .parse()
        .map_err(|_| StreamError::Malformed(format!("non-numeric dispatch version {dispatch_version:?}")))?;

    Ok(Cursor {
        sections: parts.map(str::to_string).collect(),
        dispatch_version,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_cursor_round_trips_as_empty_token() {
        let cursor = Cursor::start(3);
        let token = encode(&cursor);
        assert_eq!(token, "");
        assert_eq!(decode(&token).unwrap(), Cursor::default());
    }

    #[test]
    fn multi_section_cursor_round_trips() {
        let cursor = Cursor::start(3).pushed("doc42").pushed("group7");
        let token = encode(&cursor);
        let decoded = decode(&token).unwrap();
        assert_eq!(decoded, cursor);
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(decode("not-valid-base64!!").is_err());
    }

    #[test]
    fn wrong_wire_version_is_rejected() {
        let bogus = URL_SAFE_NO_PAD.encode("w99:3\u{1}doc42");
        assert!(decode(&bogus).is_err());
    }
}
