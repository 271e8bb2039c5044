//! Decoding and encoding of XML character entities.
//!
//! Exactly five named entities are understood (`&lt; &gt; &amp; &quot;
//! &apos;`) plus decimal (`&#68;`) and hexadecimal (`&#x44;`) character
//! references. Anything else is left verbatim, so documents with unknown
//! entity references survive a parse/serialize round trip unchanged.

/// Decodes entity references in `input`. Unknown references and malformed
/// character references pass through untouched.
pub fn decode(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let candidate = &rest[amp..];
        match decode_reference(candidate) {
            Some((decoded, consumed)) => {
                out.push_str(&decoded);
                rest = &candidate[consumed..];
            }
            None => {
                out.push('&');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Encodes the five named entities for text and attribute output. Numeric
/// references are never produced.
pub fn encode(input: &str) -> String {
    if !input.contains(['&', '<', '>', '"', '\'']) {
        return input.to_string();
    }

    let mut out = String::with_capacity(input.len() + 8);
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

/// Attempts to decode one reference at the start of `s` (which begins with
/// `&`). Returns the decoded text and the number of bytes consumed.
fn decode_reference(s: &str) -> Option<(String, usize)> {
    let semi = s.find(';')?;
    let body = &s[1..semi];
    let consumed = semi + 1;

    let named = match body {
        "lt" => Some("<"),
        "gt" => Some(">"),
        "amp" => Some("&"),
        "quot" => Some("\""),
        "apos" => Some("'"),
        _ => None,
    };
    if let Some(text) = named {
        return Some((text.to_string(), consumed));
    }

    let code = if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
        u32::from_str_radix(hex, 16).ok()?
    } else if let Some(dec) = body.strip_prefix('#') {
        dec.parse::<u32>().ok()?
    } else {
        return None;
    };

    char::from_u32(code).map(|c| (c.to_string(), consumed))
}
