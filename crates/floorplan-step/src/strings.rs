// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! STEP string literal decoding
//!
//! Handles doubled quotes and backslashes plus the `\X\`, `\X2\`, `\X4\`
//! and `\S\` control directives. Room names exported by Norwegian tools
//! carry æ, ø and å through `\X2\00E6\X0\`-style escapes.

/// Decode the body of a STEP string literal (without the outer quotes)
pub fn decode_step_string(raw: &str) -> String {
    if !raw.contains('\\') && !raw.contains("''") {
        return raw.to_string();
    }

    let bytes = raw.as_bytes();
    let mut out = String::with_capacity(raw.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\'' if bytes.get(i + 1) == Some(&b'\'') => {
                out.push('\'');
                i += 2;
            }
            b'\\' => match decode_directive(raw, i, &mut out) {
                Some(next) => i = next,
                None => {
                    out.push('\\');
                    i += 1;
                }
            },
            _ => {
                // Copy one UTF-8 character
                let ch_len = utf8_len(bytes[i]);
                let end = (i + ch_len).min(bytes.len());
                out.push_str(raw.get(i..end).unwrap_or("\u{FFFD}"));
                i = end;
            }
        }
    }

    out
}

/// Decode one directive starting at the backslash at `start`
///
/// Returns the index after the directive, or `None` if it is malformed.
fn decode_directive(raw: &str, start: usize, out: &mut String) -> Option<usize> {
    let rest = raw.get(start..)?;

    if rest.starts_with("\\\\") {
        out.push('\\');
        return Some(start + 2);
    }
    if let Some(body) = rest.strip_prefix("\\X2\\") {
        return decode_wide(body, 4, "\\X0\\", out).map(|used| start + 4 + used);
    }
    if let Some(body) = rest.strip_prefix("\\X4\\") {
        return decode_wide(body, 8, "\\X0\\", out).map(|used| start + 4 + used);
    }
    if let Some(body) = rest.strip_prefix("\\X\\") {
        let hex = body.get(..2)?;
        let byte = u8::from_str_radix(hex, 16).ok()?;
        out.push(char::from(byte));
        return Some(start + 5);
    }
    if let Some(body) = rest.strip_prefix("\\S\\") {
        let c = body.chars().next()?;
        let code = (c as u32).checked_add(128)?;
        out.push(char::from_u32(code)?);
        return Some(start + 3 + c.len_utf8());
    }
    if rest.len() >= 4 && rest.as_bytes()[1] == b'P' && rest.as_bytes()[3] == b'\\' {
        // Code page switch (\PA\); ISO-8859-1 is assumed throughout
        return Some(start + 4);
    }
    None
}

/// Decode groups of `width` hex digits until `terminator`
///
/// Returns the number of bytes consumed including the terminator.
fn decode_wide(body: &str, width: usize, terminator: &str, out: &mut String) -> Option<usize> {
    let end = body.find(terminator)?;
    let hex = &body[..end];
    if hex.len() % width != 0 {
        return None;
    }

    let mut units = Vec::with_capacity(hex.len() / width);
    for chunk in hex.as_bytes().chunks(width) {
        let s = std::str::from_utf8(chunk).ok()?;
        units.push(u32::from_str_radix(s, 16).ok()?);
    }

    if width == 4 {
        let utf16: Vec<u16> = units.iter().map(|&u| u as u16).collect();
        out.extend(char::decode_utf16(utf16).map(|r| r.unwrap_or('\u{FFFD}')));
    } else {
        out.extend(units.into_iter().map(|u| char::from_u32(u).unwrap_or('\u{FFFD}')));
    }
    Some(end + terminator.len())
}

fn utf8_len(first: u8) -> usize {
    match first {
        0x00..=0x7F => 1,
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        _ => 1,
    }
}
