//! Balanced-brace extraction of JSON objects embedded in page markup

use crate::error::VidmapError;

/// Marker that precedes the player configuration assignment
pub const PLAYER_CONFIG_MARKER: &str = "ytplayer.config =";

/// String delimiters of JSON
const JSON_QUOTES: &[char] = &['"'];
/// String delimiters of JavaScript
const JS_QUOTES: &[char] = &['"', '\'', '`'];

/// Extract the `{...}` object assigned right after `marker` in `text`.
///
/// The scan counts brace depth character by character and stops as soon as
/// the depth returns to zero. Braces inside double-quoted string literals are
/// skipped so that JSON values like `"{"` do not unbalance the count.
pub fn extract_block<'a>(text: &'a str, marker: &str) -> Result<&'a str, VidmapError> {
    scan_block(text, marker, JSON_QUOTES)
}

/// Like [`extract_block`], for JavaScript source.
///
/// Single-quoted, double-quoted and template literals are all skipped, so
/// `'"'` in minified code does not open a phantom string.
pub fn extract_js_block<'a>(text: &'a str, marker: &str) -> Result<&'a str, VidmapError> {
    scan_block(text, marker, JS_QUOTES)
}

fn scan_block<'a>(text: &'a str, marker: &str, quotes: &[char]) -> Result<&'a str, VidmapError> {
    let marker_pos = text
        .find(marker)
        .ok_or_else(|| VidmapError::StructureError(format!("marker {:?} not found", marker)))?;

    let after_marker = &text[marker_pos + marker.len()..];
    let start = after_marker.len() - after_marker.trim_start().len();
    let block = &after_marker[start..];

    if !block.starts_with('{') {
        return Err(VidmapError::StructureError(format!(
            "expected '{{' after marker {:?}",
            marker
        )));
    }

    let mut depth: usize = 0;
    // Delimiter of the literal we are in, if any
    let mut in_string: Option<char> = None;
    let mut escaped = false;

    for (i, ch) in block.char_indices() {
        if let Some(quote) = in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == quote {
                in_string = None;
            }
            continue;
        }

        match ch {
            c if quotes.contains(&c) => in_string = Some(c),
            '{' => depth += 1,
            '}' => {
                // depth >= 1 here: the block opens with '{'
                depth -= 1;
                if depth == 0 {
                    return Ok(&block[..=i]);
                }
            }
            _ => {}
        }
    }

    Err(VidmapError::StructureError(
        "unbalanced braces in embedded object".to_string(),
    ))
}
