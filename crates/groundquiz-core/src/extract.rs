//! Pulling a JSON payload out of free-form oracle text.
//!
//! Oracles wrap structured output in prose, markdown fences, or both, and
//! sometimes truncate it. [`extract_json`] looks inside fenced blocks first
//! and then scans the raw text for the first balanced `{...}` or `[...]` span
//! that actually parses.

use serde_json::Value;

/// Return the contents of markdown code blocks.
///
/// Handles:
/// - ```json``` blocks (preferred, concatenated if several)
/// - Generic ``` blocks (if no json-specific blocks found)
/// - Truncated, unclosed blocks
///
/// Returns `None` when the text contains no fence at all.
pub fn fenced_blocks(response: &str) -> Option<String> {
    let mut json_blocks = Vec::new();
    let mut generic_blocks = Vec::new();
    let mut in_block = false;
    let mut is_json_block = false;
    let mut current_block = String::new();

    for line in response.lines() {
        let trimmed = line.trim();

        if !in_block && trimmed.starts_with("```") {
            in_block = true;
            let lang = trimmed.trim_start_matches('`').trim().to_lowercase();
            is_json_block = lang == "json" || lang == "jsonc";
            current_block.clear();
            continue;
        }

        if in_block && trimmed == "```" {
            in_block = false;
            if is_json_block {
                json_blocks.push(current_block.clone());
            } else {
                generic_blocks.push(current_block.clone());
            }
            current_block.clear();
            continue;
        }

        if in_block {
            if !current_block.is_empty() {
                current_block.push('\n');
            }
            current_block.push_str(line);
        }
    }

    // Truncated (unclosed) block: keep what we have
    if in_block && !current_block.is_empty() {
        if is_json_block {
            json_blocks.push(current_block);
        } else {
            generic_blocks.push(current_block);
        }
    }

    if !json_blocks.is_empty() {
        return Some(json_blocks.join("\n"));
    }
    if !generic_blocks.is_empty() {
        return Some(generic_blocks.join("\n"));
    }
    None
}

/// Find the end (exclusive byte offset) of the bracket span opening at
/// `start`, honouring JSON string literals. `None` if it never balances.
fn balanced_end(text: &str, start: usize) -> Option<usize> {
    let mut stack: Vec<u8> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (offset, byte) in text.as_bytes()[start..].iter().copied().enumerate() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' => stack.push(b'}'),
            b'[' => stack.push(b']'),
            b'}' | b']' => {
                if stack.pop() != Some(byte) {
                    return None;
                }
                if stack.is_empty() {
                    return Some(start + offset + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Every balanced `{...}` / `[...]` span in `text` that parses as JSON, in
/// order of their opening bracket. Nested spans are yielded too.
pub fn json_spans(text: &str) -> impl Iterator<Item = (&str, Value)> + '_ {
    text.char_indices()
        .filter(|&(_, ch)| ch == '{' || ch == '[')
        .filter_map(move |(start, _)| {
            let end = balanced_end(text, start)?;
            let span = &text[start..end];
            serde_json::from_str::<Value>(span)
                .ok()
                .map(|value| (span, value))
        })
}

/// The first balanced `{...}` / `[...]` span in `text` that parses as JSON.
pub fn first_json_span(text: &str) -> Option<(&str, Value)> {
    json_spans(text).next()
}

/// Extract the first well-formed JSON object or array from an oracle answer.
pub fn extract_json(response: &str) -> Option<Value> {
    extract_json_where(response, |_| true)
}

/// Like [`extract_json`], but only accepts values for which `accept` holds.
/// Fenced blocks are searched before the raw text.
pub fn extract_json_where(response: &str, accept: impl Fn(&Value) -> bool) -> Option<Value> {
    if let Some(fenced) = fenced_blocks(response) {
        if let Some((_, value)) = json_spans(&fenced).find(|(_, v)| accept(v)) {
            return Some(value);
        }
    }
    json_spans(response)
        .find(|(_, v)| accept(v))
        .map(|(_, value)| value)
}

/// The first run of ASCII digits in `text`, parsed as an integer.
pub fn first_integer(text: &str) -> Option<i64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    // Absurdly long runs saturate rather than fail; callers clamp anyway.
    Some(digits.parse::<i64>().unwrap_or(i64::MAX))
}
