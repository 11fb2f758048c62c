//! Recovery of structured explanations from raw provider output
//!
//! Models are asked for a single JSON object but regularly wrap it in
//! markdown fences, stop mid-object, or answer in prose. The raw text goes
//! through an ordered list of strategies and the first one that produces a
//! response wins. The last strategy always succeeds, so recovery never fails.

use chainviz_types::{ExplanationResponse, DEFAULT_EXPLANATION};
use regex::Regex;
use serde_json::{Map, Value};
use strum::{Display, EnumIter};

/// Simplified explanation used when the raw text is returned as-is
pub const STRUCTURED_FALLBACK_SIMPLIFIED: &str =
    "This explanation is not available in structured form.";

/// Simplified explanation used when field extraction found no simplified text
pub const PARTIAL_EXTRACTION_SIMPLIFIED: &str =
    "Sorry, a simplified explanation could not be extracted from this response.";

/// One recovery strategy, applied in [`RecoveryStep::ORDER`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum RecoveryStep {
    /// The text is already a JSON object
    DirectParse,
    /// Close dangling strings and brackets, drop incomplete members
    StructuralRepair,
    /// Parse the span between the first `{` and the last `}`
    BraceSubstring,
    /// Pull individual fields out with regular expressions
    FieldExtraction,
    /// Return the text verbatim
    RawText,
}

impl RecoveryStep {
    pub const ORDER: [RecoveryStep; 5] = [
        RecoveryStep::DirectParse,
        RecoveryStep::StructuralRepair,
        RecoveryStep::BraceSubstring,
        RecoveryStep::FieldExtraction,
        RecoveryStep::RawText,
    ];

    /// Run this strategy alone on `text`
    pub fn apply(self, text: &str) -> Option<ExplanationResponse> {
        match self {
            RecoveryStep::DirectParse => direct_parse(text),
            RecoveryStep::StructuralRepair => structural_repair(text),
            RecoveryStep::BraceSubstring => brace_substring(text),
            RecoveryStep::FieldExtraction => extract_fields(text),
            RecoveryStep::RawText => Some(raw_text(text)),
        }
    }
}

/// Recovered response together with the strategy that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct RecoveredExplanation {
    pub response: ExplanationResponse,
    pub step: RecoveryStep,
}

/// Turn arbitrary provider output into an explanation
///
/// The structured strategies see the fence-stripped text; the raw-text
/// fallback always returns the whole reply.
pub fn recover_explanation(raw: &str) -> RecoveredExplanation {
    let text = strip_code_fences(raw);
    for step in RecoveryStep::ORDER {
        let input = match step {
            RecoveryStep::RawText => raw,
            _ => text,
        };
        if let Some(response) = step.apply(input) {
            return RecoveredExplanation {
                response: response.normalized(),
                step,
            };
        }
    }

    RecoveredExplanation {
        response: raw_text(raw).normalized(),
        step: RecoveryStep::RawText,
    }
}

/// Remove a surrounding markdown code fence
///
/// Only a fence that opens before the first `{` is treated as a wrapper, so
/// backticks inside JSON string values are left alone.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(open) = trimmed.find("```") else {
        return trimmed;
    };
    if matches!(trimmed.find('{'), Some(brace) if brace < open) {
        return trimmed;
    }

    let after_open = &trimmed[open + 3..];
    let body = match after_open.split_once('\n') {
        Some((tag, rest)) if is_language_tag(tag) => rest,
        _ => after_open,
    };
    let body = match body.rfind("```") {
        Some(close) => &body[..close],
        None => body,
    };
    body.trim()
}

fn is_language_tag(line: &str) -> bool {
    line.trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn direct_parse(text: &str) -> Option<ExplanationResponse> {
    parse_object(text)
}

fn structural_repair(text: &str) -> Option<ExplanationResponse> {
    let start = text.find('{')?;
    let mut candidate = &text[start..];

    if let Some(response) = close_json(candidate).and_then(|json| parse_object(&json)) {
        return Some(response);
    }

    // Back off one member at a time until the prefix closes cleanly.
    while let Some(comma) = last_comma_outside_string(candidate) {
        candidate = &candidate[..comma];
        if let Some(response) = close_json(candidate).and_then(|json| parse_object(&json)) {
            return Some(response);
        }
    }
    None
}

fn brace_substring(text: &str) -> Option<ExplanationResponse> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    let candidate = &text[start..=end];
    if let Some(response) = parse_object(candidate) {
        return Some(response);
    }

    let re = Regex::new(r",\s*([}\]])").ok()?;
    parse_object(&re.replace_all(candidate, "$1"))
}

fn extract_fields(text: &str) -> Option<ExplanationResponse> {
    let explanation = extract_string(text, &["explanation"]);
    let technical_details = extract_string(text, &["technicalDetails", "technical_details"]);
    let technical_code = extract_string(text, &["technicalCode", "technical_code"]);
    let simplified = extract_string(
        text,
        &["simplifiedExplanation", "simplified_explanation"],
    );
    let scenarios = extract_list(text, &["whatIfScenarios", "what_if_scenarios"]);

    if explanation.is_none()
        && technical_details.is_none()
        && technical_code.is_none()
        && simplified.is_none()
        && scenarios.is_none()
    {
        return None;
    }

    Some(ExplanationResponse {
        explanation: explanation.unwrap_or_else(|| DEFAULT_EXPLANATION.to_string()),
        technical_details,
        technical_code,
        simplified_explanation: Some(
            simplified.unwrap_or_else(|| PARTIAL_EXTRACTION_SIMPLIFIED.to_string()),
        ),
        what_if_scenarios: scenarios,
    })
}

fn raw_text(text: &str) -> ExplanationResponse {
    ExplanationResponse::new(text.trim()).with_simplified(STRUCTURED_FALLBACK_SIMPLIFIED)
}

/// Parse `text` as a JSON object carrying at least one known field
fn parse_object(text: &str) -> Option<ExplanationResponse> {
    match serde_json::from_str::<Value>(text.trim()).ok()? {
        Value::Object(map) => from_object(&map),
        _ => None,
    }
}

fn from_object(map: &Map<String, Value>) -> Option<ExplanationResponse> {
    let explanation = string_field(map, &["explanation"]);
    let technical_details = string_field(map, &["technicalDetails", "technical_details"]);
    let technical_code = string_field(map, &["technicalCode", "technical_code"]);
    let simplified = string_field(map, &["simplifiedExplanation", "simplified_explanation"]);
    let scenarios = list_field(map, &["whatIfScenarios", "what_if_scenarios"]);

    if explanation.is_none()
        && technical_details.is_none()
        && technical_code.is_none()
        && simplified.is_none()
        && scenarios.is_none()
    {
        return None;
    }

    Some(ExplanationResponse {
        explanation: explanation.unwrap_or_default(),
        technical_details,
        technical_code,
        simplified_explanation: simplified,
        what_if_scenarios: scenarios,
    })
}

fn lookup<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .find_map(|key| map.get(*key))
        .filter(|value| !value.is_null())
}

fn string_field(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    match lookup(map, keys)? {
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn list_field(map: &Map<String, Value>, keys: &[&str]) -> Option<Vec<String>> {
    match lookup(map, keys)? {
        Value::Array(items) => Some(
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
        ),
        Value::String(s) => Some(vec![s.clone()]),
        _ => None,
    }
}

/// Close an object that starts at `text[0] == '{'`
///
/// Returns `None` when brackets are mismatched. Text after the point where
/// the outermost object closes is discarded.
fn close_json(text: &str) -> Option<String> {
    let mut out = String::with_capacity(text.len() + 8);
    let mut closers: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for ch in text.chars() {
        if in_string {
            out.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => {
                in_string = true;
                out.push(ch);
            }
            '{' => {
                closers.push('}');
                out.push(ch);
            }
            '[' => {
                closers.push(']');
                out.push(ch);
            }
            '}' | ']' => {
                if closers.pop() != Some(ch) {
                    return None;
                }
                trim_trailing_commas(&mut out);
                out.push(ch);
                if closers.is_empty() {
                    return Some(out);
                }
            }
            _ => out.push(ch),
        }
    }

    if closers.is_empty() {
        return None;
    }
    if in_string {
        if escaped {
            out.pop();
        }
        out.push('"');
    }

    trim_trailing_commas(&mut out);
    if out.ends_with(':') {
        out.push_str("null");
    }
    while let Some(closer) = closers.pop() {
        trim_trailing_commas(&mut out);
        out.push(closer);
    }
    Some(out)
}

fn trim_trailing_commas(out: &mut String) {
    loop {
        let trimmed_len = out.trim_end().len();
        out.truncate(trimmed_len);
        if out.ends_with(',') {
            out.pop();
        } else {
            break;
        }
    }
}

fn last_comma_outside_string(text: &str) -> Option<usize> {
    let mut in_string = false;
    let mut escaped = false;
    let mut last = None;

    for (index, ch) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
        } else if ch == '"' {
            in_string = true;
        } else if ch == ',' {
            last = Some(index);
        }
    }
    last
}

fn key_pattern(keys: &[&str]) -> String {
    let alternatives = keys
        .iter()
        .map(|key| regex::escape(key))
        .collect::<Vec<_>>()
        .join("|");
    format!(r#"(?:^|[^A-Za-z0-9_])["']?(?:{alternatives})["']?\s*:\s*"#)
}

/// String value for any of `keys`; the closing quote may be missing
fn extract_string(text: &str, keys: &[&str]) -> Option<String> {
    let pattern = format!(r#"(?s){}"((?:[^"\\]|\\.)*)"#, key_pattern(keys));
    let re = Regex::new(&pattern).ok()?;
    let value = re.captures(text)?.get(1)?.as_str();
    Some(unescape(value))
}

fn extract_list(text: &str, keys: &[&str]) -> Option<Vec<String>> {
    let pattern = format!(r#"(?s){}\["#, key_pattern(keys));
    let Some(open) = Regex::new(&pattern).ok()?.find(text) else {
        return extract_string(text, keys).map(|single| vec![single]);
    };

    let items: Vec<String> = quoted_items(&text[open.end()..])
        .into_iter()
        .map(|item| unescape(&item))
        .filter(|s| !s.trim().is_empty())
        .collect();

    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

/// Double-quoted items up to the first `]` outside a string
///
/// Items are returned still escaped; an unterminated last item is kept.
fn quoted_items(body: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut in_item = false;
    let mut escaped = false;

    for ch in body.chars() {
        if !in_item {
            match ch {
                '"' => in_item = true,
                ']' => break,
                _ => {}
            }
            continue;
        }

        if escaped {
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == '"' {
            items.push(std::mem::take(&mut current));
            in_item = false;
            continue;
        }
        current.push(ch);
    }
    if in_item {
        items.push(current);
    }
    items
}

fn unescape(value: &str) -> String {
    if let Ok(decoded) = serde_json::from_str::<String>(&format!("\"{value}\"")) {
        return decoded;
    }

    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}
