//! Pulling the useful part out of a compiler log.

use once_cell::sync::Lazy;
use regex::Regex;

static CONTEXT_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^l\.\d+").expect("valid context line pattern"));

const MAX_BLOCK_LINES: usize = 20;
const TAIL_LINES: usize = 20;

/// The first error block: from the first line starting with `!` through the
/// `l.<n>` line that points at the offending source line.
pub fn extract_error(log: &str) -> Option<String> {
    let lines: Vec<&str> = log.lines().collect();
    let start = lines.iter().position(|l| l.starts_with('!'))?;
    let end = lines[start..]
        .iter()
        .take(MAX_BLOCK_LINES)
        .position(|l| CONTEXT_LINE.is_match(l))
        .map(|offset| start + offset)
        .unwrap_or_else(|| (start + MAX_BLOCK_LINES).min(lines.len()) - 1);
    Some(lines[start..=end].join("\n"))
}

/// The last few non-empty lines of `text`.
pub fn tail(text: &str) -> String {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let from = lines.len().saturating_sub(TAIL_LINES);
    lines[from..].join("\n")
}

/// Most specific description of a failed run: error block, log tail, or the
/// captured process output.
pub(crate) fn failure_detail(log: Option<&str>, output: &str) -> String {
    if let Some(log) = log {
        if let Some(block) = extract_error(log) {
            return block;
        }
        let tail = tail(log);
        if !tail.is_empty() {
            return tail;
        }
    }
    if let Some(block) = extract_error(output) {
        return block;
    }
    let tail = tail(output);
    if tail.is_empty() {
        "no output captured".to_string()
    } else {
        tail
    }
}
