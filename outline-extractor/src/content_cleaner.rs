use once_cell::sync::Lazy;
use regex::Regex;

pub const DEFAULT_MAX_EXCERPT_LEN: usize = 400;

static TRAILING_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\d+\s*$").expect("valid trailing number regex"));
// Matches both a clean `©` and its Latin-1 mojibake `Â©`.
static COPYRIGHT_TAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Â?©.*$").expect("valid copyright regex"));

/// Display excerpt of a section body: drops a trailing page number and any
/// copyright tail, trims, and cuts to `max_len` characters.
pub fn clean_text_block(text: &str, max_len: usize) -> String {
    let text = TRAILING_NUMBER_RE.replace(text, "");
    let text = COPYRIGHT_TAIL_RE.replace(&text, "");
    text.trim().chars().take(max_len).collect()
}
