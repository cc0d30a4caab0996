/*!
 * Cleanup of raw model output.
 *
 * Completions frequently arrive with escaped control sequences, leaked
 * reasoning blocks, and stray blank lines. This module normalizes them
 * into text safe to store back into segment records.
 */

use once_cell::sync::Lazy;
use regex::Regex;

/// Matches an entire `<think>...</think>` reasoning block, including
/// multi-line bodies
static THINK_BLOCK_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<think>.*?</think>").unwrap()
});

/// Matches runs of three or more newlines (after trimming trailing spaces)
static BLANK_RUN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\n{3,}").unwrap()
});

/// Clean translated segment content for storage.
///
/// Unescapes literal `\n`, `\"` and `\\` sequences some providers emit,
/// strips any leaked `<think>` reasoning blocks, removes trailing
/// whitespace per line, and collapses runs of blank lines down to one.
pub fn clean_content(raw: &str) -> String {
    let unescaped = raw
        .replace("\\n", "\n")
        .replace("\\\"", "\"")
        .replace("\\\\", "\\");

    let without_thinking = THINK_BLOCK_REGEX.replace_all(&unescaped, "");

    let trimmed_lines: Vec<&str> = without_thinking
        .lines()
        .map(str::trim_end)
        .collect();
    let joined = trimmed_lines.join("\n");

    BLANK_RUN_REGEX
        .replace_all(&joined, "\n\n")
        .trim()
        .to_string()
}

/// Clean a translated title.
///
/// Titles are single-line: everything `clean_content` does, then the
/// result is flattened to its first non-empty line with surrounding
/// quotes removed.
pub fn clean_title(raw: &str) -> String {
    let cleaned = clean_content(raw);
    let line = cleaned
        .lines()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("")
        .trim();
    line.trim_matches(|c| c == '"' || c == '\'').to_string()
}
