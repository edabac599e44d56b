//! Regex replacement helpers that also count what they changed.

use regex::{Captures, Regex};
use std::sync::LazyLock;

static RE_BLANK_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]{2,}|\t").unwrap());

/// `replace_all` with a `$1`-style template, returning the match count.
pub fn replace_counted(re: &Regex, text: &str, template: &str) -> (String, usize) {
    let mut count = 0;
    let out = re
        .replace_all(text, |caps: &Captures| {
            let mut dst = String::new();
            caps.expand(template, &mut dst);
            if dst != caps[0] {
                count += 1;
            }
            dst
        })
        .into_owned();
    (out, count)
}

/// `replace_all` where the closure may decline a match by returning `None`.
/// Only matches whose text actually changed are counted.
pub fn replace_with<F>(re: &Regex, text: &str, mut f: F) -> (String, usize)
where
    F: FnMut(&Captures) -> Option<String>,
{
    let mut count = 0;
    let out = re
        .replace_all(text, |caps: &Captures| match f(caps) {
            Some(rep) if rep != caps[0] => {
                count += 1;
                rep
            }
            _ => caps[0].to_string(),
        })
        .into_owned();
    (out, count)
}

/// The character just before byte offset `at`, if any.
pub fn char_before(text: &str, at: usize) -> Option<char> {
    text[..at].chars().next_back()
}

/// The last non-whitespace character before byte offset `at`.
pub fn prev_non_space(text: &str, at: usize) -> Option<char> {
    text[..at].chars().rev().find(|c| !c.is_whitespace())
}

/// Byte offset just past the bracket closing the one at `open`, counting
/// nesting of the same bracket pair.
pub fn matching_close(text: &str, open: usize, open_ch: u8, close_ch: u8) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if b == open_ch {
            depth += 1;
        } else if b == close_ch {
            depth = depth.checked_sub(1)?;
            if depth == 0 {
                return Some(i + 1);
            }
        }
    }
    None
}

/// Truncate to `max` characters and append `...`; `None` if short enough.
pub fn truncate_chars(text: &str, max: usize) -> Option<String> {
    if text.chars().count() <= max {
        return None;
    }
    let mut out: String = text.chars().take(max).collect();
    out.push_str("...");
    Some(out)
}

/// Trim every line, drop blank ones and squeeze inner runs of blanks.
/// Returns the number of lines changed or dropped.
pub fn collapse_lines(text: &str) -> (String, usize) {
    let mut changed = 0;
    let lines: Vec<String> = text
        .lines()
        .filter_map(|line| {
            let collapsed = RE_BLANK_RUN.replace_all(line.trim(), " ");
            if collapsed.len() != line.len() {
                changed += 1;
            }
            (!collapsed.is_empty()).then(|| collapsed.into_owned())
        })
        .collect();
    (lines.join("\n"), changed)
}
