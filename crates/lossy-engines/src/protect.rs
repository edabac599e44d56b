//! Placeholder protection for spans that text rewrites must not touch
//! (string literals, raw-text element bodies).
//!
//! A protected span is replaced by `U+E000`, one private-use character per
//! decimal digit of its slot index, and `U+E001`. None of these are word
//! characters or whitespace, so `\b`, `\w` and `\s` based patterns never see
//! into them.

use regex::{Captures, Regex};
use std::sync::LazyLock;

const OPEN: char = '\u{E000}';
const CLOSE: char = '\u{E001}';
const DIGIT_BASE: u32 = 0xE010;

static RE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("\u{E000}([\u{E010}-\u{E019}]+)\u{E001}").unwrap());

#[derive(Debug, Default)]
pub struct Protected {
    slots: Vec<String>,
}

impl Protected {
    pub fn new() -> Self {
        Self::default()
    }

    fn marker(index: usize) -> String {
        let mut m = String::new();
        m.push(OPEN);
        for d in index.to_string().chars() {
            let digit = d.to_digit(10).unwrap_or(0);
            m.push(char::from_u32(DIGIT_BASE + digit).unwrap_or(OPEN));
        }
        m.push(CLOSE);
        m
    }

    fn store(&mut self, span: &str) -> String {
        self.slots.push(span.to_string());
        Self::marker(self.slots.len() - 1)
    }

    /// Replace every match of `re` (or its capture `group`) with a marker.
    pub fn protect(&mut self, text: &str, re: &Regex, group: usize) -> String {
        re.replace_all(text, |caps: &Captures| {
            let whole = &caps[0];
            match caps.get(group) {
                Some(m) if group > 0 => {
                    let start = m.start() - caps.get(0).map(|w| w.start()).unwrap_or(0);
                    let end = start + m.len();
                    format!("{}{}{}", &whole[..start], self.store(m.as_str()), &whole[end..])
                }
                _ => self.store(whole),
            }
        })
        .into_owned()
    }

    /// Protect only the matches `keep` accepts; the rest stay in place.
    pub fn protect_if<F>(&mut self, text: &str, re: &Regex, keep: F) -> String
    where
        F: Fn(&str) -> bool,
    {
        re.replace_all(text, |caps: &Captures| {
            let whole = &caps[0];
            if keep(whole) {
                self.store(whole)
            } else {
                whole.to_string()
            }
        })
        .into_owned()
    }

    /// Original text of the span behind the marker at the start of `text`.
    pub fn resolve(&self, text: &str) -> Option<&str> {
        let caps = RE_MARKER.captures(text)?;
        self.slot(&caps[1])
    }

    fn slot(&self, digits: &str) -> Option<&str> {
        let index = digits
            .chars()
            .try_fold(0usize, |acc, c| Some(acc * 10 + (c as u32).checked_sub(DIGIT_BASE)? as usize))?;
        self.slots.get(index).map(String::as_str)
    }

    /// Offer each marker's span to `f`; a returned string replaces the
    /// marker in the text.
    pub fn rewrite<F>(&self, text: &str, mut f: F) -> (String, usize)
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut count = 0;
        let out = RE_MARKER
            .replace_all(text, |caps: &Captures| match self.slot(&caps[1]).and_then(&mut f) {
                Some(rep) => {
                    count += 1;
                    rep
                }
                None => caps[0].to_string(),
            })
            .into_owned();
        (out, count)
    }

    /// Stored spans, indexed by slot.
    pub fn spans(&self) -> &[String] {
        &self.slots
    }

    /// Swap the text behind slot `index`; markers already in the text stay valid.
    pub fn replace_span(&mut self, index: usize, span: String) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = span;
        }
    }

    /// Put every surviving span back.
    pub fn restore(&self, text: &str) -> String {
        if self.slots.is_empty() {
            return text.to_string();
        }
        RE_MARKER
            .replace_all(text, |caps: &Captures| match self.slot(&caps[1]) {
                Some(span) if span.contains(OPEN) => self.restore(span),
                Some(span) => span.to_string(),
                None => String::new(),
            })
            .into_owned()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
