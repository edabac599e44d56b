//! Plain text and Markdown engine. Markdown-only passes are skipped for
//! plain text.

use lossy_core::{FileType, Impact, ResolvedOptions, Result, Tier};
use regex::{Captures, Regex};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use crate::pipeline::{op, Engine, OpLog};
use crate::rewrite::{replace_counted, replace_with, truncate_chars};

static RE_CRLF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\r\n").unwrap());
static RE_TRAILING_WS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)[ \t]+$").unwrap());
static RE_BLANK_LINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());
static RE_LINK_DEF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^ {0,3}\[([^\]\n]+)\]:[ \t]*(\S+)(?:[ \t]+"[^"\n]*")?[ \t]*(?:\n|$)"#).unwrap()
});
static RE_REF_LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[([^\]\n]+)\]\[([^\]\n]*)\]").unwrap());
static RE_HTML_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static RE_CLOSED_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(#{1,6}[ \t]+.*?)[ \t]+#+[ \t]*$").unwrap());
static RE_FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?ms)^```[^\n]*\n.*?^```").unwrap());
static RE_EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*\n]+)\*\*|__([^_\n]+)__").unwrap());
static RE_IMAGE_ALT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"!\[([^\]\n]*)\]\(").unwrap());
static RE_SENTENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^.!?]*[.!?]+\s*|[^.!?]+$").unwrap());
static RE_SPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\S)[ \t]{2,}").unwrap());
static RE_FILLER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:basically|actually|literally|just|really|very|quite)\b,?[ \t]*").unwrap()
});
static RE_SPACE_BEFORE_PUNCT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+([,.;:!?])").unwrap());

pub struct TextEngine {
    pub markdown: bool,
}

impl Engine for TextEngine {
    fn file_type(&self) -> FileType {
        if self.markdown {
            FileType::Markdown
        } else {
            FileType::Text
        }
    }

    fn run(&self, content: &str, tier: Tier, opts: &ResolvedOptions<'_>, ops: &mut OpLog) -> Result<String> {
        let text = content.to_string();
        Ok(match tier {
            Tier::Minimal => minimal(text, ops, opts),
            Tier::Moderate => moderate(text, ops, opts, self.markdown),
            Tier::Aggressive => aggressive(text, ops, opts, self.markdown),
        })
    }
}

fn minimal(mut text: String, ops: &mut OpLog, opts: &ResolvedOptions<'_>) -> String {
    if opts.flag("normalizeLineEndings") {
        text = ops.apply(text, op("normalize_line_endings", Impact::Low), |t| replace_counted(&RE_CRLF, t, "\n"));
    }
    if opts.flag("removeTrailingWhitespace") {
        text = ops.apply(text, op("strip_trailing_whitespace", Impact::Low), |t| {
            replace_counted(&RE_TRAILING_WS, t, "")
        });
    }
    if opts.flag("collapseBlankLines") {
        text = ops.apply(text, op("collapse_blank_lines", Impact::Low), |t| {
            replace_counted(&RE_BLANK_LINES, t, "\n\n")
        });
    }
    text
}

fn moderate(text: String, ops: &mut OpLog, opts: &ResolvedOptions<'_>, markdown: bool) -> String {
    let mut text = minimal(text, ops, opts);

    if markdown {
        if opts.flag("inlineReferenceLinks") {
            text = ops.apply_counted(text, op("inline_reference_links", Impact::Medium), inline_reference_links);
        }
        if opts.flag("removeHtmlComments") {
            text = ops.apply(text, op("remove_html_comments", Impact::Medium), |t| {
                replace_counted(&RE_HTML_COMMENT, t, "")
            });
        }
        if opts.flag("simplifyHeaders") {
            text = ops.apply(text, op("simplify_headers", Impact::Medium), |t| {
                replace_counted(&RE_CLOSED_HEADER, t, "$1")
            });
        }
        if opts.flag("cleanCodeBlocks") {
            text = ops.apply(text, op("clean_code_blocks", Impact::Medium), clean_code_blocks);
        }
        if opts.flag("truncateAltText") {
            let max = opts.count_or("maxAltLength", 50);
            text = ops.apply(text, op("truncate_alt_text", Impact::Medium).with("maxLength", max), |t| {
                truncate_alt_text(t, max)
            });
        }
    }
    if opts.flag("removeDuplicateSentences") {
        text = ops.apply(text, op("remove_duplicate_sentences", Impact::Medium), remove_duplicate_sentences);
    }
    if opts.flag("collapseSpaces") {
        text = ops.apply(text, op("collapse_spaces", Impact::Medium), |t| replace_counted(&RE_SPACE_RUN, t, "$1 "));
    }
    text
}

fn aggressive(text: String, ops: &mut OpLog, opts: &ResolvedOptions<'_>, markdown: bool) -> String {
    let mut text = moderate(text, ops, opts, markdown);

    if opts.flag("truncateContent") {
        let max = opts.count_or("maxLength", 10_000);
        text = ops.apply(text, op("truncate_content", Impact::High).with("maxLength", max), |t| {
            match truncate_chars(t, max) {
                Some(cut) => (cut, 1),
                None => (t.to_string(), 0),
            }
        });
    }
    if opts.flag("removeFillerWords") {
        text = ops.apply(text, op("remove_filler_words", Impact::High), remove_filler_words);
    }
    text
}

/// `[text][id]` becomes `[text](url)`; definitions that were used are
/// deleted. Ids match case-insensitively and `[text][]` uses the text.
pub fn inline_reference_links(md: &str) -> (String, usize) {
    let defs: HashMap<String, String> = RE_LINK_DEF
        .captures_iter(md)
        .map(|caps| (caps[1].trim().to_lowercase(), caps[2].to_string()))
        .collect();
    if defs.is_empty() {
        return (md.to_string(), 0);
    }

    let mut used: HashSet<String> = HashSet::new();
    let (linked, count) = replace_with(&RE_REF_LINK, md, |caps| {
        let id = match caps[2].trim() {
            "" => caps[1].trim().to_lowercase(),
            id => id.to_lowercase(),
        };
        let url = defs.get(&id)?;
        used.insert(id);
        Some(format!("[{}]({url})", &caps[1]))
    });
    let out = RE_LINK_DEF
        .replace_all(&linked, |caps: &Captures| {
            if used.contains(&caps[1].trim().to_lowercase()) {
                String::new()
            } else {
                caps[0].to_string()
            }
        })
        .into_owned();
    (out, count)
}

/// Strip `**bold**` and `__bold__` markers inside fenced code blocks.
pub fn clean_code_blocks(md: &str) -> (String, usize) {
    let mut total = 0;
    let out = RE_FENCE
        .replace_all(md, |caps: &Captures| {
            let (block, n) = replace_with(&RE_EMPHASIS, &caps[0], |inner| {
                Some(inner.get(1).or(inner.get(2))?.as_str().to_string())
            });
            total += n;
            block
        })
        .into_owned();
    (out, total)
}

pub fn truncate_alt_text(md: &str, max: usize) -> (String, usize) {
    replace_with(&RE_IMAGE_ALT, md, |caps| {
        let alt = truncate_chars(&caps[1], max)?;
        Some(format!("![{alt}]("))
    })
}

/// Drop every sentence whose trimmed text already appeared earlier.
pub fn remove_duplicate_sentences(text: &str) -> (String, usize) {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut out = String::with_capacity(text.len());
    let mut removed = 0;
    for m in RE_SENTENCE.find_iter(text) {
        let sentence = m.as_str().trim();
        if sentence.is_empty() || seen.insert(sentence) {
            out.push_str(m.as_str());
        } else {
            removed += 1;
        }
    }
    (out, removed)
}

pub fn remove_filler_words(text: &str) -> (String, usize) {
    let (stripped, count) = replace_counted(&RE_FILLER, text, "");
    if count == 0 {
        return (text.to_string(), 0);
    }
    let (tidy, _) = replace_counted(&RE_SPACE_BEFORE_PUNCT, &stripped, "$1");
    (tidy, count)
}
