//! Rewrites Obsidian image embeds (`![[file.png]]`) into standard markdown images.
//!
//! Fenced code blocks and inline code spans are left untouched. Only `svg`,
//! `png`, `jpg` and `jpeg` targets are rewritten; any other embed stays as
//! written.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

/// URL prefix for rewritten image links.
pub const DEFAULT_ASSET_BASE: &str = "/assets";

static FENCED_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```.*?```").expect("valid regex"));
static INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`[^`]*`").expect("valid regex"));
static IMAGE_EMBED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)!\[\[([^\]]+\.(?:svg|png|jpe?g))\]\]").expect("valid regex"));

/// Rewritten text plus enough bookkeeping to map offsets back to the input.
#[derive(Debug, Clone)]
pub struct Rewritten {
    pub text: String,
    edits: Vec<Edit>,
}

/// One replaced embed: where it was in the input and where it is in the output.
#[derive(Debug, Clone)]
struct Edit {
    original: Range<usize>,
    rewritten: Range<usize>,
}

impl Rewritten {
    /// Map a byte offset in the rewritten text to the matching offset in the input.
    /// Offsets inside a replaced link map to the start of the original embed.
    pub fn original_offset(&self, offset: usize) -> usize {
        let mut shift: isize = 0;
        for edit in &self.edits {
            if offset < edit.rewritten.start {
                break;
            }
            if offset < edit.rewritten.end {
                return edit.original.start;
            }
            shift = edit.original.end as isize - edit.rewritten.end as isize;
        }
        (offset as isize + shift).max(0) as usize
    }

    pub fn original_span(&self, span: &Range<usize>) -> Range<usize> {
        let start = self.original_offset(span.start);
        let end = self.original_offset(span.end).max(start);
        start..end
    }
}

/// Rewrite embeds using the default `/assets` prefix.
pub fn rewrite_obsidian_links(text: &str) -> String {
    rewrite(text, DEFAULT_ASSET_BASE).text
}

/// Rewrite every image embed outside code into `![alt](<asset_base>/<encoded name>)`.
pub fn rewrite(text: &str, asset_base: &str) -> Rewritten {
    let base = asset_base.trim_end_matches('/');
    let mut out = String::with_capacity(text.len());
    let mut edits = Vec::new();
    let mut copied = 0;

    for gap in unprotected_ranges(text) {
        for caps in IMAGE_EMBED.captures_iter(&text[gap.clone()]) {
            let (Some(whole), Some(target)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let start = gap.start + whole.start();
            let end = gap.start + whole.end();

            out.push_str(&text[copied..start]);
            let replacement = image_link(target.as_str(), base);
            let rewritten_start = out.len();
            out.push_str(&replacement);
            edits.push(Edit {
                original: start..end,
                rewritten: rewritten_start..out.len(),
            });
            copied = end;
        }
    }
    out.push_str(&text[copied..]);

    Rewritten { text: out, edits }
}

fn image_link(target: &str, base: &str) -> String {
    let file_name = target.rsplit(['/', '\\']).next().unwrap_or(target);
    let alt = match file_name.rfind('.') {
        Some(dot) => &file_name[..dot],
        None => file_name,
    };
    format!("![{}]({}/{})", alt, base, urlencoding::encode(file_name))
}

/// Byte ranges of `text` outside fenced code blocks and inline code spans.
fn unprotected_ranges(text: &str) -> Vec<Range<usize>> {
    let mut protected: Vec<Range<usize>> = Vec::new();
    let mut outside_fences = Vec::new();
    let mut pos = 0;
    for m in FENCED_CODE.find_iter(text) {
        outside_fences.push(pos..m.start());
        protected.push(m.range());
        pos = m.end();
    }
    outside_fences.push(pos..text.len());

    for gap in outside_fences {
        for m in INLINE_CODE.find_iter(&text[gap.clone()]) {
            protected.push(gap.start + m.start()..gap.start + m.end());
        }
    }
    protected.sort_by_key(|r| r.start);

    let mut ranges = Vec::new();
    let mut pos = 0;
    for range in protected {
        if range.start > pos {
            ranges.push(pos..range.start);
        }
        pos = pos.max(range.end);
    }
    if pos < text.len() {
        ranges.push(pos..text.len());
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_after_a_rewrite_shift_back() {
        let input = "a ![[x y.png]] b";
        let rewritten = rewrite(input, DEFAULT_ASSET_BASE);
        assert_eq!(rewritten.text, "a ![x y](/assets/x%20y.png) b");

        let b_in_output = rewritten.text.rfind('b').unwrap();
        assert_eq!(rewritten.original_offset(b_in_output), input.rfind('b').unwrap());
        assert_eq!(rewritten.original_offset(0), 0);
        assert_eq!(rewritten.original_offset(5), 2);
    }

    #[test]
    fn protected_ranges_skip_code() {
        let text = "x `y` z\n```\nq\n```\nw";
        let ranges = unprotected_ranges(text);
        let pieces: Vec<&str> = ranges.iter().map(|r| &text[r.clone()]).collect();
        assert_eq!(pieces, vec!["x ", " z\n", "\nw"]);
    }
}
