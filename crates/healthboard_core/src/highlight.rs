//! Case-insensitive substring matching and highlight segmentation.
//!
//! Matching happens on a lower-cased copy of the text while the returned
//! segments always slice the original, so the source casing is preserved.

/// A normalized free-text query: trimmed and lower-cased. Empty means "no query".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchQuery {
    raw: String,
    needle: String,
}

impl SearchQuery {
    pub fn new(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            needle: fold_case(raw.trim()),
        }
    }

    /// The text as typed, for echoing back into the input.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn needle(&self) -> &str {
        &self.needle
    }

    pub fn is_empty(&self) -> bool {
        self.needle.is_empty()
    }

    /// True when there is no query or `text` contains it.
    pub fn accepts(&self, text: &str) -> bool {
        self.is_empty() || contains_ignore_case(text, &self.needle)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub is_match: bool,
}

/// Text split into plain and matched segments.
///
/// Never contains empty segments and never two adjacent plain segments.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MarkedText {
    segments: Vec<Segment>,
}

impl MarkedText {
    pub fn plain(text: &str) -> Self {
        let mut marked = Self::default();
        marked.push(text, false);
        marked
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn has_match(&self) -> bool {
        self.segments.iter().any(|s| s.is_match)
    }

    pub fn match_count(&self) -> usize {
        self.segments.iter().filter(|s| s.is_match).count()
    }

    /// Concatenation of all segments, equal to the source text.
    pub fn text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }

    pub(crate) fn push(&mut self, text: &str, is_match: bool) {
        if text.is_empty() {
            return;
        }
        if !is_match {
            if let Some(last) = self.segments.last_mut() {
                if !last.is_match {
                    last.text.push_str(text);
                    return;
                }
            }
        }
        self.segments.push(Segment {
            text: text.to_string(),
            is_match,
        });
    }
}

/// Marks the first occurrence of `needle` in `text`.
pub fn highlight_first(text: &str, needle: &str) -> MarkedText {
    highlight(text, needle, Some(1))
}

/// Marks every non-overlapping occurrence of `needle` in `text`.
pub fn highlight_all(text: &str, needle: &str) -> MarkedText {
    highlight(text, needle, None)
}

pub fn contains_ignore_case(text: &str, needle: &str) -> bool {
    needle.is_empty() || find_ignore_case(text, &fold_case(needle), 0).is_some()
}

/// Lower-cases char by char, so text and needle fold identically regardless
/// of word position. Final sigma folds to the medial form.
fn fold_case(text: &str) -> String {
    text.chars().flat_map(fold_char).collect()
}

fn fold_char(ch: char) -> impl Iterator<Item = char> {
    ch.to_lowercase()
        .map(|lower| if lower == 'ς' { 'σ' } else { lower })
}

fn highlight(text: &str, needle: &str, limit: Option<usize>) -> MarkedText {
    let needle = fold_case(needle);
    let mut marked = MarkedText::default();
    if needle.is_empty() {
        marked.push(text, false);
        return marked;
    }

    let mut cursor = 0;
    let mut found = 0;
    while limit.map_or(true, |max| found < max) {
        let Some((start, end)) = find_ignore_case(text, &needle, cursor) else {
            break;
        };
        marked.push(&text[cursor..start], false);
        marked.push(&text[start..end], true);
        cursor = end;
        found += 1;
    }
    marked.push(&text[cursor..], false);
    marked
}

/// Finds the byte range in `text` (at or after `from`) whose lower-cased form
/// contains `needle` (already folded by `fold_case`). Ranges are snapped to
/// whole chars of the original, which matters when lowering changes a
/// char's byte length.
fn find_ignore_case(text: &str, needle: &str, from: usize) -> Option<(usize, usize)> {
    let tail = &text[from..];
    let mut lowered = String::with_capacity(tail.len());
    // For every byte of `lowered`, the original char range it came from.
    let mut origin: Vec<(usize, usize)> = Vec::with_capacity(tail.len());
    for (offset, ch) in tail.char_indices() {
        let start = from + offset;
        let end = start + ch.len_utf8();
        for lower in fold_char(ch) {
            lowered.push(lower);
            origin.extend(std::iter::repeat((start, end)).take(lower.len_utf8()));
        }
    }

    let hit = lowered.find(needle)?;
    let last = hit + needle.len() - 1;
    Some((origin[hit].0, origin[last].1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(marked: &MarkedText) -> Vec<(&str, bool)> {
        marked
            .segments()
            .iter()
            .map(|s| (s.text.as_str(), s.is_match))
            .collect()
    }

    #[test]
    fn query_is_trimmed_and_lowercased() {
        let query = SearchQuery::new("  SqL ");
        assert_eq!(query.needle(), "sql");
        assert!(query.accepts("SQL01"));
        assert!(SearchQuery::new("   ").is_empty());
    }

    #[test]
    fn first_match_keeps_source_casing() {
        let marked = highlight_first("srv-SQL01 / sql02", "SqL");
        assert_eq!(
            parts(&marked),
            vec![("srv-", false), ("SQL", true), ("01 / sql02", false)]
        );
    }

    #[test]
    fn all_matches_are_marked() {
        let marked = highlight_all("error: Error", "error");
        assert_eq!(
            parts(&marked),
            vec![("error", true), (": ", false), ("Error", true)]
        );
        assert_eq!(marked.match_count(), 2);
    }

    #[test]
    fn no_match_yields_single_plain_segment() {
        let marked = highlight_first("DC01", "sql");
        assert_eq!(parts(&marked), vec![("DC01", false)]);
        assert!(!marked.has_match());
    }

    #[test]
    fn empty_text_has_no_segments() {
        assert!(highlight_first("", "x").segments().is_empty());
        assert!(MarkedText::plain("").segments().is_empty());
    }

    #[test]
    fn whole_text_match_has_no_empty_wrappers() {
        let marked = highlight_first("SQL", "sql");
        assert_eq!(parts(&marked), vec![("SQL", true)]);
    }

    #[test]
    fn non_ascii_text_round_trips() {
        let text = "Udział ŁÓDŹ-01";
        let marked = highlight_first(text, "łódź");
        assert_eq!(marked.text(), text);
        assert_eq!(
            parts(&marked),
            vec![("Udział ", false), ("ŁÓDŹ", true), ("-01", false)]
        );
    }

    #[test]
    fn greek_final_sigma_matches_itself() {
        let query = SearchQuery::new("ΟΔΟΣ");
        assert!(query.accepts("ΟΔΟΣ"));
        assert!(SearchQuery::new("οδος").accepts("ΟΔΟΣ 12"));
        assert_eq!(query.needle(), "οδοσ");
        assert_eq!(parts(&highlight_all("ΟΔΟΣ", "ΟΔΟΣ")), vec![("ΟΔΟΣ", true)]);
    }

    #[test]
    fn length_changing_lowercase_is_snapped_to_chars() {
        // 'İ' lowercases to two chars; the match must cover the whole original char.
        let text = "xİy";
        let marked = highlight_first(text, "i\u{307}");
        assert_eq!(marked.text(), text);
        assert_eq!(parts(&marked), vec![("x", false), ("İ", true), ("y", false)]);
    }
}
