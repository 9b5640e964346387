//! Quote location inside extracted page text.
//!
//! Text extracted from a PDF rarely reproduces a quote byte for byte: runs are
//! split at arbitrary points, spacing drifts, and ligatures at the edges of a
//! phrase come out differently. The matcher therefore works on one normalized
//! string built from every text item of a page, keeping a map from each byte
//! of that string back to the item it came from.

use serde::{Deserialize, Serialize};

/// Quotes longer than this (in normalized characters) get a second, fuzzy pass.
pub const FUZZY_MIN_CHARS: usize = 30;

/// Offset and width of the fuzzy probe, in percent of the quote length.
const FUZZY_START_PCT: usize = 20;
const FUZZY_SPAN_PCT: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    Exact,
    Fuzzy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult<H> {
    /// Distinct owners overlapping the match, in text order.
    Found { owners: Vec<H>, mode: MatchMode },
    NotFound,
}

impl<H> MatchResult<H> {
    pub fn is_found(&self) -> bool {
        matches!(self, MatchResult::Found { .. })
    }

    pub fn owners(&self) -> &[H] {
        match self {
            MatchResult::Found { owners, .. } => owners,
            MatchResult::NotFound => &[],
        }
    }

    pub fn mode(&self) -> Option<MatchMode> {
        match self {
            MatchResult::Found { mode, .. } => Some(*mode),
            MatchResult::NotFound => None,
        }
    }
}

/// Collapse every whitespace run to a single space and lower-case.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_space = false;
    push_normalized(&mut out, &mut Vec::<Option<()>>::new(), text, None, &mut last_space);
    out
}

fn push_normalized<H: Copy>(
    out: &mut String,
    owners: &mut Vec<Option<H>>,
    text: &str,
    owner: Option<H>,
    last_space: &mut bool,
) {
    for c in text.chars() {
        if c.is_whitespace() {
            if !*last_space {
                out.push(' ');
                owners.push(owner);
                *last_space = true;
            }
            continue;
        }
        for lower in c.to_lowercase() {
            out.push(lower);
            owners.extend(std::iter::repeat(owner).take(lower.len_utf8()));
        }
        *last_space = false;
    }
}

/// The normalized text of one page with its byte-to-owner map.
#[derive(Debug, Clone)]
pub struct Haystack<H> {
    text: String,
    /// One entry per byte of `text`; `None` for inserted separators.
    owners: Vec<Option<H>>,
}

impl<H: Copy + PartialEq> Haystack<H> {
    /// Join all item texts with a single space, normalizing as we go.
    pub fn build<'a, I>(items: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, H)>,
    {
        let mut text = String::new();
        let mut owners = Vec::new();
        let mut last_space = false;

        for (i, (item_text, owner)) in items.into_iter().enumerate() {
            if i > 0 && !last_space {
                text.push(' ');
                owners.push(None);
                last_space = true;
            }
            push_normalized(&mut text, &mut owners, item_text, Some(owner), &mut last_space);
        }

        debug_assert_eq!(text.len(), owners.len());
        Self { text, owners }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Find `quote`, exactly first and then by its middle section.
    pub fn locate(&self, quote: &str) -> MatchResult<H> {
        let needle = normalize(quote);
        let needle = needle.trim();
        if needle.is_empty() {
            return MatchResult::NotFound;
        }

        if let Some(start) = self.text.find(needle) {
            return self.found(start, needle.len(), MatchMode::Exact);
        }

        let chars: Vec<char> = needle.chars().collect();
        if chars.len() <= FUZZY_MIN_CHARS {
            return MatchResult::NotFound;
        }

        let from = chars.len() * FUZZY_START_PCT / 100;
        let span = chars.len() * FUZZY_SPAN_PCT / 100;
        let middle: String = chars[from..from + span].iter().collect();

        match self.text.find(middle.as_str()) {
            Some(start) => self.found(start, middle.len(), MatchMode::Fuzzy),
            None => MatchResult::NotFound,
        }
    }

    fn found(&self, start: usize, len: usize, mode: MatchMode) -> MatchResult<H> {
        let mut owners: Vec<H> = Vec::new();
        for owner in self.owners[start..start + len].iter().flatten() {
            if !owners.contains(owner) {
                owners.push(*owner);
            }
        }

        // A needle made of separators alone cannot reach this point since it
        // was trimmed, but an empty owner set must still read as a miss.
        if owners.is_empty() {
            return MatchResult::NotFound;
        }
        MatchResult::Found { owners, mode }
    }
}

/// One-shot form of [`Haystack::locate`].
pub fn locate<'a, H, I>(items: I, quote: &str) -> MatchResult<H>
where
    H: Copy + PartialEq,
    I: IntoIterator<Item = (&'a str, H)>,
{
    Haystack::build(items).locate(quote)
}
