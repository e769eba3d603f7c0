// ABOUTME: Slide selector parsing for the slide-audit application
// ABOUTME: Turns specs like "1,3,5-7" into validated, ascending sets of slide indices

use crate::errors::{AuditError, Result};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Item {
    Single(usize),
    Range(usize, usize),
}

/// A user-supplied set of 1-based slide indices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideSelector {
    items: Vec<Item>,
}

impl SlideSelector {
    /// Parse a comma-separated list of indices and inclusive `a-b` ranges.
    ///
    /// Only the syntax is checked here; whether the indices exist in a deck
    /// is decided by [`SlideSelector::resolve`].
    pub fn parse(spec: &str) -> Result<Self> {
        let mut items = Vec::new();

        for raw in spec.split(',') {
            let part = raw.trim();
            if part.is_empty() {
                return Err(AuditError::SelectorValidation(format!(
                    "empty item in {:?}",
                    spec
                )));
            }

            let item = match part.split_once('-') {
                Some((start, end)) => {
                    let start = parse_index(start, part)?;
                    let end = parse_index(end, part)?;
                    if end < start {
                        return Err(AuditError::SelectorValidation(format!(
                            "range {:?} runs backwards",
                            part
                        )));
                    }
                    Item::Range(start, end)
                }
                None => Item::Single(parse_index(part, part)?),
            };
            items.push(item);
        }

        Ok(Self { items })
    }

    /// Resolve against a deck with `slide_count` slides.
    ///
    /// Every item reaching past the slide count is reported at once, as a
    /// span for ranges. Bounds are checked before any index is collected.
    pub fn resolve(&self, slide_count: usize) -> Result<BTreeSet<usize>> {
        let mut beyond: BTreeSet<(usize, usize)> = BTreeSet::new();
        for item in &self.items {
            let (start, end) = item.bounds();
            if end > slide_count {
                beyond.insert((start.max(slide_count + 1), end));
            }
        }
        if !beyond.is_empty() {
            return Err(AuditError::SelectorValidation(format!(
                "slide(s) {} out of range, deck has {} slide(s)",
                describe_spans(&beyond),
                slide_count
            )));
        }

        let mut indices = BTreeSet::new();
        for item in &self.items {
            let (start, end) = item.bounds();
            indices.extend(start..=end);
        }
        Ok(indices)
    }
}

impl Item {
    fn bounds(self) -> (usize, usize) {
        match self {
            Item::Single(n) => (n, n),
            Item::Range(start, end) => (start, end),
        }
    }
}

// Merge overlapping or adjacent spans and print them as "10, 12-15"
fn describe_spans(spans: &BTreeSet<(usize, usize)>) -> String {
    let mut merged: Vec<(usize, usize)> = Vec::new();
    for &(start, end) in spans {
        match merged.last_mut() {
            Some(last) if start <= last.1.saturating_add(1) => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }
    merged
        .iter()
        .map(|&(start, end)| {
            if start == end {
                start.to_string()
            } else {
                format!("{}-{}", start, end)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn parse_index(text: &str, item: &str) -> Result<usize> {
    let n: usize = text.trim().parse().map_err(|_| {
        AuditError::SelectorValidation(format!("{:?} is not a slide number or range", item))
    })?;
    if n == 0 {
        return Err(AuditError::SelectorValidation(format!(
            "slide numbers start at 1, got {:?}",
            item
        )));
    }
    Ok(n)
}

impl FromStr for SlideSelector {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for SlideSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .items
            .iter()
            .map(|item| match item {
                Item::Single(n) => n.to_string(),
                Item::Range(a, b) => format!("{}-{}", a, b),
            })
            .collect();
        write!(f, "{}", parts.join(","))
    }
}
