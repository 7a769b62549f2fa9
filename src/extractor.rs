//! Headline extraction from a parsed home page.
//!
//! The extractor walks the document in document order, stops at the first
//! heading (within the configured levels) whose text matches the requested
//! section, and returns the text of the next hyperlink after it. The link may
//! be nested inside the heading or anywhere later in the page.
//!
//! Every lookup is a fresh scan of the whole document, so resolving several
//! sections against one page never shares state between them.
//!
//! # Match Policies
//!
//! | Policy | Heading `"Latest News"` vs `"news"` | `"Newsletter"` vs `"News"` |
//! |--------|------------------------------------|----------------------------|
//! | [`MatchPolicy::Contains`] | no (case-sensitive) | yes |
//! | [`MatchPolicy::WholeWord`] | yes | no |

use crate::models::{DailyRecord, Headline};
use clap::ValueEnum;
use regex::Regex;
use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

/// How a heading's text is compared against a section name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// Heading text contains the target verbatim (case-sensitive substring).
    Contains,
    /// Target appears as a whole word in the heading, ignoring case.
    #[default]
    WholeWord,
}

impl fmt::Display for MatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchPolicy::Contains => f.write_str("contains"),
            MatchPolicy::WholeWord => f.write_str("whole_word"),
        }
    }
}

/// A compiled form of [`MatchPolicy`] for one set of targets.
enum Matcher<'a> {
    Contains(Vec<&'a str>),
    WholeWord(Vec<Regex>),
}

impl<'a> Matcher<'a> {
    fn new(policy: MatchPolicy, targets: &'a [String]) -> Self {
        let targets = targets
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty());
        match policy {
            MatchPolicy::Contains => Matcher::Contains(targets.collect()),
            MatchPolicy::WholeWord => Matcher::WholeWord(
                targets
                    .filter_map(|t| {
                        // Half boundaries only require a non-word neighbour outside the
                        // target, so edges like `#Trending` or `Q&A:` still match.
                        let pattern =
                            format!(r"(?i)\b{{start-half}}{}\b{{end-half}}", regex::escape(t));
                        match Regex::new(&pattern) {
                            Ok(re) => Some(re),
                            Err(e) => {
                                warn!(section = t, error = %e, "Could not compile section pattern");
                                None
                            }
                        }
                    })
                    .collect(),
            ),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Matcher::Contains(targets) => targets.is_empty(),
            Matcher::WholeWord(patterns) => patterns.is_empty(),
        }
    }

    fn matches(&self, text: &str) -> bool {
        match self {
            Matcher::Contains(targets) => targets.iter().any(|t| text.contains(t)),
            Matcher::WholeWord(patterns) => patterns.iter().any(|re| re.is_match(text)),
        }
    }
}

/// Finds the top headline under a named section heading.
#[derive(Debug, Clone)]
pub struct HeadlineExtractor {
    policy: MatchPolicy,
    heading_levels: Vec<u8>,
}

impl HeadlineExtractor {
    /// Create an extractor that only considers `h{level}` headings for the given levels.
    ///
    /// Levels outside `1..=6` are ignored; [`crate::config::Config::validate`]
    /// rejects them before an extractor is ever built from user input.
    pub fn new(policy: MatchPolicy, heading_levels: impl IntoIterator<Item = u8>) -> Self {
        let mut heading_levels: Vec<u8> = heading_levels
            .into_iter()
            .filter(|l| (1..=6).contains(l))
            .collect();
        heading_levels.sort_unstable();
        heading_levels.dedup();
        Self {
            policy,
            heading_levels,
        }
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// Return the top headline for `section`, or an empty string when the page
    /// has no matching heading or no hyperlink after it.
    pub fn find_top_headline(&self, document: &Html, section: &str) -> Headline {
        self.find_first_headline(document, std::slice::from_ref(&section.to_string()))
    }

    /// Like [`find_top_headline`](Self::find_top_headline), but the heading may
    /// match any of `targets` (e.g. `"Video"` or `"Gallery"`).
    pub fn find_first_headline(&self, document: &Html, targets: &[String]) -> Headline {
        let matcher = Matcher::new(self.policy, targets);
        if matcher.is_empty() {
            return String::new();
        }

        let mut elements = document.tree.root().descendants().filter_map(ElementRef::wrap);

        let heading = elements
            .by_ref()
            .find(|el| self.is_tracked_heading(el) && matcher.matches(&element_text(el)));
        let Some(heading) = heading else {
            debug!(?targets, "No matching heading");
            return String::new();
        };

        // `elements` resumes right after the heading's start tag, so links
        // nested in the heading are found first.
        match elements.find(|el| el.value().name().eq_ignore_ascii_case("a")) {
            Some(link) => {
                let text = normalize_whitespace(&element_text(&link));
                debug!(heading = %element_text(&heading).trim(), headline = %text, "Matched heading");
                text
            }
            None => {
                debug!(?targets, "Matching heading has no following link");
                String::new()
            }
        }
    }

    /// Resolve every section independently. Each requested name is kept as a
    /// key; misses map to an empty headline.
    pub fn extract_sections(&self, document: &Html, sections: &[String]) -> DailyRecord {
        let headlines: BTreeMap<String, Headline> = sections
            .iter()
            .map(|section| (section.clone(), self.find_top_headline(document, section)))
            .collect();
        DailyRecord::Sections(headlines)
    }

    fn is_tracked_heading(&self, el: &ElementRef<'_>) -> bool {
        heading_level(el.value().name())
            .map(|level| self.heading_levels.contains(&level))
            .unwrap_or(false)
    }
}

/// Parse response body text into a document tree.
pub fn parse_document(body: &str) -> Html {
    Html::parse_document(body)
}

fn heading_level(tag: &str) -> Option<u8> {
    let bytes = tag.as_bytes();
    match bytes {
        [h, d] if h.eq_ignore_ascii_case(&b'h') && (b'1'..=b'6').contains(d) => Some(d - b'0'),
        _ => None,
    }
}

fn element_text(el: &ElementRef<'_>) -> String {
    el.text().collect::<String>()
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
