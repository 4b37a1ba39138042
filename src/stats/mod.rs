//! Language statistics derived from loaded diffs.
//!
//! Unified diff headers name files as `a/<path>` and `b/<path>`. Every such
//! occurrence with an extension is counted towards the language its
//! extension maps to, so a file touched once usually counts twice (once per
//! header line). The ranking is recomputed from scratch on each call and is
//! never persisted.

mod languages;

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use crate::listing::DiffItem;

use languages::display_language;

/// Number of languages kept in the ranking.
pub const TOP_LANGUAGE_LIMIT: usize = 3;

/// Placeholder shown when no diff names a file with an extension.
pub const NO_LANGUAGE_DATA: &str = "No language data";

/// Occurrence count for one display language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageCount {
    /// Display name, e.g. `Python`, or the uppercased extension.
    pub language: String,
    /// Number of path occurrences.
    pub count: usize,
}

impl fmt::Display for LanguageCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.language, self.count)
    }
}

/// Iterator over the extensions of `a/` and `b/` prefixed paths in diff text.
///
/// A path holds at least one character and never spans a line break; it ends
/// at the first `.` followed by an ASCII word character, and the extension
/// is the longest run of ASCII word characters after that dot.
#[derive(Debug, Clone)]
pub struct ExtensionMatches<'a> {
    text: &'a str,
    position: usize,
}

impl<'a> ExtensionMatches<'a> {
    /// Starts scanning `text` from the beginning.
    #[must_use]
    pub const fn new(text: &'a str) -> Self {
        Self { text, position: 0 }
    }
}

impl<'a> Iterator for ExtensionMatches<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.text.as_bytes();
        while self.position < bytes.len() {
            let start = self.position;
            self.position += 1;

            let is_prefix = matches!(bytes.get(start), Some(b'a' | b'b'))
                && bytes.get(start + 1) == Some(&b'/');
            if !is_prefix {
                continue;
            }

            if let Some((ext_start, ext_end)) = match_path(bytes, start + 2) {
                self.position = ext_end;
                return self.text.get(ext_start..ext_end);
            }
        }
        None
    }
}

const fn is_word_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

const fn is_line_terminator(byte: u8) -> bool {
    matches!(byte, b'\n' | b'\r')
}

/// Finds the lazily shortest path starting at `path_start` and returns the
/// byte range of its extension.
fn match_path(bytes: &[u8], path_start: usize) -> Option<(usize, usize)> {
    let mut dot = path_start + 1;
    while let Some(&candidate) = bytes.get(dot) {
        match bytes.get(dot - 1) {
            Some(&previous) if !is_line_terminator(previous) => {}
            _ => return None,
        }

        let followed_by_word = bytes.get(dot + 1).is_some_and(|next| is_word_byte(*next));
        if candidate == b'.' && followed_by_word {
            let ext_start = dot + 1;
            let ext_len = bytes
                .iter()
                .skip(ext_start)
                .take_while(|byte| is_word_byte(**byte))
                .count();
            return Some((ext_start, ext_start + ext_len));
        }
        dot += 1;
    }
    None
}

/// Counts every language occurrence across `diffs`, most frequent first.
///
/// Languages with equal counts keep the order in which they were first seen.
#[must_use]
pub fn count_languages(diffs: &[DiffItem]) -> Vec<LanguageCount> {
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for item in diffs {
        for extension in ExtensionMatches::new(&item.diff) {
            *counts.entry(display_language(extension)).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<LanguageCount> = counts
        .into_iter()
        .map(|(language, count)| LanguageCount { language, count })
        .collect();
    ranked.sort_by(|left, right| right.count.cmp(&left.count));
    ranked
}

/// Returns the [`TOP_LANGUAGE_LIMIT`] most frequent languages in `diffs`.
#[must_use]
pub fn top_languages(diffs: &[DiffItem]) -> Vec<LanguageCount> {
    let mut ranked = count_languages(diffs);
    ranked.truncate(TOP_LANGUAGE_LIMIT);
    ranked
}

/// Figures shown in the PR stats panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrStats {
    /// Number of merged pull requests.
    pub merged_count: usize,
    /// Top languages touched by the loaded diffs.
    pub top_languages: Vec<LanguageCount>,
}

impl PrStats {
    /// Derives stats from the loaded diffs.
    ///
    /// `total_merged` overrides the merged count when the caller knows the
    /// repository-wide total; otherwise the number of loaded diffs is used.
    #[must_use]
    pub fn from_diffs(diffs: &[DiffItem], total_merged: Option<usize>) -> Self {
        Self {
            merged_count: total_merged.unwrap_or(diffs.len()),
            top_languages: top_languages(diffs),
        }
    }

    /// Renders the ranking as `Python (2), Go (1)`, or the placeholder.
    #[must_use]
    pub fn languages_label(&self) -> String {
        if self.top_languages.is_empty() {
            return NO_LANGUAGE_DATA.to_owned();
        }
        self.top_languages
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{ExtensionMatches, LanguageCount, NO_LANGUAGE_DATA, PrStats, top_languages};
    use crate::listing::DiffItem;

    fn item(diff: &str) -> DiffItem {
        DiffItem {
            id: "1".to_owned(),
            description: String::new(),
            diff: diff.to_owned(),
            url: String::new(),
        }
    }

    fn counts(entries: &[(&str, usize)]) -> Vec<LanguageCount> {
        entries
            .iter()
            .map(|(language, count)| LanguageCount {
                language: (*language).to_owned(),
                count: *count,
            })
            .collect()
    }

    fn headers(path: &str, times: usize) -> String {
        format!("--- a/{path}\n").repeat(times)
    }

    #[test]
    fn header_pair_counts_twice() {
        let diffs = [item("--- a/src/main.py\n+++ b/src/main.py\n@@ -1 +1 @@\n")];

        assert_eq!(top_languages(&diffs), counts(&[("Python", 2)]));
    }

    #[test]
    fn diff_without_prefixed_paths_yields_nothing() {
        let diffs = [item("@@ -1,2 +1,2 @@\n-old line\n+new line\n")];

        assert!(top_languages(&diffs).is_empty());
    }

    #[test]
    fn no_diffs_yield_nothing() {
        assert!(top_languages(&[]).is_empty());
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let text = format!(
            "{}{}{}",
            headers("cmd/main.go", 5),
            headers("src/lib.rs", 5),
            headers("tools/gen.py", 1)
        );

        assert_eq!(
            top_languages(&[item(&text)]),
            counts(&[("Go", 5), ("Rust", 5), ("Python", 1)])
        );
    }

    #[test]
    fn ranking_keeps_only_three_languages() {
        let text = format!(
            "{}{}{}{}",
            headers("a.ts", 1),
            headers("b.rs", 4),
            headers("c.go", 3),
            headers("d.md", 2)
        );

        assert_eq!(
            top_languages(&[item(&text)]),
            counts(&[("Rust", 4), ("Go", 3), ("Markdown", 2)])
        );
    }

    #[test]
    fn counts_accumulate_across_diffs() {
        let diffs = [item(&headers("x.ts", 1)), item(&headers("y.ts", 2))];

        assert_eq!(top_languages(&diffs), counts(&[("TypeScript", 3)]));
    }

    #[rstest]
    #[case::shortest_path("a/docs.v2/readme.md", vec!["v2"])]
    #[case::unknown_extension("b/infra/main.tf", vec!["tf"])]
    #[case::path_cannot_span_lines("a/Makefile\nb/x.rs", vec!["rs"])]
    #[case::needs_a_path_character("a/.env", vec![])]
    #[case::embedded_prefix("lib/util.rb", vec!["rb"])]
    #[case::consecutive_matches("a/one.c b/two.h", vec!["c", "h"])]
    fn scanner_follows_path_rules(#[case] text: &str, #[case] expected: Vec<&str>) {
        assert_eq!(ExtensionMatches::new(text).collect::<Vec<_>>(), expected);
    }

    #[test]
    fn unknown_extensions_display_uppercased() {
        let diffs = [item("--- a/infra/main.tf\n+++ b/infra/main.tf\n")];

        assert_eq!(top_languages(&diffs), counts(&[("TF", 2)]));
    }

    #[rstest]
    #[case::explicit_total(Some(42), 42)]
    #[case::loaded_count(None, 1)]
    fn merged_count_prefers_explicit_total(#[case] total: Option<usize>, #[case] expected: usize) {
        let stats = PrStats::from_diffs(&[item("")], total);

        assert_eq!(stats.merged_count, expected);
    }

    #[test]
    fn label_lists_languages_or_placeholder() {
        let populated = PrStats::from_diffs(
            &[item("--- a/app.py\n+++ b/app.py\n--- a/main.go\n")],
            None,
        );
        let empty = PrStats::from_diffs(&[], None);

        assert_eq!(populated.languages_label(), "Python (2), Go (1)");
        assert_eq!(empty.languages_label(), NO_LANGUAGE_DATA);
    }
}
