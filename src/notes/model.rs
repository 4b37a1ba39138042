//! Dual-tone release notes and the parser for provider answers.

use serde::{Deserialize, Serialize};

use crate::error::DigestError;

const DEVELOPER_HEADING: &str = "developer:";
const MARKETING_HEADING: &str = "marketing:";

/// Release notes for one pull request in two registers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseNotes {
    /// Technical note aimed at developers.
    pub developer: String,
    /// Benefit-focused note aimed at users.
    pub marketing: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Developer,
    Marketing,
}

impl ReleaseNotes {
    /// Parses an answer laid out as `Developer: ...` followed by
    /// `Marketing: ...`.
    ///
    /// Headings are matched case-insensitively and may carry Markdown
    /// emphasis or list markers. A section continues until the next heading.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::Generation`] when either section is missing or
    /// empty.
    pub fn parse(answer: &str) -> Result<Self, DigestError> {
        let mut developer: Vec<&str> = Vec::new();
        let mut marketing: Vec<&str> = Vec::new();
        let mut current: Option<Section> = None;

        for line in answer.lines() {
            if let Some((section, rest)) = heading(line) {
                current = Some(section);
                push_line(section, rest, &mut developer, &mut marketing);
                continue;
            }
            if let Some(section) = current {
                push_line(section, line, &mut developer, &mut marketing);
            }
        }

        let developer_text = developer.join("\n").trim().to_owned();
        let marketing_text = marketing.join("\n").trim().to_owned();
        if developer_text.is_empty() || marketing_text.is_empty() {
            return Err(DigestError::Generation {
                message: "AI response did not contain developer and marketing notes".to_owned(),
            });
        }

        Ok(Self {
            developer: developer_text,
            marketing: marketing_text,
        })
    }
}

fn push_line<'a>(
    section: Section,
    line: &'a str,
    developer: &mut Vec<&'a str>,
    marketing: &mut Vec<&'a str>,
) {
    match section {
        Section::Developer => developer.push(line),
        Section::Marketing => marketing.push(line),
    }
}

fn heading(line: &str) -> Option<(Section, &str)> {
    let stripped = line
        .trim_start_matches(|c: char| c.is_whitespace() || matches!(c, '*' | '#' | '-' | '_'));
    let lowered = stripped.to_ascii_lowercase();
    let (section, heading_len) = if lowered.starts_with(DEVELOPER_HEADING) {
        (Section::Developer, DEVELOPER_HEADING.len())
    } else if lowered.starts_with(MARKETING_HEADING) {
        (Section::Marketing, MARKETING_HEADING.len())
    } else {
        return None;
    };
    let rest = stripped
        .get(heading_len..)?
        .trim_start_matches(|c: char| c.is_whitespace() || matches!(c, '*' | '_'));
    Some((section, rest))
}
