//! Address-bar fragment grammar.
//!
//! A fragment is one of `#p<digits>`, `#<section>-p<digits>` or `#<section>`.
//! Percent-encoded input is decoded before parsing.

use std::fmt;

use crate::ElementId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentTarget {
    Paragraph(u32),
    Composite { section: String, paragraph: u32 },
    Section(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FragmentError {
    #[error("fragment `{0}` is not valid percent-encoded utf-8")]
    Encoding(String),
}

impl FragmentTarget {
    /// Parses a raw fragment as read from the address bar. The leading `#` is
    /// optional; an empty fragment yields `Ok(None)`.
    pub fn parse(raw: &str) -> Result<Option<Self>, FragmentError> {
        let decoded = decode(raw)?;
        Ok(Self::from_decoded(&decoded))
    }

    pub fn from_decoded(id: &str) -> Option<Self> {
        let id = id.strip_prefix('#').unwrap_or(id);
        if id.is_empty() {
            return None;
        }
        if let Some(paragraph) = paragraph_number(id) {
            return Some(Self::Paragraph(paragraph));
        }
        if let Some((section, digits)) = id.rsplit_once("-p")
            && let Some(paragraph) = parse_digits(digits)
        {
            return Some(Self::Composite {
                section: section.to_string(),
                paragraph,
            });
        }
        Some(Self::Section(id.to_string()))
    }

    /// Builds the fragment the location tracker writes for a section and an
    /// optional most-visible paragraph.
    pub fn for_location(section: &str, paragraph: Option<u32>) -> Self {
        match paragraph {
            Some(paragraph) => Self::Composite {
                section: section.to_string(),
                paragraph,
            },
            None => Self::Section(section.to_string()),
        }
    }

    /// The element id the fragment resolves to. The section part of a
    /// composite fragment is informational only.
    pub fn target_id(&self) -> ElementId {
        match self {
            Self::Paragraph(n) | Self::Composite { paragraph: n, .. } => ElementId::paragraph(*n),
            Self::Section(id) => ElementId::new(id.clone()),
        }
    }

    pub fn paragraph(&self) -> Option<u32> {
        match self {
            Self::Paragraph(n) | Self::Composite { paragraph: n, .. } => Some(*n),
            Self::Section(_) => None,
        }
    }

    pub fn is_paragraph_specific(&self) -> bool {
        self.paragraph().is_some()
    }

    pub fn to_fragment(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FragmentTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Paragraph(n) => write!(f, "#p{n}"),
            Self::Composite { section, paragraph } => write!(f, "#{section}-p{paragraph}"),
            Self::Section(id) => write!(f, "#{id}"),
        }
    }
}

pub fn decode(raw: &str) -> Result<String, FragmentError> {
    urlencoding::decode(raw)
        .map(|s| s.into_owned())
        .map_err(|_| FragmentError::Encoding(raw.to_string()))
}

/// `p15` → `15`. Anything else, including `p` alone, is not a paragraph id.
pub fn paragraph_number(id: &str) -> Option<u32> {
    id.strip_prefix('p').and_then(parse_digits)
}

/// True when the fragment points at a specific paragraph: it is `#p<digits>`
/// or contains `-p<digits>` anywhere.
pub fn is_paragraph_specific(raw: &str) -> bool {
    let decoded = decode(raw).unwrap_or_else(|_| raw.to_string());
    let id = decoded.strip_prefix('#').unwrap_or(&decoded);
    if paragraph_number(id).is_some() {
        return true;
    }
    id.match_indices("-p").any(|(idx, _)| {
        id[idx + 2..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit())
    })
}

fn parse_digits(digits: &str) -> Option<u32> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_bare_paragraph() {
        assert_eq!(
            FragmentTarget::parse("#p15").unwrap(),
            Some(FragmentTarget::Paragraph(15))
        );
    }

    #[test]
    fn composite_resolves_to_paragraph_id() {
        let target = FragmentTarget::parse("#sectionA-p42").unwrap().unwrap();
        assert_eq!(
            target,
            FragmentTarget::Composite {
                section: "sectionA".to_string(),
                paragraph: 42
            }
        );
        assert_eq!(target.target_id(), ElementId::new("p42"));
    }

    #[test]
    fn composite_uses_last_paragraph_suffix() {
        let target = FragmentTarget::parse("#deep-purple-p3").unwrap().unwrap();
        assert_eq!(target.target_id(), ElementId::new("p3"));
    }

    #[test]
    fn section_fragment_keeps_id() {
        let target = FragmentTarget::parse("#the-road-ahead").unwrap().unwrap();
        assert_eq!(target, FragmentTarget::Section("the-road-ahead".to_string()));
        assert!(!target.is_paragraph_specific());
    }

    #[test]
    fn dash_p_without_digits_is_a_section() {
        let target = FragmentTarget::parse("#top-picks").unwrap().unwrap();
        assert_eq!(target, FragmentTarget::Section("top-picks".to_string()));
    }

    #[test]
    fn decodes_percent_encoding() {
        let target = FragmentTarget::parse("#caf%C3%A9%3Anotes").unwrap().unwrap();
        assert_eq!(target, FragmentTarget::Section("café:notes".to_string()));
    }

    #[test]
    fn invalid_encoding_is_an_error() {
        assert!(FragmentTarget::parse("#%FF%FE").is_err());
    }

    #[test]
    fn empty_fragment_is_none() {
        assert_eq!(FragmentTarget::parse("").unwrap(), None);
        assert_eq!(FragmentTarget::parse("#").unwrap(), None);
    }

    #[test]
    fn location_fragment_formats() {
        assert_eq!(
            FragmentTarget::for_location("intro", None).to_fragment(),
            "#intro"
        );
        assert_eq!(
            FragmentTarget::for_location("intro", Some(7)).to_fragment(),
            "#intro-p7"
        );
    }

    #[test]
    fn paragraph_specific_detection() {
        assert!(is_paragraph_specific("#p15"));
        assert!(is_paragraph_specific("#intro-p3"));
        assert!(is_paragraph_specific("#a-p1b"));
        assert!(!is_paragraph_specific("#intro"));
        assert!(!is_paragraph_specific("#top-picks"));
        assert!(!is_paragraph_specific("#pizza"));
        assert!(!is_paragraph_specific(""));
    }

    #[test]
    fn paragraph_number_requires_digits() {
        assert_eq!(paragraph_number("p9"), Some(9));
        assert_eq!(paragraph_number("p"), None);
        assert_eq!(paragraph_number("p9x"), None);
        assert_eq!(paragraph_number("q9"), None);
    }
}
