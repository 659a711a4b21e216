//! MindLog's vendor extension properties.
//!
//! Domain data that RFC 5545 has no property for (diary text, the question of
//! the day, mood color, lunar calendar labels, conflict links) rides inside an
//! otherwise standard VEVENT as `X-MINDLOG-*` properties. The set is closed:
//! every property MindLog understands is a variant of [`Extension`]. Anything
//! else found on an event is foreign and is carried through untouched.

use std::fmt;

use crate::error::{MindLogError, MindLogResult};

/// A known extension property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Extension {
    /// Event kind discriminator (`SCHEDULE` / `DIARY`).
    Kind,
    QuestionId,
    /// Snapshot of the question text at the time the entry was written.
    QuestionText,
    QuestionCategory,
    /// The diary entry itself.
    DiaryContent,
    LunarDate,
    LunarFestival,
    MoodColor,
    /// UID of the event this one conflicts with.
    ConflictOf,
}

/// What an extension's value carries, which decides how it is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload {
    /// One of a fixed set of upper- or lower-case tokens.
    Category,
    /// Short free text written as-is.
    Text,
    /// Free text escaped like SUMMARY/DESCRIPTION.
    EscapedText,
    /// A color string such as `#E89F71`.
    Color,
    /// Another event's UID.
    UidRef,
}

impl Extension {
    pub const ALL: [Extension; 9] = [
        Extension::Kind,
        Extension::QuestionId,
        Extension::QuestionText,
        Extension::QuestionCategory,
        Extension::DiaryContent,
        Extension::LunarDate,
        Extension::LunarFestival,
        Extension::MoodColor,
        Extension::ConflictOf,
    ];

    /// The property name written on the wire.
    pub const fn key(self) -> &'static str {
        match self {
            Extension::Kind => "X-MINDLOG-TYPE",
            Extension::QuestionId => "X-MINDLOG-QUESTION-ID",
            Extension::QuestionText => "X-MINDLOG-QUESTION-TEXT",
            Extension::QuestionCategory => "X-MINDLOG-QUESTION-CATEGORY",
            Extension::DiaryContent => "X-MINDLOG-DIARY-CONTENT",
            Extension::LunarDate => "X-MINDLOG-LUNAR-DATE",
            Extension::LunarFestival => "X-MINDLOG-LUNAR-FESTIVAL",
            Extension::MoodColor => "X-MINDLOG-MOOD-COLOR",
            Extension::ConflictOf => "X-MINDLOG-CONFLICT-OF",
        }
    }

    pub const fn payload(self) -> Payload {
        match self {
            Extension::Kind | Extension::QuestionCategory => Payload::Category,
            Extension::QuestionId | Extension::LunarDate | Extension::LunarFestival => {
                Payload::Text
            }
            Extension::QuestionText | Extension::DiaryContent => Payload::EscapedText,
            Extension::MoodColor => Payload::Color,
            Extension::ConflictOf => Payload::UidRef,
        }
    }

    /// Look up a property name. Names are case-insensitive on the wire.
    pub fn from_key(key: &str) -> Option<Extension> {
        Self::ALL
            .into_iter()
            .find(|ext| ext.key().eq_ignore_ascii_case(key))
    }
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Whether a property name is an extension (`X-` prefixed) at all.
pub fn is_extension_key(key: &str) -> bool {
    key.len() > 2 && key.get(..2).is_some_and(|p| p.eq_ignore_ascii_case("X-"))
}

/// Check that a value written without escaping cannot break the line framing.
pub fn verbatim_value(value: &str) -> MindLogResult<&str> {
    if value.contains(['\r', '\n']) {
        return Err(MindLogError::Encoding(format!(
            "line break in unescaped property value {:?}",
            value
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::EXT_PREFIX;
    use std::collections::HashSet;

    #[test]
    fn every_key_shares_the_vendor_prefix() {
        let prefix = format!("{}-", EXT_PREFIX);
        for ext in Extension::ALL {
            assert!(ext.key().starts_with(&prefix), "{} lacks prefix", ext);
            assert!(ext.key().len() > prefix.len());
        }
    }

    #[test]
    fn no_two_fields_share_a_key() {
        let keys: HashSet<&str> = Extension::ALL.iter().map(|e| e.key()).collect();
        assert_eq!(keys.len(), Extension::ALL.len());
    }

    #[test]
    fn from_key_inverts_key() {
        for ext in Extension::ALL {
            assert_eq!(Extension::from_key(ext.key()), Some(ext));
            assert_eq!(Extension::from_key(&ext.key().to_lowercase()), Some(ext));
        }
        assert_eq!(Extension::from_key("X-GOOGLE-CONFERENCE"), None);
        assert_eq!(Extension::from_key("SUMMARY"), None);
    }

    #[test]
    fn free_text_fields_are_escaped() {
        assert_eq!(Extension::DiaryContent.payload(), Payload::EscapedText);
        assert_eq!(Extension::QuestionText.payload(), Payload::EscapedText);
        assert_eq!(Extension::ConflictOf.payload(), Payload::UidRef);
    }

    #[test]
    fn recognises_extension_keys() {
        assert!(is_extension_key("X-WR-CALNAME"));
        assert!(is_extension_key("x-foo"));
        assert!(!is_extension_key("SUMMARY"));
        assert!(!is_extension_key("X-"));
    }

    #[test]
    fn verbatim_values_reject_line_breaks() {
        assert!(verbatim_value("#E89F71").is_ok());
        assert!(verbatim_value("a\nb").is_err());
    }
}
