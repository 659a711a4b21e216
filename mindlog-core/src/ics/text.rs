//! Text escaping and content line folding (RFC 5545 §3.1, §3.3.11).

use crate::error::{MindLogError, MindLogResult};

/// Maximum content line length in octets, excluding the CRLF.
const MAX_LINE_OCTETS: usize = 75;

/// Escape a TEXT value.
///
/// Backslash goes first so the backslashes introduced by the later rules are
/// not escaped twice. CRLF pairs collapse to a single `\n`; a carriage return
/// on its own cannot be represented and is rejected.
pub fn escape_text(text: &str) -> MindLogResult<String> {
    let normalized = text.replace("\r\n", "\n");
    if normalized.contains('\r') {
        return Err(MindLogError::Encoding(format!(
            "bare carriage return in text {:?}",
            text
        )));
    }

    Ok(normalized
        .replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace('\n', "\\n"))
}

/// Reverse [`escape_text`].
pub fn unescape_text(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => result.push('\n'),
            Some(escaped @ ('\\' | ';' | ',')) => result.push(escaped),
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }

    result
}

/// Fold a content line at 75 octets.
///
/// The first physical line carries up to 75 octets; each continuation starts
/// with a single space followed by up to 74 octets. Folds only happen on
/// character boundaries.
pub fn fold_line(line: &str) -> String {
    if line.len() <= MAX_LINE_OCTETS {
        return line.to_string();
    }

    let mut folded = String::with_capacity(line.len() + line.len() / (MAX_LINE_OCTETS - 1) * 3);
    let mut budget = MAX_LINE_OCTETS;
    let mut used = 0;

    for c in line.chars() {
        let width = c.len_utf8();
        if used + width > budget {
            folded.push_str("\r\n ");
            budget = MAX_LINE_OCTETS - 1;
            used = 0;
        }
        folded.push(c);
        used += width;
    }

    folded
}

/// Join folded continuation lines back together.
pub fn unfold(text: &str) -> String {
    text.replace("\r\n ", "")
        .replace("\r\n\t", "")
        .replace("\n ", "")
        .replace("\n\t", "")
}
