//! LIKE pattern helpers and accent folding for keyword search.

use std::sync::OnceLock;

use deunicode::deunicode_char;

/// Fold accented Latin letters to their ASCII base letter (`é` → `e`).
///
/// Characters without a single-letter ASCII form (CJK, `ß`, symbols) are
/// kept as they are, so non-Latin keywords still match their own text.
pub fn strip_accents(s: &str) -> String {
    s.chars()
        .map(|ch| {
            if ch.is_ascii() {
                return ch;
            }
            match deunicode_char(ch).map(str::as_bytes) {
                Some([b]) if b.is_ascii_alphanumeric() => char::from(*b),
                _ => ch,
            }
        })
        .collect()
}

/// Accented Latin-1 and Latin Extended-A letters, in both cases, paired with
/// the lowercase ASCII letter [`strip_accents`] folds them to.
///
/// Lets a store fold a column with plain `REPLACE` calls so that stored text
/// and keywords compare in the same form.
pub fn accent_folds() -> &'static [(String, String)] {
    static FOLDS: OnceLock<Vec<(String, String)>> = OnceLock::new();
    FOLDS.get_or_init(|| {
        ('\u{c0}'..='\u{17f}')
            .filter_map(|ch| {
                let from = ch.to_string();
                let to = strip_accents(&from);
                (to != from).then(|| (from, to.to_ascii_lowercase()))
            })
            .collect()
    })
}

/// Escape LIKE metacharacters with `\`.
pub fn like_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '%' | '_' | '\\' => {
                out.push('\\');
                out.push(ch);
            }
            c => out.push(c),
        }
    }
    out
}

pub fn like_contains(s: &str) -> String {
    format!("%{}%", like_escape(s))
}

/// Substring pattern matched against `lower(attribute)`; `None` for a blank keyword.
pub fn keyword_pattern(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(like_contains(&strip_accents(&trimmed.to_lowercase())))
}
