//! Arabic text helpers used by search

/// Remove Arabic diacritics (tashkeel and superscript alif).
///
/// Matches how `matn_normal` is produced for the bundled corpus, so a
/// stripped query can be compared against that column directly.
pub fn strip_tashkeel(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '\u{064B}'..='\u{0652}' | '\u{0670}'))
        .collect()
}

/// Build a `LIKE '%...%' ESCAPE '\'` pattern for a literal substring.
pub fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Parse a search query as a hadith number.
///
/// Accepts ASCII, Arabic-Indic (٠-٩) and Extended Arabic-Indic (۰-۹)
/// digits with an optional sign.
pub fn parse_hadith_id(query: &str) -> Option<i64> {
    let ascii: String = query
        .trim()
        .chars()
        .map(|c| match c {
            '\u{0660}'..='\u{0669}' => char::from(b'0' + (c as u32 - 0x0660) as u8),
            '\u{06F0}'..='\u{06F9}' => char::from(b'0' + (c as u32 - 0x06F0) as u8),
            _ => c,
        })
        .collect();
    ascii.parse().ok()
}
