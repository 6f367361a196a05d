//! Text preprocessing applied before vectorization.

/// Normalizes raw text: lowercases, strips `<...>` markup, replaces every
/// non-alphanumeric character with a space and collapses whitespace.
pub fn clean_text(raw: &str) -> String {
    let mut stripped = String::with_capacity(raw.len());
    let mut in_tag = false;

    for ch in raw.chars() {
        match ch {
            '<' => {
                in_tag = true;
                stripped.push(' ');
            }
            '>' if in_tag => in_tag = false,
            _ if in_tag => {}
            c if c.is_alphanumeric() => stripped.extend(c.to_lowercase()),
            _ => stripped.push(' '),
        }
    }

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Splits cleaned text into tokens of at least two word characters.
pub fn tokenize(text: &str) -> Vec<&str> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| token.chars().count() >= 2)
        .collect()
}
