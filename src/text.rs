//! Restriction of document text to the plain ASCII repertoire.

/// Polish letters and their plain replacements, lower case first.
const SUBSTITUTIONS: [(char, char); 18] = [
    ('ą', 'a'),
    ('ć', 'c'),
    ('ę', 'e'),
    ('ł', 'l'),
    ('ń', 'n'),
    ('ó', 'o'),
    ('ś', 's'),
    ('ź', 'z'),
    ('ż', 'z'),
    ('Ą', 'A'),
    ('Ć', 'C'),
    ('Ę', 'E'),
    ('Ł', 'L'),
    ('Ń', 'N'),
    ('Ó', 'O'),
    ('Ś', 'S'),
    ('Ź', 'Z'),
    ('Ż', 'Z'),
];

/// Replacement for characters that have no entry in the substitution table.
pub const UNKNOWN_CHARACTER: char = '?';

fn plain(ch: char) -> char {
    if ch.is_ascii() {
        return ch;
    }
    SUBSTITUTIONS
        .iter()
        .find(|(accented, _)| *accented == ch)
        .map_or(UNKNOWN_CHARACTER, |(_, replacement)| *replacement)
}

/// Maps `text` onto plain ASCII, transliterating Polish letters and replacing anything else
/// outside ASCII with [`UNKNOWN_CHARACTER`].
pub fn transliterate(text: &str) -> String {
    text.chars().map(plain).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_polish_letters_in_both_cases() {
        assert_eq!(transliterate("ąćęłńóśźż"), "acelnoszz");
        assert_eq!(transliterate("ĄĆĘŁŃÓŚŹŻ"), "ACELNOSZZ");
    }

    #[test]
    fn heading_with_l_stroke() {
        assert_eq!(
            transliterate("Rozkład czasu oczekiwania według priorytetu"),
            "Rozklad czasu oczekiwania wedlug priorytetu"
        );
    }

    #[test]
    fn ascii_passes_through() {
        let text = "- Mean wait: 6.00 min\n(High)";
        assert_eq!(transliterate(text), text);
    }

    #[test]
    fn unknown_characters_are_replaced() {
        assert_eq!(transliterate("Ünïcode ✅"), "?n?code ?");
        assert!(transliterate("Zażółć gęślą jaźń").is_ascii());
    }
}
