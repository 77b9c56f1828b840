/*!
 * Canon table for the 66-book Protestant Bible.
 *
 * Each book carries its canonical display name, the ordinal prefix for
 * numbered books (1 Samuel, 2 Corinthians, 3 John), the spoken base names
 * it is recognized by, and its chapter count.
 */

use once_cell::sync::Lazy;
use regex::Regex;

/// One book of the canon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Book {
    /// Canonical display name ("1 Corinthians")
    pub name: &'static str,
    /// Ordinal prefix for numbered books
    pub ordinal: Option<u8>,
    /// Names the book is recognized by, without the ordinal
    pub aliases: &'static [&'static str],
    /// Number of chapters
    pub chapters: u16,
}

impl Book {
    /// Books with exactly one chapter accept `Book N` as chapter 1, verse N.
    pub fn is_single_chapter(&self) -> bool {
        self.chapters == 1
    }
}

const fn book(name: &'static str, ordinal: Option<u8>, aliases: &'static [&'static str], chapters: u16) -> Book {
    Book { name, ordinal, aliases, chapters }
}

pub static BOOKS: &[Book] = &[
    book("Genesis", None, &["Genesis"], 50),
    book("Exodus", None, &["Exodus"], 40),
    book("Leviticus", None, &["Leviticus"], 27),
    book("Numbers", None, &["Numbers"], 36),
    book("Deuteronomy", None, &["Deuteronomy"], 34),
    book("Joshua", None, &["Joshua"], 24),
    book("Judges", None, &["Judges"], 21),
    book("Ruth", None, &["Ruth"], 4),
    book("1 Samuel", Some(1), &["Samuel"], 31),
    book("2 Samuel", Some(2), &["Samuel"], 24),
    book("1 Kings", Some(1), &["Kings"], 22),
    book("2 Kings", Some(2), &["Kings"], 25),
    book("1 Chronicles", Some(1), &["Chronicles"], 29),
    book("2 Chronicles", Some(2), &["Chronicles"], 36),
    book("Ezra", None, &["Ezra"], 10),
    book("Nehemiah", None, &["Nehemiah"], 13),
    book("Esther", None, &["Esther"], 10),
    book("Job", None, &["Job"], 42),
    book("Psalms", None, &["Psalms", "Psalm"], 150),
    book("Proverbs", None, &["Proverbs"], 31),
    book("Ecclesiastes", None, &["Ecclesiastes"], 12),
    book("Song of Solomon", None, &["Song of Solomon", "Song of Songs"], 8),
    book("Isaiah", None, &["Isaiah"], 66),
    book("Jeremiah", None, &["Jeremiah"], 52),
    book("Lamentations", None, &["Lamentations"], 5),
    book("Ezekiel", None, &["Ezekiel"], 48),
    book("Daniel", None, &["Daniel"], 12),
    book("Hosea", None, &["Hosea"], 14),
    book("Joel", None, &["Joel"], 3),
    book("Amos", None, &["Amos"], 9),
    book("Obadiah", None, &["Obadiah"], 1),
    book("Jonah", None, &["Jonah"], 4),
    book("Micah", None, &["Micah"], 7),
    book("Nahum", None, &["Nahum"], 3),
    book("Habakkuk", None, &["Habakkuk"], 3),
    book("Zephaniah", None, &["Zephaniah"], 3),
    book("Haggai", None, &["Haggai"], 2),
    book("Zechariah", None, &["Zechariah"], 14),
    book("Malachi", None, &["Malachi"], 4),
    book("Matthew", None, &["Matthew"], 28),
    book("Mark", None, &["Mark"], 16),
    book("Luke", None, &["Luke"], 24),
    book("John", None, &["John"], 21),
    book("Acts", None, &["Acts"], 28),
    book("Romans", None, &["Romans"], 16),
    book("1 Corinthians", Some(1), &["Corinthians"], 16),
    book("2 Corinthians", Some(2), &["Corinthians"], 13),
    book("Galatians", None, &["Galatians"], 6),
    book("Ephesians", None, &["Ephesians"], 6),
    book("Philippians", None, &["Philippians"], 4),
    book("Colossians", None, &["Colossians"], 4),
    book("1 Thessalonians", Some(1), &["Thessalonians"], 5),
    book("2 Thessalonians", Some(2), &["Thessalonians"], 3),
    book("1 Timothy", Some(1), &["Timothy"], 6),
    book("2 Timothy", Some(2), &["Timothy"], 4),
    book("Titus", None, &["Titus"], 3),
    book("Philemon", None, &["Philemon"], 1),
    book("Hebrews", None, &["Hebrews"], 13),
    book("James", None, &["James"], 5),
    book("1 Peter", Some(1), &["Peter"], 5),
    book("2 Peter", Some(2), &["Peter"], 3),
    book("1 John", Some(1), &["John"], 5),
    book("2 John", Some(2), &["John"], 1),
    book("3 John", Some(3), &["John"], 1),
    book("Jude", None, &["Jude"], 1),
    book("Revelation", None, &["Revelation", "Revelations"], 22),
];

/// Matches a book mention: optional ordinal prefix (group `ordinal`) and a
/// capitalized book alias (group `base`).
pub static BOOK_PATTERN: Lazy<Regex> = Lazy::new(|| {
    let mut aliases: Vec<&str> = BOOKS.iter().flat_map(|b| b.aliases.iter().copied()).collect();
    aliases.sort_by_key(|a| std::cmp::Reverse(a.len()));
    aliases.dedup();
    let alternation = aliases
        .iter()
        .map(|a| regex::escape(a).replace(' ', r"\s+"))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = format!(
        r"\b(?:(?P<ordinal>[123]|(?i:first|second|third|1st|2nd|3rd)|III|II)\s+)?(?P<base>{})\b",
        alternation
    );
    Regex::new(&pattern).expect("book pattern is built from static aliases")
});

/// Parse an ordinal prefix ("2", "second", "2nd", "II").
pub fn parse_ordinal(text: &str) -> Option<u8> {
    match text.to_lowercase().as_str() {
        "1" | "first" | "1st" | "i" => Some(1),
        "2" | "second" | "2nd" | "ii" => Some(2),
        "3" | "third" | "3rd" | "iii" => Some(3),
        _ => None,
    }
}

/// Resolve an ordinal and base name to a book.
pub fn find_book(ordinal: Option<u8>, base: &str) -> Option<&'static Book> {
    let base = collapse_whitespace(base);
    BOOKS.iter().find(|b| {
        b.ordinal == ordinal && b.aliases.iter().any(|a| a.eq_ignore_ascii_case(&base))
    })
}

/// Resolve a full book name such as "1 Corinthians", "Second Timothy" or "Psalm".
pub fn book_by_name(name: &str) -> Option<&'static Book> {
    let name = collapse_whitespace(name.trim());
    if let Some(book) = BOOKS.iter().find(|b| b.name.eq_ignore_ascii_case(&name)) {
        return Some(book);
    }
    match name.split_once(' ') {
        Some((prefix, rest)) => match parse_ordinal(prefix) {
            Some(ordinal) => find_book(Some(ordinal), rest),
            None => find_book(None, &name),
        },
        None => find_book(None, &name),
    }
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
