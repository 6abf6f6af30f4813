#[derive(Debug, PartialEq, Eq)]
pub struct Book {
    pub number: u8,
    pub name: &'static str,
    pub single_chapter: bool,
    aliases: &'static [&'static str],
}

impl Book {
    pub fn api_name(&self) -> String {
        self.name.to_lowercase().replace(' ', "+")
    }

    fn compact_name(&self) -> String {
        compact(self.name)
    }
}

const fn book(
    number: u8,
    name: &'static str,
    aliases: &'static [&'static str],
) -> Book {
    Book {
        number,
        name,
        single_chapter: false,
        aliases,
    }
}

const fn short_book(
    number: u8,
    name: &'static str,
    aliases: &'static [&'static str],
) -> Book {
    Book {
        number,
        name,
        single_chapter: true,
        aliases,
    }
}

pub static BOOKS: [Book; 66] = [
    book(1, "Genesis", &[]),
    book(2, "Exodus", &[]),
    book(3, "Leviticus", &[]),
    book(4, "Numbers", &[]),
    book(5, "Deuteronomy", &[]),
    book(6, "Joshua", &[]),
    book(7, "Judges", &["jdg"]),
    book(8, "Ruth", &[]),
    book(9, "1 Samuel", &[]),
    book(10, "2 Samuel", &[]),
    book(11, "1 Kings", &["1kgs"]),
    book(12, "2 Kings", &["2kgs"]),
    book(13, "1 Chronicles", &[]),
    book(14, "2 Chronicles", &[]),
    book(15, "Ezra", &[]),
    book(16, "Nehemiah", &[]),
    book(17, "Esther", &[]),
    book(18, "Job", &[]),
    book(19, "Psalms", &["ps", "psalm", "pss"]),
    book(20, "Proverbs", &["prv"]),
    book(21, "Ecclesiastes", &["eccles", "qoh"]),
    book(22, "Song of Solomon", &["songs", "canticles", "cant", "sos"]),
    book(23, "Isaiah", &[]),
    book(24, "Jeremiah", &[]),
    book(25, "Lamentations", &[]),
    book(26, "Ezekiel", &[]),
    book(27, "Daniel", &[]),
    book(28, "Hosea", &[]),
    book(29, "Joel", &[]),
    book(30, "Amos", &[]),
    short_book(31, "Obadiah", &[]),
    book(32, "Jonah", &[]),
    book(33, "Micah", &[]),
    book(34, "Nahum", &[]),
    book(35, "Habakkuk", &[]),
    book(36, "Zephaniah", &[]),
    book(37, "Haggai", &[]),
    book(38, "Zechariah", &["zac"]),
    book(39, "Malachi", &[]),
    book(40, "Matthew", &[]),
    book(41, "Mark", &["mrk"]),
    book(42, "Luke", &[]),
    book(43, "John", &["jhn"]),
    book(44, "Acts", &[]),
    book(45, "Romans", &[]),
    book(46, "1 Corinthians", &[]),
    book(47, "2 Corinthians", &[]),
    book(48, "Galatians", &[]),
    book(49, "Ephesians", &[]),
    book(50, "Philippians", &["phi", "phil", "php"]),
    book(51, "Colossians", &[]),
    book(52, "1 Thessalonians", &[]),
    book(53, "2 Thessalonians", &[]),
    book(54, "1 Timothy", &[]),
    book(55, "2 Timothy", &[]),
    book(56, "Titus", &[]),
    short_book(57, "Philemon", &["phm", "philem"]),
    book(58, "Hebrews", &[]),
    book(59, "James", &["jas"]),
    book(60, "1 Peter", &[]),
    book(61, "2 Peter", &[]),
    book(62, "1 John", &[]),
    short_book(63, "2 John", &[]),
    short_book(64, "3 John", &[]),
    short_book(65, "Jude", &["jud"]),
    book(66, "Revelation", &["apoc"]),
];

fn compact(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let lowered = lowered.trim_end_matches('.');
    let ordinal = [("iii ", "3"), ("ii ", "2"), ("i ", "1")]
        .iter()
        .find_map(|(roman, digit)| {
            lowered
                .strip_prefix(roman)
                .map(|rest| format!("{digit}{rest}"))
        });
    ordinal
        .unwrap_or_else(|| lowered.to_string())
        .chars()
        .filter(|character| character.is_alphanumeric())
        .collect()
}

pub fn lookup_book(raw: &str) -> Option<&'static Book> {
    let key = compact(raw);
    if key.len() < 2 {
        return None;
    }

    if let Some(found) = BOOKS
        .iter()
        .find(|book| book.compact_name() == key || book.aliases.contains(&key.as_str()))
    {
        return Some(found);
    }

    let mut candidates = BOOKS
        .iter()
        .filter(|book| book.compact_name().starts_with(&key));
    let first = candidates.next()?;
    candidates.next().is_none().then_some(first)
}

pub fn book_by_number(number: u8) -> Option<&'static Book> {
    BOOKS.iter().find(|book| book.number == number)
}
