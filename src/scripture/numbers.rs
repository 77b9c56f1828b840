/*!
 * Spoken number words ("twelve", "twenty one", "one hundred nineteen").
 */

const UNITS: &[(&str, u16)] = &[
    ("one", 1), ("two", 2), ("three", 3), ("four", 4), ("five", 5),
    ("six", 6), ("seven", 7), ("eight", 8), ("nine", 9), ("ten", 10),
    ("eleven", 11), ("twelve", 12), ("thirteen", 13), ("fourteen", 14), ("fifteen", 15),
    ("sixteen", 16), ("seventeen", 17), ("eighteen", 18), ("nineteen", 19),
];

const TENS: &[(&str, u16)] = &[
    ("twenty", 20), ("thirty", 30), ("forty", 40), ("fifty", 50),
    ("sixty", 60), ("seventy", 70), ("eighty", 80), ("ninety", 90),
];

pub fn unit_value(word: &str) -> Option<u16> {
    UNITS.iter().find(|(w, _)| w.eq_ignore_ascii_case(word)).map(|(_, v)| *v)
}

pub fn tens_value(word: &str) -> Option<u16> {
    TENS.iter().find(|(w, _)| w.eq_ignore_ascii_case(word)).map(|(_, v)| *v)
}

/// True for any word that can start a spoken number.
pub fn is_number_word(word: &str) -> bool {
    unit_value(word).is_some() || tens_value(word).is_some()
}

/// Parse a spoken number from a word sequence.
///
/// `words` yields lowercase words; joiners ("-" between "twenty" and "one",
/// "and" after "hundred") must already be removed by the caller. Returns the
/// value and how many words were consumed.
pub fn parse_number_words(words: &[&str]) -> Option<(u16, usize)> {
    let (mut value, mut used) = parse_below_hundred(words)?;

    if words.get(used).is_some_and(|w| w.eq_ignore_ascii_case("hundred")) && value < 10 {
        value *= 100;
        used += 1;
        let rest = &words[used..];
        let skip_and = usize::from(rest.first().is_some_and(|w| w.eq_ignore_ascii_case("and")));
        if let Some((tail, tail_used)) = parse_below_hundred(&rest[skip_and..]) {
            value += tail;
            used += skip_and + tail_used;
        }
    }

    Some((value, used))
}

fn parse_below_hundred(words: &[&str]) -> Option<(u16, usize)> {
    let first = words.first()?;
    if let Some(tens) = tens_value(first) {
        if let Some(unit) = words.get(1).and_then(|w| unit_value(w)).filter(|u| *u < 10) {
            return Some((tens + unit, 2));
        }
        return Some((tens, 1));
    }
    unit_value(first).map(|u| (u, 1))
}
