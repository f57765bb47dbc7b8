//! Free-text cleaning: names, addresses, cities and course lists.

use std::collections::BTreeSet;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::record::RawValue;

use super::InvalidReason;

/// Separators accepted between course names in a single string.
const COURSE_SEPARATORS: [char; 3] = [',', ';', '|'];

/// Keys probed, in order, when a course is given as an object.
const COURSE_OBJECT_KEYS: [&str; 3] = ["name", "title", "type"];

/// Trim and collapse runs of whitespace into a single space.
///
/// ```
/// use rijdupe::validate::text::collapse_whitespace;
///
/// assert_eq!(collapse_whitespace("  Kerkstraat \t 1\n"), "Kerkstraat 1");
/// ```
#[must_use]
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Title-case `s` only when all its letters share one case.
///
/// Mixed-case input is assumed to be deliberate (`"Rijschool de Vries"`)
/// and returned unchanged.
///
/// ```
/// use rijdupe::validate::text::title_case_if_uniform;
///
/// assert_eq!(title_case_if_uniform("RIJSCHOOL JANSEN"), "Rijschool Jansen");
/// assert_eq!(title_case_if_uniform("rijschool jansen"), "Rijschool Jansen");
/// assert_eq!(title_case_if_uniform("Rijschool de Vries"), "Rijschool de Vries");
/// ```
#[must_use]
pub fn title_case_if_uniform(s: &str) -> String {
    let has_upper = s.chars().any(char::is_uppercase);
    let has_lower = s.chars().any(char::is_lowercase);
    if has_upper == has_lower {
        // Mixed case, or no cased letters at all.
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut word_start = true;
    for ch in s.chars() {
        if ch.is_alphabetic() {
            if word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            word_start = false;
        } else {
            out.push(ch);
            word_start = ch.is_whitespace() || matches!(ch, '-' | '/' | '(');
        }
    }
    out
}

/// Fold text into a comparison key.
///
/// Diacritics are stripped (NFKD), everything except letters and digits
/// becomes a space, the result is lowercased and whitespace collapsed.
/// Letters of any script are kept.
///
/// ```
/// use rijdupe::validate::text::fold_key;
///
/// assert_eq!(fold_key("Café  Noël-Straat 1a"), "cafe noel straat 1a");
/// assert_eq!(fold_key("Автошкола «Иванов»"), "автошкола иванов");
/// ```
#[must_use]
pub fn fold_key(s: &str) -> String {
    let mut mapped = String::with_capacity(s.len());
    for c in s.nfkd().filter(|c| !is_combining_mark(*c)) {
        if c.is_alphanumeric() {
            mapped.extend(c.to_lowercase());
        } else {
            mapped.push(' ');
        }
    }
    collapse_whitespace(&mapped)
}

/// Clean a scalar text value. Blank text yields `None`.
pub(crate) fn clean(raw: &RawValue) -> Result<Option<String>, InvalidReason> {
    let text = raw.as_text().ok_or(InvalidReason::UnexpectedType)?;
    let cleaned = collapse_whitespace(&text);
    Ok((!cleaned.is_empty()).then_some(cleaned))
}

/// Clean a proper name (school or city).
pub(crate) fn clean_proper_name(raw: &RawValue) -> Result<Option<String>, InvalidReason> {
    Ok(clean(raw)?.map(|s| title_case_if_uniform(&s)))
}

/// Parse a course list from a list value or a separated string.
pub(crate) fn courses(raw: &RawValue) -> Result<Option<BTreeSet<String>>, InvalidReason> {
    let mut set = BTreeSet::new();
    collect_courses(raw, &mut set)?;
    Ok((!set.is_empty()).then_some(set))
}

fn collect_courses(raw: &RawValue, set: &mut BTreeSet<String>) -> Result<(), InvalidReason> {
    match raw {
        RawValue::Null => {}
        RawValue::Text(s) => {
            set.extend(
                s.split(COURSE_SEPARATORS)
                    .map(collapse_whitespace)
                    .filter(|c| !c.is_empty()),
            );
        }
        RawValue::Integer(_) | RawValue::Float(_) => {
            if let Some(text) = raw.as_text() {
                set.insert(text.into_owned());
            }
        }
        RawValue::List(items) => {
            for item in items {
                collect_courses(item, set)?;
            }
        }
        RawValue::Map(map) => {
            let label = COURSE_OBJECT_KEYS
                .iter()
                .find_map(|key| map.get(*key).and_then(RawValue::as_text))
                .map(|text| collapse_whitespace(&text));
            if let Some(label) = label.filter(|l| !l.is_empty()) {
                set.insert(label);
            }
        }
        RawValue::Bool(_) => return Err(InvalidReason::UnexpectedType),
    }
    Ok(())
}

/// Derive a city from a listing url such as `https://host/rijscholen/den-haag/x`.
#[must_use]
pub fn city_from_url(url: &str) -> Option<String> {
    let (_, rest) = url.split_once("/rijscholen/")?;
    let segment = rest.split(['/', '?', '#']).next()?;
    let city = collapse_whitespace(&segment.replace(['-', '_'], " "));
    if city.is_empty() {
        None
    } else {
        Some(title_case_if_uniform(&city))
    }
}
