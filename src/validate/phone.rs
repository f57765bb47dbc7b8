//! Dutch phone number validation.
//!
//! Accepted input shapes, with any mix of spaces, dashes, dots, slashes and
//! parentheses as separators:
//!
//! * national: `0XXX-XXXXXX`, `020-1234567`, `06-12345678`
//! * international: `+31 6 12345678`, `0031 20 1234567`, `+31 (0)6 12345678`
//!
//! Every accepted number is rewritten into one canonical dashed national form:
//!
//! | kind                        | canonical      |
//! |-----------------------------|----------------|
//! | mobile                      | `06-XXXXXXXX`  |
//! | two-digit area code         | `0XX-XXXXXXX`  |
//! | three-digit area code       | `0XXX-XXXXXX`  |

use super::InvalidReason;

/// Digits in a national number including the trunk `0`.
const NATIONAL_DIGITS: usize = 10;

/// Area codes (without the trunk `0`) that are two digits long.
/// Everything else in the geographic range uses three digits.
const TWO_DIGIT_AREA_CODES: [&str; 35] = [
    "10", "13", "15", "20", "23", "24", "26", "30", "33", "35", "36", "38", "40", "43", "45",
    "46", "50", "53", "55", "58", "70", "71", "72", "73", "74", "75", "76", "77", "78", "79",
    "84", "85", "87", "88", "91",
];

fn is_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, '-' | '.' | '/' | '(' | ')')
}

/// Validate and canonicalize a Dutch phone number.
///
/// ```
/// use rijdupe::validate::phone::normalize_phone;
///
/// assert_eq!(normalize_phone("+31 6 1234 5678").unwrap(), "06-12345678");
/// assert_eq!(normalize_phone("030 - 123 45 67").unwrap(), "030-1234567");
/// assert_eq!(normalize_phone("0318 123456").unwrap(), "0318-123456");
/// assert!(normalize_phone("06-1234567").is_err());
/// ```
///
/// # Errors
///
/// [`InvalidReason::NotAPhoneNumber`] when non-digits remain after removing
/// separators or the number does not start with a valid trunk/area prefix;
/// [`InvalidReason::DigitCount`] when the number of digits is wrong.
pub fn normalize_phone(input: &str) -> Result<String, InvalidReason> {
    let compact: String = input.chars().filter(|c| !is_separator(*c)).collect();

    let national = if let Some(rest) = compact
        .strip_prefix("+31")
        .or_else(|| compact.strip_prefix("0031"))
    {
        // "+31 (0)6..." keeps a redundant trunk zero after the country code.
        let rest = rest.strip_prefix('0').unwrap_or(rest);
        format!("0{rest}")
    } else {
        compact
    };

    if national.is_empty() || !national.chars().all(|c| c.is_ascii_digit()) {
        return Err(InvalidReason::NotAPhoneNumber);
    }
    if national.len() != NATIONAL_DIGITS {
        return Err(InvalidReason::DigitCount(national.len()));
    }
    if !national.starts_with('0') || national[1..].starts_with('0') {
        return Err(InvalidReason::NotAPhoneNumber);
    }

    Ok(format_national(&national))
}

/// Split a validated 10-digit national number at its area code.
fn format_national(national: &str) -> String {
    let prefix_len = if national.starts_with("06") {
        2
    } else if TWO_DIGIT_AREA_CODES.contains(&&national[1..3]) {
        3
    } else {
        4
    };
    format!("{}-{}", &national[..prefix_len], &national[prefix_len..])
}
