//! Email and URL validation.

use std::sync::OnceLock;

use regex::Regex;
use url::Url;

use super::InvalidReason;

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(
            r"^(?P<local>[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*)@(?P<domain>(?:[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z]{2,63})$",
        )
        .expect("email pattern is valid")
    })
}

/// Validate an email address of the shape `local@domain.tld`.
///
/// A leading `mailto:` is dropped and the domain lowercased; the local part
/// is kept as given.
///
/// ```
/// use rijdupe::validate::contact::validate_email;
///
/// assert_eq!(validate_email("Info@Rijschool-Jansen.NL").unwrap(), "Info@rijschool-jansen.nl");
/// assert!(validate_email("info@localhost").is_err());
/// ```
///
/// # Errors
///
/// [`InvalidReason::MalformedEmail`] when the address does not match.
pub fn validate_email(input: &str) -> Result<String, InvalidReason> {
    let trimmed = input.trim();
    let address = match trimmed.get(..7) {
        Some(prefix) if prefix.eq_ignore_ascii_case("mailto:") => &trimmed[7..],
        _ => trimmed,
    };

    let caps = email_regex()
        .captures(address)
        .ok_or(InvalidReason::MalformedEmail)?;
    Ok(format!(
        "{}@{}",
        &caps["local"],
        caps["domain"].to_ascii_lowercase()
    ))
}

/// Validate an absolute `http`/`https` URL with a host.
///
/// The trimmed input is returned unchanged so stored values match what was
/// scraped.
///
/// ```
/// use rijdupe::validate::contact::validate_url;
///
/// assert!(validate_url("https://www.rijschooljansen.nl").is_ok());
/// assert!(validate_url("www.rijschooljansen.nl").is_err());
/// assert!(validate_url("ftp://files.example.nl").is_err());
/// ```
///
/// # Errors
///
/// [`InvalidReason::NotHttpUrl`] for relative, malformed or non-HTTP(S) URLs.
pub fn validate_url(input: &str) -> Result<String, InvalidReason> {
    let trimmed = input.trim();
    let parsed = Url::parse(trimmed).map_err(|_| InvalidReason::NotHttpUrl)?;
    let has_host = parsed.host_str().is_some_and(|host| !host.is_empty());
    match parsed.scheme() {
        "http" | "https" if has_host => Ok(trimmed.to_string()),
        _ => Err(InvalidReason::NotHttpUrl),
    }
}
