//! Redaction of sensitive substrings from free-text fields.

use once_cell::sync::Lazy;
use regex::Regex;

/// Fixed placeholder substituted for every rule match.
pub const REDACTION_TOKEN: &str = "[redacted]";

/// Ordered redaction rules, all case-insensitive: email addresses, US and
/// international phone numbers, URLs, then the conferencing credential lines.
static RULES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9-.]+",
        r"\(\d{3}\)\s\d{3}-\d{4}",
        r"\+\d{1,3}\s?(\(\d{1,3}\))?\s?\d{1,4}[\s-]?\d{1,4}[\s-]?\d{1,4}([\s-]?\d{1,4})?",
        r"\bhttps?://\S+",
        r"\bMeeting ID: \S+",
        r"\bPasscode: \S+",
        r"\bPIN: \d+",
        r"\bID: \d{9,11}",
    ]
    .iter()
    .map(|pattern| {
        Regex::new(&format!("(?i){}", pattern)).expect("redaction pattern must compile")
    })
    .collect()
});

/// Replace every match of every rule with [`REDACTION_TOKEN`].
///
/// Idempotent: no rule matches the token itself, so a second application
/// leaves the text unchanged. Unmatched text passes through as-is.
pub fn sanitize(text: &str) -> String {
    let mut out = text.to_string();
    for rule in RULES.iter() {
        out = rule.replace_all(&out, REDACTION_TOKEN).into_owned();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_email_addresses_anywhere() {
        assert_eq!(
            sanitize("ping alice@example.com about the deck"),
            "ping [redacted] about the deck"
        );
        assert_eq!(sanitize("Bob.Smith+cal@sub-domain.co.uk"), "[redacted]");
    }

    #[test]
    fn redacts_phone_numbers() {
        assert_eq!(sanitize("call (555) 123-4567"), "call [redacted]");
        assert_eq!(sanitize("or +1 555 123 4567 later"), "or [redacted] later");
    }

    #[test]
    fn redacts_urls_and_meeting_credentials() {
        assert_eq!(
            sanitize("join https://meet.example.com/abc now"),
            "join [redacted] now"
        );
        assert_eq!(sanitize("Meeting ID: 9912"), "[redacted]");
        assert_eq!(sanitize("passcode: hunter2"), "[redacted]");
        assert_eq!(sanitize("PIN: 004512"), "[redacted]");
        assert_eq!(sanitize("ID: 123456789"), "[redacted]");
    }

    #[test]
    fn short_numeric_ids_pass_through() {
        // The bare ID rule only fires on 9-11 digit values.
        assert_eq!(sanitize("ID: 42"), "ID: 42");
    }

    #[test]
    fn is_idempotent() {
        let inputs = [
            "alice@example.com / (555) 123-4567",
            "Meeting ID: 991 2234 Passcode: s3cret",
            "plain text without secrets",
            "https://example.com and PIN: 12345",
        ];
        for input in inputs {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "not idempotent for {:?}", input);
        }
    }

    #[test]
    fn unmatched_text_is_unchanged() {
        let text = "Quarterly planning in room 4B";
        assert_eq!(sanitize(text), text);
    }
}
