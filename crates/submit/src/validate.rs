//! Submission field validation.
//!
//! The shapes here are the site's historical ones: URLs must carry a scheme,
//! a dotted host, and a trailing slash after the host part; email addresses
//! are letter-led with a dotted domain. Messages are written to be shown
//! next to the offending form field.

use crate::intake::Submission;
use regex::Regex;
use std::sync::LazyLock;

/// Field length limit, matching the submission form's `maxlength`.
const MAX_FIELD_BYTES: usize = 255;

static URL: LazyLock<Regex> = LazyLock::new(|| {
    // Scheme, something with a dot in it, and a trailing slash somewhere
    // after the host. `http://somedomain.abc` alone does not pass.
    Regex::new(r"^https?://.+\..+/").unwrap()
});
static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z][\w.-]*[a-zA-Z0-9]@[a-zA-Z0-9][\w.-]*[a-zA-Z0-9]\.[a-zA-Z][a-zA-Z.]*[a-zA-Z]$").unwrap()
});

const MSG_TITLE: &str = "Please give the submission a title.";
const MSG_AUTHOR: &str = "Who should be credited for this submission?";
const MSG_URL: &str = "URL is not well formatted. http://somedomain.abc/ (Don't forget the trailing slash)";
const MSG_EMAIL: &str = "Please give a valid email address (@ and dots will be automatically replaced).";
const MSG_LENGTH: &str = "Too long (255 characters max).";

/// One rejected field and the message to show next to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

impl FieldError {
    fn new(field: &'static str, message: &'static str) -> Self {
        Self { field, message }
    }
}

/// Validate a submission, returning one error per offending field.
///
/// An empty result means the submission is acceptable. Optional fields
/// (email, image URL, description) are only checked when non-blank.
pub fn validate(submission: &Submission) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if submission.title.trim().is_empty() {
        errors.push(FieldError::new("title", MSG_TITLE));
    }
    if submission.author.trim().is_empty() {
        errors.push(FieldError::new("author", MSG_AUTHOR));
    }
    if !URL.is_match(submission.url.trim()) {
        errors.push(FieldError::new("url", MSG_URL));
    }
    if let Some(image_url) = blank_as_none(submission.image_url.as_deref())
        && !URL.is_match(image_url)
    {
        errors.push(FieldError::new("image_url", MSG_URL));
    }
    if let Some(email) = blank_as_none(submission.email.as_deref())
        && !EMAIL.is_match(email)
    {
        errors.push(FieldError::new("email", MSG_EMAIL));
    }

    for (field, value) in [
        ("title", Some(submission.title.as_str())),
        ("author", Some(submission.author.as_str())),
        ("url", Some(submission.url.as_str())),
        ("image_url", submission.image_url.as_deref()),
        ("description", submission.description.as_deref()),
    ] {
        if value.is_some_and(|v| v.len() > MAX_FIELD_BYTES) {
            errors.push(FieldError::new(field, MSG_LENGTH));
        }
    }

    errors
}

/// Obfuscate a contact address for publication: `@` becomes ` at ` and `.`
/// becomes ` dot `, so the stored record never carries a scrapeable address.
pub fn obfuscate_email(email: &str) -> String {
    email.replace('.', " dot ").replace('@', " at ")
}

/// Treat whitespace-only optional fields as absent.
pub(crate) fn blank_as_none(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn submission() -> Submission {
        Submission {
            title: "Generative Sketches".to_string(),
            author: "Casey R.".to_string(),
            email: None,
            url: "http://example.org/sketches/".to_string(),
            image_url: None,
            description: None,
        }
    }

    #[test]
    fn test_valid_submission_passes() {
        assert!(validate(&submission()).is_empty());
    }

    #[test]
    fn test_required_fields() {
        let mut s = submission();
        s.title = "   ".to_string();
        s.author = String::new();
        let errors = validate(&s);
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["title", "author"]);
    }

    #[rstest]
    #[case("http://example.org/", true)]
    #[case("https://example.org/works/123/", true)]
    #[case("http://example.org/page.html", true)]
    // No trailing slash after the host.
    #[case("http://example.org", false)]
    // No dot in the host.
    #[case("http://localhost/", false)]
    // No scheme.
    #[case("example.org/", false)]
    #[case("ftp://example.org/", false)]
    #[case("", false)]
    fn test_url_shapes(#[case] url: &str, #[case] ok: bool) {
        let mut s = submission();
        s.url = url.to_string();
        let errors = validate(&s);
        assert_eq!(errors.is_empty(), ok, "{url}");
        if !ok {
            assert_eq!(errors[0].field, "url");
        }
    }

    #[rstest]
    #[case("jane.doe@example.org", true)]
    #[case("jd@example.org", true)]
    #[case("jane@sub.example.co.uk", true)]
    // Must start with a letter.
    #[case("1jane@example.org", false)]
    // No domain dot.
    #[case("jane@example", false)]
    #[case("not-an-email", false)]
    fn test_email_shapes(#[case] email: &str, #[case] ok: bool) {
        let mut s = submission();
        s.email = Some(email.to_string());
        let errors = validate(&s);
        assert_eq!(errors.is_empty(), ok, "{email}");
        if !ok {
            assert_eq!(errors[0].field, "email");
        }
    }

    #[test]
    fn test_blank_optional_fields_are_ignored() {
        let mut s = submission();
        s.email = Some("  ".to_string());
        s.image_url = Some(String::new());
        assert!(validate(&s).is_empty());
    }

    #[test]
    fn test_image_url_checked_when_present() {
        let mut s = submission();
        s.image_url = Some("not a url".to_string());
        let errors = validate(&s);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "image_url");
    }

    #[test]
    fn test_overlong_field_rejected() {
        let mut s = submission();
        s.title = "t".repeat(256);
        let errors = validate(&s);
        assert!(errors.iter().any(|e| e.field == "title" && e.message.contains("255")));
    }

    #[test]
    fn test_obfuscate_email() {
        assert_eq!(obfuscate_email("jane.doe@example.org"), "jane dot doe at example dot org");
        assert_eq!(obfuscate_email("jd@example.org"), "jd at example dot org");
    }
}
