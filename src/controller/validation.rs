use std::{fmt, sync::OnceLock};

use regex::Regex;

use crate::accounts::AccountLookup;

const USERNAME_MIN_LENGTH: usize = 3;
const USERNAME_MAX_LENGTH: usize = 20;
const PASSWORD_MIN_LENGTH: usize = 8;
const EMAIL_MAX_LENGTH: usize = 320;
const EMAIL_LOCAL_PART_MAX_LENGTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    UsernameMissing,
    UsernameTooShort,
    UsernameTooLong,
    UsernameContainsDisallowed,
    UsernameExists,
    PasswordMissing,
    PasswordTooShort,
    PasswordNeedsNumber,
    PasswordNeedsUppercase,
    PasswordNeedsLowercase,
    PasswordSameAsOld,
    OldPasswordIncorrect,
    EmailMissing,
    EmailNotValid,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UsernameMissing => "USERNAME_MISSING",
            Self::UsernameTooShort => "USERNAME_TOO_SHORT",
            Self::UsernameTooLong => "USERNAME_TOO_LONG",
            Self::UsernameContainsDisallowed => "USERNAME_CONTAINS_DISALLOWED",
            Self::UsernameExists => "USERNAME_EXISTS",
            Self::PasswordMissing => "PASSWORD_MISSING",
            Self::PasswordTooShort => "PASSWORD_TOO_SHORT",
            Self::PasswordNeedsNumber => "PASSWORD_NEEDS_NUMBER",
            Self::PasswordNeedsUppercase => "PASSWORD_NEEDS_UPPERCASE",
            Self::PasswordNeedsLowercase => "PASSWORD_NEEDS_LOWERCASE",
            Self::PasswordSameAsOld => "PASSWORD_SAME_AS_OLD",
            Self::OldPasswordIncorrect => "OLD_PASSWORD_INCORRECT",
            Self::EmailMissing => "EMAIL_MISSING",
            Self::EmailNotValid => "EMAIL_NOT_VALID",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered, append-only list of validation failures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<ErrorCode>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, code: ErrorCode) {
        self.0.push(code);
    }

    pub fn append(&mut self, mut other: ValidationErrors) {
        self.0.append(&mut other.0);
    }

    /// Records the error of a single-value validator and passes the value on.
    pub fn check<T>(&mut self, result: Result<T, ErrorCode>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(code) => {
                self.push(code);
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, code: ErrorCode) -> bool {
        self.0.contains(&code)
    }

    pub fn codes(&self) -> &[ErrorCode] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &ErrorCode> {
        self.0.iter()
    }
}

impl From<Vec<ErrorCode>> for ValidationErrors {
    fn from(codes: Vec<ErrorCode>) -> Self {
        Self(codes)
    }
}

impl From<ErrorCode> for ValidationErrors {
    fn from(code: ErrorCode) -> Self {
        Self(vec![code])
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ErrorCode;
    type IntoIter = std::vec::IntoIter<ErrorCode>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ErrorCode;
    type IntoIter = std::slice::Iter<'a, ErrorCode>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

pub fn is_valid_object_id(id: &str) -> bool {
    id.len() == 24 && id.bytes().all(|b| b.is_ascii_hexdigit())
}

pub fn is_approved_username(username: &str, disallowed_usernames: &[String]) -> bool {
    !disallowed_usernames
        .iter()
        .any(|disallowed| disallowed == username)
}

fn is_username_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Checks that do not need the account store. Every failing rule is
/// reported, not just the first. Lengths are in bytes.
pub fn username_format_errors(username: &str) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    if username.is_empty() {
        errors.push(ErrorCode::UsernameMissing);
        return errors;
    }

    let length = username.len();
    if length < USERNAME_MIN_LENGTH {
        errors.push(ErrorCode::UsernameTooShort);
    }
    if length > USERNAME_MAX_LENGTH {
        errors.push(ErrorCode::UsernameTooLong);
    }
    if !username.chars().all(is_username_char) {
        errors.push(ErrorCode::UsernameContainsDisallowed);
    }

    errors
}

pub async fn validate_username(
    username: &str,
    accounts: &dyn AccountLookup,
) -> anyhow::Result<ValidationErrors> {
    let mut errors = username_format_errors(username);

    if !username.is_empty() && accounts.is_username_taken(username).await? {
        errors.push(ErrorCode::UsernameExists);
    }

    Ok(errors)
}

pub fn validate_password(password: &str) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    if password.is_empty() {
        errors.push(ErrorCode::PasswordMissing);
        return errors;
    }

    if password.len() < PASSWORD_MIN_LENGTH {
        errors.push(ErrorCode::PasswordTooShort);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push(ErrorCode::PasswordNeedsNumber);
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push(ErrorCode::PasswordNeedsUppercase);
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push(ErrorCode::PasswordNeedsLowercase);
    }

    errors
}

fn is_email_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-=?^_`{|}~@.[]".contains(c)
}

/// Drops every character that cannot appear in an email address.
pub fn sanitize_email(email: &str) -> String {
    email.chars().filter(|c| is_email_char(*c)).collect()
}

fn email_regex() -> &'static Regex {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    EMAIL_REGEX.get_or_init(|| {
        Regex::new(concat!(
            r"^[A-Za-z0-9!#$%&'*+=?^_`{|}~-]+(?:\.[A-Za-z0-9!#$%&'*+=?^_`{|}~-]+)*",
            r"@(?:[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+",
            r"[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?$",
        ))
        .expect("email regex is valid")
    })
}

fn is_valid_email(email: &str) -> bool {
    let local_part_length = email.split('@').next().map(str::len).unwrap_or(0);

    email.len() <= EMAIL_MAX_LENGTH
        && local_part_length <= EMAIL_LOCAL_PART_MAX_LENGTH
        && email_regex().is_match(email)
}

/// Returns the sanitized address when it is well formed.
pub fn validate_email(email: &str) -> Result<String, ErrorCode> {
    if email.is_empty() {
        return Err(ErrorCode::EmailMissing);
    }

    let sanitized = sanitize_email(email);
    if is_valid_email(&sanitized) {
        Ok(sanitized)
    } else {
        Err(ErrorCode::EmailNotValid)
    }
}
