//! Local player accounts stored next to the high scores.
//!
//! Accounts never leave the preference store. Passwords are kept only as salted SHA-256
//! digests, and the logged in flag survives restarts so a returning player skips the login.

use core::fmt;

use arcade_core::{Preferences, PrefsError, keys};
use chrono::{DateTime, Utc};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

pub const MIN_USERNAME_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 6;

const SALT_LEN: usize = 16;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    Username,
    Email,
    Password,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Username => "username",
            Self::Email => "email",
            Self::Password => "password",
        })
    }
}

#[derive(Error, Copy, Clone, Debug, PartialEq, Eq)]
pub enum FieldError {
    #[error("Missing {0}")]
    Missing(Field),
    #[error("Username needs at least {} characters", MIN_USERNAME_LEN)]
    UsernameTooShort,
    #[error("Username is already taken")]
    UsernameTaken,
    #[error("Email address is not valid")]
    EmailMalformed,
    #[error("Email address is already registered")]
    EmailTaken,
    #[error("Password needs at least {} characters", MIN_PASSWORD_LEN)]
    PasswordTooShort,
}

impl FieldError {
    pub fn field(&self) -> Field {
        match self {
            Self::Missing(field) => *field,
            Self::UsernameTooShort | Self::UsernameTaken => Field::Username,
            Self::EmailMalformed | Self::EmailTaken => Field::Email,
            Self::PasswordTooShort => Field::Password,
        }
    }
}

#[derive(Error, Debug)]
pub enum AccountError {
    #[error("{} field(s) need attention", .0.len())]
    Invalid(Vec<FieldError>),
    #[error("User not found")]
    UnknownUser,
    #[error("Wrong password")]
    WrongPassword,
    #[error(transparent)]
    Storage(#[from] PrefsError),
    #[error("Stored account is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

pub type Result<T, E = AccountError> = core::result::Result<T, E>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    pub email: String,
    salt: String,
    password_hash: String,
    pub registered_at: DateTime<Utc>,
}

impl UserRecord {
    fn new(username: &str, email: &str, password: &str) -> Self {
        let salt: [u8; SALT_LEN] = rand::rng().random();
        let salt = to_hex(&salt);
        Self {
            username: username.to_owned(),
            email: email.to_owned(),
            password_hash: hash_password(&salt, password),
            salt,
            registered_at: Utc::now(),
        }
    }

    pub fn verify(&self, password: &str) -> bool {
        hash_password(&self.salt, password) == self.password_hash
    }
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    to_hex(&hasher.finalize())
}

fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        use std::fmt::Write;
        let _ = write!(out, "{:02x}", byte);
    }
    out
}

/// Loose address check: a local part, an `@` and a dotted domain.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let local_ok = (1..=256).contains(&local.len())
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "+._%-".contains(c));

    let labels: Vec<&str> = domain.split('.').collect();
    let domain_ok = labels.len() >= 2
        && labels.iter().enumerate().all(|(index, label)| {
            let max_len = if index == 0 { 65 } else { 26 };
            (1..=max_len).contains(&label.len())
                && label.starts_with(|c: char| c.is_ascii_alphanumeric())
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        });

    local_ok && domain_ok
}

pub struct Accounts<P> {
    prefs: P,
}

impl<P: Preferences> Accounts<P> {
    pub fn new(prefs: P) -> Self {
        Self { prefs }
    }

    pub fn prefs(&self) -> &P {
        &self.prefs
    }

    pub fn into_inner(self) -> P {
        self.prefs
    }

    pub fn user(&self, username: &str) -> Result<Option<UserRecord>> {
        self.prefs
            .get_string(&keys::user(username.trim()))
            .map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(AccountError::from)
    }

    pub fn usernames(&self) -> Result<Vec<String>> {
        match self.prefs.get_string(keys::USERS) {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    pub fn is_username_taken(&self, username: &str) -> bool {
        self.prefs.contains(&keys::user(username.trim()))
    }

    pub fn is_email_taken(&self, email: &str) -> bool {
        self.prefs.contains(&keys::email(email.trim()))
    }

    /// Checks every field and reports all problems at once, at most one per field.
    pub fn validate_registration(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Vec<FieldError> {
        let username = username.trim();
        let email = email.trim();
        let mut errors = Vec::new();

        if username.is_empty() {
            errors.push(FieldError::Missing(Field::Username));
        } else if username.chars().count() < MIN_USERNAME_LEN {
            errors.push(FieldError::UsernameTooShort);
        } else if self.is_username_taken(username) {
            errors.push(FieldError::UsernameTaken);
        }

        if email.is_empty() {
            errors.push(FieldError::Missing(Field::Email));
        } else if !is_valid_email(email) {
            errors.push(FieldError::EmailMalformed);
        } else if self.is_email_taken(email) {
            errors.push(FieldError::EmailTaken);
        }

        if password.is_empty() {
            errors.push(FieldError::Missing(Field::Password));
        } else if password.chars().count() < MIN_PASSWORD_LEN {
            errors.push(FieldError::PasswordTooShort);
        }

        errors
    }

    /// Creates an account and logs it in.
    pub fn register(&mut self, username: &str, email: &str, password: &str) -> Result<UserRecord> {
        let errors = self.validate_registration(username, email, password);
        if !errors.is_empty() {
            log::debug!("Rejected registration: {:?}", errors);
            return Err(AccountError::Invalid(errors));
        }

        let record = UserRecord::new(username.trim(), email.trim(), password);
        let previous = self.usernames()?;
        let mut usernames = previous.clone();
        usernames.push(record.username.clone());

        if let Err(err) = self.store(&record, &usernames) {
            log::error!("Could not register {}: {}", record.username, err);
            self.unstore(&record, &previous);
            return Err(err);
        }
        log::info!("Registered {}", record.username);

        self.mark_logged_in(&record.username)?;
        Ok(record)
    }

    fn store(&mut self, record: &UserRecord, usernames: &[String]) -> Result<()> {
        self.prefs
            .set_string(&keys::user(&record.username), &serde_json::to_string(record)?)?;
        self.prefs
            .set_string(&keys::email(&record.email), &record.username)?;
        self.prefs
            .set_string(keys::USERS, &serde_json::to_string(usernames)?)?;
        Ok(())
    }

    /// Takes back a partly stored registration so no key points at a missing account.
    fn unstore(&mut self, record: &UserRecord, previous: &[String]) {
        let mut rollback = self.prefs.remove(&keys::user(&record.username));
        rollback = rollback.and(self.prefs.remove(&keys::email(&record.email)));
        if self.usernames().is_ok_and(|names| names != previous) {
            let restored = match previous {
                [] => self.prefs.remove(keys::USERS),
                _ => serde_json::to_string(previous)
                    .map_err(PrefsError::from)
                    .and_then(|json| self.prefs.set_string(keys::USERS, &json)),
            };
            rollback = rollback.and(restored);
        }
        if let Err(err) = rollback {
            log::warn!("Could not roll back {}: {}", record.username, err);
        }
    }

    pub fn login(&mut self, username: &str, password: &str) -> Result<UserRecord> {
        let username = username.trim();
        let mut missing = Vec::new();
        if username.is_empty() {
            missing.push(FieldError::Missing(Field::Username));
        }
        if password.is_empty() {
            missing.push(FieldError::Missing(Field::Password));
        }
        if !missing.is_empty() {
            return Err(AccountError::Invalid(missing));
        }

        let record = self.user(username)?.ok_or(AccountError::UnknownUser)?;
        if !record.verify(password) {
            log::debug!("Wrong password for {}", record.username);
            return Err(AccountError::WrongPassword);
        }

        self.mark_logged_in(&record.username)?;
        log::info!("Logged in as {}", record.username);
        Ok(record)
    }

    pub fn logout(&mut self) -> Result<()> {
        self.prefs.set_bool(keys::LOGGED_IN, false)?;
        self.prefs.remove(keys::CURRENT_USER)?;
        log::info!("Logged out");
        Ok(())
    }

    /// Name of the logged in player, if the session flag is set.
    pub fn current_user(&self) -> Option<String> {
        if !self.prefs.get_bool(keys::LOGGED_IN, false) {
            return None;
        }
        self.prefs
            .get_string(keys::CURRENT_USER)
            .filter(|name| !name.is_empty())
    }

    fn mark_logged_in(&mut self, username: &str) -> Result<()> {
        self.prefs.set_bool(keys::LOGGED_IN, true)?;
        self.prefs.set_string(keys::CURRENT_USER, username)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcade_core::{MemoryPreferences, PrefValue};

    fn accounts() -> Accounts<MemoryPreferences> {
        Accounts::new(MemoryPreferences::new())
    }

    fn invalid(result: Result<UserRecord>) -> Vec<FieldError> {
        match result {
            Err(AccountError::Invalid(errors)) => errors,
            other => panic!("expected validation errors, got {other:?}"),
        }
    }

    #[test]
    fn registration_logs_the_user_in() {
        let mut accounts = accounts();

        let record = accounts.register(" Ana ", "ana@example.com", "secret1").unwrap();

        assert_eq!(record.username, "Ana");
        assert_eq!(accounts.current_user().as_deref(), Some("Ana"));
        assert_eq!(accounts.usernames().unwrap(), vec!["Ana".to_owned()]);
        assert!(accounts.is_email_taken("ANA@example.com"));
    }

    #[test]
    fn password_is_never_stored_in_plain_text() {
        let prefs = MemoryPreferences::new();
        let mut accounts = Accounts::new(prefs.clone());
        accounts.register("bob", "bob@example.com", "hunter22").unwrap();

        let stored = prefs.get_string(&keys::user("bob")).unwrap();
        assert!(!stored.contains("hunter22"));
        let record: UserRecord = serde_json::from_str(&stored).unwrap();
        assert_eq!(record.password_hash.len(), 64);
        assert!(record.verify("hunter22"));
        assert!(!record.verify("hunter23"));
    }

    /// Accepts a fixed number of writes, then refuses every further one.
    struct FailingAfter {
        inner: MemoryPreferences,
        writes: usize,
    }

    impl Preferences for FailingAfter {
        fn get_value(&self, key: &str) -> Option<PrefValue> {
            self.inner.get_value(key)
        }

        fn set_value(&mut self, key: &str, value: PrefValue) -> Result<(), PrefsError> {
            if self.writes == 0 {
                return Err(std::io::Error::other("disk full").into());
            }
            self.writes -= 1;
            self.inner.set_value(key, value)
        }

        fn remove(&mut self, key: &str) -> Result<(), PrefsError> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn failed_registration_leaves_no_trace() {
        for writes in 0..3 {
            let prefs = MemoryPreferences::new();
            let mut accounts = Accounts::new(FailingAfter {
                inner: prefs.clone(),
                writes,
            });

            let err = accounts.register("dora", "dora@example.com", "explorer").unwrap_err();

            assert!(matches!(err, AccountError::Storage(_)));
            assert!(prefs.is_empty(), "{writes} writes left {prefs:?}");
            assert!(!accounts.is_username_taken("dora"));
            assert!(!accounts.is_email_taken("dora@example.com"));
            assert_eq!(accounts.current_user(), None);
        }
    }

    #[test]
    fn failed_registration_keeps_earlier_accounts() {
        let prefs = MemoryPreferences::new();
        let mut accounts = Accounts::new(FailingAfter {
            inner: prefs.clone(),
            writes: 6,
        });
        accounts.register("emil", "emil@example.com", "password").unwrap();

        assert!(accounts.register("finn", "finn@example.com", "password").is_err());

        assert_eq!(accounts.usernames().unwrap(), vec!["emil".to_owned()]);
        assert!(accounts.is_username_taken("emil"));
        assert!(!accounts.is_username_taken("finn"));
        assert!(!accounts.is_email_taken("finn@example.com"));
    }

    #[test]
    fn same_password_gets_different_digests() {
        let mut accounts = accounts();
        let a = accounts.register("alice", "a@example.com", "password").unwrap();
        let b = accounts.register("carol", "c@example.com", "password").unwrap();
        assert_ne!(a.password_hash, b.password_hash);
    }

    #[test]
    fn every_failing_field_is_reported() {
        let mut accounts = accounts();

        let errors = invalid(accounts.register("", "", ""));
        assert_eq!(
            errors,
            vec![
                FieldError::Missing(Field::Username),
                FieldError::Missing(Field::Email),
                FieldError::Missing(Field::Password),
            ]
        );

        let errors = invalid(accounts.register("al", "not-an-email", "12345"));
        assert_eq!(
            errors,
            vec![
                FieldError::UsernameTooShort,
                FieldError::EmailMalformed,
                FieldError::PasswordTooShort,
            ]
        );
        assert_eq!(accounts.current_user(), None);
    }

    #[test]
    fn usernames_and_emails_are_unique_ignoring_case() {
        let mut accounts = accounts();
        accounts.register("Dave", "dave@example.com", "123456").unwrap();

        let errors = invalid(accounts.register("dAVE", "DAVE@example.com", "123456"));

        assert_eq!(errors, vec![FieldError::UsernameTaken, FieldError::EmailTaken]);
        assert_eq!(errors[1].field(), Field::Email);
    }

    #[test]
    fn login_tells_unknown_user_from_wrong_password() {
        let mut accounts = accounts();
        accounts.register("erin", "erin@example.com", "letmein").unwrap();
        accounts.logout().unwrap();

        assert!(matches!(accounts.login("frank", "letmein"), Err(AccountError::UnknownUser)));
        assert!(matches!(accounts.login("erin", "letmeout"), Err(AccountError::WrongPassword)));
        assert_eq!(accounts.current_user(), None);

        let record = accounts.login("ERIN", "letmein").unwrap();
        assert_eq!(record.username, "erin");
        assert_eq!(accounts.current_user().as_deref(), Some("erin"));
    }

    #[test]
    fn login_requires_both_fields() {
        let mut accounts = accounts();
        let errors = invalid(accounts.login("  ", ""));
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn logout_clears_the_session() {
        let prefs = MemoryPreferences::new();
        let mut accounts = Accounts::new(prefs.clone());
        accounts.register("gina", "gina@example.com", "abcdef").unwrap();

        accounts.logout().unwrap();

        assert_eq!(accounts.current_user(), None);
        assert_eq!(prefs.get_value(keys::LOGGED_IN), Some(PrefValue::Bool(false)));
        assert!(!prefs.contains(keys::CURRENT_USER));
    }

    #[test]
    fn corrupt_records_surface_as_errors() {
        let mut prefs = MemoryPreferences::new();
        prefs.set_string(&keys::user("hank"), "{not json").unwrap();
        let mut accounts = Accounts::new(prefs);

        assert!(matches!(accounts.login("hank", "whatever"), Err(AccountError::Corrupt(_))));
    }

    #[test]
    fn email_shapes() {
        for good in ["a@b.co", "first.last+tag@mail.example.org", "x_y%z@host-1.io"] {
            assert!(is_valid_email(good), "{good}");
        }
        for bad in ["", "plain", "@example.com", "a@", "a@nodot", "a@.com", "a b@c.com", "a@b..com"] {
            assert!(!is_valid_email(bad), "{bad}");
        }
    }
}
