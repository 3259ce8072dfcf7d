use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrefsError {
    #[error("Could not access preferences file: {0}")]
    Io(#[from] io::Error),
    #[error("Preferences file is malformed: {0}")]
    Format(#[from] serde_json::Error),
}

/// Every key written by the arcade lives under the `arcade:` prefix.
pub mod keys {
    use crate::GameKind;

    pub const USERS: &str = "arcade:users";
    pub const LOGGED_IN: &str = "arcade:session:logged_in";
    pub const CURRENT_USER: &str = "arcade:session:user";

    pub fn best_score(kind: GameKind) -> String {
        format!("arcade:best:{}", kind.slug())
    }

    pub fn user(username: &str) -> String {
        format!("arcade:user:{}", username.to_lowercase())
    }

    pub fn email(email: &str) -> String {
        format!("arcade:email:{}", email.to_lowercase())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrefValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

/// Key-value storage that outlives a session.
///
/// Implementors only provide raw access, the typed accessors fall back to a default whenever a
/// key is absent or holds a value of another type.
pub trait Preferences {
    fn get_value(&self, key: &str) -> Option<PrefValue>;

    fn set_value(&mut self, key: &str, value: PrefValue) -> Result<(), PrefsError>;

    fn remove(&mut self, key: &str) -> Result<(), PrefsError>;

    fn contains(&self, key: &str) -> bool {
        self.get_value(key).is_some()
    }

    fn get_string(&self, key: &str) -> Option<String> {
        match self.get_value(key) {
            Some(PrefValue::Str(value)) => Some(value),
            _ => None,
        }
    }

    fn get_string_or(&self, key: &str, default: &str) -> String {
        self.get_string(key).unwrap_or_else(|| default.to_owned())
    }

    fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.get_value(key) {
            Some(PrefValue::Bool(value)) => value,
            _ => default,
        }
    }

    fn get_int(&self, key: &str, default: i64) -> i64 {
        self.get_int_opt(key).unwrap_or(default)
    }

    fn get_int_opt(&self, key: &str) -> Option<i64> {
        match self.get_value(key) {
            Some(PrefValue::Int(value)) => Some(value),
            _ => None,
        }
    }

    fn set_string(&mut self, key: &str, value: &str) -> Result<(), PrefsError> {
        self.set_value(key, PrefValue::Str(value.to_owned()))
    }

    fn set_bool(&mut self, key: &str, value: bool) -> Result<(), PrefsError> {
        self.set_value(key, PrefValue::Bool(value))
    }

    fn set_int(&mut self, key: &str, value: i64) -> Result<(), PrefsError> {
        self.set_value(key, PrefValue::Int(value))
    }
}

impl<P: Preferences + ?Sized> Preferences for &mut P {
    fn get_value(&self, key: &str) -> Option<PrefValue> {
        (**self).get_value(key)
    }

    fn set_value(&mut self, key: &str, value: PrefValue) -> Result<(), PrefsError> {
        (**self).set_value(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), PrefsError> {
        (**self).remove(key)
    }
}

impl<P: Preferences + ?Sized> Preferences for Box<P> {
    fn get_value(&self, key: &str) -> Option<PrefValue> {
        (**self).get_value(key)
    }

    fn set_value(&mut self, key: &str, value: PrefValue) -> Result<(), PrefsError> {
        (**self).set_value(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), PrefsError> {
        (**self).remove(key)
    }
}

/// In-memory preferences, clones share the same entries.
#[derive(Clone, Debug, Default)]
pub struct MemoryPreferences {
    entries: Rc<RefCell<BTreeMap<String, PrefValue>>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl Preferences for MemoryPreferences {
    fn get_value(&self, key: &str) -> Option<PrefValue> {
        self.entries.borrow().get(key).cloned()
    }

    fn set_value(&mut self, key: &str, value: PrefValue) -> Result<(), PrefsError> {
        self.entries.borrow_mut().insert(key.to_owned(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PrefsError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// Preferences persisted as a JSON object, rewritten on every change.
#[derive(Debug)]
pub struct JsonFilePreferences {
    path: PathBuf,
    entries: BTreeMap<String, PrefValue>,
}

impl JsonFilePreferences {
    /// Opens the file at `path`, a missing file starts out empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PrefsError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                log::debug!("No preferences at {}, starting empty", path.display());
                BTreeMap::new()
            }
            Err(err) => return Err(err.into()),
        };
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<(), PrefsError> {
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, contents)?;
        Ok(())
    }
}

impl Preferences for JsonFilePreferences {
    fn get_value(&self, key: &str) -> Option<PrefValue> {
        self.entries.get(key).cloned()
    }

    /// The entry only changes once the file has been written.
    fn set_value(&mut self, key: &str, value: PrefValue) -> Result<(), PrefsError> {
        let previous = self.entries.insert(key.to_owned(), value);
        if let Err(err) = self.save() {
            match previous {
                Some(previous) => self.entries.insert(key.to_owned(), previous),
                None => self.entries.remove(key),
            };
            return Err(err);
        }
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PrefsError> {
        if let Some(previous) = self.entries.remove(key)
            && let Err(err) = self.save()
        {
            self.entries.insert(key.to_owned(), previous);
            return Err(err);
        }
        Ok(())
    }
}
