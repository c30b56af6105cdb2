use serde_json::{Map, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::ClientError;

/// Key the session token is persisted under.
pub const AUTH_TOKEN_KEY: &str = "auth_token";

/// Small key/value state file holding the session token.
///
/// Authentication is judged by presence alone: an expired token still counts
/// until the server rejects it.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TokenStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<Map<String, Value>, ClientError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(Map::new()),
            Ok(contents) => match serde_json::from_str::<Value>(&contents)? {
                Value::Object(map) => Ok(map),
                _ => Err(ClientError::CorruptState(self.path.display().to_string())),
            },
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_entries(&self, entries: &Map<String, Value>) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, contents)?;
        Ok(())
    }

    pub fn get_token(&self) -> Result<Option<String>, ClientError> {
        let entries = self.read_entries()?;
        Ok(entries
            .get(AUTH_TOKEN_KEY)
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    pub fn set_token(&self, token: &str) -> Result<(), ClientError> {
        let mut entries = self.read_entries()?;
        entries.insert(AUTH_TOKEN_KEY.to_string(), Value::String(token.to_string()));
        self.write_entries(&entries)
    }

    pub fn remove_token(&self) -> Result<(), ClientError> {
        let mut entries = self.read_entries()?;
        if entries.remove(AUTH_TOKEN_KEY).is_some() {
            self.write_entries(&entries)?;
        }
        Ok(())
    }

    pub fn is_authenticated(&self) -> Result<bool, ClientError> {
        Ok(self.get_token()?.is_some_and(|t| !t.is_empty()))
    }
}
