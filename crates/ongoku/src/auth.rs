//! Account authentication.
//!
//! The account token authorizes calls to the project service. It is looked
//! up in priority order:
//!
//! 1. **Environment** - `ONGOKU_TOKEN`, for CI and scripted use
//! 2. **Session store** - `<config dir>/credentials.json`, written by `ongoku login`
//!
//! Stored tokens are sealed with AES-256-GCM. The key is read from
//! `ONGOKU_TOKEN_KEY` when set, otherwise from `session.key` next to the
//! store, which is generated on first login.
//!
//! Repository tokens are a separate, short-lived credential handled by
//! [`crate::git::CredentialBroker`].

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use secrecy::{ExposeSecret, SecretString};

use crate::config::config_dir;
use crate::error::ConfigError;

/// Environment variable that overrides the stored account token.
pub const TOKEN_ENV_VAR: &str = "ONGOKU_TOKEN";

pub const DEFAULT_SERVICE: &str = "ongoku";
pub const DEFAULT_ACCOUNT: &str = "default";

/// Hex-encoded 32-byte key that overrides the generated key file.
pub const TOKEN_KEY_ENV_VAR: &str = "ONGOKU_TOKEN_KEY";

const CREDENTIALS_FILE: &str = "credentials.json";
const KEY_FILE: &str = "session.key";

/// Nonce size for AES-256-GCM (96 bits = 12 bytes).
const NONCE_SIZE: usize = 12;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("No token source provided (need one of: direct value, file path, or env var name)")]
    NoSourceProvided,

    #[error("Failed to read token from file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Environment variable '{name}' not set")]
    EnvVarNotSet { name: String },

    #[error("Environment variable '{name}' contains invalid UTF-8")]
    EnvVarNotUnicode { name: String },

    #[error("Token is empty")]
    EmptyToken,

    #[error("Failed to read session store '{path}': {source}")]
    ReadStore {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write session store '{path}': {source}")]
    WriteStore {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Session store '{path}' is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("Invalid session key: {0}")]
    InvalidKey(String),

    #[error("Failed to encrypt token: {0}")]
    Encryption(String),

    #[error("Failed to decrypt stored token: {0}")]
    Decryption(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// Resolves a token from multiple sources in priority order:
/// 1. Direct value (if provided and non-empty)
/// 2. File contents (if path provided)
/// 3. Environment variable (if name provided)
///
/// Values are trimmed; an empty result is rejected.
pub fn resolve_token(
    direct: Option<&str>,
    file_path: Option<&str>,
    env_var: Option<&str>,
) -> Result<SecretString> {
    let token = resolve_raw(direct, file_path, env_var)?;
    if token.expose_secret().is_empty() {
        return Err(SessionError::EmptyToken);
    }
    Ok(token)
}

fn resolve_raw(
    direct: Option<&str>,
    file_path: Option<&str>,
    env_var: Option<&str>,
) -> Result<SecretString> {
    if let Some(value) = direct.filter(|v| !v.is_empty()) {
        return Ok(SecretString::from(value.trim().to_string()));
    }

    if let Some(path) = file_path.filter(|p| !p.is_empty()) {
        let expanded = expand_home(path);
        return fs::read_to_string(&expanded)
            .map(|content| SecretString::from(content.trim().to_string()))
            .map_err(|e| SessionError::FileReadError {
                path: expanded,
                source: e,
            });
    }

    if let Some(name) = env_var.filter(|n| !n.is_empty()) {
        return match std::env::var(name) {
            Ok(value) => Ok(SecretString::from(value.trim().to_string())),
            Err(std::env::VarError::NotPresent) => Err(SessionError::EnvVarNotSet {
                name: name.to_string(),
            }),
            Err(std::env::VarError::NotUnicode(_)) => Err(SessionError::EnvVarNotUnicode {
                name: name.to_string(),
            }),
        };
    }

    Err(SessionError::NoSourceProvided)
}

/// Expands `~` to the user's home directory.
///
/// Handles `~/path` and standalone `~`; `~user/path` is left unchanged.
fn expand_home(path: &str) -> String {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = dirs::home_dir() {
            if path == "~" {
                return home.to_string_lossy().into_owned();
            }
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}

/// Source of the account token for service calls.
pub trait AuthProvider: Send + Sync {
    /// The account token, or `None` when logged out.
    fn token(&self) -> Result<Option<SecretString>>;

    fn is_authenticated(&self) -> bool {
        matches!(self.token(), Ok(Some(_)))
    }
}

/// Seals tokens at rest with AES-256-GCM.
pub struct TokenCipher {
    cipher: Aes256Gcm,
}

impl TokenCipher {
    /// Creates a cipher from a 64-character hex key.
    pub fn from_hex_key(key_hex: &str) -> Result<Self> {
        let key = hex::decode(key_hex.trim())
            .map_err(|e| SessionError::InvalidKey(format!("Invalid hex key: {}", e)))?;

        if key.len() != 32 {
            return Err(SessionError::InvalidKey(format!(
                "Key must be 32 bytes (64 hex chars), got {} bytes",
                key.len()
            )));
        }

        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|e| SessionError::InvalidKey(e.to_string()))?;
        Ok(Self { cipher })
    }

    /// A fresh random key, hex-encoded.
    pub fn generate_key() -> String {
        hex::encode(Aes256Gcm::generate_key(OsRng))
    }

    /// Returns `<nonce><ciphertext>`, hex-encoded.
    pub fn seal(&self, plaintext: &str) -> Result<String> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| SessionError::Encryption(e.to_string()))?;

        let mut combined = nonce.to_vec();
        combined.extend(ciphertext);
        Ok(hex::encode(combined))
    }

    pub fn open(&self, sealed: &str) -> Result<SecretString> {
        let combined = hex::decode(sealed)
            .map_err(|e| SessionError::Decryption(format!("Invalid hex: {}", e)))?;

        if combined.len() < NONCE_SIZE {
            return Err(SessionError::Decryption("Ciphertext too short".to_string()));
        }

        let (nonce, ciphertext) = combined.split_at(NONCE_SIZE);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|e| SessionError::Decryption(e.to_string()))?;

        String::from_utf8(plaintext)
            .map(SecretString::from)
            .map_err(|e| SessionError::Decryption(format!("Invalid UTF-8: {}", e)))
    }
}

/// Keyed secret storage.
pub trait CredentialStore {
    fn set(&self, service: &str, account: &str, secret: &SecretString) -> Result<()>;

    fn get(&self, service: &str, account: &str) -> Result<Option<SecretString>>;

    /// Removes an entry. Returns false when there was nothing to remove.
    fn delete(&self, service: &str, account: &str) -> Result<bool>;
}

/// JSON file of `service:account -> sealed token` entries. The file and
/// its key are readable only by the owner on Unix.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
    service: String,
    account: String,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            service: DEFAULT_SERVICE.to_string(),
            account: DEFAULT_ACCOUNT.to_string(),
        }
    }

    /// Store at `<config dir>/credentials.json`.
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(config_dir()?.join(CREDENTIALS_FILE)))
    }

    pub fn with_account(mut self, service: &str, account: &str) -> Self {
        self.service = service.to_string();
        self.account = account.to_string();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stores the account token under this store's service and account.
    pub fn login(&self, token: &SecretString) -> Result<()> {
        self.set(&self.service, &self.account, token)?;
        log::info!("Stored account token in {}", self.path.display());
        Ok(())
    }

    pub fn logout(&self) -> Result<bool> {
        self.delete(&self.service, &self.account)
    }

    fn key(service: &str, account: &str) -> String {
        format!("{}:{}", service, account)
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = fs::read_to_string(&self.path).map_err(|e| SessionError::ReadStore {
            path: self.path.clone(),
            source: e,
        })?;

        serde_json::from_str(&content).map_err(|e| SessionError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let write_err = |e| SessionError::WriteStore {
            path: self.path.clone(),
            source: e,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let content = serde_json::to_string_pretty(entries).map_err(|e| SessionError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        write_private(&self.path, &content).map_err(write_err)
    }

    fn key_path(&self) -> PathBuf {
        self.path.with_file_name(KEY_FILE)
    }

    /// The sealing key. With `create`, a missing key file is generated.
    fn cipher(&self, create: bool) -> Result<Option<TokenCipher>> {
        if let Ok(key) = std::env::var(TOKEN_KEY_ENV_VAR) {
            if !key.is_empty() {
                return TokenCipher::from_hex_key(&key).map(Some);
            }
        }

        let key_path = self.key_path();
        if key_path.exists() {
            let key = fs::read_to_string(&key_path).map_err(|e| SessionError::ReadStore {
                path: key_path.clone(),
                source: e,
            })?;
            return TokenCipher::from_hex_key(&key).map(Some);
        }

        if !create {
            return Ok(None);
        }

        if let Some(parent) = key_path.parent() {
            fs::create_dir_all(parent).map_err(|e| SessionError::WriteStore {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let key = TokenCipher::generate_key();
        write_private(&key_path, &key).map_err(|e| SessionError::WriteStore {
            path: key_path.clone(),
            source: e,
        })?;
        log::debug!("Generated session key {}", key_path.display());
        TokenCipher::from_hex_key(&key).map(Some)
    }
}

/// Writes `content` to `path` with owner-only permissions on Unix, also
/// tightening the mode of a file that already exists.
fn write_private(path: &Path, content: &str) -> std::io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(content.as_bytes())
}

impl CredentialStore for FileSessionStore {
    fn set(&self, service: &str, account: &str, secret: &SecretString) -> Result<()> {
        let mut entries = self.read_entries()?;
        let sealed = self
            .cipher(true)?
            .ok_or_else(|| SessionError::InvalidKey("no session key available".to_string()))?
            .seal(secret.expose_secret())?;
        entries.insert(Self::key(service, account), sealed);
        self.write_entries(&entries)
    }

    fn get(&self, service: &str, account: &str) -> Result<Option<SecretString>> {
        let Some(sealed) = self
            .read_entries()?
            .remove(&Self::key(service, account))
            .filter(|token| !token.is_empty())
        else {
            return Ok(None);
        };

        let cipher = self.cipher(false)?.ok_or_else(|| SessionError::Corrupt {
            path: self.path.clone(),
            reason: format!("session key {} is missing", self.key_path().display()),
        })?;
        cipher.open(&sealed).map(Some)
    }

    fn delete(&self, service: &str, account: &str) -> Result<bool> {
        let mut entries = self.read_entries()?;
        if entries.remove(&Self::key(service, account)).is_none() {
            return Ok(false);
        }
        self.write_entries(&entries)?;
        Ok(true)
    }
}

impl AuthProvider for FileSessionStore {
    fn token(&self) -> Result<Option<SecretString>> {
        match resolve_token(None, None, Some(TOKEN_ENV_VAR)) {
            Ok(token) => return Ok(Some(token)),
            Err(SessionError::EnvVarNotSet { .. }) | Err(SessionError::EmptyToken) => {}
            Err(e) => return Err(e),
        }
        self.get(&self.service, &self.account)
    }
}
