//! Signing keypair resolution.
//!
//! A keypair is 64 bytes: the 32-byte secret seed followed by the 32-byte
//! public key. It can be supplied through an environment variable or a file,
//! in any of three encodings, tried in this order:
//!
//! 1. JSON array of 64 integers (the Solana CLI `id.json` format)
//! 2. base58 string
//! 3. base64 string

use std::fmt;
use std::path::{Path, PathBuf};

use minter_types::encoding::{base58_decode, base58_encode, base64_decode};
use minter_types::env_utils::env_var;
use thiserror::Error;
use tracing::debug;

/// Length of an encoded keypair in bytes.
pub const KEYPAIR_LEN: usize = 64;

/// Environment variables checked for inline key material, in order.
pub const KEYPAIR_ENV_VARS: [&str; 2] = ["MINTER_KEYPAIR", "SOLANA_PRIVATE_KEY"];

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("no keypair found (searched: {})", searched.join(", "))]
    NotFound { searched: Vec<String> },

    #[error("keypair from {source_desc} is not a 64-byte JSON array, base58 or base64 string")]
    InvalidFormat { source_desc: String },

    #[error("failed to read keypair file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A 64-byte signing keypair. `Debug` never prints the secret half.
#[derive(Clone, PartialEq, Eq)]
pub struct Keypair([u8; KEYPAIR_LEN]);

impl Keypair {
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let array: [u8; KEYPAIR_LEN] = bytes.try_into().ok()?;
        Some(Self(array))
    }

    pub fn to_bytes(&self) -> [u8; KEYPAIR_LEN] {
        self.0
    }

    /// Base58 public key (the trailing 32 bytes).
    pub fn pubkey(&self) -> String {
        base58_encode(&self.0[32..])
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("pubkey", &self.pubkey())
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Where a keypair came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    Env(String),
    File(PathBuf),
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Env(name) => write!(f, "env:{}", name),
            CredentialSource::File(path) => write!(f, "file:{}", path.display()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedKeypair {
    pub keypair: Keypair,
    pub source: CredentialSource,
}

/// Decode key material, trying each supported encoding in turn.
pub fn decode_keypair(text: &str) -> Option<Keypair> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if text.starts_with('[') {
        return serde_json::from_str::<Vec<u8>>(text)
            .ok()
            .and_then(|bytes| Keypair::from_bytes(&bytes));
    }
    base58_decode(text, "keypair")
        .ok()
        .and_then(|bytes| Keypair::from_bytes(&bytes))
        .or_else(|| {
            base64_decode(text, "keypair")
                .ok()
                .and_then(|bytes| Keypair::from_bytes(&bytes))
        })
}

/// Default keypair location used by the Solana CLI.
pub fn default_keypair_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join("solana").join("id.json"))
}

/// Resolves the signer from environment variables first, then files.
#[derive(Debug, Clone)]
pub struct CredentialProvider {
    env_vars: Vec<String>,
    paths: Vec<PathBuf>,
}

impl Default for CredentialProvider {
    fn default() -> Self {
        Self {
            env_vars: KEYPAIR_ENV_VARS.iter().map(|s| s.to_string()).collect(),
            paths: default_keypair_path().into_iter().collect(),
        }
    }
}

impl CredentialProvider {
    /// A provider that searches nothing; add sources with the builder methods.
    pub fn empty() -> Self {
        Self {
            env_vars: Vec::new(),
            paths: Vec::new(),
        }
    }

    pub fn with_env_var(mut self, name: impl Into<String>) -> Self {
        self.env_vars.push(name.into());
        self
    }

    /// Search `path` before any previously configured file.
    pub fn with_path_first(mut self, path: impl Into<PathBuf>) -> Self {
        self.paths.insert(0, path.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.paths.push(path.into());
        self
    }

    pub fn resolve_keypair(&self) -> Result<ResolvedKeypair, CredentialError> {
        for name in &self.env_vars {
            if let Some(value) = env_var::<String>(name) {
                debug!(source = %name, "using keypair from environment");
                let keypair = decode_keypair(&value).ok_or_else(|| {
                    CredentialError::InvalidFormat {
                        source_desc: format!("environment variable {}", name),
                    }
                })?;
                return Ok(ResolvedKeypair {
                    keypair,
                    source: CredentialSource::Env(name.clone()),
                });
            }
        }

        for path in &self.paths {
            if let Some(keypair) = read_keypair_file(path)? {
                debug!(path = %path.display(), "using keypair file");
                return Ok(ResolvedKeypair {
                    keypair,
                    source: CredentialSource::File(path.clone()),
                });
            }
        }

        let searched = self
            .env_vars
            .iter()
            .map(|name| format!("${}", name))
            .chain(self.paths.iter().map(|p| p.display().to_string()))
            .collect();
        Err(CredentialError::NotFound { searched })
    }
}

/// `Ok(None)` when the file does not exist.
fn read_keypair_file(path: &Path) -> Result<Option<Keypair>, CredentialError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(CredentialError::Unreadable {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    decode_keypair(&contents)
        .map(Some)
        .ok_or_else(|| CredentialError::InvalidFormat {
            source_desc: path.display().to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use minter_types::encoding::base64_encode;

    fn sample_bytes() -> Vec<u8> {
        (0..64u8).collect()
    }

    #[test]
    fn test_decode_json_array() {
        let json = serde_json::to_string(&sample_bytes()).unwrap();
        let keypair = decode_keypair(&json).unwrap();
        assert_eq!(keypair.to_bytes().to_vec(), sample_bytes());
        assert_eq!(keypair.pubkey(), base58_encode(&sample_bytes()[32..]));
    }

    #[test]
    fn test_decode_base58_and_base64() {
        let b58 = base58_encode(&sample_bytes());
        let b64 = base64_encode(&sample_bytes());
        assert_eq!(decode_keypair(&b58), decode_keypair(&b64));
        assert!(decode_keypair(&b58).is_some());
    }

    #[test]
    fn test_rejects_wrong_length() {
        assert!(decode_keypair("[1,2,3]").is_none());
        assert!(decode_keypair(&base58_encode(&[7u8; 32])).is_none());
        assert!(decode_keypair("").is_none());
        assert!(decode_keypair("not a key!").is_none());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let keypair = Keypair::from_bytes(&sample_bytes()).unwrap();
        let debug = format!("{:?}", keypair);
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("[0, 1, 2"));
    }

    #[test]
    fn test_resolve_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("id.json");
        std::fs::write(&path, serde_json::to_string(&sample_bytes()).unwrap()).unwrap();

        let missing = dir.path().join("missing.json");
        let resolved = CredentialProvider::empty()
            .with_path(&missing)
            .with_path(&path)
            .resolve_keypair()
            .unwrap();
        assert_eq!(resolved.source, CredentialSource::File(path));
    }

    #[test]
    fn test_resolve_from_env() {
        let name = "MINTER_TEST_KEYPAIR_B58";
        std::env::set_var(name, base58_encode(&sample_bytes()));
        let resolved = CredentialProvider::empty()
            .with_env_var(name)
            .resolve_keypair()
            .unwrap();
        std::env::remove_var(name);
        assert_eq!(resolved.source, CredentialSource::Env(name.to_string()));
    }

    #[test]
    fn test_invalid_file_is_invalid_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("id.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();
        let err = CredentialProvider::empty()
            .with_path(&path)
            .resolve_keypair()
            .unwrap_err();
        assert!(matches!(err, CredentialError::InvalidFormat { .. }));
    }

    #[test]
    fn test_not_found_lists_sources() {
        let err = CredentialProvider::empty()
            .with_env_var("MINTER_TEST_KEYPAIR_UNSET")
            .with_path("/nonexistent/id.json")
            .resolve_keypair()
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("$MINTER_TEST_KEYPAIR_UNSET"));
        assert!(message.contains("/nonexistent/id.json"));
    }
}
