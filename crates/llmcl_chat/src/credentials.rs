//! Where the endpoint credential is kept between sessions

use parking_lot::Mutex;
use std::fmt::{Debug, Formatter};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The fixed name the credential is stored under
pub const CREDENTIAL_KEY: &str = "llmcl_api_key";

/// A secret used to authenticate with the endpoint. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Creates a credential, returning `None` if it is blank
    pub fn new(secret: impl Into<String>) -> Option<Self> {
        let secret = secret.into();
        let trimmed = secret.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl Debug for Credential {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(..)")
    }
}

/// Loads and saves the single credential
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> io::Result<Option<Credential>>;

    fn save(&self, credential: &Credential) -> io::Result<()>;
}

/// Keeps the credential in a file named [CREDENTIAL_KEY] inside a directory
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    directory: PathBuf,
}

impl FileCredentialStore {
    pub fn new(directory: impl AsRef<Path>) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
        }
    }

    /// The file the credential lives in
    pub fn path(&self) -> PathBuf {
        self.directory.join(CREDENTIAL_KEY)
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> io::Result<Option<Credential>> {
        let path = self.path();
        match std::fs::read_to_string(&path) {
            Ok(secret) => Ok(Credential::new(secret)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("no credential at {path:?}");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn save(&self, credential: &Credential) -> io::Result<()> {
        std::fs::create_dir_all(&self.directory)?;
        std::fs::write(self.path(), credential.expose())
    }
}

/// Keeps the credential in memory only
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    credential: Mutex<Option<Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds a credential
    pub fn with_credential(credential: Credential) -> Self {
        Self {
            credential: Mutex::new(Some(credential)),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> io::Result<Option<Credential>> {
        Ok(self.credential.lock().clone())
    }

    fn save(&self, credential: &Credential) -> io::Result<()> {
        *self.credential.lock() = Some(credential.clone());
        Ok(())
    }
}
