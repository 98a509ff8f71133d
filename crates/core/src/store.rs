use crate::types::{IntegrationParams, Provider};
use anyhow::{anyhow, Result};
use directories::ProjectDirs;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

const STORE_FILE: &str = "integrations.json";
const KEY_FILE: &str = ".secret_key";
const NONCE_LEN: usize = 12;

pub fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("com", "connect-hub", "connect-hub")
        .ok_or_else(|| anyhow!("Could not determine project directories"))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredIntegrations {
    pub integrations: BTreeMap<Provider, IntegrationParams>,
}

/// Encrypted, per-provider record of the params a host has accepted from its
/// connect widgets.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    data_dir: PathBuf,
    contents: StoredIntegrations,
}

impl CredentialStore {
    pub fn open_default() -> Result<Self> {
        let dirs = project_dirs()?;
        Self::open(dirs.data_dir())
    }

    pub fn open(data_dir: &Path) -> Result<Self> {
        fs::create_dir_all(data_dir)?;
        let mut store = Self {
            data_dir: data_dir.to_path_buf(),
            contents: StoredIntegrations::default(),
        };

        let path = store.store_path();
        if path.exists() {
            let encrypted = fs::read(&path)?;
            let decrypted = store.decrypt(&encrypted)?;
            store.contents = serde_json::from_slice(&decrypted)?;
        }
        Ok(store)
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(STORE_FILE)
    }

    fn secret_key_path(&self) -> PathBuf {
        self.data_dir.join(KEY_FILE)
    }

    pub fn get(&self, provider: Provider) -> Option<&IntegrationParams> {
        self.contents.integrations.get(&provider)
    }

    pub fn params_or_default(&self, provider: Provider) -> IntegrationParams {
        self.get(provider).cloned().unwrap_or_default()
    }

    /// Replaces the entry for `provider` and writes the store.
    pub fn put(&mut self, provider: Provider, params: IntegrationParams) -> Result<()> {
        self.contents.integrations.insert(provider, params);
        self.save()
    }

    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_vec(&self.contents)?;
        let encrypted = self.encrypt(&json)?;
        write_secure_file(&self.store_path(), &encrypted)
    }

    /// Reads the existing key. Never writes, so a lost key surfaces as an
    /// error instead of being replaced.
    fn load_key(&self) -> Result<[u8; 32]> {
        let path = self.secret_key_path();
        if !path.exists() {
            return Err(anyhow!("Secret key missing at {}", path.display()));
        }

        let key_bytes = fs::read(&path)?;
        if key_bytes.len() != 32 {
            return Err(anyhow!(
                "Secret key at {} is malformed ({} bytes)",
                path.display(),
                key_bytes.len()
            ));
        }
        let mut key = [0u8; 32];
        key.copy_from_slice(&key_bytes);
        Ok(key)
    }

    fn create_key(&self) -> Result<[u8; 32]> {
        let mut key = [0u8; 32];
        rand::thread_rng().fill(&mut key);
        write_secure_file(&self.secret_key_path(), &key)?;
        Ok(key)
    }

    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        use aes_gcm::{
            aead::{Aead, KeyInit},
            Aes256Gcm, Nonce,
        };

        let key = if self.secret_key_path().exists() {
            self.load_key()?
        } else {
            self.create_key()?
        };
        let cipher = Aes256Gcm::new(aes_gcm::aead::Key::<Aes256Gcm>::from_slice(&key));

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|_| anyhow!("Encryption failed"))?;

        let mut result = nonce_bytes.to_vec();
        result.extend_from_slice(&ciphertext);
        Ok(result)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        use aes_gcm::{
            aead::{Aead, KeyInit},
            Aes256Gcm, Nonce,
        };

        if ciphertext.len() < NONCE_LEN {
            return Err(anyhow!("Invalid ciphertext"));
        }

        let key = self.load_key()?;
        let cipher = Aes256Gcm::new(aes_gcm::aead::Key::<Aes256Gcm>::from_slice(&key));

        let nonce = Nonce::from_slice(&ciphertext[..NONCE_LEN]);
        cipher
            .decrypt(nonce, &ciphertext[NONCE_LEN..])
            .map_err(|_| anyhow!("Decryption failed"))
    }
}

fn write_secure_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = file.metadata()?.permissions();
        perms.set_mode(0o600);
        fs::set_permissions(path, perms)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(token: &str) -> IntegrationParams {
        IntegrationParams::new().with_credentials(format!(r#"{{"access_token":"{}"}}"#, token))
    }

    #[test]
    fn missing_store_opens_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = CredentialStore::open(dir.path()).expect("open");
        assert!(store.get(Provider::Notion).is_none());
        assert!(store.params_or_default(Provider::Notion).is_empty());
    }

    #[test]
    fn saved_params_reload_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = CredentialStore::open(dir.path()).expect("open");
        store.put(Provider::HubSpot, params("mock_token")).expect("put");

        let raw = fs::read(store.store_path()).expect("read");
        assert!(!String::from_utf8_lossy(&raw).contains("mock_token"));

        let reopened = CredentialStore::open(dir.path()).expect("reopen");
        assert_eq!(
            reopened.get(Provider::HubSpot).and_then(|p| p.credentials()),
            Some(r#"{"access_token":"mock_token"}"#)
        );
    }

    #[test]
    fn last_put_wins() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = CredentialStore::open(dir.path()).expect("open");
        store.put(Provider::Airtable, params("old")).expect("put");
        store.put(Provider::Airtable, params("new")).expect("put");

        let reopened = CredentialStore::open(dir.path()).expect("reopen");
        assert_eq!(reopened.get(Provider::Airtable), Some(&params("new")));
    }

    #[test]
    fn lost_key_fails_open_without_writing_a_new_one() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = CredentialStore::open(dir.path()).expect("open");
        store.put(Provider::Notion, params("t")).expect("put");

        let key_path = dir.path().join(KEY_FILE);
        fs::remove_file(&key_path).expect("remove key");

        let err = CredentialStore::open(dir.path()).expect_err("open without key");
        assert!(err.to_string().contains("Secret key missing"));
        assert!(!key_path.exists());

        assert!(CredentialStore::open(dir.path()).is_err());
        assert!(!key_path.exists());
    }

    #[test]
    fn malformed_key_is_left_untouched() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = CredentialStore::open(dir.path()).expect("open");
        store.put(Provider::Airtable, params("t")).expect("put");

        let key_path = dir.path().join(KEY_FILE);
        fs::write(&key_path, b"short").expect("truncate key");

        let err = CredentialStore::open(dir.path()).expect_err("open with bad key");
        assert!(err.to_string().contains("malformed"));
        assert_eq!(fs::read(&key_path).expect("key"), b"short");
    }

    #[cfg(unix)]
    #[test]
    fn key_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = CredentialStore::open(dir.path()).expect("open");
        store.put(Provider::Notion, params("t")).expect("put");

        let mode = fs::metadata(dir.path().join(KEY_FILE))
            .expect("key metadata")
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn corrupted_store_fails_to_open() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join(STORE_FILE), b"short").expect("write");
        assert!(CredentialStore::open(dir.path()).is_err());
    }
}
