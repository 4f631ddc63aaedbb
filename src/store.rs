//! Persistent key-value store for aircraft profiles
//!
//! Values are postcard-encoded under fixed key names. When the stored shape
//! changes, a new key name is used instead of migrating old data.

use anyhow::Result;
use fjall::Keyspace;
use serde::{Serialize, de::DeserializeOwned};
use std::fmt::Debug;
use std::path::Path;
use tokio::task;
use tracing::info;

use crate::AppError;
use crate::performance::AircraftProfile;

/// Profile collection, versioned by key name
pub const PROFILES_KEY: &str = "aircraft_profiles_v2";
/// Id of the profile selected last
pub const ACTIVE_PROFILE_KEY: &str = "active_profile_id";

pub struct KeyValueStore {
    _db: fjall::Database,
    store: Keyspace,
}

fn get_from_store(store: Keyspace, key: Vec<u8>) -> anyhow::Result<Option<Vec<u8>>> {
    Ok(store.get(key)?.map(|v| v.to_vec()))
}

impl KeyValueStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = fjall::Database::builder(&path).open()?;
        let items = db.keyspace("settings", fjall::KeyspaceCreateOptions::default)?;
        Ok(KeyValueStore {
            _db: db,
            store: items,
        })
    }

    /// Stores a serializable value under `key`, replacing any previous value.
    #[tracing::instrument(name = "put_store", level = "debug", skip(self))]
    pub async fn put<T: Serialize + Send + Debug + 'static>(&self, key: &str, value: T) -> Result<()> {
        let store = self.store.clone();
        let key = key.as_bytes().to_vec();
        let bytes = postcard::to_stdvec(&value)?;

        task::spawn_blocking(move || store.insert(key, bytes)).await??;
        Ok(())
    }

    /// Retrieves the value under `key`, `None` if it was never written.
    #[tracing::instrument(name = "query_store", level = "debug", skip(self))]
    pub async fn get<T: DeserializeOwned + Send + 'static>(&self, key: &str) -> Result<Option<T>> {
        let store = self.store.clone();
        let key_bytes = key.as_bytes().to_vec();

        let maybe_bytes: Option<Vec<u8>> =
            task::spawn_blocking(move || get_from_store(store, key_bytes)).await??;

        match maybe_bytes {
            Some(bytes) => {
                tracing::debug!("Key found");
                Ok(Some(postcard::from_bytes(&bytes)?))
            }
            None => {
                tracing::debug!("Key not found");
                Ok(None)
            }
        }
    }

    pub async fn remove(&self, key: &str) -> Result<()> {
        let key = key.as_bytes().to_vec();
        let store = self.store.clone();
        task::spawn_blocking(move || store.remove(key)).await??;
        Ok(())
    }
}

/// Profile collection and active selection on top of [`KeyValueStore`]
pub struct ProfileStore {
    kv: KeyValueStore,
}

impl ProfileStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        std::fs::create_dir_all(path).map_err(|e| AppError::io(path, e))?;
        let kv = KeyValueStore::open(path).map_err(|e| {
            AppError::store(format!("Failed to open store at {}: {e}", path.display()))
        })?;
        Ok(Self { kv })
    }

    /// Stored profiles, or the built-in default when nothing was saved yet.
    pub async fn load_profiles(&self) -> Result<Vec<AircraftProfile>> {
        let stored: Option<Vec<AircraftProfile>> = self
            .kv
            .get(PROFILES_KEY)
            .await
            .map_err(|e| AppError::store(format!("Stored profiles could not be read: {e}")))?;
        match stored {
            Some(profiles) if !profiles.is_empty() => Ok(profiles),
            _ => Ok(vec![AircraftProfile::builtin_default()]),
        }
    }

    pub async fn save_profiles(&self, profiles: Vec<AircraftProfile>) -> Result<()> {
        info!("Saving {} profiles", profiles.len());
        self.kv.put(PROFILES_KEY, profiles).await
    }

    pub async fn active_profile_id(&self) -> Result<Option<String>> {
        self.kv.get(ACTIVE_PROFILE_KEY).await
    }

    pub async fn set_active_profile_id(&self, id: &str) -> Result<()> {
        let profiles = self.load_profiles().await?;
        if !profiles.iter().any(|p| p.id == id) {
            return Err(AppError::validation(format!("Unknown profile '{id}'")).into());
        }
        self.kv.put(ACTIVE_PROFILE_KEY, id.to_string()).await
    }

    /// Validate `profile`, then replace the stored profile with the same id or append it.
    pub async fn upsert_profile(&self, profile: AircraftProfile) -> Result<()> {
        profile.validate()?;
        let mut profiles = self.load_profiles().await?;
        if let Some(index) = profiles.iter().position(|p| p.id == profile.id) {
            profiles[index] = profile;
        } else {
            profiles.push(profile);
        }
        self.save_profiles(profiles).await
    }

    /// Remove a profile. The last remaining profile cannot be removed.
    pub async fn remove_profile(&self, id: &str) -> Result<()> {
        let mut profiles = self.load_profiles().await?;
        if !profiles.iter().any(|p| p.id == id) {
            return Err(AppError::validation(format!("Unknown profile '{id}'")).into());
        }
        if profiles.len() == 1 {
            return Err(AppError::validation("Cannot remove the only profile").into());
        }
        profiles.retain(|p| p.id != id);
        self.save_profiles(profiles).await?;

        if self.active_profile_id().await?.as_deref() == Some(id) {
            self.kv.remove(ACTIVE_PROFILE_KEY).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::performance::{ConfigKey, ConfigurationDescriptor, PerformanceSample, ProfileBuilder};
    use tempfile::TempDir;

    fn warrior() -> AircraftProfile {
        ProfileBuilder::new("PA-28 Warrior")
            .configuration(ConfigurationDescriptor::new(ConfigKey::Clean, "Flaps 0°", "Vs1"))
            .sample(PerformanceSample::new(2325.0).with_speed(ConfigKey::Clean, 50.0))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_empty_store_yields_default_profile() {
        let temp_dir = TempDir::new().unwrap();
        let store = ProfileStore::open(temp_dir.path()).unwrap();

        let profiles = store.load_profiles().await.unwrap();
        assert_eq!(profiles, vec![AircraftProfile::builtin_default()]);
        assert!(store.active_profile_id().await.unwrap().is_none());
    }

    #[test]
    fn test_open_on_a_file_is_an_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("not-a-directory");
        std::fs::write(&file, b"x").unwrap();

        let err = ProfileStore::open(&file).err().unwrap();
        assert!(matches!(err.downcast_ref::<AppError>(), Some(AppError::Io { .. })));
    }

    #[tokio::test]
    async fn test_undecodable_profiles_are_a_store_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = ProfileStore::open(temp_dir.path()).unwrap();
        store.kv.put(PROFILES_KEY, "abc".to_string()).await.unwrap();

        let err = store.load_profiles().await.unwrap_err();
        assert!(matches!(err.downcast_ref::<AppError>(), Some(AppError::Store { .. })));
    }

    #[tokio::test]
    async fn test_upsert_select_and_remove() {
        let temp_dir = TempDir::new().unwrap();
        let store = ProfileStore::open(temp_dir.path()).unwrap();

        store.upsert_profile(warrior()).await.unwrap();
        let profiles = store.load_profiles().await.unwrap();
        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[1].id, "pa-28-warrior");

        store.set_active_profile_id("pa-28-warrior").await.unwrap();
        assert_eq!(
            store.active_profile_id().await.unwrap().as_deref(),
            Some("pa-28-warrior")
        );

        store.remove_profile("pa-28-warrior").await.unwrap();
        assert_eq!(store.load_profiles().await.unwrap().len(), 1);
        assert!(store.active_profile_id().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_id() {
        let temp_dir = TempDir::new().unwrap();
        let store = ProfileStore::open(temp_dir.path()).unwrap();

        let mut profile = AircraftProfile::builtin_default();
        profile.dmms_factor = 1.5;
        store.upsert_profile(profile).await.unwrap();

        let profiles = store.load_profiles().await.unwrap();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].dmms_factor, 1.5);
    }

    #[tokio::test]
    async fn test_rejects_invalid_operations() {
        let temp_dir = TempDir::new().unwrap();
        let store = ProfileStore::open(temp_dir.path()).unwrap();

        assert!(store.set_active_profile_id("missing").await.is_err());
        assert!(store.remove_profile("c172s").await.is_err());

        let mut broken = warrior();
        broken.samples.clear();
        assert!(store.upsert_profile(broken).await.is_err());
    }
}
