//! Boxes and the versions and providers they own.
//!
//! A [`VagrantBox`] owns its [`Version`]s and each version owns its
//! [`Provider`]s. Children refer back to their parent by identity only
//! ([`BoxRef`], [`VersionRef`]), so the tree has a single owner at every level.

pub mod provider;
pub mod version;

pub use provider::{DirectUpload, Provider, VersionRef};
pub use version::{BoxRef, Version};

use crate::{
    client::{BoxParams, Client},
    data::{CleanFilter, DataError, Field, Mutable},
    error::Result,
};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq)]
pub enum BoxError {
    #[error("Box with name {name} already exists")]
    BoxExists { name: String },
    #[error("Version {version} already exists for box {tag}")]
    VersionExists { tag: String, version: String },
    #[error("Provider {name} already exists for box {tag} version {version}")]
    ProviderExists {
        tag: String,
        version: String,
        name: String,
    },
    #[error("Provider {name} not found for box {tag} version {version}")]
    ProviderNotFound {
        tag: String,
        version: String,
        name: String,
    },
    #[error("Version {version} for box {tag} {reason}")]
    VersionStatusChange {
        tag: String,
        version: String,
        reason: String,
    },
    #[error("Invalid version given: {version}")]
    InvalidVersion { version: String },
}

#[derive(Debug, Clone)]
pub struct VagrantBox {
    client: Client,
    username: String,
    state: Mutable,
    versions: Vec<Version>,
    versions_loaded: bool,
}

resource_attributes! {
    VagrantBox {
        required { name: &str }
        optional {
            created_at: &str,
            updated_at: &str,
            tag: &str,
            short_description: &str,
            description_html: &str,
            description_markdown: &str,
            private: bool,
            downloads: u64,
            current_version: &Value,
            description: &str,
        }
        mutable {
            short_description => set_short_description,
            description => set_description,
            private => set_private,
        }
    }
}

impl VagrantBox {
    pub fn new(client: Client, username: &str, name: &str) -> Result<VagrantBox, DataError> {
        Ok(VagrantBox {
            client,
            username: username.to_string(),
            state: Mutable::new(Self::SCHEMA, [("name", Field::from(name))])?,
            versions: Vec::new(),
            versions_loaded: false,
        })
    }

    /// Hydrate a box from a server mapping. Versions included in the mapping
    /// are loaded too and mark the version list as fetched.
    pub fn load(client: Client, username: &str, data: &Value) -> Result<VagrantBox, DataError> {
        let state = Mutable::load(Self::SCHEMA, data)?;
        let mut vagrant_box = VagrantBox {
            client,
            username: username.to_string(),
            state,
            versions: Vec::new(),
            versions_loaded: false,
        };
        if let Some(Value::Array(items)) = data.get("versions") {
            vagrant_box.versions = vagrant_box.load_versions(items)?;
            vagrant_box.versions_loaded = true;
        }
        Ok(vagrant_box)
    }

    /// Fetch a box from the server.
    pub async fn get(client: Client, username: &str, name: &str) -> Result<VagrantBox> {
        let data = client.box_get(username, name).await?;
        Ok(VagrantBox::load(client, username, &data)?)
    }

    /// Name of the owning organization
    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn box_ref(&self) -> BoxRef {
        BoxRef {
            username: self.username.clone(),
            name: self.name().to_string(),
        }
    }

    fn load_versions(&self, items: &[Value]) -> Result<Vec<Version>, DataError> {
        let box_ref = self.box_ref();
        items
            .iter()
            .map(|item| Version::load(self.client.clone(), box_ref.clone(), item))
            .collect()
    }

    /// Versions known so far, without fetching from the server.
    pub fn loaded_versions(&self) -> &[Version] {
        &self.versions
    }

    /// All versions, fetched from the server on first access.
    pub async fn versions(&mut self) -> Result<&[Version]> {
        self.ensure_versions().await?;
        Ok(&self.versions)
    }

    async fn ensure_versions(&mut self) -> Result<()> {
        if self.versions_loaded {
            return Ok(());
        }
        if self.exist() {
            debug!("Loading versions of box {}/{}", self.username, self.name());
            let data = self.client.box_get(&self.username, self.name()).await?;
            let mut remote = match data.get("versions") {
                Some(Value::Array(items)) => self.load_versions(items)?,
                _ => Vec::new(),
            };
            // Versions added locally before the fetch win over remote copies
            remote.retain(|loaded| {
                !self
                    .versions
                    .iter()
                    .any(|local| local.version() == loaded.version())
            });
            remote.append(&mut self.versions);
            self.versions = remote;
        }
        self.versions_loaded = true;
        Ok(())
    }

    pub fn version(&self, version: &str) -> Option<&Version> {
        self.versions.iter().find(|v| v.version() == version)
    }

    pub fn version_mut(&mut self, version: &str) -> Option<&mut Version> {
        self.versions.iter_mut().find(|v| v.version() == version)
    }

    /// Add a local version after making sure the remote list is loaded.
    pub async fn add_version(&mut self, version: &str) -> Result<&mut Version> {
        if version.is_empty() || version.contains('/') {
            return Err(BoxError::InvalidVersion {
                version: version.to_string(),
            }
            .into());
        }
        self.ensure_versions().await?;
        if self.version(version).is_some() {
            return Err(BoxError::VersionExists {
                tag: self.box_ref().tag(),
                version: version.to_string(),
            }
            .into());
        }
        let new_version = Version::new(self.client.clone(), self.box_ref(), version)?;
        self.versions.push(new_version);
        let index = self.versions.len() - 1;
        Ok(&mut self.versions[index])
    }

    /// Delete a version and drop it from this box if it existed remotely.
    pub async fn delete_version(&mut self, version: &str) -> Result<bool> {
        self.ensure_versions().await?;
        let index = match self.versions.iter().position(|v| v.version() == version) {
            Some(index) => index,
            None => return Ok(false),
        };
        let deleted = self.versions[index].delete().await?;
        if deleted {
            self.versions.remove(index);
        }
        Ok(deleted)
    }

    pub fn exist(&self) -> bool {
        self.created_at().is_some()
    }

    pub fn dirty(&self) -> bool {
        self.state.dirty() || !self.exist()
    }

    pub fn dirty_key(&self, key: &str) -> bool {
        self.state.dirty_key(key)
    }

    /// Dirty, or holding a dirty version at any depth.
    pub fn dirty_deep(&self) -> bool {
        self.dirty() || self.versions.iter().any(Version::dirty_deep)
    }

    pub fn clean(&mut self, data: &Value, filter: CleanFilter<'_>) -> Result<(), DataError> {
        self.state.clean(data, filter)
    }

    /// Delete the box remotely. Returns false when it was never saved.
    pub async fn delete(&self) -> Result<bool> {
        if !self.exist() {
            return Ok(false);
        }
        self.client.box_delete(&self.username, self.name()).await?;
        Ok(true)
    }

    /// Save the box's own fields if dirty, then any dirty version.
    pub async fn save(&mut self) -> Result<()> {
        if self.dirty() {
            self.save_box().await?;
        }
        if self.dirty_deep() {
            for version in &mut self.versions {
                version.save().await?;
            }
        }
        Ok(())
    }

    async fn save_box(&mut self) -> Result<()> {
        let params = BoxParams {
            short_description: self.attribute("short_description").clone(),
            description: self.attribute("description").clone(),
            is_private: self.attribute("private").clone(),
        };
        let result = if self.exist() {
            debug!("Updating box {}/{}", self.username, self.name());
            self.client
                .box_update(&self.username, self.name(), params)
                .await?
        } else {
            debug!("Creating box {}/{}", self.username, self.name());
            self.client
                .box_create(&self.username, self.name(), params)
                .await?
        };
        self.state
            .clean(&result, CleanFilter::ignoring(&["versions"]))?;
        Ok(())
    }

    pub fn to_value(&self) -> Value {
        let mut map = self.state.to_map();
        map.insert("username".to_string(), Value::String(self.username.clone()));
        if self.versions_loaded || !self.versions.is_empty() {
            map.insert(
                "versions".to_string(),
                Value::Array(self.versions.iter().map(Version::to_value).collect()),
            );
        }
        Value::Object(map)
    }
}
