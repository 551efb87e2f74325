use super::{
    provider::{Provider, VersionRef},
    BoxError,
};
use crate::{
    client::Client,
    data::{CleanFilter, DataError, Field, Mutable},
    error::Result,
};
use serde_json::Value;
use tracing::debug;

/// Identity of the box a version belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxRef {
    pub username: String,
    pub name: String,
}

impl BoxRef {
    /// `username/name`
    pub fn tag(&self) -> String {
        format!("{}/{}", self.username, self.name)
    }
}

const RELEASED_STATUS: &str = "active";

#[derive(Debug, Clone)]
pub struct Version {
    client: Client,
    box_ref: BoxRef,
    state: Mutable,
    providers: Vec<Provider>,
}

resource_attributes! {
    Version {
        required { version: &str }
        optional {
            status: &str,
            description_html: &str,
            description_markdown: &str,
            created_at: &str,
            updated_at: &str,
            number: &str,
            description: &str,
        }
        mutable { description => set_description }
    }
}

impl Version {
    pub fn new(client: Client, box_ref: BoxRef, version: &str) -> Result<Version, DataError> {
        Ok(Version {
            client,
            box_ref,
            state: Mutable::new(Self::SCHEMA, [("version", Field::from(version))])?,
            providers: Vec::new(),
        })
    }

    /// Hydrate a version and its providers from a server mapping.
    pub fn load(client: Client, box_ref: BoxRef, data: &Value) -> Result<Version, DataError> {
        let state = Mutable::load(Self::SCHEMA, data)?;
        let version_ref = VersionRef {
            username: box_ref.username.clone(),
            box_name: box_ref.name.clone(),
            version: state
                .get("version")
                .as_value()
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        };
        let providers = match data.get("providers") {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| Provider::load(client.clone(), version_ref.clone(), item))
                .collect::<Result<Vec<_>, _>>()?,
            _ => Vec::new(),
        };
        Ok(Version {
            client,
            box_ref,
            state,
            providers,
        })
    }

    pub fn box_ref(&self) -> &BoxRef {
        &self.box_ref
    }

    fn version_ref(&self) -> VersionRef {
        VersionRef {
            username: self.box_ref.username.clone(),
            box_name: self.box_ref.name.clone(),
            version: self.version().to_string(),
        }
    }

    pub fn providers(&self) -> &[Provider] {
        &self.providers
    }

    /// First provider matching `name` and, when given, `architecture`.
    pub fn provider(&self, name: &str, architecture: Option<&str>) -> Option<&Provider> {
        self.providers
            .iter()
            .find(|provider| provider.matches(name, architecture))
    }

    pub fn provider_mut(&mut self, name: &str, architecture: Option<&str>) -> Option<&mut Provider> {
        self.providers
            .iter_mut()
            .find(|provider| provider.matches(name, architecture))
    }

    pub fn exist(&self) -> bool {
        self.created_at().is_some()
    }

    pub fn released(&self) -> bool {
        self.status() == Some(RELEASED_STATUS)
    }

    pub fn dirty(&self) -> bool {
        self.state.dirty() || !self.exist()
    }

    pub fn dirty_key(&self, key: &str) -> bool {
        self.state.dirty_key(key)
    }

    /// Dirty, or holding a dirty provider.
    pub fn dirty_deep(&self) -> bool {
        self.dirty() || self.providers.iter().any(Provider::dirty_deep)
    }

    pub fn clean(&mut self, data: &Value, filter: CleanFilter<'_>) -> Result<(), DataError> {
        self.state.clean(data, filter)
    }

    /// Add a local provider. Fails before any request when the same name is
    /// already present without an architecture, or with the same one.
    pub fn add_provider(
        &mut self,
        name: &str,
        architecture: Option<&str>,
    ) -> Result<&mut Provider> {
        let taken = self.providers.iter().any(|provider| {
            provider.name() == name
                && (architecture.is_none() || provider.architecture() == architecture)
        });
        if taken {
            return Err(BoxError::ProviderExists {
                tag: self.box_ref.tag(),
                version: self.version().to_string(),
                name: name.to_string(),
            }
            .into());
        }
        let provider = Provider::new(self.client.clone(), self.version_ref(), name, architecture)?;
        self.providers.push(provider);
        let index = self.providers.len() - 1;
        Ok(&mut self.providers[index])
    }

    /// Delete a provider and drop it from this version if it existed remotely.
    pub async fn delete_provider(&mut self, name: &str, architecture: Option<&str>) -> Result<bool> {
        let index = match self
            .providers
            .iter()
            .position(|provider| provider.matches(name, architecture))
        {
            Some(index) => index,
            None => return Ok(false),
        };
        let deleted = self.providers[index].delete().await?;
        if deleted {
            self.providers.remove(index);
        }
        Ok(deleted)
    }

    pub async fn release(&mut self) -> Result<()> {
        if self.released() {
            return Err(self.status_error("is already released").into());
        }
        if !self.exist() {
            return Err(self.status_error("must be saved before release").into());
        }
        let result = self
            .client
            .box_version_release(&self.box_ref.username, &self.box_ref.name, self.version())
            .await?;
        self.state.clean(&result, CleanFilter::only(&["status"]))?;
        Ok(())
    }

    pub async fn revoke(&mut self) -> Result<()> {
        if !self.released() {
            return Err(self.status_error("is not yet released").into());
        }
        let result = self
            .client
            .box_version_revoke(&self.box_ref.username, &self.box_ref.name, self.version())
            .await?;
        self.state.clean(&result, CleanFilter::only(&["status"]))?;
        Ok(())
    }

    fn status_error(&self, reason: &str) -> BoxError {
        BoxError::VersionStatusChange {
            tag: self.box_ref.tag(),
            version: self.version().to_string(),
            reason: reason.to_string(),
        }
    }

    /// Delete the version remotely. Returns false when it was never saved.
    pub async fn delete(&self) -> Result<bool> {
        if !self.exist() {
            return Ok(false);
        }
        self.client
            .box_version_delete(&self.box_ref.username, &self.box_ref.name, self.version())
            .await?;
        Ok(true)
    }

    /// Save the version's own fields if dirty, then any dirty provider.
    pub async fn save(&mut self) -> Result<()> {
        if self.dirty() {
            self.save_version().await?;
        }
        if self.dirty_deep() {
            for provider in &mut self.providers {
                provider.save().await?;
            }
        }
        Ok(())
    }

    async fn save_version(&mut self) -> Result<()> {
        let description = self.attribute("description").clone();
        let username = &self.box_ref.username;
        let name = &self.box_ref.name;
        let result = if self.exist() {
            debug!("Updating version {} of {}/{}", self.version(), username, name);
            self.client
                .box_version_update(username, name, self.version(), description)
                .await?
        } else {
            debug!("Creating version {} for {}/{}", self.version(), username, name);
            self.client
                .box_version_create(username, name, self.version(), description)
                .await?
        };
        self.state
            .clean(&result, CleanFilter::ignoring(&["providers"]))?;
        Ok(())
    }

    pub fn to_value(&self) -> Value {
        let mut map = self.state.to_map();
        map.insert(
            "providers".to_string(),
            Value::Array(self.providers.iter().map(Provider::to_value).collect()),
        );
        Value::Object(map)
    }
}
