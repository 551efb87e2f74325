use super::BoxError;
use crate::{
    client::{Client, ClientError, ProviderParams, ProviderTarget, Request},
    data::{CleanFilter, DataError, Field, Mutable},
    error::Result,
};
use serde_json::Value;
use tracing::debug;
use url::Url;

/// Identity of the version a provider belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRef {
    pub username: String,
    pub box_name: String,
    pub version: String,
}

impl VersionRef {
    /// `username/box_name`
    pub fn tag(&self) -> String {
        format!("{}/{}", self.username, self.box_name)
    }
}

/// A box file for one virtualization provider, optionally for one architecture.
#[derive(Debug, Clone)]
pub struct Provider {
    client: Client,
    version_ref: VersionRef,
    state: Mutable,
}

resource_attributes! {
    Provider {
        required { name: &str }
        optional {
            hosted: bool,
            created_at: &str,
            updated_at: &str,
            checksum: &str,
            checksum_type: &str,
            original_url: &str,
            download_url: &str,
            url: &str,
            architecture: &str,
            default_architecture: bool,
        }
        mutable {
            url => set_url,
            checksum => set_checksum,
            checksum_type => set_checksum_type,
            default_architecture => set_default_architecture,
        }
    }
}

impl Provider {
    pub fn new(
        client: Client,
        version_ref: VersionRef,
        name: &str,
        architecture: Option<&str>,
    ) -> Result<Provider, DataError> {
        let mut values = vec![("name", Field::from(name))];
        if let Some(architecture) = architecture {
            values.push(("architecture", Field::from(architecture)));
        }
        Ok(Provider {
            client,
            version_ref,
            state: Mutable::new(Self::SCHEMA, values)?,
        })
    }

    pub fn load(client: Client, version_ref: VersionRef, data: &Value) -> Result<Provider, DataError> {
        Ok(Provider {
            client,
            version_ref,
            state: Mutable::load(Self::SCHEMA, data)?,
        })
    }

    pub fn version_ref(&self) -> &VersionRef {
        &self.version_ref
    }

    /// Same provider name and same architecture. `None` only matches a
    /// provider stored without one.
    pub fn matches(&self, name: &str, architecture: Option<&str>) -> bool {
        self.name() == name && self.architecture() == architecture
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

    pub fn dirty_deep(&self) -> bool {
        self.dirty()
    }

    /// Adopt server values, see [`Mutable::clean`].
    pub fn clean(&mut self, data: &Value, filter: CleanFilter<'_>) -> Result<(), DataError> {
        self.state.clean(data, filter)
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.state.to_map())
    }

    fn target(&self) -> ProviderTarget<'_> {
        ProviderTarget {
            username: &self.version_ref.username,
            name: &self.version_ref.box_name,
            version: &self.version_ref.version,
            provider: self.name(),
            architecture: self.architecture(),
        }
    }

    fn not_found(&self) -> BoxError {
        BoxError::ProviderNotFound {
            tag: self.version_ref.tag(),
            version: self.version_ref.version.clone(),
            name: self.name().to_string(),
        }
    }

    /// Save the provider if anything changed.
    pub async fn save(&mut self) -> Result<()> {
        if self.dirty() {
            self.save_provider().await?;
        }
        Ok(())
    }

    async fn save_provider(&mut self) -> Result<()> {
        let params = ProviderParams {
            url: self.attribute("url").clone(),
            checksum: self.attribute("checksum").clone(),
            checksum_type: self.attribute("checksum_type").clone(),
            default_architecture: self.attribute("default_architecture").clone(),
        };
        let result = if self.exist() {
            debug!("Updating provider {} of {}", self.name(), self.version_ref.tag());
            self.client
                .box_version_provider_update(self.target(), params)
                .await?
        } else {
            debug!("Creating provider {} for {}", self.name(), self.version_ref.tag());
            self.client
                .box_version_provider_create(self.target(), params)
                .await?
        };
        self.state.clean(&result, CleanFilter::all())?;
        Ok(())
    }

    /// Delete the provider remotely. Returns false when it was never saved.
    pub async fn delete(&self) -> Result<bool> {
        if !self.exist() {
            return Ok(false);
        }
        self.client
            .box_version_provider_delete(self.target())
            .await?;
        Ok(true)
    }

    /// Request an upload target for the box file.
    ///
    /// With `direct` the file goes straight to backend storage and the
    /// returned [`DirectUpload::confirm`] must be called once it is uploaded.
    pub async fn upload_url(&self, direct: bool) -> Result<DirectUpload> {
        if !self.exist() {
            return Err(self.not_found().into());
        }
        let response = if direct {
            self.client
                .box_version_provider_upload_direct(self.target())
                .await?
        } else {
            self.client.box_version_provider_upload(self.target()).await?
        };
        let upload_url = response
            .get("upload_path")
            .and_then(Value::as_str)
            .ok_or_else(|| DataError::MissingRequiredParameter {
                name: "upload_path".to_string(),
            })?
            .to_string();
        let callback_url = response
            .get("callback")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(DirectUpload {
            upload_url,
            callback_url,
            client: self.client.clone(),
        })
    }
}

/// Where to send a box file, and the callback to issue afterwards.
#[derive(Debug, Clone)]
pub struct DirectUpload {
    pub upload_url: String,
    /// Present for direct uploads only
    pub callback_url: Option<String>,
    client: Client,
}

impl DirectUpload {
    /// Tell the service the upload finished. A no-op without a callback.
    pub async fn confirm(&self) -> Result<(), ClientError> {
        let callback = match &self.callback_url {
            Some(callback) => callback,
            None => return Ok(()),
        };
        let path = match Url::parse(callback) {
            Ok(url) => url.path().to_string(),
            Err(_) => callback.clone(),
        };
        self.client.request(Request::put(path)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::Error,
        testing::{client_with, json_body, MockTransport},
        transport::Method,
    };
    use serde_json::json;

    fn version_ref() -> VersionRef {
        VersionRef {
            username: "hashicorp".to_string(),
            box_name: "precise64".to_string(),
            version: "1.0.0".to_string(),
        }
    }

    #[test]
    fn test_new_provider_is_dirty() {
        let provider =
            Provider::new(client_with(MockTransport::new()), version_ref(), "virtualbox", None)
                .unwrap();
        assert!(!provider.exist());
        assert!(provider.dirty());
        assert_eq!(provider.architecture(), None);
    }

    #[test]
    fn test_matches() {
        let client = client_with(MockTransport::new());
        let plain = Provider::new(client.clone(), version_ref(), "virtualbox", None).unwrap();
        let amd64 =
            Provider::new(client, version_ref(), "virtualbox", Some("amd64")).unwrap();

        assert!(plain.matches("virtualbox", None));
        assert!(!plain.matches("virtualbox", Some("amd64")));
        assert!(!amd64.matches("virtualbox", None));
        assert!(amd64.matches("virtualbox", Some("amd64")));
        assert!(!amd64.matches("virtualbox", Some("arm64")));
        assert!(!amd64.matches("vmware", None));
    }

    #[tokio::test]
    async fn test_save_creates_then_updates() {
        let transport = MockTransport::new();
        let mut provider =
            Provider::new(client_with(transport.clone()), version_ref(), "virtualbox", None)
                .unwrap();
        provider.set_url("https://example.com/precise64.box");

        transport.push_json(
            200,
            json!({"name": "virtualbox", "created_at": "2024-01-01", "url": "https://example.com/precise64.box"}),
        );
        provider.save().await.unwrap();
        assert!(provider.exist());
        assert!(!provider.dirty());
        let request = transport.last_request();
        assert_eq!(request.method, Method::Post);
        assert_eq!(
            request.url.path(),
            "/api/v1/box/hashicorp/precise64/version/1.0.0/providers"
        );
        assert_eq!(
            json_body(&request),
            json!({"provider": {"name": "virtualbox", "url": "https://example.com/precise64.box"}})
        );

        provider.save().await.unwrap();
        assert_eq!(transport.requests().len(), 1);

        provider.set_checksum("abc");
        provider.set_checksum_type("sha256");
        provider.save().await.unwrap();
        let request = transport.last_request();
        assert_eq!(request.method, Method::Put);
        assert_eq!(
            request.url.path(),
            "/api/v1/box/hashicorp/precise64/version/1.0.0/provider/virtualbox"
        );
        assert_eq!(json_body(&request)["provider"]["checksum"], "abc");
    }

    #[tokio::test]
    async fn test_delete_unsaved_is_noop() {
        let transport = MockTransport::new();
        let provider =
            Provider::new(client_with(transport.clone()), version_ref(), "virtualbox", None)
                .unwrap();
        assert!(!provider.delete().await.unwrap());
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_upload_requires_existence() {
        let provider =
            Provider::new(client_with(MockTransport::new()), version_ref(), "virtualbox", None)
                .unwrap();
        let err = provider.upload_url(false).await.unwrap_err();
        assert!(matches!(err, Error::Resource(BoxError::ProviderNotFound { .. })));
    }

    #[tokio::test]
    async fn test_direct_upload_and_callback() {
        let transport = MockTransport::new();
        let provider = Provider::load(
            client_with(transport.clone()),
            version_ref(),
            &json!({"name": "virtualbox", "created_at": "2024-01-01", "architecture": "amd64"}),
        )
        .unwrap();

        transport.push_json(
            200,
            json!({
                "upload_path": "https://storage.example.com/object",
                "callback": "https://vagrantcloud.com/api/v2/box/hashicorp/precise64/version/1.0.0/provider/virtualbox/amd64/upload/direct/confirm"
            }),
        );
        let upload = provider.upload_url(true).await.unwrap();
        assert_eq!(upload.upload_url, "https://storage.example.com/object");
        assert_eq!(
            transport.last_request().url.path(),
            "/api/v2/box/hashicorp/precise64/version/1.0.0/provider/virtualbox/amd64/upload/direct"
        );

        upload.confirm().await.unwrap();
        let request = transport.last_request();
        assert_eq!(request.method, Method::Put);
        assert_eq!(
            request.url.path(),
            "/api/v2/box/hashicorp/precise64/version/1.0.0/provider/virtualbox/amd64/upload/direct/confirm"
        );
    }
}
