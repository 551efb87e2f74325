//! Account level operations: tokens, two-factor codes and organizations.

use crate::{
    client::Client,
    data::DataError,
    error::Result,
    organization::Organization,
    response::{CreateToken, Request2Fa},
    search::Search,
};
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Account {
    client: Client,
    username: Option<String>,
}

impl Account {
    /// Validate the client's token, when it has one, and record the username
    /// it belongs to.
    pub async fn new(client: Client) -> Result<Account> {
        let mut account = Account {
            client,
            username: None,
        };
        account.setup().await?;
        Ok(account)
    }

    /// Account for a known username, without validating any token. Useful
    /// for creating the first token.
    pub fn with_username(client: Client, username: &str) -> Account {
        Account {
            client,
            username: Some(username.to_string()),
        }
    }

    async fn setup(&mut self) -> Result<()> {
        if !self.client.auth().is_available() {
            debug!("No credentials available, skipping token validation");
            return Ok(());
        }
        let response = self.client.authentication_token_validate().await?;
        self.username = response
            .pointer("/user/username")
            .and_then(Value::as_str)
            .map(str::to_string);
        debug!("Authenticated as {:?}", self.username);
        Ok(())
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    fn require_username(&self) -> Result<&str, DataError> {
        self.username()
            .ok_or_else(|| DataError::MissingRequiredParameter {
                name: "username".to_string(),
            })
    }

    pub fn searcher(&self) -> Search {
        Search::new(self.client.clone())
    }

    /// Fetch an organization, defaulting to the account's own.
    pub async fn organization(&self, name: Option<&str>) -> Result<Organization> {
        let name = match name {
            Some(name) => name,
            None => self.require_username()?,
        };
        Organization::get(self.client.clone(), name).await
    }

    pub async fn create_token(
        &self,
        password: &str,
        description: Option<&str>,
        code: Option<&str>,
    ) -> Result<CreateToken> {
        let username = self.require_username()?;
        let response = self
            .client
            .authentication_token_create(username, password, description, code)
            .await?;
        CreateToken::from_response(response)
    }

    /// Delete the token the client is using.
    pub async fn delete_token(&self) -> Result<&Self> {
        self.client.authentication_token_delete().await?;
        Ok(self)
    }

    pub async fn validate_token(&self) -> Result<&Self> {
        self.client.authentication_token_validate().await?;
        Ok(self)
    }

    pub async fn request_2fa_code(&self, password: &str, delivery_method: &str) -> Result<Request2Fa> {
        let username = self.require_username()?;
        let response = self
            .client
            .authentication_request_2fa_code(username, password, delivery_method)
            .await?;
        Ok(Request2Fa::from_response(&response)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::Auth,
        client::ClientBuilder,
        testing::{client_with, json_body, MockTransport},
        transport::Method,
    };
    use serde_json::json;

    #[tokio::test]
    async fn test_new_records_username() {
        let transport = MockTransport::new();
        transport.push_json(200, json!({"user": {"username": "hashicorp"}}));
        let account = Account::new(client_with(transport.clone())).await.unwrap();

        assert_eq!(account.username(), Some("hashicorp"));
        assert_eq!(transport.last_request().url.path(), "/api/v1/authenticate");
        assert_eq!(transport.last_request().method, Method::Get);
    }

    #[tokio::test]
    async fn test_new_without_credentials_skips_validation() {
        let transport = MockTransport::new();
        let client = ClientBuilder::new()
            .auth(Auth::anonymous())
            .transport(transport.clone())
            .build()
            .unwrap();
        let account = Account::new(client).await.unwrap();

        assert_eq!(account.username(), None);
        assert!(transport.requests().is_empty());
        assert!(account.organization(None).await.is_err());
    }

    #[tokio::test]
    async fn test_organization_defaults_to_own() {
        let transport = MockTransport::new();
        let account = Account::with_username(client_with(transport.clone()), "hashicorp");
        transport.push_json(200, json!({"username": "hashicorp"}));

        let organization = account.organization(None).await.unwrap();
        assert_eq!(organization.username(), "hashicorp");
        assert_eq!(transport.last_request().url.path(), "/api/v1/user/hashicorp");
    }

    #[tokio::test]
    async fn test_create_token() {
        let transport = MockTransport::new();
        let account = Account::with_username(client_with(transport.clone()), "hashicorp");
        transport.push_json(
            200,
            json!({"token": "TOKEN", "token_hash": "HASH", "created_at": "NOW", "description": "ci"}),
        );

        let token = account
            .create_token("secret", Some("ci"), Some("123456"))
            .await
            .unwrap();
        assert_eq!(token.token, "TOKEN");
        assert_eq!(
            json_body(&transport.last_request()),
            json!({
                "user": {"login": "hashicorp", "password": "secret"},
                "token": {"description": "ci"},
                "two_factor": {"code": "123456"}
            })
        );
    }

    #[tokio::test]
    async fn test_request_2fa_code() {
        let transport = MockTransport::new();
        let account = Account::with_username(client_with(transport.clone()), "hashicorp");
        transport.push_json(200, json!({"two_factor": {"obfuscated_destination": "2fa-dst"}}));

        let response = account.request_2fa_code("secret", "sms").await.unwrap();
        assert_eq!(response.destination, "2fa-dst");
        let request = transport.last_request();
        assert_eq!(request.url.path(), "/api/v1/two-factor/request-code");
        assert_eq!(json_body(&request)["two_factor"]["delivery_method"], "sms");
    }

    #[tokio::test]
    async fn test_token_lifecycle_calls() {
        let transport = MockTransport::new();
        let account = Account::with_username(client_with(transport.clone()), "hashicorp");

        account.validate_token().await.unwrap();
        assert_eq!(transport.last_request().method, Method::Get);
        account.delete_token().await.unwrap();
        assert_eq!(transport.last_request().method, Method::Delete);
        assert_eq!(transport.last_request().url.path(), "/api/v1/authenticate");
    }
}
