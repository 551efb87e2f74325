//! Typed records for endpoints that do not map to a resource.

use crate::{
    boxes::VagrantBox,
    client::{Client, SearchParams},
    data::DataError,
    error::Result,
    organization::Organization,
    search::{Search, SearchError},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A freshly created access token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateToken {
    pub token: String,
    pub token_hash: String,
    pub created_at: String,
    pub description: Option<String>,
}

impl CreateToken {
    pub fn from_response(data: Value) -> Result<CreateToken> {
        Ok(serde_json::from_value(data)?)
    }
}

/// Where a requested two-factor code was sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request2Fa {
    /// Obfuscated phone number or address
    pub destination: String,
}

impl Request2Fa {
    pub fn from_response(data: &Value) -> Result<Request2Fa, DataError> {
        data.pointer("/two_factor/obfuscated_destination")
            .and_then(Value::as_str)
            .map(|destination| Request2Fa {
                destination: destination.to_string(),
            })
            .ok_or_else(|| DataError::MissingRequiredParameter {
                name: "destination".to_string(),
            })
    }
}

/// One page of search results.
#[derive(Debug, Clone)]
pub struct SearchResults {
    client: Client,
    params: SearchParams,
    boxes: Vec<VagrantBox>,
}

impl SearchResults {
    pub fn from_response(
        client: Client,
        params: SearchParams,
        data: &Value,
    ) -> Result<SearchResults, DataError> {
        let boxes = match data.get("boxes") {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    let username = item
                        .get("username")
                        .and_then(Value::as_str)
                        .unwrap_or_default();
                    VagrantBox::load(client.clone(), username, item)
                })
                .collect::<Result<Vec<_>, _>>()?,
            _ => Vec::new(),
        };
        Ok(SearchResults {
            client,
            params,
            boxes,
        })
    }

    pub fn boxes(&self) -> &[VagrantBox] {
        &self.boxes
    }

    /// Parameters the page was requested with.
    pub fn search_parameters(&self) -> &SearchParams {
        &self.params
    }

    pub fn page(&self) -> u32 {
        self.params.page.filter(|page| *page > 0).unwrap_or(1)
    }

    pub async fn next(&self) -> Result<SearchResults> {
        Search::seeded(self.client.clone(), self.params.clone())
            .next_page()
            .await
    }

    pub async fn previous(&self) -> Result<SearchResults> {
        if self.page() <= 1 {
            return Err(SearchError::PageOutOfRange.into());
        }
        Search::seeded(self.client.clone(), self.params.clone())
            .prev_page()
            .await
    }

    /// Group the result boxes under their organizations, in order of first
    /// appearance. No requests are made.
    pub fn into_organizations(self) -> Result<Vec<Organization>, DataError> {
        let mut organizations: Vec<Organization> = Vec::new();
        for vagrant_box in self.boxes {
            let position = organizations
                .iter()
                .position(|org| org.username() == vagrant_box.username());
            let index = match position {
                Some(index) => index,
                None => {
                    organizations.push(Organization::new(
                        self.client.clone(),
                        vagrant_box.username(),
                    )?);
                    organizations.len() - 1
                }
            };
            organizations[index].adopt_box(vagrant_box);
        }
        Ok(organizations)
    }
}
