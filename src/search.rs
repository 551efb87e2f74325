//! Paged box search that remembers its last query.

use crate::{
    client::{Client, SearchParams},
    error::Result,
    response::SearchResults,
};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug, Error, PartialEq)]
pub enum SearchError {
    #[error("No active search currently cached")]
    NoActiveSearch,
    #[error("Cannot request page results less than one")]
    PageOutOfRange,
}

#[derive(Debug)]
pub struct Search {
    client: Client,
    params: Mutex<Option<SearchParams>>,
}

impl Search {
    pub fn new(client: Client) -> Self {
        Search {
            client,
            params: Mutex::new(None),
        }
    }

    /// Search session that continues from `params`.
    pub fn seeded(client: Client, params: SearchParams) -> Self {
        Search {
            client,
            params: Mutex::new(Some(params)),
        }
    }

    /// Fresh session seeded with the parameters of `results`.
    pub fn from_response(&self, results: &SearchResults) -> Search {
        Search::seeded(self.client.clone(), results.search_parameters().clone())
    }

    pub async fn search(&self, params: SearchParams) -> Result<SearchResults> {
        let mut current = self.params.lock().await;
        let results = self.execute(&params).await?;
        *current = Some(params);
        Ok(results)
    }

    pub async fn next_page(&self) -> Result<SearchResults> {
        let mut current = self.params.lock().await;
        let mut params = current.clone().ok_or(SearchError::NoActiveSearch)?;
        params.page = Some(params.page.unwrap_or_default().max(1) + 1);
        let results = self.execute(&params).await?;
        *current = Some(params);
        Ok(results)
    }

    /// Previous page, never going below the first.
    pub async fn prev_page(&self) -> Result<SearchResults> {
        let mut current = self.params.lock().await;
        let mut params = current.clone().ok_or(SearchError::NoActiveSearch)?;
        params.page = Some(params.page.unwrap_or_default().saturating_sub(1).max(1));
        let results = self.execute(&params).await?;
        *current = Some(params);
        Ok(results)
    }

    pub async fn is_active(&self) -> bool {
        self.params.lock().await.is_some()
    }

    pub async fn clear(&self) {
        *self.params.lock().await = None;
    }

    pub async fn seed(&self, params: SearchParams) {
        *self.params.lock().await = Some(params);
    }

    async fn execute(&self, params: &SearchParams) -> Result<SearchResults> {
        debug!("Searching boxes with {:?}", params);
        let data = self.client.search(params).await?;
        Ok(SearchResults::from_response(
            self.client.clone(),
            params.clone(),
            &data,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::Error,
        testing::{client_with, MockTransport},
    };
    use serde_json::json;

    fn query_value(transport: &MockTransport, key: &str) -> Option<String> {
        transport
            .last_request()
            .query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    #[tokio::test]
    async fn test_paging_requires_active_search() {
        let search = Search::new(client_with(MockTransport::new()));
        assert!(!search.is_active().await);
        assert!(matches!(
            search.next_page().await,
            Err(Error::Search(SearchError::NoActiveSearch))
        ));
        assert!(matches!(
            search.prev_page().await,
            Err(Error::Search(SearchError::NoActiveSearch))
        ));
    }

    #[tokio::test]
    async fn test_search_and_page() {
        let transport = MockTransport::new();
        let search = Search::new(client_with(transport.clone()));

        transport.push_json(
            200,
            json!({"boxes": [{"username": "hashicorp", "name": "precise64", "created_at": "2024-01-01"}]}),
        );
        let results = search
            .search(SearchParams {
                query: Some("precise".to_string()),
                ..SearchParams::default()
            })
            .await
            .unwrap();
        assert_eq!(results.boxes().len(), 1);
        assert_eq!(results.page(), 1);
        assert!(search.is_active().await);
        assert_eq!(query_value(&transport, "q").as_deref(), Some("precise"));
        assert_eq!(query_value(&transport, "page"), None);

        let results = search.next_page().await.unwrap();
        assert_eq!(results.page(), 2);
        assert_eq!(query_value(&transport, "page").as_deref(), Some("2"));

        search.prev_page().await.unwrap();
        assert_eq!(query_value(&transport, "page").as_deref(), Some("1"));
        search.prev_page().await.unwrap();
        assert_eq!(query_value(&transport, "page").as_deref(), Some("1"));

        search.clear().await;
        assert!(!search.is_active().await);
    }

    #[tokio::test]
    async fn test_results_next_continues_search() {
        let transport = MockTransport::new();
        let search = Search::new(client_with(transport.clone()));
        search
            .seed(SearchParams {
                query: Some("ubuntu".to_string()),
                page: Some(2),
                ..SearchParams::default()
            })
            .await;

        let results = search.next_page().await.unwrap();
        assert_eq!(results.page(), 3);

        let previous = results.previous().await.unwrap();
        assert_eq!(previous.page(), 2);
        assert_eq!(query_value(&transport, "q").as_deref(), Some("ubuntu"));

        let seeded = search.from_response(&previous);
        assert!(seeded.is_active().await);
    }
}
