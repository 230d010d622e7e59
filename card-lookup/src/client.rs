use std::{num::NonZeroU32, time::Duration};

use common::{
    card::Card,
    lookup::{is_short_query, CardLookup, LookupError, SearchPage},
};
use governor::{DefaultDirectRateLimiter, Jitter, Quota, RateLimiter};
use log::{debug, warn};
use nonzero_ext::nonzero;
use reqwest::{
    header::{self, HeaderMap, HeaderValue},
    Client, StatusCode, Url,
};
use serde::de::DeserializeOwned;

use crate::{
    error::RequestError,
    scryfall::{self, ApiError, Catalog},
};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

const REQUEST_JITTER_MAX: Duration = Duration::from_millis(50);

#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub requests_per_second: NonZeroU32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: scryfall::URL.to_owned(),
            requests_per_second: nonzero!(10_u32),
        }
    }
}

/// Card lookup backed by the Scryfall API.
pub struct ScryfallClient {
    client: Client,
    base_url: Url,
    rate_limiter: DefaultDirectRateLimiter,
}

impl ScryfallClient {
    pub fn new(config: &Config) -> Result<Self, RequestError> {
        let base_url = Url::parse(&config.base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| RequestError::InvalidUrl(config.base_url.clone()))?;

        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url,
            rate_limiter: RateLimiter::direct(Quota::per_second(config.requests_per_second)),
        })
    }

    /// Endpoint URL; segments are percent-encoded.
    fn url(&self, segments: &[&str]) -> Result<Url, RequestError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| RequestError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<T, RequestError> {
        let url = self.url(segments)?;

        self.rate_limiter
            .until_ready_with_jitter(Jitter::up_to(REQUEST_JITTER_MAX))
            .await;
        debug!("GET {url} {query:?}");
        let response = self.client.get(url).query(query).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(RequestError::NotFound);
        }
        if !status.is_success() {
            let details = response
                .json::<ApiError>()
                .await
                .ok()
                .map(|error| error.details);
            return Err(RequestError::Status(status, details));
        }

        Ok(response.json().await?)
    }

    async fn search(&self, query: &[(&str, &str)]) -> Result<SearchPage, RequestError> {
        match self.get(&["cards", "search"], query).await {
            // Scryfall answers searches without matches with a 404
            Err(RequestError::NotFound) => Ok(SearchPage::default()),
            result => result,
        }
    }
}

impl CardLookup for ScryfallClient {
    async fn autocomplete(&self, prefix: &str) -> Vec<String> {
        if is_short_query(prefix) {
            return Vec::new();
        }

        match self
            .get::<Catalog>(&["cards", "autocomplete"], &[("q", prefix)])
            .await
        {
            Ok(catalog) => catalog.data,
            Err(err) => {
                warn!("Autocomplete for \"{prefix}\" failed: {err}");
                Vec::new()
            }
        }
    }

    async fn search_cards(&self, query: &str, page: u32) -> SearchPage {
        if is_short_query(query) {
            return SearchPage::default();
        }

        let page = page.max(1).to_string();
        match self
            .search(&[("q", query), ("page", page.as_str()), ("order", "name")])
            .await
        {
            Ok(result) => result,
            Err(err) => {
                warn!("Search for \"{query}\" failed: {err}");
                SearchPage::default()
            }
        }
    }

    async fn get_card_by_name(&self, name: &str) -> Result<Card, LookupError> {
        self.get(&["cards", "named"], &[("exact", name)])
            .await
            .map_err(|err| err.into_lookup_error(name))
    }

    async fn get_card_by_id(&self, id: &str) -> Result<Card, LookupError> {
        self.get(&["cards", id], &[])
            .await
            .map_err(|err| err.into_lookup_error(id))
    }

    async fn get_card_prints(&self, card_id: &str) -> Vec<Card> {
        let card = match self.get_card_by_id(card_id).await {
            Ok(card) => card,
            Err(LookupError::NotFound(_)) => return Vec::new(),
            Err(err) => {
                warn!("Loading prints of {card_id} failed: {err}");
                return Vec::new();
            }
        };

        let Some(oracle_id) = &card.oracle_id else {
            return vec![card];
        };

        let query = format!("oracleid:{oracle_id}");
        match self
            .search(&[("q", query.as_str()), ("unique", "prints"), ("order", "released")])
            .await
        {
            Ok(result) => result.data,
            Err(err) => {
                warn!("Loading prints of {card_id} failed: {err}");
                Vec::new()
            }
        }
    }
}
