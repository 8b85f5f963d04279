use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::i18n::Locale;
use crate::protocol::{
    parse_categories, parse_shopping, AutocompleteReply, CategoryDescriptor, DetectReply,
    DetectRequest, ShoppingProduct, ShoppingRequest, StepReply, StepRequest,
};
use crate::suggest::SuggestionRecord;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// The recommendation service as seen by the controller.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn detect_category(&self, query: &str, locale: Locale) -> Result<DetectReply, ApiError>;

    async fn categories(&self, locale: Locale) -> Result<Vec<CategoryDescriptor>, ApiError>;

    async fn ask(&self, request: &StepRequest) -> Result<StepReply, ApiError>;

    async fn shopping(&self, request: &ShoppingRequest) -> Result<Vec<ShoppingProduct>, ApiError>;

    async fn autocomplete(
        &self,
        query: &str,
        locale: Locale,
        limit: usize,
    ) -> Result<Vec<SuggestionRecord>, ApiError>;
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    config: ApiConfig,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("swipestyle-cli/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url,
            config: config.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };
        Ok(Url::parse(&format!("{}{}", self.base_url, path))?)
    }

    async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value, ApiError> {
        let url = self.endpoint(path)?;
        debug!("POST {}", url);
        let response = self.client.post(url).json(body).send().await?;
        Self::read_json(response).await
    }

    async fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, ApiError> {
        let mut url = self.endpoint(path)?;
        url.query_pairs_mut().extend_pairs(query);
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        Self::read_json(response).await
    }

    async fn read_json(response: reqwest::Response) -> Result<Value, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl Backend for ApiClient {
    async fn detect_category(&self, query: &str, locale: Locale) -> Result<DetectReply, ApiError> {
        let body = DetectRequest {
            query,
            language: locale,
        };
        let value = self.post_json(&self.config.detect_path, &body).await?;
        Ok(DetectReply::from_value(&value))
    }

    async fn categories(&self, locale: Locale) -> Result<Vec<CategoryDescriptor>, ApiError> {
        let value = self
            .get_json(&self.config.categories_path, &[("language", locale.code())])
            .await?;
        Ok(parse_categories(&value))
    }

    async fn ask(&self, request: &StepRequest) -> Result<StepReply, ApiError> {
        let value = self.post_json(&self.config.ask_path, request).await?;
        Ok(StepReply::from_value(&value))
    }

    async fn shopping(&self, request: &ShoppingRequest) -> Result<Vec<ShoppingProduct>, ApiError> {
        let value = self.post_json(&self.config.shopping_path, request).await?;
        parse_shopping(&value).map_err(ApiError::Rejected)
    }

    async fn autocomplete(
        &self,
        query: &str,
        locale: Locale,
        limit: usize,
    ) -> Result<Vec<SuggestionRecord>, ApiError> {
        let limit = limit.to_string();
        let value = self
            .get_json(
                &self.config.autocomplete_path,
                &[("q", query), ("language", locale.code()), ("limit", &limit)],
            )
            .await?;
        let reply: AutocompleteReply = serde_json::from_value(value)?;
        Ok(reply.suggestions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn rejects_malformed_base_url() {
        let config = ApiConfig {
            base_url: "not a url".to_string(),
            ..ApiConfig::default()
        };
        assert_matches!(ApiClient::new(&config), Err(ApiError::Url(_)));
    }

    #[test]
    fn joins_paths_under_base_prefix() {
        let config = ApiConfig {
            base_url: "https://shop.example/api/".to_string(),
            ..ApiConfig::default()
        };
        let client = ApiClient::new(&config).unwrap();
        assert_eq!(client.endpoint("/ask").unwrap().as_str(), "https://shop.example/api/ask");
        assert_eq!(client.endpoint("categories").unwrap().as_str(), "https://shop.example/api/categories");
    }
}
