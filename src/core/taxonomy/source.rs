// ─── Taxonomy Source ───
// The two documents a CurseForge-style API publishes about game versions.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::error::{ResolveError, ResolveResult};

const API_TOKEN_HEADER: &str = "x-api-token";

/// A category of game versions (`environment`, `modloader`, `minecraft-1-20`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionType {
    pub id: u64,
    pub name: String,
    pub slug: String,
}

/// One entry of the version list, tagged with its type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameVersion {
    pub id: u64,
    #[serde(rename = "gameVersionTypeID")]
    pub game_version_type_id: u64,
    pub name: String,
    pub slug: String,
}

#[async_trait]
pub trait TaxonomySource: Send + Sync {
    async fn version_types(&self) -> ResolveResult<Vec<VersionType>>;
    async fn versions(&self) -> ResolveResult<Vec<GameVersion>>;
}

pub struct HttpTaxonomySource {
    client: reqwest::Client,
    endpoint: String,
    headers: HeaderMap,
}

impl HttpTaxonomySource {
    pub fn new(
        client: reqwest::Client,
        endpoint: &str,
        token: &str,
        user_agent: &str,
    ) -> Result<Self, InvalidHeaderValue> {
        let mut headers = HeaderMap::new();
        headers.insert(reqwest::header::USER_AGENT, HeaderValue::from_str(user_agent)?);
        let mut token = HeaderValue::from_str(token)?;
        token.set_sensitive(true);
        headers.insert(HeaderName::from_static(API_TOKEN_HEADER), token);

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            headers,
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ResolveResult<T> {
        let url = format!("{}{}", self.endpoint, path);
        let response = self
            .client
            .get(&url)
            .headers(self.headers.clone())
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ResolveError::FetchFailed {
                url,
                status: status.as_u16(),
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl TaxonomySource for HttpTaxonomySource {
    async fn version_types(&self) -> ResolveResult<Vec<VersionType>> {
        let types: Vec<VersionType> = self.get("/game/version-types").await?;
        info!("Fetched {} game version types", types.len());
        Ok(types)
    }

    async fn versions(&self) -> ResolveResult<Vec<GameVersion>> {
        let versions: Vec<GameVersion> = self.get("/game/versions").await?;
        info!("Fetched {} game versions", versions.len());
        Ok(versions)
    }
}
