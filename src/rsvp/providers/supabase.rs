use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::rsvp::{
    GuestRecord, NewGuest, NewRsvp, RsvpError, RsvpRecord, RsvpStore, SupabaseConfig,
};

/// Talks to the hosted database through its PostgREST interface.
pub struct SupabaseStore {
    client: reqwest::Client,
    rest_base: Url,
    rsvp_table: String,
    guests_table: String,
}

impl SupabaseStore {
    pub fn new(config: &SupabaseConfig) -> Result<Self, RsvpError> {
        if config.service_role_key.trim().is_empty() {
            return Err(RsvpError::ConfigError(
                "service_role_key is empty".to_string(),
            ));
        }

        let mut base = config.url.trim_end_matches('/').to_string();
        base.push_str("/rest/v1/");
        let rest_base = Url::parse(&base)?;

        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&config.service_role_key)
            .map_err(|e| RsvpError::ConfigError(e.to_string()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.service_role_key))
            .map_err(|e| RsvpError::ConfigError(e.to_string()))?;
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            rest_base,
            rsvp_table: config.rsvp_table.clone(),
            guests_table: config.guests_table.clone(),
        })
    }

    fn table_url(&self, table: &str) -> Result<Url, RsvpError> {
        Ok(self.rest_base.join(table)?)
    }

    async fn read<T: DeserializeOwned>(&self, url: Url) -> Result<T, RsvpError> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        let response = check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| RsvpError::InvalidResponse(e.to_string()))
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, RsvpError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(RsvpError::RemoteStatus {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl RsvpStore for SupabaseStore {
    async fn insert_rsvp(&self, rsvp: NewRsvp) -> Result<RsvpRecord, RsvpError> {
        let url = self.table_url(&self.rsvp_table)?;
        let response = self
            .client
            .post(url)
            .header("Prefer", "return=representation")
            .json(&rsvp)
            .send()
            .await?;
        let response = check_status(response).await?;

        let mut rows: Vec<RsvpRecord> = response
            .json()
            .await
            .map_err(|e| RsvpError::InvalidResponse(e.to_string()))?;
        if rows.is_empty() {
            return Err(RsvpError::InvalidResponse(
                "insert returned no rows".to_string(),
            ));
        }
        Ok(rows.swap_remove(0))
    }

    async fn insert_guests(&self, guests: Vec<NewGuest>) -> Result<(), RsvpError> {
        let url = self.table_url(&self.guests_table)?;
        let response = self
            .client
            .post(url)
            .header("Prefer", "return=minimal")
            .json(&guests)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn list_rsvps(&self) -> Result<Vec<RsvpRecord>, RsvpError> {
        let mut url = self.table_url(&self.rsvp_table)?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("order", "created_at.desc");
        self.read(url).await
    }

    async fn list_guests(&self) -> Result<Vec<GuestRecord>, RsvpError> {
        let mut url = self.table_url(&self.guests_table)?;
        url.query_pairs_mut().append_pair("select", "*");
        self.read(url).await
    }

    fn name(&self) -> &str {
        "Supabase"
    }
}
