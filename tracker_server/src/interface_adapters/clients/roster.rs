use crate::domain::{RosterEntry, RosterError, RosterProvider};
use crate::interface_adapters::protocol::RosterBusDto;
use async_trait::async_trait;
use std::time::Duration;

// Thin reqwest client for the roster service's vehicle listing.
#[derive(Clone)]
pub struct RosterClient {
    http: reqwest::Client,
    base_url: String,
}

impl RosterClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl RosterProvider for RosterClient {
    async fn list_vehicles(&self) -> Result<Vec<RosterEntry>, RosterError> {
        let url = format!("{}/buses", self.base_url.trim_end_matches('/'));
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| RosterError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RosterError::Upstream {
                status: status.as_u16(),
            });
        }

        let buses = response
            .json::<Vec<RosterBusDto>>()
            .await
            .map_err(|e| RosterError::Decode(e.to_string()))?;

        Ok(buses.into_iter().map(RosterEntry::from).collect())
    }
}
