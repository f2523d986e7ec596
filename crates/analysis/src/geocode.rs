//! Optional verification of location entities against a geocoding service.

use crate::config::GeocodingConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use extract::{CanonicalEntity, EntityType};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Whether the service knows a place called `name`.
    async fn geocode(&self, name: &str) -> Result<bool>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Verified,
    NotFound,
    Unverified,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationVerification {
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub status: VerificationStatus,
}

/// Nominatim search client.
#[derive(Clone)]
pub struct NominatimGeocoder {
    base_url: String,
    user_agent: String,
    client: reqwest::Client,
}

impl NominatimGeocoder {
    pub fn new(base_url: String, user_agent: String) -> Self {
        Self {
            base_url,
            user_agent,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &GeocodingConfig) -> Self {
        Self::new(config.base_url.clone(), config.user_agent.clone())
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, name: &str) -> Result<bool> {
        let url = format!("{}/search", self.base_url.trim_end_matches('/'));

        let response = self
            .client
            .get(&url)
            .query(&[("q", name), ("format", "json"), ("limit", "1")])
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await
            .context("Failed to send request to Nominatim")?;

        if !response.status().is_success() {
            anyhow::bail!("Nominatim request failed: {}", response.status());
        }

        let places: Vec<serde_json::Value> = response
            .json()
            .await
            .context("Failed to parse Nominatim response")?;

        Ok(!places.is_empty())
    }
}

/// Check every LOC/GPE entity. A lookup that errors or outlives `timeout`
/// is reported as unverified; nothing here fails the analysis.
pub async fn verify_locations(
    entities: &[CanonicalEntity],
    geocoder: &dyn Geocoder,
    timeout: Duration,
) -> Vec<LocationVerification> {
    let mut checks = Vec::new();

    for entity in entities.iter().filter(|e| e.entity_type.is_location()) {
        let name = &entity.canonical_text;
        let status = match tokio::time::timeout(timeout, geocoder.geocode(name)).await {
            Ok(Ok(true)) => VerificationStatus::Verified,
            Ok(Ok(false)) => VerificationStatus::NotFound,
            Ok(Err(e)) => {
                warn!(location = %name, error = %e, "geocoding failed");
                VerificationStatus::Unverified
            }
            Err(_) => {
                warn!(location = %name, timeout_ms = timeout.as_millis() as u64, "geocoding timed out");
                VerificationStatus::Unverified
            }
        };
        debug!(location = %name, ?status, "location checked");

        checks.push(LocationVerification {
            name: name.clone(),
            entity_type: entity.entity_type,
            status,
        });
    }

    checks
}

#[cfg(test)]
mod tests {
    use super::*;

    struct KnownPlaces(&'static [&'static str]);

    #[async_trait]
    impl Geocoder for KnownPlaces {
        async fn geocode(&self, name: &str) -> Result<bool> {
            Ok(self.0.contains(&name))
        }
    }

    struct Slow;

    #[async_trait]
    impl Geocoder for Slow {
        async fn geocode(&self, _name: &str) -> Result<bool> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(true)
        }
    }

    struct Offline;

    #[async_trait]
    impl Geocoder for Offline {
        async fn geocode(&self, _name: &str) -> Result<bool> {
            anyhow::bail!("connection refused")
        }
    }

    fn entities() -> Vec<CanonicalEntity> {
        [
            ("Athens", EntityType::Loc),
            ("Rotting Christ", EntityType::Band),
            ("Atlantis", EntityType::Gpe),
        ]
        .into_iter()
        .map(|(text, entity_type)| CanonicalEntity {
            canonical_text: text.to_string(),
            entity_type,
            mention_count: 1,
        })
        .collect()
    }

    #[tokio::test]
    async fn test_only_locations_are_checked() {
        let checks = verify_locations(&entities(), &KnownPlaces(&["Athens"]), Duration::from_secs(1)).await;

        assert_eq!(checks.len(), 2);
        assert_eq!(checks[0].name, "Athens");
        assert_eq!(checks[0].status, VerificationStatus::Verified);
        assert_eq!(checks[1].status, VerificationStatus::NotFound);
    }

    #[tokio::test]
    async fn test_timeout_is_unverified() {
        let checks = verify_locations(&entities(), &Slow, Duration::from_millis(10)).await;
        assert!(checks.iter().all(|c| c.status == VerificationStatus::Unverified));
    }

    #[tokio::test]
    async fn test_error_is_unverified() {
        let checks = verify_locations(&entities(), &Offline, Duration::from_secs(1)).await;
        assert_eq!(checks.len(), 2);
        assert!(checks.iter().all(|c| c.status == VerificationStatus::Unverified));
    }
}
