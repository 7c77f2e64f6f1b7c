//! Adapter for the ArcGIS World Geocoding Service.

use async_trait::async_trait;
use serde::Deserialize;
use uuid::Uuid;

use super::{GeocodeProvider, ProviderError, ReverseProvider};
use crate::models::{GeoPoint, ReverseLocation, SearchResult};

const METERS_PER_MILE: f64 = 1609.34;

pub struct ArcgisProvider {
    name: String,
    url: String,
    client: reqwest::Client,
    limit: usize,
    /// Radius sent as the `distance` bias parameter, in miles.
    bias_radius_miles: f64,
}

#[derive(Debug, Deserialize)]
struct ArcgisResponse {
    #[serde(default)]
    candidates: Vec<ArcgisCandidate>,
}

#[derive(Debug, Deserialize)]
struct ArcgisCandidate {
    address: String,
    location: ArcgisPoint,
}

#[derive(Debug, Deserialize)]
struct ArcgisPoint {
    x: f64,
    y: f64,
}

#[derive(Debug, Deserialize)]
struct ArcgisReverseResponse {
    address: Option<ArcgisAddress>,
}

#[derive(Debug, Deserialize)]
struct ArcgisAddress {
    #[serde(rename = "Address")]
    address: Option<String>,
    #[serde(rename = "Match_addr")]
    match_addr: Option<String>,
}

impl ArcgisProvider {
    pub fn new(
        name: &str,
        url: &str,
        client: reqwest::Client,
        limit: usize,
        bias_radius_miles: f64,
    ) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            client,
            limit,
            bias_radius_miles,
        }
    }

    fn normalize(&self, candidate: ArcgisCandidate) -> SearchResult {
        SearchResult {
            id: Uuid::new_v4(),
            lat: candidate.location.y,
            lng: candidate.location.x,
            name: candidate
                .address
                .split(',')
                .next()
                .unwrap_or_default()
                .trim()
                .to_string(),
            display_name: candidate.address,
            kind: "address".to_string(),
            provider: self.name.clone(),
            distance: None,
        }
    }
}

#[async_trait]
impl GeocodeProvider for ArcgisProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(
        &self,
        query: &str,
        bias: Option<GeoPoint>,
    ) -> Result<Vec<SearchResult>, ProviderError> {
        let mut params = vec![
            ("f", "json".to_string()),
            ("singleLine", query.to_string()),
            ("maxLocations", self.limit.to_string()),
        ];
        if let Some(bias) = bias {
            params.push(("location", format!("{},{}", bias.lng, bias.lat)));
            let distance_m = (self.bias_radius_miles * METERS_PER_MILE).round() as i64;
            params.push(("distance", distance_m.to_string()));
        }

        let response = self.client.get(&self.url).query(&params).send().await?;
        if !response.status().is_success() {
            return Err(ProviderError::Transport(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let data: ArcgisResponse = response.json().await?;
        if data.candidates.is_empty() {
            return Err(ProviderError::NoCandidates);
        }

        Ok(data
            .candidates
            .into_iter()
            .map(|candidate| self.normalize(candidate))
            .collect())
    }
}

#[async_trait]
impl ReverseProvider for ArcgisProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn reverse(&self, lat: f64, lng: f64) -> Result<ReverseLocation, ProviderError> {
        let params = [
            ("location", format!("{},{}", lng, lat)),
            ("f", "json".to_string()),
        ];

        let response = self.client.get(&self.url).query(&params).send().await?;
        if !response.status().is_success() {
            return Err(ProviderError::Transport(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let data: ArcgisReverseResponse = response.json().await?;
        let address = data.address.ok_or(ProviderError::NoCandidates)?;
        let display_name = address
            .match_addr
            .clone()
            .ok_or(ProviderError::NoCandidates)?;

        Ok(ReverseLocation {
            name: address.address.unwrap_or_else(|| display_name.clone()),
            display_name,
            lat,
            lng,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> ArcgisProvider {
        ArcgisProvider::new(
            "ArcGIS",
            "https://arcgis.example/findAddressCandidates",
            reqwest::Client::new(),
            10,
            75.0,
        )
    }

    #[test]
    fn normalizes_candidate() {
        let body = r#"{"candidates":[{
            "address":"221 Baker St, Los Angeles, California, 90012",
            "location":{"x":-118.2437,"y":34.0522},
            "score":100
        }]}"#;
        let data: ArcgisResponse = serde_json::from_str(body).unwrap();
        let result = provider().normalize(data.candidates.into_iter().next().unwrap());

        assert_eq!(result.name, "221 Baker St");
        assert_eq!(
            result.display_name,
            "221 Baker St, Los Angeles, California, 90012"
        );
        assert_eq!(result.lat, 34.0522);
        assert_eq!(result.lng, -118.2437);
        assert_eq!(result.kind, "address");
        assert_eq!(result.provider, "ArcGIS");
    }

    #[test]
    fn missing_candidates_key_parses_as_empty() {
        let data: ArcgisResponse = serde_json::from_str(r#"{"spatialReference":{}}"#).unwrap();
        assert!(data.candidates.is_empty());
    }

    #[test]
    fn reverse_address_prefers_short_field() {
        let body = r#"{"address":{
            "Address":"221 Baker St",
            "Match_addr":"221 Baker St, Los Angeles, California"
        }}"#;
        let data: ArcgisReverseResponse = serde_json::from_str(body).unwrap();
        let address = data.address.unwrap();
        assert_eq!(address.address.as_deref(), Some("221 Baker St"));
        assert_eq!(
            address.match_addr.as_deref(),
            Some("221 Baker St, Los Angeles, California")
        );
    }
}
