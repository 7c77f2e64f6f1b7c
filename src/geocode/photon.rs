//! Adapter for the Photon geocoder (photon.komoot.io).

use async_trait::async_trait;
use serde::Deserialize;
use uuid::Uuid;

use super::{GeocodeProvider, ProviderError, ReverseProvider};
use crate::models::{GeoPoint, ReverseLocation, SearchResult};

pub struct PhotonProvider {
    name: String,
    url: String,
    client: reqwest::Client,
    limit: usize,
}

#[derive(Debug, Deserialize)]
struct PhotonResponse {
    #[serde(default)]
    features: Vec<PhotonFeature>,
}

#[derive(Debug, Deserialize)]
struct PhotonFeature {
    geometry: PhotonGeometry,
    properties: PhotonProperties,
}

#[derive(Debug, Deserialize)]
struct PhotonGeometry {
    /// [lon, lat]
    coordinates: [f64; 2],
}

#[derive(Debug, Default, Deserialize)]
struct PhotonProperties {
    name: Option<String>,
    housenumber: Option<String>,
    street: Option<String>,
    city: Option<String>,
    state: Option<String>,
    osm_value: Option<String>,
}

impl PhotonProvider {
    pub fn new(name: &str, url: &str, client: reqwest::Client, limit: usize) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            client,
            limit,
        }
    }

    fn normalize(&self, feature: PhotonFeature) -> SearchResult {
        let props = &feature.properties;
        SearchResult {
            id: Uuid::new_v4(),
            lat: feature.geometry.coordinates[1],
            lng: feature.geometry.coordinates[0],
            name: short_name(props),
            display_name: display_name(props),
            kind: props
                .osm_value
                .clone()
                .unwrap_or_else(|| "place".to_string()),
            provider: self.name.clone(),
            distance: None,
        }
    }
}

/// "221 Baker St" when both parts exist, otherwise the best available label.
fn short_name(props: &PhotonProperties) -> String {
    if let (Some(housenumber), Some(street)) = (&props.housenumber, &props.street) {
        return format!("{} {}", housenumber, street);
    }
    props
        .name
        .clone()
        .or_else(|| props.street.clone())
        .or_else(|| props.city.clone())
        .unwrap_or_else(|| "Unknown".to_string())
}

fn display_name(props: &PhotonProperties) -> String {
    let mut parts = Vec::new();
    if let (Some(housenumber), Some(street)) = (&props.housenumber, &props.street) {
        parts.push(format!("{} {}", housenumber, street));
    } else if let Some(street) = &props.street {
        parts.push(street.clone());
    } else if let Some(name) = &props.name {
        parts.push(name.clone());
    }
    if let Some(city) = &props.city {
        parts.push(city.clone());
    }
    if let Some(state) = &props.state {
        parts.push(state.clone());
    }
    if parts.is_empty() {
        "Unknown".to_string()
    } else {
        parts.join(", ")
    }
}

#[async_trait]
impl GeocodeProvider for PhotonProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(
        &self,
        query: &str,
        bias: Option<GeoPoint>,
    ) -> Result<Vec<SearchResult>, ProviderError> {
        let mut params = vec![
            ("q", query.to_string()),
            ("limit", self.limit.to_string()),
            ("lang", "en".to_string()),
        ];
        if let Some(bias) = bias {
            params.push(("lat", bias.lat.to_string()));
            params.push(("lon", bias.lng.to_string()));
        }

        let response = self.client.get(&self.url).query(&params).send().await?;
        if !response.status().is_success() {
            return Err(ProviderError::Transport(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let data: PhotonResponse = response.json().await?;
        if data.features.is_empty() {
            return Err(ProviderError::NoCandidates);
        }

        Ok(data
            .features
            .into_iter()
            .map(|feature| self.normalize(feature))
            .collect())
    }
}

#[async_trait]
impl ReverseProvider for PhotonProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn reverse(&self, lat: f64, lng: f64) -> Result<ReverseLocation, ProviderError> {
        let params = [("lat", lat.to_string()), ("lon", lng.to_string())];

        let response = self.client.get(&self.url).query(&params).send().await?;
        if !response.status().is_success() {
            return Err(ProviderError::Transport(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let data: PhotonResponse = response.json().await?;
        let feature = data
            .features
            .into_iter()
            .next()
            .ok_or(ProviderError::NoCandidates)?;

        Ok(ReverseLocation {
            name: short_name(&feature.properties),
            display_name: display_name(&feature.properties),
            lat,
            lng,
        })
    }
}
