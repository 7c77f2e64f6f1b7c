//! Adapter for Nominatim-compatible geocoders.
//!
//! Both nominatim.openstreetmap.org and nominatim.geocoding.ai speak this
//! shape; the instance name distinguishes them for failure accounting.

use async_trait::async_trait;
use serde::Deserialize;
use uuid::Uuid;

use super::{GeocodeProvider, ProviderError, ReverseProvider};
use crate::models::{GeoPoint, ReverseLocation, SearchResult};

/// One degree of latitude spans roughly 111 kilometers.
const KM_PER_DEGREE: f64 = 111.0;

pub struct NominatimProvider {
    name: String,
    url: String,
    client: reqwest::Client,
    limit: usize,
    /// Half-size of the viewbox sent with biased requests, in kilometers.
    bias_radius_km: f64,
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: String,
    #[serde(rename = "type")]
    kind: Option<String>,
    name: Option<String>,
    address: Option<NominatimAddress>,
}

#[derive(Debug, Default, Deserialize)]
struct NominatimAddress {
    house_number: Option<String>,
    road: Option<String>,
    suburb: Option<String>,
}

impl NominatimProvider {
    pub fn new(
        name: &str,
        url: &str,
        client: reqwest::Client,
        limit: usize,
        bias_radius_km: f64,
    ) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            client,
            limit,
            bias_radius_km,
        }
    }

    fn normalize(&self, place: NominatimPlace) -> Result<SearchResult, ProviderError> {
        let lat = parse_coordinate(&place.lat)?;
        let lng = parse_coordinate(&place.lon)?;
        Ok(SearchResult {
            id: Uuid::new_v4(),
            lat,
            lng,
            name: short_name(&place),
            display_name: place.display_name,
            kind: place.kind.unwrap_or_else(|| "place".to_string()),
            provider: self.name.clone(),
            distance: None,
        })
    }

    /// Viewbox centered on the bias location: "left,top,right,bottom".
    /// Longitude half-size widens with latitude to stay roughly square.
    fn viewbox(&self, bias: GeoPoint) -> String {
        let lat_offset = self.bias_radius_km / KM_PER_DEGREE;
        let lng_offset = lat_offset / bias.lat.to_radians().cos();
        format!(
            "{},{},{},{}",
            bias.lng - lng_offset,
            bias.lat + lat_offset,
            bias.lng + lng_offset,
            bias.lat - lat_offset
        )
    }
}

fn parse_coordinate(raw: &str) -> Result<f64, ProviderError> {
    raw.parse::<f64>()
        .map_err(|_| ProviderError::Decode(format!("bad coordinate: {raw}")))
}

/// "221 Baker St" from address details when possible, otherwise the first
/// comma segment of the display name.
fn short_name(place: &NominatimPlace) -> String {
    if let Some(address) = &place.address {
        if let (Some(number), Some(road)) = (&address.house_number, &address.road) {
            return format!("{} {}", number, road);
        }
        if let Some(label) = address
            .road
            .clone()
            .or_else(|| address.suburb.clone())
            .or_else(|| place.name.clone())
        {
            return label;
        }
    }
    place
        .display_name
        .split(',')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

#[async_trait]
impl GeocodeProvider for NominatimProvider {
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
            ("format", "json".to_string()),
            ("addressdetails", "1".to_string()),
            ("limit", self.limit.to_string()),
        ];
        if let Some(bias) = bias {
            params.push(("viewbox", self.viewbox(bias)));
            params.push(("bounded", "0".to_string()));
        }

        let response = self.client.get(&self.url).query(&params).send().await?;
        if !response.status().is_success() {
            return Err(ProviderError::Transport(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let data: Vec<NominatimPlace> = response.json().await?;
        if data.is_empty() {
            return Err(ProviderError::NoCandidates);
        }

        data.into_iter()
            .map(|place| self.normalize(place))
            .collect()
    }
}

#[async_trait]
impl ReverseProvider for NominatimProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn reverse(&self, lat: f64, lng: f64) -> Result<ReverseLocation, ProviderError> {
        let params = [
            ("lat", lat.to_string()),
            ("lon", lng.to_string()),
            ("format", "json".to_string()),
            ("addressdetails", "1".to_string()),
        ];

        let response = self.client.get(&self.url).query(&params).send().await?;
        if !response.status().is_success() {
            return Err(ProviderError::Transport(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let place: NominatimPlace = response.json().await?;
        Ok(ReverseLocation {
            name: short_name(&place),
            display_name: place.display_name,
            lat,
            lng,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> NominatimProvider {
        NominatimProvider::new(
            "Nominatim OSM",
            "https://nominatim.example/search",
            reqwest::Client::new(),
            10,
            120.7,
        )
    }

    #[test]
    fn normalizes_place_with_address_details() {
        let body = r#"[{
            "lat":"34.0522","lon":"-118.2437",
            "display_name":"221 Baker St, Los Angeles, California, USA",
            "type":"house",
            "address":{"house_number":"221","road":"Baker St","suburb":"Downtown"}
        }]"#;
        let places: Vec<NominatimPlace> = serde_json::from_str(body).unwrap();
        let result = provider()
            .normalize(places.into_iter().next().unwrap())
            .unwrap();

        assert_eq!(result.name, "221 Baker St");
        assert_eq!(
            result.display_name,
            "221 Baker St, Los Angeles, California, USA"
        );
        assert_eq!(result.lat, 34.0522);
        assert_eq!(result.lng, -118.2437);
        assert_eq!(result.kind, "house");
        assert_eq!(result.provider, "Nominatim OSM");
    }

    #[test]
    fn name_falls_back_to_first_display_segment() {
        let body = r#"[{
            "lat":"48.8566","lon":"2.3522",
            "display_name":"Paris, Ile-de-France, France"
        }]"#;
        let places: Vec<NominatimPlace> = serde_json::from_str(body).unwrap();
        let result = provider()
            .normalize(places.into_iter().next().unwrap())
            .unwrap();

        assert_eq!(result.name, "Paris");
        assert_eq!(result.kind, "place");
    }

    #[test]
    fn unparsable_coordinate_is_a_decode_error() {
        let place = NominatimPlace {
            lat: "not-a-number".to_string(),
            lon: "2.0".to_string(),
            display_name: "x".to_string(),
            kind: None,
            name: None,
            address: None,
        };
        assert!(matches!(
            provider().normalize(place),
            Err(ProviderError::Decode(_))
        ));
    }

    #[test]
    fn viewbox_is_centered_and_widens_with_latitude() {
        let viewbox = provider().viewbox(GeoPoint::new(60.0, 10.0));
        let parts: Vec<f64> = viewbox.split(',').map(|p| p.parse().unwrap()).collect();
        let lat_offset = 120.7 / 111.0;

        // left/right symmetric around lng, top/bottom around lat
        assert!((parts[0] + parts[2] - 20.0).abs() < 1e-9);
        assert!((parts[1] + parts[3] - 120.0).abs() < 1e-9);
        // longitude half-size is larger than latitude half-size at 60N
        assert!((parts[2] - 10.0) > lat_offset);
    }
}
