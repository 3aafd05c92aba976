//! Static registry of exchange and cloud-region nodes.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Cloud provider a node is hosted on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Provider {
    #[serde(rename = "AWS")]
    Aws,
    #[serde(rename = "GCP")]
    Gcp,
    Azure,
    Other,
}

impl Provider {
    pub const ALL: [Provider; 4] = [Provider::Aws, Provider::Gcp, Provider::Azure, Provider::Other];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Aws => "AWS",
            Provider::Gcp => "GCP",
            Provider::Azure => "Azure",
            Provider::Other => "Other",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Provider::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownProvider(s.to_string()))
    }
}

/// Geographic position in degrees with optional display metadata.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GeoLocation {
    pub lat: f64,
    pub lon: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colo: Option<&'static str>,
}

impl GeoLocation {
    /// "City, Country" when both are known, otherwise "-".
    pub fn place(&self) -> String {
        match (self.city, self.country) {
            (Some(city), Some(country)) => format!("{city}, {country}"),
            (Some(city), None) => city.to_string(),
            _ => "-".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Exchange {
    pub id: &'static str,
    pub name: &'static str,
    pub location: GeoLocation,
    pub provider: Provider,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudRegion {
    pub id: &'static str,
    pub name: &'static str,
    pub provider: Provider,
    pub location: GeoLocation,
    pub server_count: u32,
}

/// Either kind of node, borrowed from the registry.
#[derive(Clone, Copy, Debug)]
pub enum Node<'a> {
    Exchange(&'a Exchange),
    Region(&'a CloudRegion),
}

impl<'a> Node<'a> {
    pub fn id(&self) -> &'static str {
        match self {
            Node::Exchange(e) => e.id,
            Node::Region(r) => r.id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Node::Exchange(e) => e.name,
            Node::Region(r) => r.name,
        }
    }

    pub fn provider(&self) -> Provider {
        match self {
            Node::Exchange(e) => e.provider,
            Node::Region(r) => r.provider,
        }
    }

    pub fn location(&self) -> &'a GeoLocation {
        match self {
            Node::Exchange(e) => &e.location,
            Node::Region(r) => &r.location,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Node::Exchange(_) => "Exchange",
            Node::Region(_) => "Cloud Region",
        }
    }
}

/// The full set of nodes known to the dashboard.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Topology {
    pub exchanges: Vec<Exchange>,
    pub cloud_regions: Vec<CloudRegion>,
}

impl Topology {
    pub fn new(exchanges: Vec<Exchange>, cloud_regions: Vec<CloudRegion>) -> Self {
        Self { exchanges, cloud_regions }
    }

    pub fn exchange(&self, id: &str) -> Option<&Exchange> {
        self.exchanges.iter().find(|e| e.id == id)
    }

    pub fn region(&self, id: &str) -> Option<&CloudRegion> {
        self.cloud_regions.iter().find(|r| r.id == id)
    }

    pub fn node(&self, id: &str) -> Option<Node<'_>> {
        self.exchange(id)
            .map(Node::Exchange)
            .or_else(|| self.region(id).map(Node::Region))
    }

    /// Exchanges first, then regions, in registry order.
    pub fn nodes(&self) -> impl Iterator<Item = Node<'_>> {
        self.exchanges
            .iter()
            .map(Node::Exchange)
            .chain(self.cloud_regions.iter().map(Node::Region))
    }

    /// Every exchange/region pair key, exchange-major.
    pub fn pair_keys(&self) -> Vec<String> {
        self.exchanges
            .iter()
            .flat_map(|e| self.cloud_regions.iter().map(move |r| pair_key(e.id, r.id)))
            .collect()
    }
}

/// Key used to address one exchange/region pair in the historical generator.
pub fn pair_key(exchange_id: &str, region_id: &str) -> String {
    format!("{exchange_id}-{region_id}")
}

const fn exchange_at(
    id: &'static str,
    name: &'static str,
    lat: f64,
    lon: f64,
    city: &'static str,
    country: &'static str,
    colo: &'static str,
    provider: Provider,
) -> Exchange {
    Exchange {
        id,
        name,
        location: GeoLocation { lat, lon, city: Some(city), country: Some(country), colo: Some(colo) },
        provider,
    }
}

const fn region_at(
    id: &'static str,
    name: &'static str,
    provider: Provider,
    lat: f64,
    lon: f64,
    colo: &'static str,
    server_count: u32,
) -> CloudRegion {
    CloudRegion {
        id,
        name,
        provider,
        location: GeoLocation { lat, lon, city: None, country: None, colo: Some(colo) },
        server_count,
    }
}

static DEFAULT_TOPOLOGY: LazyLock<Topology> = LazyLock::new(|| {
    Topology::new(
        vec![
            exchange_at("okx", "OKX", 35.6895, 139.6917, "Tokyo", "Japan", "NRT", Provider::Aws),
            exchange_at(
                "deribit",
                "Deribit",
                52.3702,
                4.8952,
                "Amsterdam",
                "Netherlands",
                "AMS",
                Provider::Gcp,
            ),
            exchange_at(
                "bybit",
                "Bybit",
                1.3521,
                103.8198,
                "Singapore",
                "Singapore",
                "SIN",
                Provider::Aws,
            ),
            exchange_at(
                "binance",
                "Binance",
                34.0522,
                -118.2437,
                "Los Angeles",
                "USA",
                "LAX",
                Provider::Azure,
            ),
            exchange_at(
                "coinbase",
                "Coinbase",
                51.5074,
                -0.1278,
                "London",
                "UK",
                "LHR",
                Provider::Aws,
            ),
        ],
        vec![
            // AWS
            region_at(
                "aws-us-east-1",
                "US East (N. Virginia)",
                Provider::Aws,
                38.95,
                -77.45,
                "IAD",
                15,
            ),
            region_at("aws-eu-west-1", "EU (Ireland)", Provider::Aws, 53.3498, -6.2603, "DUB", 12),
            region_at(
                "aws-ap-northeast-1",
                "Asia Pacific (Tokyo)",
                Provider::Aws,
                35.6895,
                139.6917,
                "NRT",
                18,
            ),
            // GCP
            region_at(
                "gcp-us-central1",
                "us-central1",
                Provider::Gcp,
                41.2524,
                -95.9980,
                "OMA",
                10,
            ),
            region_at("gcp-europe-west4", "europe-west4", Provider::Gcp, 52.3702, 4.8952, "AMS", 8),
            region_at("gcp-asia-east2", "asia-east2", Provider::Gcp, 22.3193, 114.1694, "HKG", 9),
            // Azure
            region_at("azure-eastus", "East US", Provider::Azure, 37.3712, -79.8139, "IAD", 14),
            region_at(
                "azure-westeurope",
                "West Europe",
                Provider::Azure,
                52.3702,
                4.8952,
                "AMS",
                11,
            ),
            region_at(
                "azure-southeastasia",
                "Southeast Asia",
                Provider::Azure,
                1.3521,
                103.8198,
                "SIN",
                13,
            ),
        ],
    )
});

/// The built-in registry, initialised on first use and never mutated.
pub fn default_topology() -> &'static Topology {
    &DEFAULT_TOPOLOGY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_has_expected_shape() {
        let topo = default_topology();
        assert_eq!(topo.exchanges.len(), 5);
        assert_eq!(topo.cloud_regions.len(), 9);
        assert_eq!(topo.nodes().count(), 14);
        assert_eq!(topo.pair_keys().len(), 45);
        assert_eq!(topo.pair_keys()[0], "okx-aws-us-east-1");
    }

    #[test]
    fn node_lookup_covers_both_kinds() {
        let topo = default_topology();
        assert_eq!(topo.node("bybit").map(|n| n.kind()), Some("Exchange"));
        assert_eq!(topo.node("gcp-asia-east2").map(|n| n.kind()), Some("Cloud Region"));
        assert!(topo.node("kraken").is_none());
    }

    #[test]
    fn provider_parses_case_insensitively() {
        assert_eq!("aws".parse::<Provider>().unwrap(), Provider::Aws);
        assert_eq!(" Azure ".parse::<Provider>().unwrap(), Provider::Azure);
        assert!("oracle".parse::<Provider>().is_err());
    }

    #[test]
    fn region_place_falls_back_to_dash() {
        let topo = default_topology();
        assert_eq!(topo.region("aws-eu-west-1").unwrap().location.place(), "-");
        assert_eq!(topo.exchange("okx").unwrap().location.place(), "Tokyo, Japan");
    }

    #[test]
    fn provider_serializes_as_display_name() {
        let json = serde_json::to_string(&Provider::Gcp).unwrap();
        assert_eq!(json, "\"GCP\"");
    }
}
