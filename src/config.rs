use crate::error::Result;
use crate::latency::LatencyRanges;
use crate::settings::Settings;
use crate::topology::{CloudRegion, Exchange, Provider};
use log::warn;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

/// Snapshot interval used when the configured one is unusable.
pub const DEFAULT_REFRESH: Duration = Duration::from_secs(5);

/// Which nodes and links the globe shows. Empty allow-lists admit everything.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneFilters {
    pub exchange_allowlist: BTreeSet<String>,
    pub provider_allowlist: BTreeSet<Provider>,
    pub max_latency_ms: f64,
    pub show_connections: bool,
    pub show_regions: bool,
}

impl Default for SceneFilters {
    fn default() -> Self {
        Self {
            exchange_allowlist: BTreeSet::new(),
            provider_allowlist: BTreeSet::new(),
            max_latency_ms: 300.0,
            show_connections: true,
            show_regions: true,
        }
    }
}

impl SceneFilters {
    pub fn exchange_visible(&self, exchange: &Exchange) -> bool {
        self.exchange_allowlist.is_empty() || self.exchange_allowlist.contains(exchange.id)
    }

    pub fn region_visible(&self, region: &CloudRegion) -> bool {
        self.show_regions
            && (self.provider_allowlist.is_empty() || self.provider_allowlist.contains(&region.provider))
    }
}

/// Which link set the globe draws.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkMode {
    /// Latest generated snapshot.
    Live,
    /// Logical exchange to same-provider region links.
    Topology,
}

impl LinkMode {
    pub fn toggled(self) -> Self {
        match self {
            LinkMode::Live => LinkMode::Topology,
            LinkMode::Topology => LinkMode::Live,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LinkMode::Live => "live",
            LinkMode::Topology => "topology",
        }
    }
}

/// Configuration for the interactive globe.
#[derive(Clone, Debug)]
pub struct GlobeConfig {
    pub filters: SceneFilters,
    pub mode: LinkMode,
    pub time_step: f32,
    pub auto_rotate: bool,
    /// Radians added to the spin each frame.
    pub rotate_step: f32,
    pub camera_distance: f32,
    pub coastline: Option<PathBuf>,
    pub ranges: LatencyRanges,
    pub refresh: Duration,
    pub seed: Option<u64>,
    /// History window (hours) sent with analysis requests.
    pub analysis_window_hours: f64,
}

impl GlobeConfig {
    /// Defaults layered with the settings file. Command-line overrides come after.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let filters = SceneFilters {
            exchange_allowlist: settings.filters.exchanges.iter().cloned().collect(),
            provider_allowlist: parse_providers(&settings.filters.providers)?,
            max_latency_ms: settings.filters.max_latency_ms,
            show_connections: settings.filters.show_connections,
            show_regions: settings.filters.show_regions,
        };

        let refresh = Duration::try_from_secs_f64(settings.generator.refresh_secs)
            .ok()
            .filter(|d| !d.is_zero())
            .unwrap_or_else(|| {
                warn!(
                    "refresh_secs = {} is not a positive duration; using {:?}",
                    settings.generator.refresh_secs, DEFAULT_REFRESH
                );
                DEFAULT_REFRESH
            });

        Ok(Self {
            filters,
            mode: LinkMode::Live,
            time_step: 0.03,
            auto_rotate: settings.globe.auto_rotate,
            rotate_step: settings.globe.rotate_step,
            camera_distance: settings.globe.camera_distance,
            coastline: settings.globe.coastline.clone(),
            ranges: settings.generator.ranges()?,
            refresh,
            seed: settings.generator.seed,
            analysis_window_hours: settings.globe.analysis_hours,
        })
    }
}

pub fn parse_providers(names: &[String]) -> Result<BTreeSet<Provider>> {
    names.iter().map(|n| n.parse()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::topology::default_topology;

    #[test]
    fn empty_allowlists_admit_everything() {
        let topo = default_topology();
        let filters = SceneFilters::default();
        assert!(topo.exchanges.iter().all(|e| filters.exchange_visible(e)));
        assert!(topo.cloud_regions.iter().all(|r| filters.region_visible(r)));
    }

    #[test]
    fn hidden_regions_override_provider_allowlist() {
        let topo = default_topology();
        let filters = SceneFilters {
            provider_allowlist: [Provider::Gcp].into_iter().collect(),
            show_regions: false,
            ..SceneFilters::default()
        };
        assert!(topo.cloud_regions.iter().all(|r| !filters.region_visible(r)));
    }

    #[test]
    fn settings_flow_into_config() {
        let mut settings = Settings::default();
        settings.filters.providers = vec!["aws".into(), "Azure".into()];
        settings.filters.exchanges = vec!["okx".into()];
        settings.generator.refresh_secs = 2.5;
        settings.generator.seed = Some(4);

        let config = GlobeConfig::from_settings(&settings).unwrap();
        assert_eq!(config.filters.provider_allowlist, [Provider::Aws, Provider::Azure].into_iter().collect());
        assert!(config.filters.exchange_allowlist.contains("okx"));
        assert_eq!(config.refresh, Duration::from_millis(2500));
        assert_eq!(config.seed, Some(4));
        assert_eq!(config.mode, LinkMode::Live);
        assert_eq!(config.analysis_window_hours, 7.0);
    }

    #[test]
    fn bad_refresh_falls_back() {
        let mut settings = Settings::default();
        settings.generator.refresh_secs = -1.0;
        assert_eq!(GlobeConfig::from_settings(&settings).unwrap().refresh, DEFAULT_REFRESH);
        settings.generator.refresh_secs = 0.0;
        assert_eq!(GlobeConfig::from_settings(&settings).unwrap().refresh, DEFAULT_REFRESH);
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let mut settings = Settings::default();
        settings.filters.providers = vec!["oracle".into()];
        assert!(matches!(GlobeConfig::from_settings(&settings), Err(Error::UnknownProvider(_))));
    }

    #[test]
    fn link_mode_toggles() {
        assert_eq!(LinkMode::Live.toggled(), LinkMode::Topology);
        assert_eq!(LinkMode::Topology.toggled().label(), "live");
    }
}
