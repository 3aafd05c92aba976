//! Real-time snapshot generator.

use super::{LatencyData, LatencyRanges, LatencySnapshot, LOGICAL_LINK_LATENCY};
use crate::topology::Topology;
use chrono::Utc;
use rand::Rng;

/// Draw one latency for every exchange x region pair.
///
/// Pairs sharing a provider use the tighter `same_provider` range. The
/// result is not reproducible unless the caller seeds `rng`.
pub fn generate_realtime_snapshot<R: Rng + ?Sized>(
    topology: &Topology,
    ranges: &LatencyRanges,
    rng: &mut R,
) -> LatencySnapshot {
    let mut links = Vec::with_capacity(topology.exchanges.len() * topology.cloud_regions.len());
    for exchange in &topology.exchanges {
        for region in &topology.cloud_regions {
            let range = if exchange.provider == region.provider {
                ranges.same_provider.clone()
            } else {
                ranges.cross_provider.clone()
            };
            links.push(LatencyData::new(exchange.id, region.id, rng.gen_range(range)));
        }
    }
    LatencySnapshot { generated_at: Utc::now(), links }
}

/// Logical links from each exchange to the regions of its own provider.
pub fn topology_links(topology: &Topology) -> Vec<LatencyData> {
    topology
        .exchanges
        .iter()
        .flat_map(|e| {
            topology
                .cloud_regions
                .iter()
                .filter(move |r| r.provider == e.provider)
                .map(move |r| LatencyData::new(e.id, r.id, LOGICAL_LINK_LATENCY))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::default_topology;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn snapshot_covers_full_cross_product() {
        let topo = default_topology();
        let mut rng = StdRng::seed_from_u64(7);
        let snap = generate_realtime_snapshot(topo, &LatencyRanges::default(), &mut rng);
        assert_eq!(snap.links.len(), topo.exchanges.len() * topo.cloud_regions.len());
        assert!(snap.links.iter().all(|l| l.latency > 0.0));
        for key in topo.pair_keys() {
            assert!(snap.links.iter().any(|l| format!("{}-{}", l.from, l.to) == key));
        }
    }

    #[test]
    fn provider_affinity_selects_range() {
        let topo = default_topology();
        let ranges = LatencyRanges::default();
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..20 {
            let snap = generate_realtime_snapshot(topo, &ranges, &mut rng);
            for link in &snap.links {
                let ex = topo.exchange(&link.from).unwrap();
                let region = topo.region(&link.to).unwrap();
                let range = if ex.provider == region.provider {
                    &ranges.same_provider
                } else {
                    &ranges.cross_provider
                };
                assert!(range.contains(&link.latency), "{link:?} outside {range:?}");
            }
        }
    }

    #[test]
    fn topology_links_only_join_same_provider() {
        let topo = default_topology();
        let links = topology_links(topo);
        // 3 AWS exchanges x 3 AWS regions + 1 GCP x 3 + 1 Azure x 3
        assert_eq!(links.len(), 15);
        assert!(links.iter().all(|l| l.is_logical()));
        for link in &links {
            let ex = topo.exchange(&link.from).unwrap();
            assert_eq!(ex.provider, topo.region(&link.to).unwrap().provider);
        }
    }
}
