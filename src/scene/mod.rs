//! Scene composition: markers, connection arcs and pulses for one render pass.
//!
//! A scene is rebuilt from scratch whenever the link set or the filters
//! change. `SceneDiff` reports what changed between two builds.

pub mod camera;
pub mod curve;
pub mod geo;

use crate::config::SceneFilters;
use crate::latency::LatencyData;
use crate::topology::{Node, Provider, Topology};
use camera::{Camera, Viewport};
use curve::CubicBezier;
use geo::{lat_lon_to_vec3, ray_sphere, Vec3};
use rand::Rng;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

pub const GLOBE_RADIUS: f32 = 5.0;

/// Hit radius around a marker for pointer picking, in world units.
const PICK_RADIUS: f32 = 0.35;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LatencyBucket {
    Logical,
    Low,
    Medium,
    High,
}

impl LatencyBucket {
    pub fn from_latency(ms: f64) -> Self {
        if ms < 0.0 {
            LatencyBucket::Logical
        } else if ms < 50.0 {
            LatencyBucket::Low
        } else if ms < 150.0 {
            LatencyBucket::Medium
        } else {
            LatencyBucket::High
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkerShape {
    /// Exchanges.
    Dot,
    /// Cloud regions.
    Square,
}

#[derive(Clone, Debug)]
pub struct Marker {
    pub id: &'static str,
    pub name: &'static str,
    pub kind: &'static str,
    pub place: String,
    pub provider: Provider,
    pub shape: MarkerShape,
    pub position: Vec3,
}

impl Marker {
    fn from_node(node: Node<'_>) -> Self {
        let loc = node.location();
        Self {
            id: node.id(),
            name: node.name(),
            kind: node.kind(),
            place: loc.place(),
            provider: node.provider(),
            shape: match node {
                Node::Exchange(_) => MarkerShape::Dot,
                Node::Region(_) => MarkerShape::Square,
            },
            position: lat_lon_to_vec3(loc.lat as f32, loc.lon as f32, GLOBE_RADIUS),
        }
    }

    /// Lines shown in the hover label.
    pub fn label_lines(&self) -> Vec<String> {
        vec![
            self.name.to_string(),
            self.kind.to_string(),
            self.place.clone(),
            format!("Provider: {}", self.provider),
        ]
    }
}

#[derive(Clone, Debug)]
pub struct Connection {
    pub from: &'static str,
    pub to: &'static str,
    pub latency: f64,
    pub bucket: LatencyBucket,
    pub curve: CubicBezier,
    /// Fraction of the arc the pulse travels per second.
    pub pulse_speed: f32,
}

impl Connection {
    /// Pulse position after `elapsed` seconds; loops every `1 / pulse_speed` seconds.
    pub fn pulse_position(&self, elapsed: f32) -> Vec3 {
        self.curve.point_at((elapsed * self.pulse_speed).rem_euclid(1.0))
    }
}

#[derive(Clone, Debug, Default)]
pub struct Scene {
    pub markers: Vec<Marker>,
    pub connections: Vec<Connection>,
}

impl Scene {
    /// Build every marker, arc and pulse from the topology and the given links.
    pub fn build<R: Rng + ?Sized>(
        topology: &Topology,
        links: &[LatencyData],
        filters: &SceneFilters,
        rng: &mut R,
    ) -> Self {
        let markers: Vec<Marker> = topology
            .nodes()
            .filter(|node| match node {
                Node::Exchange(e) => filters.exchange_visible(e),
                Node::Region(r) => filters.region_visible(r),
            })
            .map(Marker::from_node)
            .collect();

        let positions: HashMap<&str, Vec3> = markers.iter().map(|m| (m.id, m.position)).collect();

        let mut connections = Vec::new();
        if filters.show_connections {
            for link in links {
                if !link.is_logical() && link.latency > filters.max_latency_ms {
                    continue;
                }
                let (Some(from), Some(to)) = (topology.node(&link.from), topology.node(&link.to)) else {
                    continue;
                };
                let (Some(&start), Some(&end)) = (positions.get(from.id()), positions.get(to.id())) else {
                    continue;
                };
                connections.push(Connection {
                    from: from.id(),
                    to: to.id(),
                    latency: link.latency,
                    bucket: LatencyBucket::from_latency(link.latency),
                    curve: CubicBezier::surface_arc(start, end),
                    pulse_speed: 0.2 + (rng.gen::<f32>() - 0.5) * 0.05,
                });
            }
        }

        Self { markers, connections }
    }

    pub fn marker(&self, id: &str) -> Option<&Marker> {
        self.markers.iter().find(|m| m.id == id)
    }

    /// Marker under the screen point, nearest first, ignoring ones behind the globe.
    pub fn pick(&self, camera: &Camera, sx: f32, sy: f32, viewport: Viewport) -> Option<&Marker> {
        let (origin, dir) = camera.pick_ray(sx, sy, viewport);
        let globe_hit = ray_sphere(origin, dir, Vec3::ZERO, GLOBE_RADIUS);

        self.markers
            .iter()
            .filter_map(|m| {
                let centre = camera.to_view(m.position);
                let t = ray_sphere(origin, dir, centre, PICK_RADIUS)?;
                // markers sit on the surface; allow the hit to straddle it
                if let Some(g) = globe_hit {
                    if t > g + PICK_RADIUS * 2.0 {
                        return None;
                    }
                }
                Some((t, m))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, m)| m)
    }
}

/// Added and removed keys between two builds.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SceneDiff {
    pub added_markers: BTreeSet<&'static str>,
    pub removed_markers: BTreeSet<&'static str>,
    pub added_links: BTreeSet<(&'static str, &'static str)>,
    pub removed_links: BTreeSet<(&'static str, &'static str)>,
}

impl SceneDiff {
    pub fn between(prev: &Scene, next: &Scene) -> Self {
        let markers = |s: &Scene| s.markers.iter().map(|m| m.id).collect::<BTreeSet<_>>();
        let links = |s: &Scene| s.connections.iter().map(|c| (c.from, c.to)).collect::<BTreeSet<_>>();
        let (pm, nm) = (markers(prev), markers(next));
        let (pl, nl) = (links(prev), links(next));
        Self {
            added_markers: nm.difference(&pm).copied().collect(),
            removed_markers: pm.difference(&nm).copied().collect(),
            added_links: nl.difference(&pl).copied().collect(),
            removed_links: pl.difference(&nl).copied().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added_markers.is_empty()
            && self.removed_markers.is_empty()
            && self.added_links.is_empty()
            && self.removed_links.is_empty()
    }
}

impl fmt::Display for SceneDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "markers +{} -{}, links +{} -{}",
            self.added_markers.len(),
            self.removed_markers.len(),
            self.added_links.len(),
            self.removed_links.len()
        )
    }
}
