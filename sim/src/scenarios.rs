//! Scenario definitions.
//!
//! Each scenario is a named floor plan together with the simulation settings
//! that suit its scale. Floor plans are fully deterministic.

use floor_model::{FloorPlan, FloorPlanError, NodeId, Rect, RegionKind};
use inference_core::SimConfig;
use serde::{Deserialize, Serialize};

/// Which pre-defined floor plan to load.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
pub enum ScenarioKind {
    /// One 600-unit hall with six rooms on each side
    Office,
    /// 6×6 lattice of aisles in a single open hall
    Grid,
    /// Straight 1000-unit corridor
    Corridor,
}

/// A floor plan and its default settings.
#[derive(Clone, Debug)]
pub struct Scenario {
    pub name: String,
    pub plan: FloorPlan,
    pub config: SimConfig,
}

impl Scenario {
    pub fn build(kind: ScenarioKind) -> Result<Self, FloorPlanError> {
        match kind {
            ScenarioKind::Office => Self::office(),
            ScenarioKind::Grid => Self::grid(),
            ScenarioKind::Corridor => Self::corridor(),
        }
    }

    // -----------------------------------------------------------------------
    // Office: hall along y ∈ [0, 20], rooms above and below
    // -----------------------------------------------------------------------
    fn office() -> Result<Self, FloorPlanError> {
        const ROOMS_PER_SIDE: usize = 6;
        const ROOM: f64 = 100.0;
        const HALL_Y: f64 = 10.0;
        const HALL_W: f64 = 20.0;

        let mut b = FloorPlan::builder();
        let length = ROOMS_PER_SIDE as f64 * ROOM;

        // Hall spine, one node every 50 units.
        let spine: Vec<NodeId> = (0..=2 * ROOMS_PER_SIDE)
            .map(|i| b.add_node(i as f64 * ROOM / 2.0, HALL_Y))
            .collect();
        for w in spine.windows(2) {
            b.add_passage(w[0], w[1]);
        }
        for &n in spine.iter().step_by(2) {
            b.add_detector(n);
        }
        b.add_region("hall", RegionKind::Hall, Rect::from_coords(0.0, 0.0, length, HALL_W));

        for i in 0..ROOMS_PER_SIDE {
            let x0 = i as f64 * ROOM;
            let cx = x0 + ROOM / 2.0;
            let junction = spine[2 * i + 1];

            // (door y, room centre y, room rect y range, label)
            for (door_y, centre_y, y0, y1, side) in [
                (HALL_W, HALL_W + ROOM / 2.0, HALL_W, HALL_W + ROOM, "north"),
                (0.0, -ROOM / 2.0, -ROOM, 0.0, "south"),
            ] {
                let door = b.add_node(cx, door_y);
                let centre = b.add_node(cx, centre_y);
                let dy = (centre_y - door_y).signum() * 30.0;
                let west = b.add_node(cx - 30.0, centre_y + dy);
                let east = b.add_node(cx + 30.0, centre_y + dy);
                b.add_passage(junction, door)
                    .add_passage(door, centre)
                    .add_passage(centre, west)
                    .add_passage(west, east)
                    .add_passage(east, centre);
                b.add_detector(centre);
                b.add_region(
                    format!("room-{side}-{i}"),
                    RegionKind::Room,
                    Rect::from_coords(x0, y0, x0 + ROOM, y1),
                );
            }
        }

        Ok(Scenario {
            name: "office".into(),
            plan: b.build()?,
            config: SimConfig {
                radius: 30.0,
                ..SimConfig::default()
            },
        })
    }

    // -----------------------------------------------------------------------
    // Grid: warehouse-like lattice of aisles
    // -----------------------------------------------------------------------
    fn grid() -> Result<Self, FloorPlanError> {
        const K: usize = 6;
        const SPACING: f64 = 100.0;

        let mut b = FloorPlan::builder();
        let nodes: Vec<NodeId> = (0..K * K)
            .map(|i| b.add_node((i % K) as f64 * SPACING, (i / K) as f64 * SPACING))
            .collect();
        for y in 0..K {
            for x in 0..K {
                let i = y * K + x;
                if x + 1 < K {
                    b.add_passage(nodes[i], nodes[i + 1]);
                }
                if y + 1 < K {
                    b.add_passage(nodes[i], nodes[i + K]);
                }
                if (x + y) % 2 == 0 {
                    b.add_detector(nodes[i]);
                }
            }
        }
        let extent = (K - 1) as f64 * SPACING;
        b.add_region(
            "warehouse",
            RegionKind::Hall,
            Rect::from_coords(-10.0, -10.0, extent + 10.0, extent + 10.0),
        );

        Ok(Scenario {
            name: "grid".into(),
            plan: b.build()?,
            config: SimConfig {
                radius: 40.0,
                ..SimConfig::default()
            },
        })
    }

    // -----------------------------------------------------------------------
    // Corridor: smallest plan, used by quick runs and tests
    // -----------------------------------------------------------------------
    fn corridor() -> Result<Self, FloorPlanError> {
        let mut b = FloorPlan::builder();
        let nodes: Vec<NodeId> = (0..=20).map(|i| b.add_node(i as f64 * 50.0, 0.0)).collect();
        for w in nodes.windows(2) {
            b.add_passage(w[0], w[1]);
        }
        for &n in nodes.iter().step_by(2) {
            b.add_detector(n);
        }
        b.add_region("corridor", RegionKind::Hall, Rect::from_coords(0.0, -10.0, 1000.0, 10.0));

        Ok(Scenario {
            name: "corridor".into(),
            plan: b.build()?,
            config: SimConfig {
                num_objects: 50,
                duration: 200.0,
                radius: 25.0,
                window_sizes: vec![0.01, 0.05, 0.1, 0.2],
                ..SimConfig::default()
            },
        })
    }
}
