use std::{collections::BTreeMap, fmt::Display};

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// External identifier as the controller sends it. eNB ids and RNTIs arrive as
/// integers, VBS addresses as strings; both shapes are kept verbatim so that
/// `1` and `"1"` stay distinct keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarId {
    Int(i64),
    Text(String),
}

impl ScalarId {
    /// Tagged form used for hashing, so that `1` and `"1"` never collide.
    pub fn tagged(&self) -> String {
        match self {
            ScalarId::Int(value) => format!("i:{value}"),
            ScalarId::Text(text) => format!("s:{text}"),
        }
    }

    pub fn as_string(&self) -> String {
        match self {
            ScalarId::Int(value) => value.to_string(),
            ScalarId::Text(text) => text.clone(),
        }
    }
}

impl Display for ScalarId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

/// Kind of radio access unit a node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Entity {
    /// Base station.
    Enb,
    /// Mobile unit.
    Ue,
    /// Anything else the controller may add later; kept but not drawn.
    #[serde(other)]
    Other,
}

impl Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Entity::Enb => write!(f, "enb"),
            Entity::Ue => write!(f, "ue"),
            Entity::Other => write!(f, "other"),
        }
    }
}

/// Identity of a node across polls. The surrogate `id` is reassigned by the
/// controller on every snapshot and is never part of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeKey {
    pub node_id: ScalarId,
    pub entity: Entity,
    pub vbs_id: ScalarId,
}

impl NodeKey {
    pub fn as_bytes(&self) -> Vec<u8> {
        format!("{}/{}/{}", self.entity, self.vbs_id.tagged(), self.node_id.tagged()).into_bytes()
    }

    pub fn to_uuidv5(&self) -> Uuid {
        Uuid::new_v5(&Uuid::NAMESPACE_OID, &self.as_bytes())
    }
}

impl Display for NodeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} @ {}", self.entity, self.node_id, self.vbs_id)
    }
}

/// Per-cell resource block utilization. The controller formats these as
/// strings ("12.50") but plain numbers are accepted too.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellStats {
    #[serde(
        rename = "DL",
        default,
        deserialize_with = "lenient_percent",
        skip_serializing_if = "Option::is_none"
    )]
    pub dl: Option<f64>,
    #[serde(
        rename = "UL",
        default,
        deserialize_with = "lenient_percent",
        skip_serializing_if = "Option::is_none"
    )]
    pub ul: Option<f64>,
}

impl CellStats {
    pub fn is_empty(&self) -> bool {
        self.dl.is_none() && self.ul.is_none()
    }
}

fn lenient_percent<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(value)) => Ok(Some(value)),
        Some(Raw::Text(text)) => text
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Per-cell stats keyed by cell id. A cell may be present with a null record.
pub type StatsMap = BTreeMap<String, Option<CellStats>>;

/// A node exactly as it appears in `graphData.nodes` of a snapshot.
/// `x`/`y` are the controller's layout estimate in its own (y-up) space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireNode {
    pub id: u64,
    pub node_id: ScalarId,
    pub vbs_id: ScalarId,
    pub entity: Entity,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tooltip: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cells: Vec<ScalarId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub stats: StatsMap,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
}

impl WireNode {
    pub fn key(&self) -> NodeKey {
        NodeKey {
            node_id: self.node_id.clone(),
            entity: self.entity,
            vbs_id: self.vbs_id.clone(),
        }
    }
}

/// A live node of the rendered graph: controller data plus simulation state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub id: u64,
    pub node_id: ScalarId,
    pub vbs_id: ScalarId,
    pub entity: Entity,
    pub tooltip: String,
    pub cells: Vec<ScalarId>,
    pub stats: StatsMap,
    pub x: f32,
    pub y: f32,
    /// Pinned by the operator; the simulation does not move pinned nodes.
    pub fixed: bool,
    #[serde(skip)]
    pub vx: f32,
    #[serde(skip)]
    pub vy: f32,
}

impl Node {
    /// First appearance of a node. The controller's y axis points up, the
    /// canvas y axis points down, so y is mirrored against the viewport.
    /// New nodes start pinned at the controller's estimate.
    pub fn new(wire: WireNode, viewport_height: f32) -> Self {
        let y = viewport_height - wire.y;
        Self {
            id: wire.id,
            node_id: wire.node_id,
            vbs_id: wire.vbs_id,
            entity: wire.entity,
            tooltip: wire.tooltip,
            cells: wire.cells,
            stats: wire.stats,
            x: wire.x,
            y,
            fixed: true,
            vx: 0.0,
            vy: 0.0,
        }
    }

    /// Refresh a known node from a new snapshot. Position and pin state stay
    /// with the previous node, everything else comes from the snapshot.
    pub fn carried_over(previous: &Node, wire: WireNode) -> Self {
        Self {
            id: wire.id,
            node_id: wire.node_id,
            vbs_id: wire.vbs_id,
            entity: wire.entity,
            tooltip: wire.tooltip,
            cells: wire.cells,
            stats: wire.stats,
            x: previous.x,
            y: previous.y,
            fixed: previous.fixed,
            vx: 0.0,
            vy: 0.0,
        }
    }

    pub fn key(&self) -> NodeKey {
        NodeKey {
            node_id: self.node_id.clone(),
            entity: self.entity,
            vbs_id: self.vbs_id.clone(),
        }
    }

    pub fn matches(&self, wire: &WireNode) -> bool {
        self.node_id == wire.node_id && self.entity == wire.entity && self.vbs_id == wire.vbs_id
    }

    pub fn has_stats(&self) -> bool {
        !self.stats.is_empty()
    }
}
