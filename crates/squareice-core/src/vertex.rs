//! The six legal vertex configurations of square ice.
//!
//! Every vertex has four edges (left, right, top, bottom). Exactly two of
//! them carry an arrow pointing into the vertex and two carry an arrow
//! pointing out of it (the ice rule). The six ways of choosing the two
//! inward edges are the six vertex types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Edge flow
// ---------------------------------------------------------------------------

/// Whether an edge's arrow points into or out of a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeFlow {
    In,
    Out,
}

impl EdgeFlow {
    pub fn is_in(self) -> bool {
        self == EdgeFlow::In
    }

    /// The flow seen from the vertex at the other end of the same edge.
    pub fn reversed(self) -> Self {
        match self {
            EdgeFlow::In => EdgeFlow::Out,
            EdgeFlow::Out => EdgeFlow::In,
        }
    }
}

/// The flow on each of a vertex's four edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeConfig {
    pub left: EdgeFlow,
    pub right: EdgeFlow,
    pub top: EdgeFlow,
    pub bottom: EdgeFlow,
}

impl EdgeConfig {
    /// Build a configuration from the four "is inward" flags.
    pub const fn from_inward(left: bool, right: bool, top: bool, bottom: bool) -> Self {
        const fn flow(inward: bool) -> EdgeFlow {
            if inward { EdgeFlow::In } else { EdgeFlow::Out }
        }
        Self {
            left: flow(left),
            right: flow(right),
            top: flow(top),
            bottom: flow(bottom),
        }
    }

    /// Number of edges pointing into the vertex.
    pub fn inward_count(&self) -> usize {
        [self.left, self.right, self.top, self.bottom]
            .iter()
            .filter(|f| f.is_in())
            .count()
    }

    /// Returns `true` if exactly two edges point inward.
    pub fn satisfies_ice_rule(&self) -> bool {
        self.inward_count() == 2
    }
}

// ---------------------------------------------------------------------------
// Vertex type
// ---------------------------------------------------------------------------

/// One of the six ice-rule vertex configurations.
///
/// a1/a2, b1/b2 and c1/c2 are pairs related by reversing every arrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum VertexType {
    A1 = 0,
    A2 = 1,
    B1 = 2,
    B2 = 3,
    C1 = 4,
    C2 = 5,
}

/// Inward-edge table, indexed by `VertexType as usize`.
const CONFIGURATIONS: [EdgeConfig; 6] = [
    // a1: left, top
    EdgeConfig::from_inward(true, false, true, false),
    // a2: right, bottom
    EdgeConfig::from_inward(false, true, false, true),
    // b1: right, top
    EdgeConfig::from_inward(false, true, true, false),
    // b2: left, bottom
    EdgeConfig::from_inward(true, false, false, true),
    // c1: left, right
    EdgeConfig::from_inward(true, true, false, false),
    // c2: top, bottom
    EdgeConfig::from_inward(false, false, true, true),
];

impl VertexType {
    /// All six types in index order.
    pub const ALL: [VertexType; 6] = [
        VertexType::A1,
        VertexType::A2,
        VertexType::B1,
        VertexType::B2,
        VertexType::C1,
        VertexType::C2,
    ];

    /// Dense index in `0..6`.
    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// The edge flows of this vertex type.
    pub const fn configuration(self) -> EdgeConfig {
        CONFIGURATIONS[self as usize]
    }

    /// The vertex type with the given edge flows, if it obeys the ice rule.
    pub fn from_configuration(config: EdgeConfig) -> Option<Self> {
        if !config.satisfies_ice_rule() {
            return None;
        }
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.configuration() == config)
    }

    /// The type obtained by reversing all four arrows.
    pub fn reversed(self) -> Self {
        match self {
            VertexType::A1 => VertexType::A2,
            VertexType::A2 => VertexType::A1,
            VertexType::B1 => VertexType::B2,
            VertexType::B2 => VertexType::B1,
            VertexType::C1 => VertexType::C2,
            VertexType::C2 => VertexType::C1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            VertexType::A1 => "a1",
            VertexType::A2 => "a2",
            VertexType::B1 => "b1",
            VertexType::B2 => "b2",
            VertexType::C1 => "c1",
            VertexType::C2 => "c2",
        }
    }
}

impl fmt::Display for VertexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when parsing an unknown vertex label.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown vertex type '{0}'")]
pub struct ParseVertexError(pub String);

impl FromStr for VertexType {
    type Err = ParseVertexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseVertexError(s.to_string()))
    }
}
