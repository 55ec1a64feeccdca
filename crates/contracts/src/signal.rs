//! Traffic-signal vocabularies of both simulators

use serde::{Deserialize, Serialize};

use crate::{GroupId, InstallationId, Location};

/// Remote single-state signal indication
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoarseIndication {
    Red,
    Yellow,
    Green,
    #[default]
    Off,
}

/// Host multi-lamp signal indication
///
/// Only five combinations are produced by the host: the associated constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FineIndication {
    pub red: bool,
    pub green: bool,
    pub yellow: bool,
}

impl FineIndication {
    pub const RED: Self = Self::new(true, false, false);
    pub const YELLOW: Self = Self::new(false, false, true);
    pub const RED_YELLOW: Self = Self::new(true, false, true);
    pub const GREEN: Self = Self::new(false, true, false);
    pub const OFF: Self = Self::new(false, false, false);

    pub const fn new(red: bool, green: bool, yellow: bool) -> Self {
        Self { red, green, yellow }
    }
}

/// One controlled link of a host signal group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalIndication {
    /// Lane id, `<edge>_<index>`
    pub incoming_lane: String,
    pub position: Location,
}

impl SignalIndication {
    /// Incoming edge, i.e. the lane id up to its last `_`
    ///
    /// A lane id without `_` is its own edge.
    pub fn incoming_edge(&self) -> &str {
        match self.incoming_lane.rfind('_') {
            Some(idx) => &self.incoming_lane[..idx],
            None => &self.incoming_lane,
        }
    }
}

/// Host unit of signal control, announced once with the topology
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalGroup {
    pub group_id: GroupId,
    /// Indications in the host's canonical link order
    pub indications: Vec<SignalIndication>,
}

impl SignalGroup {
    /// Anchor point used for matching: the first member's position
    pub fn anchor(&self) -> Option<Location> {
        self.indications.first().map(|i| i.position)
    }
}

/// Host group mapped to an ordered cluster of remote installations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupAssignment {
    pub group_id: GroupId,
    /// Installations in host approach order
    pub installations: Vec<InstallationId>,
}

/// Remote installation as declared by the static topology file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallationSpec {
    pub id: InstallationId,
    pub location: Location,
    /// Every member of the installation's landmark cluster, itself included,
    /// in declared order
    pub cluster: Vec<InstallationId>,
}

/// Policy used when folding several fine indications into one coarse one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReductionPolicy {
    /// Red dominates, then yellow, then green
    #[default]
    Strict,
    /// Green dominates, then yellow, then red
    Permissive,
}
