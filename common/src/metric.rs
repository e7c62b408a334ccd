use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, de, ser};

/// A measured column of the trial table. The set is closed so that
/// color/label lookups can be checked when a config is loaded instead
/// of blowing up at render time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Metric {
    WallTimeCreate,
    WallTimeConnect,
    WallTimeSim,
    WallTimePhaseUpdate,
    WallTimePhaseCommunicate,
    WallTimePhaseDeliver,
    WallTimePhaseCollocate,
    WallTimeCommunicateTargetData,
    WallTimeGatherSpikeData,
    WallTimeGatherTargetData,
    WallTimeCommunicatePrepare,
    PyTimeCreate,
    PyTimeConnect,
    BaseMemory,
    NetworkMemory,
    InitMemory,
    TotalMemory,
    NumConnections,
    LocalSpikeCounter,
}

impl Metric {
    pub const ALL: &[Metric] = &[
        Metric::WallTimeCreate,
        Metric::WallTimeConnect,
        Metric::WallTimeSim,
        Metric::WallTimePhaseUpdate,
        Metric::WallTimePhaseCommunicate,
        Metric::WallTimePhaseDeliver,
        Metric::WallTimePhaseCollocate,
        Metric::WallTimeCommunicateTargetData,
        Metric::WallTimeGatherSpikeData,
        Metric::WallTimeGatherTargetData,
        Metric::WallTimeCommunicatePrepare,
        Metric::PyTimeCreate,
        Metric::PyTimeConnect,
        Metric::BaseMemory,
        Metric::NetworkMemory,
        Metric::InitMemory,
        Metric::TotalMemory,
        Metric::NumConnections,
        Metric::LocalSpikeCounter,
    ];

    /// Header name of the column in the trial table.
    pub fn column(&self) -> &'static str {
        match self {
            Metric::WallTimeCreate => "wall_time_create",
            Metric::WallTimeConnect => "wall_time_connect",
            Metric::WallTimeSim => "wall_time_sim",
            Metric::WallTimePhaseUpdate => "wall_time_phase_update",
            Metric::WallTimePhaseCommunicate => "wall_time_phase_communicate",
            Metric::WallTimePhaseDeliver => "wall_time_phase_deliver",
            Metric::WallTimePhaseCollocate => "wall_time_phase_collocate",
            Metric::WallTimeCommunicateTargetData => "wall_time_communicate_target_data",
            Metric::WallTimeGatherSpikeData => "wall_time_gather_spike_data",
            Metric::WallTimeGatherTargetData => "wall_time_gather_target_data",
            Metric::WallTimeCommunicatePrepare => "wall_time_communicate_prepare",
            Metric::PyTimeCreate => "py_time_create",
            Metric::PyTimeConnect => "py_time_connect",
            Metric::BaseMemory => "base_memory",
            Metric::NetworkMemory => "network_memory",
            Metric::InitMemory => "init_memory",
            Metric::TotalMemory => "total_memory",
            Metric::NumConnections => "num_connections",
            Metric::LocalSpikeCounter => "local_spike_counter",
        }
    }

    /// Required metrics abort ingestion when their column is absent.
    /// Everything else degrades to not-available and is excluded from
    /// totals that depend on it.
    pub fn is_required(&self) -> bool {
        matches!(
            self,
            Metric::WallTimeCreate
                | Metric::WallTimeConnect
                | Metric::WallTimeSim
                | Metric::WallTimePhaseUpdate
                | Metric::WallTimePhaseCommunicate
                | Metric::WallTimePhaseDeliver
                | Metric::WallTimePhaseCollocate
        )
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// A measured sub-step of the simulation loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Update,
    Communicate,
    Deliver,
    Collocate,
}

impl Phase {
    pub const ALL: &[Phase] = &[
        Phase::Update,
        Phase::Communicate,
        Phase::Deliver,
        Phase::Collocate,
    ];

    pub fn metric(&self) -> Metric {
        match self {
            Phase::Update => Metric::WallTimePhaseUpdate,
            Phase::Communicate => Metric::WallTimePhaseCommunicate,
            Phase::Deliver => Metric::WallTimePhaseDeliver,
            Phase::Collocate => Metric::WallTimePhaseCollocate,
        }
    }

    pub fn factor(&self) -> Derived {
        match self {
            Phase::Update => Derived::PhaseUpdateFactor,
            Phase::Communicate => Derived::PhaseCommunicateFactor,
            Phase::Deliver => Derived::PhaseDeliverFactor,
            Phase::Collocate => Derived::PhaseCollocateFactor,
        }
    }

    pub fn fraction(&self) -> Derived {
        match self {
            Phase::Update => Derived::FracPhaseUpdate,
            Phase::Communicate => Derived::FracPhaseCommunicate,
            Phase::Deliver => Derived::FracPhaseDeliver,
            Phase::Collocate => Derived::FracPhaseCollocate,
        }
    }
}

/// Columns computed from the aggregated means/stds, never present in
/// the raw trial table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Derived {
    WallTimeConstruction,
    SimFactor,
    WallTimePhaseTotal,
    PhaseTotalFactor,
    PhaseUpdateFactor,
    PhaseCommunicateFactor,
    PhaseDeliverFactor,
    PhaseCollocateFactor,
    FracPhaseUpdate,
    FracPhaseCommunicate,
    FracPhaseDeliver,
    FracPhaseCollocate,
    TotalMemoryPerNode,
}

impl Derived {
    pub const ALL: &[Derived] = &[
        Derived::WallTimeConstruction,
        Derived::SimFactor,
        Derived::WallTimePhaseTotal,
        Derived::PhaseTotalFactor,
        Derived::PhaseUpdateFactor,
        Derived::PhaseCommunicateFactor,
        Derived::PhaseDeliverFactor,
        Derived::PhaseCollocateFactor,
        Derived::FracPhaseUpdate,
        Derived::FracPhaseCommunicate,
        Derived::FracPhaseDeliver,
        Derived::FracPhaseCollocate,
        Derived::TotalMemoryPerNode,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            Derived::WallTimeConstruction => "wall_time_construction",
            Derived::SimFactor => "sim_factor",
            Derived::WallTimePhaseTotal => "wall_time_phase_total",
            Derived::PhaseTotalFactor => "phase_total_factor",
            Derived::PhaseUpdateFactor => "phase_update_factor",
            Derived::PhaseCommunicateFactor => "phase_communicate_factor",
            Derived::PhaseDeliverFactor => "phase_deliver_factor",
            Derived::PhaseCollocateFactor => "phase_collocate_factor",
            Derived::FracPhaseUpdate => "frac_phase_update",
            Derived::FracPhaseCommunicate => "frac_phase_communicate",
            Derived::FracPhaseDeliver => "frac_phase_deliver",
            Derived::FracPhaseCollocate => "frac_phase_collocate",
            Derived::TotalMemoryPerNode => "total_memory_per_node",
        }
    }
}

impl fmt::Display for Derived {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Anything that can appear as a column of the aggregated table, and
/// hence be plotted, colored and labeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Quantity {
    Measured(Metric),
    Derived(Derived),
}

impl Quantity {
    pub fn all() -> impl Iterator<Item = Quantity> {
        Metric::ALL
            .iter()
            .copied()
            .map(Quantity::Measured)
            .chain(Derived::ALL.iter().copied().map(Quantity::Derived))
    }

    pub fn column(&self) -> &'static str {
        match self {
            Quantity::Measured(m) => m.column(),
            Quantity::Derived(d) => d.column(),
        }
    }
}

impl From<Metric> for Quantity {
    fn from(m: Metric) -> Self {
        Quantity::Measured(m)
    }
}

impl From<Derived> for Quantity {
    fn from(d: Derived) -> Self {
        Quantity::Derived(d)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown quantity {0:?}")]
pub struct UnknownQuantity(pub String);

impl FromStr for Quantity {
    type Err = UnknownQuantity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Quantity::all()
            .find(|q| q.column() == s)
            .ok_or_else(|| UnknownQuantity(s.to_owned()))
    }
}

// Serialized as the plain column name so quantities can be used as
// YAML/JSON map keys in style overrides.
impl Serialize for Quantity {
    fn serialize<S: ser::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.column())
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: de::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
