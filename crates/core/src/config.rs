//! Configuration for the pipeline simulator.
//!
//! This module defines the configuration structures and enums that
//! parameterize a run. It provides:
//! 1. **Defaults:** Baseline constants collected in one place.
//! 2. **Structures:** Hierarchical config for general and pipeline settings.
//! 3. **Enums:** Branch policy selection and the three externally exposed
//!    simulation modes.
//!
//! Configuration can be deserialized from JSON, or use `Config::default()`.

use serde::Deserialize;

/// Default configuration constants for the simulator.
mod defaults {
    /// Cycle cap applied when the caller does not supply one (0 = unbounded).
    pub const MAX_CYCLES: u64 = 10_000;
}

/// Branch resolution policy for `BNEZ`.
///
/// The policy governs what the branch does in the three fetch stages and at
/// decode. `Flush` holds fetch until the branch resolves; the two prediction
/// policies speculate and flush only on a misprediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum BranchPolicy {
    /// No prediction: stall fetch until the branch resolves at decode.
    #[default]
    Flush,
    /// Speculatively redirect fetch to the branch target.
    PredictTaken,
    /// Keep fetching the fall-through path.
    PredictNotTaken,
}

/// Root configuration structure.
///
/// # Examples
///
/// Creating a default configuration:
///
/// ```
/// use mips_core::config::Config;
///
/// let config = Config::default();
/// assert_eq!(config.general.max_cycles, 10_000);
/// assert!(!config.pipeline.forwarding);
/// ```
///
/// Deserializing from JSON:
///
/// ```
/// use mips_core::config::{BranchPolicy, Config};
///
/// let json = r#"{
///     "general": { "max_cycles": 500 },
///     "pipeline": { "forwarding": true, "branch_policy": "PredictTaken" }
/// }"#;
///
/// let config: Config = serde_json::from_str(json).unwrap();
/// assert_eq!(config.general.max_cycles, 500);
/// assert_eq!(config.pipeline.branch_policy, BranchPolicy::PredictTaken);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// General run settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Pipeline behavior settings.
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// General run settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Cycle cap for `run` callers that take it from configuration
    /// (0 = unbounded).
    #[serde(default = "GeneralConfig::default_max_cycles")]
    pub max_cycles: u64,
}

impl GeneralConfig {
    /// Returns the default cycle cap.
    fn default_max_cycles() -> u64 {
        defaults::MAX_CYCLES
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            max_cycles: defaults::MAX_CYCLES,
        }
    }
}

/// Pipeline behavior settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PipelineConfig {
    /// Perform writebacks early (at EX for arithmetic, MEM3 for loads),
    /// releasing hazard locks before WB.
    #[serde(default)]
    pub forwarding: bool,

    /// Branch resolution policy.
    #[serde(default)]
    pub branch_policy: BranchPolicy,
}

/// Externally exposed simulation modes.
///
/// Each mode fixes a (forwarding, branch policy) pair. The prediction modes
/// always run with forwarding enabled; the no-forwarding mode always uses
/// the flush policy. Both prediction policies remain independently
/// selectable through `Cpu::set_branch_policy` for callers that need
/// other combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Mode 0: no forwarding, flush on every branch.
    NoForwarding,
    /// Mode 1: forwarding, predict branches taken.
    PredictTaken,
    /// Mode 2: forwarding, predict branches not taken.
    PredictNotTaken,
}

impl Mode {
    /// All modes in id order.
    pub const ALL: [Mode; 3] = [Mode::NoForwarding, Mode::PredictTaken, Mode::PredictNotTaken];

    /// Looks a mode up by its numeric id.
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Mode::NoForwarding),
            1 => Some(Mode::PredictTaken),
            2 => Some(Mode::PredictNotTaken),
            _ => None,
        }
    }

    /// The numeric id of this mode.
    pub fn id(self) -> u8 {
        match self {
            Mode::NoForwarding => 0,
            Mode::PredictTaken => 1,
            Mode::PredictNotTaken => 2,
        }
    }

    /// Human-readable mode name for menus and reports.
    pub fn description(self) -> &'static str {
        match self {
            Mode::NoForwarding => "No Forwarding/Bypassing",
            Mode::PredictTaken => "Predict Branches Taken",
            Mode::PredictNotTaken => "Predict Branches Not Taken",
        }
    }

    /// The pipeline settings this mode stands for.
    pub fn pipeline(self) -> PipelineConfig {
        match self {
            Mode::NoForwarding => PipelineConfig {
                forwarding: false,
                branch_policy: BranchPolicy::Flush,
            },
            Mode::PredictTaken => PipelineConfig {
                forwarding: true,
                branch_policy: BranchPolicy::PredictTaken,
            },
            Mode::PredictNotTaken => PipelineConfig {
                forwarding: true,
                branch_policy: BranchPolicy::PredictNotTaken,
            },
        }
    }
}
