//! Strategy engines.
//!
//! - `state` / `smart`: the zone-driven allocation engine. One explicit
//!   `AllocationState` is threaded through a fold over the periods, so
//!   independent runs never share anything.
//! - `periodic`: fixed-cadence accumulation used by the baseline strategies.

pub mod config;
pub mod periodic;
pub mod smart;
pub mod state;

pub use config::{ExitStep, SmartConfig, WaveConfig, WaveParams, REL_EPSILON};
pub use periodic::{
    buy_and_hold, run_periodic, weekly_contribution, weekly_dca, ContributionSchedule,
    EverySession, FirstSessionOfWeek, BUY_AND_HOLD_STRATEGY, WEEKLY_DCA_STRATEGY,
};
pub use smart::{run_smart, SmartEngine, SMART_STRATEGY};
pub use state::{AllocationState, StepOutcome, WavePosition};
