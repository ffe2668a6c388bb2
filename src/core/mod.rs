mod engine;
mod series;
mod types;

pub use engine::simulate;
pub use series::{
    TrajectorySeries, TrajectorySummary, cpf_target_reached_year, total_dividends_paid_per_adult,
    total_revenue,
};
pub use types::{
    PolicyParameters, SHARES_FACTOR, SimulationError, SimulationResult, YearRecord, ZeroFeePolicy,
};
