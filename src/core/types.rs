use serde::Serialize;
use thiserror::Error;

/// Fixed demographic weighting: ~80% adults on a full share plus ~20%
/// children on a half share.
pub const SHARES_FACTOR: f64 = 0.9;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    #[error("invalid parameter `{field}`: {reason}")]
    InvalidParameter { field: &'static str, reason: String },

    #[error("degenerate arithmetic in {year}: {reason}")]
    ArithmeticDegenerate { year: i32, reason: String },
}

pub type SimulationResult<T> = Result<T, SimulationError>;

/// What to do when the previous year's fee is exactly zero and the
/// elasticity response would divide by it.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ZeroFeePolicy {
    /// Treat the elasticity term as zero; emissions carry forward.
    #[default]
    SkipAdjustment,
    /// Fail the run with `ArithmeticDegenerate`.
    Reject,
}

/// Immutable input for one simulation run. Percent fields are in percent
/// units (2.0 means 2%).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyParameters {
    pub start_year: i32,
    pub horizon_years: u32,
    /// $/t CO2-e in the first year.
    pub fee_start: f64,
    /// $/t added each subsequent year.
    pub fee_increment: f64,
    pub elasticity: f64,
    /// Million metric tons CO2-e in the first year.
    pub base_emissions: f64,
    /// Millions of people.
    pub population_start: f64,
    pub population_growth_pct: f64,
    pub admin_skim_pct: f64,
    pub ej_skim_pct: f64,
    pub low_income_bonus_pct: f64,
    pub cpf_diversion_pct: f64,
    /// $ billion.
    pub cpf_target_billion: f64,
    pub cpf_return_pct: f64,
    pub zero_fee_policy: ZeroFeePolicy,
}

impl Default for PolicyParameters {
    fn default() -> Self {
        Self {
            start_year: 2027,
            horizon_years: 10,
            fee_start: 30.0,
            fee_increment: 10.0,
            elasticity: -0.30,
            base_emissions: 55.0,
            population_start: 7.206,
            population_growth_pct: 0.25,
            admin_skim_pct: 2.0,
            ej_skim_pct: 5.0,
            low_income_bonus_pct: 30.0,
            cpf_diversion_pct: 20.0,
            cpf_target_billion: 5.0,
            cpf_return_pct: 5.0,
            zero_fee_policy: ZeroFeePolicy::SkipAdjustment,
        }
    }
}

impl PolicyParameters {
    /// Checks every documented field constraint. The combined skim
    /// (`admin + ej <= 100`) is left to callers; the engine propagates a
    /// negative dividend pool instead of rejecting it.
    pub fn validate(&self) -> SimulationResult<()> {
        if self.horizon_years < 1 {
            return Err(invalid("horizon_years", "must be >= 1"));
        }

        if self.last_year().is_none() {
            return Err(invalid(
                "horizon_years",
                "start_year + horizon_years - 1 must fit in a 32-bit year",
            ));
        }

        for (field, value) in [
            ("fee_start", self.fee_start),
            ("fee_increment", self.fee_increment),
            ("elasticity", self.elasticity),
            ("base_emissions", self.base_emissions),
            ("population_start", self.population_start),
            ("population_growth_pct", self.population_growth_pct),
            ("admin_skim_pct", self.admin_skim_pct),
            ("ej_skim_pct", self.ej_skim_pct),
            ("low_income_bonus_pct", self.low_income_bonus_pct),
            ("cpf_diversion_pct", self.cpf_diversion_pct),
            ("cpf_target_billion", self.cpf_target_billion),
            ("cpf_return_pct", self.cpf_return_pct),
        ] {
            if !value.is_finite() {
                return Err(invalid(field, "must be a finite number"));
            }
        }

        for (field, value) in [
            ("fee_start", self.fee_start),
            ("fee_increment", self.fee_increment),
            ("low_income_bonus_pct", self.low_income_bonus_pct),
            ("cpf_target_billion", self.cpf_target_billion),
            ("cpf_return_pct", self.cpf_return_pct),
        ] {
            if value < 0.0 {
                return Err(invalid(field, "must be >= 0"));
            }
        }

        if self.elasticity > 0.0 {
            return Err(invalid("elasticity", "must be <= 0"));
        }

        for (field, value) in [
            ("base_emissions", self.base_emissions),
            ("population_start", self.population_start),
        ] {
            if value <= 0.0 {
                return Err(invalid(field, "must be > 0"));
            }
        }

        for (field, value) in [
            ("admin_skim_pct", self.admin_skim_pct),
            ("ej_skim_pct", self.ej_skim_pct),
            ("cpf_diversion_pct", self.cpf_diversion_pct),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(invalid(field, "must be between 0 and 100"));
            }
        }

        Ok(())
    }

    /// Calendar year of the final record; `None` for an empty horizon or
    /// when the year range overflows `i32`.
    pub fn last_year(&self) -> Option<i32> {
        let span = i32::try_from(self.horizon_years.checked_sub(1)?).ok()?;
        self.start_year.checked_add(span)
    }
}

fn invalid(field: &'static str, reason: &str) -> SimulationError {
    SimulationError::InvalidParameter {
        field,
        reason: reason.to_string(),
    }
}

/// One simulated year. Monetary aggregates are in $ billion, per-person
/// dividends in $ per year, all at full precision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearRecord {
    pub year: i32,
    pub fee_per_ton: f64,
    pub emissions: f64,
    /// Start-of-year population used for the per-capita split.
    pub population: f64,
    pub gross_revenue: f64,
    pub admin_skim: f64,
    pub ej_skim: f64,
    pub dividend_raw: f64,
    pub cpf_diversion: f64,
    pub dividend_pool: f64,
    pub adult_dividend: f64,
    pub child_dividend: f64,
    pub low_income_dividend: f64,
    /// Closing balance after this year's return and diversion.
    pub cpf_balance: f64,
}

impl YearRecord {
    pub fn skims_and_diversions(&self) -> f64 {
        self.gross_revenue - self.dividend_pool
    }
}
