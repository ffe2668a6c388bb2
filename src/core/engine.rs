use tracing::debug;

use super::types::{
    PolicyParameters, SHARES_FACTOR, SimulationError, SimulationResult, YearRecord, ZeroFeePolicy,
};

/// Percent inputs converted to fractions once per run.
#[derive(Debug, Clone, Copy)]
struct Rates {
    admin: f64,
    ej: f64,
    cpf_diversion: f64,
    cpf_return: f64,
    low_income_bonus: f64,
    population_growth: f64,
}

impl Rates {
    fn from_params(params: &PolicyParameters) -> Self {
        Self {
            admin: params.admin_skim_pct / 100.0,
            ej: params.ej_skim_pct / 100.0,
            cpf_diversion: params.cpf_diversion_pct / 100.0,
            cpf_return: params.cpf_return_pct / 100.0,
            low_income_bonus: params.low_income_bonus_pct / 100.0,
            population_growth: params.population_growth_pct / 100.0,
        }
    }
}

/// Carried between years; every field is overwritten once per step.
#[derive(Debug)]
struct SimulationState {
    fee: f64,
    emissions: f64,
    cpf_balance: f64,
    population: f64,
}

impl SimulationState {
    fn new(params: &PolicyParameters) -> Self {
        Self {
            fee: params.fee_start,
            emissions: params.base_emissions,
            cpf_balance: 0.0,
            population: params.population_start,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Allocation {
    admin_skim: f64,
    ej_skim: f64,
    dividend_raw: f64,
    cpf_diversion: f64,
    dividend_pool: f64,
}

#[derive(Debug, Clone, Copy)]
struct Dividends {
    adult: f64,
    child: f64,
    low_income: f64,
}

/// Runs the full fee-and-dividend trajectory. Returns exactly
/// `horizon_years` records for consecutive years starting at `start_year`,
/// or fails before producing anything.
pub fn simulate(params: &PolicyParameters) -> SimulationResult<Vec<YearRecord>> {
    params.validate()?;
    debug!(
        start_year = params.start_year,
        horizon_years = params.horizon_years,
        "running carbon dividend simulation"
    );

    let rates = Rates::from_params(params);
    let mut state = SimulationState::new(params);
    let mut records = Vec::with_capacity(params.horizon_years as usize);

    for index in 0..params.horizon_years {
        // validate() bounds start_year + horizon_years - 1 within i32.
        let year = params.start_year + index as i32;
        if index > 0 {
            advance_fee_and_emissions(params, &mut state, index, year)?;
        }

        let record = run_year(params, &rates, &mut state, year);
        records.push(record);

        state.population *= 1.0 + rates.population_growth;
    }

    Ok(records)
}

fn advance_fee_and_emissions(
    params: &PolicyParameters,
    state: &mut SimulationState,
    index: u32,
    year: i32,
) -> SimulationResult<()> {
    let prev_fee = state.fee;
    state.fee = params.fee_start + f64::from(index) * params.fee_increment;
    state.emissions *= demand_response(params, prev_fee, year)?;
    Ok(())
}

/// Multiplier applied to last year's emissions for a `fee_increment` step
/// on top of `prev_fee`.
fn demand_response(params: &PolicyParameters, prev_fee: f64, year: i32) -> SimulationResult<f64> {
    if prev_fee == 0.0 {
        return match params.zero_fee_policy {
            ZeroFeePolicy::SkipAdjustment => {
                debug!(year, "previous fee is zero, skipping elasticity adjustment");
                Ok(1.0)
            }
            ZeroFeePolicy::Reject => Err(SimulationError::ArithmeticDegenerate {
                year,
                reason: "previous year's fee is zero, elasticity response is undefined"
                    .to_string(),
            }),
        };
    }

    Ok(1.0 + params.elasticity * (params.fee_increment / prev_fee))
}

fn run_year(
    params: &PolicyParameters,
    rates: &Rates,
    state: &mut SimulationState,
    year: i32,
) -> YearRecord {
    let gross_revenue = state.fee * state.emissions / 1000.0;
    let allocation = allocate_revenue(
        gross_revenue,
        rates,
        state.cpf_balance,
        params.cpf_target_billion,
    );

    let opening_balance = state.cpf_balance;
    state.cpf_balance = opening_balance * (1.0 + rates.cpf_return) + allocation.cpf_diversion;
    if opening_balance < params.cpf_target_billion
        && state.cpf_balance >= params.cpf_target_billion
    {
        debug!(year, balance = state.cpf_balance, "CPF target reached");
    }

    let dividends = per_capita_dividends(allocation.dividend_pool, state.population, rates);

    YearRecord {
        year,
        fee_per_ton: state.fee,
        emissions: state.emissions,
        population: state.population,
        gross_revenue,
        admin_skim: allocation.admin_skim,
        ej_skim: allocation.ej_skim,
        dividend_raw: allocation.dividend_raw,
        cpf_diversion: allocation.cpf_diversion,
        dividend_pool: allocation.dividend_pool,
        adult_dividend: dividends.adult,
        child_dividend: dividends.child,
        low_income_dividend: dividends.low_income,
        cpf_balance: state.cpf_balance,
    }
}

/// Skims come off the top; the CPF diversion is taken from what remains
/// only while the opening balance is below target. Negative pools are
/// propagated as-is.
fn allocate_revenue(
    gross_revenue: f64,
    rates: &Rates,
    cpf_balance: f64,
    cpf_target: f64,
) -> Allocation {
    let dividend_raw = gross_revenue * (1.0 - rates.admin - rates.ej);
    let cpf_diversion = if cpf_balance < cpf_target {
        dividend_raw * rates.cpf_diversion
    } else {
        0.0
    };

    Allocation {
        admin_skim: gross_revenue * rates.admin,
        ej_skim: gross_revenue * rates.ej,
        dividend_raw,
        cpf_diversion,
        dividend_pool: dividend_raw - cpf_diversion,
    }
}

fn per_capita_dividends(dividend_pool: f64, population: f64, rates: &Rates) -> Dividends {
    let total_shares = SHARES_FACTOR * population;
    // $bn over millions of shares: x1000 gives $ per share.
    let adult = if total_shares > 0.0 {
        dividend_pool * 1000.0 / total_shares
    } else {
        0.0
    };

    Dividends {
        adult,
        child: adult / 2.0,
        low_income: adult * (1.0 + rates.low_income_bonus),
    }
}
