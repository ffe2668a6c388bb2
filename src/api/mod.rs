use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::core::{
    PolicyParameters, TrajectorySeries, TrajectorySummary, YearRecord, ZeroFeePolicy, simulate,
};

/// Upper bound on simulated years accepted from callers.
const MAX_HORIZON_YEARS: u32 = 200;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliZeroFeePolicy {
    SkipAdjustment,
    Reject,
}

impl From<CliZeroFeePolicy> for ZeroFeePolicy {
    fn from(value: CliZeroFeePolicy) -> Self {
        match value {
            CliZeroFeePolicy::SkipAdjustment => ZeroFeePolicy::SkipAdjustment,
            CliZeroFeePolicy::Reject => ZeroFeePolicy::Reject,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiZeroFeePolicy {
    #[serde(alias = "skipAdjustment", alias = "skip_adjustment", alias = "skip")]
    SkipAdjustment,
    Reject,
}

impl From<ApiZeroFeePolicy> for CliZeroFeePolicy {
    fn from(value: ApiZeroFeePolicy) -> Self {
        match value {
            ApiZeroFeePolicy::SkipAdjustment => CliZeroFeePolicy::SkipAdjustment,
            ApiZeroFeePolicy::Reject => CliZeroFeePolicy::Reject,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulatePayload {
    start_year: Option<i32>,
    years: Option<u32>,

    fee_start: Option<f64>,
    fee_increment: Option<f64>,
    elasticity: Option<f64>,

    base_emissions: Option<f64>,
    population: Option<f64>,
    population_growth: Option<f64>,

    admin_skim: Option<f64>,
    ej_skim: Option<f64>,
    low_income_bonus: Option<f64>,

    cpf_diversion: Option<f64>,
    cpf_target: Option<f64>,
    cpf_return: Option<f64>,

    zero_fee_policy: Option<ApiZeroFeePolicy>,
}

#[derive(Parser, Debug)]
#[command(
    name = "carbon-dividend",
    about = "Carbon fee & dividend simulator (fee escalation, emissions response, CPF reserve, per-capita dividends)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one simulation and print the year-by-year table.
    Simulate(SimulateArgs),
    /// Serve the JSON simulation API over HTTP.
    Serve {
        #[arg(default_value_t = 8080)]
        port: u16,
    },
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    #[command(flatten)]
    policy: PolicyArgs,
    #[arg(long, help = "Print full-precision JSON instead of the rounded table")]
    json: bool,
}

#[derive(Args, Debug, Clone)]
struct PolicyArgs {
    #[arg(long, default_value_t = 2027, help = "Calendar year of the first simulated year")]
    start_year: i32,
    #[arg(long, default_value_t = 10, help = "Number of years to simulate")]
    years: u32,
    #[arg(
        long,
        default_value_t = 30.0,
        help = "Starting carbon fee in $ per metric ton CO2-e"
    )]
    fee_start: f64,
    #[arg(
        long,
        default_value_t = 10.0,
        help = "Fee added each year in $ per metric ton"
    )]
    fee_increment: f64,
    #[arg(
        long,
        default_value_t = -0.30,
        allow_hyphen_values = true,
        help = "Price elasticity of emissions demand (<= 0)"
    )]
    elasticity: f64,
    #[arg(
        long,
        default_value_t = 55.0,
        help = "Covered emissions in the first year (million metric tons CO2-e)"
    )]
    base_emissions: f64,
    #[arg(long, default_value_t = 7.206, help = "Baseline population in millions")]
    population: f64,
    #[arg(
        long,
        default_value_t = 0.25,
        allow_hyphen_values = true,
        help = "Annual population growth in percent"
    )]
    population_growth: f64,
    #[arg(
        long,
        default_value_t = 2.0,
        help = "Share of gross revenue kept for administration in percent"
    )]
    admin_skim: f64,
    #[arg(
        long,
        default_value_t = 5.0,
        help = "Share of gross revenue for the environmental justice fund in percent"
    )]
    ej_skim: f64,
    #[arg(
        long,
        default_value_t = 30.0,
        help = "Dividend supplement for qualifying low-income adults in percent"
    )]
    low_income_bonus: f64,
    #[arg(
        long,
        default_value_t = 20.0,
        help = "Share of the dividend pool diverted to the CPF while below target in percent"
    )]
    cpf_diversion: f64,
    #[arg(long, default_value_t = 5.0, help = "CPF target principal in $ billion")]
    cpf_target: f64,
    #[arg(long, default_value_t = 5.0, help = "CPF real annual return in percent")]
    cpf_return: f64,
    #[arg(
        long,
        value_enum,
        default_value_t = CliZeroFeePolicy::SkipAdjustment,
        help = "Handling of a zero previous-year fee in the elasticity step"
    )]
    zero_fee_policy: CliZeroFeePolicy,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResponse {
    parameters: PolicyParameters,
    years: Vec<YearRecord>,
    series: TrajectorySeries,
    summary: Option<TrajectorySummary>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// Caller-side plausibility checks on top of the engine's own validation.
fn build_params(args: PolicyArgs) -> Result<PolicyParameters, String> {
    if args.years == 0 || args.years > MAX_HORIZON_YEARS {
        return Err(format!("--years must be between 1 and {MAX_HORIZON_YEARS}"));
    }

    if args.admin_skim + args.ej_skim > 100.0 {
        return Err("--admin-skim plus --ej-skim cannot exceed 100".to_string());
    }

    if !args.population_growth.is_finite() || args.population_growth <= -100.0 {
        return Err("--population-growth must be > -100".to_string());
    }

    let params = PolicyParameters {
        start_year: args.start_year,
        horizon_years: args.years,
        fee_start: args.fee_start,
        fee_increment: args.fee_increment,
        elasticity: args.elasticity,
        base_emissions: args.base_emissions,
        population_start: args.population,
        population_growth_pct: args.population_growth,
        admin_skim_pct: args.admin_skim,
        ej_skim_pct: args.ej_skim,
        low_income_bonus_pct: args.low_income_bonus,
        cpf_diversion_pct: args.cpf_diversion,
        cpf_target_billion: args.cpf_target,
        cpf_return_pct: args.cpf_return,
        zero_fee_policy: args.zero_fee_policy.into(),
    };
    params.validate().map_err(|e| e.to_string())?;
    Ok(params)
}

/// Runs the `simulate` subcommand and returns the text to print.
pub fn run_simulate_command(args: SimulateArgs) -> Result<String, String> {
    let params = build_params(args.policy)?;
    let records = simulate(&params).map_err(|e| e.to_string())?;
    if args.json {
        let response = build_simulate_response(params, records);
        return serde_json::to_string_pretty(&response).map_err(|e| e.to_string());
    }
    Ok(render_table(&records))
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .route("/api/defaults", get(defaults_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "carbon dividend HTTP API listening");
    info!("local access: http://127.0.0.1:{port}/api/simulate");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn defaults_handler() -> Response {
    json_response(StatusCode::OK, PolicyParameters::default())
}

async fn simulate_get_handler(Query(payload): Query<SimulatePayload>) -> Response {
    simulate_handler_impl(payload).await
}

async fn simulate_post_handler(Json(payload): Json<SimulatePayload>) -> Response {
    simulate_handler_impl(payload).await
}

async fn simulate_handler_impl(payload: SimulatePayload) -> Response {
    let params = match params_from_payload(payload) {
        Ok(params) => params,
        Err(msg) => {
            warn!(error = %msg, "rejected simulation request");
            return error_response(StatusCode::BAD_REQUEST, &msg);
        }
    };

    match simulate(&params) {
        Ok(records) => json_response(StatusCode::OK, build_simulate_response(params, records)),
        Err(e) => {
            warn!(error = %e, "simulation failed");
            error_response(StatusCode::BAD_REQUEST, &e.to_string())
        }
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn params_from_json(json: &str) -> Result<PolicyParameters, String> {
    let payload = serde_json::from_str::<SimulatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    params_from_payload(payload)
}

fn params_from_payload(payload: SimulatePayload) -> Result<PolicyParameters, String> {
    let mut args = default_args_for_api();

    if let Some(v) = payload.start_year {
        args.start_year = v;
    }
    if let Some(v) = payload.years {
        args.years = v;
    }

    if let Some(v) = payload.fee_start {
        args.fee_start = v;
    }
    if let Some(v) = payload.fee_increment {
        args.fee_increment = v;
    }
    if let Some(v) = payload.elasticity {
        args.elasticity = v;
    }

    if let Some(v) = payload.base_emissions {
        args.base_emissions = v;
    }
    if let Some(v) = payload.population {
        args.population = v;
    }
    if let Some(v) = payload.population_growth {
        args.population_growth = v;
    }

    if let Some(v) = payload.admin_skim {
        args.admin_skim = v;
    }
    if let Some(v) = payload.ej_skim {
        args.ej_skim = v;
    }
    if let Some(v) = payload.low_income_bonus {
        args.low_income_bonus = v;
    }

    if let Some(v) = payload.cpf_diversion {
        args.cpf_diversion = v;
    }
    if let Some(v) = payload.cpf_target {
        args.cpf_target = v;
    }
    if let Some(v) = payload.cpf_return {
        args.cpf_return = v;
    }

    if let Some(v) = payload.zero_fee_policy {
        args.zero_fee_policy = v.into();
    }

    build_params(args)
}

fn default_args_for_api() -> PolicyArgs {
    let defaults = PolicyParameters::default();
    PolicyArgs {
        start_year: defaults.start_year,
        years: defaults.horizon_years,
        fee_start: defaults.fee_start,
        fee_increment: defaults.fee_increment,
        elasticity: defaults.elasticity,
        base_emissions: defaults.base_emissions,
        population: defaults.population_start,
        population_growth: defaults.population_growth_pct,
        admin_skim: defaults.admin_skim_pct,
        ej_skim: defaults.ej_skim_pct,
        low_income_bonus: defaults.low_income_bonus_pct,
        cpf_diversion: defaults.cpf_diversion_pct,
        cpf_target: defaults.cpf_target_billion,
        cpf_return: defaults.cpf_return_pct,
        zero_fee_policy: CliZeroFeePolicy::SkipAdjustment,
    }
}

fn build_simulate_response(params: PolicyParameters, records: Vec<YearRecord>) -> SimulateResponse {
    SimulateResponse {
        series: TrajectorySeries::from_records(&records),
        summary: TrajectorySummary::from_records(&records, params.cpf_target_billion),
        parameters: params,
        years: records,
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

const TABLE_HEADERS: [&str; 9] = [
    "Year",
    "Fee $/t",
    "Emissions (MMT)",
    "Revenue ($bn)",
    "Dividend pool ($bn)",
    "Adult dividend ($/yr)",
    "Child dividend ($/yr)",
    "Low-income adult dividend ($/yr)",
    "CPF balance ($bn)",
];

/// Display table: monetary and rate columns to 2 decimals, per-person
/// dividends to whole dollars.
fn render_table(records: &[YearRecord]) -> String {
    let rows = records
        .iter()
        .map(|r| {
            [
                r.year.to_string(),
                format!("{:.2}", round_to(r.fee_per_ton, 2)),
                format!("{:.2}", round_to(r.emissions, 2)),
                format!("{:.2}", round_to(r.gross_revenue, 2)),
                format!("{:.2}", round_to(r.dividend_pool, 2)),
                format!("{:.0}", round_to(r.adult_dividend, 0)),
                format!("{:.0}", round_to(r.child_dividend, 0)),
                format!("{:.0}", round_to(r.low_income_dividend, 0)),
                format!("{:.2}", round_to(r.cpf_balance, 2)),
            ]
        })
        .collect::<Vec<_>>();

    let mut widths = TABLE_HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let mut out = String::new();
    let header = TABLE_HEADERS
        .iter()
        .zip(widths)
        .map(|(h, w)| format!("{h:>w$}"))
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(&header);
    out.push('\n');
    for row in &rows {
        let line = row
            .iter()
            .zip(widths)
            .map(|(cell, w)| format!("{cell:>w$}"))
            .collect::<Vec<_>>()
            .join("  ");
        out.push_str(&line);
        out.push('\n');
    }
    out
}
