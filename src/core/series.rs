use serde::Serialize;

use super::types::YearRecord;

/// Column-oriented view of a trajectory for chart consumers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrajectorySeries {
    pub years: Vec<i32>,
    pub fee_per_ton: Vec<f64>,
    pub emissions: Vec<f64>,
    pub gross_revenue: Vec<f64>,
    pub dividend_pool: Vec<f64>,
    pub skims_and_diversions: Vec<f64>,
    pub adult_dividend: Vec<f64>,
    pub child_dividend: Vec<f64>,
    pub low_income_dividend: Vec<f64>,
    pub cpf_balance: Vec<f64>,
}

impl TrajectorySeries {
    fn with_capacity(len: usize) -> Self {
        Self {
            years: Vec::with_capacity(len),
            fee_per_ton: Vec::with_capacity(len),
            emissions: Vec::with_capacity(len),
            gross_revenue: Vec::with_capacity(len),
            dividend_pool: Vec::with_capacity(len),
            skims_and_diversions: Vec::with_capacity(len),
            adult_dividend: Vec::with_capacity(len),
            child_dividend: Vec::with_capacity(len),
            low_income_dividend: Vec::with_capacity(len),
            cpf_balance: Vec::with_capacity(len),
        }
    }

    fn push(&mut self, record: &YearRecord) {
        self.years.push(record.year);
        self.fee_per_ton.push(record.fee_per_ton);
        self.emissions.push(record.emissions);
        self.gross_revenue.push(record.gross_revenue);
        self.dividend_pool.push(record.dividend_pool);
        self.skims_and_diversions.push(record.skims_and_diversions());
        self.adult_dividend.push(record.adult_dividend);
        self.child_dividend.push(record.child_dividend);
        self.low_income_dividend.push(record.low_income_dividend);
        self.cpf_balance.push(record.cpf_balance);
    }

    pub fn from_records(records: &[YearRecord]) -> Self {
        let mut series = Self::with_capacity(records.len());
        for record in records {
            series.push(record);
        }
        series
    }

    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }
}

/// Headline figures across a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrajectorySummary {
    pub total_revenue: f64,
    pub total_dividend_pool: f64,
    pub total_dividends_paid_per_adult: f64,
    pub final_emissions: f64,
    pub emissions_reduction_pct: f64,
    pub final_cpf_balance: f64,
    pub cpf_target_reached_year: Option<i32>,
}

impl TrajectorySummary {
    pub fn from_records(records: &[YearRecord], cpf_target_billion: f64) -> Option<Self> {
        let first = records.first()?;
        let last = records.last()?;

        let emissions_reduction_pct = if first.emissions != 0.0 {
            (1.0 - last.emissions / first.emissions) * 100.0
        } else {
            0.0
        };

        Some(Self {
            total_revenue: total_revenue(records),
            total_dividend_pool: records.iter().map(|r| r.dividend_pool).sum(),
            total_dividends_paid_per_adult: total_dividends_paid_per_adult(records),
            final_emissions: last.emissions,
            emissions_reduction_pct,
            final_cpf_balance: last.cpf_balance,
            cpf_target_reached_year: cpf_target_reached_year(records, cpf_target_billion),
        })
    }
}

pub fn total_revenue(records: &[YearRecord]) -> f64 {
    records.iter().map(|r| r.gross_revenue).sum()
}

/// Sum of every year's adult dividend: what one adult receives over the run.
pub fn total_dividends_paid_per_adult(records: &[YearRecord]) -> f64 {
    records.iter().map(|r| r.adult_dividend).sum()
}

/// First year whose closing CPF balance is at or above `target`.
pub fn cpf_target_reached_year(records: &[YearRecord], target: f64) -> Option<i32> {
    records
        .iter()
        .find(|r| r.cpf_balance >= target)
        .map(|r| r.year)
}
