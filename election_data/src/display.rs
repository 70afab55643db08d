//! Derived values for presenting the results: advantages, colors and labels.

use serde::Serialize;
use snafu::prelude::*;

use crate::config::*;
use crate::year_data;

/// The lower bounds of the buckets above the neutral one. The buckets below
/// are symmetric.
const BUCKET_BOUNDS: [f64; 4] = [3.0, 6.0, 9.0, 12.0];

/// From strongly R (bucket 0) to strongly D (bucket 8).
pub const PALETTE: [&str; 9] = [
    "#b2182b", "#d6604d", "#f4a582", "#fddbc7", "#f7f7f7", "#d1e5f0", "#92c5de", "#4393c3",
    "#2166ac",
];

/// The advantage of the Democratic candidate in percentage points, minus
/// a baseline (the national advantage, when showing relative results).
pub fn d_advantage_from_votes(result: &StateElectionResult, baseline: f64) -> f64 {
    (result.margin() as f64 * 100.0) / result.total_count as f64 - baseline
}

/// The index of the color bucket in [PALETTE]. Monotonic in the advantage,
/// with the neutral bucket covering (-3, 3).
pub fn color_bucket(d_advantage: f64) -> usize {
    let magnitude = d_advantage.abs();
    let steps = BUCKET_BOUNDS.iter().filter(|b| magnitude >= **b).count();
    if d_advantage > 0.0 {
        4 + steps
    } else {
        4 - steps
    }
}

pub fn color_from_d_advantage(d_advantage: f64) -> &'static str {
    PALETTE[color_bucket(d_advantage)]
}

/// `Even`, `D+2.1` or `R+0.5`.
pub fn text_from_d_advantage(d_advantage: f64) -> String {
    if d_advantage > 0.0 {
        format!("D+{:.1}", d_advantage)
    } else if d_advantage < 0.0 {
        format!("R+{:.1}", -d_advantage)
    } else {
        "Even".to_string()
    }
}

/// `Electoral votes: R 271 - D 267`, winner first.
pub fn electoral_vote_text(totals: &ElectoralTotals) -> String {
    let (winner, loser) = if totals.d > totals.r {
        (Party::Democratic, Party::Republican)
    } else {
        (Party::Republican, Party::Democratic)
    };
    format!(
        "Electoral votes: {} {} - {} {}",
        winner,
        totals.votes_for(winner),
        loser,
        totals.votes_for(loser)
    )
}

#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct StateHistory {
    pub code: String,
    pub points: Vec<(u32, f64)>,
    /// Lower bound of the chart, a multiple of 5 that is at most 0.
    pub min: f64,
    /// Upper bound of the chart, a multiple of 5 that is at least 0.
    pub max: f64,
}

/// The advantage of one state over all the years.
pub fn state_history(data: &ElectionData, code: &str, relative: bool) -> DataResult<StateHistory> {
    let mut points = Vec::new();
    let (mut min, mut max) = (0.0f64, 0.0f64);
    for (year, year_results) in data.iter() {
        let result = year_results.state_result(code).context(UnknownStateSnafu {
            year: *year,
            code,
        })?;
        let baseline = if relative {
            year_results.national_d_advantage()
        } else {
            0.0
        };
        let y = d_advantage_from_votes(result, baseline);
        min = min.min(y);
        max = max.max(y);
        points.push((*year, y));
    }
    Ok(StateHistory {
        code: code.to_string(),
        points,
        min: (min / 5.0).floor() * 5.0,
        max: (max / 5.0).ceil() * 5.0,
    })
}

#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct StateShift {
    pub code: String,
    pub shift: f64,
}

/// How much each state moved since the previous election, most D shift
/// first.
pub fn state_shifts(
    data: &ElectionData,
    year: u32,
    previous_year: u32,
    relative: bool,
) -> DataResult<Vec<StateShift>> {
    let current = year_data(data, year)?;
    let previous = year_data(data, previous_year)?;
    let baseline = |y: &ElectionYearData| {
        if relative {
            y.national_d_advantage()
        } else {
            0.0
        }
    };
    let mut res = Vec::new();
    for (code, result) in current.state_results() {
        let before = previous.state_result(code).context(UnknownStateSnafu {
            year: previous_year,
            code: code.as_str(),
        })?;
        let shift = d_advantage_from_votes(result, baseline(current))
            - d_advantage_from_votes(before, baseline(previous));
        res.push(StateShift {
            code: code.clone(),
            shift,
        });
    }
    res.sort_by(|a, b| b.shift.total_cmp(&a.shift));
    Ok(res)
}
