/*!
Aggregation of U.S. presidential election results by state.

The entry points take the loaded data (one [ElectionYearData] per year and
an [ElectoralVoteTable]) and compute the electoral outcome of a year:
the electoral votes of each party, the tipping point state, the closest
state and the number of votes needed to flip a state.

See the [manual] for the format of the input files.
*/

pub mod builder;
mod config;
pub mod display;
pub mod manual;
pub mod min_votes;

use log::debug;
use snafu::prelude::*;

pub use crate::config::*;

/// Split electoral votes that the result files do not encode.
/// (year, state, change to the D electoral votes; R gets the opposite)
const SPLIT_VOTE_EXCEPTIONS: &[(u32, &str, i64)] = &[(2008, "NE", 1), (2016, "ME", -1)];

/// The electoral votes of each state for the given year: the latest table
/// whose effective year is at or before the year.
pub fn vote_table_for_year(table: &ElectoralVoteTable, year: u32) -> DataResult<&ElectoralVoteMap> {
    table
        .entries()
        .iter()
        .rev()
        .find(|(effective_year, _)| *effective_year <= year)
        .map(|(_, m)| m)
        .context(YearBeforeTableSnafu {
            year,
            first_year: table.first_year(),
        })
}

/// The electoral votes of a state. A congressional district is always
/// worth one electoral vote.
pub fn electoral_votes_for_state(
    table: &ElectoralVoteTable,
    code: &str,
    year: u32,
) -> DataResult<u32> {
    if code.len() > 2 {
        return Ok(1);
    }
    vote_table_for_year(table, year)?
        .get(code)
        .copied()
        .context(MissingElectoralVotesSnafu { year, code })
}

pub fn year_data(data: &ElectionData, year: u32) -> DataResult<&ElectionYearData> {
    data.get(&year).context(MissingYearSnafu { year })
}

/// The electoral votes of each party in one state, as (D, R).
///
/// The state goes to the party with strictly more votes. States that split
/// their votes by district then move one vote for each district won by the
/// other party. The historical exceptions apply only when the year has no
/// district rows for the state.
fn state_d_and_r_electoral_votes(
    table: &ElectoralVoteTable,
    year_results: &ElectionYearData,
    result: &StateElectionResult,
    year: u32,
) -> DataResult<(i64, i64)> {
    let code = result.state_code.as_str();
    let ev = electoral_votes_for_state(table, code, year)? as i64;
    let (mut d, mut r) = (0i64, 0i64);
    let state_winner = result.winner();
    match state_winner {
        Some(Party::Democratic) => d += ev,
        Some(Party::Republican) => r += ev,
        None => debug!("state_d_and_r_electoral_votes: {} {}: tied", year, code),
    }
    let districts = year_results.districts_of(code);
    for district in districts.iter() {
        match (state_winner, district.winner()) {
            (Some(Party::Democratic), Some(Party::Republican)) => {
                d -= 1;
                r += 1;
            }
            (Some(Party::Republican), Some(Party::Democratic)) => {
                d += 1;
                r -= 1;
            }
            (None, Some(Party::Democratic)) => d += 1,
            (None, Some(Party::Republican)) => r += 1,
            _ => {}
        }
    }
    if districts.is_empty() {
        for (exception_year, exception_code, d_change) in SPLIT_VOTE_EXCEPTIONS.iter() {
            if *exception_year == year && *exception_code == code {
                d += d_change;
                r -= d_change;
            }
        }
    }
    Ok((d, r))
}

/// The total number of electoral votes of each party.
pub fn total_d_and_r_electoral_votes(
    table: &ElectoralVoteTable,
    data: &ElectionData,
    year: u32,
) -> DataResult<ElectoralTotals> {
    let year_results = year_data(data, year)?;
    let (mut d, mut r) = (0i64, 0i64);
    for result in year_results.state_results().values() {
        let (state_d, state_r) = state_d_and_r_electoral_votes(table, year_results, result, year)?;
        d += state_d;
        r += state_r;
    }
    let to_votes = |x: i64| {
        u32::try_from(x).ok().context(InconsistentElectoralVotesSnafu {
            year,
            code: "US",
        })
    };
    Ok(ElectoralTotals {
        d: to_votes(d)?,
        r: to_votes(r)?,
    })
}

/// The full-state results of a year, in the requested order. Both sorts put
/// the most Democratic state first.
pub fn state_results_sorted(
    data: &ElectionData,
    year: u32,
    order: SortOrder,
) -> DataResult<Vec<&StateElectionResult>> {
    let mut res: Vec<&StateElectionResult> =
        year_data(data, year)?.state_results().values().collect();
    match order {
        SortOrder::None => {}
        SortOrder::ByMargin => res.sort_by(|a, b| b.margin().cmp(&a.margin())),
        SortOrder::ByPercentage => {
            res.sort_by(|a, b| b.margin_fraction().total_cmp(&a.margin_fraction()))
        }
    }
    Ok(res)
}

/// The number of electoral votes needed to decide the election.
pub fn deciding_votes(total: u32) -> u32 {
    if total % 2 == 0 {
        total / 2 + 1
    } else {
        (total + 1) / 2
    }
}

/// The tipping point state: walking the states won by the national winner
/// from the strongest, the first state at which the winner reaches a
/// majority.
///
/// Each state counts for the votes the winner actually got there, after
/// the district splits. The winner's votes in states won by the other party
/// (districts, historical exceptions) are counted before the walk starts.
pub fn tipping_point_state<'a>(
    table: &ElectoralVoteTable,
    data: &'a ElectionData,
    year: u32,
) -> DataResult<&'a StateElectionResult> {
    let year_results = year_data(data, year)?;
    let mut sorted = state_results_sorted(data, year, SortOrder::ByPercentage)?;
    let total: u32 = vote_table_for_year(table, year)?.values().sum();
    let needed = deciding_votes(total) as i64;
    let totals = total_d_and_r_electoral_votes(table, data, year)?;
    let winner = totals
        .winner()
        .context(ElectoralTieSnafu { year, votes: totals.d })?;
    if winner == Party::Republican {
        sorted.reverse();
    }
    let winner_votes = |result: &StateElectionResult| -> DataResult<i64> {
        let (d, r) = state_d_and_r_electoral_votes(table, year_results, result, year)?;
        Ok(match winner {
            Party::Democratic => d,
            Party::Republican => r,
        })
    };
    let mut accumulated = 0i64;
    for result in sorted.iter().filter(|r| r.winner() != Some(winner)) {
        accumulated += winner_votes(*result)?;
    }
    if accumulated > 0 {
        debug!(
            "tipping_point_state: {}: {} votes outside of the states won by {}",
            year, accumulated, winner
        );
    }
    for result in sorted.into_iter().filter(|r| r.winner() == Some(winner)) {
        accumulated += winner_votes(result)?;
        if accumulated >= needed {
            debug!(
                "tipping_point_state: {}: {} ({} of {} needed)",
                year, result.state_code, accumulated, needed
            );
            return Ok(result);
        }
    }
    TippingPointNotFoundSnafu { year }.fail()
}

/// The state with the smallest margin relative to the votes cast. On ties,
/// the first state by code wins.
pub fn closest_state_by_percentage(
    data: &ElectionData,
    year: u32,
) -> DataResult<&StateElectionResult> {
    let mut closest: Option<&StateElectionResult> = None;
    for result in year_data(data, year)?.state_results().values() {
        match closest {
            Some(c) if c.margin_fraction().abs() <= result.margin_fraction().abs() => {}
            _ => closest = Some(result),
        }
    }
    closest.context(MissingYearSnafu { year })
}

/// The smallest number of votes that changes the winner of a state.
/// An exact tie is not a change of winner, hence the extra vote.
pub fn votes_to_change_winner(result: &StateElectionResult) -> u64 {
    result.d_count.abs_diff(result.r_count) + 1
}

/// The votes needed to flip all the given states and districts.
pub fn minimum_votes_to_change_result(
    data: &ElectionData,
    year: u32,
    codes: &[String],
) -> DataResult<u64> {
    let year_results = year_data(data, year)?;
    let mut total = 0u64;
    for code in codes {
        let result = year_results
            .result_for_code(code)
            .context(UnknownStateSnafu {
                year,
                code: code.as_str(),
            })?;
        total = total.saturating_add(votes_to_change_winner(result));
    }
    Ok(total)
}
