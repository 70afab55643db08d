//! The smallest set of states (and districts) that would have changed the
//! winner of the electoral college.
//!
//! The winner keeps as many of their states as possible while staying under
//! the number of votes needed by the loser. This is a 0/1 knapsack: the
//! weight of a state is its electoral votes, its value is the number of
//! votes it would take to flip it. The states left out of the knapsack are
//! the cheapest ones to flip.

use std::collections::BTreeMap;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use snafu::prelude::*;

use crate::config::*;
use crate::{electoral_votes_for_state, total_d_and_r_electoral_votes, vote_table_for_year, year_data};

/// The states to flip so that the loser wins, and (for an even number of
/// electoral votes) so that the election is tied.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct MinVotesEntry {
    pub win: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tie: Option<Vec<String>>,
}

pub type MinVotesToChangeResult = BTreeMap<u32, MinVotesEntry>;

#[derive(Eq, PartialEq, Debug, Clone)]
struct KnapsackItem {
    weight: usize,
    value: u64,
}

#[derive(Eq, PartialEq, Debug)]
struct KnapsackSolution {
    // Sorted
    indices_to_include: Vec<usize>,
    value: u64,
}

fn solve_knapsack(items: &[KnapsackItem], max_weight: usize) -> KnapsackSolution {
    // best[i][w]: the best value using the first i items within weight w
    let mut best = vec![vec![0u64; max_weight + 1]; items.len() + 1];
    for (i, item) in items.iter().enumerate() {
        for w in 0..=max_weight {
            let without = best[i][w];
            best[i + 1][w] = if item.weight <= w {
                let with = best[i][w - item.weight].saturating_add(item.value);
                with.max(without)
            } else {
                without
            };
        }
    }
    let mut indices_to_include = Vec::new();
    let mut w = max_weight;
    for i in (0..items.len()).rev() {
        if best[i + 1][w] != best[i][w] {
            indices_to_include.push(i);
            w -= items[i].weight;
        }
    }
    indices_to_include.reverse();
    KnapsackSolution {
        indices_to_include,
        value: best[items.len()][max_weight],
    }
}

/// Everything the winner holds, as (item, code) pairs.
fn winner_holdings<'a>(
    table: &ElectoralVoteTable,
    year_results: &'a ElectionYearData,
    year: u32,
    winner: Party,
) -> DataResult<Vec<(KnapsackItem, &'a str)>> {
    let mut res = Vec::new();
    for (code, result) in year_results.state_results() {
        let districts = year_results.districts_of(code);
        if result.winner() == Some(winner) {
            let ev = electoral_votes_for_state(table, code, year)? as usize;
            // In split states, the statewide winner only gets the at-large votes.
            let weight = ev.checked_sub(districts.len()).context(
                InconsistentElectoralVotesSnafu {
                    year,
                    code: code.as_str(),
                },
            )?;
            res.push((
                KnapsackItem {
                    weight,
                    value: crate::votes_to_change_winner(result),
                },
                code.as_str(),
            ));
        }
        for district in districts.iter().filter(|d| d.winner() == Some(winner)) {
            res.push((
                KnapsackItem {
                    weight: 1,
                    value: crate::votes_to_change_winner(district),
                },
                district.state_code.as_str(),
            ));
        }
    }
    Ok(res)
}

/// `capacity` is the number of votes the winner may keep in the holdings
/// while losing.
fn states_to_flip(holdings: &[(KnapsackItem, &str)], capacity: usize) -> Vec<String> {
    let items: Vec<KnapsackItem> = holdings.iter().map(|(i, _)| i.clone()).collect();
    let solution = solve_knapsack(&items, capacity);
    debug!(
        "states_to_flip: keeping {:?} votes out of reach ({} items)",
        solution.value,
        solution.indices_to_include.len()
    );
    holdings
        .iter()
        .enumerate()
        .filter(|(idx, _)| solution.indices_to_include.binary_search(idx).is_err())
        .map(|(_, (_, code))| code.to_string())
        .collect()
}

/// The cheapest flips for one year.
pub fn min_votes_for_year(
    table: &ElectoralVoteTable,
    data: &ElectionData,
    year: u32,
) -> DataResult<MinVotesEntry> {
    let year_results = year_data(data, year)?;
    let totals = total_d_and_r_electoral_votes(table, data, year)?;
    let winner = totals
        .winner()
        .context(ElectoralTieSnafu { year, votes: totals.d })?;
    let total: u32 = vote_table_for_year(table, year)?.values().sum();
    let total = total as usize;
    let holdings = winner_holdings(table, year_results, year, winner)?;
    // Votes of the winner that no item accounts for (the historical splits).
    let held: usize = holdings.iter().map(|(i, _)| i.weight).sum();
    let fixed = totals.votes_for(winner) as i64 - held as i64;
    let capacity = |needed: usize| (total as i64 - needed as i64 - fixed).max(0) as usize;

    let entry = if total % 2 == 1 {
        MinVotesEntry {
            win: states_to_flip(&holdings, capacity((total - 1) / 2 + 1)),
            tie: None,
        }
    } else {
        MinVotesEntry {
            win: states_to_flip(&holdings, capacity(total / 2 + 1)),
            tie: Some(states_to_flip(&holdings, capacity(total / 2))),
        }
    };
    info!("min_votes_for_year: {}: {} wins, flip {:?}", year, winner, entry.win);
    Ok(entry)
}

pub fn min_votes_for_all_years(
    table: &ElectoralVoteTable,
    data: &ElectionData,
) -> DataResult<MinVotesToChangeResult> {
    let mut res = MinVotesToChangeResult::new();
    for year in data.keys() {
        res.insert(*year, min_votes_for_year(table, data, *year)?);
    }
    Ok(res)
}
