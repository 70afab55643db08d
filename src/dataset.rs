use log::{debug, info, warn};

use election_data::display::*;
use election_data::min_votes::*;
use election_data::*;
use rayon::prelude::*;
use snafu::{prelude::*, Snafu};

use std::path::Path;

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::dataset::config_reader::*;
use crate::dataset::io_common::format_count;
use crate::dataset::io_csv::*;
use crate::dataset::io_json::*;
use crate::view::*;

pub mod config_reader;
pub mod io_common;
pub mod io_csv;
pub mod io_json;

#[derive(Debug, Snafu)]
pub enum AppError {
    #[snafu(display("Error opening file {path}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing file {path}"))]
    WritingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("{path}: could not parse line {lineno}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("{path}: line {lineno} is too short"))]
    CsvLineTooShort { path: String, lineno: usize },
    #[snafu(display("{path}: no column matching {column:?}"))]
    MissingColumn { path: String, column: String },
    #[snafu(display("{path}: line {lineno}: {content:?} is not a number"))]
    ParsingNumber {
        path: String,
        lineno: usize,
        content: String,
    },
    #[snafu(display("{path}: unknown state {code:?}"))]
    UnknownCode { path: String, code: String },
    #[snafu(display("{path}: {code} is listed more than once"))]
    DuplicateEntry { path: String, code: String },
    #[snafu(display("{path}: no electoral votes for {code}"))]
    IncompleteElectoralVotes { path: String, code: String },
    #[snafu(display("No electoral vote files in {path}"))]
    NoElectoralVotes { path: String },
    #[snafu(display("Error parsing JSON file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error writing JSON"))]
    WritingJson { source: serde_json::Error },
    #[snafu(display("{path} has no parent directory"))]
    MissingParentDir { path: String },
    #[snafu(display("Invalid years: {min_year} to {max_year} every {step} years"))]
    InvalidYearRange {
        min_year: u32,
        max_year: u32,
        step: u32,
    },
    #[snafu(display("Year {year} is not loaded"))]
    YearNotLoaded { year: u32 },
    #[snafu(display("Unknown state {code:?}"))]
    UnknownStateCode { code: String },
    #[snafu(display("Invalid data in {path}"))]
    Data { source: DataError, path: String },
    #[snafu(display("Error aggregating the results"))]
    Aggregation { source: DataError },

    #[snafu(whatever, display("{message}"))]
    Whatever { message: String },
}

pub type AppResult<T> = Result<T, AppError>;

/// Everything read from the data directory.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub config: DataConfig,
    pub states: StateInfos,
    pub election_data: ElectionData,
    pub electoral_votes: ElectoralVoteTable,
    /// Precomputed flips, if the data directory has them.
    pub min_votes: Option<MinVotesToChangeResult>,
}

/// Loads all the years and apportionments. The state names are read
/// first, then all the other files are read in parallel. The first error
/// aborts the load.
pub fn load_dataset(config: &DataConfig) -> AppResult<Dataset> {
    let years = config.years()?;
    info!("load_dataset: years {:?} from {}", years, config.data_directory);
    let names_path = config.state_names_path();
    let states = StateInfos::new(read_state_names(&names_path)?).context(DataSnafu {
        path: names_path.display().to_string(),
    })?;
    debug!("load_dataset: {} states", states.len());

    let (election_data_r, electoral_votes_r) = rayon::join(
        || -> AppResult<ElectionData> {
            years
                .par_iter()
                .map(|year| -> AppResult<(u32, ElectionYearData)> {
                    let path = config.election_results_path(*year);
                    let data = read_election_results(&path, *year, &states, config.validation)?;
                    Ok((*year, data))
                })
                .collect()
        },
        || read_electoral_vote_table(&config.electoral_votes_dir(), &states),
    );
    let election_data = election_data_r?;
    let electoral_votes = electoral_votes_r?;

    // Every year needs an apportionment.
    for year in election_data.keys() {
        vote_table_for_year(&electoral_votes, *year).context(AggregationSnafu)?;
    }

    let min_votes_path = config.min_votes_path();
    let min_votes = if min_votes_path.exists() {
        Some(read_min_votes(&min_votes_path)?)
    } else {
        debug!("load_dataset: no file {}", min_votes_path.display());
        None
    };

    Ok(Dataset {
        config: config.clone(),
        states,
        election_data,
        electoral_votes,
        min_votes,
    })
}

/// `Nebraska` for `NE`, `Nebraska district 2` for `NE2`.
fn display_name(states: &StateInfos, code: &str) -> String {
    match code.get(..2) {
        Some(state_code) if code.len() > 2 => {
            format!("{} district {}", states.name_of(state_code), &code[2..])
        }
        _ => states.name_of(code).to_string(),
    }
}

fn advantage_text(result: &StateElectionResult, baseline: f64) -> String {
    text_from_d_advantage(d_advantage_from_votes(result, baseline))
}

/// One line per year: the popular vote and the electoral votes.
pub fn validation_lines(ds: &Dataset) -> AppResult<Vec<String>> {
    let mut lines = vec![format!(
        "Loaded {} states, {} years, {} electoral vote tables",
        ds.states.len(),
        ds.election_data.len(),
        ds.electoral_votes.entries().len()
    )];
    for (year, year_results) in ds.election_data.iter() {
        let totals = total_d_and_r_electoral_votes(&ds.electoral_votes, &ds.election_data, *year)
            .context(AggregationSnafu)?;
        let table_total: u32 = vote_table_for_year(&ds.electoral_votes, *year)
            .context(AggregationSnafu)?
            .values()
            .sum();
        if totals.d + totals.r != table_total {
            warn!(
                "validation_lines: {}: {} electoral votes assigned out of {}",
                year,
                totals.d + totals.r,
                table_total
            );
        }
        lines.push(format!(
            "{}: Popular vote: {} {}",
            year,
            text_from_d_advantage(year_results.national_d_advantage()),
            electoral_vote_text(&totals)
        ));
    }
    Ok(lines)
}

/// The states to flip for the loser to win: the precomputed list if there
/// is one, computed otherwise.
fn min_votes_codes(ds: &Dataset, year: u32) -> AppResult<Vec<String>> {
    if let Some(entry) = ds.min_votes.as_ref().and_then(|m| m.get(&year)) {
        return Ok(entry.win.clone());
    }
    let entry = min_votes_for_year(&ds.electoral_votes, &ds.election_data, year)
        .context(AggregationSnafu)?;
    Ok(entry.win)
}

/// The national picture of the year of the view, or the history of the
/// selected state.
pub fn summary_lines(ds: &Dataset, view: &ViewState) -> AppResult<Vec<String>> {
    let year = view.year;
    let year_results = year_data(&ds.election_data, year)
        .ok()
        .context(YearNotLoadedSnafu { year })?;
    let national = year_results.national_d_advantage();
    let mut lines = vec![format!(
        "Year {} Popular vote: {}",
        year,
        text_from_d_advantage(national)
    )];

    if let Some(code) = &view.selected_state {
        lines.extend(state_lines(ds, code, !view.raw_results)?);
        lines.push(format!("View: {}", to_fragment(view, &ds.config.year_range())));
        return Ok(lines);
    }

    let totals = total_d_and_r_electoral_votes(&ds.electoral_votes, &ds.election_data, year)
        .context(AggregationSnafu)?;
    lines.push(electoral_vote_text(&totals));
    match totals.winner() {
        Some(winner) => {
            let tipping_point = tipping_point_state(&ds.electoral_votes, &ds.election_data, year)
                .context(AggregationSnafu)?;
            lines.push(format!(
                "Tipping point state: {} {}",
                display_name(&ds.states, &tipping_point.state_code),
                advantage_text(tipping_point, 0.0)
            ));
            let closest =
                closest_state_by_percentage(&ds.election_data, year).context(AggregationSnafu)?;
            lines.push(format!(
                "Closest state (by percentage): {} {}",
                display_name(&ds.states, &closest.state_code),
                advantage_text(closest, 0.0)
            ));

            let loser = winner.other();
            let mut codes = min_votes_codes(ds, year)?;
            codes.sort();
            let min_votes = minimum_votes_to_change_result(&ds.election_data, year, &codes)
                .context(AggregationSnafu)?;
            lines.push(format!(
                "Minimum number of additional {} votes so {} would have won: {}",
                loser,
                loser,
                format_count(min_votes)
            ));
            for code in codes.iter() {
                let result = year_results
                    .result_for_code(code)
                    .context(UnknownStateCodeSnafu { code: code.as_str() })?;
                let ev = electoral_votes_for_state(&ds.electoral_votes, code, year)
                    .context(AggregationSnafu)?;
                lines.push(format!(
                    "  {}: {} votes ({} EV)",
                    display_name(&ds.states, code),
                    format_count(votes_to_change_winner(result)),
                    ev
                ));
            }
        }
        None => lines.push("Electoral tie".to_string()),
    }

    let baseline = if view.raw_results { 0.0 } else { national };
    lines.push(if view.raw_results {
        "States, most Democratic first:".to_string()
    } else {
        "States relative to the popular vote, most Democratic first:".to_string()
    });
    for result in state_results_sorted(&ds.election_data, year, SortOrder::ByPercentage)
        .context(AggregationSnafu)?
    {
        let adv = d_advantage_from_votes(result, baseline);
        lines.push(format!(
            "  {} {} {}",
            result.state_code,
            text_from_d_advantage(adv),
            color_from_d_advantage(adv)
        ));
    }

    let range = ds.config.year_range();
    if let Some(previous) = range.previous(year) {
        if ds.election_data.contains_key(&previous) {
            lines.push(format!("Shift from {}:", previous));
            for shift in state_shifts(&ds.election_data, year, previous, !view.raw_results)
                .context(AggregationSnafu)?
            {
                lines.push(format!(
                    "  {} {}",
                    shift.code,
                    text_from_d_advantage(shift.shift)
                ));
            }
        }
    }
    lines.push(format!("View: {}", to_fragment(view, &range)));
    Ok(lines)
}

/// The advantage of one state for every loaded year.
pub fn state_lines(ds: &Dataset, code: &str, relative: bool) -> AppResult<Vec<String>> {
    let code = code.to_uppercase();
    ensure!(
        ds.states.contains(&code),
        UnknownStateCodeSnafu { code: code.as_str() }
    );
    let history = state_history(&ds.election_data, &code, relative).context(AggregationSnafu)?;
    let mut lines = vec![format!(
        "{} ({}){}",
        display_name(&ds.states, &code),
        code,
        if relative {
            ", relative to the popular vote"
        } else {
            ""
        }
    )];
    for (year, adv) in history.points.iter() {
        lines.push(format!(
            "  {} {} {}",
            year,
            text_from_d_advantage(*adv),
            color_from_d_advantage(*adv)
        ));
    }
    lines.push(format!(
        "Range: {} to {}",
        text_from_d_advantage(history.min),
        text_from_d_advantage(history.max)
    ));
    Ok(lines)
}

/// The aggregated results of every year, in JSON format.
pub fn export_js(ds: &Dataset) -> AppResult<JSValue> {
    let mut years: JSMap<String, JSValue> = JSMap::new();
    for (year, year_results) in ds.election_data.iter() {
        let totals = total_d_and_r_electoral_votes(&ds.electoral_votes, &ds.election_data, *year)
            .context(AggregationSnafu)?;
        let tipping_point = match totals.winner() {
            Some(_) => Some(
                tipping_point_state(&ds.electoral_votes, &ds.election_data, *year)
                    .context(AggregationSnafu)?
                    .state_code
                    .clone(),
            ),
            None => None,
        };
        let closest =
            closest_state_by_percentage(&ds.election_data, *year).context(AggregationSnafu)?;
        years.insert(
            year.to_string(),
            json!({
                "results": year_results,
                "electoralVotes": totals,
                "tippingPointState": tipping_point,
                "closestState": closest.state_code,
            }),
        );
    }
    let states: Vec<&StateIdentity> = ds.states.iter().collect();
    Ok(json!({
        "states": states,
        "electoralVoteTables": ds.electoral_votes,
        "years": years,
    }))
}

fn print_lines(lines: &[String]) {
    for l in lines {
        println!("{}", l);
    }
}

pub fn run_validate(ds: &Dataset) -> AppResult<()> {
    print_lines(&validation_lines(ds)?);
    Ok(())
}

pub fn run_summary(
    ds: &Dataset,
    year: Option<u32>,
    relative: bool,
    fragment: Option<String>,
) -> AppResult<()> {
    let range = ds.config.year_range();
    let mut view = match fragment {
        Some(f) => parse_fragment(&f, &ds.states, &range),
        None => ViewState::new(&range),
    };
    if let Some(y) = year {
        ensure!(range.contains(y), YearNotLoadedSnafu { year: y });
        view = update(view, Action::SelectYear(y));
    }
    if relative {
        view = update(view, Action::SetRawResults(false));
    }
    debug!("run_summary: view {:?}", view);
    print_lines(&summary_lines(ds, &view)?);
    Ok(())
}

pub fn run_state(ds: &Dataset, code: &str, relative: bool) -> AppResult<()> {
    print_lines(&state_lines(ds, code, relative)?);
    Ok(())
}

/// Computes the flips for every year. If a reference file is given, the
/// output must match it.
pub fn run_min_votes(
    ds: &Dataset,
    out: Option<String>,
    check_reference_path: Option<String>,
) -> AppResult<()> {
    let res = min_votes_for_all_years(&ds.electoral_votes, &ds.election_data)
        .context(AggregationSnafu)?;
    let pretty_js = serde_json::to_string_pretty(&res).context(WritingJsonSnafu)?;
    write_output(&pretty_js, out.as_deref())?;

    // The reference, if provided for comparison
    if let Some(reference_p) = check_reference_path {
        let reference = read_min_votes(Path::new(&reference_p))?;
        let pretty_js_ref = serde_json::to_string_pretty(&reference).context(WritingJsonSnafu)?;
        if pretty_js_ref != pretty_js {
            warn!("Found differences with the reference {}", reference_p);
            print_diff(pretty_js_ref.as_str(), pretty_js.as_str(), "\n");
            whatever!("Difference detected between the computed flips and {}", reference_p)
        }
        info!("run_min_votes: output matches {}", reference_p);
    }
    Ok(())
}

pub fn run_export(ds: &Dataset, out: Option<String>) -> AppResult<()> {
    let js = export_js(ds)?;
    let pretty_js = serde_json::to_string_pretty(&js).context(WritingJsonSnafu)?;
    write_output(&pretty_js, out.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> DataConfig {
        let path = format!("{}/tests/data/config.json", env!("CARGO_MANIFEST_DIR"));
        read_config(&path).unwrap()
    }

    fn test_dataset() -> Dataset {
        let _ = env_logger::builder().is_test(true).try_init();
        load_dataset(&test_config()).unwrap()
    }

    #[test]
    fn loads_everything() {
        let ds = test_dataset();
        assert_eq!(ds.states.len(), 51);
        assert_eq!(ds.election_data.keys().copied().collect::<Vec<_>>(), vec![2000, 2016]);
        assert_eq!(ds.electoral_votes.entries().len(), 5);
        assert_eq!(ds.min_votes.as_ref().map(|m| m.len()), Some(2));
        for (year, _) in ds.electoral_votes.entries() {
            let total: u32 = vote_table_for_year(&ds.electoral_votes, *year)
                .unwrap()
                .values()
                .sum();
            assert_eq!(total, 538);
        }
    }

    #[test]
    fn texas_electoral_votes() {
        let ds = test_dataset();
        for (year, ev) in [
            (1972, 26),
            (1980, 26),
            (1984, 29),
            (1988, 29),
            (1992, 32),
            (2000, 32),
            (2004, 34),
            (2008, 34),
            (2012, 38),
            (2020, 38),
        ] {
            assert_eq!(
                electoral_votes_for_state(&ds.electoral_votes, "TX", year).unwrap(),
                ev,
                "{}",
                year
            );
        }
        assert!(electoral_votes_for_state(&ds.electoral_votes, "TX", 1968).is_err());
    }

    #[test]
    fn election_2000() {
        let ds = test_dataset();
        let totals =
            total_d_and_r_electoral_votes(&ds.electoral_votes, &ds.election_data, 2000).unwrap();
        assert_eq!(totals, ElectoralTotals { d: 267, r: 271 });
        let tp = tipping_point_state(&ds.electoral_votes, &ds.election_data, 2000).unwrap();
        assert_eq!(tp.state_code, "FL");
        assert_eq!(tp.winner(), totals.winner());
        let closest = closest_state_by_percentage(&ds.election_data, 2000).unwrap();
        assert_eq!(closest.state_code, "FL");
        assert_eq!(votes_to_change_winner(closest), 538);

        let sorted = state_results_sorted(&ds.election_data, 2000, SortOrder::ByPercentage).unwrap();
        assert_eq!(sorted.len(), 51);
        assert_eq!(sorted[0].state_code, "DC");
        for pair in sorted.windows(2) {
            assert!(pair[0].margin_fraction() > pair[1].margin_fraction());
        }
    }

    #[test]
    fn election_2016() {
        let ds = test_dataset();
        let national = ds.election_data[&2016].national_d_advantage();
        assert!((national - 2.1).abs() < 0.01, "{}", national);
        // Maine's second district is not in the file.
        let totals =
            total_d_and_r_electoral_votes(&ds.electoral_votes, &ds.election_data, 2016).unwrap();
        assert_eq!(totals, ElectoralTotals { d: 232, r: 306 });
        // R holds ME-2 before the walk, so WI brings it to exactly 270.
        let tp = tipping_point_state(&ds.electoral_votes, &ds.election_data, 2016).unwrap();
        assert_eq!(tp.state_code, "WI");
        assert_eq!(tp.winner(), totals.winner());
        let closest = closest_state_by_percentage(&ds.election_data, 2016).unwrap();
        assert_eq!(closest.state_code, "MI");
    }

    #[test]
    fn min_votes_match_the_reference() {
        let ds = test_dataset();
        let reference = format!(
            "{}/tests/data/min_votes_to_change_result.json",
            env!("CARGO_MANIFEST_DIR")
        );
        let out = std::env::temp_dir().join("electionmap_min_votes_test.json");
        run_min_votes(
            &ds,
            Some(out.display().to_string()),
            Some(reference.clone()),
        )
        .unwrap();
        let written = read_min_votes(&out).unwrap();
        assert_eq!(Some(&written), ds.min_votes.as_ref());
        assert_eq!(
            written[&2016].win,
            vec!["MI".to_string(), "PA".to_string(), "WI".to_string()]
        );
    }

    #[test]
    fn summary() {
        let ds = test_dataset();
        let range = ds.config.year_range();
        let view = update(ViewState::new(&range), Action::SelectYear(2000));
        let lines = summary_lines(&ds, &view).unwrap();
        assert_eq!(lines[0], "Year 2000 Popular vote: D+0.4");
        assert_eq!(lines[1], "Electoral votes: R 271 - D 267");
        assert_eq!(lines[2], "Tipping point state: Florida R+0.0");
        assert_eq!(lines[3], "Closest state (by percentage): Florida R+0.0");
        assert_eq!(
            lines[4],
            "Minimum number of additional D votes so D would have won: 538"
        );
        assert_eq!(lines[5], "  Florida: 538 votes (25 EV)");
        assert_eq!(lines[7], "  DC D+76.2 #2166ac");
        // 2000 is the first loaded year: no shifts.
        assert!(!lines.iter().any(|l| l.starts_with("Shift")));
        assert_eq!(
            lines.last().unwrap(),
            "View: year=2000&cartogram=1&actualResults=1"
        );

        let lines = summary_lines(&ds, &ViewState::new(&range)).unwrap();
        assert!(lines.contains(&"Shift from 2000:".to_string()));
        assert!(lines.contains(&"Electoral votes: R 306 - D 232".to_string()));
    }

    #[test]
    fn summary_of_a_selected_state() {
        let ds = test_dataset();
        let range = ds.config.year_range();
        let view = parse_fragment("state=OH&actualResults=0", &ds.states, &range);
        let lines = summary_lines(&ds, &view).unwrap();
        assert_eq!(lines[0], "Year 2016 Popular vote: D+2.1");
        assert_eq!(lines[1], "Ohio (OH), relative to the popular vote");
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn unknown_years_and_states() {
        let ds = test_dataset();
        let view = ViewState {
            year: 2008,
            selected_state: None,
            raw_results: true,
            is_cartogram: true,
        };
        assert!(matches!(
            summary_lines(&ds, &view),
            Err(AppError::YearNotLoaded { year: 2008 })
        ));
        assert!(matches!(
            state_lines(&ds, "PR", false),
            Err(AppError::UnknownStateCode { .. })
        ));
        let lines = state_lines(&ds, "oh", false).unwrap();
        assert_eq!(lines[0], "Ohio (OH)");
    }

    #[test]
    fn export() {
        let ds = test_dataset();
        let js = export_js(&ds).unwrap();
        assert_eq!(js["states"].as_array().map(|a| a.len()), Some(51));
        assert_eq!(js["years"]["2000"]["tippingPointState"], json!("FL"));
        assert_eq!(js["years"]["2016"]["electoralVotes"]["dElectoralVotes"], json!(232));
    }

    #[test]
    fn missing_files() {
        let config = DataConfig {
            data_directory: "/nonexistent".to_string(),
            ..test_config()
        };
        assert!(matches!(
            load_dataset(&config),
            Err(AppError::CsvOpen { .. })
        ));
        let config = DataConfig {
            max_year: 2020,
            year_step: 4,
            ..test_config()
        };
        assert!(matches!(load_dataset(&config), Err(AppError::CsvOpen { .. })));
    }

    #[test]
    fn display_names() {
        let ds = test_dataset();
        assert_eq!(display_name(&ds.states, "NE2"), "Nebraska district 2");
        assert_eq!(display_name(&ds.states, "ME"), "Maine");
    }
}
