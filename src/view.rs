//! What the map shows: the year, the selected state and the display options.
//!
//! The view only changes through [update]. It can be saved to and restored
//! from a fragment such as `year=2000&state=FL&cartogram=1&actualResults=1`.

use std::collections::HashMap;

use election_data::StateInfos;
use log::debug;

/// The election years that can be shown.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct YearRange {
    pub min: u32,
    pub max: u32,
    pub step: u32,
}

impl YearRange {
    pub fn contains(&self, year: u32) -> bool {
        self.step > 0 && year >= self.min && year <= self.max && (year - self.min) % self.step == 0
    }

    /// The election before the given year, if it is in the range.
    pub fn previous(&self, year: u32) -> Option<u32> {
        year.checked_sub(self.step).filter(|y| self.contains(*y))
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ViewState {
    pub year: u32,
    pub selected_state: Option<String>,
    /// Actual results, as opposed to results relative to the popular vote.
    pub raw_results: bool,
    pub is_cartogram: bool,
}

impl ViewState {
    /// The latest year, no selection, actual results on a cartogram.
    pub fn new(range: &YearRange) -> ViewState {
        ViewState {
            year: range.max,
            selected_state: None,
            raw_results: true,
            is_cartogram: true,
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Action {
    SelectYear(u32),
    SelectState(String),
    ClearState,
    SetRawResults(bool),
    SetCartogram(bool),
}

pub fn update(state: ViewState, action: Action) -> ViewState {
    debug!("update: {:?}", action);
    match action {
        // The selection does not carry over to another year.
        Action::SelectYear(year) => ViewState {
            year,
            selected_state: None,
            ..state
        },
        Action::SelectState(code) => ViewState {
            selected_state: Some(code),
            ..state
        },
        Action::ClearState => ViewState {
            selected_state: None,
            ..state
        },
        Action::SetRawResults(raw_results) => ViewState {
            raw_results,
            ..state
        },
        Action::SetCartogram(is_cartogram) => ViewState {
            is_cartogram,
            ..state
        },
    }
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.parse::<i64>() {
        Ok(1) => Some(true),
        Ok(0) => Some(false),
        _ => None,
    }
}

/// Applies the valid parts of a fragment on top of a view. Unknown keys,
/// years outside of the range and unknown states are ignored.
pub fn apply_fragment(
    state: ViewState,
    fragment: &str,
    states: &StateInfos,
    range: &YearRange,
) -> ViewState {
    let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
    let parts: HashMap<&str, &str> = fragment
        .split('&')
        .filter_map(|p| p.split_once('='))
        .collect();

    let mut res = state;
    if let Some(year) = parts.get("year").and_then(|s| s.parse::<u32>().ok()) {
        if range.contains(year) {
            res = update(res, Action::SelectYear(year));
        } else {
            debug!("apply_fragment: ignoring year {}", year);
        }
    }
    if let Some(code) = parts.get("state") {
        if states.contains(code) {
            res = update(res, Action::SelectState(code.to_string()));
        } else {
            debug!("apply_fragment: ignoring state {:?}", code);
        }
    }
    if let Some(flag) = parts.get("cartogram").and_then(|s| parse_flag(s)) {
        res = update(res, Action::SetCartogram(flag));
    }
    if let Some(flag) = parts.get("actualResults").and_then(|s| parse_flag(s)) {
        res = update(res, Action::SetRawResults(flag));
    }
    res
}

pub fn parse_fragment(fragment: &str, states: &StateInfos, range: &YearRange) -> ViewState {
    apply_fragment(ViewState::new(range), fragment, states, range)
}

/// The fragment for a view. The year is left out when it is the latest one.
pub fn to_fragment(state: &ViewState, range: &YearRange) -> String {
    let mut parts: Vec<String> = Vec::new();
    if state.year != range.max {
        parts.push(format!("year={}", state.year));
    }
    if let Some(code) = &state.selected_state {
        parts.push(format!("state={}", code));
    }
    parts.push(format!("cartogram={}", state.is_cartogram as u8));
    parts.push(format!("actualResults={}", state.raw_results as u8));
    parts.join("&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use election_data::StateIdentity;

    const RANGE: YearRange = YearRange {
        min: 1972,
        max: 2020,
        step: 4,
    };

    fn states() -> StateInfos {
        StateInfos::new(vec![
            StateIdentity {
                code: "FL".to_string(),
                id: 12,
                name: "Florida".to_string(),
            },
            StateIdentity {
                code: "OH".to_string(),
                id: 39,
                name: "Ohio".to_string(),
            },
        ])
        .unwrap()
    }

    #[test]
    fn selecting_a_year_clears_the_state() {
        let s = ViewState::new(&RANGE);
        let s = update(s, Action::SelectState("OH".to_string()));
        assert_eq!(s.selected_state.as_deref(), Some("OH"));
        let s = update(s, Action::SetRawResults(false));
        let s = update(s, Action::SelectYear(2000));
        assert_eq!(s.year, 2000);
        assert_eq!(s.selected_state, None);
        assert!(!s.raw_results);
        let s = update(s, Action::SelectState("FL".to_string()));
        let s = update(s, Action::ClearState);
        assert_eq!(s.selected_state, None);
    }

    #[test]
    fn parse_valid_fragment() {
        let s = parse_fragment("#year=2000&state=FL&cartogram=0&actualResults=0", &states(), &RANGE);
        assert_eq!(
            s,
            ViewState {
                year: 2000,
                selected_state: Some("FL".to_string()),
                raw_results: false,
                is_cartogram: false,
            }
        );
        // The state is kept even if it comes before the year.
        let s = parse_fragment("state=OH&year=1976", &states(), &RANGE);
        assert_eq!(s.year, 1976);
        assert_eq!(s.selected_state.as_deref(), Some("OH"));
    }

    #[test]
    fn invalid_parts_are_ignored() {
        let default = ViewState::new(&RANGE);
        for fragment in [
            "",
            "#",
            "year=2001",
            "year=1968",
            "year=2024",
            "year=abc",
            "state=PR",
            "cartogram=2",
            "actualResults=yes",
            "zoom=3&year",
        ] {
            assert_eq!(parse_fragment(fragment, &states(), &RANGE), default, "{}", fragment);
        }
        let s = parse_fragment("year=2001&state=FL", &states(), &RANGE);
        assert_eq!(s.year, 2020);
        assert_eq!(s.selected_state.as_deref(), Some("FL"));
    }

    #[test]
    fn fragments() {
        let s = ViewState::new(&RANGE);
        assert_eq!(to_fragment(&s, &RANGE), "cartogram=1&actualResults=1");
        let s = update(s, Action::SelectYear(2000));
        let s = update(s, Action::SelectState("FL".to_string()));
        let s = update(s, Action::SetCartogram(false));
        let fragment = to_fragment(&s, &RANGE);
        assert_eq!(fragment, "year=2000&state=FL&cartogram=0&actualResults=1");
        assert_eq!(parse_fragment(&fragment, &states(), &RANGE), s);
    }

    #[test]
    fn ranges() {
        assert!(RANGE.contains(1972));
        assert!(RANGE.contains(2020));
        assert!(!RANGE.contains(2022));
        assert_eq!(RANGE.previous(2000), Some(1996));
        assert_eq!(RANGE.previous(1972), None);
    }
}
