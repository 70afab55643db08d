pub use crate::config::*;

use log::debug;
use snafu::prelude::*;
use std::collections::BTreeMap;

/// A builder for assembling the results of one election year.
///
/// Rows are checked as they are added. The state count and the districts
/// are checked when building.
///
/// ```
/// use election_data::builder::YearBuilder;
/// use election_data::{StateIdentity, StateInfos, ValidationMode};
///
/// let states = StateInfos::new(vec![StateIdentity {
///     code: "VT".to_string(),
///     id: 50,
///     name: "Vermont".to_string(),
/// }])?;
/// let mut builder = YearBuilder::new(2016, &states, ValidationMode::Strict);
/// builder.add_row("VT", 178_573, 95_369, 315_067)?;
/// // A single state is not a complete year.
/// assert!(builder.build().is_err());
///
/// # Ok::<(), election_data::DataError>(())
/// ```
pub struct YearBuilder<'a> {
    year: u32,
    states: &'a StateInfos,
    validation: ValidationMode,
    state_results: BTreeMap<String, StateElectionResult>,
    // state code -> district number -> result
    district_results: BTreeMap<String, BTreeMap<usize, StateElectionResult>>,
}

impl<'a> YearBuilder<'a> {
    pub fn new(year: u32, states: &'a StateInfos, validation: ValidationMode) -> YearBuilder<'a> {
        YearBuilder {
            year,
            states,
            validation,
            state_results: BTreeMap::new(),
            district_results: BTreeMap::new(),
        }
    }

    pub fn add_row(
        &mut self,
        code: &str,
        d_count: u64,
        r_count: u64,
        total_count: u64,
    ) -> DataResult<()> {
        self.add_result(StateElectionResult::new(code, d_count, r_count, total_count))
    }

    /// Adds the result of a state or of a congressional district.
    pub fn add_result(&mut self, result: StateElectionResult) -> DataResult<()> {
        let year = self.year;
        let code = result.state_code.clone();
        let state_code = code.get(..2).unwrap_or(code.as_str()).to_string();
        ensure!(
            self.states.contains(&state_code),
            UnknownStateSnafu { year, code }
        );
        check_integrity(year, &result)?;
        match self.validation {
            ValidationMode::Strict => check_plausibility(year, &result)?,
            ValidationMode::Skip => {
                if let Err(e) = check_plausibility(year, &result) {
                    debug!("add_result: ignoring failed check: {}", e);
                }
            }
        }

        if result.is_district() {
            let index: usize = code[2..]
                .parse()
                .ok()
                .filter(|i| *i >= 1)
                .context(BadDistrictSnafu {
                    year,
                    code: code.clone(),
                })?;
            let districts = self
                .district_results
                .entry(state_code)
                .or_default();
            ensure!(
                !districts.contains_key(&index),
                DuplicateResultSnafu { year, code }
            );
            districts.insert(index, result);
        } else {
            ensure!(
                !self.state_results.contains_key(&code),
                DuplicateResultSnafu { year, code }
            );
            self.state_results.insert(code, result);
        }
        Ok(())
    }

    pub fn build(self) -> DataResult<ElectionYearData> {
        let year = self.year;
        ensure!(
            self.state_results.len() == STATE_COUNT,
            WrongStateCountSnafu {
                year,
                expected: STATE_COUNT,
                found: self.state_results.len(),
            }
        );

        let mut district_results: BTreeMap<String, Vec<StateElectionResult>> = BTreeMap::new();
        for (state_code, districts) in self.district_results {
            // District numbers must be 1..=n without gaps.
            for (pos, (idx, d)) in districts.iter().enumerate() {
                ensure!(
                    *idx == pos + 1,
                    BadDistrictSnafu {
                        year,
                        code: d.state_code.as_str(),
                    }
                );
            }
            let districts: Vec<StateElectionResult> = districts.into_values().collect();
            // The state rows are all present at this point.
            let parent = self
                .state_results
                .get(&state_code)
                .context(UnknownStateSnafu {
                    year,
                    code: state_code.clone(),
                })?;
            if self.validation == ValidationMode::Strict {
                check_districts(year, parent, &districts)?;
            }
            district_results.insert(state_code, districts);
        }

        let res = ElectionYearData::new(self.state_results, district_results);
        debug!(
            "build: {}: national D advantage {:.3}",
            year,
            res.national_d_advantage()
        );
        Ok(res)
    }
}

/// Checks that are applied regardless of the validation mode.
///
/// The total bounds the two party counts, so that margins fit in an `i64`.
fn check_integrity(year: u32, r: &StateElectionResult) -> DataResult<()> {
    let code = r.state_code.as_str();
    ensure!(r.total_count > 0, EmptyTotalSnafu { year, code });
    ensure!(
        r.total_count <= MAX_VOTE_COUNT,
        CountTooLargeSnafu { year, code }
    );
    ensure!(
        (r.d_count as u128 + r.r_count as u128) <= (r.total_count as u128),
        TotalTooLowSnafu { year, code }
    );
    Ok(())
}

/// Sanity bounds on the vote counts. DC is allowed a much larger D lead.
pub fn check_plausibility(year: u32, r: &StateElectionResult) -> DataResult<()> {
    let code = r.state_code.as_str();
    let (d, rep, total) = (r.d_count as u128, r.r_count as u128, r.total_count as u128);
    ensure!(
        (d + rep) * 2 >= total,
        TooManyThirdPartySnafu { year, code }
    );
    if d > 10 * rep && !(code == "DC" && d < 30 * rep) {
        return ImplausibleRatioSnafu {
            year,
            code,
            party: Party::Democratic,
        }
        .fail();
    }
    ensure!(
        rep <= 10 * d,
        ImplausibleRatioSnafu {
            year,
            code,
            party: Party::Republican,
        }
    );
    Ok(())
}

/// The districts must add up to the state, within 1%.
fn check_districts(
    year: u32,
    parent: &StateElectionResult,
    districts: &[StateElectionResult],
) -> DataResult<()> {
    let d: u128 = districts.iter().map(|x| x.d_count as u128).sum();
    let r: u128 = districts.iter().map(|x| x.r_count as u128).sum();
    let total: u128 = districts.iter().map(|x| x.total_count as u128).sum();
    let within = |sum: u128, expected: u64| {
        let expected = expected as u128;
        sum.abs_diff(expected) * 100 <= expected
    };
    ensure!(
        within(d, parent.d_count) && within(r, parent.r_count) && within(total, parent.total_count),
        DistrictMismatchSnafu {
            year,
            code: parent.state_code.as_str(),
        }
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_data::states;

    fn full_year(builder: &mut YearBuilder) {
        let codes: Vec<String> = builder.states.iter().map(|s| s.code.clone()).collect();
        for c in codes {
            if c != "ME" {
                builder.add_row(&c, 450, 500, 1000).unwrap();
            }
        }
    }

    #[test]
    fn complete_year() {
        let s = states();
        let mut b = YearBuilder::new(2000, &s, ValidationMode::Strict);
        full_year(&mut b);
        b.add_row("ME", 1_450, 500, 2000).unwrap();
        let y = b.build().unwrap();
        assert_eq!(y.state_results().len(), STATE_COUNT);
        // 50 * (450 - 500) + 950 over 52000 votes
        let expected = (-2500.0 + 950.0) * 100.0 / 52000.0;
        assert!((y.national_d_advantage() - expected).abs() < 1e-9);
    }

    #[test]
    fn missing_state_is_fatal() {
        let s = states();
        let mut b = YearBuilder::new(2000, &s, ValidationMode::Skip);
        full_year(&mut b);
        assert!(matches!(
            b.build(),
            Err(DataError::WrongStateCount {
                expected: 51,
                found: 50,
                ..
            })
        ));
    }

    #[test]
    fn unknown_state_is_fatal() {
        let s = states();
        let mut b = YearBuilder::new(2000, &s, ValidationMode::Skip);
        assert!(matches!(
            b.add_row("PR", 10, 10, 20),
            Err(DataError::UnknownState { .. })
        ));
        assert!(matches!(
            b.add_row("XX1", 10, 10, 20),
            Err(DataError::UnknownState { .. })
        ));
    }

    #[test]
    fn total_too_low_in_all_modes() {
        let s = states();
        for mode in [ValidationMode::Strict, ValidationMode::Skip] {
            let mut b = YearBuilder::new(2000, &s, mode);
            assert!(matches!(
                b.add_row("OH", 600, 500, 1000),
                Err(DataError::TotalTooLow { .. })
            ));
        }
    }

    #[test]
    fn huge_counts_are_rejected() {
        let s = states();
        for mode in [ValidationMode::Strict, ValidationMode::Skip] {
            let mut b = YearBuilder::new(2000, &s, mode);
            assert!(matches!(
                b.add_row("OH", u64::MAX, 2, 10),
                Err(DataError::TotalTooLow { .. })
            ));
            assert!(matches!(
                b.add_row("OH", u64::MAX, u64::MAX, u64::MAX),
                Err(DataError::CountTooLarge { .. })
            ));
            assert!(matches!(
                b.add_row("PA", 10, 20, MAX_VOTE_COUNT + 1),
                Err(DataError::CountTooLarge { .. })
            ));
        }
        let mut strict = YearBuilder::new(2000, &s, ValidationMode::Strict);
        assert!(matches!(
            strict.add_row("OH", MAX_VOTE_COUNT - 1, 1, MAX_VOTE_COUNT),
            Err(DataError::ImplausibleRatio {
                party: Party::Democratic,
                ..
            })
        ));
        let half = MAX_VOTE_COUNT / 2;
        strict.add_row("PA", half, half - 10, MAX_VOTE_COUNT).unwrap();
        let pa = strict.state_results.get("PA").unwrap();
        assert_eq!(pa.margin(), 10);
        assert_eq!(
            StateElectionResult::new("OH", u64::MAX, 0, u64::MAX).margin(),
            i64::MAX
        );
        assert_eq!(
            StateElectionResult::new("OH", 0, u64::MAX, u64::MAX).margin(),
            i64::MIN
        );
    }

    #[test]
    fn plausibility_depends_on_mode() {
        let s = states();
        let mut strict = YearBuilder::new(2000, &s, ValidationMode::Strict);
        assert!(matches!(
            strict.add_row("OH", 200, 200, 1000),
            Err(DataError::TooManyThirdParty { .. })
        ));
        assert!(matches!(
            strict.add_row("UT", 10, 101, 120),
            Err(DataError::ImplausibleRatio {
                party: Party::Republican,
                ..
            })
        ));
        let mut skip = YearBuilder::new(2000, &s, ValidationMode::Skip);
        skip.add_row("OH", 200, 200, 1000).unwrap();
        skip.add_row("UT", 10, 101, 120).unwrap();
    }

    #[test]
    fn dc_is_allowed_a_larger_lead() {
        let s = states();
        let mut b = YearBuilder::new(2000, &s, ValidationMode::Strict);
        b.add_row("DC", 200, 10, 215).unwrap();
        assert!(matches!(
            b.add_row("MA", 200, 10, 215),
            Err(DataError::ImplausibleRatio {
                party: Party::Democratic,
                ..
            })
        ));
        let mut b = YearBuilder::new(2004, &s, ValidationMode::Strict);
        assert!(b.add_row("DC", 300, 10, 315).is_err());
    }

    #[test]
    fn districts_are_ordered_and_checked() {
        let s = states();
        let mut b = YearBuilder::new(2008, &s, ValidationMode::Strict);
        full_year(&mut b);
        b.add_row("ME", 1_450, 500, 2000).unwrap();
        b.add_row("ME2", 700, 300, 1000).unwrap();
        b.add_row("ME1", 750, 200, 1000).unwrap();
        let y = b.build().unwrap();
        let codes: Vec<&str> = y
            .districts_of("ME")
            .iter()
            .map(|d| d.state_code.as_str())
            .collect();
        assert_eq!(codes, vec!["ME1", "ME2"]);
        assert_eq!(y.result_for_code("ME2").map(|r| r.d_count), Some(700));
        assert!(y.districts_of("NE").is_empty());
        // Districts do not count in the national total.
        assert!(y.national_d_advantage() < 0.0);
    }

    #[test]
    fn district_mismatch() {
        let s = states();
        let mut b = YearBuilder::new(2008, &s, ValidationMode::Strict);
        full_year(&mut b);
        b.add_row("ME", 1_450, 500, 2000).unwrap();
        b.add_row("ME1", 600, 200, 900).unwrap();
        b.add_row("ME2", 700, 300, 1000).unwrap();
        assert!(matches!(
            b.build(),
            Err(DataError::DistrictMismatch { .. })
        ));
    }

    #[test]
    fn district_gap() {
        let s = states();
        let mut b = YearBuilder::new(2008, &s, ValidationMode::Skip);
        full_year(&mut b);
        b.add_row("ME", 1_450, 500, 2000).unwrap();
        b.add_row("ME2", 700, 300, 1000).unwrap();
        assert!(matches!(b.build(), Err(DataError::BadDistrict { .. })));
        let mut b = YearBuilder::new(2008, &s, ValidationMode::Skip);
        assert!(matches!(
            b.add_row("ME0", 700, 300, 1000),
            Err(DataError::BadDistrict { .. })
        ));
    }

    #[test]
    fn duplicate_rows() {
        let s = states();
        let mut b = YearBuilder::new(2008, &s, ValidationMode::Skip);
        b.add_row("ME", 1_450, 500, 2000).unwrap();
        assert!(matches!(
            b.add_row("ME", 1_450, 500, 2000),
            Err(DataError::DuplicateResult { .. })
        ));
    }
}
