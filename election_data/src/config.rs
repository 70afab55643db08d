// ********* Input data structures ***********

use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;

use serde::{Deserialize, Serialize};
use snafu::Snafu;

/// The number of full-state entries expected every year: the 50 states and DC.
pub const STATE_COUNT: usize = 51;

/// The largest vote count accepted in a result row.
pub const MAX_VOTE_COUNT: u64 = i64::MAX as u64;

/// A state (or the District of Columbia), as listed in the state name table.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Serialize, Deserialize)]
pub struct StateIdentity {
    pub code: String,
    pub id: u32,
    pub name: String,
}

/// The known states, indexed by code and by numeric id.
///
/// Both the codes and the ids are guaranteed to be unique at construction.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct StateInfos {
    by_code: BTreeMap<String, StateIdentity>,
    code_by_id: HashMap<u32, String>,
}

impl StateInfos {
    pub fn new(states: Vec<StateIdentity>) -> Result<StateInfos, DataError> {
        let mut res = StateInfos::default();
        for s in states {
            if res.code_by_id.contains_key(&s.id) || res.by_code.contains_key(&s.code) {
                return Err(DataError::DuplicateState {
                    code: s.code,
                    id: s.id,
                });
            }
            res.code_by_id.insert(s.id, s.code.clone());
            res.by_code.insert(s.code.clone(), s);
        }
        Ok(res)
    }

    pub fn get(&self, code: &str) -> Option<&StateIdentity> {
        self.by_code.get(code)
    }

    pub fn by_id(&self, id: u32) -> Option<&StateIdentity> {
        self.code_by_id.get(&id).and_then(|c| self.by_code.get(c))
    }

    pub fn contains(&self, code: &str) -> bool {
        self.by_code.contains_key(code)
    }

    /// The name of the state, or the code itself if it is not known.
    pub fn name_of<'a>(&'a self, code: &'a str) -> &'a str {
        self.by_code.get(code).map(|s| s.name.as_str()).unwrap_or(code)
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }

    /// All the states, ordered by code.
    pub fn iter(&self) -> impl Iterator<Item = &StateIdentity> {
        self.by_code.values()
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum Party {
    Democratic,
    Republican,
}

impl Party {
    pub fn letter(&self) -> &'static str {
        match self {
            Party::Democratic => "D",
            Party::Republican => "R",
        }
    }

    pub fn other(&self) -> Party {
        match self {
            Party::Democratic => Party::Republican,
            Party::Republican => Party::Democratic,
        }
    }
}

impl Display for Party {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// The popular vote in one state or one congressional district, for one year.
///
/// A code of two letters is a full state. Longer codes are congressional
/// districts: the state code followed by the 1-based district number (`NE2`).
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct StateElectionResult {
    #[serde(rename = "stateCode")]
    pub state_code: String,
    #[serde(rename = "dCount")]
    pub d_count: u64,
    #[serde(rename = "rCount")]
    pub r_count: u64,
    #[serde(rename = "totalCount")]
    pub total_count: u64,
}

impl StateElectionResult {
    pub fn new(state_code: &str, d_count: u64, r_count: u64, total_count: u64) -> Self {
        StateElectionResult {
            state_code: state_code.to_string(),
            d_count,
            r_count,
            total_count,
        }
    }

    pub fn is_district(&self) -> bool {
        self.state_code.len() > 2
    }

    /// D votes minus R votes. Saturates for counts above [MAX_VOTE_COUNT],
    /// which the builder rejects.
    pub fn margin(&self) -> i64 {
        let m = self.d_count as i128 - self.r_count as i128;
        m.clamp(i64::MIN as i128, i64::MAX as i128) as i64
    }

    /// The margin as a fraction of all the votes cast.
    pub fn margin_fraction(&self) -> f64 {
        self.margin() as f64 / self.total_count as f64
    }

    /// The party with strictly more votes. An exact tie has no winner.
    pub fn winner(&self) -> Option<Party> {
        match self.d_count.cmp(&self.r_count) {
            std::cmp::Ordering::Greater => Some(Party::Democratic),
            std::cmp::Ordering::Less => Some(Party::Republican),
            std::cmp::Ordering::Equal => None,
        }
    }
}

/// All the results for one election year.
///
/// The national advantage is computed at construction from the full-state
/// results only, so that the districts are not counted twice.
#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct ElectionYearData {
    #[serde(rename = "stateResults")]
    state_results: BTreeMap<String, StateElectionResult>,
    #[serde(rename = "districtResults")]
    district_results: BTreeMap<String, Vec<StateElectionResult>>,
    #[serde(rename = "nationalDAdvantage")]
    national_d_advantage: f64,
}

impl ElectionYearData {
    pub fn new(
        state_results: BTreeMap<String, StateElectionResult>,
        district_results: BTreeMap<String, Vec<StateElectionResult>>,
    ) -> ElectionYearData {
        let (mut d_total, mut r_total, mut all_total) = (0u128, 0u128, 0u128);
        for r in state_results.values() {
            d_total += r.d_count as u128;
            r_total += r.r_count as u128;
            all_total += r.total_count as u128;
        }
        let national_d_advantage =
            ((d_total as f64 - r_total as f64) * 100.0) / all_total as f64;
        ElectionYearData {
            state_results,
            district_results,
            national_d_advantage,
        }
    }

    pub fn state_results(&self) -> &BTreeMap<String, StateElectionResult> {
        &self.state_results
    }

    pub fn state_result(&self, code: &str) -> Option<&StateElectionResult> {
        self.state_results.get(code)
    }

    pub fn district_results(&self) -> &BTreeMap<String, Vec<StateElectionResult>> {
        &self.district_results
    }

    /// The districts of a state, ordered by district number. Empty if the
    /// state does not split its electoral votes this year.
    pub fn districts_of(&self, code: &str) -> &[StateElectionResult] {
        self.district_results
            .get(code)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Finds either a state or a district result by its code.
    pub fn result_for_code(&self, code: &str) -> Option<&StateElectionResult> {
        if code.len() > 2 {
            let state = code.get(..2)?;
            self.districts_of(state)
                .iter()
                .find(|d| d.state_code == code)
        } else {
            self.state_results.get(code)
        }
    }

    pub fn national_d_advantage(&self) -> f64 {
        self.national_d_advantage
    }
}

pub type ElectionData = BTreeMap<u32, ElectionYearData>;

pub type ElectoralVoteMap = BTreeMap<String, u32>;

/// The electoral votes of each state, one entry per apportionment.
///
/// Entries are kept sorted by effective year.
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize)]
pub struct ElectoralVoteTable {
    entries: Vec<(u32, ElectoralVoteMap)>,
}

impl ElectoralVoteTable {
    pub fn new(mut entries: Vec<(u32, ElectoralVoteMap)>) -> ElectoralVoteTable {
        entries.sort_by_key(|(year, _)| *year);
        ElectoralVoteTable { entries }
    }

    pub fn entries(&self) -> &[(u32, ElectoralVoteMap)] {
        &self.entries
    }

    pub fn first_year(&self) -> Option<u32> {
        self.entries.first().map(|(y, _)| *y)
    }
}

/// How the plausibility checks on the input rows are applied.
///
/// The integrity checks (known states, party counts within the total,
/// number of states) are applied in all the modes.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    Strict,
    Skip,
}

impl Default for ValidationMode {
    fn default() -> Self {
        ValidationMode::Strict
    }
}

// ******** Output data structures *********

#[derive(Eq, PartialEq, Debug, Clone, Copy, Default, Serialize)]
pub struct ElectoralTotals {
    #[serde(rename = "dElectoralVotes")]
    pub d: u32,
    #[serde(rename = "rElectoralVotes")]
    pub r: u32,
}

impl ElectoralTotals {
    pub fn winner(&self) -> Option<Party> {
        match self.d.cmp(&self.r) {
            std::cmp::Ordering::Greater => Some(Party::Democratic),
            std::cmp::Ordering::Less => Some(Party::Republican),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn votes_for(&self, party: Party) -> u32 {
        match party {
            Party::Democratic => self.d,
            Party::Republican => self.r,
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum SortOrder {
    None,
    ByMargin,
    ByPercentage,
}

/// Errors that prevent the data from being loaded or aggregated.
///
/// None of them are recoverable: the data set is static and any
/// inconsistency is a bug in the data files.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DataError {
    #[snafu(display("state {code} (id {id}) is listed more than once"))]
    DuplicateState { code: String, id: u32 },
    #[snafu(display("{year}: unknown state code {code:?}"))]
    UnknownState { year: u32, code: String },
    #[snafu(display("{year}: {code} is listed more than once"))]
    DuplicateResult { year: u32, code: String },
    #[snafu(display("{year}: malformed district code {code:?}"))]
    BadDistrict { year: u32, code: String },
    #[snafu(display("{year}: expected {expected} states, found {found}"))]
    WrongStateCount {
        year: u32,
        expected: usize,
        found: usize,
    },
    #[snafu(display("{year} {code}: no votes recorded"))]
    EmptyTotal { year: u32, code: String },
    #[snafu(display("{year} {code}: vote count is too large"))]
    CountTooLarge { year: u32, code: String },
    #[snafu(display("{year} {code}: total is too low"))]
    TotalTooLow { year: u32, code: String },
    #[snafu(display("{year} {code}: too many third-party votes"))]
    TooManyThirdParty { year: u32, code: String },
    #[snafu(display("{year} {code}: too many {party}'s"))]
    ImplausibleRatio {
        year: u32,
        code: String,
        party: Party,
    },
    #[snafu(display("{year} {code}: district results do not add up to the state result"))]
    DistrictMismatch { year: u32, code: String },
    #[snafu(display("year {year} is earlier than the first electoral vote table {first_year:?}"))]
    YearBeforeTable { year: u32, first_year: Option<u32> },
    #[snafu(display("{year}: no electoral votes for {code}"))]
    MissingElectoralVotes { year: u32, code: String },
    #[snafu(display("no election data for {year}"))]
    MissingYear { year: u32 },
    #[snafu(display("{year}: inconsistent electoral vote count for {code}"))]
    InconsistentElectoralVotes { year: u32, code: String },
    #[snafu(display("{year}: exact electoral tie at {votes} votes"))]
    ElectoralTie { year: u32, votes: u32 },
    #[snafu(display("{year}: could not find the tipping point state"))]
    TippingPointNotFound { year: u32 },
}

pub type DataResult<T> = Result<T, DataError>;
