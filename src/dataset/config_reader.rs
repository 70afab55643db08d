use crate::dataset::*;
use crate::view::YearRange;

use serde::{Deserialize, Serialize};

use std::fs;
use std::path::{Path, PathBuf};

pub const STATE_NAMES_FILE: &str = "us-state-names.tsv";
pub const ELECTION_RESULTS_DIR: &str = "electionResults";
pub const ELECTORAL_VOTES_DIR: &str = "electoralVotes";
pub const MIN_VOTES_FILE: &str = "min_votes_to_change_result.json";

/// Where the data lives and which years to load.
///
/// All the fields are optional in the JSON file.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    #[serde(rename = "dataDirectory")]
    pub data_directory: String,
    #[serde(rename = "minYear")]
    pub min_year: u32,
    #[serde(rename = "maxYear")]
    pub max_year: u32,
    #[serde(rename = "yearStep")]
    pub year_step: u32,
    pub validation: ValidationMode,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            data_directory: "data".to_string(),
            min_year: 1972,
            max_year: 2020,
            year_step: 4,
            validation: ValidationMode::Strict,
        }
    }
}

impl DataConfig {
    /// The election years to load, checked for consistency.
    pub fn years(&self) -> AppResult<Vec<u32>> {
        ensure!(
            self.year_step > 0
                && self.min_year <= self.max_year
                && (self.max_year - self.min_year) % self.year_step == 0,
            InvalidYearRangeSnafu {
                min_year: self.min_year,
                max_year: self.max_year,
                step: self.year_step,
            }
        );
        Ok((self.min_year..=self.max_year)
            .step_by(self.year_step as usize)
            .collect())
    }

    pub fn year_range(&self) -> YearRange {
        YearRange {
            min: self.min_year,
            max: self.max_year,
            step: self.year_step,
        }
    }

    fn path_of(&self, parts: &[&str]) -> PathBuf {
        let mut p = PathBuf::from(&self.data_directory);
        for part in parts {
            p.push(part);
        }
        p
    }

    pub fn state_names_path(&self) -> PathBuf {
        self.path_of(&[STATE_NAMES_FILE])
    }

    pub fn election_results_path(&self, year: u32) -> PathBuf {
        self.path_of(&[ELECTION_RESULTS_DIR, format!("{}.csv", year).as_str()])
    }

    pub fn electoral_votes_dir(&self) -> PathBuf {
        self.path_of(&[ELECTORAL_VOTES_DIR])
    }

    pub fn min_votes_path(&self) -> PathBuf {
        self.path_of(&[MIN_VOTES_FILE])
    }
}

/// Reads a configuration file. A relative data directory is resolved from
/// the directory of the configuration file.
pub fn read_config(path: &str) -> AppResult<DataConfig> {
    let config_str = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let mut config: DataConfig =
        serde_json::from_str(&config_str).context(ParsingJsonSnafu { path })?;
    debug!("read_config: {:?}", config);
    if Path::new(&config.data_directory).is_relative() {
        let root_p = Path::new(path).parent().context(MissingParentDirSnafu { path })?;
        config.data_directory = root_p
            .join(&config.data_directory)
            .display()
            .to_string();
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config: DataConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, DataConfig::default());
        assert_eq!(config.years().unwrap().len(), 13);
    }

    #[test]
    fn camel_case_fields() {
        let js = r#"{"dataDirectory": "/srv/data", "minYear": 2000, "maxYear": 2016, "yearStep": 16, "validation": "skip"}"#;
        let config: DataConfig = serde_json::from_str(js).unwrap();
        assert_eq!(config.years().unwrap(), vec![2000, 2016]);
        assert_eq!(config.validation, ValidationMode::Skip);
        assert_eq!(
            config.election_results_path(2000),
            PathBuf::from("/srv/data/electionResults/2000.csv")
        );
    }

    #[test]
    fn bad_ranges() {
        let mut config = DataConfig {
            min_year: 2000,
            max_year: 2010,
            ..DataConfig::default()
        };
        assert!(config.years().is_err());
        config.year_step = 0;
        assert!(config.years().is_err());
        config.max_year = 1996;
        config.year_step = 4;
        assert!(config.years().is_err());
    }

    #[test]
    fn relative_data_directory() {
        let path = format!("{}/tests/data/config.json", env!("CARGO_MANIFEST_DIR"));
        let config = read_config(&path).unwrap();
        assert_eq!(
            config.data_directory,
            format!("{}/tests/data/.", env!("CARGO_MANIFEST_DIR"))
        );
        assert_eq!(config.years().unwrap(), vec![2000, 2016]);
    }
}
