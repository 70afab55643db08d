// Primitives for reading the CSV and TSV data files.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use election_data::builder::YearBuilder;

use crate::dataset::io_common::{parse_count, simplify_file_name, year_from_file_name};
use crate::dataset::*;

struct ResultColumns {
    code: usize,
    d: usize,
    r: usize,
    total: usize,
}

fn find_column(
    header: &csv::StringRecord,
    path: &str,
    column: &str,
    pred: impl Fn(&str) -> bool,
) -> AppResult<usize> {
    header
        .iter()
        .position(|h| pred(h.trim()))
        .context(MissingColumnSnafu { path, column })
}

fn find_result_columns(header: &csv::StringRecord, path: &str) -> AppResult<ResultColumns> {
    // The code column has no header in the published files.
    let code = header.iter().position(|h| h.trim().is_empty()).unwrap_or(0);
    Ok(ResultColumns {
        code,
        d: find_column(header, path, "(D)", |h| h.ends_with("(D)"))?,
        r: find_column(header, path, "(R)", |h| h.ends_with("(R)"))?,
        total: find_column(header, path, "Total", |h| h == "Total")?,
    })
}

fn get_field<'a>(line: &'a csv::StringRecord, idx: usize, path: &str, lineno: usize) -> AppResult<&'a str> {
    line.get(idx)
        .map(|s| s.trim())
        .context(CsvLineTooShortSnafu { path, lineno })
}

fn get_count(line: &csv::StringRecord, idx: usize, path: &str, lineno: usize) -> AppResult<u64> {
    let content = get_field(line, idx, path, lineno)?;
    parse_count(content).context(ParsingNumberSnafu {
        path,
        lineno,
        content,
    })
}

/// The rows of a results file, before any validation.
pub fn read_result_rows<R: Read>(
    mut rdr: csv::Reader<R>,
    path: &str,
) -> AppResult<Vec<StateElectionResult>> {
    let header = rdr
        .headers()
        .context(CsvLineParseSnafu { path, lineno: 1usize })?
        .clone();
    debug!("read_result_rows: {}: header {:?}", path, header);
    let cols = find_result_columns(&header, path)?;

    let mut res: Vec<StateElectionResult> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        // The header is on the first line.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { path, lineno })?;
        let code = get_field(&line, cols.code, path, lineno)?;
        let result = StateElectionResult::new(
            code,
            get_count(&line, cols.d, path, lineno)?,
            get_count(&line, cols.r, path, lineno)?,
            get_count(&line, cols.total, path, lineno)?,
        );
        res.push(result);
    }
    Ok(res)
}

/// Validates the rows of one year.
pub fn build_year(
    year: u32,
    rows: Vec<StateElectionResult>,
    states: &StateInfos,
    validation: ValidationMode,
    path: &str,
) -> AppResult<ElectionYearData> {
    let mut builder = YearBuilder::new(year, states, validation);
    for row in rows {
        builder.add_result(row).context(DataSnafu { path })?;
    }
    builder.build().context(DataSnafu { path })
}

pub fn read_election_results(
    path: &Path,
    year: u32,
    states: &StateInfos,
    validation: ValidationMode,
) -> AppResult<ElectionYearData> {
    let path_s = path.display().to_string();
    info!("read_election_results: reading {}", path_s);
    let rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path: path_s.as_str() })?;
    let rows = read_result_rows(rdr, &path_s)?;
    build_year(year, rows, states, validation, &path_s)
}

/// The state name table: `code`, `id` and `name`, separated by tabs.
pub fn read_state_names(path: &Path) -> AppResult<Vec<StateIdentity>> {
    let path_s = path.display().to_string();
    info!("read_state_names: reading {}", path_s);
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .trim(csv::Trim::All)
        .from_path(path)
        .context(CsvOpenSnafu { path: path_s.as_str() })?;
    let mut res: Vec<StateIdentity> = Vec::new();
    for (idx, line_r) in rdr.deserialize().enumerate() {
        let state: StateIdentity = line_r.context(CsvLineParseSnafu {
            path: path_s.as_str(),
            lineno: idx + 2,
        })?;
        res.push(state);
    }
    Ok(res)
}

/// One apportionment: `State,Electoral Votes`, with a header row.
pub fn read_electoral_votes<R: Read>(
    mut rdr: csv::Reader<R>,
    path: &str,
    states: &StateInfos,
) -> AppResult<ElectoralVoteMap> {
    let mut res = ElectoralVoteMap::new();
    for (idx, line_r) in rdr.records().enumerate() {
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { path, lineno })?;
        let code = get_field(&line, 0, path, lineno)?;
        let content = get_field(&line, 1, path, lineno)?;
        let votes = content.parse::<u32>().ok().context(ParsingNumberSnafu {
            path,
            lineno,
            content,
        })?;
        ensure!(states.contains(code), UnknownCodeSnafu { path, code });
        ensure!(
            res.insert(code.to_string(), votes).is_none(),
            DuplicateEntrySnafu { path, code }
        );
    }
    if let Some(missing) = states.iter().find(|s| !res.contains_key(&s.code)) {
        return IncompleteElectoralVotesSnafu {
            path,
            code: missing.code.as_str(),
        }
        .fail();
    }
    Ok(res)
}

/// The apportionment files of a directory with their effective year, sorted.
pub fn electoral_vote_files(dir: &Path) -> AppResult<Vec<(u32, PathBuf)>> {
    let dir_s = dir.display().to_string();
    let mut res: Vec<(u32, PathBuf)> = Vec::new();
    let entries = fs::read_dir(dir).context(OpeningFileSnafu { path: dir_s.as_str() })?;
    for entry_r in entries {
        let entry = entry_r.context(OpeningFileSnafu { path: dir_s.as_str() })?;
        let p = entry.path();
        if p.extension().map(|e| e != "csv").unwrap_or(true) {
            continue;
        }
        match year_from_file_name(&p) {
            Some(year) => res.push((year, p)),
            None => warn!(
                "electoral_vote_files: skipping {}: no year in the name",
                simplify_file_name(&p)
            ),
        }
    }
    res.sort();
    ensure!(!res.is_empty(), NoElectoralVotesSnafu { path: dir_s });
    Ok(res)
}

/// Every apportionment of a directory, read in parallel.
pub fn read_electoral_vote_table(dir: &Path, states: &StateInfos) -> AppResult<ElectoralVoteTable> {
    let files = electoral_vote_files(dir)?;
    let entries: Vec<(u32, ElectoralVoteMap)> = files
        .par_iter()
        .map(|(year, p)| -> AppResult<(u32, ElectoralVoteMap)> {
            let path_s = p.display().to_string();
            debug!("read_electoral_vote_table: {}: reading {}", year, path_s);
            let rdr = csv::ReaderBuilder::new()
                .flexible(true)
                .trim(csv::Trim::All)
                .from_path(p)
                .context(CsvOpenSnafu { path: path_s.as_str() })?;
            Ok((*year, read_electoral_votes(rdr, &path_s, states)?))
        })
        .collect::<AppResult<Vec<_>>>()?;
    info!(
        "read_electoral_vote_table: {} tables, years {:?}",
        entries.len(),
        files.iter().map(|(y, _)| *y).collect::<Vec<_>>()
    );
    Ok(ElectoralVoteTable::new(entries))
}
