use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::dataset::*;

// Older files list the states to flip directly.
#[derive(Deserialize)]
#[serde(untagged)]
enum MinVotesJs {
    Entry(MinVotesEntry),
    List(Vec<String>),
}

pub fn parse_min_votes(contents: &str, path: &str) -> AppResult<MinVotesToChangeResult> {
    let js: BTreeMap<u32, MinVotesJs> =
        serde_json::from_str(contents).context(ParsingJsonSnafu { path })?;
    Ok(js
        .into_iter()
        .map(|(year, entry)| {
            let entry = match entry {
                MinVotesJs::Entry(e) => e,
                MinVotesJs::List(win) => MinVotesEntry { win, tie: None },
            };
            (year, entry)
        })
        .collect())
}

pub fn read_min_votes(path: &Path) -> AppResult<MinVotesToChangeResult> {
    let path_s = path.display().to_string();
    info!("read_min_votes: reading {}", path_s);
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path: path_s.as_str() })?;
    parse_min_votes(&contents, &path_s)
}

/// Writes to the given file, or to the standard output for `stdout` or
/// no file.
pub fn write_output(contents: &str, out: Option<&str>) -> AppResult<()> {
    match out {
        None | Some("stdout") => {
            println!("{}", contents);
            Ok(())
        }
        Some(path) => {
            info!("write_output: writing {}", path);
            fs::write(path, contents).context(WritingFileSnafu { path })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_shapes() {
        let js = r#"{"2000": ["FL"], "2016": {"win": ["MI", "PA", "WI"], "tie": ["PA", "WI"]}}"#;
        let res = parse_min_votes(js, "test.json").unwrap();
        assert_eq!(res[&2000].win, vec!["FL".to_string()]);
        assert_eq!(res[&2000].tie, None);
        assert_eq!(res[&2016].win.len(), 3);
        assert_eq!(res[&2016].tie.as_ref().map(|t| t.len()), Some(2));
    }

    #[test]
    fn bad_json() {
        assert!(matches!(
            parse_min_votes(r#"{"2000": 3}"#, "test.json"),
            Err(AppError::ParsingJson { .. })
        ));
        assert!(matches!(
            parse_min_votes(r#"{"twenty": ["FL"]}"#, "test.json"),
            Err(AppError::ParsingJson { .. })
        ));
    }
}
