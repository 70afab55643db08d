/*!

This is the long-form manual for `election_data` and `electionmap`.

## Data directory

All the data is read from static files in one directory:

```text
data/
  us-state-names.tsv
  electionResults/1972.csv
  electionResults/1976.csv
  ...
  electoralVotes/1972.csv
  electoralVotes/1984.csv
  ...
  min_votes_to_change_result.json   (optional)
```

### `us-state-names.tsv`

Tab-separated, with a header row:

| code | id | name    |
|------|----|---------|
| AL   | 1  | Alabama |
| AK   | 2  | Alaska  |

The codes and the ids must be unique.

### `electionResults/<year>.csv`

One row per state, plus one row per congressional district for the states
that split their electoral votes. The columns are found by their header:

- the column with an empty header holds the code (`OH`, or `NE2` for the
  second district of Nebraska). If no header is empty, the first column is used.
- the column whose header ends with `(D)` holds the Democratic votes
- the column whose header ends with `(R)` holds the Republican votes
- the `Total` column holds all the votes cast, third parties included

Counts may use thousands separators (`"1,234,567"`). Other columns are
ignored.

```text
,Gore (D),Bush (R),Total
AL,"692,611","941,173","1,666,272"
...
```

Every year must have exactly 51 state rows (the 50 states and DC).

### `electoralVotes/<year>.csv`

The electoral votes of each state, starting from the given year until the
next file. The year is read from the first four characters of the file name.

```text
State,Electoral Votes
AL,9
...
```

### `min_votes_to_change_result.json`

The states to flip for the loser to win, per year, as written by
`electionmap min-votes`:

```json
{ "2016": { "win": ["MI", "PA", "WI"], "tie": ["PA", "WI"] } }
```

A plain list of codes per year is also accepted.

## Validation

The loader always rejects unknown states, counts that do not add up
(`D + R > Total`), a total of zero, duplicated rows, and years without
exactly 51 states.

In `strict` validation mode (the default) it also rejects:
- more than half of the votes going to third parties
- one party getting more than 10 times the votes of the other (DC may give
  the Democratic candidate up to 30 times the Republican votes)
- districts that do not add up to their state within 1%

With `skip`, these plausibility checks are only logged at the `debug` level.

## Electoral votes

A state goes to the candidate with strictly more votes. For states with
district rows, one vote moves to the other party for each district it won.
Two historical splits are applied when the results do not include the
districts: Nebraska in 2008 (one vote to D) and Maine in 2016 (one vote to R).

The tipping point state is found by sorting the states from most D to most R
and walking from the winner's side until the winner has a majority.

*/
