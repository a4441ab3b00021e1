/*!

This is the long-form manual for `district_returns` and `nycvotes`.

## Input format

The NYC Board of Elections publishes the returns of each contest as a
comma-separated file without header line. Every line has 22 cells: the first 11
are the labels of the columns, repeated on every line, and the last 11 are the
values.

| label                    | example value                       |
|--------------------------|-------------------------------------|
| `AD`                     | `57`                                |
| `ED`                     | `001`                               |
| `County`                 | `Kings`                             |
| `EDAD Status`            | `IN-PLAY`                           |
| `Event`                  | `General Election - 11/04/2025`     |
| `Party/Independent Body` | `Democratic`                        |
| `Office/Position Title`  | `Mayor`                             |
| `District Key`           | `Citywide`                          |
| `VoteFor`                | `1`                                 |
| `Unit Name`              | `Zohran Kwame Mamdani (Democratic)` |
| `Tally`                  | `1,204`                             |

There is one line per election district and per vote choice. The vote choices are:
- the candidates, once per party line, with the party in parentheses
- the write-ins (`Scattered`)
- the ballot methods (`Public Counter`, `Absentee / Military`, `Affidavit`, ...).
  The votes of the ballot methods are another breakdown of the same votes and are
  kept apart from the candidate votes.

An election district that did not report has a status like `COMBINED INTO 012/65`:
its votes are included in election district 12 of assembly district 65. The
note may also be written in place of the tally or of the election district.

The same layout is accepted in an Excel workbook (`--input-type excel`). Files
with a header line are supported through the `hasHeaderRow` option.

All the columns that hold the same value on every line are dropped when loading
the file. Their values stay available as metadata (`RawTable::constants`).

## Elections

Two elections are built in:
- `mayor`: general election for Mayor, 2025
- `president`: general election for President and Vice President, 2024

Any other election is described with a JSON configuration file:

```text
{
  "name": "comptroller",
  "candidates": [
    {"name": "Mark D. Levine", "displayName": "Mark Levine"},
    {"name": "Peter Kefalinos"}
  ],
  "ballotTypes": ["Public Counter", "Absentee / Military", "Affidavit", "Manually Counted Emergency"],
  "scatteredLabel": "Scattered",
  "writeInLabels": ["Write-in"],
  "countyDistricts": {"Kings": [41, 42, 43]},
  "layout": {
    "hasHeaderRow": false,
    "minColumns": 22,
    "assemblyDistrictColumn": "AD",
    "electionDistrictColumn": "ED",
    "countyColumn": "County",
    "statusColumn": "EDAD Status",
    "voteChoiceColumn": "Unit Name",
    "voteCountColumn": "Tally",
    "inPlayStatus": "IN-PLAY",
    "combinedMarker": "(?i)COMBINED\\s+INTO\\D*?(?P<ed>\\d{1,3})\\s*[/]\\s*(?P<ad>\\d{1,3})\\s*$"
  }
}
```

Only `name`, `candidates` and `ballotTypes` are mandatory. Without
`countyDistricts`, the assembly districts of the five counties (2022 lines) are
used. Without `layout`, the 22-column layout above is used; each key of the
layout may be given on its own.

The candidates are matched on the vote choice after removing the party in
parentheses, ignoring case. Both the name and the display name are accepted. The
output uses the display name when there is one. The order of the candidates is
the order of the columns in the output.

`combinedMarker` is a regular expression with the named groups `ed` and `ad`.

## Outputs

- the candidate votes per election district, all party lines summed
- the votes per ballot method and election district
- the merged districts: (source AD, source ED, county, reported AD, reported ED)
- for each of the five counties, a table with one row per assembly district and one
  column per candidate, plus `Scattered`. Missing combinations are 0.
- the share of each candidate in each election district, and the citywide totals.

Election districts are identified by `ElectDist = AD * 1000 + ED`, the
identifier used by the district maps of the city.

Any line that cannot be interpreted stops the processing with an error that gives
the line number and its content. The votes of each county are checked to be the
same in the raw lines and in the county table.

## Command line

```text
nycvotes --input 00000100000Citywide Mayor Citywide EDLevel.csv --election mayor --out summary.json --out-dir tables/
```

- `--input` the export (CSV or Excel, guessed from the extension)
- `--election` a built-in election, or `--config` a JSON configuration
- `--out` where to write the JSON summary (`stdout` by default)
- `--out-dir` a directory to write the tables as CSV files
- `--reference` a JSON summary produced before: the program fails if the new summary differs
- `--verbose` debug logging. The logs are also controlled by `RUST_LOG`.
*/
