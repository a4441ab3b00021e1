// Primitives for reading and writing CSV files.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use crate::returns::*;

/// Reads all the lines of an export. The exports have no header line.
pub fn read_csv_records(path: &str) -> CliResult<Vec<Vec<String>>> {
    let file = File::open(path)
        .map_err(csv::Error::from)
        .context(OpeningCsvSnafu { path })?;
    let res = read_records_from(file)?;
    info!("read_csv_records: {}: {} lines", path, res.len());
    Ok(res)
}

pub fn read_records_from<R: Read>(reader: R) -> CliResult<Vec<Vec<String>>> {
    // Short lines are kept: the loader reports them with their line number.
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let mut res: Vec<Vec<String>> = Vec::new();
    for (idx, line_r) in rdr.into_records().enumerate() {
        let lineno = idx + 1;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        if line.iter().all(|cell| cell.trim().is_empty()) {
            debug!("read_records_from: skipping empty line {}", lineno);
            continue;
        }
        res.push(line.iter().map(|cell| cell.to_string()).collect());
    }
    Ok(res)
}

pub fn write_records(path: &str, records: &[Vec<String>]) -> CliResult<()> {
    let file = File::create(path)
        .map_err(csv::Error::from)
        .context(WritingCsvSnafu { path })?;
    let mut wtr = csv::Writer::from_writer(file);
    for r in records.iter() {
        wtr.write_record(r).context(WritingCsvSnafu { path })?;
    }
    wtr.flush()
        .map_err(csv::Error::from)
        .context(WritingCsvSnafu { path })
}

/// Writes every table of the election as a CSV file in the directory.
pub fn write_tables(dir: &Path, tables: &ElectionTables) -> CliResult<()> {
    let dir_s = dir.to_string_lossy().to_string();
    fs::create_dir_all(dir).context(WritingOutputSnafu { path: dir_s.clone() })?;

    write_table_file(dir, "candidates.csv", |w| write_vote_records(w, &tables.candidates, "candidate"))?;
    write_table_file(dir, "ballot_types.csv", |w| {
        write_vote_records(w, &tables.ballot_types, "ballot_type")
    })?;
    write_table_file(dir, "merged_districts.csv", |w| {
        write_merged_districts(w, &tables.merged_districts)
    })?;
    for (county, table) in tables.county_tables.iter() {
        let name = format!("county_{}.csv", county.name().to_ascii_lowercase().replace(' ', "_"));
        write_table_file(dir, &name, |w| write_county_table(w, table))?;
    }
    write_table_file(dir, "district_shares.csv", |w| {
        write_district_shares(w, &tables.district_shares)
    })?;
    write_table_file(dir, "citywide.csv", |w| write_citywide(w, &tables.citywide))?;
    info!("write_tables: tables written to {}", dir_s);
    Ok(())
}

fn write_table_file<F>(dir: &Path, name: &str, f: F) -> CliResult<()>
where
    F: FnOnce(&mut csv::Writer<File>) -> csv::Result<()>,
{
    let path = dir.join(name).to_string_lossy().to_string();
    debug!("write_table_file: {}", path);
    let file = File::create(&path)
        .map_err(csv::Error::from)
        .context(WritingCsvSnafu { path: path.clone() })?;
    let mut wtr = csv::Writer::from_writer(file);
    f(&mut wtr).context(WritingCsvSnafu { path: path.clone() })?;
    wtr.flush()
        .map_err(csv::Error::from)
        .context(WritingCsvSnafu { path })
}

fn write_vote_records<W: Write>(
    wtr: &mut csv::Writer<W>,
    records: &[VoteRecord],
    label: &str,
) -> csv::Result<()> {
    wtr.write_record([
        "assembly_district",
        "election_district",
        "county",
        label,
        "vote_count",
        "ElectDist",
    ])?;
    for r in records.iter() {
        wtr.write_record([
            r.assembly_district.to_string(),
            r.election_district.to_string(),
            r.county.to_string(),
            r.vote_choice.clone(),
            r.vote_count.to_string(),
            r.elect_dist.to_string(),
        ])?;
    }
    Ok(())
}

fn write_merged_districts<W: Write>(
    wtr: &mut csv::Writer<W>,
    merged: &[MergedDistrictRecord],
) -> csv::Result<()> {
    wtr.write_record(["source_ad", "source_ed", "county", "reported_ad", "reported_ed"])?;
    for m in merged.iter() {
        wtr.write_record([
            m.source_ad.to_string(),
            m.source_ed.to_string(),
            m.county.to_string(),
            m.reported_ad.to_string(),
            m.reported_ed.to_string(),
        ])?;
    }
    Ok(())
}

fn write_county_table<W: Write>(
    wtr: &mut csv::Writer<W>,
    table: &CountyVoteTable,
) -> csv::Result<()> {
    let mut header = vec!["assembly_district".to_string()];
    header.extend(table.columns().iter().cloned());
    wtr.write_record(&header)?;
    for (ad, cells) in table.rows() {
        let mut line = vec![ad.to_string()];
        line.extend(cells.iter().map(|c| c.to_string()));
        wtr.write_record(&line)?;
    }
    Ok(())
}

fn write_district_shares<W: Write>(
    wtr: &mut csv::Writer<W>,
    shares: &DistrictShares,
) -> csv::Result<()> {
    let mut header = vec!["ElectDist".to_string(), "county".to_string()];
    for c in shares.columns().iter() {
        header.push(c.clone());
        header.push(format!("{} %", c));
    }
    header.push("total".to_string());
    wtr.write_record(&header)?;
    for d in shares.iter() {
        let mut line = vec![d.elect_dist.to_string(), d.county.to_string()];
        for (idx, votes) in d.votes.iter().enumerate() {
            line.push(votes.to_string());
            line.push(format!("{:.2}", d.share(idx).unwrap_or(0.0)));
        }
        line.push(d.total.to_string());
        wtr.write_record(&line)?;
    }
    Ok(())
}

fn write_citywide<W: Write>(wtr: &mut csv::Writer<W>, totals: &[CandidateTotal]) -> csv::Result<()> {
    wtr.write_record(["candidate", "votes", "percentage"])?;
    for t in totals.iter() {
        wtr.write_record([
            t.name.clone(),
            t.votes.to_string(),
            format!("{:.2}", t.percentage),
        ])?;
    }
    Ok(())
}
