use calamine::{open_workbook, DataType, Range, Reader, Xlsx};

use crate::returns::*;

/// Reads the lines of an export saved as an Excel workbook.
///
/// The first worksheet is used unless a name is given.
pub fn read_excel_records(path: &str, worksheet_name: Option<&str>) -> CliResult<Vec<Vec<String>>> {
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;
    let wrange = match worksheet_name {
        Some(name) => workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu { path, name })?,
        None => workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path })?,
    }
    .context(OpeningExcelSnafu { path })?;

    let res = range_records(&wrange)?;
    info!("read_excel_records: {}: {} lines", path, res.len());
    Ok(res)
}

fn range_records(wrange: &Range<DataType>) -> CliResult<Vec<Vec<String>>> {
    let mut res: Vec<Vec<String>> = Vec::new();
    for (idx, row) in wrange.rows().enumerate() {
        let lineno = (idx + 1) as u64;
        let cells = row
            .iter()
            .map(|cell| read_cell(cell, lineno))
            .collect::<CliResult<Vec<String>>>()?;
        if cells.iter().all(|c| c.trim().is_empty()) {
            debug!("range_records: skipping empty line {}", lineno);
            continue;
        }
        res.push(cells);
    }
    Ok(res)
}

// Spreadsheets store the districts and the tallies as numbers.
fn read_cell(cell: &DataType, lineno: u64) -> CliResult<String> {
    match cell {
        DataType::String(s) => Ok(s.clone()),
        DataType::Int(i) => Ok(i.to_string()),
        DataType::Float(f) if f.fract() == 0.0 => Ok(format!("{}", *f as i64)),
        DataType::Float(f) => Ok(f.to_string()),
        DataType::Bool(b) => Ok(b.to_string()),
        DataType::Empty => Ok(String::new()),
        _ => ExcelWrongCellTypeSnafu {
            lineno,
            content: format!("{:?}", cell),
        }
        .fail(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells() {
        assert_eq!(read_cell(&DataType::Float(57.0), 1).unwrap(), "57");
        assert_eq!(read_cell(&DataType::Float(1.5), 1).unwrap(), "1.5");
        assert_eq!(read_cell(&DataType::Int(1204), 1).unwrap(), "1204");
        assert_eq!(
            read_cell(&DataType::String("Kings".to_string()), 1).unwrap(),
            "Kings"
        );
        assert_eq!(read_cell(&DataType::Empty, 1).unwrap(), "");
        assert!(matches!(
            read_cell(&DataType::DateTime(44000.0), 3),
            Err(CliError::ExcelWrongCellType { lineno: 3, .. })
        ));
    }

    #[test]
    fn rows() {
        let mut range: Range<DataType> = Range::new((0, 0), (2, 1));
        range.set_value((0, 0), DataType::String("AD".to_string()));
        range.set_value((0, 1), DataType::Float(57.0));
        range.set_value((2, 0), DataType::String("AD".to_string()));
        range.set_value((2, 1), DataType::Float(58.0));
        let res = range_records(&range).unwrap();
        assert_eq!(
            res,
            vec![
                vec!["AD".to_string(), "57".to_string()],
                vec!["AD".to_string(), "58".to_string()],
            ]
        );
    }
}
