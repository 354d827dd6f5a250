//! Writing tables as CSV.
use crate::table::SummaryTable;
use std::io::Write;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn write_records<W: Write>(table: &SummaryTable, out: &mut csv::Writer<W>) -> Result<(), Error> {
    out.write_record(std::iter::once(table.label.as_str()).chain(table.columns.iter().map(|c| c.name.as_str())))?;
    for row in &table.rows {
        out.write_record(
            std::iter::once(row.label.clone()).chain(
                row.cells
                    .iter()
                    .map(|cell| cell.map(|value| value.to_string()).unwrap_or_default()),
            ),
        )?;
    }
    Ok(())
}

/// Write `table` as CSV with a header row, leaving undefined cells empty.
pub fn write_table(table: &SummaryTable, out: impl Write) -> Result<(), Error> {
    let mut out = csv::Writer::from_writer(out);
    write_records(table, &mut out)?;
    out.flush()?;
    Ok(())
}

/// Write all `tables` into `out`, each preceded by a line with its name and separated by an empty line.
pub fn write_tables<'a>(
    tables: impl IntoIterator<Item = &'a SummaryTable>,
    mut out: impl Write,
) -> Result<(), Error> {
    for (index, table) in tables.into_iter().enumerate() {
        if index > 0 {
            out.write_all(b"\n")?;
        }
        let mut csv = csv::WriterBuilder::new().flexible(true).from_writer(&mut out);
        csv.write_record([table.name.as_str()])?;
        write_records(table, &mut csv)?;
        csv.flush()?;
    }
    Ok(())
}

/// A file name for `table` that is safe on all platforms, like `Combined_Table_1_Current_Year_Pre_vs_Post_Analysis.csv`.
pub fn file_name(table: &SummaryTable) -> String {
    let mut name = String::with_capacity(table.name.len() + 4);
    for c in table.name.chars() {
        if c.is_ascii_alphanumeric() {
            name.push(c);
        } else if c == '%' {
            name.push_str("pct");
        } else if !name.is_empty() && !name.ends_with('_') {
            name.push('_');
        }
    }
    while name.ends_with('_') {
        name.pop();
    }
    name.push_str(".csv");
    name
}
