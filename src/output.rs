// Export writers and console previews for cleaned and aggregated rows.
use serde::Serialize;
use std::error::Error;
use tabled::{settings::Style, Table, Tabled};

/// Serialize rows to a CSV string (UTF-8, standard delimiting). This is the
/// round-trip export of whatever view the caller currently holds.
pub fn csv_string<T: Serialize>(rows: &[T]) -> Result<String, Box<dyn Error>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    for row in rows {
        wtr.serialize(row)?;
    }
    Ok(String::from_utf8(wtr.into_inner()?)?)
}

pub fn write_csv<T: Serialize>(path: &str, rows: &[T]) -> Result<(), Box<dyn Error>> {
    std::fs::write(path, csv_string(rows)?)?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &str, value: &T) -> Result<(), Box<dyn Error>> {
    std::fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

/// Print the first `max_rows` rows as a markdown table.
pub fn preview_table<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    println!("{}\n", Table::new(slice).with(Style::markdown()));
    if rows.len() > max_rows {
        println!("({} more row(s) in the export)\n", rows.len() - max_rows);
    }
}
