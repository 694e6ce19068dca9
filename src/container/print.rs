//! Tabular debug dump

use std::io::Write;
use std::time::Instant;

use tabled::builder::Builder;
use tabled::settings::Style;

use crate::error::{Result, TableError};
use crate::row::Row;

use super::Container;

impl<R: Row> Container<R> {
    /// Print `count` rows from `start` as a table
    ///
    /// `columns` renders one row into its cell values, in column order. The
    /// footer reports the total row count, file size and read time.
    pub fn print<W, F>(&self, out: &mut W, start: u64, count: usize, columns: F) -> Result<()>
    where
        W: Write,
        F: Fn(&R) -> Vec<String>,
    {
        if start > self.num_rows() {
            return Err(TableError::Bounds {
                index: start,
                count: count as u64,
                num_rows: self.num_rows(),
            });
        }
        let count = (self.num_rows() - start).min(count as u64) as usize;
        let mut rows: Vec<R> = (0..count).map(|_| R::default()).collect();

        let read_start = Instant::now();
        let n = self.bulk_read(start, &mut rows)?;
        let read_cost = read_start.elapsed();

        let mut builder = Builder::default();

        let mut header = vec!["#".to_string()];
        header.extend(self.row_spec().iter().map(|c| c.to_string()));
        builder.push_record(header);

        for (i, row) in rows[..n].iter().enumerate() {
            let mut record = vec![(start + i as u64).to_string()];
            record.extend(columns(row));
            builder.push_record(record);
        }

        builder.push_record(vec![String::new(), "Total".to_string(), self.num_rows().to_string()]);
        builder.push_record(vec![String::new(), "File size".to_string(), self.size().to_string()]);
        builder.push_record(vec![
            String::new(),
            "Read ms".to_string(),
            read_cost.as_millis().to_string(),
        ]);

        let mut table = builder.build();
        table.with(Style::ascii());

        writeln!(out, "{}", table).map_err(TableError::io("printing rows"))?;
        Ok(())
    }
}
