use chrono::{DateTime, Local};

/// Width of the `%Y-%m-%dT%H:%M:%S` timestamp column
pub const TIMESTAMP_WIDTH: usize = 19;

/// Column of a fixed-width table
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub header: &'static str,
    pub width: usize,
    pub precision: usize,
}

impl Column {
    pub const fn new(header: &'static str, width: usize, precision: usize) -> Self {
        Self {
            header,
            width,
            precision,
        }
    }
}

/// Renders right-aligned fixed-width rows with an optional leading timestamp
#[derive(Debug, Clone)]
pub struct RowFormat {
    columns: &'static [Column],
    timestamp: bool,
}

impl RowFormat {
    pub fn new(columns: &'static [Column], timestamp: bool) -> Self {
        Self { columns, timestamp }
    }

    pub fn header(&self) -> String {
        let mut line = String::new();
        if self.timestamp {
            line.push_str(&format!("{:<width$}", "time", width = TIMESTAMP_WIDTH));
        }
        for column in self.columns {
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(&format!("{:>width$}", column.header, width = column.width));
        }
        line
    }

    /// Render one row; `values` are matched to columns in order
    pub fn row(&self, now: DateTime<Local>, values: &[f64]) -> String {
        let mut line = String::new();
        if self.timestamp {
            line.push_str(&now.format("%Y-%m-%dT%H:%M:%S").to_string());
        }
        for (column, value) in self.columns.iter().zip(values) {
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(&format!(
                "{:>width$.precision$}",
                value,
                width = column.width,
                precision = column.precision
            ));
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const COLUMNS: &[Column] = &[Column::new("hits/s", 8, 0), Column::new("hit%", 6, 1)];

    fn noon() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 10, 17, 12, 0, 5).unwrap()
    }

    #[test]
    fn test_header_with_timestamp() {
        let format = RowFormat::new(COLUMNS, true);
        assert_eq!(format.header(), "time                  hits/s   hit%");
    }

    #[test]
    fn test_header_without_timestamp() {
        let format = RowFormat::new(COLUMNS, false);
        assert_eq!(format.header(), "  hits/s   hit%");
    }

    #[test]
    fn test_row_is_fixed_width() {
        let format = RowFormat::new(COLUMNS, true);
        let row = format.row(noon(), &[50.0, 100.0]);
        assert_eq!(row, "2026-10-17T12:00:05       50  100.0");
        assert_eq!(row.len(), format.header().len());
    }

    #[test]
    fn test_row_without_timestamp() {
        let format = RowFormat::new(COLUMNS, false);
        assert_eq!(format.row(noon(), &[1234.4, 66.666]), "    1234   66.7");
    }
}
