//! Tabular data model shared by the spreadsheet conversions.

use crate::error::{ConversionError, Result};

/// Rows of cell strings. Row 0 is the header when rendered as markup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableModel {
    pub rows: Vec<Vec<String>>,
}

impl TableModel {
    /// Split text on newlines, then each line on commas.
    ///
    /// Quotes get no special treatment: a comma inside a quoted field still
    /// separates fields. A trailing empty line (text ending in a newline) is
    /// dropped; every other line is kept verbatim.
    pub fn parse_csv(text: &str) -> Self {
        let mut lines: Vec<&str> = text
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .collect();
        if lines.last() == Some(&"") {
            lines.pop();
        }

        let rows = lines
            .into_iter()
            .map(|line| line.split(',').map(str::to_string).collect())
            .collect();
        Self { rows }
    }

    /// Copy without blank lines, with every cell trimmed.
    ///
    /// Only a line that is whitespace as a whole is blank; a line of empty
    /// cells such as `,,` still has its separators and stays.
    pub fn compacted(&self) -> Self {
        let rows = self
            .rows
            .iter()
            .filter(|row| !row.join(",").trim().is_empty())
            .map(|row| row.iter().map(|cell| cell.trim().to_string()).collect())
            .collect();
        Self { rows }
    }

    /// Serialize as CSV, quoting fields that need it.
    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());
        for row in &self.rows {
            writer
                .write_record(row)
                .map_err(|e| ConversionError::encoding("Failed to write CSV", e))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| ConversionError::encoding("Failed to write CSV", e))?;
        String::from_utf8(bytes).map_err(|e| ConversionError::encoding("CSV is not UTF-8", e))
    }

    /// One text line per non-blank row, cells trimmed and joined with ` | `.
    pub fn row_listing(&self) -> Vec<String> {
        self.compacted()
            .rows
            .iter()
            .map(|row| row.join(" | "))
            .collect()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
