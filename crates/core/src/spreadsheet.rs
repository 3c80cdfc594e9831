//! Spreadsheet conversions. Only the first worksheet of a workbook is read.

use crate::converter::ConversionJob;
use crate::error::{ConversionError, Result};
use crate::html;
use crate::layout;
use crate::pdf_writer;
use crate::table::TableModel;
use calamine::{Data, Reader, Xlsx};
use rust_xlsxwriter::Workbook;
use std::io::Cursor;
use tracing::debug;

/// First worksheet of an XLSX workbook, cells stringified.
///
/// The used range may start below or right of A1; the gap is filled with
/// empty cells so every value keeps its sheet position.
pub fn read_first_sheet(data: &[u8]) -> Result<TableModel> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(data))
        .map_err(|e| ConversionError::encoding("Failed to parse XLSX", e))?;

    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range.map_err(|e| ConversionError::encoding("Failed to read worksheet", e))?,
        None => return Ok(TableModel::default()),
    };
    let Some((first_row, first_col)) = range.start() else {
        return Ok(TableModel::default());
    };
    let (first_row, first_col) = (first_row as usize, first_col as usize);
    let width = first_col + range.width();

    let mut rows: Vec<Vec<String>> = vec![vec![String::new(); width]; first_row];
    rows.extend(range.rows().map(|row| {
        std::iter::repeat(String::new())
            .take(first_col)
            .chain(row.iter().map(cell_to_string))
            .collect()
    }));
    Ok(TableModel { rows })
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

/// Build a single-sheet workbook holding every cell as a string.
pub fn write_workbook(table: &TableModel) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name("Sheet1")
        .map_err(|e| ConversionError::encoding("Failed to name worksheet", e))?;

    for (row_index, row) in table.rows.iter().enumerate() {
        for (col_index, cell) in row.iter().enumerate() {
            if cell.is_empty() {
                continue;
            }
            let row_num = u32::try_from(row_index)
                .map_err(|_| ConversionError::Encoding("too many rows".to_string()))?;
            let col_num = u16::try_from(col_index)
                .map_err(|_| ConversionError::Encoding("too many columns".to_string()))?;
            worksheet
                .write_string(row_num, col_num, cell.as_str())
                .map_err(|e| ConversionError::encoding("Failed to write cell", e))?;
        }
    }

    workbook
        .save_to_buffer()
        .map_err(|e| ConversionError::encoding("Failed to write XLSX", e))
}

fn row_listing_pdf(job: &ConversionJob<'_>, table: &TableModel) -> Result<Vec<u8>> {
    let layout = &job.config.table_layout;
    let pages = layout::paginate(
        table.row_listing(),
        layout.page_height,
        layout.margin,
        layout.line_height(),
    );
    debug!("Listed {} rows over {} pages", table.len(), pages.len());
    pdf_writer::render_text_pages(&pages, layout)
}

/// xlsx → csv.
pub fn xlsx_to_csv(job: &ConversionJob<'_>) -> Result<Vec<u8>> {
    let table = read_first_sheet(&job.read_source()?)?;
    Ok(table.to_csv()?.into_bytes())
}

/// xlsx → html: styled table, row 0 as header.
pub fn xlsx_to_html(job: &ConversionJob<'_>) -> Result<Vec<u8>> {
    let table = read_first_sheet(&job.read_source()?)?;
    Ok(html::table_page("Converted Spreadsheet", "Converted Spreadsheet", &table).into_bytes())
}

/// xlsx → pdf: serialized to CSV first, then listed row by row.
pub fn xlsx_to_pdf(job: &ConversionJob<'_>) -> Result<Vec<u8>> {
    let csv = read_first_sheet(&job.read_source()?)?.to_csv()?;
    row_listing_pdf(job, &TableModel::parse_csv(&csv))
}

/// csv → xlsx.
pub fn csv_to_xlsx(job: &ConversionJob<'_>) -> Result<Vec<u8>> {
    let table = TableModel::parse_csv(&job.read_source_text()?);
    write_workbook(&table)
}

/// csv → html: first non-blank row as header cells.
pub fn csv_to_html(job: &ConversionJob<'_>) -> Result<Vec<u8>> {
    let table = TableModel::parse_csv(&job.read_source_text()?).compacted();
    Ok(html::table_page("Converted CSV", "Converted CSV Data", &table).into_bytes())
}

/// csv → pdf: one pipe-joined line per row.
pub fn csv_to_pdf(job: &ConversionJob<'_>) -> Result<Vec<u8>> {
    let table = TableModel::parse_csv(&job.read_source_text()?);
    row_listing_pdf(job, &table)
}
