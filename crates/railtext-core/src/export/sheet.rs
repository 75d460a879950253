//! XLSX output via rust_xlsxwriter.

use rust_xlsxwriter::{Format, Workbook};

use crate::error::ExportError;

/// Build a single-sheet workbook with a bold header row.
///
/// Empty cells are left unwritten so blank fields stay blank in Excel.
pub(super) fn write_xlsx(
    sheet_name: &str,
    headers: &[&str],
    rows: impl Iterator<Item = Vec<String>>,
) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }

    for (i, row) in rows.enumerate() {
        let row_num = i as u32 + 1;
        for (col, value) in row.iter().enumerate() {
            if !value.is_empty() {
                worksheet.write_string(row_num, col as u16, value.as_str())?;
            }
        }
    }

    worksheet.autofit();

    Ok(workbook.save_to_buffer()?)
}
