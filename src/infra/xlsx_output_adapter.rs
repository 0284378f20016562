use std::path::PathBuf;

use async_trait::async_trait;
use rust_xlsxwriter::{
    Color, ConditionalFormat3ColorScale, ConditionalFormatType, Table, TableColumn, TableStyle, Workbook,
    Worksheet, XlsxError,
};
use tracing::info;

use crate::app::ports::DdmSheetPort;
use crate::domain::DdmEntry;
use crate::infra::timestamped_path;

pub const DDM_COLUMNS: [&str; 14] = [
    "ATT&CK Data Source",
    "Sub Data Source",
    "Source Data Object",
    "Relationship",
    "Destination Data Object",
    "EventID",
    "Data Channel",
    "Coverage",
    "Timeliness",
    "Retention",
    "Structure",
    "Consistency",
    "Score",
    "Comment",
];

// Color scale covers Coverage..Score (H2:M10000)
const SCALE_FIRST_ROW: u32 = 1;
const SCALE_LAST_ROW: u32 = 9999;
const SCALE_FIRST_COL: u16 = 7;
const SCALE_LAST_COL: u16 = 12;

/// Writes `ddm_enriched_<ts>.xlsx` into the output directory
pub struct XlsxDdmSheetAdapter {
    output_dir: PathBuf,
}

impl XlsxDdmSheetAdapter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

#[async_trait]
impl DdmSheetPort for XlsxDdmSheetAdapter {
    async fn write_ddm_sheet(&self, entries: &[DdmEntry]) -> anyhow::Result<PathBuf> {
        let path = timestamped_path(&self.output_dir, "ddm_enriched", "xlsx")?;

        let mut workbook = build_workbook(entries)?;
        workbook.save(&path)?;

        info!(path = %path.display(), rows = entries.len(), "saved DDM spreadsheet");
        Ok(path)
    }
}

pub fn build_workbook(entries: &[DdmEntry]) -> Result<Workbook, XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (col, header) in DDM_COLUMNS.iter().enumerate() {
        worksheet.write_string(0, col as u16, *header)?;
    }
    for (i, entry) in entries.iter().enumerate() {
        write_entry(worksheet, i as u32 + 1, entry)?;
    }

    if !entries.is_empty() {
        let columns: Vec<TableColumn> = DDM_COLUMNS
            .iter()
            .map(|header| TableColumn::new().set_header(*header))
            .collect();
        let table = Table::new()
            .set_name("DDM")
            .set_style(TableStyle::Light15)
            .set_columns(&columns);
        worksheet.add_table(0, 0, entries.len() as u32, DDM_COLUMNS.len() as u16 - 1, &table)?;
    }

    let scale = ConditionalFormat3ColorScale::new()
        .set_minimum_color(Color::RGB(0xF8696B))
        .set_midpoint(ConditionalFormatType::Percentile, 50)
        .set_midpoint_color(Color::RGB(0xFFEB84))
        .set_maximum_color(Color::RGB(0x63BE7B));
    worksheet.add_conditional_format(SCALE_FIRST_ROW, SCALE_FIRST_COL, SCALE_LAST_ROW, SCALE_LAST_COL, &scale)?;

    Ok(workbook)
}

fn write_entry(worksheet: &mut Worksheet, row: u32, entry: &DdmEntry) -> Result<(), XlsxError> {
    let text: [&str; 7] = [
        entry.attack_data_source.as_deref().unwrap_or(""),
        &entry.sub_data_source,
        &entry.source_data_object,
        &entry.relationship,
        &entry.destination_data_object,
        &entry.eventid,
        entry.data_channel.as_deref().unwrap_or(""),
    ];
    for (col, value) in text.iter().enumerate() {
        if !value.is_empty() {
            worksheet.write_string(row, col as u16, *value)?;
        }
    }

    for (offset, value) in entry.dimensions().iter().enumerate() {
        worksheet.write_number(row, 7 + offset as u16, f64::from(*value))?;
    }
    worksheet.write_number(row, 12, entry.score)?;
    if !entry.comment.is_empty() {
        worksheet.write_string(row, 13, &entry.comment)?;
    }
    Ok(())
}
