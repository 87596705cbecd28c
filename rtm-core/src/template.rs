//! Import template generation
//!
//! A template is a header row of every field id in catalog order, plus an
//! optional sample row. XLSX templates also carry a `Reference` sheet listing
//! the valid names of each loaded master-data list.

use anyhow::{anyhow, Context, Result};
use log::info;
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::fields::TargetField;
use crate::reference::{MasterDataKind, ReferenceSet};
use crate::transform::DEFAULT_PHASE;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateFormat {
    #[default]
    Csv,
    Xlsx,
}

impl TemplateFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            TemplateFormat::Csv => "csv",
            TemplateFormat::Xlsx => "xlsx",
        }
    }
}

impl fmt::Display for TemplateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl FromStr for TemplateFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(TemplateFormat::Csv),
            "xlsx" | "excel" => Ok(TemplateFormat::Xlsx),
            other => Err(format!("Unknown template format '{}' (expected csv or xlsx)", other)),
        }
    }
}

/// Header row: every field id in catalog order
pub fn template_headers() -> Vec<&'static str> {
    TargetField::all().iter().map(|f| f.id()).collect()
}

/// Example value for one column of the sample row
///
/// Categorical columns use the first name of the matching reference list when
/// one is loaded and non-empty.
pub fn sample_value(field: TargetField, references: &ReferenceSet) -> String {
    if let Some(name) = MasterDataKind::for_field(field).and_then(|kind| references.first(kind)) {
        return name.to_string();
    }

    match field {
        TargetField::Title => "Approve purchase orders over limit".to_string(),
        TargetField::Description => {
            "Purchase orders above the approval limit require manager sign-off".to_string()
        }
        TargetField::Consultant => "Consultant name".to_string(),
        TargetField::ClientOwner => "Client owner name".to_string(),
        TargetField::Phase => DEFAULT_PHASE.to_string(),
        TargetField::Option1 => "Standard approval workflow".to_string(),
        TargetField::Option1Time => "8".to_string(),
        TargetField::WorkshopName => "Procurement workshop".to_string(),
        TargetField::InScope => "yes".to_string(),
        TargetField::RequiresCustomization => "no".to_string(),
        f if f.is_categorical() => format!("Example {}", f.label()),
        _ => String::new(),
    }
}

fn sample_row(references: &ReferenceSet) -> Vec<String> {
    TargetField::all()
        .iter()
        .map(|f| sample_value(*f, references))
        .collect()
}

/// Render a CSV template
pub fn csv_template(references: &ReferenceSet, include_sample: bool) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(template_headers())?;
    if include_sample {
        writer.write_record(sample_row(references))?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow!("Failed to finish CSV template: {}", e))
}

/// Render an XLSX template with a `Requirements` sheet and, when any list is
/// loaded, a `Reference` sheet
pub fn xlsx_template(references: &ReferenceSet, include_sample: bool) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let mut sheet = Worksheet::new();
    sheet.set_name("Requirements")?;
    for (col, header) in template_headers().into_iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, header, &bold)?;
    }
    if include_sample {
        for (col, value) in sample_row(references).iter().enumerate() {
            if !value.is_empty() {
                sheet.write_string(1, col as u16, value)?;
            }
        }
    }
    workbook.push_worksheet(sheet);

    let loaded: Vec<MasterDataKind> = references.loaded_kinds().collect();
    if !loaded.is_empty() {
        let mut sheet = Worksheet::new();
        sheet.set_name("Reference")?;
        for (col, kind) in loaded.iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, kind.to_string(), &bold)?;
            for (row, name) in references.names(*kind).unwrap_or(&[]).iter().enumerate() {
                sheet.write_string(row as u32 + 1, col as u16, name)?;
            }
        }
        workbook.push_worksheet(sheet);
    }

    Ok(workbook.save_to_buffer()?)
}

pub fn generate_template(
    format: TemplateFormat,
    references: &ReferenceSet,
    include_sample: bool,
) -> Result<Vec<u8>> {
    match format {
        TemplateFormat::Csv => csv_template(references, include_sample),
        TemplateFormat::Xlsx => xlsx_template(references, include_sample),
    }
}

/// Generate a template and write it to `path`
pub fn write_template<P: AsRef<Path>>(
    path: P,
    format: TemplateFormat,
    references: &ReferenceSet,
    include_sample: bool,
) -> Result<()> {
    let bytes = generate_template(format, references, include_sample)?;
    fs::write(&path, bytes)
        .with_context(|| format!("Failed to write template to {:?}", path.as_ref()))?;
    info!("Wrote {} template to {:?}", format, path.as_ref());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{decode, FileKind};
    use tempfile::tempdir;

    fn references() -> ReferenceSet {
        ReferenceSet::new()
            .with(MasterDataKind::Modules, &["Sales", "Operations"])
            .with(MasterDataKind::Priorities, &["High", "Low"])
            .with(MasterDataKind::Statuses, &[])
    }

    #[test]
    fn test_csv_headers_in_catalog_order() -> Result<()> {
        let bytes = csv_template(&ReferenceSet::new(), false)?;
        let text = String::from_utf8(bytes)?;
        let first = text.lines().next().unwrap_or_default();
        assert!(first.starts_with("title,description,module,submodule,function"));
        assert_eq!(first.split(',').count(), TargetField::all().len());
        assert_eq!(text.lines().count(), 1);
        Ok(())
    }

    #[test]
    fn test_sample_row_uses_first_reference_name() -> Result<()> {
        let bytes = csv_template(&references(), true)?;
        let (headers, rows) = decode(&bytes, FileKind::Delimited)?;

        assert_eq!(headers.len(), TargetField::all().len());
        assert_eq!(rows[0].get("module"), Some("Sales"));
        assert_eq!(rows[0].get("priority"), Some("High"));
        // empty list falls back to the placeholder
        assert_eq!(rows[0].get("status"), Some("Example Status"));
        assert_eq!(rows[0].get("phase"), Some(DEFAULT_PHASE));
        Ok(())
    }

    #[test]
    fn test_xlsx_template_decodes_to_catalog_headers() -> Result<()> {
        let bytes = xlsx_template(&references(), true)?;
        let (headers, rows) = decode(&bytes, FileKind::Workbook)?;

        assert_eq!(headers, template_headers());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("module"), Some("Sales"));
        assert_eq!(rows[0].get("option_1_time"), Some("8"));
        Ok(())
    }

    #[test]
    fn test_write_template_to_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("template.csv");
        write_template(&path, TemplateFormat::Csv, &ReferenceSet::new(), true)?;

        let content = fs::read_to_string(&path)?;
        assert_eq!(content.lines().count(), 2);
        Ok(())
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("XLSX".parse::<TemplateFormat>(), Ok(TemplateFormat::Xlsx));
        assert_eq!("csv".parse::<TemplateFormat>(), Ok(TemplateFormat::Csv));
        assert!("pdf".parse::<TemplateFormat>().is_err());
    }
}
