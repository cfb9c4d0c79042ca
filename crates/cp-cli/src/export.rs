//! CSV export of the remote collection

use std::io::Write;

use anyhow::{bail, Context, Result};
use cp_models::Chantier;
use serde_json::Value;

pub const EXPORT_HEADERS: [&str; 16] = [
    "id",
    "title",
    "description",
    "startDate",
    "endDate",
    "status",
    "estimatedDuration",
    "urgency",
    "address",
    "contactPhone",
    "assignees",
    "devis",
    "images",
    "pdfs",
    "createdAt",
    "updatedAt",
];

/// Strings are quoted with `""` escaping, nested values are written as
/// quoted JSON, absent values stay empty
fn csv_field(value: Option<&Value>) -> String {
    let text = match value {
        None | Some(Value::Null) => return String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => return n.to_string(),
        Some(Value::Bool(b)) => return b.to_string(),
        Some(nested) => nested.to_string(),
    };
    format!("\"{}\"", text.replace('"', "\"\""))
}

/// Write `jobs` as CSV, returning the number of rows
pub fn write_csv<W: Write>(jobs: &[Chantier], out: &mut W) -> Result<usize> {
    if jobs.is_empty() {
        bail!("No data found");
    }

    writeln!(out, "{}", EXPORT_HEADERS.join(","))?;
    for job in jobs {
        let record = serde_json::to_value(job).context("encoding chantier")?;
        let row: Vec<String> = EXPORT_HEADERS
            .iter()
            .map(|header| csv_field(record.get(*header)))
            .collect();
        writeln!(out, "{}", row.join(","))?;
    }
    out.flush()?;
    Ok(jobs.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_quotes_and_nulls() {
        let mut job = Chantier::new("Roof \"north\" side", "2024-03-01", "2024-03-03")
            .with_id("65f1c2a9e4b0a1b2c3d4e5f6")
            .with_assignees(["wang", "he"]);
        job.estimated_duration = Some(3);

        let mut out = Vec::new();
        assert_eq!(write_csv(&[job], &mut out).unwrap(), 1);

        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "id,title,description,startDate,endDate,status,estimatedDuration,urgency,\
             address,contactPhone,assignees,devis,images,pdfs,createdAt,updatedAt"
        );
        assert_eq!(
            lines.next().unwrap(),
            "\"65f1c2a9e4b0a1b2c3d4e5f6\",\"Roof \"\"north\"\" side\",\"\",\"2024-03-01\",\
             \"2024-03-03\",\"ongoing\",3,\"2\",,,\"[\"\"wang\"\",\"\"he\"\"]\",\"\",\
             \"[]\",\"[]\",,"
        );
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_empty_collection_is_an_error() {
        let mut out = Vec::new();
        let err = write_csv(&[], &mut out).unwrap_err();
        assert_eq!(err.to_string(), "No data found");
        assert!(out.is_empty());
    }
}
