use super::{ExportError, ResultsFormatter};
use crate::models::{ExportFormat, LabResult};

const HEADER: [&str; 6] = [
    "Test Name",
    "Patient Value",
    "Unit",
    "Reference Range",
    "Status",
    "Explanation",
];

pub struct CsvFormatter;

fn escape_csv_cell(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

fn push_row<'a>(out: &mut String, cells: impl IntoIterator<Item = &'a str>) {
    let row: Vec<String> = cells.into_iter().map(escape_csv_cell).collect();
    out.push_str(&row.join(","));
    out.push_str("\r\n");
}

impl ResultsFormatter for CsvFormatter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Csv
    }

    fn content_type(&self) -> &'static str {
        "text/csv"
    }

    fn render(&self, _filename: &str, results: &[LabResult]) -> Result<Vec<u8>, ExportError> {
        let mut out = String::new();
        push_row(&mut out, HEADER);
        for result in results {
            let value = result.value.to_string();
            push_row(
                &mut out,
                [
                    result.test.as_str(),
                    value.as_str(),
                    result.unit.as_str(),
                    result.range.as_str(),
                    result.status.as_str(),
                    result.explanation.as_str(),
                ],
            );
        }
        Ok(out.into_bytes())
    }
}
