//! CSV export for scenario monthly results.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::response::{CalcResponse, ScenarioPayload};

/// Column header for CSV scenario export.
const HEADER: &str = "scenario,month,production_kwh,consumption_kwh,self_consumption_kwh,\
                      surplus_kwh,grid_import_kwh,saving_eur,feed_in_eur";

fn payloads(resp: &CalcResponse) -> [&ScenarioPayload; 4] {
    [
        &resp.scenarios.a1,
        &resp.scenarios.a2,
        &resp.scenarios.b1,
        &resp.scenarios.b2,
    ]
}

/// Exports the four scenarios' monthly results to a CSV file.
///
/// Writes a header row followed by twelve data rows per scenario.
/// Produces deterministic output for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(resp: &CalcResponse, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(resp, buf)
}

/// Writes the four scenarios' monthly results as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(resp: &CalcResponse, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for scenario in payloads(resp) {
        for m in &scenario.months {
            wtr.write_record(&[
                scenario.label.clone(),
                m.month.to_string(),
                format!("{:.2}", m.production_kwh),
                format!("{:.2}", m.consumption_kwh),
                format!("{:.2}", m.self_consumption_kwh),
                format!("{:.2}", m.surplus_kwh),
                format!("{:.2}", m.grid_import_kwh),
                format!("{:.2}", m.saving_eur),
                format!("{:.2}", m.feed_in_eur),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::request::CalcRequest;
    use crate::runner::run_calculation;
    use crate::sim::types::MONTH_NAMES;
    use serde_json::json;

    fn make_response() -> CalcResponse {
        let request: CalcRequest = serde_json::from_value(json!({
            "production": {
                "monthly_kwh": [500.0, 450.0, 600.0, 650.0, 700.0, 750.0,
                                780.0, 740.0, 600.0, 550.0, 480.0, 420.0]
            },
            "consumption": { "monthly_kwh": vec![580.0; 12] },
            "tariffs": { "effective_price_eur_kwh": 0.1952 }
        }))
        .expect("request parses");
        run_calculation(&request, &EngineConfig::default()).expect("pipeline runs")
    }

    #[test]
    fn header_names_all_columns() {
        let resp = make_response();
        let mut buf = Vec::new();
        write_csv(&resp, &mut buf).ok();
        let output = String::from_utf8(buf).ok();
        let first_line = output.as_deref().unwrap_or("").lines().next().unwrap_or("");
        assert_eq!(
            first_line,
            "scenario,month,production_kwh,consumption_kwh,self_consumption_kwh,\
             surplus_kwh,grid_import_kwh,saving_eur,feed_in_eur"
        );
    }

    #[test]
    fn twelve_rows_per_scenario() {
        let resp = make_response();
        let mut buf = Vec::new();
        write_csv(&resp, &mut buf).ok();
        let output = String::from_utf8(buf).ok();
        let lines: Vec<&str> = output.as_deref().unwrap_or("").lines().collect();
        // 1 header + 4 scenarios x 12 months
        assert_eq!(lines.len(), 49);
    }

    #[test]
    fn deterministic_output() {
        let resp = make_response();
        let mut buf1 = Vec::new();
        let mut buf2 = Vec::new();
        write_csv(&resp, &mut buf1).ok();
        write_csv(&resp, &mut buf2).ok();
        assert_eq!(buf1, buf2);
    }

    #[test]
    fn round_trip_parseable() {
        let resp = make_response();
        let mut buf = Vec::new();
        write_csv(&resp, &mut buf).ok();

        let mut rdr = csv::ReaderBuilder::new().from_reader(buf.as_slice());
        let headers = rdr.headers().cloned().ok();
        assert_eq!(headers.as_ref().map(csv::StringRecord::len), Some(9));

        let mut row_count = 0;
        for record in rdr.records() {
            let rec = record.expect("every row should parse");
            assert!(["A1", "A2", "B1", "B2"].contains(&&rec[0]));
            assert!(MONTH_NAMES.contains(&&rec[1]));
            // Numeric columns parse as f64
            for i in 2..9 {
                let val: Result<f64, _> = rec[i].parse();
                assert!(val.is_ok(), "column {i} should parse as f64");
            }
            row_count += 1;
        }
        assert_eq!(row_count, 48);
    }
}
