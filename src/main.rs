//! Command-line entry point: request loading, report printing, exports.

use std::fs;
use std::path::Path;
use std::process;

use pv_advisor::config::EngineConfig;
use pv_advisor::error::CalcError;
use pv_advisor::io::export::export_csv;
use pv_advisor::request::CalcRequest;
use pv_advisor::response::CalcResponse;
use pv_advisor::runner::run_calculation;

/// Parsed CLI arguments.
struct CliArgs {
    request_path: Option<String>,
    config_path: Option<String>,
    out_path: Option<String>,
    csv_out: Option<String>,
    quiet: bool,
    #[cfg(feature = "api")]
    serve: bool,
    #[cfg(feature = "api")]
    port: u16,
}

fn print_help() {
    eprintln!("pv-advisor — photovoltaic sizing and profitability engine");
    eprintln!();
    eprintln!("Usage: pv-advisor [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --request <path>   Load calculation request from JSON file");
    eprintln!("  --config <path>    Load engine configuration from TOML file");
    eprintln!("  --out <path>       Write the full response JSON to a file");
    eprintln!("  --csv-out <path>   Export scenario monthly results to CSV");
    eprintln!("  --quiet            Suppress the readable report");
    #[cfg(feature = "api")]
    {
        eprintln!("  --serve            Start REST API server");
        eprintln!("  --port <u16>       API server port (default: 3000)");
    }
    eprintln!("  --help             Show this help message");
    eprintln!();
    eprintln!("If no --request is given, a built-in sample request is used.");
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        request_path: None,
        config_path: None,
        out_path: None,
        csv_out: None,
        quiet: false,
        #[cfg(feature = "api")]
        serve: false,
        #[cfg(feature = "api")]
        port: 3000,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--request" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --request requires a path argument");
                    process::exit(1);
                }
                cli.request_path = Some(args[i].clone());
            }
            "--config" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --config requires a path argument");
                    process::exit(1);
                }
                cli.config_path = Some(args[i].clone());
            }
            "--out" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --out requires a path argument");
                    process::exit(1);
                }
                cli.out_path = Some(args[i].clone());
            }
            "--csv-out" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --csv-out requires a path argument");
                    process::exit(1);
                }
                cli.csv_out = Some(args[i].clone());
            }
            "--quiet" => {
                cli.quiet = true;
            }
            #[cfg(feature = "api")]
            "--serve" => {
                cli.serve = true;
            }
            #[cfg(feature = "api")]
            "--port" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --port requires a u16 argument");
                    process::exit(1);
                }
                if let Ok(p) = args[i].parse::<u16>() {
                    cli.port = p;
                } else {
                    eprintln!("error: --port value \"{}\" is not a valid u16", args[i]);
                    process::exit(1);
                }
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

fn print_report(resp: &CalcResponse) {
    println!("--- Sizing ---");
    println!(
        "Size A: {} panels / {:.2} kWc (capex {:.2} EUR)",
        resp.selection.a.panels, resp.selection.a.kwc, resp.selection.a.capex_eur
    );
    println!(
        "Size B: {} panels / {:.2} kWc (capex {:.2} EUR)",
        resp.selection.b.panels, resp.selection.b.kwc, resp.selection.b.capex_eur
    );

    println!("\n--- Scenario KPIs ---");
    for row in &resp.charts.kpi_comparison {
        println!(
            "{}: ROI {:.2}%/yr, IRR {:.2}%, LCOE {:.4} EUR/kWh, gains {:.2} EUR",
            row.scenario,
            row.annual_roi_pct,
            row.irr_pct,
            row.lcoe_eur_per_kwh,
            row.horizon_gains_eur
        );
    }

    println!("\nWinner: {} ({})", resp.winner.code, resp.winner.reason);

    if !resp.audit.issues.is_empty() {
        println!("\n--- Audit warnings ---");
        for issue in &resp.audit.issues {
            println!("[{}] {}: {}", issue.scenario, issue.code, issue.message);
        }
    }
}

fn main() {
    let cli = parse_args();

    // Load config: --config takes priority over the built-in defaults
    let config = if let Some(ref path) = cli.config_path {
        match EngineConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        EngineConfig::default()
    };

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let request = if let Some(ref path) = cli.request_path {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                eprintln!("error: cannot read \"{path}\": {e}");
                process::exit(1);
            }
        };
        match serde_json::from_str::<CalcRequest>(&raw) {
            Ok(req) => req,
            Err(e) => {
                eprintln!("error: malformed request: {e}");
                process::exit(1);
            }
        }
    } else {
        CalcRequest::sample()
    };

    let response = match run_calculation(&request, &config) {
        Ok(resp) => resp,
        Err(e) => {
            eprintln!("error: {e}");
            if let CalcError::AuditFailed { issues } = &e {
                for issue in issues {
                    eprintln!("  [{}] {}: {}", issue.scenario, issue.code, issue.message);
                }
            }
            process::exit(1);
        }
    };

    if !cli.quiet {
        print_report(&response);
    }

    if let Some(ref path) = cli.out_path {
        let pretty = match serde_json::to_string_pretty(&response) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("error: failed to serialize response: {e}");
                process::exit(1);
            }
        };
        if let Err(e) = fs::write(path, pretty) {
            eprintln!("error: failed to write response: {e}");
            process::exit(1);
        }
        eprintln!("Response written to {path}");
    }

    if let Some(ref path) = cli.csv_out {
        if let Err(e) = export_csv(&response, Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Monthly results written to {path}");
    }

    // Start API server if requested
    #[cfg(feature = "api")]
    if cli.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();

        let state = Arc::new(pv_advisor::api::AppState::new(config));
        let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
        let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
            eprintln!("error: failed to create tokio runtime: {e}");
            process::exit(1);
        });
        rt.block_on(pv_advisor::api::serve(state, addr));
    }
}
