//! Manual-probe CLI entry point (spec §6 tool operations, exposed here as a
//! thin stdin-JSON-in, stdout-JSON-out demo binary rather than a real tool
//! transport). Grounded on the teacher's `main.rs`: `Config::load` with a
//! default fallback, then `serde_json::from_reader(stdin.lock())` into the
//! operation's input shape, run to completion, result serialized to stdout.
//! A real embedder wires the same [`detainee_locator_core::tools`] request
//! types to whatever RPC/tool-call transport it actually speaks; this binary
//! exists so the crate is runnable and inspectable on its own.

use std::io;

use clap::{Parser, Subcommand};
use detainee_locator_core::config::{load_from_str, Config};
use detainee_locator_core::tools::{
    self, BulkSearchRequest, ParseNaturalQueryRequest, SearchByAlienNumberRequest, SearchByFacilityRequest,
    SearchByNameRequest,
};
use detainee_locator_core::Orchestrator;

#[derive(Parser, Debug)]
#[command(name = "detainee-locator-core")]
#[command(version = concat!("Ver:", env!("CARGO_PKG_VERSION")))]
#[command(about = "Manual-probe CLI for the detainee-lookup scraping core")]
struct Cli {
    /// Path to a TOML config file; falls back to built-in defaults when absent.
    #[arg(short = 'c', long = "config")]
    config: Option<String>,

    #[command(subcommand)]
    operation: Operation,
}

#[derive(Subcommand, Debug)]
enum Operation {
    /// Reads a `SearchByNameRequest` JSON body from stdin.
    SearchByName,
    /// Reads a `SearchByAlienNumberRequest` JSON body from stdin.
    SearchByAlienNumber,
    /// Reads a `SearchByFacilityRequest` JSON body from stdin.
    SearchByFacility,
    /// Reads a `BulkSearchRequest` JSON body from stdin.
    BulkSearch,
    /// Reads a `ParseNaturalQueryRequest` JSON body from stdin.
    ParseNaturalQuery,
}

fn load_config(path: Option<&str>) -> Config {
    let Some(path) = path else {
        return Config::default();
    };
    match std::fs::read_to_string(path).map(|raw| load_from_str(&raw)) {
        Ok(Ok(config)) => config,
        _ => Config::default(),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref());
    let orchestrator = Orchestrator::new(config.clone());
    let stdin = io::stdin();

    match cli.operation {
        Operation::SearchByName => {
            let req: SearchByNameRequest = serde_json::from_reader(stdin.lock())?;
            let query = req.into_query(&config);
            let outcome = tools::to_outcome(orchestrator.search(query).await);
            print_outcome(outcome)?;
        }
        Operation::SearchByAlienNumber => {
            let req: SearchByAlienNumberRequest = serde_json::from_reader(stdin.lock())?;
            let outcome = match req.into_query(&config) {
                Ok(query) => tools::to_outcome(orchestrator.search(query).await),
                Err(err) => Err(tools::ErrorEnvelope::from(err)),
            };
            print_outcome(outcome)?;
        }
        Operation::SearchByFacility => {
            let req: SearchByFacilityRequest = serde_json::from_reader(stdin.lock())?;
            let query = req.into_query(&config);
            let outcome = tools::to_outcome(orchestrator.search(query).await);
            print_outcome(outcome)?;
        }
        Operation::BulkSearch => {
            let req: BulkSearchRequest = serde_json::from_reader(stdin.lock())?;
            let max_concurrent = req.max_concurrent.unwrap_or(1);
            let stop_on_error = req.stop_on_error.unwrap_or(false);
            let queries: Result<Vec<_>, _> = req.searches.into_iter().map(|item| item.into_query(&config)).collect();
            match queries {
                Ok(queries) => {
                    let results = orchestrator.search_bulk(queries, max_concurrent, stop_on_error).await;
                    let outcomes: Vec<_> = results.into_iter().map(tools::to_outcome).collect();
                    println!("{}", serde_json::to_string_pretty(&outcomes)?);
                }
                Err(err) => print_outcome(Err(tools::ErrorEnvelope::from(err)))?,
            }
        }
        Operation::ParseNaturalQuery => {
            let req: ParseNaturalQueryRequest = serde_json::from_reader(stdin.lock())?;
            let language = req.language.unwrap_or(config.language.default);
            let confidence_threshold = req.confidence_threshold.unwrap_or(config.search.default_confidence_threshold);
            match detainee_locator_core::natural_query::parse_natural_query(&req.query, language, confidence_threshold) {
                Ok(query) if req.auto_execute => {
                    let outcome = tools::to_outcome(orchestrator.search(query).await);
                    print_outcome(outcome)?;
                }
                Ok(query) => {
                    println!("{}", serde_json::to_string_pretty(&query.redacted())?);
                }
                Err(err) => print_outcome(Err(tools::ErrorEnvelope::from(err)))?,
            }
        }
    }

    Ok(())
}

fn print_outcome(outcome: tools::ToolOutcome) -> Result<(), Box<dyn std::error::Error>> {
    match outcome {
        Ok(response) => println!("{}", serde_json::to_string_pretty(&response)?),
        Err(envelope) => println!("{}", serde_json::to_string_pretty(&envelope)?),
    }
    Ok(())
}
