use std::io::{self, Read, Write};

use pawn::pawn::service::engine::{EngineInput, TiebreakEngine};
use pawn::PawnError;

const DEFAULT_LOG_LEVEL: &str = "pawn=info";
const LOGGING_ENV_VAR_NAME: &str = "PAWN_LOG";

fn main() {
    init_tracing();

    match run() {
        Ok(()) => std::process::exit(0),
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}

/// Thin dispatcher: reads an `EngineInput` as JSON from stdin, routes
/// `tiebreak` requests to [`TiebreakEngine`], and prints the resulting
/// `EngineOutput` as JSON to stdout.
fn run() -> Result<(), PawnError> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;

    let request: EngineInput = serde_json::from_str(&buffer)?;

    match request.service.as_str() {
        "tiebreak" => {
            let mut engine = TiebreakEngine::new(&request.tournament, request.options.number_of_rounds)?;
            let output = engine.evaluate(&request.options.tie_break);
            let json = serde_json::to_string(&output)?;
            io::stdout().write_all(json.as_bytes())?;
            Ok(())
        }
        "convert" => Err(PawnError::InvalidInput(
            "file-format conversion is not implemented by this engine".to_string(),
        )),
        other => Err(PawnError::InvalidInput(format!("unknown service: {other}"))),
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::builder()
        .with_default_directive(
            DEFAULT_LOG_LEVEL
                .parse()
                .expect("default log level constant is bad"),
        )
        .with_env_var(LOGGING_ENV_VAR_NAME)
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}
