use anyhow::Result;
use clap::Parser;
use last9_forwarder::batch::InputFormat;
use last9_forwarder::forwarder::run;
use std::path::PathBuf;

/// last9-forwarder - ship a batch of log lines to Last9
///
/// Reads one batch from a file or stdin and POSTs it to the Last9 JSON-lines
/// endpoint, retrying failed attempts at a fixed interval.
///
/// Configuration comes from the environment: LAST9_USERNAME, LAST9_PASSWORD,
/// LAST9_TAGS, LAST9_ENDPOINT, MAX_RETRIES and RETRY_INTERVAL (milliseconds).
///
/// Examples:
///   tail -n 100 app.log | last9-forwarder
///   last9-forwarder --format json --input batch.json
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// File holding the batch (reads stdin when omitted; also via LAST9_INPUT)
    #[arg(long, short = 'i', env = "LAST9_INPUT", value_name = "PATH")]
    input: Option<PathBuf>,

    /// How to interpret the input
    #[arg(long, short = 'f', value_enum, default_value_t = InputFormat::Text)]
    format: InputFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let runtime = last9_forwarder::runtime::RealRuntime;

    run(&runtime, cli.input.as_deref(), cli.format).await
}
