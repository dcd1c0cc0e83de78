//! crosswalk CLI - run conversions and enrichments over files or stdin
//!
//! Logs go to stderr so stdout stays valid JSON.

use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;
use std::process;

use crosswalk::serialization::{read_ndjson, JsonArrayWriter, NdjsonWriter, SerializationError};
use crosswalk::temporal::TemporalNormalizer;
use crosswalk::{CrosswalkConfig, Dispatcher, Service, ServiceRequest};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "crosswalk")]
#[command(version, about = "Convert and enrich archival metadata records", long_about = None)]
struct Cli {
    /// YAML config file (falls back to CROSSWALK_CONFIG)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a service over a JSON document or an NDJSON batch
    Run {
        /// Service name, e.g. oai-to-dpla or enrich-format (see `services`)
        service: String,

        /// Input file (default: stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Treat the input as NDJSON, one document per line
        #[arg(long)]
        ndjson: bool,

        /// With --ndjson, write results as one JSON array instead of NDJSON
        #[arg(long, requires = "ndjson")]
        array: bool,

        /// Service option as key=value, repeatable (e.g. -o prop=aggregatedCHO/subject)
        #[arg(short = 'o', long = "opt", value_parser = parse_key_val)]
        opts: Vec<(String, String)>,

        /// Base64-encoded contributor block for conversions
        #[arg(long)]
        contributor: Option<String>,

        /// Pretty-print a single-document result
        #[arg(long, conflicts_with = "ndjson")]
        pretty: bool,
    },

    /// Normalize dates and date ranges, one per argument
    ParseDate {
        texts: Vec<String>,

        /// Keep bare years and year-months instead of filling from the anchor
        #[arg(long)]
        preserve: bool,
    },

    /// List available services
    Services,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected key=value, got '{}'", s))
}

fn main() {
    let cli = Cli::parse();

    // CROSSWALK_* overrides may come from a .env file
    dotenv::dotenv().ok();

    let config = match CrosswalkConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level)),
        )
        .with_writer(io::stderr)
        .init();

    let result = match cli.command {
        Commands::Run {
            service,
            input,
            ndjson,
            array,
            opts,
            contributor,
            pretty,
        } => {
            let params: HashMap<String, String> = opts.into_iter().collect();
            let run = RunArgs {
                input,
                ndjson,
                array,
                params,
                contributor,
                pretty,
            };
            run_service(&config, &service, run)
        }
        Commands::ParseDate { texts, preserve } => parse_dates(&texts, preserve),
        Commands::Services => list_services(),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

struct RunArgs {
    input: Option<PathBuf>,
    ndjson: bool,
    array: bool,
    params: HashMap<String, String>,
    contributor: Option<String>,
    pretty: bool,
}

fn open_input(input: Option<&PathBuf>) -> Result<Box<dyn BufRead>, String> {
    match input {
        Some(path) => {
            let file = File::open(path)
                .map_err(|e| format!("Failed to open {}: {}", path.display(), e))?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(io::stdin().lock())),
    }
}

/// Run one service over a single document or an NDJSON batch
fn run_service(config: &CrosswalkConfig, name: &str, args: RunArgs) -> Result<(), String> {
    let service: Service = name.parse().map_err(|e| format!("{} (try `crosswalk services`)", e))?;
    let dispatcher = Dispatcher::new(&config.defaults);
    let mut reader = open_input(args.input.as_ref())?;

    if args.ndjson {
        return run_batch(&dispatcher, service, reader, &args);
    }

    let mut body = String::new();
    reader
        .read_to_string(&mut body)
        .map_err(|e| format!("Failed to read input: {}", e))?;

    let request = ServiceRequest {
        body,
        params: args.params,
        contributor: args.contributor,
    };
    let output = dispatcher.run(service, &request).map_err(|e| e.to_string())?;

    let output = if args.pretty {
        let value: serde_json::Value = serde_json::from_str(&output).map_err(|e| e.to_string())?;
        serde_json::to_string_pretty(&value).map_err(|e| e.to_string())?
    } else {
        output
    };
    println!("{}", output);
    Ok(())
}

enum BatchOutput<W: Write> {
    Ndjson(NdjsonWriter<W>),
    Array(JsonArrayWriter<W>),
}

impl<W: Write> BatchOutput<W> {
    fn write(&mut self, doc: &serde_json::Value) -> Result<(), SerializationError> {
        match self {
            BatchOutput::Ndjson(writer) => writer.write(doc),
            BatchOutput::Array(writer) => writer.write(doc),
        }
    }

    fn finish(self) -> Result<(), SerializationError> {
        match self {
            BatchOutput::Ndjson(mut writer) => writer.flush(),
            BatchOutput::Array(writer) => writer.finish(),
        }
    }
}

/// Process an NDJSON batch; bad lines are reported on stderr and skipped
fn run_batch(
    dispatcher: &Dispatcher,
    service: Service,
    reader: Box<dyn BufRead>,
    args: &RunArgs,
) -> Result<(), String> {
    let stdout = io::stdout().lock();
    let mut output = if args.array {
        BatchOutput::Array(JsonArrayWriter::new(stdout).map_err(|e| e.to_string())?)
    } else {
        BatchOutput::Ndjson(NdjsonWriter::new(stdout))
    };

    let mut processed = 0;
    let mut failed = 0;

    for (line_num, doc) in read_ndjson(reader) {
        processed += 1;
        let result = doc
            .map_err(|e| e.to_string())
            .and_then(|doc| {
                dispatcher
                    .process(service, doc, &args.params, args.contributor.as_deref())
                    .map_err(|e| e.to_string())
            });

        match result {
            Ok(out) => output.write(&out).map_err(|e| e.to_string())?,
            Err(e) => {
                failed += 1;
                eprintln!("Line {}: {}", line_num, e);
            }
        }
    }

    output.finish().map_err(|e| e.to_string())?;
    tracing::info!("{}: processed {} documents, {} failed", service, processed, failed);
    Ok(())
}

fn parse_dates(texts: &[String], preserve: bool) -> Result<(), String> {
    let normalizer = if preserve {
        TemporalNormalizer::preserving_precision()
    } else {
        TemporalNormalizer::default()
    };

    for text in texts {
        match normalizer.parse_date_or_range(text) {
            Some(range) => println!("{}\t{}\t{}", text, range.start, range.end),
            None => println!("{}\t-", text),
        }
    }
    Ok(())
}

fn list_services() -> Result<(), String> {
    for service in Service::ALL {
        println!("{:<24} {}", service.name(), service.description());
    }
    Ok(())
}
