mod ai;
mod colors;
mod config;
mod error;
mod help;
mod latency;
mod scene;
mod settings;
mod terminal;
mod topology;
mod viz;

use ai::client::GeminiClient;
use ai::flows::{self, Flow, FlowContext};
use ai::TextGenerator;
use clap::{Args, Parser, Subcommand};
use config::{parse_providers, GlobeConfig, LinkMode};
use error::Result;
use latency::history::historical_series;
use latency::realtime::generate_realtime_snapshot;
use log::{error, info, warn, LevelFilter};
use rand::rngs::StdRng;
use rand::SeedableRng;
use settings::Settings;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use terminal::Terminal;
use topology::default_topology;

#[derive(Parser)]
#[command(name = "geoquantica")]
#[command(author = "GeoQuantica Developers")]
#[command(version = "0.1.0")]
#[command(about = "geoquantica: exchange-to-cloud latency on a terminal globe", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive rotating globe with live latency arcs
    Globe(GlobeArgs),

    /// Print one real-time latency snapshot as JSON
    Snapshot {
        /// Random seed for reproducibility
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Print a synthetic historical series for an exchange-region pair as JSON
    History {
        /// Pair key, e.g. okx-aws-ap-northeast-1
        pair: String,

        /// Lookback window in hours
        #[arg(long, default_value = "24", allow_negative_numbers = true)]
        hours: f64,
    },

    /// Ask the model for latency alerts
    Analyze(FlowArgs),

    /// Ask the model for optimal server pairings
    Suggest(FlowArgs),

    /// Ask the model for routing adjustments
    Adapt(FlowArgs),
}

#[derive(Args)]
struct GlobeArgs {
    /// Show only these exchanges (repeatable)
    #[arg(short, long = "exchange")]
    exchanges: Vec<String>,

    /// Show only regions of these providers: AWS, GCP, Azure, Other (repeatable)
    #[arg(short, long = "provider")]
    providers: Vec<String>,

    /// Hide links slower than this many milliseconds
    #[arg(short, long)]
    max_latency: Option<f64>,

    /// Hide latency arcs
    #[arg(long)]
    hide_connections: bool,

    /// Hide cloud-region markers
    #[arg(long)]
    hide_regions: bool,

    /// Start with auto-rotation off
    #[arg(long)]
    no_rotate: bool,

    /// Start showing logical topology links instead of live latency
    #[arg(long)]
    topology: bool,

    /// Random seed for reproducibility
    #[arg(short, long)]
    seed: Option<u64>,

    /// Animation speed (seconds per frame, 0 to 10)
    #[arg(short, long, default_value = "0.03", value_parser = parse_frame_time)]
    time: f32,
}

const MAX_FRAME_TIME: f32 = 10.0;

fn parse_frame_time(s: &str) -> std::result::Result<f32, String> {
    let secs: f32 = s.parse().map_err(|e| format!("{e}"))?;
    if secs.is_finite() && (0.0..=MAX_FRAME_TIME).contains(&secs) {
        Ok(secs)
    } else {
        Err(format!("frame time must be between 0 and {MAX_FRAME_TIME} seconds"))
    }
}

#[derive(Args)]
struct FlowArgs {
    /// History window sent with the request, in hours
    #[arg(long, allow_negative_numbers = true)]
    hours: Option<f64>,

    /// Random seed for the snapshot
    #[arg(short, long)]
    seed: Option<u64>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let interactive = matches!(cli.command, Commands::Globe(_));
    init_logger(interactive);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            if interactive {
                eprintln!("geoquantica: {e}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load();

    match cli.command {
        Commands::Globe(args) => {
            let config = globe_config(&settings, args)?;
            let generator: Arc<dyn TextGenerator> = Arc::new(GeminiClient::from_settings(&settings.ai));
            let mut term = Terminal::new(true)?;
            viz::globe::run(&mut term, config, generator)?;
        }
        Commands::Snapshot { seed } => {
            let ranges = settings.generator.ranges()?;
            let mut rng = seeded(seed.or(settings.generator.seed));
            let snapshot = generate_realtime_snapshot(default_topology(), &ranges, &mut rng);
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        Commands::History { pair, hours } => {
            if pair != "all" && !default_topology().pair_keys().contains(&pair) {
                warn!("{pair} is not a known exchange-region pair; generating anyway");
            }
            let series = historical_series(&pair, hours)?;
            println!("{}", serde_json::to_string_pretty(&series)?);
        }
        Commands::Analyze(args) => run_flow(&settings, Flow::Analyze, args)?,
        Commands::Suggest(args) => run_flow(&settings, Flow::Suggest, args)?,
        Commands::Adapt(args) => run_flow(&settings, Flow::Adapt, args)?,
    }

    Ok(())
}

fn globe_config(settings: &Settings, args: GlobeArgs) -> Result<GlobeConfig> {
    let mut config = GlobeConfig::from_settings(settings)?;
    if !args.exchanges.is_empty() {
        config.filters.exchange_allowlist = args.exchanges.into_iter().collect();
    }
    if !args.providers.is_empty() {
        config.filters.provider_allowlist = parse_providers(&args.providers)?;
    }
    if let Some(ms) = args.max_latency {
        config.filters.max_latency_ms = ms;
    }
    config.filters.show_connections &= !args.hide_connections;
    config.filters.show_regions &= !args.hide_regions;
    config.auto_rotate &= !args.no_rotate;
    if args.topology {
        config.mode = LinkMode::Topology;
    }
    config.seed = args.seed.or(config.seed);
    config.time_step = args.time;
    Ok(config)
}

fn run_flow(settings: &Settings, flow: Flow, args: FlowArgs) -> Result<()> {
    let topology = default_topology();
    let ranges = settings.generator.ranges()?;
    let mut rng = seeded(args.seed.or(settings.generator.seed));
    let snapshot = generate_realtime_snapshot(topology, &ranges, &mut rng);
    let ctx = FlowContext::gather(topology, &snapshot, args.hours.unwrap_or(settings.globe.analysis_hours))?;

    let client = GeminiClient::from_settings(&settings.ai);
    info!("running {:?} against {} links", flow, snapshot.links.len());
    let output = flows::run(&client, flow, &ctx)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn seeded(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}

fn init_logger(to_file: bool) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(LevelFilter::Info).parse_default_env();
    if to_file {
        // stderr would draw over the alternate screen
        let target: Box<dyn io::Write + Send> = match open_log_file() {
            Ok(file) => Box::new(file),
            Err(_) => Box::new(io::sink()),
        };
        builder.target(env_logger::Target::Pipe(target));
    }
    builder.init();
}

fn open_log_file() -> io::Result<File> {
    let dir = dirs::cache_dir().unwrap_or_else(|| PathBuf::from(".")).join("geoquantica");
    fs::create_dir_all(&dir)?;
    OpenOptions::new().create(true).append(true).open(dir.join("geoquantica.log"))
}
