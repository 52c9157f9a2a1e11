use std::fs;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::str::FromStr;
use clap::Parser;
use log::{error, info, LevelFilter};
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use rand::Rng;
use rand_chacha::ChaChaRng;
use rand_core::SeedableRng;
use thiserror::Error;
use decide_tally::census::{create_voters, Census};
use decide_tally::store::MemoryBallotStore;
use decide_tally::{ConfigError, Election, ElectionConfig, ElectionError, ElectionId, Error as TallyError, OptionSet};

const VOTER_COUNT_RANGE: RangeInclusive<usize> = 1..=1000;

fn voter_in_range(s: &str) -> Result<usize, String> {
    usize::from_str(s)
        .map_err(|e| e.to_string())
        .and_then(|n| match VOTER_COUNT_RANGE.contains(&n) {
            true => Ok(n),
            false => Err(format!("voter count should be between {} and {}", VOTER_COUNT_RANGE.start(), VOTER_COUNT_RANGE.end()))
        })
}

fn parse_level(s: &str) -> Result<LevelFilter, String> {
    LevelFilter::from_str(s).map_err(|e| e.to_string())
}

#[derive(Parser, Debug)]
#[clap(author, version, about = "Run a simulated election end to end", long_about = None)]
struct Cli {
    #[clap(value_parser = voter_in_range, short, long, default_value_t = 25)]
    voter_count: usize,

    /// Option labels, numbered from 1 in the given order.
    #[clap(short, long, value_parser, value_delimiter = ',', default_values = &["Chocolate", "Vainilla", "Frambuesa"])]
    options: Vec<String>,

    /// JSON election configuration; defaults apply when omitted.
    #[clap(short, long, value_parser)]
    config: Option<PathBuf>,

    /// Overrides `key_bits` from the configuration.
    #[clap(short, long, value_parser)]
    key_bits: Option<u64>,

    /// Seed the PRNG for a reproducible run.
    #[clap(short, long, value_parser)]
    seed: Option<u64>,

    #[clap(value_parser = parse_level, long, default_value = "info")]
    log_level: LevelFilter,
}

#[derive(Debug, Error)]
enum Error {
    #[error("failed to initialise logging: {0}")]
    Logging(String),
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Options(#[from] TallyError),
    #[error(transparent)]
    Election(#[from] ElectionError),
    #[error("failed to serialize results: {0}")]
    Json(#[from] serde_json::Error),
}

fn init_logging(level: LevelFilter) -> Result<(), Error> {
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("{d(%H:%M:%S%.3f)} {h({l})} {t} - {m}{n}")))
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(level))
        .map_err(|e| Error::Logging(e.to_string()))?;
    log4rs::init_config(config).map_err(|e| Error::Logging(e.to_string()))?;
    Ok(())
}

fn load_config(cli: &Cli) -> Result<ElectionConfig, Error> {
    let mut config = match &cli.config {
        Some(path) => ElectionConfig::from_json(&fs::read_to_string(path)?)?,
        None => ElectionConfig::default(),
    };
    if let Some(bits) = cli.key_bits {
        config.key_bits = bits;
    }
    config.validate()?;
    Ok(config)
}

fn run(cli: Cli) -> Result<(), Error> {
    let config = load_config(&cli)?;
    let mut rng = match cli.seed {
        Some(seed) => ChaChaRng::seed_from_u64(seed),
        None => ChaChaRng::from_entropy(),
    };
    let labels: Vec<&str> = cli.options.iter().map(String::as_str).collect();
    let options = OptionSet::numbered(&labels)?;
    let id = ElectionId(1);

    info!("registering {} voters in the census", cli.voter_count);
    let census = Census::with_voters(id, create_voters(1, cli.voter_count));
    let mut election = Election::new(id, "simulated question", options.clone(), MemoryBallotStore::new(), census);

    info!("generating {}-bit election key", config.key_bits);
    election.generate_keys(&mut rng, &config)?;
    election.open()?;

    // each voter picks an option or abstains
    let mut cast = 0usize;
    for voter in create_voters(1, cli.voter_count) {
        let choice = rng.gen_range(0..=options.len());
        if let Some(code) = options.codes().nth(choice) {
            election.cast(&mut rng, voter, code)?;
            cast += 1;
        }
    }
    info!("{} ballots cast, {} abstentions", cast, cli.voter_count - cast);

    election.close()?;
    let result = election.tally(&config)?;
    for option in result.ranked() {
        info!("{}: {}", option.label, option.votes);
    }
    println!("{}", result.to_json()?);
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = init_logging(cli.log_level) {
        eprintln!("{err}");
        std::process::exit(1)
    }
    if let Err(err) = run(cli) {
        error!("{err}");
        std::process::exit(1)
    }
}
