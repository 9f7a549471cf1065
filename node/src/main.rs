use anyhow::{anyhow, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use celes_storage::{RetentionPolicy, SledStateStore, StateStore};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
mod runtime;
mod script;
mod version;

use config::NodeConfig;
use runtime::{compact_store, NodeRuntime};
use version::{git_commit_hash, CELES_VERSION};

fn cli() -> Command {
    Command::new("celes-node")
        .version(CELES_VERSION)
        .about("Celes system core host")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .global(true),
        )
        .arg(
            Arg::new("data-dir")
                .short('d')
                .long("data-dir")
                .value_name("DIR")
                .help("Data directory")
                .global(true),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .value_parser(["trace", "debug", "info", "warn", "error"])
                .help("Override the log level")
                .global(true),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .value_name("FORMAT")
                .value_parser(["pretty", "json"])
                .help("Select log output format")
                .global(true),
        )
        .subcommand(
            Command::new("init").about("Fund genesis accounts, create the resource market, store the first snapshot"),
        )
        .subcommand(
            Command::new("apply")
                .about("Replay a JSON action script against the stored state")
                .arg(
                    Arg::new("script")
                        .value_name("FILE")
                        .required(true)
                        .help("Script file: a JSON array of steps"),
                )
                .arg(
                    Arg::new("keep-going")
                        .long("keep-going")
                        .action(ArgAction::SetTrue)
                        .help("Log rejected steps and continue instead of stopping"),
                ),
        )
        .subcommand(
            Command::new("show")
                .about("Print the latest stored state")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the whole snapshot as JSON"),
                )
                .arg(
                    Arg::new("balances")
                        .long("balances")
                        .action(ArgAction::SetTrue)
                        .help("List every non-zero ledger balance"),
                ),
        )
        .subcommand(
            Command::new("compact")
                .about("Prune old snapshots")
                .arg(
                    Arg::new("keep")
                        .long("keep")
                        .value_name("COUNT")
                        .value_parser(value_parser!(u64).range(1..))
                        .help("Snapshots to keep (defaults to retain_snapshots)"),
                ),
        )
}

fn main() -> Result<()> {
    let matches = cli().get_matches();

    let config = load_config_with_overrides(&matches)?;
    init_logging(&config)?;
    info!(
        target: "node",
        "celes-node {} (commit {})",
        CELES_VERSION,
        git_commit_hash()
    );

    let result = match matches.subcommand() {
        Some(("init", _)) => run_init(&config),
        Some(("apply", sub)) => run_apply(&config, sub),
        Some(("show", sub)) => run_show(&config, sub),
        Some(("compact", sub)) => run_compact(&config, sub),
        _ => Err(anyhow!("Unsupported command")),
    };
    if let Err(err) = &result {
        error!(target: "node", "{:#}", err);
    }
    result
}

fn load_config_with_overrides(matches: &ArgMatches) -> Result<NodeConfig> {
    let path = matches.get_one::<String>("config").map(PathBuf::from);
    let mut config = NodeConfig::load(path.as_deref())?;

    if let Some(data_dir) = matches.get_one::<String>("data-dir") {
        config.data_dir = PathBuf::from(data_dir);
    }
    if let Some(log_level) = matches.get_one::<String>("log-level") {
        config.log_level = log_level.clone();
    }
    if let Some(log_format) = matches.get_one::<String>("log-format") {
        config.log_format = log_format.clone();
    }
    Ok(config)
}

fn init_logging(config: &NodeConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    if config.log_format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init()?;
    }

    Ok(())
}

fn open_store(config: &NodeConfig) -> Result<Box<dyn StateStore>> {
    let path = config.store_path();
    let store = SledStateStore::new(&path)
        .with_context(|| format!("failed to open state store at {}", path.display()))?;
    Ok(Box::new(store))
}

fn run_init(config: &NodeConfig) -> Result<()> {
    let _lock = DataDirLock::acquire(&config.data_dir, "init")?;
    let runtime = NodeRuntime::genesis(config, open_store(config)?)?;
    println!(
        "Initialised {} at block {} with {} funded accounts",
        config.data_dir.display(),
        runtime.head_block(),
        runtime.balances().len()
    );
    Ok(())
}

fn run_apply(config: &NodeConfig, matches: &ArgMatches) -> Result<()> {
    let path = matches
        .get_one::<String>("script")
        .ok_or_else(|| anyhow!("script path is required"))?;
    let keep_going = matches.get_flag("keep-going");
    let steps = script::load_script(Path::new(path))?;

    let _lock = DataDirLock::acquire(&config.data_dir, "apply")?;
    let mut runtime = NodeRuntime::open(config, open_store(config)?)?;

    let mut rejected = 0usize;
    for (index, step) in steps.iter().enumerate() {
        match runtime.run_step(step) {
            Ok(outcome) => {
                runtime.persist()?;
                let line = serde_json::json!({
                    "step": index,
                    "label": step.label(),
                    "outcome": outcome,
                });
                println!("{}", line);
            }
            Err(err) if keep_going => {
                rejected += 1;
                warn!(
                    target: "node",
                    "step {} ({}) rejected [{:?}]: {}",
                    index,
                    step.label(),
                    err.kind(),
                    err
                );
            }
            Err(err) => {
                return Err(err).with_context(|| format!("step {} ({}) rejected", index, step.label()));
            }
        }
    }

    info!(
        target: "node",
        "applied {} of {} steps, head block {}",
        steps.len() - rejected,
        steps.len(),
        runtime.head_block()
    );
    Ok(())
}

fn run_show(config: &NodeConfig, matches: &ArgMatches) -> Result<()> {
    let runtime = NodeRuntime::open(config, open_store(config)?)?;

    if matches.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&runtime.snapshot())?);
        return Ok(());
    }

    let state = runtime.state();
    let global = &state.global;
    println!("head block:        {}", runtime.head_block());
    println!("revision:          {}", global.revision);
    println!(
        "network active:    {} (block {})",
        global.is_network_active, global.network_active_block
    );
    println!(
        "dbp active:        {} ({} registered)",
        global.is_dbp_active, global.total_dbp_count
    );
    println!("producers:         {}", state.governance.producers.len());
    println!(
        "resource units:    {} reserved of {}",
        global.total_ram_bytes_reserved, global.max_ram_size
    );
    println!("pending transfers: {}", state.outbox.len());
    match runtime.difficulty() {
        Some(difficulty) => println!("difficulty:        {}", difficulty),
        None => println!("difficulty:        unset"),
    }
    if let Some(slate) = runtime.schedule() {
        let names: Vec<String> = slate.iter().map(|entry| entry.producer.to_string()).collect();
        println!("schedule:          {}", names.join(", "));
    }

    if matches.get_flag("balances") {
        println!();
        for (account, quantity) in runtime.balances() {
            println!("{:<14} {}", account.to_string(), quantity);
        }
    }
    Ok(())
}

fn run_compact(config: &NodeConfig, matches: &ArgMatches) -> Result<()> {
    let keep = matches
        .get_one::<u64>("keep")
        .copied()
        .unwrap_or(config.retain_snapshots);
    let _lock = DataDirLock::acquire(&config.data_dir, "compact")?;
    let store = open_store(config)?;
    let report = compact_store(store.as_ref(), &RetentionPolicy::keep_latest(keep))?;
    println!(
        "Pruned {} snapshot(s), {} retained",
        report.pruned_entries, report.retained_entries
    );
    Ok(())
}

/// Exclusive lock on the data directory for commands that write to it.
struct DataDirLock {
    path: PathBuf,
    file: File,
}

impl DataDirLock {
    fn acquire<P: AsRef<Path>>(data_dir: P, purpose: &str) -> Result<Self> {
        let dir = data_dir.as_ref();
        fs::create_dir_all(dir)?;
        let lock_path = dir.join(".celes.lock");
        let file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .read(true)
            .write(true)
            .open(&lock_path)?;

        if let Err(err) = file.try_lock_exclusive() {
            return Err(anyhow!(
                "Data directory {} is locked by another process ({}). \
                 Remove {} if you are sure it is stale.",
                dir.display(),
                err,
                lock_path.display()
            ));
        }

        file.set_len(0)?;
        writeln!(&file, "pid={};purpose={}", std::process::id(), purpose)?;

        Ok(Self {
            path: lock_path,
            file,
        })
    }
}

impl Drop for DataDirLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
        let _ = fs::remove_file(&self.path);
    }
}
