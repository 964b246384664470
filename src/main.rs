use anyhow::{anyhow, Result};
use clap::{Arg, ArgMatches, Command};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use clip_conductor::config::Config;
use clip_conductor::llm::OllamaClient;
use clip_conductor::metadata::{optimize_for_platform, MetadataGenerator, Platform};
use clip_conductor::processing::{BatchProcessor, BatchReport, ClipProcessor};
use clip_conductor::scanner::ClipScanner;
use clip_conductor::sinks::LoggingSink;
use clip_conductor::watcher::FolderWatcher;

fn cli() -> Command {
    Command::new("Clip Conductor")
        .version("0.1.0")
        .author("TigreRoll")
        .about("Watches gaming clips and generates social-media metadata with a local LLM")
        .subcommand_required(true)
        .arg(
            Arg::new("dir")
                .short('d')
                .long("dir")
                .value_name("DIR")
                .help("Clip folder (overrides the configured watch directory)")
                .global(true),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file")
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(Command::new("scan").about("List existing clips"))
        .subcommand(
            Command::new("process")
                .about("Generate metadata for existing clips")
                .arg(
                    Arg::new("limit")
                        .short('l')
                        .long("limit")
                        .value_name("NUM")
                        .help("Maximum number of clips to process")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("FILE")
                        .help("Write the batch report as JSON"),
                ),
        )
        .subcommand(Command::new("watch").about("Process new clips as they appear"))
        .subcommand(Command::new("models").about("List models on the Ollama server"))
        .subcommand(
            Command::new("generate")
                .about("Generate metadata for a clip title")
                .arg(
                    Arg::new("title")
                        .short('t')
                        .long("title")
                        .value_name("TITLE")
                        .required(true),
                )
                .arg(Arg::new("game").short('g').long("game").value_name("GAME"))
                .arg(
                    Arg::new("duration")
                        .long("duration")
                        .value_name("SECONDS")
                        .value_parser(clap::value_parser!(u32)),
                ),
        )
        .subcommand(
            Command::new("analyze")
                .about("Analyze a clip's content and engagement potential")
                .arg(
                    Arg::new("title")
                        .short('t')
                        .long("title")
                        .value_name("TITLE")
                        .required(true),
                )
                .arg(Arg::new("file").short('f').long("file").value_name("PATH")),
        )
        .subcommand(Command::new("stats").about("Clip counts and sizes per game"))
        .subcommand(Command::new("health").about("Check the clip folder and the LLM server"))
}

fn load_config(matches: &ArgMatches) -> Result<Config> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => Config::load_from(Path::new(path))?,
        None => Config::load()?,
    };

    if let Some(dir) = matches.get_one::<String>("dir") {
        config.monitor.watch_dir = PathBuf::from(dir);
    }

    config.validate()?;
    Ok(config)
}

fn log_filter(config: &Config, verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new("clip_conductor=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("clip_conductor={},warn", config.output.log_level))
        })
    }
}

/// Verbose mode also prints targets and thread ids
fn init_logging(config: &Config, verbose: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(config, verbose))
        .with_target(verbose)
        .with_thread_ids(verbose)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    let config = load_config(&matches)?;
    init_logging(&config, matches.get_flag("verbose"));

    info!("🚀 Clip Conductor starting...");
    info!("{}", config.summary());

    let llm = Arc::new(OllamaClient::new(config.llm.clone())?);
    let generator = MetadataGenerator::new(llm.clone());
    let scanner = ClipScanner::new(config.monitor.clone());
    let processor = ClipProcessor::new(generator.clone(), Arc::new(LoggingSink), Arc::new(LoggingSink));
    let root = config.monitor.watch_dir.clone();

    match matches.subcommand() {
        Some(("scan", _)) => {
            let clips = scanner.scan_existing_clips(&root).await;
            for clip in &clips {
                println!(
                    "{}\t{}\t{}",
                    clip.game_name.as_deref().unwrap_or("Unknown"),
                    clip.file_size.unwrap_or(0),
                    clip.clip_id()
                );
            }
        }
        Some(("process", args)) => {
            let limit = args
                .get_one::<usize>("limit")
                .copied()
                .unwrap_or(config.processing.batch_limit);
            let output = args
                .get_one::<String>("output")
                .map(PathBuf::from)
                .or_else(|| config.output.results_file.clone());

            let batch = BatchProcessor::new(scanner, processor, root, config.processing.workers);
            let report = batch.process_batch(limit).await;
            print_report(&report);

            if let Some(path) = output {
                let json = serde_json::to_string_pretty(&report)?;
                tokio::fs::write(&path, json).await?;
                info!("💾 Batch report saved to: {}", path.display());
            }
        }
        Some(("watch", _)) => {
            let mut watcher = FolderWatcher::new(processor, config.monitor.clone(), &config.processing);
            if !watcher.start_monitoring(&root)? {
                return Err(anyhow!("Clip folder not found: {}", root.display()));
            }

            tokio::signal::ctrl_c().await?;
            info!("🛑 Shutdown requested, finishing queued clips...");
            watcher.stop_and_drain().await;
        }
        Some(("models", _)) => {
            let models = llm.list_models().await;
            if models.is_empty() {
                warn!("No models reported by {}", llm.base_url());
            }
            for model in models {
                println!("{}", model.name);
            }
        }
        Some(("generate", args)) => {
            let title = args
                .get_one::<String>("title")
                .ok_or_else(|| anyhow!("--title is required"))?;
            let game = args.get_one::<String>("game").map(String::as_str);
            let duration = args.get_one::<u32>("duration").copied();

            let generated = generator.generate_with_source(title, game, duration).await;
            let optimized: Vec<_> = Platform::ALL
                .iter()
                .map(|&platform| {
                    json!({
                        "platform": platform,
                        "metadata": optimize_for_platform(&generated.record, platform),
                    })
                })
                .collect();

            let output = json!({
                "metadata": generated.record,
                "source": generated.source,
                "optimized": optimized,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Some(("analyze", args)) => {
            let title = args
                .get_one::<String>("title")
                .ok_or_else(|| anyhow!("--title is required"))?;
            let file = args.get_one::<String>("file").map(String::as_str).unwrap_or("");

            let analysis = generator.analyze_content(title, file).await;
            println!("{}", serde_json::to_string_pretty(&analysis)?);
        }
        Some(("stats", _)) => {
            let stats = scanner.clip_stats(&root).await;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Some(("health", _)) => {
            let monitor = scanner.health(&root).await;
            let llm_health = llm.health().await;
            if !llm_health.reachable {
                error!("❌ Ollama server unreachable at {}", llm_health.base_url);
            }

            let output = json!({ "monitor": monitor, "llm": llm_health });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        _ => return Err(anyhow!("No subcommand given, see --help")),
    }

    Ok(())
}

fn print_report(report: &BatchReport) {
    info!("🎉 Processing completed in {:.2}s", report.total_time.as_secs_f64());
    info!("✅ Successful: {}", report.succeeded);
    info!("❌ Failed: {}", report.failed);
    info!(
        "📊 Success rate: {:.1}%",
        if report.attempted > 0 {
            report.succeeded as f64 / report.attempted as f64 * 100.0
        } else {
            0.0
        }
    );

    for result in &report.results {
        if let Some(metadata) = &result.metadata {
            println!("{}\t{}", result.clip.original_filename(), metadata.title);
        }
    }
}
