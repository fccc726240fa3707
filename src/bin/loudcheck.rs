use std::{path::PathBuf, time::Duration};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use loudcheck::{
    AnalysisOptions, AnalysisOutcome, Analyzer, AudioStreamDescriptor, ComplianceReport,
    ComplianceStandard, LoudnessMetrics, STANDARDS, SourceLocator, StreamingPolicy, ToolPaths,
    classify,
};

const CLI_AFTER_HELP: &str = "Examples:\n  loudcheck analyze programme.mxf\n  loudcheck analyze https://cdn.example.com/promo.mp4 --standard streaming --json\n  loudcheck analyze s3://media/show.mov --stream 1 --list-streams --streaming verified\n  loudcheck streams input.mkv --json\n  loudcheck completions zsh > _loudcheck";

#[derive(Debug, Parser)]
#[command(
    name = "loudcheck",
    version,
    about = "Measure loudness and check EBU R128 compliance of local and remote media",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show additional logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// Path to the ffmpeg binary.
    #[arg(long, global = true)]
    ffmpeg: Option<PathBuf>,

    /// Path to the ffprobe binary.
    #[arg(long, global = true)]
    ffprobe: Option<PathBuf>,

    /// Directory for temporary downloads.
    #[arg(long, global = true)]
    staging_dir: Option<PathBuf>,

    /// When to measure remote sources in place (heuristic, verified, never).
    #[arg(long, global = true)]
    streaming: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Measure loudness and evaluate compliance.
    #[command(
        about = "Measure loudness and check compliance",
        visible_alias = "check",
        after_help = "Examples:\n  loudcheck analyze input.wav\n  loudcheck analyze input.mov --stream 2 --standard atsc-a85 --json"
    )]
    Analyze {
        /// Input path, HTTP(S) URL, or s3://bucket/key.
        input: String,
        /// Compliance standard (see `loudcheck standards`).
        #[arg(long, default_value = "ebu-r128")]
        standard: String,
        /// Audio stream position to measure (0 = first audio stream).
        #[arg(long)]
        stream: Option<u32>,
        /// List and validate audio streams before measuring.
        #[arg(long)]
        list_streams: bool,
        /// Output the result as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// List audio streams.
    #[command(about = "List audio streams", visible_alias = "probe-streams")]
    Streams {
        /// Input path, HTTP(S) URL, or s3://bucket/key.
        input: String,
        /// Output as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the streaming verdict for a locator without running any tool.
    #[command(about = "Classify a locator's streamability")]
    Classify {
        input: String,
        #[arg(long)]
        json: bool,
    },

    /// Run a bounded remote capability probe.
    #[command(about = "Probe a URL for in-place readability")]
    Probe { url: String },

    /// List the built-in compliance standards.
    #[command(about = "List compliance standards")]
    Standards,

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn build_options(global: &GlobalOptions) -> Result<AnalysisOptions, Box<dyn std::error::Error>> {
    let mut options = AnalysisOptions::new();

    if global.ffmpeg.is_some() || global.ffprobe.is_some() {
        let defaults = ToolPaths::from_env();
        options = options.with_tools(ToolPaths::new(
            global.ffmpeg.clone().unwrap_or(defaults.ffmpeg),
            global.ffprobe.clone().unwrap_or(defaults.ffprobe),
        ));
    }

    if let Some(dir) = &global.staging_dir {
        options = options.with_staging_dir(dir);
    }

    if let Some(policy) = &global.streaming {
        let parsed = StreamingPolicy::from_name(policy)
            .ok_or(format!("unsupported --streaming policy: {policy}"))?;
        options = options.with_streaming_policy(parsed);
    }

    Ok(options)
}

fn spinner(message: String) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let bar = ProgressBar::new_spinner();
    bar.set_style(ProgressStyle::with_template("{spinner:.green} {msg}")?);
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(120));
    Ok(bar)
}

fn format_metric(value: f64, unit: &str, measured: bool) -> String {
    if measured {
        format!("{value:.1} {unit}")
    } else {
        "n/a".dimmed().to_string()
    }
}

fn print_streams(streams: &[AudioStreamDescriptor]) {
    if streams.is_empty() {
        println!("{}", "No audio streams".yellow());
        return;
    }
    for (position, stream) in streams.iter().enumerate() {
        println!("  0:a:{position}  {stream}");
    }
}

fn print_metrics(metrics: &LoudnessMetrics) {
    let windows = metrics.has_window_maxima();
    println!("Integrated:     {}", format_metric(metrics.integrated_loudness, "LUFS", true));
    println!("Loudness range: {}", format_metric(metrics.loudness_range, "LU", true));
    println!("True peak:      {}", format_metric(metrics.true_peak_max, "dBTP", true));
    println!("Momentary max:  {}", format_metric(metrics.momentary_max, "LUFS", windows));
    println!("Short-term max: {}", format_metric(metrics.short_term_max, "LUFS", windows));
}

fn print_report(report: &ComplianceReport) {
    if report.is_compliant() {
        println!("{} {}", "PASS".green().bold(), report.standard);
    } else {
        println!("{} {}", "FAIL".red().bold(), report.standard);
    }
    for violation in &report.violations {
        println!("  {} {violation}", "-".red());
    }
    for note in &report.notes {
        println!("  {} {note}", "note:".dimmed());
    }
}

fn outcome_json(
    outcome: &AnalysisOutcome,
    report: &ComplianceReport,
) -> Result<String, serde_json::Error> {
    let payload = json!({
        "source": outcome.source,
        "strategy": outcome.strategy,
        "verdict": outcome.verdict,
        "probe_confirmed": outcome.probe_confirmed,
        "fallback_reason": outcome.fallback_reason,
        "streams": outcome.streams,
        "metrics": outcome.metrics,
        "window_maxima_measured": outcome.metrics.has_window_maxima(),
        "compliance": report,
    });
    serde_json::to_string_pretty(&payload)
}

async fn run() -> Result<bool, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    match cli.command {
        Commands::Analyze {
            input,
            standard,
            stream,
            list_streams,
            json,
        } => {
            let standard = ComplianceStandard::lookup(&standard)?;
            let options = build_options(&cli.global)?.with_stream_listing(list_streams);
            let analyzer = Analyzer::new(options);
            let locator = SourceLocator::parse(&input)?;

            let progress = if json {
                None
            } else {
                Some(spinner(format!("Measuring {locator}"))?)
            };
            let result = analyzer.analyze(&locator, stream).await;
            if let Some(bar) = &progress {
                bar.finish_and_clear();
            }

            let outcome = result?;
            let report = standard.evaluate(&outcome.metrics);

            if json {
                println!("{}", outcome_json(&outcome, &report)?);
            } else {
                println!("Source: {} ({:?})", outcome.source, outcome.strategy);
                if let Some(reason) = &outcome.fallback_reason {
                    println!("{} {reason}", "fallback:".yellow().bold());
                }
                if let Some(streams) = &outcome.streams {
                    println!("Audio streams:");
                    print_streams(streams);
                }
                print_metrics(&outcome.metrics);
                print_report(&report);
            }
            return Ok(report.is_compliant());
        }
        Commands::Streams { input, json } => {
            let analyzer = Analyzer::new(build_options(&cli.global)?);
            let locator = SourceLocator::parse(&input)?;
            let streams = analyzer.list_streams(&locator).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&streams)?);
            } else {
                print_streams(&streams);
            }
        }
        Commands::Classify { input, json } => {
            let verdict = classify(&input);
            if json {
                println!("{}", serde_json::to_string_pretty(&verdict)?);
            } else {
                let streamable = if verdict.can_stream {
                    "streamable".green().bold()
                } else {
                    "download".yellow().bold()
                };
                println!(
                    "{streamable} format={} confidence={}",
                    if verdict.format.is_empty() { "<none>" } else { verdict.format.as_str() },
                    verdict.confidence
                );
                if let Some(reason) = &verdict.reason {
                    println!("reason: {reason}");
                }
            }
        }
        Commands::Probe { url } => {
            let analyzer = Analyzer::new(build_options(&cli.global)?);
            if analyzer.probe(&url).await {
                println!("{} {url}", "readable".green().bold());
            } else {
                println!("{} {url}", "unreadable".red().bold());
                return Ok(false);
            }
        }
        Commands::Standards => {
            for standard in STANDARDS {
                println!(
                    "{:<12} {:>6.1} LUFS ±{:.1}  TP ≤ {:.1} dBTP  {}",
                    standard.name.bold(),
                    standard.target_integrated,
                    standard.tolerance,
                    standard.max_true_peak,
                    standard.description
                );
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "loudcheck", &mut std::io::stdout());
        }
    }

    Ok(true)
}

#[tokio::main]
async fn main() {
    match run().await {
        Ok(true) => {}
        Ok(false) => std::process::exit(2),
        Err(error) => {
            eprintln!("{} {error}", "error:".red().bold());
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, GlobalOptions, build_options, format_metric};
    use clap::CommandFactory;
    use loudcheck::StreamingPolicy;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn streaming_policy_flag() {
        let global = GlobalOptions {
            streaming: Some("Verified".to_string()),
            ..GlobalOptions::default()
        };
        let options = build_options(&global).unwrap();
        assert_eq!(options.streaming_policy(), StreamingPolicy::Verified);

        let global = GlobalOptions {
            streaming: Some("sometimes".to_string()),
            ..GlobalOptions::default()
        };
        assert!(build_options(&global).is_err());
    }

    #[test]
    fn staging_dir_flag() {
        let global = GlobalOptions {
            staging_dir: Some("/var/tmp/loudcheck".into()),
            ..GlobalOptions::default()
        };
        let options = build_options(&global).unwrap();
        assert_eq!(options.staging_dir().to_str(), Some("/var/tmp/loudcheck"));
    }

    #[test]
    fn unmeasured_metric_is_not_printed_as_zero() {
        assert_eq!(format_metric(-23.04, "LUFS", true), "-23.0 LUFS");
        assert!(format_metric(0.0, "LUFS", false).contains("n/a"));
    }
}
