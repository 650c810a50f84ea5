mod corpus;
mod error;
mod parser;
mod record;
mod settings;

use std::fs;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use parser::markup::{CleanStrategy, Normalizer};
use record::{IndexDocument, NormalizedArticle};
use settings::Settings;

#[derive(Parser)]
#[command(
    name = "wikivoyage_prep",
    about = "Clean, filter and section a Wikivoyage dump for indexing"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean, filter and split every dump file under INPUT_DIR
    Prepare {
        /// Extracted dump directory (default from settings)
        input: Option<PathBuf>,
        /// Where sectioned JSON lines are written (default from settings)
        output: Option<PathBuf>,
        /// Only files whose name starts with this prefix are read
        #[arg(long)]
        prefix: Option<String>,
        /// Skip the wiki parser and clean with regexes only
        #[arg(long)]
        regex_only: bool,
    },
    /// Clean one raw markup file (or stdin) and print the result
    Clean {
        /// Markup file, or '-' for stdin
        path: Option<PathBuf>,
        #[arg(long)]
        regex_only: bool,
        /// Print the section map as JSON instead of the plain text
        #[arg(long)]
        sections: bool,
    },
    /// Turn a sectioned file into labelled documents for the indexer
    Render {
        /// Sectioned JSON lines file
        path: PathBuf,
    },
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(io::stderr)
        .try_init();
}

fn normalizer_for(regex_only: bool) -> Normalizer {
    let strategy = if regex_only {
        CleanStrategy::RegexOnly
    } else {
        CleanStrategy::detect()
    };
    Normalizer::new(strategy)
}

fn main() -> Result<()> {
    init_tracing();
    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load().context("failed to load settings")?;
    info!(settings = ?settings, "settings loaded");

    match cli.command {
        Commands::Prepare {
            input,
            output,
            prefix,
            regex_only,
        } => {
            let input = input.unwrap_or(settings.input_dir);
            let output = output.unwrap_or(settings.output_dir);
            let prefix = prefix.unwrap_or(settings.file_prefix);
            let normalizer = normalizer_for(regex_only || settings.regex_only);

            println!("WikiVoyage Data Preparation");
            println!("{}", "=".repeat(70));
            println!("Input directory:  {}", input.display());
            println!("Output directory: {}", output.display());
            println!("{}\n", "=".repeat(70));

            let run = corpus::process_directory(&normalizer, &input, &output, &prefix)?;
            if run.files_processed + run.files_failed > 0 {
                println!();
                run.print(&output);
            }
            println!("\nDone in {}", format_duration(t0.elapsed()));
        }
        Commands::Clean {
            path,
            regex_only,
            sections,
        } => {
            let raw = match path {
                Some(path) if path.as_os_str() != "-" => fs::read_to_string(&path)
                    .with_context(|| format!("failed to read '{}'", path.display()))?,
                _ => {
                    let mut buf = String::new();
                    io::stdin()
                        .read_to_string(&mut buf)
                        .context("failed to read stdin")?;
                    buf
                }
            };

            let cleaned = normalizer_for(regex_only || settings.regex_only).clean(&raw);
            if sections {
                let map = parser::sections::split_sections(&cleaned);
                let json: serde_json::Map<String, serde_json::Value> = map
                    .iter()
                    .map(|(section, content)| (section.key().to_string(), content.into()))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&json)?);
            } else {
                println!("{cleaned}");
            }
        }
        Commands::Render { path } => {
            let file = fs::File::open(&path)
                .with_context(|| format!("failed to open '{}'", path.display()))?;
            let stdout = io::stdout();
            let mut out = stdout.lock();
            for (idx, line) in BufReader::new(file).lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let article: NormalizedArticle = serde_json::from_str(&line)
                    .with_context(|| format!("{}:{}: bad record", path.display(), idx + 1))?;
                serde_json::to_writer(&mut out, &IndexDocument::from(&article))?;
                out.write_all(b"\n")?;
            }
        }
    }

    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn cli_parses_prepare_overrides() {
        let cli = Cli::try_parse_from([
            "wikivoyage_prep",
            "prepare",
            "dump",
            "out",
            "--prefix",
            "wiki_",
            "--regex-only",
        ])
        .unwrap();
        match cli.command {
            Commands::Prepare {
                input,
                output,
                prefix,
                regex_only,
            } => {
                assert_eq!(input, Some(PathBuf::from("dump")));
                assert_eq!(output, Some(PathBuf::from("out")));
                assert_eq!(prefix.as_deref(), Some("wiki_"));
                assert!(regex_only);
            }
            _ => panic!("expected prepare"),
        }
    }

    #[test]
    fn regex_only_flag_forces_fallback() {
        assert_eq!(normalizer_for(true).strategy(), CleanStrategy::RegexOnly);
        assert_eq!(normalizer_for(false).strategy(), CleanStrategy::detect());
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
        assert_eq!(format_duration(Duration::from_secs(3725)), "1h 2m 5s");
    }
}
