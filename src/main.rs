use anyhow::Result;
use clap::{Parser, ValueEnum};
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clipscout::analysis::{AnalysisPipeline, AnalyzeOptions};
use clipscout::cli::{Cli, Commands, OutputFormat};
use clipscout::config::Config;
use clipscout::extractors::ExtractorRegistry;
use clipscout::matcher::{rank, Preference};
use clipscout::output::{self, Report};
use clipscout::utils;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose {
        "clipscout=debug"
    } else {
        "clipscout=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Check for required external dependencies (non-fatal in Docker)
    if !cli.quiet {
        let missing_deps = utils::check_dependencies().await;
        if !missing_deps.is_empty() {
            eprintln!("⚠️  Dependency check warnings:");
            for dep in missing_deps {
                eprintln!("   • {}", dep);
            }
            eprintln!("   (Continuing anyway - tools may be available)");
        }
    }

    let config = Config::load().await?;

    match cli.command {
        Commands::Recommend {
            url,
            topics,
            sentiment,
            limit,
            output,
            format,
            save_audio,
            no_cache,
        } => {
            // Validate preferences before any download or network work
            let preference = Preference::new(topics.as_deref().unwrap_or(""), &sentiment)?;
            let weights = config.match_weights();
            weights.validate()?;

            let api_key = config.resolve_api_key(cli.api_key.clone())?;
            let format = resolve_format(format, &config);

            let pipeline = AnalysisPipeline::new(config, api_key)?.with_quiet(cli.quiet);

            tracing::info!("Starting analysis for: {}", url);
            let options = AnalyzeOptions {
                save_audio,
                no_cache,
            };
            let outcome = pipeline.analyze_source(&url, &options).await?;

            let mut recommendations =
                rank(&outcome.analysis.segments, &preference, &weights);
            if let Some(limit) = limit {
                recommendations.truncate(limit);
            }

            let report = Report::Recommendations {
                outcome: &outcome,
                recommendations: &recommendations,
                preference: &preference,
            };
            match output {
                Some(path) => {
                    output::save_to_file(&report, &path, format).await?;
                    println!(
                        "{} Recommendations saved to: {}",
                        style("✓").green(),
                        path.display()
                    );
                }
                None => {
                    output::print_to_console(&report, format)?;
                }
            }

            if let Some(audio_path) = &outcome.audio_path {
                println!("Audio saved to: {}", audio_path.display());
            }
        }
        Commands::Analyze {
            url,
            output,
            format,
            save_audio,
            no_cache,
        } => {
            let api_key = config.resolve_api_key(cli.api_key.clone())?;
            let format = resolve_format(format, &config);

            let pipeline = AnalysisPipeline::new(config, api_key)?.with_quiet(cli.quiet);

            tracing::info!("Starting analysis for: {}", url);
            let options = AnalyzeOptions {
                save_audio,
                no_cache,
            };
            let outcome = pipeline.analyze_source(&url, &options).await?;

            let report = Report::Segments { outcome: &outcome };
            match output {
                Some(path) => {
                    output::save_to_file(&report, &path, format).await?;
                    println!(
                        "{} Segments saved to: {}",
                        style("✓").green(),
                        path.display()
                    );
                }
                None => {
                    output::print_to_console(&report, format)?;
                }
            }

            if let Some(audio_path) = &outcome.audio_path {
                println!("Audio saved to: {}", audio_path.display());
            }
        }
        Commands::Config { show } => {
            if show {
                config.display();
            } else {
                println!("Configuration file: {}", Config::config_path()?.display());
                println!("Edit it directly, or run 'clipscout config --show' to view current values.");
            }
        }
        Commands::Platforms => {
            println!("Supported platforms:");
            for platform in ExtractorRegistry::new().list_platforms() {
                println!("  • {}", platform);
            }
            println!("  • Local audio files (mp3, m4a, wav, flac, ogg)");
            println!("  • Local video files (mp4, mkv, avi, mov, and anything ffmpeg reads)");
        }
    }

    Ok(())
}

/// Pick the output format: flag first, then the configured default
fn resolve_format(flag: Option<OutputFormat>, config: &Config) -> OutputFormat {
    if let Some(format) = flag {
        return format;
    }

    match OutputFormat::from_str(&config.app.default_output_format, true) {
        Ok(format) => format,
        Err(_) => {
            tracing::warn!(
                "Unknown default_output_format '{}', using text",
                config.app.default_output_format
            );
            OutputFormat::Text
        }
    }
}
