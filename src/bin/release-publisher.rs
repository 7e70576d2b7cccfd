//! Release Publisher CLI
//!
//! Runs the release-triggered publishing pipeline for a Python package

use anyhow::Result;
use clap::{Parser, Subcommand};
use release_publisher::core::config_loader::{ConfigLoadOptions, ConfigLoader};
use release_publisher::core::event::ReleaseEvent;
use release_publisher::pipeline::provision::parse_python_version;
use release_publisher::security::command_executor::{combined_output, SafeCommandExecutor};
use release_publisher::security::token_manager::SecureTokenManager;
use release_publisher::validation::metadata;
use release_publisher::ReleasePublisher;
use std::path::PathBuf;
use std::process;

/// Release-triggered package publisher
#[derive(Parser)]
#[command(name = "release-publisher")]
#[command(version = "0.1.0")]
#[command(about = "Publishes a tagged release to the package index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline for a release
    Run {
        /// Project path (defaults to current directory)
        #[arg(value_name = "PROJECT_PATH")]
        project_path: Option<PathBuf>,

        /// Path to a release event payload (JSON)
        #[arg(long, conflicts_with = "tag")]
        event: Option<PathBuf>,

        /// Release tag to publish (e.g. v1.2.0)
        #[arg(long)]
        tag: Option<String>,
    },

    /// Check the project is ready to publish
    Check {
        /// Project path (defaults to current directory)
        #[arg(value_name = "PROJECT_PATH")]
        project_path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let result = run().await;

    match result {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("\n❌ Error");
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            project_path,
            event,
            tag,
        } => {
            let path = project_path.unwrap_or_else(|| PathBuf::from("."));

            let release_event = match (event, tag) {
                (Some(payload_path), _) => ReleaseEvent::from_payload_file(&payload_path).await?,
                (None, Some(tag)) => ReleaseEvent::from_tag(&tag)?,
                (None, None) => {
                    eprintln!("Either --event <file> or --tag <tag> is required");
                    return Ok(1);
                }
            };

            run_command(path, release_event).await
        }

        Commands::Check { project_path } => {
            let path = project_path.unwrap_or_else(|| PathBuf::from("."));
            check_command(path).await
        }
    }
}

async fn run_command(path: PathBuf, event: ReleaseEvent) -> Result<i32> {
    let config = ConfigLoader::load(ConfigLoadOptions::for_project(&path)).await?;
    let publisher = ReleasePublisher::new(&path);
    let report = publisher.run(event, config).await?;

    Ok(if report.success { 0 } else { 1 })
}

/// Preflight check: everything the pipeline needs, without side effects.
async fn check_command(path: PathBuf) -> Result<i32> {
    println!("🔍 Checking {}\n", path.display());

    let mut failures = 0usize;

    let config = match ConfigLoader::load(ConfigLoadOptions::for_project(&path)).await {
        Ok(config) => {
            println!("  ✅ Configuration loads");
            config
        }
        Err(e) => {
            println!("  ❌ Configuration: {e}");
            return Ok(1);
        }
    };

    match metadata::resolve(&path).await {
        Ok(metadata) => {
            println!(
                "  ✅ Packaging metadata: {} {}",
                metadata.name.as_deref().unwrap_or("(unknown name)"),
                metadata.version.as_deref().unwrap_or("(dynamic version)")
            );
        }
        Err(e) => {
            println!("  ❌ Packaging metadata: {e}");
            failures += 1;
        }
    }

    match SafeCommandExecutor::new(&path) {
        Ok(executor) => match executor.execute(&config.runtime.interpreter, &["--version"]) {
            Ok(output) if output.status.success() => {
                let text = combined_output(&output);
                match parse_python_version(&text) {
                    Some(found) if found == config.runtime.python => {
                        println!("  ✅ Interpreter: {} {found}", config.runtime.interpreter);
                    }
                    Some(found) => {
                        println!(
                            "  ❌ Interpreter: found {found}, pinned {}",
                            config.runtime.python
                        );
                        failures += 1;
                    }
                    None => {
                        println!("  ❌ Interpreter: unparsable version output: {text}");
                        failures += 1;
                    }
                }
            }
            Ok(output) => {
                println!("  ❌ Interpreter: {}", combined_output(&output));
                failures += 1;
            }
            Err(e) => {
                println!("  ❌ Interpreter: {e}");
                failures += 1;
            }
        },
        Err(e) => {
            println!("  ❌ Project path: {e}");
            failures += 1;
        }
    }

    let tokens = SecureTokenManager::new(&config.index.token_env);
    if tokens.resolve().is_some() {
        println!("  ✅ Token present in {}", config.index.token_env);
    } else {
        println!("  ❌ Token missing: set {}", config.index.token_env);
        failures += 1;
    }

    if failures == 0 {
        println!("\n✅ Ready to publish");
        Ok(0)
    } else {
        println!("\n❌ {failures} check(s) failed");
        Ok(1)
    }
}
