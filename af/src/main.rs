//! AppForge - app generation pipeline
//!
//! CLI entry point: loads config, builds the LLM client once and runs the
//! pipeline against it.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, info};

use appforge::cli::{Cli, Command, OutputFormat};
use appforge::config::Config;
use appforge::llm::create_client;
use appforge::{Pipeline, PipelineState, TaskPlan};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Can't log here yet, the subscriber isn't installed
    let log_path = appforge::cli::get_log_path();
    let log_dir = log_path.parent().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > INFO
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    setup_logging(cli.log_level.as_deref(), config.log_level.as_deref()).context("Failed to setup logging")?;
    info!(provider = %config.llm.provider, model = %config.llm.model, "AppForge loaded config");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Build {
            prompt,
            recursion_limit,
            project_dir,
            format,
        } => {
            if let Some(limit) = recursion_limit {
                config.pipeline.recursion_limit = limit;
            }
            if let Some(dir) = project_dir {
                config.pipeline.project_dir = dir;
            }
            cmd_build(&config, &prompt, format).await
        }
        Command::Plan { prompt, format } => cmd_plan(&config, &prompt, format).await,
        Command::Config => cmd_config(&config),
    }
}

fn build_pipeline(config: &Config) -> Result<Pipeline> {
    config.validate()?;
    let llm = create_client(&config.llm).context("Failed to create LLM client")?;
    Ok(Pipeline::from_config(llm, config))
}

async fn cmd_build(config: &Config, prompt: &str, format: OutputFormat) -> Result<()> {
    let pipeline = build_pipeline(config)?;
    if matches!(format, OutputFormat::Text) {
        println!(
            "{} {}",
            "Building".bright_cyan().bold(),
            config.pipeline.project_dir.display()
        );
    }

    let state = pipeline.run(prompt).await.context("Pipeline run failed")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&state)?),
        OutputFormat::Text => print_build_summary(&state, config),
    }
    Ok(())
}

async fn cmd_plan(config: &Config, prompt: &str, format: OutputFormat) -> Result<()> {
    let pipeline = build_pipeline(config)?;
    let state = pipeline.plan(prompt).await.context("Planning failed")?;

    let Some(task_plan) = &state.task_plan else {
        eyre::bail!("Planning finished without a task plan");
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(task_plan)?),
        OutputFormat::Text => print_task_plan(task_plan),
    }
    Ok(())
}

fn cmd_config(config: &Config) -> Result<()> {
    let resolved = config.llm.resolve()?;
    print!("{}", serde_yaml::to_string(config).context("Failed to serialize config")?);
    println!();
    println!("{}", "Resolved LLM".bold());
    println!("  {:12} {}", "provider".yellow(), resolved.provider);
    println!("  {:12} {}", "model".yellow(), resolved.model);
    println!("  {:12} {}", "endpoint".yellow(), resolved.base_url);

    let key_state = if std::env::var(&resolved.api_key_env).is_ok() {
        "set".green()
    } else {
        "missing".red()
    };
    println!("  {:12} {} ({})", "api key".yellow(), resolved.api_key_env, key_state);
    Ok(())
}

fn print_task_plan(task_plan: &TaskPlan) {
    if let Some(plan) = &task_plan.plan {
        println!("{} {}", plan.name.bold(), format!("({})", plan.techstack).dimmed());
        println!("{}", plan.description);
        println!();
    }

    for (i, task) in task_plan.implementation_steps.iter().enumerate() {
        println!("{:>3}. {}", i + 1, task.filepath.yellow());
        println!("     {}", task.task_description);
    }
}

fn print_build_summary(state: &PipelineState, config: &Config) {
    let steps = state.coder_state.as_ref().map(|c| c.current_step_idx).unwrap_or(0);
    let name = state.plan.as_ref().map(|p| p.name.as_str()).unwrap_or("app");

    if let Some(task_plan) = &state.task_plan {
        for task in &task_plan.implementation_steps {
            let mark = if config.pipeline.project_dir.join(&task.filepath).is_file() {
                "✓".green()
            } else {
                "✗".red()
            };
            println!("  {} {}", mark, task.filepath);
        }
    }
    println!(
        "{} {} in {} ({} steps, run {})",
        "Generated".green().bold(),
        name,
        config.pipeline.project_dir.display(),
        steps,
        state.run_id.dimmed()
    );
}
