//! Command-line interface for notion-asr.
//!
//! Provides commands for running the transcription pass, listing pending
//! records, and showing the resolved configuration.

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::{redact, SettingsArgs};
use crate::core::Orchestrator;

/// notion-asr - Transcribe pending Notion audio records
#[derive(Parser, Debug)]
#[command(name = "notion-asr")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub settings: SettingsArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Transcribe every pending record (default)
    Run {
        /// Show what would be processed without downloading or updating
        #[arg(long)]
        dry_run: bool,
    },

    /// List pending records
    Pending,

    /// Show resolved configuration (secrets masked)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command.unwrap_or(Commands::Run { dry_run: false }) {
            Commands::Run { dry_run: true } | Commands::Pending => {
                list_pending(&self.settings).await
            }
            Commands::Run { dry_run: false } => run(&self.settings).await,
            Commands::Config => show_config(&self.settings),
        }
    }
}

/// Run one transcription pass
async fn run(args: &SettingsArgs) -> Result<()> {
    let settings = args.resolve()?;
    let orchestrator = Orchestrator::from_settings(&settings);

    eprintln!("🔊 Transcription strategy: {}", orchestrator.strategy());

    let report = orchestrator.run().await?;
    if report.summary.total() > 0 {
        println!();
        println!("Run summary: {}", report.summary);
    }

    Ok(())
}

/// List pending records without touching them
async fn list_pending(args: &SettingsArgs) -> Result<()> {
    let settings = args.resolve()?;
    let orchestrator = Orchestrator::from_settings(&settings);

    let records = orchestrator.pending().await?;
    if records.is_empty() {
        println!("✓ No pending records");
        return Ok(());
    }

    println!("{:<38} {:<10} {:<30}", "RECORD ID", "STATUS", "AUDIO");
    println!("{}", "-".repeat(80));

    for record in &records {
        let audio = record
            .audio()
            .map(|f| match (f.name.is_empty(), f.download_url()) {
                (_, None) => format!("{} (no URL - would fail)", f.name),
                (true, Some(_)) => "(unnamed)".to_string(),
                (false, Some(_)) => f.name.clone(),
            })
            .unwrap_or_else(|| "(none - would skip)".to_string());
        println!(
            "{:<38} {:<10} {:<30}",
            record.id,
            record.status.to_string(),
            audio
        );
    }

    println!("\nTotal: {} pending record(s)", records.len());
    Ok(())
}

/// Show the resolved configuration
fn show_config(args: &SettingsArgs) -> Result<()> {
    let unset = || "(unset)".to_string();

    println!("notion-asr configuration");
    println!("══════════════════════════════════════════════════════════════");
    println!();
    println!("Notion:");
    println!("  Token:        {}", redact(args.notion_token.as_deref()));
    println!(
        "  Database:     {}",
        args.notion_database_id.clone().unwrap_or_else(unset)
    );
    println!("  API URL:      {}", args.notion_api_url);
    println!();
    println!("Aliyun:");
    println!("  Key ID:       {}", redact(args.aliyun_key_id.as_deref()));
    println!("  Key secret:   {}", redact(args.aliyun_key_secret.as_deref()));
    println!("  Region:       {}", args.aliyun_region);

    match args.resolve() {
        Ok(settings) => {
            println!("  Scan endpoint: {}", settings.aliyun.scan_endpoint);
            println!("  Task endpoint: {}", settings.aliyun.task_endpoint);
            println!();
            println!("Recognition:");
            println!("  Strategy:     {:?}", settings.asr.strategy);
            println!("  Sample rate:  {}", settings.asr.sample_rate);
            println!("  Format:       {}", settings.asr.format);
            println!("  Words:        {}", settings.asr.enable_words);
            println!();
            println!("✓ Configuration complete");
        }
        Err(e) => {
            println!();
            println!("⚠️  {}", e);
        }
    }

    Ok(())
}
