use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use dossier::{
    export_tickets, load_ticket_drafts, load_transcript_file, load_transcript_text,
    render_report, render_utterances, resolve_quote, write_report, AnthropicConfig,
    AnthropicGenerator, DetailCache, ExportConfig, LinearClient, TrackerClient,
};

#[derive(Parser)]
#[command(name = "dossier")]
#[command(author, version, about = "Review transcript evidence and export tickets to a tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a transcript and print its utterances
    Parse {
        /// Input transcript file
        #[arg(short, long)]
        transcript: PathBuf,

        /// Print utterances as JSON instead of text
        #[arg(long)]
        json: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Locate the utterance that best matches a quote
    Align {
        /// Input transcript file
        #[arg(short, long)]
        transcript: PathBuf,

        /// Quote text to locate
        #[arg(short, long)]
        quote: String,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Export ticket drafts to the issue tracker
    Export {
        /// Ticket drafts file (JSON array)
        #[arg(long)]
        tickets: PathBuf,

        /// Comma-separated ticket ids to export (default: all)
        #[arg(long, value_delimiter = ',')]
        select: Option<Vec<String>>,

        /// Linear team id to create issues in
        #[arg(long)]
        team: String,

        /// Transcript file used as generation context
        #[arg(long)]
        transcript: Option<PathBuf>,

        /// Deep link back to the source meeting, attached to each issue
        #[arg(long)]
        source_url: Option<String>,

        /// Write the machine-readable report to this file
        #[arg(long)]
        report: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Parse {
            transcript,
            json,
            verbose,
        } => {
            setup_logging(verbose);
            parse_command(transcript, json)
        }
        Commands::Align {
            transcript,
            quote,
            verbose,
        } => {
            setup_logging(verbose);
            align_command(transcript, &quote)
        }
        Commands::Export {
            tickets,
            select,
            team,
            transcript,
            source_url,
            report,
            verbose,
        } => {
            setup_logging(verbose);
            export_command(tickets, select, team, transcript, source_url, report).await
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn parse_command(transcript: PathBuf, json: bool) -> Result<()> {
    let utterances = load_transcript_file(&transcript)?;
    info!("Parsed {} utterances from {:?}", utterances.len(), transcript);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&utterances).context("Failed to serialize utterances")?
        );
    } else {
        print!("{}", render_utterances(&utterances));
    }
    Ok(())
}

fn align_command(transcript: PathBuf, quote: &str) -> Result<()> {
    let utterances = load_transcript_file(&transcript)?;

    match resolve_quote(&utterances, quote) {
        Some(index) => {
            let matched = &utterances[index];
            println!("Matched utterance {}", index);
            if matched.is_anonymous() {
                println!("  {}", matched.text);
            } else {
                println!("  {}: {}", matched.speaker, matched.text);
            }
        }
        None => println!("Transcript is empty; nothing to align against"),
    }
    Ok(())
}

async fn export_command(
    tickets: PathBuf,
    select: Option<Vec<String>>,
    team: String,
    transcript: Option<PathBuf>,
    source_url: Option<String>,
    report_path: Option<PathBuf>,
) -> Result<()> {
    let drafts = load_ticket_drafts(&tickets)?;

    let selected: Vec<_> = match &select {
        Some(ids) => drafts
            .into_iter()
            .filter(|d| ids.iter().any(|id| id == &d.id))
            .collect(),
        None => drafts,
    };
    if selected.is_empty() {
        anyhow::bail!("No tickets selected for export");
    }
    info!("Exporting {} tickets", selected.len());

    let linear_key = std::env::var("LINEAR_API_KEY")
        .context("LINEAR_API_KEY environment variable not set")?;
    let tracker = LinearClient::new(linear_key, team);

    // Fail before any generation or dispatch if the credentials are bad
    tracker
        .validate_credentials()
        .await
        .context("Credential validation failed; re-authenticate and try again")?;

    let problem_context = match &transcript {
        Some(path) => load_transcript_text(path)?,
        None => String::new(),
    };
    let generator = AnthropicGenerator::new(
        AnthropicConfig::from_env()?,
        problem_context,
        String::new(),
    );

    let cache = DetailCache::new();
    let config = ExportConfig {
        source_link_url: source_url,
        ..Default::default()
    };

    let report = export_tickets(&selected, &tracker, &generator, &cache, &config, |p| {
        info!("{:?}: {}/{}", p.phase, p.done, p.total)
    })
    .await;

    print!("{}", render_report(&report));

    if let Some(path) = report_path {
        write_report(&report, &path)?;
        info!("Report written to {:?}", path);
    }
    Ok(())
}
