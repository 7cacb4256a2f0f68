//! Command-line front end for the journal core.
//!
//! # Responsibility
//! - Feed OCR text files through the scan pipeline.
//! - Expose entry edits and read models as pretty JSON on stdout.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use bujo_core::{
    init_from_config, open_db, search_entries, CoreConfig, EntryKind, EntryRequest,
    EntryService, OcrText, PageService, ScanOutcome, ScanService, SearchQuery,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(
    name = "bujo",
    about = "Extract bullet journal entries from scanned page text",
    version
)]
struct Cli {
    /// SQLite database file.
    #[arg(long, global = true, default_value = "bujo.sqlite3")]
    db: PathBuf,
    /// Owner id all commands act on.
    #[arg(long, global = true)]
    owner: Option<Uuid>,
    /// JSON config file (log level, log directory, extraction options).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scan OCR text files, one page per file.
    Scan(ScanArgs),
    /// Re-run extraction on a stored page.
    Reextract {
        page_id: Uuid,
    },
    /// List the owner's pages.
    Pages,
    /// List all entries, newest first.
    Entries,
    /// List entries extracted from scanned pages.
    Extracted {
        /// Only entries of this page.
        #[arg(long)]
        page: Option<Uuid>,
    },
    /// Create a manual entry.
    Add(AddArgs),
    /// Edit an entry; a different kind migrates it.
    Update(UpdateArgs),
    /// Set or flip an entry's completion state.
    Toggle {
        id: Uuid,
        #[arg(long)]
        completed: Option<bool>,
    },
    /// Delete an entry.
    Delete {
        id: Uuid,
    },
    /// Search entry content.
    Search(SearchArgs),
}

#[derive(Debug, Args)]
struct ScanArgs {
    /// Text files holding OCR output.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    /// Page number of the first file; later files count up from it.
    #[arg(long, default_value_t = 1)]
    page_number: i64,
    #[arg(long)]
    thread: Option<String>,
    /// Record the pages as scanned without OCR output.
    #[arg(long)]
    no_ocr: bool,
}

#[derive(Debug, Args)]
struct EntryFields {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    notes: Option<String>,
    /// Event date (YYYY-MM-DD).
    #[arg(long)]
    date: Option<String>,
    #[arg(long = "tag")]
    tags: Vec<String>,
}

#[derive(Debug, Args)]
struct AddArgs {
    /// task, note, event, habit or emotion.
    #[arg(long)]
    kind: String,
    #[command(flatten)]
    fields: EntryFields,
    #[arg(long)]
    completed: bool,
}

#[derive(Debug, Args)]
struct UpdateArgs {
    id: Uuid,
    #[arg(long)]
    kind: Option<String>,
    #[command(flatten)]
    fields: EntryFields,
    #[arg(long)]
    completed: Option<bool>,
}

#[derive(Debug, Args)]
struct SearchArgs {
    #[arg(default_value = "")]
    text: String,
    #[arg(long, value_enum)]
    kind: Option<KindArg>,
    /// Status label such as TODO or COMPLETED.
    #[arg(long)]
    status: Option<String>,
    #[arg(long, default_value_t = 50)]
    limit: u32,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum KindArg {
    Task,
    Event,
    Note,
    Emotion,
}

impl From<KindArg> for EntryKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Task => EntryKind::Task,
            KindArg::Event => EntryKind::Event,
            KindArg::Note => EntryKind::Note,
            KindArg::Emotion => EntryKind::Emotion,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => {
            CoreConfig::load(path).with_context(|| format!("loading config {:?}", path))?
        }
        None => CoreConfig::default(),
    };
    init_from_config(&config).context("initializing logging")?;

    let owner = cli.owner.context("--owner is required")?;
    let mut conn =
        open_db(&cli.db).with_context(|| format!("opening database {:?}", cli.db))?;
    info!(
        "event=cli_command module=cli status=start command={}",
        command_name(&cli.command)
    );

    match cli.command {
        Commands::Scan(args) => handle_scan(
            ScanService::new(&mut conn, config.extraction.clone()),
            owner,
            args,
        ),
        Commands::Reextract { page_id } => {
            let summary = ScanService::new(&mut conn, config.extraction.clone())
                .reextract_page(owner, page_id)?;
            print_json(&summary)
        }
        Commands::Pages => print_json(&PageService::new(&conn).list_pages(owner)?),
        Commands::Entries => print_json(&EntryService::new(&mut conn).list_entries(owner)?),
        Commands::Extracted { page } => {
            print_json(&EntryService::new(&mut conn).extracted_data(owner, page)?)
        }
        Commands::Add(args) => {
            let request = EntryRequest {
                kind: Some(args.kind),
                completed: Some(args.completed),
                ..entry_request(args.fields)
            };
            print_json(&EntryService::new(&mut conn).create_entry(owner, &request)?)
        }
        Commands::Update(args) => {
            let request = EntryRequest {
                kind: args.kind,
                completed: args.completed,
                ..entry_request(args.fields)
            };
            print_json(&EntryService::new(&mut conn).update_entry(owner, args.id, &request)?)
        }
        Commands::Toggle { id, completed } => {
            print_json(&EntryService::new(&mut conn).toggle_complete(owner, id, completed)?)
        }
        Commands::Delete { id } => {
            EntryService::new(&mut conn).delete_entry(owner, id)?;
            print_json(&serde_json::json!({ "deleted": id }))
        }
        Commands::Search(args) => {
            let query = SearchQuery {
                text: args.text,
                kind: args.kind.map(EntryKind::from),
                status: args.status,
                limit: args.limit,
            };
            print_json(&search_entries(&conn, owner, &query)?)
        }
    }
}

fn handle_scan(mut service: ScanService<'_>, owner: Uuid, args: ScanArgs) -> Result<()> {
    let ScanArgs {
        inputs,
        page_number,
        thread,
        no_ocr,
    } = args;

    let mut images = Vec::with_capacity(inputs.len());
    for path in &inputs {
        if no_ocr {
            images.push(OcrText::unavailable());
            continue;
        }
        let text = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
        images.push(OcrText::recognized(text));
    }

    let results = service.scan_pages(owner, images, page_number, thread);

    #[derive(Serialize)]
    struct ScanReport<'a> {
        file: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        outcome: Option<&'a ScanOutcome>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    }

    let report: Vec<ScanReport<'_>> = inputs
        .iter()
        .zip(results.iter())
        .map(|(path, result)| ScanReport {
            file: path.display().to_string(),
            outcome: result.as_ref().ok(),
            error: result.as_ref().err().map(|err| err.to_string()),
        })
        .collect();
    print_json(&report)?;

    let failed = results.iter().filter(|result| result.is_err()).count();
    if failed > 0 {
        anyhow::bail!("{failed} of {} pages failed to scan", results.len());
    }
    Ok(())
}

fn entry_request(fields: EntryFields) -> EntryRequest {
    EntryRequest {
        kind: None,
        title: fields.title,
        notes: fields.notes,
        completed: None,
        date: fields.date,
        tags: fields.tags,
    }
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Scan(_) => "scan",
        Commands::Reextract { .. } => "reextract",
        Commands::Pages => "pages",
        Commands::Entries => "entries",
        Commands::Extracted { .. } => "extracted",
        Commands::Add(_) => "add",
        Commands::Update(_) => "update",
        Commands::Toggle { .. } => "toggle",
        Commands::Delete { .. } => "delete",
        Commands::Search(_) => "search",
    }
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
