use std::{
    fs::File,
    io::{BufReader, Write as _},
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "picbook", version)]
struct Cli {
    /// Library configuration JSON.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the per-user storage root.
    #[arg(long, global = true)]
    users_root: Option<PathBuf>,

    /// Override the shared storage root.
    #[arg(long, global = true)]
    global_root: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List books visible to a user, newest first.
    List(UserArgs),
    /// Show one book.
    Show(BookArgs),
    /// Apply a batch of text/image edits from a JSON file.
    Edit(EditArgs),
    /// Record an image-replacement request for external fulfilment.
    QueueImageEdit(QueueArgs),
    /// Rebuild a book's PDF.
    BuildPdf(BookArgs),
}

#[derive(Args, Debug)]
struct UserArgs {
    /// Requesting user id. Without it only shared books are visible.
    #[arg(long)]
    user: Option<String>,
}

#[derive(Args, Debug)]
struct BookArgs {
    #[command(flatten)]
    user: UserArgs,

    /// Book id.
    #[arg(long)]
    id: String,
}

#[derive(Parser, Debug)]
struct EditArgs {
    #[command(flatten)]
    book: BookArgs,

    /// JSON file with `{"textEdits": [...], "imageEdits": [...]}`.
    #[arg(long)]
    edits: PathBuf,
}

#[derive(Parser, Debug)]
struct QueueArgs {
    #[command(flatten)]
    book: BookArgs,

    /// Cover or page.
    #[arg(long, value_enum)]
    target: TargetChoice,

    /// Page number for page targets.
    #[arg(long)]
    page: Option<u32>,

    /// What should change in the image.
    #[arg(long)]
    instruction: String,

    /// Image the instruction refers to.
    #[arg(long)]
    image_url: String,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TargetChoice {
    Cover,
    Page,
}

impl From<TargetChoice> for picbook::EditTarget {
    fn from(t: TargetChoice) -> Self {
        match t {
            TargetChoice::Cover => picbook::EditTarget::Cover,
            TargetChoice::Page => picbook::EditTarget::Page,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueuedRequest {
    request_id: String,
}

#[derive(Serialize)]
struct BuiltPdf {
    path: PathBuf,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(outcome) => {
            let ok = outcome.ok;
            if let Err(e) = print_outcome(&outcome) {
                eprintln!("error: {e:#}");
                return ExitCode::FAILURE;
            }
            if ok {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("PICBOOK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Setup failures (bad config, unreadable edits file) are `Err`; library failures are reported
/// as an `ApiOutcome`.
fn run(cli: Cli) -> anyhow::Result<picbook::ApiOutcome> {
    let config = load_config(cli.config.as_deref(), cli.users_root, cli.global_root)?;
    let library = picbook::Library::new(config).context("configure library")?;

    let outcome = match cli.cmd {
        Command::List(args) => {
            picbook::ApiOutcome::from_result(&library.list_books(args.user.as_deref()))
        }
        Command::Show(args) => picbook::ApiOutcome::from_result(
            &library.load_book(args.user.user.as_deref(), &args.id),
        ),
        Command::Edit(args) => {
            let batch = read_batch(&args.edits)?;
            picbook::ApiOutcome::from_result(&library.apply_edits(
                args.book.user.user.as_deref(),
                &args.book.id,
                &batch,
            ))
        }
        Command::QueueImageEdit(args) => {
            let request = picbook::NewImageEditRequest {
                target: args.target.into(),
                page: args.page,
                instruction: args.instruction,
                image_url: args.image_url,
            };
            let res = library
                .queue_image_edit(args.book.user.user.as_deref(), &args.book.id, &request)
                .map(|request_id| QueuedRequest { request_id });
            picbook::ApiOutcome::from_result(&res)
        }
        Command::BuildPdf(args) => {
            let res = library
                .rebuild_pdf(args.user.user.as_deref(), &args.id)
                .map(|path| BuiltPdf { path });
            picbook::ApiOutcome::from_result(&res)
        }
    };
    Ok(outcome)
}

fn load_config(
    path: Option<&Path>,
    users_root: Option<PathBuf>,
    global_root: Option<PathBuf>,
) -> anyhow::Result<picbook::LibraryConfig> {
    let mut config = match path {
        Some(p) => picbook::LibraryConfig::load(p)
            .with_context(|| format!("load config '{}'", p.display()))?,
        None => picbook::LibraryConfig::default(),
    };
    if let Some(root) = users_root {
        config.users_root = root;
    }
    if let Some(root) = global_root {
        config.global_root = root;
    }
    Ok(config)
}

fn read_batch(path: &Path) -> anyhow::Result<picbook::EditBatch> {
    let f = File::open(path).with_context(|| format!("open edits '{}'", path.display()))?;
    let batch: picbook::EditBatch = serde_json::from_reader(BufReader::new(f))
        .with_context(|| format!("parse edits JSON '{}'", path.display()))?;
    Ok(batch)
}

fn print_outcome(outcome: &picbook::ApiOutcome) -> anyhow::Result<()> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, outcome).context("write outcome")?;
    writeln!(out).context("write outcome")?;
    Ok(())
}
