//! `retroboard` command-line entry point.
//!
//! # Responsibility
//! - Expose board creation, document export/import and image recovery.
//! - Keep every store call explicit about board and actor ids.

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use log::info;
use retroboard_core::db::open_db;
use retroboard_core::{
    core_version, decode_raster, default_log_level, export_document_now, init_logging,
    recover_with_engine, BoardService, OcrEngine, PrecomputedOcr, RecoveryConfig,
    SqliteBoardRepository, TesseractCli, UuidIdGenerator, ANONYMOUS_ACTOR,
};
use std::fs;
use std::path::{Path, PathBuf};

/// Retrospective board portability tool.
#[derive(Parser, Debug)]
#[command(name = "retroboard", version, about)]
struct Cli {
    /// Log level (trace|debug|info|warn|error).
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Absolute directory for rolling log files; logging is off when unset.
    #[arg(long, global = true)]
    log_dir: Option<String>,
    /// Actor recorded on created boards and notes.
    #[arg(long, global = true, default_value = ANONYMOUS_ACTOR)]
    actor: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the core version.
    Version,
    /// Create a board in a local store.
    CreateBoard {
        #[arg(long)]
        db: PathBuf,
        #[arg(long)]
        name: Option<String>,
    },
    /// Export a board's notes as a portable document.
    Export {
        #[arg(long)]
        db: PathBuf,
        #[arg(long)]
        board: String,
        /// Output file; stdout when unset.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Import a portable document into a board.
    Import {
        #[arg(long)]
        db: PathBuf,
        #[arg(long)]
        board: String,
        #[arg(long)]
        file: PathBuf,
    },
    /// Recover notes from a board snapshot image.
    Recover(RecoverArgs),
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::Version => "version",
            Self::CreateBoard { .. } => "create-board",
            Self::Export { .. } => "export",
            Self::Import { .. } => "import",
            Self::Recover(_) => "recover",
        }
    }
}

#[derive(Args, Debug)]
struct RecoverArgs {
    /// PNG or JPEG snapshot of the board.
    #[arg(long)]
    image: PathBuf,
    /// JSON list of recognized fragments produced earlier.
    #[arg(long, conflicts_with = "tesseract")]
    fragments: Option<PathBuf>,
    /// Run the `tesseract` binary on the image.
    #[arg(long)]
    tesseract: bool,
    /// OCR language hint; overrides the config file.
    #[arg(long)]
    lang: Option<String>,
    /// JSON recovery config overriding palette, zones or denylist.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Store recovered notes on this board (requires --db).
    #[arg(long, requires = "db")]
    board: Option<String>,
    #[arg(long)]
    db: Option<PathBuf>,
    /// Write a portable document here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir).context("failed to initialize logging")?;
    }

    info!(
        "event=cli_start module=cli status=ok command={}",
        cli.command.name()
    );

    match cli.command {
        Command::Version => println!("retroboard_core version={}", core_version()),
        Command::CreateBoard { db, name } => {
            let mut conn = open_db(&db)?;
            let service = BoardService::new(SqliteBoardRepository::new(&mut conn));
            let board = service.create_board(name.as_deref(), &cli.actor)?;
            println!("{}", board.id);
        }
        Command::Export { db, board, out } => {
            let mut conn = open_db(&db)?;
            let service = BoardService::new(SqliteBoardRepository::new(&mut conn));
            let json = service.export_board(&board)?;
            write_output(out.as_deref(), &json)?;
        }
        Command::Import { db, board, file } => {
            let raw =
                fs::read(&file).with_context(|| format!("failed to read {}", file.display()))?;
            let mut conn = open_db(&db)?;
            let mut service = BoardService::new(SqliteBoardRepository::new(&mut conn));
            let notes = service
                .import_document(&board, &cli.actor, &raw)
                .context("import failed")?;
            println!("imported {} notes", notes.len());
        }
        Command::Recover(args) => recover(args, &cli.actor)?,
    }

    Ok(())
}

fn recover(args: RecoverArgs, actor: &str) -> anyhow::Result<()> {
    let mut config = match args.config.as_deref() {
        Some(path) => RecoveryConfig::from_json(&fs::read(path)?)
            .with_context(|| format!("invalid recovery config {}", path.display()))?,
        None => RecoveryConfig::default(),
    };
    if let Some(lang) = args.lang {
        config.language = lang;
    }

    let engine: Box<dyn OcrEngine> = match (args.fragments.as_deref(), args.tesseract) {
        (Some(path), false) => Box::new(PrecomputedOcr::from_json(&fs::read(path)?)?),
        (None, true) => Box::new(TesseractCli::new()),
        _ => bail!("pass exactly one of --fragments or --tesseract"),
    };

    let raw = fs::read(&args.image)
        .with_context(|| format!("failed to read {}", args.image.display()))?;
    let image = decode_raster(&raw)?;
    info!(
        "event=cli_recover module=cli status=decoded engine={} width={} height={}",
        engine.name(),
        image.width(),
        image.height()
    );

    match (args.board, args.db) {
        (Some(board), Some(db)) => {
            let mut conn = open_db(&db)?;
            let mut service = BoardService::new(SqliteBoardRepository::new(&mut conn));
            let report = service.recover_with_engine_into_board(
                &board,
                actor,
                engine.as_ref(),
                &image,
                &config,
            )?;
            println!(
                "recovered {} notes (discarded {}, unsampleable {})",
                report.notes.len(),
                report.discarded,
                report.unsampleable
            );
        }
        _ => {
            let report = recover_with_engine(engine.as_ref(), &image, &config, &UuidIdGenerator)?;
            let json = export_document_now(&report.notes)?;
            write_output(args.out.as_deref(), &json)?;
        }
    }
    Ok(())
}

fn write_output(out: Option<&Path>, contents: &str) -> anyhow::Result<()> {
    match out {
        Some(path) => {
            fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
        }
        None => {
            println!("{contents}");
            Ok(())
        }
    }
}
