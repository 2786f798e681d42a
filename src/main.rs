use anyhow::{Context, Result};
use clap::Parser;
use minitwin::Router;
use polars::prelude::*;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "minitwin")]
#[command(about = "MiniTwin - Credit Operations Agent over a credit export CSV")]
struct Args {
    /// Path to the credit export CSV
    csv: PathBuf,

    /// Ask a single question and exit (starts an interactive chat otherwise)
    #[arg(short, long)]
    query: Option<String>,

    /// Where `:export` writes the last result table
    #[arg(long, default_value = "minitwin_result.csv")]
    export_path: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let df = load_csv(&args.csv)
        .with_context(|| format!("failed to load {}", args.csv.display()))?;
    info!("Loaded {} rows, {} columns", df.height(), df.width());

    let router = Router::new();

    if let Some(query) = args.query {
        let response = router.route(&query, &df);
        println!("{}", response.text);
        if let Some(table) = response.table {
            println!("\n{}", table);
        }
        return Ok(());
    }

    chat_loop(&router, &df, &args.export_path)
}

/// Read the export CSV, falling back to a latin-1 decode for files that
/// are not valid UTF-8.
fn load_csv(path: &Path) -> Result<DataFrame> {
    let parsed = LazyCsvReader::new(path)
        .with_has_header(true)
        .finish()
        .and_then(|lf| lf.collect());

    match parsed {
        Ok(df) => Ok(df),
        Err(_) => {
            let bytes = std::fs::read(path)?;
            let text: String = bytes.iter().map(|&b| b as char).collect();
            let cursor = std::io::Cursor::new(text.into_bytes());
            let df = CsvReadOptions::default()
                .with_has_header(true)
                .into_reader_with_file_handle(cursor)
                .finish()?;
            Ok(df)
        }
    }
}

/// Interactive chat: append-only history, `:history` to replay it,
/// `:export` to write the last result table, `quit` to leave.
fn chat_loop(router: &Router, df: &DataFrame, export_path: &Path) -> Result<()> {
    println!("🤖 MiniTwin – Credit Operations Agent");
    println!("Ask things like `give me a credit overview` or `what tickets are priority right now?`");
    println!("Commands: :history, :export, quit\n");

    let stdin = std::io::stdin();
    let mut history: Vec<(String, String)> = Vec::new();
    let mut last_table: Option<DataFrame> = None;

    loop {
        print!("you> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("quit") || input.eq_ignore_ascii_case("exit") {
            break;
        }
        if input == ":history" {
            for (question, answer) in &history {
                println!("**You:** {}\n\n**MiniTwin:**\n\n{}\n---", question, answer);
            }
            continue;
        }
        if input == ":export" {
            match &last_table {
                Some(table) => {
                    export_table(table, export_path)?;
                    println!("Wrote {} row(s) to {}", table.height(), export_path.display());
                }
                None => println!("Nothing to export yet – ask a ticket-detail question first."),
            }
            continue;
        }

        let response = router.route(input, df);
        println!("\n{}\n", response.text);
        if let Some(table) = response.table {
            println!("{}\n", table);
            last_table = Some(table);
        }
        history.push((input.to_string(), response.text));
    }

    Ok(())
}

fn export_table(table: &DataFrame, path: &Path) -> Result<()> {
    let mut df = table.clone();
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    CsvWriter::new(&mut file).finish(&mut df)?;
    Ok(())
}
