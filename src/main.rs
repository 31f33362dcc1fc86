use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use glob::glob;
use lopdf::Document;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use book_binder::assemble::{load_chapters, table_of_contents};
use book_binder::{Assembler, BookRequest, PageSize, Rasterizer, UnitSystem, binder};

/// Bind cover + copyright + index + chapter PDFs + back cover into one book
#[derive(Parser, Debug)]
#[command(name = "book_binder", version, about = "Bind front matter, chapter PDFs and back cover into a single book PDF")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Assemble the book PDF
    Bind {
        #[command(flatten)]
        input: BookInput,

        /// Page width of the rendered matter (default: A4 width)
        #[arg(long, default_value_t = 210.0)]
        width: f64,
        /// Page height of the rendered matter (default: A4 height)
        #[arg(long, default_value_t = 297.0)]
        height: f64,
        /// Unit of --width/--height
        #[arg(long, value_enum, default_value_t = UnitSystem::Mm)]
        unit: UnitSystem,

        /// Additional directory of fonts for the rendered matter
        #[arg(long)]
        fonts_dir: Option<PathBuf>,

        /// Output PDF
        #[arg(short, long, default_value = "Full_Customized_Book.pdf")]
        output: PathBuf,
    },

    /// Print the table of contents the book would get, as JSON
    Toc {
        #[command(flatten)]
        input: BookInput,
    },

    /// Show page count, metadata and bookmarks of a PDF
    Inspect {
        /// PDF to inspect
        file: PathBuf,
    },
}

#[derive(Args, Debug)]
struct BookInput {
    /// TOML file with book fields (publisher_badge, book_title_en, ...)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override a book field, e.g. --set author_name="Sun Tzu" (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    set: Vec<(String, String)>,

    /// Chapter PDF, in reading order (repeatable)
    #[arg(long = "chapter", value_name = "PATH")]
    chapters: Vec<PathBuf>,

    /// Glob of chapter PDFs appended after --chapter, in sorted order
    #[arg(long = "chapters", value_name = "GLOB")]
    chapters_glob: Option<String>,

    /// Chapter title; the n-th --title names the n-th chapter (repeatable)
    #[arg(long = "title")]
    titles: Vec<String>,

    /// Portrait for the back cover
    #[arg(long)]
    author_image: Option<PathBuf>,
}

fn parse_key_val(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{s}`"))?;
    Ok((key.trim().to_string(), value.to_string()))
}

fn read(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// TOML keys flattened to strings, the way form fields arrive.
fn toml_fields(path: &Path) -> Result<BTreeMap<String, String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let table: toml::Table =
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(table
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                toml::Value::String(s) => s,
                other => other.to_string(),
            };
            (key, value)
        })
        .collect())
}

fn chapter_paths(input: &BookInput) -> Result<Vec<PathBuf>> {
    let mut paths = input.chapters.clone();
    if let Some(pattern) = &input.chapters_glob {
        let mut matched: Vec<PathBuf> = glob(pattern)
            .with_context(|| format!("Invalid glob `{pattern}`"))?
            .filter_map(|e| e.ok())
            .collect();
        matched.sort();
        if matched.is_empty() {
            tracing::warn!(pattern = %pattern, "chapter glob matched nothing");
        }
        paths.extend(matched);
    }
    Ok(paths)
}

/// Translate CLI input into the same field/file shape an upload form sends.
fn build_request(input: &BookInput) -> Result<BookRequest> {
    let mut fields = match &input.config {
        Some(path) => toml_fields(path)?,
        None => BTreeMap::new(),
    };
    fields.extend(input.set.iter().cloned());

    let mut files = BTreeMap::new();
    let paths = chapter_paths(input)?;
    if input.titles.len() > paths.len() {
        bail!(
            "{} titles given for {} chapters",
            input.titles.len(),
            paths.len()
        );
    }
    for (i, path) in paths.iter().enumerate() {
        files.insert(format!("chapter_{i}"), read(path)?);
        if let Some(title) = input.titles.get(i) {
            fields.insert(format!("chapter_{i}_title"), title.clone());
        }
    }
    fields
        .entry("chapter_count".to_string())
        .or_insert_with(|| paths.len().to_string());

    if let Some(path) = &input.author_image {
        files.insert("author_image".to_string(), read(path)?);
    }

    Ok(BookRequest::from_form(&fields, files)?)
}

fn bind(
    input: &BookInput,
    page_size: PageSize,
    fonts_dir: Option<&Path>,
    output: &Path,
) -> Result<()> {
    let request = build_request(input)?;
    let assembler = Assembler::new(Rasterizer::new(fonts_dir), page_size);
    let bytes = assembler.assemble(request)?;
    fs::write(output, bytes).with_context(|| format!("Failed to write {}", output.display()))?;
    println!("Wrote {}", output.display());
    Ok(())
}

fn toc(input: &BookInput) -> Result<()> {
    let request = build_request(input)?;
    let chapters = load_chapters(&request)?;
    let entries = table_of_contents(&chapters, request.config.numerals);
    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}

fn inspect(file: &Path) -> Result<()> {
    let doc = Document::load_mem(&read(file)?)
        .with_context(|| format!("{} is not a readable PDF", file.display()))?;
    println!("Pages: {}", doc.get_pages().len());
    if let Some(info) = binder::read_info(&doc) {
        println!("Title: {}", info.title);
        println!("Author: {}", info.author);
        println!("Subject: {}", info.subject);
        println!("Producer: {}", info.producer);
        println!("Creator: {}", info.creator);
        println!("Keywords: {}", info.keywords);
    }
    for (title, page_index) in binder::read_outline(&doc) {
        println!("Bookmark: {title} -> page {}", page_index + 1);
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "book_binder=debug"
    } else if cli.quiet {
        "book_binder=warn"
    } else {
        "book_binder=info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match &cli.command {
        Command::Bind {
            input,
            width,
            height,
            unit,
            fonts_dir,
            output,
        } => bind(
            input,
            PageSize::new(*width, *height, *unit),
            fonts_dir.as_deref(),
            output,
        ),
        Command::Toc { input } => toc(input),
        Command::Inspect { file } => inspect(file),
    }
}
