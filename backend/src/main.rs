//! TableTalk CLI - drive tables with text commands
//!
//! # Main Commands
//!
//! ```bash
//! tabletalk serve                                   # Start HTTP server (port 3000)
//! tabletalk run people.csv "Delete row 2"           # Apply a command, print the table
//! tabletalk rules people.csv 'email must contain "@"' -o rules.json
//! tabletalk validate people.csv                     # Infer schema and validate
//! tabletalk search people.csv "name:john urgent"    # Ranked search
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! tabletalk load people.csv                         # Show the loaded table
//! tabletalk parse people.csv "Update email ..."     # Show the parsed intent
//! tabletalk transforms                              # List available transforms
//! ```

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tabletalk::{
    load_path, parse_command, preview, transforms_description, Config, LoadedTable, RuleBook,
    Session,
};

#[derive(Parser)]
#[command(name = "tabletalk")]
#[command(about = "Text commands, rules, validation and search over CSV/JSON tables", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a CSV or JSON file and print it as JSON
    Load {
        /// Input file (.csv or .json)
        input: PathBuf,
    },

    /// Parse a command against a file's fields and print the intent
    Parse {
        /// Input file (.csv or .json)
        input: PathBuf,
        /// Command phrase
        phrase: String,
    },

    /// Apply a command and print the resulting table
    Run {
        /// Input file (.csv or .json)
        input: PathBuf,
        /// Command phrase
        phrase: String,
        /// Only show the rows that would be affected
        #[arg(long)]
        dry_run: bool,
        /// Output file for the new table (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Extract rules from a phrase and print the rules manifest
    Rules {
        /// Input file (.csv or .json), used for its fields
        input: PathBuf,
        /// Rule phrase
        phrase: String,
        /// Output file for the manifest (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Infer a schema from the first row and validate every row
    Validate {
        /// Input file (.csv or .json)
        input: PathBuf,
    },

    /// Rank rows against a free-text query
    Search {
        /// Input file (.csv or .json)
        input: PathBuf,
        /// Query, e.g. "name:john urgent"
        query: String,
        /// Maximum results to print
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Show available transforms
    Transforms,

    /// Start HTTP server
    Serve {
        /// Port to listen on (overrides TABLETALK_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Load { input } => cmd_load(&input),
        Commands::Parse { input, phrase } => cmd_parse(&input, &phrase),
        Commands::Run {
            input,
            phrase,
            dry_run,
            output,
        } => cmd_run(&input, &phrase, dry_run, output.as_deref()),
        Commands::Rules {
            input,
            phrase,
            output,
        } => cmd_rules(&input, &phrase, output.as_deref()),
        Commands::Validate { input } => cmd_validate(&input),
        Commands::Search {
            input,
            query,
            limit,
        } => cmd_search(&input, &query, limit),
        Commands::Transforms => cmd_transforms(),
        Commands::Serve { port } => cmd_serve(port).await,
    };

    if let Err(e) = result {
        eprintln!("✗ Error: {}", e);
        std::process::exit(1);
    }
}

fn load(input: &Path) -> Result<LoadedTable, Box<dyn std::error::Error>> {
    eprintln!("Loading: {}", input.display());
    let loaded = load_path(input)?;
    eprintln!("   Encoding: {}", loaded.encoding);
    if let Some(d) = loaded.delimiter {
        eprintln!("   Delimiter: '{}'", format_delimiter(d));
    }
    eprintln!("   Fields: {}", loaded.table.fields().join(", "));
    eprintln!("   Rows: {}", loaded.table.len());
    Ok(loaded)
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

fn cmd_load(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let loaded = load(input)?;
    let json = serde_json::to_string_pretty(&loaded.table.to_records())?;
    write_output(&json, None)
}

fn cmd_parse(input: &Path, phrase: &str) -> Result<(), Box<dyn std::error::Error>> {
    let loaded = load(input)?;
    let intent = parse_command(phrase, loaded.table.fields())?;
    eprintln!("   Intent: {}", intent.describe());
    write_output(&serde_json::to_string_pretty(&intent)?, None)
}

fn cmd_run(
    input: &Path,
    phrase: &str,
    dry_run: bool,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let loaded = load(input)?;

    if dry_run {
        let intent = parse_command(phrase, loaded.table.fields())?;
        let rows = preview(&loaded.table, &intent);
        eprintln!("   Intent: {}", intent.describe());
        eprintln!("   Would affect {} row(s)", rows.len());
        return write_output(&serde_json::to_string(&rows)?, output);
    }

    let mut session = Session::new();
    session.load(loaded.table);
    let record = session.run(phrase)?;
    if let Some(ref e) = record.error {
        return Err(e.clone().into());
    }

    let json = serde_json::to_string_pretty(&session.table().to_records())?;
    write_output(&json, output)
}

fn cmd_rules(
    input: &Path,
    phrase: &str,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let loaded = load(input)?;
    let mut book = RuleBook::new();
    let drafts = tabletalk::extract_rules(phrase, loaded.table.fields())?;
    book.add_all(drafts);

    match output {
        Some(path) => {
            book.export_file(path)?;
            eprintln!("   Manifest written to: {}", path.display());
            Ok(())
        }
        None => write_output(&book.export_json()?, None),
    }
}

fn cmd_validate(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let loaded = load(input)?;
    let schema = tabletalk::infer_table_schema(&loaded.table);
    for field_schema in &schema.fields {
        eprintln!("   {} → {}", field_schema.field, field_schema.rule);
    }

    let report = tabletalk::validate(&loaded.table, &schema);
    for issue in report.issues.iter().take(20) {
        eprintln!(
            "   Row {}, {}: {} ({})",
            issue.row_number,
            issue.field,
            issue.message,
            tabletalk::value_to_text(&issue.offending_value)
        );
    }
    if report.issues.len() > 20 {
        eprintln!("   ... {} more", report.issues.len() - 20);
    }
    eprintln!("\nResults: {}", report.summary());

    if !report.is_valid() {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_search(input: &Path, query: &str, limit: usize) -> Result<(), Box<dyn std::error::Error>> {
    let loaded = load(input)?;
    let mut results = tabletalk::search(&loaded.table, query);
    eprintln!("   {} match(es)", results.len());
    results.truncate(limit);
    write_output(&serde_json::to_string_pretty(&results)?, None)
}

fn cmd_transforms() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", transforms_description());
    Ok(())
}

async fn cmd_serve(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::from_env()?;
    if let Some(port) = port {
        config = config.with_port(port);
    }
    tabletalk::server::start_server(config).await?;
    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("   Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
