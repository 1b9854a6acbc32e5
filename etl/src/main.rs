//! Retail ETL CLI - clean raw retail transaction files
//!
//! # Main Commands
//!
//! ```bash
//! retail-etl run                       # Full pipeline on the configured raw file
//! retail-etl run --input other.csv     # Full pipeline on another file
//! ```
//!
//! # Debug Commands (for development)
//!
//! ```bash
//! retail-etl parse input.csv           # Just extract the CSV to JSON records
//! retail-etl audit input.csv           # Normalize labels and print the INITIAL report
//! retail-etl schema                    # Show the expected schema and column roles
//! ```

use clap::{Parser, Subcommand};
use retail_etl::models::schema::column_roles;
use retail_etl::parser::format_delimiter;
use retail_etl::transform::INITIAL_STAGE;
use retail_etl::{
    audit, init_logging, normalize_schema, read_dataset, run_file, EtlConfig, SentinelSet,
    TransformOptions,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "retail-etl")]
#[command(about = "Clean raw retail transaction CSV files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full pipeline: extract → normalize → audit → coerce → impute
    Run {
        /// Input CSV file (default: configured raw file)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Number of preview rows to log (default: 5)
        #[arg(long, default_value = "5")]
        preview: usize,

        /// Skip output schema validation
        #[arg(long)]
        no_validate: bool,
    },

    /// Parse a CSV file and output JSON
    Parse {
        /// Input CSV file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Normalize the schema and output the INITIAL quality report
    Audit {
        /// Input CSV file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the expected schema and column roles
    Schema,
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = match EtlConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            std::process::exit(1);
        }
    };

    let _guard = match init_logging(&config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("❌ Error: could not set up logging in {}: {}", config.log_dir.display(), e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Run {
            input,
            preview,
            no_validate,
        } => cmd_run(&config, input.as_deref(), preview, no_validate),

        Commands::Parse { input, output } => cmd_parse(&input, output.as_deref()),

        Commands::Audit { input, output } => cmd_audit(&input, output.as_deref()),

        Commands::Schema => cmd_schema(),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_run(
    config: &EtlConfig,
    input: Option<&Path>,
    preview: usize,
    no_validate: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let path = input
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.raw_file_path());
    eprintln!("📄 Processing: {}", path.display());

    let options = TransformOptions {
        preview_rows: preview,
        skip_validation: no_validate,
        ..TransformOptions::default()
    };

    let run = run_file(&path, &options)?;

    eprintln!("   Run: {}", run.run_id);
    eprintln!("   Encoding: {}", run.csv_info.encoding);
    eprintln!("   Delimiter: '{}'", format_delimiter(run.csv_info.delimiter));
    eprintln!("   Rows: {}", run.csv_info.stats.rows);
    eprintln!("   Columns: {}", run.csv_info.headers.join(", "));

    let summary = &run.outcome.imputation;
    eprintln!("\n⚙️  Transformed: {} rows", run.outcome.dataset.row_count());
    eprintln!(
        "   Missing values: {} → {}",
        run.outcome.initial_report.total_missing(),
        run.outcome.final_report.total_missing()
    );
    eprintln!(
        "   Prices imputed: {} ({} still missing)",
        summary.imputed, summary.missing_after
    );

    if !no_validate {
        eprintln!("\n✔️  Validation:");
        if run.invalid_count > 0 {
            eprintln!("   ✅ Valid: {}", run.valid_count);
            eprintln!("   ❌ Invalid: {}", run.invalid_count);
            for (i, errors) in run.validation_errors.iter().take(5) {
                eprintln!("\n   Row {}:", i);
                for err in errors.iter().take(3) {
                    eprintln!("     - {}", err);
                }
            }
        } else {
            eprintln!("   ✅ All {} rows valid!", run.valid_count);
        }
    }

    eprintln!("\n✨ Done!");
    Ok(())
}

fn cmd_parse(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing CSV: {}", input.display());

    let (result, stats) = read_dataset(input)?;

    eprintln!("   Encoding: {}", result.encoding);
    eprintln!("   Delimiter: '{}' (auto-detected)", format_delimiter(result.delimiter));
    eprintln!("   Columns: {}", result.headers.join(", "));
    eprintln!("   Missing values: {}", stats.missing_values);
    eprintln!("✅ Parsed {} records", stats.rows);

    let json = serde_json::to_string_pretty(&result.dataset.to_records())?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_audit(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("🔍 Auditing: {}", input.display());

    let (result, _) = read_dataset(input)?;
    let normalized = normalize_schema(&result.dataset)?;
    let (_, report) = audit(&normalized, INITIAL_STAGE, Some(&SentinelSet::default()));

    eprintln!(
        "   {} rows, {} missing values",
        report.rows(),
        report.total_missing()
    );

    let json = serde_json::to_string_pretty(&report)?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_schema() -> Result<(), Box<dyn std::error::Error>> {
    println!("📋 Expected columns:\n");
    for (column, role) in column_roles() {
        let role = role.map(|r| r.as_str()).unwrap_or("-");
        println!("  {:<18} {}", column, role);
    }
    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
