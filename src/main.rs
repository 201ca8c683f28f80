use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use retail_intake::catalog::Catalog;
use retail_intake::codes::{DirectoryFilter, DuplicateOptions};
use retail_intake::config::Settings;
use retail_intake::io::store::Collection;
use retail_intake::{IntakeError, Result, tasks};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_logging().and_then(|()| run(cli)) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|err| IntakeError::Logging(err.to_string()))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| IntakeError::Logging(err.to_string()))
}

fn run(cli: Cli) -> Result<()> {
    let settings = cli.sources.into_settings();
    match cli.command {
        Command::Categories(args) => {
            let catalog = Catalog::from_settings(&settings)?;
            let count = tasks::export_categories_json(&catalog, &args.output)?;
            println!("wrote {count} categories to {}", args.output.display());
        }
        Command::Directory(args) => {
            let catalog = Catalog::from_settings(&settings)?;
            let filter = DirectoryFilter {
                search: args.search.unwrap_or_default(),
                country: args.country,
            };
            let count = tasks::export_directory_csv(&catalog, &filter, &args.output)?;
            println!("wrote {count} codes to {}", args.output.display());
        }
        Command::Duplicates(args) => {
            let catalog = Catalog::from_settings(&settings)?;
            let options = DuplicateOptions {
                ignore_unique_per_country: !args.include_unique_per_country,
            };
            let groups = tasks::duplicate_report(&catalog, options);
            match &args.output {
                Some(path) => {
                    tasks::write_duplicate_report(&groups, path)?;
                    println!("wrote {} duplicate groups to {}", groups.len(), path.display());
                }
                None => {
                    for group in &groups {
                        println!("{} ({} entries)", group.code, group.entries.len());
                        for entry in &group.entries {
                            println!(
                                "  {}\t{}\t{}\t{}",
                                entry.category, entry.code_type, entry.country, entry.customer
                            );
                        }
                    }
                }
            }
        }
        Command::StoreLists(args) => {
            let catalog = Catalog::from_settings(&settings)?;
            let count = tasks::export_store_lists(&catalog, &args.list, &args.output)?;
            println!("wrote {count} store lists to {}", args.output.display());
        }
        Command::Export(args) => {
            let query = args.search.unwrap_or_default();
            let (path, count) = tasks::export_collection(
                &settings,
                args.collection.into(),
                &query,
                args.output.as_deref(),
            )?;
            println!("wrote {count} records to {}", path.display());
        }
        Command::Seed(args) => {
            let result = tasks::seed(&settings, args.force)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Authorize(args) => {
            let authorized = tasks::check_authorization(&settings, &args.email)?;
            println!(
                "{} is {}authorized",
                args.email,
                if authorized { "" } else { "not " }
            );
            if !authorized {
                std::process::exit(2);
            }
        }
    }
    Ok(())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Shape and export retail order-intake reference data."
)]
struct Cli {
    #[command(flatten)]
    sources: SourceArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct SourceArgs {
    /// Directory holding the CSV exports.
    #[arg(long, global = true, env = "RETAIL_INTAKE_CSV_DIR", default_value = ".")]
    csv_dir: PathBuf,

    /// Directory of the JSON document store.
    #[arg(long, global = true, env = "RETAIL_INTAKE_STORE_DIR")]
    store_dir: Option<PathBuf>,
}

impl SourceArgs {
    fn into_settings(self) -> Settings {
        Settings {
            csv_dir: self.csv_dir,
            store_dir: self.store_dir,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Export the merged category list as JSON.
    Categories(OutputArgs),
    /// Export the master code directory as CSV.
    Directory(DirectoryArgs),
    /// Report codes used by more than one category.
    Duplicates(DuplicatesArgs),
    /// Export store lists as a workbook, or as CSV for a .csv output.
    StoreLists(StoreListsArgs),
    /// Export a stored collection as CSV.
    Export(ExportArgs),
    /// Load the CSV exports into the document store.
    Seed(SeedArgs),
    /// Check whether an email belongs to an authorized user.
    Authorize(AuthorizeArgs),
}

#[derive(Args)]
struct OutputArgs {
    /// Output file path.
    #[arg(long)]
    output: PathBuf,
}

#[derive(Args)]
struct DirectoryArgs {
    /// Output file path.
    #[arg(long)]
    output: PathBuf,

    /// Keep records containing this text in any column.
    #[arg(long)]
    search: Option<String>,

    /// Keep records for this country only.
    #[arg(long)]
    country: Option<String>,
}

#[derive(Args)]
struct DuplicatesArgs {
    /// Also report codes that appear at most once per country.
    #[arg(long)]
    include_unique_per_country: bool,

    /// Write the report as JSON instead of printing it.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct StoreListsArgs {
    /// Output file path (.xlsx or .csv).
    #[arg(long)]
    output: PathBuf,

    /// Name of a list to export; repeat for several. Defaults to all lists.
    #[arg(long)]
    list: Vec<String>,
}

#[derive(Args)]
struct ExportArgs {
    /// Collection to export.
    #[arg(long, value_enum)]
    collection: CollectionArg,

    /// Keep records containing this text.
    #[arg(long)]
    search: Option<String>,

    /// Output file path. Defaults to the collection's export file in the CSV
    /// directory.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum CollectionArg {
    Categories,
    StoreLists,
    Boosters,
    AuthorizedUsers,
    CustomCodes,
}

impl From<CollectionArg> for Collection {
    fn from(value: CollectionArg) -> Self {
        match value {
            CollectionArg::Categories => Collection::Categories,
            CollectionArg::StoreLists => Collection::StoreLists,
            CollectionArg::Boosters => Collection::Boosters,
            CollectionArg::AuthorizedUsers => Collection::AuthorizedUsers,
            CollectionArg::CustomCodes => Collection::CustomCategoryCodes,
        }
    }
}

#[derive(Args)]
struct SeedArgs {
    /// Seed collections that already hold documents.
    #[arg(long)]
    force: bool,
}

#[derive(Args)]
struct AuthorizeArgs {
    /// Email address to look up.
    #[arg(long)]
    email: String,
}
