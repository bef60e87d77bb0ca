use std::path::PathBuf;
use clap::Parser;
use modcrafter::config::{self, CliOverrides, Settings};
use modcrafter::error_report::Fatal;
use modcrafter::{ExitStatus, GenerationResult, OverwritePolicy, PathOutcome, Store, TokenKey};

#[derive(Parser, Debug)]
#[command(name = "modcrafter", about = "Generates module scaffolding from templates", version)]
struct Args {
    /// Module name, e.g. `billing` or `UserAccounts`
    #[arg(value_name = "MODULE", required_unless_present = "list")]
    module: Option<String>,

    /// Project root the output paths are relative to
    #[arg(long, env = "MODCRAFTER_ROOT", value_name = "DIR", default_value = ".")]
    root: PathBuf,

    /// Directory containing catalog.toml, instead of the bundled templates
    #[arg(long, env = "MODCRAFTER_CATALOG", value_name = "DIR")]
    catalog: Option<PathBuf>,

    /// Only render templates carrying this tag (repeatable)
    #[arg(long = "tag", value_name = "TAG")]
    tags: Vec<String>,

    /// Value of [MODULE_DESCRIPTION]
    #[arg(long, value_name = "TEXT")]
    description: Option<String>,

    /// Override a placeholder value (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_pair)]
    set: Vec<(String, String)>,

    /// never, if-identical, always or skip
    #[arg(long, value_name = "POLICY")]
    overwrite: Option<OverwritePolicy>,

    /// Report what would be written without writing
    #[arg(long, overrides_with = "no_dry_run")]
    dry_run: bool,

    /// Write files even if the configuration file sets dry_run
    #[arg(long, overrides_with = "dry_run")]
    no_dry_run: bool,

    /// Configuration file, defaults to modcrafter.toml in the root
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// List templates, tags and placeholders, then exit
    #[arg(long)]
    list: bool,

    /// More logging, repeat for debug output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_pair(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_owned(), value.to_owned())),
        _ => Err(format!("expected KEY=VALUE, got {:?}", s)),
    }
}

fn list(store: &Store) {
    println!("Templates:");
    for entry in store.list_entries(None) {
        let tags = entry.tags().iter().map(|tag| tag.as_str()).collect::<Vec<_>>();
        println!("  {:<16} {}  [{}]", entry.id(), entry.output_path(), tags.join(", "));
    }
    println!();
    let tags = store.tags().into_iter().map(|tag| tag.as_str()).collect::<Vec<_>>();
    println!("Tags: {}", tags.join(", "));
    println!();
    println!("Placeholders:");
    for key in TokenKey::ALL {
        println!("  [{}]  {}", key, key.description());
    }
}

fn print_result(result: &GenerationResult) {
    let prefix = if result.is_dry_run() { "would " } else { "" };
    for report in result.reports() {
        match &report.outcome {
            PathOutcome::Written => println!("{}write     {}", prefix, report.destination.display()),
            PathOutcome::SkippedIdentical => println!("unchanged  {}", report.destination.display()),
            PathOutcome::SkippedExisting => println!("kept       {}", report.destination.display()),
            PathOutcome::Failed(error) => eprintln!("failed     {}: {}", report.destination.display(), error),
        }
    }
    for path in result.unapplied() {
        eprintln!("not attempted {}", path.display());
    }
}

fn main() {
    let args = Args::parse();
    modcrafter::logging::init(args.verbose);

    let config = config::discover(&args.root, args.config.as_deref()).unwrap_or_else(|error| error.fail());

    let mut overrides = Vec::with_capacity(args.set.len() + 1);
    if let Some(description) = args.description {
        overrides.push((TokenKey::ModuleDescription.as_str().to_owned(), description));
    }
    overrides.extend(args.set);

    let cli = CliOverrides {
        catalog: args.catalog,
        overwrite: args.overwrite,
        tags: args.tags,
        dry_run: match (args.dry_run, args.no_dry_run) {
            (true, _) => Some(true),
            (false, true) => Some(false),
            (false, false) => None,
        },
        overrides,
    };
    let settings = Settings::resolve(args.root, config, cli);

    let store = Store::load(&settings.source).unwrap_or_else(|error| error.fail());

    if args.list {
        list(&store);
        return;
    }

    // required_unless_present guarantees a module here
    let module = match args.module {
        Some(module) => module,
        None => std::process::exit(ExitStatus::ValidationFailure.code()),
    };

    let result = modcrafter::generate(&store, &settings.root, &settings.request(module));
    let status = ExitStatus::of(&result);
    match result {
        Ok(result) => print_result(&result),
        Err(error) => error.fail(),
    }
    std::process::exit(status.code());
}
