use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use phrasify_core::persist::{load_dictionary, save_snapshot};
use phrasify_core::session::DESCRIPTION;
use phrasify_core::settings::{load_settings, save_settings, ConfigOverrides};
use phrasify_core::{Payload, PhraseDictionary, Session, SessionConfig};
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "phrasifier")]
#[command(about = DESCRIPTION, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the dictionary from a catalog and print its statistics
    Check {
        #[command(flatten)]
        catalog: CatalogArgs,
    },
    /// Build the dictionary and write a binary snapshot of it
    Compile {
        #[command(flatten)]
        catalog: CatalogArgs,
        /// Snapshot output path
        #[arg(long)]
        output: PathBuf,
    },
    /// Phrasify JSON/JSONL payloads from a file or directory, writing JSONL
    Run {
        #[command(flatten)]
        catalog: CatalogArgs,
        /// Use a compiled snapshot instead of reading a catalog
        #[arg(long, conflicts_with = "catalog")]
        dictionary: Option<PathBuf>,
        /// Input path (file or directory)
        #[arg(long)]
        input: PathBuf,
        /// Output file; stdout when omitted
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Write or show a settings file
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Resolve the catalog flags and save them as a settings file
    Export {
        #[command(flatten)]
        catalog: CatalogArgs,
        /// Settings output path
        #[arg(long)]
        output: PathBuf,
    },
    /// Print the key/value map stored in a settings file
    Show {
        path: PathBuf,
    },
}

/// Catalog location and format. A settings file supplies the base values;
/// explicit flags override it.
#[derive(Args)]
struct CatalogArgs {
    /// Settings file (JSON key/value map)
    #[arg(long, env = "PHRASIFY_SETTINGS")]
    settings: Option<PathBuf>,
    /// Phrase catalog (delimited frequency list)
    #[arg(long, env = "PHRASIFY_CATALOG")]
    catalog: Option<PathBuf>,
    /// Catalog text encoding label, e.g. utf-8 or windows-1252
    #[arg(long)]
    encoding: Option<String>,
    /// Field delimiter character
    #[arg(long)]
    delimiter: Option<char>,
    /// Quote character
    #[arg(long)]
    quote: Option<char>,
}

impl CatalogArgs {
    fn resolve(&self) -> Result<SessionConfig> {
        let overrides = ConfigOverrides {
            catalog_path: self.catalog.clone(),
            encoding: self.encoding.clone(),
            delimiter: self.delimiter,
            quote: self.quote,
        };
        SessionConfig::load_with_overrides(self.settings.as_deref(), overrides).context("loading settings")
    }

    fn build(&self) -> Result<PhraseDictionary> {
        self.resolve()?.build_dictionary().context("building phrase dictionary")
    }
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(io::stderr).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { catalog } => {
            let dictionary = catalog.build()?;
            println!("{}", serde_json::to_string_pretty(&dictionary.stats())?);
            Ok(())
        }
        Commands::Compile { catalog, output } => {
            let dictionary = catalog.build()?;
            save_snapshot(&output, &dictionary)?;
            Ok(())
        }
        Commands::Run { catalog, dictionary, input, output } => {
            let dictionary = match dictionary {
                Some(path) => load_dictionary(&path).with_context(|| format!("loading snapshot {}", path.display()))?,
                None => catalog.build()?,
            };
            let mut session = Session::default();
            session.install(dictionary);
            match output {
                Some(path) => {
                    let f = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
                    run(&session, &input, BufWriter::new(f))
                }
                None => run(&session, &input, BufWriter::new(io::stdout().lock())),
            }
        }
        Commands::Settings { command } => match command {
            SettingsCommands::Export { catalog, output } => {
                let config = catalog.resolve()?;
                if !config.is_complete() {
                    bail!("no catalog path given");
                }
                save_settings(&output, &config)?;
                Ok(())
            }
            SettingsCommands::Show { path } => {
                let config = load_settings(&path)?;
                let map: std::collections::BTreeMap<_, _> = config.export()?.into_iter().collect();
                println!("{}", serde_json::to_string_pretty(&map)?);
                Ok(())
            }
        },
    }
}

fn run<W: Write>(session: &Session, input: &Path, mut out: W) -> Result<()> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() {
                if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                    if matches!(ext, "json" | "jsonl") {
                        files.push(p.to_path_buf());
                    }
                }
            }
        }
    } else if input.is_file() {
        files.push(input.to_path_buf());
    } else {
        bail!("input {} does not exist", input.display());
    }

    let mut documents = 0usize;
    let mut tokens_in = 0usize;
    let mut tokens_out = 0usize;
    for file in files {
        for payload in read_payloads(&file)? {
            let phrased = session.run(&payload);
            documents += 1;
            tokens_in += payload.token_count();
            tokens_out += phrased.token_count();
            serde_json::to_writer(&mut out, &phrased)?;
            out.write_all(b"\n")?;
        }
    }
    out.flush()?;
    tracing::info!(documents, tokens_in, tokens_out, "phrasify complete");
    Ok(())
}

fn read_payloads(file: &Path) -> Result<Vec<Payload>> {
    let f = File::open(file).with_context(|| format!("opening {}", file.display()))?;
    let reader = BufReader::new(f);
    let mut payloads = Vec::new();
    if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() { continue; }
            let payload: Payload = serde_json::from_str(&line)
                .with_context(|| format!("{}:{}: invalid payload", file.display(), i + 1))?;
            payloads.push(payload);
        }
    } else {
        let json: serde_json::Value = serde_json::from_reader(reader)?;
        match json {
            serde_json::Value::Array(arr) => {
                for v in arr {
                    payloads.push(serde_json::from_value(v)?);
                }
            }
            serde_json::Value::Object(_) => payloads.push(serde_json::from_value(json)?),
            _ => bail!("{}: expected a payload object or array", file.display()),
        }
    }
    Ok(payloads)
}
