//! vew CLI
//!
//! Usage:
//!   vew [OPTIONS] [DOCUMENT]
//!
//! Options:
//!   -t, --template <ID>    Template to mount
//!   -m, --model <FILE>     JSON model (defaults to `{}`)
//!   -c, --config <FILE>    View configuration (TOML format)
//!   --paths                Print the model's leaf paths and exit
//!   -h, --help             Print help

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vew::dom::MemoryDocument;
use vew::error::format_errors;
use vew::model::leaf_paths;
use vew::{CompileError, Value, ViewConfig, ViewError, Views};

#[derive(Parser)]
#[command(name = "vew")]
#[command(about = "Mount a template of an HTML document against a JSON model")]
struct Cli {
    /// HTML document (reads from stdin if not provided)
    document: Option<PathBuf>,

    /// Id of the <template> element to mount
    #[arg(short, long)]
    template: Option<String>,

    /// JSON file holding the model
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// View configuration file (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the model's leaf paths and exit
    #[arg(long)]
    paths: bool,
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vew=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    let mut model = match &cli.model {
        Some(path) => match load_model(path) {
            Ok(model) => model,
            Err(e) => fail(&format!("Error loading model '{}': {}", path.display(), e)),
        },
        None => Value::map(),
    };

    if cli.paths {
        for path in leaf_paths(&model) {
            println!("{}", path);
        }
        return;
    }

    let config = match &cli.config {
        Some(path) => match ViewConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => fail(&format!("Error loading config '{}': {}", path.display(), e)),
        },
        None => ViewConfig::default(),
    };

    let Some(template_id) = cli.template.as_deref() else {
        fail("Error: no template given (use --template <ID>)");
    };

    let source = match &cli.document {
        Some(path) => match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => fail(&format!("Error reading file '{}': {}", path.display(), e)),
        },
        None => {
            let mut buffer = String::new();
            match io::stdin().read_to_string(&mut buffer) {
                Ok(_) => buffer,
                Err(e) => fail(&format!("Error reading from stdin: {}", e)),
            }
        }
    };

    let mut doc = match MemoryDocument::parse(&source) {
        Ok(doc) => doc,
        Err(e) => fail(&format!("Error: {}", e)),
    };

    let views = Views::new(config);
    let mut view = match views.view(&doc, template_id) {
        Ok(view) => view,
        Err(e) => fail(&format!("Error: {}", e)),
    };

    match view.create(&mut doc, &mut model) {
        Ok(()) => println!("{}", doc.to_html()),
        Err(ViewError::Compile(CompileError::Parse(errors))) => {
            fail(&format_errors(&errors, view.source(), template_id));
        }
        Err(e) => fail(&format!("Error: {}", e)),
    }
}

fn load_model(path: &Path) -> Result<Value, String> {
    let content = fs::read_to_string(path).map_err(|e| e.to_string())?;
    let json: serde_json::Value = serde_json::from_str(&content).map_err(|e| e.to_string())?;
    Ok(Value::from(json))
}

fn fail(message: &str) -> ! {
    eprintln!("{}", message);
    std::process::exit(1);
}
