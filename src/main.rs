//! CLI tool to render a yate template with bindings given on the
//! command line.

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use yate::{Arrays, Values};

#[derive(Parser)]
#[command(
    name = "yate",
    version,
    about = "Render a template with values and arrays bound from the command line",
    after_help = "Examples:\n  \
        yate page.tpl --var title=Home --array items=a,b,c\n  \
        echo 'Hello {{name}}' | yate --var name=World"
)]
struct Cli {
    /// Template file; reads stdin when omitted or `-`.
    #[arg(value_name = "TEMPLATE")]
    template: Option<PathBuf>,

    /// Bind a printable value.
    #[arg(short, long = "var", value_name = "NAME=VALUE", value_parser = parse_binding)]
    vars: Vec<(String, String)>,

    /// Bind an array; elements are comma separated, empty for none.
    #[arg(short, long = "array", value_name = "NAME=A,B,C", value_parser = parse_binding)]
    arrays: Vec<(String, String)>,
}

fn parse_binding(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    if name.is_empty() {
        return Err(format!("missing name in '{raw}'"));
    }
    Ok((name.to_string(), value.to_string()))
}

fn split_elements(value: &str) -> Vec<String> {
    if value.is_empty() {
        Vec::new()
    } else {
        value.split(',').map(str::to_string).collect()
    }
}

/// Log to stderr when `RUST_LOG` is set, e.g. `RUST_LOG=yate=debug`.
fn init_tracing() {
    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(io::stderr)
                    .with_target(true)
                    .with_level(true),
            )
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn read_template(template: Option<&PathBuf>) -> io::Result<(String, String)> {
    match template {
        Some(path) if path.as_os_str() != "-" => {
            let content = fs::read_to_string(path)?;
            Ok((path.display().to_string(), content))
        }
        _ => {
            let mut content = String::new();
            io::stdin().read_to_string(&mut content)?;
            Ok(("<stdin>".to_string(), content))
        }
    }
}

fn write_output(out: &mut impl Write, text: &str) -> io::Result<()> {
    out.write_all(text.as_bytes())?;
    out.flush()
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let (source, content) = match read_template(cli.template.as_ref()) {
        Ok(read) => read,
        Err(e) => {
            let source = cli
                .template
                .as_ref()
                .map_or_else(|| "<stdin>".to_string(), |p| p.display().to_string());
            eprintln!("{source}: {e}");
            return ExitCode::from(2);
        }
    };

    let values: Values = cli.vars.into_iter().collect();
    let arrays: Arrays = cli
        .arrays
        .into_iter()
        .map(|(name, value)| (name, split_elements(&value)))
        .collect();

    let mut output = String::new();
    let result = yate::render(values, arrays, &content, &mut output);
    if let Err(e) = write_output(&mut io::stdout().lock(), &output) {
        eprintln!("<stdout>: {e}");
        return ExitCode::FAILURE;
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{source}: {e}");
            ExitCode::FAILURE
        }
    }
}
