use std::io::Read;

use medusa_core::{CompileOptions, Diagram, Engine, VisibilitySet};
use serde::Serialize;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Compile(medusa_core::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Compile(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<medusa_core::Error> for CliError {
    fn from(value: medusa_core::Error) -> Self {
        Self::Compile(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Command {
    #[default]
    Compile,
    Stats,
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    pretty: bool,
    strict: bool,
    overview: bool,
    out: Option<String>,
}

#[derive(Serialize)]
struct StatsOut {
    nodes: usize,
    edges: usize,
    hidden_nodes: usize,
    hidden_edges: usize,
}

fn usage() -> &'static str {
    "medusa-cli\n\
\n\
USAGE:\n\
  medusa-cli [compile] [--pretty] [--strict] [--overview] [--out <path>] [<path>|-]\n\
  medusa-cli stats [--overview] [<path>|-]\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', input is read from stdin.\n\
  - compile prints the diagram graph (nodes + edges) as JSON.\n\
  - --overview applies collapse-all and keeps only the visible subset.\n\
  - Without --strict, invalid JSON produces an empty diagram instead of an error.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1).peekable();
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "compile" => args.command = Command::Compile,
            "stats" => args.command = Command::Stats,
            "--pretty" => args.pretty = true,
            "--strict" => args.strict = true,
            "--overview" => args.overview = true,
            "--out" => {
                let Some(out) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.out = Some(out.clone());
            }
            "--" => {
                if let Some(rest) = it.next() {
                    if args.input.is_some() {
                        return Err(CliError::Usage(usage()));
                    }
                    args.input = Some(rest.clone());
                }
                while it.next().is_some() {
                    return Err(CliError::Usage(usage()));
                }
            }
            other if other.starts_with('-') && other != "-" => {
                return Err(CliError::Usage(usage()));
            }
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    Ok(args)
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn write_json<T: Serialize>(value: &T, pretty: bool, out: Option<&str>) -> Result<(), CliError> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    match out {
        None | Some("-") => println!("{text}"),
        Some(path) => std::fs::write(path, text + "\n")?,
    }
    Ok(())
}

/// Keeps only the nodes/edges the visibility set leaves visible.
fn apply_overview(diagram: &Diagram) -> Diagram {
    let mut vis = VisibilitySet::new();
    let _ = vis.collapse_all(diagram);
    Diagram {
        nodes: diagram
            .nodes
            .iter()
            .filter(|n| !vis.is_node_hidden(n.id))
            .cloned()
            .collect(),
        edges: diagram
            .edges
            .iter()
            .filter(|e| !vis.is_edge_hidden(&e.id))
            .cloned()
            .collect(),
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let text = read_input(args.input.as_deref())?;
    let mut engine = Engine::new();
    let options = if args.strict {
        CompileOptions::strict()
    } else {
        CompileOptions::lenient()
    };

    let diagram = engine.compile(&text, options)?;

    match args.command {
        Command::Compile => {
            if args.overview {
                write_json(&apply_overview(&diagram), args.pretty, args.out.as_deref())
            } else {
                write_json(&diagram, args.pretty, args.out.as_deref())
            }
        }
        Command::Stats => {
            let mut vis = VisibilitySet::new();
            if args.overview {
                let _ = vis.collapse_all(&diagram);
            }
            let stats = StatsOut {
                nodes: diagram.nodes.len(),
                edges: diagram.edges.len(),
                hidden_nodes: vis.collapsed_nodes.len(),
                hidden_edges: vis.collapsed_edges.len(),
            };
            write_json(&stats, args.pretty, args.out.as_deref())
        }
    }
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    match run(args) {
        Ok(()) => {}
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
