//! Terminal front end for the calculator.
//!
//! Evaluates expressions given on the command line, runs calculator commands
//! against files, and previews what the status widget would show for a
//! selection.

mod host;

use std::{
  fs::File,
  io::{
    BufReader,
    BufWriter,
  },
  num::NonZeroUsize,
  path::{
    Path,
    PathBuf,
  },
  process::ExitCode,
  sync::Mutex,
};

use clap::{
  ArgAction,
  Parser,
  Subcommand,
};
use eyre::{
  Result,
  WrapErr,
  bail,
};
use ropey::Rope;
use smallvec::SmallVec;
use the_calc::{
  ConfigSource,
  Evaluator,
  Session,
};
use the_lib::{
  document::{
    Document,
    DocumentId,
  },
  selection::{
    Range,
    Selection,
  },
};
use the_runtime::{
  FileConfig,
  SystemClipboard,
  config::{
    self,
    ConfigOverrides,
  },
};
use tracing_subscriber::{
  EnvFilter,
  fmt,
  prelude::*,
};

use crate::host::TerminalHost;

const COMMAND_PREFIX: &str = "calculator.";

#[derive(Debug, Parser)]
#[command(name = "the-calculator", version)]
#[command(about = "Evaluate math in text selections")]
struct Cli {
  /// Increase log verbosity (-v info, -vv debug, -vvv trace)
  #[arg(short, long, action = ArgAction::Count, global = true)]
  verbose: u8,

  /// Write logs to FILE instead of stderr
  #[arg(long, value_name = "FILE", global = true)]
  log: Option<PathBuf>,

  /// Read settings from FILE instead of the default config.toml
  #[arg(long, value_name = "FILE", global = true)]
  config: Option<PathBuf>,

  /// Significant digits kept in results, -1 to disable rounding
  #[arg(long, value_name = "N", allow_negative_numbers = true, global = true)]
  decimal_places: Option<i32>,

  /// First value written by the count command
  #[arg(long, value_name = "N", allow_negative_numbers = true, global = true)]
  count_start: Option<i64>,

  /// Group digits of numeric results
  #[arg(long, global = true)]
  human: bool,

  /// Evaluate selected text exactly as written
  #[arg(long, global = true)]
  bypass_input_formatting: bool,

  /// Locale used for digit grouping, e.g. de-DE
  #[arg(long, value_name = "TAG", global = true)]
  locale: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
  /// Evaluate an expression and print the result
  Eval {
    #[arg(required = true, num_args = 1..)]
    expr: Vec<String>,
  },
  /// Run a calculator command against a file
  Run {
    /// Command name, with or without the `calculator.` prefix
    command:  String,
    file:     Option<PathBuf>,
    /// Character range FROM..TO to select; repeat for more cursors. Defaults
    /// to the whole file
    #[arg(short, long = "select", value_name = "FROM..TO", value_parser = parse_range)]
    select:   Vec<Range>,
    /// Write the result back to FILE instead of printing it
    #[arg(long)]
    in_place: bool,
  },
  /// Print what the status widget shows for a selection
  Preview {
    file:   PathBuf,
    #[arg(short, long = "select", value_name = "FROM..TO", value_parser = parse_range)]
    select: Range,
  },
  /// List available commands
  Commands,
}

fn main() -> Result<ExitCode> {
  let cli = Cli::parse();
  init_logging(cli.verbose, cli.log.as_deref())?;

  let overrides = ConfigOverrides {
    count_start:             cli.count_start,
    decimal_places:          cli.decimal_places,
    human_formatted_output:  cli.human.then_some(true),
    bypass_input_formatting: cli.bypass_input_formatting.then_some(true),
    locale:                  cli.locale,
  };
  let config_file = cli.config.unwrap_or_else(config::default_config_file);
  tracing::debug!(path = %config_file.display(), "using config file");
  let source = FileConfig::new(config_file).with_overrides(overrides);

  match cli.command {
    Command::Eval { expr } => eval(&source, &expr.join(" ")),
    Command::Run {
      command,
      file,
      select,
      in_place,
    } => run(source, &command, file.as_deref(), select, in_place),
    Command::Preview { file, select } => preview(source, &file, select),
    Command::Commands => {
      let session = Session::new(Evaluator::default(), Box::new(source));
      for name in session.commands().names() {
        if let Some(command) = session.commands().get(name) {
          println!("{:<24} {}", command.name, command.doc);
        }
      }
      Ok(ExitCode::SUCCESS)
    },
  }
}

fn init_logging(verbosity: u8, log_file: Option<&Path>) -> Result<()> {
  let level = match verbosity {
    0 => "warn",
    1 => "info",
    2 => "debug",
    _ => "trace",
  };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
  let registry = tracing_subscriber::registry().with(filter);

  match log_file {
    Some(path) => {
      config::ensure_parent_dir(path);
      let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .wrap_err_with(|| format!("failed to open log file {}", path.display()))?;
      registry
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .init();
    },
    None => registry.with(fmt::layer().with_writer(std::io::stderr)).init(),
  }
  Ok(())
}

fn eval(source: &FileConfig, expr: &str) -> Result<ExitCode> {
  let config = source.load().unwrap_or_else(|err| {
    tracing::warn!(%err, "failed to read settings, using defaults");
    Default::default()
  });
  match Evaluator::default().evaluate(expr, &config.evaluation()) {
    Ok(result) => {
      println!("{result}");
      Ok(ExitCode::SUCCESS)
    },
    Err(_) => {
      eprintln!("could not evaluate: {expr}");
      Ok(ExitCode::FAILURE)
    },
  }
}

fn run(
  source: FileConfig,
  command: &str,
  file: Option<&Path>,
  select: Vec<Range>,
  in_place: bool,
) -> Result<ExitCode> {
  if in_place && file.is_none() {
    bail!("--in-place needs a file");
  }
  let doc = file.map(|path| open_document(path, select)).transpose()?;
  let mut session = Session::new(Evaluator::default(), Box::new(source));
  let mut host = TerminalHost::new(
    doc,
    std::io::stdin().lock(),
    std::io::stderr(),
    Box::new(SystemClipboard::detect()),
  );

  session.execute(&command_name(command), &mut host)?;

  let (Some(doc), Some(path)) = (host.into_document(), file) else {
    return Ok(ExitCode::SUCCESS);
  };
  if in_place {
    let out = File::create(path).wrap_err_with(|| format!("failed to write {}", path.display()))?;
    doc.text().write_to(BufWriter::new(out))?;
  } else {
    print!("{}", doc.text());
  }
  Ok(ExitCode::SUCCESS)
}

fn preview(source: FileConfig, file: &Path, select: Range) -> Result<ExitCode> {
  let doc = open_document(file, vec![select])?;
  let mut session = Session::new(Evaluator::default(), Box::new(source));
  let mut host = TerminalHost::new(
    Some(doc),
    std::io::empty(),
    std::io::stderr(),
    Box::new(SystemClipboard::None),
  );

  session.on_selection_change(&mut host);
  match session.widget().and_then(|widget| widget.display()) {
    Some(text) => {
      println!("{text}");
      Ok(ExitCode::SUCCESS)
    },
    None => Ok(ExitCode::FAILURE),
  }
}

fn open_document(path: &Path, select: Vec<Range>) -> Result<Document> {
  let file = File::open(path).wrap_err_with(|| format!("failed to open {}", path.display()))?;
  let text = Rope::from_reader(BufReader::new(file))?;
  let len = text.len_chars();

  let mut doc = Document::new(DocumentId::new(NonZeroUsize::MIN), text);
  doc.set_display_name(path.display().to_string());

  let selection = if select.is_empty() {
    Selection::single(0, len)
  } else {
    Selection::new(SmallVec::from_vec(select))?
  };
  doc.set_selection(selection)?;
  Ok(doc)
}

fn command_name(name: &str) -> String {
  if name.starts_with(COMMAND_PREFIX) {
    name.to_owned()
  } else {
    format!("{COMMAND_PREFIX}{name}")
  }
}

/// Parses `FROM..TO` into a range, or a single position into a cursor.
fn parse_range(s: &str) -> Result<Range, String> {
  let parse = |n: &str| {
    n.trim()
      .parse::<usize>()
      .map_err(|err| format!("invalid position `{n}`: {err}"))
  };
  match s.split_once("..") {
    Some((from, to)) => Ok(Range::new(parse(from)?, parse(to)?)),
    None => Ok(Range::point(parse(s)?)),
  }
}

#[cfg(test)]
mod tests {
  use clap::CommandFactory;

  use super::*;

  #[test]
  fn cli_is_well_formed() {
    Cli::command().debug_assert();
  }

  #[test]
  fn ranges_parse() {
    assert_eq!(parse_range("3..7"), Ok(Range::new(3, 7)));
    assert_eq!(parse_range("7..3"), Ok(Range::new(7, 3)));
    assert_eq!(parse_range("4"), Ok(Range::point(4)));
    assert!(parse_range("a..3").is_err());
    assert!(parse_range("..").is_err());
  }

  #[test]
  fn command_names_get_prefixed() {
    assert_eq!(command_name("evaluate"), "calculator.evaluate");
    assert_eq!(command_name("calculator.count"), "calculator.count");
  }

  #[test]
  fn negative_decimal_places_parse() {
    let cli = Cli::try_parse_from(["the-calculator", "--decimal-places", "-1", "eval", "1/3"]).unwrap();
    assert_eq!(cli.decimal_places, Some(-1));
    assert!(matches!(cli.command, Command::Eval { .. }));
  }

  #[test]
  fn count_start_flag_parses() {
    let cli =
      Cli::try_parse_from(["the-calculator", "run", "count", "list.txt", "--count-start", "-3"])
        .unwrap();
    assert_eq!(cli.count_start, Some(-3));
  }

  #[test]
  fn run_collects_selections() {
    let cli = Cli::try_parse_from([
      "the-calculator",
      "run",
      "replace",
      "notes.txt",
      "-s",
      "0..3",
      "--select",
      "5..9",
    ])
    .unwrap();
    let Command::Run { select, .. } = cli.command else {
      panic!("expected run");
    };
    assert_eq!(select, vec![Range::new(0, 3), Range::new(5, 9)]);
  }
}
