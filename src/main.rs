#![deny(clippy::all, clippy::pedantic, clippy::unwrap_used)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::print_stdout
)]

use std::collections::HashMap;
use std::io::{self, BufRead, Read, Write};
use std::iter;
use std::process::ExitCode;

use clap::{Arg, ArgAction, ArgMatches, Command};
use repo_url::{DEFAULT_KEYS, RepoUrlParser};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "REPO_URL_LOG";

#[derive(Debug, Error)]
enum CliError {
    #[error("field argument {0:?} is not of the form KEY=VALUE")]
    Field(String),

    #[error("failed to decode JSON from stdin: {0}")]
    Json(#[from] serde_json::Error),

    #[error("JSON pointer {0:?} matched nothing")]
    Pointer(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Format {
    Https,
    Ssh,
    Git,
}

/// The per-line subcommands.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Op {
    Clean,
    Normalize,
    Parse(Format),
    Host,
    Path,
    OwnerRepo,
    Known,
    Canonical,
}

impl Op {
    fn from_matches(name: &str, matches: &ArgMatches) -> Option<Self> {
        let op = match name {
            "clean" => Op::Clean,
            "normalize" => Op::Normalize,
            "parse" => {
                let format = match matches.get_one::<String>("format").map(String::as_str) {
                    Some("ssh") => Format::Ssh,
                    Some("git") => Format::Git,
                    _ => Format::Https,
                };
                Op::Parse(format)
            }
            "host" => Op::Host,
            "path" => Op::Path,
            "owner-repo" => Op::OwnerRepo,
            "known" => Op::Known,
            "canonical" => Op::Canonical,
            _ => return None,
        };
        Some(op)
    }

    fn apply(self, parser: &RepoUrlParser, input: &str) -> Option<String> {
        let non_empty = |s: String| if s.is_empty() { None } else { Some(s) };

        match self {
            Op::Clean => non_empty(parser.clean(input)),
            Op::Normalize => non_empty(repo_url::normalize(input)),
            Op::Parse(format) => {
                let repo = parser.parse_url(input)?;
                let hosts = parser.hosts();
                Some(match format {
                    Format::Https => repo.canonical_url(hosts),
                    Format::Ssh => repo.ssh_url(hosts),
                    Format::Git => repo.git_url(hosts),
                })
            }
            Op::Host => parser.extract_host(input),
            Op::Path => parser.extract_path(input),
            Op::OwnerRepo => parser.extract_owner_repo(input),
            Op::Known => parser.is_known_host(input).then(|| "true".to_string()),
            Op::Canonical => parser.canonical_url(input),
        }
    }

    /// What to print when `apply` finds nothing.
    fn missing(self) -> &'static str {
        match self {
            Op::Known => "false",
            _ => "",
        }
    }
}

fn cli() -> Command {
    let input = Arg::new("input")
        .help("Text to process (read line by line from stdin when omitted)")
        .num_args(0..)
        .allow_hyphen_values(true)
        .value_name("TEXT");

    let per_line = |name: &'static str, about: &'static str| Command::new(name).about(about).arg(input.clone());

    Command::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .author(env!("CARGO_PKG_AUTHORS"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Log decisions to stderr (-vv for more)")
                .action(ArgAction::Count)
                .global(true),
        )
        .subcommand(per_line("clean", "Strip decoration, leaving host/path"))
        .subcommand(per_line("normalize", "Tidy into an https:// URL without requiring owner/repo"))
        .subcommand(
            per_line("parse", "Print the canonical repository URL").arg(
                Arg::new("format")
                    .short('f')
                    .long("format")
                    .help("URL flavour to print")
                    .value_parser(["https", "ssh", "git"])
                    .default_value("https"),
            ),
        )
        .subcommand(per_line("host", "Print the host"))
        .subcommand(per_line("path", "Print the path after the host"))
        .subcommand(per_line("owner-repo", "Print owner/repo"))
        .subcommand(per_line("known", "Print whether the host is a known hosting service"))
        .subcommand(per_line("canonical", "Like parse, but only for known hosting services"))
        .subcommand(per_line("first", "Print the first input that names a repository"))
        .subcommand(
            Command::new("fields")
                .about("Pick the repository out of KEY=VALUE metadata fields")
                .arg(
                    Arg::new("field")
                        .help("Metadata field, e.g. 'Source Code=https://github.com/o/r'")
                        .num_args(0..)
                        .value_name("KEY=VALUE"),
                )
                .arg(
                    Arg::new("key")
                        .short('k')
                        .long("key")
                        .help("Field to try first; repeat to give an order")
                        .action(ArgAction::Append)
                        .value_name("KEY"),
                ),
        )
        .subcommand(
            Command::new("json")
                .about("Pick the repository out of a JSON metadata document on stdin")
                .arg(
                    Arg::new("pointer")
                        .short('p')
                        .long("pointer")
                        .help("JSON pointer to the repository value, e.g. /repository")
                        .value_name("POINTER"),
                ),
        )
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn inputs(matches: &ArgMatches) -> io::Result<Vec<String>> {
    match matches.get_many::<String>("input") {
        Some(values) => Ok(values.cloned().collect()),
        None => io::stdin().lock().lines().collect(),
    }
}

fn print(out: &mut impl Write, found: Option<&str>, missing: &str) -> io::Result<bool> {
    writeln!(out, "{}", found.unwrap_or(missing))?;
    Ok(found.is_some())
}

fn fields(parser: &RepoUrlParser, matches: &ArgMatches) -> Result<Option<String>, CliError> {
    let mut fields = HashMap::new();
    for arg in matches.get_many::<String>("field").unwrap_or_default() {
        let (key, value) = arg.split_once('=').ok_or_else(|| CliError::Field(arg.clone()))?;
        fields.insert(key.to_string(), value.to_string());
    }

    let keys: Vec<&str> = matches
        .get_many::<String>("key")
        .unwrap_or_default()
        .map(String::as_str)
        .collect();

    Ok(parser.parse_from_map(&fields, &keys))
}

fn json(parser: &RepoUrlParser, matches: &ArgMatches) -> Result<Option<String>, CliError> {
    let mut text = String::new();
    io::stdin().lock().read_to_string(&mut text)?;
    let doc: Value = serde_json::from_str(&text)?;

    if let Some(pointer) = matches.get_one::<String>("pointer") {
        let value = doc.pointer(pointer).ok_or_else(|| CliError::Pointer(pointer.clone()))?;
        return Ok(parser.extract_repo_url(value));
    }

    // A whole metadata document: try the usual repository fields, then the
    // document itself.
    let candidates: Vec<&Value> = match &doc {
        Value::Object(obj) => DEFAULT_KEYS.iter().filter_map(|&key| obj.get(key)).collect(),
        _ => Vec::new(),
    };
    Ok(parser.extract_repo_url_with_fallback(candidates.into_iter().chain(iter::once(&doc))))
}

/// Returns whether anything was found.
fn run(matches: &ArgMatches) -> Result<bool, CliError> {
    let parser = repo_url::default_parser();
    let Some((name, sub)) = matches.subcommand() else {
        return Ok(false);
    };
    debug!(command = name, "running");

    let mut out = io::stdout().lock();

    match name {
        "first" => {
            let found = parser.first_repo_url(inputs(sub)?);
            Ok(print(&mut out, found.as_deref(), "")?)
        }
        "fields" => {
            let found = fields(parser, sub)?;
            Ok(print(&mut out, found.as_deref(), "")?)
        }
        "json" => {
            let found = json(parser, sub)?;
            Ok(print(&mut out, found.as_deref(), "")?)
        }
        _ => {
            let Some(op) = Op::from_matches(name, sub) else {
                return Ok(false);
            };
            let mut any = false;
            for input in inputs(sub)? {
                any |= print(&mut out, op.apply(parser, &input).as_deref(), op.missing())?;
            }
            Ok(any)
        }
    }
}

fn main() -> ExitCode {
    let matches = cli().get_matches();
    init_logging(matches.get_count("verbose"));

    match run(&matches) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            error!("{err}");
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn test_cli_definition() {
        cli().debug_assert();
    }

    #[test]
    fn test_op_apply() {
        let parser = RepoUrlParser::default();
        let input = "git@github.com:owner/repo.git";

        assert_eq!(Op::Clean.apply(&parser, input).as_deref(), Some("github.com/owner/repo"));
        assert_eq!(Op::Normalize.apply(&parser, input).as_deref(), Some("https://github.com/owner/repo"));
        assert_eq!(
            Op::Parse(Format::Https).apply(&parser, input).as_deref(),
            Some("https://github.com/owner/repo")
        );
        assert_eq!(
            Op::Parse(Format::Ssh).apply(&parser, input).as_deref(),
            Some("git@github.com:owner/repo.git")
        );
        assert_eq!(
            Op::Parse(Format::Git).apply(&parser, input).as_deref(),
            Some("git://github.com/owner/repo.git")
        );
        assert_eq!(Op::Host.apply(&parser, input).as_deref(), Some("github.com"));
        assert_eq!(Op::Path.apply(&parser, input).as_deref(), Some("owner/repo"));
        assert_eq!(Op::OwnerRepo.apply(&parser, input).as_deref(), Some("owner/repo"));
        assert_eq!(Op::Known.apply(&parser, input).as_deref(), Some("true"));
        assert_eq!(Op::Canonical.apply(&parser, input).as_deref(), Some("https://github.com/owner/repo"));

        assert_eq!(Op::Known.apply(&parser, "https://git.example.com/a/b"), None);
        assert_eq!(Op::Known.missing(), "false");
        assert_eq!(Op::Clean.apply(&parser, ""), None);
    }

    #[test]
    fn test_op_from_matches() -> TestResult {
        let matches = cli().try_get_matches_from(["repo-url", "parse", "--format", "ssh", "x"])?;
        let (name, sub) = matches.subcommand().ok_or("no subcommand")?;
        assert_eq!(Op::from_matches(name, sub), Some(Op::Parse(Format::Ssh)));

        let matches = cli().try_get_matches_from(["repo-url", "owner-repo", "x"])?;
        let (name, sub) = matches.subcommand().ok_or("no subcommand")?;
        assert_eq!(Op::from_matches(name, sub), Some(Op::OwnerRepo));

        assert!(cli().try_get_matches_from(["repo-url", "parse", "--format", "svn", "x"]).is_err());

        Ok(())
    }

    #[test]
    fn test_fields() -> TestResult {
        let parser = RepoUrlParser::default();

        let matches = cli().try_get_matches_from([
            "repo-url",
            "fields",
            "--key",
            "homepage",
            "Source Code=https://codeberg.org/a/b",
            "homepage=https://gitlab.com/c/d",
        ])?;
        let (_, sub) = matches.subcommand().ok_or("no subcommand")?;
        assert_eq!(fields(&parser, sub)?.as_deref(), Some("https://gitlab.com/c/d"));

        let matches = cli().try_get_matches_from(["repo-url", "fields", "no-equals-sign"])?;
        let (_, sub) = matches.subcommand().ok_or("no subcommand")?;
        assert!(matches!(fields(&parser, sub), Err(CliError::Field(_))));

        Ok(())
    }

    #[test]
    fn test_print() -> TestResult {
        let mut out = Vec::new();
        assert!(print(&mut out, Some("https://github.com/a/b"), "")?);
        assert!(!print(&mut out, None, "false")?);
        assert_eq!(String::from_utf8(out)?, "https://github.com/a/b\nfalse\n");
        Ok(())
    }
}
