use std::path::PathBuf;

use pgdyn::Operation;

pub const DEFAULT_CONFIG: &str = "pgdyn.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpTopic {
    Root,
    Query,
    Schema,
    SchemaApply,
    Status,
}

#[derive(Debug, Clone)]
pub enum Command {
    Help(HelpTopic),
    Query(QueryArgs),
    Schema(SchemaCommand),
    Status(ConnectArgs),
}

/// Where the database settings come from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectArgs {
    /// `None` means the default `pgdyn.toml`, which may be absent.
    pub config: Option<PathBuf>,
    pub database: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestSource {
    Inline(String),
    File(PathBuf),
    Stdin,
}

#[derive(Debug, Clone)]
pub struct QueryArgs {
    pub operation: Operation,
    pub source: RequestSource,
    pub dry_run: bool,
    pub connect: ConnectArgs,
}

#[derive(Debug, Clone)]
pub enum SchemaCommand {
    Print(SchemaPrintArgs),
    Apply(ConnectArgs),
}

#[derive(Debug, Clone)]
pub struct SchemaPrintArgs {
    pub output: Option<PathBuf>,
}

pub fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let mut it = args.iter().skip(1);
    let Some(first) = it.next() else {
        return Ok(Command::Help(HelpTopic::Root));
    };

    match first.as_str() {
        "-h" | "--help" | "help" => Ok(Command::Help(HelpTopic::Root)),
        "query" => parse_query(it.map(|s| s.as_str())),
        "schema" => parse_schema(it.map(|s| s.as_str())),
        "status" => parse_status(it.map(|s| s.as_str())),
        _ => anyhow::bail!("unknown command: {first}"),
    }
}

/// Handle `--config` / `--database` in both `--flag value` and `--flag=value`
/// form. Returns `false` if `token` is neither.
fn parse_connect_flag<'a>(
    token: &'a str,
    it: &mut impl Iterator<Item = &'a str>,
    connect: &mut ConnectArgs,
) -> anyhow::Result<bool> {
    match token {
        "--config" => {
            let Some(v) = it.next() else {
                anyhow::bail!("--config requires a value");
            };
            connect.config = Some(PathBuf::from(v));
        }
        _ if token.starts_with("--config=") => {
            connect.config = Some(PathBuf::from(token.trim_start_matches("--config=")));
        }
        "--database" => {
            let Some(v) = it.next() else {
                anyhow::bail!("--database requires a value");
            };
            connect.database = Some(v.to_string());
        }
        _ if token.starts_with("--database=") => {
            connect.database = Some(token.trim_start_matches("--database=").to_string());
        }
        _ => return Ok(false),
    }
    Ok(true)
}

fn parse_query<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut operation: Option<Operation> = None;
    let mut source: Option<RequestSource> = None;
    let mut dry_run = false;
    let mut connect = ConnectArgs::default();

    let mut set_source = |s: RequestSource| -> anyhow::Result<()> {
        if source.replace(s).is_some() {
            anyhow::bail!("--request and --file are mutually exclusive");
        }
        Ok(())
    };

    while let Some(token) = it.next() {
        if parse_connect_flag(token, &mut it, &mut connect)? {
            continue;
        }
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Query)),
            "--dry-run" => dry_run = true,
            "--request" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--request requires a value");
                };
                set_source(RequestSource::Inline(v.to_string()))?;
            }
            _ if token.starts_with("--request=") => {
                set_source(RequestSource::Inline(
                    token.trim_start_matches("--request=").to_string(),
                ))?;
            }
            "--file" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--file requires a value");
                };
                set_source(RequestSource::File(PathBuf::from(v)))?;
            }
            _ if token.starts_with("--file=") => {
                set_source(RequestSource::File(PathBuf::from(
                    token.trim_start_matches("--file="),
                )))?;
            }
            other if other.starts_with('-') => anyhow::bail!("unknown argument: {other}"),
            other if operation.is_none() => operation = Some(other.parse()?),
            other => anyhow::bail!("unexpected argument: {other}"),
        }
    }

    let Some(operation) = operation else {
        anyhow::bail!(
            "missing operation: expected one of {}",
            Operation::ALL.map(|op| op.as_str()).join(", ")
        );
    };

    Ok(Command::Query(QueryArgs {
        operation,
        source: source.unwrap_or(RequestSource::Stdin),
        dry_run,
        connect,
    }))
}

fn parse_schema<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut subcmd: Option<&str> = None;
    let mut output: Option<PathBuf> = None;
    let mut connect = ConnectArgs::default();

    while let Some(token) = it.next() {
        if parse_connect_flag(token, &mut it, &mut connect)? {
            continue;
        }
        match token {
            "-h" | "--help" => {
                return Ok(Command::Help(match subcmd {
                    None => HelpTopic::Schema,
                    Some("apply") => HelpTopic::SchemaApply,
                    Some(other) => anyhow::bail!("unknown subcommand: {other}"),
                }));
            }
            "apply" if subcmd.is_none() => subcmd = Some(token),
            "--output" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--output requires a value");
                };
                output = Some(PathBuf::from(v));
            }
            _ if token.starts_with("--output=") => {
                output = Some(PathBuf::from(token.trim_start_matches("--output=")));
            }
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }

    let cmd = match subcmd {
        None => {
            if connect != ConnectArgs::default() {
                anyhow::bail!("--config/--database only apply to `pgdyn schema apply`");
            }
            SchemaCommand::Print(SchemaPrintArgs { output })
        }
        Some("apply") => {
            if output.is_some() {
                anyhow::bail!("invalid options for `schema apply`");
            }
            SchemaCommand::Apply(connect)
        }
        Some(other) => anyhow::bail!("unknown subcommand: {other}"),
    };

    Ok(Command::Schema(cmd))
}

fn parse_status<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut connect = ConnectArgs::default();

    while let Some(token) = it.next() {
        if parse_connect_flag(token, &mut it, &mut connect)? {
            continue;
        }
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Status)),
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }

    Ok(Command::Status(connect))
}

pub fn print_help(topic: HelpTopic) {
    match topic {
        HelpTopic::Root => {
            println!(
                "\
pgdyn - dynamic PostgreSQL data access

USAGE:
  pgdyn <COMMAND> [OPTIONS]

COMMANDS:
  query         Translate (and run) a declarative request
  schema        Print or apply CREATE TABLE statements for the built-in entities
  status        Connect and report the connection state

Run `pgdyn <command> --help` for more."
            );
        }
        HelpTopic::Query => {
            println!(
                "\
USAGE:
  pgdyn query <OPERATION> [OPTIONS]

OPERATIONS:
  count, find-one, find-many, create, update, update-many, delete, delete-many

NOTES:
  The request is JSON: {{\"model\": ..., \"where\": [...], \"data\": {{...}}, \"limit\": n,
  \"offset\": n, \"sortBy\": [...]}}. It is read from stdin unless given inline or as a file.

OPTIONS:
  --request <JSON>      Request body
  --file <PATH>         Read the request body from a file
  --dry-run             Print the statement and arguments without connecting
  --config <FILE>       Config file path (default: pgdyn.toml)
  --database <URL>      Override database.url from config
  -h, --help            Print help"
            );
        }
        HelpTopic::Schema => {
            println!(
                "\
USAGE:
  pgdyn schema [OPTIONS]
  pgdyn schema apply [OPTIONS]

OPTIONS:
  --output <FILE>       Write the statements to a file (default: stdout)
  -h, --help            Print help

Run `pgdyn schema apply --help` for more."
            );
        }
        HelpTopic::SchemaApply => {
            println!(
                "\
USAGE:
  pgdyn schema apply [OPTIONS]

OPTIONS:
  --config <FILE>       Config file path (default: pgdyn.toml)
  --database <URL>      Override database.url from config
  -h, --help            Print help"
            );
        }
        HelpTopic::Status => {
            println!(
                "\
USAGE:
  pgdyn status [OPTIONS]

OPTIONS:
  --config <FILE>       Config file path (default: pgdyn.toml)
  --database <URL>      Override database.url from config
  -h, --help            Print help"
            );
        }
    }
}
