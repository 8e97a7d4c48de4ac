use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpTopic {
    Root,
    Query,
    Exec,
    Write,
}

#[derive(Debug, Clone)]
pub enum Command {
    Help(HelpTopic),
    Query(QueryArgs),
    Exec(ExecArgs),
    Write(WriteArgs),
}

/// Where the connection settings come from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionArgs {
    /// `--config <FILE>`; without it `pgframe.toml` is used when present,
    /// otherwise the environment.
    pub config: Option<PathBuf>,
    pub vendor: Option<String>,
}

#[derive(Debug, Clone)]
pub struct QueryArgs {
    pub conn: ConnectionArgs,
    pub sql: String,
    pub json: bool,
}

#[derive(Debug, Clone)]
pub struct ExecArgs {
    pub conn: ConnectionArgs,
    pub sql: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOp {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone)]
pub struct WriteArgs {
    pub op: WriteOp,
    pub conn: ConnectionArgs,
    pub table: String,
    pub file: PathBuf,
    pub keys: Vec<String>,
    pub truncate: bool,
    pub no_guard: bool,
    pub dry_run: bool,
}

pub fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let mut it = args.iter().skip(1);
    let Some(first) = it.next() else {
        return Ok(Command::Help(HelpTopic::Root));
    };

    match first.as_str() {
        "-h" | "--help" => Ok(Command::Help(HelpTopic::Root)),
        "query" => parse_query(it.map(|s| s.as_str())),
        "exec" => parse_exec(it.map(|s| s.as_str())),
        "insert" => parse_write(WriteOp::Insert, it.map(|s| s.as_str())),
        "update" => parse_write(WriteOp::Update, it.map(|s| s.as_str())),
        "delete" => parse_write(WriteOp::Delete, it.map(|s| s.as_str())),
        _ => anyhow::bail!("unknown command: {first}"),
    }
}

/// Consume a connection option if `token` is one. Returns `Ok(false)` when the
/// token belongs to someone else.
fn parse_connection_flag<'a>(
    token: &'a str,
    it: &mut impl Iterator<Item = &'a str>,
    conn: &mut ConnectionArgs,
) -> anyhow::Result<bool> {
    match token {
        "--config" => {
            let Some(v) = it.next() else {
                anyhow::bail!("--config requires a value");
            };
            conn.config = Some(PathBuf::from(v));
        }
        _ if token.starts_with("--config=") => {
            conn.config = Some(PathBuf::from(token.trim_start_matches("--config=")));
        }
        "--vendor" => {
            let Some(v) = it.next() else {
                anyhow::bail!("--vendor requires a value");
            };
            conn.vendor = Some(v.to_string());
        }
        _ if token.starts_with("--vendor=") => {
            conn.vendor = Some(token.trim_start_matches("--vendor=").to_string());
        }
        _ => return Ok(false),
    }
    Ok(true)
}

fn parse_query<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut conn = ConnectionArgs::default();
    let mut sql: Option<String> = None;
    let mut json = false;

    while let Some(token) = it.next() {
        if parse_connection_flag(token, &mut it, &mut conn)? {
            continue;
        }
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Query)),
            "--json" => json = true,
            _ if token.starts_with('-') && token != "-" => {
                anyhow::bail!("unknown option for query: {token}")
            }
            _ if sql.is_none() => sql = Some(token.to_string()),
            _ => anyhow::bail!("unexpected argument: {token}"),
        }
    }

    let Some(sql) = sql else {
        anyhow::bail!("query requires a SQL argument (use - to read stdin)");
    };
    Ok(Command::Query(QueryArgs { conn, sql, json }))
}

fn parse_exec<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut conn = ConnectionArgs::default();
    let mut sql: Option<String> = None;

    while let Some(token) = it.next() {
        if parse_connection_flag(token, &mut it, &mut conn)? {
            continue;
        }
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Exec)),
            _ if token.starts_with('-') && token != "-" => {
                anyhow::bail!("unknown option for exec: {token}")
            }
            _ if sql.is_none() => sql = Some(token.to_string()),
            _ => anyhow::bail!("unexpected argument: {token}"),
        }
    }

    let Some(sql) = sql else {
        anyhow::bail!("exec requires a SQL argument (use - to read stdin)");
    };
    Ok(Command::Exec(ExecArgs { conn, sql }))
}

fn parse_write<'a>(op: WriteOp, mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut conn = ConnectionArgs::default();
    let mut table: Option<String> = None;
    let mut file: Option<PathBuf> = None;
    let mut keys: Vec<String> = Vec::new();
    let mut truncate = false;
    let mut no_guard = false;
    let mut dry_run = false;

    while let Some(token) = it.next() {
        if parse_connection_flag(token, &mut it, &mut conn)? {
            continue;
        }
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Write)),
            "--table" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--table requires a value");
                };
                table = Some(v.to_string());
            }
            _ if token.starts_with("--table=") => {
                table = Some(token.trim_start_matches("--table=").to_string());
            }
            "--file" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--file requires a value");
                };
                file = Some(PathBuf::from(v));
            }
            _ if token.starts_with("--file=") => {
                file = Some(PathBuf::from(token.trim_start_matches("--file=")));
            }
            "--keys" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--keys requires a value");
                };
                keys.extend(split_list(v));
            }
            _ if token.starts_with("--keys=") => {
                keys.extend(split_list(token.trim_start_matches("--keys=")));
            }
            "--truncate" => truncate = true,
            "--no-guard" => no_guard = true,
            "--dry-run" => dry_run = true,
            _ => anyhow::bail!("unknown argument: {token}"),
        }
    }

    let Some(table) = table else {
        anyhow::bail!("--table is required");
    };
    let Some(file) = file else {
        anyhow::bail!("--file is required");
    };
    if op == WriteOp::Update && keys.is_empty() {
        anyhow::bail!("update requires --keys");
    }
    if op != WriteOp::Update && !keys.is_empty() {
        anyhow::bail!("--keys only applies to update");
    }
    if op != WriteOp::Insert && truncate {
        anyhow::bail!("--truncate only applies to insert");
    }

    Ok(Command::Write(WriteArgs {
        op,
        conn,
        table,
        file,
        keys,
        truncate,
        no_guard,
        dry_run,
    }))
}

fn split_list(v: &str) -> impl Iterator<Item = String> + '_ {
    v.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub fn print_help(topic: HelpTopic) {
    match topic {
        HelpTopic::Root => {
            println!(
                "\
pgframe - move tabular data in and out of PostgreSQL

USAGE:
  pgframe <COMMAND> [OPTIONS]

COMMANDS:
  query         Run a query and print the result
  exec          Run statements in a transaction
  insert        Insert JSON records into a table
  update        Update a table from JSON records
  delete        Delete rows matching JSON records

Run `pgframe <command> --help` for more."
            );
        }
        HelpTopic::Query => {
            println!(
                "\
USAGE:
  pgframe query [OPTIONS] <SQL | ->

OPTIONS:
  --json                Print rows as a JSON array
{CONNECTION_HELP}"
            );
        }
        HelpTopic::Exec => {
            println!(
                "\
USAGE:
  pgframe exec [OPTIONS] <SQL | ->

Statements may be separated by ';'. All of them commit or none do.

OPTIONS:
{CONNECTION_HELP}"
            );
        }
        HelpTopic::Write => {
            println!(
                "\
USAGE:
  pgframe insert --table <T> --file <JSON> [--truncate] [OPTIONS]
  pgframe update --table <T> --file <JSON> --keys <a,b> [OPTIONS]
  pgframe delete --table <T> --file <JSON> [OPTIONS]

<JSON> holds an array of objects; keys are column names.

OPTIONS:
  --table <T>           Target table, optionally schema-qualified
  --file <FILE>         JSON records
  --keys <a,b>          Columns that identify a row (update only)
  --truncate            Empty the table before inserting (insert only)
  --no-guard            Skip the SQL injection check
  --dry-run             Print the statement instead of running it
{CONNECTION_HELP}"
            );
        }
    }
}

const CONNECTION_HELP: &str = "\
  --config <FILE>       Connection file (default: pgframe.toml if present, else env)
  --vendor <NAME>       postgres | heroku | gcp
  -h, --help            Print help";

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("pgframe")
            .chain(list.iter().copied())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn no_args_prints_root_help() {
        let cmd = parse_args(&args(&[])).unwrap();
        assert!(matches!(cmd, Command::Help(HelpTopic::Root)));
    }

    #[test]
    fn parse_query_with_connection_flags() {
        let cmd = parse_args(&args(&[
            "query",
            "--vendor",
            "heroku",
            "--config=db.toml",
            "--json",
            "SELECT 1",
        ]))
        .unwrap();
        let Command::Query(q) = cmd else {
            panic!("expected query");
        };
        assert_eq!(q.sql, "SELECT 1");
        assert!(q.json);
        assert_eq!(q.conn.vendor.as_deref(), Some("heroku"));
        assert_eq!(q.conn.config, Some(PathBuf::from("db.toml")));
    }

    #[test]
    fn parse_update_keys() {
        let cmd = parse_args(&args(&[
            "update",
            "--table",
            "test.simple",
            "--file",
            "cars.json",
            "--keys",
            "id, date",
            "--dry-run",
        ]))
        .unwrap();
        let Command::Write(w) = cmd else {
            panic!("expected write");
        };
        assert_eq!(w.op, WriteOp::Update);
        assert_eq!(w.table, "test.simple");
        assert_eq!(w.keys, vec!["id", "date"]);
        assert!(w.dry_run);
        assert!(!w.no_guard);
    }

    #[test]
    fn update_without_keys_is_rejected() {
        let err = parse_args(&args(&["update", "--table", "t", "--file", "f.json"])).unwrap_err();
        assert!(err.to_string().contains("--keys"));
    }

    #[test]
    fn truncate_only_for_insert() {
        assert!(parse_args(&args(&["insert", "--table=t", "--file=f.json", "--truncate"])).is_ok());
        assert!(parse_args(&args(&["delete", "--table=t", "--file=f.json", "--truncate"])).is_err());
    }

    #[test]
    fn help_for_subcommand() {
        let cmd = parse_args(&args(&["delete", "--help"])).unwrap();
        assert!(matches!(cmd, Command::Help(HelpTopic::Write)));
    }

    #[test]
    fn unknown_command_errors() {
        assert!(parse_args(&args(&["migrate"])).is_err());
    }
}
