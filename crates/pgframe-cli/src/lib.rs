mod cli;
mod config;
mod exec;
mod output;
mod query;
mod write;

use std::io::Read;

pub async fn run(args: Vec<String>) -> anyhow::Result<()> {
    let cmd = cli::parse_args(&args)?;
    match cmd {
        cli::Command::Help(topic) => {
            cli::print_help(topic);
            Ok(())
        }
        cli::Command::Query(args) => query::run(args).await,
        cli::Command::Exec(args) => exec::run(args).await,
        cli::Command::Write(args) => write::run(args).await,
    }
}

/// A SQL argument of `-` means "read the statement from stdin".
fn read_sql_arg(arg: &str) -> anyhow::Result<String> {
    if arg != "-" {
        return Ok(arg.to_string());
    }
    let mut sql = String::new();
    std::io::stdin().read_to_string(&mut sql)?;
    if sql.trim().is_empty() {
        anyhow::bail!("no SQL on stdin");
    }
    Ok(sql)
}
