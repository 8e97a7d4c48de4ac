use crate::cli::{WriteArgs, WriteOp};
use pgframe::{Connector, DataFrame, SqlWriter};
use std::path::Path;

pub async fn run(args: WriteArgs) -> anyhow::Result<()> {
    let data = load_records(&args.file)?;
    let writer = SqlWriter::new().guard_enabled(!args.no_guard);
    let sql = build_statement(&writer, &args, &data)?;

    if args.dry_run {
        println!("{sql}");
        return Ok(());
    }

    let db = crate::config::connector(&args.conn)?;
    db.execute(&sql).await?;
    eprintln!("OK: {} row(s) from {}", data.n_rows(), args.file.display());
    Ok(())
}

fn build_statement(writer: &SqlWriter, args: &WriteArgs, data: &DataFrame) -> anyhow::Result<String> {
    let sql = match args.op {
        WriteOp::Insert => writer.insert_statement(&args.table, data, args.truncate)?,
        WriteOp::Update => {
            let keys: Vec<&str> = args.keys.iter().map(String::as_str).collect();
            writer.update_statement(&args.table, data, &keys)?
        }
        WriteOp::Delete => writer.delete_statement(&args.table, data)?,
    };
    Ok(sql)
}

fn load_records(path: &Path) -> anyhow::Result<DataFrame> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let json: serde_json::Value = serde_json::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", path.display()))?;
    Ok(DataFrame::from_json_records(json)?)
}
