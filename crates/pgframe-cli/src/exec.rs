use crate::cli::ExecArgs;
use pgframe::Connector;

pub async fn run(args: ExecArgs) -> anyhow::Result<()> {
    let sql = crate::read_sql_arg(&args.sql)?;
    let db = crate::config::connector(&args.conn)?;

    db.execute(&sql).await?;
    eprintln!("OK");
    Ok(())
}
