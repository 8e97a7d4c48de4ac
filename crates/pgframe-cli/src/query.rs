use crate::cli::QueryArgs;
use crate::output::{render_json, render_table};
use pgframe::Connector;

pub async fn run(args: QueryArgs) -> anyhow::Result<()> {
    let sql = crate::read_sql_arg(&args.sql)?;
    let db = crate::config::connector(&args.conn)?;

    let frame = db.query(&sql).await?;
    if args.json {
        println!("{}", render_json(&frame)?);
    } else {
        println!("{}", render_table(&frame));
        eprintln!("({} row{})", frame.n_rows(), if frame.n_rows() == 1 { "" } else { "s" });
    }
    Ok(())
}
