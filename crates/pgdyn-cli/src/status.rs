use pgdyn::{ConnectionManager, RecordStore, Statement};

use crate::cli::ConnectArgs;
use crate::config;

pub async fn run(args: ConnectArgs) -> anyhow::Result<()> {
    let db = config::resolve(&args)?;
    let target = db.display_target();
    let manager = ConnectionManager::new(db);

    if let Err(e) = manager.connect().await {
        println!("{target}: {}", manager.state());
        return Err(e.into());
    }

    let version = manager
        .query(&Statement::new("SELECT version()"))
        .await?
        .scalar()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default();

    println!("{target}: {}", manager.state());
    if !version.is_empty() {
        println!("{version}");
    }

    manager.close().await;
    Ok(())
}
