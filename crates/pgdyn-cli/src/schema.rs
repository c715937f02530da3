use anyhow::Context;
use pgdyn::ConnectionManager;

use crate::cli::{ConnectArgs, SchemaPrintArgs};
use crate::{config, entities};

pub fn print(args: SchemaPrintArgs) -> anyhow::Result<()> {
    let script = entities::registry().export()?;
    match args.output {
        Some(path) => {
            std::fs::write(&path, &script)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("wrote {}", path.display());
        }
        None => print!("{script}"),
    }
    Ok(())
}

pub async fn apply(args: ConnectArgs) -> anyhow::Result<()> {
    let registry = entities::registry();
    let manager = ConnectionManager::new(config::resolve(&args)?);
    let applied = registry
        .apply(&manager)
        .await
        .context("failed to create tables")?;
    manager.close().await;
    println!("ensured {applied} table(s)");
    Ok(())
}
