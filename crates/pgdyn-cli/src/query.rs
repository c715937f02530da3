use std::io::Read;

use anyhow::Context;
use pgdyn::{ConnectionManager, Engine, QueryRequest, translate};

use crate::cli::{QueryArgs, RequestSource};
use crate::config;

pub async fn run(args: QueryArgs) -> anyhow::Result<()> {
    let raw = read_request(&args.source)?;
    let request: QueryRequest =
        serde_json::from_str(&raw).context("failed to decode request body")?;

    // Translate up front so bad requests fail without touching the database.
    let statement = translate(args.operation, &request)?;

    if args.dry_run {
        let args_json: Vec<serde_json::Value> =
            statement.args().iter().map(|v| v.to_json()).collect();
        println!("{}", statement.sql());
        println!("{}", serde_json::to_string(&args_json)?);
        return Ok(());
    }

    let db = config::resolve(&args.connect)?;
    let engine = Engine::new(ConnectionManager::new(db));
    let outcome = engine.run(args.operation, &request).await?;
    println!("{}", serde_json::to_string_pretty(&outcome.to_json())?);

    engine.store().close().await;
    Ok(())
}

fn read_request(source: &RequestSource) -> anyhow::Result<String> {
    match source {
        RequestSource::Inline(body) => Ok(body.clone()),
        RequestSource::File(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read request file {}", path.display())),
        RequestSource::Stdin => {
            let mut body = String::new();
            std::io::stdin()
                .read_to_string(&mut body)
                .context("failed to read request from stdin")?;
            if body.trim().is_empty() {
                anyhow::bail!("empty request on stdin (use --request or --file)");
            }
            Ok(body)
        }
    }
}
