use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tokio::signal;

use bookshelf::prelude::*;
use bookshelf::schema::BOOK;
use bookshelf_graphql::prelude::{api_schema, ApiSchema, GraphQlRunner};
use bookshelf_server_http::GraphQLServer;
use bookshelf_store::{InMemoryStore, JsonFileStore};

use crate::opt::Opt;

/// Reads the books a new store starts out with: a JSON array of objects
/// with `title` and `author`.
pub fn read_seed(path: &Path) -> Result<Vec<NewBook>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read seed file `{}`", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("seed file `{}` is not a list of books", path.display()))
}

/// Runs the service until it receives Ctrl-C or SIGTERM.
pub async fn run(logger: Logger, opt: Opt) -> Result<()> {
    let schema = Arc::new(api_schema(&[&BOOK]).context("failed to derive the API schema")?);

    if opt.print_schema {
        println!("{}", schema);
        return Ok(());
    }

    info!(logger, "Starting up");

    let seed = match &opt.seed {
        Some(path) => read_seed(path)?,
        None => vec![],
    };

    match &opt.data_file {
        Some(path) => {
            let store = JsonFileStore::open_seeded(&logger, path, seed)
                .with_context(|| format!("failed to open data file `{}`", path.display()))?;
            info!(logger, "Using data file"; "path" => path.display().to_string());
            serve(logger, schema, Arc::new(store), opt.http_port).await
        }
        None => {
            let store = InMemoryStore::seeded(seed)?;
            info!(logger, "Keeping books in memory; they are lost on shutdown");
            serve(logger, schema, Arc::new(store), opt.http_port).await
        }
    }
}

async fn serve<S: BookStore>(
    logger: Logger,
    schema: Arc<ApiSchema>,
    store: Arc<S>,
    port: u16,
) -> Result<()> {
    let logger_factory = LoggerFactory::new(logger.clone());
    let graphql_runner = Arc::new(GraphQlRunner::new(&logger, schema, store));
    let server = GraphQLServer::new(&logger_factory, graphql_runner)
        .start(port)
        .await?;

    shutdown_signal().await;
    info!(logger, "Shutting down");
    server.stop_server().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if signal::ctrl_c().await.is_err() {
            // Without a handler, only SIGTERM can stop us
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    };
}
