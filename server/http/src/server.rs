use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::Method;
use axum::routing::get;
use axum::Router;
use thiserror::Error;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};

use bookshelf::prelude::*;

use crate::service::{handle_graphql_get, handle_graphql_query, handle_not_found, GraphQLService};

/// Errors that may occur when starting the server.
#[derive(Debug, Error)]
pub enum GraphQLServeError {
    #[error("failed to bind the GraphQL server to port {0}: {1}")]
    BindError(u16, #[source] std::io::Error),
}

/// A GraphQL server based on axum.
pub struct GraphQLServer<Q> {
    logger: Logger,
    graphql_runner: Arc<Q>,
    max_query_length: usize,
}

/// A running server. Dropping the handle leaves the server running.
pub struct GraphQLServerHandle {
    local_addr: SocketAddr,
    notify: Arc<Notify>,
    task: JoinHandle<()>,
}

impl<Q> GraphQLServer<Q>
where
    Q: GraphQlRunner,
{
    /// Creates a new GraphQL server.
    pub fn new(logger_factory: &LoggerFactory, graphql_runner: Arc<Q>) -> Self {
        GraphQLServer {
            logger: logger_factory.component_logger("GraphQLServer"),
            graphql_runner,
            max_query_length: ENV_VARS.graphql_max_query_length(),
        }
    }

    pub fn with_max_query_length(mut self, max_query_length: usize) -> Self {
        self.max_query_length = max_query_length;
        self
    }

    /// Binds to `port` on all interfaces and serves requests on a spawned
    /// task. Port 0 picks a free port; see `GraphQLServerHandle::local_addr`.
    pub async fn start(self, port: u16) -> Result<GraphQLServerHandle, GraphQLServeError> {
        let GraphQLServer {
            logger,
            graphql_runner,
            max_query_length,
        } = self;

        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| GraphQLServeError::BindError(port, e))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| GraphQLServeError::BindError(port, e))?;

        info!(
            logger,
            "Starting GraphQL HTTP server at: http://localhost:{}/graphql",
            local_addr.port()
        );

        let cors_layer = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::OPTIONS, Method::POST])
            .allow_headers(Any);

        let service = Arc::new(GraphQLService::new(
            logger.clone(),
            graphql_runner,
            max_query_length,
        ));

        let app = Router::new()
            .route(
                "/graphql",
                get(handle_graphql_get::<Q>).post(handle_graphql_query::<Q>),
            )
            .fallback(handle_not_found)
            .with_state(service)
            .layer(cors_layer);

        let notify = Arc::new(Notify::new());
        let shutdown = notify.clone();

        let task = tokio::spawn(async move {
            let res = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown.notified().await;
                })
                .await;
            match res {
                Ok(()) => info!(logger, "GraphQL HTTP server stopped"),
                Err(e) => error!(logger, "GraphQL HTTP server failed"; "error" => e.to_string()),
            }
        });

        Ok(GraphQLServerHandle {
            local_addr,
            notify,
            task,
        })
    }
}

impl GraphQLServerHandle {
    /// The address the server listens on.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Asks the server to stop accepting connections and waits until the
    /// requests in flight are done.
    pub async fn stop_server(self) {
        self.notify.notify_one();
        // The task only fails if it panicked, and then there is nothing left
        // to stop
        let _ = self.task.await;
    }
}
