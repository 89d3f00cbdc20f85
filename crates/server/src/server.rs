use axum::{
    Router,
    routing::{get, post, put},
};

use std::sync::Arc;

use crate::{archive, bills, payments, suppliers};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

fn router(state: ServerState) -> Router {
    Router::new()
        .route(
            "/suppliers",
            get(suppliers::overview).post(suppliers::supplier_new),
        )
        .route("/suppliers/{id}/statement", get(suppliers::statement))
        .route("/bills", post(bills::bill_new))
        .route("/bills/{id}", get(bills::get))
        .route("/payments", get(payments::list).post(payments::payment_new))
        .route(
            "/payments/{id}",
            put(payments::update)
                .get(payments::get)
                .delete(payments::delete),
        )
        .route("/archivedPayments", get(archive::list))
        .route("/archivedPayments/{id}/restore", post(archive::restore))
        .with_state(state)
}

/// The ledger API as a plain [`Router`], without binding a socket.
pub fn app(engine: Engine) -> Router {
    router(ServerState {
        engine: Arc::new(engine),
    })
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app(engine)).await
}
