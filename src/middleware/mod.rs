//! Request middleware

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use sea_orm::DatabaseConnection;
use std::ops::Deref;

use crate::state::AppState;

/// Database connection wrapper for use in handlers via Extension
#[derive(Clone)]
pub struct DbConn(pub DatabaseConnection);

impl Deref for DbConn {
    type Target = DatabaseConnection;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Make the connection pool available to every handler as `Extension<DbConn>`
pub async fn db_layer(State(state): State<AppState>, mut request: Request<Body>, next: Next) -> Response {
    request.extensions_mut().insert(DbConn(state.db.clone()));
    next.run(request).await
}
