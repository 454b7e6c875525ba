// Error responses for HTTP handlers
use crate::application::graph_store::GraphNotFound;
use crate::domain::error::GraphError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug)]
pub enum ApiError {
    Graph(GraphError),
    /// The graph store could not be reached or refused the request
    Store(anyhow::Error),
    NotFound(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Graph(GraphError::ConfigParse(_)) => StatusCode::BAD_REQUEST,
            ApiError::Graph(GraphError::Cardinality | GraphError::DataVolume { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::Graph(GraphError::Fetch(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Graph(GraphError::Render(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Store(_) => StatusCode::BAD_GATEWAY,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Graph(e) => e.to_string(),
            ApiError::Store(e) => format!("{:#}", e),
            ApiError::NotFound(what) => format!("{} not found", what),
        }
    }
}

impl From<GraphError> for ApiError {
    fn from(e: GraphError) -> Self {
        ApiError::Graph(e)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        match e.downcast_ref::<GraphNotFound>() {
            Some(missing) => ApiError::NotFound(format!("Graph {}", missing.0)),
            None => ApiError::Store(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();

        if status.is_server_error() {
            tracing::error!("{}", message);
        } else {
            tracing::debug!("{}", message);
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}
