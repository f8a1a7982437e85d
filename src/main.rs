use std::{path::PathBuf, sync::Arc};

use axum::{
    http::{Response, StatusCode},
    routing::{delete, get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{services::ServeDir, trace::TraceLayer};

mod cards;
mod game;

use game::store::InMemoryStore;

/// Reasons the core rejects a command. Every rejection is recoverable:
/// the session is left exactly as it was and the reason travels back to
/// the caller.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum Reject {
    NotFound(String),
    InsufficientElixir { have: u32, need: u32 },
    InvalidOperation(String),
}

impl Reject {
    fn status(&self) -> StatusCode {
        match self {
            Reject::NotFound(_) => StatusCode::NOT_FOUND,
            Reject::InsufficientElixir { .. } | Reject::InvalidOperation(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
        }
    }
}

impl std::fmt::Display for Reject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reject::NotFound(what) => write!(f, "{what} not found."),
            Reject::InsufficientElixir { have, need } => {
                write!(f, "Not enough elixir: have {have}, need {need}.")
            }
            Reject::InvalidOperation(message) => write!(f, "{message}"),
        }
    }
}

pub type Res<T> = Result<T, Reject>;

/// Reject a command as invalid.
pub fn err<T, S: ToString>(message: S) -> Res<T> {
    Err(Reject::InvalidOperation(message.to_string()))
}

/// Reject a command because something it names does not exist.
pub fn not_found<T, S: ToString>(what: S) -> Res<T> {
    Err(Reject::NotFound(what.to_string()))
}

#[derive(serde::Serialize)]
struct Resp {
    message: String,
    success: bool,
}

impl Resp {
    fn axum<S: ToString>(message: S, status: StatusCode) -> Response<String> {
        match serde_json::ser::to_string(&Self {
            message: message.to_string(),
            success: status == StatusCode::OK,
        }) {
            Ok(body) => {
                let mut resp = Response::new(body);
                *resp.status_mut() = status;
                resp
            }
            Err(e) => {
                let mut resp = Response::new(format!("Failed to JSON encode response: {e}"));
                *resp.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                resp
            }
        }
    }

    fn ok<S: ToString>(message: S) -> Response<String> {
        Self::axum(message, StatusCode::OK)
    }

    fn e500<S: ToString>(message: S) -> Response<String> {
        Self::axum(message, StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn e404<S: ToString>(message: S) -> Response<String> {
        Self::axum(message, StatusCode::NOT_FOUND)
    }

    /// Encode a successful command outcome as a JSON body.
    fn payload<S: serde::Serialize>(payload: &S) -> Response<String> {
        match serde_json::ser::to_string(payload) {
            Ok(body) => Response::new(body),
            Err(e) => Self::e500(format!("Failed to JSON encode response: {e}")),
        }
    }

    /// Encode a rejected command, mapping the reason to a status code.
    fn reject(reason: Reject) -> Response<String> {
        #[derive(serde::Serialize)]
        struct Body {
            success: bool,
            message: String,
            reason: Reject,
        }

        let status = reason.status();
        let body = Body {
            success: false,
            message: reason.to_string(),
            reason,
        };
        match serde_json::ser::to_string(&body) {
            Ok(body) => {
                let mut resp = Response::new(body);
                *resp.status_mut() = status;
                resp
            }
            Err(e) => Self::e500(format!("Failed to JSON encode response: {e}")),
        }
    }
}

fn api_router() -> Router<Arc<InMemoryStore>> {
    use game::handlers;

    Router::new()
        .route("/api/cards", get(handlers::cards))
        .route("/api/leaders", get(handlers::leaders))
        .route("/api/modifiers", get(handlers::modifiers))
        .route("/api/new_game", post(handlers::new_game))
        .route("/api/state/:id", get(handlers::state))
        .route("/api/session/:id", delete(handlers::evict))
        .route("/api/buy_card", post(handlers::buy_card))
        .route("/api/manual_merge", post(handlers::manual_merge))
        .route("/api/delete_card", post(handlers::delete_card))
        .route("/api/sell_card", post(handlers::sell_card))
        .route("/api/move_card", post(handlers::move_card))
        .route("/api/move_to_board", post(handlers::move_to_board))
        .route("/api/battle_result", post(handlers::battle_result))
        .route("/api/recommend", post(handlers::recommend))
        .route("/api/resolve_decision", post(handlers::resolve_decision))
}

#[tokio::main]
async fn main() {
    const USAGE: &str = "Usage: mergetool <static path> <port>";

    let content = std::env::args().nth(1).map(PathBuf::from).expect(USAGE);
    let port = std::env::args()
        .nth(2)
        .map(|s| s.parse::<u16>().unwrap_or_else(|_| panic!("Invalid port number: {s}")))
        .expect(USAGE);

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    tracing::debug!(
        "Card catalog loaded with {} troops.",
        cards::catalog().size()
    );

    let store = Arc::new(InMemoryStore::new());
    let app = api_router()
        .fallback_service(ServeDir::new(content).append_index_html_on_directories(true))
        .with_state(store)
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .unwrap_or_else(|_| panic!("Failed to open port {port}"));

    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Closed due to error: {e}");
    }
}
