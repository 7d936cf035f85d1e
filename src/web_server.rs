use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    serve, Form, Json, Router,
};
use chrono::Local;
use minijinja::{context, path_loader, Environment};
use minijinja_autoreload::AutoReloader;
use serde::Deserialize;
use std::{net::SocketAddr, sync::Arc};
use tokio::sync::Mutex;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{error, info, warn};

use crate::analytics::{self, Granularity, LengthBin, TimeBucket, WordCount};
use crate::auth::{Authenticator, Credentials};
use crate::llm::GeminiClient;
use crate::log_store::LogStore;
use crate::session::SessionContext;

// Shared application state
#[derive(Clone)]
pub struct AppState {
    templates: Arc<AutoReloader>,
    pub store: Arc<LogStore>,
    pub llm: Arc<GeminiClient>,
    pub authenticator: Arc<dyn Authenticator>,
    // One interactive session per process; see session.rs.
    pub session: Arc<Mutex<SessionContext>>,
}

impl AppState {
    pub fn new(
        store: LogStore,
        llm: GeminiClient,
        authenticator: Arc<dyn Authenticator>,
    ) -> Result<Self> {
        let templates = create_minijinja_env().context("Failed to initialize template engine")?;
        Ok(Self {
            templates: Arc::new(templates),
            store: Arc::new(store),
            llm: Arc::new(llm),
            authenticator,
            session: Arc::new(Mutex::new(SessionContext::new())),
        })
    }
}

// Minijinja Environment setup
fn create_minijinja_env() -> Result<AutoReloader> {
    // Use AutoReloader for development convenience
    let reloader = AutoReloader::new(|notifier| {
        let loader = path_loader("templates");
        let mut env = Environment::new();
        env.set_loader(loader);
        // Watch the templates directory for changes
        notifier.watch_path("templates", true);
        Ok(env)
    });
    Ok(reloader)
}

type PageResult = Result<Html<String>, (StatusCode, String)>;

fn render(state: &AppState, name: &str, ctx: minijinja::Value) -> PageResult {
    state
        .templates
        .acquire_env()
        .and_then(|env| env.get_template(name).and_then(|tmpl| tmpl.render(ctx)))
        .map(Html)
        .map_err(|e| {
            error!("Failed to get or render template {}: {}", name, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Internal Server Error: {}", e),
            )
        })
}

fn storage_error(e: crate::log_store::StoreError) -> (StatusCode, String) {
    error!("Prompt log access failed: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Prompt log access failed: {}", e),
    )
}

async fn chat_page(State(state): State<AppState>) -> PageResult {
    let session = state.session.lock().await;
    render(
        &state,
        "chat.html",
        context! {
            title => "Mental Wellness Buddy",
            seen_disclaimer => session.seen_disclaimer,
            messages => session.chat_history.clone(),
        },
    )
}

async fn disclaimer_ack(State(state): State<AppState>) -> Redirect {
    state.session.lock().await.seen_disclaimer = true;
    Redirect::to("/")
}

async fn chat_clear(State(state): State<AppState>) -> Redirect {
    state.session.lock().await.clear_chat();
    Redirect::to("/")
}

#[derive(Deserialize)]
struct ChatForm {
    message: String,
}

async fn chat_submit(
    State(state): State<AppState>,
    Form(form): Form<ChatForm>,
) -> Result<Redirect, (StatusCode, String)> {
    let message = form.message.trim().to_string();
    if message.is_empty() {
        return Ok(Redirect::to("/"));
    }

    let history = {
        let session = state.session.lock().await;
        if !session.seen_disclaimer {
            // Can't chat before acknowledging the disclaimer.
            return Ok(Redirect::to("/"));
        }
        session.chat_history.clone()
    };

    // The prompt is logged before the model is contacted, so the dashboard
    // sees the turn even if the API call fails.
    let now = Local::now().naive_local();
    state.store.append(now, &message).map_err(storage_error)?;

    let reply = state.llm.generate_reply(&history, &message).await;

    let mut session = state.session.lock().await;
    session.push_user(&message);
    match reply {
        Ok(text) => session.push_assistant(text),
        Err(e) => {
            warn!("LLM call failed: {:?}", e);
            session.push_assistant(format!("Something went wrong reaching the model: {}", e));
        }
    }

    Ok(Redirect::to("/"))
}

async fn dashboard_page(State(state): State<AppState>) -> PageResult {
    let session = state.session.lock().await;
    if !session.authenticated {
        return render(
            &state,
            "login.html",
            context! { title => "Dashboard Login", error => false },
        );
    }

    // A missing log is the normal "no data yet" state, not an error.
    let records = state.store.read_all_or_empty().map_err(storage_error)?;
    render(
        &state,
        "dashboard.html",
        context! {
            title => "Chatbot Dashboard",
            has_data => !records.is_empty(),
            records => records,
        },
    )
}

async fn login(
    State(state): State<AppState>,
    Form(credentials): Form<Credentials>,
) -> Result<Response, (StatusCode, String)> {
    if state.authenticator.authenticate(&credentials) {
        info!(username = %credentials.username, "Dashboard login");
        state.session.lock().await.authenticated = true;
        Ok(Redirect::to("/dashboard").into_response())
    } else {
        warn!(username = %credentials.username, "Rejected dashboard login");
        render(
            &state,
            "login.html",
            context! { title => "Dashboard Login", error => true },
        )
        .map(IntoResponse::into_response)
    }
}

async fn logout(State(state): State<AppState>) -> Redirect {
    state.session.lock().await.authenticated = false;
    Redirect::to("/dashboard")
}

#[derive(Deserialize)]
struct StatsQuery {
    #[serde(default)]
    granularity: Granularity,
}

async fn api_stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<Vec<TimeBucket>>, (StatusCode, String)> {
    let records = state.store.read_all_or_empty().map_err(storage_error)?;
    Ok(Json(analytics::message_counts(&records, query.granularity)))
}

async fn api_lengths(
    State(state): State<AppState>,
) -> Result<Json<Vec<LengthBin>>, (StatusCode, String)> {
    let records = state.store.read_all_or_empty().map_err(storage_error)?;
    let texts: Vec<String> = records.into_iter().map(|r| r.text).collect();
    Ok(Json(analytics::length_histogram(&texts)))
}

#[derive(Deserialize)]
struct WordsQuery {
    #[serde(default = "default_top_words")]
    k: usize,
}

fn default_top_words() -> usize {
    analytics::DEFAULT_TOP_WORDS
}

async fn api_words(
    State(state): State<AppState>,
    Query(query): Query<WordsQuery>,
) -> Result<Json<Vec<WordCount>>, (StatusCode, String)> {
    let records = state.store.read_all_or_empty().map_err(storage_error)?;
    let texts: Vec<String> = records.into_iter().map(|r| r.text).collect();
    Ok(Json(analytics::top_words(&texts, query.k)))
}

// Build our application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(chat_page))
        .route("/chat", post(chat_submit))
        .route("/chat/clear", post(chat_clear))
        .route("/disclaimer/ack", post(disclaimer_ack))
        .route("/dashboard", get(dashboard_page))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/api/stats", get(api_stats))
        .route("/api/lengths", get(api_lengths))
        .route("/api/words", get(api_words))
        .nest_service("/static", ServeDir::new("static"))
        .with_state(state)
        .layer(TraceLayer::new_for_http()) // Add request logging
}

pub async fn start_web_server(port: u16, state: AppState) -> Result<()> {
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Web server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context(format!("Failed to bind to address {}", addr))?;

    serve(listener, app.into_make_service())
        .await
        .context("Web server failed")?;

    Ok(())
}
