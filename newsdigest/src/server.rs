use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use rocket::fairing::{Fairing, Info, Kind};
use rocket::figment::Figment;
use rocket::http::{Header, Status};
use rocket::serde::json::Json;
use rocket::{catch, catchers, get, options, post, routes, Build, Request, Response, Rocket, State};
use serde::Serialize;

use common::Config;

use crate::models::{ErrorDetail, SummarizeArticleRequest, SummarizeRssRequest, SummaryBatch};
use crate::pipeline::{RequestError, SummaryPipeline};

pub const ROOT_MESSAGE: &str = "Daily News Summarizer API is running!";

/// Application state stored inside Rocket managed state.
pub struct AppState {
    pub started_at: DateTime<Utc>,
    pub pipeline: SummaryPipeline,
}

impl AppState {
    pub fn new(pipeline: SummaryPipeline) -> Self {
        Self {
            started_at: Utc::now(),
            pipeline,
        }
    }
}

type ApiResult<T> = Result<Json<T>, (Status, Json<ErrorDetail>)>;

fn bad_request(e: RequestError) -> (Status, Json<ErrorDetail>) {
    (Status::BadRequest, Json(ErrorDetail { detail: e.to_string() }))
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

/// Response structure for `/status`.
#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
    uptime_seconds: i64,
    model: String,
}

#[get("/")]
async fn index() -> Json<MessageResponse> {
    Json(MessageResponse { message: ROOT_MESSAGE })
}

#[get("/health")]
async fn health() -> &'static str {
    "OK"
}

#[get("/status")]
async fn status(state: &State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok",
        uptime_seconds: (Utc::now() - state.started_at).num_seconds(),
        model: state.pipeline.summarizer.model().to_string(),
    })
}

#[post("/summarize_rss", data = "<body>")]
async fn summarize_rss(state: &State<AppState>, body: Json<SummarizeRssRequest>) -> ApiResult<SummaryBatch> {
    tracing::info!("Received RSS request to summarize {} articles from: {}", body.num_articles, body.rss_url);
    state
        .pipeline
        .summarize_rss(&body.rss_url, body.num_articles)
        .await
        .map(Json)
        .map_err(bad_request)
}

#[post("/summarize_article", data = "<body>")]
async fn summarize_article(state: &State<AppState>, body: Json<SummarizeArticleRequest>) -> ApiResult<SummaryBatch> {
    tracing::info!("Received request to summarize single article from: {}", body.article_url);
    state
        .pipeline
        .summarize_article(&body.article_url)
        .await
        .map(Json)
        .map_err(bad_request)
}

/// CORS preflight; the fairing adds the allow headers.
#[options("/<_..>")]
async fn preflight() -> Status {
    Status::NoContent
}

#[catch(422)]
fn unprocessable(req: &Request) -> Json<ErrorDetail> {
    Json(ErrorDetail {
        detail: format!("Invalid request body for {}", req.uri()),
    })
}

#[catch(default)]
fn default_catcher(status: Status, req: &Request) -> (Status, Json<ErrorDetail>) {
    tracing::debug!("catcher: {} for {} {}", status, req.method(), req.uri());
    let reason = status.reason().unwrap_or("Error");
    (status, Json(ErrorDetail { detail: reason.to_string() }))
}

/// Adds CORS headers for origins on the allow-list; other origins get none.
pub struct Cors {
    allowed_origins: Vec<String>,
}

impl Cors {
    pub fn new(allowed_origins: Vec<String>) -> Self {
        Self { allowed_origins }
    }
}

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "CORS allow-list",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, req: &'r Request<'_>, res: &mut Response<'r>) {
        let Some(origin) = req.headers().get_one("Origin") else {
            return;
        };
        if !self.allowed_origins.iter().any(|o| o == origin) {
            return;
        }

        let allow_headers = req
            .headers()
            .get_one("Access-Control-Request-Headers")
            .unwrap_or("*")
            .to_string();
        res.set_header(Header::new("Access-Control-Allow-Origin", origin.to_string()));
        res.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
        res.set_header(Header::new("Access-Control-Allow-Methods", "GET, POST, PUT, PATCH, DELETE, OPTIONS"));
        res.set_header(Header::new("Access-Control-Allow-Headers", allow_headers));
        res.set_header(Header::new("Vary", "Origin"));
    }
}

/// Rocket instance with routes, catchers and the CORS fairing, ready to launch or test.
pub fn build_rocket(figment: Figment, state: AppState, allowed_origins: Vec<String>) -> Rocket<Build> {
    rocket::custom(figment)
        .manage(state)
        .attach(Cors::new(allowed_origins))
        .mount(
            "/",
            routes![index, health, status, summarize_rss, summarize_article, preflight],
        )
        .register("/", catchers![unprocessable, default_catcher])
}

/// Rocket figment with `[server] bind/port` from the application config merged in.
pub fn figment_from_config(config: &Config) -> Figment {
    let mut fig = rocket::Config::figment();
    if let Some(bind) = &config.server.bind {
        fig = fig.merge(("address", bind.clone()));
    }
    if let Some(port) = config.server.port {
        fig = fig.merge(("port", port));
    }
    fig
}

pub async fn launch_rocket(config: &Config, state: AppState) -> Result<()> {
    let rocket = build_rocket(figment_from_config(config), state, config.cors.allowed_origins.clone());

    // Launch Rocket - this will run until shutdown (SIGINT/SIGTERM etc.)
    tracing::info!("Starting Rocket HTTP server");
    rocket
        .launch()
        .await
        .map_err(|e| anyhow!("Rocket failed: {}", e))?;

    tracing::info!("Rocket HTTP server has shut down");
    Ok(())
}
