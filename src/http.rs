use crate::client::{
    FREE_RAM_PATH, FREE_VRAM_PATH, SYSINFO_PATH, SYSTEM_INFO_PATH, TELEMETRY_PATH,
};
use crate::collectors::ResourceSource;
use crate::state::{RamStats, VramStats};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct BackendState {
    pub source: Arc<dyn ResourceSource>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Telemetry {
    pub vram: VramStats,
    pub ram: RamStats,
}

#[derive(Debug, Default, Deserialize)]
pub struct FreeVramParams {
    #[serde(default)]
    pub mode: String,
}

pub fn build_router(source: Arc<dyn ResourceSource>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(SYSINFO_PATH, get(sysinfo_handler))
        .route(SYSTEM_INFO_PATH, get(system_info_handler))
        .route(TELEMETRY_PATH, get(telemetry_handler))
        .route(FREE_VRAM_PATH, get(free_vram_handler).post(free_vram_handler))
        .route(FREE_RAM_PATH, get(free_ram_handler).post(free_ram_handler))
        .with_state(BackendState { source })
}

// `sysinfo` and `nvidia-smi` block, so every read goes through the blocking pool.
async fn read_source<T, F>(state: &BackendState, f: F) -> Result<T, Response>
where
    T: Send + 'static,
    F: FnOnce(&dyn ResourceSource) -> T + Send + 'static,
{
    let source = state.source.clone();
    tokio::task::spawn_blocking(move || f(source.as_ref()))
        .await
        .map_err(|err| {
            warn!(error = %err, "resource collection task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("collection failed: {err}"),
            )
                .into_response()
        })
}

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn sysinfo_handler(State(state): State<BackendState>) -> Response {
    match read_source(&state, |s| s.facts()).await {
        Ok(facts) => Json(facts).into_response(),
        Err(resp) => resp,
    }
}

async fn telemetry_handler(State(state): State<BackendState>) -> Response {
    match read_source(&state, |s| Telemetry {
        vram: s.vram(),
        ram: s.ram(),
    })
    .await
    {
        Ok(t) => Json(t).into_response(),
        Err(resp) => resp,
    }
}

async fn system_info_handler(State(state): State<BackendState>) -> Response {
    let collected = read_source(&state, |s| (s.facts(), s.vram(), s.ram())).await;
    let (facts, vram, ram) = match collected {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let text = facts
        .iter()
        .map(|(k, v)| format!("{k}: {v}"))
        .collect::<Vec<_>>()
        .join("\n");
    let mut body: Map<String, Value> = facts
        .into_iter()
        .map(|(k, v)| (k, Value::String(v)))
        .collect();
    body.insert("text".to_string(), Value::String(text));
    body.insert("vram".to_string(), json!(vram));
    body.insert("ram".to_string(), json!(ram));
    Json(Value::Object(body)).into_response()
}

async fn free_vram_handler(
    State(state): State<BackendState>,
    Query(params): Query<FreeVramParams>,
) -> Response {
    let aggressive = params.mode.contains("aggressive");
    match read_source(&state, |s| s.vram()).await {
        Ok(vram) => {
            debug!(aggressive, "free VRAM requested");
            Json(json!({
                "ok": true,
                "vram": vram,
                "text": format!("VRAM free: {} / {} MB", vram.free_mb, vram.total_mb),
            }))
            .into_response()
        }
        Err(resp) => resp,
    }
}

async fn free_ram_handler(State(state): State<BackendState>) -> Response {
    match read_source(&state, |s| s.ram()).await {
        Ok(ram) => {
            debug!("free RAM requested");
            Json(json!({ "ok": true, "ram": ram })).into_response()
        }
        Err(resp) => resp,
    }
}
