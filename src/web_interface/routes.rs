use std::path::Path;
use std::sync::Arc;

use log::{error, info, warn};
use warp::{http::StatusCode, reply, Filter, Rejection, Reply};

use super::types::{ApiError, CaptureResponse};
use crate::capture::LocalArtifact;
use crate::controller::{StatusBoard, StatusSnapshot, TriggerController, TriggerSource};

/// GET /
pub fn dashboard_route(
    status: Arc<StatusBoard>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path::end().and(warp::get()).and_then(move || {
        let status = status.clone();
        async move {
            let snapshot = status.snapshot().await;
            Ok::<_, Rejection>(reply::html(render_dashboard(&snapshot)))
        }
    })
}

/// GET /status
pub fn status_route(
    status: Arc<StatusBoard>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path("status")
        .and(warp::path::end())
        .and(warp::get())
        .and_then(move || {
            let status = status.clone();
            async move { Ok::<_, Rejection>(reply::json(&status.snapshot().await)) }
        })
}

/// GET|POST /trigger
///
/// Waits behind a trigger already in flight, then answers with the outcome.
/// The trigger runs to completion even if the client goes away.
pub fn trigger_route(
    controller: Arc<TriggerController>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path("trigger")
        .and(warp::path::end())
        .and(warp::get().or(warp::post()).unify())
        .and_then(move || {
            let controller = controller.clone();
            async move {
                info!("On-demand trigger requested");
                match controller.spawn_run(TriggerSource::OnDemand).await {
                    Ok(outcome) => Ok::<_, Rejection>(
                        reply::with_status(reply::json(&outcome), StatusCode::OK).into_response(),
                    ),
                    Err(e) => {
                        error!("On-demand trigger task failed: {}", e);
                        Ok::<_, Rejection>(
                            reply::with_status(
                                reply::json(&ApiError::new("Trigger failed")),
                                StatusCode::INTERNAL_SERVER_ERROR,
                            )
                            .into_response(),
                        )
                    }
                }
            }
        })
}

/// GET /captures
pub fn list_captures_route(
    controller: Arc<TriggerController>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path("captures")
        .and(warp::path::end())
        .and(warp::get())
        .and_then(move || {
            let controller = controller.clone();
            async move {
                match controller.captures().list() {
                    Ok(list) => {
                        let body: Vec<CaptureResponse> =
                            list.iter().rev().map(CaptureResponse::from).collect();
                        Ok::<_, Rejection>(reply::with_status(reply::json(&body), StatusCode::OK))
                    }
                    Err(e) => {
                        warn!("Failed to list captures: {}", e);
                        Ok::<_, Rejection>(reply::with_status(
                            reply::json(&ApiError::new("Failed to list captures")),
                            StatusCode::INTERNAL_SERVER_ERROR,
                        ))
                    }
                }
            }
        })
}

/// GET /captures/:name
pub fn get_capture_route(
    controller: Arc<TriggerController>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("captures" / String)
        .and(warp::get())
        .and_then(move |name: String| {
            let controller = controller.clone();
            async move {
                if !is_capture_name(&name) {
                    let res = reply::with_status(
                        reply::json(&ApiError::new("Invalid capture name")),
                        StatusCode::BAD_REQUEST,
                    )
                    .into_response();
                    return Ok::<_, Rejection>(res);
                }

                let artifact = match controller.captures().find(&name) {
                    Some(a) => a,
                    None => {
                        let res = reply::with_status(
                            reply::json(&ApiError::new("Capture not found")),
                            StatusCode::NOT_FOUND,
                        )
                        .into_response();
                        return Ok::<_, Rejection>(res);
                    }
                };

                match tokio::fs::read(&artifact.path).await {
                    Ok(bytes) => {
                        let res = reply::with_status(
                            reply::with_header(bytes, "Content-Type", content_type(&artifact.path)),
                            StatusCode::OK,
                        )
                        .into_response();
                        Ok::<_, Rejection>(res)
                    }
                    Err(e) => {
                        // pruned between lookup and read
                        warn!("Failed to read capture {}: {}", artifact.path.display(), e);
                        let res = reply::with_status(
                            reply::json(&ApiError::new("Capture not found")),
                            StatusCode::NOT_FOUND,
                        )
                        .into_response();
                        Ok::<_, Rejection>(res)
                    }
                }
            }
        })
}

/// Only bare local artifact names are served.
pub fn is_capture_name(name: &str) -> bool {
    !name.contains('/') && !name.contains('\\') && LocalArtifact::from_path(Path::new(name)).is_some()
}

pub fn content_type(path: &Path) -> String {
    mime_guess::from_path(path).first_or_octet_stream().to_string()
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn render_dashboard(status: &StatusSnapshot) -> String {
    let mut rows = String::new();
    for (i, site) in status.sites.iter().enumerate() {
        let marker = if i == status.next_index { " class=\"next\"" } else { "" };
        rows.push_str(&format!(
            "<li{}>{:02} {}</li>",
            marker,
            i,
            escape_html(site)
        ));
    }

    let last = match &status.last_outcome {
        Some(o) if o.success => format!(
            "<p>Last capture: {} at {} (ok)</p>",
            escape_html(&o.url),
            o.finished_at.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        Some(o) => format!(
            "<p>Last capture: {} at {} (failed: {})</p>",
            escape_html(&o.url),
            o.finished_at.format("%Y-%m-%d %H:%M:%S UTC"),
            escape_html(o.error.as_deref().unwrap_or("unknown error"))
        ),
        None => String::from("<p>No capture yet.</p>"),
    };

    let busy = match status.in_flight {
        Some(source) => format!("<p>Capture in progress ({})</p>", source),
        None => String::new(),
    };

    format!(
        r#"<html><head><title>sitecycle</title></head>
<body><h1>sitecycle is running</h1>
<p>{} site(s), next index {}. {} trigger(s) run, {} failed.</p>
{}{}
<ol start="0">{}</ol>
<p>See /status, /captures, or POST /trigger.</p></body></html>"#,
        status.sites.len(),
        status.next_index,
        status.triggers_run,
        status.captures_failed,
        busy,
        last,
        rows
    )
}
