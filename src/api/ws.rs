//! WebSocket upgrade + request dispatch (spec §6). Modeled on the
//! teacher's `websocket_handler`/`handle_socket` pair in `main.rs`: one
//! upgrade handler, one per-connection loop multiplexing inbound client
//! requests against an outbound `broadcast::Receiver`.

use crate::api::state::AppState;
use crate::error::{CopilotError, ErrorCode};
use crate::models::{CartItem, CartSnapshot, OrderDetail};
use crate::orchestrator::state_machine::RunEvent;
use crate::protocol::{Action, Request, Response, ResponseTiming};
use crate::tools::ToolContext;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response as HttpResponse;
use chrono::Utc;
use tracing::{info, warn};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> HttpResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

pub async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let mut state_rx = state.state_broadcast.subscribe();

    loop {
        tokio::select! {
            Ok(run_state) = state_rx.recv() => {
                let msg = serde_json::to_string(&run_state).unwrap_or_else(|_| "{}".to_string());
                if socket.send(Message::Text(msg)).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        let response = match serde_json::from_str::<Request>(&text) {
                            Ok(req) => dispatch(&state, req).await,
                            Err(e) => {
                                warn!(%e, "malformed request envelope");
                                Response::err(
                                    "unknown",
                                    &CopilotError::new(
                                        ErrorCode::InvalidRequest,
                                        format!("malformed request: {e}"),
                                        false,
                                    ),
                                    ResponseTiming::since(Utc::now()),
                                )
                            }
                        };
                        let payload = serde_json::to_string(&response).unwrap_or_else(|_| "{}".to_string());
                        if socket.send(Message::Text(payload)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(%e, "websocket receive error");
                        break;
                    }
                }
            }
        }
    }

    info!("websocket connection closed");
}

/// Applies one state-machine event, persisting and broadcasting on
/// success. Returns the run state either way — callers decide whether a
/// failed transition should surface as `Response::err`.
fn apply_event(state: &AppState, event: RunEvent) -> Result<crate::models::RunState, CopilotError> {
    let mut sm = state.state_machine.lock();
    sm.apply(event)?;
    let snapshot = sm.state().clone();
    drop(sm);
    if let Err(e) = state.persist_and_broadcast(&snapshot) {
        warn!(%e, "failed to persist run state checkpoint");
    }
    Ok(snapshot)
}

async fn dispatch(state: &AppState, req: Request) -> Response {
    let started_at = Utc::now();
    let id = req.id.clone();

    let result = handle_action(state, req.action).await;

    match result {
        Ok(data) => Response::ok(id, data, ResponseTiming::since(started_at)),
        Err(err) => Response::err(id, &err, ResponseTiming::since(started_at)),
    }
}

async fn handle_action(state: &AppState, action: Action) -> Result<serde_json::Value, CopilotError> {
    match action {
        Action::StateGet | Action::StateUpdate => {
            let snapshot = state.state_machine.lock().state().clone();
            let _ = state.state_broadcast.send(snapshot.clone());
            Ok(serde_json::to_value(snapshot).unwrap_or_default())
        }

        Action::RunStart { order_id } => {
            let snapshot = apply_event(state, RunEvent::StartRun)?;
            state.pending_orders.lock().clear();
            *state.review_pack.lock() = None;
            Ok(serde_json::json!({ "state": snapshot, "orderId": order_id }))
        }

        Action::RunSubmitHistory {
            orders,
            live_cart,
            overrides,
        } => {
            let tool_config = state.config.tool_config();
            let ctx = ToolContext {
                page: state.page.as_ref(),
                registry: &state.registry,
                config: &tool_config,
            };

            let mut parsed: Vec<OrderDetail> = Vec::with_capacity(orders.len());
            let mut warnings = Vec::new();
            for raw in &orders {
                let outcome = crate::tools::order_detail::load_order_detail(&ctx, raw);
                warnings.extend(outcome.meta.warnings);
                match outcome.result {
                    Ok(detail) => parsed.push(detail),
                    Err(e) => warnings.push(format!("dropped order {}: {}", raw.summary.order_id, e.message)),
                }
            }

            for override_ in &overrides {
                if let Err(e) = state.preferences.upsert(override_) {
                    warn!(%e, "failed to persist user override");
                }
            }

            let run_id = state.state_machine.lock().state().run_id.clone();
            let pack = crate::orchestrator::build_review_pack(
                &run_id,
                &parsed,
                &live_cart,
                &overrides,
                &state.pipeline_config(),
                Utc::now(),
            );

            state.pending_orders.lock().extend(parsed);
            *state.review_pack.lock() = Some(pack.clone());

            let snapshot = apply_event(state, RunEvent::ReachReview)?;
            Ok(serde_json::json!({
                "state": snapshot,
                "reviewPack": pack,
                "warnings": warnings,
            }))
        }

        Action::RunPause => {
            let snapshot = apply_event(state, RunEvent::PauseRun)?;
            Ok(serde_json::to_value(snapshot).unwrap_or_default())
        }
        Action::RunResume => {
            let snapshot = apply_event(state, RunEvent::ResumeRun)?;
            Ok(serde_json::to_value(snapshot).unwrap_or_default())
        }
        Action::RunCancel => {
            let snapshot = apply_event(state, RunEvent::CancelRun)?;
            *state.review_pack.lock() = None;
            Ok(serde_json::to_value(snapshot).unwrap_or_default())
        }

        Action::RunApproveReview => {
            let snapshot = apply_event(state, RunEvent::ApproveReview)?;
            let pack = state.review_pack.lock().clone();
            Ok(serde_json::json!({ "state": snapshot, "reviewPack": pack }))
        }
        Action::RunRejectReview => {
            let snapshot = apply_event(state, RunEvent::RejectReview)?;
            *state.review_pack.lock() = None;
            Ok(serde_json::to_value(snapshot).unwrap_or_default())
        }

        Action::LlmSetApiKey { api_key } => {
            if api_key.trim().is_empty() {
                return Err(CopilotError::new(
                    ErrorCode::ApiKeyInvalid,
                    "API key must not be empty",
                    false,
                ));
            }
            *state.llm_api_key.lock() = Some(api_key);
            Ok(serde_json::json!({ "accepted": true }))
        }
        Action::LlmCheckAvailable => {
            let available = state.llm_api_key.lock().is_some();
            Ok(serde_json::json!({ "available": available }))
        }

        Action::PageDetect => {
            let url = state.page.current_url().await;
            let authenticated = !crate::tools::navigate::looks_like_auth_redirect(&url);
            Ok(serde_json::json!({ "url": url, "authenticated": authenticated }))
        }
        Action::LoginCheck => {
            let url = state.page.current_url().await;
            let authenticated = !crate::tools::navigate::looks_like_auth_redirect(&url);
            if !authenticated {
                return Err(CopilotError::auth(format!("redirected to login page: {url}")));
            }
            Ok(serde_json::json!({ "authenticated": true }))
        }

        Action::OrderExtractHistory {
            limit,
            cards,
            total_available,
        } => {
            let mut tool_config = state.config.tool_config();
            if let Some(limit) = limit {
                tool_config.max_orders = tool_config.max_orders.min(limit);
            }
            let ctx = ToolContext {
                page: state.page.as_ref(),
                registry: &state.registry,
                config: &tool_config,
            };
            let outcome = crate::tools::order_history::load_order_history(&ctx, &cards, total_available);
            to_response(outcome)
        }

        Action::OrderExtractDetail { raw } => {
            let tool_config = state.config.tool_config();
            let ctx = ToolContext {
                page: state.page.as_ref(),
                registry: &state.registry,
                config: &tool_config,
            };
            let outcome = crate::tools::order_detail::load_order_detail(&ctx, &raw);
            match &outcome.result {
                Ok(detail) => state.pending_orders.lock().push(detail.clone()),
                Err(_) => {}
            }
            to_response(outcome)
        }

        Action::OrderReorder {
            order_id,
            detail_url,
            mode,
        } => {
            let tool_config = state.config.tool_config();
            let ctx = ToolContext {
                page: state.page.as_ref(),
                registry: &state.registry,
                config: &tool_config,
            };
            let input = crate::tools::reorder::ReorderInput {
                order_id,
                detail_url,
                merge_mode: mode,
            };
            let outcome = crate::tools::reorder::reorder(&ctx, &input).await;
            to_response(outcome)
        }

        Action::CartScan {
            include_out_of_stock,
            rows,
        } => {
            let tool_config = state.config.tool_config();
            let ctx = ToolContext {
                page: state.page.as_ref(),
                registry: &state.registry,
                config: &tool_config,
            };
            let outcome = crate::tools::scan_cart::scan_cart(&ctx, &rows);
            match outcome.result {
                Ok(mut snapshot) if !include_out_of_stock.unwrap_or(false) => {
                    filter_available(&mut snapshot);
                    Ok(serde_json::to_value(snapshot).unwrap_or_default())
                }
                Ok(snapshot) => Ok(serde_json::to_value(snapshot).unwrap_or_default()),
                Err(e) => Err(e),
            }
        }

        Action::SlotsExtract => {
            let tool_config = state.config.tool_config();
            let ctx = ToolContext {
                page: state.page.as_ref(),
                registry: &state.registry,
                config: &tool_config,
            };
            let outcome = crate::tools::slots::extract_slots(&ctx).await;
            to_response(outcome)
        }

        Action::SystemPing => Ok(serde_json::json!({ "pong": true, "timestamp": Utc::now() })),
    }
}

fn filter_available(snapshot: &mut CartSnapshot) {
    let kept: Vec<CartItem> = snapshot.items.iter().filter(|i| i.available).cloned().collect();
    snapshot.item_count = kept.len() as u32;
    snapshot.total_price = kept.iter().map(|i| i.unit_price * i.quantity as f64).sum();
    snapshot.items = kept;
}

fn to_response<T: serde::Serialize>(outcome: crate::tools::ToolOutcome<T>) -> Result<serde_json::Value, CopilotError> {
    match outcome.result {
        Ok(value) => {
            let mut payload = serde_json::to_value(value).unwrap_or_default();
            if !outcome.meta.warnings.is_empty() {
                if let Some(obj) = payload.as_object_mut() {
                    obj.insert("warnings".to_string(), serde_json::json!(outcome.meta.warnings));
                }
            }
            Ok(payload)
        }
        Err(e) => Err(e),
    }
}

