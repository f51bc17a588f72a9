//! End-to-end pipeline integration tests.
//!
//! These tests drive the executor through every short-circuit boundary:
//!
//! 1. Request phase
//! 2. Resource phase
//! 3. Before-hooks
//! 4. Responder
//! 5. After-hooks
//! 6. Response phase
//!
//! Each scenario runs under both execution models.

use heron_core::{
    ExecutionModel, HeronError, HeronResult, Request, RequestContext, ResponseState, Signal,
    StageResult,
};
use heron_middleware::{
    After, Before, FnMiddleware, FnResource, Pipeline, ResourceRoute, Router, SingleRoute,
};
use http::{Method, StatusCode, Uri};
use parking_lot::Mutex;
use std::sync::Arc;

const MODELS: [ExecutionModel; 2] = [ExecutionModel::Blocking, ExecutionModel::Cooperative];

type Log = Arc<Mutex<Vec<String>>>;

fn new_log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

fn entries(log: &Log) -> Vec<String> {
    log.lock().clone()
}

/// Creates a GET request driven under `model`.
fn make_request(model: ExecutionModel) -> Request {
    Request::new(Method::GET, Uri::from_static("/status"))
        .with_context(RequestContext::new().with_execution_model(model))
}

async fn run(pipeline: &Pipeline, router: &dyn Router, model: ExecutionModel) -> ResponseState {
    try_run(pipeline, router, model)
        .await
        .unwrap_or_else(|err| panic!("pipeline failed under {model}: {err}"))
}

async fn try_run(
    pipeline: &Pipeline,
    router: &dyn Router,
    model: ExecutionModel,
) -> HeronResult<ResponseState> {
    let mut req = make_request(model);
    pipeline.process(&mut req, router).await
}

/// A middleware that records every phase it takes part in.
fn tracing_middleware(log: &Log, name: &'static str) -> FnMiddleware {
    let (a, b, c) = (Arc::clone(log), Arc::clone(log), Arc::clone(log));
    FnMiddleware::new(name)
        .on_request(move |_req, _resp| {
            a.lock().push(format!("{name}.request"));
            Ok(())
        })
        .on_resource(move |_req, _resp, _resource, _params| {
            b.lock().push(format!("{name}.resource"));
            Ok(())
        })
        .on_response(move |_req, _resp, _resource, _ok| {
            c.lock().push(format!("{name}.response"));
            Ok(())
        })
}

/// A responder that fails the response, then records that it ran.
fn failing_resource(log: &Log) -> FnResource {
    let log = Arc::clone(log);
    FnResource::new("status").on(Method::GET, move |_req, resp, _params| {
        log.lock().push("responder".to_string());
        resp.set_status(StatusCode::INTERNAL_SERVER_ERROR);
        resp.set_header("X-Failed", "True")?;
        resp.set_text("Fail");
        Ok(())
    })
}

fn pass_signal() -> Signal {
    Signal::new(StatusCode::OK)
        .header("X-Failed", "False")
        .expect("valid header")
        .text("Pass")
}

fn assert_pass(resp: &ResponseState) {
    assert_eq!(resp.status(), "200 OK");
    assert_eq!(resp.header("x-failed"), Some("False"));
    assert_eq!(resp.text(), "Pass");
}

// ============================================================================
// Hook Short-Circuit Tests
// ============================================================================

#[tokio::test]
async fn test_before_hook_signal_skips_responder() {
    for model in MODELS {
        let log = new_log();
        let route = ResourceRoute::new(failing_resource(&log))
            .before(
                Method::GET,
                Before::new(|_req, _resp, _resource, _params| Err(pass_signal().into())),
            )
            .unwrap();

        let resp = run(&Pipeline::builder().build(), &SingleRoute::new(route), model).await;

        assert_pass(&resp);
        assert!(entries(&log).is_empty(), "responder ran under {model}");
    }
}

#[tokio::test]
async fn test_async_before_hook_signal_skips_responder() {
    for model in MODELS {
        let log = new_log();
        let route = ResourceRoute::new(failing_resource(&log))
            .before(
                Method::GET,
                Before::new_async(|_req, _resp, _resource, _params| {
                    Box::pin(async move {
                        tokio::task::yield_now().await;
                        Err(pass_signal().into())
                    })
                }),
            )
            .unwrap();

        let resp = run(&Pipeline::builder().build(), &SingleRoute::new(route), model).await;

        assert_pass(&resp);
        assert!(entries(&log).is_empty());
    }
}

#[tokio::test]
async fn test_responder_signal_overrides_its_own_mutations() {
    let resource = FnResource::new("status").on(Method::GET, |_req, resp, _params| {
        resp.set_status(StatusCode::INTERNAL_SERVER_ERROR);
        resp.set_header("X-Failed", "True")?;
        resp.set_text("Fail");
        Err(pass_signal().into())
    });
    let router = SingleRoute::new(ResourceRoute::new(resource));

    for model in MODELS {
        let resp = run(&Pipeline::builder().build(), &router, model).await;
        assert_pass(&resp);
    }
}

#[tokio::test]
async fn test_after_hook_mutations_become_final_response() {
    let log = new_log();
    let route = ResourceRoute::new(failing_resource(&log))
        .after(
            Method::GET,
            After::new(|_req, resp, _resource| {
                resp.set_status(StatusCode::OK);
                resp.set_header("X-Failed", "False")?;
                resp.set_text("Pass");
                Ok(())
            }),
        )
        .unwrap();
    let router = SingleRoute::new(route);

    for model in MODELS {
        let resp = run(&Pipeline::builder().build(), &router, model).await;
        assert_pass(&resp);
    }
}

#[tokio::test]
async fn test_responder_signal_skips_after_hooks() {
    let log = new_log();
    let hook_log = Arc::clone(&log);
    let resource = FnResource::new("status")
        .on(Method::GET, |_req, _resp, _params| Err(pass_signal().into()));
    let route = ResourceRoute::new(resource)
        .after(
            Method::GET,
            After::new(move |_req, _resp, _resource| {
                hook_log.lock().push("noop".to_string());
                Ok(())
            }),
        )
        .unwrap();
    let router = SingleRoute::new(route);

    for model in MODELS {
        let resp = run(&Pipeline::builder().build(), &router, model).await;
        assert_pass(&resp);
        assert_eq!(resp.headers().len(), 1);
    }
    assert!(entries(&log).is_empty());
}

#[tokio::test]
async fn test_empty_signal_body_reads_as_empty_text() {
    let resource = FnResource::new("status").on(Method::GET, |_req, resp, _params| {
        resp.set_text("Fail");
        Err(Signal::new(StatusCode::OK).clear_body().into())
    });
    let router = SingleRoute::new(ResourceRoute::new(resource));

    for model in MODELS {
        let resp = run(&Pipeline::builder().build(), &router, model).await;
        assert_eq!(resp.status(), "200 OK");
        assert!(resp.body().is_none());
        assert_eq!(resp.text(), "");
    }
}

// ============================================================================
// Middleware Short-Circuit Tests
// ============================================================================

/// Builds a pipeline `outer → gate → inner` where `gate` raises in the given
/// phase.
fn gated_pipeline(log: &Log, gate: FnMiddleware) -> Pipeline {
    Pipeline::builder()
        .middleware(tracing_middleware(log, "outer"))
        .middleware(gate)
        .middleware(tracing_middleware(log, "inner"))
        .build()
}

fn traced_router(log: &Log) -> SingleRoute {
    let responder_log = Arc::clone(log);
    let before_log = Arc::clone(log);
    let after_log = Arc::clone(log);
    let resource = FnResource::new("status").on(Method::GET, move |_req, resp, _params| {
        responder_log.lock().push("responder".to_string());
        resp.set_text("responded");
        Ok(())
    });
    let route = ResourceRoute::new(resource)
        .before(
            Method::GET,
            Before::new(move |_req, _resp, _resource, _params| {
                before_log.lock().push("before".to_string());
                Ok(())
            }),
        )
        .unwrap()
        .after(
            Method::GET,
            After::new(move |_req, _resp, _resource| {
                after_log.lock().push("after".to_string());
                Ok(())
            }),
        )
        .unwrap();
    SingleRoute::new(route)
}

#[tokio::test]
async fn test_request_phase_signal_runs_every_response_stage() {
    for model in MODELS {
        let log = new_log();
        let gate = FnMiddleware::new("gate")
            .on_request(|_req, _resp| Err(Signal::new(StatusCode::UNAUTHORIZED).into()))
            .on_response(|_req, resp, resource, ok| {
                assert!(resource.is_none());
                assert!(!ok);
                resp.set_header("x-gate", "seen")?;
                Ok(())
            });
        let pipeline = gated_pipeline(&log, gate);

        let resp = run(&pipeline, &traced_router(&log), model).await;

        assert_eq!(resp.status(), "401 Unauthorized");
        assert_eq!(resp.header("x-gate"), Some("seen"));
        assert_eq!(
            entries(&log),
            vec!["outer.request", "inner.response", "outer.response"]
        );
    }
}

#[tokio::test]
async fn test_resource_phase_signal_skips_hooks_and_responder() {
    for model in MODELS {
        let log = new_log();
        let gate = FnMiddleware::new("gate").on_resource(|_req, _resp, _resource, _params| {
            Err(Signal::new(StatusCode::FORBIDDEN).text("denied").into())
        });
        let pipeline = gated_pipeline(&log, gate);

        let resp = run(&pipeline, &traced_router(&log), model).await;

        assert_eq!(resp.status(), "403 Forbidden");
        assert_eq!(resp.text(), "denied");
        assert_eq!(
            entries(&log),
            vec![
                "outer.request",
                "inner.request",
                "outer.resource",
                "inner.response",
                "outer.response",
            ]
        );
    }
}

#[tokio::test]
async fn test_response_phase_may_override_signal() {
    for model in MODELS {
        let log = new_log();
        let gate = FnMiddleware::new("gate")
            .on_request(|_req, _resp| Err(Signal::new(StatusCode::UNAUTHORIZED).text("no").into()));
        let rewrite = FnMiddleware::new("rewrite").on_response(|_req, resp, _resource, _ok| {
            resp.set_status(StatusCode::OK);
            resp.set_header("X-Failed", "False")?;
            resp.set_text("Pass");
            Ok(())
        });
        let pipeline = Pipeline::builder()
            .middleware(rewrite)
            .middleware(gate)
            .build();

        let resp = run(&pipeline, &traced_router(&log), model).await;
        assert_pass(&resp);
    }
}

#[tokio::test]
async fn test_full_order_without_short_circuit() {
    for model in MODELS {
        let log = new_log();
        let pipeline = Pipeline::builder()
            .middleware(vec![
                tracing_middleware(&log, "a"),
                tracing_middleware(&log, "b"),
            ])
            .build();

        let resp = run(&pipeline, &traced_router(&log), model).await;

        assert_eq!(resp.status(), "200 OK");
        assert_eq!(resp.text(), "responded");
        assert_eq!(
            entries(&log),
            vec![
                "a.request",
                "b.request",
                "a.resource",
                "b.resource",
                "before",
                "responder",
                "after",
                "b.response",
                "a.response",
            ]
        );
    }
}

// ============================================================================
// Completion, Params and Success Flag Tests
// ============================================================================

#[tokio::test]
async fn test_complete_flag_skips_to_response_phase() {
    for model in MODELS {
        let log = new_log();
        let cache = FnMiddleware::new("cache").on_request(|_req, resp| {
            resp.set_text("from cache");
            resp.set_complete();
            Ok(())
        });
        let pipeline = gated_pipeline(&log, cache);

        let resp = run(&pipeline, &traced_router(&log), model).await;

        assert_eq!(resp.text(), "from cache");
        assert_eq!(
            entries(&log),
            vec!["outer.request", "inner.response", "outer.response"]
        );
    }
}

#[tokio::test]
async fn test_resource_phase_can_rewrite_params() {
    let resource = FnResource::new("items").on(Method::GET, |_req, resp, params| {
        resp.set_text(params.get("id").unwrap_or("missing").to_string());
        Ok(())
    });
    let router = SingleRoute::new(ResourceRoute::new(resource));
    let pipeline = Pipeline::builder()
        .middleware(
            FnMiddleware::new("default_id").on_resource(|_req, _resp, _resource, params| {
                params.insert("id", "42");
                Ok(())
            }),
        )
        .build();

    for model in MODELS {
        let resp = run(&pipeline, &router, model).await;
        assert_eq!(resp.text(), "42");
    }
}

#[tokio::test]
async fn test_success_flag_reflects_outcome() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_in_mw = Arc::clone(&seen);
    let pipeline = Pipeline::builder()
        .middleware(FnMiddleware::new("flag").on_response(move |_req, _resp, resource, ok| {
            seen_in_mw.lock().push((resource.map(|r| r.name()), ok));
            Ok(())
        }))
        .build();

    let ok_router = SingleRoute::new(ResourceRoute::new(
        FnResource::new("ok").on(Method::GET, |_req, _resp, _params| Ok(())),
    ));
    let signal_router = SingleRoute::new(ResourceRoute::new(
        FnResource::new("signal")
            .on(Method::GET, |_req, _resp, _params| Err(pass_signal().into())),
    ));

    run(&pipeline, &ok_router, ExecutionModel::Cooperative).await;
    run(&pipeline, &signal_router, ExecutionModel::Blocking).await;

    assert_eq!(
        *seen.lock(),
        vec![(Some("ok"), true), (Some("signal"), false)]
    );
}

// ============================================================================
// Fault Tests
// ============================================================================

fn faulty_router() -> SingleRoute {
    SingleRoute::new(ResourceRoute::new(FnResource::new("faulty").on(
        Method::GET,
        |_req, _resp, _params| -> StageResult {
            Err(HeronError::stage_with_source(
                "faulty",
                "lookup failed",
                anyhow::anyhow!("timeout"),
            )
            .into())
        },
    )))
}

#[tokio::test]
async fn test_fault_still_runs_response_phase_then_propagates() {
    for model in MODELS {
        let log = new_log();
        let pipeline = Pipeline::builder()
            .middleware(tracing_middleware(&log, "outer"))
            .build();

        let result = try_run(&pipeline, &faulty_router(), model).await;

        assert!(matches!(result, Err(HeronError::Stage { .. })));
        assert_eq!(
            entries(&log),
            vec!["outer.request", "outer.resource", "outer.response"]
        );
    }
}

#[tokio::test]
async fn test_response_phase_can_handle_fault() {
    let pipeline = Pipeline::builder()
        .middleware(FnMiddleware::new("recover").on_response(|req, resp, _resource, ok| {
            assert!(!ok);
            assert_eq!(resp.status(), "500 Internal Server Error");
            if let Some(fault) = req.context_mut().take_fault() {
                resp.set_status(StatusCode::BAD_GATEWAY);
                resp.set_text(fault.to_string());
            }
            Ok(())
        }))
        .build();

    for model in MODELS {
        let resp = run(&pipeline, &faulty_router(), model).await;
        assert_eq!(resp.status(), "502 Bad Gateway");
        assert_eq!(resp.text(), "stage 'faulty' failed: lookup failed");
    }
}

#[tokio::test]
async fn test_fault_inside_response_phase_is_fatal() {
    let log = new_log();
    let pipeline = Pipeline::builder()
        .middleware(tracing_middleware(&log, "outer"))
        .middleware(
            FnMiddleware::new("broken").on_response(|_req, _resp, _resource, _ok| {
                Err(HeronError::internal("broken").into())
            }),
        )
        .build();
    let router = SingleRoute::new(ResourceRoute::new(
        FnResource::new("ok").on(Method::GET, |_req, _resp, _params| Ok(())),
    ));

    let result = try_run(&pipeline, &router, ExecutionModel::Cooperative).await;

    assert!(matches!(result, Err(HeronError::Internal { .. })));
    assert!(!entries(&log).contains(&"outer.response".to_string()));
}

type Seen = Arc<Mutex<Vec<(bool, bool, String)>>>;

/// A response-phase middleware that turns a recorded fault into a 502 and
/// records what it observed.
fn fault_recovery(seen: &Seen) -> FnMiddleware {
    let seen = Arc::clone(seen);
    FnMiddleware::new("recover").on_response(move |req, resp, resource, ok| {
        seen.lock().push((resource.is_some(), ok, resp.status().to_string()));
        if let Some(fault) = req.context_mut().take_fault() {
            return Err(Signal::new(StatusCode::BAD_GATEWAY)
                .text(fault.to_string())
                .into());
        }
        Ok(())
    })
}

fn unavailable() -> StageResult {
    Err(HeronError::stage("backend", "unavailable").into())
}

#[tokio::test]
async fn test_fault_from_every_forward_stage_reaches_response_phase() {
    for model in MODELS {
        // Raised in the request phase: no resource resolved yet.
        let log = new_log();
        let seen = Seen::default();
        let pipeline = Pipeline::builder()
            .middleware(fault_recovery(&seen))
            .middleware(FnMiddleware::new("broken").on_request(|_req, _resp| unavailable()))
            .build();
        let resp = run(&pipeline, &traced_router(&log), model).await;
        assert_eq!(resp.status(), "502 Bad Gateway");
        assert_eq!(resp.text(), "stage 'backend' failed: unavailable");
        assert!(entries(&log).is_empty());

        // Raised in the resource phase.
        let pipeline = Pipeline::builder()
            .middleware(fault_recovery(&seen))
            .middleware(
                FnMiddleware::new("broken")
                    .on_resource(|_req, _resp, _resource, _params| unavailable()),
            )
            .build();
        let resp = run(&pipeline, &traced_router(&log), model).await;
        assert_eq!(resp.status(), "502 Bad Gateway");
        assert!(entries(&log).is_empty());

        // Raised by a before-hook.
        let route = ResourceRoute::new(failing_resource(&log))
            .before(
                Method::GET,
                Before::new(|_req, _resp, _resource, _params| unavailable()),
            )
            .unwrap();
        let pipeline = Pipeline::builder()
            .middleware(fault_recovery(&seen))
            .build();
        let resp = run(&pipeline, &SingleRoute::new(route), model).await;
        assert_eq!(resp.status(), "502 Bad Gateway");
        assert_eq!(resp.text(), "stage 'backend' failed: unavailable");
        assert!(entries(&log).is_empty(), "responder ran under {model}");

        let fault_status = "500 Internal Server Error".to_string();
        assert_eq!(
            *seen.lock(),
            vec![
                (false, false, fault_status.clone()),
                (true, false, fault_status.clone()),
                (true, false, fault_status),
            ]
        );
    }
}

#[tokio::test]
async fn test_after_hook_signal_reaches_response_phase() {
    for model in MODELS {
        let log = new_log();
        let late_log = Arc::clone(&log);
        let route = ResourceRoute::new(failing_resource(&log))
            .after(
                Method::GET,
                After::new(|_req, _resp, _resource| {
                    Err(Signal::new(StatusCode::ACCEPTED).text("queued").into())
                }),
            )
            .unwrap()
            .after(
                Method::GET,
                After::new(move |_req, _resp, _resource| {
                    late_log.lock().push("late".to_string());
                    Ok(())
                }),
            )
            .unwrap();

        let seen = Seen::default();
        let pipeline = Pipeline::builder()
            .middleware(fault_recovery(&seen))
            .build();

        let resp = run(&pipeline, &SingleRoute::new(route), model).await;

        assert_eq!(resp.status(), "202 Accepted");
        assert_eq!(resp.text(), "queued");
        // The signal overrides status and body but keeps the responder's header.
        assert_eq!(resp.header("x-failed"), Some("True"));
        assert_eq!(entries(&log), vec!["responder"]);
        assert_eq!(*seen.lock(), vec![(true, false, "202 Accepted".to_string())]);
    }
}

// ============================================================================
// Status Normalization Tests
// ============================================================================

#[tokio::test]
async fn test_numeric_and_textual_status_are_identical() {
    let numeric = SingleRoute::new(ResourceRoute::new(FnResource::new("numeric").on(
        Method::GET,
        |_req, _resp, _params| Err(Signal::from_code(200)?.into()),
    )));
    let textual = SingleRoute::new(ResourceRoute::new(FnResource::new("textual").on(
        Method::GET,
        |_req, _resp, _params| Err(Signal::from_status_line("200 OK")?.into()),
    )));
    let pipeline = Pipeline::builder().build();

    for model in MODELS {
        let a = run(&pipeline, &numeric, model).await;
        let b = run(&pipeline, &textual, model).await;
        assert_eq!(a.status().as_str().as_bytes(), b.status().as_str().as_bytes());
        assert_eq!(a.status(), "200 OK");
    }
}
