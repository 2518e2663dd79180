//! Registering callables and answering invocations over an in-memory
//! connection.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use common::TestRemote;
use itermctl_client::protocol::{
    ClientRequest, ContextMenuAttributes, KnobKind, NotificationStatus, NotificationType,
    PopoverSize, Rejection, RoleAttributes, RpcResult, RpcRole, StatusBarComponentAction,
};
use itermctl_client::ClientError;
use itermctl_rpc::{
    handler_fn, register, register_scoped, ArgSchema, ArgSpec, Invocation, Knob, Role,
    RpcDescriptor, RpcError, StatusBarComponent,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

fn greet() -> RpcDescriptor {
    RpcDescriptor::new(
        "greet",
        ArgSchema::new()
            .arg(ArgSpec::string("who").default_from("session.name"))
            .arg(ArgSpec::bool("shout")),
    )
}

async fn greeting(inv: Invocation) -> anyhow::Result<Value> {
    let who: String = inv.get("who")?;
    let text = format!("hello {who}");
    if inv.arguments().bool("shout") == Some(true) {
        return Ok(json!(text.to_uppercase()));
    }
    Ok(json!(text))
}

#[tokio::test]
async fn test_registration_wire_shape() {
    let mut remote = TestRemote::start();
    let (registration, request) = remote.register(greet(), handler_fn(greeting)).await;

    assert_eq!(registration.name(), "greet");
    assert!(request.subscribe);
    assert_eq!(request.notification_type, NotificationType::ServerOriginatedRpc);

    let rpc = request.rpc_registration().expect("registration arguments");
    assert_eq!(rpc.name, "greet");
    let names: Vec<_> = rpc.arguments.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, ["who", "shout"]);
    assert_eq!(rpc.defaults.len(), 1);
    assert_eq!(rpc.defaults[0].path, "session.name");
    assert_eq!(rpc.role, RpcRole::Generic);
    assert!(rpc.role_attributes.is_none());
}

#[tokio::test]
async fn test_context_menu_registration_wire_shape() {
    let mut remote = TestRemote::start();
    let descriptor = RpcDescriptor::new(
        "copy_path",
        ArgSchema::new().arg(ArgSpec::string("session_id").default_from("id")),
    )
    .with_role(Role::context_menu("Copy path", "com.example.copy-path"));
    let (_registration, request) = remote.register(descriptor, handler_fn(greeting)).await;

    let rpc = request.rpc_registration().unwrap();
    assert_eq!(rpc.role, RpcRole::ContextMenu);
    let names: Vec<_> = rpc.arguments.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, ["session_id"]);
    assert_eq!(
        rpc.role_attributes,
        Some(RoleAttributes::ContextMenu(ContextMenuAttributes {
            display_name: "Copy path".into(),
            unique_identifier: "com.example.copy-path".into(),
        }))
    );
}

#[tokio::test]
async fn test_invocation_result_round_trip() {
    let mut remote = TestRemote::start();
    let (_registration, _) = remote.register(greet(), handler_fn(greeting)).await;

    remote.invoke("r1", "greet", &[("who", "\"Ada\"")]);
    let reply = remote.expect_result().await;
    assert_eq!(reply.request_id, "r1");
    assert_eq!(reply.result, RpcResult::JsonValue("\"hello Ada\"".into()));

    remote.invoke("r2", "greet", &[("who", "\"Ada\""), ("shout", "true")]);
    let reply = remote.expect_result().await;
    assert_eq!(reply.request_id, "r2");
    assert_eq!(reply.result, RpcResult::JsonValue("\"HELLO ADA\"".into()));
}

#[tokio::test]
async fn test_handler_error_becomes_exception() {
    let mut remote = TestRemote::start();
    let handler = handler_fn(|_inv: Invocation| async move {
        Err::<Value, _>(anyhow::anyhow!("no git repository"))
    });
    let (_registration, _) = remote
        .register(RpcDescriptor::new("branch", ArgSchema::new()), handler)
        .await;

    remote.invoke("r1", "branch", &[]);
    let reply = remote.expect_result().await;
    let RpcResult::JsonException(json) = reply.result else {
        panic!("expected an exception, got {:?}", reply.result);
    };
    let exception: Value = serde_json::from_str(&json).unwrap();
    assert_eq!(exception, json!({"reason": "no git repository"}));
}

#[tokio::test]
async fn test_panicking_handler_still_answers() {
    let mut remote = TestRemote::start();
    let handler = handler_fn(|inv: Invocation| async move {
        if inv.arguments().bool("explode") == Some(true) {
            panic!("boom");
        }
        Ok(json!("fine"))
    });
    let descriptor =
        RpcDescriptor::new("fragile", ArgSchema::new().arg(ArgSpec::bool("explode")));
    let (_registration, _) = remote.register(descriptor, handler).await;

    remote.invoke("r1", "fragile", &[("explode", "true")]);
    let reply = remote.expect_result().await;
    assert_eq!(reply.request_id, "r1");
    let RpcResult::JsonException(json) = reply.result else {
        panic!("expected an exception, got {:?}", reply.result);
    };
    let exception: Value = serde_json::from_str(&json).unwrap();
    assert_eq!(exception, json!({"reason": "handler panicked"}));

    remote.invoke("r2", "fragile", &[("explode", "false")]);
    let reply = remote.expect_result().await;
    assert_eq!(reply.result, RpcResult::JsonValue("\"fine\"".into()));
}

#[tokio::test]
async fn test_undecodable_argument_skips_handler() {
    let mut remote = TestRemote::start();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let handler = handler_fn(move |inv: Invocation| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(json!(inv.arguments().float("scale")))
        }
    });
    let descriptor = RpcDescriptor::new("zoom", ArgSchema::new().arg(ArgSpec::float("scale")));
    let (_registration, _) = remote.register(descriptor, handler).await;

    remote.invoke("r1", "zoom", &[("scale", "\"big\"")]);
    let reply = remote.expect_result().await;
    let RpcResult::JsonException(json) = reply.result else {
        panic!("expected an exception");
    };
    assert!(json.contains("scale"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    remote.invoke("r2", "zoom", &[("scale", "2.5")]);
    let reply = remote.expect_result().await;
    assert_eq!(reply.result, RpcResult::JsonValue("2.5".into()));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_invocations_of_other_names_are_ignored() {
    let mut remote = TestRemote::start();
    let (_registration, _) = remote.register(greet(), handler_fn(greeting)).await;

    remote.invoke("r0", "farewell", &[("who", "\"Ada\"")]);
    remote.invoke("r1", "greet", &[("who", "\"Bob\"")]);

    let reply = remote.expect_result().await;
    assert_eq!(reply.request_id, "r1");
    assert_eq!(remote.conn.stats().lost(), 1);
    assert!(remote.peer.try_next_request().is_none());
}

#[derive(Debug, Deserialize)]
struct ClockKnobs {
    seconds: bool,
    format: String,
}

fn clock() -> RpcDescriptor {
    let component = StatusBarComponent::new(
        "com.example.clock",
        "Clock",
        "Shows the current time",
        "12:00",
    )
    .knob(Knob::checkbox("Show seconds", "seconds", false))
    .knob(Knob::string("Format", "format", "%H:%M").placeholder("strftime format"));

    RpcDescriptor::new(
        "clock",
        ArgSchema::new().arg(ArgSpec::string("session_id").default_from("session.id")),
    )
    .with_role(Role::StatusBar(component))
}

#[tokio::test]
async fn test_status_bar_registration_and_knobs() {
    let mut remote = TestRemote::start();
    let handler = handler_fn(|inv: Invocation| async move {
        let knobs: ClockKnobs = inv.knobs()?;
        let text = if knobs.seconds { "12:00:00" } else { "12:00" };
        Ok(json!(format!("{text} ({})", knobs.format)))
    });
    let (_registration, request) = remote.register(clock(), handler).await;

    let rpc = request.rpc_registration().unwrap();
    let names: Vec<_> = rpc.arguments.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, ["session_id", "knobs"]);
    assert_eq!(rpc.role, RpcRole::StatusBarComponent);
    let Some(RoleAttributes::StatusBarComponent(attrs)) = &rpc.role_attributes else {
        panic!("expected status bar attributes");
    };
    assert_eq!(attrs.unique_identifier, "com.example.clock");
    assert_eq!(attrs.update_cadence, None);
    assert_eq!(attrs.knobs.len(), 2);
    assert_eq!(attrs.knobs[0].kind, KnobKind::Checkbox);
    assert_eq!(attrs.knobs[0].placeholder, "Show seconds");
    assert_eq!(attrs.knobs[0].json_default_value, "false");
    assert_eq!(attrs.knobs[1].placeholder, "strftime format");
    assert_eq!(attrs.knobs[1].json_default_value, "\"%H:%M\"");

    remote.invoke(
        "r1",
        "clock",
        &[
            ("session_id", "\"w0t0p0\""),
            ("knobs", r#""{\"seconds\":true,\"format\":\"24h\"}""#),
        ],
    );
    let reply = remote.expect_result().await;
    assert_eq!(reply.result, RpcResult::JsonValue("\"12:00:00 (24h)\"".into()));

    remote.invoke("r2", "clock", &[("session_id", "\"w0t0p0\"")]);
    let reply = remote.expect_result().await;
    let RpcResult::JsonException(json) = reply.result else {
        panic!("expected an exception");
    };
    assert!(json.contains("no argument named 'knobs'"));
}

#[tokio::test]
async fn test_popover_is_sent_before_result() {
    let mut remote = TestRemote::start();
    let handler = handler_fn(|inv: Invocation| async move {
        let session: String = inv.get("session_id")?;
        inv.open_popover(session, "<p>12:00</p>", PopoverSize { width: 200, height: 80 })
            .await?;
        Ok(json!("12:00"))
    });
    let (_registration, _) = remote.register(clock(), handler).await;

    remote.invoke("r1", "clock", &[("session_id", "\"w0t0p0\"")]);

    let popover = remote.expect_request().await;
    let ClientRequest::StatusBarComponent(request) = popover.request else {
        panic!("expected a status bar request, got {}", popover.request.kind());
    };
    assert_eq!(request.identifier, "com.example.clock");
    let StatusBarComponentAction::OpenPopover {
        session_id,
        html,
        size,
    } = request.action;
    assert_eq!(session_id, "w0t0p0");
    assert_eq!(html, "<p>12:00</p>");
    assert_eq!(size, PopoverSize { width: 200, height: 80 });

    let reply = remote.expect_result().await;
    assert_eq!(reply.result, RpcResult::JsonValue("\"12:00\"".into()));
}

#[tokio::test]
async fn test_popover_outside_status_bar_fails() {
    let mut remote = TestRemote::start();
    let handler = handler_fn(|inv: Invocation| async move {
        inv.open_popover("w0t0p0", "<p/>", PopoverSize { width: 1, height: 1 })
            .await?;
        Ok(Value::Null)
    });
    let (_registration, _) = remote
        .register(RpcDescriptor::new("plain", ArgSchema::new()), handler)
        .await;

    remote.invoke("r1", "plain", &[]);
    let reply = remote.expect_result().await;
    let RpcResult::JsonException(json) = reply.result else {
        panic!("expected an exception");
    };
    assert!(json.contains("status bar"));
}

#[tokio::test]
async fn test_cancel_unregisters() {
    let mut remote = TestRemote::start();
    let (registration, request) = remote.register(greet(), handler_fn(greeting)).await;

    registration.cancel();
    let unsubscribe = remote
        .answer_notification_request(NotificationStatus::Ok)
        .await;
    assert!(!unsubscribe.subscribe);
    assert_eq!(unsubscribe.notification_type, NotificationType::ServerOriginatedRpc);
    assert_eq!(unsubscribe.rpc_registration(), request.rpc_registration());

    registration.closed().await;
    assert!(registration.is_closed());

    remote.invoke("r1", "greet", &[("who", "\"Ada\"")]);
    assert_eq!(remote.conn.receiver_count().await.unwrap(), 0);
    assert!(remote.peer.try_next_request().is_none());
}

#[tokio::test]
async fn test_dropping_handle_keeps_registration() {
    let mut remote = TestRemote::start();
    let (registration, _) = remote.register(greet(), handler_fn(greeting)).await;
    drop(registration);

    remote.invoke("r1", "greet", &[("who", "\"Ada\"")]);
    let reply = remote.expect_result().await;
    assert_eq!(reply.request_id, "r1");
}

#[tokio::test]
async fn test_scope_cancellation_unregisters() {
    let mut remote = TestRemote::start();
    let scope = CancellationToken::new();
    let conn = remote.conn.clone();

    let (registration, _) = tokio::join!(
        register_scoped(&conn, greet(), handler_fn(greeting), &scope),
        remote.answer_notification_request(NotificationStatus::Ok),
    );
    let registration = registration.unwrap();

    scope.cancel();
    let unsubscribe = remote
        .answer_notification_request(NotificationStatus::Ok)
        .await;
    assert!(!unsubscribe.subscribe);
    registration.closed().await;
}

#[tokio::test]
async fn test_connection_close_ends_registration() {
    let mut remote = TestRemote::start();
    let (registration, _) = remote.register(greet(), handler_fn(greeting)).await;

    remote.peer.disconnect();
    registration.closed().await;
    assert!(remote.conn.is_closed());
}

#[tokio::test]
async fn test_invalid_descriptor_sends_nothing() {
    let mut remote = TestRemote::start();

    let unnamed = register(
        &remote.conn,
        RpcDescriptor::new("", ArgSchema::new()),
        handler_fn(greeting),
    )
    .await;
    assert!(matches!(unnamed, Err(RpcError::UnnamedRpc)));

    let duplicate = register(
        &remote.conn,
        RpcDescriptor::new(
            "dup",
            ArgSchema::new().arg(ArgSpec::bool("x")).arg(ArgSpec::float("x")),
        ),
        handler_fn(greeting),
    )
    .await;
    assert!(matches!(duplicate, Err(RpcError::DuplicateArgument(_))));

    let unsupported = register(
        &remote.conn,
        RpcDescriptor::new("typed", ArgSchema::new().arg(ArgSpec::named_type("n", "int"))),
        handler_fn(greeting),
    )
    .await;
    assert!(matches!(unsupported, Err(RpcError::UnsupportedType { .. })));

    let component = StatusBarComponent::new("com.example.zoom", "Zoom", "Zoom level", "1x")
        .knob(Knob::positive_float("Scale", "scale", -2.0));
    let bad_knob = register(
        &remote.conn,
        RpcDescriptor::new("zoom", ArgSchema::new()).with_role(Role::StatusBar(component)),
        handler_fn(greeting),
    )
    .await;
    assert!(matches!(bad_knob, Err(RpcError::InvalidKnobDefault { .. })));

    assert!(remote.peer.try_next_request().is_none());
    assert_eq!(remote.conn.receiver_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_duplicate_registration_is_rejected() {
    let mut remote = TestRemote::start();
    let conn = remote.conn.clone();

    let (result, _) = tokio::join!(
        register(&conn, greet(), handler_fn(greeting)),
        remote.answer_notification_request(NotificationStatus::DuplicateServerOriginatedRpc),
    );

    match result {
        Err(RpcError::Client(ClientError::Rejected(rejection))) => {
            assert_eq!(rejection, Rejection::DuplicateServerOriginatedRpc)
        }
        other => panic!("expected a rejection, got {other:?}"),
    }
    assert_eq!(remote.conn.receiver_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_slow_handler_does_not_block_others() {
    let mut remote = TestRemote::start();
    let gate = Arc::new(Notify::new());
    let handler_gate = gate.clone();
    let handler = handler_fn(move |inv: Invocation| {
        let gate = handler_gate.clone();
        async move {
            let slow = inv.arguments().bool("slow") == Some(true);
            if slow {
                gate.notified().await;
            }
            Ok(json!(slow))
        }
    });
    let descriptor = RpcDescriptor::new("work", ArgSchema::new().arg(ArgSpec::bool("slow")));
    let (_registration, _) = remote.register(descriptor, handler).await;

    remote.invoke("slow", "work", &[("slow", "true")]);
    remote.invoke("fast", "work", &[("slow", "false")]);

    assert_eq!(remote.expect_result().await.request_id, "fast");
    gate.notify_one();
    assert_eq!(remote.expect_result().await.request_id, "slow");
}
