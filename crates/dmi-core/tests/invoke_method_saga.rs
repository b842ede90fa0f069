//! ---
//! dmi_section: "15-testing"
//! dmi_subsection: "integration"
//! dmi_type: "source"
//! dmi_scope: "test"
//! dmi_description: "Step-by-step checks of the invocation sagas."
//! dmi_version: "v0.1.0"
//! dmi_owner: "tbd"
//! ---
use std::sync::Arc;

use dmi_core::{
    Effect, FixedIdSource, InvocationOutcome, InvokeMethodSaga, NotifyMethodInvoked, Resume, Step,
};
use dmi_msg::{
    CompletionEvent, CorrelationId, FailureEvent, InvocationParameters, InvokeMethodAction,
    Notification, NotificationText, NotificationType, RemoteInvocationError, TemplateKey,
};
use serde_json::json;

const RANDOM_NUMBER: u64 = 0;

fn params() -> InvocationParameters {
    InvocationParameters {
        connection_string: "connection_string".into(),
        device_id: "device_id".into(),
        method_name: "test".into(),
        payload: Some(json!({"body": "test"})),
        connect_timeout_in_seconds: 10,
        response_timeout_in_seconds: 10,
    }
}

fn params_no_payload() -> InvocationParameters {
    InvocationParameters {
        payload: None,
        ..params()
    }
}

fn saga(params: InvocationParameters) -> InvokeMethodSaga {
    InvokeMethodSaga::new(params, Arc::new(FixedIdSource(RANDOM_NUMBER)))
}

/// Advance a fresh saga through the announce step up to the remote call.
fn saga_suspended_on_invoke() -> InvokeMethodSaga {
    let mut saga = saga(params());
    assert_eq!(
        saga.resume(Resume::Next).expect("start"),
        Step::Yield(Effect::Announce {
            id: CorrelationId(RANDOM_NUMBER),
            params: params(),
        })
    );
    assert_eq!(
        saga.resume(Resume::Next).expect("announced"),
        Step::Yield(Effect::InvokeMethod(params()))
    );
    saga
}

#[test]
fn announce_with_payload_uses_payload_template() {
    let mut announce = NotifyMethodInvoked::new(CorrelationId(RANDOM_NUMBER), params());

    assert_eq!(
        announce.resume(Resume::Next).expect("notify"),
        Step::Yield(Effect::Notify(Notification::new(
            CorrelationId(0),
            NotificationText::new(TemplateKey::InvokingWithPayload)
                .with_argument("deviceId", "device_id")
                .with_argument("methodName", "test")
                .with_argument("payload", r#"{"body":"test"}"#),
            NotificationType::Info,
        )))
    );
    assert_eq!(announce.resume(Resume::Next).expect("done"), Step::Complete);
}

#[test]
fn announce_without_payload_uses_plain_template() {
    let mut announce = NotifyMethodInvoked::new(CorrelationId(RANDOM_NUMBER), params_no_payload());

    let step = announce.resume(Resume::Next).expect("notify");
    let Step::Yield(Effect::Notify(notification)) = step else {
        panic!("expected a notification, got {step:?}");
    };
    assert_eq!(
        notification,
        Notification::new(
            CorrelationId(0),
            NotificationText::new(TemplateKey::Invoking)
                .with_argument("deviceId", "device_id")
                .with_argument("methodName", "test"),
            NotificationType::Info,
        )
    );
    assert!(notification.text.argument("payload").is_none());
    assert_eq!(announce.resume(Resume::Next).expect("done"), Step::Complete);
}

#[test]
fn successful_invocation_notifies_then_publishes_done() {
    let mut saga = saga_suspended_on_invoke();

    assert_eq!(
        saga.resume(Resume::Returned(json!("hello"))).expect("success"),
        Step::Yield(Effect::Notify(Notification::new(
            CorrelationId(0),
            NotificationText::new(TemplateKey::Success)
                .with_argument("deviceId", "device_id")
                .with_argument("methodName", "test")
                .with_argument("response", "hello"),
            NotificationType::Success,
        )))
    );
    assert_eq!(
        saga.resume(Resume::Next).expect("publish"),
        Step::Yield(Effect::Publish(InvokeMethodAction::Done(CompletionEvent {
            params: params(),
            result: json!("hello"),
        })))
    );
    assert_eq!(saga.resume(Resume::Next).expect("complete"), Step::Complete);
    assert_eq!(
        saga.into_outcome(),
        Some(InvocationOutcome::Completed(json!("hello")))
    );
}

#[test]
fn failed_invocation_notifies_then_publishes_failed() {
    let mut saga = saga_suspended_on_invoke();
    let error = RemoteInvocationError::new(json!({"code": -1}));

    assert_eq!(
        saga.resume(Resume::Threw(error.clone())).expect("failure"),
        Step::Yield(Effect::Notify(Notification::new(
            CorrelationId(0),
            NotificationText::new(TemplateKey::Error)
                .with_argument("deviceId", "device_id")
                .with_argument("error", json!({"code": -1})),
            NotificationType::Error,
        )))
    );
    assert_eq!(
        saga.resume(Resume::Next).expect("publish"),
        Step::Yield(Effect::Publish(InvokeMethodAction::Failed(FailureEvent {
            params: params(),
            error: error.clone(),
        })))
    );
    assert_eq!(saga.resume(Resume::Next).expect("complete"), Step::Complete);
    assert_eq!(saga.into_outcome(), Some(InvocationOutcome::Failed(error)));
}

#[test]
fn exactly_one_terminal_notification_and_event_per_branch() {
    let outcomes = [
        Resume::Returned(json!({"ok": true})),
        Resume::Threw(RemoteInvocationError::new("timeout")),
    ];
    for outcome in outcomes {
        let expect_success = matches!(outcome, Resume::Returned(_));
        let mut saga = saga_suspended_on_invoke();
        let mut effects = Vec::new();
        let mut input = outcome;
        while let Step::Yield(effect) = saga.resume(input).expect("step") {
            effects.push(effect);
            input = Resume::Next;
        }

        assert_eq!(effects.len(), 2, "one notification then one event");
        match (&effects[0], &effects[1]) {
            (Effect::Notify(notification), Effect::Publish(action)) => {
                assert_eq!(notification.id, CorrelationId(RANDOM_NUMBER));
                if expect_success {
                    assert_eq!(notification.notification_type, NotificationType::Success);
                    assert!(matches!(action, InvokeMethodAction::Done(_)));
                } else {
                    assert_eq!(notification.notification_type, NotificationType::Error);
                    assert!(matches!(action, InvokeMethodAction::Failed(_)));
                }
            }
            other => panic!("unexpected terminal effects: {other:?}"),
        }
    }
}

#[test]
fn announce_uses_the_same_id_as_the_terminal_notification() {
    let mut saga = InvokeMethodSaga::new(params(), Arc::new(FixedIdSource(77)));
    let Step::Yield(Effect::Announce { id, .. }) = saga.resume(Resume::Next).expect("start") else {
        panic!("expected announce");
    };
    saga.resume(Resume::Next).expect("invoke");
    let Step::Yield(Effect::Notify(terminal)) =
        saga.resume(Resume::Returned(json!(null))).expect("terminal")
    else {
        panic!("expected terminal notification");
    };
    assert_eq!(id, CorrelationId(77));
    assert_eq!(terminal.id, id);
    assert_eq!(saga.correlation_id(), Some(id));
}
