use super::*;
use crate::api::Gateway;
use crate::camera::{CapturePipeline, MockCameraDevice, SessionState};
use crate::config::CameraConfig;
use crate::error::{ApiError, WorkflowError};
use crate::events::{EventBus, KioskEvent};
use crate::router::{ViewId, ViewRouter};
use crate::store::ViewStore;
use crate::testutil::MockGateway;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

fn bus() -> Arc<EventBus> {
    Arc::new(EventBus::new(64))
}

fn registration(gateway: Arc<MockGateway>, events: Arc<EventBus>) -> Arc<RegistrationWorkflow> {
    Arc::new(RegistrationWorkflow::new(
        gateway,
        events,
        "operator-1".to_string(),
    ))
}

async fn active_pipeline() -> Arc<CapturePipeline> {
    let pipeline = Arc::new(CapturePipeline::new(
        Arc::new(MockCameraDevice::new()),
        CameraConfig {
            index: 0,
            resolution: (320, 240),
            fps: 30,
            format: "MJPG".to_string(),
        },
    ));
    pipeline.start().await.unwrap();
    pipeline
        .wait_for_preview(Duration::from_secs(2))
        .await
        .unwrap();
    pipeline
}

fn verification(
    gateway: Arc<MockGateway>,
    pipeline: Arc<CapturePipeline>,
    router: Arc<ViewRouter>,
    store: Arc<ViewStore>,
    events: Arc<EventBus>,
) -> Arc<VerificationWorkflow> {
    Arc::new(VerificationWorkflow::new(
        gateway, pipeline, router, store, events,
    ))
}

fn drain(receiver: &mut broadcast::Receiver<KioskEvent>) -> Vec<KioskEvent> {
    let mut events = vec![];
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn test_registration_success_without_photo() {
    let gateway = MockGateway::new();
    let workflow = registration(Arc::clone(&gateway), bus());

    let outcome = workflow
        .submit(&RegistrationForm {
            name: "Amina Yusuf".to_string(),
            department: Some("Finance".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(outcome.employee.as_ref().unwrap().name, "Amina Yusuf");
    assert!(outcome.duplicates_advisory().is_none());
    assert_eq!(gateway.call_count("register"), 1);
    assert!(!workflow.in_flight());
}

#[tokio::test]
async fn test_registration_empty_name_fails_before_network() {
    let gateway = MockGateway::new();
    let workflow = registration(Arc::clone(&gateway), bus());

    let result = workflow
        .submit(&RegistrationForm {
            name: "   ".to_string(),
            ..Default::default()
        })
        .await;

    assert!(matches!(
        result,
        Err(WorkflowError::ValidationFailed { field: "name", .. })
    ));
    assert!(gateway.calls().is_empty());
    assert!(!workflow.in_flight());
}

#[tokio::test]
async fn test_second_submission_rejected_while_in_flight() {
    let gateway = MockGateway::new();
    let workflow = registration(Arc::clone(&gateway), bus());
    let gate = gateway.hold();

    let first = {
        let workflow = Arc::clone(&workflow);
        tokio::spawn(async move {
            workflow
                .submit(&RegistrationForm {
                    name: "First".to_string(),
                    ..Default::default()
                })
                .await
        })
    };

    // Let the first submission reach the gateway and park there
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(workflow.in_flight());

    let second = workflow
        .submit(&RegistrationForm {
            name: "Second".to_string(),
            ..Default::default()
        })
        .await;
    assert!(matches!(second, Err(WorkflowError::AlreadyInProgress)));

    // The rejected attempt issued no additional network call
    assert_eq!(gateway.call_count("register"), 1);

    gateway.release();
    gate.notify_waiters();
    first.await.unwrap().unwrap();
    assert!(!workflow.in_flight());
}

#[tokio::test]
async fn test_in_flight_cleared_after_transport_error() {
    let gateway = MockGateway::new();
    gateway.fail_with(ApiError::Transport {
        cause: "connection refused".to_string(),
    });
    let workflow = registration(Arc::clone(&gateway), bus());

    let result = workflow
        .submit(&RegistrationForm {
            name: "Amina".to_string(),
            ..Default::default()
        })
        .await;

    assert!(matches!(result, Err(WorkflowError::Api(_))));
    assert!(!workflow.in_flight());

    // The workflow is immediately usable again
    gateway.clear_failure();
    workflow
        .submit(&RegistrationForm {
            name: "Amina".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_duplicates_surface_as_advisory_not_error() {
    let gateway = MockGateway::new();
    *gateway.duplicates_found.lock() = 2;
    let events = bus();
    let mut receiver = events.subscribe();
    let workflow = registration(Arc::clone(&gateway), events);

    let outcome = workflow
        .submit(&RegistrationForm {
            name: "Amina".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    // Registration succeeded AND flagged duplicates for review
    assert_eq!(outcome.duplicates_found, 2);
    let advisory = outcome.duplicates_advisory().unwrap();
    assert!(advisory.contains("2"));

    let published = drain(&mut receiver);
    assert!(published
        .iter()
        .any(|e| matches!(e, KioskEvent::Advisory { .. })));
    assert!(published.iter().any(|e| matches!(
        e,
        KioskEvent::SubmissionCompleted { success: true, .. }
    )));
}

#[tokio::test]
async fn test_photo_kept_on_failure_discarded_on_success() {
    let gateway = MockGateway::new();
    let workflow = registration(Arc::clone(&gateway), bus());
    let form = RegistrationForm {
        name: "Amina".to_string(),
        ..Default::default()
    };

    workflow.attach_photo(crate::camera::CapturedImage::from_encoded("aGVsbG8="));
    gateway.fail_with(ApiError::Http {
        status: 500,
        message: "internal error".to_string(),
    });

    assert!(workflow.submit(&form).await.is_err());
    // Failure keeps the capture so the operator can retry without redoing it
    assert!(workflow.has_photo());

    gateway.clear_failure();
    workflow.submit(&form).await.unwrap();
    assert!(!workflow.has_photo());
}

#[tokio::test]
async fn test_server_error_message_passes_through() {
    let gateway = MockGateway::new();
    gateway.fail_with(ApiError::Http {
        status: 400,
        message: "duplicate email".to_string(),
    });
    let workflow = registration(Arc::clone(&gateway), bus());

    let error = workflow
        .submit(&RegistrationForm {
            name: "Amina".to_string(),
            email: Some("amina@example.net".to_string()),
            ..Default::default()
        })
        .await
        .unwrap_err();

    assert_eq!(error.to_string(), "duplicate email");
}

#[tokio::test]
async fn test_verification_requires_live_capture() {
    let gateway = MockGateway::new();
    let pipeline = Arc::new(CapturePipeline::new(
        Arc::new(MockCameraDevice::new()),
        CameraConfig {
            index: 0,
            resolution: (320, 240),
            fps: 30,
            format: "MJPG".to_string(),
        },
    ));
    let workflow = verification(
        Arc::clone(&gateway),
        pipeline,
        Arc::new(ViewRouter::new()),
        Arc::new(ViewStore::new()),
        bus(),
    );

    // Camera never started: precondition fails before any network call
    let result = workflow.submit(7).await;
    assert!(matches!(result, Err(WorkflowError::MissingCapture)));
    assert!(gateway.calls().is_empty());
    assert!(!workflow.in_flight());
}

#[tokio::test]
async fn test_verification_updates_result_panel_and_keeps_camera() {
    let gateway = MockGateway::new();
    let pipeline = active_pipeline().await;
    let router = Arc::new(ViewRouter::new());
    router.commit(router.plan(ViewId::Verification).unwrap());
    let store = Arc::new(ViewStore::new());
    let workflow = verification(
        Arc::clone(&gateway),
        Arc::clone(&pipeline),
        Arc::clone(&router),
        Arc::clone(&store),
        bus(),
    );

    let response = workflow.submit(1).await.unwrap();
    assert!(response.verified);

    let stored = store.verification().unwrap();
    assert_eq!(stored.confidence, 88.5);

    // Either outcome leaves the session running for a retry
    assert_eq!(pipeline.state(), SessionState::Active);

    pipeline.stop().await;
}

#[tokio::test]
async fn test_verification_result_dropped_after_leaving_view() {
    let gateway = MockGateway::new();
    let pipeline = active_pipeline().await;
    let router = Arc::new(ViewRouter::new());
    router.commit(router.plan(ViewId::Verification).unwrap());
    let store = Arc::new(ViewStore::new());
    let workflow = verification(
        Arc::clone(&gateway),
        Arc::clone(&pipeline),
        Arc::clone(&router),
        Arc::clone(&store),
        bus(),
    );

    let gate = gateway.hold();
    let submit = {
        let workflow = Arc::clone(&workflow);
        tokio::spawn(async move { workflow.submit(1).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Operator navigates away while the request is still in flight
    router.commit(router.plan(ViewId::Dashboard).unwrap());
    gateway.release();
    gate.notify_waiters();

    // The request was allowed to complete...
    let response = submit.await.unwrap().unwrap();
    assert!(response.verified);
    // ...but the stale result never touched the display state
    assert!(store.verification().is_none());

    pipeline.stop().await;
}

#[tokio::test]
async fn test_check_in_records_attendance_and_reloads_dashboard() {
    let gateway = MockGateway::new();
    let events = bus();
    let mut receiver = events.subscribe();
    let workflow = CheckInWorkflow::new(
        Arc::clone(&gateway) as Arc<dyn Gateway>,
        events,
        "Main Office".to_string(),
        "KIOSK-01".to_string(),
    );

    let log = workflow.submit(3, "facial").await.unwrap().unwrap();
    assert_eq!(log.employee_id, 3);
    assert_eq!(log.location.as_deref(), Some("Main Office"));
    assert_eq!(gateway.call_count("check_in"), 1);
    assert!(!workflow.in_flight());

    let reloads: Vec<ViewId> = drain(&mut receiver)
        .into_iter()
        .filter_map(|e| match e {
            KioskEvent::ReloadRequested { view } => Some(view),
            _ => None,
        })
        .collect();
    assert_eq!(reloads, vec![ViewId::Dashboard]);
}

#[tokio::test]
async fn test_check_in_rejects_bad_employee_id() {
    let gateway = MockGateway::new();
    let workflow = CheckInWorkflow::new(
        Arc::clone(&gateway) as Arc<dyn Gateway>,
        bus(),
        "Main Office".to_string(),
        "KIOSK-01".to_string(),
    );

    let result = workflow.submit(0, "facial").await;
    assert!(matches!(
        result,
        Err(WorkflowError::ValidationFailed { .. })
    ));
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn test_alert_resolution_cancelled_sends_nothing() {
    let gateway = MockGateway::new();
    let workflow = AlertResolutionWorkflow::new(Arc::clone(&gateway) as Arc<dyn Gateway>, bus());

    let resolution = workflow
        .resolve(1, Some("not fraud".to_string()), &StaticConfirmer(false))
        .await
        .unwrap();

    assert_eq!(resolution, AlertResolution::Cancelled);
    assert!(gateway.calls().is_empty());
    assert!(!workflow.in_flight());
}

#[tokio::test]
async fn test_alert_resolution_reloads_fraud_and_dashboard() {
    let gateway = MockGateway::new();
    let events = bus();
    let mut receiver = events.subscribe();
    let workflow =
        AlertResolutionWorkflow::new(Arc::clone(&gateway) as Arc<dyn Gateway>, events);

    let resolution = workflow
        .resolve(1, Some("confirmed duplicate".to_string()), &StaticConfirmer(true))
        .await
        .unwrap();

    assert!(matches!(resolution, AlertResolution::Resolved { .. }));
    assert_eq!(gateway.call_count("resolve_alert"), 1);

    let reloads: Vec<ViewId> = drain(&mut receiver)
        .into_iter()
        .filter_map(|e| match e {
            KioskEvent::ReloadRequested { view } => Some(view),
            _ => None,
        })
        .collect();
    assert!(reloads.contains(&ViewId::Fraud));
    assert!(reloads.contains(&ViewId::Dashboard));
}

#[tokio::test]
async fn test_alert_resolution_failure_is_surfaced() {
    let gateway = MockGateway::new();
    gateway.fail_with(ApiError::Http {
        status: 404,
        message: "Alert not found".to_string(),
    });
    let workflow = AlertResolutionWorkflow::new(Arc::clone(&gateway) as Arc<dyn Gateway>, bus());

    let error = workflow
        .resolve(99, None, &StaticConfirmer(true))
        .await
        .unwrap_err();

    assert_eq!(error.to_string(), "Alert not found");
    assert!(!workflow.in_flight());
}
