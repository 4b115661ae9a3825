use crate::api::{
    ApiClient, AttendanceRecord, DashboardStats, EmployeePage, Gateway, SampleDataRequest,
    VerifyResponse,
};
use crate::camera::{CameraDevice, CapturePipeline, CapturedImage};
use crate::config::KioskConfig;
use crate::error::{ApiError, CaptureError, Result, WorkflowError};
use crate::events::{EventBus, KioskEvent};
use crate::router::{ViewId, ViewRouter};
use crate::store::{FraudOverview, ViewStore};
use crate::workflows::{
    AlertResolution, AlertResolutionWorkflow, CheckInWorkflow, Confirmer, RegistrationForm,
    RegistrationOutcome, RegistrationWorkflow, VerificationWorkflow,
};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Main coordinator for the console: owns the router, the store, the capture
/// pipeline, and one instance of each submission workflow, and keeps them
/// consistent across view changes.
pub struct KioskController {
    config: KioskConfig,
    events: Arc<EventBus>,
    store: Arc<ViewStore>,
    router: Arc<ViewRouter>,
    pipeline: Arc<CapturePipeline>,
    gateway: Arc<dyn Gateway>,
    registration: Arc<RegistrationWorkflow>,
    verification: Arc<VerificationWorkflow>,
    check_in: Arc<CheckInWorkflow>,
    alerts: Arc<AlertResolutionWorkflow>,
}

impl KioskController {
    pub fn new(
        config: KioskConfig,
        gateway: Arc<dyn Gateway>,
        device: Arc<dyn CameraDevice>,
    ) -> Self {
        let events = Arc::new(EventBus::new(config.console.event_bus_capacity));
        let store = Arc::new(ViewStore::new());
        let router = Arc::new(ViewRouter::new());
        let pipeline = Arc::new(CapturePipeline::new(device, config.camera.clone()));

        let registration = Arc::new(RegistrationWorkflow::new(
            Arc::clone(&gateway),
            Arc::clone(&events),
            config.console.operator.clone(),
        ));
        let verification = Arc::new(VerificationWorkflow::new(
            Arc::clone(&gateway),
            Arc::clone(&pipeline),
            Arc::clone(&router),
            Arc::clone(&store),
            Arc::clone(&events),
        ));
        let check_in = Arc::new(CheckInWorkflow::new(
            Arc::clone(&gateway),
            Arc::clone(&events),
            config.console.location.clone(),
            config.console.device_id.clone(),
        ));
        let alerts = Arc::new(AlertResolutionWorkflow::new(
            Arc::clone(&gateway),
            Arc::clone(&events),
        ));

        Self {
            config,
            events,
            store,
            router,
            pipeline,
            gateway,
            registration,
            verification,
            check_in,
            alerts,
        }
    }

    /// Build a controller against the real HTTP gateway and the default
    /// camera backend for this build.
    pub fn from_config(config: KioskConfig) -> Result<Self> {
        let gateway: Arc<dyn Gateway> = Arc::new(ApiClient::new(&config.api)?);
        Ok(Self::new(config, gateway, default_camera_device()))
    }

    pub fn events(&self) -> Arc<EventBus> {
        Arc::clone(&self.events)
    }

    pub fn store(&self) -> Arc<ViewStore> {
        Arc::clone(&self.store)
    }

    pub fn router(&self) -> Arc<ViewRouter> {
        Arc::clone(&self.router)
    }

    pub fn pipeline(&self) -> Arc<CapturePipeline> {
        Arc::clone(&self.pipeline)
    }

    pub fn active_view(&self) -> ViewId {
        self.router.active()
    }

    /// Switch the console to `view`. Runs the departing view's teardown before
    /// the new view's setup: the camera is released when leaving verification,
    /// the departing view's data slice is discarded, and only then do the new
    /// view's fetches start. Re-activating the current view is a no-op.
    pub async fn activate(&self, view: ViewId) {
        let Some(plan) = self.router.plan(view) else {
            return;
        };

        if plan.from.holds_camera() {
            // Teardown failures are contained inside stop(); a setup hook must
            // never observe a session still held by the previous view
            self.pipeline.stop().await;
            self.publish_camera_state().await;
        }
        self.store.clear_view(plan.from);

        let generation = self.router.commit(plan);
        self.events
            .publish_lossy(KioskEvent::ViewChanged {
                view,
                timestamp: SystemTime::now(),
            })
            .await;

        if view.loads_data() {
            self.spawn_view_load(view, generation);
        }
    }

    /// Re-fetch the active view's data under the current activation.
    pub fn refresh(&self) {
        let view = self.router.active();
        if view.loads_data() {
            self.spawn_view_load(view, self.router.generation());
        }
    }

    fn spawn_view_load(&self, view: ViewId, generation: u64) {
        let gateway = Arc::clone(&self.gateway);
        let store = Arc::clone(&self.store);
        let router = Arc::clone(&self.router);
        let events = Arc::clone(&self.events);
        let per_page = self.config.console.employees_per_page;

        tokio::spawn(async move {
            let result = fetch_view_data(view, gateway.as_ref(), per_page).await;

            // Stale-result guard: only the latest activation may render
            if !router.is_current(generation) {
                debug!(
                    "Dropping stale {} load (generation {})",
                    view.name(),
                    generation
                );
                return;
            }

            match result {
                Ok(Some(data)) => {
                    data.apply(&store);
                    events
                        .publish_lossy(KioskEvent::DataLoaded {
                            view,
                            timestamp: SystemTime::now(),
                        })
                        .await;
                }
                Ok(None) => {}
                Err(e) => {
                    events
                        .publish_lossy(KioskEvent::LoadFailed {
                            view,
                            message: e.to_string(),
                        })
                        .await;
                }
            }
        });
    }

    /// React to reload requests published by workflow successes. Data for an
    /// inactive view is not fetched eagerly; it reloads on next activation.
    pub fn spawn_reload_listener(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let controller = Arc::clone(self);
        let mut receiver = controller.events.subscribe();

        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(KioskEvent::ReloadRequested { view }) => {
                        if controller.router.active() == view {
                            controller.spawn_view_load(view, controller.router.generation());
                        } else {
                            debug!("{} not active, reload deferred to next visit", view.name());
                        }
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Reload listener lagged, {} events skipped", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    // --- camera ---

    pub async fn start_camera(&self) -> std::result::Result<(), CaptureError> {
        let result = self.pipeline.start().await;
        self.publish_camera_state().await;
        result
    }

    pub async fn stop_camera(&self) {
        self.pipeline.stop().await;
        self.publish_camera_state().await;
    }

    async fn publish_camera_state(&self) {
        self.events
            .publish_lossy(KioskEvent::CameraStateChanged {
                state: self.pipeline.state().name().to_string(),
                timestamp: SystemTime::now(),
            })
            .await;
    }

    /// Snapshot the live preview and stage it as the registration photo.
    pub fn capture_registration_photo(&self) -> std::result::Result<(), CaptureError> {
        let image = self.pipeline.snapshot()?;
        self.registration.attach_photo(image);
        Ok(())
    }

    /// Stage a photo from a local file instead of the camera.
    pub fn attach_photo_file<P: AsRef<std::path::Path>>(&self, path: P) -> std::io::Result<()> {
        self.registration.attach_photo(CapturedImage::from_file(path)?);
        Ok(())
    }

    pub fn has_registration_photo(&self) -> bool {
        self.registration.has_photo()
    }

    // --- workflows ---

    pub async fn register(
        &self,
        form: &RegistrationForm,
    ) -> std::result::Result<RegistrationOutcome, WorkflowError> {
        self.registration.submit(form).await
    }

    pub async fn verify(
        &self,
        employee_id: i64,
    ) -> std::result::Result<VerifyResponse, WorkflowError> {
        self.verification.submit(employee_id).await
    }

    /// Record attendance for an employee, typically right after a successful
    /// verification.
    pub async fn check_in(
        &self,
        employee_id: i64,
        verification_method: &str,
    ) -> std::result::Result<Option<AttendanceRecord>, WorkflowError> {
        self.check_in.submit(employee_id, verification_method).await
    }

    pub async fn resolve_alert(
        &self,
        alert_id: i64,
        notes: Option<String>,
        confirmer: &dyn Confirmer,
    ) -> std::result::Result<AlertResolution, WorkflowError> {
        self.alerts.resolve(alert_id, notes, confirmer).await
    }

    /// Ask the service to seed demo records, then refresh the dashboard.
    pub async fn seed_sample_data(
        &self,
        num_employees: u32,
    ) -> std::result::Result<u32, WorkflowError> {
        let response = self
            .gateway
            .generate_sample_data(&SampleDataRequest { num_employees })
            .await
            .map_err(WorkflowError::from)?;

        info!("Seeded {} demo employees", response.employees_created);
        self.events
            .publish_lossy(KioskEvent::ReloadRequested {
                view: ViewId::Dashboard,
            })
            .await;
        Ok(response.employees_created)
    }

    /// Release hardware and announce shutdown.
    pub async fn shutdown(&self, reason: &str) {
        self.pipeline.stop().await;
        self.events
            .publish_lossy(KioskEvent::ShutdownRequested {
                reason: reason.to_string(),
                timestamp: SystemTime::now(),
            })
            .await;
    }
}

fn default_camera_device() -> Arc<dyn CameraDevice> {
    #[cfg(all(feature = "hardware-camera", target_os = "linux"))]
    {
        Arc::new(crate::camera::GstCameraDevice::new())
    }
    #[cfg(not(all(feature = "hardware-camera", target_os = "linux")))]
    {
        Arc::new(crate::camera::MockCameraDevice::new())
    }
}

enum ViewData {
    Dashboard(DashboardStats),
    Employees(EmployeePage),
    Fraud(FraudOverview),
}

impl ViewData {
    fn apply(self, store: &ViewStore) {
        match self {
            ViewData::Dashboard(stats) => store.set_dashboard(stats),
            ViewData::Employees(page) => store.set_employees(page),
            ViewData::Fraud(overview) => store.set_fraud(overview),
        }
    }
}

async fn fetch_view_data(
    view: ViewId,
    gateway: &dyn Gateway,
    per_page: u32,
) -> std::result::Result<Option<ViewData>, ApiError> {
    match view {
        ViewId::Dashboard => Ok(Some(ViewData::Dashboard(gateway.dashboard_stats().await?))),
        ViewId::Employees => Ok(Some(ViewData::Employees(
            gateway.employees(1, per_page).await?,
        ))),
        ViewId::Fraud => {
            let alerts = gateway.fraud_alerts().await?;
            let ghosts = gateway.ghost_workers().await?;
            Ok(Some(ViewData::Fraud(FraudOverview {
                alerts: alerts.alerts,
                ghost_workers: ghosts.ghost_workers,
            })))
        }
        ViewId::Registration | ViewId::Verification => Ok(None),
    }
}
