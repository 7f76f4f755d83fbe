use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use shared::{
    domain::{FilterSelection, MonthKey},
    protocol::{
        DatasetRow, InputMonthRequest, InputMonthResponse, InputRow, ScoreRow, SeedRequest,
    },
};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::{
    cache::ViewCache,
    controller::{
        events::{DashboardEvent, UiError, UiErrorContext},
        reducer::{reduce, DashboardState, MutationKind},
    },
    derive::{distinct_kams, distinct_months},
    store::RecordStore,
    ScoringService, ServiceError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    State,
    Scores,
    Dataset,
    Inputs,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::State,
        Collection::Scores,
        Collection::Dataset,
        Collection::Inputs,
    ];
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::State => "state",
            Self::Scores => "scores",
            Self::Dataset => "dataset",
            Self::Inputs => "inputs",
        })
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("select a KAM before submitting achievements")]
    NoIdentitySelected,
    #[error("another update is still in progress")]
    Busy,
    #[error("invalid achievement entry: {0}")]
    InvalidForm(String),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl SyncError {
    pub fn user_message(&self) -> String {
        match self {
            Self::Service(err) => err.user_message(),
            other => other.to_string(),
        }
    }
}

/// One month of manually entered achievements; the KAM comes from the
/// signed-in identity.
#[derive(Debug, Clone, PartialEq)]
pub struct AchievementForm {
    pub month: MonthKey,
    pub new_projects: u32,
    pub added_pp: f64,
    pub added_lvp: f64,
    pub avg_sop_month: u32,
    pub foc_ratio_pp: f64,
    pub foc_ratio_lvp: f64,
}

impl AchievementForm {
    pub fn new(month: MonthKey, added_pp: f64, added_lvp: f64) -> Self {
        Self {
            month,
            new_projects: 2,
            added_pp,
            added_lvp,
            avg_sop_month: 6,
            foc_ratio_pp: 0.5,
            foc_ratio_lvp: 0.7,
        }
    }

    pub fn into_request(self, kam_name: String) -> Result<InputMonthRequest, SyncError> {
        for (field, value) in [
            ("added_pp", self.added_pp),
            ("added_lvp", self.added_lvp),
            ("foc_ratio_pp", self.foc_ratio_pp),
            ("foc_ratio_lvp", self.foc_ratio_lvp),
        ] {
            if !value.is_finite() {
                return Err(SyncError::InvalidForm(format!(
                    "{field} must be a finite number"
                )));
            }
        }

        let month = self
            .month
            .first_day()
            .ok_or_else(|| SyncError::InvalidForm(format!("month {} has no first day", self.month)))?;
        Ok(InputMonthRequest {
            kam_name,
            month,
            new_projects: self.new_projects,
            added_pp: self.added_pp,
            added_lvp: self.added_lvp,
            avg_sop_month: self.avg_sop_month,
            foc_ratio_pp: self.foc_ratio_pp,
            foc_ratio_lvp: self.foc_ratio_lvp,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub refreshed: Vec<Collection>,
    pub failures: Vec<(Collection, String)>,
}

impl RefreshReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub response: InputMonthResponse,
    pub refresh: RefreshReport,
}

/// Releases the in-flight flag on every exit path.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Orchestrates fetches and mutations against the scoring service and owns
/// the record store plus the dashboard state.
pub struct SyncController {
    service: Arc<dyn ScoringService>,
    store: RwLock<RecordStore>,
    ui: Mutex<DashboardState>,
    in_flight: AtomicBool,
    scores_view: Mutex<ViewCache<ScoreRow>>,
    dataset_view: Mutex<ViewCache<DatasetRow>>,
    inputs_view: Mutex<ViewCache<InputRow>>,
}

impl SyncController {
    pub fn new(service: Arc<dyn ScoringService>) -> Self {
        Self {
            service,
            store: RwLock::new(RecordStore::new()),
            ui: Mutex::new(DashboardState::default()),
            in_flight: AtomicBool::new(false),
            scores_view: Mutex::new(ViewCache::new()),
            dataset_view: Mutex::new(ViewCache::new()),
            inputs_view: Mutex::new(ViewCache::new()),
        }
    }

    pub fn service(&self) -> Arc<dyn ScoringService> {
        Arc::clone(&self.service)
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn try_begin(&self) -> Option<InFlightGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard(&self.in_flight))
    }

    async fn apply(&self, event: DashboardEvent) {
        let mut ui = self.ui.lock().await;
        *ui = reduce(std::mem::take(&mut *ui), event);
    }

    pub async fn ui_state(&self) -> DashboardState {
        self.ui.lock().await.clone()
    }

    /// Cheap copy of every slot; later refreshes do not affect it.
    pub async fn snapshot(&self) -> RecordStore {
        self.store.read().await.clone()
    }

    pub async fn select_identity(&self, identity: Option<String>) {
        self.apply(DashboardEvent::IdentitySelected(identity)).await;
    }

    pub async fn set_dataset_filter(&self, selection: FilterSelection) {
        self.apply(DashboardEvent::DatasetFilterChanged(selection))
            .await;
    }

    pub async fn set_inputs_filter(&self, selection: FilterSelection) {
        self.apply(DashboardEvent::InputsFilterChanged(selection))
            .await;
    }

    pub async fn load_state(&self) -> Result<(), ServiceError> {
        let state = match self.service.fetch_state().await {
            Ok(state) => state,
            Err(err) => {
                warn!(error = %err, "failed to load state");
                return Err(err);
            }
        };
        let kams = state.kams.len();
        let revision = self.store.write().await.replace_state(state);
        info!(revision, kams, "state refreshed");
        Ok(())
    }

    pub async fn load_scores(&self) -> Result<(), ServiceError> {
        let scores = match self.service.fetch_scores().await {
            Ok(scores) => scores,
            Err(err) => {
                warn!(error = %err, "failed to load scores");
                return Err(err);
            }
        };
        let rows = scores.monthly.len();
        let revision = self.store.write().await.replace_scores(scores);
        info!(revision, rows, "scores refreshed");
        Ok(())
    }

    pub async fn load_dataset(&self) -> Result<(), ServiceError> {
        let response = match self.service.fetch_dataset().await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "failed to load dataset");
                return Err(err);
            }
        };
        if response.count != response.rows.len() {
            debug!(
                count = response.count,
                rows = response.rows.len(),
                "dataset count disagrees with row total"
            );
        }
        let rows = response.rows.len();
        let revision = self.store.write().await.replace_dataset(response.rows);
        info!(revision, rows, "dataset refreshed");
        Ok(())
    }

    pub async fn load_inputs(&self) -> Result<(), ServiceError> {
        let response = match self.service.fetch_inputs().await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "failed to load inputs");
                return Err(err);
            }
        };
        if response.count != response.rows.len() {
            debug!(
                count = response.count,
                rows = response.rows.len(),
                "inputs count disagrees with row total"
            );
        }
        let rows = response.rows.len();
        let revision = self.store.write().await.replace_inputs(response.rows);
        info!(revision, rows, "inputs refreshed");
        Ok(())
    }

    pub async fn load(&self, collection: Collection) -> Result<(), ServiceError> {
        match collection {
            Collection::State => self.load_state().await,
            Collection::Scores => self.load_scores().await,
            Collection::Dataset => self.load_dataset().await,
            Collection::Inputs => self.load_inputs().await,
        }
    }

    /// Loads each collection in order. Failures are recorded and skipped;
    /// they never undo collections already refreshed.
    pub async fn refresh(&self, collections: &[Collection]) -> RefreshReport {
        let mut report = RefreshReport::default();
        for &collection in collections {
            match self.load(collection).await {
                Ok(()) => report.refreshed.push(collection),
                Err(err) => report.failures.push((collection, err.user_message())),
            }
        }
        report
    }

    pub async fn refresh_all(&self) -> RefreshReport {
        self.refresh(&Collection::ALL).await
    }

    /// Records one month of achievements for the signed-in KAM, then reloads
    /// scores, inputs and dataset.
    pub async fn submit_achievements(
        &self,
        form: AchievementForm,
    ) -> Result<SubmitOutcome, SyncError> {
        let identity = self.ui.lock().await.identity.clone();
        let Some(kam_name) = identity else {
            let err = SyncError::NoIdentitySelected;
            self.apply(DashboardEvent::ActionRejected(UiError::from_sync(
                UiErrorContext::SubmitAchievements,
                &err,
            )))
            .await;
            return Err(err);
        };

        let month = form.month.clone();
        let request = match form.into_request(kam_name) {
            Ok(request) => request,
            Err(err) => {
                self.apply(DashboardEvent::ActionRejected(UiError::from_sync(
                    UiErrorContext::SubmitAchievements,
                    &err,
                )))
                .await;
                return Err(err);
            }
        };

        let Some(_guard) = self.try_begin() else {
            debug!(kam = %request.kam_name, "submit ignored while another update is in flight");
            return Err(SyncError::Busy);
        };

        let kind = MutationKind::SubmitAchievements;
        self.apply(DashboardEvent::MutationStarted(kind)).await;

        info!(kam = %request.kam_name, month = %request.month, "submitting month achievements");
        let response = match self.service.submit_input_month(&request).await {
            Ok(response) => response,
            Err(err) => {
                let err = SyncError::from(err);
                self.fail(kind, UiErrorContext::SubmitAchievements, &err)
                    .await;
                return Err(err);
            }
        };

        let refresh = self
            .refresh(&[Collection::Scores, Collection::Inputs, Collection::Dataset])
            .await;
        let notice = with_refresh_warning(
            format!(
                "Saved {} project(s) for {} in {}",
                response.projects_created,
                request.kam_name, month
            ),
            &refresh,
        );
        self.apply(DashboardEvent::MutationSucceeded { kind, notice })
            .await;

        Ok(SubmitOutcome { response, refresh })
    }

    /// Regenerates the synthetic dataset server-side, then reloads scores and state.
    pub async fn seed_demo(&self, request: SeedRequest) -> Result<RefreshReport, SyncError> {
        let Some(_guard) = self.try_begin() else {
            debug!("seed ignored while another update is in flight");
            return Err(SyncError::Busy);
        };

        let kind = MutationKind::Seed;
        self.apply(DashboardEvent::MutationStarted(kind)).await;

        info!(
            start_month = %request.start_month,
            months = request.months,
            kams = request.kam_names.len(),
            random_seed = request.random_seed,
            "seeding demo data"
        );
        if let Err(err) = self.service.seed(&request).await {
            let err = SyncError::from(err);
            self.fail(kind, UiErrorContext::Seed, &err).await;
            return Err(err);
        }

        let refresh = self.refresh(&[Collection::Scores, Collection::State]).await;
        let notice = with_refresh_warning("Demo data generated".to_string(), &refresh);
        self.apply(DashboardEvent::MutationSucceeded { kind, notice })
            .await;

        Ok(refresh)
    }

    async fn fail(&self, kind: MutationKind, context: UiErrorContext, err: &SyncError) {
        warn!(error = %err, ?kind, "mutation failed");
        self.apply(DashboardEvent::MutationFailed {
            kind,
            error: UiError::from_sync(context, err),
        })
        .await;
    }

    /// Identity choices for local sign-in, from the last `/state` snapshot.
    pub async fn kam_options(&self) -> Vec<String> {
        self.store
            .read()
            .await
            .state()
            .map(|state| state.data().kam_names())
            .unwrap_or_default()
    }

    pub async fn scores_view(&self, selection: &FilterSelection) -> Arc<Vec<ScoreRow>> {
        let store = self.store.read().await;
        let source = store
            .scores()
            .map(|snapshot| (snapshot.revision(), snapshot.data().monthly.as_slice()));
        self.scores_view.lock().await.view(source, selection)
    }

    /// Dataset rows under the dataset table's current filter.
    pub async fn dataset_view(&self) -> Arc<Vec<DatasetRow>> {
        let selection = self.ui.lock().await.dataset_filter.clone();
        let store = self.store.read().await;
        let source = store
            .dataset()
            .map(|snapshot| (snapshot.revision(), snapshot.data().as_slice()));
        self.dataset_view.lock().await.view(source, &selection)
    }

    /// Input rows under the inputs table's current filter.
    pub async fn inputs_view(&self) -> Arc<Vec<InputRow>> {
        let selection = self.ui.lock().await.inputs_filter.clone();
        let store = self.store.read().await;
        let source = store
            .inputs()
            .map(|snapshot| (snapshot.revision(), snapshot.data().as_slice()));
        self.inputs_view.lock().await.view(source, &selection)
    }

    /// Filter choices (KAMs, months) offered by the dataset table.
    pub async fn dataset_domains(&self) -> (Vec<String>, Vec<MonthKey>) {
        let store = self.store.read().await;
        let rows = store.dataset_rows();
        (distinct_kams(rows), distinct_months(rows))
    }

    /// Filter choices (KAMs, months) offered by the inputs table.
    pub async fn inputs_domains(&self) -> (Vec<String>, Vec<MonthKey>) {
        let store = self.store.read().await;
        let rows = store.input_rows();
        (distinct_kams(rows), distinct_months(rows))
    }
}

fn with_refresh_warning(notice: String, refresh: &RefreshReport) -> String {
    if refresh.is_complete() {
        return notice;
    }
    let stale: Vec<String> = refresh
        .failures
        .iter()
        .map(|(collection, _)| collection.to_string())
        .collect();
    format!("{notice}; could not refresh {}", stale.join(", "))
}

#[cfg(test)]
#[path = "tests/sync_tests.rs"]
mod tests;
