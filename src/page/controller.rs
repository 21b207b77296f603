use std::sync::Arc;
use std::time::Duration;

use crate::page::alert::{AlertState, Notifier, Severity};
use crate::page::detail::{self, DetailDialog};
use crate::schemas::history::{HistoryDetail, HistoryRecord, ReEvaluateRequest, RecordId};
use crate::schemas::pagination::{HistoryListing, HistoryQuery, PaginationModel};
use crate::services::auth::{AuthSession, CurrentUser};
use crate::services::downloads::{FileSink, DEFAULT_DOWNLOAD_NAME};
use crate::services::history_api::{ClientError, HistoryApi};

pub(crate) const LOGOUT_DELAY: Duration = Duration::from_secs(2);

pub(crate) const SESSION_EXPIRED: &str = "Session expired. Please log in again.";
pub(crate) const LOAD_FAILED: &str = "Failed to load history.";
pub(crate) const DELETE_SUCCEEDED: &str = "Record deleted successfully.";
pub(crate) const DELETE_FAILED: &str = "Failed to delete record.";
pub(crate) const DETAIL_FAILED: &str = "Failed to load record details.";
pub(crate) const DOWNLOAD_FAILED: &str = "Failed to download file.";
pub(crate) const RE_EVALUATE_FAILED: &str = "Failed to re-evaluate submission.";

/// Lifecycle of the list request for the current pagination model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ListPhase {
    Idle,
    Loading,
    Loaded,
    Failed,
}

/// Immutable snapshot handed to the renderer.
#[derive(Debug)]
pub(crate) struct PageView<'a> {
    pub(crate) user: Option<CurrentUser>,
    pub(crate) rows: &'a [HistoryRecord],
    pub(crate) total_rows: u64,
    pub(crate) pagination: PaginationModel,
    pub(crate) loading: bool,
    pub(crate) alert: AlertState,
    pub(crate) pending_delete: Option<&'a RecordId>,
    pub(crate) view_loading: bool,
    pub(crate) detail: Option<DetailDialog>,
}

/// Page-level controller for the evaluation history view.
///
/// Handlers take `&mut self` and await the backend before touching state, so
/// the last response to arrive is the one shown.
pub(crate) struct HistoryPage {
    api: Arc<dyn HistoryApi>,
    session: Arc<dyn AuthSession>,
    sink: Arc<dyn FileSink>,
    pagination: PaginationModel,
    phase: ListPhase,
    records: Vec<HistoryRecord>,
    total_rows: u64,
    alert: Notifier,
    delete_id: Option<RecordId>,
    view_data: Option<HistoryDetail>,
    view_loading: bool,
}

impl HistoryPage {
    pub(crate) fn new(
        api: Arc<dyn HistoryApi>,
        session: Arc<dyn AuthSession>,
        sink: Arc<dyn FileSink>,
        pagination: PaginationModel,
    ) -> Self {
        Self {
            api,
            session,
            sink,
            pagination,
            phase: ListPhase::Idle,
            records: Vec::new(),
            total_rows: 0,
            alert: Notifier::default(),
            delete_id: None,
            view_data: None,
            view_loading: false,
        }
    }

    /// Initial load for the starting pagination model.
    pub(crate) async fn mount(&mut self) {
        self.refresh().await;
    }

    /// Fetches the current page; a page left past the end (e.g. after deleting
    /// its last row) is moved back to the last page and fetched once more.
    pub(crate) async fn refresh(&mut self) {
        let query = self.pagination.query();
        self.fetch_history(query.page, query.limit).await;

        if let Some(clamped) = self.clamped_pagination() {
            tracing::debug!(
                from = self.pagination.page,
                to = clamped.page,
                "Page past the end; moving to the last page"
            );
            self.pagination = clamped;
            let query = clamped.query();
            self.fetch_history(query.page, query.limit).await;
        }
    }

    /// Loads one page of history. `page` is one-based.
    pub(crate) async fn fetch_history(&mut self, page: u32, limit: u32) {
        let query = HistoryQuery { page, limit };

        let loading = PhaseGuard::begin(&mut self.phase);
        let outcome = self.api.list_history(query).await;

        match outcome {
            Ok(listing) => {
                loading.settle(ListPhase::Loaded);
                self.apply_listing(listing, limit);
            }
            Err(err) => {
                loading.settle(ListPhase::Failed);
                self.report_list_failure(&err);
            }
        }
    }

    /// Replaces the pagination model and fetches exactly once.
    pub(crate) async fn on_pagination_model_change(&mut self, model: PaginationModel) {
        self.pagination = model;
        self.refresh().await;
    }

    pub(crate) fn on_delete_click(&mut self, id: RecordId) {
        self.delete_id = Some(id);
    }

    pub(crate) fn cancel_delete(&mut self) {
        self.delete_id = None;
    }

    pub(crate) async fn confirm_delete(&mut self) {
        let Some(id) = self.delete_id.clone() else {
            return;
        };

        let outcome = self.api.delete_history(&id).await;
        self.delete_id = None;

        match outcome {
            Ok(()) => {
                tracing::info!(record_id = %id, "History record deleted");
                if self.view_data.as_ref().is_some_and(|detail| detail.id == id) {
                    self.view_data = None;
                }
                self.alert.show(Severity::Success, DELETE_SUCCEEDED);
                self.refresh().await;
            }
            Err(err) => {
                tracing::warn!(record_id = %id, error = %err, "Failed to delete history record");
                self.alert.show(Severity::Error, DELETE_FAILED);
            }
        }
    }

    pub(crate) async fn on_view_details(&mut self, record: &HistoryRecord) {
        self.view_data = None;
        let outcome = {
            let _busy = BusyFlag::raise(&mut self.view_loading);
            self.api.get_history_detail(&record.id).await
        };

        match outcome {
            Ok(detail) => self.view_data = Some(detail),
            Err(err) => {
                tracing::warn!(
                    record_id = %record.id,
                    error = %err,
                    "Failed to load record details"
                );
                self.alert.show(Severity::Error, DETAIL_FAILED);
            }
        }
    }

    pub(crate) fn close_details(&mut self) {
        self.view_data = None;
    }

    /// Saves a submitted file. Does nothing without a file id.
    pub(crate) async fn download_file(
        &mut self,
        file_id: Option<&str>,
        suggested_name: Option<&str>,
    ) {
        let Some(file_id) = file_id.map(str::trim).filter(|id| !id.is_empty()) else {
            return;
        };
        let name = suggested_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_DOWNLOAD_NAME);

        let payload = match self.api.download_file(file_id).await {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(file_id, error = %err, "Download request failed");
                self.alert.show(Severity::Error, DOWNLOAD_FAILED);
                return;
            }
        };

        match self.sink.save(name, &payload).await {
            Ok(path) => {
                let saved_as = path
                    .file_name()
                    .map(|value| value.to_string_lossy().to_string())
                    .unwrap_or_else(|| name.to_string());
                self.alert.show(Severity::Success, format!("Downloaded {saved_as}."));
            }
            Err(err) => {
                tracing::warn!(file_id, error = %err, "Failed to save download");
                self.alert.show(Severity::Error, DOWNLOAD_FAILED);
            }
        }
    }

    /// Row-level action. Only notifies; grading again runs per student from the
    /// detail dialog.
    pub(crate) fn on_re_evaluate(&mut self, record: &HistoryRecord) {
        self.alert.show(
            Severity::Info,
            format!("Re-evaluation requested for \"{}\".", record.title),
        );
    }

    /// Grades the submitted file of one student in the open detail again, then
    /// reloads the detail so the new score shows. No-op without an open detail
    /// or without a submitted file.
    pub(crate) async fn re_evaluate_student(&mut self, index: usize) {
        let Some(detail) = self.view_data.as_ref() else {
            return;
        };
        let Some(result) = detail.results.get(index) else {
            return;
        };
        let Some(request) = ReEvaluateRequest::for_student(detail, result) else {
            return;
        };
        let student = result.student_name.clone();
        let record_id = detail.id.clone();

        if let Err(err) = self.api.re_evaluate(&request).await {
            tracing::warn!(
                record_id = %record_id,
                file_id = %request.file_id,
                error = %err,
                "Re-evaluation failed"
            );
            self.alert.show(Severity::Error, RE_EVALUATE_FAILED);
            return;
        }

        self.alert.show(Severity::Success, format!("Re-evaluated {student}."));
        match self.api.get_history_detail(&record_id).await {
            Ok(fresh) => {
                if self.view_data.as_ref().is_some_and(|open| open.id == record_id) {
                    self.view_data = Some(fresh);
                }
            }
            Err(err) => {
                tracing::warn!(
                    record_id = %record_id,
                    error = %err,
                    "Failed to reload record after re-evaluation"
                );
            }
        }
    }

    pub(crate) fn dismiss_alert(&mut self) {
        self.alert.dismiss();
    }

    pub(crate) fn pagination(&self) -> PaginationModel {
        self.pagination
    }

    #[cfg(test)]
    pub(crate) fn phase(&self) -> ListPhase {
        self.phase
    }

    pub(crate) fn records(&self) -> &[HistoryRecord] {
        &self.records
    }

    pub(crate) fn total_rows(&self) -> u64 {
        self.total_rows
    }

    #[cfg(test)]
    pub(crate) fn alert(&self) -> AlertState {
        self.alert.state()
    }

    pub(crate) fn delete_id(&self) -> Option<&RecordId> {
        self.delete_id.as_ref()
    }

    #[cfg(test)]
    pub(crate) fn view_data(&self) -> Option<&HistoryDetail> {
        self.view_data.as_ref()
    }

    #[cfg(test)]
    pub(crate) fn is_view_loading(&self) -> bool {
        self.view_loading
    }

    pub(crate) fn view(&self) -> PageView<'_> {
        PageView {
            user: self.session.current_user(),
            rows: &self.records,
            total_rows: self.total_rows,
            pagination: self.pagination,
            loading: self.phase == ListPhase::Loading,
            alert: self.alert.state(),
            pending_delete: self.delete_id.as_ref(),
            view_loading: self.view_loading,
            detail: detail::render(self.view_data.as_ref()),
        }
    }

    fn apply_listing(&mut self, listing: HistoryListing, limit: u32) {
        let HistoryListing { mut records, total } = listing;
        let limit = limit as usize;
        if records.len() > limit {
            tracing::warn!(
                rows = records.len(),
                limit,
                "Backend returned more rows than requested"
            );
            records.truncate(limit);
        }

        self.records = records;
        self.total_rows = total;
    }

    fn clamped_pagination(&self) -> Option<PaginationModel> {
        if self.phase != ListPhase::Loaded || self.total_rows == 0 {
            return None;
        }
        let last = self.pagination.page_count(self.total_rows) - 1;
        (self.pagination.page > last)
            .then(|| PaginationModel::new(last, self.pagination.page_size))
    }

    fn report_list_failure(&mut self, err: &ClientError) {
        if err.is_unauthorized() {
            tracing::warn!("History request was not authenticated; ending session");
            self.alert.show(Severity::Error, SESSION_EXPIRED);
            self.schedule_logout();
            return;
        }

        tracing::error!(error = %err, "Failed to fetch history");
        self.alert.show(Severity::Error, LOAD_FAILED);
    }

    /// Logs out after a pause so the session notice can be read first.
    fn schedule_logout(&self) {
        let session = Arc::clone(&self.session);
        tokio::spawn(async move {
            tokio::time::sleep(LOGOUT_DELAY).await;
            session.logout();
        });
    }
}

/// Holds the list in `Loading` until settled; falls back to `Idle` if the
/// request is abandoned.
struct PhaseGuard<'a> {
    phase: &'a mut ListPhase,
}

impl<'a> PhaseGuard<'a> {
    fn begin(phase: &'a mut ListPhase) -> Self {
        *phase = ListPhase::Loading;
        Self { phase }
    }

    fn settle(self, outcome: ListPhase) {
        *self.phase = outcome;
    }
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        if *self.phase == ListPhase::Loading {
            *self.phase = ListPhase::Idle;
        }
    }
}

/// Raises a flag for its lifetime.
struct BusyFlag<'a>(&'a mut bool);

impl<'a> BusyFlag<'a> {
    fn raise(flag: &'a mut bool) -> Self {
        *flag = true;
        Self(flag)
    }
}

impl Drop for BusyFlag<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}
