use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use async_trait::async_trait;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::schemas::history::{
    Category, HistoryDetail, HistoryRecord, QuestionDetail, ReEvaluateRequest, RecordId,
    StudentResult,
};
use crate::schemas::pagination::{HistoryListing, HistoryQuery};
use crate::services::auth::{AuthSession, CurrentUser};
use crate::services::downloads::{FileSink, SinkError};
use crate::services::history_api::{ClientError, HistoryApi};

const HISTORY_ENV_VARS: &[&str] = &[
    "ENVIRONMENT",
    "HISTORY_STRICT_CONFIG",
    "HISTORY_API_BASE_URL",
    "HISTORY_API_TOKEN",
    "HISTORY_TOKEN_FILE",
    "HISTORY_REQUEST_TIMEOUT_SECONDS",
    "HISTORY_DOWNLOAD_PATH",
    "HISTORY_DOWNLOAD_DIR",
    "HISTORY_PAGE_SIZE",
    "HISTORY_PAGE_SIZE_OPTIONS",
    "HISTORY_LOG_LEVEL",
    "HISTORY_LOG_JSON",
];

pub(crate) async fn env_lock() -> OwnedMutexGuard<()> {
    static LOCK: OnceLock<Arc<AsyncMutex<()>>> = OnceLock::new();
    let lock = LOCK.get_or_init(|| Arc::new(AsyncMutex::new(()))).clone();
    lock.lock_owned().await
}

pub(crate) fn set_test_env() {
    for key in HISTORY_ENV_VARS {
        std::env::remove_var(key);
    }
    std::env::set_var("HISTORY_ENV", "test");
}

pub(crate) fn session_token(subject: &str, email: Option<&str>) -> String {
    let mut claims = json!({ "sub": subject, "exp": 4_102_444_800_u64 });
    if let Some(email) = email {
        claims["email"] = json!(email);
    }
    encode(&Header::default(), &claims, &EncodingKey::from_secret(b"test-secret"))
        .expect("encode token")
}

pub(crate) fn record(id: i64, title: &str) -> HistoryRecord {
    HistoryRecord {
        id: RecordId::Number(id),
        title: title.to_string(),
        category: Category::Ppt,
        created_at: Some("2025-01-02T10:20:30Z".to_string()),
        description: None,
    }
}

pub(crate) fn records(count: usize) -> Vec<HistoryRecord> {
    (1..=count).map(|n| record(n as i64, &format!("Run {n}"))).collect()
}

pub(crate) fn sample_detail(id: i64, title: &str) -> HistoryDetail {
    HistoryDetail {
        id: RecordId::Number(id),
        title: title.to_string(),
        description: "Answer every question.".to_string(),
        category: Category::Ppt,
        results: vec![
            StudentResult {
                student_name: "Ana".to_string(),
                score_percent: 80.0,
                reasoning: "Clear slides".to_string(),
                file_id: Some("file-ana".to_string()),
                filename: Some("ana.pptx".to_string()),
                details: vec![
                    QuestionDetail {
                        question: "What is 2 + 2?".to_string(),
                        student_answer: Some("4".to_string()),
                        feedback: "Correct".to_string(),
                        is_correct: true,
                    },
                    QuestionDetail {
                        question: "Name a prime above 10.".to_string(),
                        student_answer: Some("12".to_string()),
                        feedback: "12 is not prime".to_string(),
                        is_correct: false,
                    },
                ],
            },
            StudentResult {
                student_name: "Ben".to_string(),
                score_percent: 35.0,
                reasoning: "Incomplete".to_string(),
                file_id: None,
                filename: None,
                details: vec![QuestionDetail {
                    question: "What is 2 + 2?".to_string(),
                    student_answer: None,
                    feedback: "No answer".to_string(),
                    is_correct: false,
                }],
            },
        ],
    }
}

/// Session with a fixed token that counts logout calls.
pub(crate) struct StaticSession {
    token: Option<String>,
    logouts: AtomicUsize,
}

impl StaticSession {
    pub(crate) fn new(token: Option<&str>) -> Self {
        Self { token: token.map(ToString::to_string), logouts: AtomicUsize::new(0) }
    }

    pub(crate) fn logouts(&self) -> usize {
        self.logouts.load(Ordering::SeqCst)
    }
}

impl AuthSession for StaticSession {
    fn token(&self) -> Option<String> {
        self.token.clone()
    }

    fn current_user(&self) -> Option<CurrentUser> {
        self.token.as_ref().map(|_| CurrentUser {
            subject: "1".to_string(),
            display_name: Some("teacher@example.com".to_string()),
        })
    }

    fn logout(&self) {
        self.logouts.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ApiCall {
    List(HistoryQuery),
    Detail(RecordId),
    Delete(RecordId),
    Download(String),
    ReEvaluate(ReEvaluateRequest),
}

#[derive(Default)]
struct FakeState {
    calls: Vec<ApiCall>,
    lists: VecDeque<Result<HistoryListing, ClientError>>,
    details: VecDeque<Result<HistoryDetail, ClientError>>,
    deletes: VecDeque<Result<(), ClientError>>,
    downloads: VecDeque<Result<Vec<u8>, ClientError>>,
    re_evaluations: VecDeque<Result<(), ClientError>>,
}

/// Scripted backend. Unscripted calls succeed with empty results.
#[derive(Default)]
pub(crate) struct FakeHistoryApi {
    state: Mutex<FakeState>,
    stall_details: bool,
}

impl FakeHistoryApi {
    pub(crate) fn stalling_details() -> Self {
        Self { stall_details: true, ..Self::default() }
    }

    pub(crate) fn push_list(&self, outcome: Result<HistoryListing, ClientError>) {
        self.lock().lists.push_back(outcome);
    }

    pub(crate) fn push_detail(&self, outcome: Result<HistoryDetail, ClientError>) {
        self.lock().details.push_back(outcome);
    }

    pub(crate) fn push_delete(&self, outcome: Result<(), ClientError>) {
        self.lock().deletes.push_back(outcome);
    }

    pub(crate) fn push_download(&self, outcome: Result<Vec<u8>, ClientError>) {
        self.lock().downloads.push_back(outcome);
    }

    pub(crate) fn push_re_evaluate(&self, outcome: Result<(), ClientError>) {
        self.lock().re_evaluations.push_back(outcome);
    }

    pub(crate) fn calls(&self) -> Vec<ApiCall> {
        self.lock().calls.clone()
    }

    pub(crate) fn list_calls(&self) -> Vec<HistoryQuery> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ApiCall::List(query) => Some(query),
                _ => None,
            })
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake api state")
    }
}

#[async_trait]
impl HistoryApi for FakeHistoryApi {
    async fn list_history(&self, query: HistoryQuery) -> Result<HistoryListing, ClientError> {
        let mut state = self.lock();
        state.calls.push(ApiCall::List(query));
        state
            .lists
            .pop_front()
            .unwrap_or_else(|| Ok(HistoryListing { records: Vec::new(), total: 0 }))
    }

    async fn get_history_detail(&self, id: &RecordId) -> Result<HistoryDetail, ClientError> {
        let scripted = {
            let mut state = self.lock();
            state.calls.push(ApiCall::Detail(id.clone()));
            state.details.pop_front()
        };
        if self.stall_details {
            std::future::pending::<()>().await;
        }
        scripted.unwrap_or_else(|| Ok(sample_detail(0, "Unscripted")))
    }

    async fn delete_history(&self, id: &RecordId) -> Result<(), ClientError> {
        let mut state = self.lock();
        state.calls.push(ApiCall::Delete(id.clone()));
        state.deletes.pop_front().unwrap_or(Ok(()))
    }

    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>, ClientError> {
        let mut state = self.lock();
        state.calls.push(ApiCall::Download(file_id.to_string()));
        state.downloads.pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn re_evaluate(&self, request: &ReEvaluateRequest) -> Result<(), ClientError> {
        let mut state = self.lock();
        state.calls.push(ApiCall::ReEvaluate(request.clone()));
        state.re_evaluations.pop_front().unwrap_or(Ok(()))
    }
}

/// In-memory download target.
#[derive(Default)]
pub(crate) struct MemorySink {
    saved: Mutex<Vec<(String, Vec<u8>)>>,
    fail: bool,
}

impl MemorySink {
    pub(crate) fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    pub(crate) fn saved(&self) -> Vec<(String, Vec<u8>)> {
        self.saved.lock().expect("sink state").clone()
    }
}

#[async_trait]
impl FileSink for MemorySink {
    async fn save(&self, suggested_name: &str, payload: &[u8]) -> Result<PathBuf, SinkError> {
        if self.fail {
            return Err(SinkError::Io(std::io::Error::other("disk full")));
        }
        let mut saved = self.saved.lock().expect("sink state");
        saved.push((suggested_name.to_string(), payload.to_vec()));
        Ok(PathBuf::from("/downloads").join(suggested_name))
    }
}
