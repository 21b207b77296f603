pub(crate) mod history;
pub(crate) mod pagination;

use serde::Deserialize;

use self::pagination::PaginationInfo;

/// Response wrapper shared by the history endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub(crate) success: Option<bool>,
    pub(crate) data: Option<T>,
    pub(crate) pagination: Option<PaginationInfo>,
    pub(crate) error: Option<String>,
    pub(crate) message: Option<String>,
}

impl<T> Envelope<T> {
    /// Stand-in for a success response without a body.
    pub(crate) fn empty() -> Self {
        Self { success: None, data: None, pagination: None, error: None, message: None }
    }

    pub(crate) fn rejected(&self) -> bool {
        self.success == Some(false)
    }

    pub(crate) fn failure_message(&self) -> String {
        self.error
            .as_deref()
            .or(self.message.as_deref())
            .unwrap_or("request was not successful")
            .to_string()
    }
}
