pub(crate) mod auth;
pub(crate) mod downloads;
pub(crate) mod history_api;
