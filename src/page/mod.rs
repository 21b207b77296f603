pub(crate) mod alert;
pub(crate) mod controller;
pub(crate) mod detail;
