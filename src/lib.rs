pub(crate) mod console;
pub(crate) mod core;
pub(crate) mod page;
pub(crate) mod schemas;
pub(crate) mod services;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use crate::console::Console;
use crate::core::{config::Settings, telemetry};
use crate::page::controller::HistoryPage;
use crate::schemas::pagination::PaginationModel;
use crate::services::auth::TokenSession;
use crate::services::downloads::DownloadDirectory;
use crate::services::history_api::HttpHistoryApi;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    telemetry::init_tracing(&settings)?;

    let session = Arc::new(TokenSession::new(settings.auth().token.clone()));
    if settings.auth().token.is_none() {
        tracing::warn!("No API token configured; requests are sent unauthenticated");
    }
    let logged_out = session.subscribe();

    let api = HttpHistoryApi::from_settings(&settings, session.clone())?;
    let sink = DownloadDirectory::from_settings(&settings);
    let page = HistoryPage::new(
        Arc::new(api),
        session,
        Arc::new(sink),
        PaginationModel::new(0, settings.paging().page_size),
    );

    tracing::info!(
        base_url = %settings.api().base_url,
        download_dir = %settings.downloads().directory,
        environment = %settings.runtime().environment.as_str(),
        "Grading history console starting"
    );

    let input = tokio::io::BufReader::new(tokio::io::stdin());
    Console::new(page, settings.paging().page_size_options.clone()).run(input, logged_out).await
}
