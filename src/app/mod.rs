use chrono::Local;
use color_eyre::Result;
use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::config::Settings;
use crate::pipeline::{FetchOutcome, FetchRequest, fetch_aggregated};
use crate::request::OkxClient;
use crate::store::FilterStore;
use crate::ui::TuiApp;

#[derive(Debug, Clone)]
pub struct App {
    settings: Settings,
}

impl App {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    pub async fn run(&self) -> Result<()> {
        let client = OkxClient::new(
            self.settings.base_url.as_str(),
            self.settings.credentials.clone(),
        );
        let store = FilterStore::open(&self.settings.state_path);

        // UI -> fetch manager
        let (request_tx, request_rx) = mpsc::unbounded_channel::<FetchRequest>();
        // fetch manager -> UI
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel::<FetchOutcome>();

        let fetch_manager = tokio::spawn(run_fetch_manager(client, request_rx, outcome_tx));

        let ui_task = tokio::task::spawn_blocking(move || {
            let terminal = ratatui::init();
            let app = TuiApp::new(store, request_tx);
            let app_result = app.run(terminal, outcome_rx);
            ratatui::restore();
            app_result
        });

        // Wait for UI to finish (user quits)
        let ui_result = ui_task.await;

        fetch_manager.abort();
        info!("Dashboard closed");

        ui_result?
    }
}

/// Runs one fetch per request. A new request aborts whatever is still in
/// flight, so at most one fetch runs at a time.
pub async fn run_fetch_manager(
    client: OkxClient,
    mut requests: mpsc::UnboundedReceiver<FetchRequest>,
    outcomes: mpsc::UnboundedSender<FetchOutcome>,
) {
    let mut join_set = JoinSet::new();

    loop {
        tokio::select! {
            Some(request) = requests.recv() => {
                if !join_set.is_empty() {
                    debug!("Aborting superseded fetch before generation {}", request.generation);
                    join_set.abort_all();
                    while let Some(result) = join_set.join_next().await {
                        debug!("Drained fetch task: cancelled={}", result.is_err());
                    }
                }

                let client = client.clone();
                let outcomes = outcomes.clone();
                join_set.spawn(async move {
                    let result = fetch_aggregated(&client, &request.key, &Local).await;
                    if outcomes
                        .send(FetchOutcome { generation: request.generation, result })
                        .is_err()
                    {
                        warn!("UI gone, dropping outcome {}", request.generation);
                    }
                });
            }
            Some(_) = join_set.join_next() => {}
            else => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credentials;
    use crate::data::{Exchange, QueryParams};
    use crate::request::FetchError;

    #[tokio::test]
    async fn test_fetch_manager_reports_outcome_with_generation() {
        let client = OkxClient::new("http://127.0.0.1:9", Credentials::default());
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel();
        let manager = tokio::spawn(run_fetch_manager(client, request_rx, outcome_tx));

        let mut params = QueryParams::default();
        params.exchange = Exchange::Binance;
        request_tx
            .send(FetchRequest {
                generation: 7,
                key: params.fetch_key(),
            })
            .unwrap();

        let outcome = outcome_rx.recv().await.unwrap();
        assert_eq!(outcome.generation, 7);
        assert!(matches!(
            outcome.result,
            Err(FetchError::UnsupportedExchange(Exchange::Binance))
        ));

        drop(request_tx);
        manager.await.unwrap();
    }
}
