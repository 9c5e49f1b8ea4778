//! Helpers shared across integration tests.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use licensy::server::{
    discord::DiscordClient,
    event::{EventDispatcher, EventSink, SinkError},
    model::{
        app::AppState,
        event::{LicenseCreated, LicenseExpired, LicenseRedeemed, LicenseStopped},
    },
};
use licensy_test_utils::prelude::*;

/// Event sink that remembers the key of every license it was told about.
#[derive(Default)]
pub struct RecordingSink {
    pub created: Mutex<Vec<String>>,
    pub redeemed: Mutex<Vec<String>>,
    pub expired: Mutex<Vec<String>>,
    pub stopped: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn created(&self) -> Vec<String> {
        self.created.lock().unwrap().clone()
    }

    pub fn redeemed(&self) -> Vec<String> {
        self.redeemed.lock().unwrap().clone()
    }

    pub fn expired(&self) -> Vec<String> {
        self.expired.lock().unwrap().clone()
    }

    pub fn stopped(&self) -> Vec<String> {
        self.stopped.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn license_created(&self, event: &LicenseCreated) -> Result<(), SinkError> {
        let mut created = self.created.lock().unwrap();
        created.extend(event.licenses.iter().map(|l| l.key.clone()));
        Ok(())
    }

    async fn license_redeemed(&self, event: &LicenseRedeemed) -> Result<(), SinkError> {
        self.redeemed.lock().unwrap().push(event.license.key.clone());
        Ok(())
    }

    async fn license_expired(&self, event: &LicenseExpired) -> Result<(), SinkError> {
        self.expired.lock().unwrap().push(event.license.key.clone());
        Ok(())
    }

    async fn license_stopped(&self, event: &LicenseStopped) -> Result<(), SinkError> {
        self.stopped.lock().unwrap().push(event.license.key.clone());
        Ok(())
    }
}

/// Builds application state against the test database and mock platform, with every
/// lifecycle event captured by the returned sink.
pub fn recording_state(test: &TestContext) -> (AppState, Arc<RecordingSink>) {
    let client = DiscordClient::new(test.api_url(), TEST_BOT_TOKEN).unwrap();

    with_client(test, client)
}

/// Same as [`recording_state`], with platform requests abandoned after `timeout`.
pub fn recording_state_with_timeout(
    test: &TestContext,
    timeout: Duration,
) -> (AppState, Arc<RecordingSink>) {
    let client = DiscordClient::with_timeout(test.api_url(), TEST_BOT_TOKEN, timeout).unwrap();

    with_client(test, client)
}

fn with_client(test: &TestContext, client: DiscordClient) -> (AppState, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    let state = AppState::new(
        test.db.clone(),
        Arc::new(client),
        EventDispatcher::new().with_sink(sink.clone()),
    );

    (state, sink)
}
