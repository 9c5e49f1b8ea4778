//! Tests for one reconciler tick over the database and the mocked guild platform.
//!
//! These verify that exactly the entries at or past their deadline are retired, that
//! entries whose guild or member is gone are deleted without side effects, and that a
//! failed entry stays in place for the next tick.

use std::time::Duration;

use entity::prelude::{License, LicenseBan, Premium};
use licensy::server::{
    error::{license::LicenseError, Error},
    scheduler::Reconciler,
    util::time::now_ms,
};
use licensy_test_utils::prelude::*;
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::json;

use crate::util::{recording_state, recording_state_with_timeout};

/// Tests that a tick retires licenses at or before its reference time and nothing else.
///
/// Two active licenses are at `now - 1000` and `now`, a third at `now + 5000`. Both expired
/// licenses belong to a member still in the guild, so each is announced, messaged, and
/// has its role removed before deletion.
///
/// Expected: Ok with 2 licenses retired, 1 expired event each, and the live license kept
#[tokio::test]
async fn retires_exactly_the_expired_licenses() -> Result<(), TestError> {
    let now = now_ms();
    let mut test = TestBuilder::new()
        .with_license_tables()
        .with_guild_endpoint(TEST_GUILD_ID, true, 2)
        .with_member_endpoint(TEST_GUILD_ID, TEST_REDEEMER_ID, true, 2)
        .with_role_revoke_endpoint(TEST_GUILD_ID, TEST_REDEEMER_ID, TEST_ROLE_ID, 2)
        .with_direct_message_endpoints(2)
        .build()
        .await?;

    test.license()
        .insert_active(TEST_GUILD_ID, "PAST", TEST_REDEEMER_ID, now - 1000)
        .await?;
    test.license()
        .insert_active(TEST_GUILD_ID, "EDGE", TEST_REDEEMER_ID, now)
        .await?;
    test.license()
        .insert_active(TEST_GUILD_ID, "LIVE", TEST_REDEEMER_ID, now + 5000)
        .await?;

    let (state, sink) = recording_state(&test);
    let report = Reconciler::from_state(&state).tick_at(now).await;

    let licenses = report
        .and_then(|r| r.get("licenses"))
        .expect("License sweep should have run");
    assert_eq!(licenses.examined, 2);
    assert_eq!(licenses.retired, 2);
    assert_eq!(licenses.failed, 0);

    let mut expired = sink.expired();
    expired.sort();
    assert_eq!(expired, vec!["EDGE".to_string(), "PAST".to_string()]);

    let remaining = License::find().all(&test.db).await?;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].key, "LIVE");

    test.assert_mocks();

    Ok(())
}

/// Tests that expired licenses in a guild the bot left are deleted silently.
///
/// Expected: Ok with the license orphaned, no event, and no role or DM request
#[tokio::test]
async fn deletes_license_of_missing_guild() -> Result<(), TestError> {
    let now = now_ms();
    let mut test = TestBuilder::new()
        .with_license_tables()
        .with_guild_endpoint(TEST_GUILD_ID, false, 1)
        .build()
        .await?;

    test.license()
        .insert_active(TEST_GUILD_ID, "GONE", TEST_REDEEMER_ID, now - 1)
        .await?;

    let (state, sink) = recording_state(&test);
    let report = Reconciler::from_state(&state).tick_at(now).await;

    let licenses = report.and_then(|r| r.get("licenses")).unwrap();
    assert_eq!(licenses.orphaned, 1);
    assert_eq!(licenses.retired, 0);
    assert!(sink.expired().is_empty());
    assert_eq!(License::find().count(&test.db).await?, 0);

    test.assert_mocks();

    Ok(())
}

/// Tests that an expired license whose redeemer left the guild is deleted silently.
///
/// Expected: Ok with the license orphaned and no role removal attempted
#[tokio::test]
async fn deletes_license_of_missing_member() -> Result<(), TestError> {
    let now = now_ms();
    let mut test = TestBuilder::new()
        .with_license_tables()
        .with_guild_endpoint(TEST_GUILD_ID, true, 1)
        .with_member_endpoint(TEST_GUILD_ID, TEST_REDEEMER_ID, false, 1)
        .build()
        .await?;

    test.license()
        .insert_active(TEST_GUILD_ID, "LEFT", TEST_REDEEMER_ID, now - 1)
        .await?;

    let (state, sink) = recording_state(&test);
    let report = Reconciler::from_state(&state).tick_at(now).await;

    let licenses = report.and_then(|r| r.get("licenses")).unwrap();
    assert_eq!(licenses.orphaned, 1);
    assert!(sink.expired().is_empty());
    assert_eq!(License::find().count(&test.db).await?, 0);

    test.assert_mocks();

    Ok(())
}

/// Tests that a license is kept when the platform fails with a transient error.
///
/// No guild endpoint is mocked, so the lookup answers with a server error.
///
/// Expected: Ok with the license counted as failed and still stored
#[tokio::test]
async fn keeps_license_after_transient_failure() -> Result<(), TestError> {
    let now = now_ms();
    let mut test = TestBuilder::new().with_license_tables().build().await?;

    test.license()
        .insert_active(TEST_GUILD_ID, "RETRY", TEST_REDEEMER_ID, now - 1)
        .await?;

    let (state, _sink) = recording_state(&test);
    let report = Reconciler::from_state(&state).tick_at(now).await;

    let licenses = report.and_then(|r| r.get("licenses")).unwrap();
    assert_eq!(licenses.examined, 1);
    assert_eq!(licenses.failed, 1);
    assert_eq!(License::find().count(&test.db).await?, 1);

    Ok(())
}

/// Tests that a 404 from an unknown route is not mistaken for a guild the bot left.
///
/// The guild lookup answers 404 with the generic `code: 0` body instead of the unknown
/// guild code, as a misrouted request would.
///
/// Expected: Ok with the license counted as failed, still stored, and no event emitted
#[tokio::test]
async fn keeps_license_after_unknown_route() -> Result<(), TestError> {
    let now = now_ms();
    let mut test = TestBuilder::new()
        .with_license_tables()
        .with_mock_endpoint(move |server| {
            server
                .mock("GET", format!("/guilds/{}", TEST_GUILD_ID).as_str())
                .with_status(404)
                .with_header("content-type", "application/json")
                .with_body(json!({ "message": "404: Not Found", "code": 0 }).to_string())
                .expect(1)
                .create()
        })
        .build()
        .await?;

    test.license()
        .insert_active(TEST_GUILD_ID, "ROUTE", TEST_REDEEMER_ID, now - 1)
        .await?;

    let (state, sink) = recording_state(&test);
    let report = Reconciler::from_state(&state).tick_at(now).await;

    let licenses = report.and_then(|r| r.get("licenses")).unwrap();
    assert_eq!(licenses.orphaned, 0);
    assert_eq!(licenses.failed, 1);
    assert!(sink.expired().is_empty());
    assert_eq!(License::find().count(&test.db).await?, 1);

    test.assert_mocks();

    Ok(())
}

/// Tests that a hung platform call fails the entry instead of stalling the reconciler.
///
/// The guild lookup takes longer than the client timeout on the first tick. A second tick
/// must still run rather than be skipped as overlapping.
///
/// Expected: Ok with the license failed on the first tick and both ticks reporting
#[tokio::test]
async fn hung_request_does_not_stall_ticks() -> Result<(), TestError> {
    let now = now_ms();
    let mut test = TestBuilder::new()
        .with_license_tables()
        .with_mock_endpoint(move |server| {
            server
                .mock("GET", format!("/guilds/{}", TEST_GUILD_ID).as_str())
                .with_status(200)
                .with_body_from_request(|_| {
                    std::thread::sleep(Duration::from_millis(500));
                    b"{}".to_vec()
                })
                .create()
        })
        .build()
        .await?;

    test.license()
        .insert_active(TEST_GUILD_ID, "HUNG", TEST_REDEEMER_ID, now - 1)
        .await?;

    let (state, _sink) = recording_state_with_timeout(&test, Duration::from_millis(50));
    let reconciler = Reconciler::from_state(&state);

    let first = reconciler.tick_at(now).await;
    let licenses = first.and_then(|r| r.get("licenses")).unwrap();
    assert_eq!(licenses.failed, 1);

    let second = reconciler.tick_at(now).await;
    assert!(second.is_some());
    assert_eq!(License::find().count(&test.db).await?, 1);

    Ok(())
}

/// Tests that stopping a license and then ticking does not retire it a second time.
///
/// Expected: Ok with the stop applied once and the tick examining nothing
#[tokio::test]
async fn stopped_license_is_not_swept() -> Result<(), TestError> {
    let now = now_ms();
    let mut test = TestBuilder::new()
        .with_license_tables()
        .with_guild_endpoint(TEST_GUILD_ID, true, 1)
        .with_member_endpoint(TEST_GUILD_ID, TEST_REDEEMER_ID, true, 1)
        .with_role_revoke_endpoint(TEST_GUILD_ID, TEST_REDEEMER_ID, TEST_ROLE_ID, 1)
        .build()
        .await?;

    test.license()
        .insert_active(TEST_GUILD_ID, "STOP", TEST_REDEEMER_ID, now - 1)
        .await?;

    let (state, sink) = recording_state(&test);
    state
        .licenses()
        .stop(TEST_GUILD_ID, "STOP", TEST_AUTHOR_ID, "en-US")
        .await
        .unwrap();

    let report = Reconciler::from_state(&state).tick_at(now).await;
    let licenses = report.and_then(|r| r.get("licenses")).unwrap();
    assert_eq!(licenses.examined, 0);
    assert_eq!(sink.stopped(), vec!["STOP".to_string()]);
    assert!(sink.expired().is_empty());

    test.assert_mocks();

    Ok(())
}

/// Tests that stopping a license the reconciler already retired reports it missing.
///
/// Expected: Err(NotFound) after the tick deleted the license
#[tokio::test]
async fn stop_after_sweep_is_not_found() -> Result<(), TestError> {
    let now = now_ms();
    let mut test = TestBuilder::new()
        .with_license_tables()
        .with_guild_endpoint(TEST_GUILD_ID, false, 1)
        .build()
        .await?;

    test.license()
        .insert_active(TEST_GUILD_ID, "RACE", TEST_REDEEMER_ID, now - 1)
        .await?;

    let (state, _sink) = recording_state(&test);
    Reconciler::from_state(&state).tick_at(now).await;

    let result = state
        .licenses()
        .stop(TEST_GUILD_ID, "RACE", TEST_AUTHOR_ID, "en-US")
        .await;
    assert!(matches!(
        result,
        Err(Error::LicenseError(LicenseError::NotFound { .. }))
    ));

    Ok(())
}

/// Tests that lapsed premium grants are deleted and their holder is told.
///
/// Expected: Ok with the expired grant retired, the valid grant kept, and one DM sent
#[tokio::test]
async fn retires_expired_premium() -> Result<(), TestError> {
    let now = now_ms();
    let test = TestBuilder::new()
        .with_license_tables()
        .with_premium(TEST_GUILD_ID, TEST_REDEEMER_ID, now - 1)
        .with_premium(TEST_GUILD_ID, TEST_AUTHOR_ID, now + 60_000)
        .with_guild_endpoint(TEST_GUILD_ID, true, 1)
        .with_member_endpoint(TEST_GUILD_ID, TEST_REDEEMER_ID, true, 1)
        .with_direct_message_endpoints(1)
        .build()
        .await?;

    let (state, _sink) = recording_state(&test);
    let report = Reconciler::from_state(&state).tick_at(now).await;

    let premium = report.and_then(|r| r.get("premium")).unwrap();
    assert_eq!(premium.retired, 1);

    let remaining = Premium::find().all(&test.db).await?;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].user_id, TEST_AUTHOR_ID);

    test.assert_mocks();

    Ok(())
}

/// Tests that lapsed bans are swept while permanent and future bans stay.
///
/// Expected: Ok with one ban retired and two kept
#[tokio::test]
async fn sweeps_only_lapsed_bans() -> Result<(), TestError> {
    let now = now_ms();
    let test = TestBuilder::new()
        .with_license_tables()
        .with_ban(TEST_GUILD_ID, TEST_REDEEMER_ID, Some(now - 1))
        .with_ban(TEST_GUILD_ID, TEST_AUTHOR_ID, Some(now + 60_000))
        .with_ban(TEST_GUILD_ID, TEST_ROLE_ID, None)
        .build()
        .await?;

    let (state, _sink) = recording_state(&test);
    let report = Reconciler::from_state(&state).tick_at(now).await;

    let bans = report.and_then(|r| r.get("bans")).unwrap();
    assert_eq!(bans.retired, 1);
    assert_eq!(LicenseBan::find().count(&test.db).await?, 2);

    Ok(())
}
