//! End-to-end tests for the license lifecycle through application state.
//!
//! These cover creation, redemption with its role grant, history recording, and the
//! state checks that keep a license from being redeemed twice.

use entity::license_history::LicenseAction;
use licensy::server::{
    error::{license::LicenseError, Error},
    model::license::{HistoryQuery, LicenseFilter, LicenseState},
};
use licensy_test_utils::prelude::*;

use crate::util::recording_state;

/// Tests creating a license and redeeming it once.
///
/// Verifies that the role is granted on redemption, both transitions are recorded in the
/// history newest first, and a second redemption by another member is refused.
///
/// Expected: Ok for the first redemption, Err(AlreadyRedeemed) for the second
#[tokio::test]
async fn create_then_redeem_once() -> Result<(), TestError> {
    let test = TestBuilder::new()
        .with_license_tables()
        .with_role_grant_endpoint(TEST_GUILD_ID, TEST_REDEEMER_ID, TEST_ROLE_ID, 1)
        .build()
        .await?;

    let (state, sink) = recording_state(&test);
    let licenses = state.licenses();

    let created = licenses
        .create(TEST_GUILD_ID, TEST_ROLE_ID, 86_400_000, TEST_AUTHOR_ID)
        .await
        .unwrap();
    assert_eq!(LicenseState::of(&created), LicenseState::Pending);

    let outcome = licenses
        .redeem(TEST_GUILD_ID, &created.key, TEST_REDEEMER_ID)
        .await
        .unwrap();
    assert!(outcome.role_error.is_none());
    assert_eq!(LicenseState::of(&outcome.license), LicenseState::Active);
    assert_eq!(outcome.license.redeemer_id, Some(TEST_REDEEMER_ID));
    assert_eq!(outcome.license.valid_until, created.valid_until);

    let second = licenses
        .redeem(TEST_GUILD_ID, &created.key, TEST_AUTHOR_ID)
        .await;
    assert!(matches!(
        second,
        Err(Error::LicenseError(LicenseError::AlreadyRedeemed(_)))
    ));

    let history = licenses
        .history(
            TEST_GUILD_ID,
            HistoryQuery {
                license_key: Some(created.key.clone()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let actions: Vec<_> = history.iter().map(|h| h.action.clone()).collect();
    assert_eq!(actions, vec![LicenseAction::Redeem, LicenseAction::Create]);

    assert_eq!(sink.created(), vec![created.key.clone()]);
    assert_eq!(sink.redeemed(), vec![created.key.clone()]);

    test.assert_mocks();

    Ok(())
}

/// Tests that a failed role grant leaves the redemption committed.
///
/// No role endpoint is mocked, so the grant fails after the license is activated.
///
/// Expected: Ok with `role_error` set and the license active
#[tokio::test]
async fn redeem_survives_role_grant_failure() -> Result<(), TestError> {
    let mut test = TestBuilder::new().with_license_tables().build().await?;
    test.license()
        .insert_pending(TEST_GUILD_ID, "GRANT-FAILS", i64::MAX)
        .await?;

    let (state, _sink) = recording_state(&test);
    let outcome = state
        .licenses()
        .redeem(TEST_GUILD_ID, "GRANT-FAILS", TEST_REDEEMER_ID)
        .await
        .unwrap();

    assert!(outcome.role_error.is_some());
    let active = state
        .licenses()
        .list(TEST_GUILD_ID, LicenseFilter::Active)
        .await
        .unwrap();
    assert_eq!(active.len(), 1);

    Ok(())
}

/// Tests that a pending license can be deleted once and a repeat reports it missing.
///
/// Expected: Ok then Err(NotFound)
#[tokio::test]
async fn delete_pending_once() -> Result<(), TestError> {
    let mut test = TestBuilder::new().with_license_tables().build().await?;
    test.license()
        .insert_pending(TEST_GUILD_ID, "DELETE-ME", i64::MAX)
        .await?;

    let (state, _sink) = recording_state(&test);
    let licenses = state.licenses();

    licenses.delete(TEST_GUILD_ID, "DELETE-ME").await.unwrap();
    let again = licenses.delete(TEST_GUILD_ID, "DELETE-ME").await;

    assert!(matches!(
        again,
        Err(Error::LicenseError(LicenseError::NotFound { .. }))
    ));

    Ok(())
}

/// Tests that a batch larger than the per-command ceiling is refused whole.
///
/// Expected: Err(QuotaExceeded) with no license created
#[tokio::test]
async fn rejects_batch_over_per_command_ceiling() -> Result<(), TestError> {
    let test = TestBuilder::new().with_license_tables().build().await?;

    let (state, sink) = recording_state(&test);
    let result = state
        .licenses()
        .create_many(TEST_GUILD_ID, TEST_ROLE_ID, 60_000, TEST_AUTHOR_ID, 101)
        .await;

    assert!(matches!(
        result,
        Err(Error::LicenseError(LicenseError::QuotaExceeded(_)))
    ));
    assert!(sink.created().is_empty());

    let all = state
        .licenses()
        .list(TEST_GUILD_ID, LicenseFilter::All)
        .await
        .unwrap();
    assert!(all.is_empty());

    Ok(())
}
