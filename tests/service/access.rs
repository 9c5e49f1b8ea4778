//! Tests for admitting commands through the access gate.

use entity::prelude::LicenseBan;
use licensy::server::{
    model::access::{CommandScope, GateDecision},
    service::gate::CommandCall,
    util::time::now_ms,
};
use licensy_test_utils::prelude::*;
use sea_orm::{EntityTrait, PaginatorTrait};

use crate::util::recording_state;

fn redeem_call(cooldown_ms: i64) -> CommandCall {
    CommandCall {
        guild_id: TEST_GUILD_ID,
        user_id: TEST_REDEEMER_ID,
        command: "redeem",
        scope: CommandScope::License,
        cooldown_ms,
    }
}

/// Tests that a ban past its deadline no longer blocks and is purged on sight.
///
/// Expected: Allow with the lapsed ban removed from the database
#[tokio::test]
async fn lapsed_ban_is_purged_on_check() -> Result<(), TestError> {
    let now = now_ms();
    let test = TestBuilder::new()
        .with_license_tables()
        .with_ban(TEST_GUILD_ID, TEST_REDEEMER_ID, Some(now - 1))
        .build()
        .await?;

    let (state, _sink) = recording_state(&test);
    let decision = state.gate().check(redeem_call(0), now).await.unwrap();

    assert_eq!(decision, GateDecision::Allow);
    assert_eq!(LicenseBan::find().count(&test.db).await?, 0);

    Ok(())
}

/// Tests that a ban created through the service blocks license commands until lifted.
///
/// Expected: Deny while banned, Allow after unban
#[tokio::test]
async fn ban_blocks_until_unbanned() -> Result<(), TestError> {
    let now = now_ms();
    let test = TestBuilder::new().with_license_tables().build().await?;

    let (state, _sink) = recording_state(&test);
    state
        .bans()
        .ban(
            TEST_GUILD_ID,
            TEST_REDEEMER_ID,
            Some("Sharing keys".to_string()),
            None,
            now,
        )
        .await
        .unwrap();

    let denied = state.gate().check(redeem_call(0), now).await.unwrap();
    match denied {
        GateDecision::Deny { reason } => assert!(reason.contains("Reason: Sharing keys")),
        GateDecision::Allow => panic!("Banned user should be denied"),
    }

    state
        .bans()
        .unban(TEST_GUILD_ID, TEST_REDEEMER_ID)
        .await
        .unwrap();

    let allowed = state.gate().check(redeem_call(0), now).await.unwrap();
    assert!(allowed.is_allowed());

    Ok(())
}

/// Tests that the cooldown started by one call blocks the next until it runs out.
///
/// Expected: Allow, then Deny inside the window, then Allow after it
#[tokio::test]
async fn cooldown_spans_calls() -> Result<(), TestError> {
    let now = now_ms();
    let test = TestBuilder::new().with_license_tables().build().await?;

    let (state, _sink) = recording_state(&test);
    let gate = state.gate();

    assert!(gate.check(redeem_call(5_000), now).await.unwrap().is_allowed());
    assert!(!gate
        .check(redeem_call(5_000), now + 1_000)
        .await
        .unwrap()
        .is_allowed());
    assert!(gate
        .check(redeem_call(5_000), now + 5_000)
        .await
        .unwrap()
        .is_allowed());

    Ok(())
}
