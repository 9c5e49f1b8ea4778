//! Tests for generating licenses from templates with limited stock.

use entity::prelude::License;
use licensy::server::error::{license::LicenseError, Error};
use licensy_test_utils::prelude::*;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

use crate::util::recording_state;

/// Tests two concurrent generations from the same template snapshot.
///
/// Stock is 5 and each call asks for 3, so both cannot fit. The request that commits
/// second finds the counter changed and creates nothing.
///
/// Expected: exactly one Ok and one Err(StockConflict), 3 licenses in total
#[tokio::test]
async fn concurrent_generation_never_oversells() -> Result<(), TestError> {
    let mut test = TestBuilder::new()
        .with_license_tables()
        .build()
        .await?;
    let template = test.template().insert_template("Weekly", Some(5), 0).await?;

    let (state, _sink) = recording_state(&test);
    let allocator = state.allocator();

    let (first, second) = tokio::join!(
        allocator.generate(&template, 3, TEST_AUTHOR_ID),
        allocator.generate(&template, 3, TEST_AUTHOR_ID),
    );

    let results = [first, second];
    let created: usize = results
        .iter()
        .filter_map(|r| r.as_ref().ok())
        .map(|licenses| licenses.len())
        .sum();
    let conflicts = results
        .iter()
        .filter(|r| {
            matches!(
                r,
                Err(Error::LicenseError(LicenseError::StockConflict(_)))
            )
        })
        .count();

    assert_eq!(created, 3);
    assert_eq!(conflicts, 1);

    let stored = License::find()
        .filter(entity::license::Column::TemplateId.eq(template.id))
        .count(&test.db)
        .await?;
    assert_eq!(stored, 3);

    let reloaded = test.template().reload(template.id).await?.unwrap();
    assert_eq!(reloaded.generated_count, 3);

    Ok(())
}

/// Tests drawing a template down to zero, restocking it, and drawing it down again.
///
/// Expected: StockExhausted at zero, InsufficientStock when asking past the remainder
#[tokio::test]
async fn exhausts_and_restocks_template() -> Result<(), TestError> {
    let test = TestBuilder::new().with_license_tables().build().await?;

    let (state, sink) = recording_state(&test);
    let templates = state.templates();

    templates
        .create(
            TEST_GUILD_ID,
            "Season Pass",
            TEST_ROLE_ID,
            TEST_TEMPLATE_DURATION_MS,
            Some(5),
            TEST_AUTHOR_ID,
        )
        .await
        .unwrap();

    let first = templates
        .generate(TEST_GUILD_ID, "season pass", 5, TEST_AUTHOR_ID)
        .await
        .unwrap();
    assert_eq!(first.len(), 5);

    let exhausted = templates
        .generate(TEST_GUILD_ID, "Season Pass", 1, TEST_AUTHOR_ID)
        .await;
    assert!(matches!(
        exhausted,
        Err(Error::LicenseError(LicenseError::StockExhausted(_)))
    ));

    let restocked = templates
        .add_stock(TEST_GUILD_ID, "Season Pass", 2)
        .await
        .unwrap();
    assert_eq!(restocked.stock, Some(7));

    let too_many = templates
        .generate(TEST_GUILD_ID, "Season Pass", 3, TEST_AUTHOR_ID)
        .await;
    assert!(matches!(
        too_many,
        Err(Error::LicenseError(LicenseError::InsufficientStock {
            remaining: 2,
            requested: 3,
            ..
        }))
    ));

    templates
        .generate(TEST_GUILD_ID, "Season Pass", 2, TEST_AUTHOR_ID)
        .await
        .unwrap();

    let template = templates.get(TEST_GUILD_ID, "Season Pass").await.unwrap();
    assert_eq!(template.generated_count, 7);
    assert_eq!(sink.created().len(), 7);

    Ok(())
}

/// Tests that deleting a template keeps the licenses generated from it.
///
/// Expected: Ok with the licenses stored and detached from the template
#[tokio::test]
async fn template_delete_keeps_licenses() -> Result<(), TestError> {
    let test = TestBuilder::new()
        .with_license_tables()
        .with_template("Lifetime", None, 0)
        .build()
        .await?;

    let (state, _sink) = recording_state(&test);
    let templates = state.templates();

    templates
        .generate(TEST_GUILD_ID, "Lifetime", 2, TEST_AUTHOR_ID)
        .await
        .unwrap();
    templates.delete(TEST_GUILD_ID, "Lifetime").await.unwrap();

    let licenses = License::find().all(&test.db).await?;
    assert_eq!(licenses.len(), 2);
    assert!(licenses.iter().all(|l| l.template_id.is_none()));

    Ok(())
}
