//! Test context structure and utilities.
//!
//! This module provides the `TestContext` returned by `TestBuilder`. The context owns an
//! in-memory SQLite database and a mockito server that stands in for the guild platform
//! REST API.

use mockito::{Mock, Server, ServerGuard};
use sea_orm::{
    sea_query::{IndexCreateStatement, TableCreateStatement},
    ConnectionTrait, Database, DatabaseConnection,
};

use crate::{constant::TEST_BOT_TOKEN, error::TestError};

/// Test context structure returned by `TestBuilder`
///
/// Provides access to:
/// - Database connection
/// - Mock guild platform server and its base URL
/// - Collection of mock endpoints for assertion
///
/// # Usage
///
/// ```ignore
/// let mut test = TestBuilder::new().with_license_tables().build().await?;
///
/// let license = test.license().insert_pending(TEST_GUILD_ID, "KEY", 60_000).await?;
///
/// let state: AppState = test.to_app_state()?;
///
/// test.assert_mocks();
/// ```
pub struct TestContext {
    /// Database connection to in-memory SQLite database
    pub db: DatabaseConnection,

    /// Mock HTTP server for guild platform endpoints
    pub(crate) server: ServerGuard,
    /// Collection of mock HTTP endpoints for assertion
    pub(crate) mocks: Vec<Mock>,
}

impl TestContext {
    /// Convert the database connection, mock server URL, and bot token into any type that
    /// can be constructed from them.
    ///
    /// This allows conversion to the application state without a circular dependency between
    /// the test-utils crate and the main crate.
    pub fn to_app_state<T>(&self) -> Result<T, T::Error>
    where
        T: TryFrom<(DatabaseConnection, String, String)>,
    {
        T::try_from((self.db.clone(), self.api_url(), TEST_BOT_TOKEN.to_string()))
    }

    /// Base URL of the mock guild platform server.
    pub fn api_url(&self) -> String {
        self.server.url()
    }

    /// Mutable access to the mock server for endpoints created mid-test.
    pub fn server(&mut self) -> &mut ServerGuard {
        &mut self.server
    }
}

impl TestContext {
    /// Create a new test context.
    ///
    /// # Returns
    /// - `Ok(TestContext)` - Fully initialized test context
    /// - `Err(TestError::DbErr)` - Database connection failed
    pub(crate) async fn new() -> Result<Self, TestError> {
        let server = Server::new_async().await;
        let db = Database::connect("sqlite::memory:").await?;

        Ok(TestContext {
            db,
            server,
            mocks: Vec::new(),
        })
    }

    /// Create database tables from schema statements.
    ///
    /// # Arguments
    /// - `stmts` - CREATE TABLE statements to execute
    ///
    /// # Returns
    /// - `Ok(())` - All tables created successfully
    /// - `Err(TestError::DbErr)` - Table creation failed
    pub(crate) async fn with_tables(
        &self,
        stmts: Vec<TableCreateStatement>,
    ) -> Result<(), TestError> {
        for stmt in stmts {
            self.db.execute(&stmt).await?;
        }

        Ok(())
    }

    /// Create indexes that entity-derived schemas do not carry, such as composite unique keys.
    pub(crate) async fn with_indexes(
        &self,
        stmts: Vec<IndexCreateStatement>,
    ) -> Result<(), TestError> {
        for stmt in stmts {
            self.db.execute(&stmt).await?;
        }

        Ok(())
    }

    /// Keep a mock alive for the rest of the test so `assert_mocks` verifies it.
    pub fn track(&mut self, mock: Mock) {
        self.mocks.push(mock);
    }

    /// Assert all mock endpoints were called as expected.
    ///
    /// # Panics
    /// Panics if any mock endpoint was not called the expected number of times
    pub fn assert_mocks(&self) {
        for mock in &self.mocks {
            mock.assert();
        }
    }
}
