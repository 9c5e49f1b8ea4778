//! Declarative test builder.
//!
//! The builder queues tables, database fixtures, and mock endpoints, then executes them all
//! during the final `build()` call.

use mockito::Mock;
use sea_orm::{
    sea_query::{Index, IndexCreateStatement, TableCreateStatement},
    EntityTrait, Schema,
};

use crate::{error::TestError, TestContext};

/// Builder for declarative test initialization.
pub struct TestBuilder {
    // Tables to create
    tables: Vec<TableCreateStatement>,
    include_license_tables: bool,

    // Database fixtures to insert
    templates: Vec<(String, Option<i32>, i32)>, // (name, stock, generated_count)
    premiums: Vec<(i64, i64, i64)>,             // (guild_id, user_id, valid_until)
    bans: Vec<(i64, i64, Option<i64>)>,         // (guild_id, user_id, expires_at)
    managers: Vec<(i64, i64)>,                  // (guild_id, role_id)

    // Mock endpoints to create
    mock_builders: Vec<Box<dyn FnOnce(&mut mockito::ServerGuard) -> Mock>>,

    // Pre-configured endpoint shortcuts
    guild_endpoints: Vec<(i64, bool, usize)>, // (guild_id, exists, expected_requests)
    member_endpoints: Vec<(i64, i64, bool, usize)>, // (guild_id, user_id, exists, expected_requests)
    role_grant_endpoints: Vec<(i64, i64, i64, usize)>, // (guild_id, user_id, role_id, expected_requests)
    role_revoke_endpoints: Vec<(i64, i64, i64, usize)>,
    direct_message_endpoints: Vec<usize>,
}

impl TestBuilder {
    /// Create a new TestBuilder with no tables, fixtures, or mock endpoints configured.
    pub fn new() -> Self {
        Self {
            tables: Vec::new(),
            include_license_tables: false,
            templates: Vec::new(),
            premiums: Vec::new(),
            bans: Vec::new(),
            managers: Vec::new(),
            mock_builders: Vec::new(),
            guild_endpoints: Vec::new(),
            member_endpoints: Vec::new(),
            role_grant_endpoints: Vec::new(),
            role_revoke_endpoints: Vec::new(),
            direct_message_endpoints: Vec::new(),
        }
    }

    /// Add every license-related table to the test database.
    ///
    /// Creates License, LicenseTemplate, LicenseHistory, LicenseBan, Premium, and LicenseManager
    /// tables along with the unique `(guild_id, key)` index on licenses, `(guild_id, name_key)`
    /// index on templates, and `(guild_id, role_id)` index on manager roles.
    pub fn with_license_tables(mut self) -> Self {
        self.include_license_tables = true;
        self
    }

    /// Add a custom entity table to the test database.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use licensy_test_utils::TestBuilder;
    /// use entity::prelude::*;
    ///
    /// # async fn example() -> Result<(), licensy_test_utils::TestError> {
    /// let test = TestBuilder::new()
    ///     .with_table(LicenseTemplate)
    ///     .with_table(License)
    ///     .build()
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_table<E: EntityTrait>(mut self, entity: E) -> Self {
        let schema = Schema::new(sea_orm::DbBackend::Sqlite);
        self.tables.push(schema.create_table_from_entity(entity));
        self
    }

    /// Insert a template into the test guild.
    ///
    /// # Arguments
    /// - `name` - Template name
    /// - `stock` - Stock limit, `None` for unlimited
    /// - `generated_count` - Licenses already generated from the template
    pub fn with_template(
        mut self,
        name: impl Into<String>,
        stock: Option<i32>,
        generated_count: i32,
    ) -> Self {
        self.templates.push((name.into(), stock, generated_count));
        self
    }

    /// Insert a premium grant valid until the given epoch millisecond deadline.
    pub fn with_premium(mut self, guild_id: i64, user_id: i64, valid_until: i64) -> Self {
        self.premiums.push((guild_id, user_id, valid_until));
        self
    }

    /// Insert a license ban, permanent when `expires_at` is `None`.
    pub fn with_ban(mut self, guild_id: i64, user_id: i64, expires_at: Option<i64>) -> Self {
        self.bans.push((guild_id, user_id, expires_at));
        self
    }

    /// Allow a role to manage licenses in a guild.
    pub fn with_manager(mut self, guild_id: i64, role_id: i64) -> Self {
        self.managers.push((guild_id, role_id));
        self
    }

    /// Add a guild lookup endpoint.
    ///
    /// When `exists` is false the endpoint responds with the platform's unknown guild error.
    pub fn with_guild_endpoint(mut self, guild_id: i64, exists: bool, expected: usize) -> Self {
        self.guild_endpoints.push((guild_id, exists, expected));
        self
    }

    /// Add a guild member lookup endpoint.
    ///
    /// When `exists` is false the endpoint responds with the platform's unknown member error.
    pub fn with_member_endpoint(
        mut self,
        guild_id: i64,
        user_id: i64,
        exists: bool,
        expected: usize,
    ) -> Self {
        self.member_endpoints
            .push((guild_id, user_id, exists, expected));
        self
    }

    /// Add a successful role grant endpoint.
    pub fn with_role_grant_endpoint(
        mut self,
        guild_id: i64,
        user_id: i64,
        role_id: i64,
        expected: usize,
    ) -> Self {
        self.role_grant_endpoints
            .push((guild_id, user_id, role_id, expected));
        self
    }

    /// Add a successful role removal endpoint.
    pub fn with_role_revoke_endpoint(
        mut self,
        guild_id: i64,
        user_id: i64,
        role_id: i64,
        expected: usize,
    ) -> Self {
        self.role_revoke_endpoints
            .push((guild_id, user_id, role_id, expected));
        self
    }

    /// Add the DM channel and message endpoints, each expected `expected` times.
    pub fn with_direct_message_endpoints(mut self, expected: usize) -> Self {
        self.direct_message_endpoints.push(expected);
        self
    }

    /// Add a custom mock endpoint with full control over the mockito server.
    pub fn with_mock_endpoint<F>(mut self, setup: F) -> Self
    where
        F: FnOnce(&mut mockito::ServerGuard) -> Mock + 'static,
    {
        self.mock_builders.push(Box::new(setup));
        self
    }

    /// Build the test context.
    ///
    /// Executes all queued operations in the following order:
    /// 1. Creates database tables and indexes
    /// 2. Inserts database fixtures
    /// 3. Creates mock HTTP endpoints (custom endpoints first)
    ///
    /// # Returns
    /// - `Ok(TestContext)` - Fully configured test environment
    /// - `Err(TestError::DbErr)` - Table creation or fixture insertion failed
    pub async fn build(self) -> Result<TestContext, TestError> {
        let mut setup = TestContext::new().await?;

        // 1. Create tables
        let mut all_tables = Vec::new();
        let mut all_indexes = Vec::new();

        if self.include_license_tables {
            let schema = Schema::new(sea_orm::DbBackend::Sqlite);
            all_tables.extend(vec![
                schema.create_table_from_entity(entity::prelude::LicenseTemplate),
                schema.create_table_from_entity(entity::prelude::License),
                schema.create_table_from_entity(entity::prelude::LicenseHistory),
                schema.create_table_from_entity(entity::prelude::LicenseBan),
                schema.create_table_from_entity(entity::prelude::Premium),
                schema.create_table_from_entity(entity::prelude::LicenseManager),
            ]);
            all_indexes.push(license_key_index());
            all_indexes.push(template_name_key_index());
            all_indexes.push(manager_role_index());
        }

        all_tables.extend(self.tables);
        setup.with_tables(all_tables).await?;
        setup.with_indexes(all_indexes).await?;

        // 2. Insert database fixtures
        for (name, stock, generated_count) in self.templates {
            setup
                .template()
                .insert_template(&name, stock, generated_count)
                .await?;
        }

        for (guild_id, user_id, valid_until) in self.premiums {
            setup
                .premium()
                .insert_premium(guild_id, user_id, valid_until)
                .await?;
        }

        for (guild_id, user_id, expires_at) in self.bans {
            setup.ban().insert_ban(guild_id, user_id, expires_at).await?;
        }

        for (guild_id, role_id) in self.managers {
            setup.manager().insert_manager(guild_id, role_id).await?;
        }

        // 3. Create mock endpoints
        // Custom endpoints are created first so tests can stack an error response ahead of
        // a success response on the same path.
        let mut mocks = Vec::new();

        for builder in self.mock_builders {
            mocks.push(builder(&mut setup.server));
        }

        for (guild_id, exists, expected) in self.guild_endpoints {
            mocks.push(
                setup
                    .discord()
                    .create_guild_endpoint(guild_id, exists, expected),
            );
        }

        for (guild_id, user_id, exists, expected) in self.member_endpoints {
            mocks.push(
                setup
                    .discord()
                    .create_member_endpoint(guild_id, user_id, exists, expected),
            );
        }

        for (guild_id, user_id, role_id, expected) in self.role_grant_endpoints {
            mocks.push(
                setup
                    .discord()
                    .create_role_grant_endpoint(guild_id, user_id, role_id, expected),
            );
        }

        for (guild_id, user_id, role_id, expected) in self.role_revoke_endpoints {
            mocks.push(
                setup
                    .discord()
                    .create_role_revoke_endpoint(guild_id, user_id, role_id, expected),
            );
        }

        for expected in self.direct_message_endpoints {
            mocks.extend(setup.discord().create_direct_message_endpoints(expected));
        }

        // Store mocks so they live as long as the test
        setup.mocks.extend(mocks);

        Ok(setup)
    }
}

impl Default for TestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique `(guild_id, key)` index matching the production migration.
fn license_key_index() -> IndexCreateStatement {
    Index::create()
        .name("idx_license_guild_id_key")
        .table(entity::prelude::License)
        .col(entity::license::Column::GuildId)
        .col(entity::license::Column::Key)
        .unique()
        .to_owned()
}

/// Unique `(guild_id, name_key)` index matching the production migration.
fn template_name_key_index() -> IndexCreateStatement {
    Index::create()
        .name("idx_license_template_guild_id_name_key")
        .table(entity::prelude::LicenseTemplate)
        .col(entity::license_template::Column::GuildId)
        .col(entity::license_template::Column::NameKey)
        .unique()
        .to_owned()
}

/// Unique `(guild_id, role_id)` index matching the production migration.
fn manager_role_index() -> IndexCreateStatement {
    Index::create()
        .name("idx_license_manager_guild_id_role_id")
        .table(entity::prelude::LicenseManager)
        .col(entity::license_manager::Column::GuildId)
        .col(entity::license_manager::Column::RoleId)
        .unique()
        .to_owned()
}
