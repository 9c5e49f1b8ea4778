//! Database model type aliases.
//!
//! This module provides convenient type aliases for SeaORM database entity models used
//! throughout the engine, so signatures don't need to import from the `entity` crate directly.

/// Type alias for the license database model.
///
/// A single time-bounded role grant, identified by a key unique within its guild.
///
/// # Fields (from `entity::license::Model`)
/// - `id` - Primary key
/// - `guild_id` - Guild the license belongs to
/// - `key` - Public identifier, unique per guild
/// - `role_id` - Role granted on redemption
/// - `author_id` - User who created the license
/// - `redeemer_id` - User who redeemed the license, set together with `activated`
/// - `activated` - Whether the license has been redeemed
/// - `valid_until` - Absolute deadline in epoch milliseconds
/// - `template_id` - Template the license was generated from, if any
/// - `created_at` - Timestamp when the license was created
/// - `updated_at` - Timestamp of the last license update
pub type LicenseModel = entity::license::Model;

/// Type alias for the license template database model.
///
/// # Fields (from `entity::license_template::Model`)
/// - `id` - Primary key
/// - `guild_id` - Guild the template belongs to
/// - `name` - Name unique per guild, compared case-insensitively
/// - `role_id` - Role granted by generated licenses
/// - `duration_ms` - Validity of generated licenses in milliseconds
/// - `stock` - Maximum licenses the template may ever generate, `None` for unlimited
/// - `generated_count` - Licenses generated so far, never decreases
/// - `created_by` - User who created the template
pub type LicenseTemplateModel = entity::license_template::Model;

/// Type alias for the append-only license history database model.
pub type LicenseHistoryModel = entity::license_history::Model;

/// Type alias for the license ban database model.
///
/// A ban with no `expires_at` never expires. A ban whose `expires_at` has passed is inert and
/// deleted by the first reader that observes it.
pub type LicenseBanModel = entity::license_ban::Model;

/// Type alias for the premium grant database model.
pub type PremiumModel = entity::premium::Model;

/// Type alias for the license manager role database model.
///
/// Each row allows one role of a guild, unique per guild, to manage licenses and templates.
pub type LicenseManagerModel = entity::license_manager::Model;
