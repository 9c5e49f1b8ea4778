use chrono::NaiveDateTime;
use entity::license_history::LicenseAction;

use crate::server::{
    error::external::ExternalError,
    model::db::{LicenseHistoryModel, LicenseModel},
};

/// State of a license in its lifecycle.
///
/// `Pending -> Active -> deleted`. Neither state can be re-entered and there is no stored
/// expired state: a license past its deadline is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseState {
    /// Created but not redeemed
    Pending,
    /// Redeemed by a member
    Active,
}

impl LicenseState {
    pub fn of(license: &LicenseModel) -> Self {
        if license.activated {
            Self::Active
        } else {
            Self::Pending
        }
    }
}

impl std::fmt::Display for LicenseState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
            Self::Active => f.write_str("active"),
        }
    }
}

/// Which licenses a listing returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LicenseFilter {
    #[default]
    All,
    Pending,
    Active,
}

/// Fields for a license row about to be inserted.
#[derive(Debug, Clone)]
pub struct NewLicense {
    pub guild_id: i64,
    pub key: String,
    pub role_id: i64,
    pub author_id: i64,
    pub valid_until: i64,
    pub template_id: Option<i32>,
    pub created_at: NaiveDateTime,
}

/// Changes applied to a pending license.
#[derive(Debug, Clone, Copy, Default)]
pub struct LicenseEdit {
    pub role_id: Option<i64>,
    /// New validity measured from the license's creation time
    pub duration_ms: Option<i64>,
}

/// Fields for a history row about to be appended.
#[derive(Debug, Clone)]
pub struct NewHistoryEntry {
    pub guild_id: i64,
    pub license_key: String,
    pub action: LicenseAction,
    pub actor_id: Option<i64>,
    pub target_id: Option<i64>,
    pub details: Option<String>,
}

/// Filters for a history query. Entries are returned newest first.
#[derive(Debug, Clone, Default)]
pub struct HistoryQuery {
    pub license_key: Option<String>,
    pub action: Option<LicenseAction>,
    pub actor_id: Option<i64>,
    pub target_id: Option<i64>,
    /// Clamped to `1..=25`, defaults to 10
    pub limit: Option<u64>,
}

/// Result of a committed redemption.
#[derive(Debug)]
pub struct RedeemOutcome {
    pub license: LicenseModel,
    pub history: LicenseHistoryModel,
    /// Failure of the best-effort role grant, the license stays active regardless
    pub role_error: Option<ExternalError>,
}

/// Result of manually stopping an active license.
#[derive(Debug)]
pub enum StopOutcome {
    /// The role was (or was attempted to be) removed and the license deleted
    Stopped {
        license: LicenseModel,
        role_removed: bool,
    },
    /// The guild or redeemer is gone, the license was deleted with no other side effect
    Orphaned { license: LicenseModel },
}

/// Per-license results of re-applying roles for active licenses.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RoleSyncReport {
    /// Role granted to a member that was missing it
    pub restored: Vec<String>,
    /// Member already had the role
    pub already_synced: Vec<String>,
    /// Redeemer is no longer in the guild
    pub member_missing: Vec<String>,
    /// Active license with no redeemer recorded
    pub no_redeemer: Vec<String>,
    /// The license's role no longer exists
    pub role_missing: Vec<String>,
    /// Missing permission or role hierarchy prevented the grant
    pub permission_denied: Vec<String>,
    /// Any other failure
    pub failed: Vec<String>,
}
