//! Lifecycle event payloads delivered to event sinks.

use crate::server::model::db::LicenseModel;

/// Licenses were created by `create` or generated from a template.
#[derive(Debug, Clone)]
pub struct LicenseCreated {
    pub guild_id: i64,
    pub licenses: Vec<LicenseModel>,
    pub duration_label: String,
}

/// A pending license was redeemed.
#[derive(Debug, Clone)]
pub struct LicenseRedeemed {
    pub guild_id: i64,
    pub license: LicenseModel,
    pub redeemer_id: i64,
    pub expiry_label: String,
}

/// The reconciler is about to delete an expired license with a resolvable member.
#[derive(Debug, Clone)]
pub struct LicenseExpired {
    pub guild_id: i64,
    pub license: LicenseModel,
    pub redeemer_id: i64,
}

/// An active license was manually stopped.
#[derive(Debug, Clone)]
pub struct LicenseStopped {
    pub guild_id: i64,
    pub license: LicenseModel,
    pub redeemer_id: i64,
    pub actor_id: i64,
    pub locale: String,
}
