//! Database model type aliases for test utilities, matching those in the main crate.

pub type LicenseModel = entity::license::Model;

pub type LicenseTemplateModel = entity::license_template::Model;

pub type LicenseHistoryModel = entity::license_history::Model;

pub type LicenseBanModel = entity::license_ban::Model;

pub type PremiumModel = entity::premium::Model;

pub type LicenseManagerModel = entity::license_manager::Model;
