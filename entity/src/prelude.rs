pub use super::license::Entity as License;
pub use super::license_ban::Entity as LicenseBan;
pub use super::license_history::Entity as LicenseHistory;
pub use super::license_manager::Entity as LicenseManager;
pub use super::license_template::Entity as LicenseTemplate;
pub use super::premium::Entity as Premium;
