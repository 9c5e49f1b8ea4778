pub mod prelude;

pub mod license;
pub mod license_ban;
pub mod license_history;
pub mod license_manager;
pub mod license_template;
pub mod premium;
