pub use sea_orm_migration::prelude::*;

mod m20251017_000001_license_template;
mod m20251017_000002_license;
mod m20251017_000003_license_history;
mod m20251017_000004_license_ban;
mod m20251017_000005_premium;
mod m20251017_000006_license_manager;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251017_000001_license_template::Migration),
            Box::new(m20251017_000002_license::Migration),
            Box::new(m20251017_000003_license_history::Migration),
            Box::new(m20251017_000004_license_ban::Migration),
            Box::new(m20251017_000005_premium::Migration),
            Box::new(m20251017_000006_license_manager::Migration),
        ]
    }
}
