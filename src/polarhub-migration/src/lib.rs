pub use sea_orm_migration::prelude::*;

mod m20250406_091233_polar_raw;
mod m20250406_093015_polar_realtime;
mod m20250407_104500_polar_posture;
mod m20250407_110912_polar_relay_status;
mod m20250508_081430_polar_raw_clean;
mod m20250508_084210_polar_hrv_summary;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250406_091233_polar_raw::Migration),
            Box::new(m20250406_093015_polar_realtime::Migration),
            Box::new(m20250407_104500_polar_posture::Migration),
            Box::new(m20250407_110912_polar_relay_status::Migration),
            Box::new(m20250508_081430_polar_raw_clean::Migration),
            Box::new(m20250508_084210_polar_hrv_summary::Migration),
        ]
    }
}
