pub mod cars;
pub mod store;

use carzone_db::Database;
use carzone_kernel::settings::Settings;
use carzone_kernel::ModuleRegistry;

/// Register all project-specific modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, settings: &Settings, db: &Database) {
    registry.register_core(store::create_module(db.clone()));
    registry.register_custom(cars::create_module(db, &settings.listings));
}
