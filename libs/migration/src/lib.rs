pub use sea_orm_migration::prelude::*;

mod m20250301_000000_bootstrap;
mod m20250301_000001_create_users;
mod m20250301_000002_create_companies;
mod m20250301_000003_create_addresses;
mod m20250301_000004_create_categories;
mod m20250301_000005_create_products;
mod m20250301_000006_create_coupons;
mod m20250301_000007_create_user_favorite_products;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000000_bootstrap::Migration),
            Box::new(m20250301_000001_create_users::Migration),
            Box::new(m20250301_000002_create_companies::Migration),
            Box::new(m20250301_000003_create_addresses::Migration),
            Box::new(m20250301_000004_create_categories::Migration),
            Box::new(m20250301_000005_create_products::Migration),
            Box::new(m20250301_000006_create_coupons::Migration),
            Box::new(m20250301_000007_create_user_favorite_products::Migration),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm_migration::MigrationName;

    #[test]
    fn test_migrations_are_ordered_and_unique() {
        let names: Vec<String> = Migrator::migrations()
            .iter()
            .map(|m| m.name().to_string())
            .collect();

        let mut sorted = names.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(names, sorted);
    }
}
