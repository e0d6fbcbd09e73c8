//! Repository tests against a real `PostgreSQL`.
//!
//! Each test gets a fresh database with the storefront migrations applied.
//! They need a server reachable through `DATABASE_URL`:
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/karya cargo test -p karya-storefront -- --ignored
//! ```

#![allow(clippy::unwrap_used)]

use sqlx::PgPool;
use uuid::Uuid;

use karya_core::{AddressId, CityId, Email, ImageDescriptor, ProvinceId, UserId};
use karya_storefront::db::{
    AddressRepository, AddressStore, RegionRepository, RepositoryError, UserRepository, UserStore,
};
use karya_storefront::models::{AddressInput, NewUser, ProfileChanges, User};

const PROVINCE: ProvinceId = ProvinceId::new(1);
const CITY: CityId = CityId::new(17);

async fn seed_regions(pool: &PgPool) {
    let regions = RegionRepository::new(pool);
    regions.upsert_province(PROVINCE, "Bali").await.unwrap();
    regions.upsert_city(CITY, PROVINCE, "Badung").await.unwrap();
}

async fn seed_user(pool: &PgPool, username: &str, image: Option<ImageDescriptor>) -> User {
    let user = NewUser {
        username: username.to_owned(),
        email: Email::parse(&format!("{username}@example.com")).unwrap(),
        phone: None,
        name: None,
        image,
    };
    UserRepository::new(pool)
        .create_with_password(&user, "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA")
        .await
        .unwrap()
}

fn address_input(to: &str) -> AddressInput {
    AddressInput {
        province_id: PROVINCE,
        city_id: CITY,
        address_to: to.to_owned(),
        full_address: "Jl. Sunset Road 88".to_owned(),
    }
}

async fn active_ids(pool: &PgPool, owner: UserId) -> Vec<AddressId> {
    sqlx::query_scalar("SELECT id FROM store.address WHERE user_id = $1 AND is_active")
        .bind(owner)
        .fetch_all(pool)
        .await
        .unwrap()
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs PostgreSQL via DATABASE_URL"]
async fn test_set_active_moves_flag_between_rows(pool: PgPool) {
    seed_regions(&pool).await;
    let user = seed_user(&pool, "budi", None).await;
    let repo = AddressRepository::new(&pool);
    let home = repo.create(user.id, &address_input("Home")).await.unwrap();
    let office = repo.create(user.id, &address_input("Office")).await.unwrap();

    repo.set_active(user.id, home.id).await.unwrap();
    assert_eq!(active_ids(&pool, user.id).await, vec![home.id]);

    repo.set_active(user.id, office.id).await.unwrap();
    assert_eq!(active_ids(&pool, user.id).await, vec![office.id]);

    // Active row first.
    let listed = repo.list_for_user(user.id).await.unwrap();
    assert_eq!(listed.first().unwrap().id, office.id);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs PostgreSQL via DATABASE_URL"]
async fn test_set_active_foreign_or_unknown_id_changes_nothing(pool: PgPool) {
    seed_regions(&pool).await;
    let budi = seed_user(&pool, "budi", None).await;
    let siti = seed_user(&pool, "siti", None).await;
    let repo = AddressRepository::new(&pool);
    let own = repo.create(budi.id, &address_input("Home")).await.unwrap();
    let foreign = repo.create(siti.id, &address_input("Kos")).await.unwrap();
    repo.set_active(budi.id, own.id).await.unwrap();

    let result = repo.set_active(budi.id, foreign.id).await;
    assert!(matches!(result, Err(RepositoryError::NotFound)));

    let result = repo
        .set_active(budi.id, AddressId::new(Uuid::new_v4()))
        .await;
    assert!(matches!(result, Err(RepositoryError::NotFound)));

    assert_eq!(active_ids(&pool, budi.id).await, vec![own.id]);
    assert!(active_ids(&pool, siti.id).await.is_empty());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs PostgreSQL via DATABASE_URL"]
async fn test_constraint_rejects_second_active_row(pool: PgPool) {
    seed_regions(&pool).await;
    let user = seed_user(&pool, "budi", None).await;
    let repo = AddressRepository::new(&pool);
    let home = repo.create(user.id, &address_input("Home")).await.unwrap();
    let office = repo.create(user.id, &address_input("Office")).await.unwrap();
    repo.set_active(user.id, home.id).await.unwrap();

    // Deferred: the violation surfaces at commit, not at the update.
    let mut tx = pool.begin().await.unwrap();
    sqlx::query("UPDATE store.address SET is_active = true WHERE id = $1")
        .bind(office.id)
        .execute(&mut *tx)
        .await
        .unwrap();
    let err = tx.commit().await.unwrap_err();

    let constraint = err
        .as_database_error()
        .and_then(|db_err| db_err.constraint())
        .map(ToOwned::to_owned);
    assert_eq!(constraint.as_deref(), Some("address_one_active_per_user"));
    assert_eq!(active_ids(&pool, user.id).await, vec![home.id]);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs PostgreSQL via DATABASE_URL"]
async fn test_profile_write_without_image_keeps_stored_image(pool: PgPool) {
    let old = ImageDescriptor::new("https://res.example/old.png", "user_pictures/old");
    let user = seed_user(&pool, "budi", Some(old.clone())).await;
    let users = UserRepository::new(&pool);
    let new = ImageDescriptor::new("https://res.example/new.png", "user_pictures/new");

    let replaced = users
        .update_profile(
            user.id,
            &ProfileChanges {
                name: "Budi".to_owned(),
                username: "budi".to_owned(),
                phone: "0812".to_owned(),
                image: Some(new.clone()),
            },
        )
        .await
        .unwrap();
    assert_eq!(replaced.replaced_image, Some(old));
    assert_eq!(replaced.user.image.as_ref(), Some(&new));

    // A write that carries no picture leaves the newer one in place.
    let kept = users
        .update_profile(
            user.id,
            &ProfileChanges {
                name: "Budi Santoso".to_owned(),
                username: "budi_s".to_owned(),
                phone: "0812".to_owned(),
                image: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(kept.replaced_image, None);
    assert_eq!(kept.user.image, Some(new));
    assert_eq!(kept.user.username, "budi_s");
}
