use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use storefront_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let pool = create_pool(&config.database_url).await?;

    let admin_id = ensure_user(&pool, "admin@example.com", "admin123", "admin").await?;
    let customer_id = ensure_user(&pool, "customer@example.com", "customer123", "customer").await?;
    seed_catalog(&pool).await?;
    seed_coupons(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, Customer ID: {customer_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, role)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_optional(pool)
    .await?;

    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn seed_catalog(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let brands = ["Acme", "Norte"];
    let mut brand_ids = Vec::new();
    for name in brands {
        let (id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO brands (id, name) VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .fetch_one(pool)
        .await?;
        brand_ids.push(id);
    }

    let categories = ["Apparel", "Accessories"];
    let mut category_ids = Vec::new();
    for name in categories {
        let (id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO categories (id, name) VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .fetch_one(pool)
        .await?;
        category_ids.push(id);
    }

    // (name, description, price in cents, stock, brand idx, category idx)
    let products = [
        ("Logo Hoodie", "Warm hoodie", 5500_i64, 50_i32, 0, 0),
        ("Coffee Mug", "Ceramic mug", 1200, 100, 0, 1),
        ("Sticker Pack", "Decorate your laptop", 500, 200, 1, 1),
        ("Canvas Tote", "Everyday tote bag", 1999, 75, 1, 0),
    ];

    for (name, desc, price, stock, b, c) in products {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, brand_id, category_id, price, stock)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(desc)
        .bind(brand_ids[b])
        .bind(category_ids[c])
        .bind(price)
        .bind(stock)
        .execute(pool)
        .await?;
    }

    println!("Seeded catalog");
    Ok(())
}

async fn seed_coupons(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let now = Utc::now();
    // (code, type, value, total, per-customer, from, until)
    let coupons = [
        (
            "SAVE10",
            "percentage",
            10_i64,
            100_i32,
            1_i32,
            now - Duration::days(1),
            now + Duration::days(30),
        ),
        (
            "WELCOME5",
            "fixed",
            500,
            1000,
            1,
            now - Duration::days(1),
            now + Duration::days(90),
        ),
    ];

    for (code, kind, value, total, per_customer, from, until) in coupons {
        sqlx::query(
            r#"
            INSERT INTO coupons
                (id, code, discount_type, discount_value, total_quantity,
                 per_customer_limit, active_from, active_until, active)
            VALUES ($1, $2, $3::discount_type, $4, $5, $6, $7, $8, TRUE)
            ON CONFLICT (code) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(code)
        .bind(kind)
        .bind(value)
        .bind(total)
        .bind(per_customer)
        .bind(from)
        .bind(until)
        .execute(pool)
        .await?;
    }

    println!("Seeded coupons");
    Ok(())
}
