use rust_decimal::Decimal;
use storefront_api::{
    config::AppConfig,
    db::{create_pool, run_migrations},
    entity::enums::Role,
    services::auth_service::hash_password,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;

    let admin_id = ensure_user(&pool, "Store Admin", "admin@example.com", "admin123", Role::Admin).await?;
    let seller_id =
        ensure_user(&pool, "Sample Seller", "seller@example.com", "seller123", Role::Seller).await?;
    let buyer_id = ensure_user(&pool, "Sample Buyer", "buyer@example.com", "buyer123", Role::Buyer).await?;

    let apparel = ensure_category(&pool, "Apparel", None).await?;
    let kitchen = ensure_category(&pool, "Kitchen", None).await?;
    let stickers = ensure_category(&pool, "Stickers", Some(apparel)).await?;
    seed_products(&pool, seller_id, apparel, kitchen, stickers).await?;

    println!("Seed completed. Admin: {admin_id}, Seller: {seller_id}, Buyer: {buyer_id}");
    Ok(())
}

/// Creates the account and its cart unless the email is already registered.
async fn ensure_user(
    pool: &sqlx::PgPool,
    name: &str,
    email: &str,
    password: &str,
    role: Role,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, name, email, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(role.as_str())
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

    sqlx::query("INSERT INTO carts (id, user_id) VALUES ($1, $2) ON CONFLICT (user_id) DO NOTHING")
        .bind(Uuid::new_v4())
        .bind(user_id)
        .execute(pool)
        .await?;

    println!("Ensured user {email} (role={})", role.as_str());
    Ok(user_id)
}

async fn ensure_category(
    pool: &sqlx::PgPool,
    name: &str,
    parent_id: Option<Uuid>,
) -> anyhow::Result<Uuid> {
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO categories (id, name, parent_id)
        VALUES ($1, $2, $3)
        ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(parent_id)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

async fn seed_products(
    pool: &sqlx::PgPool,
    seller_id: Uuid,
    apparel: Uuid,
    kitchen: Uuid,
    stickers: Uuid,
) -> anyhow::Result<()> {
    let products = vec![
        (apparel, "Rustacean Hoodie", "Warm fleece hoodie with an embroidered crab.", "Ferris & Co", Decimal::new(5500, 2), Decimal::new(10, 0), 50),
        (kitchen, "Ferris Coffee Mug", "Ceramic mug that keeps your borrow checker company.", "Ferris & Co", Decimal::new(1200, 2), Decimal::ZERO, 100),
        (stickers, "Laptop Sticker Pack", "Twelve vinyl stickers for laptops and water bottles.", "Crate Prints", Decimal::new(500, 2), Decimal::new(25, 0), 200),
        (apparel, "Async Runtime T-Shirt", "Soft cotton tee printed with a spinning executor.", "Crate Prints", Decimal::new(2000, 2), Decimal::ZERO, 75),
    ];

    for (category_id, title, description, brand, price, discount, stock) in products {
        sqlx::query(
            r#"
            INSERT INTO products (id, seller_id, category_id, title, description, price, discount, stock, brand)
            SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9
            WHERE NOT EXISTS (SELECT 1 FROM products WHERE title = $4 AND seller_id = $2)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(seller_id)
        .bind(category_id)
        .bind(title)
        .bind(description)
        .bind(price)
        .bind(discount)
        .bind(stock)
        .bind(brand)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
