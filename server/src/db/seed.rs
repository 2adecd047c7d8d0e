// storefront_server/src/db/seed.rs

//! A small demo catalog for local runs (`SEED_DB=true`).

use anyhow::Context;
use sqlx::PgPool;
use storefront::CatalogProduct;
use tracing::info;
use uuid::Uuid;

/// Fixed ids, so re-seeding never duplicates products.
pub fn demo_catalog() -> Vec<CatalogProduct> {
  [
    ("6f1c2d9e-1b7a-4c3e-9a51-0d2f6b8e4a01", "Darjeeling First Flush", 18_50, 25),
    ("6f1c2d9e-1b7a-4c3e-9a51-0d2f6b8e4a02", "Sylhet Green Tea", 9_00, 40),
    ("6f1c2d9e-1b7a-4c3e-9a51-0d2f6b8e4a03", "Assam CTC", 6_75, 60),
    ("6f1c2d9e-1b7a-4c3e-9a51-0d2f6b8e4a04", "Hand-thrown Clay Cup", 4_20, 3),
  ]
  .into_iter()
  .map(|(id, title, price_cents, stock)| CatalogProduct {
    id: Uuid::parse_str(id).unwrap_or_else(|_| Uuid::new_v4()),
    title: title.to_string(),
    image: Some(format!("/images/{}.jpg", title.to_lowercase().replace(' ', "-"))),
    price_cents,
    stock,
  })
  .collect()
}

/// Inserts the demo catalog, leaving existing rows (and their stock) alone.
pub async fn seed_products(pool: &PgPool) -> anyhow::Result<usize> {
  let mut inserted = 0;
  for product in demo_catalog() {
    let result = sqlx::query(
      "INSERT INTO products (id, title, image, price_cents, stock) VALUES ($1, $2, $3, $4, $5) \
       ON CONFLICT (id) DO NOTHING",
    )
    .bind(product.id)
    .bind(&product.title)
    .bind(&product.image)
    .bind(product.price_cents)
    .bind(i64::from(product.stock))
    .execute(pool)
    .await
    .with_context(|| format!("seeding product '{}'", product.title))?;
    inserted += result.rows_affected() as usize;
  }
  info!(inserted, "Demo catalog seeded.");
  Ok(inserted)
}
