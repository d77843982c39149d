use async_trait::async_trait;
use domain::{
    Coupon, CouponCode, CouponKind, Customer, CustomerId, Money, Order, OrderId, Product,
    ProductId,
};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgConnection, PgPool, Postgres, Row, Transaction};

use crate::coordinator::FulfillmentCoordinator;
use crate::seed::DemoData;
use crate::store::{
    CouponStore, CustomerStore, LedgerTransaction, OrderStore, ProductStore, TransactionalStore,
};
use crate::{Result, StoreError};

const SELECT_PRODUCT: &str = "SELECT id, name, price, quantity FROM products WHERE id = $1";
const SELECT_PRODUCT_FOR_UPDATE: &str =
    "SELECT id, name, price, quantity FROM products WHERE id = $1 FOR UPDATE";

const SELECT_COUPON: &str =
    "SELECT code, quantity, amount, kind, begins_at, ends_at FROM coupons WHERE code = $1";
const SELECT_COUPON_FOR_UPDATE: &str =
    "SELECT code, quantity, amount, kind, begins_at, ends_at FROM coupons WHERE code = $1 FOR UPDATE";

const SELECT_ORDER: &str = "SELECT version, document FROM orders WHERE id = $1";
const SELECT_ORDER_FOR_UPDATE: &str =
    "SELECT version, document FROM orders WHERE id = $1 FOR UPDATE";

/// PostgreSQL-backed store implementation.
///
/// Ledger transactions map onto database transactions, with every row they
/// read locked `FOR UPDATE` until commit or rollback.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
    coordinator: FulfillmentCoordinator,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            coordinator: FulfillmentCoordinator::default(),
        }
    }

    /// Opens a connection pool against `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Replaces the coordinator used for compound operations.
    pub fn with_coordinator(mut self, coordinator: FulfillmentCoordinator) -> Self {
        self.coordinator = coordinator;
        self
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        tracing::info!("database migrations applied");
        Ok(())
    }

    /// Inserts the demo catalog. Existing rows keep their stock and coupon
    /// quantities, but demo coupons get a fresh validity window so they stay
    /// usable across restarts.
    pub async fn seed(&self, data: DemoData) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for customer in &data.customers {
            sqlx::query(
                r#"
                INSERT INTO customers (id, name, phone_number, email, address)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (id) DO NOTHING
                "#,
            )
            .bind(customer.id.as_str())
            .bind(&customer.name)
            .bind(&customer.phone_number)
            .bind(&customer.email)
            .bind(&customer.address)
            .execute(&mut *tx)
            .await?;
        }

        for product in &data.products {
            sqlx::query(
                r#"
                INSERT INTO products (id, name, price, quantity)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (id) DO NOTHING
                "#,
            )
            .bind(product.id.as_str())
            .bind(&product.name)
            .bind(product.price.amount())
            .bind(i64::from(product.quantity))
            .execute(&mut *tx)
            .await?;
        }

        for coupon in &data.coupons {
            sqlx::query(
                r#"
                INSERT INTO coupons (code, quantity, amount, kind, begins_at, ends_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (code) DO UPDATE
                SET begins_at = EXCLUDED.begins_at, ends_at = EXCLUDED.ends_at
                "#,
            )
            .bind(coupon.code.as_str())
            .bind(i64::from(coupon.quantity))
            .bind(coupon.amount)
            .bind(coupon.kind.as_str())
            .bind(coupon.begin)
            .bind(coupon.end)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn find_order(&self, id: &OrderId) -> Result<Order> {
        let mut conn = self.pool.acquire().await?;
        fetch_order(&mut conn, SELECT_ORDER, id).await
    }

    async fn store_order(&self, order: &mut Order) -> Result<OrderId> {
        let mut next = order.clone();
        next.set_version(1);
        let document = serde_json::to_value(&next)?;

        let mut conn = self.pool.acquire().await?;
        let inserted = sqlx::query(
            r#"
            INSERT INTO orders (id, customer_id, status, version, document)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(next.id().as_str())
        .bind(next.customer().id.as_str())
        .bind(next.status().as_str())
        .bind(try_i64_from_u64(next.version(), "version")?)
        .bind(document)
        .execute(&mut *conn)
        .await?;

        if inserted.rows_affected() == 0 {
            let actual = fetch_order_version(&mut conn, next.id()).await?.unwrap_or(0);
            return Err(StoreError::ConcurrencyConflict {
                entity: "order",
                id: next.id().to_string(),
                expected: 0,
                actual,
            });
        }

        *order = next;
        Ok(order.id().clone())
    }

    async fn update_order(&self, order: &mut Order) -> Result<()> {
        let mut next = order.clone();
        let mut conn = self.pool.acquire().await?;
        write_order(&mut conn, &mut next).await?;
        *order = next;
        Ok(())
    }

    async fn finalize_and_reserve(&self, order: &mut Order) -> Result<()> {
        self.coordinator.finalize_and_reserve(self, order).await
    }

    async fn cancel_and_release(&self, order: &mut Order) -> Result<()> {
        self.coordinator.cancel_and_release(self, order).await
    }
}

#[async_trait]
impl ProductStore for PostgresStore {
    async fn find_product(&self, id: &ProductId) -> Result<Product> {
        let mut conn = self.pool.acquire().await?;
        fetch_product(&mut conn, SELECT_PRODUCT, id).await
    }

    async fn find_all_products(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query("SELECT id, name, price, quantity FROM products ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_product).collect()
    }

    async fn update_product(&self, product: &Product) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        write_product(&mut conn, product).await
    }
}

#[async_trait]
impl CouponStore for PostgresStore {
    async fn find_coupon(&self, code: &CouponCode) -> Result<Coupon> {
        let mut conn = self.pool.acquire().await?;
        fetch_coupon(&mut conn, SELECT_COUPON, code).await
    }

    async fn update_coupon(&self, coupon: &Coupon) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        write_coupon(&mut conn, coupon).await
    }
}

#[async_trait]
impl CustomerStore for PostgresStore {
    async fn find_customer(&self, id: &CustomerId) -> Result<Customer> {
        let row: Option<PgRow> = sqlx::query(
            "SELECT id, name, phone_number, email, address FROM customers WHERE id = $1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Customer {
                id: CustomerId::new(row.try_get::<String, _>("id")?),
                name: row.try_get("name")?,
                phone_number: row.try_get("phone_number")?,
                email: row.try_get("email")?,
                address: row.try_get("address")?,
            }),
            None => Err(StoreError::not_found("customer", id)),
        }
    }
}

/// Ledger transaction backed by a database transaction.
///
/// Dropping it without committing rolls the database transaction back.
pub struct PostgresTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl TransactionalStore for PostgresStore {
    type Tx = PostgresTransaction;

    async fn begin(&self) -> Result<PostgresTransaction> {
        Ok(PostgresTransaction {
            tx: self.pool.begin().await?,
        })
    }
}

#[async_trait]
impl LedgerTransaction for PostgresTransaction {
    async fn find_product(&mut self, id: &ProductId) -> Result<Product> {
        fetch_product(&mut self.tx, SELECT_PRODUCT_FOR_UPDATE, id).await
    }

    async fn update_product(&mut self, product: &Product) -> Result<()> {
        write_product(&mut self.tx, product).await
    }

    async fn find_coupon(&mut self, code: &CouponCode) -> Result<Coupon> {
        fetch_coupon(&mut self.tx, SELECT_COUPON_FOR_UPDATE, code).await
    }

    async fn update_coupon(&mut self, coupon: &Coupon) -> Result<()> {
        write_coupon(&mut self.tx, coupon).await
    }

    async fn find_order(&mut self, id: &OrderId) -> Result<Order> {
        fetch_order(&mut self.tx, SELECT_ORDER_FOR_UPDATE, id).await
    }

    async fn replace_order(&mut self, order: &mut Order) -> Result<()> {
        write_order(&mut self.tx, order).await
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

async fn fetch_product(conn: &mut PgConnection, sql: &str, id: &ProductId) -> Result<Product> {
    let row = sqlx::query(sql)
        .bind(id.as_str())
        .fetch_optional(&mut *conn)
        .await?;

    match row {
        Some(row) => row_to_product(&row),
        None => Err(StoreError::not_found("product", id)),
    }
}

async fn write_product(conn: &mut PgConnection, product: &Product) -> Result<()> {
    let updated = sqlx::query("UPDATE products SET name = $2, price = $3, quantity = $4 WHERE id = $1")
        .bind(product.id.as_str())
        .bind(&product.name)
        .bind(product.price.amount())
        .bind(i64::from(product.quantity))
        .execute(&mut *conn)
        .await?;

    if updated.rows_affected() == 0 {
        return Err(StoreError::not_found("product", &product.id));
    }
    Ok(())
}

async fn fetch_coupon(conn: &mut PgConnection, sql: &str, code: &CouponCode) -> Result<Coupon> {
    let row = sqlx::query(sql)
        .bind(code.as_str())
        .fetch_optional(&mut *conn)
        .await?;

    match row {
        Some(row) => row_to_coupon(&row),
        None => Err(StoreError::not_found("coupon", code)),
    }
}

async fn write_coupon(conn: &mut PgConnection, coupon: &Coupon) -> Result<()> {
    let updated = sqlx::query(
        r#"
        UPDATE coupons
        SET quantity = $2, amount = $3, kind = $4, begins_at = $5, ends_at = $6
        WHERE code = $1
        "#,
    )
    .bind(coupon.code.as_str())
    .bind(i64::from(coupon.quantity))
    .bind(coupon.amount)
    .bind(coupon.kind.as_str())
    .bind(coupon.begin)
    .bind(coupon.end)
    .execute(&mut *conn)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(StoreError::not_found("coupon", &coupon.code));
    }
    Ok(())
}

async fn fetch_order(conn: &mut PgConnection, sql: &str, id: &OrderId) -> Result<Order> {
    let row = sqlx::query(sql)
        .bind(id.as_str())
        .fetch_optional(&mut *conn)
        .await?;

    match row {
        Some(row) => row_to_order(&row),
        None => Err(StoreError::not_found("order", id)),
    }
}

async fn fetch_order_version(conn: &mut PgConnection, id: &OrderId) -> Result<Option<u64>> {
    let version: Option<i64> = sqlx::query_scalar("SELECT version FROM orders WHERE id = $1")
        .bind(id.as_str())
        .fetch_optional(&mut *conn)
        .await?;

    Ok(version
        .map(|v| try_u64_from_i64(v, "version"))
        .transpose()?)
}

/// Writes `order` if the stored version still matches, then bumps its version.
async fn write_order(conn: &mut PgConnection, order: &mut Order) -> Result<()> {
    let expected = order.version();
    order.set_version(expected + 1);
    let document = serde_json::to_value(&*order)?;

    let updated = sqlx::query(
        r#"
        UPDATE orders
        SET status = $3, version = $4, document = $5, updated_at = NOW()
        WHERE id = $1 AND version = $2
        "#,
    )
    .bind(order.id().as_str())
    .bind(try_i64_from_u64(expected, "version")?)
    .bind(order.status().as_str())
    .bind(try_i64_from_u64(order.version(), "version")?)
    .bind(document)
    .execute(&mut *conn)
    .await?;

    if updated.rows_affected() == 0 {
        order.set_version(expected);
        return match fetch_order_version(conn, order.id()).await? {
            Some(actual) => Err(StoreError::ConcurrencyConflict {
                entity: "order",
                id: order.id().to_string(),
                expected,
                actual,
            }),
            None => Err(StoreError::not_found("order", order.id())),
        };
    }
    Ok(())
}

fn row_to_product(row: &PgRow) -> Result<Product> {
    Ok(Product {
        id: ProductId::new(row.try_get::<String, _>("id")?),
        name: row.try_get("name")?,
        price: Money::new(row.try_get::<Decimal, _>("price")?),
        quantity: try_u32_from_i64(row.try_get("quantity")?, "quantity")?,
    })
}

fn row_to_coupon(row: &PgRow) -> Result<Coupon> {
    let kind: String = row.try_get("kind")?;
    let kind = kind
        .parse::<CouponKind>()
        .map_err(|e| sqlx::Error::ColumnDecode {
            index: "kind".to_string(),
            source: e.into(),
        })?;

    Ok(Coupon {
        code: CouponCode::new(row.try_get::<String, _>("code")?),
        quantity: try_u32_from_i64(row.try_get("quantity")?, "quantity")?,
        amount: row.try_get("amount")?,
        kind,
        begin: row.try_get("begins_at")?,
        end: row.try_get("ends_at")?,
    })
}

fn row_to_order(row: &PgRow) -> Result<Order> {
    let document: serde_json::Value = row.try_get("document")?;
    let mut order: Order = serde_json::from_value(document)?;

    // The column is authoritative; the document copy may lag behind.
    order.set_version(try_u64_from_i64(row.try_get("version")?, "version")?);
    Ok(order)
}

fn try_u32_from_i64(value: i64, column: &'static str) -> std::result::Result<u32, sqlx::Error> {
    u32::try_from(value).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

fn try_u64_from_i64(value: i64, column: &'static str) -> std::result::Result<u64, sqlx::Error> {
    u64::try_from(value).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

fn try_i64_from_u64(value: u64, column: &'static str) -> std::result::Result<i64, sqlx::Error> {
    i64::try_from(value).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}
