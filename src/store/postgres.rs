use anyhow::{anyhow, Context, Result};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};

use crate::model::{
    Cart, CartLine, CartStatus, GroupConfig, HistoryAction, HistoryEntry, Id, Identity, Order,
    OrderLine, OrderStatus, Parameter, ParameterGroup, Product, ProductConfig,
    ProductParameterGroup, ProductStatus, Special, SpecialItem, SpecialStatus,
};
use crate::model::{Actor, ParameterSelection};
use crate::store::traits::{CartStore, CatalogStore, HistoryStore, OrderStore, Store};

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store with the given database URL
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .connect(database_url)
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn owner_columns(owner: &Identity) -> (Option<&str>, Option<&str>) {
    match owner {
        Identity::User(id) => (Some(id.as_str()), None),
        Identity::Guest(session) => (None, Some(session.as_str())),
    }
}

fn owner_from_row(row: &PgRow) -> Result<Identity> {
    let user_id: Option<String> = row.try_get("user_id")?;
    let guest_session: Option<String> = row.try_get("guest_session")?;
    match (user_id, guest_session) {
        (Some(id), None) => Ok(Identity::User(id)),
        (None, Some(session)) => Ok(Identity::Guest(session)),
        _ => Err(anyhow!("row has neither or both of user_id/guest_session")),
    }
}

fn actor_from_row(row: &PgRow) -> Result<Actor> {
    let admin_id: Option<String> = row.try_get("admin_id")?;
    let user_id: Option<String> = row.try_get("user_id")?;
    match (admin_id, user_id) {
        (Some(id), None) => Ok(Actor::Admin(id)),
        (None, Some(id)) => Ok(Actor::User(id)),
        (None, None) => Ok(Actor::System),
        _ => Err(anyhow!("history row attributes both an admin and a user")),
    }
}

fn selection_from_row(row: &PgRow) -> Result<ParameterSelection> {
    let value: serde_json::Value = row.try_get("selection")?;
    serde_json::from_value(value).context("Failed to deserialize selection")
}

fn product_from_row(row: &PgRow) -> Result<Product> {
    let status: String = row.try_get("status")?;
    Ok(Product {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        base_price: row.try_get("base_price")?,
        status: ProductStatus::parse(&status)
            .ok_or_else(|| anyhow!("unknown product status: {}", status))?,
        category_id: row.try_get("category_id")?,
        created_at: row.try_get("created_at")?,
    })
}

fn special_from_row(row: &PgRow) -> Result<Special> {
    let status: String = row.try_get("status")?;
    Ok(Special {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        discounted_price: row.try_get("discounted_price")?,
        status: SpecialStatus::parse(&status)
            .ok_or_else(|| anyhow!("unknown special status: {}", status))?,
        created_at: row.try_get("created_at")?,
    })
}

fn cart_from_row(row: &PgRow) -> Result<Cart> {
    let status: String = row.try_get("status")?;
    Ok(Cart {
        id: row.try_get("id")?,
        owner: owner_from_row(row)?,
        status: CartStatus::parse(&status)
            .ok_or_else(|| anyhow!("unknown cart status: {}", status))?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn cart_line_from_row(row: &PgRow) -> Result<CartLine> {
    Ok(CartLine {
        id: row.try_get("id")?,
        cart_id: row.try_get("cart_id")?,
        product_id: row.try_get("product_id")?,
        quantity: row.try_get("quantity")?,
        selection: selection_from_row(row)?,
        special_id: row.try_get("special_id")?,
        created_at: row.try_get("created_at")?,
    })
}

fn order_from_row(row: &PgRow) -> Result<Order> {
    let status: String = row.try_get("status")?;
    Ok(Order {
        id: row.try_get("id")?,
        cart_id: row.try_get("cart_id")?,
        buyer: owner_from_row(row)?,
        name: row.try_get("name")?,
        phone: row.try_get("phone")?,
        secondary_phone: row.try_get("secondary_phone")?,
        address: row.try_get("address")?,
        total_price: row.try_get("total_price")?,
        status: OrderStatus::parse(&status)
            .ok_or_else(|| anyhow!("unknown order status: {}", status))?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn order_line_from_row(row: &PgRow) -> Result<OrderLine> {
    Ok(OrderLine {
        id: row.try_get("id")?,
        order_id: row.try_get("order_id")?,
        product_id: row.try_get("product_id")?,
        product_name: row.try_get("product_name")?,
        quantity: row.try_get("quantity")?,
        unit_price: row.try_get("unit_price")?,
        selection: selection_from_row(row)?,
        special_id: row.try_get("special_id")?,
    })
}

fn history_from_row(row: &PgRow) -> Result<HistoryEntry> {
    let action: String = row.try_get("action")?;
    let action = match action.as_str() {
        "created" => HistoryAction::Created,
        "status_changed" => HistoryAction::StatusChanged,
        "edited" => HistoryAction::Edited,
        other => return Err(anyhow!("unknown history action: {}", other)),
    };
    Ok(HistoryEntry {
        id: row.try_get("id")?,
        entity_type: row.try_get("entity_type")?,
        entity_id: row.try_get("entity_id")?,
        action,
        field: row.try_get("field")?,
        old_value: row.try_get("old_value")?,
        new_value: row.try_get("new_value")?,
        actor: actor_from_row(row)?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait::async_trait]
impl CatalogStore for PostgresStore {
    async fn get_product(&self, id: &Id) -> Result<Option<Product>> {
        let row = sqlx::query(
            "SELECT id, name, base_price, status, category_id, created_at FROM products WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch product")?;

        row.as_ref().map(product_from_row).transpose()
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query(
            "SELECT id, name, base_price, status, category_id, created_at FROM products ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list products")?;

        rows.iter().map(product_from_row).collect()
    }

    async fn get_product_config(&self, id: &Id) -> Result<Option<ProductConfig>> {
        let Some(product) = self.get_product(id).await? else {
            return Ok(None);
        };

        let join_rows = sqlx::query(
            r#"
            SELECT ppg.id, ppg.product_id, ppg.group_id, ppg.default_parameter_id, ppg.position,
                   pg.name AS group_name, pg.internal_name AS group_internal_name
            FROM product_parameter_groups ppg
            JOIN parameter_groups pg ON pg.id = ppg.group_id
            WHERE ppg.product_id = $1
            ORDER BY ppg.position, ppg.id
            "#,
        )
        .bind(&product.id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch product parameter groups")?;

        let group_ids: Vec<String> = join_rows
            .iter()
            .map(|row| row.try_get::<String, _>("group_id"))
            .collect::<Result<_, _>>()?;

        let parameter_rows = sqlx::query(
            r#"
            SELECT id, group_id, name, price_modifier, position
            FROM parameters
            WHERE group_id = ANY($1)
            ORDER BY position, id
            "#,
        )
        .bind(&group_ids)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch parameters")?;

        let mut parameters = Vec::with_capacity(parameter_rows.len());
        for row in &parameter_rows {
            parameters.push(Parameter {
                id: row.try_get("id")?,
                group_id: row.try_get("group_id")?,
                name: row.try_get("name")?,
                price_modifier: row.try_get("price_modifier")?,
                position: row.try_get("position")?,
            });
        }

        let mut groups = Vec::with_capacity(join_rows.len());
        for row in &join_rows {
            let group_id: String = row.try_get("group_id")?;
            let join = ProductParameterGroup {
                id: row.try_get("id")?,
                product_id: row.try_get("product_id")?,
                group_id: group_id.clone(),
                default_parameter_id: row.try_get("default_parameter_id")?,
                position: row.try_get("position")?,
            };
            let group = ParameterGroup {
                id: group_id.clone(),
                name: row.try_get("group_name")?,
                internal_name: row.try_get("group_internal_name")?,
            };
            let group_parameters = parameters
                .iter()
                .filter(|p| p.group_id == group_id)
                .cloned()
                .collect();
            groups.push(GroupConfig {
                join,
                group,
                parameters: group_parameters,
            });
        }

        Ok(Some(ProductConfig { product, groups }))
    }

    async fn get_special(&self, id: &Id) -> Result<Option<Special>> {
        let row = sqlx::query(
            "SELECT id, name, discounted_price, status, created_at FROM specials WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch special")?;

        row.as_ref().map(special_from_row).transpose()
    }

    async fn list_specials(&self) -> Result<Vec<Special>> {
        let rows = sqlx::query(
            "SELECT id, name, discounted_price, status, created_at FROM specials ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list specials")?;

        rows.iter().map(special_from_row).collect()
    }

    async fn list_special_items(&self, special_id: &Id) -> Result<Vec<SpecialItem>> {
        let rows = sqlx::query(
            r#"
            SELECT id, special_id, product_id, quantity, selection, position
            FROM special_items
            WHERE special_id = $1
            ORDER BY position, id
            "#,
        )
        .bind(special_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list special items")?;

        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            items.push(SpecialItem {
                id: row.try_get("id")?,
                special_id: row.try_get("special_id")?,
                product_id: row.try_get("product_id")?,
                quantity: row.try_get("quantity")?,
                selection: selection_from_row(row)?,
                position: row.try_get("position")?,
            });
        }
        Ok(items)
    }

    async fn upsert_product(&self, product: Product) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, base_price, status, category_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                base_price = EXCLUDED.base_price,
                status = EXCLUDED.status,
                category_id = EXCLUDED.category_id
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.base_price)
        .bind(product.status.as_str())
        .bind(&product.category_id)
        .bind(product.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to upsert product")?;

        Ok(())
    }

    async fn upsert_parameter_group(
        &self,
        group: ParameterGroup,
        parameters: Vec<Parameter>,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        sqlx::query(
            r#"
            INSERT INTO parameter_groups (id, name, internal_name)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                internal_name = EXCLUDED.internal_name
            "#,
        )
        .bind(&group.id)
        .bind(&group.name)
        .bind(&group.internal_name)
        .execute(&mut *tx)
        .await
        .context("Failed to upsert parameter group")?;

        sqlx::query("DELETE FROM parameters WHERE group_id = $1")
            .bind(&group.id)
            .execute(&mut *tx)
            .await
            .context("Failed to clear group parameters")?;

        for parameter in parameters {
            sqlx::query(
                r#"
                INSERT INTO parameters (id, group_id, name, price_modifier, position)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(&parameter.id)
            .bind(&parameter.group_id)
            .bind(&parameter.name)
            .bind(parameter.price_modifier)
            .bind(parameter.position)
            .execute(&mut *tx)
            .await
            .context("Failed to insert parameter")?;
        }

        tx.commit().await.context("Failed to commit parameter group")?;
        Ok(())
    }

    async fn upsert_product_parameter_group(&self, join: ProductParameterGroup) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO product_parameter_groups (id, product_id, group_id, default_parameter_id, position)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                default_parameter_id = EXCLUDED.default_parameter_id,
                position = EXCLUDED.position
            "#,
        )
        .bind(&join.id)
        .bind(&join.product_id)
        .bind(&join.group_id)
        .bind(&join.default_parameter_id)
        .bind(join.position)
        .execute(&self.pool)
        .await
        .context("Failed to upsert product parameter group")?;

        Ok(())
    }

    async fn upsert_special(&self, special: Special, items: Vec<SpecialItem>) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        sqlx::query(
            r#"
            INSERT INTO specials (id, name, discounted_price, status, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                discounted_price = EXCLUDED.discounted_price,
                status = EXCLUDED.status
            "#,
        )
        .bind(&special.id)
        .bind(&special.name)
        .bind(special.discounted_price)
        .bind(special.status.as_str())
        .bind(special.created_at)
        .execute(&mut *tx)
        .await
        .context("Failed to upsert special")?;

        sqlx::query("DELETE FROM special_items WHERE special_id = $1")
            .bind(&special.id)
            .execute(&mut *tx)
            .await
            .context("Failed to clear special items")?;

        for item in items {
            let selection = serde_json::to_value(&item.selection)
                .context("Failed to serialize selection")?;
            sqlx::query(
                r#"
                INSERT INTO special_items (id, special_id, product_id, quantity, selection, position)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(&item.id)
            .bind(&item.special_id)
            .bind(&item.product_id)
            .bind(item.quantity)
            .bind(selection)
            .bind(item.position)
            .execute(&mut *tx)
            .await
            .context("Failed to insert special item")?;
        }

        tx.commit().await.context("Failed to commit special")?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl CartStore for PostgresStore {
    async fn get_cart(&self, id: &Id) -> Result<Option<Cart>> {
        let row = sqlx::query(
            "SELECT id, user_id, guest_session, status, created_at, updated_at FROM carts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch cart")?;

        row.as_ref().map(cart_from_row).transpose()
    }

    async fn find_active_cart(&self, owner: &Identity) -> Result<Option<Cart>> {
        let (user_id, guest_session) = owner_columns(owner);
        let row = sqlx::query(
            r#"
            SELECT id, user_id, guest_session, status, created_at, updated_at
            FROM carts
            WHERE status = 'active'
              AND user_id IS NOT DISTINCT FROM $1
              AND guest_session IS NOT DISTINCT FROM $2
            "#,
        )
        .bind(user_id)
        .bind(guest_session)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to find active cart")?;

        row.as_ref().map(cart_from_row).transpose()
    }

    async fn get_or_create_active_cart(&self, owner: &Identity) -> Result<Cart> {
        if let Some(cart) = self.find_active_cart(owner).await? {
            return Ok(cart);
        }

        // Partial unique indexes on (user_id)/(guest_session) WHERE active
        // make a concurrent duplicate insert fail; losing the race means
        // the other request's cart is the one to return.
        let cart = Cart::new(owner.clone());
        let (user_id, guest_session) = owner_columns(&cart.owner);
        let result = sqlx::query(
            r#"
            INSERT INTO carts (id, user_id, guest_session, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(&cart.id)
        .bind(user_id)
        .bind(guest_session)
        .bind(cart.status.as_str())
        .bind(cart.created_at)
        .bind(cart.updated_at)
        .execute(&self.pool)
        .await
        .context("Failed to create cart")?;

        if result.rows_affected() > 0 {
            return Ok(cart);
        }

        self.find_active_cart(owner)
            .await?
            .ok_or_else(|| anyhow!("active cart vanished after concurrent create"))
    }

    async fn get_line(&self, line_id: &Id) -> Result<Option<CartLine>> {
        let row = sqlx::query(
            r#"
            SELECT id, cart_id, product_id, quantity, selection, special_id, created_at
            FROM cart_lines WHERE id = $1
            "#,
        )
        .bind(line_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch cart line")?;

        row.as_ref().map(cart_line_from_row).transpose()
    }

    async fn list_lines(&self, cart_id: &Id) -> Result<Vec<CartLine>> {
        let rows = sqlx::query(
            r#"
            SELECT id, cart_id, product_id, quantity, selection, special_id, created_at
            FROM cart_lines
            WHERE cart_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(cart_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list cart lines")?;

        rows.iter().map(cart_line_from_row).collect()
    }

    async fn insert_line(&self, line: CartLine) -> Result<()> {
        let selection =
            serde_json::to_value(&line.selection).context("Failed to serialize selection")?;
        sqlx::query(
            r#"
            INSERT INTO cart_lines (id, cart_id, product_id, quantity, selection, special_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&line.id)
        .bind(&line.cart_id)
        .bind(&line.product_id)
        .bind(line.quantity)
        .bind(selection)
        .bind(&line.special_id)
        .bind(line.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to insert cart line")?;

        Ok(())
    }

    async fn update_line(&self, line: CartLine) -> Result<()> {
        let selection =
            serde_json::to_value(&line.selection).context("Failed to serialize selection")?;
        let result = sqlx::query(
            "UPDATE cart_lines SET quantity = $2, selection = $3 WHERE id = $1",
        )
        .bind(&line.id)
        .bind(line.quantity)
        .bind(selection)
        .execute(&self.pool)
        .await
        .context("Failed to update cart line")?;

        if result.rows_affected() == 0 {
            return Err(anyhow!("cart line not found: {}", line.id));
        }
        Ok(())
    }

    async fn delete_line(&self, line_id: &Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM cart_lines WHERE id = $1")
            .bind(line_id)
            .execute(&self.pool)
            .await
            .context("Failed to delete cart line")?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_bundle_lines(&self, lines: Vec<CartLine>) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        for line in lines {
            let selection =
                serde_json::to_value(&line.selection).context("Failed to serialize selection")?;
            sqlx::query(
                r#"
                INSERT INTO cart_lines (id, cart_id, product_id, quantity, selection, special_id, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(&line.id)
            .bind(&line.cart_id)
            .bind(&line.product_id)
            .bind(line.quantity)
            .bind(selection)
            .bind(&line.special_id)
            .bind(line.created_at)
            .execute(&mut *tx)
            .await
            .context("Failed to insert bundle line")?;
        }

        tx.commit().await.context("Failed to commit bundle insert")?;
        Ok(())
    }

    async fn delete_bundle_lines(&self, cart_id: &Id, special_id: &Id) -> Result<u64> {
        // Single statement: all lines of the bundle go, or none do.
        let result = sqlx::query(
            "DELETE FROM cart_lines WHERE cart_id = $1 AND special_id = $2",
        )
        .bind(cart_id)
        .bind(special_id)
        .execute(&self.pool)
        .await
        .context("Failed to delete bundle lines")?;

        Ok(result.rows_affected())
    }

    async fn merge_carts(&self, from_cart: &Id, into_cart: &Id) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        sqlx::query("UPDATE cart_lines SET cart_id = $2 WHERE cart_id = $1")
            .bind(from_cart)
            .bind(into_cart)
            .execute(&mut *tx)
            .await
            .context("Failed to reassign cart lines")?;

        let result = sqlx::query(
            "UPDATE carts SET status = 'checked_out', updated_at = NOW() WHERE id = $1 AND status = 'active'",
        )
        .bind(from_cart)
        .execute(&mut *tx)
        .await
        .context("Failed to retire merged cart")?;

        if result.rows_affected() == 0 {
            return Err(anyhow!("cart not found or not active: {}", from_cart));
        }

        tx.commit().await.context("Failed to commit cart merge")?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl OrderStore for PostgresStore {
    async fn get_order(&self, id: &Id) -> Result<Option<Order>> {
        let row = sqlx::query(
            r#"
            SELECT id, cart_id, user_id, guest_session, name, phone, secondary_phone, address,
                   total_price, status, created_at, updated_at
            FROM orders WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch order")?;

        row.as_ref().map(order_from_row).transpose()
    }

    async fn list_orders_for_buyer(&self, buyer: &Identity) -> Result<Vec<Order>> {
        let (user_id, guest_session) = owner_columns(buyer);
        let rows = sqlx::query(
            r#"
            SELECT id, cart_id, user_id, guest_session, name, phone, secondary_phone, address,
                   total_price, status, created_at, updated_at
            FROM orders
            WHERE user_id IS NOT DISTINCT FROM $1
              AND guest_session IS NOT DISTINCT FROM $2
            ORDER BY created_at DESC, id
            "#,
        )
        .bind(user_id)
        .bind(guest_session)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list orders")?;

        rows.iter().map(order_from_row).collect()
    }

    async fn list_order_lines(&self, order_id: &Id) -> Result<Vec<OrderLine>> {
        let rows = sqlx::query(
            r#"
            SELECT id, order_id, product_id, product_name, quantity, unit_price, selection, special_id
            FROM order_lines
            WHERE order_id = $1
            ORDER BY id
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list order lines")?;

        rows.iter().map(order_line_from_row).collect()
    }

    async fn create_order_from_cart(&self, order: Order, lines: Vec<OrderLine>) -> Result<bool> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        // Guarded transition: only an active cart can be checked out, and
        // only inside the same transaction that inserts the order.
        let result = sqlx::query(
            "UPDATE carts SET status = 'checked_out', updated_at = NOW() WHERE id = $1 AND status = 'active'",
        )
        .bind(&order.cart_id)
        .execute(&mut *tx)
        .await
        .context("Failed to check out cart")?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        let (user_id, guest_session) = owner_columns(&order.buyer);
        sqlx::query(
            r#"
            INSERT INTO orders (id, cart_id, user_id, guest_session, name, phone, secondary_phone,
                                address, total_price, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(&order.id)
        .bind(&order.cart_id)
        .bind(user_id)
        .bind(guest_session)
        .bind(&order.name)
        .bind(&order.phone)
        .bind(&order.secondary_phone)
        .bind(&order.address)
        .bind(order.total_price)
        .bind(order.status.as_str())
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await
        .context("Failed to insert order")?;

        for line in lines {
            let selection =
                serde_json::to_value(&line.selection).context("Failed to serialize selection")?;
            sqlx::query(
                r#"
                INSERT INTO order_lines (id, order_id, product_id, product_name, quantity,
                                         unit_price, selection, special_id)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(&line.id)
            .bind(&line.order_id)
            .bind(&line.product_id)
            .bind(&line.product_name)
            .bind(line.quantity)
            .bind(line.unit_price)
            .bind(selection)
            .bind(&line.special_id)
            .execute(&mut *tx)
            .await
            .context("Failed to insert order line")?;
        }

        tx.commit().await.context("Failed to commit order")?;
        Ok(true)
    }

    async fn update_order_status(&self, id: &Id, status: OrderStatus) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(status.as_str())
        .execute(&self.pool)
        .await
        .context("Failed to update order status")?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait::async_trait]
impl HistoryStore for PostgresStore {
    async fn append_history(&self, entry: HistoryEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO history (id, entity_type, entity_id, action, field, old_value, new_value,
                                 admin_id, user_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.entity_type)
        .bind(&entry.entity_id)
        .bind(entry.action.as_str())
        .bind(&entry.field)
        .bind(&entry.old_value)
        .bind(&entry.new_value)
        .bind(entry.actor.admin_id())
        .bind(entry.actor.user_id())
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to append history")?;

        Ok(())
    }

    async fn list_history(&self, entity_type: &str, entity_id: &Id) -> Result<Vec<HistoryEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, entity_type, entity_id, action, field, old_value, new_value,
                   admin_id, user_id, created_at
            FROM history
            WHERE entity_type = $1 AND entity_id = $2
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(entity_type)
        .bind(entity_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list history")?;

        rows.iter().map(history_from_row).collect()
    }
}

impl Store for PostgresStore {}
