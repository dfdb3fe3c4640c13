use anyhow::{anyhow, Result};
use itertools::Itertools;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::model::{
    Cart, CartLine, CartStatus, GroupConfig, HistoryEntry, Id, Identity, Order, OrderLine,
    OrderStatus, Parameter, ParameterGroup, Product, ProductConfig, ProductParameterGroup,
    Special, SpecialItem,
};
use crate::store::traits::{CartStore, CatalogStore, HistoryStore, OrderStore, Store};

#[derive(Debug, Default)]
struct MemoryInner {
    products: HashMap<Id, Product>,
    groups: HashMap<Id, ParameterGroup>,
    parameters: HashMap<Id, Parameter>,
    product_groups: HashMap<Id, ProductParameterGroup>,
    specials: HashMap<Id, Special>,
    special_items: HashMap<Id, SpecialItem>,
    carts: HashMap<Id, Cart>,
    cart_lines: HashMap<Id, CartLine>,
    orders: HashMap<Id, Order>,
    order_lines: HashMap<Id, OrderLine>,
    // Append order doubles as the chronological order of the audit trail.
    history: Vec<HistoryEntry>,
}

/// In-memory store used by tests and local development.
///
/// One `RwLock` guards all tables; every composite operation (bundle
/// insert/remove, order creation, cart merge) runs under a single write
/// guard, which gives it the same all-or-nothing visibility a database
/// transaction provides for `PostgresStore`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl CatalogStore for MemoryStore {
    async fn get_product(&self, id: &Id) -> Result<Option<Product>> {
        let inner = self.inner.read().await;
        Ok(inner.products.get(id).cloned())
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let inner = self.inner.read().await;
        Ok(inner
            .products
            .values()
            .cloned()
            .sorted_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)))
            .collect())
    }

    async fn get_product_config(&self, id: &Id) -> Result<Option<ProductConfig>> {
        let inner = self.inner.read().await;
        let Some(product) = inner.products.get(id).cloned() else {
            return Ok(None);
        };

        let mut groups = Vec::new();
        let joins = inner
            .product_groups
            .values()
            .filter(|j| j.product_id == product.id)
            .sorted_by_key(|j| (j.position, j.id.clone()));
        for join in joins {
            let Some(group) = inner.groups.get(&join.group_id).cloned() else {
                continue;
            };
            let parameters = inner
                .parameters
                .values()
                .filter(|p| p.group_id == group.id)
                .cloned()
                .sorted_by_key(|p| (p.position, p.id.clone()))
                .collect();
            groups.push(GroupConfig {
                join: join.clone(),
                group,
                parameters,
            });
        }

        Ok(Some(ProductConfig { product, groups }))
    }

    async fn get_special(&self, id: &Id) -> Result<Option<Special>> {
        let inner = self.inner.read().await;
        Ok(inner.specials.get(id).cloned())
    }

    async fn list_specials(&self) -> Result<Vec<Special>> {
        let inner = self.inner.read().await;
        Ok(inner
            .specials
            .values()
            .cloned()
            .sorted_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)))
            .collect())
    }

    async fn list_special_items(&self, special_id: &Id) -> Result<Vec<SpecialItem>> {
        let inner = self.inner.read().await;
        Ok(inner
            .special_items
            .values()
            .filter(|i| &i.special_id == special_id)
            .cloned()
            .sorted_by_key(|i| (i.position, i.id.clone()))
            .collect())
    }

    async fn upsert_product(&self, product: Product) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.products.insert(product.id.clone(), product);
        Ok(())
    }

    async fn upsert_parameter_group(
        &self,
        group: ParameterGroup,
        parameters: Vec<Parameter>,
    ) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.parameters.retain(|_, p| p.group_id != group.id);
        for parameter in parameters {
            inner.parameters.insert(parameter.id.clone(), parameter);
        }
        inner.groups.insert(group.id.clone(), group);
        Ok(())
    }

    async fn upsert_product_parameter_group(&self, join: ProductParameterGroup) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.product_groups.insert(join.id.clone(), join);
        Ok(())
    }

    async fn upsert_special(&self, special: Special, items: Vec<SpecialItem>) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.special_items.retain(|_, i| i.special_id != special.id);
        for item in items {
            inner.special_items.insert(item.id.clone(), item);
        }
        inner.specials.insert(special.id.clone(), special);
        Ok(())
    }
}

#[async_trait::async_trait]
impl CartStore for MemoryStore {
    async fn get_cart(&self, id: &Id) -> Result<Option<Cart>> {
        let inner = self.inner.read().await;
        Ok(inner.carts.get(id).cloned())
    }

    async fn find_active_cart(&self, owner: &Identity) -> Result<Option<Cart>> {
        let inner = self.inner.read().await;
        Ok(inner
            .carts
            .values()
            .find(|c| &c.owner == owner && c.status == CartStatus::Active)
            .cloned())
    }

    async fn get_or_create_active_cart(&self, owner: &Identity) -> Result<Cart> {
        // One write guard across lookup and insert keeps the
        // one-active-cart-per-owner invariant under concurrent calls.
        let mut inner = self.inner.write().await;
        if let Some(cart) = inner
            .carts
            .values()
            .find(|c| &c.owner == owner && c.status == CartStatus::Active)
        {
            return Ok(cart.clone());
        }
        let cart = Cart::new(owner.clone());
        inner.carts.insert(cart.id.clone(), cart.clone());
        Ok(cart)
    }

    async fn get_line(&self, line_id: &Id) -> Result<Option<CartLine>> {
        let inner = self.inner.read().await;
        Ok(inner.cart_lines.get(line_id).cloned())
    }

    async fn list_lines(&self, cart_id: &Id) -> Result<Vec<CartLine>> {
        let inner = self.inner.read().await;
        Ok(inner
            .cart_lines
            .values()
            .filter(|l| &l.cart_id == cart_id)
            .cloned()
            .sorted_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)))
            .collect())
    }

    async fn insert_line(&self, line: CartLine) -> Result<()> {
        let mut inner = self.inner.write().await;
        if !inner.carts.contains_key(&line.cart_id) {
            return Err(anyhow!("cart not found: {}", line.cart_id));
        }
        inner.cart_lines.insert(line.id.clone(), line);
        Ok(())
    }

    async fn update_line(&self, line: CartLine) -> Result<()> {
        let mut inner = self.inner.write().await;
        if !inner.cart_lines.contains_key(&line.id) {
            return Err(anyhow!("cart line not found: {}", line.id));
        }
        inner.cart_lines.insert(line.id.clone(), line);
        Ok(())
    }

    async fn delete_line(&self, line_id: &Id) -> Result<bool> {
        let mut inner = self.inner.write().await;
        Ok(inner.cart_lines.remove(line_id).is_some())
    }

    async fn insert_bundle_lines(&self, lines: Vec<CartLine>) -> Result<()> {
        let mut inner = self.inner.write().await;
        for line in &lines {
            if !inner.carts.contains_key(&line.cart_id) {
                return Err(anyhow!("cart not found: {}", line.cart_id));
            }
        }
        for line in lines {
            inner.cart_lines.insert(line.id.clone(), line);
        }
        Ok(())
    }

    async fn delete_bundle_lines(&self, cart_id: &Id, special_id: &Id) -> Result<u64> {
        let mut inner = self.inner.write().await;
        let before = inner.cart_lines.len();
        inner.cart_lines.retain(|_, l| {
            !(&l.cart_id == cart_id && l.special_id.as_ref() == Some(special_id))
        });
        Ok((before - inner.cart_lines.len()) as u64)
    }

    async fn merge_carts(&self, from_cart: &Id, into_cart: &Id) -> Result<()> {
        let mut inner = self.inner.write().await;
        if !inner.carts.contains_key(into_cart) {
            return Err(anyhow!("cart not found: {}", into_cart));
        }
        for line in inner.cart_lines.values_mut() {
            if &line.cart_id == from_cart {
                line.cart_id = into_cart.clone();
            }
        }
        let from = inner
            .carts
            .get_mut(from_cart)
            .ok_or_else(|| anyhow!("cart not found: {}", from_cart))?;
        from.status = CartStatus::CheckedOut;
        from.updated_at = chrono::Utc::now();
        Ok(())
    }
}

#[async_trait::async_trait]
impl OrderStore for MemoryStore {
    async fn get_order(&self, id: &Id) -> Result<Option<Order>> {
        let inner = self.inner.read().await;
        Ok(inner.orders.get(id).cloned())
    }

    async fn list_orders_for_buyer(&self, buyer: &Identity) -> Result<Vec<Order>> {
        let inner = self.inner.read().await;
        Ok(inner
            .orders
            .values()
            .filter(|o| &o.buyer == buyer)
            .cloned()
            .sorted_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)))
            .collect())
    }

    async fn list_order_lines(&self, order_id: &Id) -> Result<Vec<OrderLine>> {
        let inner = self.inner.read().await;
        Ok(inner
            .order_lines
            .values()
            .filter(|l| &l.order_id == order_id)
            .cloned()
            .sorted_by_key(|l| l.id.clone())
            .collect())
    }

    async fn create_order_from_cart(&self, order: Order, lines: Vec<OrderLine>) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let Some(cart) = inner.carts.get_mut(&order.cart_id) else {
            return Err(anyhow!("cart not found: {}", order.cart_id));
        };
        if cart.status != CartStatus::Active {
            return Ok(false);
        }
        cart.status = CartStatus::CheckedOut;
        cart.updated_at = chrono::Utc::now();
        for line in lines {
            inner.order_lines.insert(line.id.clone(), line);
        }
        inner.orders.insert(order.id.clone(), order);
        Ok(true)
    }

    async fn update_order_status(&self, id: &Id, status: OrderStatus) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let Some(order) = inner.orders.get_mut(id) else {
            return Ok(false);
        };
        order.status = status;
        order.updated_at = chrono::Utc::now();
        Ok(true)
    }
}

#[async_trait::async_trait]
impl HistoryStore for MemoryStore {
    async fn append_history(&self, entry: HistoryEntry) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.history.push(entry);
        Ok(())
    }

    async fn list_history(&self, entity_type: &str, entity_id: &Id) -> Result<Vec<HistoryEntry>> {
        let inner = self.inner.read().await;
        Ok(inner
            .history
            .iter()
            .rev()
            .filter(|e| e.entity_type == entity_type && &e.entity_id == entity_id)
            .cloned()
            .collect())
    }
}

impl Store for MemoryStore {}
