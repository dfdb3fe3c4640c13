use crate::model::{
    Cart, CartLine, HistoryEntry, Id, Identity, Order, OrderLine, OrderStatus, Parameter,
    ParameterGroup, Product, ProductConfig, ProductParameterGroup, Special, SpecialItem,
};
use anyhow::Result;

/// Read access to products, parameter groups and specials, plus the upserts
/// the admin surface and seed loader need.
#[async_trait::async_trait]
pub trait CatalogStore: Send + Sync {
    async fn get_product(&self, id: &Id) -> Result<Option<Product>>;
    async fn list_products(&self) -> Result<Vec<Product>>;
    /// Resolve a product together with its joined groups and their
    /// parameters, ordered by join position.
    async fn get_product_config(&self, id: &Id) -> Result<Option<ProductConfig>>;

    async fn get_special(&self, id: &Id) -> Result<Option<Special>>;
    async fn list_specials(&self) -> Result<Vec<Special>>;
    /// Items ordered by position.
    async fn list_special_items(&self, special_id: &Id) -> Result<Vec<SpecialItem>>;

    async fn upsert_product(&self, product: Product) -> Result<()>;
    async fn upsert_parameter_group(
        &self,
        group: ParameterGroup,
        parameters: Vec<Parameter>,
    ) -> Result<()>;
    async fn upsert_product_parameter_group(&self, join: ProductParameterGroup) -> Result<()>;
    async fn upsert_special(&self, special: Special, items: Vec<SpecialItem>) -> Result<()>;
}

/// Cart and cart-line persistence.
///
/// The multi-row methods (`insert_bundle_lines`, `delete_bundle_lines`,
/// `merge_carts`) are the transactional primitives: implementations apply
/// them as one atomic unit, so a concurrent reader never observes a
/// half-inserted or half-removed bundle.
#[async_trait::async_trait]
pub trait CartStore: Send + Sync {
    async fn get_cart(&self, id: &Id) -> Result<Option<Cart>>;
    async fn find_active_cart(&self, owner: &Identity) -> Result<Option<Cart>>;
    /// Returns the owner's active cart, creating one if absent. Must not
    /// produce two active carts for one identity under concurrent calls.
    async fn get_or_create_active_cart(&self, owner: &Identity) -> Result<Cart>;

    async fn get_line(&self, line_id: &Id) -> Result<Option<CartLine>>;
    /// Lines ordered by creation time.
    async fn list_lines(&self, cart_id: &Id) -> Result<Vec<CartLine>>;
    async fn insert_line(&self, line: CartLine) -> Result<()>;
    async fn update_line(&self, line: CartLine) -> Result<()>;
    async fn delete_line(&self, line_id: &Id) -> Result<bool>;

    async fn insert_bundle_lines(&self, lines: Vec<CartLine>) -> Result<()>;
    /// Deletes every line of the cart carrying this special id; returns
    /// how many went.
    async fn delete_bundle_lines(&self, cart_id: &Id, special_id: &Id) -> Result<u64>;

    /// Reassign every line of `from_cart` to `into_cart` and retire
    /// `from_cart` to checked_out, atomically.
    async fn merge_carts(&self, from_cart: &Id, into_cart: &Id) -> Result<()>;
}

/// Order persistence. Orders are insert-then-status-update only; line
/// snapshots and the frozen total are never rewritten.
#[async_trait::async_trait]
pub trait OrderStore: Send + Sync {
    async fn get_order(&self, id: &Id) -> Result<Option<Order>>;
    async fn list_orders_for_buyer(&self, buyer: &Identity) -> Result<Vec<Order>>;
    async fn list_order_lines(&self, order_id: &Id) -> Result<Vec<OrderLine>>;

    /// Insert the order and its lines and flip the source cart to
    /// checked_out, as one atomic unit. Returns false (writing nothing) if
    /// the cart was not active at commit time.
    async fn create_order_from_cart(&self, order: Order, lines: Vec<OrderLine>) -> Result<bool>;

    /// Returns false if the order does not exist.
    async fn update_order_status(&self, id: &Id, status: OrderStatus) -> Result<bool>;
}

/// Append-only audit trail. There is deliberately no update or delete.
#[async_trait::async_trait]
pub trait HistoryStore: Send + Sync {
    async fn append_history(&self, entry: HistoryEntry) -> Result<()>;
    /// Entries for one entity, newest first.
    async fn list_history(&self, entity_type: &str, entity_id: &Id) -> Result<Vec<HistoryEntry>>;
}

pub trait Store: CatalogStore + CartStore + OrderStore + HistoryStore + Send + Sync {}
