use crate::error::StoreError;
use crate::logic::pricing;
use crate::model::{
    Cart, CartLine, Id, Identity, ParameterSelection, ProductStatus, SpecialStatus,
};
use crate::store::traits::Store;

/// Cart mutations and totals.
///
/// Every operation re-checks the cart's state before writing: a cart that
/// has been checked out is terminal, and mutating it is a state conflict,
/// never a silent no-op. Bundle lines (non-null special_id) only enter and
/// leave through the bundle operations.
pub struct CartOperations;

impl CartOperations {
    /// The owner's active cart, created lazily on first interaction.
    pub async fn get_or_create_cart<S: Store>(
        store: &S,
        owner: &Identity,
    ) -> Result<Cart, StoreError> {
        Ok(store.get_or_create_active_cart(owner).await?)
    }

    /// Append a new line. Two identical add calls stay two distinct lines;
    /// the cart never merges them.
    pub async fn add_item<S: Store>(
        store: &S,
        cart_id: &Id,
        product_id: &Id,
        quantity: i64,
        selection: ParameterSelection,
    ) -> Result<CartLine, StoreError> {
        if quantity < 1 {
            return Err(StoreError::validation("quantity must be at least 1"));
        }

        let cart = require_active_cart(store, cart_id).await?;

        let product = store
            .get_product(product_id)
            .await?
            .ok_or_else(|| StoreError::not_found("Product", product_id))?;
        if product.status != ProductStatus::Active {
            return Err(StoreError::validation(format!(
                "product '{}' is not available",
                product.name
            )));
        }

        let line = CartLine::new(cart.id, product.id, quantity, selection);
        store.insert_line(line.clone()).await?;
        Ok(line)
    }

    /// Partial update of one regular line. Bundle lines are read-only for
    /// the customer.
    pub async fn update_item<S: Store>(
        store: &S,
        line_id: &Id,
        quantity: Option<i64>,
        selection: Option<ParameterSelection>,
    ) -> Result<CartLine, StoreError> {
        if let Some(q) = quantity {
            if q < 1 {
                return Err(StoreError::validation("quantity must be at least 1"));
            }
        }

        let mut line = store
            .get_line(line_id)
            .await?
            .ok_or_else(|| StoreError::not_found("Cart line", line_id))?;
        require_active_cart(store, &line.cart_id).await?;

        if line.is_bundle_line() {
            return Err(StoreError::state_conflict(
                "bundle lines cannot be edited individually",
            ));
        }

        if let Some(q) = quantity {
            line.quantity = q;
        }
        if let Some(sel) = selection {
            line.selection = sel;
        }
        store.update_line(line.clone()).await?;
        Ok(line)
    }

    pub async fn remove_item<S: Store>(store: &S, line_id: &Id) -> Result<(), StoreError> {
        let line = store
            .get_line(line_id)
            .await?
            .ok_or_else(|| StoreError::not_found("Cart line", line_id))?;
        require_active_cart(store, &line.cart_id).await?;

        if line.is_bundle_line() {
            return Err(StoreError::state_conflict(
                "bundle lines are removed with their bundle, not individually",
            ));
        }

        store.delete_line(line_id).await?;
        Ok(())
    }

    /// Insert one line per special item, all stamped with the special's id
    /// and carrying its fixed selections, as a single atomic unit.
    pub async fn add_bundle<S: Store>(
        store: &S,
        cart_id: &Id,
        special_id: &Id,
    ) -> Result<Vec<CartLine>, StoreError> {
        let cart = require_active_cart(store, cart_id).await?;

        let special = store
            .get_special(special_id)
            .await?
            .ok_or_else(|| StoreError::not_found("Special", special_id))?;
        if special.status != SpecialStatus::Active {
            return Err(StoreError::validation(format!(
                "special '{}' is not available",
                special.name
            )));
        }

        let items = store.list_special_items(special_id).await?;
        if items.is_empty() {
            return Err(StoreError::validation(format!(
                "special '{}' has no items",
                special.name
            )));
        }

        let lines: Vec<CartLine> = items
            .into_iter()
            .map(|item| {
                CartLine::new_bundle_line(
                    cart.id.clone(),
                    special.id.clone(),
                    item.product_id,
                    item.quantity,
                    item.selection,
                )
            })
            .collect();

        store.insert_bundle_lines(lines.clone()).await?;
        Ok(lines)
    }

    /// Remove every line of the bundle as a single atomic unit.
    pub async fn remove_bundle<S: Store>(
        store: &S,
        cart_id: &Id,
        special_id: &Id,
    ) -> Result<u64, StoreError> {
        require_active_cart(store, cart_id).await?;

        let removed = store.delete_bundle_lines(cart_id, special_id).await?;
        if removed == 0 {
            return Err(StoreError::not_found("Bundle", special_id));
        }
        Ok(removed)
    }

    /// Move the guest cart's lines into the user's active cart and retire
    /// the guest cart. Idempotent: once the guest cart is retired, a
    /// repeat call finds no active guest cart and changes nothing.
    pub async fn merge_guest_cart_into_user<S: Store>(
        store: &S,
        guest_session: &Id,
        user_id: &Id,
    ) -> Result<Cart, StoreError> {
        let user_cart = store
            .get_or_create_active_cart(&Identity::User(user_id.clone()))
            .await?;

        let guest_owner = Identity::Guest(guest_session.clone());
        let Some(guest_cart) = store.find_active_cart(&guest_owner).await? else {
            return Ok(user_cart);
        };

        store.merge_carts(&guest_cart.id, &user_cart.id).await?;
        Ok(user_cart)
    }

    /// Sum of line totals, each priced live by the calculator. Bundle
    /// lines price through their fixed selection like any other line. A
    /// line whose product has vanished from the catalog contributes 0,
    /// matching the calculator's silent-skip policy.
    pub async fn cart_total<S: Store>(store: &S, cart_id: &Id) -> Result<i64, StoreError> {
        let cart = store
            .get_cart(cart_id)
            .await?
            .ok_or_else(|| StoreError::not_found("Cart", cart_id))?;

        let mut total = 0;
        for line in store.list_lines(&cart.id).await? {
            let Some(config) = store.get_product_config(&line.product_id).await? else {
                log::warn!(
                    "cart {} line {} references missing product {}",
                    cart.id,
                    line.id,
                    line.product_id
                );
                continue;
            };
            total += pricing::line_total(&config, &line.selection, line.quantity);
        }
        Ok(total)
    }
}

async fn require_active_cart<S: Store>(store: &S, cart_id: &Id) -> Result<Cart, StoreError> {
    let cart = store
        .get_cart(cart_id)
        .await?
        .ok_or_else(|| StoreError::not_found("Cart", cart_id))?;
    if !cart.is_active() {
        return Err(StoreError::state_conflict(format!(
            "cart '{}' is checked out and can no longer change",
            cart.id
        )));
    }
    Ok(cart)
}
