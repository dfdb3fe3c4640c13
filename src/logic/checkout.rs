use crate::error::StoreError;
use crate::logic::pricing;
use crate::model::{
    Actor, ContactDetails, HistoryAction, HistoryEntry, Id, Identity, Order, OrderLine,
    OrderStatus, ENTITY_ORDER,
};
use crate::notify::OrderNotifier;
use crate::store::traits::Store;

/// Order creation and the audited status lifecycle.
pub struct OrderOperations;

impl OrderOperations {
    /// Create an order from an active cart.
    ///
    /// The total is computed live from the calculator (the last moment
    /// prices are derived), then frozen onto the order together
    /// with per-line snapshots. Order insertion and the cart's transition
    /// to checked_out are one atomic storage unit. The audit row and the
    /// notification are best-effort afterthoughts: their failure is
    /// logged, never surfaced.
    pub async fn create_order<S: Store, N: OrderNotifier + ?Sized>(
        store: &S,
        notifier: &N,
        cart_id: &Id,
        buyer: &Identity,
        contact: ContactDetails,
    ) -> Result<Order, StoreError> {
        contact.validate()?;

        let cart = store
            .get_cart(cart_id)
            .await?
            .ok_or_else(|| StoreError::not_found("Cart", cart_id))?;
        if !cart.is_active() {
            return Err(StoreError::state_conflict(format!(
                "cart '{}' is already checked out",
                cart.id
            )));
        }

        let cart_lines = store.list_lines(&cart.id).await?;
        if cart_lines.is_empty() {
            return Err(StoreError::validation("cart is empty"));
        }

        let order_id = crate::model::generate_id();
        let mut order_lines = Vec::with_capacity(cart_lines.len());
        let mut total = 0;
        for line in cart_lines {
            let Some(config) = store.get_product_config(&line.product_id).await? else {
                log::warn!(
                    "cart {} line {} references missing product {}, skipping at checkout",
                    cart.id,
                    line.id,
                    line.product_id
                );
                continue;
            };
            let unit_price = pricing::unit_price(&config, &line.selection);
            total += unit_price * line.quantity;
            order_lines.push(OrderLine {
                id: crate::model::generate_id(),
                order_id: order_id.clone(),
                product_id: line.product_id,
                product_name: config.product.name,
                quantity: line.quantity,
                unit_price,
                selection: line.selection,
                special_id: line.special_id,
            });
        }

        let mut order = Order::new(cart.id.clone(), buyer.clone(), contact, total);
        order.id = order_id;

        let committed = store
            .create_order_from_cart(order.clone(), order_lines.clone())
            .await?;
        if !committed {
            return Err(StoreError::state_conflict(format!(
                "cart '{}' is already checked out",
                cart.id
            )));
        }

        let entry = HistoryEntry::created(
            ENTITY_ORDER,
            order.id.clone(),
            OrderStatus::Pending.as_str(),
            buyer.actor(),
        );
        if let Err(e) = store.append_history(entry).await {
            log::warn!("failed to record creation history for order {}: {}", order.id, e);
        }

        if let Err(e) = notifier.notify_order_created(&order, &order_lines).await {
            log::warn!("failed to send notification for order {}: {}", order.id, e);
        }

        Ok(order)
    }

    /// Change an order's status, appending exactly one audit row.
    ///
    /// A no-op change (same status) writes neither an update nor a history
    /// row. Any status may move to any other; the audit trail records what
    /// happened rather than a transition table forbidding it.
    pub async fn update_order_status<S: Store>(
        store: &S,
        order_id: &Id,
        new_status: OrderStatus,
        admin_id: Option<Id>,
    ) -> Result<Order, StoreError> {
        let mut order = store
            .get_order(order_id)
            .await?
            .ok_or_else(|| StoreError::not_found("Order", order_id))?;

        if order.status == new_status {
            return Ok(order);
        }

        let old_status = order.status;
        let updated = store.update_order_status(order_id, new_status).await?;
        if !updated {
            return Err(StoreError::not_found("Order", order_id));
        }
        order.status = new_status;
        order.updated_at = chrono::Utc::now();

        let actor = match admin_id {
            Some(id) => Actor::Admin(id),
            None => Actor::System,
        };
        let entry = HistoryEntry::field_changed(
            ENTITY_ORDER,
            order.id.clone(),
            HistoryAction::StatusChanged,
            "status",
            old_status.as_str(),
            new_status.as_str(),
            actor,
        );
        if let Err(e) = store.append_history(entry).await {
            log::warn!(
                "failed to record status history for order {}: {}",
                order.id,
                e
            );
        }

        Ok(order)
    }

    /// The order's audit trail, newest first.
    pub async fn order_history<S: Store>(
        store: &S,
        order_id: &Id,
    ) -> Result<Vec<HistoryEntry>, StoreError> {
        if store.get_order(order_id).await?.is_none() {
            return Err(StoreError::not_found("Order", order_id));
        }
        Ok(store.list_history(ENTITY_ORDER, order_id).await?)
    }
}
