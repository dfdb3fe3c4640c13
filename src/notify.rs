use crate::model::{Order, OrderLine};
use anyhow::Result;

/// Outbound notification collaborator (email in production).
///
/// Strictly fire-and-forget: callers log failures and carry on. A
/// notification problem is never allowed to fail the order it announces.
#[async_trait::async_trait]
pub trait OrderNotifier: Send + Sync {
    async fn notify_order_created(&self, order: &Order, lines: &[OrderLine]) -> Result<()>;
}

/// Default notifier: writes the notification to the log. Stands in for a
/// mail transport in development and tests.
pub struct LogNotifier;

#[async_trait::async_trait]
impl OrderNotifier for LogNotifier {
    async fn notify_order_created(&self, order: &Order, lines: &[OrderLine]) -> Result<()> {
        log::info!(
            "order {} created for '{}': {} line(s), total {}",
            order.id,
            order.name,
            lines.len(),
            order.total_price
        );
        Ok(())
    }
}
