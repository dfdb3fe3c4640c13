use forma_store::logic::{CartOperations, OrderOperations, SpecialOperations};
use forma_store::model::{
    Actor, CartStatus, ContactDetails, HistoryAction, Identity, OrderStatus, ParameterSelection,
    ProductStatus,
};
use forma_store::notify::LogNotifier;
use forma_store::seed::load_seed_data;
use forma_store::store::memory::MemoryStore;
use forma_store::store::traits::{CartStore, CatalogStore, OrderStore};
use forma_store::StoreError;

// The seed catalog used throughout:
// - "Roller Blind" at 100,000 with Width "100 cm" = +20,000 on join-blind-width
// - "Window Starter Kit" special: linen Curtain Panel (60,000) + Curtain Rod
//   (30,000) = 90,000 original, discounted to 75,000.

async fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();
    load_seed_data(&store).await.unwrap();
    store
}

fn guest(session: &str) -> Identity {
    Identity::Guest(session.to_string())
}

fn user(id: &str) -> Identity {
    Identity::User(id.to_string())
}

fn contact() -> ContactDetails {
    ContactDetails {
        name: "Grace Hopper".to_string(),
        phone: "+1 212 555 0100".to_string(),
        secondary_phone: None,
        address: "1 Harbor Lane".to_string(),
    }
}

fn large_blind_selection() -> ParameterSelection {
    let mut selection = ParameterSelection::new();
    selection.choose("join-blind-width", "param-w100");
    selection
}

#[tokio::test]
async fn test_configured_price_flows_into_cart_total() {
    let store = seeded_store().await;
    let cart = CartOperations::get_or_create_cart(&store, &guest("s-price"))
        .await
        .unwrap();

    // 100,000 base + 20,000 width modifier, times 3.
    CartOperations::add_item(
        &store,
        &cart.id,
        &"prod-roller-blind".to_string(),
        3,
        large_blind_selection(),
    )
    .await
    .unwrap();

    let total = CartOperations::cart_total(&store, &cart.id).await.unwrap();
    assert_eq!(total, 360_000);
}

#[tokio::test]
async fn test_stale_selection_entries_price_as_base() {
    let store = seeded_store().await;
    let cart = CartOperations::get_or_create_cart(&store, &guest("s-stale"))
        .await
        .unwrap();

    // Neither entry resolves: one names a join the product does not have,
    // the other puts a fabric parameter on the width join.
    let mut selection = ParameterSelection::new();
    selection.choose("join-rod-length", "param-l240");
    selection.choose("join-blind-width", "param-linen");

    CartOperations::add_item(
        &store,
        &cart.id,
        &"prod-roller-blind".to_string(),
        1,
        selection,
    )
    .await
    .unwrap();

    let total = CartOperations::cart_total(&store, &cart.id).await.unwrap();
    assert_eq!(total, 100_000);
}

#[tokio::test]
async fn test_distinct_add_calls_stay_distinct_lines() {
    let store = seeded_store().await;
    let cart = CartOperations::get_or_create_cart(&store, &guest("s-distinct"))
        .await
        .unwrap();

    for _ in 0..2 {
        CartOperations::add_item(
            &store,
            &cart.id,
            &"prod-roller-blind".to_string(),
            1,
            large_blind_selection(),
        )
        .await
        .unwrap();
    }

    assert_eq!(store.list_lines(&cart.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_quantity_validation_rejects_before_write() {
    let store = seeded_store().await;
    let cart = CartOperations::get_or_create_cart(&store, &guest("s-qty"))
        .await
        .unwrap();

    let result = CartOperations::add_item(
        &store,
        &cart.id,
        &"prod-roller-blind".to_string(),
        0,
        ParameterSelection::new(),
    )
    .await;
    assert!(matches!(result, Err(StoreError::Validation(_))));
    assert!(store.list_lines(&cart.id).await.unwrap().is_empty());

    // update_item rejects a non-positive quantity instead of deleting.
    let line = CartOperations::add_item(
        &store,
        &cart.id,
        &"prod-roller-blind".to_string(),
        2,
        ParameterSelection::new(),
    )
    .await
    .unwrap();
    let result = CartOperations::update_item(&store, &line.id, Some(0), None).await;
    assert!(matches!(result, Err(StoreError::Validation(_))));
    assert_eq!(store.list_lines(&cart.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_bundle_add_and_remove_are_all_or_nothing() {
    let store = seeded_store().await;
    let special_id = "special-starter-kit".to_string();
    let cart = CartOperations::get_or_create_cart(&store, &guest("s-bundle"))
        .await
        .unwrap();

    let lines = CartOperations::add_bundle(&store, &cart.id, &special_id)
        .await
        .unwrap();
    assert_eq!(lines.len(), 2);
    assert!(lines
        .iter()
        .all(|l| l.special_id.as_deref() == Some("special-starter-kit")));

    // Bundle lines resist individual mutation.
    let first = &lines[0];
    assert!(matches!(
        CartOperations::remove_item(&store, &first.id).await,
        Err(StoreError::StateConflict(_))
    ));
    assert!(matches!(
        CartOperations::update_item(&store, &first.id, Some(5), None).await,
        Err(StoreError::StateConflict(_))
    ));
    assert_eq!(store.list_lines(&cart.id).await.unwrap().len(), 2);

    // Removal takes the whole bundle with it.
    let removed = CartOperations::remove_bundle(&store, &cart.id, &special_id)
        .await
        .unwrap();
    assert_eq!(removed, 2);
    assert!(store.list_lines(&cart.id).await.unwrap().is_empty());

    // A second removal has nothing to remove.
    assert!(matches!(
        CartOperations::remove_bundle(&store, &cart.id, &special_id).await,
        Err(StoreError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_bundle_lines_price_via_their_fixed_selection() {
    let store = seeded_store().await;
    let cart = CartOperations::get_or_create_cart(&store, &guest("s-bundle-price"))
        .await
        .unwrap();

    CartOperations::add_bundle(&store, &cart.id, &"special-starter-kit".to_string())
        .await
        .unwrap();

    // Linen panel 50,000 + 10,000, rod 30,000.
    let total = CartOperations::cart_total(&store, &cart.id).await.unwrap();
    assert_eq!(total, 90_000);
}

#[tokio::test]
async fn test_special_savings_are_derived_live() {
    let store = seeded_store().await;
    let pricing = SpecialOperations::pricing(&store, &"special-starter-kit".to_string())
        .await
        .unwrap();
    assert_eq!(pricing.original_price, 90_000);
    assert_eq!(pricing.discounted_price, 75_000);
    assert_eq!(pricing.savings, 15_000);

    // Raising a component's base price moves the derived numbers with it.
    let mut rod = store
        .get_product(&"prod-curtain-rod".to_string())
        .await
        .unwrap()
        .unwrap();
    rod.base_price = 40_000;
    store.upsert_product(rod).await.unwrap();

    let pricing = SpecialOperations::pricing(&store, &"special-starter-kit".to_string())
        .await
        .unwrap();
    assert_eq!(pricing.original_price, 100_000);
    assert_eq!(pricing.savings, 25_000);
    assert_eq!(pricing.savings_percent, 25);
}

#[tokio::test]
async fn test_guest_merge_is_idempotent() {
    let store = seeded_store().await;
    let guest_id = guest("s-merge");

    let guest_cart = CartOperations::get_or_create_cart(&store, &guest_id)
        .await
        .unwrap();
    for _ in 0..2 {
        CartOperations::add_item(
            &store,
            &guest_cart.id,
            &"prod-roller-blind".to_string(),
            1,
            ParameterSelection::new(),
        )
        .await
        .unwrap();
    }

    let user_cart = CartOperations::get_or_create_cart(&store, &user("u-merge"))
        .await
        .unwrap();
    CartOperations::add_item(
        &store,
        &user_cart.id,
        &"prod-curtain-rod".to_string(),
        1,
        ParameterSelection::new(),
    )
    .await
    .unwrap();

    let merged = CartOperations::merge_guest_cart_into_user(&store, &"s-merge".to_string(), &"u-merge".to_string())
        .await
        .unwrap();
    assert_eq!(merged.id, user_cart.id);
    assert_eq!(store.list_lines(&merged.id).await.unwrap().len(), 3);

    // The guest cart is retired, so running the login hook again changes
    // nothing.
    let merged_again = CartOperations::merge_guest_cart_into_user(&store, &"s-merge".to_string(), &"u-merge".to_string())
        .await
        .unwrap();
    assert_eq!(merged_again.id, user_cart.id);
    assert_eq!(store.list_lines(&merged.id).await.unwrap().len(), 3);

    let retired = store.get_cart(&guest_cart.id).await.unwrap().unwrap();
    assert_eq!(retired.status, CartStatus::CheckedOut);
}

#[tokio::test]
async fn test_checkout_freezes_cart_and_price() {
    let store = seeded_store().await;
    let buyer = user("u-checkout");
    let cart = CartOperations::get_or_create_cart(&store, &buyer)
        .await
        .unwrap();
    CartOperations::add_item(
        &store,
        &cart.id,
        &"prod-roller-blind".to_string(),
        3,
        large_blind_selection(),
    )
    .await
    .unwrap();

    let order = OrderOperations::create_order(&store, &LogNotifier, &cart.id, &buyer, contact())
        .await
        .unwrap();
    assert_eq!(order.total_price, 360_000);
    assert_eq!(order.status, OrderStatus::Pending);

    // The source cart is terminal now; adding to it is a state conflict
    // and leaves the line count untouched.
    let before = store.list_lines(&cart.id).await.unwrap().len();
    let result = CartOperations::add_item(
        &store,
        &cart.id,
        &"prod-curtain-rod".to_string(),
        1,
        ParameterSelection::new(),
    )
    .await;
    assert!(matches!(result, Err(StoreError::StateConflict(_))));
    assert_eq!(store.list_lines(&cart.id).await.unwrap().len(), before);

    // A second checkout of the same cart is rejected the same way.
    let result =
        OrderOperations::create_order(&store, &LogNotifier, &cart.id, &buyer, contact()).await;
    assert!(matches!(result, Err(StoreError::StateConflict(_))));

    // Later catalog edits never touch the frozen total.
    let mut blind = store
        .get_product(&"prod-roller-blind".to_string())
        .await
        .unwrap()
        .unwrap();
    blind.base_price = 250_000;
    store.upsert_product(blind).await.unwrap();

    let reread = store.get_order(&order.id).await.unwrap().unwrap();
    assert_eq!(reread.total_price, 360_000);

    // Line snapshots carry the name and unit price as sold.
    let lines = store.list_order_lines(&order.id).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].product_name, "Roller Blind");
    assert_eq!(lines[0].unit_price, 120_000);
}

#[tokio::test]
async fn test_empty_cart_cannot_check_out() {
    let store = seeded_store().await;
    let buyer = guest("s-empty");
    let cart = CartOperations::get_or_create_cart(&store, &buyer)
        .await
        .unwrap();

    let result =
        OrderOperations::create_order(&store, &LogNotifier, &cart.id, &buyer, contact()).await;
    assert!(matches!(result, Err(StoreError::Validation(_))));

    // The cart stays active and usable.
    assert!(store.get_cart(&cart.id).await.unwrap().unwrap().is_active());
}

#[tokio::test]
async fn test_order_audit_trail_and_attribution() {
    let store = seeded_store().await;
    let buyer = user("u-audit");
    let cart = CartOperations::get_or_create_cart(&store, &buyer)
        .await
        .unwrap();
    CartOperations::add_item(
        &store,
        &cart.id,
        &"prod-curtain-rod".to_string(),
        1,
        ParameterSelection::new(),
    )
    .await
    .unwrap();

    let order = OrderOperations::create_order(&store, &LogNotifier, &cart.id, &buyer, contact())
        .await
        .unwrap();

    let history = OrderOperations::order_history(&store, &order.id)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].action, HistoryAction::Created);
    assert_eq!(history[0].new_value.as_deref(), Some("pending"));
    assert_eq!(history[0].actor, Actor::User("u-audit".to_string()));

    // A real transition appends exactly one attributed row.
    OrderOperations::update_order_status(
        &store,
        &order.id,
        OrderStatus::Processing,
        Some("admin-7".to_string()),
    )
    .await
    .unwrap();

    let history = OrderOperations::order_history(&store, &order.id)
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].action, HistoryAction::StatusChanged);
    assert_eq!(history[0].field.as_deref(), Some("status"));
    assert_eq!(history[0].old_value.as_deref(), Some("pending"));
    assert_eq!(history[0].new_value.as_deref(), Some("processing"));
    assert_eq!(history[0].actor, Actor::Admin("admin-7".to_string()));

    // Repeating the same status is a no-op and is not audited.
    OrderOperations::update_order_status(
        &store,
        &order.id,
        OrderStatus::Processing,
        Some("admin-7".to_string()),
    )
    .await
    .unwrap();
    let history = OrderOperations::order_history(&store, &order.id)
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
}

#[tokio::test]
async fn test_guest_order_is_unattributed() {
    let store = seeded_store().await;
    let buyer = guest("s-guest-order");
    let cart = CartOperations::get_or_create_cart(&store, &buyer)
        .await
        .unwrap();
    CartOperations::add_item(
        &store,
        &cart.id,
        &"prod-curtain-rod".to_string(),
        1,
        ParameterSelection::new(),
    )
    .await
    .unwrap();

    let order = OrderOperations::create_order(&store, &LogNotifier, &cart.id, &buyer, contact())
        .await
        .unwrap();

    let history = OrderOperations::order_history(&store, &order.id)
        .await
        .unwrap();
    assert_eq!(history[0].actor, Actor::System);
}

#[tokio::test]
async fn test_inactive_product_cannot_be_added() {
    let store = seeded_store().await;
    let cart = CartOperations::get_or_create_cart(&store, &guest("s-inactive"))
        .await
        .unwrap();

    let mut blind = store
        .get_product(&"prod-roller-blind".to_string())
        .await
        .unwrap()
        .unwrap();
    blind.status = ProductStatus::Inactive;
    store.upsert_product(blind).await.unwrap();

    let result = CartOperations::add_item(
        &store,
        &cart.id,
        &"prod-roller-blind".to_string(),
        1,
        ParameterSelection::new(),
    )
    .await;
    assert!(matches!(result, Err(StoreError::Validation(_))));

    let missing: Result<_, _> = CartOperations::add_item(
        &store,
        &cart.id,
        &"prod-unknown".to_string(),
        1,
        ParameterSelection::new(),
    )
    .await;
    assert!(matches!(missing, Err(StoreError::NotFound { .. })));
}
