use anyhow::Result;

use crate::model::{
    Parameter, ParameterGroup, ParameterSelection, Product, ProductParameterGroup, ProductStatus,
    Special, SpecialItem, SpecialStatus,
};
use crate::store::traits::Store;

/// Load a small demonstration catalog: three configurable window products
/// and one discounted bundle. Ids are fixed so the API can be explored by
/// hand against a fresh database.
pub async fn load_seed_data<S: Store>(store: &S) -> Result<()> {
    // Parameter groups
    store
        .upsert_parameter_group(
            ParameterGroup {
                id: "group-color".to_string(),
                name: "Color".to_string(),
                internal_name: "color".to_string(),
            },
            vec![
                parameter("param-white", "group-color", "White", 0, 0),
                parameter("param-graphite", "group-color", "Graphite", 5_000, 1),
                parameter("param-sand", "group-color", "Sand", 5_000, 2),
            ],
        )
        .await?;

    store
        .upsert_parameter_group(
            ParameterGroup {
                id: "group-width".to_string(),
                name: "Width".to_string(),
                internal_name: "width".to_string(),
            },
            vec![
                parameter("param-w60", "group-width", "60 cm", 0, 0),
                parameter("param-w100", "group-width", "100 cm", 20_000, 1),
                parameter("param-w140", "group-width", "140 cm", 40_000, 2),
            ],
        )
        .await?;

    store
        .upsert_parameter_group(
            ParameterGroup {
                id: "group-fabric".to_string(),
                name: "Fabric".to_string(),
                internal_name: "fabric".to_string(),
            },
            vec![
                parameter("param-linen", "group-fabric", "Linen", 10_000, 0),
                parameter("param-velvet", "group-fabric", "Velvet", 25_000, 1),
            ],
        )
        .await?;

    store
        .upsert_parameter_group(
            ParameterGroup {
                id: "group-length".to_string(),
                name: "Length".to_string(),
                internal_name: "length".to_string(),
            },
            vec![
                parameter("param-l160", "group-length", "1.6 m", 0, 0),
                parameter("param-l240", "group-length", "2.4 m", 8_000, 1),
            ],
        )
        .await?;

    // Products with their group joins
    store
        .upsert_product(product("prod-roller-blind", "Roller Blind", 100_000))
        .await?;
    store
        .upsert_product_parameter_group(join(
            "join-blind-color",
            "prod-roller-blind",
            "group-color",
            Some("param-white"),
            0,
        ))
        .await?;
    store
        .upsert_product_parameter_group(join(
            "join-blind-width",
            "prod-roller-blind",
            "group-width",
            Some("param-w60"),
            1,
        ))
        .await?;

    store
        .upsert_product(product("prod-curtain-panel", "Curtain Panel", 50_000))
        .await?;
    store
        .upsert_product_parameter_group(join(
            "join-panel-color",
            "prod-curtain-panel",
            "group-color",
            Some("param-white"),
            0,
        ))
        .await?;
    store
        .upsert_product_parameter_group(join(
            "join-panel-fabric",
            "prod-curtain-panel",
            "group-fabric",
            None,
            1,
        ))
        .await?;

    store
        .upsert_product(product("prod-curtain-rod", "Curtain Rod", 30_000))
        .await?;
    store
        .upsert_product_parameter_group(join(
            "join-rod-length",
            "prod-curtain-rod",
            "group-length",
            Some("param-l160"),
            0,
        ))
        .await?;

    // Starter kit: linen panel (60,000) + rod (30,000) = 90,000, sold at 75,000.
    let mut panel_selection = ParameterSelection::new();
    panel_selection.choose("join-panel-fabric", "param-linen");

    store
        .upsert_special(
            Special {
                id: "special-starter-kit".to_string(),
                name: "Window Starter Kit".to_string(),
                discounted_price: 75_000,
                status: SpecialStatus::Active,
                created_at: chrono::Utc::now(),
            },
            vec![
                SpecialItem {
                    id: "special-starter-kit-panel".to_string(),
                    special_id: "special-starter-kit".to_string(),
                    product_id: "prod-curtain-panel".to_string(),
                    quantity: 1,
                    selection: panel_selection,
                    position: 0,
                },
                SpecialItem {
                    id: "special-starter-kit-rod".to_string(),
                    special_id: "special-starter-kit".to_string(),
                    product_id: "prod-curtain-rod".to_string(),
                    quantity: 1,
                    selection: ParameterSelection::new(),
                    position: 1,
                },
            ],
        )
        .await?;

    Ok(())
}

fn product(id: &str, name: &str, base_price: i64) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        base_price,
        status: ProductStatus::Active,
        category_id: None,
        created_at: chrono::Utc::now(),
    }
}

fn parameter(id: &str, group_id: &str, name: &str, price_modifier: i64, position: i32) -> Parameter {
    Parameter {
        id: id.to_string(),
        group_id: group_id.to_string(),
        name: name.to_string(),
        price_modifier,
        position,
    }
}

fn join(
    id: &str,
    product_id: &str,
    group_id: &str,
    default_parameter_id: Option<&str>,
    position: i32,
) -> ProductParameterGroup {
    ProductParameterGroup {
        id: id.to_string(),
        product_id: product_id.to_string(),
        group_id: group_id.to_string(),
        default_parameter_id: default_parameter_id.map(|s| s.to_string()),
        position,
    }
}
