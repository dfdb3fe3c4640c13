use crate::model::{ParameterSelection, ProductConfig};

/// Calculates the unit price of a configured product.
///
/// Starts from the base price and adds the modifier of each selected
/// parameter. An entry that references a join row the product does not
/// have, or a parameter outside the joined group, contributes nothing;
/// silent skip is the contract, so a stale selection can never make
/// pricing fail. Each join row contributes at most once because the
/// selection is keyed by join-row id.
pub fn unit_price(config: &ProductConfig, selection: &ParameterSelection) -> i64 {
    let mut price = config.product.base_price;

    for (join_id, parameter_id) in selection.iter() {
        let Some(group) = config.group_by_join(join_id) else {
            continue;
        };
        let Some(parameter) = group.parameter(parameter_id) else {
            continue;
        };
        price += parameter.price_modifier;
    }

    price
}

pub fn line_total(config: &ProductConfig, selection: &ParameterSelection, quantity: i64) -> i64 {
    unit_price(config, selection) * quantity
}
