use crate::model::selection::ParameterSelection;
use crate::model::{generate_id, Id};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Active,
    Inactive,
    Draft,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Active => "active",
            ProductStatus::Inactive => "inactive",
            ProductStatus::Draft => "draft",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(ProductStatus::Active),
            "inactive" => Some(ProductStatus::Inactive),
            "draft" => Some(ProductStatus::Draft),
            _ => None,
        }
    }
}

/// A sellable product. Prices are integer minor units; orders snapshot the
/// calculated price at creation, so later edits here never reprice an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Id,
    pub name: String,
    pub base_price: i64,
    pub status: ProductStatus,
    pub category_id: Option<Id>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Product {
    pub fn new(name: String, base_price: i64) -> Self {
        Self {
            id: generate_id(),
            name,
            base_price,
            status: ProductStatus::Active,
            category_id: None,
            created_at: chrono::Utc::now(),
        }
    }
}

/// A named axis of configuration (e.g. Color, Width).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterGroup {
    pub id: Id,
    pub name: String,
    pub internal_name: String,
}

/// One selectable value inside a group. The modifier may be negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub id: Id,
    pub group_id: Id,
    pub name: String,
    pub price_modifier: i64,
    pub position: i32,
}

/// Join row attaching a parameter group to a product.
///
/// Join rows have identity of their own: a product may attach the same
/// group twice, and each attachment is a distinct selectable axis with its
/// own optional default parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductParameterGroup {
    pub id: Id,
    pub product_id: Id,
    pub group_id: Id,
    pub default_parameter_id: Option<Id>,
    pub position: i32,
}

/// A product's fully resolved configuration: the read model the pricing
/// calculator and the configurator UI both consume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductConfig {
    pub product: Product,
    pub groups: Vec<GroupConfig>,
}

/// One join row with its group and the group's parameters resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupConfig {
    pub join: ProductParameterGroup,
    pub group: ParameterGroup,
    pub parameters: Vec<Parameter>,
}

impl ProductConfig {
    pub fn group_by_join(&self, join_id: &str) -> Option<&GroupConfig> {
        self.groups.iter().find(|g| g.join.id == join_id)
    }

    /// Selection with every defaulted join row pre-chosen, the state a
    /// configurator starts from.
    pub fn default_selection(&self) -> ParameterSelection {
        self.groups
            .iter()
            .filter_map(|g| {
                g.default_parameter()
                    .map(|p| (g.join.id.clone(), p.id.clone()))
            })
            .collect()
    }
}

impl GroupConfig {
    pub fn parameter(&self, parameter_id: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.id == parameter_id)
    }

    /// The join's default parameter, if one is set and still belongs to
    /// the group.
    pub fn default_parameter(&self) -> Option<&Parameter> {
        self.join
            .default_parameter_id
            .as_deref()
            .and_then(|id| self.parameter(id))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecialStatus {
    Active,
    Inactive,
}

impl SpecialStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpecialStatus::Active => "active",
            SpecialStatus::Inactive => "inactive",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(SpecialStatus::Active),
            "inactive" => Some(SpecialStatus::Inactive),
            _ => None,
        }
    }
}

/// An admin-curated bundle sold at a fixed discounted price. The original
/// (undiscounted) price is always derived from the items, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Special {
    pub id: Id,
    pub name: String,
    pub discounted_price: i64,
    pub status: SpecialStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Special {
    pub fn new(name: String, discounted_price: i64) -> Self {
        Self {
            id: generate_id(),
            name,
            discounted_price,
            status: SpecialStatus::Active,
            created_at: chrono::Utc::now(),
        }
    }
}

/// One product inside a special, with the configuration fixed by the admin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialItem {
    pub id: Id,
    pub special_id: Id,
    pub product_id: Id,
    pub quantity: i64,
    pub selection: ParameterSelection,
    pub position: i32,
}


#[cfg(test)]
mod tests {
    use super::test_fixtures::product_with_groups;

    #[test]
    fn test_default_selection_skips_joins_without_default() {
        let config = product_with_groups();
        let selection = config.default_selection();
        assert_eq!(selection.len(), 1);
        assert_eq!(selection.get("join-size"), Some(&"param-small".to_string()));
        assert_eq!(selection.get("join-color"), None);
    }

    #[test]
    fn test_default_parameter_ignores_dangling_reference() {
        let mut config = product_with_groups();
        config.groups[0].join.default_parameter_id = Some("param-gone".to_string());
        assert!(config.groups[0].default_parameter().is_none());
    }
}
