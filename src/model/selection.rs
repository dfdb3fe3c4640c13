use crate::error::StoreError;
use crate::model::catalog::ProductConfig;
use crate::model::Id;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Chosen parameters for one product instance.
///
/// Keyed by the product's parameter-group *join-row* id, not the group id:
/// a product may join the same semantic group twice ("combined groups"),
/// and only the join row disambiguates which axis a choice targets. At most
/// one parameter per join row; a BTreeMap keeps iteration deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSelection(BTreeMap<Id, Id>);

impl ParameterSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a choice for a join row, replacing any earlier choice for the
    /// same row. No validation happens here: the calculator skips entries
    /// it cannot resolve, and callers that want construction-time checking
    /// use [`SelectionBuilder`].
    pub fn choose(&mut self, join_id: impl Into<Id>, parameter_id: impl Into<Id>) -> &mut Self {
        self.0.insert(join_id.into(), parameter_id.into());
        self
    }

    pub fn get(&self, join_id: &str) -> Option<&Id> {
        self.0.get(join_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Id, &Id)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Id, Id)> for ParameterSelection {
    fn from_iter<T: IntoIterator<Item = (Id, Id)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Builds a [`ParameterSelection`] validated against a product's resolved
/// configuration, so stale or foreign ids are rejected when the selection
/// is assembled rather than silently dropped later.
pub struct SelectionBuilder<'a> {
    config: &'a ProductConfig,
    chosen: BTreeMap<Id, Id>,
}

impl<'a> SelectionBuilder<'a> {
    pub fn new(config: &'a ProductConfig) -> Self {
        Self {
            config,
            chosen: BTreeMap::new(),
        }
    }

    /// Pre-fill every join row's default parameter, where one is set.
    pub fn with_defaults(mut self) -> Self {
        for group in &self.config.groups {
            if let Some(default) = group.default_parameter() {
                self.chosen
                    .insert(group.join.id.clone(), default.id.clone());
            }
        }
        self
    }

    /// Choose a parameter for a join row. Fails if the join row does not
    /// belong to this product or the parameter does not belong to the
    /// joined group.
    pub fn choose(mut self, join_id: &str, parameter_id: &str) -> Result<Self, StoreError> {
        let group = self.config.group_by_join(join_id).ok_or_else(|| {
            StoreError::validation(format!(
                "product '{}' has no parameter group join '{}'",
                self.config.product.id, join_id
            ))
        })?;

        if group.parameter(parameter_id).is_none() {
            return Err(StoreError::validation(format!(
                "parameter '{}' does not belong to group '{}'",
                parameter_id, group.group.name
            )));
        }

        self.chosen
            .insert(join_id.to_string(), parameter_id.to_string());
        Ok(self)
    }

    pub fn build(self) -> ParameterSelection {
        ParameterSelection(self.chosen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::catalog::test_fixtures::product_with_groups;

    #[test]
    fn test_choose_replaces_earlier_choice() {
        let mut selection = ParameterSelection::new();
        selection.choose("join-1", "param-a");
        selection.choose("join-1", "param-b");
        assert_eq!(selection.len(), 1);
        assert_eq!(selection.get("join-1"), Some(&"param-b".to_string()));
    }

    #[test]
    fn test_builder_rejects_foreign_parameter() {
        let config = product_with_groups();
        let result = SelectionBuilder::new(&config).choose("join-size", "param-red");
        assert!(matches!(result, Err(StoreError::Validation(_))));
    }

    #[test]
    fn test_builder_rejects_unknown_join() {
        let config = product_with_groups();
        let result = SelectionBuilder::new(&config).choose("join-missing", "param-large");
        assert!(matches!(result, Err(StoreError::Validation(_))));
    }

    #[test]
    fn test_builder_defaults_cover_joins_with_default() {
        let config = product_with_groups();
        let selection = SelectionBuilder::new(&config).with_defaults().build();
        // Only the size join declares a default parameter.
        assert_eq!(selection.len(), 1);
        assert_eq!(
            selection.get("join-size"),
            Some(&"param-small".to_string())
        );
    }
}
