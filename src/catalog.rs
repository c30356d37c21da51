//! Recipe catalog.
//!
//! Owns the registered recipe templates, keyed by the materials they
//! produce. A planner or repair run receives the catalog explicitly; there
//! is no process-wide registry.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{CatalogError, GraphError};
use crate::graph::RecipeTemplate;
use crate::models::Recipe;

/// Registered recipe templates by produced material.
#[derive(Debug, Clone, Default)]
pub struct RecipeCatalog {
    by_material: BTreeMap<String, Vec<Arc<RecipeTemplate>>>,
    codes: HashSet<String>,
}

impl RecipeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds and registers the template of `recipe`.
    ///
    /// A recipe whose code is already registered is ignored. Returns
    /// whether the recipe was added.
    pub fn add_recipe(&mut self, recipe: &Recipe, locked: bool) -> Result<bool, GraphError> {
        if self.codes.contains(&recipe.code) {
            debug!(recipe = %recipe.code, "recipe already registered, ignored");
            return Ok(false);
        }
        let template = RecipeTemplate::build(recipe, locked)?;
        Ok(self.register(template))
    }

    /// Registers a built template. Returns `false` for a known code.
    pub fn register(&mut self, template: RecipeTemplate) -> bool {
        if !self.codes.insert(template.code().to_string()) {
            return false;
        }
        let template = Arc::new(template);
        for material in template.materials() {
            self.by_material
                .entry(material.code.clone())
                .or_default()
                .push(Arc::clone(&template));
        }
        info!(
            recipe = template.code(),
            materials = template.materials().len(),
            locked = template.is_locked(),
            "recipe registered"
        );
        true
    }

    /// Candidate templates for a material, in registration order.
    pub fn candidates(&self, material_code: &str) -> &[Arc<RecipeTemplate>] {
        self.by_material
            .get(material_code)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The template of `recipe_code` producing `material_code`.
    pub fn get(
        &self,
        material_code: &str,
        recipe_code: &str,
    ) -> Result<&Arc<RecipeTemplate>, CatalogError> {
        self.candidates(material_code)
            .iter()
            .find(|t| t.code() == recipe_code)
            .ok_or_else(|| CatalogError::UnknownRecipe {
                material: material_code.to_string(),
                recipe: recipe_code.to_string(),
            })
    }

    pub fn contains(&self, recipe_code: &str) -> bool {
        self.codes.contains(recipe_code)
    }

    /// Number of registered recipes.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Every registered template once.
    pub fn templates(&self) -> impl Iterator<Item = &Arc<RecipeTemplate>> {
        let mut seen = HashSet::new();
        self.by_material
            .values()
            .flatten()
            .filter(move |t| seen.insert(t.code().to_string()))
    }
}
