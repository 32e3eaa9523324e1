use crate::recipe::{CookingTime, Ingredient, Recipe, SkillLevel};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A partial recipe: the merge-patch shape used to echo local edits
/// upstream, and the stored shape of the remote snapshot. An absent field
/// means "no assertion", never "erase".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PartialRecipe {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skill_level: Option<SkillLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooking_time: Option<CookingTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_preferences: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<Vec<Ingredient>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<Vec<String>>,
}

impl PartialRecipe {
    /// Best-effort extraction from a wire payload. A field of the wrong
    /// shape parses as absent rather than failing the whole delivery; the
    /// remote side is a generative process, not a validated interface.
    pub fn from_value(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return Self::default();
        };

        Self {
            title: object
                .get("title")
                .and_then(Value::as_str)
                .map(str::to_string),
            skill_level: object
                .get("skill_level")
                .filter(|raw| raw.is_string())
                .and_then(|raw| serde_json::from_value(raw.clone()).ok()),
            cooking_time: object
                .get("cooking_time")
                .filter(|raw| raw.is_string())
                .and_then(|raw| serde_json::from_value(raw.clone()).ok()),
            special_preferences: object
                .get("special_preferences")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                }),
            ingredients: object
                .get("ingredients")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter(|item| item.is_object())
                        .filter_map(|item| serde_json::from_value(item.clone()).ok())
                        .collect()
                }),
            instructions: object.get("instructions").and_then(Value::as_array).map(
                |items| {
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                },
            ),
        }
    }

    /// Shallow field-level merge: a present field in `patch` replaces this
    /// one wholesale, including sequence fields.
    pub fn merge(&mut self, patch: &PartialRecipe) {
        if let Some(title) = &patch.title {
            self.title = Some(title.clone());
        }
        if let Some(skill_level) = patch.skill_level {
            self.skill_level = Some(skill_level);
        }
        if let Some(cooking_time) = patch.cooking_time {
            self.cooking_time = Some(cooking_time);
        }
        if let Some(special_preferences) = &patch.special_preferences {
            self.special_preferences = Some(special_preferences.clone());
        }
        if let Some(ingredients) = &patch.ingredients {
            self.ingredients = Some(ingredients.clone());
        }
        if let Some(instructions) = &patch.instructions {
            self.instructions = Some(instructions.clone());
        }
    }

    /// Field-level replace onto a complete document.
    pub fn apply_to(&self, recipe: &mut Recipe) {
        if let Some(title) = &self.title {
            recipe.title = title.clone();
        }
        if let Some(skill_level) = self.skill_level {
            recipe.skill_level = skill_level;
        }
        if let Some(cooking_time) = self.cooking_time {
            recipe.cooking_time = cooking_time;
        }
        if let Some(special_preferences) = &self.special_preferences {
            recipe.special_preferences = special_preferences.clone();
        }
        if let Some(ingredients) = &self.ingredients {
            recipe.ingredients = ingredients.clone();
        }
        if let Some(instructions) = &self.instructions {
            recipe.instructions = instructions.clone();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.skill_level.is_none()
            && self.cooking_time.is_none()
            && self.special_preferences.is_none()
            && self.ingredients.is_none()
            && self.instructions.is_none()
    }

    pub fn with_title(title: String) -> Self {
        Self {
            title: Some(title),
            ..Self::default()
        }
    }

    pub fn with_skill_level(skill_level: SkillLevel) -> Self {
        Self {
            skill_level: Some(skill_level),
            ..Self::default()
        }
    }

    pub fn with_cooking_time(cooking_time: CookingTime) -> Self {
        Self {
            cooking_time: Some(cooking_time),
            ..Self::default()
        }
    }

    pub fn with_special_preferences(special_preferences: Vec<String>) -> Self {
        Self {
            special_preferences: Some(special_preferences),
            ..Self::default()
        }
    }

    pub fn with_ingredients(ingredients: Vec<Ingredient>) -> Self {
        Self {
            ingredients: Some(ingredients),
            ..Self::default()
        }
    }

    pub fn with_instructions(instructions: Vec<String>) -> Self {
        Self {
            instructions: Some(instructions),
            ..Self::default()
        }
    }
}

impl From<&Recipe> for PartialRecipe {
    fn from(recipe: &Recipe) -> Self {
        Self {
            title: Some(recipe.title.clone()),
            skill_level: Some(recipe.skill_level),
            cooking_time: Some(recipe.cooking_time),
            special_preferences: Some(recipe.special_preferences.clone()),
            ingredients: Some(recipe.ingredients.clone()),
            instructions: Some(recipe.instructions.clone()),
        }
    }
}
