use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub mod mirror;
pub mod partial;
pub mod reconcile;

pub const PLACEHOLDER_ICON: &str = "🍴";

pub const SPECIAL_PREFERENCES: [&str; 7] = [
    "High Protein",
    "Low Carb",
    "Spicy",
    "Budget-Friendly",
    "One-Pot Meal",
    "Vegetarian",
    "Vegan",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SkillLevel {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

impl SkillLevel {
    pub const ALL: [SkillLevel; 3] = [Self::Beginner, Self::Intermediate, Self::Advanced];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::Intermediate => "Intermediate",
            Self::Advanced => "Advanced",
        }
    }
}

impl Serialize for SkillLevel {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SkillLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.as_str() {
            "Beginner" => Self::Beginner,
            "Intermediate" => Self::Intermediate,
            "Advanced" => Self::Advanced,
            _ => Self::default(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CookingTime {
    FiveMin,
    FifteenMin,
    ThirtyMin,
    #[default]
    FortyFiveMin,
    SixtyPlusMin,
}

impl CookingTime {
    pub const ALL: [CookingTime; 5] = [
        Self::FiveMin,
        Self::FifteenMin,
        Self::ThirtyMin,
        Self::FortyFiveMin,
        Self::SixtyPlusMin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FiveMin => "5 min",
            Self::FifteenMin => "15 min",
            Self::ThirtyMin => "30 min",
            Self::FortyFiveMin => "45 min",
            Self::SixtyPlusMin => "60+ min",
        }
    }
}

impl Serialize for CookingTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CookingTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.as_str() {
            "5 min" => Self::FiveMin,
            "15 min" => Self::FifteenMin,
            "30 min" => Self::ThirtyMin,
            "45 min" => Self::FortyFiveMin,
            "60+ min" => Self::SixtyPlusMin,
            _ => Self::default(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    #[serde(default = "default_icon", deserialize_with = "deserialize_icon")]
    pub icon: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub amount: String,
}

impl Ingredient {
    pub fn new(icon: &str, name: &str, amount: &str) -> Self {
        Self {
            icon: icon.to_string(),
            name: name.to_string(),
            amount: amount.to_string(),
        }
    }

    pub fn display_icon(&self) -> &str {
        if self.icon.is_empty() {
            PLACEHOLDER_ICON
        } else {
            &self.icon
        }
    }
}

fn default_icon() -> String {
    PLACEHOLDER_ICON.to_string()
}

fn deserialize_icon<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let icon = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
    if icon.is_empty() {
        Ok(PLACEHOLDER_ICON.to_string())
    } else {
        Ok(icon)
    }
}

/// The six top-level fields of the shared document. Reconciliation and
/// change-set annotation are driven by this enumeration, never by name
/// lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RecipeField {
    Title,
    SkillLevel,
    CookingTime,
    SpecialPreferences,
    Ingredients,
    Instructions,
}

impl RecipeField {
    pub const ALL: [RecipeField; 6] = [
        Self::Title,
        Self::SkillLevel,
        Self::CookingTime,
        Self::SpecialPreferences,
        Self::Ingredients,
        Self::Instructions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::SkillLevel => "skill_level",
            Self::CookingTime => "cooking_time",
            Self::SpecialPreferences => "special_preferences",
            Self::Ingredients => "ingredients",
            Self::Instructions => "instructions",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub title: String,
    pub skill_level: SkillLevel,
    pub cooking_time: CookingTime,
    pub special_preferences: Vec<String>,
    pub ingredients: Vec<Ingredient>,
    pub instructions: Vec<String>,
}

impl Recipe {
    /// The fixed document every session starts from.
    pub fn starter() -> Self {
        Self {
            title: "My Delicious Recipe".to_string(),
            skill_level: SkillLevel::Intermediate,
            cooking_time: CookingTime::FortyFiveMin,
            special_preferences: Vec::new(),
            ingredients: vec![
                Ingredient::new("🥕", "Carrots", "3 large, grated"),
                Ingredient::new("🌾", "All-Purpose Flour", "2 cups"),
            ],
            instructions: vec!["Preheat oven to 350°F (175°C)".to_string()],
        }
    }
}

impl Default for Recipe {
    fn default() -> Self {
        Self::starter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn skill_level_round_trips_through_its_label() {
        let value = serde_json::to_value(SkillLevel::Advanced).expect("level should serialize");
        assert_eq!(value, json!("Advanced"));
        let parsed: SkillLevel =
            serde_json::from_value(value).expect("level label should deserialize");
        assert_eq!(parsed, SkillLevel::Advanced);
    }

    #[test]
    fn unknown_enum_labels_coerce_to_defaults() {
        let level: SkillLevel =
            serde_json::from_value(json!("Grandmaster")).expect("unknown label should coerce");
        assert_eq!(level, SkillLevel::Intermediate);

        let time: CookingTime =
            serde_json::from_value(json!("90 min")).expect("unknown label should coerce");
        assert_eq!(time, CookingTime::FortyFiveMin);
    }

    #[test]
    fn missing_ingredient_icon_falls_back_to_placeholder() {
        let ingredient: Ingredient =
            serde_json::from_value(json!({ "name": "Salt", "amount": "1 tsp" }))
                .expect("partial ingredient should deserialize");
        assert_eq!(ingredient.icon, PLACEHOLDER_ICON);
        assert_eq!(ingredient.display_icon(), PLACEHOLDER_ICON);
    }

    #[test]
    fn starter_document_matches_the_session_defaults() {
        let recipe = Recipe::starter();
        assert_eq!(recipe.title, "My Delicious Recipe");
        assert_eq!(recipe.skill_level, SkillLevel::Intermediate);
        assert_eq!(recipe.cooking_time, CookingTime::FortyFiveMin);
        assert!(recipe.special_preferences.is_empty());
        assert_eq!(recipe.ingredients.len(), 2);
        assert_eq!(recipe.instructions.len(), 1);
    }
}
