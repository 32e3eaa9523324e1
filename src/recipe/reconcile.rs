use crate::recipe::partial::PartialRecipe;
use crate::recipe::{Recipe, RecipeField};
use std::collections::BTreeSet;

/// Escaped newlines in agent text must render as real line breaks. Only
/// top-level scalar string fields get this treatment; strings inside
/// sequence and record fields pass through untouched (see the asymmetry
/// tests below).
fn unescape_newlines(raw: &str) -> String {
    raw.replace("\\n", "\n")
}

/// Computes, per pass, which fields of the local replica to adopt from the
/// remote snapshot, and carries the change set that drives the pending-
/// change indicators. Runs on exactly three events: remote snapshot
/// arrival, local edit commit, and stream end.
#[derive(Debug, Default)]
pub struct Reconciler {
    changed: BTreeSet<RecipeField>,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn changed(&self) -> &BTreeSet<RecipeField> {
        &self.changed
    }

    pub fn is_changed(&self, field: RecipeField) -> bool {
        self.changed.contains(&field)
    }

    /// Session reset; not part of a reconciliation pass.
    pub fn reset(&mut self) {
        self.changed.clear();
    }

    /// One full reconciliation pass. Returns the next replica only when at
    /// least one field was adopted, so the caller rebinds at most once per
    /// pass. Absent remote fields are skipped outright; the agent cannot
    /// erase a field by omission.
    pub fn reconcile(
        &mut self,
        remote: &PartialRecipe,
        replica: &Recipe,
        agent_streaming: bool,
    ) -> Option<Recipe> {
        let mut working = replica.clone();
        let mut adopted = BTreeSet::new();

        for field in RecipeField::ALL {
            match field {
                RecipeField::Title => {
                    if let Some(title) = &remote.title {
                        let title = unescape_newlines(title);
                        if title != working.title {
                            working.title = title;
                            adopted.insert(field);
                        }
                    }
                }
                RecipeField::SkillLevel => {
                    if let Some(skill_level) = remote.skill_level {
                        if skill_level != working.skill_level {
                            working.skill_level = skill_level;
                            adopted.insert(field);
                        }
                    }
                }
                RecipeField::CookingTime => {
                    if let Some(cooking_time) = remote.cooking_time {
                        if cooking_time != working.cooking_time {
                            working.cooking_time = cooking_time;
                            adopted.insert(field);
                        }
                    }
                }
                RecipeField::SpecialPreferences => {
                    if let Some(special_preferences) = &remote.special_preferences {
                        if special_preferences != &working.special_preferences {
                            working.special_preferences = special_preferences.clone();
                            adopted.insert(field);
                        }
                    }
                }
                RecipeField::Ingredients => {
                    if let Some(ingredients) = &remote.ingredients {
                        if ingredients != &working.ingredients {
                            working.ingredients = ingredients.clone();
                            adopted.insert(field);
                        }
                    }
                }
                RecipeField::Instructions => {
                    if let Some(instructions) = &remote.instructions {
                        if instructions != &working.instructions {
                            working.instructions = instructions.clone();
                            adopted.insert(field);
                        }
                    }
                }
            }
        }

        if !adopted.is_empty() {
            // Newest pass wins outright; markers never accumulate.
            self.changed = adopted;
            Some(working)
        } else {
            if !agent_streaming {
                // No difference and the channel is quiet: highlights come
                // down. Mid-stream, a momentarily matching snapshot keeps
                // the previous set to avoid flicker.
                self.changed.clear();
            }
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::{CookingTime, Ingredient, SkillLevel};

    fn snapshot_with_title(title: &str) -> PartialRecipe {
        let mut snapshot = PartialRecipe::from(&Recipe::starter());
        snapshot.title = Some(title.to_string());
        snapshot
    }

    #[test]
    fn adopts_a_differing_title_and_reports_only_that_field() {
        let mut reconciler = Reconciler::new();
        let replica = Recipe::starter();
        let snapshot = snapshot_with_title("Grandma's Pasta");

        let next = reconciler
            .reconcile(&snapshot, &replica, true)
            .expect("differing title should produce a new replica");

        assert_eq!(next.title, "Grandma's Pasta");
        assert_eq!(next.ingredients, replica.ingredients);
        assert_eq!(
            reconciler.changed().iter().copied().collect::<Vec<_>>(),
            vec![RecipeField::Title]
        );
        assert!(!reconciler.is_changed(RecipeField::Ingredients));
    }

    #[test]
    fn reconcile_is_idempotent() {
        let mut reconciler = Reconciler::new();
        let snapshot = snapshot_with_title("Grandma's Pasta");

        let replica = reconciler
            .reconcile(&snapshot, &Recipe::starter(), true)
            .expect("first pass should adopt");
        let second = reconciler.reconcile(&snapshot, &replica, true);

        assert!(second.is_none());
        // Mid-stream the previous markers survive the no-op pass.
        assert!(reconciler.is_changed(RecipeField::Title));
    }

    #[test]
    fn omitted_fields_are_never_adopted_or_marked() {
        let mut reconciler = Reconciler::new();
        let mut replica = Recipe::starter();
        replica.title = "Handwritten Title".to_string();

        // The delivery asserts nothing at all.
        let next = reconciler.reconcile(&PartialRecipe::default(), &replica, false);

        assert!(next.is_none());
        assert!(reconciler.changed().is_empty());
    }

    #[test]
    fn escaped_newline_titles_match_their_literal_form() {
        let mut reconciler = Reconciler::new();
        let mut replica = Recipe::starter();
        replica.title = "Line one\nLine two".to_string();

        let mut snapshot = PartialRecipe::from(&replica);
        snapshot.title = Some("Line one\\nLine two".to_string());

        let next = reconciler.reconcile(&snapshot, &replica, true);
        assert!(next.is_none(), "representational difference is not semantic");
        assert!(!reconciler.is_changed(RecipeField::Title));
    }

    #[test]
    fn escaped_newlines_in_instruction_steps_pass_through_untouched() {
        // Known gap, preserved deliberately: unescaping stops at top-level
        // scalar fields and never recurses into sequences.
        let mut reconciler = Reconciler::new();
        let replica = Recipe::starter();

        let mut snapshot = PartialRecipe::from(&replica);
        snapshot.instructions = Some(vec!["Mix dry\\nMix wet".to_string()]);

        let next = reconciler
            .reconcile(&snapshot, &replica, true)
            .expect("differing instructions should be adopted");
        assert_eq!(next.instructions, vec!["Mix dry\\nMix wet".to_string()]);
        assert!(reconciler.is_changed(RecipeField::Instructions));
    }

    #[test]
    fn stale_snapshot_does_not_revert_a_later_user_edit() {
        use crate::recipe::mirror::RemoteStateMirror;
        use std::sync::mpsc;

        let mut reconciler = Reconciler::new();
        let (tx, _rx) = mpsc::channel();
        let mut mirror = RemoteStateMirror::new(&Recipe::starter(), tx);

        mirror.replace(snapshot_with_title("Grandma's Pasta"));
        let mut replica = reconciler
            .reconcile(mirror.read(), &Recipe::starter(), true)
            .expect("agent title should be adopted");

        // User edits the adopted field afterwards; the edit path mutates
        // the replica and echoes the patch into the mirror, so the stale
        // value is gone from the snapshot before the next pass runs.
        replica.title = "Grandma's Pasta (spicy)".to_string();
        mirror.write(PartialRecipe::with_title(replica.title.clone()));

        let next = reconciler.reconcile(mirror.read(), &replica, true);
        assert!(next.is_none());
        assert_eq!(replica.title, "Grandma's Pasta (spicy)");
    }

    #[test]
    fn change_sets_do_not_accumulate_across_passes() {
        let mut reconciler = Reconciler::new();

        let snapshot_a = snapshot_with_title("Grandma's Pasta");
        let replica = reconciler
            .reconcile(&snapshot_a, &Recipe::starter(), true)
            .expect("title should be adopted");

        let mut snapshot_b = PartialRecipe::from(&replica);
        snapshot_b.cooking_time = Some(CookingTime::SixtyPlusMin);
        reconciler
            .reconcile(&snapshot_b, &replica, true)
            .expect("cooking time should be adopted");

        assert_eq!(
            reconciler.changed().iter().copied().collect::<Vec<_>>(),
            vec![RecipeField::CookingTime]
        );
    }

    #[test]
    fn markers_clear_once_the_agent_goes_idle() {
        let mut reconciler = Reconciler::new();
        let snapshot = snapshot_with_title("Grandma's Pasta");

        let replica = reconciler
            .reconcile(&snapshot, &Recipe::starter(), true)
            .expect("title should be adopted");
        assert!(reconciler.is_changed(RecipeField::Title));

        // Same inputs, stream finished: the stream-end pass clears.
        let next = reconciler.reconcile(&snapshot, &replica, false);
        assert!(next.is_none());
        assert!(reconciler.changed().is_empty());
    }

    #[test]
    fn multiple_differing_fields_are_adopted_in_one_pass() {
        let mut reconciler = Reconciler::new();
        let replica = Recipe::starter();

        let mut snapshot = PartialRecipe::from(&replica);
        snapshot.skill_level = Some(SkillLevel::Advanced);
        snapshot.special_preferences = Some(vec!["Spicy".to_string()]);
        snapshot.ingredients = Some(vec![Ingredient::new("🍅", "Tomatoes", "4, diced")]);

        let next = reconciler
            .reconcile(&snapshot, &replica, true)
            .expect("three fields should be adopted");

        assert_eq!(next.skill_level, SkillLevel::Advanced);
        assert_eq!(next.special_preferences, vec!["Spicy".to_string()]);
        assert_eq!(next.ingredients.len(), 1);
        assert_eq!(
            reconciler.changed().iter().copied().collect::<Vec<_>>(),
            vec![
                RecipeField::SkillLevel,
                RecipeField::SpecialPreferences,
                RecipeField::Ingredients,
            ]
        );
    }

    #[test]
    fn ingredient_comparison_is_order_sensitive_and_field_wise() {
        let mut reconciler = Reconciler::new();
        let replica = Recipe::starter();

        let mut reordered = replica.ingredients.clone();
        reordered.reverse();
        let mut snapshot = PartialRecipe::from(&replica);
        snapshot.ingredients = Some(reordered.clone());

        let next = reconciler
            .reconcile(&snapshot, &replica, true)
            .expect("reordered sequence counts as a difference");
        assert_eq!(next.ingredients, reordered);
    }
}
