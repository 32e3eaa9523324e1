use crate::recipe::partial::PartialRecipe;
use crate::recipe::reconcile::Reconciler;
use crate::recipe::{CookingTime, Ingredient, Recipe, RecipeField, SkillLevel, SPECIAL_PREFERENCES};
use crate::theme::Theme;
use eframe::egui::{self, RichText};

/// What a card interaction produced. `Edited` carries the merge-patch for
/// the touched field; nothing is mutated here beyond the replica the app
/// handed in.
#[derive(Debug, Clone)]
pub enum CardAction {
    Edited(PartialRecipe),
    ImproveRequested,
}

/// The recipe editor bound to the local replica. Holds only ephemeral UI
/// state; every field renders from the replica passed in and every change
/// is emitted as a single-field patch. Pending-change pings come straight
/// from the reconciler's change set and are never stored here.
pub struct RecipeCard {
    editing_instruction: Option<usize>,
}

impl RecipeCard {
    pub fn new() -> Self {
        Self {
            editing_instruction: None,
        }
    }

    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        theme: &Theme,
        recipe: &mut Recipe,
        reconciler: &Reconciler,
        is_streaming: bool,
        emit: &mut dyn FnMut(CardAction),
    ) {
        let frame = theme.card_frame();
        frame.show(ui, |ui| {
            self.render_title(ui, theme, recipe, reconciler, emit);
            ui.add_space(theme.spacing_8);
            self.render_meta_row(ui, theme, recipe, emit);
            ui.add_space(theme.spacing_16);
            self.render_preferences(ui, theme, recipe, reconciler, emit);
            ui.add_space(theme.spacing_16);
            self.render_ingredients(ui, theme, recipe, reconciler, emit);
            ui.add_space(theme.spacing_16);
            self.render_instructions(ui, theme, recipe, reconciler, emit);
            ui.add_space(theme.spacing_16);

            ui.vertical_centered(|ui| {
                let label = if is_streaming {
                    "Improving..."
                } else {
                    "✨ Improve with AI"
                };
                let button = egui::Button::new(
                    RichText::new(label).color(theme.text_on_accent).size(14.0),
                )
                .fill(theme.accent_primary)
                .corner_radius(egui::CornerRadius::same(theme.radius_12))
                .min_size(egui::vec2(180.0, theme.button_height));
                if ui.add_enabled(!is_streaming, button).clicked() {
                    emit(CardAction::ImproveRequested);
                }
            });
        });
    }

    fn section_heading(
        &self,
        ui: &mut egui::Ui,
        theme: &Theme,
        reconciler: &Reconciler,
        field: RecipeField,
        label: &str,
    ) {
        ui.horizontal(|ui| {
            ui.heading(label);
            if reconciler.is_changed(field) {
                ping(ui, theme);
            }
        });
    }

    fn render_title(
        &mut self,
        ui: &mut egui::Ui,
        theme: &Theme,
        recipe: &mut Recipe,
        reconciler: &Reconciler,
        emit: &mut dyn FnMut(CardAction),
    ) {
        ui.horizontal(|ui| {
            let response = ui.add(
                egui::TextEdit::singleline(&mut recipe.title)
                    .desired_width(f32::INFINITY)
                    .font(egui::TextStyle::Heading)
                    .hint_text("Recipe Title"),
            );
            if response.changed() {
                emit(CardAction::Edited(PartialRecipe::with_title(
                    recipe.title.clone(),
                )));
            }
            if reconciler.is_changed(RecipeField::Title) {
                ping(ui, theme);
            }
        });
    }

    fn render_meta_row(
        &mut self,
        ui: &mut egui::Ui,
        theme: &Theme,
        recipe: &mut Recipe,
        emit: &mut dyn FnMut(CardAction),
    ) {
        ui.horizontal(|ui| {
            ui.label("🕒");
            let mut cooking_time = recipe.cooking_time;
            let mut time_changed = false;
            egui::ComboBox::from_id_salt("cooking_time")
                .selected_text(cooking_time.as_str())
                .show_ui(ui, |ui| {
                    for option in CookingTime::ALL {
                        if ui
                            .selectable_value(&mut cooking_time, option, option.as_str())
                            .changed()
                        {
                            time_changed = true;
                        }
                    }
                });
            if time_changed {
                recipe.cooking_time = cooking_time;
                emit(CardAction::Edited(PartialRecipe::with_cooking_time(
                    cooking_time,
                )));
            }

            ui.add_space(theme.spacing_8);
            ui.label("🏆");
            let mut skill_level = recipe.skill_level;
            let mut skill_changed = false;
            egui::ComboBox::from_id_salt("skill_level")
                .selected_text(skill_level.as_str())
                .show_ui(ui, |ui| {
                    for option in SkillLevel::ALL {
                        if ui
                            .selectable_value(&mut skill_level, option, option.as_str())
                            .changed()
                        {
                            skill_changed = true;
                        }
                    }
                });
            if skill_changed {
                recipe.skill_level = skill_level;
                emit(CardAction::Edited(PartialRecipe::with_skill_level(
                    skill_level,
                )));
            }
        });
    }

    fn render_preferences(
        &mut self,
        ui: &mut egui::Ui,
        theme: &Theme,
        recipe: &mut Recipe,
        reconciler: &Reconciler,
        emit: &mut dyn FnMut(CardAction),
    ) {
        self.section_heading(
            ui,
            theme,
            reconciler,
            RecipeField::SpecialPreferences,
            "Dietary Preferences",
        );
        ui.horizontal_wrapped(|ui| {
            for option in SPECIAL_PREFERENCES {
                let mut selected = recipe
                    .special_preferences
                    .iter()
                    .any(|preference| preference == option);
                if ui.checkbox(&mut selected, option).changed() {
                    if selected {
                        recipe.special_preferences.push(option.to_string());
                    } else {
                        recipe
                            .special_preferences
                            .retain(|preference| preference != option);
                    }
                    emit(CardAction::Edited(PartialRecipe::with_special_preferences(
                        recipe.special_preferences.clone(),
                    )));
                }
            }
        });
    }

    fn render_ingredients(
        &mut self,
        ui: &mut egui::Ui,
        theme: &Theme,
        recipe: &mut Recipe,
        reconciler: &Reconciler,
        emit: &mut dyn FnMut(CardAction),
    ) {
        ui.horizontal(|ui| {
            ui.heading("Ingredients");
            if reconciler.is_changed(RecipeField::Ingredients) {
                ping(ui, theme);
            }
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("+ Add Ingredient").clicked() {
                    recipe.ingredients.push(Ingredient::new("", "", ""));
                    emit(CardAction::Edited(PartialRecipe::with_ingredients(
                        recipe.ingredients.clone(),
                    )));
                }
            });
        });

        let mut touched = false;
        let mut remove_index = None;
        for (index, ingredient) in recipe.ingredients.iter_mut().enumerate() {
            theme.row_frame().show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label(RichText::new(ingredient.display_icon()).size(22.0));
                    ui.vertical(|ui| {
                        let name = ui.add(
                            egui::TextEdit::singleline(&mut ingredient.name)
                                .desired_width(f32::INFINITY)
                                .hint_text("Ingredient name"),
                        );
                        let amount = ui.add(
                            egui::TextEdit::singleline(&mut ingredient.amount)
                                .desired_width(f32::INFINITY)
                                .hint_text("Amount"),
                        );
                        if name.changed() || amount.changed() {
                            touched = true;
                        }
                    });
                    if ui
                        .button(RichText::new("✕").color(theme.danger))
                        .clicked()
                    {
                        remove_index = Some(index);
                    }
                });
            });
        }
        if let Some(index) = remove_index {
            recipe.ingredients.remove(index);
            touched = true;
        }
        if touched {
            // Container edits travel as the whole modified sequence.
            emit(CardAction::Edited(PartialRecipe::with_ingredients(
                recipe.ingredients.clone(),
            )));
        }
    }

    fn render_instructions(
        &mut self,
        ui: &mut egui::Ui,
        theme: &Theme,
        recipe: &mut Recipe,
        reconciler: &Reconciler,
        emit: &mut dyn FnMut(CardAction),
    ) {
        ui.horizontal(|ui| {
            ui.heading("Instructions");
            if reconciler.is_changed(RecipeField::Instructions) {
                ping(ui, theme);
            }
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("+ Add Step").clicked() {
                    recipe.instructions.push(String::new());
                    self.editing_instruction = Some(recipe.instructions.len() - 1);
                    emit(CardAction::Edited(PartialRecipe::with_instructions(
                        recipe.instructions.clone(),
                    )));
                }
            });
        });

        let mut touched = false;
        let mut remove_index = None;
        for (index, instruction) in recipe.instructions.iter_mut().enumerate() {
            ui.horizontal_top(|ui| {
                ui.label(
                    RichText::new(format!("{}", index + 1))
                        .color(theme.accent_primary)
                        .strong(),
                );
                let response = ui.add(
                    egui::TextEdit::multiline(instruction)
                        .desired_width(f32::INFINITY)
                        .desired_rows(2)
                        .hint_text("Enter cooking instruction..."),
                );
                if response.gained_focus() {
                    self.editing_instruction = Some(index);
                }
                if response.lost_focus() && self.editing_instruction == Some(index) {
                    self.editing_instruction = None;
                }
                if response.changed() {
                    touched = true;
                }
                if ui
                    .button(RichText::new("✕").color(theme.danger))
                    .clicked()
                {
                    remove_index = Some(index);
                }
            });
        }
        if let Some(index) = remove_index {
            recipe.instructions.remove(index);
            if self.editing_instruction == Some(index) {
                self.editing_instruction = None;
            }
            touched = true;
        }
        if touched {
            emit(CardAction::Edited(PartialRecipe::with_instructions(
                recipe.instructions.clone(),
            )));
        }
    }
}

/// Transient "the agent just changed this" marker. Display hint only; it
/// disappears as soon as a reconciliation pass clears the change set.
fn ping(ui: &mut egui::Ui, theme: &Theme) {
    let (rect, _) = ui.allocate_exact_size(egui::vec2(14.0, 14.0), egui::Sense::hover());
    let painter = ui.painter();
    painter.circle_filled(rect.center(), 7.0, theme.ping_halo);
    painter.circle_filled(rect.center(), 3.5, theme.ping);
}
