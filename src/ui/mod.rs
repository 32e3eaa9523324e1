pub mod recipe_card;
