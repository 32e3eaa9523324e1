use crate::recipe::partial::PartialRecipe;
use crate::recipe::Recipe;
use std::sync::mpsc::Sender;

/// The authoritative recipe as last asserted by the agent channel. One
/// instance per session, constructed at session start and owned by the app;
/// nothing reaches it except through this handle.
pub struct RemoteStateMirror {
    snapshot: PartialRecipe,
    upstream: Sender<PartialRecipe>,
}

impl RemoteStateMirror {
    pub fn new(initial: &Recipe, upstream: Sender<PartialRecipe>) -> Self {
        Self {
            snapshot: PartialRecipe::from(initial),
            upstream,
        }
    }

    pub fn read(&self) -> &PartialRecipe {
        &self.snapshot
    }

    /// Echo a local edit: shallow-merge the patch onto the snapshot and
    /// forward it so the agent's next turn sees current user intent. A
    /// closed upstream channel only means the agent task is gone.
    pub fn write(&mut self, patch: PartialRecipe) {
        self.snapshot.merge(&patch);
        let _ = self.upstream.send(patch);
    }

    /// Wholesale replacement on an inbound agent delivery. Field-level
    /// merging of remote state happens in the reconciler, never here.
    pub fn replace(&mut self, snapshot: PartialRecipe) {
        self.snapshot = snapshot;
    }

    /// New-session teardown and re-seed.
    pub fn reset(&mut self, initial: &Recipe) {
        self.snapshot = PartialRecipe::from(initial);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::{CookingTime, Ingredient};
    use std::sync::mpsc;

    fn mirror() -> (RemoteStateMirror, mpsc::Receiver<PartialRecipe>) {
        let (tx, rx) = mpsc::channel();
        (RemoteStateMirror::new(&Recipe::starter(), tx), rx)
    }

    #[test]
    fn new_mirror_asserts_the_full_starter_document() {
        let (mirror, _rx) = mirror();
        assert_eq!(mirror.read(), &PartialRecipe::from(&Recipe::starter()));
    }

    #[test]
    fn write_merges_and_forwards_the_patch_upstream() {
        let (mut mirror, rx) = mirror();
        let patch = PartialRecipe::with_title("Grandma's Pasta (spicy)".to_string());

        mirror.write(patch.clone());

        assert_eq!(
            mirror.read().title.as_deref(),
            Some("Grandma's Pasta (spicy)")
        );
        // Only the touched field travels upstream.
        let forwarded = rx.try_recv().expect("patch should be forwarded");
        assert_eq!(forwarded, patch);
        assert!(forwarded.ingredients.is_none());
        // The snapshot's other fields are untouched by the merge.
        assert_eq!(
            mirror.read().ingredients.as_deref(),
            Some(Recipe::starter().ingredients.as_slice())
        );
    }

    #[test]
    fn write_survives_a_dropped_upstream_receiver() {
        let (mut mirror, rx) = mirror();
        drop(rx);
        mirror.write(PartialRecipe::with_cooking_time(CookingTime::FiveMin));
        assert_eq!(mirror.read().cooking_time, Some(CookingTime::FiveMin));
    }

    #[test]
    fn replace_swaps_the_snapshot_wholesale() {
        let (mut mirror, _rx) = mirror();
        let incoming = PartialRecipe::with_ingredients(vec![Ingredient::new(
            "🍅",
            "Tomatoes",
            "4, diced",
        )]);

        mirror.replace(incoming.clone());

        // No transport-layer merge: fields the delivery omitted are now
        // absent in the snapshot.
        assert_eq!(mirror.read(), &incoming);
        assert!(mirror.read().title.is_none());
    }
}
