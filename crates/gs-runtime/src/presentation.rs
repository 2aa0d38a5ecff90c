use gs_core::{CharacterSetting, SelectionItem, Speaker};

use crate::asset::AssetHandle;

/// The UI side of playback. Calls are fire-and-forget; acknowledgements such
/// as "advance line" or a chosen option come back through
/// [`PlayerHandle`](crate::PlayerHandle).
pub trait Presentation: Send + Sync {
    fn start_scenario(&self);
    fn end_scenario(&self);
    fn play_text(&self, speaker: Option<Speaker<'_>>, text: &str);
    fn show_character(&self, layer: &str, setting: &CharacterSetting, sprite: &AssetHandle);
    fn hide_layer(&self, layer: &str);
    fn show_selections(&self, items: &[SelectionItem]);
}
