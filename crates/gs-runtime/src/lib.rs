mod asset;
mod data_manager;
mod player;
mod presentation;
mod tag_parser;

pub use asset::{AssetError, AssetHandle, AssetManager, AssetStore, ReconcileReport};
pub use data_manager::{DataManager, ScenarioSources, CHARACTER_GRID_NAME, CHARACTER_TAG};
pub use player::{
    PlaybackOutcome, PlayerHandle, PlayerSignal, PlayerState, PlayerStatus, ScenarioPlayer,
    Suspension,
};
pub use presentation::Presentation;
pub use tag_parser::{TagHandler, TagParser};
