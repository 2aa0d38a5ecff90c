use gs_core::{Command, SelectionItem, Speaker};
use tracing::error;

use crate::asset::AssetManager;
use crate::data_manager::DataManager;
use crate::presentation::Presentation;

/// The slice of engine state a command may read or change.
pub(super) struct CommandContext<'a> {
    pub(super) data: &'a DataManager,
    pub(super) assets: &'a AssetManager,
    pub(super) presentation: &'a dyn Presentation,
    pub(super) next_label: &'a mut Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum CommandFlow {
    Continue,
    AwaitAdvance,
    /// Waits for a choice; holds the target label of each option.
    AwaitSelection(Vec<String>),
}

pub(super) fn execute_command(command: &Command, context: &mut CommandContext<'_>) -> CommandFlow {
    match command {
        Command::Text { text, .. } => {
            let rendered = context.data.parse_text(text);
            context.presentation.play_text(None, &rendered);
            CommandFlow::AwaitAdvance
        }
        Command::Character {
            character_id,
            is_hiding,
            layer_name,
            text,
            location,
        } => {
            let Some(setting) = context.data.character(character_id) else {
                error!(%location, character = %character_id, "character settings not found, command skipped");
                return CommandFlow::Continue;
            };

            if *is_hiding {
                context.presentation.hide_layer(layer_name);
            } else {
                match context.assets.get(&setting.sprite_file) {
                    Some(sprite) => context
                        .presentation
                        .show_character(layer_name, setting, &sprite),
                    None => {
                        error!(%location, asset = %setting.sprite_file, "sprite is not resident, character not shown");
                    }
                }
            }

            let Some(text) = text else {
                return CommandFlow::Continue;
            };
            let rendered = context.data.parse_text(text);
            context.presentation.play_text(
                Some(Speaker {
                    name: &setting.display_name,
                    color: setting.name_color,
                }),
                &rendered,
            );
            CommandFlow::AwaitAdvance
        }
        Command::Jump { target_label, .. } => {
            *context.next_label = Some(target_label.clone());
            CommandFlow::Continue
        }
        Command::Choice { options, .. } => {
            let items = options
                .iter()
                .enumerate()
                .map(|(index, option)| SelectionItem {
                    index,
                    text: context.data.parse_text(&option.text),
                })
                .collect::<Vec<_>>();
            context.presentation.show_selections(&items);
            CommandFlow::AwaitSelection(
                options
                    .iter()
                    .map(|option| option.target_label.clone())
                    .collect(),
            )
        }
    }
}
