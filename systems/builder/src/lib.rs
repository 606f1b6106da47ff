#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure selection-tool system responsible for emitting tagging, building and selling commands.

use keeper_core::{Command, PlayerId, RoomId, SelectionRect, TileCoord};

/// Tool currently wielded by the keeper's cursor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tool {
    /// Tags taggable tiles for digging.
    Tag,
    /// Clears tags from tiles.
    Untag,
    /// Places the provided room type.
    Build(RoomId),
    /// Sells owned room tiles.
    Sell,
}

/// Declarative preview describing what a confirmed drag would affect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SelectionPreview {
    /// Tool the preview was computed for.
    pub tool: Tool,
    /// Rectangle spanned by the drag.
    pub area: SelectionRect,
    /// Indicates whether at least one tile inside the area accepts the tool.
    pub valid: bool,
}

impl SelectionPreview {
    /// Creates a new selection preview descriptor.
    #[must_use]
    pub const fn new(tool: Tool, area: SelectionRect, valid: bool) -> Self {
        Self { tool, area, valid }
    }
}

/// Input snapshot distilled from adapter-provided frame input data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuilderInput {
    /// Indicates whether the player started a drag on this frame.
    pub press_action: bool,
    /// Indicates whether the player released the drag on this frame.
    pub confirm_action: bool,
    /// Indicates whether the player abandoned the drag on this frame.
    pub cancel_action: bool,
    /// Tile currently hovered by the cursor.
    pub cursor_tile: Option<TileCoord>,
}

impl BuilderInput {
    /// Creates a new input descriptor with explicit field values.
    #[must_use]
    pub const fn new(
        press_action: bool,
        confirm_action: bool,
        cancel_action: bool,
        cursor_tile: Option<TileCoord>,
    ) -> Self {
        Self {
            press_action,
            confirm_action,
            cancel_action,
            cursor_tile,
        }
    }
}

/// Selection-tool system that translates drags into world commands for one player.
#[derive(Debug, Clone)]
pub struct Builder {
    player: PlayerId,
    anchor: Option<TileCoord>,
}

impl Builder {
    /// Creates a new builder system acting on behalf of `player`.
    #[must_use]
    pub const fn new(player: PlayerId) -> Self {
        Self {
            player,
            anchor: None,
        }
    }

    /// Tile where the current drag started, if a drag is in progress.
    #[must_use]
    pub const fn anchor(&self) -> Option<TileCoord> {
        self.anchor
    }

    /// Computes the preview for a drag ending at `cursor`.
    ///
    /// The `accepts` closure should mirror the world's `query::is_taggable`,
    /// `query::is_buildable` and `query::is_sellable` helpers for the tool.
    pub fn preview<F>(&self, tool: Tool, cursor: TileCoord, mut accepts: F) -> SelectionPreview
    where
        F: FnMut(Tool, TileCoord) -> bool,
    {
        let area = SelectionRect::new(self.anchor.unwrap_or(cursor), cursor);
        let valid = area.tiles().any(|tile| accepts(tool, tile));
        SelectionPreview::new(tool, area, valid)
    }

    /// Consumes adapter-derived input and the current preview to emit commands.
    pub fn handle(
        &mut self,
        preview: Option<SelectionPreview>,
        input: BuilderInput,
        out: &mut Vec<Command>,
    ) {
        if input.cancel_action {
            self.anchor = None;
            return;
        }

        if input.press_action && self.anchor.is_none() {
            self.anchor = input.cursor_tile;
        }

        if !input.confirm_action {
            return;
        }

        let _ = self.anchor.take();
        let Some(preview) = preview.filter(|preview| preview.valid) else {
            return;
        };

        let player = self.player;
        let area = preview.area;
        out.push(match preview.tool {
            Tool::Tag => Command::SelectTiles {
                area,
                select: true,
                player,
            },
            Tool::Untag => Command::SelectTiles {
                area,
                select: false,
                player,
            },
            Tool::Build(room) => Command::Build { area, player, room },
            Tool::Sell => Command::Sell { area, player },
        });
    }
}
