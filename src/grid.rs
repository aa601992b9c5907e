//! The tile collection store.
//!
//! `GridState` is the single source of truth for the tiles on the canvas.
//! It only changes through [`GridAction`]s, and every transition is a pure
//! function of the current state and the action. Persisting the result is
//! left to whoever observes the state (see [`crate::storage`]).

use crate::layout::{default_tiles, next_tile_id, tiles_from_layout, LayoutItem};
use crate::{ChartKind, Tile, TileId, TileLayout, TileMetadata, ViewMode};
use log::debug;
use std::rc::Rc;
use yew::Reducible;

/// Every mutation the grid accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum GridAction {
    /// Append a tile of `kind` at `layout`. The id is allocated here.
    AddTile { kind: ChartKind, layout: TileLayout },
    DeleteTile { id: TileId },
    UpdateTileMetadata {
        id: TileId,
        title: String,
        description: String,
    },
    UpdateTileViewMode { id: TileId, view_mode: ViewMode },
    /// Rectangles reported by the layout engine after a drag, resize or
    /// compaction. Tiles not named keep their layout.
    UpdateTilesFromLayout { items: Vec<LayoutItem> },
    /// Back to the starter grid.
    ResetGrid,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GridState {
    pub tiles: Vec<Tile>,
}

impl GridState {
    pub fn new(tiles: Vec<Tile>) -> Self {
        Self { tiles }
    }

    /// The starter configuration.
    pub fn with_defaults() -> Self {
        Self::new(default_tiles())
    }

    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.tiles.iter().find(|tile| tile.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Compute the state that follows `action`.
    ///
    /// Actions naming an id that is not present leave the tiles unchanged.
    pub fn apply(&self, action: GridAction) -> GridState {
        match action {
            GridAction::AddTile { kind, layout } => {
                let id = next_tile_id(&self.tiles);
                debug!("adding {} tile {} at {:?}", kind, id, layout);
                let mut tiles = self.tiles.clone();
                tiles.push(Tile::new(id, kind, layout));
                GridState::new(tiles)
            }
            GridAction::DeleteTile { id } => GridState::new(
                self.tiles
                    .iter()
                    .filter(|tile| tile.id != id)
                    .cloned()
                    .collect(),
            ),
            GridAction::UpdateTileMetadata {
                id,
                title,
                description,
            } => {
                let metadata = TileMetadata { title, description };
                self.map_tile(id, |tile| Tile {
                    metadata: metadata.clone(),
                    ..tile.clone()
                })
            }
            GridAction::UpdateTileViewMode { id, view_mode } => {
                self.map_tile(id, |tile| Tile {
                    view_mode,
                    ..tile.clone()
                })
            }
            GridAction::UpdateTilesFromLayout { items } => {
                GridState::new(tiles_from_layout(&self.tiles, &items))
            }
            GridAction::ResetGrid => GridState::with_defaults(),
        }
    }

    fn map_tile(&self, id: TileId, f: impl Fn(&Tile) -> Tile) -> GridState {
        GridState::new(
            self.tiles
                .iter()
                .map(|tile| if tile.id == id { f(tile) } else { tile.clone() })
                .collect(),
        )
    }
}

impl Reducible for GridState {
    type Action = GridAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        Rc::new(self.apply(action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridGeometry;
    use crate::layout::{grid_cell_at, placement_for, CanvasRect};

    fn rect(x: u32, y: u32) -> TileLayout {
        TileLayout { x, y, w: 2, h: 4 }
    }

    fn add(state: &GridState, kind: ChartKind) -> GridState {
        state.apply(GridAction::AddTile {
            kind,
            layout: rect(0, 0),
        })
    }

    fn ids(state: &GridState) -> Vec<TileId> {
        state.tiles.iter().map(|t| t.id).collect()
    }

    #[test]
    fn ids_are_allocated_in_dispatch_order() {
        let mut state = GridState::default();
        state = add(&state, ChartKind::Line);
        state = add(&state, ChartKind::Bar);
        state = state.apply(GridAction::DeleteTile { id: 0 });
        state = add(&state, ChartKind::Pie);
        state = add(&state, ChartKind::Map);
        assert_eq!(ids(&state), vec![1, 2, 3]);
    }

    #[test]
    fn add_tile_grows_collection_by_one() {
        let state = GridState::with_defaults();
        let next = add(&state, ChartKind::Bar);
        assert_eq!(next.tiles.len(), state.tiles.len() + 1);
        let added = next.tiles.last().unwrap();
        assert_eq!(added.id, 6);
        assert_eq!(added.view_mode, ViewMode::Chart);
        assert_eq!(added.metadata, TileMetadata::default_for(ChartKind::Bar));
    }

    #[test]
    fn right_click_far_right_adds_clamped_tile() {
        let geometry = GridGeometry {
            columns: 4,
            row_height: 100,
            tile_width: 2,
            tile_height: 4,
        };
        let canvas = CanvasRect { left: 0.0, top: 0.0, width: 400.0 };
        let cell = grid_cell_at(350.0, 20.0, canvas, geometry);
        assert_eq!((cell.x, cell.y), (3, 0));

        let state = GridState::default().apply(GridAction::AddTile {
            kind: ChartKind::Line,
            layout: placement_for(cell, geometry),
        });

        let tile = &state.tiles[0];
        assert_eq!(tile.id, 0);
        assert_eq!(tile.layout, TileLayout { x: 2, y: 0, w: 2, h: 4 });
        assert_eq!(tile.view_mode, ViewMode::Chart);
        assert_eq!(tile.metadata.title, "Line Chart");
    }

    #[test]
    fn id_after_deleting_middle_tile() {
        let state = GridState::new(vec![
            Tile::new(0, ChartKind::Line, rect(0, 0)),
            Tile::new(2, ChartKind::Bar, rect(2, 0)),
            Tile::new(5, ChartKind::Pie, rect(0, 4)),
        ]);
        let state = state.apply(GridAction::DeleteTile { id: 2 });
        let state = add(&state, ChartKind::Map);
        assert_eq!(ids(&state), vec![0, 5, 6]);
    }

    #[test]
    fn deleting_missing_id_is_a_no_op() {
        let state = GridState::with_defaults();
        assert_eq!(state.apply(GridAction::DeleteTile { id: 99 }), state);
    }

    #[test]
    fn metadata_update_touches_only_target() {
        let state = GridState::with_defaults();
        let next = state.apply(GridAction::UpdateTileMetadata {
            id: 3,
            title: "Share by country".into(),
            description: "Totals over the selected years".into(),
        });

        let edited = next.tile(3).unwrap();
        assert_eq!(edited.metadata.title, "Share by country");
        assert_eq!(edited.layout, state.tile(3).unwrap().layout);
        assert_eq!(edited.kind, ChartKind::Pie);
        for (before, after) in state.tiles.iter().zip(&next.tiles) {
            if before.id != 3 {
                assert_eq!(before, after);
            }
        }
    }

    #[test]
    fn view_mode_update_touches_only_target() {
        let state = GridState::with_defaults();
        let next = state.apply(GridAction::UpdateTileViewMode {
            id: 1,
            view_mode: ViewMode::Table,
        });
        assert_eq!(next.tile(1).unwrap().view_mode, ViewMode::Table);
        assert_eq!(next.tile(2), state.tile(2));
        assert_eq!(
            state.apply(GridAction::UpdateTileViewMode {
                id: 42,
                view_mode: ViewMode::Table,
            }),
            state
        );
    }

    #[test]
    fn partial_layout_update_keeps_third_tile() {
        let state = GridState::new(vec![
            Tile::new(0, ChartKind::Line, rect(0, 0)),
            Tile::new(1, ChartKind::Bar, rect(2, 0)),
            Tile::new(2, ChartKind::Pie, rect(0, 4)),
        ]);
        let next = state.apply(GridAction::UpdateTilesFromLayout {
            items: vec![
                LayoutItem { key: "tile-0".into(), x: 2, y: 4, w: 2, h: 4 },
                LayoutItem { key: "tile-1".into(), x: 0, y: 0, w: 2, h: 4 },
            ],
        });

        assert_eq!(ids(&next), vec![0, 1, 2]);
        assert_eq!(next.tiles[0].layout, rect(2, 4));
        assert_eq!(next.tiles[1].layout, rect(0, 0));
        assert_eq!(next.tiles[2], state.tiles[2]);
    }

    #[test]
    fn reset_is_idempotent() {
        let state = add(&GridState::default(), ChartKind::Bar);
        let once = state.apply(GridAction::ResetGrid);
        let twice = once.apply(GridAction::ResetGrid);
        assert_eq!(once, twice);
        assert_eq!(once, GridState::with_defaults());
    }

    #[test]
    fn reducible_applies_action() {
        let state = Rc::new(GridState::default());
        let next = state.reduce(GridAction::AddTile {
            kind: ChartKind::Map,
            layout: rect(0, 0),
        });
        assert_eq!(next.tiles.len(), 1);
        assert_eq!(next.tiles[0].kind, ChartKind::Map);
    }
}
