//! Path queries over tile accessibility.

use std::collections::VecDeque;

use keeper_core::TileCoord;
use rand::{seq::SliceRandom, Rng};

use crate::grid::neighbors;

/// Opaque path search consulted by [`crate::query::find_path`].
///
/// Implementations only see tile accessibility; they never inspect terrain.
pub trait PathService {
    /// Finds a sequence of tiles from `start` to `end`, both inclusive.
    fn find_path(
        &mut self,
        columns: u32,
        rows: u32,
        start: TileCoord,
        end: TileCoord,
        is_accessible: &dyn Fn(TileCoord) -> bool,
    ) -> Option<Vec<TileCoord>>;
}

/// Shortest path search backed by a reverse breadth-first distance field.
#[derive(Clone, Debug, Default)]
pub struct BreadthFirstPaths {
    field: NavigationField,
}

impl PathService for BreadthFirstPaths {
    fn find_path(
        &mut self,
        columns: u32,
        rows: u32,
        start: TileCoord,
        end: TileCoord,
        is_accessible: &dyn Fn(TileCoord) -> bool,
    ) -> Option<Vec<TileCoord>> {
        if start.x() >= columns || start.y() >= rows || !is_accessible(end) {
            return None;
        }

        self.field.rebuild_with(columns, rows, end, |tile| {
            tile != start && !is_accessible(tile)
        });

        let mut current = start;
        let mut distance = self.field.distance(current)?;
        if distance == u32::MAX {
            return None;
        }

        let mut path = vec![current];
        while distance > 0 {
            let next = neighbors(current, columns, rows)
                .find(|neighbor| self.field.distance(*neighbor) == Some(distance - 1))?;
            path.push(next);
            current = next;
            distance -= 1;
        }
        Some(path)
    }
}

/// Dense distance-to-target grid.
#[derive(Clone, Debug, Default)]
struct NavigationField {
    columns: u32,
    rows: u32,
    distances: Vec<u32>,
}

impl NavigationField {
    fn rebuild_with<F>(&mut self, columns: u32, rows: u32, target: TileCoord, mut is_blocked: F)
    where
        F: FnMut(TileCoord) -> bool,
    {
        let width = usize::try_from(columns).unwrap_or(0);
        let height = usize::try_from(rows).unwrap_or(0);
        let cell_count = width.checked_mul(height).unwrap_or(0);

        self.columns = columns;
        self.rows = rows;
        if self.distances.len() != cell_count {
            self.distances = vec![u32::MAX; cell_count];
        } else {
            self.distances.fill(u32::MAX);
        }

        if cell_count == 0 || is_blocked(target) {
            return;
        }
        let Some(target_index) = index(width, target).filter(|index| *index < cell_count) else {
            return;
        };
        self.distances[target_index] = 0;

        let mut queue = VecDeque::new();
        queue.push_back(target);

        while let Some(tile) = queue.pop_front() {
            let Some(current_index) = index(width, tile) else {
                continue;
            };
            let next_distance = self.distances[current_index].saturating_add(1);

            for neighbor in neighbors(tile, columns, rows) {
                if is_blocked(neighbor) {
                    continue;
                }
                let Some(neighbor_index) = index(width, neighbor) else {
                    continue;
                };
                if self.distances[neighbor_index] <= next_distance {
                    continue;
                }
                self.distances[neighbor_index] = next_distance;
                queue.push_back(neighbor);
            }
        }
    }

    fn distance(&self, tile: TileCoord) -> Option<u32> {
        if tile.x() >= self.columns || tile.y() >= self.rows {
            return None;
        }
        let width = usize::try_from(self.columns).ok()?;
        index(width, tile).and_then(|offset| self.distances.get(offset).copied())
    }
}

fn index(width: usize, tile: TileCoord) -> Option<usize> {
    let column = usize::try_from(tile.x()).ok()?;
    let row = usize::try_from(tile.y()).ok()?;
    row.checked_mul(width)?.checked_add(column)
}

/// Picks an accessible tile from the `radius`-wide window centred on `start`.
///
/// The window spans `start - radius / 2` up to but excluding
/// `start + radius / 2` on both axes; `start` itself is never picked.
pub(crate) fn random_accessible_tile<R, F>(
    start: TileCoord,
    radius: u32,
    columns: u32,
    rows: u32,
    is_accessible: F,
    rng: &mut R,
) -> Option<TileCoord>
where
    R: Rng + ?Sized,
    F: Fn(TileCoord) -> bool,
{
    let half = radius / 2;
    let x_range = start.x().saturating_sub(half)..start.x().saturating_add(half).min(columns);
    let y_range = start.y().saturating_sub(half)..start.y().saturating_add(half).min(rows);

    let candidates: Vec<TileCoord> = y_range
        .flat_map(|y| x_range.clone().map(move |x| TileCoord::new(x, y)))
        .filter(|tile| *tile != start && is_accessible(*tile))
        .collect();

    candidates.choose(rng).copied()
}
