//! Grid-based pathfinding using a weighted A* search.
//!
//! The search is stateless and reads the [`GameState`] only. Edge costs
//! model what an agent actually pays to take a step: an empty cell costs
//! 1, a destructible wall costs `1 + health` (the shots needed to clear
//! it before walking in), and steel walls, living tanks, and off-board
//! cells are unreachable.
//!
//! All queries are deterministic: the open-set heap breaks f-score ties
//! by insertion sequence, so equal-cost frontiers always expand in the
//! same order.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};

use crate::entities::{TankId, Team};
use crate::grid::{manhattan_distance, Direction};
use crate::state::GameState;

/// Outcome of a [`find_path`] query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathResult {
    /// Whether any route exists.
    pub found: bool,
    /// Direction of the first step out of the start cell. `None` when
    /// start and goal coincide.
    pub first_step: Option<Direction>,
    /// Whether the first step lands on a wall cell - a signal to the
    /// caller to fire at it rather than walk.
    pub first_step_is_wall: bool,
    /// Total path cost under the weighted cost model.
    pub total_cost: u32,
}

impl PathResult {
    /// The "no route" result.
    const NOT_FOUND: PathResult = PathResult {
        found: false,
        first_step: None,
        first_step_is_wall: false,
        total_cost: 0,
    };
}

/// A candidate destination chosen by [`find_cheapest_target`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Target cell x.
    pub x: i32,
    /// Target cell y.
    pub y: i32,
    /// Total path cost to reach it.
    pub cost: u32,
    /// Whether the target is the enemy base (vs an enemy tank).
    pub is_base: bool,
}

/// A node in the A* open set.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
struct SearchNode {
    /// f = g + heuristic.
    f: u32,
    /// Cost from the start cell.
    g: u32,
    x: i32,
    y: i32,
    /// Insertion sequence number; earlier pushes win f-score ties so the
    /// expansion order is reproducible.
    seq: u64,
}

impl Ord for SearchNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse for min-heap behavior.
        match other.f.cmp(&self.f) {
            Ordering::Equal => other.seq.cmp(&self.seq),
            ord => ord,
        }
    }
}

impl PartialOrd for SearchNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Cost of stepping into a cell, or `None` when the cell is impassable.
fn step_cost(state: &GameState, x: i32, y: i32, ignore: Option<TankId>) -> Option<u32> {
    if !state.is_valid_position(x, y) {
        return None;
    }
    if state.is_blocked_by_tank(x, y, ignore) {
        return None;
    }
    if let Some(wall) = state.wall_at(x, y) {
        if !wall.is_destructible() {
            return None;
        }
        return Some(1 + wall.health);
    }
    Some(1)
}

/// Find the cheapest route between two cells.
///
/// `ignore` excludes one tank (normally the searcher itself) from the
/// occupancy checks. Returns the direction of the first step, whether
/// that step lands on a wall, and the total cost; see [`PathResult`].
/// If start equals goal the result is found with no direction and cost 0.
#[must_use]
pub fn find_path(
    state: &GameState,
    start: (i32, i32),
    goal: (i32, i32),
    ignore: Option<TankId>,
) -> PathResult {
    let board = state.board_size();
    if board <= 0 {
        return PathResult::NOT_FOUND;
    }

    let (start_x, start_y) = start;
    let (goal_x, goal_y) = goal;

    if start == goal {
        return PathResult {
            found: true,
            first_step: None,
            first_step_is_wall: false,
            total_cost: 0,
        };
    }

    let idx = |x: i32, y: i32| (y * board + x) as usize;
    let total = (board * board) as usize;

    let mut g_cost = vec![u32::MAX; total];
    let mut parent_idx: Vec<Option<usize>> = vec![None; total];
    let mut parent_dir: Vec<Option<Direction>> = vec![None; total];

    let mut open = BinaryHeap::new();
    let mut seq: u64 = 0;

    let start_idx = idx(start_x, start_y);
    g_cost[start_idx] = 0;
    open.push(SearchNode {
        f: manhattan_distance(start_x, start_y, goal_x, goal_y),
        g: 0,
        x: start_x,
        y: start_y,
        seq,
    });

    let goal_idx = idx(goal_x, goal_y);
    let mut found = false;

    while let Some(current) = open.pop() {
        let current_idx = idx(current.x, current.y);
        if current_idx == goal_idx {
            found = true;
            break;
        }
        // Stale entry superseded by a cheaper relaxation.
        if current.g > g_cost[current_idx] {
            continue;
        }

        for dir in Direction::ALL {
            let (nx, ny) = dir.step(current.x, current.y);
            let Some(cost) = step_cost(state, nx, ny, ignore) else {
                continue;
            };

            let neighbor_idx = idx(nx, ny);
            let tentative_g = current.g + cost;
            if tentative_g < g_cost[neighbor_idx] {
                g_cost[neighbor_idx] = tentative_g;
                parent_idx[neighbor_idx] = Some(current_idx);
                parent_dir[neighbor_idx] = Some(dir);

                seq += 1;
                open.push(SearchNode {
                    f: tentative_g + manhattan_distance(nx, ny, goal_x, goal_y),
                    g: tentative_g,
                    x: nx,
                    y: ny,
                    seq,
                });
            }
        }
    }

    if !found {
        return PathResult::NOT_FOUND;
    }

    // Walk parents back until the node whose parent is the start cell;
    // the edge into that node is the first step.
    let mut cursor = goal_idx;
    while let Some(parent) = parent_idx[cursor] {
        if parent == start_idx {
            break;
        }
        cursor = parent;
    }

    let first_step = parent_dir[cursor];
    let first_step_is_wall = first_step.is_some_and(|dir| {
        let (nx, ny) = dir.step(start_x, start_y);
        state.is_blocked_by_wall(nx, ny)
    });

    PathResult {
        found: true,
        first_step,
        first_step_is_wall,
        total_cost: g_cost[goal_idx],
    }
}

/// Find the cheapest reachable target for a tank of `my_team`.
///
/// The enemy base is evaluated first and kept unless a living enemy tank
/// offers a strictly lower cost, so ties favor the base. Returns `None`
/// when neither the base nor any enemy tank is reachable.
#[must_use]
pub fn find_cheapest_target(
    state: &GameState,
    my_team: Team,
    start: (i32, i32),
    ignore: Option<TankId>,
) -> Option<Target> {
    let enemy = my_team.enemy();
    let mut best: Option<Target> = None;

    let base = state.base(enemy);
    let base_path = find_path(state, start, (base.x, base.y), ignore);
    if base_path.found {
        best = Some(Target {
            x: base.x,
            y: base.y,
            cost: base_path.total_cost,
            is_base: true,
        });
    }

    for tank in state.alive_tanks(enemy) {
        let result = find_path(state, start, (tank.x, tank.y), ignore);
        if result.found && best.map_or(true, |b| result.total_cost < b.cost) {
            best = Some(Target {
                x: tank.x,
                y: tank.y,
                cost: result.total_cost,
                is_base: false,
            });
        }
    }

    best
}
