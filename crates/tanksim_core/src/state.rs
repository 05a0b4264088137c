//! The per-match game state and tick engine.
//!
//! [`GameState`] owns every entity of one match and advances them with
//! [`GameState::update`], one tick at a time. All operations are fully
//! deterministic:
//! - Integer cell coordinates only, no floating point
//! - Fixed iteration order everywhere (team A's vector, then team B's)
//! - No system randomness and no wall-clock time
//!
//! The direct-mutation operations near the bottom bypass the normal
//! action rules; they exist for the cheat runtime and still validate
//! board bounds and tile occupancy where placement is involved.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::entities::{
    Base, Bullet, Tank, TankId, Team, Wall, WallKind, TANK_MAX_HEALTH,
};
use crate::error::{GameError, Result};
use crate::grid::Direction;

/// Tick limit applied when none is configured.
pub const DEFAULT_TICK_LIMIT: u64 = 500;

/// Points credited to the global score per tank hit.
const TANK_HIT_SCORE: u32 = 100;

/// All mutable state of one match.
///
/// The board is square; cell (0, 0) is the bottom-left corner. Text
/// layouts are parsed top row first, so row 0 of the input lands on the
/// highest y.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Side length of the square board.
    board_size: i32,
    /// Team A's tanks in spawn order.
    team_a_tanks: Vec<Tank>,
    /// Team B's tanks in spawn order.
    team_b_tanks: Vec<Tank>,
    /// Walls, at most one per cell.
    walls: Vec<Wall>,
    /// Bullets in flight.
    bullets: Vec<Bullet>,
    /// Team A's base.
    base_a: Base,
    /// Team B's base.
    base_b: Base,
    /// Completed ticks.
    frame: u64,
    /// Frame at which the match is forced to a draw.
    tick_limit: u64,
    /// Single global score counter, shared by both teams.
    score: u32,
    /// Set exactly once per match (cheats aside).
    game_over: bool,
    /// `Some(team)` once decided; `None` with `game_over` set is a draw.
    winner: Option<Team>,
    /// While paused, `update` is a no-op.
    paused: bool,
    /// Next id handed out by the per-match allocator.
    next_tank_id: TankId,
    /// Original layout rows, retained for forced restarts.
    original_layout: Vec<String>,
}

impl GameState {
    /// Parse an ASCII layout into a fresh match state.
    ///
    /// Cell codes: `A`/`B` spawn a tank, `a`/`b` place that team's base,
    /// `X` a brick wall, `S` a steel wall; anything else is empty. The
    /// board side length equals the row count.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidLayout`] if the layout has no rows.
    pub fn new(layout: &[String], tick_limit: u64) -> Result<Self> {
        if layout.is_empty() {
            return Err(GameError::InvalidLayout("layout has no rows".into()));
        }
        Ok(Self::from_rows(layout, tick_limit))
    }

    /// Infallible parse used by [`new`](Self::new) and forced restarts.
    fn from_rows(layout: &[String], tick_limit: u64) -> Self {
        let board_size = layout.len() as i32;
        let mut state = Self {
            board_size,
            team_a_tanks: Vec::new(),
            team_b_tanks: Vec::new(),
            walls: Vec::new(),
            bullets: Vec::new(),
            base_a: Base::new(0, 0, Team::A),
            base_b: Base::new(0, 0, Team::B),
            frame: 0,
            tick_limit,
            score: 0,
            game_over: false,
            winner: None,
            paused: false,
            next_tank_id: 0,
            original_layout: layout.to_vec(),
        };

        for (row, line) in layout.iter().enumerate() {
            // Text row 0 is the top of the board, so y is inverted.
            let y = board_size - 1 - row as i32;
            for (col, cell) in line.chars().enumerate() {
                let x = col as i32;
                match cell {
                    'A' => state.push_tank(x, y, Team::A),
                    'B' => state.push_tank(x, y, Team::B),
                    'a' => state.base_a = Base::new(x, y, Team::A),
                    'b' => state.base_b = Base::new(x, y, Team::B),
                    'X' => state.walls.push(Wall::new(x, y, WallKind::Brick)),
                    'S' => state.walls.push(Wall::new(x, y, WallKind::Steel)),
                    _ => {}
                }
            }
        }

        state
    }

    /// Allocate an id and add a tank for `team` at a cell.
    fn push_tank(&mut self, x: i32, y: i32, team: Team) {
        let id = self.next_tank_id;
        self.next_tank_id += 1;
        let tank = Tank::new(id, x, y, team);
        match team {
            Team::A => self.team_a_tanks.push(tank),
            Team::B => self.team_b_tanks.push(tank),
        }
    }

    // ========================================================================
    // Tick engine
    // ========================================================================

    /// Advance the match by one tick.
    ///
    /// No-op while paused or once the match is over. Otherwise: frame
    /// counter, bullet movement, bullet collision resolution, purge of
    /// destroyed walls, termination checks, tick-limit draw - always in
    /// that order.
    pub fn update(&mut self) {
        if self.paused || self.game_over {
            return;
        }

        self.frame += 1;

        self.advance_bullets();
        self.resolve_bullet_collisions();
        self.purge_destroyed_walls();
        self.check_game_over();

        if !self.game_over && self.frame >= self.tick_limit {
            self.game_over = true;
            self.winner = None;
        }

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(frame = self.frame, state_hash = hash, "Game state hash");
        }
    }

    /// Move every active bullet one cell along its direction.
    fn advance_bullets(&mut self) {
        for bullet in &mut self.bullets {
            if bullet.active {
                bullet.advance();
            }
        }
    }

    /// Resolve at most one collision per active bullet, then purge
    /// inactive bullets.
    ///
    /// Check order per bullet: out-of-bounds, wall, team A tanks, team B
    /// tanks, bases. A bullet never damages its own team.
    fn resolve_bullet_collisions(&mut self) {
        for i in 0..self.bullets.len() {
            if !self.bullets[i].active {
                continue;
            }
            let (bx, by, team) = {
                let b = &self.bullets[i];
                (b.x, b.y, b.team)
            };

            if !self.is_valid_position(bx, by) {
                self.bullets[i].deactivate();
                continue;
            }

            if let Some(wall) = self.walls.iter_mut().find(|w| w.x == bx && w.y == by) {
                wall.take_damage(1);
                self.bullets[i].deactivate();
                continue;
            }

            if team != Team::A && Self::hit_tank_at(&mut self.team_a_tanks, bx, by) {
                self.score += TANK_HIT_SCORE;
                self.bullets[i].deactivate();
                continue;
            }

            if team != Team::B && Self::hit_tank_at(&mut self.team_b_tanks, bx, by) {
                self.score += TANK_HIT_SCORE;
                self.bullets[i].deactivate();
                continue;
            }

            if team != Team::A && self.base_a.x == bx && self.base_a.y == by {
                self.base_a.take_damage(1, team);
                self.bullets[i].deactivate();
                continue;
            }

            if team != Team::B && self.base_b.x == bx && self.base_b.y == by {
                self.base_b.take_damage(1, team);
                self.bullets[i].deactivate();
            }
        }

        self.bullets.retain(|b| b.active);
    }

    /// Damage the first living tank at a cell, respawning it when lives
    /// remain. Returns whether anything was hit.
    fn hit_tank_at(tanks: &mut [Tank], x: i32, y: i32) -> bool {
        for tank in tanks.iter_mut() {
            if tank.is_alive() && tank.x == x && tank.y == y {
                tank.take_damage(1);
                if tank.health == 0 && tank.lives > 0 {
                    tank.respawn();
                }
                return true;
            }
        }
        false
    }

    /// Drop walls whose health reached zero.
    fn purge_destroyed_walls(&mut self) {
        self.walls.retain(|w| !w.is_destroyed());
    }

    /// Evaluate termination in fixed precedence order so simultaneous
    /// conditions always resolve the same way: base A down, base B down,
    /// team A eliminated, team B eliminated.
    fn check_game_over(&mut self) {
        if !self.base_a.is_alive() {
            self.finish(Some(Team::B));
            return;
        }
        if !self.base_b.is_alive() {
            self.finish(Some(Team::A));
            return;
        }
        if !self.team_a_tanks.is_empty() && self.team_a_tanks.iter().all(|t| !t.is_alive()) {
            self.finish(Some(Team::B));
            return;
        }
        if !self.team_b_tanks.is_empty() && self.team_b_tanks.iter().all(|t| !t.is_alive()) {
            self.finish(Some(Team::A));
        }
    }

    fn finish(&mut self, winner: Option<Team>) {
        self.game_over = true;
        self.winner = winner;
    }

    // ========================================================================
    // Tank actions
    // ========================================================================

    /// Try to move a tank one cell.
    ///
    /// Facing is always updated, even when the move is blocked. The
    /// position only changes when the target cell is in bounds, wall-free,
    /// and not occupied by another living tank. A blocked move returns
    /// `false` and is not an error.
    pub fn move_tank(&mut self, id: TankId, direction: Direction) -> bool {
        let Some((x, y)) = self
            .tank(id)
            .filter(|t| t.is_alive())
            .map(|t| (t.x, t.y))
        else {
            return false;
        };

        if let Some(tank) = self.tank_mut(id) {
            tank.direction = direction;
        }

        let (nx, ny) = direction.step(x, y);
        if !self.is_valid_position(nx, ny)
            || self.is_blocked_by_wall(nx, ny)
            || self.is_blocked_by_tank(nx, ny, Some(id))
        {
            return false;
        }

        if let Some(tank) = self.tank_mut(id) {
            tank.set_position(nx, ny);
        }
        true
    }

    /// Fire a tank's cannon.
    ///
    /// The shot materializes in the cell directly ahead of the tank. An
    /// off-board spawn cell makes the shot a no-op. Otherwise the spawn
    /// cell is resolved immediately - wall, then enemy tank, then enemy
    /// base - and only if nothing is hit does a live bullet enter play.
    pub fn tank_shoot(&mut self, id: TankId) {
        let Some((x, y, direction, team)) = self
            .tank(id)
            .filter(|t| t.is_alive())
            .map(|t| (t.x, t.y, t.direction, t.team))
        else {
            return;
        };

        let (bx, by) = direction.step(x, y);
        if !self.is_valid_position(bx, by) {
            return;
        }

        if let Some(wall) = self.walls.iter_mut().find(|w| w.x == bx && w.y == by) {
            wall.take_damage(1);
            return;
        }

        if team != Team::A && Self::hit_tank_at(&mut self.team_a_tanks, bx, by) {
            self.score += TANK_HIT_SCORE;
            return;
        }
        if team != Team::B && Self::hit_tank_at(&mut self.team_b_tanks, bx, by) {
            self.score += TANK_HIT_SCORE;
            return;
        }

        if team != Team::A && self.base_a.x == bx && self.base_a.y == by {
            self.base_a.take_damage(1, team);
            return;
        }
        if team != Team::B && self.base_b.x == bx && self.base_b.y == by {
            self.base_b.take_damage(1, team);
            return;
        }

        self.bullets.push(Bullet::new(bx, by, direction, team));
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Whether a cell lies on the board.
    #[must_use]
    pub const fn is_valid_position(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.board_size && y >= 0 && y < self.board_size
    }

    /// Whether a wall occupies a cell.
    #[must_use]
    pub fn is_blocked_by_wall(&self, x: i32, y: i32) -> bool {
        self.walls.iter().any(|w| w.x == x && w.y == y)
    }

    /// Whether a living tank occupies a cell, optionally excluding one
    /// tank (for self-movement checks).
    #[must_use]
    pub fn is_blocked_by_tank(&self, x: i32, y: i32, ignore: Option<TankId>) -> bool {
        self.tanks().any(|t| {
            Some(t.id) != ignore && t.is_alive() && t.x == x && t.y == y
        })
    }

    /// Look up a tank by id on either team.
    #[must_use]
    pub fn tank(&self, id: TankId) -> Option<&Tank> {
        self.tanks().find(|t| t.id == id)
    }

    /// Mutable lookup of a tank by id.
    pub fn tank_mut(&mut self, id: TankId) -> Option<&mut Tank> {
        self.team_a_tanks
            .iter_mut()
            .chain(self.team_b_tanks.iter_mut())
            .find(|t| t.id == id)
    }

    /// Iterate both teams' tanks, team A first, in spawn order.
    pub fn tanks(&self) -> impl Iterator<Item = &Tank> {
        self.team_a_tanks.iter().chain(self.team_b_tanks.iter())
    }

    /// One team's tanks in spawn order.
    #[must_use]
    pub fn team_tanks(&self, team: Team) -> &[Tank] {
        match team {
            Team::A => &self.team_a_tanks,
            Team::B => &self.team_b_tanks,
        }
    }

    /// One team's living tanks in spawn order.
    pub fn alive_tanks(&self, team: Team) -> impl Iterator<Item = &Tank> {
        self.team_tanks(team).iter().filter(|t| t.is_alive())
    }

    /// Number of tanks ever fielded by a team (dead ones included).
    #[must_use]
    pub fn tank_count(&self, team: Team) -> usize {
        self.team_tanks(team).len()
    }

    /// Number of a team's tanks still alive.
    #[must_use]
    pub fn alive_count(&self, team: Team) -> usize {
        self.alive_tanks(team).count()
    }

    /// A team's base.
    #[must_use]
    pub const fn base(&self, team: Team) -> &Base {
        match team {
            Team::A => &self.base_a,
            Team::B => &self.base_b,
        }
    }

    /// The wall at a cell, if any.
    #[must_use]
    pub fn wall_at(&self, x: i32, y: i32) -> Option<&Wall> {
        self.walls.iter().find(|w| w.x == x && w.y == y)
    }

    /// All walls.
    #[must_use]
    pub fn walls(&self) -> &[Wall] {
        &self.walls
    }

    /// All bullets currently in flight.
    #[must_use]
    pub fn bullets(&self) -> &[Bullet] {
        &self.bullets
    }

    /// Side length of the square board.
    #[must_use]
    pub const fn board_size(&self) -> i32 {
        self.board_size
    }

    /// Completed ticks.
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Frame at which the match is forced to a draw.
    #[must_use]
    pub const fn tick_limit(&self) -> u64 {
        self.tick_limit
    }

    /// The single global score counter.
    #[must_use]
    pub const fn score(&self) -> u32 {
        self.score
    }

    /// Whether the match has concluded.
    #[must_use]
    pub const fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// The winning team, or `None` for an undecided or drawn match.
    #[must_use]
    pub const fn winner(&self) -> Option<Team> {
        self.winner
    }

    /// Whether updates are currently suspended.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    // ========================================================================
    // Direct-mutation operations (cheat runtime)
    // ========================================================================

    /// Spawn a tank at an explicit cell.
    ///
    /// # Errors
    ///
    /// Rejects cells out of bounds or occupied by a wall, a living tank,
    /// or a base.
    pub fn spawn_tank(&mut self, x: i32, y: i32, team: Team) -> Result<TankId> {
        self.ensure_free_tile(x, y)?;
        let id = self.next_tank_id;
        self.push_tank(x, y, team);
        Ok(id)
    }

    /// Spawn up to `count` tanks on free tiles.
    ///
    /// Scans the board bottom-left, row-major, skipping base tiles and
    /// blocked tiles, so the placement is deterministic. Returns how many
    /// tanks were actually placed.
    pub fn spawn_tanks(&mut self, count: u32, team: Team) -> u32 {
        let mut spawned = 0;
        'outer: for y in 0..self.board_size {
            for x in 0..self.board_size {
                if spawned == count {
                    break 'outer;
                }
                if self.ensure_free_tile(x, y).is_ok() {
                    self.push_tank(x, y, team);
                    spawned += 1;
                }
            }
        }
        spawned
    }

    /// Validate that a cell is in bounds and free of walls, living tanks,
    /// and bases.
    fn ensure_free_tile(&self, x: i32, y: i32) -> Result<()> {
        if !self.is_valid_position(x, y) {
            return Err(GameError::InvalidPosition {
                x,
                y,
                reason: "out of bounds".into(),
            });
        }
        if self.is_blocked_by_wall(x, y)
            || self.is_blocked_by_tank(x, y, None)
            || (self.base_a.x == x && self.base_a.y == y)
            || (self.base_b.x == x && self.base_b.y == y)
        {
            return Err(GameError::InvalidPosition {
                x,
                y,
                reason: "tile occupied".into(),
            });
        }
        Ok(())
    }

    /// Remove a tank from the match entirely.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::TankNotFound`] for unknown ids.
    pub fn remove_tank(&mut self, id: TankId) -> Result<()> {
        let before = self.team_a_tanks.len() + self.team_b_tanks.len();
        self.team_a_tanks.retain(|t| t.id != id);
        self.team_b_tanks.retain(|t| t.id != id);
        if self.team_a_tanks.len() + self.team_b_tanks.len() == before {
            return Err(GameError::TankNotFound(id));
        }
        Ok(())
    }

    /// Remove every tank of one team.
    pub fn remove_all_tanks(&mut self, team: Team) {
        match team {
            Team::A => self.team_a_tanks.clear(),
            Team::B => self.team_b_tanks.clear(),
        }
    }

    /// Kill a tank outright: zero health, zero lives.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::TankNotFound`] for unknown ids.
    pub fn kill_tank(&mut self, id: TankId) -> Result<()> {
        let tank = self.tank_mut(id).ok_or(GameError::TankNotFound(id))?;
        tank.health = 0;
        tank.lives = 0;
        Ok(())
    }

    /// Kill every tank of one team.
    pub fn kill_all_tanks(&mut self, team: Team) {
        let tanks = match team {
            Team::A => &mut self.team_a_tanks,
            Team::B => &mut self.team_b_tanks,
        };
        for tank in tanks {
            tank.health = 0;
            tank.lives = 0;
        }
    }

    /// Heal a tank, clamped to full health.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::TankNotFound`] for unknown ids.
    pub fn heal_tank(&mut self, id: TankId, amount: u32) -> Result<()> {
        let tank = self.tank_mut(id).ok_or(GameError::TankNotFound(id))?;
        tank.health = (tank.health + amount).min(TANK_MAX_HEALTH);
        Ok(())
    }

    /// Heal every tank of one team, clamped to full health.
    pub fn heal_all_tanks(&mut self, team: Team, amount: u32) {
        let tanks = match team {
            Team::A => &mut self.team_a_tanks,
            Team::B => &mut self.team_b_tanks,
        };
        for tank in tanks {
            tank.health = (tank.health + amount).min(TANK_MAX_HEALTH);
        }
    }

    /// Set a tank's remaining lives. Granting lives to a dead wreck
    /// respawns it at its spawn cell.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::TankNotFound`] for unknown ids.
    pub fn set_tank_lives(&mut self, id: TankId, lives: u32) -> Result<()> {
        let tank = self.tank_mut(id).ok_or(GameError::TankNotFound(id))?;
        tank.lives = lives;
        if tank.lives > 0 && tank.health == 0 {
            tank.respawn();
        }
        Ok(())
    }

    /// Heal a team's base.
    pub fn heal_base(&mut self, team: Team, amount: u32) {
        let base = self.base_for_mut(team);
        base.health += amount;
    }

    /// Set a team's base health directly.
    pub fn set_base_health(&mut self, team: Team, health: u32) {
        self.base_for_mut(team).health = health;
    }

    /// Destroy a team's base. The loss is declared on the next update.
    pub fn destroy_base(&mut self, team: Team) {
        self.base_for_mut(team).health = 0;
    }

    fn base_for_mut(&mut self, team: Team) -> &mut Base {
        match team {
            Team::A => &mut self.base_a,
            Team::B => &mut self.base_b,
        }
    }

    /// Change the material of the wall at a cell.
    ///
    /// # Errors
    ///
    /// Fails when no wall occupies the cell.
    pub fn change_wall_type(&mut self, x: i32, y: i32, kind: WallKind) -> Result<()> {
        let wall = self
            .walls
            .iter_mut()
            .find(|w| w.x == x && w.y == y)
            .ok_or(GameError::InvalidPosition {
                x,
                y,
                reason: "no wall at cell".into(),
            })?;
        wall.set_kind(kind);
        Ok(())
    }

    /// Change the material of every wall.
    pub fn change_all_walls_type(&mut self, kind: WallKind) {
        for wall in &mut self.walls {
            wall.set_kind(kind);
        }
    }

    /// Add a wall at a free cell.
    ///
    /// # Errors
    ///
    /// Rejects out-of-bounds or occupied cells; at most one wall per cell.
    pub fn add_wall(&mut self, x: i32, y: i32, kind: WallKind) -> Result<()> {
        self.ensure_free_tile(x, y)?;
        self.walls.push(Wall::new(x, y, kind));
        Ok(())
    }

    /// Remove the wall at a cell.
    ///
    /// # Errors
    ///
    /// Fails when no wall occupies the cell.
    pub fn remove_wall(&mut self, x: i32, y: i32) -> Result<()> {
        let before = self.walls.len();
        self.walls.retain(|w| !(w.x == x && w.y == y));
        if self.walls.len() == before {
            return Err(GameError::InvalidPosition {
                x,
                y,
                reason: "no wall at cell".into(),
            });
        }
        Ok(())
    }

    /// Remove every wall.
    pub fn clear_walls(&mut self) {
        self.walls.clear();
    }

    /// Re-run initialization from the stored layout, keeping the tick
    /// limit. This is the only way a finished match un-finishes.
    pub fn force_restart(&mut self) {
        let layout = std::mem::take(&mut self.original_layout);
        let tick_limit = self.tick_limit;
        *self = Self::from_rows(&layout, tick_limit);
    }

    /// End the match immediately with an explicit winner (`None` = draw).
    pub fn force_game_over(&mut self, winner: Option<Team>) {
        self.finish(winner);
    }

    /// Replace the tick limit.
    pub fn set_tick_limit(&mut self, limit: u64) {
        self.tick_limit = limit;
    }

    /// Overwrite the global score.
    pub fn set_score(&mut self, score: u32) {
        self.score = score;
    }

    /// Suspend updates.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume updates.
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Remove every bullet in flight.
    pub fn clear_bullets(&mut self) {
        self.bullets.clear();
    }

    /// Inject a live bullet.
    ///
    /// # Errors
    ///
    /// Rejects out-of-bounds cells.
    pub fn spawn_bullet(&mut self, x: i32, y: i32, direction: Direction, team: Team) -> Result<()> {
        if !self.is_valid_position(x, y) {
            return Err(GameError::InvalidPosition {
                x,
                y,
                reason: "out of bounds".into(),
            });
        }
        self.bullets.push(Bullet::new(x, y, direction, team));
        Ok(())
    }

    // ========================================================================
    // Hashing and snapshots
    // ========================================================================

    /// Calculate an order-stable hash of every observable field.
    ///
    /// Two states with identical histories produce identical hashes; the
    /// determinism test harness compares these across runs.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.board_size.hash(&mut hasher);
        self.frame.hash(&mut hasher);
        self.score.hash(&mut hasher);
        self.game_over.hash(&mut hasher);
        self.winner.map(Team::tag).hash(&mut hasher);
        self.paused.hash(&mut hasher);
        self.tick_limit.hash(&mut hasher);

        for tank in self.tanks() {
            tank.id.hash(&mut hasher);
            tank.team.tag().hash(&mut hasher);
            tank.x.hash(&mut hasher);
            tank.y.hash(&mut hasher);
            tank.direction.index().hash(&mut hasher);
            tank.health.hash(&mut hasher);
            tank.lives.hash(&mut hasher);
        }

        for wall in &self.walls {
            wall.x.hash(&mut hasher);
            wall.y.hash(&mut hasher);
            wall.health.hash(&mut hasher);
            wall.is_destructible().hash(&mut hasher);
        }

        for bullet in &self.bullets {
            bullet.x.hash(&mut hasher);
            bullet.y.hash(&mut hasher);
            bullet.direction.index().hash(&mut hasher);
            bullet.team.tag().hash(&mut hasher);
        }

        for base in [&self.base_a, &self.base_b] {
            base.x.hash(&mut hasher);
            base.y.hash(&mut hasher);
            base.health.hash(&mut hasher);
        }

        hasher.finish()
    }

    /// Serialize the full state for replay or snapshot tooling.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| GameError::InvalidState(format!("Failed to serialize game state: {e}")))
    }

    /// Restore a state from [`serialize`](Self::serialize) output.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data)
            .map_err(|e| GameError::InvalidState(format!("Failed to deserialize game state: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(rows: &[&str]) -> Vec<String> {
        rows.iter().map(|r| (*r).to_string()).collect()
    }

    fn empty_board(size: usize) -> Vec<String> {
        vec![" ".repeat(size); size]
    }

    #[test]
    fn test_empty_layout_is_rejected() {
        assert!(GameState::new(&[], 100).is_err());
    }

    #[test]
    fn test_layout_parse_inverts_y() {
        // Text row 0 is the top, so 'A' in the top-left corner lands at
        // (0, size-1).
        let state = GameState::new(
            &rows(&[
                "A    ", //
                "     ", //
                "  X  ", //
                "     ", //
                "B   b",
            ]),
            100,
        )
        .unwrap();

        let a = &state.team_tanks(Team::A)[0];
        assert_eq!((a.x, a.y), (0, 4));

        let b = &state.team_tanks(Team::B)[0];
        assert_eq!((b.x, b.y), (0, 0));

        assert!(state.is_blocked_by_wall(2, 2));
        assert_eq!((state.base(Team::B).x, state.base(Team::B).y), (4, 0));
    }

    #[test]
    fn test_tank_ids_restart_from_zero() {
        let layout = rows(&["AB ", "   ", "   "]);
        let first = GameState::new(&layout, 100).unwrap();
        let second = GameState::new(&layout, 100).unwrap();

        let ids_first: Vec<_> = first.tanks().map(|t| t.id).collect();
        let ids_second: Vec<_> = second.tanks().map(|t| t.id).collect();
        assert_eq!(ids_first, vec![0, 1]);
        assert_eq!(ids_first, ids_second);
    }

    #[test]
    fn test_move_updates_facing_even_when_blocked() {
        let mut state = GameState::new(&rows(&["   ", "AX ", "   "]), 100).unwrap();
        let id = state.team_tanks(Team::A)[0].id;

        // East is blocked by the wall; the move fails but facing changes.
        assert!(!state.move_tank(id, Direction::East));
        let tank = state.tank(id).unwrap();
        assert_eq!(tank.direction, Direction::East);
        assert_eq!((tank.x, tank.y), (0, 1));

        assert!(state.move_tank(id, Direction::North));
        let tank = state.tank(id).unwrap();
        assert_eq!((tank.x, tank.y), (0, 2));
    }

    #[test]
    fn test_move_blocked_by_living_tank_but_not_self() {
        let mut state = GameState::new(&rows(&["   ", "AB ", "   "]), 100).unwrap();
        let a = state.team_tanks(Team::A)[0].id;
        let b = state.team_tanks(Team::B)[0].id;

        assert!(!state.move_tank(a, Direction::East));

        // Dead tanks stop blocking.
        state.kill_tank(b).unwrap();
        assert!(state.move_tank(a, Direction::East));
    }

    #[test]
    fn test_shoot_off_board_is_noop() {
        let mut state = GameState::new(&rows(&["A  ", "   ", "   "]), 100).unwrap();
        let id = state.team_tanks(Team::A)[0].id;

        // Facing north from the top row: spawn cell is off the board.
        state.tank_shoot(id);
        assert!(state.bullets().is_empty());
    }

    #[test]
    fn test_shoot_immediate_wall_hit_spawns_no_bullet() {
        let mut state = GameState::new(&rows(&["   ", "AX ", "   "]), 100).unwrap();
        let id = state.team_tanks(Team::A)[0].id;

        state.move_tank(id, Direction::East); // turn only
        state.tank_shoot(id);

        assert!(state.bullets().is_empty());
        // Brick wall had health 1, took 1 damage, purged next update.
        assert!(state.wall_at(1, 1).unwrap().is_destroyed());
        state.update();
        assert!(state.wall_at(1, 1).is_none());
    }

    #[test]
    fn test_shoot_immediate_enemy_hit_scores() {
        let mut state = GameState::new(&rows(&["   ", "AB ", "   "]), 100).unwrap();
        let a = state.team_tanks(Team::A)[0].id;
        let b = state.team_tanks(Team::B)[0].id;

        state.move_tank(a, Direction::East); // turn to face B
        state.tank_shoot(a);

        assert_eq!(state.score(), 100);
        assert_eq!(state.tank(b).unwrap().health, 2);
        assert!(state.bullets().is_empty());
    }

    #[test]
    fn test_shoot_own_base_is_noop() {
        let mut state = GameState::new(&rows(&[" a ", " A ", "   "]), 100).unwrap();
        let a = state.team_tanks(Team::A)[0].id;

        // Facing north at the own base: the base neither takes damage nor
        // absorbs the shot, the bullet spawns on its tile and flies on.
        state.tank_shoot(a);

        assert!(state.base(Team::A).is_alive());
        assert_eq!(state.bullets().len(), 1);
    }

    #[test]
    fn test_bullet_travels_and_hits_enemy_base() {
        let mut state = GameState::new(&rows(&["     ", "     ", "A   b", "     ", "     "]), 100)
            .unwrap();
        let a = state.team_tanks(Team::A)[0].id;

        state.move_tank(a, Direction::East);
        // Tank moved to (1,2); shoot spawns a bullet at (2,2).
        state.tank_shoot(a);
        assert_eq!(state.bullets().len(), 1);

        state.update(); // bullet to (3,2)
        assert!(!state.is_game_over());
        state.update(); // bullet to (4,2): base hit
        assert!(state.is_game_over());
        assert_eq!(state.winner(), Some(Team::A));
        assert!(state.bullets().is_empty());
    }

    #[test]
    fn test_bullet_resolves_at_most_one_collision() {
        let mut state = GameState::new(&empty_board(5), 100).unwrap();
        // Wall and enemy tank in the same cell cannot exist, but wall and
        // bullet path ordering matters: wall absorbs the hit first.
        state.add_wall(3, 2, WallKind::Brick).unwrap();
        let b = state.spawn_tank(4, 2, Team::B).unwrap();
        state.spawn_bullet(2, 2, Direction::East, Team::A).unwrap();

        state.update();
        // Bullet reached (3,2): the wall takes the damage, the tank behind
        // is untouched and no score is credited.
        assert_eq!(state.tank(b).unwrap().health, 3);
        assert_eq!(state.score(), 0);
        assert!(state.bullets().is_empty());
        assert!(state.wall_at(3, 2).is_none());
    }

    #[test]
    fn test_bullet_ignores_friendly_tank_and_base() {
        let mut state = GameState::new(&empty_board(5), 100).unwrap();
        let a = state.spawn_tank(3, 2, Team::A).unwrap();
        state.spawn_bullet(1, 2, Direction::East, Team::A).unwrap();

        state.update(); // bullet to (2,2)
        state.update(); // bullet to (3,2), friendly: passes through
        assert_eq!(state.tank(a).unwrap().health, 3);
        assert_eq!(state.bullets().len(), 1);
    }

    #[test]
    fn test_bullet_leaves_board_and_despawns() {
        let mut state = GameState::new(&empty_board(3), 100).unwrap();
        state.spawn_bullet(2, 1, Direction::East, Team::A).unwrap();
        state.update();
        assert!(state.bullets().is_empty());
    }

    #[test]
    fn test_respawn_restores_spawn_cell() {
        let mut state = GameState::new(&rows(&["   ", "AB ", "   "]), 100).unwrap();
        let a = state.team_tanks(Team::A)[0].id;
        let b = state.team_tanks(Team::B)[0].id;

        state.move_tank(b, Direction::West); // face the attacker
        state.move_tank(a, Direction::East);

        // Three point-blank shots: health 3 -> 0, one life burned, respawn.
        for _ in 0..3 {
            state.tank_shoot(a);
        }

        let tank = state.tank(b).unwrap();
        assert_eq!(tank.lives, 4);
        assert_eq!(tank.health, 3);
        assert_eq!((tank.x, tank.y), (1, 1));
        assert_eq!(state.score(), 300);
    }

    #[test]
    fn test_tank_dies_for_good_after_all_lives() {
        let mut state = GameState::new(&rows(&["   ", "AB ", "   "]), 1000).unwrap();
        let a = state.team_tanks(Team::A)[0].id;
        let b = state.team_tanks(Team::B)[0].id;
        state.move_tank(a, Direction::East);

        // 3 health x 5 lives: the 15th point-blank hit is final.
        for _ in 0..14 {
            state.tank_shoot(a);
        }
        assert!(state.tank(b).unwrap().is_alive());

        state.tank_shoot(a);
        let tank = state.tank(b).unwrap();
        assert!(!tank.is_alive());
        assert_eq!(tank.lives, 0);
    }

    #[test]
    fn test_team_elimination_ends_match() {
        let mut state = GameState::new(&rows(&["   ", "AB ", "   "]), 100).unwrap();
        let b = state.team_tanks(Team::B)[0].id;

        state.kill_tank(b).unwrap();
        state.update();

        assert!(state.is_game_over());
        assert_eq!(state.winner(), Some(Team::A));
    }

    #[test]
    fn test_base_precedence_over_elimination() {
        // Base A destroyed and team A eliminated in the same tick: the
        // base check runs first, so B wins by base kill either way, but
        // the precedence also covers base-A-vs-base-B ordering.
        let mut state = GameState::new(&rows(&["ab ", "AB ", "   "]), 100).unwrap();
        state.destroy_base(Team::A);
        state.destroy_base(Team::B);
        state.update();

        assert!(state.is_game_over());
        assert_eq!(state.winner(), Some(Team::B));
    }

    #[test]
    fn test_tick_limit_forces_draw() {
        let mut state = GameState::new(&rows(&["A  ", "   ", "  B"]), 3).unwrap();
        for _ in 0..3 {
            state.update();
        }
        assert!(state.is_game_over());
        assert_eq!(state.winner(), None);
        assert_eq!(state.frame(), 3);
    }

    #[test]
    fn test_game_over_is_a_fixed_point() {
        let mut state = GameState::new(&rows(&["A  ", "   ", "  B"]), 2).unwrap();
        state.spawn_bullet(1, 1, Direction::East, Team::A).unwrap();
        for _ in 0..2 {
            state.update();
        }
        assert!(state.is_game_over());

        let hash = state.state_hash();
        for _ in 0..10 {
            state.update();
        }
        assert_eq!(state.state_hash(), hash);
        assert_eq!(state.frame(), 2);
    }

    #[test]
    fn test_pause_suspends_updates() {
        let mut state = GameState::new(&empty_board(3), 100).unwrap();
        state.pause();
        state.update();
        assert_eq!(state.frame(), 0);
        state.resume();
        state.update();
        assert_eq!(state.frame(), 1);
    }

    #[test]
    fn test_spawn_tank_rejects_occupied_tiles() {
        let mut state = GameState::new(&rows(&["   ", "AXa", "  b"]), 100).unwrap();

        assert!(state.spawn_tank(0, 1, Team::B).is_err()); // tank
        assert!(state.spawn_tank(1, 1, Team::B).is_err()); // wall
        assert!(state.spawn_tank(2, 1, Team::B).is_err()); // base
        assert!(state.spawn_tank(2, 0, Team::B).is_err()); // other base
        assert!(state.spawn_tank(5, 5, Team::B).is_err()); // out of bounds
        assert!(state.spawn_tank(0, 0, Team::B).is_ok());
    }

    #[test]
    fn test_spawn_tanks_scans_deterministically() {
        // A layout without base codes leaves both default bases at the
        // origin, so the scan skips (0, 0) and fills row 0 left to right.
        let mut state = GameState::new(&empty_board(3), 100).unwrap();
        let spawned = state.spawn_tanks(2, Team::B);
        assert_eq!(spawned, 2);

        let cells: Vec<_> = state.team_tanks(Team::B).iter().map(|t| (t.x, t.y)).collect();
        assert_eq!(cells, vec![(1, 0), (2, 0)]);
    }

    #[test]
    fn test_force_restart_replays_identical_ids() {
        let layout = rows(&["A B", "   ", "a b"]);
        let mut state = GameState::new(&layout, 50).unwrap();
        let ids_before: Vec<_> = state.tanks().map(|t| t.id).collect();

        state.force_game_over(Some(Team::A));
        assert!(state.is_game_over());

        state.force_restart();
        assert!(!state.is_game_over());
        assert_eq!(state.frame(), 0);
        assert_eq!(state.tick_limit(), 50);
        let ids_after: Vec<_> = state.tanks().map(|t| t.id).collect();
        assert_eq!(ids_before, ids_after);
    }

    #[test]
    fn test_set_lives_revives_wreck() {
        let mut state = GameState::new(&rows(&["   ", "A  ", "   "]), 100).unwrap();
        let id = state.team_tanks(Team::A)[0].id;

        state.kill_tank(id).unwrap();
        assert!(!state.tank(id).unwrap().is_alive());

        state.set_tank_lives(id, 2).unwrap();
        let tank = state.tank(id).unwrap();
        assert!(tank.is_alive());
        assert_eq!(tank.health, TANK_MAX_HEALTH);
    }

    #[test]
    fn test_cheat_ops_report_unknown_ids() {
        let mut state = GameState::new(&empty_board(3), 100).unwrap();
        assert!(state.kill_tank(42).is_err());
        assert!(state.heal_tank(42, 1).is_err());
        assert!(state.set_tank_lives(42, 1).is_err());
        assert!(state.remove_tank(42).is_err());
    }

    #[test]
    fn test_wall_ops() {
        let mut state = GameState::new(&empty_board(4), 100).unwrap();
        state.add_wall(1, 1, WallKind::Brick).unwrap();
        assert!(state.add_wall(1, 1, WallKind::Steel).is_err()); // one wall per cell

        state.change_wall_type(1, 1, WallKind::Steel).unwrap();
        assert_eq!(state.wall_at(1, 1).unwrap().kind, WallKind::Steel);

        state.remove_wall(1, 1).unwrap();
        assert!(state.remove_wall(1, 1).is_err());

        state.add_wall(2, 2, WallKind::Brick).unwrap();
        state.add_wall(3, 3, WallKind::Brick).unwrap();
        state.change_all_walls_type(WallKind::Steel);
        assert!(state.walls().iter().all(|w| w.kind == WallKind::Steel));

        state.clear_walls();
        assert!(state.walls().is_empty());
    }

    #[test]
    fn test_snapshot_roundtrip_preserves_hash() {
        let mut state = GameState::new(&rows(&["A B", " X ", "a b"]), 100).unwrap();
        state.update();

        let bytes = state.serialize().unwrap();
        let restored = GameState::deserialize(&bytes).unwrap();
        assert_eq!(state.state_hash(), restored.state_hash());
    }
}
