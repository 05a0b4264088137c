//! Entity state holders: tanks, walls, bullets, and bases.
//!
//! Entities are plain data with small behavioral contracts (damage,
//! movement, respawn). All ownership and collection bookkeeping lives in
//! [`crate::state::GameState`]; nothing here holds references to anything
//! else.

use serde::{Deserialize, Serialize};

use crate::grid::Direction;

/// Unique identifier for tanks within one match.
///
/// Ids are assigned monotonically by the [`crate::state::GameState`] id
/// allocator, which resets on initialization so a replayed match gets
/// identical ids.
pub type TankId = u32;

/// Full health of a tank (also the respawn health).
pub const TANK_MAX_HEALTH: u32 = 3;

/// Lives a freshly spawned tank starts with.
pub const TANK_START_LIVES: u32 = 5;

/// Health of a destructible brick wall.
pub const BRICK_HEALTH: u32 = 1;

/// Nominal health of an indestructible steel wall.
pub const STEEL_HEALTH: u32 = 999;

/// Default health of a team base.
pub const BASE_HEALTH: u32 = 1;

/// One of the two competing teams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    /// Team A (spawn code `A`, base code `a`).
    A,
    /// Team B (spawn code `B`, base code `b`).
    B,
}

impl Team {
    /// The opposing team.
    #[must_use]
    pub const fn enemy(self) -> Team {
        match self {
            Team::A => Team::B,
            Team::B => Team::A,
        }
    }

    /// Single-letter tag used in cheat commands and match reports.
    #[must_use]
    pub const fn tag(self) -> char {
        match self {
            Team::A => 'A',
            Team::B => 'B',
        }
    }

    /// Parse a team tag (`A`/`a` or `B`/`b`).
    #[must_use]
    pub const fn from_tag(tag: char) -> Option<Team> {
        match tag {
            'A' | 'a' => Some(Team::A),
            'B' | 'b' => Some(Team::B),
            _ => None,
        }
    }
}

/// A tank: position, facing, health, and remaining lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tank {
    /// Match-unique id.
    pub id: TankId,
    /// Owning team.
    pub team: Team,
    /// Current cell x.
    pub x: i32,
    /// Current cell y.
    pub y: i32,
    /// Spawn cell x (respawn target).
    pub spawn_x: i32,
    /// Spawn cell y (respawn target).
    pub spawn_y: i32,
    /// Current facing direction.
    pub direction: Direction,
    /// Current health, 0..=[`TANK_MAX_HEALTH`].
    pub health: u32,
    /// Remaining lives. A tank is alive iff this is positive.
    pub lives: u32,
}

impl Tank {
    /// Create a tank at its spawn cell, facing north, at full health.
    #[must_use]
    pub fn new(id: TankId, x: i32, y: i32, team: Team) -> Self {
        Self {
            id,
            team,
            x,
            y,
            spawn_x: x,
            spawn_y: y,
            direction: Direction::North,
            health: TANK_MAX_HEALTH,
            lives: TANK_START_LIVES,
        }
    }

    /// Whether the tank is still in play.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.lives > 0
    }

    /// Move the tank to an absolute cell.
    pub fn set_position(&mut self, x: i32, y: i32) {
        self.x = x;
        self.y = y;
    }

    /// Apply damage. When health reaches 0 one life is consumed; the
    /// caller decides whether to [`respawn`](Self::respawn) (lives left)
    /// or leave the wreck (no lives left).
    pub fn take_damage(&mut self, damage: u32) {
        self.health = self.health.saturating_sub(damage);
        if self.health == 0 {
            self.lives = self.lives.saturating_sub(1);
        }
    }

    /// Return to the spawn cell with full health.
    pub fn respawn(&mut self) {
        self.x = self.spawn_x;
        self.y = self.spawn_y;
        self.health = TANK_MAX_HEALTH;
    }
}

/// Wall material, deciding destructibility and starting health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WallKind {
    /// Destructible brick (health [`BRICK_HEALTH`]).
    Brick,
    /// Indestructible steel (health [`STEEL_HEALTH`], ignores damage).
    Steel,
}

impl WallKind {
    /// Starting health for this material.
    #[must_use]
    pub const fn initial_health(self) -> u32 {
        match self {
            WallKind::Brick => BRICK_HEALTH,
            WallKind::Steel => STEEL_HEALTH,
        }
    }

    /// Name used by the cheat grammar (`brick`/`steel`).
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            WallKind::Brick => "brick",
            WallKind::Steel => "steel",
        }
    }

    /// Parse a wall type name from the cheat grammar.
    #[must_use]
    pub fn from_name(name: &str) -> Option<WallKind> {
        match name {
            "brick" => Some(WallKind::Brick),
            "steel" => Some(WallKind::Steel),
            _ => None,
        }
    }
}

/// A wall occupying exactly one cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wall {
    /// Cell x.
    pub x: i32,
    /// Cell y.
    pub y: i32,
    /// Material.
    pub kind: WallKind,
    /// Remaining health.
    pub health: u32,
}

impl Wall {
    /// Create a wall of the given material at a cell.
    #[must_use]
    pub fn new(x: i32, y: i32, kind: WallKind) -> Self {
        Self {
            x,
            y,
            kind,
            health: kind.initial_health(),
        }
    }

    /// Whether the wall can take damage at all.
    #[must_use]
    pub const fn is_destructible(&self) -> bool {
        matches!(self.kind, WallKind::Brick)
    }

    /// Destroyed walls are purged from the board at the end of the tick.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.health == 0
    }

    /// Apply damage. Steel ignores it.
    pub fn take_damage(&mut self, damage: u32) {
        if self.is_destructible() {
            self.health = self.health.saturating_sub(damage);
        }
    }

    /// Change material, resetting health to the new material's value.
    pub fn set_kind(&mut self, kind: WallKind) {
        self.kind = kind;
        self.health = kind.initial_health();
    }
}

/// A bullet in flight, one cell per tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bullet {
    /// Current cell x.
    pub x: i32,
    /// Current cell y.
    pub y: i32,
    /// Cell x before the latest advance (for renderers interpolating).
    pub prev_x: i32,
    /// Cell y before the latest advance.
    pub prev_y: i32,
    /// Travel direction.
    pub direction: Direction,
    /// Team that fired it. Friendly entities are never hit.
    pub team: Team,
    /// Cleared on the first collision or when leaving the board; inactive
    /// bullets are purged at end of tick.
    pub active: bool,
}

impl Bullet {
    /// Create a live bullet at a cell.
    #[must_use]
    pub fn new(x: i32, y: i32, direction: Direction, team: Team) -> Self {
        Self {
            x,
            y,
            prev_x: x,
            prev_y: y,
            direction,
            team,
            active: true,
        }
    }

    /// Advance one cell along the travel direction.
    pub fn advance(&mut self) {
        self.prev_x = self.x;
        self.prev_y = self.y;
        let (nx, ny) = self.direction.step(self.x, self.y);
        self.x = nx;
        self.y = ny;
    }

    /// Take the bullet out of play.
    pub fn deactivate(&mut self) {
        self.active = false;
    }
}

/// A team's base. Destroying the enemy base wins the match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Base {
    /// Cell x.
    pub x: i32,
    /// Cell y.
    pub y: i32,
    /// Owning team.
    pub team: Team,
    /// Remaining health.
    pub health: u32,
}

impl Base {
    /// Create a base for a team at a cell.
    #[must_use]
    pub fn new(x: i32, y: i32, team: Team) -> Self {
        Self {
            x,
            y,
            team,
            health: BASE_HEALTH,
        }
    }

    /// Whether the base still stands.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Apply damage from `attacker`. Fire from the owning team is a no-op.
    pub fn take_damage(&mut self, damage: u32, attacker: Team) {
        if self.team == attacker {
            return;
        }
        self.health = self.health.saturating_sub(damage);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_enemy() {
        assert_eq!(Team::A.enemy(), Team::B);
        assert_eq!(Team::B.enemy(), Team::A);
    }

    #[test]
    fn test_team_tag_roundtrip() {
        assert_eq!(Team::from_tag('A'), Some(Team::A));
        assert_eq!(Team::from_tag('b'), Some(Team::B));
        assert_eq!(Team::from_tag('x'), None);
    }

    #[test]
    fn test_tank_damage_consumes_life_at_zero_health() {
        let mut tank = Tank::new(1, 2, 3, Team::A);
        assert_eq!(tank.lives, TANK_START_LIVES);

        tank.take_damage(1);
        tank.take_damage(1);
        assert_eq!(tank.health, 1);
        assert_eq!(tank.lives, TANK_START_LIVES);

        tank.take_damage(1);
        assert_eq!(tank.health, 0);
        assert_eq!(tank.lives, TANK_START_LIVES - 1);
        assert!(tank.is_alive());
    }

    #[test]
    fn test_tank_respawn_restores_spawn_cell_and_health() {
        let mut tank = Tank::new(7, 4, 4, Team::B);
        tank.set_position(0, 0);
        tank.take_damage(TANK_MAX_HEALTH);
        tank.respawn();

        assert_eq!((tank.x, tank.y), (4, 4));
        assert_eq!(tank.health, TANK_MAX_HEALTH);
    }

    #[test]
    fn test_tank_out_of_lives_stays_dead() {
        let mut tank = Tank::new(1, 0, 0, Team::A);
        tank.lives = 1;
        tank.take_damage(TANK_MAX_HEALTH);
        assert_eq!(tank.lives, 0);
        assert!(!tank.is_alive());
    }

    #[test]
    fn test_brick_wall_breaks() {
        let mut wall = Wall::new(1, 1, WallKind::Brick);
        assert!(wall.is_destructible());
        wall.take_damage(1);
        assert!(wall.is_destroyed());
    }

    #[test]
    fn test_steel_wall_ignores_damage() {
        let mut wall = Wall::new(1, 1, WallKind::Steel);
        for _ in 0..10 {
            wall.take_damage(1);
        }
        assert_eq!(wall.health, STEEL_HEALTH);
        assert!(!wall.is_destroyed());
    }

    #[test]
    fn test_wall_kind_change_resets_health() {
        let mut wall = Wall::new(0, 0, WallKind::Brick);
        wall.set_kind(WallKind::Steel);
        assert_eq!(wall.health, STEEL_HEALTH);
        wall.set_kind(WallKind::Brick);
        assert_eq!(wall.health, BRICK_HEALTH);
    }

    #[test]
    fn test_bullet_advance_tracks_previous_cell() {
        let mut bullet = Bullet::new(2, 2, Direction::East, Team::A);
        bullet.advance();
        assert_eq!((bullet.x, bullet.y), (3, 2));
        assert_eq!((bullet.prev_x, bullet.prev_y), (2, 2));
    }

    #[test]
    fn test_base_ignores_friendly_fire() {
        let mut base = Base::new(0, 0, Team::A);
        base.take_damage(1, Team::A);
        assert!(base.is_alive());
        base.take_damage(1, Team::B);
        assert!(!base.is_alive());
    }
}
