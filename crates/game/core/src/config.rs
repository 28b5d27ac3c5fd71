/// Battle configuration constants and tunable parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattleConfig {
    /// Seed for the world RNG (dice, buff lifetimes, break rolls, bonuses).
    pub seed: u64,
    /// Let the AI drive the player team as well.
    pub autopilot: bool,
}

impl BattleConfig {
    // ===== initiative =====
    /// Charge time needed to become "up".
    pub const CT_FOR_TURN: i32 = 100;
    pub const CT_COST_FULL: i32 = 100;
    pub const CT_COST_HALF: i32 = 80;
    pub const CT_COST_IDLE: i32 = 60;
    /// Ceiling on CT after a turn where the unit neither moved nor acted.
    pub const CT_IDLE_CAP: i32 = 60;
    /// Scheduling passes attempted per `next_turn` before giving up.
    pub const MAX_SCHEDULING_PASSES: u32 = 10_000;

    // ===== draw order =====
    pub const Z_CORPSE: i32 = 1;
    pub const Z_UNIT: i32 = 100;
    pub const Z_EFFECT: i32 = 999;

    // ===== animation, in world ticks =====
    /// Idle ticks between steps while a unit walks.
    pub const MOVE_STEP_WAIT: u32 = 0;
    /// Idle ticks between steps of a projectile.
    pub const PROJECTILE_STEP_WAIT: u32 = 1;
    /// Lifetime of the impact flash left on each hit tile.
    pub const HIT_EFFECT_LIFE: u32 = 15;

    // ===== scoring =====
    pub const SCORE_PER_VICTORY: i64 = 1000;
    /// Bonus per turn under [`Self::SCORE_TURN_PAR`], doubled.
    pub const SCORE_TURN_PAR: i64 = 500;
    pub const SCORE_PER_FALLEN_UNIT: i64 = 500;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_SEED: u64 = 0x5eed;

    pub fn new() -> Self {
        Self {
            seed: Self::DEFAULT_SEED,
            autopilot: false,
        }
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn with_autopilot(mut self, autopilot: bool) -> Self {
        self.autopilot = autopilot;
        self
    }
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self::new()
    }
}
