use std::collections::VecDeque;

use crate::combat::Weapon;
use crate::config::BattleConfig;
use crate::state::{Color, Direction, Glyph, ResourceMeter, Team};
use crate::stats::{Armor, BaseStats, BuffSet, Stats};

/// Scripted single-tick behavior queued on a unit and run from the world
/// tick, one entry per tick.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MicroAction {
    /// Shuffle one tile if the destination is free.
    Step(Direction),
    /// Broadcast a line prefixed with the unit's name.
    Say(String),
    /// Do nothing for one tick.
    Wait,
}

/// Static unit definition from content tables.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitTemplate {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub class: Option<String>,
    pub glyph: Glyph,
    pub hp: i32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub mp: i32,
    pub speed: i32,
    pub move_range: i32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub armor: Armor,
    pub weapon: Weapon,
    #[cfg_attr(feature = "serde", serde(default))]
    pub spells: Vec<Weapon>,
}

/// A combatant. "Death" is a state: a dead mob keeps its tile as a corpse
/// until the battle resets.
#[derive(Clone, Debug, PartialEq)]
pub struct Mob {
    pub team: Team,
    pub class: Option<String>,
    pub base: BaseStats,
    pub armor: Armor,
    pub stats: Stats,
    pub hp: ResourceMeter,
    pub mp: ResourceMeter,
    pub weapon: Weapon,
    pub spells: Vec<Weapon>,
    pub buffs: BuffSet,
    pub ct: i32,
    pub moved: bool,
    pub acted: bool,
    micro_actions: VecDeque<MicroAction>,
}

impl Mob {
    pub fn from_template(template: &UnitTemplate, team: Team) -> Self {
        let mut mob = Self {
            team,
            class: template.class.clone(),
            base: BaseStats {
                speed: template.speed,
                move_range: template.move_range,
            },
            armor: template.armor.clone(),
            stats: Stats::default(),
            hp: ResourceMeter::full(template.hp),
            mp: ResourceMeter::full(template.mp),
            weapon: template.weapon.clone(),
            spells: template.spells.clone(),
            buffs: BuffSet::new(),
            ct: 0,
            moved: false,
            acted: false,
            micro_actions: VecDeque::new(),
        };
        mob.recompute();
        mob
    }

    pub fn is_dead(&self) -> bool {
        self.hp.is_depleted()
    }

    pub fn is_alive(&self) -> bool {
        !self.is_dead()
    }

    pub fn can_act(&self) -> bool {
        self.is_alive()
    }

    pub fn can_move(&self) -> bool {
        self.is_alive() && self.stats.move_range > 0
    }

    pub fn move_range(&self) -> u32 {
        self.stats.move_range.max(0) as u32
    }

    pub fn speed(&self) -> i32 {
        self.stats.speed
    }

    /// Refolds base stats, armor and buffs into [`Mob::stats`].
    pub fn recompute(&mut self) {
        self.stats = Stats::compute(&self.base, &self.armor, &self.buffs);
    }

    /// Restores the unit for a fresh battle. Buffs are dropped silently.
    pub fn reset_for_battle(&mut self) {
        self.hp.refill();
        self.mp.refill();
        self.ct = 0;
        self.moved = false;
        self.acted = false;
        self.buffs.clear();
        self.micro_actions.clear();
        self.recompute();
    }

    /// Applies the charge-time rubber band for the turn just finished.
    pub fn pay_turn_cost(&mut self) {
        match (self.moved, self.acted) {
            (true, true) => self.ct -= BattleConfig::CT_COST_FULL,
            (true, false) | (false, true) => self.ct -= BattleConfig::CT_COST_HALF,
            (false, false) => {
                self.ct -= BattleConfig::CT_COST_IDLE;
                self.ct = self.ct.min(BattleConfig::CT_IDLE_CAP);
            }
        }
    }

    pub fn z(&self) -> i32 {
        if self.is_dead() {
            BattleConfig::Z_CORPSE
        } else {
            BattleConfig::Z_UNIT
        }
    }

    /// Rendered glyph: corpses show `%`, badly hurt units a dark red
    /// background, otherwise the tint of the most recent tinted buff.
    pub fn display_glyph(&self, base: Glyph) -> Glyph {
        if self.is_dead() {
            return Glyph { ch: '%', ..base };
        }
        if self.hp.current <= self.hp.maximum / 4 {
            return base.with_bg(Color::DarkRed);
        }
        match self.buffs.iter().filter_map(|b| b.tint).last() {
            Some(tint) => base.with_bg(tint),
            None => base,
        }
    }

    pub fn enqueue(&mut self, action: MicroAction) {
        self.micro_actions.push_back(action);
    }

    pub(crate) fn next_micro_action(&mut self) -> Option<MicroAction> {
        self.micro_actions.pop_front()
    }

    pub fn pending_micro_actions(&self) -> usize {
        self.micro_actions.len()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::combat::{DamageSpec, DiceExpr};

    pub fn template(name: &str, speed: i32) -> UnitTemplate {
        UnitTemplate {
            name: name.to_string(),
            class: None,
            glyph: Glyph::new(name.chars().next().unwrap_or('?'), Color::White),
            hp: 20,
            mp: 10,
            speed,
            move_range: 4,
            armor: Armor::default(),
            weapon: Weapon::new("club", DamageSpec::physical(DiceExpr::constant(3)), 1),
            spells: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::template;
    use super::*;

    #[test]
    fn rubber_band_costs() {
        let mut mob = Mob::from_template(&template("a", 5), Team(1));

        mob.ct = 150;
        mob.moved = true;
        mob.acted = true;
        mob.pay_turn_cost();
        assert_eq!(mob.ct, 50);

        mob.ct = 150;
        mob.acted = false;
        mob.pay_turn_cost();
        assert_eq!(mob.ct, 70);

        mob.ct = 150;
        mob.moved = false;
        mob.acted = true;
        mob.pay_turn_cost();
        assert_eq!(mob.ct, 70);

        mob.ct = 150;
        mob.acted = false;
        mob.pay_turn_cost();
        assert_eq!(mob.ct, 60);

        mob.ct = 100;
        mob.pay_turn_cost();
        assert_eq!(mob.ct, 40);
    }

    #[test]
    fn corpses_render_as_percent() {
        let mut mob = Mob::from_template(&template("k", 5), Team(1));
        let base = Glyph::new('k', Color::Red);
        assert_eq!(mob.display_glyph(base), base);
        mob.hp.set(0);
        assert_eq!(mob.display_glyph(base).ch, '%');
        assert_eq!(mob.z(), BattleConfig::Z_CORPSE);
    }
}
