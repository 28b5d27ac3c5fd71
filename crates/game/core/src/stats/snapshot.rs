use super::buff::{BuffSet, StatModifier};
use crate::state::EntityId;

/// Unit stats before any buff is applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BaseStats {
    pub speed: i32,
    pub move_range: i32,
}

/// Worn armor: flat physical defense and per-turn mana recovery.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Armor {
    pub name: String,
    pub defense: i32,
    pub mp_recovery: i32,
}

/// Effective stats after folding every active buff over base stats and
/// armor. Recomputed whenever buffs change, a turn starts, or damage lands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Stats {
    pub speed: i32,
    pub move_range: i32,
    pub defense: i32,
    pub mp_recovery: i32,
    pub crippled: bool,
    pub taunted_by: Option<EntityId>,
}

impl Stats {
    pub fn compute(base: &BaseStats, armor: &Armor, buffs: &BuffSet) -> Self {
        let mut stats = Self {
            speed: base.speed,
            move_range: base.move_range,
            defense: armor.defense,
            mp_recovery: armor.mp_recovery,
            crippled: false,
            taunted_by: None,
        };
        for buff in buffs.iter() {
            for modifier in &buff.modifiers {
                match *modifier {
                    StatModifier::Speed(delta) => stats.speed += delta,
                    StatModifier::MoveRange(delta) => stats.move_range += delta,
                    StatModifier::Defense(delta) => stats.defense += delta,
                    StatModifier::MpRecovery(delta) => stats.mp_recovery += delta,
                    StatModifier::Cripple => stats.crippled = true,
                    StatModifier::Taunt => stats.taunted_by = buff.source.or(stats.taunted_by),
                }
            }
        }
        if stats.crippled {
            stats.move_range = 0;
        }
        stats.speed = stats.speed.max(0);
        stats.move_range = stats.move_range.max(0);
        stats.defense = stats.defense.max(0);
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::BattleRng;
    use crate::stats::{BuffTemplate, Uniqueness};

    #[test]
    fn buffs_fold_over_base_and_armor() {
        let mut rng = BattleRng::new(0);
        let base = BaseStats {
            speed: 6,
            move_range: 4,
        };
        let armor = Armor {
            name: "chain".into(),
            defense: 3,
            mp_recovery: 1,
        };
        let mut buffs = BuffSet::new();
        buffs.apply(
            BuffTemplate::new("haste", Uniqueness::Stackable)
                .modifier(StatModifier::Speed(2))
                .instantiate(None, &mut rng),
        );
        buffs.apply(
            BuffTemplate::new("aim: legs", Uniqueness::FirstWins)
                .modifier(StatModifier::Cripple)
                .instantiate(None, &mut rng),
        );
        buffs.apply(
            BuffTemplate::new("taunt", Uniqueness::Replace)
                .modifier(StatModifier::Taunt)
                .instantiate(Some(EntityId(8)), &mut rng),
        );

        let stats = Stats::compute(&base, &armor, &buffs);
        assert_eq!(stats.speed, 8);
        assert_eq!(stats.move_range, 0);
        assert!(stats.crippled);
        assert_eq!(stats.defense, 3);
        assert_eq!(stats.taunted_by, Some(EntityId(8)));
    }
}
