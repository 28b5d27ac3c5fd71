use super::damage::DamageSpec;
use crate::state::{Color, Glyph, Position};
use crate::stats::{BuffTemplate, StatModifier, Uniqueness};

/// Which tiles a weapon may be aimed at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Targeting {
    /// Same row or column as the wielder.
    #[default]
    Cross,
    /// Any tile within range.
    Free,
}

/// Area-of-effect shape around the impact point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Hitbox {
    #[default]
    Single,
    /// Impact tile plus `size` tiles along each cardinal arm.
    Cross,
    /// Every tile within Manhattan distance `size`.
    Blob,
}

impl Hitbox {
    /// Tiles covered when centred on `center`, in row-major order. May
    /// include positions outside the map; callers filter.
    pub fn area(self, center: Position, size: u32) -> Vec<Position> {
        let size = size as i32;
        let mut tiles = match self {
            Hitbox::Single => vec![center],
            Hitbox::Cross => {
                let mut tiles = vec![center];
                for step in 1..=size {
                    tiles.push(Position::new(center.x, center.y - step));
                    tiles.push(Position::new(center.x + step, center.y));
                    tiles.push(Position::new(center.x, center.y + step));
                    tiles.push(Position::new(center.x - step, center.y));
                }
                tiles
            }
            Hitbox::Blob => {
                let mut tiles = Vec::new();
                for dy in -size..=size {
                    let span = size - dy.abs();
                    for dx in -span..=span {
                        tiles.push(Position::new(center.x + dx, center.y + dy));
                    }
                }
                tiles
            }
        };
        tiles.sort_by_key(|p| (p.y, p.x));
        tiles
    }
}

/// Side effect fired against every unit a weapon hits.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OnHit {
    ApplyBuff(BuffTemplate),
    /// Forces an enemy target to attack only the wielder. Allies shrug it off.
    Taunt,
    /// Pushes the target away from the wielder, stopping at obstacles.
    Knockback { distance: u32 },
}

/// Weapon or spell. Both share the same shape; spells differ only in
/// that they usually cost mana and are listed separately on a unit.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Weapon {
    pub name: String,
    pub damage: DamageSpec,
    pub range: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub targeting: Targeting,
    /// Ignores armor and line-of-fire obstruction.
    #[cfg_attr(feature = "serde", serde(default))]
    pub magic: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub hitbox: Hitbox,
    #[cfg_attr(feature = "serde", serde(default))]
    pub hitbox_size: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub mp_cost: i32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub projectile: Option<Glyph>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub hit_glyph: Option<Glyph>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub on_hit: Vec<OnHit>,
}

impl Weapon {
    pub fn new(name: impl Into<String>, damage: DamageSpec, range: u32) -> Self {
        Self {
            name: name.into(),
            damage,
            range,
            targeting: Targeting::Cross,
            magic: false,
            hitbox: Hitbox::Single,
            hitbox_size: 0,
            mp_cost: 0,
            projectile: None,
            hit_glyph: None,
            on_hit: Vec::new(),
        }
    }

    #[must_use]
    pub fn free_aim(mut self) -> Self {
        self.targeting = Targeting::Free;
        self
    }

    #[must_use]
    pub fn magic(mut self, mp_cost: i32, hitbox: Hitbox, hitbox_size: u32) -> Self {
        self.magic = true;
        self.targeting = Targeting::Free;
        self.mp_cost = mp_cost;
        self.hitbox = hitbox;
        self.hitbox_size = hitbox_size;
        self
    }

    #[must_use]
    pub fn on_hit(mut self, effect: OnHit) -> Self {
        self.on_hit.push(effect);
        self
    }

    /// Whether `to` is a legal aim point from `from`, ignoring line of fire.
    /// Only magic may be aimed at the wielder's own tile.
    pub fn reaches(&self, from: Position, to: Position) -> bool {
        let distance = from.distance(to);
        if distance > self.range || (distance == 0 && !self.magic) {
            return false;
        }
        match self.targeting {
            Targeting::Free => true,
            Targeting::Cross => from.is_aligned_with(to),
        }
    }

    pub fn is_area(&self) -> bool {
        self.hitbox != Hitbox::Single
    }
}

/// Buff installed by [`OnHit::Taunt`].
pub fn taunt_buff() -> BuffTemplate {
    let mut template = BuffTemplate::new("taunt", Uniqueness::Replace).modifier(StatModifier::Taunt);
    template.expires_with_source = true;
    template.tint = Some(Color::Magenta);
    template.on_apply = Some("{source} taunted {target}.".into());
    template
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::DiceExpr;

    #[test]
    fn cross_area_has_arms_of_size() {
        let area = Hitbox::Cross.area(Position::new(5, 5), 1);
        assert_eq!(area.len(), 5);
        assert!(area.contains(&Position::new(5, 4)));
        assert!(area.contains(&Position::new(4, 5)));
        assert!(!area.contains(&Position::new(4, 4)));
    }

    #[test]
    fn blob_area_is_a_diamond() {
        let area = Hitbox::Blob.area(Position::new(0, 0), 2);
        assert_eq!(area.len(), 13);
        assert!(area.iter().all(|p| p.distance(Position::ORIGIN) <= 2));
        assert_eq!(Hitbox::Single.area(Position::new(3, 1), 4), vec![Position::new(3, 1)]);
    }

    #[test]
    fn cross_targeting_requires_alignment() {
        let bow = Weapon::new("bow", DamageSpec::physical(DiceExpr::new(2, 2, 1)), 6);
        let origin = Position::new(2, 2);
        assert!(bow.reaches(origin, Position::new(2, 7)));
        assert!(!bow.reaches(origin, Position::new(3, 4)));
        assert!(!bow.reaches(origin, origin));
        assert!(bow.clone().free_aim().reaches(origin, Position::new(3, 4)));

        let heal = Weapon::new("heal", DamageSpec::healing(DiceExpr::new(3, 5, 5)), 3).magic(
            5,
            Hitbox::Cross,
            1,
        );
        assert!(heal.reaches(origin, origin));
        assert!(!heal.reaches(origin, Position::new(6, 2)));
    }
}
