use battle_core::{
    Armor, BattleConfig, BuffTemplate, Command, DamageSpec, DiceExpr, EntityId, Glyph, Color,
    LevelSpec, Map, Position, SessionId, StateAction, StaticContent, Team, UnitTemplate,
    Uniqueness, Weapon, World, WorldEvent,
};

fn unit(name: &str, speed: i32, weapon: Weapon) -> UnitTemplate {
    UnitTemplate {
        name: name.to_string(),
        class: None,
        glyph: Glyph::new('u', Color::White),
        hp: 20,
        mp: 10,
        speed,
        move_range: 4,
        armor: Armor::default(),
        weapon,
        spells: Vec::new(),
    }
}

fn club() -> Weapon {
    Weapon::new("club", DamageSpec::physical(DiceExpr::constant(3)), 1)
}

fn open_map(name: &str, width: u32, height: u32) -> Map {
    Map::new(name, width, height)
}

/// World with an empty campaign sitting on an open 8x8 map, ready for
/// units to be added by hand.
fn sandbox(config: BattleConfig) -> World {
    let mut map = open_map("sandbox", 8, 8);
    map.add_spawn_point(Team::PLAYERS, Position::new(0, 0));
    let content = StaticContent {
        maps: vec![map],
        levels: vec![LevelSpec {
            map: "sandbox".into(),
            enemies: Vec::new(),
        }],
        ..StaticContent::default()
    };
    let mut world = World::new(config, Box::new(content));
    world
        .apply(Command::StartBattle { level: 0 })
        .expect("sandbox level exists");
    world
}

fn add(world: &mut World, template: UnitTemplate, team: Team, at: Position) -> EntityId {
    world
        .apply(Command::AddUnit {
            template: template.clone(),
            team,
            position: at,
        })
        .expect("tile is free");
    world
        .entities()
        .filter(|e| e.name == template.name)
        .map(|e| e.id)
        .max()
        .expect("unit was spawned")
}

fn turn_order(rounds: usize) -> Vec<EntityId> {
    let mut world = sandbox(BattleConfig::default());
    add(&mut world, unit("fast", 5, club()), Team::PLAYERS, Position::new(1, 1));
    add(&mut world, unit("slow", 3, club()), Team::PLAYERS, Position::new(6, 6));
    let mut order = Vec::new();
    for _ in 0..rounds {
        world.next_turn();
        let up = world.up().expect("someone can act");
        order.push(up);
        world.finish_turn(up);
    }
    order
}

#[test]
fn initiative_is_deterministic() {
    assert_eq!(turn_order(20), turn_order(20));
}

#[test]
fn faster_units_take_more_turns() {
    let order = turn_order(20);
    let fast = order.iter().filter(|id| **id == order[0]).count();
    assert!(fast > order.len() - fast, "fast unit took {fast} of {} turns", order.len());
}

#[test]
fn armor_floors_a_weak_hit_at_one() {
    let mut world = sandbox(BattleConfig::default());
    let mut knight = unit("knight", 1, club());
    knight.armor = Armor {
        name: "plate".into(),
        defense: 5,
        mp_recovery: 0,
    };
    let attacker = add(&mut world, unit("brute", 9, club()), Team::PLAYERS, Position::new(3, 3));
    let target = add(&mut world, knight, Team(1), Position::new(3, 4));
    world.next_turn();
    assert_eq!(world.up(), Some(attacker));

    world
        .apply(Command::Attack {
            session: SessionId(1),
            unit: attacker,
            target: Position::new(3, 4),
        })
        .expect("adjacent target");
    for _ in 0..10 {
        world.step();
    }
    assert_eq!(world.mob(target).map(|m| m.hp.current), Some(19));
}

#[test]
fn stacking_rules_for_repeated_buffs() {
    let mut world = sandbox(BattleConfig::default());
    let id = add(&mut world, unit("mule", 1, club()), Team(1), Position::new(2, 2));

    let poison = BuffTemplate::new("poison", Uniqueness::Stackable).lasting(4, 6);
    world.apply_buff(id, &poison, None);
    world.apply_buff(id, &poison, None);
    assert_eq!(world.mob(id).map(|m| m.buffs.count("poison")), Some(2));

    let taunt = BuffTemplate::new("taunt", Uniqueness::Replace);
    world.drain_events();
    world.apply_buff(id, &taunt, None);
    world.apply_buff(id, &taunt, None);
    assert_eq!(world.mob(id).map(|m| m.buffs.count("taunt")), Some(1));
    let removed = world
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, WorldEvent::BuffRemoved { .. }))
        .count();
    assert_eq!(removed, 1);
}

#[test]
fn ai_in_reach_attacks_without_moving() {
    let mut world = sandbox(BattleConfig::default());
    add(&mut world, unit("hero", 1, club()), Team::PLAYERS, Position::new(4, 4));
    let bow = Weapon::new("bow", DamageSpec::physical(DiceExpr::constant(2)), 5);
    let archer = add(&mut world, unit("archer", 9, bow), Team(1), Position::new(4, 0));
    world.next_turn();
    assert_eq!(world.up(), Some(archer));

    let mut first_action = None;
    for _ in 0..20 {
        world.step();
        if first_action.is_none() {
            first_action = world
                .stack()
                .iter()
                .find(|state| matches!(state, StateAction::Move(_) | StateAction::Attack(_)))
                .map(StateAction::label);
        }
    }
    assert_eq!(first_action, Some("attack"));
    assert_eq!(world.position_of(archer), Some(Position::new(4, 0)));
}

#[test]
fn autopilot_battles_run_to_a_conclusion_reproducibly() {
    let run = || {
        let map = Map::from_rows(
            "field",
            &["0......1", "0......1", "........", "...##...", "........"],
        )
        .expect("valid map");
        let sword = Weapon::new("sword", "1d6+1".parse::<DiceExpr>().map(DamageSpec::physical).expect("dice"), 1);
        let content = StaticContent {
            maps: vec![map],
            player_team: vec![unit("knight", 4, sword.clone()), unit("squire", 3, sword.clone())],
            levels: vec![LevelSpec {
                map: "field".into(),
                enemies: vec![unit("kobold", 3, sword.clone()), unit("kobold", 3, sword)],
            }],
            ..StaticContent::default()
        };
        let config = BattleConfig::default().with_seed(42).with_autopilot(true);
        let mut world = World::new(config, Box::new(content));
        world.apply(Command::StartBattle { level: 0 }).expect("level 0");
        let mut log = Vec::new();
        for _ in 0..20_000 {
            world.step();
            log.extend(world.drain_events());
            if world.battle_won() || world.is_game_over() {
                break;
            }
        }
        (world.battle_won() || world.is_game_over(), log)
    };
    let (finished, first) = run();
    let (_, second) = run();
    assert!(finished);
    assert_eq!(first, second);
}
