use battle_content::{ContentFactory, bundled_data_dir};
use battle_core::{BattleConfig, Command, ContentOracle, World};

#[test]
fn bundled_campaign_loads() {
    let content = ContentFactory::new(bundled_data_dir())
        .load_static()
        .expect("bundled content is valid");

    assert_eq!(content.player_team().len(), 4);
    assert_eq!(content.level_count(), 5);
    assert!(
        content
            .class_spells("Priest")
            .iter()
            .any(|unlock| unlock.spell.name == "smite")
    );
    assert!(content.class_spells("Knight").is_empty());

    let wizard = content
        .player_team()
        .into_iter()
        .find(|unit| unit.name == "Wizard")
        .expect("wizard in roster");
    assert_eq!(wizard.spells[0].name, "fireball");
}

#[test]
fn first_bundled_level_fights_to_a_result() {
    let content = ContentFactory::new(bundled_data_dir())
        .load_static()
        .expect("bundled content is valid");
    let config = BattleConfig::default().with_seed(7).with_autopilot(true);
    let mut world = World::new(config, Box::new(content));
    world
        .apply(Command::StartBattle { level: 0 })
        .expect("level 0 starts");
    assert_eq!(world.entities().count(), 8);

    for _ in 0..50_000 {
        world.step();
        world.drain_events();
        if world.battle_won() || world.is_game_over() {
            break;
        }
    }
    assert!(world.battle_won() || world.is_game_over());
}
