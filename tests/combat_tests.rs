//! Integration tests for combat resolution and the death/loot pipeline.

use eramud::{
    combat, config, CharacterClass, GameState, ItemInstance, Position, META_MONSTER,
};

fn fresh_state(seed: u64) -> GameState {
    let mut state = GameState::new(seed, "Ash".to_string(), CharacterClass::Drifter);
    state.enter_year(2000).expect("era init failed");
    state
}

fn clear_tile(state: &mut GameState, pos: Position) {
    while state.world.remove_ground_item(2000, pos, 0).is_some() {}
}

/// The end-to-end scenario: seed 42, era 2000, a mutant at the origin with
/// 3 hp, attacked with a power-7 weapon at strength 20 against AC 0. One
/// hit for 9 damage kills it and leaves exactly a skull on the tile.
#[test]
fn test_one_hit_kill_scenario() {
    let mut state = fresh_state(42);
    let origin = Position::origin();
    clear_tile(&mut state, origin);

    let id = state
        .world
        .place_monster(2000, origin, "mutant", None)
        .expect("placement failed");
    state
        .world
        .monster_mut(2000, origin, id)
        .expect("monster missing")
        .hp = 3;
    state.player.strength = 20;
    state.player.inventory.push(ItemInstance::new("pulse-rifle"));

    let outcome =
        combat::player_attack(&mut state, Some("pulse-rifle")).expect("attack failed");
    assert_eq!(outcome.damage, 9);
    assert!(outcome.killed);
    assert_eq!(outcome.monster_name, "mutant");

    let ground = state.world.ground_items(2000, origin);
    assert_eq!(ground.len(), 1, "expected exactly the skull");
    assert_eq!(ground[0].key, "skull");
    assert_eq!(
        ground[0].meta.get(META_MONSTER).map(String::as_str),
        Some("mutant")
    );
    assert!(state.world.monsters_at(2000, origin).is_empty());
}

/// Damage never drops below one, no matter the armor.
#[test]
fn test_damage_floor_against_heavy_armor() {
    let mut state = fresh_state(7);
    let origin = Position::origin();
    let id = state
        .world
        .place_monster(2000, origin, "scrap-golem", None)
        .expect("placement failed");
    {
        let monster = state
            .world
            .monster_mut(2000, origin, id)
            .expect("monster missing");
        monster.worn_armor = Some(ItemInstance::new("plasteel-plate"));
    }
    state.player.strength = 0;

    let outcome = combat::player_attack(&mut state, None).expect("attack failed");
    assert_eq!(outcome.damage, 1);
    assert!(!outcome.killed);
}

/// With K free slots and more than K potential drops, exactly the first K
/// entries of [inventory..., skull, worn armor] land on the tile.
#[test]
fn test_drop_truncation_keeps_prefix_order() {
    let mut state = fresh_state(7);
    let origin = Position::origin();
    clear_tile(&mut state, origin);
    // Fill the tile down to 2 free slots.
    for _ in 0..config::MAX_ITEMS_PER_TILE - 2 {
        state
            .world
            .add_ground_item(2000, origin, ItemInstance::new("battery-cell"))
            .expect("pre-fill failed");
    }

    let id = state
        .world
        .place_monster(2000, origin, "mutant", None)
        .expect("placement failed");
    {
        let monster = state
            .world
            .monster_mut(2000, origin, id)
            .expect("monster missing");
        monster.hp = 1;
        monster.inventory.push(ItemInstance::new("med-gel"));
        monster.inventory.push(ItemInstance::new("ion-decay"));
        monster.inventory.push(ItemInstance::new("rad-tablet"));
        monster.worn_armor = Some(ItemInstance::new("leather-vest"));
    }

    let outcome = combat::player_attack(&mut state, None).expect("attack failed");
    assert!(outcome.killed);

    let dropped: Vec<&str> = state.world.ground_items(2000, origin)
        [config::MAX_ITEMS_PER_TILE - 2..]
        .iter()
        .map(|item| item.key.as_str())
        .collect();
    assert_eq!(dropped, vec!["med-gel", "ion-decay"]);
    assert_eq!(
        state.world.ground_items(2000, origin).len(),
        config::MAX_ITEMS_PER_TILE
    );
}

/// Kills credit currency and experience exactly once.
#[test]
fn test_kill_rewards_credited_once() {
    let mut state = fresh_state(7);
    let origin = Position::origin();
    clear_tile(&mut state, origin);
    let id = state
        .world
        .place_monster(2000, origin, "mutant", None)
        .expect("placement failed");
    state
        .world
        .monster_mut(2000, origin, id)
        .expect("monster missing")
        .hp = 1;

    let ions_before = state.player.ions;
    let riblets_before = state.player.riblets;
    let xp_before = state.player.xp;

    let outcome = combat::player_attack(&mut state, None).expect("attack failed");
    assert!(outcome.killed);
    assert_eq!(state.player.ions, ions_before + 3);
    assert_eq!(state.player.riblets, riblets_before + 7);
    assert_eq!(state.player.xp, xp_before + 9);

    // The corpse is gone; there is no second pipeline to run.
    assert!(state.world.monsters_at(2000, origin).is_empty());
    let follow_up = combat::player_attack(&mut state, None);
    assert!(follow_up.is_err());
    assert_eq!(state.player.ions, ions_before + 3);
}

/// Attacks target the primary (first-listed) monster on the tile.
#[test]
fn test_attack_targets_primary_monster() {
    let mut state = fresh_state(7);
    let origin = Position::origin();
    let first = state
        .world
        .place_monster(2000, origin, "rad-hound", None)
        .expect("placement failed");
    state
        .world
        .place_monster(2000, origin, "mutant", None)
        .expect("placement failed");

    let outcome = combat::player_attack(&mut state, None).expect("attack failed");
    assert_eq!(outcome.monster_name, "rad-hound");
    let _ = first;
}
