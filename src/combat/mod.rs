//! # Combat Resolution
//!
//! The damage formula and the ordered death pipeline.
//!
//! Damage combines weapon power, a strength bonus, and armor-class
//! mitigation, floored at one point so no defender is unhittable. A fatal
//! blow removes the monster from its tile and runs the death pipeline
//! exactly once: rewards, messages, then the ordered, capacity-bounded loot
//! drop. Loot is transferred by draining the corpse's references, so a
//! second grant is structurally impossible.

use crate::game::{GameState, Player, Position};
use crate::world::{resolve_item_kind, DamageOutcome, ItemInstance, MonsterInstance, World};
use crate::{config, EramudError, EramudResult};
use log::debug;

/// Weapon power used when nothing is wielded.
const BARE_HANDS_POWER: i32 = 1;

/// What a player attack produced.
#[derive(Debug, Clone, PartialEq)]
pub struct AttackOutcome {
    pub damage: i32,
    pub killed: bool,
    pub monster_name: String,
    /// Renderable lines, in emission order.
    pub messages: Vec<String>,
}

/// The damage one hit inflicts.
///
/// # Examples
///
/// ```
/// use eramud::resolve_damage;
///
/// // Weapon 7, strength 20 (+2), AC 0: 9 damage.
/// assert_eq!(resolve_damage(7, 20, 0), 9);
/// // Mitigation can never push a hit below 1.
/// assert_eq!(resolve_damage(1, 0, 1_000), 1);
/// ```
pub fn resolve_damage(weapon_power: i32, strength: i32, armor_class: i32) -> i32 {
    (weapon_power + strength / 10 - armor_class / config::AC_DIVISOR).max(1)
}

/// Resolves one player attack against the primary monster on the player's
/// tile.
///
/// `weapon_key` names a carried weapon; with None the wielded weapon (or
/// bare hands) is used. Unknown or uncarried weapons and empty tiles are
/// user-input errors, reported without mutating anything.
pub fn player_attack(
    state: &mut GameState,
    weapon_key: Option<&str>,
) -> EramudResult<AttackOutcome> {
    let year = state.player.year;
    let pos = state.player.position();

    let weapon_power = match weapon_key {
        Some(raw) => {
            let kind = resolve_item_kind(raw).ok_or_else(|| {
                EramudError::InvalidAction(format!("You don't know what a '{}' is.", raw))
            })?;
            if state.player.carried_kind(kind.key).is_none() {
                return Err(EramudError::InvalidAction(format!(
                    "You aren't carrying a {}.",
                    kind.name
                )));
            }
            kind.power
        }
        None => state
            .player
            .wielded
            .as_ref()
            .and_then(|weapon| weapon.kind().ok())
            .map(|kind| kind.power)
            .unwrap_or(BARE_HANDS_POWER),
    };

    let (target_id, target_name, target_ac) = state
        .world
        .primary_monster(year, pos)
        .map(|monster| (monster.id, monster.name.clone(), monster.armor_class()))
        .ok_or_else(|| {
            EramudError::InvalidAction("There is nothing here to attack.".to_string())
        })?;

    let damage = resolve_damage(weapon_power, state.player.strength, target_ac);
    state.statistics.damage_dealt += damage as u64;
    debug!(
        "attack: {} power, {} str, {} ac -> {} damage vs {}",
        weapon_power, state.player.strength, target_ac, damage, target_name
    );

    match state.world.damage_monster(year, pos, target_id, damage)? {
        DamageOutcome::Slain(corpse) => {
            state.statistics.monsters_slain += 1;
            let messages =
                run_death_pipeline(&mut state.world, &mut state.player, year, pos, corpse)?;
            Ok(AttackOutcome {
                damage,
                killed: true,
                monster_name: target_name,
                messages,
            })
        }
        DamageOutcome::Wounded { remaining_hp: _ } => Ok(AttackOutcome {
            damage,
            killed: false,
            monster_name: target_name.clone(),
            messages: vec![format!("You hit the {} for {} damage.", target_name, damage)],
        }),
    }
}

/// Runs the death pipeline for a monster already removed from its tile.
///
/// The literal order is load-bearing: rewards and level-up first, slain
/// messages, then the ordered drop list (inventory, skull, worn armor)
/// truncated to the drop cap and the tile's remaining ground capacity, one
/// drop line per surviving item, and finally the crumble line. A full tile
/// still gets the slain and crumble lines, just no drops.
pub fn run_death_pipeline(
    world: &mut World,
    player: &mut Player,
    year: i32,
    pos: Position,
    mut corpse: MonsterInstance,
) -> EramudResult<Vec<String>> {
    let mut messages = Vec::new();

    let (xp, ions, riblets) = corpse
        .kind()
        .map(|kind| (kind.xp_award, kind.ion_award, kind.riblet_award))
        .unwrap_or((0, 0, 0));
    player.ions += u64::from(ions);
    player.riblets += u64::from(riblets);
    let leveled = player.grant_xp(xp);

    messages.push(format!("You have slain the {}!", corpse.name));
    messages.push(format!(
        "You gain {} experience, {} ions, and {} riblets.",
        xp, ions, riblets
    ));
    if let Some(level) = leveled {
        messages.push(format!("You feel tougher. Welcome to level {}!", level));
    }

    // Draining the corpse transfers ownership of its loot; nothing is left
    // behind to grant twice.
    let mut drops: Vec<ItemInstance> = corpse.inventory.drain(..).collect();
    drops.push(ItemInstance::skull(&corpse.name));
    if let Some(armor) = corpse.worn_armor.take() {
        drops.push(armor);
    }

    let capacity = world.ground_free_slots(year, pos);
    drops.truncate(config::MAX_DROPS_PER_DEATH.min(capacity));

    for item in drops {
        let line = format!("A {} falls from the body.", item.display_name());
        world.add_ground_item(year, pos, item)?;
        messages.push(line);
    }
    messages.push(format!("The {} crumbles to dust.", corpse.name));

    Ok(messages)
}
