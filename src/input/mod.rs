//! # Input Module
//!
//! The line-oriented command dispatcher: parses one line into a command,
//! executes it against the game state and macro store, and prints the
//! resulting lines. Scripts re-enter through [`dispatch_primitive`], which
//! exposes only gameplay commands; store mutations stay at the prompt.

use crate::game::{Direction, GameState};
use crate::script::MacroStore;
use crate::{combat, config, generation, EramudError};
use log::info;

/// Everything a line of input can mean.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Move(Direction),
    Look,
    Get(String),
    Drop(String),
    Use(String),
    Wield(String),
    Wear(String),
    Attack(Option<String>),
    Inventory,
    Stats,
    Travel(i32),
    TopUp,
    MacroAdd(String, String),
    MacroRemove(String),
    MacroShow(String),
    MacroList,
    MacroClear,
    Run(String, Vec<String>),
    Bind(char, String),
    Unbind(char),
    Press(char),
    ProfileSave(String),
    ProfileLoad(String),
    ProfileList,
    Echo(bool),
    Wait(u64),
    Do(String),
    Help,
    Quit,
    Noop,
    Unknown(String),
}

/// Splits a line into its head word and the raw remainder.
fn head_and_rest(line: &str) -> (&str, &str) {
    let trimmed = line.trim();
    match trimmed.find(char::is_whitespace) {
        Some(split) => (&trimmed[..split], trimmed[split..].trim_start()),
        None => (trimmed, ""),
    }
}

/// Parses one input line. Never fails; unrecognized input becomes
/// [`Command::Unknown`].
pub fn parse_command(line: &str) -> Command {
    let (head, rest) = head_and_rest(line);
    if head.is_empty() {
        return Command::Noop;
    }
    if let Some(direction) = Direction::parse(head) {
        return Command::Move(direction);
    }
    match head.to_ascii_lowercase().as_str() {
        "look" | "l" => Command::Look,
        "get" | "take" if !rest.is_empty() => Command::Get(rest.to_string()),
        "drop" if !rest.is_empty() => Command::Drop(rest.to_string()),
        "use" | "eat" if !rest.is_empty() => Command::Use(rest.to_string()),
        "wield" if !rest.is_empty() => Command::Wield(rest.to_string()),
        "wear" if !rest.is_empty() => Command::Wear(rest.to_string()),
        "attack" | "kill" | "k" => {
            let weapon = (!rest.is_empty()).then(|| rest.to_string());
            Command::Attack(weapon)
        }
        "inventory" | "inv" | "i" => Command::Inventory,
        "stats" | "score" => Command::Stats,
        "travel" | "year" => match rest.parse() {
            Ok(year) => Command::Travel(year),
            Err(_) => Command::Unknown(line.trim().to_string()),
        },
        "topup" => Command::TopUp,
        "macro" => parse_macro_command(line.trim(), rest),
        "run" => {
            let (name, args) = head_and_rest(rest);
            if name.is_empty() {
                Command::Unknown(line.trim().to_string())
            } else {
                let args = args.split_whitespace().map(str::to_string).collect();
                Command::Run(name.to_string(), args)
            }
        }
        "bind" => {
            let (key, script) = head_and_rest(rest);
            match single_char(key) {
                Some(key) if !script.is_empty() => Command::Bind(key, script.to_string()),
                _ => Command::Unknown(line.trim().to_string()),
            }
        }
        "unbind" => match single_char(rest) {
            Some(key) => Command::Unbind(key),
            None => Command::Unknown(line.trim().to_string()),
        },
        "press" => match single_char(rest) {
            Some(key) => Command::Press(key),
            None => Command::Unknown(line.trim().to_string()),
        },
        "profile" => parse_profile_command(line.trim(), rest),
        "echo" => match rest.to_ascii_lowercase().as_str() {
            "on" => Command::Echo(true),
            "off" => Command::Echo(false),
            _ => Command::Unknown(line.trim().to_string()),
        },
        "wait" => Command::Wait(rest.parse().unwrap_or(0)),
        "do" if !rest.is_empty() => Command::Do(rest.to_string()),
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        _ => Command::Unknown(line.trim().to_string()),
    }
}

fn parse_macro_command(full: &str, rest: &str) -> Command {
    let (sub, tail) = head_and_rest(rest);
    match sub.to_ascii_lowercase().as_str() {
        "add" => {
            let (name, script) = head_and_rest(tail);
            if name.is_empty() || script.is_empty() {
                Command::Unknown(full.to_string())
            } else {
                Command::MacroAdd(name.to_string(), script.to_string())
            }
        }
        "rm" | "remove" if !tail.is_empty() => Command::MacroRemove(tail.to_string()),
        "show" if !tail.is_empty() => Command::MacroShow(tail.to_string()),
        "list" | "" => Command::MacroList,
        "clear" => Command::MacroClear,
        _ => Command::Unknown(full.to_string()),
    }
}

fn parse_profile_command(full: &str, rest: &str) -> Command {
    let (sub, name) = head_and_rest(rest);
    match sub.to_ascii_lowercase().as_str() {
        "save" if !name.is_empty() => Command::ProfileSave(name.to_string()),
        "load" if !name.is_empty() => Command::ProfileLoad(name.to_string()),
        "list" | "" => Command::ProfileList,
        _ => Command::Unknown(full.to_string()),
    }
}

fn single_char(token: &str) -> Option<char> {
    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Some(ch),
        _ => None,
    }
}

/// Dispatches one full input line from the prompt. Returns false when the
/// session should end.
pub fn dispatch_line(state: &mut GameState, macros: &mut MacroStore, line: &str) -> bool {
    match parse_command(line) {
        Command::MacroAdd(name, script) => {
            macros.add(&name, &script);
            println!("Macro '{}' saved.", name);
            true
        }
        Command::MacroRemove(name) => {
            if macros.remove(&name) {
                println!("Macro '{}' removed.", name);
            } else {
                println!("No macro named '{}'.", name);
            }
            true
        }
        Command::MacroShow(name) => {
            match macros.get(&name) {
                Some(script) => println!("{} = {}", name, script),
                None => println!("No macro named '{}'.", name),
            }
            true
        }
        Command::MacroList => {
            let names = macros.list();
            if names.is_empty() {
                println!("No macros defined.");
            } else {
                println!("Macros: {}", names.join(", "));
            }
            for (key, script) in macros.bindings() {
                println!("  [{}] -> {}", key, script);
            }
            true
        }
        Command::MacroClear => {
            macros.clear();
            println!("All macros cleared.");
            true
        }
        Command::Bind(key, script) => {
            macros.bind(key, &script);
            println!("Key '{}' bound.", key);
            true
        }
        Command::Unbind(key) => {
            if macros.unbind(key) {
                println!("Key '{}' unbound.", key);
            } else {
                println!("Nothing bound to '{}'.", key);
            }
            true
        }
        Command::ProfileSave(name) => {
            report(macros.save_profile(&name).map(|_| vec![format!("Profile '{}' saved.", name)]));
            true
        }
        Command::ProfileLoad(name) => {
            report(
                macros
                    .load_profile(&name)
                    .map(|_| vec![format!("Profile '{}' loaded.", name)]),
            );
            true
        }
        Command::ProfileList => {
            match macros.list_profiles() {
                Ok(names) if names.is_empty() => println!("No saved profiles."),
                Ok(names) => println!("Profiles: {}", names.join(", ")),
                Err(error) => println!("{}", error),
            }
            true
        }
        Command::Echo(enabled) => {
            macros.echo = enabled;
            println!("Echo {}.", if enabled { "on" } else { "off" });
            true
        }
        Command::Run(name, args) => {
            let mut keep_going = true;
            let result = macros.run_named(&name, &args, &mut |command| {
                let cont = dispatch_primitive(state, command);
                keep_going &= cont;
                cont
            });
            if let Err(error) = result {
                println!("{}", error);
            }
            keep_going
        }
        Command::Press(key) => {
            let mut keep_going = true;
            let result = macros.run_key(key, &mut |command| {
                let cont = dispatch_primitive(state, command);
                keep_going &= cont;
                cont
            });
            if let Err(error) = result {
                println!("{}", error);
            }
            keep_going
        }
        Command::Do(script) => {
            let mut keep_going = true;
            let result = macros.run(&script, &[], &mut |command| {
                let cont = dispatch_primitive(state, command);
                keep_going &= cont;
                cont
            });
            if let Err(error) = result {
                println!("{}", error);
            }
            keep_going
        }
        other => execute(state, other),
    }
}

/// Dispatch callback for expanded script commands. Gameplay commands only;
/// the store cannot be mutated from inside a running script.
pub fn dispatch_primitive(state: &mut GameState, command: &str) -> bool {
    match parse_command(command) {
        Command::MacroAdd(..)
        | Command::MacroRemove(_)
        | Command::MacroShow(_)
        | Command::MacroList
        | Command::MacroClear
        | Command::Bind(..)
        | Command::Unbind(_)
        | Command::Press(_)
        | Command::Run(..)
        | Command::Do(_)
        | Command::ProfileSave(_)
        | Command::ProfileLoad(_)
        | Command::ProfileList
        | Command::Echo(_) => {
            println!("Macro and profile commands aren't available inside scripts.");
            true
        }
        other => execute(state, other),
    }
}

/// Executes a gameplay command, printing its lines. Returns false only for
/// quit.
fn execute(state: &mut GameState, command: Command) -> bool {
    let result = match command {
        Command::Move(direction) => state.try_step(direction),
        Command::Look => state.look(),
        Command::Get(name) => state.pick_up(&name),
        Command::Drop(name) => state.drop_item(&name),
        Command::Use(name) => state.consume(&name),
        Command::Wield(name) => state.wield(&name),
        Command::Wear(name) => state.wear(&name),
        Command::Attack(weapon) => attack(state, weapon.as_deref()),
        Command::Inventory => Ok(inventory_lines(state)),
        Command::Stats => Ok(stats_lines(state)),
        Command::Travel(year) => state.enter_year(year).map(|yells| {
            let mut lines = vec![format!("Reality folds around you. It is now {}.", year)];
            lines.extend(yells);
            lines
        }),
        Command::TopUp => Ok(manual_top_up(state)),
        Command::Wait(ms) => {
            let capped = ms.min(config::MACRO_WAIT_CAP_MS);
            std::thread::sleep(std::time::Duration::from_millis(capped));
            Ok(Vec::new())
        }
        Command::Help => Ok(help_lines()),
        Command::Quit => {
            println!("The dust settles behind you.");
            return false;
        }
        Command::Noop => Ok(Vec::new()),
        Command::Unknown(line) => Ok(vec![format!(
            "Unknown command '{}'. Try 'help'.",
            line
        )]),
        // Store-level commands are filtered out by the callers.
        _ => Ok(Vec::new()),
    };
    report(result);
    true
}

fn attack(
    state: &mut GameState,
    weapon: Option<&str>,
) -> crate::EramudResult<Vec<String>> {
    match combat::player_attack(state, weapon) {
        Ok(outcome) => Ok(outcome.messages),
        // User-input mistakes print like any other message.
        Err(EramudError::InvalidAction(message)) => Ok(vec![message]),
        Err(error) => Err(error),
    }
}

fn manual_top_up(state: &mut GameState) -> Vec<String> {
    let year = state.player.year;
    let seed = state.world.global_seed;
    let (years, ids) = state.world.topup_parts();
    match years.get_mut(&year) {
        Some(era) => {
            let items = generation::top_up_items(seed, year, era, "debug");
            let monsters = generation::top_up_monsters(seed, year, era, ids, "debug", None);
            info!("manual top-up: +{} items, +{} monsters", items, monsters);
            vec![format!(
                "Top-up placed {} items and {} monsters.",
                items, monsters
            )]
        }
        None => vec!["This era hasn't formed yet.".to_string()],
    }
}

fn inventory_lines(state: &GameState) -> Vec<String> {
    let mut lines = Vec::new();
    match &state.player.wielded {
        Some(item) => lines.push(format!("Wielding: {}", item.display_name())),
        None => lines.push("Wielding: bare hands".to_string()),
    }
    if let Some(item) = &state.player.worn {
        lines.push(format!("Wearing: {}", item.display_name()));
    }
    if state.player.inventory.is_empty() {
        lines.push("Your pack is empty.".to_string());
    } else {
        lines.push("Carrying:".to_string());
        for item in &state.player.inventory {
            lines.push(format!("  {}", item.display_name()));
        }
    }
    lines
}

fn stats_lines(state: &GameState) -> Vec<String> {
    let player = &state.player;
    vec![
        format!("{}, {} (level {})", player.name, player.class.name(), player.level),
        format!(
            "HP {}/{}  STR {}  AC {}  Sustenance {}",
            player.hp,
            player.max_hp,
            player.strength,
            player.armor_class(),
            player.sustenance
        ),
        format!("XP {}  Ions {}  Riblets {}", player.xp, player.ions, player.riblets),
        format!(
            "Year {}  Position {}  Turn {}",
            player.year,
            player.position(),
            state.world.turn
        ),
        format!(
            "Slain {}  Steps {}  Deaths {}",
            state.statistics.monsters_slain,
            state.statistics.steps_taken,
            state.statistics.deaths
        ),
    ]
}

fn help_lines() -> Vec<String> {
    vec![
        "Movement: n s e w (or north/south/east/west)".to_string(),
        "World: look, get <item>, drop <item>, attack [weapon], travel <year>".to_string(),
        "Gear: wield <weapon>, wear <armor>, use <item>, inventory, stats".to_string(),
        "Macros: macro add <name> <script>, macro list, run <name> [args], do <script>".to_string(),
        "Keys: bind <key> <script>, unbind <key>, press <key>".to_string(),
        "Profiles: profile save|load|list [name], echo on|off".to_string(),
        "Other: topup, wait <ms>, quit".to_string(),
    ]
}

fn report(result: crate::EramudResult<Vec<String>>) {
    match result {
        Ok(lines) => {
            for line in lines {
                println!("{}", line);
            }
        }
        Err(error) => println!("{}", error),
    }
}
