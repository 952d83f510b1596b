//! Round resolution: defends first, then attacks, then the verdict.
//!
//! Pure with respect to its inputs. Given the same room, actions, and
//! dice, it produces the same log, the same HP, and the same outcome.

use std::collections::HashMap;

use skirmish_protocol::{PlayerView, RoomPhase};

use crate::{Dice, Room, RoomConfig, RoundActions};

/// One attack that landed on a living target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub attacker: String,
    pub target: String,
    /// Damage drawn from the attack roll.
    pub rolled: u32,
    /// How much of it the target's defense absorbed.
    pub blocked: u32,
    /// What reached the target's HP.
    pub dealt: u32,
    pub remaining_hp: u32,
    pub killed: bool,
}

/// What a resolved round means for the room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundOutcome {
    /// Two or more players still standing; the next round starts.
    Continue,
    /// Exactly one player left.
    Winner(PlayerView),
    /// Nobody left.
    Draw,
}

impl RoundOutcome {
    /// `true` for [`Winner`](Self::Winner) and [`Draw`](Self::Draw).
    pub fn is_final(&self) -> bool {
        !matches!(self, Self::Continue)
    }
}

/// Everything a resolved round produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundReport {
    /// Human-readable lines, in the order things happened.
    pub log: Vec<String>,
    pub hits: Vec<Hit>,
    pub outcome: RoundOutcome,
}

/// Plays out one round against `room` and moves it to its next phase.
///
/// 1. Each defend, in submission order, rolls a defense budget for its
///    actor.
/// 2. Each attack, in submission order, rolls damage. Attacks whose
///    actor or target is missing or already dead are skipped. Defense
///    absorbs damage and is used up by it, so one good roll can stop
///    several attacks.
/// 3. The survivors decide the outcome: more than one continues the
///    game, one wins, none is a draw.
pub fn resolve_round(
    room: &mut Room,
    actions: RoundActions,
    config: &RoomConfig,
    dice: &mut dyn Dice,
) -> RoundReport {
    let mut log = Vec::with_capacity(actions.len() * 2);
    let mut hits = Vec::with_capacity(actions.attacks.len());
    let mut defense: HashMap<String, u32> = HashMap::new();

    for action in actions.defends {
        let value = dice.roll(config.defense_roll.clone());
        log.push(format!("{} defends with {value} defense", action.actor));
        defense.insert(action.actor, value);
    }

    for action in actions.attacks {
        let attacker_alive = room.player(&action.actor).is_some_and(|p| p.is_alive());
        let target_alive = room.player(&action.target).is_some_and(|p| p.is_alive());
        if !attacker_alive || !target_alive {
            continue;
        }

        let rolled = dice.roll(config.attack_roll.clone());
        log.push(format!(
            "{} attacks {} for {rolled} damage",
            action.actor, action.target
        ));

        let mut damage = rolled;
        if let Some(left) = defense.get_mut(&action.target) {
            if *left >= damage {
                *left -= damage;
                damage = 0;
                log.push(format!(
                    "{} fully blocked the attack ({left} defense left)",
                    action.target
                ));
            } else {
                damage -= *left;
                *left = 0;
                log.push(format!(
                    "{} partially blocked the attack, {damage} damage through",
                    action.target
                ));
            }
        }

        let Some(target) = room.player_mut(&action.target) else {
            continue;
        };
        if damage > 0 {
            let hp = target.take_damage(damage);
            log.push(format!("{} takes {damage} damage, {hp} HP left", action.target));
            if hp == 0 {
                log.push(format!("{} dies!", action.target));
            }
        }
        hits.push(Hit {
            attacker: action.actor,
            target: action.target,
            rolled,
            blocked: rolled - damage,
            dealt: damage,
            remaining_hp: target.hp,
            killed: target.hp == 0,
        });
    }

    let outcome = {
        let mut survivors = room.survivors();
        match (survivors.next(), survivors.next()) {
            (Some(_), Some(_)) => RoundOutcome::Continue,
            (Some(last), None) => RoundOutcome::Winner(last.view()),
            (None, _) => RoundOutcome::Draw,
        }
    };
    room.set_phase(if outcome.is_final() {
        RoomPhase::Ended
    } else {
        RoomPhase::Simultaneous
    });

    RoundReport { log, hits, outcome }
}

#[cfg(test)]
mod tests {
    use skirmish_protocol::{RoomId, SubmittedAction};
    use skirmish_transport::ConnectionId;

    use super::*;
    use crate::{FixedDice, Player};

    fn room(names: &[&str]) -> Room {
        let mut room = Room::new(RoomId::new("arena"), Player::new(names[0], ConnectionId::new(0)));
        for (i, name) in names.iter().enumerate().skip(1) {
            room.add(Player::new(*name, ConnectionId::new(i as u64)), 6).unwrap();
        }
        room
    }

    fn actions(attacks: &[(&str, &str)], defends: &[&str]) -> RoundActions {
        RoundActions {
            attacks: attacks
                .iter()
                .map(|(a, t)| SubmittedAction::attack("arena", *a, *t))
                .collect(),
            defends: defends
                .iter()
                .map(|d| SubmittedAction::defend("arena", *d))
                .collect(),
        }
    }

    #[test]
    fn test_full_block_keeps_hp_and_spends_defense() {
        let mut room = room(&["Alice", "Bob", "Carol"]);
        // Defense 5 for Bob, then Alice rolls 3.
        let mut dice = FixedDice::new([5, 3]);

        let report = resolve_round(
            &mut room,
            actions(&[("Alice", "Bob")], &["Bob"]),
            &RoomConfig::default(),
            &mut dice,
        );

        assert_eq!(
            report.log,
            [
                "Bob defends with 5 defense",
                "Alice attacks Bob for 3 damage",
                "Bob fully blocked the attack (2 defense left)",
            ]
        );
        assert_eq!(room.player("Bob").unwrap().hp, 10);
        assert_eq!(report.hits[0].blocked, 3);
        assert_eq!(report.hits[0].dealt, 0);
        assert_eq!(report.outcome, RoundOutcome::Continue);
        assert_eq!(room.phase(), RoomPhase::Simultaneous);
    }

    #[test]
    fn test_leftover_defense_carries_to_the_next_attack() {
        let mut room = room(&["Alice", "Bob", "Carol"]);
        // Bob defends 5; Alice hits 3 (blocked, 2 left); Carol hits 3 (1 through).
        let mut dice = FixedDice::new([5, 3, 3]);

        let report = resolve_round(
            &mut room,
            actions(&[("Alice", "Bob"), ("Carol", "Bob")], &["Bob"]),
            &RoomConfig::default(),
            &mut dice,
        );

        assert!(report.log.contains(&"Bob partially blocked the attack, 1 damage through".to_owned()));
        assert!(report.log.contains(&"Bob takes 1 damage, 9 HP left".to_owned()));
        assert_eq!(room.player("Bob").unwrap().hp, 9);
    }

    #[test]
    fn test_partial_block_lets_the_rest_through() {
        let mut room = room(&["Alice", "Bob", "Carol"]);
        let config = RoomConfig {
            defense_roll: 1..=5,
            ..RoomConfig::default()
        };
        let mut dice = FixedDice::new([1, 3]);

        let report = resolve_round(
            &mut room,
            actions(&[("Alice", "Bob")], &["Bob"]),
            &config,
            &mut dice,
        );

        assert_eq!(
            &report.log[2..],
            [
                "Bob partially blocked the attack, 2 damage through",
                "Bob takes 2 damage, 8 HP left",
            ]
        );
        assert_eq!(report.hits[0].blocked, 1);
        assert_eq!(report.hits[0].dealt, 2);
    }

    #[test]
    fn test_undefended_attack_hits_in_full() {
        let mut room = room(&["Alice", "Bob", "Carol"]);
        let mut dice = FixedDice::new([2]);

        let report = resolve_round(
            &mut room,
            actions(&[("Alice", "Carol")], &[]),
            &RoomConfig::default(),
            &mut dice,
        );

        assert_eq!(
            report.log,
            ["Alice attacks Carol for 2 damage", "Carol takes 2 damage, 8 HP left"]
        );
    }

    #[test]
    fn test_lethal_hit_logs_death_and_skips_the_dead_attacker() {
        let mut room = room(&["Alice", "Bob", "Carol"]);
        room.player_mut("Bob").unwrap().hp = 2;
        let mut dice = FixedDice::repeating(3);

        // Alice kills Bob before Bob's own attack comes up.
        let report = resolve_round(
            &mut room,
            actions(&[("Alice", "Bob"), ("Bob", "Carol")], &[]),
            &RoomConfig::default(),
            &mut dice,
        );

        assert_eq!(
            report.log,
            [
                "Alice attacks Bob for 3 damage",
                "Bob takes 3 damage, 0 HP left",
                "Bob dies!",
            ]
        );
        assert!(report.hits[0].killed);
        assert_eq!(report.hits.len(), 1);
        assert_eq!(room.alive_count(), 2);
        assert_eq!(room.player("Carol").unwrap().hp, 10);
    }

    #[test]
    fn test_attacks_on_strangers_are_skipped() {
        let mut room = room(&["Alice", "Bob"]);
        let mut dice = FixedDice::repeating(3);

        let report = resolve_round(
            &mut room,
            actions(&[("Alice", "Mallory")], &[]),
            &RoomConfig::default(),
            &mut dice,
        );

        assert!(report.log.is_empty());
        assert!(report.hits.is_empty());
    }

    #[test]
    fn test_last_one_standing_wins() {
        let mut room = room(&["Alice", "Bob"]);
        room.player_mut("Bob").unwrap().hp = 1;
        let mut dice = FixedDice::repeating(1);

        let report = resolve_round(
            &mut room,
            actions(&[("Alice", "Bob")], &["Alice"]),
            &RoomConfig::default(),
            &mut dice,
        );

        match report.outcome {
            RoundOutcome::Winner(ref p) => assert_eq!(p.name, "Alice"),
            ref other => panic!("expected a winner, got {other:?}"),
        }
        assert_eq!(room.phase(), RoomPhase::Ended);
    }

    #[test]
    fn test_self_attacks_can_end_in_a_draw() {
        let mut room = room(&["Alice", "Bob"]);
        room.player_mut("Alice").unwrap().hp = 1;
        room.player_mut("Bob").unwrap().hp = 1;
        let mut dice = FixedDice::repeating(3);

        let report = resolve_round(
            &mut room,
            actions(&[("Alice", "Alice"), ("Bob", "Bob")], &[]),
            &RoomConfig::default(),
            &mut dice,
        );

        assert_eq!(report.outcome, RoundOutcome::Draw);
        assert_eq!(room.alive_count(), 0);
        assert_eq!(room.phase(), RoomPhase::Ended);
    }
}
