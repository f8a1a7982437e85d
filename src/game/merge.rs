use crate::cards::{Card, MAX_LEVEL};
use crate::{err, Res};

/// Upper bound on cascade rounds. Each merge shrinks the bench by two
/// cards so cascades terminate on their own; the cap bounds the loop
/// regardless.
const MAX_CASCADE_ROUNDS: usize = 10;

/// One resolved merge: three copies of a troop became a single copy one
/// level higher.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Merge {
    pub name: String,
    pub into_level: u32,
}

/// Collapse the earliest group of three bench cards sharing (name,
/// level) below the level cap. The three earliest copies are removed
/// in place, the remaining bench order is untouched, and the upgraded
/// card is appended. Returns `None` when no group qualifies.
fn merge_once(bench: &mut Vec<Card>) -> Option<Merge> {
    for i in 0..bench.len() {
        let probe = &bench[i];
        if probe.level >= MAX_LEVEL {
            continue;
        }

        let members: Vec<usize> = bench
            .iter()
            .enumerate()
            .filter(|(_, c)| c.matches(&probe.name, probe.level))
            .map(|(j, _)| j)
            .take(3)
            .collect();
        if members.len() < 3 || members[0] != i {
            continue;
        }

        let upgraded = bench[i].upgraded();
        for &j in members.iter().rev() {
            bench.remove(j);
        }
        let merge = Merge {
            name: upgraded.name.clone(),
            into_level: upgraded.level,
        };
        bench.push(upgraded);
        return Some(merge);
    }
    None
}

/// Resolve every merge available in the bench, one at a time, until
/// none remains or the safety cap is hit. Returns the merges performed
/// in order; the caller awards elixir and leader bonuses per entry.
pub fn resolve_cascade(bench: &mut Vec<Card>) -> Vec<Merge> {
    let mut merges = Vec::new();
    for _ in 0..MAX_CASCADE_ROUNDS {
        match merge_once(bench) {
            Some(merge) => merges.push(merge),
            None => break,
        }
    }
    merges
}

/// Merge exactly three matching bench cards at the player's request.
/// Rejected when fewer than three copies exist or the stack is already
/// at the level cap.
pub fn manual_merge(bench: &mut Vec<Card>, name: &str, level: u32) -> Res<Merge> {
    let members: Vec<usize> = bench
        .iter()
        .enumerate()
        .filter(|(_, c)| c.matches(name, level))
        .map(|(i, _)| i)
        .collect();

    if members.len() < 3 {
        return err(format!(
            "Not enough identical cards to merge: need 3x {name} level {level}, found {}.",
            members.len()
        ));
    }
    if level >= MAX_LEVEL {
        return err(format!("Level {MAX_LEVEL} cards cannot be merged further."));
    }

    let upgraded = bench[members[0]].upgraded();
    for &i in members.iter().take(3).rev() {
        bench.remove(i);
    }
    let merge = Merge {
        name: upgraded.name.clone(),
        into_level: upgraded.level,
    };
    bench.push(upgraded);
    Ok(merge)
}
