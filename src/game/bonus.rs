use std::collections::{HashMap, HashSet};

use crate::cards::{Card, Family};

/// Threshold shape of a family's bonus ladder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Thresholds {
    /// A single tier, active from three unique troops.
    SingleAtThree,
    /// Tier 2 from two unique troops, superseded by tier 4 from four.
    DualTwoFour,
}

impl Family {
    pub fn thresholds(self) -> Thresholds {
        match self {
            Family::Assassin | Family::Guetteur | Family::Vengeuse | Family::Lanceur => {
                Thresholds::SingleAtThree
            }
            Family::Noble
            | Family::Clan
            | Family::Gobelin
            | Family::Revenant
            | Family::Ace
            | Family::Colosse
            | Family::Bagarreur => Thresholds::DualTwoFour,
        }
    }

    /// Unique-troop count at which the family first activates.
    pub fn first_threshold(self) -> u32 {
        match self.thresholds() {
            Thresholds::SingleAtThree => 3,
            Thresholds::DualTwoFour => 2,
        }
    }

    /// Effect granted at an active tier.
    pub fn bonus_description(self, tier: u32) -> Option<&'static str> {
        match (self, tier) {
            (Family::Noble, 2) => {
                Some("Front troops take 20% less damage, back troops deal 20% bonus damage.")
            }
            (Family::Noble, 4) => {
                Some("Front troops take 40% less damage, back troops deal 40% bonus damage.")
            }
            (Family::Clan, 2) => {
                Some("At half HP, Clans heal and gain +30% max HP and hit speed once per round.")
            }
            (Family::Clan, 4) => {
                Some("At half HP, Clans gain +60% max HP and hit speed, the rest of the team +30%.")
            }
            (Family::Gobelin, 2) => Some("A 2-elixir bonus Gobelin arrives next round."),
            (Family::Gobelin, 4) => Some("60% chance of a 3- or 4-elixir bonus Gobelin."),
            (Family::Revenant, 2) => {
                Some("Two enemies are cursed, losing 25% max HP; Revenants gain damage on their fall.")
            }
            (Family::Revenant, 4) => Some("Three enemies are cursed, losing 50% max HP."),
            (Family::Ace, 2) => Some("The highest-level Ace becomes captain: +30% bonus damage."),
            (Family::Ace, 4) => {
                Some("Captain: +60% bonus damage and heals 30% of the damage dealt.")
            }
            (Family::Colosse, 2) => {
                Some("Colosses and troops behind them gain a shield: +30% shield strength.")
            }
            (Family::Colosse, 4) => Some("Shield strength bonus raised to +60%."),
            (Family::Bagarreur, 2) => Some("+40% max HP for Bagarreurs."),
            (Family::Bagarreur, 4) => Some("+80% max HP for Bagarreurs, +30% for the whole team."),
            (Family::Assassin, 3) => {
                Some("Assassins leap to the enemy back line: +35% crit chance and crit damage.")
            }
            (Family::Guetteur, 3) => {
                Some("Guetteurs gain hit speed with every attack, up to 15 stacks: +15%.")
            }
            (Family::Vengeuse, 3) => {
                Some("Vengeuses gain +30% bonus damage; the last one standing deals double.")
            }
            (Family::Lanceur, 3) => {
                Some("Lanceurs gain +1 attack range and +10% damage per hexagon of distance.")
            }
            _ => None,
        }
    }
}

/// Active tier for a family counting `count` unique troops, 0 when
/// inactive. Tier 4 supersedes tier 2; they never both apply.
pub fn tier_for(family: Family, count: u32) -> u32 {
    match family.thresholds() {
        Thresholds::SingleAtThree => {
            if count >= 3 {
                3
            } else {
                0
            }
        }
        Thresholds::DualTwoFour => {
            if count >= 4 {
                4
            } else if count >= 2 {
                2
            } else {
                0
            }
        }
    }
}

/// Count each family once per unique troop name on the board. Duplicate
/// names collapse to a single unit; the first occurrence wins.
pub fn family_counts(board: &[Card]) -> HashMap<Family, u32> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut counts = HashMap::new();
    for card in board {
        if !seen.insert(card.name.as_str()) {
            continue;
        }
        for &family in &card.traits {
            *counts.entry(family).or_insert(0) += 1;
        }
    }
    counts
}

/// Active bonus tier per family for the given board. A pure function of
/// board composition: recompute after every board mutation.
pub fn active_bonuses(board: &[Card]) -> HashMap<Family, u32> {
    family_counts(board)
        .into_iter()
        .filter_map(|(family, count)| {
            let tier = tier_for(family, count);
            (tier > 0).then_some((family, tier))
        })
        .collect()
}
