use std::collections::HashMap;

use crate::cards::Card;
use crate::{Reject, Res};

/// Starting elixir for a fresh game.
pub const STARTING_ELIXIR: u32 = 4;
/// Starting HP. The game is over when HP reaches zero.
pub const STARTING_HP: u32 = 10;

/// Where a card currently sits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Board,
    Bench,
}

impl std::fmt::Display for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Zone::Board => write!(f, "board"),
            Zone::Bench => write!(f, "bench"),
        }
    }
}

/// Elixir owed to the player at the next turn advance. Always present,
/// zeroed once paid out.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct PendingBonuses {
    pub interest: u32,
    pub sale_bonus: u32,
    pub family_bonus: u32,
    pub extractor_stock: u32,
}

impl PendingBonuses {
    pub fn total(&self) -> u32 {
        self.interest + self.sale_bonus + self.family_bonus + self.extractor_stock
    }
}

/// The mutable record of a game in progress.
#[derive(Clone, Debug, serde::Serialize)]
pub struct GameState {
    pub elixir: u32,
    /// Fielded troops, capped by the board-capacity rule.
    pub board: Vec<Card>,
    /// Holding area. Unbounded; merges resolve here.
    pub bench: Vec<Card>,
    pub hp: u32,
    pub turn: u32,
    /// How many times each troop name has been acquired from the pool.
    pub history: HashMap<String, u32>,
}

impl GameState {
    pub fn new() -> Self {
        Self {
            elixir: STARTING_ELIXIR,
            board: Vec::new(),
            bench: Vec::new(),
            hp: STARTING_HP,
            turn: 1,
            history: HashMap::new(),
        }
    }

    pub fn zone_mut(&mut self, zone: Zone) -> &mut Vec<Card> {
        match zone {
            Zone::Board => &mut self.board,
            Zone::Bench => &mut self.bench,
        }
    }

    pub fn game_over(&self) -> bool {
        self.hp == 0
    }

    /// Spend elixir, rejecting the command if the balance is too low.
    /// Spending is the only way the balance decreases, so it can never
    /// go negative.
    pub fn spend(&mut self, cost: u32) -> Res<()> {
        if cost > self.elixir {
            return Err(Reject::InsufficientElixir {
                have: self.elixir,
                need: cost,
            });
        }
        self.elixir -= cost;
        Ok(())
    }

    pub fn record_acquisition(&mut self, name: &str) {
        *self.history.entry(name.to_string()).or_insert(0) += 1;
    }

    /// Remove the first card matching (name, level) from a zone,
    /// returning it along with its index so a failed command can put it
    /// back where it was.
    pub fn take_card(&mut self, zone: Zone, name: &str, level: u32) -> Option<(usize, Card)> {
        let cards = self.zone_mut(zone);
        let index = cards.iter().position(|c| c.matches(name, level))?;
        Some((index, cards.remove(index)))
    }

    /// Reinsert a card at its original position after a rejected
    /// mutation.
    pub fn restore_card(&mut self, zone: Zone, index: usize, card: Card) {
        let cards = self.zone_mut(zone);
        let index = index.min(cards.len());
        cards.insert(index, card);
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}
