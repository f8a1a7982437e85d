use uuid::Uuid;

use crate::cards::{catalog, Card, Family, MAX_LEVEL};
use crate::{err, not_found, Res};

use super::bonus;
use super::effects::{leader_by_name, Leader, LeaderEvent, Modifier};
use super::merge::{self, Merge};
use super::score::{self, ScoreBreakdown, Weights};
use super::state::{GameState, PendingBonuses, Zone};

/// Base elixir income granted on every turn advance.
pub const ELIXIR_PER_TURN: u32 = 4;
/// Offers presented by the shop each turn; doubled by a modifier.
const CHOICES_PER_TURN: u32 = 3;

/// Configuration reported when a game starts.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct SessionSetup {
    pub leader: Option<String>,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    pub initial_card: Option<String>,
    #[serde(default = "default_level")]
    pub initial_level: u32,
    pub initial_elixir: Option<u32>,
}

impl Default for SessionSetup {
    fn default() -> Self {
        SessionSetup {
            leader: None,
            modifiers: Vec::new(),
            initial_card: None,
            initial_level: default_level(),
            initial_elixir: None,
        }
    }
}

fn default_level() -> u32 {
    1
}

/// A modifier effect that needs out-of-band player input before it can
/// be applied. Sits in the session until answered or dismissed.
#[derive(Clone, Debug, serde::Serialize)]
pub struct PendingDecision {
    pub id: Uuid,
    pub kind: DecisionKind,
    pub prompt: String,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    /// A 2-star starting troop of the given cost joins the board.
    StartingCard { cost: u32 },
    /// Pandora's bench swapped out the leftmost bench troop.
    BenchReplacement,
    /// The rightmost bench troop transformed into a pricier one.
    BenchPromotion,
    /// A free troop was granted this round.
    GrantedTroop,
    /// One-time copy of the first eliminated enemy troop.
    EnemyCopy,
    /// Did an enemy leader die this round?
    EnemyLeaderDied,
    /// Did the mannequin survive the round?
    MannequinSurvived,
}

/// Player answer to a pending decision: a yes/no flag or a troop name.
/// Answering `false` dismisses the decision without effect.
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(untagged)]
pub enum DecisionAnswer {
    Flag(bool),
    Card(String),
}

#[derive(Debug, serde::Serialize)]
pub struct BuyOutcome {
    pub card: Card,
    pub cost_paid: u32,
    pub merges: Vec<Merge>,
    pub merge_elixir: u32,
    pub leader_elixir: u32,
    pub elixir: u32,
}

#[derive(Debug, serde::Serialize)]
pub struct MergeOutcome {
    pub merges: Vec<Merge>,
    pub merge_elixir: u32,
    pub leader_elixir: u32,
    pub elixir: u32,
}

#[derive(Debug, serde::Serialize)]
pub struct RemoveOutcome {
    pub card: Card,
    pub refund: u32,
    pub leader_elixir: u32,
    pub elixir: u32,
}

#[derive(Debug, serde::Serialize)]
pub struct BoardMoveOutcome {
    pub merge: Option<Merge>,
    pub merge_elixir: u32,
    pub leader_elixir: u32,
    pub elixir: u32,
}

#[derive(Debug, serde::Serialize)]
pub struct BattleOutcome {
    pub victory: bool,
    pub hp_lost: u32,
    pub leader_elixir: u32,
    pub turn_elixir: u32,
    pub hp: u32,
    pub turn: u32,
    pub game_over: bool,
    pub elixir: u32,
}

#[derive(Debug, serde::Serialize)]
pub struct DecisionOutcome {
    pub message: String,
    pub elixir: u32,
}

#[derive(Debug, serde::Serialize)]
pub struct FamilyBonusView {
    pub family: Family,
    pub tier: u32,
    pub active: bool,
    pub count: u32,
    pub description: String,
}

/// Full state snapshot returned after reads and used by clients to
/// render the position.
#[derive(Debug, serde::Serialize)]
pub struct Snapshot {
    pub turn: u32,
    pub elixir: u32,
    pub hp: u32,
    pub board: Vec<Card>,
    pub bench: Vec<Card>,
    pub board_capacity: usize,
    pub family_bonuses: Vec<FamilyBonusView>,
    pub modifiers: Vec<Modifier>,
    pub leader: Option<Leader>,
    pub pending: PendingBonuses,
    pub decisions: Vec<PendingDecision>,
    pub choices_per_turn: u32,
    pub mannequin: bool,
    pub mannequin_special: bool,
    pub game_over: bool,
}

#[derive(Debug, serde::Serialize)]
pub struct CandidateScore {
    /// Position of this candidate in the submitted offer list.
    pub index: usize,
    pub card: Card,
    pub affordable: bool,
    pub breakdown: ScoreBreakdown,
    pub total: f64,
}

#[derive(Debug, serde::Serialize)]
pub struct Recommendations {
    /// All scored candidates, best first. Ties keep submission order.
    pub ranked: Vec<CandidateScore>,
    /// Index into the submitted offers of the recommended buy, if any
    /// offer is affordable.
    pub best: Option<usize>,
    pub elixir: u32,
}

/// One game being assisted: rules configuration plus the mutable state.
/// Commands settle completely, merge cascades included, before they
/// return.
pub struct Session {
    state: GameState,
    weights: Weights,
    leader: Option<&'static Leader>,
    modifiers: Vec<Modifier>,
    elixir_per_turn: u32,
    choices_per_turn: u32,
    pending: PendingBonuses,
    decisions: Vec<PendingDecision>,
    first_buy_done: bool,
    mannequin: bool,
    mannequin_special: bool,
    enemy_copy_taken: bool,
}

impl Session {
    pub fn create(setup: &SessionSetup) -> Res<Session> {
        let leader = match &setup.leader {
            Some(name) => match leader_by_name(name) {
                Some(leader) => Some(leader),
                None => return not_found(format!("Leader {name}")),
            },
            None => None,
        };

        let mut session = Session {
            state: GameState::new(),
            weights: Weights::default(),
            leader,
            modifiers: setup.modifiers.clone(),
            elixir_per_turn: ELIXIR_PER_TURN,
            choices_per_turn: CHOICES_PER_TURN,
            pending: PendingBonuses::default(),
            decisions: Vec::new(),
            first_buy_done: false,
            mannequin: false,
            mannequin_special: false,
            enemy_copy_taken: false,
        };
        session.apply_modifiers();

        // The player may report a different balance than the defaults
        // produce, e.g. after out-of-game bonuses.
        if let Some(elixir) = setup.initial_elixir {
            session.state.elixir = elixir;
        }
        if let Some(name) = &setup.initial_card {
            let card = catalog().card(name, setup.initial_level)?;
            session.state.record_acquisition(&card.name);
            session.state.board.push(card);
        }

        Ok(session)
    }

    /// One-shot configuration effects of the active modifiers. Team
    /// size tags are read by the capacity rule, purchase tags by
    /// `buy_card` and recurring tags on each turn advance.
    fn apply_modifiers(&mut self) {
        for modifier in self.modifiers.clone() {
            match modifier {
                Modifier::PleinLesPoches => self.state.elixir += 5,
                Modifier::QuatreEtoiles => self.choices_per_turn = 2 * CHOICES_PER_TURN,
                Modifier::ResterEnVie => self.mannequin = true,
                Modifier::MannequinSpecial => {
                    self.mannequin = true;
                    self.mannequin_special = true;
                }
                Modifier::EtoileRare
                | Modifier::EtoileEpique
                | Modifier::EtoileLegendaire
                | Modifier::EtoileDeChampion => {
                    if let Some(cost) = modifier.start_card_cost() {
                        self.push_decision(
                            DecisionKind::StartingCard { cost },
                            format!("Pick the 2-star starting troop costing {cost} elixir."),
                        );
                    }
                }
                _ => {}
            }
        }
    }

    fn has_modifier(&self, modifier: Modifier) -> bool {
        self.modifiers.contains(&modifier)
    }

    /// Apply the leader bonus for an event, returning the elixir added.
    fn leader_bonus(&mut self, event: LeaderEvent) -> u32 {
        let amount = self.leader.map(|l| l.bonus_for(event)).unwrap_or(0);
        self.state.elixir += amount;
        amount
    }

    fn push_decision(&mut self, kind: DecisionKind, prompt: impl Into<String>) {
        self.decisions.push(PendingDecision {
            id: Uuid::new_v4(),
            kind,
            prompt: prompt.into(),
        });
    }

    /// Cards the board may hold this turn: 2 on turn one, growing by
    /// one per turn up to 6. One modifier adds a seventh slot, another
    /// pins the limit to 6 and takes precedence.
    pub fn board_capacity(&self) -> usize {
        let mut capacity = (2 + (self.state.turn - 1)).min(6);
        if self.has_modifier(Modifier::PlusOnEstDeFous) {
            capacity = (capacity + 1).min(7);
        }
        if self.has_modifier(Modifier::LaFete) {
            capacity = 6;
        }
        capacity as usize
    }

    /// Buy a troop from the shop into the bench, then settle any merge
    /// cascade it sets off.
    pub fn buy_card(&mut self, name: &str, level: u32) -> Res<BuyOutcome> {
        let mut card = catalog().card(name, level)?;
        let mut cost = card.cost;
        if !self.first_buy_done && self.has_modifier(Modifier::CadeauDeLaMaison) {
            cost = 0;
        } else if !self.first_buy_done && self.has_modifier(Modifier::PremierChoix) {
            card = card.at_level(2);
        }

        self.state.spend(cost)?;
        self.first_buy_done = true;
        self.state.record_acquisition(&card.name);
        self.state.bench.push(card.clone());

        let merges = merge::resolve_cascade(&mut self.state.bench);
        let merge_elixir = merges.len() as u32;
        self.state.elixir += merge_elixir;
        let mut leader_elixir = 0;
        for _ in &merges {
            leader_elixir += self.leader_bonus(LeaderEvent::Merge);
        }

        tracing::debug!(
            "Bought {} level {} for {cost} elixir, {} merge(s).",
            card.name,
            card.level,
            merges.len()
        );
        Ok(BuyOutcome {
            card,
            cost_paid: cost,
            merges,
            merge_elixir,
            leader_elixir,
            elixir: self.state.elixir,
        })
    }

    /// Merge three matching bench cards at the player's request, then
    /// settle any follow-up cascade.
    pub fn manual_merge(&mut self, name: &str, level: u32) -> Res<MergeOutcome> {
        let first = merge::manual_merge(&mut self.state.bench, name, level)?;
        let mut merges = vec![first];
        merges.extend(merge::resolve_cascade(&mut self.state.bench));

        let merge_elixir = merges.len() as u32;
        self.state.elixir += merge_elixir;
        let mut leader_elixir = 0;
        for _ in &merges {
            leader_elixir += self.leader_bonus(LeaderEvent::Merge);
        }

        Ok(MergeOutcome {
            merges,
            merge_elixir,
            leader_elixir,
            elixir: self.state.elixir,
        })
    }

    /// Remove a card outright, recovering its cost minus one elixir.
    pub fn delete_card(&mut self, name: &str, level: u32, zone: Zone) -> Res<RemoveOutcome> {
        let Some((_, card)) = self.state.take_card(zone, name, level) else {
            return not_found(format!("{name} level {level} in the {zone}"));
        };

        let refund = card.cost.saturating_sub(1).max(1);
        self.state.elixir += refund;
        Ok(RemoveOutcome {
            card,
            refund,
            leader_elixir: 0,
            elixir: self.state.elixir,
        })
    }

    /// Sell a card back for half its cost. Selling counts as a loss for
    /// leader purposes, so the defeat bonus fires.
    pub fn sell_card(&mut self, name: &str, level: u32, zone: Zone) -> Res<RemoveOutcome> {
        let Some((_, card)) = self.state.take_card(zone, name, level) else {
            return not_found(format!("{name} level {level} in the {zone}"));
        };

        let refund = (card.cost / 2).max(1);
        self.state.elixir += refund;
        let leader_elixir = self.leader_bonus(LeaderEvent::Defeat);
        if self.has_modifier(Modifier::BonneAffaire) {
            self.pending.sale_bonus += 1;
        }

        Ok(RemoveOutcome {
            card,
            refund,
            leader_elixir,
            elixir: self.state.elixir,
        })
    }

    /// Relocate a card between zones. Moves onto a full board are
    /// rejected and leave the card exactly where it was.
    pub fn move_card(&mut self, name: &str, level: u32, from: Zone, to: Zone) -> Res<()> {
        if from == to {
            return err("Cannot move a card to the zone it is already in.");
        }
        let Some((index, card)) = self.state.take_card(from, name, level) else {
            return not_found(format!("{name} level {level} in the {from}"));
        };

        let capacity = self.board_capacity();
        if to == Zone::Board && self.state.board.len() >= capacity {
            self.state.restore_card(from, index, card);
            return err(format!(
                "Board is full: limit of {capacity} cards at turn {}.",
                self.state.turn
            ));
        }

        self.state.zone_mut(to).push(card);
        Ok(())
    }

    /// Move a bench card onto the board. When one or two identical
    /// cards already sit there, they merge with the moved card into a
    /// single upgraded board card, so the capacity check only applies
    /// when no merge results.
    pub fn move_to_board(&mut self, name: &str, level: u32) -> Res<BoardMoveOutcome> {
        let Some((index, card)) = self.state.take_card(Zone::Bench, name, level) else {
            return not_found(format!("{name} level {level} in the bench"));
        };

        let members: Vec<usize> = self
            .state
            .board
            .iter()
            .enumerate()
            .filter(|(_, c)| c.matches(name, level))
            .map(|(i, _)| i)
            .take(2)
            .collect();

        let capacity = self.board_capacity();
        if members.is_empty() || level >= MAX_LEVEL {
            if self.state.board.len() >= capacity {
                self.state.restore_card(Zone::Bench, index, card);
                return err(format!(
                    "Board is full: limit of {capacity} cards at turn {}.",
                    self.state.turn
                ));
            }
            self.state.board.push(card);
            return Ok(BoardMoveOutcome {
                merge: None,
                merge_elixir: 0,
                leader_elixir: 0,
                elixir: self.state.elixir,
            });
        }

        // The bench card completes the stack: consume the board copies
        // and field the upgraded card. Net board size never grows here.
        for &i in members.iter().rev() {
            self.state.board.remove(i);
        }
        let upgraded = card.upgraded();
        let merge = Merge {
            name: upgraded.name.clone(),
            into_level: upgraded.level,
        };
        self.state.board.push(upgraded);
        self.state.elixir += 1;
        let leader_elixir = self.leader_bonus(LeaderEvent::Merge);

        Ok(BoardMoveOutcome {
            merge: Some(merge),
            merge_elixir: 1,
            leader_elixir,
            elixir: self.state.elixir,
        })
    }

    /// Record a battle outcome. Losses cost 1 HP plus one per surviving
    /// enemy troop; hitting 0 HP ends the game and freezes the turn
    /// counter. Otherwise the turn advances and income is paid out.
    pub fn battle_result(&mut self, victory: bool, enemy_remaining: u32) -> BattleOutcome {
        let mut hp_lost = 0;
        let mut leader_elixir = 0;
        if !victory {
            hp_lost = 1 + enemy_remaining;
            self.state.hp = self.state.hp.saturating_sub(hp_lost);
            leader_elixir = self.leader_bonus(LeaderEvent::Defeat);
        }

        let mut turn_elixir = 0;
        if !self.state.game_over() {
            turn_elixir = self.advance_turn();
            let copy_pending = self
                .decisions
                .iter()
                .any(|d| d.kind == DecisionKind::EnemyCopy);
            if !victory
                && self.has_modifier(Modifier::TuEsAMoi)
                && !self.enemy_copy_taken
                && !copy_pending
            {
                self.push_decision(
                    DecisionKind::EnemyCopy,
                    "Name the first enemy troop eliminated to gain a 1-star copy.",
                );
            }
        }

        BattleOutcome {
            victory,
            hp_lost,
            leader_elixir,
            turn_elixir,
            hp: self.state.hp,
            turn: self.state.turn,
            game_over: self.state.game_over(),
            elixir: self.state.elixir,
        }
    }

    /// Advance to the next turn: pay base income plus everything owed
    /// from the previous round, then accrue next round's deferred
    /// bonuses and run the recurring modifier effects. Returns the
    /// elixir gained.
    fn advance_turn(&mut self) -> u32 {
        self.state.turn += 1;
        self.first_buy_done = false;

        let owed = std::mem::take(&mut self.pending);
        let mut gained = self.elixir_per_turn + owed.total();
        if self.has_modifier(Modifier::Clairvoyance) && self.state.bench.is_empty() {
            gained += 2;
        }

        // Interest accrues on the balance held before this turn's
        // income arrives.
        if self.has_modifier(Modifier::DePlusEnPlusRiche) {
            self.pending.interest = self.state.elixir / 2;
        }
        if self.has_modifier(Modifier::ExtracteurElixir) {
            self.pending.extractor_stock += 2;
        }
        if bonus::active_bonuses(&self.state.board).get(&Family::Gobelin) == Some(&2) {
            self.pending.family_bonus += 2;
        }

        self.state.elixir += gained;

        if self.has_modifier(Modifier::MiroirMagique) {
            if let Some(last) = self.state.bench.last() {
                let copy = last.at_level(1);
                self.state.bench.push(copy);
            }
        }
        if self.has_modifier(Modifier::Ascension) && self.state.turn == 3 {
            if let Some(last) = self.state.bench.last_mut() {
                let ascended = last.at_level(3);
                *last = ascended;
            }
        }

        self.refresh_decisions();
        gained
    }

    /// Drop last round's unanswered recurring decisions and emit this
    /// round's. One-shot decisions (the starting troop) stay until
    /// answered.
    fn refresh_decisions(&mut self) {
        self.decisions
            .retain(|d| matches!(d.kind, DecisionKind::StartingCard { .. }));

        if self.has_modifier(Modifier::BancDePandore) && !self.state.bench.is_empty() {
            self.push_decision(
                DecisionKind::BenchReplacement,
                "Pandora's bench swapped a troop: which troop of the same cost appeared?",
            );
        }
        if self.has_modifier(Modifier::Promotion) {
            if let Some(last) = self.state.bench.last() {
                let prompt = format!(
                    "Promotion: which troop costing {} replaced the rightmost bench troop?",
                    last.cost + 1
                );
                self.push_decision(DecisionKind::BenchPromotion, prompt);
            }
        }
        if self.has_modifier(Modifier::Cheate) {
            self.push_decision(
                DecisionKind::GrantedTroop,
                "Which useful troop was granted this round?",
            );
        }
        if self.has_modifier(Modifier::Heritage) {
            self.push_decision(
                DecisionKind::EnemyLeaderDied,
                "Did an enemy leader die this round?",
            );
        }
        if self.has_modifier(Modifier::ResterEnVie) && self.mannequin {
            self.push_decision(
                DecisionKind::MannequinSurvived,
                "Did the mannequin survive the round?",
            );
        }
    }

    /// Answer a pending decision. A `false` flag dismisses any decision
    /// without effect; otherwise the answer must fit the decision kind.
    /// Rejected answers leave the decision pending so it can be
    /// answered again.
    pub fn resolve_decision(&mut self, id: Uuid, answer: DecisionAnswer) -> Res<DecisionOutcome> {
        let Some(index) = self.decisions.iter().position(|d| d.id == id) else {
            return not_found("Decision");
        };
        let kind = self.decisions[index].kind;

        if let DecisionAnswer::Flag(false) = answer {
            self.decisions.remove(index);
            return Ok(DecisionOutcome {
                message: "Dismissed.".to_string(),
                elixir: self.state.elixir,
            });
        }

        let message = match (kind, answer) {
            (DecisionKind::StartingCard { cost }, DecisionAnswer::Card(name)) => {
                let card = catalog().card(&name, 2)?;
                if card.cost != cost {
                    return err(format!(
                        "The starting troop must cost {cost} elixir; {} costs {}.",
                        card.name, card.cost
                    ));
                }
                self.state.record_acquisition(&card.name);
                let message = format!("{} starts on the board at level 2.", card.name);
                self.state.board.push(card);
                message
            }
            (DecisionKind::BenchReplacement, DecisionAnswer::Card(name)) => {
                let card = catalog().card(&name, 1)?;
                let message = format!("{} took over the bench slot.", card.name);
                match self.state.bench.first_mut() {
                    Some(first) => *first = card,
                    None => self.state.bench.push(card),
                }
                message
            }
            (DecisionKind::BenchPromotion, DecisionAnswer::Card(name)) => {
                let card = catalog().card(&name, 1)?;
                let message = format!("{} replaced the rightmost bench troop.", card.name);
                match self.state.bench.last_mut() {
                    Some(last) => *last = card,
                    None => self.state.bench.push(card),
                }
                message
            }
            (DecisionKind::GrantedTroop, DecisionAnswer::Card(name)) => {
                let card = catalog().card(&name, 1)?;
                let message = format!("{} joins the bench.", card.name);
                self.state.bench.push(card);
                message
            }
            (DecisionKind::EnemyCopy, DecisionAnswer::Card(name)) => {
                let card = catalog().card(&name, 1)?;
                self.enemy_copy_taken = true;
                let message = format!("A 1-star copy of {} joins the bench.", card.name);
                self.state.bench.push(card);
                message
            }
            (DecisionKind::EnemyLeaderDied, DecisionAnswer::Flag(true)) => {
                self.state.elixir += 5;
                "+5 elixir from the fallen enemy leader.".to_string()
            }
            (DecisionKind::MannequinSurvived, DecisionAnswer::Flag(true)) => {
                self.state.elixir += 1;
                "+1 elixir: the mannequin survived.".to_string()
            }
            _ => return err("Answer does not fit the decision."),
        };

        self.decisions.remove(index);
        Ok(DecisionOutcome {
            message,
            elixir: self.state.elixir,
        })
    }

    /// Score the offered candidates and pick the best affordable one.
    /// Unknown troop names are skipped; an offer list with no valid
    /// entry is rejected.
    pub fn recommend(&self, offers: &[(String, u32)]) -> Res<Recommendations> {
        let mut scored = Vec::new();
        for (index, (name, level)) in offers.iter().enumerate() {
            let Ok(card) = catalog().card(name, *level) else {
                continue;
            };
            let breakdown = score::score_candidate(
                &card,
                &self.state.board,
                &self.state.bench,
                &self.state.history,
                &self.weights,
            );
            let total = breakdown.total();
            scored.push(CandidateScore {
                index,
                affordable: card.cost <= self.state.elixir,
                card,
                breakdown,
                total,
            });
        }
        if scored.is_empty() {
            return err("No valid candidates to score.");
        }

        let costs: Vec<(u32, f64)> = scored.iter().map(|c| (c.card.cost, c.total)).collect();
        let best = score::best_choice(&costs, self.state.elixir).map(|i| scored[i].index);

        let mut ranked = scored;
        ranked.sort_by(|a, b| b.total.total_cmp(&a.total));
        Ok(Recommendations {
            ranked,
            best,
            elixir: self.state.elixir,
        })
    }

    /// Full snapshot of the position, with family bonuses recomputed
    /// from the current board.
    pub fn snapshot(&self) -> Snapshot {
        let mut family_bonuses: Vec<FamilyBonusView> = bonus::family_counts(&self.state.board)
            .into_iter()
            .map(|(family, count)| {
                let tier = bonus::tier_for(family, count);
                let description = match family.bonus_description(tier) {
                    Some(description) => description.to_string(),
                    None => format!(
                        "Needs {} unique troops to activate.",
                        family.first_threshold()
                    ),
                };
                FamilyBonusView {
                    family,
                    tier,
                    active: tier > 0,
                    count,
                    description,
                }
            })
            .collect();
        family_bonuses.sort_by(|a, b| b.active.cmp(&a.active).then(a.family.cmp(&b.family)));

        Snapshot {
            turn: self.state.turn,
            elixir: self.state.elixir,
            hp: self.state.hp,
            board: self.state.board.clone(),
            bench: self.state.bench.clone(),
            board_capacity: self.board_capacity(),
            family_bonuses,
            modifiers: self.modifiers.clone(),
            leader: self.leader.copied(),
            pending: self.pending.clone(),
            decisions: self.decisions.clone(),
            choices_per_turn: self.choices_per_turn,
            mannequin: self.mannequin,
            mannequin_special: self.mannequin_special,
            game_over: self.state.game_over(),
        }
    }
}

#[cfg(test)]
mod test {
    use crate::cards::{Card, Family};
    use crate::game::effects::Modifier;
    use crate::game::state::Zone;
    use crate::Reject;

    use super::{DecisionAnswer, DecisionKind, Session, SessionSetup};

    fn session() -> Session {
        Session::create(&SessionSetup::default()).unwrap()
    }

    fn session_with(setup: SessionSetup) -> Session {
        Session::create(&setup).unwrap()
    }

    #[test]
    fn test_create_defaults() {
        let session = session();
        let snapshot = session.snapshot();
        assert_eq!(snapshot.elixir, 4);
        assert_eq!(snapshot.hp, 10);
        assert_eq!(snapshot.turn, 1);
        assert_eq!(snapshot.board_capacity, 2);
        assert!(snapshot.board.is_empty());
        assert!(!snapshot.game_over);
    }

    #[test]
    fn test_create_rejects_unknown_leader() {
        let setup = SessionSetup {
            leader: Some("Archimage".to_string()),
            ..Default::default()
        };
        assert!(Session::create(&setup).is_err());
    }

    #[test]
    fn test_create_with_initial_card() {
        let setup = SessionSetup {
            initial_card: Some("Chevalier".to_string()),
            initial_level: 2,
            initial_elixir: Some(7),
            ..Default::default()
        };
        let session = session_with(setup);
        let snapshot = session.snapshot();
        assert_eq!(snapshot.elixir, 7);
        assert_eq!(snapshot.board.len(), 1);
        assert_eq!(snapshot.board[0].level, 2);
        assert_eq!(session.state.history.get("Chevalier"), Some(&1));
    }

    #[test]
    fn test_buy_rejects_insufficient_elixir() {
        let mut session = session();
        let result = session.buy_card("Reine", 1);
        assert_eq!(result.unwrap_err(), Reject::InsufficientElixir { have: 4, need: 5 });
        assert!(session.state.bench.is_empty());
        assert_eq!(session.state.elixir, 4);
    }

    #[test]
    fn test_buy_rejects_unknown_card() {
        let mut session = session();
        assert!(matches!(
            session.buy_card("Missingno", 1),
            Err(Reject::NotFound(_))
        ));
    }

    #[test]
    fn test_buy_adds_to_bench_and_history() {
        let mut session = session();
        let outcome = session.buy_card("Gobelins", 1).unwrap();
        assert_eq!(outcome.cost_paid, 2);
        assert_eq!(outcome.elixir, 2);
        assert!(outcome.merges.is_empty());
        assert_eq!(session.state.bench.len(), 1);
        assert_eq!(session.state.history.get("Gobelins"), Some(&1));
    }

    #[test]
    fn test_third_copy_merges_on_buy() {
        let mut session = session_with(SessionSetup {
            initial_elixir: Some(10),
            ..Default::default()
        });
        session.buy_card("Gobelins", 1).unwrap();
        session.buy_card("Gobelins", 1).unwrap();
        let outcome = session.buy_card("Gobelins", 1).unwrap();

        assert_eq!(outcome.merges.len(), 1);
        assert_eq!(outcome.merge_elixir, 1);
        assert_eq!(outcome.leader_elixir, 0);
        // 10 - 3x2 + 1 merge reward.
        assert_eq!(session.state.elixir, 5);
        assert_eq!(session.state.bench.len(), 1);
        assert_eq!(session.state.bench[0].level, 2);
        assert_eq!(session.state.history.get("Gobelins"), Some(&3));
    }

    #[test]
    fn test_leader_bonus_per_merge() {
        let mut session = session_with(SessionSetup {
            leader: Some("Impératrice".to_string()),
            initial_elixir: Some(20),
            ..Default::default()
        });
        // Nine copies cascade into a level 3: four merges in total,
        // two of them on the final buy's cascade.
        for _ in 0..8 {
            session.buy_card("Gobelins", 1).unwrap();
        }
        assert_eq!(session.state.elixir, 20 - 16 + 2 + 2); // Two merges so far.
        let outcome = session.buy_card("Gobelins", 1).unwrap();
        assert_eq!(outcome.merges.len(), 2);
        assert_eq!(outcome.merge_elixir, 2);
        assert_eq!(outcome.leader_elixir, 2);
        assert_eq!(session.state.bench.len(), 1);
        assert_eq!(session.state.bench[0].level, 3);
    }

    #[test]
    fn test_manual_merge_basic_scenario() {
        let mut session = session_with(SessionSetup {
            initial_elixir: Some(0),
            ..Default::default()
        });
        session.state.bench = vec![
            Card::sample("Archères", 1),
            Card::sample("Archères", 1),
            Card::sample("Archères", 1),
        ];

        let outcome = session.manual_merge("Archères", 1).unwrap();
        assert_eq!(outcome.merges.len(), 1);
        assert_eq!(session.state.bench.len(), 1);
        assert_eq!(session.state.bench[0].level, 2);
        assert_eq!(session.state.elixir, 1);
    }

    #[test]
    fn test_manual_merge_rejects_thin_stack() {
        let mut session = session();
        session.state.bench = vec![Card::sample("Archères", 1), Card::sample("Archères", 1)];
        assert!(session.manual_merge("Archères", 1).is_err());
        assert_eq!(session.state.bench.len(), 2);
        assert_eq!(session.state.elixir, 4);
    }

    #[test]
    fn test_delete_refunds_cost_minus_one() {
        let mut session = session();
        session.state.board = vec![Card::sample("Reine", 1)];
        session.state.bench = vec![Card::sample("Gobelins", 1)];

        let outcome = session.delete_card("Reine", 1, Zone::Board).unwrap();
        assert_eq!(outcome.refund, 4);
        assert_eq!(outcome.leader_elixir, 0);

        // Cheap cards still refund at least one elixir.
        let outcome = session.delete_card("Gobelins", 1, Zone::Bench).unwrap();
        assert_eq!(outcome.refund, 1);
        assert_eq!(session.state.elixir, 4 + 4 + 1);
    }

    #[test]
    fn test_delete_missing_card() {
        let mut session = session();
        assert!(matches!(
            session.delete_card("Reine", 1, Zone::Bench),
            Err(Reject::NotFound(_))
        ));
    }

    #[test]
    fn test_sell_refunds_half_and_fires_defeat_hook() {
        let mut session = session_with(SessionSetup {
            leader: Some("Roi Royal".to_string()),
            ..Default::default()
        });
        session.state.bench = vec![Card::sample("Reine", 1)];

        let outcome = session.sell_card("Reine", 1, Zone::Bench).unwrap();
        assert_eq!(outcome.refund, 2);
        assert_eq!(outcome.leader_elixir, 4);
        assert_eq!(session.state.elixir, 4 + 2 + 4);
    }

    #[test]
    fn test_sale_bonus_defers_elixir() {
        let mut session = session_with(SessionSetup {
            modifiers: vec![Modifier::BonneAffaire],
            ..Default::default()
        });
        session.state.bench = vec![Card::sample("Gobelins", 1)];
        session.sell_card("Gobelins", 1, Zone::Bench).unwrap();
        assert_eq!(session.pending.sale_bonus, 1);

        let before = session.state.elixir;
        let outcome = session.battle_result(true, 0);
        // Base income plus the deferred sale bonus, pending cleared.
        assert_eq!(outcome.turn_elixir, 5);
        assert_eq!(session.state.elixir, before + 5);
        assert_eq!(session.pending.sale_bonus, 0);
    }

    #[test]
    fn test_move_same_zone_rejected() {
        let mut session = session();
        session.state.bench = vec![Card::sample("Prince", 1)];
        assert!(session.move_card("Prince", 1, Zone::Bench, Zone::Bench).is_err());
        assert_eq!(session.state.bench.len(), 1);
    }

    #[test]
    fn test_move_rejection_restores_placement() {
        // Board full at the turn-1 capacity of two.
        let mut session = session();
        session.state.board = vec![Card::sample("Chevalier", 1), Card::sample("Prince", 1)];
        session.state.bench = vec![Card::sample("Valkyrie", 1), Card::sample("Reine", 1)];

        let result = session.move_card("Valkyrie", 1, Zone::Bench, Zone::Board);
        assert!(result.is_err());
        // Both zones exactly as before the rejected command.
        assert_eq!(session.state.board.len(), 2);
        assert_eq!(session.state.bench[0].name, "Valkyrie");
        assert_eq!(session.state.bench[1].name, "Reine");
    }

    #[test]
    fn test_move_to_bench_ignores_capacity() {
        let mut session = session();
        session.state.board = vec![Card::sample("Chevalier", 1)];
        assert!(session.move_card("Chevalier", 1, Zone::Board, Zone::Bench).is_ok());
        assert!(session.state.board.is_empty());
        assert_eq!(session.state.bench.len(), 1);
    }

    #[test]
    fn test_move_to_board_merges_at_capacity() {
        // Two identical cards fill the board; the bench copy completes
        // the stack instead of being rejected.
        let mut session = session();
        session.state.board = vec![Card::sample("Valkyrie", 1), Card::sample("Valkyrie", 1)];
        session.state.bench = vec![Card::sample("Valkyrie", 1)];

        let outcome = session.move_to_board("Valkyrie", 1).unwrap();
        let merge = outcome.merge.unwrap();
        assert_eq!(merge.into_level, 2);
        assert_eq!(session.state.board.len(), 1);
        assert_eq!(session.state.board[0].level, 2);
        assert!(session.state.bench.is_empty());
        assert_eq!(session.state.elixir, 5);
    }

    #[test]
    fn test_move_to_board_single_match_merges() {
        let mut session = session();
        session.state.board = vec![Card::sample("Valkyrie", 1)];
        session.state.bench = vec![Card::sample("Valkyrie", 1)];

        let outcome = session.move_to_board("Valkyrie", 1).unwrap();
        assert!(outcome.merge.is_some());
        assert_eq!(session.state.board.len(), 1);
        assert_eq!(session.state.board[0].level, 2);
    }

    #[test]
    fn test_move_to_board_full_without_match() {
        let mut session = session();
        session.state.board = vec![Card::sample("Chevalier", 1), Card::sample("Prince", 1)];
        session.state.bench = vec![Card::sample("Valkyrie", 1)];

        assert!(session.move_to_board("Valkyrie", 1).is_err());
        assert_eq!(session.state.board.len(), 2);
        assert_eq!(session.state.bench.len(), 1);
    }

    #[test]
    fn test_move_to_board_level_cap_never_merges() {
        let mut session = session();
        session.state.board = vec![Card::sample("Reine", 5)];
        session.state.bench = vec![Card::sample("Reine", 5)];

        let outcome = session.move_to_board("Reine", 5).unwrap();
        assert!(outcome.merge.is_none());
        assert_eq!(session.state.board.len(), 2);
        assert!(session
            .state
            .board
            .iter()
            .all(|c| c.level == 5 && c.name == "Reine"));
    }

    #[test]
    fn test_battle_win_advances_turn() {
        let mut session = session();
        let outcome = session.battle_result(true, 0);
        assert_eq!(outcome.hp_lost, 0);
        assert_eq!(outcome.turn, 2);
        assert_eq!(outcome.turn_elixir, 4);
        assert_eq!(session.state.elixir, 8);
        assert_eq!(session.state.hp, 10);
    }

    #[test]
    fn test_battle_loss_costs_hp_and_pays_leader() {
        let mut session = session_with(SessionSetup {
            leader: Some("Roi Royal".to_string()),
            ..Default::default()
        });
        let outcome = session.battle_result(false, 2);
        assert_eq!(outcome.hp_lost, 3);
        assert_eq!(outcome.leader_elixir, 4);
        assert_eq!(session.state.hp, 7);
        assert_eq!(outcome.turn, 2);
        assert_eq!(session.state.elixir, 4 + 4 + 4);
    }

    #[test]
    fn test_battle_loss_termination() {
        let mut session = session();
        session.state.hp = 2;

        let outcome = session.battle_result(false, 2);
        assert_eq!(outcome.hp_lost, 3);
        assert_eq!(outcome.hp, 0);
        assert!(outcome.game_over);
        // The turn does not advance and no income is paid once the game
        // is over.
        assert_eq!(outcome.turn, 1);
        assert_eq!(outcome.turn_elixir, 0);
        assert_eq!(session.state.elixir, 4);
    }

    #[test]
    fn test_board_capacity_growth() {
        let mut session = session();
        assert_eq!(session.board_capacity(), 2);
        session.state.turn = 4;
        assert_eq!(session.board_capacity(), 5);
        session.state.turn = 9;
        assert_eq!(session.board_capacity(), 6);
    }

    #[test]
    fn test_board_capacity_modifiers() {
        let mut enlarged = session_with(SessionSetup {
            modifiers: vec![Modifier::PlusOnEstDeFous],
            ..Default::default()
        });
        enlarged.state.turn = 9;
        assert_eq!(enlarged.board_capacity(), 7);

        let mut fixed = session_with(SessionSetup {
            modifiers: vec![Modifier::LaFete, Modifier::PlusOnEstDeFous],
            ..Default::default()
        });
        assert_eq!(fixed.board_capacity(), 6);
        fixed.state.turn = 9;
        assert_eq!(fixed.board_capacity(), 6);
    }

    #[test]
    fn test_interest_accrues_and_pays_next_turn() {
        let mut session = session_with(SessionSetup {
            modifiers: vec![Modifier::DePlusEnPlusRiche],
            initial_elixir: Some(6),
            ..Default::default()
        });

        let outcome = session.battle_result(true, 0);
        // First advance: no interest owed yet, 6 / 2 = 3 accrued.
        assert_eq!(outcome.turn_elixir, 4);
        assert_eq!(session.pending.interest, 3);
        assert_eq!(session.state.elixir, 10);

        let outcome = session.battle_result(true, 0);
        assert_eq!(outcome.turn_elixir, 7);
        assert_eq!(session.state.elixir, 17);
        // Fresh interest from the pre-income balance of 10.
        assert_eq!(session.pending.interest, 5);
    }

    #[test]
    fn test_extractor_stock_accrues_each_turn() {
        let mut session = session_with(SessionSetup {
            modifiers: vec![Modifier::ExtracteurElixir],
            ..Default::default()
        });

        let outcome = session.battle_result(true, 0);
        assert_eq!(outcome.turn_elixir, 4);
        assert_eq!(session.pending.extractor_stock, 2);

        let outcome = session.battle_result(true, 0);
        assert_eq!(outcome.turn_elixir, 6);
        assert_eq!(session.pending.extractor_stock, 2);
    }

    #[test]
    fn test_clairvoyance_pays_on_empty_bench() {
        let mut session = session_with(SessionSetup {
            modifiers: vec![Modifier::Clairvoyance],
            ..Default::default()
        });
        let outcome = session.battle_result(true, 0);
        assert_eq!(outcome.turn_elixir, 6);

        session.state.bench.push(Card::sample("Gobelins", 1));
        let outcome = session.battle_result(true, 0);
        assert_eq!(outcome.turn_elixir, 4);
    }

    #[test]
    fn test_gobelin_bonus_defers_elixir() {
        let mut session = session();
        // Two unique Gobelin troops activate the tier-2 family bonus.
        session.state.board = vec![
            Card::sample("Gobelins", 1),
            Card::sample("Machine gobeline", 1),
        ];

        session.battle_result(true, 0);
        assert_eq!(session.pending.family_bonus, 2);
        let outcome = session.battle_result(true, 0);
        assert_eq!(outcome.turn_elixir, 4 + 2);
    }

    #[test]
    fn test_mirror_copies_rightmost_bench_troop() {
        let mut session = session_with(SessionSetup {
            modifiers: vec![Modifier::MiroirMagique],
            ..Default::default()
        });
        session.state.bench = vec![Card::sample("Prince", 2)];

        session.battle_result(true, 0);
        assert_eq!(session.state.bench.len(), 2);
        // The copy always arrives at level 1.
        assert_eq!(session.state.bench[1].name, "Prince");
        assert_eq!(session.state.bench[1].level, 1);
    }

    #[test]
    fn test_ascension_upgrades_on_turn_three() {
        let mut session = session_with(SessionSetup {
            modifiers: vec![Modifier::Ascension],
            ..Default::default()
        });
        session.state.bench = vec![Card::sample("Gobelins", 1), Card::sample("Prince", 1)];

        session.battle_result(true, 0); // Turn 2.
        assert_eq!(session.state.bench[1].level, 1);
        session.battle_result(true, 0); // Turn 3.
        assert_eq!(session.state.bench[1].level, 3);
        assert_eq!(session.state.bench[0].level, 1);
    }

    #[test]
    fn test_first_buy_free_modifier() {
        let mut session = session_with(SessionSetup {
            modifiers: vec![Modifier::CadeauDeLaMaison],
            ..Default::default()
        });

        let outcome = session.buy_card("Reine", 1).unwrap();
        assert_eq!(outcome.cost_paid, 0);
        assert_eq!(session.state.elixir, 4);

        // The second purchase of the round is charged normally.
        let result = session.buy_card("Reine", 1);
        assert!(result.is_err());

        // A turn advance resets the free purchase.
        session.battle_result(true, 0);
        let outcome = session.buy_card("Reine", 1).unwrap();
        assert_eq!(outcome.cost_paid, 0);
    }

    #[test]
    fn test_first_buy_upgraded_modifier() {
        let mut session = session_with(SessionSetup {
            modifiers: vec![Modifier::PremierChoix],
            ..Default::default()
        });
        let outcome = session.buy_card("Gobelins", 1).unwrap();
        assert_eq!(outcome.card.level, 2);
        let outcome = session.buy_card("Gobelins", 1).unwrap();
        assert_eq!(outcome.card.level, 1);
    }

    #[test]
    fn test_starting_card_decision() {
        let mut session = session_with(SessionSetup {
            modifiers: vec![Modifier::EtoileRare],
            ..Default::default()
        });
        assert_eq!(session.decisions.len(), 1);
        let id = session.decisions[0].id;

        // A troop of the wrong cost is rejected and the decision stays.
        let result = session.resolve_decision(id, DecisionAnswer::Card("Reine".to_string()));
        assert!(result.is_err());
        assert_eq!(session.decisions.len(), 1);

        session
            .resolve_decision(id, DecisionAnswer::Card("Chevalier".to_string()))
            .unwrap();
        assert!(session.decisions.is_empty());
        assert_eq!(session.state.board.len(), 1);
        assert_eq!(session.state.board[0].level, 2);
    }

    #[test]
    fn test_starting_card_survives_turn_advance() {
        let mut session = session_with(SessionSetup {
            modifiers: vec![Modifier::EtoileRare],
            ..Default::default()
        });
        session.battle_result(true, 0);
        assert_eq!(session.decisions.len(), 1);
        assert!(matches!(
            session.decisions[0].kind,
            DecisionKind::StartingCard { cost: 2 }
        ));
    }

    #[test]
    fn test_heritage_decision_pays_on_yes() {
        let mut session = session_with(SessionSetup {
            modifiers: vec![Modifier::Heritage],
            ..Default::default()
        });
        session.battle_result(true, 0);
        let id = session.decisions[0].id;

        let before = session.state.elixir;
        session.resolve_decision(id, DecisionAnswer::Flag(true)).unwrap();
        assert_eq!(session.state.elixir, before + 5);
        assert!(session.decisions.is_empty());
    }

    #[test]
    fn test_decision_dismissed_on_no() {
        let mut session = session_with(SessionSetup {
            modifiers: vec![Modifier::Heritage],
            ..Default::default()
        });
        session.battle_result(true, 0);
        let id = session.decisions[0].id;

        let before = session.state.elixir;
        session.resolve_decision(id, DecisionAnswer::Flag(false)).unwrap();
        assert_eq!(session.state.elixir, before);
        assert!(session.decisions.is_empty());
    }

    #[test]
    fn test_enemy_copy_is_one_time() {
        let mut session = session_with(SessionSetup {
            modifiers: vec![Modifier::TuEsAMoi],
            ..Default::default()
        });

        session.battle_result(false, 0);
        let copy = session
            .decisions
            .iter()
            .find(|d| d.kind == DecisionKind::EnemyCopy)
            .map(|d| d.id)
            .unwrap();
        session
            .resolve_decision(copy, DecisionAnswer::Card("Barbares".to_string()))
            .unwrap();
        assert_eq!(session.state.bench.len(), 1);

        // Later losses no longer offer a copy.
        session.battle_result(false, 0);
        assert!(session
            .decisions
            .iter()
            .all(|d| d.kind != DecisionKind::EnemyCopy));
    }

    #[test]
    fn test_recommend_tie_break_keeps_first() {
        let session = session();
        let offers = vec![
            ("Gobelins".to_string(), 1),
            ("Gobelins".to_string(), 1),
        ];
        let recommendations = session.recommend(&offers).unwrap();
        assert_eq!(recommendations.best, Some(0));
        assert_eq!(recommendations.ranked[0].total, recommendations.ranked[1].total);
    }

    #[test]
    fn test_recommend_prefers_affordable() {
        let session = session_with(SessionSetup {
            initial_elixir: Some(2),
            initial_card: Some("Reine".to_string()),
            ..Default::default()
        });
        // Reine matches a board copy for merge and fusion-sell bonuses,
        // but costs more than the balance; the cheap Gobelins wins.
        let offers = vec![("Reine".to_string(), 1), ("Gobelins".to_string(), 1)];
        let recommendations = session.recommend(&offers).unwrap();
        assert_eq!(recommendations.best, Some(1));
        assert!(recommendations.ranked[0].card.name == "Reine");
        assert!(!recommendations.ranked[0].affordable);
    }

    #[test]
    fn test_recommend_none_affordable() {
        let session = session_with(SessionSetup {
            initial_elixir: Some(0),
            ..Default::default()
        });
        let offers = vec![("Reine".to_string(), 1)];
        let recommendations = session.recommend(&offers).unwrap();
        assert_eq!(recommendations.best, None);
        assert_eq!(recommendations.ranked.len(), 1);
    }

    #[test]
    fn test_recommend_rejects_empty_offers() {
        let session = session();
        assert!(session.recommend(&[]).is_err());
        assert!(session
            .recommend(&[("Missingno".to_string(), 1)])
            .is_err());
    }

    #[test]
    fn test_snapshot_reports_family_bonuses() {
        let mut session = session();
        session.state.board = vec![
            Card::sample("Chevalier", 1),
            Card::sample("Prince", 1),
            Card::sample("Archères", 1),
        ];

        let snapshot = session.snapshot();
        let noble = snapshot
            .family_bonuses
            .iter()
            .find(|b| b.family == Family::Noble)
            .unwrap();
        assert!(noble.active);
        assert_eq!(noble.tier, 2);
        assert_eq!(noble.count, 2);

        // Families below threshold are reported inactive with their
        // counts.
        let clan = snapshot
            .family_bonuses
            .iter()
            .find(|b| b.family == Family::Clan)
            .unwrap();
        assert!(!clan.active);
        assert_eq!(clan.count, 1);
        // Active bonuses sort ahead of inactive ones.
        assert!(snapshot.family_bonuses[0].active);
    }
}
