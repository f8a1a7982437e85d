/// Events that can trigger a leader's elixir bonus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LeaderEvent {
    Merge,
    Defeat,
}

/// A per-session leader granting event-triggered elixir. A bonus of 0
/// means the leader ignores that event.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct Leader {
    pub name: &'static str,
    pub description: &'static str,
    pub bonus_on_merge: u32,
    pub bonus_on_defeat: u32,
}

impl Leader {
    pub fn bonus_for(&self, event: LeaderEvent) -> u32 {
        match event {
            LeaderEvent::Merge => self.bonus_on_merge,
            LeaderEvent::Defeat => self.bonus_on_defeat,
        }
    }
}

pub const LEADERS: &[Leader] = &[
    Leader {
        name: "Impératrice",
        description: "Gains +1 elixir on every successful merge.",
        bonus_on_merge: 1,
        bonus_on_defeat: 0,
    },
    Leader {
        name: "Roi Royal",
        description: "Gains +4 elixir on every defeat.",
        bonus_on_merge: 0,
        bonus_on_defeat: 4,
    },
];

pub fn leader_by_name(name: &str) -> Option<&'static Leader> {
    LEADERS.iter().find(|leader| leader.name == name)
}

/// Pre-game rule changes picked before the first round. Each tag is a
/// fixed, named transformation of the session configuration or a
/// recurring per-turn effect; there is no per-command branching beyond
/// the lookups in the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
    PleinLesPoches,
    PlusOnEstDeFous,
    Heritage,
    LaFete,
    EtoileRare,
    EtoileEpique,
    EtoileLegendaire,
    EtoileDeChampion,
    DePlusEnPlusRiche,
    FievreDuFight,
    MoinsCestMieux,
    Aie,
    TuEsAMoi,
    ExtracteurElixir,
    CadeauDeLaMaison,
    #[serde(rename = "4_etoiles")]
    QuatreEtoiles,
    MiroirMagique,
    BancDePandore,
    ResterEnVie,
    MannequinSpecial,
    Cheate,
    OffreASaisir,
    Clairvoyance,
    Promotion,
    BonneAffaire,
    Ascension,
    PremierChoix,
}

impl Modifier {
    pub const ALL: [Modifier; 27] = [
        Modifier::PleinLesPoches,
        Modifier::PlusOnEstDeFous,
        Modifier::Heritage,
        Modifier::LaFete,
        Modifier::EtoileRare,
        Modifier::EtoileEpique,
        Modifier::EtoileLegendaire,
        Modifier::EtoileDeChampion,
        Modifier::DePlusEnPlusRiche,
        Modifier::FievreDuFight,
        Modifier::MoinsCestMieux,
        Modifier::Aie,
        Modifier::TuEsAMoi,
        Modifier::ExtracteurElixir,
        Modifier::CadeauDeLaMaison,
        Modifier::QuatreEtoiles,
        Modifier::MiroirMagique,
        Modifier::BancDePandore,
        Modifier::ResterEnVie,
        Modifier::MannequinSpecial,
        Modifier::Cheate,
        Modifier::OffreASaisir,
        Modifier::Clairvoyance,
        Modifier::Promotion,
        Modifier::BonneAffaire,
        Modifier::Ascension,
        Modifier::PremierChoix,
    ];

    pub fn description(self) -> &'static str {
        match self {
            Modifier::PleinLesPoches => "Every leader starts with +5 elixir.",
            Modifier::PlusOnEstDeFous => "Team size raised by 1, up to 7 troops.",
            Modifier::Heritage => "Gain +5 elixir when an enemy leader dies.",
            Modifier::LaFete => "Team size is always 6.",
            Modifier::EtoileRare => "Start with a 2-star troop costing 2 elixir.",
            Modifier::EtoileEpique => "Start with a 2-star troop costing 3 elixir.",
            Modifier::EtoileLegendaire => "Start with a 2-star troop costing 4 elixir.",
            Modifier::EtoileDeChampion => "Start with a 2-star troop costing 5 elixir.",
            Modifier::DePlusEnPlusRiche => {
                "Every 2 elixir held earns +1 elixir of interest next round."
            }
            Modifier::FievreDuFight => {
                "Troops gain +100% hit speed for 6s after eliminating an enemy."
            }
            Modifier::MoinsCestMieux => {
                "With fewer troops than the enemy, the team gains +25% HP and hit speed."
            }
            Modifier::Aie => "Front-row troops reflect 40% of the damage they take.",
            Modifier::TuEsAMoi => {
                "Gain a 1-star copy of the first enemy troop eliminated."
            }
            Modifier::ExtracteurElixir => {
                "An extractor generates 2 elixir per round, stored until paid out."
            }
            Modifier::CadeauDeLaMaison => "The first troop bought each round is free.",
            Modifier::QuatreEtoiles => {
                "The troop selection is doubled: more choices in the shop."
            }
            Modifier::MiroirMagique => {
                "Each round, gain a 1-star copy of the rightmost bench troop."
            }
            Modifier::BancDePandore => {
                "Each round, a bench troop is replaced by a random troop of the same cost."
            }
            Modifier::ResterEnVie => {
                "Start with a mannequin; gain +1 elixir when it survives the round."
            }
            Modifier::MannequinSpecial => "Start with a mannequin carrying 2 random attributes.",
            Modifier::Cheate => "Each round, gain a troop useful to the team.",
            Modifier::OffreASaisir => {
                "Each shop reset, one random troop costs 1 elixir less."
            }
            Modifier::Clairvoyance => "With an empty bench, gain +2 elixir next round.",
            Modifier::Promotion => {
                "Each round, the rightmost bench troop becomes a troop worth 1 elixir more."
            }
            Modifier::BonneAffaire => "Each troop sold earns +1 elixir next round.",
            Modifier::Ascension => {
                "On round 3, the rightmost bench troop becomes a powerful 3-star troop."
            }
            Modifier::PremierChoix => "The first troop bought each round is a 2-star.",
        }
    }

    /// Cost of the 2-star starting troop granted by the star modifiers,
    /// if this is one of them.
    pub fn start_card_cost(self) -> Option<u32> {
        match self {
            Modifier::EtoileRare => Some(2),
            Modifier::EtoileEpique => Some(3),
            Modifier::EtoileLegendaire => Some(4),
            Modifier::EtoileDeChampion => Some(5),
            _ => None,
        }
    }
}
