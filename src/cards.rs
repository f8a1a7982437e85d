use std::collections::HashMap;
use std::sync::OnceLock;

/// Trait tags carried by troops. Accumulating unique troops sharing a
/// tag on the board unlocks tiered family bonuses. Serialized under the
/// French names the game uses.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub enum Family {
    Noble,
    Clan,
    Gobelin,
    Revenant,
    Ace,
    Colosse,
    Bagarreur,
    Assassin,
    Guetteur,
    Vengeuse,
    Lanceur,
}

/// Level cap. Level-5 troops never take part in another merge.
pub const MAX_LEVEL: u32 = 5;

/// One troop instance. Cost and traits are fixed per name by the
/// catalog; only the level varies between copies.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Card {
    pub name: String,
    pub cost: u32,
    pub traits: Vec<Family>,
    pub level: u32,
}

impl Card {
    /// Whether this card forms a merge stack with the given name and
    /// level. Cards are interchangeable for merges iff both match.
    pub fn matches(&self, name: &str, level: u32) -> bool {
        self.name == name && self.level == level
    }

    /// A copy of this card one level higher. Always build a fresh card
    /// rather than bumping `level` on a shared instance.
    pub fn upgraded(&self) -> Card {
        Card {
            level: self.level + 1,
            ..self.clone()
        }
    }

    /// A copy of this card at a different level.
    pub fn at_level(&self, level: u32) -> Card {
        Card {
            level,
            ..self.clone()
        }
    }

    #[cfg(test)]
    pub fn sample(name: &str, level: u32) -> Self {
        catalog()
            .get(name)
            .unwrap_or_else(|| panic!("No such troop in the catalog: {name}"))
            .at_level(level)
    }
}

pub struct CardCatalog {
    /// Map from lowercased troop name to its base definition.
    name_to_card: HashMap<String, Card>,
}

impl CardCatalog {
    fn new() -> Self {
        Self {
            name_to_card: HashMap::new(),
        }
    }

    fn add(&mut self, card: Card) {
        let key = card.name.to_lowercase();
        self.name_to_card.insert(key, card);
    }

    pub fn get(&self, name: &str) -> Option<&Card> {
        self.name_to_card.get(&name.to_lowercase())
    }

    /// Instantiate a troop by name at the given level.
    pub fn card(&self, name: &str, level: u32) -> crate::Res<Card> {
        if level < 1 || level > MAX_LEVEL {
            return crate::err(format!("Invalid troop level: {level}."));
        }
        match self.get(name) {
            Some(base) => Ok(base.at_level(level)),
            None => crate::not_found(format!("Troop {name}")),
        }
    }

    pub fn size(&self) -> usize {
        self.name_to_card.len()
    }

    /// All troops, sorted by cost then name for stable listings.
    pub fn all(&self) -> Vec<&Card> {
        let mut cards: Vec<&Card> = self.name_to_card.values().collect();
        cards.sort_by(|a, b| a.cost.cmp(&b.cost).then_with(|| a.name.cmp(&b.name)));
        cards
    }
}

/// The fixed Merge Tactics roster: 20 troops costing 2 to 5 elixir,
/// each carrying two trait tags.
const ROSTER: &[(&str, u32, [Family; 2])] = &[
    ("Chevalier", 2, [Family::Noble, Family::Colosse]),
    ("Archères", 2, [Family::Clan, Family::Guetteur]),
    ("Gobelins", 2, [Family::Gobelin, Family::Assassin]),
    ("Gobelins à lances", 2, [Family::Gobelin, Family::Lanceur]),
    ("Bombardier", 2, [Family::Revenant, Family::Lanceur]),
    ("Barbares", 2, [Family::Clan, Family::Bagarreur]),
    ("Valkyrie", 3, [Family::Clan, Family::Vengeuse]),
    ("P.E.K.K.A", 3, [Family::Ace, Family::Colosse]),
    ("Prince", 3, [Family::Noble, Family::Bagarreur]),
    ("Squelette géant", 3, [Family::Revenant, Family::Bagarreur]),
    ("Gobelin à sarbacane", 3, [Family::Gobelin, Family::Guetteur]),
    ("Bourreau", 3, [Family::Ace, Family::Lanceur]),
    ("Princesse", 4, [Family::Noble, Family::Guetteur]),
    ("Mega chevalier", 4, [Family::Ace, Family::Bagarreur]),
    ("Fantome royal", 4, [Family::Revenant, Family::Assassin]),
    ("Voleuse", 4, [Family::Ace, Family::Vengeuse]),
    ("Machine gobeline", 4, [Family::Gobelin, Family::Colosse]),
    ("Roi squelette", 5, [Family::Revenant, Family::Colosse]),
    ("Chevalier d'or", 5, [Family::Noble, Family::Assassin]),
    ("Reine", 5, [Family::Clan, Family::Vengeuse]),
];

/// The shared troop catalog. Read-only after initialization.
pub fn catalog() -> &'static CardCatalog {
    static CATALOG: OnceLock<CardCatalog> = OnceLock::new();

    CATALOG.get_or_init(|| {
        let mut catalog = CardCatalog::new();
        for &(name, cost, traits) in ROSTER {
            catalog.add(Card {
                name: name.to_string(),
                cost,
                traits: traits.to_vec(),
                level: 1,
            });
        }
        catalog
    })
}
