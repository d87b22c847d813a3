//! Hider card definitions and the standard deck.
//!
//! Cards are immutable values. Copies of the same card compare equal, which is
//! why selections and hand lookups work on positions and names rather than on
//! card identity.

use serde::Serialize;

// ============================================================================
// Card Types
// ============================================================================

/// A single hider card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Card {
    /// Display name, unique per distinct card
    pub name: String,
    /// What the card does
    #[serde(flatten)]
    pub kind: CardKind,
}

/// The three card families.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CardKind {
    /// Extra hiding time counted when the hider is caught
    TimeBonus {
        /// Bonus in minutes
        minutes: u32,
    },
    /// One-shot effect played by the hider
    Powerup {
        /// Which powerup
        powerup: Powerup,
    },
    /// Obstacle imposed on the seekers
    Curse {
        /// What the seekers must do
        effect: &'static str,
        /// What the hider must pay to cast it
        cost: &'static str,
    },
}

/// Powerup effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Powerup {
    /// Replace the current question with a random one of the same family
    Randomise,
    /// Refuse to answer the current question
    Veto,
    /// Play as a copy of another card in hand
    Duplicate,
    /// Discard cards from hand, then draw replacements
    DiscardDraw {
        /// Cards to discard
        discard: usize,
        /// Cards to draw afterwards
        draw: usize,
    },
    /// Draw cards and raise the hand limit permanently
    DrawExpand {
        /// Cards to draw
        draw: usize,
        /// Hand limit increase
        expand: usize,
    },
}

impl Powerup {
    /// Display name of the powerup card.
    #[must_use]
    pub fn card_name(self) -> String {
        match self {
            Self::Randomise => "Randomise Question".to_string(),
            Self::Veto => "Veto Question".to_string(),
            Self::Duplicate => "Duplicate Card".to_string(),
            Self::DiscardDraw { discard, draw } => format!("Discard {discard}, Draw {draw}"),
            Self::DrawExpand { draw, expand } => {
                format!("Draw {draw}, Expand Max Hand Size by {expand}")
            }
        }
    }

    /// Returns `true` if the seekers are told when this is played.
    #[must_use]
    pub const fn inform_seekers(self) -> bool {
        matches!(self, Self::Randomise | Self::Veto)
    }
}

impl Card {
    /// Creates a time bonus card worth `minutes`.
    #[must_use]
    pub fn time_bonus(minutes: u32) -> Self {
        Self {
            name: format!("{minutes} Minute Time Bonus"),
            kind: CardKind::TimeBonus { minutes },
        }
    }

    /// Creates a powerup card.
    #[must_use]
    pub fn powerup(powerup: Powerup) -> Self {
        Self {
            name: powerup.card_name(),
            kind: CardKind::Powerup { powerup },
        }
    }

    /// Creates a curse card.
    #[must_use]
    pub fn curse(name: &str, effect: &'static str, cost: &'static str) -> Self {
        Self {
            name: name.to_string(),
            kind: CardKind::Curse { effect, cost },
        }
    }

    /// Returns `true` if playing this card must be announced to the seekers.
    #[must_use]
    pub const fn inform_seekers(&self) -> bool {
        match &self.kind {
            CardKind::TimeBonus { .. } => false,
            CardKind::Powerup { powerup } => powerup.inform_seekers(),
            CardKind::Curse { .. } => true,
        }
    }

    /// Time bonus carried by this card in seconds (zero for non-bonus cards).
    #[must_use]
    pub fn time_bonus_secs(&self) -> i64 {
        match self.kind {
            CardKind::TimeBonus { minutes } => i64::from(minutes) * 60,
            _ => 0,
        }
    }

    /// Returns `true` for curse cards.
    #[must_use]
    pub const fn is_curse(&self) -> bool {
        matches!(self.kind, CardKind::Curse { .. })
    }

    /// Short family label used in listings and metrics.
    #[must_use]
    pub const fn family(&self) -> &'static str {
        match self.kind {
            CardKind::TimeBonus { .. } => "time_bonus",
            CardKind::Powerup { .. } => "powerup",
            CardKind::Curse { .. } => "curse",
        }
    }
}

impl std::fmt::Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

// ============================================================================
// Standard Deck
// ============================================================================

const CURSES: &[(&str, &str, &str)] = &[
    (
        "Curse of the Zoologist",
        "Take a photo of a wild fish, bird, mammal, reptile, amphibian or bug. The seekers must take a picture of a wild animal in the same category before asking another question.",
        "A photo of an animal",
    ),
    (
        "Curse of the Unguided Tourist",
        "Send the seekers an unzoomed street-level image from a street within 150m of where they are now. The shot must be parallel to the horizon and include at least one human-built structure other than a road. Without using the internet for research, they must find it in real life before they can use transportation or ask another question, and send a picture back for verification.",
        "Seekers must be outside",
    ),
    (
        "Curse of the Endless Tumble",
        "Seekers must roll a die at least 30m and have it land on a 5 or a 6 before they can ask another question. The die must roll the full distance unaided. If the seekers hit someone with the die the hider is awarded a 20 minute bonus.",
        "Roll a die. On a 5 or 6 this card has no effect.",
    ),
    (
        "Curse of the Hidden Hangman",
        "Before asking another question or boarding another form of transportation, the seekers must beat the hider in a game of hangman.",
        "Discard 2 cards",
    ),
    (
        "Curse of the Overflowing Chalice",
        "For the next three questions, the hider may draw (not keep) an additional card when drawing from the hider deck.",
        "Discard a card",
    ),
    (
        "Curse of the Mediocre Travel Agent",
        "Choose any publicly-accessible place within 400m of the seekers. They must go there and spend at least 5 minutes there before asking another question, send at least three photos of them enjoying their vacation, and bring a souvenir. If the souvenir is lost the hider is awarded an extra 45 minutes.",
        "Seekers must not currently be on transit.",
    ),
    (
        "Curse of the Luxury Car",
        "Take a photo of a car. The seekers must take a photo of a more expensive car before asking another question.",
        "A photo of a car",
    ),
    (
        "Curse of the U-Turn",
        "Seekers must disembark their current mode of transportation at the next station, as long as that station is served by another form of transit within the next hour.",
        "Seekers must be heading the wrong way (their next station is further from you than they are).",
    ),
    (
        "Curse of the Bridge Troll",
        "The seekers must ask their next question from under a bridge.",
        "Seekers must be at least 1.5km from you",
    ),
    (
        "Curse of the Water Weight",
        "Seekers must acquire and carry at least 2 litres of liquid per seeker for the rest of the run. They cannot ask another question until they have it. If the liquid is lost or abandoned the hider is awarded a 30 minute bonus.",
        "Seekers must be within 300 meters of a body of water",
    ),
    (
        "Curse of the Jammed Door",
        "For the next hour, whenever the seekers want to pass through a doorway into a building, business, train or other vehicle they must first roll 2 dice. Unless they roll 7 or higher they cannot enter that space. A doorway can be reattempted after 10 minutes.",
        "Discard 2 cards",
    ),
    (
        "Curse of the Cairn",
        "Stack as many rocks as you can in a freestanding tower, each standing at least 5 seconds before the next is added. Tell the seekers the height of your tower when it last stood. They must build a tower of the same height under the same rules before asking another question, restarting if it falls.",
        "Build a rock tower",
    ),
    (
        "Curse of the Urban Explorer",
        "For the rest of the run seekers cannot ask questions while on transit or in a train station.",
        "Discard 2 cards",
    ),
    (
        "Curse of the Distant Cuisine",
        "Find a restaurant within your zone that explicitly serves food from a specific foreign country. The seekers must visit a restaurant serving food from a country at an equal or greater distance before asking another question.",
        "You must be at the restaurant",
    ),
    (
        "Curse of the Right Turn",
        "For the next 40 minutes the seekers can only turn right at any street intersection. If they reach a dead end where they cannot continue forward or turn right for another 300m they must turn around.",
        "Discard a card",
    ),
    (
        "Curse of the Labyrinth",
        "Spend up to 20 minutes drawing a solvable maze and send a photo of it to the seekers. They must solve the maze before asking another question.",
        "Draw a maze",
    ),
    (
        "Curse of the Bird Guide",
        "Film a bird for as long as possible, up to 10 minutes. The timer stops when the bird leaves the frame. The seekers must then film a bird for the same amount of time or longer.",
        "Film a bird",
    ),
    (
        "Curse of the Drained Brain",
        "Choose three questions in different categories. The seekers cannot ask those questions for the rest of the run.",
        "Discard your hand",
    ),
    (
        "Curse of the Ransom Note",
        "The next question the seekers ask must be composed of words and letters cut out of printed material. It must be coherent and include at least 5 words.",
        "Spell out 'Ransom Note' as a ransom note",
    ),
    (
        "Curse of the Gambler's Feet",
        "For the next 40 minutes seekers must roll a die before they take any steps. They may take that many steps before rolling again.",
        "There is a 1/2 chance this curse is cleared immediately.",
    ),
    (
        "Curse of the Prosperous Home",
        "Expand the radius of your hiding zone by 50%.",
        "Discard at least 10 minutes worth of bonuses.",
    ),
    (
        "Curse of the Void",
        "For the next three questions the seekers ask, there is a 2/3 chance the question is automatically vetoed.",
        "Discard a veto.",
    ),
    (
        "Curse of the Express Train",
        "Seekers cannot disembark any transit for the next 20 minutes unless they reach the end of a line.",
        "Discard at least 15 minutes worth of time bonuses.",
    ),
    (
        "Curse of the Zipped Lip",
        "Seekers can only communicate with one another through gestures and closed-mouth sounds for the next 20 minutes.",
        "Discard a power-up.",
    ),
    (
        "Curse of the Plagued Word",
        "For the next hour, asking a question creates a 5km radius where questions cannot be asked until this curse expires.",
        "Seekers must be at least 25km away from you.",
    ),
    (
        "Curse of the Queue",
        "Seekers may not ask another question until they have waited in line for at least five minutes. They cannot wait in the same line twice, may not let people cut in front, and lines must have at least two people when they join.",
        "You must currently be in line somewhere.",
    ),
    (
        "Curse of the Rewind",
        "The seekers must ask their next question from the exact place they asked their last question.",
        "The last question must have been asked during the end game.",
    ),
    (
        "Curse of the Tiny Home",
        "All time bonus cards held at the end of this round are worth 50 percent extra.",
        "The radius of your hiding zone is halved. Cannot be played during the endgame.",
    ),
];

/// Distinct cards of the standard deck with their copy counts.
#[must_use]
pub fn deck_composition() -> Vec<(Card, usize)> {
    let mut composition = vec![
        (Card::time_bonus(3), 25),
        (Card::time_bonus(6), 15),
        (Card::time_bonus(9), 10),
        (Card::time_bonus(12), 3),
        (Card::time_bonus(18), 2),
        (Card::powerup(Powerup::Randomise), 4),
        (Card::powerup(Powerup::Veto), 4),
        (Card::powerup(Powerup::Duplicate), 2),
        (
            Card::powerup(Powerup::DiscardDraw {
                discard: 1,
                draw: 2,
            }),
            4,
        ),
        (
            Card::powerup(Powerup::DiscardDraw {
                discard: 2,
                draw: 3,
            }),
            4,
        ),
        (
            Card::powerup(Powerup::DrawExpand { draw: 1, expand: 1 }),
            2,
        ),
    ];
    composition.extend(
        CURSES
            .iter()
            .map(|(name, effect, cost)| (Card::curse(name, effect, cost), 1)),
    );
    composition
}

/// Every card of the standard deck, one entry per physical copy.
#[must_use]
pub fn standard_deck() -> Vec<Card> {
    deck_composition()
        .into_iter()
        .flat_map(|(card, copies)| std::iter::repeat_n(card, copies))
        .collect()
}
