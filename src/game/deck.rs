//! The hider's deck: draw pile, hand and discard pile.
//!
//! Cards only ever move between the three piles, so their union is always
//! the deck the game was built with. Draws pick uniformly at random from the
//! draw pile; when it runs short the discard pile is shuffled back in.

use std::collections::BTreeSet;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::catalog::{Card, CardKind, Powerup, standard_deck};
use crate::error::{GameError, suggestion_suffix};
use crate::frontend::Frontend;

/// Cards moved by a reward negotiation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewardOutcome {
    /// Cards put into the hand
    pub kept: Vec<Card>,
    /// Cards sent to the discard pile
    pub returned: Vec<Card>,
    /// The frontend did not produce a valid choice in time
    pub timed_out: bool,
}

/// Result of playing a card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayOutcome {
    /// The card played
    pub card: Card,
    /// Cards discarded as part of the effect
    pub discarded: Vec<Card>,
    /// Cards drawn as part of the effect
    pub drawn: Vec<Card>,
    /// The hider's choice fell back to the default
    pub timed_out: bool,
}

/// Draw pile, hand and discard pile of the hider.
#[derive(Debug, Clone)]
pub struct HiderDeck {
    draw_pile: Vec<Card>,
    hand: Vec<Card>,
    discard_pile: Vec<Card>,
    max_hand_size: usize,
    rng: StdRng,
}

impl HiderDeck {
    /// Creates a deck with every card in the draw pile.
    #[must_use]
    pub const fn new(cards: Vec<Card>, max_hand_size: usize, rng: StdRng) -> Self {
        Self {
            draw_pile: cards,
            hand: Vec::new(),
            discard_pile: Vec::new(),
            max_hand_size,
            rng,
        }
    }

    /// Creates the standard deck.
    #[must_use]
    pub fn standard(max_hand_size: usize, rng: StdRng) -> Self {
        Self::new(standard_deck(), max_hand_size, rng)
    }

    /// Creates the standard deck with a deterministic shuffle.
    #[must_use]
    pub fn seeded(max_hand_size: usize, seed: u64) -> Self {
        Self::standard(max_hand_size, StdRng::seed_from_u64(seed))
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Cards in hand, in the order they were received.
    #[must_use]
    pub fn hand(&self) -> &[Card] {
        &self.hand
    }

    /// Current hand limit.
    #[must_use]
    pub const fn max_hand_size(&self) -> usize {
        self.max_hand_size
    }

    /// Cards left to draw.
    #[must_use]
    pub fn draw_pile_len(&self) -> usize {
        self.draw_pile.len()
    }

    /// Cards in the discard pile.
    #[must_use]
    pub fn discard_pile_len(&self) -> usize {
        self.discard_pile.len()
    }

    /// Every card the deck holds, across all three piles.
    #[must_use]
    pub fn all_cards(&self) -> Vec<Card> {
        self.draw_pile
            .iter()
            .chain(&self.hand)
            .chain(&self.discard_pile)
            .cloned()
            .collect()
    }

    /// Hand size is within the limit.
    #[must_use]
    pub fn is_legal_hand(&self) -> bool {
        self.hand.len() <= self.max_hand_size
    }

    /// Seconds of time bonus held in hand.
    #[must_use]
    pub fn count_time_bonuses(&self) -> i64 {
        self.hand.iter().map(Card::time_bonus_secs).sum()
    }

    // ========================================================================
    // Drawing
    // ========================================================================

    /// Moves one random card from the draw pile into the hand.
    ///
    /// Returns `None` when every card is already in hand.
    pub fn draw(&mut self) -> Option<Card> {
        let card = self.take_from_pile(1).pop()?;
        self.hand.push(card.clone());
        Some(card)
    }

    /// Draws up to `n` cards into the hand.
    pub fn draw_many(&mut self, n: usize) -> Vec<Card> {
        let cards = self.take_from_pile(n);
        self.hand.extend(cards.iter().cloned());
        cards
    }

    fn take_from_pile(&mut self, n: usize) -> Vec<Card> {
        if self.draw_pile.len() < n && !self.discard_pile.is_empty() {
            debug!(
                draw_pile = self.draw_pile.len(),
                discard_pile = self.discard_pile.len(),
                "recycling discard pile"
            );
            self.draw_pile.append(&mut self.discard_pile);
        }
        let n = n.min(self.draw_pile.len());
        (0..n)
            .map(|_| {
                let i = self.rng.random_range(0..self.draw_pile.len());
                self.draw_pile.swap_remove(i)
            })
            .collect()
    }

    /// Draws `draw` cards, lets the hider keep `keep` of them and discards
    /// the rest.
    ///
    /// The frontend gets `timeout` to answer. On timeout, error or an invalid
    /// choice the first `keep` cards are kept and the outcome is flagged.
    pub async fn reward(
        &mut self,
        draw: usize,
        keep: usize,
        frontend: &dyn Frontend,
        timeout: Duration,
    ) -> RewardOutcome {
        let mut candidates = self.take_from_pile(draw);
        let keep = keep.min(candidates.len());
        if candidates.is_empty() {
            warn!(draw, "no cards left to draw");
            return RewardOutcome::default();
        }

        let reason = format!("Keep {keep} of {} drawn cards", candidates.len());
        let (indices, timed_out) = if keep == candidates.len() {
            ((0..keep).collect(), false)
        } else {
            choose(frontend, &candidates, keep, &reason, timeout).await
        };

        let kept = extract(&mut candidates, &indices);
        self.hand.extend(kept.iter().cloned());
        self.discard_pile.extend(candidates.iter().cloned());

        RewardOutcome {
            kept,
            returned: candidates,
            timed_out,
        }
    }

    // ========================================================================
    // Playing and discarding
    // ========================================================================

    /// Finds a card in hand by name (case-insensitive) or by its one-based
    /// position in the hand.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::CardNotPlayable`] if nothing in hand matches,
    /// with a suggestion when a hand card has a similar name.
    pub fn find_in_hand(&self, name: &str) -> Result<usize, GameError> {
        let name = name.trim();
        if let Some(i) = self
            .hand
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
        {
            return Ok(i);
        }
        if let Ok(pos) = name.parse::<usize>() {
            if (1..=self.hand.len()).contains(&pos) {
                return Ok(pos - 1);
            }
        }

        let suggestion = self
            .hand
            .iter()
            .map(|c| {
                (
                    c.name.as_str(),
                    strsim::damerau_levenshtein(&name.to_lowercase(), &c.name.to_lowercase()),
                )
            })
            .filter(|(_, dist)| *dist <= 3)
            .min_by_key(|(_, dist)| *dist)
            .map(|(n, _)| n);
        Err(GameError::CardNotPlayable {
            card: name.to_string(),
            reason: format!("not in hand{}", suggestion_suffix(suggestion)),
        })
    }

    /// Plays a card from hand and resolves its effect.
    ///
    /// Curses are announced with `announce_curse`, other cards flagged to
    /// inform the seekers with `announce_card_played`. The card ends in the
    /// discard pile. The caller re-checks hand legality afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::CardNotPlayable`] if the card is not in hand,
    /// is a time bonus, or needs more cards in hand than are available.
    pub async fn play(
        &mut self,
        name: &str,
        frontend: &dyn Frontend,
        timeout: Duration,
    ) -> Result<PlayOutcome, GameError> {
        let index = self.find_in_hand(name)?;
        let card = self.hand[index].clone();

        match card.kind {
            CardKind::TimeBonus { .. } => {
                return Err(GameError::CardNotPlayable {
                    card: card.name,
                    reason: "time bonuses are held until the hider is caught".to_string(),
                });
            }
            CardKind::Powerup {
                powerup: Powerup::DiscardDraw { discard, .. },
            } if self.hand.len() - 1 < discard => {
                return Err(GameError::CardNotPlayable {
                    card: card.name,
                    reason: format!("needs {discard} other card(s) in hand to discard"),
                });
            }
            _ => {}
        }

        self.hand.remove(index);
        let mut outcome = PlayOutcome {
            card: card.clone(),
            discarded: Vec::new(),
            drawn: Vec::new(),
            timed_out: false,
        };

        match card.kind {
            CardKind::Powerup {
                powerup: Powerup::DiscardDraw { discard, draw },
            } => {
                let reason = format!("Choose {discard} card(s) to discard");
                let (indices, timed_out) =
                    choose(frontend, &self.hand, discard, &reason, timeout).await;
                outcome.discarded = extract(&mut self.hand, &indices);
                outcome.timed_out = timed_out;
                self.discard_pile.extend(outcome.discarded.iter().cloned());
                outcome.drawn = self.draw_many(draw);
            }
            CardKind::Powerup {
                powerup: Powerup::DrawExpand { draw, expand },
            } => {
                self.max_hand_size += expand;
                outcome.drawn = self.draw_many(draw);
            }
            _ => {}
        }

        if card.is_curse() {
            frontend.announce_curse(&card).await;
        } else if card.inform_seekers() {
            frontend.announce_card_played(&card).await;
        }

        self.discard_pile.push(card);
        Ok(outcome)
    }

    /// Moves a card from hand to the discard pile.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::CardNotPlayable`] if the card is not in hand.
    pub fn discard(&mut self, name: &str) -> Result<Card, GameError> {
        let index = self.find_in_hand(name)?;
        let card = self.hand.remove(index);
        self.discard_pile.push(card.clone());
        Ok(card)
    }
}

/// Asks the frontend for `num` of `candidates`, falling back to the first
/// `num` when the answer is late, failed or invalid.
async fn choose(
    frontend: &dyn Frontend,
    candidates: &[Card],
    num: usize,
    reason: &str,
    timeout: Duration,
) -> (Vec<usize>, bool) {
    let fallback = || (0..num.min(candidates.len())).collect::<Vec<_>>();
    match tokio::time::timeout(timeout, frontend.select_cards(candidates, num, reason)).await {
        Ok(Ok(indices)) => match validate_selection(&indices, candidates.len(), num) {
            Some(valid) => (valid, false),
            None => {
                warn!(?indices, num, "invalid card selection, keeping the first cards");
                (fallback(), true)
            }
        },
        Ok(Err(e)) => {
            warn!(error = %e, "card selection failed, keeping the first cards");
            (fallback(), true)
        }
        Err(_) => {
            warn!(?timeout, "card selection timed out, keeping the first cards");
            (fallback(), true)
        }
    }
}

/// Deduplicates and range-checks a selection. Returns `None` unless exactly
/// `num` distinct in-range indices remain.
fn validate_selection(indices: &[usize], len: usize, num: usize) -> Option<Vec<usize>> {
    let unique: BTreeSet<usize> = indices.iter().copied().collect();
    if unique.len() != num || unique.iter().any(|&i| i >= len) {
        return None;
    }
    Some(unique.into_iter().collect())
}

/// Removes the cards at `indices` (sorted, distinct) from `cards`.
fn extract(cards: &mut Vec<Card>, indices: &[usize]) -> Vec<Card> {
    let mut picked = Vec::with_capacity(indices.len());
    for &i in indices.iter().rev() {
        picked.push(cards.remove(i));
    }
    picked.reverse();
    picked
}
