use std::sync::Arc;

use crate::engine::EncryptedStore;
use crate::models::{now_ms, Deck, Flashcard};
use crate::scheduler;
use crate::Result;

/// Decks and the cards in them.
///
/// A card's `deck_id` is authoritative; the deck's `card_ids` list is kept in step
/// with it when cards are saved or deleted. [`FlashcardRepository::delete_deck`]
/// leaves the deck's cards in place; use [`FlashcardRepository::delete_deck_with_cards`]
/// to remove them too.
pub struct FlashcardRepository {
    store: Arc<EncryptedStore>,
}

impl FlashcardRepository {
    pub fn new(store: Arc<EncryptedStore>) -> Self {
        Self { store }
    }

    // Decks

    pub async fn save_deck(&self, deck: &Deck) -> Result<()> {
        self.store.save(deck).await
    }

    pub async fn get_deck(&self, id: &str) -> Result<Option<Deck>> {
        self.store.get(id).await
    }

    pub async fn get_all_decks(&self) -> Result<Vec<Deck>> {
        self.store.get_all().await
    }

    pub async fn delete_deck(&self, id: &str) -> Result<()> {
        self.store.delete::<Deck>(id).await
    }

    /// Deletes a deck and every card that belongs to it. Returns the number of cards removed.
    pub async fn delete_deck_with_cards(&self, id: &str) -> Result<usize> {
        let cards = self.get_cards_by_deck(id).await?;
        for card in &cards {
            self.delete_card(&card.id).await?;
        }
        self.delete_deck(id).await?;
        Ok(cards.len())
    }

    // Cards

    /// Saves a card and records it in its deck's `card_ids`, dropping it from a
    /// deck it was moved out of.
    pub async fn save_card(&self, card: &Flashcard) -> Result<()> {
        let previous = self.get_card(&card.id).await?;
        self.store.save(card).await?;

        if let Some(old) = previous.filter(|old| old.deck_id != card.deck_id) {
            self.unlink_card(&old.deck_id, &card.id).await?;
        }
        if let Some(mut deck) = self.get_deck(&card.deck_id).await? {
            if !deck.card_ids.contains(&card.id) {
                deck.card_ids.push(card.id.clone());
                deck.updated_at = now_ms();
                self.save_deck(&deck).await?;
            }
        }
        Ok(())
    }

    pub async fn get_card(&self, id: &str) -> Result<Option<Flashcard>> {
        self.store.get(id).await
    }

    pub async fn get_all_cards(&self) -> Result<Vec<Flashcard>> {
        self.store.get_all().await
    }

    pub async fn delete_card(&self, id: &str) -> Result<()> {
        let card = self.get_card(id).await?;
        self.store.delete::<Flashcard>(id).await?;
        if let Some(card) = card {
            self.unlink_card(&card.deck_id, id).await?;
        }
        Ok(())
    }

    pub async fn get_cards_by_deck(&self, deck_id: &str) -> Result<Vec<Flashcard>> {
        Ok(self
            .get_all_cards()
            .await?
            .into_iter()
            .filter(|c| c.deck_id == deck_id)
            .collect())
    }

    async fn unlink_card(&self, deck_id: &str, card_id: &str) -> Result<()> {
        let Some(mut deck) = self.get_deck(deck_id).await? else {
            return Ok(());
        };
        let before = deck.card_ids.len();
        deck.card_ids.retain(|id| id != card_id);
        if deck.card_ids.len() != before {
            deck.updated_at = now_ms();
            self.save_deck(&deck).await?;
        }
        Ok(())
    }

    /// Cards of a deck that are due now.
    pub async fn get_due_cards(&self, deck_id: &str) -> Result<Vec<Flashcard>> {
        self.get_due_cards_at(deck_id, now_ms()).await
    }

    /// Cards of a deck due at `now`, most overdue first.
    pub async fn get_due_cards_at(&self, deck_id: &str, now: i64) -> Result<Vec<Flashcard>> {
        let mut due: Vec<Flashcard> = self
            .get_cards_by_deck(deck_id)
            .await?
            .into_iter()
            .filter(|c| scheduler::is_due(c, now))
            .collect();
        due.sort_by_key(|c| c.next_review_date);
        Ok(due)
    }
}
