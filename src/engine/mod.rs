//! Card operations.
//!
//! Every operation works on the snapshot the participant last saw. Card
//! mutations build a new list, write it to the store as a full replacement and
//! only then commit it to the session, so a failed write leaves the session
//! exactly as it was. Concurrent participants therefore race at whole-board
//! granularity: the last full write wins.

use serde::Serialize;

use crate::errors::AppError;
use crate::models::{Card, CardId, Stage, VoteDelta};
use crate::session::SessionContext;
use crate::store::BoardStore;

/// Result of an operation that was accepted by the API.
///
/// Anything other than `Applied` left the board and the session untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Applied,
    Unchanged,
    TopicRequired,
    BudgetExhausted,
    VoteFloorReached,
    MergeSelectionInsufficient,
}

async fn commit(
    session: &mut SessionContext,
    store: &dyn BoardStore,
    cards: Vec<Card>,
) -> Result<(), AppError> {
    store.replace_cards(session.board_id(), &cards).await?;
    session.board.cards = cards;
    session.record_write();
    Ok(())
}

/// Append a blank card. Disabled until the board has a topic.
pub async fn add_card(
    session: &mut SessionContext,
    store: &dyn BoardStore,
) -> Result<Outcome, AppError> {
    if !session.board.has_topic() {
        return Ok(Outcome::TopicRequired);
    }
    let mut cards = session.board.cards.clone();
    cards.push(Card::empty());
    commit(session, store, cards).await?;
    tracing::info!(board_id = %session.board_id(), session_id = %session.id, "Card added");
    Ok(Outcome::Applied)
}

/// Replace a card's text; skips the write when nothing changed.
pub async fn edit_card(
    session: &mut SessionContext,
    store: &dyn BoardStore,
    card_id: CardId,
    text: String,
) -> Result<Outcome, AppError> {
    let pos = session.board.require_position(card_id)?;
    if session.board.cards[pos].text == text {
        return Ok(Outcome::Unchanged);
    }
    let mut cards = session.board.cards.clone();
    cards[pos].text = text;
    commit(session, store, cards).await?;
    tracing::debug!(board_id = %session.board_id(), card_id = %card_id, "Card edited");
    Ok(Outcome::Applied)
}

pub async fn delete_card(
    session: &mut SessionContext,
    store: &dyn BoardStore,
    card_id: CardId,
) -> Result<Outcome, AppError> {
    let pos = session.board.require_position(card_id)?;
    let mut cards = session.board.cards.clone();
    cards.remove(pos);
    commit(session, store, cards).await?;
    session.selected.remove(&card_id);
    tracing::info!(board_id = %session.board_id(), card_id = %card_id, "Card deleted");
    Ok(Outcome::Applied)
}

/// Move a card one step along the workflow.
pub async fn move_card(
    session: &mut SessionContext,
    store: &dyn BoardStore,
    card_id: CardId,
    stage: Stage,
) -> Result<Outcome, AppError> {
    let pos = session.board.require_position(card_id)?;
    let current = session.board.cards[pos].status;
    if current == stage {
        return Ok(Outcome::Unchanged);
    }
    if !current.is_adjacent(stage) {
        return Err(AppError::Validation(format!(
            "Cannot move a card from {} to {}",
            current.as_str(),
            stage.as_str()
        )));
    }
    let mut cards = session.board.cards.clone();
    cards[pos].status = stage;
    commit(session, store, cards).await?;
    tracing::info!(
        board_id = %session.board_id(),
        card_id = %card_id,
        from = current.as_str(),
        to = stage.as_str(),
        "Card moved"
    );
    Ok(Outcome::Applied)
}

/// Cast or withdraw one vote, charging this session's budget.
pub async fn vote(
    session: &mut SessionContext,
    store: &dyn BoardStore,
    card_id: CardId,
    delta: VoteDelta,
) -> Result<Outcome, AppError> {
    let pos = session.board.require_position(card_id)?;
    let votes = session.board.cards[pos].votes;
    let new_votes = match delta {
        VoteDelta::Up if !session.budget.can_upvote() => return Ok(Outcome::BudgetExhausted),
        VoteDelta::Down if votes == 0 => return Ok(Outcome::VoteFloorReached),
        VoteDelta::Up => votes.saturating_add(1),
        VoteDelta::Down => votes - 1,
    };
    let mut cards = session.board.cards.clone();
    cards[pos].votes = new_votes;
    commit(session, store, cards).await?;
    session.budget.cast_vote(delta);
    tracing::debug!(
        board_id = %session.board_id(),
        card_id = %card_id,
        votes = new_votes,
        votes_remaining = session.budget.votes_remaining(),
        "Vote recorded"
    );
    Ok(Outcome::Applied)
}

/// Tick or untick a card's merge checkbox. Session-local, nothing is written.
pub fn set_selected(
    session: &mut SessionContext,
    card_id: CardId,
    selected: bool,
) -> Result<Outcome, AppError> {
    session.board.require_position(card_id)?;
    let changed = if selected {
        session.selected.insert(card_id)
    } else {
        session.selected.remove(&card_id)
    };
    Ok(if changed {
        Outcome::Applied
    } else {
        Outcome::Unchanged
    })
}

/// Fold every selected card into one new card at the top of the board.
///
/// Texts are joined with newlines in board order and votes are summed. The
/// selection is cleared once the merge is written.
pub async fn merge_selected(
    session: &mut SessionContext,
    store: &dyn BoardStore,
) -> Result<Outcome, AppError> {
    if session.selected.len() < 2 {
        return Ok(Outcome::MergeSelectionInsufficient);
    }
    let mut positions = session
        .selected
        .iter()
        .map(|id| session.board.require_position(*id))
        .collect::<Result<Vec<_>, _>>()?;
    positions.sort_unstable();

    let text = positions
        .iter()
        .map(|&pos| session.board.cards[pos].text.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    let votes = positions
        .iter()
        .map(|&pos| session.board.cards[pos].votes)
        .fold(0u32, u32::saturating_add);

    let mut cards: Vec<Card> = session
        .board
        .cards
        .iter()
        .filter(|c| !session.selected.contains(&c.id))
        .cloned()
        .collect();
    cards.insert(0, Card::merged(text, votes));

    commit(session, store, cards).await?;
    let merged = session.selected.len();
    session.selected.clear();
    tracing::info!(board_id = %session.board_id(), merged, votes, "Cards merged");
    Ok(Outcome::Applied)
}

/// Start a new meeting: persist the topic, clear the board and refill the budget.
pub async fn set_topic(
    session: &mut SessionContext,
    store: &dyn BoardStore,
    topic: String,
) -> Result<Outcome, AppError> {
    if topic.trim().is_empty() {
        return Ok(Outcome::TopicRequired);
    }
    store.start_topic(session.board_id(), &topic).await?;
    tracing::info!(board_id = %session.board_id(), topic = %topic, "New topic started");
    session.board.topic = topic;
    session.board.cards.clear();
    session.record_write();
    session.selected.clear();
    session.budget.reset();
    Ok(Outcome::Applied)
}

/// Change this participant's vote limit. Only a new value refills the budget.
pub fn set_max_votes(session: &mut SessionContext, max_votes: u32) -> Result<Outcome, AppError> {
    if !session.budget.set_max_votes(max_votes)? {
        return Ok(Outcome::Unchanged);
    }
    Ok(Outcome::Applied)
}

pub fn set_sort_by_votes(session: &mut SessionContext, sort_by_votes: bool) -> Outcome {
    if session.sort_by_votes == sort_by_votes {
        return Outcome::Unchanged;
    }
    session.sort_by_votes = sort_by_votes;
    Outcome::Applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BoardId, BoardState};
    use crate::store::MemoryStore;

    fn board_id() -> BoardId {
        BoardId::parse("abcd1234").unwrap()
    }

    async fn session_with(store: &MemoryStore, cards: &[(&str, u32, Stage)]) -> SessionContext {
        store.save_topic(&board_id(), "Sprint planning").await.unwrap();
        let cards: Vec<Card> = cards
            .iter()
            .map(|(text, votes, status)| Card {
                id: uuid::Uuid::new_v4(),
                text: text.to_string(),
                votes: *votes,
                status: *status,
            })
            .collect();
        store.replace_cards(&board_id(), &cards).await.unwrap();
        SessionContext::open(store, &board_id(), 5).await.unwrap()
    }

    fn id_at(session: &SessionContext, pos: usize) -> CardId {
        session.board.cards[pos].id
    }

    #[tokio::test]
    async fn test_lean_coffee_walkthrough() {
        let store = MemoryStore::new();
        let mut session = SessionContext::open(&store, &board_id(), 5).await.unwrap();
        assert_eq!(session.board.topic, "");

        assert_eq!(
            add_card(&mut session, &store).await.unwrap(),
            Outcome::TopicRequired
        );
        assert_eq!(store.card_writes(), 0);

        set_topic(&mut session, &store, "Sprint planning".to_string())
            .await
            .unwrap();
        assert_eq!(session.board.topic, "Sprint planning");
        assert!(session.board.cards.is_empty());

        add_card(&mut session, &store).await.unwrap();
        add_card(&mut session, &store).await.unwrap();
        assert_eq!(session.board.cards.len(), 2);
        assert!(session
            .board
            .cards
            .iter()
            .all(|c| c.status == Stage::ToDiscuss && c.votes == 0));

        set_max_votes(&mut session, 3).unwrap();
        let first = id_at(&session, 0);
        for _ in 0..3 {
            assert_eq!(
                vote(&mut session, &store, first, VoteDelta::Up).await.unwrap(),
                Outcome::Applied
            );
        }
        assert_eq!(session.board.cards[0].votes, 3);
        assert_eq!(session.budget.votes_remaining(), 0);

        assert_eq!(
            vote(&mut session, &store, first, VoteDelta::Up).await.unwrap(),
            Outcome::BudgetExhausted
        );
        assert_eq!(session.board.cards[0].votes, 3);

        let persisted = store.load_cards(&board_id()).await.unwrap();
        assert_eq!(persisted, session.board.cards);
    }

    #[tokio::test]
    async fn test_downvote_rejected_at_zero() {
        let store = MemoryStore::new();
        let mut session = session_with(&store, &[("a", 0, Stage::ToDiscuss)]).await;
        let writes = store.card_writes();
        let id = id_at(&session, 0);

        let outcome = vote(&mut session, &store, id, VoteDelta::Down)
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::VoteFloorReached);
        assert_eq!(session.board.cards[0].votes, 0);
        assert_eq!(session.budget.votes_remaining(), 5);
        assert_eq!(store.card_writes(), writes);
    }

    #[tokio::test]
    async fn test_downvote_refunds_budget() {
        let store = MemoryStore::new();
        let mut session = session_with(&store, &[("a", 2, Stage::ToDiscuss)]).await;
        let id = id_at(&session, 0);

        vote(&mut session, &store, id, VoteDelta::Down)
            .await
            .unwrap();

        assert_eq!(session.board.cards[0].votes, 1);
        assert_eq!(session.budget.votes_remaining(), 6);
    }

    #[tokio::test]
    async fn test_merge_two_cards() {
        let store = MemoryStore::new();
        let mut session = session_with(
            &store,
            &[
                ("other", 1, Stage::Discussing),
                ("first", 2, Stage::Done),
                ("second", 3, Stage::ToDiscuss),
            ],
        )
        .await;
        let (a, b) = (id_at(&session, 1), id_at(&session, 2));
        // Selection order must not matter, board order does
        set_selected(&mut session, b, true).unwrap();
        set_selected(&mut session, a, true).unwrap();

        let outcome = merge_selected(&mut session, &store).await.unwrap();

        assert_eq!(outcome, Outcome::Applied);
        let cards = &session.board.cards;
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].text, "first\nsecond");
        assert_eq!(cards[0].votes, 5);
        assert_eq!(cards[0].status, Stage::ToDiscuss);
        assert_eq!(cards[1].text, "other");
        assert!(cards.iter().all(|c| c.id != a && c.id != b));
        assert!(session.selected.is_empty());
        assert_eq!(store.load_cards(&board_id()).await.unwrap(), *cards);
    }

    #[tokio::test]
    async fn test_merge_needs_two_selected() {
        let store = MemoryStore::new();
        let mut session = session_with(&store, &[("a", 1, Stage::ToDiscuss)]).await;
        let writes = store.card_writes();

        assert_eq!(
            merge_selected(&mut session, &store).await.unwrap(),
            Outcome::MergeSelectionInsufficient
        );
        let id = id_at(&session, 0);
        set_selected(&mut session, id, true).unwrap();
        assert_eq!(
            merge_selected(&mut session, &store).await.unwrap(),
            Outcome::MergeSelectionInsufficient
        );

        assert_eq!(session.selected.len(), 1);
        assert_eq!(session.board.cards.len(), 1);
        assert_eq!(store.card_writes(), writes);
    }

    #[tokio::test]
    async fn test_set_topic_clears_board_and_budget() {
        let store = MemoryStore::new();
        let mut session = session_with(
            &store,
            &[("a", 1, Stage::ToDiscuss), ("b", 0, Stage::Done)],
        )
        .await;
        let id = id_at(&session, 0);
        session.selected.insert(id);
        vote(&mut session, &store, id, VoteDelta::Up)
            .await
            .unwrap();

        set_topic(&mut session, &store, "Retro".to_string())
            .await
            .unwrap();

        assert_eq!(session.board.topic, "Retro");
        assert!(session.board.cards.is_empty());
        assert!(session.selected.is_empty());
        assert_eq!(session.budget.votes_remaining(), 5);
        assert_eq!(store.load_topic(&board_id()).await.unwrap(), "Retro");
        assert!(store.load_cards(&board_id()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blank_topic_is_ignored() {
        let store = MemoryStore::new();
        let mut session = session_with(&store, &[("a", 0, Stage::ToDiscuss)]).await;

        let outcome = set_topic(&mut session, &store, "   ".to_string())
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::TopicRequired);
        assert_eq!(session.board.topic, "Sprint planning");
        assert_eq!(session.board.cards.len(), 1);
    }

    #[tokio::test]
    async fn test_edit_skips_identical_text() {
        let store = MemoryStore::new();
        let mut session = session_with(&store, &[("same", 0, Stage::ToDiscuss)]).await;
        let writes = store.card_writes();
        let id = id_at(&session, 0);

        assert_eq!(
            edit_card(&mut session, &store, id, "same".to_string())
                .await
                .unwrap(),
            Outcome::Unchanged
        );
        assert_eq!(store.card_writes(), writes);

        edit_card(&mut session, &store, id, "line one\nline two".to_string())
            .await
            .unwrap();
        assert_eq!(store.card_writes(), writes + 1);
        assert_eq!(
            store.load_cards(&board_id()).await.unwrap()[0].text,
            "line one\nline two"
        );
    }

    #[tokio::test]
    async fn test_delete_shifts_and_unselects() {
        let store = MemoryStore::new();
        let mut session = session_with(
            &store,
            &[
                ("a", 0, Stage::ToDiscuss),
                ("b", 0, Stage::ToDiscuss),
                ("c", 0, Stage::ToDiscuss),
            ],
        )
        .await;
        let b = id_at(&session, 1);
        session.selected.insert(b);

        delete_card(&mut session, &store, b).await.unwrap();

        let texts: Vec<&str> = session.board.cards.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "c"]);
        assert!(session.selected.is_empty());
    }

    #[tokio::test]
    async fn test_move_only_to_adjacent_stage() {
        let store = MemoryStore::new();
        let mut session = session_with(&store, &[("a", 0, Stage::ToDiscuss)]).await;
        let id = id_at(&session, 0);

        let err = move_card(&mut session, &store, id, Stage::Done)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        move_card(&mut session, &store, id, Stage::Discussing)
            .await
            .unwrap();
        move_card(&mut session, &store, id, Stage::Done).await.unwrap();
        assert_eq!(session.board.cards[0].status, Stage::Done);

        assert_eq!(
            move_card(&mut session, &store, id, Stage::Done).await.unwrap(),
            Outcome::Unchanged
        );
        move_card(&mut session, &store, id, Stage::Discussing)
            .await
            .unwrap();
        assert_eq!(
            store.load_cards(&board_id()).await.unwrap()[0].status,
            Stage::Discussing
        );
    }

    #[tokio::test]
    async fn test_stale_card_id_is_not_found() {
        let store = MemoryStore::new();
        let mut session = session_with(&store, &[("a", 0, Stage::ToDiscuss)]).await;
        let missing = uuid::Uuid::new_v4();

        assert!(matches!(
            vote(&mut session, &store, missing, VoteDelta::Up).await,
            Err(AppError::CardNotFound(_))
        ));
        assert!(matches!(
            delete_card(&mut session, &store, missing).await,
            Err(AppError::CardNotFound(_))
        ));
        assert!(matches!(
            set_selected(&mut session, missing, true),
            Err(AppError::CardNotFound(_))
        ));
        assert_eq!(session.budget.votes_remaining(), 5);
    }

    #[tokio::test]
    async fn test_store_failure_leaves_session_untouched() {
        let store = MemoryStore::new();
        let mut session = session_with(&store, &[("a", 1, Stage::ToDiscuss)]).await;
        let before = session.clone();
        let id = id_at(&session, 0);
        store.set_available(false);

        assert!(matches!(
            vote(&mut session, &store, id, VoteDelta::Up).await,
            Err(AppError::StoreUnavailable(_))
        ));
        assert!(matches!(
            add_card(&mut session, &store).await,
            Err(AppError::StoreUnavailable(_))
        ));
        assert!(matches!(
            set_topic(&mut session, &store, "Retro".to_string()).await,
            Err(AppError::StoreUnavailable(_))
        ));

        assert_eq!(session.board, before.board);
        assert_eq!(session.budget, before.budget);
    }

    #[tokio::test]
    async fn test_identical_sequences_are_deterministic() {
        let store_a = MemoryStore::new();
        let store_b = MemoryStore::new();
        let seed = session_with(
            &store_a,
            &[
                ("a", 0, Stage::ToDiscuss),
                ("b", 2, Stage::Discussing),
                ("c", 1, Stage::ToDiscuss),
            ],
        )
        .await;
        store_b.save_topic(&board_id(), "Sprint planning").await.unwrap();
        store_b
            .replace_cards(&board_id(), &seed.board.cards)
            .await
            .unwrap();

        let mut results = Vec::new();
        for store in [&store_a, &store_b] {
            let mut session = SessionContext::open(store, &board_id(), 5).await.unwrap();
            let (a, b, c) = (id_at(&session, 0), id_at(&session, 1), id_at(&session, 2));
            edit_card(&mut session, store, a, "edited".to_string())
                .await
                .unwrap();
            vote(&mut session, store, c, VoteDelta::Up).await.unwrap();
            vote(&mut session, store, b, VoteDelta::Down).await.unwrap();
            move_card(&mut session, store, c, Stage::Discussing)
                .await
                .unwrap();
            delete_card(&mut session, store, a).await.unwrap();
            results.push(store.load_cards(&board_id()).await.unwrap());
        }

        assert_eq!(results[0], results[1]);
        assert_eq!(results[0].len(), 2);
    }

    #[tokio::test]
    async fn test_stale_snapshot_loses_concurrent_update() {
        let store = MemoryStore::new();
        let mut alice = session_with(&store, &[("a", 0, Stage::ToDiscuss)]).await;
        let mut bob = SessionContext::open(&store, &board_id(), 5).await.unwrap();

        add_card(&mut bob, &store).await.unwrap();
        assert_eq!(store.load_cards(&board_id()).await.unwrap().len(), 2);

        // Alice still sees one card and writes her whole list back
        let a = id_at(&alice, 0);
        vote(&mut alice, &store, a, VoteDelta::Up).await.unwrap();

        let persisted = store.load_cards(&board_id()).await.unwrap();
        assert_eq!(persisted.len(), 1);
        assert_eq!(persisted[0].votes, 1);

        bob.refresh(&store).await.unwrap();
        assert_eq!(bob.board, alice.board);
    }

    #[tokio::test]
    async fn test_resubmitting_max_votes_keeps_budget() {
        let store = MemoryStore::new();
        let mut session = session_with(&store, &[("a", 0, Stage::ToDiscuss)]).await;
        let id = id_at(&session, 0);
        vote(&mut session, &store, id, VoteDelta::Up).await.unwrap();
        vote(&mut session, &store, id, VoteDelta::Up).await.unwrap();

        assert_eq!(set_max_votes(&mut session, 5).unwrap(), Outcome::Unchanged);
        assert_eq!(session.budget.votes_remaining(), 3);

        assert_eq!(set_max_votes(&mut session, 4).unwrap(), Outcome::Applied);
        assert_eq!(session.budget.votes_remaining(), 4);
    }

    #[test]
    fn test_sort_toggle() {
        let mut session = SessionContext::new(BoardState::empty(board_id()), 5);
        assert_eq!(set_sort_by_votes(&mut session, true), Outcome::Applied);
        assert_eq!(set_sort_by_votes(&mut session, true), Outcome::Unchanged);
        assert!(session.sort_by_votes);
    }
}
