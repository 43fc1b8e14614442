//! A minimal, deterministic `RulesEngine` implementation used only by this crate's own
//! test suite. It intentionally reproduces the "phantom chips after fold" defect so
//! the correction in [`crate::phantom`] has something real to fix, and it
//! intentionally does **not** implement side pots or genuine 7-card hand evaluation —
//! a real deployment wires the orchestrator to a real Rules Engine instead of this
//! stub.
//!
//! Adapted from a standard deck/shuffle/investment bookkeeping split (shuffled deck,
//! pot bet/call-by-seat tracking), simplified to a single main pot with no side-pot
//! splitting.

use std::collections::VecDeque;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::entities::{Action, AvailableMoves, Card, Chips, Phase, Rank, SeatId, SeatStatus, Suit};
use crate::error::EngineError;

use super::{PotSnapshot, RulesEngine};

#[derive(Debug, Clone)]
struct SeatRuntime {
    chips: Chips,
    status: SeatStatus,
    invested_street: Chips,
    invested_hand: Chips,
    hole_cards: Option<[Card; 2]>,
}

/// Reference/test-only `RulesEngine`. Single main pot, no side pots, stubbed
/// showdown resolution (lowest seat id among those still in wins, or an even split
/// when more than one survives to `River`).
#[derive(Debug)]
pub struct SimpleEngine {
    seats: Vec<SeatRuntime>,
    deck: Vec<Card>,
    deck_pos: usize,
    board: Vec<Card>,
    phase: Phase,
    hand_number: u32,
    button: SeatId,
    small_blind: Chips,
    big_blind: Chips,
    queue: VecDeque<SeatId>,
    current_bet_street: Chips,
    last_raise_size: Chips,
    pot_total: Chips,
    showdown: bool,
    rng: SmallRng,
}

fn fresh_deck() -> Vec<Card> {
    const RANKS: [Rank; 13] = [
        Rank::Two, Rank::Three, Rank::Four, Rank::Five, Rank::Six, Rank::Seven,
        Rank::Eight, Rank::Nine, Rank::Ten, Rank::Jack, Rank::Queen, Rank::King, Rank::Ace,
    ];
    const SUITS: [Suit; 4] = [Suit::Clubs, Suit::Diamonds, Suit::Hearts, Suit::Spades];
    let mut deck = Vec::with_capacity(52);
    for rank in RANKS {
        for suit in SUITS {
            deck.push(Card::new(rank, suit));
        }
    }
    deck
}

impl SimpleEngine {
    #[must_use]
    pub fn new(num_seats: usize, starting_chips: Chips, small_blind: Chips, big_blind: Chips, seed: u64) -> Self {
        let seats = (0..num_seats)
            .map(|_| SeatRuntime {
                chips: starting_chips,
                status: SeatStatus::In,
                invested_street: 0,
                invested_hand: 0,
                hole_cards: None,
            })
            .collect();
        Self {
            seats,
            deck: fresh_deck(),
            deck_pos: 0,
            board: Vec::with_capacity(5),
            phase: Phase::PreHand,
            hand_number: 0,
            button: 0,
            small_blind,
            big_blind,
            queue: VecDeque::new(),
            current_bet_street: 0,
            last_raise_size: big_blind,
            pot_total: 0,
            showdown: false,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    fn deal_card(&mut self) -> Card {
        let card = self.deck[self.deck_pos];
        self.deck_pos += 1;
        card
    }

    fn active_seats(&self) -> Vec<SeatId> {
        self.seats
            .iter()
            .enumerate()
            .filter(|(_, s)| s.chips > 0)
            .map(|(i, _)| i)
            .collect()
    }

    fn in_hand_seats(&self) -> Vec<SeatId> {
        self.seats
            .iter()
            .enumerate()
            .filter(|(_, s)| matches!(s.status, SeatStatus::In | SeatStatus::ToCall | SeatStatus::AllIn))
            .map(|(i, _)| i)
            .collect()
    }

    fn order_from(&self, start_after: SeatId, pool: &[SeatId]) -> Vec<SeatId> {
        let n = self.seats.len();
        let mut ordered = Vec::with_capacity(pool.len());
        for offset in 1..=n {
            let candidate = (start_after + offset) % n;
            if pool.contains(&candidate) {
                ordered.push(candidate);
            }
        }
        ordered
    }

    fn next_street(&mut self) {
        match self.phase {
            Phase::PreFlop => {
                for _ in 0..3 {
                    let c = self.deal_card();
                    self.board.push(c);
                }
                self.phase = Phase::Flop;
            }
            Phase::Flop => {
                let c = self.deal_card();
                self.board.push(c);
                self.phase = Phase::Turn;
            }
            Phase::Turn => {
                let c = self.deal_card();
                self.board.push(c);
                self.phase = Phase::River;
            }
            Phase::River => {
                self.phase = Phase::Settle;
            }
            Phase::PreHand | Phase::Settle => {}
        }
        if self.phase != Phase::Settle {
            self.current_bet_street = 0;
            self.last_raise_size = self.big_blind;
            for seat in &mut self.seats {
                seat.invested_street = 0;
            }
            let actionable: Vec<SeatId> = self
                .in_hand_seats()
                .into_iter()
                .filter(|&s| matches!(self.seats[s].status, SeatStatus::In | SeatStatus::ToCall))
                .collect();
            self.queue = self.order_from(self.button, &actionable).into();
        }
    }

    /// Drains streets with no pending decider (everyone all-in, or only one seat
    /// left who isn't all-in) straight through to `Settle` instead of waiting on
    /// decisions that can't happen.
    fn drain_to_decision_or_settle(&mut self) {
        loop {
            let in_hand = self.in_hand_seats();
            if in_hand.len() <= 1 {
                self.end_by_fold(in_hand.first().copied());
                return;
            }
            if !self.queue.is_empty() {
                return;
            }
            if self.phase == Phase::Settle {
                self.settle_showdown();
                return;
            }
            self.next_street();
            if self.phase == Phase::Settle {
                self.settle_showdown();
                return;
            }
        }
    }

    fn end_by_fold(&mut self, winner: Option<SeatId>) {
        if let Some(winner) = winner {
            self.seats[winner].chips += self.pot_total;
            // Intentional: pot_total is left non-zero here, reproducing the
            // "phantom chips after fold" defect. The orchestrator's C1 pass fixes it
            // by calling zero_pots() explicitly once the hand has ended.
        }
        self.phase = Phase::PreHand;
        self.queue.clear();
        self.showdown = false;
    }

    fn settle_showdown(&mut self) {
        self.showdown = true;
        let survivors = self.in_hand_seats();
        if survivors.is_empty() {
            self.phase = Phase::PreHand;
            return;
        }
        let share = self.pot_total / survivors.len() as Chips;
        let mut remainder = self.pot_total - share * survivors.len() as Chips;
        let mut ordered = survivors.clone();
        ordered.sort_unstable();
        for seat in ordered {
            let mut amount = share;
            if remainder > 0 {
                amount += 1;
                remainder -= 1;
            }
            self.seats[seat].chips += amount;
        }
        self.pot_total = 0;
        self.phase = Phase::PreHand;
        self.queue.clear();
    }
}

impl RulesEngine for SimpleEngine {
    fn is_game_running(&self) -> bool {
        self.active_seats().len() >= 2
    }

    fn is_hand_running(&self) -> bool {
        self.phase.is_betting_phase()
    }

    fn start_hand(&mut self) -> Result<(), EngineError> {
        if !self.is_game_running() {
            return Err(EngineError::InsufficientPlayers);
        }
        self.deck = fresh_deck();
        self.deck.shuffle(&mut self.rng);
        self.deck_pos = 0;
        self.board.clear();
        self.showdown = false;

        let active = self.active_seats();
        for (i, seat) in self.seats.iter_mut().enumerate() {
            seat.invested_street = 0;
            seat.invested_hand = 0;
            seat.hole_cards = None;
            seat.status = if active.contains(&i) { SeatStatus::In } else { SeatStatus::Skip };
        }

        // Advance the button to the next seat that still has chips.
        let n = self.seats.len();
        for offset in 1..=n {
            let candidate = (self.button + offset) % n;
            if active.contains(&candidate) {
                self.button = candidate;
                break;
            }
        }

        for seat in active.iter() {
            let cards = [self.deal_card(), self.deal_card()];
            self.seats[*seat].hole_cards = Some(cards);
        }

        let blind_order = self.order_from(self.button.wrapping_sub(1) % n.max(1), &active);
        let (sb_seat, bb_seat) = if active.len() == 2 {
            (self.button, active.iter().copied().find(|&s| s != self.button).unwrap())
        } else {
            (blind_order[0], blind_order[1])
        };
        self.post_blind(sb_seat, self.small_blind);
        self.post_blind(bb_seat, self.big_blind);

        self.current_bet_street = self.big_blind;
        self.last_raise_size = self.big_blind;
        self.hand_number += 1;
        self.phase = Phase::PreFlop;

        let actionable: Vec<SeatId> = active
            .iter()
            .copied()
            .filter(|&s| matches!(self.seats[s].status, SeatStatus::In | SeatStatus::ToCall))
            .collect();
        self.queue = self.order_from(bb_seat, &actionable).into();
        self.drain_to_decision_or_settle();
        Ok(())
    }

    fn current_player(&self) -> Option<SeatId> {
        if self.phase.is_betting_phase() {
            self.queue.front().copied()
        } else {
            None
        }
    }

    fn hand_phase(&self) -> Phase {
        self.phase
    }

    fn hand_number(&self) -> u32 {
        self.hand_number
    }

    fn board(&self) -> &[Card] {
        &self.board
    }

    fn hand_of(&self, seat: SeatId) -> Option<[Card; 2]> {
        self.seats.get(seat).and_then(|s| s.hole_cards)
    }

    fn chips_to_call(&self, seat: SeatId) -> Chips {
        self.seats
            .get(seat)
            .map(|s| self.current_bet_street.saturating_sub(s.invested_street))
            .unwrap_or(0)
    }

    fn min_raise(&self) -> Chips {
        self.big_blind
    }

    fn get_available_moves(&self) -> AvailableMoves {
        let Some(seat_id) = self.current_player() else {
            return AvailableMoves::default();
        };
        let seat = &self.seats[seat_id];
        let to_call = self.chips_to_call(seat_id);
        let mut legal = vec![crate::entities::ActionKind::Fold];
        if to_call == 0 {
            legal.push(crate::entities::ActionKind::Check);
        } else {
            legal.push(crate::entities::ActionKind::Call);
        }
        let mut raise_range = None;
        if seat.chips > to_call {
            let max_total = seat.invested_street + seat.chips;
            let min_total = (self.current_bet_street + self.last_raise_size.max(self.big_blind)).min(max_total);
            legal.push(crate::entities::ActionKind::Raise);
            raise_range = Some((min_total, max_total));
        }
        AvailableMoves { legal, raise_range }
    }

    fn validate_move(&self, seat: SeatId, action: Action) -> bool {
        if self.current_player() != Some(seat) {
            return false;
        }
        let moves = self.get_available_moves();
        match action {
            Action::Raise { amount } => {
                moves.contains(action.kind())
                    && moves.raise_range.is_some_and(|(min, max)| amount >= min && amount <= max)
            }
            other => moves.contains(other.kind()),
        }
    }

    fn take_action(&mut self, seat: SeatId, action: Action) -> Result<(), EngineError> {
        if self.current_player() != Some(seat) {
            return Err(EngineError::NotCurrentPlayer(seat));
        }
        if !self.validate_move(seat, action) {
            return Err(EngineError::IllegalAction);
        }
        self.queue.pop_front();

        match action {
            Action::Fold => {
                self.seats[seat].status = SeatStatus::Folded;
            }
            Action::Check => {}
            Action::Call => {
                let to_call = self.chips_to_call(seat);
                let paid = to_call.min(self.seats[seat].chips);
                self.pay(seat, paid);
            }
            Action::Raise { amount } => {
                let before = self.seats[seat].invested_street;
                let paid = amount - before;
                let raise_size = amount.saturating_sub(self.current_bet_street);
                self.pay(seat, paid);
                self.current_bet_street = amount;
                self.last_raise_size = raise_size.max(self.last_raise_size);
                let reopen: Vec<SeatId> = self
                    .in_hand_seats()
                    .into_iter()
                    .filter(|&s| {
                        s != seat
                            && matches!(self.seats[s].status, SeatStatus::In | SeatStatus::ToCall)
                            && !self.queue.contains(&s)
                    })
                    .collect();
                for s in self.order_from(seat, &reopen) {
                    self.queue.push_back(s);
                }
            }
        }

        self.drain_to_decision_or_settle();
        Ok(())
    }

    fn pots(&self) -> Vec<PotSnapshot> {
        vec![PotSnapshot {
            pot_id: 0,
            total: self.pot_total,
            eligible: self.in_hand_seats(),
        }]
    }

    fn zero_pots(&mut self) {
        self.pot_total = 0;
    }

    fn seat_count(&self) -> usize {
        self.seats.len()
    }

    fn seat_chips(&self, seat: SeatId) -> Chips {
        self.seats.get(seat).map(|s| s.chips).unwrap_or(0)
    }

    fn seat_status(&self, seat: SeatId) -> SeatStatus {
        self.seats.get(seat).map(|s| s.status).unwrap_or(SeatStatus::Skip)
    }

    fn button_seat(&self) -> SeatId {
        self.button
    }

    fn action_order(&self) -> Vec<SeatId> {
        let in_hand = self.in_hand_seats();
        self.order_from(self.button, &in_hand)
    }

    fn strength_percentile(&self, seat: SeatId) -> f32 {
        let Some(cards) = self.hand_of(seat) else { return 0.0 };
        let rank_sum: u32 = cards.iter().map(|c| c.rank as u32).sum::<u32>()
            + self.board.iter().map(|c| c.rank as u32).sum::<u32>();
        let max_sum = 12 * 2 + 12 * 5; // highest possible rank index sum across 7 cards
        (rank_sum as f32 / max_sum as f32).clamp(0.0, 1.0)
    }

    fn at_showdown(&self) -> bool {
        self.showdown
    }
}

impl SimpleEngine {
    fn pay(&mut self, seat: SeatId, amount: Chips) {
        let s = &mut self.seats[seat];
        s.chips -= amount;
        s.invested_street += amount;
        s.invested_hand += amount;
        self.pot_total += amount;
        if s.chips == 0 {
            s.status = SeatStatus::AllIn;
        }
    }

    fn post_blind(&mut self, seat: SeatId, amount: Chips) {
        let paid = amount.min(self.seats[seat].chips);
        self.pay(seat, paid);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heads_up_hand_starts_in_preflop() {
        let mut engine = SimpleEngine::new(2, 1000, 10, 20, 1);
        engine.start_hand().unwrap();
        assert_eq!(engine.hand_phase(), Phase::PreFlop);
        assert!(engine.current_player().is_some());
    }

    #[test]
    fn fold_leaves_phantom_chips_until_corrected() {
        let mut engine = SimpleEngine::new(2, 1000, 10, 20, 7);
        engine.start_hand().unwrap();
        let actor = engine.current_player().unwrap();
        engine.take_action(actor, Action::Fold).unwrap();
        assert_eq!(engine.hand_phase(), Phase::PreHand);
        assert!(engine.pots()[0].total > 0, "defect: pot should still show the stale total");
        let total_chips: Chips = (0..engine.seat_count()).map(|s| engine.seat_chips(s)).sum();
        assert_eq!(total_chips + engine.pots()[0].total, 2000);
        engine.zero_pots();
        assert_eq!(engine.pots()[0].total, 0);
    }
}
