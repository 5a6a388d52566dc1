use settlers_protocol::{DevCardKind, PieceKind, PlayerId};

use crate::route_graph::RouteGraph;

pub const SETTLEMENT_POINTS: u32 = 1;
pub const CITY_POINTS: u32 = 2;
pub const LONGEST_ROUTE_POINTS: u32 = 2;
pub const LARGEST_ARMY_POINTS: u32 = 2;
/// Knights needed before the largest army title is awarded.
pub const MIN_LARGEST_ARMY: u32 = 3;

/// One seat. Resources live in the session's `ResourceLedger`, pieces in its `RouteGraph`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Playable cards, plus victory point cards.
    pub dev_cards: Vec<DevCardKind>,
    /// Bought this turn; playable from the next turn on.
    pub new_dev_cards: Vec<DevCardKind>,
    pub knights: u32,
    pub played_dev_card: bool,
    /// Waiting to build between the current turn and the next.
    pub asked_special_build: bool,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            dev_cards: Vec::new(),
            new_dev_cards: Vec::new(),
            knights: 0,
            played_dev_card: false,
            asked_special_build: false,
        }
    }

    pub fn pieces_left(&self, graph: &RouteGraph, piece: PieceKind) -> u32 {
        piece.stock().saturating_sub(graph.count(self.id, piece))
    }

    pub fn victory_point_cards(&self) -> u32 {
        self.dev_cards
            .iter()
            .chain(&self.new_dev_cards)
            .filter(|c| **c == DevCardKind::VictoryPoint)
            .count() as u32
    }

    /// Score everyone can see: buildings and titles.
    pub fn public_score(&self, graph: &RouteGraph, largest_army: Option<PlayerId>) -> u32 {
        let mut score = graph.count(self.id, PieceKind::Settlement) * SETTLEMENT_POINTS
            + graph.count(self.id, PieceKind::City) * CITY_POINTS;
        if graph.holder() == Some(self.id) {
            score += LONGEST_ROUTE_POINTS;
        }
        if largest_army == Some(self.id) {
            score += LARGEST_ARMY_POINTS;
        }
        score
    }

    /// Public score plus hidden victory point cards.
    pub fn total_score(&self, graph: &RouteGraph, largest_army: Option<PlayerId>) -> u32 {
        self.public_score(graph, largest_army) + self.victory_point_cards()
    }

    /// Take one playable card of `card` from the hand.
    pub(crate) fn take_card(&mut self, card: DevCardKind) -> bool {
        match self.dev_cards.iter().position(|c| *c == card) {
            Some(i) => {
                self.dev_cards.remove(i);
                true
            }
            None => false,
        }
    }

    /// Start of a new turn for this player: last turn's purchases become playable.
    pub(crate) fn refresh_cards(&mut self) {
        self.dev_cards.append(&mut self.new_dev_cards);
        self.played_dev_card = false;
    }
}

/// Who holds largest army after `knights` changed. Same rule as the longest route: the holder
/// keeps it unless strictly beaten.
pub fn largest_army_holder(players: &[Player], current: Option<PlayerId>) -> Option<PlayerId> {
    let held = current
        .and_then(|h| players.iter().find(|p| p.id == h))
        .map_or(0, |p| p.knights);
    players
        .iter()
        .filter(|p| p.knights >= MIN_LARGEST_ARMY && p.knights > held)
        .max_by_key(|p| p.knights)
        .map(|p| p.id)
        .or(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use settlers_protocol::{Coord, Corner};

    #[test]
    fn score_counts_buildings_titles_and_cards() {
        let mut graph = RouteGraph::new();
        let p = PlayerId(1);
        graph
            .add_piece(p, PieceKind::Settlement, Coord::node(0, 0, Corner::North))
            .unwrap();
        graph
            .add_piece(p, PieceKind::Settlement, Coord::node(0, 2, Corner::North))
            .unwrap();
        graph
            .add_piece(p, PieceKind::City, Coord::node(0, 2, Corner::North))
            .unwrap();
        let mut player = Player::new(p, "blue");
        player.new_dev_cards.push(DevCardKind::VictoryPoint);

        assert_eq!(player.public_score(&graph, None), 3);
        assert_eq!(player.public_score(&graph, Some(p)), 5);
        assert_eq!(player.total_score(&graph, Some(p)), 6);
        assert_eq!(player.pieces_left(&graph, PieceKind::Settlement), 4);
        assert_eq!(player.pieces_left(&graph, PieceKind::City), 3);
    }

    #[test]
    fn largest_army_needs_three_and_a_strict_lead() {
        let mut players: Vec<Player> = (0..3).map(|i| Player::new(PlayerId(i), "p")).collect();
        players[0].knights = 2;
        assert_eq!(largest_army_holder(&players, None), None);

        players[0].knights = 3;
        assert_eq!(largest_army_holder(&players, None), Some(PlayerId(0)));

        players[1].knights = 3;
        assert_eq!(largest_army_holder(&players, Some(PlayerId(0))), Some(PlayerId(0)));

        players[1].knights = 4;
        assert_eq!(largest_army_holder(&players, Some(PlayerId(0))), Some(PlayerId(1)));
    }

    #[test]
    fn refresh_makes_new_cards_playable() {
        let mut player = Player::new(PlayerId(0), "red");
        player.new_dev_cards.push(DevCardKind::Knight);
        player.played_dev_card = true;
        assert!(!player.take_card(DevCardKind::Knight));
        player.refresh_cards();
        assert!(!player.played_dev_card);
        assert!(player.take_card(DevCardKind::Knight));
    }
}
