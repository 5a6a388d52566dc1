//! Development cards: buying, playing, and the picks that follow.

use settlers_protocol::{
    DevCardAction, DevCardKind, ElementAction, Event, Phase, PickReason, PieceKind,
    PlayerElementKind, PlayerId, ResourceKind, ResourceSet,
};

use crate::ledger::{Action, ActionKind, Effect};
use crate::player::largest_army_holder;
use crate::resources::Purchase;
use crate::visibility::{ScopedEvent, Secret};
use crate::Rejection;

use super::state::{Rules, SessionState};

/// Resources granted by a year of plenty card.
const DISCOVERY_PICKS: u32 = 2;

impl SessionState {
    pub(super) fn buy_dev_card(
        &mut self,
        rules: Rules<'_>,
        player: PlayerId,
        out: &mut Vec<ScopedEvent>,
    ) -> Result<Action, Rejection> {
        if self.deck.is_empty() {
            return Err(Rejection::CardUnavailable);
        }
        let cost = Purchase::DevCard.cost();
        if !self.resources.can_afford(player, &cost) {
            return Err(Rejection::InsufficientResources);
        }

        let mut action = Action::new(ActionKind::BuyDevCard, player);
        self.record(&mut action, Effect::DeductCost { player, cost })?;
        let card = self.deck.pop().ok_or(Rejection::CardUnavailable)?;
        self.player_mut(player)?.new_dev_cards.push(card);

        out.push(ScopedEvent::all(Event::PlayerElements {
            player,
            action: ElementAction::Lose,
            resources: cost,
        }));
        out.push(
            ScopedEvent::one(
                player,
                Event::DevCardAction {
                    player,
                    action: DevCardAction::Draw,
                    card,
                },
            )
            .hiding(Secret::DevCard),
        );
        out.push(ScopedEvent::all(Event::DevCardBought {
            player,
            remaining: self.deck.len() as u32,
        }));
        self.set_phase(self.machine.build_home(), out);
        self.check_win(rules, out);
        Ok(action)
    }

    pub(super) fn play_dev_card(
        &mut self,
        rules: Rules<'_>,
        player: PlayerId,
        card: DevCardKind,
        out: &mut Vec<ScopedEvent>,
    ) -> Result<Action, Rejection> {
        let phase = self.machine.phase();
        if phase == Phase::AwaitingRoll && card != DevCardKind::Knight {
            return Err(Rejection::WrongPhase);
        }
        if !card.is_playable() {
            return Err(Rejection::InvalidChoice);
        }
        let linear_left = self.pieces_left(player, PieceKind::Road)
            + self.pieces_left(player, PieceKind::Ship);
        if card == DevCardKind::RoadBuilding && linear_left == 0 {
            return Err(Rejection::CardUnavailable);
        }
        let seat = self.player_mut(player)?;
        if seat.played_dev_card || !seat.take_card(card) {
            return Err(Rejection::CardUnavailable);
        }
        seat.played_dev_card = true;

        let mut action = Action::new(ActionKind::PlayDevCard { card }, player);
        out.push(ScopedEvent::all(Event::Text {
            text: format!("{} played a {} card.", self.name(player), card.name()),
        }));
        out.push(ScopedEvent::all(Event::DevCardAction {
            player,
            action: DevCardAction::Play,
            card,
        }));
        out.push(ScopedEvent::all(Event::PlayerElement {
            player,
            action: ElementAction::Set,
            element: PlayerElementKind::PlayedDevCardFlag,
            amount: 1,
            news: false,
        }));

        match card {
            DevCardKind::Knight => {
                self.player_mut(player)?.knights += 1;
                out.push(ScopedEvent::all(Event::PlayerElement {
                    player,
                    action: ElementAction::Gain,
                    element: PlayerElementKind::Knights,
                    amount: 1,
                    news: false,
                }));
                let from = self.largest_army;
                let to = largest_army_holder(&self.players, from);
                if from != to {
                    self.record(&mut action, Effect::ChangeLargestArmy { from, to })?;
                    out.push(ScopedEvent::all(Event::LargestArmy { holder: to }));
                }
                if !self.check_win(rules, out) {
                    self.start_robber(rules.layout, phase, out);
                }
            }
            DevCardKind::Monopoly => self.set_phase(Phase::WaitingForMonopoly, out),
            DevCardKind::YearOfPlenty => self.set_phase(Phase::WaitingForDiscovery, out),
            DevCardKind::RoadBuilding => {
                let (next, text) = if linear_left >= 2 {
                    (Phase::PlacingFreeRoad1, "You may place 2 roads/ships.")
                } else {
                    (Phase::PlacingFreeRoad2, "You may place 1 road/ship.")
                };
                self.set_phase(next, out);
                out.push(ScopedEvent::one(player, Event::Text { text: text.into() }));
            }
            DevCardKind::VictoryPoint | DevCardKind::Unknown => {
                return Err(Rejection::InvalidChoice)
            }
        }
        Ok(action)
    }

    pub(super) fn pick_monopoly(
        &mut self,
        player: PlayerId,
        resource: ResourceKind,
        out: &mut Vec<ScopedEvent>,
    ) -> Result<Action, Rejection> {
        let victims: Vec<PlayerId> = self.seats().filter(|p| *p != player).collect();
        let mut taken = Vec::new();
        for victim in victims {
            let amount = self.resources.take_all(victim, resource);
            if amount == 0 {
                continue;
            }
            out.push(ScopedEvent::all(Event::PlayerElement {
                player: victim,
                action: ElementAction::Set,
                element: PlayerElementKind::Resource(resource),
                amount: 0,
                news: true,
            }));
            out.push(ScopedEvent::all(Event::ResourceCount {
                player: victim,
                total: self.resources.total(victim),
            }));
            taken.push((victim, amount));
        }

        let amount: u32 = taken.iter().map(|(_, n)| n).sum();
        let gained = ResourceSet::of(resource, amount);
        self.resources.gain(player, &gained);
        out.push(ScopedEvent::all(Event::PlayerElements {
            player,
            action: ElementAction::Gain,
            resources: gained,
        }));
        out.push(ScopedEvent::all(Event::Monopolized {
            player,
            resource,
            amount,
        }));
        let name = self.name(player);
        for (victim, n) in taken {
            out.push(ScopedEvent::one(
                victim,
                Event::Text {
                    text: format!("{name}'s Monopoly took your {n} {resource}."),
                },
            ));
        }
        self.set_phase(Phase::Play, out);
        Ok(Action::new(ActionKind::Monopoly { resource }, player))
    }

    /// Free resources: year of plenty for the current player, or gold hex picks for anyone owed
    /// some.
    pub(super) fn pick_resources(
        &mut self,
        player: PlayerId,
        resources: ResourceSet,
        out: &mut Vec<ScopedEvent>,
    ) -> Result<Action, Rejection> {
        if resources.unknown != 0 {
            return Err(Rejection::InvalidChoice);
        }
        let action = Action::new(ActionKind::PickResources { resources }, player);

        if self.machine.phase() == Phase::WaitingForDiscovery {
            if player != self.machine.current_player() {
                return Err(Rejection::NotCurrentPlayer);
            }
            if resources.total() != DISCOVERY_PICKS {
                return Err(Rejection::InvalidChoice);
            }
            self.resources.gain(player, &resources);
            out.push(ScopedEvent::all(Event::PickedResources {
                player,
                resources,
                reason: PickReason::Discovery,
            }));
            self.set_phase(Phase::Play, out);
            return Ok(action);
        }

        let Some(&count) = self.pending_gold.get(&player) else {
            return Err(Rejection::InvalidChoice);
        };
        if resources.total() != count {
            return Err(Rejection::InvalidChoice);
        }
        self.resources.gain(player, &resources);
        self.pending_gold.remove(&player);
        out.push(ScopedEvent::all(Event::PickedResources {
            player,
            resources,
            reason: PickReason::GoldHex,
        }));
        out.push(ScopedEvent::all(Event::PlayerElement {
            player,
            action: ElementAction::Set,
            element: PlayerElementKind::GoldPicks,
            amount: 0,
            news: false,
        }));
        if self.pending_gold.is_empty() {
            self.set_phase(Phase::Play, out);
        }
        Ok(action)
    }
}
