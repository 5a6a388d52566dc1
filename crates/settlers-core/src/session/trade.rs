//! Bank/port trades and player offers.

use std::collections::BTreeSet;

use settlers_protocol::{ElementAction, Event, PlayerId, ResourceKind, ResourceSet};

use crate::layout::PortKind;
use crate::ledger::{Action, ActionKind};
use crate::visibility::ScopedEvent;
use crate::Rejection;

use super::state::{BankTrade, Offer, Rules, SessionState};

const BANK_RATE: u32 = 4;
const GENERIC_PORT_RATE: u32 = 3;
const SPECIFIC_PORT_RATE: u32 = 2;

/// Both sides typed, non-empty, and no resource on both sides.
fn well_formed(give: &ResourceSet, get: &ResourceSet) -> bool {
    give.unknown == 0
        && get.unknown == 0
        && !give.is_empty()
        && !get.is_empty()
        && ResourceKind::ALL
            .into_iter()
            .all(|k| give.get(k) == 0 || get.get(k) == 0)
}

impl SessionState {
    fn ports_of(&self, rules: Rules<'_>, player: PlayerId) -> BTreeSet<Option<ResourceKind>> {
        self.graph
            .pieces()
            .filter(|(at, owner, _)| *owner == player && at.is_node())
            .filter_map(|(at, _, _)| rules.layout.port_at(at))
            .map(PortKind::resource)
            .collect()
    }

    /// Best exchange rate `player` has for giving away `kind`.
    pub(crate) fn trade_rate(&self, rules: Rules<'_>, player: PlayerId, kind: ResourceKind) -> u32 {
        let ports = self.ports_of(rules, player);
        if ports.contains(&Some(kind)) {
            SPECIFIC_PORT_RATE
        } else if ports.contains(&None) {
            GENERIC_PORT_RATE
        } else {
            BANK_RATE
        }
    }

    pub(super) fn bank_trade(
        &mut self,
        rules: Rules<'_>,
        player: PlayerId,
        give: ResourceSet,
        get: ResourceSet,
        out: &mut Vec<ScopedEvent>,
    ) -> Result<Action, Rejection> {
        if !well_formed(&give, &get) {
            return Err(Rejection::InvalidChoice);
        }
        let reverses_last = self.last_bank_trade
            == Some(BankTrade {
                player,
                give: get,
                get: give,
            });
        if !reverses_last {
            let mut earned = 0;
            for (kind, amount) in give.iter() {
                let rate = self.trade_rate(rules, player, kind);
                if amount % rate != 0 {
                    return Err(Rejection::InvalidChoice);
                }
                earned += amount / rate;
            }
            if earned != get.total() {
                return Err(Rejection::InvalidChoice);
            }
        }
        self.resources.lose(player, &give)?;
        self.resources.gain(player, &get);
        self.last_bank_trade = if reverses_last {
            None
        } else {
            Some(BankTrade { player, give, get })
        };

        out.push(ScopedEvent::all(Event::BankTraded { player, give, get }));
        Ok(Action::new(ActionKind::BankTrade { give, get }, player))
    }

    pub(super) fn make_offer(
        &mut self,
        player: PlayerId,
        to: Vec<PlayerId>,
        give: ResourceSet,
        get: ResourceSet,
        out: &mut Vec<ScopedEvent>,
    ) -> Result<(), Rejection> {
        if !well_formed(&give, &get)
            || to.is_empty()
            || to.contains(&player)
            || to.iter().any(|p| self.player(*p).is_err())
        {
            return Err(Rejection::InvalidChoice);
        }
        if !self.resources.can_afford(player, &give) {
            return Err(Rejection::InsufficientResources);
        }
        self.offers.insert(
            player,
            Offer {
                to: to.clone(),
                give,
                get,
            },
        );
        out.push(ScopedEvent::all(Event::OfferMade {
            from: player,
            to,
            give,
            get,
        }));
        Ok(())
    }

    pub(super) fn clear_offer(&mut self, player: PlayerId, out: &mut Vec<ScopedEvent>) {
        self.offers.remove(&player);
        out.push(ScopedEvent::all(Event::OfferCleared {
            player: Some(player),
        }));
    }

    pub(super) fn accept_offer(
        &mut self,
        player: PlayerId,
        from: PlayerId,
        out: &mut Vec<ScopedEvent>,
    ) -> Result<Action, Rejection> {
        let Some(offer) = self.offers.get(&from).cloned() else {
            return Err(Rejection::InvalidChoice);
        };
        if !offer.to.contains(&player) {
            return Err(Rejection::InvalidChoice);
        }
        self.resources.transfer(from, player, &offer.give)?;
        self.resources.transfer(player, from, &offer.get)?;
        self.offers.clear();

        out.push(ScopedEvent::all(Event::OfferAccepted {
            accepting: player,
            offering: from,
        }));
        for (who, action, resources) in [
            (from, ElementAction::Lose, offer.give),
            (from, ElementAction::Gain, offer.get),
            (player, ElementAction::Lose, offer.get),
            (player, ElementAction::Gain, offer.give),
        ] {
            out.push(ScopedEvent::all(Event::PlayerElements {
                player: who,
                action,
                resources,
            }));
        }
        out.push(ScopedEvent::all(Event::OfferCleared { player: None }));
        Ok(Action::new(ActionKind::AcceptOffer { from }, player))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trades_need_disjoint_typed_sides() {
        let wood = ResourceSet::new(0, 0, 0, 0, 4);
        assert!(well_formed(&wood, &ResourceSet::new(1, 0, 0, 0, 0)));
        assert!(!well_formed(&wood, &ResourceSet::new(0, 0, 0, 0, 1)));
        assert!(!well_formed(&wood, &ResourceSet::unknown(1)));
        assert!(!well_formed(&wood, &ResourceSet::default()));
    }
}
