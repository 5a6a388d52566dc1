//! Per-player resource accounting.

use settlers_protocol::{PieceKind, PlayerId, ResourceKind, ResourceSet};

use crate::Rejection;

/// Things a player can pay for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Purchase {
    Road,
    Settlement,
    City,
    Ship,
    DevCard,
}

impl Purchase {
    pub const fn cost(self) -> ResourceSet {
        match self {
            Purchase::Road => ResourceSet::new(1, 0, 0, 0, 1),
            Purchase::Settlement => ResourceSet::new(1, 0, 1, 1, 1),
            Purchase::City => ResourceSet::new(0, 3, 0, 2, 0),
            Purchase::Ship => ResourceSet::new(0, 0, 1, 0, 1),
            Purchase::DevCard => ResourceSet::new(0, 1, 1, 1, 0),
        }
    }

    pub const fn piece(piece: PieceKind) -> Purchase {
        match piece {
            PieceKind::Road => Purchase::Road,
            PieceKind::Settlement => Purchase::Settlement,
            PieceKind::City => Purchase::City,
            PieceKind::Ship => Purchase::Ship,
        }
    }
}

/// Resource hands indexed by seat.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResourceLedger {
    hands: Vec<ResourceSet>,
}

impl ResourceLedger {
    pub fn new(players: usize) -> Self {
        Self {
            hands: vec![ResourceSet::default(); players],
        }
    }

    pub fn from_hands(hands: Vec<ResourceSet>) -> Self {
        Self { hands }
    }

    pub fn hand(&self, player: PlayerId) -> ResourceSet {
        self.hands
            .get(player.index())
            .copied()
            .unwrap_or_default()
    }

    pub fn total(&self, player: PlayerId) -> u32 {
        self.hand(player).total()
    }

    fn slot(&mut self, player: PlayerId) -> &mut ResourceSet {
        if self.hands.len() <= player.index() {
            self.hands.resize(player.index() + 1, ResourceSet::default());
        }
        &mut self.hands[player.index()]
    }

    pub fn can_afford(&self, player: PlayerId, cost: &ResourceSet) -> bool {
        self.hand(player).contains(cost)
    }

    pub fn gain(&mut self, player: PlayerId, resources: &ResourceSet) {
        self.slot(player).add_set(resources);
    }

    pub fn lose(&mut self, player: PlayerId, resources: &ResourceSet) -> Result<(), Rejection> {
        let hand = self.slot(player);
        *hand = hand
            .checked_sub(resources)
            .ok_or(Rejection::InsufficientResources)?;
        Ok(())
    }

    pub fn set(&mut self, player: PlayerId, resources: ResourceSet) {
        *self.slot(player) = resources;
    }

    /// Remove every card of `kind` from the hand; returns how many were taken.
    pub fn take_all(&mut self, player: PlayerId, kind: ResourceKind) -> u32 {
        let hand = self.slot(player);
        let amount = hand.get(kind);
        hand.set(kind, 0);
        amount
    }

    pub fn transfer(
        &mut self,
        from: PlayerId,
        to: PlayerId,
        resources: &ResourceSet,
    ) -> Result<(), Rejection> {
        self.lose(from, resources)?;
        self.gain(to, resources);
        Ok(())
    }

    /// What `observer` knows about `player`'s hand: everything for the owner, only the total
    /// for anyone else.
    pub fn observed(&self, player: PlayerId, observer: Option<PlayerId>) -> ResourceSet {
        let hand = self.hand(player);
        if observer == Some(player) {
            hand
        } else {
            hand.redacted()
        }
    }

    pub fn hands(&self) -> &[ResourceSet] {
        &self.hands
    }
}
