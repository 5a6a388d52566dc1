//! Per-recipient event routing.
//!
//! Every event is produced with an [`Audience`]. Members of the audience get the event as is;
//! everyone else gets the redacted variant if there is one, and nothing otherwise. Observers
//! without a seat are never part of a seat-specific audience.

use serde::{Deserialize, Serialize};
use settlers_protocol::{DevCardKind, Event, PlayerId};

/// Who an event is meant for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Audience {
    All,
    One(PlayerId),
    Players(Vec<PlayerId>),
    AllExcept(Vec<PlayerId>),
}

impl Audience {
    fn admits(&self, recipient: Recipient) -> bool {
        match (self, recipient) {
            (Audience::All, _) => true,
            (Audience::One(p), Recipient::Seat(s)) => *p == s,
            (Audience::Players(ps), Recipient::Seat(s)) => ps.contains(&s),
            (Audience::AllExcept(ps), Recipient::Seat(s)) => !ps.contains(&s),
            (Audience::AllExcept(_), Recipient::Observer(_)) => true,
            (Audience::One(_) | Audience::Players(_), Recipient::Observer(_)) => false,
        }
    }
}

/// Hidden information an event carries, which observability modes may reveal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Secret {
    DevCard,
    Resource,
}

/// An event together with its visibility.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScopedEvent {
    pub event: Event,
    pub audience: Audience,
    /// Delivered to everyone outside `audience`.
    pub redacted: Option<Event>,
    pub secret: Option<Secret>,
}

impl ScopedEvent {
    pub fn all(event: Event) -> Self {
        Self {
            event,
            audience: Audience::All,
            redacted: None,
            secret: None,
        }
    }

    pub fn one(player: PlayerId, event: Event) -> Self {
        Self {
            event,
            audience: Audience::One(player),
            redacted: None,
            secret: None,
        }
    }

    pub fn players(players: Vec<PlayerId>, event: Event) -> Self {
        Self {
            event,
            audience: Audience::Players(players),
            redacted: None,
            secret: None,
        }
    }

    pub fn all_except(players: Vec<PlayerId>, event: Event) -> Self {
        Self {
            event,
            audience: Audience::AllExcept(players),
            redacted: None,
            secret: None,
        }
    }

    /// Mark the event as carrying hidden information. Everyone outside the audience gets a
    /// [`redact`]ed copy.
    pub fn hiding(mut self, secret: Secret) -> Self {
        self.redacted = Some(redact(&self.event));
        self.secret = Some(secret);
        self
    }

    /// Mark the event as hidden information without a redacted copy for outsiders.
    pub fn private(mut self, secret: Secret) -> Self {
        self.secret = Some(secret);
        self
    }
}

/// A connection's standing in a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Recipient {
    Seat(PlayerId),
    Observer(u32),
}

/// How much hidden information everyone gets to see.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservabilityMode {
    #[default]
    Hidden,
    /// Development cards are public.
    DevCards,
    /// Development cards and resources are public.
    Full,
}

impl ObservabilityMode {
    pub const fn code(self) -> u8 {
        match self {
            ObservabilityMode::Hidden => 0,
            ObservabilityMode::DevCards => 1,
            ObservabilityMode::Full => 2,
        }
    }

    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(ObservabilityMode::Hidden),
            1 => Some(ObservabilityMode::DevCards),
            2 => Some(ObservabilityMode::Full),
            _ => None,
        }
    }

    fn reveals(self, secret: Secret) -> bool {
        match secret {
            Secret::DevCard => self != ObservabilityMode::Hidden,
            Secret::Resource => self == ObservabilityMode::Full,
        }
    }
}

/// Concrete payloads for one event, in recipient order.
pub fn route(
    scoped: &ScopedEvent,
    recipients: &[Recipient],
    mode: ObservabilityMode,
) -> Vec<(Recipient, Event)> {
    let revealed = scoped.secret.is_some_and(|s| mode.reveals(s));
    recipients
        .iter()
        .filter_map(|&r| {
            if revealed || scoped.audience.admits(r) {
                Some((r, scoped.event.clone()))
            } else {
                scoped.redacted.clone().map(|e| (r, e))
            }
        })
        .collect()
}

/// Route a batch, keeping generation order for every recipient.
pub fn route_all(
    events: &[ScopedEvent],
    recipients: &[Recipient],
    mode: ObservabilityMode,
) -> Vec<(Recipient, Event)> {
    events
        .iter()
        .flat_map(|e| route(e, recipients, mode))
        .collect()
}

/// Replace typed resource and card fields with their unknown forms. Totals are kept.
pub fn redact(event: &Event) -> Event {
    let mut out = event.clone();
    match &mut out {
        Event::PlayerElements { resources, .. }
        | Event::Discarded { resources, .. }
        | Event::RobberyResult { resources, .. }
        | Event::PickedResources { resources, .. } => *resources = resources.redacted(),
        Event::DevCardAction { card, .. } => *card = DevCardKind::Unknown,
        Event::BankTraded { give, get, .. } | Event::OfferMade { give, get, .. } => {
            *give = give.redacted();
            *get = get.redacted();
        }
        Event::DiceResources { gains } => {
            for gain in gains {
                gain.resources = gain.resources.redacted();
            }
        }
        _ => {}
    }
    out
}
