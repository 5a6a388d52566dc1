//! Dice rolls, production, discards and the robber/pirate.

use std::collections::BTreeMap;

use settlers_protocol::{
    Coord, DiceGain, ElementAction, Event, Phase, PieceKind, PlayerElementKind, PlayerId,
    ResourceSet, Site,
};

use crate::layout::{geometry, Terrain};
use crate::ledger::{Action, ActionKind};
use crate::visibility::{ScopedEvent, Secret};
use crate::Rejection;

use super::state::{Rules, SessionState};

/// Production for one roll: resources and gold picks per player.
fn production(
    state: &SessionState,
    rules: Rules<'_>,
    total: u8,
) -> (BTreeMap<PlayerId, ResourceSet>, BTreeMap<PlayerId, u32>) {
    let mut gains: BTreeMap<PlayerId, ResourceSet> = BTreeMap::new();
    let mut gold: BTreeMap<PlayerId, u32> = BTreeMap::new();
    for (hex, tile) in rules.layout.hexes_rolling(total) {
        if Coord::hex(hex.q, hex.r) == state.robber {
            continue;
        }
        let corners = geometry::hex_corners(hex);
        for (_, owner, piece) in state.graph.buildings_on(&corners) {
            let amount = if piece == PieceKind::City { 2 } else { 1 };
            match (tile.terrain, tile.terrain.resource()) {
                (Terrain::Gold, _) => *gold.entry(owner).or_default() += amount,
                (_, Some(kind)) => gains.entry(owner).or_default().add(kind, amount),
                _ => {}
            }
        }
    }
    (gains, gold)
}

impl SessionState {
    pub(super) fn roll_dice(
        &mut self,
        rules: Rules<'_>,
        player: PlayerId,
        dice: [u8; 2],
        out: &mut Vec<ScopedEvent>,
    ) -> Result<Action, Rejection> {
        let total = dice[0] + dice[1];
        out.push(ScopedEvent::all(Event::DiceRolled {
            player,
            dice,
            total,
        }));

        if total == 7 {
            let limit = rules.options.hand_limit;
            self.pending_discards = self
                .seats()
                .filter_map(|p| {
                    let held = self.resources.total(p);
                    (held > limit).then_some((p, held / 2))
                })
                .collect();
            if self.pending_discards.is_empty() {
                self.start_robber(rules.layout, Phase::Play, out);
            } else {
                self.machine.set_robber_return(Phase::Play);
                self.set_phase(Phase::WaitingForDiscards, out);
                for (p, count) in &self.pending_discards {
                    out.push(ScopedEvent::one(
                        *p,
                        Event::DiscardRequest {
                            player: *p,
                            count: *count,
                        },
                    ));
                }
            }
            return Ok(Action::new(ActionKind::RollDice { dice }, player));
        }

        let (gains, gold) = production(self, rules, total);
        for (p, resources) in &gains {
            self.resources.gain(*p, resources);
        }
        if !gains.is_empty() {
            out.push(ScopedEvent::all(Event::DiceResources {
                gains: gains
                    .iter()
                    .map(|(p, resources)| DiceGain {
                        player: *p,
                        resources: *resources,
                        total: self.resources.total(*p),
                    })
                    .collect(),
            }));
            for p in gains.keys() {
                out.push(
                    ScopedEvent::one(
                        *p,
                        Event::PlayerElements {
                            player: *p,
                            action: ElementAction::Set,
                            resources: self.resources.hand(*p),
                        },
                    )
                    .private(Secret::Resource),
                );
            }
        }
        if gains.is_empty() && gold.is_empty() {
            out.push(ScopedEvent::all(Event::Text {
                text: "No player gets anything.".into(),
            }));
        }

        if gold.is_empty() {
            self.set_phase(Phase::Play, out);
        } else {
            for (p, count) in &gold {
                out.push(ScopedEvent::all(Event::PlayerElement {
                    player: *p,
                    action: ElementAction::Set,
                    element: PlayerElementKind::GoldPicks,
                    amount: *count,
                    news: false,
                }));
                out.push(ScopedEvent::one(
                    *p,
                    Event::GoldPickRequest {
                        player: *p,
                        count: *count,
                    },
                ));
            }
            self.pending_gold = gold;
            self.set_phase(Phase::WaitingForGoldPick, out);
        }
        Ok(Action::new(ActionKind::RollDice { dice }, player))
    }

    pub(super) fn discard(
        &mut self,
        rules: Rules<'_>,
        player: PlayerId,
        resources: ResourceSet,
        out: &mut Vec<ScopedEvent>,
    ) -> Result<Action, Rejection> {
        let Some(&count) = self.pending_discards.get(&player) else {
            return Err(Rejection::InvalidChoice);
        };
        if resources.unknown != 0 || resources.total() != count {
            return Err(Rejection::InvalidChoice);
        }
        self.resources.lose(player, &resources)?;
        self.pending_discards.remove(&player);

        out.push(
            ScopedEvent::one(player, Event::Discarded { player, resources })
                .hiding(Secret::Resource),
        );
        if self.pending_discards.is_empty() {
            let back = self.machine.robber_return();
            self.start_robber(rules.layout, back, out);
        } else {
            self.set_phase(Phase::WaitingForDiscards, out);
        }
        Ok(Action::new(ActionKind::Discard { resources }, player))
    }

    pub(super) fn choose_robber_or_pirate(
        &mut self,
        rules: Rules<'_>,
        player: PlayerId,
        pirate: bool,
        out: &mut Vec<ScopedEvent>,
    ) -> Result<Action, Rejection> {
        if pirate && !rules.layout.has_pirate() {
            return Err(Rejection::InvalidChoice);
        }
        let phase = if pirate {
            Phase::PlacingPirate
        } else {
            Phase::PlacingRobber
        };
        self.set_phase(phase, out);
        Ok(Action::new(
            ActionKind::ChooseRobberOrPirate { pirate },
            player,
        ))
    }

    /// Players the robber or pirate at `hex` could steal from.
    fn robbery_candidates(&self, player: PlayerId, hex: Coord, pirate: bool) -> Vec<PlayerId> {
        let Some(Site::Hex(h)) = hex.site() else {
            return Vec::new();
        };
        let mut owners: Vec<PlayerId> = if pirate {
            self.graph
                .ship_owners_on(&geometry::hex_edges(h))
                .into_iter()
                .collect()
        } else {
            let corners = geometry::hex_corners(h);
            self.graph
                .buildings_on(&corners)
                .map(|(_, owner, _)| owner)
                .collect()
        };
        owners.sort();
        owners.dedup();
        owners.retain(|p| *p != player && self.resources.total(*p) > 0);
        owners
    }

    pub(super) fn move_robber(
        &mut self,
        rules: Rules<'_>,
        player: PlayerId,
        hex: Coord,
        victim: Option<PlayerId>,
        out: &mut Vec<ScopedEvent>,
    ) -> Result<Action, Rejection> {
        let pirate = self.machine.phase() == Phase::PlacingPirate;
        let legal = if pirate {
            rules.layout.is_sea_hex(hex) && self.pirate != Some(hex)
        } else {
            rules.layout.is_land_hex(hex) && self.robber != hex
        };
        if !legal {
            return Err(Rejection::IllegalPlacement);
        }

        let candidates = self.robbery_candidates(player, hex, pirate);
        let victim = match (victim, candidates.as_slice()) {
            (None, []) => None,
            (None, [only]) => Some(*only),
            (Some(v), _) if candidates.contains(&v) => Some(v),
            _ => return Err(Rejection::InvalidChoice),
        };

        if pirate {
            self.pirate = Some(hex);
        } else {
            self.robber = hex;
        }
        out.push(ScopedEvent::all(Event::RobberMoved {
            player,
            hex,
            pirate,
        }));

        if let Some(victim) = victim {
            let cards = self.resources.hand(victim).cards();
            let pick = self.rng.below(cards.len().max(1) as u32) as usize;
            let kind = cards.get(pick).copied().ok_or(Rejection::InvalidChoice)?;
            let stolen = ResourceSet::of(kind, 1);
            self.resources.transfer(victim, player, &stolen)?;
            out.push(
                ScopedEvent::players(
                    vec![player, victim],
                    Event::RobberyResult {
                        perpetrator: player,
                        victim,
                        resources: stolen,
                    },
                )
                .hiding(Secret::Resource),
            );
        }

        let back = self.machine.robber_return();
        self.set_phase(back, out);
        Ok(Action::new(ActionKind::MoveRobber { hex, pirate }, player))
    }
}
