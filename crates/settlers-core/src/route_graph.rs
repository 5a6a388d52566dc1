//! Piece occupancy, longest-route lengths and sea-route closure.

use std::collections::{BTreeMap, BTreeSet};

use settlers_protocol::{Coord, PieceKind, PlayerId};

use crate::layout::geometry;
use crate::Rejection;

/// Shortest route that can hold the longest-route title.
pub const MIN_LONGEST_ROUTE: u32 = 5;

/// Who owns what where. Nodes hold settlements/cities, edges hold roads/ships.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RouteGraph {
    nodes: BTreeMap<Coord, (PlayerId, PieceKind)>,
    edges: BTreeMap<Coord, (PlayerId, PieceKind)>,
    closed: BTreeSet<Coord>,
    holder: Option<PlayerId>,
}

impl RouteGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a piece. A city replaces the owner's settlement; everything else needs a free spot.
    pub fn add_piece(
        &mut self,
        player: PlayerId,
        piece: PieceKind,
        at: Coord,
    ) -> Result<(), Rejection> {
        match piece {
            PieceKind::Settlement => {
                if !at.is_node() || self.nodes.contains_key(&at) {
                    return Err(Rejection::IllegalPlacement);
                }
                self.nodes.insert(at, (player, piece));
            }
            PieceKind::City => {
                if self.nodes.get(&at) != Some(&(player, PieceKind::Settlement)) {
                    return Err(Rejection::IllegalPlacement);
                }
                self.nodes.insert(at, (player, piece));
            }
            PieceKind::Road | PieceKind::Ship => {
                if !at.is_edge() || self.edges.contains_key(&at) {
                    return Err(Rejection::IllegalPlacement);
                }
                self.edges.insert(at, (player, piece));
            }
        }
        Ok(())
    }

    /// Remove whatever occupies `at`. Also clears the closed flag of a removed ship.
    pub fn remove_piece(&mut self, at: Coord) -> Option<(PlayerId, PieceKind)> {
        if let Some(piece) = self.nodes.remove(&at) {
            return Some(piece);
        }
        self.closed.remove(&at);
        self.edges.remove(&at)
    }

    pub fn move_piece(&mut self, from: Coord, to: Coord) -> Result<(), Rejection> {
        let Some(&(player, piece)) = self.edges.get(&from) else {
            return Err(Rejection::IllegalPlacement);
        };
        if self.edges.contains_key(&to) || !to.is_edge() {
            return Err(Rejection::IllegalPlacement);
        }
        self.edges.remove(&from);
        self.closed.remove(&from);
        self.edges.insert(to, (player, piece));
        Ok(())
    }

    pub fn piece_at(&self, at: Coord) -> Option<(PlayerId, PieceKind)> {
        self.nodes
            .get(&at)
            .or_else(|| self.edges.get(&at))
            .copied()
    }

    pub fn node_owner(&self, node: Coord) -> Option<PlayerId> {
        self.nodes.get(&node).map(|(p, _)| *p)
    }

    /// Every piece, nodes first, in coordinate order.
    pub fn pieces(&self) -> impl Iterator<Item = (Coord, PlayerId, PieceKind)> + '_ {
        self.nodes
            .iter()
            .chain(self.edges.iter())
            .map(|(at, (p, k))| (*at, *p, *k))
    }

    pub fn count(&self, player: PlayerId, piece: PieceKind) -> u32 {
        let source = if piece.is_linear() {
            &self.edges
        } else {
            &self.nodes
        };
        source
            .values()
            .filter(|(p, k)| *p == player && *k == piece)
            .count() as u32
    }

    /// Settlements and cities of `player` that touch any of `nodes`.
    pub fn buildings_on<'a>(
        &'a self,
        nodes: &'a [Coord],
    ) -> impl Iterator<Item = (Coord, PlayerId, PieceKind)> + 'a {
        nodes
            .iter()
            .filter_map(|n| self.nodes.get(n).map(|(p, k)| (*n, *p, *k)))
    }

    /// Owners of ships on any of `edges`.
    pub fn ship_owners_on(&self, edges: &[Coord]) -> BTreeSet<PlayerId> {
        edges
            .iter()
            .filter_map(|e| match self.edges.get(e) {
                Some((p, PieceKind::Ship)) => Some(*p),
                _ => None,
            })
            .collect()
    }

    /// Whether `player` has a road or ship ending at `node`.
    pub fn touches_route(&self, player: PlayerId, node: Coord) -> bool {
        geometry::node_edges(node)
            .into_iter()
            .any(|e| matches!(self.edges.get(&e), Some((p, _)) if *p == player))
    }

    /// Linear pieces of `player` and `kind` meeting at `node`, excluding `skip`.
    pub fn linear_at(
        &self,
        player: PlayerId,
        node: Coord,
        skip: Coord,
    ) -> impl Iterator<Item = (Coord, PieceKind)> + '_ {
        geometry::node_edges(node)
            .into_iter()
            .filter(move |e| *e != skip)
            .filter_map(move |e| match self.edges.get(&e) {
                Some((p, k)) if *p == player => Some((e, *k)),
                _ => None,
            })
    }

    pub fn is_closed(&self, edge: Coord) -> bool {
        self.closed.contains(&edge)
    }

    pub fn closed_edges(&self) -> impl Iterator<Item = Coord> + '_ {
        self.closed.iter().copied()
    }

    pub fn close(&mut self, edges: &[Coord]) {
        self.closed.extend(edges.iter().copied());
    }

    pub fn reopen(&mut self, edges: &[Coord]) {
        for e in edges {
            self.closed.remove(e);
        }
    }

    pub fn holder(&self) -> Option<PlayerId> {
        self.holder
    }

    pub fn set_holder(&mut self, holder: Option<PlayerId>) {
        self.holder = holder;
    }

    /// Length of the longest trail (no edge used twice) of `player`'s roads and ships.
    ///
    /// The trail stops at nodes held by an opponent and may only switch between roads and
    /// ships at the player's own settlement or city.
    pub fn longest_route(&self, player: PlayerId) -> u32 {
        let starts: BTreeSet<Coord> = self
            .edges
            .iter()
            .filter(|(_, (p, _))| *p == player)
            .flat_map(|(e, _)| geometry::edge_nodes(*e))
            .collect();

        let mut used = BTreeSet::new();
        starts
            .into_iter()
            .map(|node| self.walk(player, node, None, &mut used))
            .max()
            .unwrap_or(0)
    }

    fn walk(
        &self,
        player: PlayerId,
        at: Coord,
        arrived_by: Option<PieceKind>,
        used: &mut BTreeSet<Coord>,
    ) -> u32 {
        let owner = self.node_owner(at);
        if arrived_by.is_some() && owner.is_some_and(|o| o != player) {
            return 0;
        }

        let mut best = 0;
        for e in geometry::node_edges(at) {
            if used.contains(&e) {
                continue;
            }
            let Some(&(p, kind)) = self.edges.get(&e) else {
                continue;
            };
            if p != player {
                continue;
            }
            if arrived_by.is_some_and(|prev| prev != kind) && owner != Some(player) {
                continue;
            }
            let Some(next) = geometry::other_end(e, at) else {
                continue;
            };
            used.insert(e);
            best = best.max(1 + self.walk(player, next, Some(kind), used));
            used.remove(&e);
        }
        best
    }

    /// Who should hold the longest-route title given the current pieces.
    ///
    /// The holder keeps it while nobody strictly exceeds them and their route is still at least
    /// [`MIN_LONGEST_ROUTE`]. Otherwise the unique longest route of at least that length takes
    /// it; a tie for the lead leaves the title vacant.
    pub fn best_holder(&self) -> Option<PlayerId> {
        let players: BTreeSet<PlayerId> = self.edges.values().map(|(p, _)| *p).collect();
        let lengths: Vec<(PlayerId, u32)> = players
            .into_iter()
            .map(|p| (p, self.longest_route(p)))
            .collect();

        if let Some(holder) = self.holder {
            let held = lengths
                .iter()
                .find(|(p, _)| *p == holder)
                .map_or(0, |(_, n)| *n);
            let challenger = lengths
                .iter()
                .filter(|(p, _)| *p != holder)
                .map(|(_, n)| *n)
                .max()
                .unwrap_or(0);
            if held >= MIN_LONGEST_ROUTE && held >= challenger {
                return Some(holder);
            }
        }

        let top = lengths.iter().map(|(_, n)| *n).max().unwrap_or(0);
        if top < MIN_LONGEST_ROUTE {
            return None;
        }
        let mut leaders = lengths.iter().filter(|(_, n)| *n == top);
        match (leaders.next(), leaders.next()) {
            (Some((p, _)), None) => Some(*p),
            _ => None,
        }
    }

    /// Open ships of `player` that a piece just placed at `at` closes.
    ///
    /// `at` is either a settlement node or a ship edge. A ship chain closes when it joins two of
    /// the player's settlements/cities; every ship on a joining path closes, dead-end branches
    /// stay open. Returned in coordinate order.
    pub fn closing_ships(&self, player: PlayerId, at: Coord) -> Vec<Coord> {
        let mut closing = BTreeSet::new();
        if at.is_node() {
            if self.node_owner(at) != Some(player) {
                return Vec::new();
            }
            let mut path = Vec::new();
            self.collect_joining(player, at, at, &mut path, &mut closing);
        } else if matches!(self.edges.get(&at), Some((p, PieceKind::Ship)) if *p == player) {
            let ends = geometry::edge_nodes(at);
            let mut sides = Vec::with_capacity(2);
            for end in ends {
                let mut found = BTreeSet::new();
                let reached = if self.node_owner(end) == Some(player) {
                    true
                } else {
                    let mut path = vec![at];
                    self.collect_joining(player, at, end, &mut path, &mut found);
                    // `collect_joining` records `at` with each joining path.
                    !found.is_empty()
                };
                sides.push((reached, found));
            }
            if sides.iter().all(|(reached, _)| *reached) {
                closing.insert(at);
                for (_, found) in sides {
                    closing.extend(found);
                }
            }
        }
        closing.into_iter().collect()
    }

    /// Depth-first search over open ships from `node`, recording every ship on a path that ends at
    /// one of the player's settlements/cities other than `origin`.
    fn collect_joining(
        &self,
        player: PlayerId,
        origin: Coord,
        node: Coord,
        path: &mut Vec<Coord>,
        out: &mut BTreeSet<Coord>,
    ) {
        for e in geometry::node_edges(node) {
            if path.contains(&e) || self.closed.contains(&e) {
                continue;
            }
            if !matches!(self.edges.get(&e), Some((p, PieceKind::Ship)) if *p == player) {
                continue;
            }
            let Some(next) = geometry::other_end(e, node) else {
                continue;
            };
            path.push(e);
            match self.node_owner(next) {
                Some(owner) if owner == player && next != origin => {
                    out.extend(path.iter().copied());
                }
                Some(owner) if owner != player => {}
                _ => self.collect_joining(player, origin, next, path, out),
            }
            path.pop();
        }
    }
}
