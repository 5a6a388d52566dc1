//! Session phase and the table of which commands each phase admits.

use settlers_protocol::{Command, Phase, PlayerId};

use crate::Rejection;

/// Who may send a command once its phase matches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Actor {
    Current,
    /// Any seat; the session checks the seat has something pending (discards, picks, offers).
    Anyone,
}

const PLACING: &[Phase] = &[
    Phase::PlacingRoad,
    Phase::PlacingSettlement,
    Phase::PlacingCity,
    Phase::PlacingShip,
];

/// Where a player may start a paid build or buy a card.
const TURN: &[Phase] = &[Phase::Play, Phase::SpecialBuilding];

const BUILDING: &[Phase] = &[
    Phase::Play,
    Phase::SpecialBuilding,
    Phase::PlacingRoad,
    Phase::PlacingSettlement,
    Phase::PlacingCity,
    Phase::PlacingShip,
    Phase::PlacingFreeRoad1,
    Phase::PlacingFreeRoad2,
];

fn gate(command: &Command) -> Option<(&'static [Phase], Actor)> {
    let gate = match command {
        Command::RollDice => (&[Phase::AwaitingRoll][..], Actor::Current),
        Command::EndTurn
        | Command::RequestBuild { .. }
        | Command::Undo { .. }
        | Command::BuyDevCard => (TURN, Actor::Current),
        Command::MovePiece { .. } | Command::BankTrade { .. } => {
            (&[Phase::Play][..], Actor::Current)
        }
        // The session checks the asker is not the current player.
        Command::AskSpecialBuild => (&[Phase::AwaitingRoll, Phase::Play][..], Actor::Anyone),
        Command::CancelBuild => (PLACING, Actor::Current),
        Command::Build { .. } => (BUILDING, Actor::Current),
        // Only knights are playable before the roll; the session checks the card.
        Command::PlayDevCard { .. } => (&[Phase::Play, Phase::AwaitingRoll][..], Actor::Current),
        Command::PickMonopoly { .. } => (&[Phase::WaitingForMonopoly][..], Actor::Current),
        Command::PickResources { .. } => (
            &[Phase::WaitingForDiscovery, Phase::WaitingForGoldPick][..],
            Actor::Anyone,
        ),
        Command::Discard { .. } => (&[Phase::WaitingForDiscards][..], Actor::Anyone),
        Command::ChooseRobberOrPirate { .. } => {
            (&[Phase::WaitingForRobberOrPirate][..], Actor::Current)
        }
        Command::MoveRobber { .. } => {
            (&[Phase::PlacingRobber, Phase::PlacingPirate][..], Actor::Current)
        }
        Command::MakeOffer { .. } | Command::ClearOffer | Command::AcceptOffer { .. } => {
            (&[Phase::Play][..], Actor::Anyone)
        }
        Command::Unsupported => return None,
    };
    Some(gate)
}

/// Whose turn it is and what the session is waiting for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionStateMachine {
    phase: Phase,
    current: PlayerId,
    turn: u32,
    seats: u8,
    /// Where to go once the robber or pirate has been placed.
    robber_return: Phase,
    /// Set while special building runs: the seat whose regular turn it follows.
    special_after: Option<PlayerId>,
}

impl SessionStateMachine {
    /// Seat 0 to roll, turn 1.
    pub fn new(seats: u8) -> Self {
        Self {
            phase: Phase::AwaitingRoll,
            current: PlayerId(0),
            turn: 1,
            seats: seats.max(1),
            robber_return: Phase::Play,
            special_after: None,
        }
    }

    pub fn resume(
        seats: u8,
        phase: Phase,
        current: PlayerId,
        turn: u32,
        robber_return: Phase,
    ) -> Self {
        Self {
            phase,
            current,
            turn,
            seats: seats.max(1),
            robber_return,
            special_after: None,
        }
    }

    /// Resume in the middle of special building that follows `after`'s turn.
    pub fn with_special_build(mut self, after: Option<PlayerId>) -> Self {
        self.special_after = after;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_player(&self) -> PlayerId {
        self.current
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn seats(&self) -> u8 {
        self.seats
    }

    pub fn robber_return(&self) -> Phase {
        self.robber_return
    }

    pub fn special_build_after(&self) -> Option<PlayerId> {
        self.special_after
    }

    /// The phase a finished build or purchase returns to.
    pub fn build_home(&self) -> Phase {
        if self.special_after.is_some() {
            Phase::SpecialBuilding
        } else {
            Phase::Play
        }
    }

    pub fn is_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    /// Whether `player` may send `command` now.
    pub fn check(&self, player: PlayerId, command: &Command) -> Result<(), Rejection> {
        if self.is_over() {
            return Err(Rejection::WrongPhase);
        }
        let (phases, actor) = gate(command).ok_or(Rejection::UnknownActionKind)?;
        if !phases.contains(&self.phase) {
            return Err(Rejection::WrongPhase);
        }
        if actor == Actor::Current && player != self.current {
            return Err(Rejection::NotCurrentPlayer);
        }
        if player.0 >= self.seats {
            return Err(Rejection::NotCurrentPlayer);
        }
        Ok(())
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub(crate) fn set_robber_return(&mut self, phase: Phase) {
        self.robber_return = phase;
    }

    /// Let `seat` build out of turn after `after`'s regular turn.
    pub(crate) fn start_special_build(&mut self, after: PlayerId, seat: PlayerId) {
        self.special_after = Some(after);
        self.current = seat;
        self.phase = Phase::SpecialBuilding;
    }

    /// Hand the turn to the seat after the last regular turn, waiting for its roll. Returns the
    /// new current player.
    pub(crate) fn next_turn(&mut self) -> PlayerId {
        let after = self.special_after.take().unwrap_or(self.current);
        self.current = PlayerId((after.0 + 1) % self.seats);
        self.turn += 1;
        self.phase = Phase::AwaitingRoll;
        self.robber_return = Phase::Play;
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use settlers_protocol::{PieceKind, ResourceSet};

    #[test]
    fn starts_with_seat_zero_rolling() {
        let sm = SessionStateMachine::new(4);
        assert_eq!(sm.phase(), Phase::AwaitingRoll);
        assert_eq!(sm.current_player(), PlayerId(0));
        assert_eq!(sm.check(PlayerId(0), &Command::RollDice), Ok(()));
        assert_eq!(
            sm.check(PlayerId(1), &Command::RollDice),
            Err(Rejection::NotCurrentPlayer)
        );
        assert_eq!(
            sm.check(PlayerId(0), &Command::EndTurn),
            Err(Rejection::WrongPhase)
        );
    }

    #[test]
    fn discards_come_from_any_seat() {
        let sm = SessionStateMachine::resume(
            3,
            Phase::WaitingForDiscards,
            PlayerId(0),
            4,
            Phase::Play,
        );
        let discard = Command::Discard {
            resources: ResourceSet::new(1, 0, 0, 0, 0),
        };
        assert_eq!(sm.check(PlayerId(2), &discard), Ok(()));
        assert_eq!(
            sm.check(PlayerId(7), &discard),
            Err(Rejection::NotCurrentPlayer)
        );
    }

    #[test]
    fn game_over_rejects_everything() {
        let sm =
            SessionStateMachine::resume(2, Phase::GameOver, PlayerId(1), 30, Phase::Play);
        for cmd in [
            Command::RollDice,
            Command::EndTurn,
            Command::Unsupported,
            Command::Build {
                piece: PieceKind::Road,
                at: settlers_protocol::Coord::NONE,
            },
        ] {
            assert_eq!(sm.check(PlayerId(1), &cmd), Err(Rejection::WrongPhase));
        }
    }

    #[test]
    fn unsupported_commands_are_unknown() {
        let sm = SessionStateMachine::new(2);
        assert_eq!(
            sm.check(PlayerId(0), &Command::Unsupported),
            Err(Rejection::UnknownActionKind)
        );
    }

    #[test]
    fn special_building_admits_builds_but_not_trades() {
        let mut sm = SessionStateMachine::new(6);
        sm.start_special_build(PlayerId(2), PlayerId(5));
        assert_eq!(sm.phase(), Phase::SpecialBuilding);
        assert_eq!(sm.build_home(), Phase::SpecialBuilding);
        assert_eq!(
            sm.check(PlayerId(5), &Command::RequestBuild { piece: PieceKind::Road }),
            Ok(())
        );
        assert_eq!(sm.check(PlayerId(5), &Command::BuyDevCard), Ok(()));
        assert_eq!(
            sm.check(PlayerId(2), &Command::EndTurn),
            Err(Rejection::NotCurrentPlayer)
        );
        let trade = Command::BankTrade {
            give: ResourceSet::new(4, 0, 0, 0, 0),
            get: ResourceSet::new(0, 1, 0, 0, 0),
        };
        assert_eq!(sm.check(PlayerId(5), &trade), Err(Rejection::WrongPhase));
        assert_eq!(
            sm.check(PlayerId(1), &Command::AskSpecialBuild),
            Err(Rejection::WrongPhase)
        );

        // the next regular turn follows seat 2, not the builder
        assert_eq!(sm.next_turn(), PlayerId(3));
        assert_eq!(sm.special_build_after(), None);
        assert_eq!(sm.build_home(), Phase::Play);
    }

    #[test]
    fn next_turn_wraps_around() {
        let mut sm = SessionStateMachine::resume(3, Phase::Play, PlayerId(2), 9, Phase::Play);
        assert_eq!(sm.next_turn(), PlayerId(0));
        assert_eq!(sm.turn(), 10);
        assert_eq!(sm.phase(), Phase::AwaitingRoll);
    }
}
