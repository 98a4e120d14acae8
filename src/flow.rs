//! Screen flow: menu, match, outcome, and back to the menu
//!
//! The front-end only translates clicks into [`FlowAction`]s and feeds a
//! [`TickInput`] per tick; every transition happens here.

use crate::settings::Settings;
use crate::sim::{GameState, Side, TickInput, tick};

/// Which screen is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Menu,
    Playing,
    Outcome { winner: Side },
    /// Player chose to quit; nothing runs after this
    Quit,
}

/// Button actions from the menu and outcome screens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowAction {
    Play,
    PlayAgain,
    Quit,
}

/// Owns the settings and the current match, if any
#[derive(Debug, Clone)]
pub struct ScreenFlow {
    screen: Screen,
    settings: Settings,
    game: Option<GameState>,
    matches_played: u32,
}

impl ScreenFlow {
    pub fn new(settings: Settings) -> Self {
        Self {
            screen: Screen::Menu,
            settings,
            game: None,
            matches_played: 0,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The running or just-finished match
    pub fn game(&self) -> Option<&GameState> {
        self.game.as_ref()
    }

    pub fn matches_played(&self) -> u32 {
        self.matches_played
    }

    /// Apply a button action. Actions that make no sense on the current
    /// screen are ignored. `seed` is only used when a match starts.
    pub fn handle(&mut self, action: FlowAction, seed: u64) -> Screen {
        let next = match (self.screen, action) {
            (Screen::Menu, FlowAction::Play) => {
                self.game = Some(GameState::new(seed, &self.settings));
                log::info!("Match started with seed: {}", seed);
                Screen::Playing
            }
            (Screen::Outcome { .. }, FlowAction::PlayAgain) => {
                self.game = None;
                Screen::Menu
            }
            (Screen::Menu | Screen::Outcome { .. }, FlowAction::Quit) => {
                self.game = None;
                Screen::Quit
            }
            (screen, action) => {
                log::debug!("Ignoring {:?} on {:?}", action, screen);
                screen
            }
        };

        if next != self.screen {
            log::info!("Screen: {:?} -> {:?}", self.screen, next);
            self.screen = next;
        }
        self.screen
    }

    /// Run one simulation tick if a match is in progress
    pub fn advance(&mut self, input: TickInput) -> Screen {
        if self.screen != Screen::Playing {
            return self.screen;
        }
        let Some(game) = self.game.as_mut() else {
            return self.screen;
        };

        tick(game, input, &self.settings);

        if let Some(winner) = game.winner() {
            self.matches_played += 1;
            log::info!("Screen: Playing -> Outcome ({} wins)", winner.player_name());
            self.screen = Screen::Outcome { winner };
        }
        self.screen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Ball, GamePhase};
    use glam::IVec2;

    fn finish_quickly(flow: &mut ScreenFlow) {
        let settings = flow.settings().clone();
        let game = flow.game.as_mut().expect("match running");
        game.paddle_mut(Side::Right).health = 1;
        game.balls = vec![Ball::new(1, IVec2::new(735, 290), IVec2::new(3, 3), &settings)];
    }

    #[test]
    fn test_full_loop() {
        let mut flow = ScreenFlow::new(Settings::default());
        assert_eq!(flow.screen(), Screen::Menu);
        assert!(flow.game().is_none());

        assert_eq!(flow.handle(FlowAction::Play, 5), Screen::Playing);
        assert_eq!(flow.game().map(|g| g.seed), Some(5));

        finish_quickly(&mut flow);
        assert_eq!(
            flow.advance(TickInput::default()),
            Screen::Outcome { winner: Side::Left }
        );
        assert_eq!(flow.matches_played(), 1);
        // Finished match stays visible behind the outcome screen
        assert!(matches!(
            flow.game().map(|g| g.phase),
            Some(GamePhase::Finished { .. })
        ));

        assert_eq!(flow.handle(FlowAction::PlayAgain, 0), Screen::Menu);
        assert!(flow.game().is_none());
    }

    #[test]
    fn test_new_match_is_fresh() {
        let mut flow = ScreenFlow::new(Settings::default());
        flow.handle(FlowAction::Play, 11);
        finish_quickly(&mut flow);
        flow.advance(TickInput::default());
        flow.handle(FlowAction::PlayAgain, 0);
        flow.handle(FlowAction::Play, 11);

        let game = flow.game().expect("match running");
        assert_eq!(game, &GameState::new(11, flow.settings()));
    }

    #[test]
    fn test_ignored_actions() {
        let mut flow = ScreenFlow::new(Settings::default());
        assert_eq!(flow.handle(FlowAction::PlayAgain, 1), Screen::Menu);

        flow.handle(FlowAction::Play, 1);
        assert_eq!(flow.handle(FlowAction::Quit, 1), Screen::Playing);
        assert_eq!(flow.handle(FlowAction::Play, 2), Screen::Playing);
        assert_eq!(flow.game().map(|g| g.seed), Some(1));
    }

    #[test]
    fn test_quit_is_terminal() {
        let mut flow = ScreenFlow::new(Settings::default());
        assert_eq!(flow.handle(FlowAction::Quit, 0), Screen::Quit);
        assert_eq!(flow.handle(FlowAction::Play, 0), Screen::Quit);
        assert_eq!(flow.advance(TickInput::default()), Screen::Quit);
        assert!(flow.game().is_none());
    }

    #[test]
    fn test_advance_outside_match_is_noop() {
        let mut flow = ScreenFlow::new(Settings::default());
        assert_eq!(flow.advance(TickInput::default()), Screen::Menu);
        assert!(flow.game().is_none());
    }
}
