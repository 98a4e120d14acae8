//! Deadly Bounce entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlCanvasElement, KeyboardEvent, MouseEvent};

    use deadly_bounce::consts::MAX_SUBSTEPS;
    use deadly_bounce::renderer::{SdfRenderState, backing_size};
    use deadly_bounce::settings::normalize_key;
    use deadly_bounce::sim::{GameEvent, Side};
    use deadly_bounce::{FlowAction, Screen, ScreenFlow, Settings};

    /// Game instance holding all state
    struct Game {
        flow: ScreenFlow,
        render_state: Option<SdfRenderState>,
        accumulator: f32,
        last_time: f64,
        /// Keys currently held, normalized
        held_keys: HashSet<String>,
        idle_mode: bool,
        last_screen: Screen,
    }

    impl Game {
        fn new(settings: Settings) -> Self {
            Self {
                flow: ScreenFlow::new(settings),
                render_state: None,
                accumulator: 0.0,
                last_time: 0.0,
                held_keys: HashSet::new(),
                idle_mode: false,
                last_screen: Screen::Menu,
            }
        }

        fn tick_dt(&self) -> f32 {
            1.0 / self.flow.settings().tick_rate as f32
        }

        /// Run simulation ticks
        fn update(&mut self, dt: f32) {
            if self.flow.screen() != Screen::Playing {
                self.accumulator = 0.0;
                return;
            }

            let tick_dt = self.tick_dt();
            self.accumulator += dt.min(0.1);

            let mut substeps = 0;
            while self.accumulator >= tick_dt && substeps < MAX_SUBSTEPS {
                // One immutable snapshot per tick
                let input = self
                    .flow
                    .settings()
                    .controls
                    .snapshot(|k| self.held_keys.contains(k), self.idle_mode);
                self.flow.advance(input);
                self.accumulator -= tick_dt;
                substeps += 1;

                if let Some(game) = self.flow.game() {
                    for event in &game.events {
                        log::debug!("{:?}", event);
                        if let GameEvent::PaddleDamaged { side, health, .. } = event {
                            log::info!("{} hit, {} HP left", side.player_name(), health);
                        }
                    }
                }

                if self.flow.screen() != Screen::Playing {
                    self.accumulator = 0.0;
                    break;
                }
            }
        }

        /// Render the current frame
        fn render(&mut self, time: f64) {
            let game = self.flow.game();
            let settings = self.flow.settings();
            if let Some(ref mut render_state) = self.render_state {
                match render_state.render(game, settings, time) {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => {
                        render_state.resize(render_state.size.0, render_state.size.1);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory!");
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }
        }

        /// Update HUD elements and overlays in DOM
        fn update_hud(&mut self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };

            if let Some(game) = self.flow.game() {
                let settings = self.flow.settings();
                set_text(
                    &document,
                    "#hud-p1 .hud-value",
                    &game.paddle(Side::Left).health.to_string(),
                );
                set_text(
                    &document,
                    "#hud-p2 .hud-value",
                    &game.paddle(Side::Right).health.to_string(),
                );
                set_text(
                    &document,
                    "#hud-countdown .hud-value",
                    &format!("{}s", game.next_color_change_secs(settings)),
                );
            }

            let screen = self.flow.screen();
            if screen == self.last_screen {
                return;
            }
            self.last_screen = screen;

            set_visible(&document, "hud", matches!(screen, Screen::Playing | Screen::Outcome { .. }));
            set_visible(&document, "menu", screen == Screen::Menu);
            set_visible(&document, "outcome", matches!(screen, Screen::Outcome { .. }));
            set_visible(&document, "goodbye", screen == Screen::Quit);
            set_visible(&document, "canvas", screen != Screen::Quit);

            if let Screen::Outcome { winner } = screen {
                if let Some(el) = document.get_element_by_id("winner-text") {
                    el.set_text_content(Some(&format!("{} wins!", winner.player_name())));
                }
            }
        }
    }

    fn set_text(document: &Document, selector: &str, text: &str) {
        if let Some(el) = document.query_selector(selector).ok().flatten() {
            if el.text_content().as_deref() != Some(text) {
                el.set_text_content(Some(text));
            }
        }
    }

    fn set_visible(document: &Document, id: &str, visible: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let classes = el.class_list();
            let _ = if visible {
                classes.remove_1("hidden")
            } else {
                classes.add_1("hidden")
            };
        }
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Deadly Bounce starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let settings = Settings::load();

        // Hide loading indicator
        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        let (width, height) = fit_canvas(&window, &canvas);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .expect("Failed to create surface");

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .expect("Failed to get adapter");

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let mut render_state = SdfRenderState::new(surface, &adapter, width, height, &settings).await;
        render_state.set_start_time(js_sys::Date::now());

        let game = Rc::new(RefCell::new(Game::new(settings)));
        game.borrow_mut().render_state = Some(render_state);
        // Force the first overlay sync
        game.borrow_mut().last_screen = Screen::Quit;

        setup_input_handlers(game.clone());
        setup_resize_handler(game.clone(), canvas);
        setup_buttons(game.clone());

        request_animation_frame(game);

        log::info!("Deadly Bounce running!");
    }

    fn setup_input_handlers(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();

        // Key down
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let key = normalize_key(&event.key());
                let mut g = game.borrow_mut();
                if key == "i" && !event.repeat() {
                    g.idle_mode = !g.idle_mode;
                    log::info!("Idle mode: {}", g.idle_mode);
                }
                if key.starts_with("arrow") {
                    event.prevent_default();
                }
                g.held_keys.insert(key);
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Key up
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                game.borrow_mut().held_keys.remove(&normalize_key(&event.key()));
            });
            let _ = window
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Window blur: drop held keys so paddles don't drift
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                game.borrow_mut().held_keys.clear();
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// Size the canvas backing store to device resolution; the shader letterboxes the arena
    fn fit_canvas(window: &web_sys::Window, canvas: &HtmlCanvasElement) -> (u32, u32) {
        let (width, height) = backing_size(
            canvas.client_width(),
            canvas.client_height(),
            window.device_pixel_ratio(),
        );
        canvas.set_width(width);
        canvas.set_height(height);
        (width, height)
    }

    fn setup_resize_handler(game: Rc<RefCell<Game>>, canvas: HtmlCanvasElement) {
        let window = web_sys::window().unwrap();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let Some(window) = web_sys::window() else {
                return;
            };
            let (width, height) = fit_canvas(&window, &canvas);
            if let Some(render_state) = game.borrow_mut().render_state.as_mut() {
                render_state.resize(width, height);
                log::debug!("Resized to {}x{}", width, height);
            }
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_buttons(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let document = window.document().unwrap();

        let buttons = [
            ("play-btn", FlowAction::Play),
            ("quit-btn", FlowAction::Quit),
            ("play-again-btn", FlowAction::PlayAgain),
            ("outcome-quit-btn", FlowAction::Quit),
        ];

        for (id, action) in buttons {
            let Some(btn) = document.get_element_by_id(id) else {
                log::warn!("Missing button #{}", id);
                continue;
            };
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let seed = js_sys::Date::now() as u64;
                let mut g = game.borrow_mut();
                g.flow.handle(action, seed);
                g.held_keys.clear();
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();

            // Calculate delta time
            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                g.tick_dt()
            };
            g.last_time = time;

            g.update(dt);
            g.render(time);
            g.update_hud();

            if g.flow.screen() == Screen::Quit {
                log::info!("Quit after {} matches", g.flow.matches_played());
                return;
            }
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Run a headless autopilot match
#[cfg(not(target_arch = "wasm32"))]
#[derive(clap::Parser, Debug)]
#[command(name = "deadly-bounce", version)]
struct Args {
    /// Match seed (random when omitted)
    #[arg(long)]
    seed: Option<u64>,
    /// JSON settings file
    #[arg(long)]
    settings: Option<std::path::PathBuf>,
    /// Give up after this many ticks
    #[arg(long, default_value_t = 36000)]
    max_ticks: u64,
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use clap::Parser;

    use deadly_bounce::sim::{GameEvent, TickInput};
    use deadly_bounce::{FlowAction, Screen, ScreenFlow, Settings};

    let args = Args::parse();

    env_logger::init();
    log::info!("Deadly Bounce (native) starting...");
    log::info!("Native mode runs a headless autopilot match - run with `trunk serve` to play");

    let seed = args.seed.unwrap_or_else(rand::random);
    let max_ticks = args.max_ticks;

    let settings = Settings::load(args.settings.as_deref());
    let mut flow = ScreenFlow::new(settings);
    flow.handle(FlowAction::Play, seed);

    let idle = TickInput {
        idle_mode: true,
        ..Default::default()
    };

    let mut ticks = 0;
    while flow.screen() == Screen::Playing && ticks < max_ticks {
        flow.advance(idle);
        ticks += 1;

        if let Some(game) = flow.game() {
            for event in &game.events {
                match event {
                    GameEvent::PaddleDamaged { side, health, .. } => {
                        log::info!("tick {}: {} hit, {} HP left", ticks, side.player_name(), health)
                    }
                    other => log::debug!("tick {}: {:?}", ticks, other),
                }
            }
        }
    }

    match flow.screen() {
        Screen::Outcome { winner } => println!("{} wins! ({} ticks, seed {})", winner.player_name(), ticks, seed),
        _ => println!("No winner after {} ticks (seed {})", ticks, seed),
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use clap::Parser;
    use clap::error::ErrorKind;

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["deadly-bounce"]).unwrap();
        assert_eq!(args.seed, None);
        assert_eq!(args.settings, None);
        assert_eq!(args.max_ticks, 36000);
    }

    #[test]
    fn test_args_all_flags() {
        let args = Args::try_parse_from([
            "deadly-bounce",
            "--seed",
            "42",
            "--settings",
            "match.json",
            "--max-ticks",
            "100",
        ])
        .unwrap();
        assert_eq!(args.seed, Some(42));
        assert_eq!(args.settings.as_deref(), Some(std::path::Path::new("match.json")));
        assert_eq!(args.max_ticks, 100);
    }

    #[test]
    fn test_args_errors() {
        let err = Args::try_parse_from(["deadly-bounce", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);

        let err = Args::try_parse_from(["deadly-bounce", "--seed"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);

        let err = Args::try_parse_from(["deadly-bounce", "--seed", "abc"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);

        let err = Args::try_parse_from(["deadly-bounce", "--bogus"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }
}
