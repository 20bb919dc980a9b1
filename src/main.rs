//! Rhythm Dash entry point
//!
//! On the web this boots the canvas, WebGPU, audio and input listeners and
//! runs the animation-frame loop. Natively it runs a headless autopilot
//! through the built-in levels and logs the outcomes.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlCanvasElement, HtmlElement, KeyboardEvent, PointerEvent};

    use rhythm_dash::audio::{AudioTransport, TransportHandle, WebAudioTransport};
    use rhythm_dash::game::{Game, key_command};
    use rhythm_dash::renderer::{RenderSink, RenderState, SceneStyle};
    use rhythm_dash::sim::{Catalog, Command, SessionState};
    use rhythm_dash::{FrameSnapshot, Settings, Tuning};

    /// DOM HUD, looked up once; every element is optional
    struct Hud {
        status: Option<HtmlElement>,
        overlay: Option<HtmlElement>,
        overlay_year: Option<HtmlElement>,
        overlay_text: Option<HtmlElement>,
        beat_bar: Option<HtmlElement>,
        menu: Option<HtmlElement>,
        menu_level: Option<HtmlElement>,
        last_status: String,
    }

    impl Hud {
        fn new(document: &Document) -> Self {
            let get = |id: &str| {
                document
                    .get_element_by_id(id)
                    .and_then(|el| el.dyn_into::<HtmlElement>().ok())
            };
            Self {
                status: get("status"),
                overlay: get("overlay"),
                overlay_year: get("overlay-year"),
                overlay_text: get("overlay-text"),
                beat_bar: get("beat-bar"),
                menu: get("menu"),
                menu_level: get("menu-level"),
                last_status: String::new(),
            }
        }

        fn set_hidden(el: &Option<HtmlElement>, hidden: bool) {
            if let Some(el) = el {
                let _ = el.class_list().toggle_with_force("hidden", hidden);
            }
        }

        fn update(&mut self, snapshot: &FrameSnapshot<'_>) {
            if snapshot.status_text != self.last_status {
                if let Some(el) = &self.status {
                    el.set_text_content(Some(&snapshot.status_text));
                }
                self.last_status = snapshot.status_text.clone();
            }

            let in_menu = snapshot.session == SessionState::Menu;
            Self::set_hidden(&self.menu, !in_menu);
            if in_menu {
                if let Some(el) = &self.menu_level {
                    let overlay = &snapshot.level.overlay;
                    el.set_text_content(Some(&format!(
                        "{} – {}",
                        snapshot.level.name, overlay.year
                    )));
                }
            }

            let show_overlay = !in_menu && snapshot.overlay_opacity > 0.0;
            Self::set_hidden(&self.overlay, !show_overlay);
            if let Some(el) = &self.overlay {
                let _ = el
                    .style()
                    .set_property("opacity", &format!("{:.3}", snapshot.overlay_opacity));
            }
            if let Some(el) = &self.overlay_year {
                el.set_text_content(Some(&snapshot.level.overlay.year));
            }
            if let Some(el) = &self.overlay_text {
                el.set_text_content(Some(&snapshot.level.overlay.text));
            }

            if let Some(el) = &self.beat_bar {
                let _ = el.style().set_property(
                    "transform",
                    &format!("scaleX({:.3})", snapshot.beat_proximity),
                );
            }
        }
    }

    /// Render sink that draws the scene and mirrors text into the DOM
    struct Frontend {
        render: Option<RenderState>,
        hud: Hud,
    }

    impl RenderSink for Frontend {
        fn present(&mut self, snapshot: &FrameSnapshot<'_>) {
            if let Some(render) = self.render.as_mut() {
                render.present(snapshot);
            }
            self.hud.update(snapshot);
        }
    }

    struct App {
        game: Game,
        frontend: Frontend,
        settings: Settings,
        last_time: f64,
    }

    impl App {
        /// Cycle the quality preset, apply it everywhere and persist it
        fn cycle_quality(&mut self) {
            let preset = self.settings.cycle_quality();
            self.game.apply_settings(&self.settings);
            if let Some(render) = self.frontend.render.as_mut() {
                render.style.apply_settings(&self.settings);
            }
            self.settings.save();
            log::info!("Quality set to {:?}", preset);
        }
    }

    fn web_transport() -> TransportHandle {
        TransportHandle::new(Box::new(|| {
            WebAudioTransport::new().map(|t| Box::new(t) as Box<dyn AudioTransport>)
        }))
    }

    pub async fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        log::info!("Rhythm Dash starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or("no canvas")?
            .dyn_into()?;

        let (width, height) = fit_canvas(&window, &canvas);

        let settings = Settings::load();
        let seed = js_sys::Date::now() as u64;
        let mut game = Game::new(Catalog::builtin(), Tuning::default(), seed, web_transport());
        game.apply_settings(&settings);
        log::info!("Game initialized with seed: {}", seed);

        // WebGPU; without it the game still runs with the DOM HUD only
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            ..Default::default()
        });
        let style = SceneStyle::new(seed).with_settings(&settings);
        let render = match instance.create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone())) {
            Ok(surface) => {
                match instance
                    .request_adapter(&wgpu::RequestAdapterOptions {
                        power_preference: wgpu::PowerPreference::HighPerformance,
                        compatible_surface: Some(&surface),
                        force_fallback_adapter: false,
                    })
                    .await
                {
                    Ok(adapter) => {
                        log::info!("Using adapter: {:?}", adapter.get_info().name);
                        RenderState::new(surface, &adapter, width, height, style)
                            .await
                            .map_err(|e| log::error!("Renderer disabled: {e}"))
                            .ok()
                    }
                    Err(e) => {
                        log::error!("No GPU adapter: {e}");
                        None
                    }
                }
            }
            Err(e) => {
                log::error!("Failed to create surface: {e}");
                None
            }
        };

        let app = Rc::new(RefCell::new(App {
            game,
            frontend: Frontend {
                render,
                hud: Hud::new(&document),
            },
            settings,
            last_time: 0.0,
        }));

        setup_input_handlers(&canvas, app.clone())?;
        setup_focus_handlers(&document, app.clone())?;
        setup_resize(canvas, app.clone())?;

        request_animation_frame(app);

        log::info!("Rhythm Dash running!");
        Ok(())
    }

    /// Match the canvas backing store to its CSS size
    fn fit_canvas(window: &web_sys::Window, canvas: &HtmlCanvasElement) -> (u32, u32) {
        let dpr = window.device_pixel_ratio();
        let width = (canvas.client_width() as f64 * dpr).max(1.0) as u32;
        let height = (canvas.client_height() as f64 * dpr).max(1.0) as u32;
        canvas.set_width(width);
        canvas.set_height(height);
        (width, height)
    }

    fn setup_input_handlers(
        canvas: &HtmlCanvasElement,
        app: Rc<RefCell<App>>,
    ) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or("no window")?;

        // Keyboard
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if event.repeat() {
                    return;
                }
                let mut a = app.borrow_mut();
                if event.code() == "KeyQ" {
                    a.cycle_quality();
                    return;
                }
                let session = a.game.state().session;
                if let Some(command) = key_command(&event.code(), session) {
                    event.prevent_default();
                    a.game.push(command);
                }
            });
            window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        // Tap: jump in a level, start from the menu; also unblocks audio
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                event.prevent_default();
                let mut a = app.borrow_mut();
                let command = match a.game.state().session {
                    SessionState::Menu => Command::MenuConfirm,
                    _ => Command::Jump,
                };
                a.game.push(command);
            });
            canvas
                .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        Ok(())
    }

    fn setup_focus_handlers(document: &Document, app: Rc<RefCell<App>>) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or("no window")?;

        // Visibility change (tab switch, minimize)
        {
            let app = app.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let hidden = document_clone.visibility_state() == web_sys::VisibilityState::Hidden;
                let mut a = app.borrow_mut();
                if a.settings.mute_on_blur {
                    a.game.set_muted(hidden);
                    log::info!("Music {}", if hidden { "muted (tab hidden)" } else { "unmuted" });
                }
            });
            document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            )?;
            closure.forget();
        }

        // Window blur / focus
        for (event, muted) in [("blur", true), ("focus", false)] {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut a = app.borrow_mut();
                if a.settings.mute_on_blur {
                    a.game.set_muted(muted);
                }
            });
            window.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        Ok(())
    }

    fn setup_resize(canvas: HtmlCanvasElement, app: Rc<RefCell<App>>) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or("no window")?;
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let Some(window) = web_sys::window() else {
                return;
            };
            let (width, height) = fit_canvas(&window, &canvas);
            if let Some(render) = app.borrow_mut().frontend.render.as_mut() {
                render.resize(width, height);
            }
        });
        window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())?;
        closure.forget();
        Ok(())
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(app, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(app: Rc<RefCell<App>>, time: f64) {
        {
            let mut guard = app.borrow_mut();
            let a = &mut *guard;

            // rAF timestamps are milliseconds
            let dt = if a.last_time > 0.0 {
                (time - a.last_time) / 1000.0
            } else {
                0.0
            };
            a.last_time = time;

            let report = a.game.frame(dt, &mut a.frontend);
            if report.died {
                log::debug!("Died at {:.0}", a.game.state().scroll.distance);
            }
        }

        request_animation_frame(app);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    if let Err(e) = wasm_game::run().await {
        log::error!("Startup failed: {:?}", e);
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod autopilot {
    use rhythm_dash::audio::{ManualTransport, TransportHandle};
    use rhythm_dash::consts::{SIM_DT, TILE_WIDTH};
    use rhythm_dash::sim::{Catalog, Command, SessionState, SimulationState};
    use rhythm_dash::{Game, Settings, Tuning};

    /// Attempts per level before moving on
    const MAX_ATTEMPTS: u32 = 3;
    /// Simulated frames before giving up on the whole run
    const MAX_FRAMES: u32 = 60 * 60 * 10;

    /// Jump when the next spike's hit-box is this close (units) to the body
    const JUMP_GAP: (f32, f32) = (14.0, 28.0);

    /// Whether a grounded player should jump this frame
    fn should_jump(state: &SimulationState) -> bool {
        if !state.session.is_playing() || !state.player.on_ground {
            return false;
        }
        let front = state.player.pos.x + state.player.size.x + state.scroll.distance;
        state.level().spike_columns().any(|col| {
            let spike_left = col as f32 * TILE_WIDTH + state.tuning.spike_inset;
            let gap = spike_left - front;
            gap > JUMP_GAP.0 && gap <= JUMP_GAP.1
        })
    }

    pub fn run() {
        let settings = Settings::load();
        let catalog = Catalog::builtin();
        let level_count = catalog.len();

        let transport = ManualTransport::new();
        let clock = transport.clock();
        let mut game = Game::new(
            catalog,
            Tuning::default(),
            0x5EED,
            TransportHandle::with_transport(transport),
        );
        game.apply_settings(&settings);

        let frame = SIM_DT as f64;
        let mut attempts = 0;
        let mut cleared = 0;
        let mut beats = 0;
        let mut assisted = 0;
        let mut quitting = false;
        game.push(Command::Select(0));

        for _ in 0..MAX_FRAMES {
            clock.advance(frame);
            if should_jump(game.state()) {
                game.push(Command::Jump);
            }
            let report = game.update(frame);
            beats += report.beats;
            assisted += report.assisted_jumps;

            let next = match game.state().session {
                SessionState::Dead(index) if report.died => {
                    attempts += 1;
                    log::warn!(
                        "{}: hit spike at {:.0} (attempt {attempts})",
                        game.state().level().name,
                        game.state().scroll.distance
                    );
                    if attempts < MAX_ATTEMPTS {
                        Some(Command::Retry)
                    } else {
                        attempts = 0;
                        Some(if index + 1 < level_count {
                            Command::Advance
                        } else {
                            Command::Quit
                        })
                    }
                }
                SessionState::Complete(index) if report.completed => {
                    cleared += 1;
                    attempts = 0;
                    log::info!("{} cleared", game.state().level().name);
                    Some(if index + 1 < level_count {
                        Command::Advance
                    } else {
                        Command::Quit
                    })
                }
                SessionState::Menu if quitting && game.state().fade.opacity == 0.0 => break,
                _ => None,
            };

            if let Some(command) = next {
                quitting |= command == Command::Quit;
                game.push(command);
            }
        }

        log::info!(
            "Autopilot finished: {cleared}/{level_count} levels cleared, {beats} beats, {assisted} assisted jumps in {} steps",
            game.scheduler().total_steps()
        );
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Rhythm Dash (native) starting...");
    log::info!("Native mode runs a headless autopilot; use `trunk serve` for the web version");

    autopilot::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
