use js_sys::Uint8ClampedArray;
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::config::SessionConfig;
use crate::didactic::{DidacticLattice, DIDACTIC_SIDE};
use crate::grid::PixelGrid;
use crate::history::CatMapSession;
use crate::image_io::{clamp_side, decode_image, encode_png, fallback_grid, grid_from_rgba, DEFAULT_SIDE};
use crate::matrix::TransformMatrix;
use crate::playback::Playback;
use crate::sequence::{generate_with_fill, IterationSequence};

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

fn matrix_from_js(a11: i32, a12: i32, a21: i32, a22: i32) -> TransformMatrix {
    TransformMatrix::new(a11 as i64, a12 as i64, a21 as i64, a22 as i64)
}

/// Animation-page session: stepping history, period and playback state.
#[wasm_bindgen]
pub struct CatMapSessionWasm {
    session: CatMapSession,
    playback: Playback,
}

#[wasm_bindgen]
impl CatMapSessionWasm {
    /// `config` may be `undefined` or a partial `SessionConfig` object.
    #[wasm_bindgen(constructor)]
    pub fn new(side: i32, config: JsValue) -> Result<CatMapSessionWasm, JsValue> {
        console_error_panic_hook::set_once();

        let config: SessionConfig = if config.is_undefined() || config.is_null() {
            SessionConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsValue::from_str(&format!("Config error: {}", e)))?
        };
        let side = clamp_side(side as i64).side;
        let playback = Playback::new(config.timestep_ms);
        let session = CatMapSession::with_config(fallback_grid(side)?, TransformMatrix::CLASSIC, config);

        Ok(Self { session, playback })
    }

    #[wasm_bindgen(js_name = defaultSide)]
    pub fn default_side() -> usize {
        DEFAULT_SIDE
    }

    /// Decodes an uploaded file at the current side length.
    #[wasm_bindgen(js_name = loadImage)]
    pub fn load_image(&mut self, bytes: &[u8], name: Option<String>) -> Result<(), JsValue> {
        self.playback.stop();
        let grid = decode_image(bytes, self.session.side())?;
        self.session.set_image(grid, name);
        Ok(())
    }

    /// Takes raw RGBA pixels already decoded by the browser.
    #[wasm_bindgen(js_name = loadRgba)]
    pub fn load_rgba(
        &mut self,
        width: u32,
        height: u32,
        rgba: Vec<u8>,
        name: Option<String>,
    ) -> Result<(), JsValue> {
        self.playback.stop();
        let grid = grid_from_rgba(width, height, rgba, self.session.side())?;
        self.session.set_image(grid, name);
        Ok(())
    }

    /// Clamps the side, reloads the fallback image and returns the `SideClamp`.
    #[wasm_bindgen(js_name = setSize)]
    pub fn set_size(&mut self, requested: i32) -> Result<JsValue, JsValue> {
        self.playback.stop();
        let clamp = clamp_side(requested as i64);
        self.session.set_image(fallback_grid(clamp.side)?, None);
        to_js(&clamp)
    }

    #[wasm_bindgen(js_name = setMatrix)]
    pub fn set_matrix(&mut self, a11: i32, a12: i32, a21: i32, a22: i32) {
        self.playback.stop();
        self.session.set_matrix(matrix_from_js(a11, a12, a21, a22));
    }

    #[wasm_bindgen(js_name = setMatrixFields)]
    pub fn set_matrix_fields(&mut self, a11: &str, a12: &str, a21: &str, a22: &str) {
        self.playback.stop();
        self.session
            .set_matrix(TransformMatrix::parse_fields([a11, a12, a21, a22]));
    }

    #[wasm_bindgen(js_name = getMatrix)]
    pub fn get_matrix(&self) -> Result<JsValue, JsValue> {
        to_js(&self.session.matrix())
    }

    #[wasm_bindgen(js_name = stepForward)]
    pub fn step_forward(&mut self) -> Result<JsValue, JsValue> {
        let outcome = self.session.step_forward();
        to_js(&outcome)
    }

    #[wasm_bindgen(js_name = stepBackward)]
    pub fn step_backward(&mut self) -> bool {
        self.session.step_backward()
    }

    #[wasm_bindgen]
    pub fn reset(&mut self) {
        self.playback.stop();
        self.session.reset();
    }

    /// Called by the page's timer; returns `null` while stopped.
    #[wasm_bindgen]
    pub fn tick(&mut self) -> Result<JsValue, JsValue> {
        match self.playback.tick(&mut self.session) {
            Some(outcome) => to_js(&outcome),
            None => Ok(JsValue::NULL),
        }
    }

    #[wasm_bindgen]
    pub fn play(&mut self) {
        self.playback.play();
    }

    #[wasm_bindgen]
    pub fn stop(&mut self) {
        self.playback.stop();
    }

    #[wasm_bindgen]
    pub fn toggle(&mut self) -> bool {
        self.playback.toggle()
    }

    #[wasm_bindgen(js_name = isPlaying)]
    pub fn is_playing(&self) -> bool {
        self.playback.is_playing()
    }

    #[wasm_bindgen(js_name = adjustTimestep)]
    pub fn adjust_timestep(&mut self, delta_ms: i32) -> u32 {
        self.playback.adjust_timestep(delta_ms)
    }

    #[wasm_bindgen(js_name = getTimestep)]
    pub fn get_timestep(&self) -> u32 {
        self.playback.timestep_ms()
    }

    /// RGBA bytes of the grid on display, ready for `new ImageData(..)`.
    #[wasm_bindgen]
    pub fn frame(&self) -> Uint8ClampedArray {
        Uint8ClampedArray::from(self.session.current().as_bytes())
    }

    #[wasm_bindgen(js_name = getSide)]
    pub fn get_side(&self) -> usize {
        self.session.side()
    }

    #[wasm_bindgen(js_name = getIteration)]
    pub fn get_iteration(&self) -> usize {
        self.session.position()
    }

    #[wasm_bindgen(js_name = getPeriod)]
    pub fn get_period(&self) -> Option<usize> {
        self.session.period().period()
    }

    #[wasm_bindgen(js_name = getPeriodLabel)]
    pub fn get_period_label(&self) -> String {
        self.session.period().to_string()
    }

    #[wasm_bindgen]
    pub fn caption(&self) -> String {
        self.session.caption()
    }

    #[wasm_bindgen]
    pub fn progress(&self) -> Option<f64> {
        self.session.progress()
    }

    #[wasm_bindgen(js_name = exportPng)]
    pub fn export_png(&self) -> Result<Vec<u8>, JsValue> {
        Ok(encode_png(self.session.current())?)
    }

    #[wasm_bindgen(js_name = exportFileName)]
    pub fn export_file_name(&self) -> String {
        self.session.export_file_name()
    }
}

/// Frames produced by `generateIterations` for the all-iterations page.
#[wasm_bindgen]
pub struct IterationSequenceWasm {
    sequence: IterationSequence,
}

#[wasm_bindgen(js_name = generateIterations)]
#[allow(clippy::too_many_arguments)]
pub fn generate_iterations(
    side: usize,
    rgba: Vec<u8>,
    a11: i32,
    a12: i32,
    a21: i32,
    a22: i32,
    count: usize,
    config: JsValue,
) -> Result<IterationSequenceWasm, JsValue> {
    console_error_panic_hook::set_once();

    let config: SessionConfig = if config.is_undefined() || config.is_null() {
        SessionConfig::default()
    } else {
        serde_wasm_bindgen::from_value(config)
            .map_err(|e| JsValue::from_str(&format!("Config error: {}", e)))?
    };
    let original = PixelGrid::new(side, rgba)?;
    let sequence = generate_with_fill(
        &original,
        matrix_from_js(a11, a12, a21, a22),
        count,
        config.fill,
    );
    Ok(IterationSequenceWasm { sequence })
}

#[wasm_bindgen]
impl IterationSequenceWasm {
    #[wasm_bindgen(js_name = frameCount)]
    pub fn frame_count(&self) -> usize {
        self.sequence.frames().len()
    }

    #[wasm_bindgen]
    pub fn frame(&self, index: usize) -> Result<Uint8ClampedArray, JsValue> {
        Ok(Uint8ClampedArray::from(self.sequence.frame(index)?.as_bytes()))
    }

    #[wasm_bindgen(js_name = frameLabel)]
    pub fn frame_label(&self, index: usize) -> String {
        self.sequence.frame_label(index)
    }

    #[wasm_bindgen(js_name = periodIndex)]
    pub fn period_index(&self) -> Option<usize> {
        self.sequence.period_index()
    }

    #[wasm_bindgen]
    pub fn capped(&self) -> bool {
        self.sequence.capped()
    }

    #[wasm_bindgen]
    pub fn summary(&self) -> Result<JsValue, JsValue> {
        to_js(&self.sequence.summary())
    }
}

/// Step-by-step page: the labelled 10x10 lattice.
#[wasm_bindgen]
pub struct DidacticLatticeWasm {
    lattice: DidacticLattice,
}

#[wasm_bindgen]
impl DidacticLatticeWasm {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<DidacticLatticeWasm, JsValue> {
        console_error_panic_hook::set_once();
        Ok(Self {
            lattice: DidacticLattice::new(DIDACTIC_SIDE)?,
        })
    }

    #[wasm_bindgen]
    pub fn apply(&mut self) {
        self.lattice.apply();
    }

    #[wasm_bindgen]
    pub fn reset(&mut self) {
        self.lattice.reset();
    }

    #[wasm_bindgen(js_name = getIteration)]
    pub fn get_iteration(&self) -> usize {
        self.lattice.iteration()
    }

    #[wasm_bindgen(js_name = getPoints)]
    pub fn get_points(&self) -> Result<JsValue, JsValue> {
        to_js(&self.lattice.points())
    }

    #[wasm_bindgen(js_name = getLinearImage)]
    pub fn get_linear_image(&self) -> Result<JsValue, JsValue> {
        to_js(&self.lattice.linear_image())
    }

    #[wasm_bindgen(js_name = getNextPreview)]
    pub fn get_next_preview(&self) -> Result<JsValue, JsValue> {
        to_js(&self.lattice.next_preview())
    }

    #[wasm_bindgen]
    pub fn color(&self, index: usize) -> String {
        self.lattice.css_color(index)
    }
}
