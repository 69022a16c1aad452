use indexmap::IndexMap;
use js_sys::{Array, Function};
use log::warn;
use serde::Serialize;
use serde_wasm_bindgen as swb;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use widok_regulator::{Command, FrameScheduler, Regulator, RegulatorConfig, Snapshot, StepHandler};

#[wasm_bindgen]
pub struct WasmRegulator {
    core: Regulator,
}

fn jsvalue_is_undefined_or_null(v: &JsValue) -> bool {
    v.is_undefined() || v.is_null()
}

/// Plain JS objects instead of `Map`s for snapshots.
fn to_js<T: Serialize>(value: &T) -> Result<JsValue, swb::Error> {
    value.serialize(&swb::Serializer::json_compatible())
}

fn parse_targets(targets: JsValue, op: &str) -> Result<IndexMap<String, f64>, JsError> {
    if jsvalue_is_undefined_or_null(&targets) {
        return Ok(IndexMap::new());
    }
    swb::from_value(targets).map_err(|e| JsError::new(&format!("{op} targets error: {e}")))
}

struct JsScheduler {
    f: Function,
}

impl FrameScheduler for JsScheduler {
    fn request_frame(&mut self) {
        if let Err(e) = self.f.call0(&JsValue::UNDEFINED) {
            warn!("request_frame callback threw: {:?}", e);
        }
    }
}

struct JsStep {
    f: Function,
}

impl StepHandler for JsStep {
    fn on_step(&mut self, snapshot: &Snapshot, _regulator: &mut Regulator) {
        let arg = match to_js(snapshot) {
            Ok(v) => v,
            Err(e) => {
                warn!("snapshot conversion failed: {e}");
                return;
            }
        };
        if let Err(e) = self.f.call1(&JsValue::UNDEFINED, &arg) {
            warn!("step callback threw: {:?}", e);
        }
    }
}

#[wasm_bindgen]
impl WasmRegulator {
    /// Create a regulator.
    ///
    /// - `config`: `{ initial_values, friction?, amplification?, saturation? }`, or
    ///   undefined/null for an empty regulator.
    /// - `step(snapshot)`: called after every step with `{ name: value, ... }`.
    ///   It must not call back into this regulator synchronously.
    /// - `request_frame()`: called when another step is needed; the host answers
    ///   by calling `step()` on its next frame, e.g.
    ///   `() => requestAnimationFrame(() => reg.step())`.
    /// - `transform_eddx(eddx, name)`: optional drive transform.
    #[wasm_bindgen(constructor)]
    pub fn new(
        config: JsValue,
        step: JsValue,
        request_frame: Function,
        transform_eddx: Option<Function>,
    ) -> Result<WasmRegulator, JsError> {
        console_error_panic_hook::set_once();

        let cfg: RegulatorConfig = if jsvalue_is_undefined_or_null(&config) {
            RegulatorConfig::default()
        } else {
            swb::from_value(config).map_err(|e| JsError::new(&format!("config error: {e}")))?
        };

        let mut builder = Regulator::builder(cfg).scheduler(JsScheduler { f: request_frame });
        if let Ok(f) = step.dyn_into::<Function>() {
            builder = builder.handler(JsStep { f });
        }
        if let Some(f) = transform_eddx {
            builder = builder.transform_eddx(move |eddx, name| {
                let raw = JsValue::from_f64(eddx);
                match f.call2(&JsValue::UNDEFINED, &raw, &JsValue::from_str(name)) {
                    Ok(v) => v.as_f64().unwrap_or(eddx),
                    Err(e) => {
                        warn!("transform_eddx callback threw: {:?}", e);
                        eddx
                    }
                }
            });
        }

        let core = builder
            .build()
            .map_err(|e| JsError::new(&format!("regulator error: {e}")))?;
        Ok(WasmRegulator { core })
    }

    /// Set targets `{ name: value }`. With `jump`, values teleport.
    #[wasm_bindgen]
    pub fn animate(&mut self, targets: JsValue, jump: Option<bool>) -> Result<(), JsError> {
        let targets = parse_targets(targets, "animate")?;
        self.core
            .animate(targets, jump.unwrap_or(false))
            .map_err(|e| JsError::new(&format!("animate error: {e}")))
    }

    #[wasm_bindgen]
    pub fn eddx(&mut self, targets: JsValue) -> Result<(), JsError> {
        let targets = parse_targets(targets, "eddx")?;
        self.core
            .eddx(targets)
            .map_err(|e| JsError::new(&format!("eddx error: {e}")))
    }

    #[wasm_bindgen]
    pub fn edx(&mut self, targets: JsValue) -> Result<(), JsError> {
        let targets = parse_targets(targets, "edx")?;
        self.core
            .edx(targets)
            .map_err(|e| JsError::new(&format!("edx error: {e}")))
    }

    /// Apply an array of commands (`{ op: "animate" | "eddx" | "edx", targets, jump? }`).
    /// Stops at the first failing command.
    #[wasm_bindgen]
    pub fn apply(&mut self, commands: JsValue) -> Result<(), JsError> {
        let cmds: Vec<Command> = swb::from_value(commands)
            .map_err(|e| JsError::new(&format!("commands error: {e}")))?;
        for (i, cmd) in cmds.iter().enumerate() {
            self.core
                .apply(cmd)
                .map_err(|e| JsError::new(&format!("command {i} error: {e}")))?;
        }
        Ok(())
    }

    #[wasm_bindgen(js_name = start_animation)]
    pub fn start_animation(&mut self) {
        self.core.start_animation();
    }

    /// Deliver one frame. Call this from the host's frame callback.
    #[wasm_bindgen]
    pub fn step(&mut self) {
        self.core.animation_step();
    }

    /// Current values as `{ name: value }` without stepping.
    #[wasm_bindgen]
    pub fn snapshot(&self) -> Result<JsValue, JsError> {
        to_js(&self.core.snapshot()).map_err(|e| JsError::new(&format!("snapshot error: {e}")))
    }

    #[wasm_bindgen]
    pub fn names(&self) -> Array {
        self.core.names().map(JsValue::from_str).collect()
    }

    #[wasm_bindgen(js_name = is_animating)]
    pub fn is_animating(&self) -> bool {
        self.core.is_animating()
    }

    #[wasm_bindgen(js_name = frame_pending)]
    pub fn frame_pending(&self) -> bool {
        self.core.frame_pending()
    }

    /// Steps run so far (as a JS number).
    #[wasm_bindgen]
    pub fn frame(&self) -> f64 {
        self.core.frame() as f64
    }
}

/// Numeric ABI version for compatibility checks at init.
#[wasm_bindgen]
pub fn abi_version() -> u32 {
    1
}
