#![cfg(target_arch = "wasm32")]
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use js_sys::{Function, Reflect, JSON};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;
use widok_regulator_wasm::{abi_version, WasmRegulator};

fn approx(a: f64, b: f64, eps: f64) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

fn js(src: &str) -> JsValue {
    JSON::parse(src).unwrap()
}

fn get(obj: &JsValue, key: &str) -> Option<f64> {
    Reflect::get(obj, &JsValue::from_str(key)).ok()?.as_f64()
}

/// Step callback that records snapshots, plus a frame-request callback that
/// counts requests. The closures must outlive the regulator.
struct Host {
    frames: Rc<RefCell<Vec<JsValue>>>,
    requests: Rc<Cell<u32>>,
    step: Closure<dyn FnMut(JsValue)>,
    request: Closure<dyn FnMut()>,
}

impl Host {
    fn new() -> Self {
        let frames = Rc::new(RefCell::new(Vec::new()));
        let requests = Rc::new(Cell::new(0));
        let sink = frames.clone();
        let counter = requests.clone();
        Self {
            step: Closure::wrap(
                Box::new(move |snap: JsValue| sink.borrow_mut().push(snap)) as Box<dyn FnMut(JsValue)>
            ),
            request: Closure::wrap(
                Box::new(move || counter.set(counter.get() + 1)) as Box<dyn FnMut()>
            ),
            frames,
            requests,
        }
    }

    fn step_fn(&self) -> JsValue {
        self.step.as_ref().clone()
    }

    fn request_fn(&self) -> Function {
        self.request.as_ref().unchecked_ref::<Function>().clone()
    }
}

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn abi_is_1() {
    assert_eq!(abi_version(), 1);
}

#[wasm_bindgen_test]
fn missing_step_callback_is_rejected() {
    let host = Host::new();
    let res = WasmRegulator::new(JsValue::UNDEFINED, JsValue::UNDEFINED, host.request_fn(), None);
    assert!(res.is_err());
}

#[wasm_bindgen_test]
fn animate_emits_first_frame_and_requests_next() {
    let host = Host::new();
    let mut reg = WasmRegulator::new(
        js(r#"{"initial_values":{"x":0,"y":1}}"#),
        host.step_fn(),
        host.request_fn(),
        None,
    )
    .unwrap();

    reg.animate(js(r#"{"x":100}"#), None).unwrap();
    assert_eq!(host.frames.borrow().len(), 1);
    let first = host.frames.borrow()[0].clone();
    approx(get(&first, "x").unwrap(), 0.5, 1e-12);
    approx(get(&first, "y").unwrap(), 1.0, 0.0);
    assert_eq!(host.requests.get(), 1);
    assert!(reg.frame_pending());

    let mut guard = 0;
    while reg.frame_pending() && guard < 500 {
        reg.step();
        guard += 1;
    }
    assert!(!reg.is_animating());
    approx(get(&reg.snapshot().unwrap(), "x").unwrap(), 100.0, 0.01);
}

#[wasm_bindgen_test]
fn unknown_property_is_an_error() {
    let host = Host::new();
    let mut reg = WasmRegulator::new(
        js(r#"{"initial_values":{"x":0}}"#),
        host.step_fn(),
        host.request_fn(),
        None,
    )
    .unwrap();
    assert!(reg.edx(js(r#"{"nope":1}"#)).is_err());
    assert!(host.frames.borrow().is_empty());
}

#[wasm_bindgen_test]
fn transform_eddx_is_applied() {
    let host = Host::new();
    let double = Function::new_with_args("eddx, name", "return name === 'x' ? eddx * 2 : eddx;");
    let mut reg = WasmRegulator::new(
        js(r#"{"initial_values":{"x":0}}"#),
        host.step_fn(),
        host.request_fn(),
        Some(double),
    )
    .unwrap();
    reg.eddx(js(r#"{"x":10}"#)).unwrap();
    // drive 20 -> dx 20 -> value 20 * 0.005
    approx(get(&reg.snapshot().unwrap(), "x").unwrap(), 0.1, 1e-12);
}

#[wasm_bindgen_test]
fn commands_and_names() {
    let host = Host::new();
    let mut reg = WasmRegulator::new(
        js(r#"{"initial_values":{"b":0,"a":0}}"#),
        host.step_fn(),
        host.request_fn(),
        None,
    )
    .unwrap();
    let names: Vec<String> = reg.names().iter().filter_map(|v| v.as_string()).collect();
    assert_eq!(names, ["b", "a"]);

    reg.apply(js(r#"[{"op":"animate","targets":{"a":3},"jump":true}]"#))
        .unwrap();
    approx(get(&reg.snapshot().unwrap(), "a").unwrap(), 3.0, 0.0);
    assert!(reg
        .apply(js(r#"[{"op":"animate","targets":{"zz":3}}]"#))
        .is_err());
}
