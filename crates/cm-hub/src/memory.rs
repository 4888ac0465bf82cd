//! In-memory host: state store, recorded service calls and a display board.
//!
//! Used by tests and by the command-line simulation.

use std::cell::{Ref, RefCell};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::Rc;

use cm_core::{
    BooleanDisplay, ClimateDisplay, CoreResult, DeviceInfo, DisplayRegistry, EntityRef, HvacMode,
    NumericDisplay, ServiceBus, ServiceCall, StateReader, parse_bool, parse_float,
};

/// Raw entity states as the host would report them.
#[derive(Debug, Default, Clone)]
pub struct MemoryStates {
    states: HashMap<String, String>,
}

impl MemoryStates {
    pub fn set(&mut self, entity: impl Into<String>, state: impl Into<String>) {
        self.states.insert(entity.into(), state.into());
    }

    pub fn remove(&mut self, entity: &str) {
        self.states.remove(entity);
    }

    pub fn get(&self, entity: &str) -> Option<&str> {
        self.states.get(entity).map(String::as_str)
    }
}

impl FromIterator<(String, String)> for MemoryStates {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            states: iter.into_iter().collect(),
        }
    }
}

impl StateReader for MemoryStates {
    fn read(&self, entity: &EntityRef) -> Option<f64> {
        self.get(entity.as_str()).and_then(parse_float)
    }

    fn read_bool(&self, entity: &EntityRef) -> Option<bool> {
        self.get(entity.as_str()).and_then(parse_bool)
    }
}

/// Records every service call; calls on selected targets fail.
#[derive(Debug, Default, Clone)]
pub struct MemoryServices {
    calls: Vec<ServiceCall>,
    failing: HashSet<String>,
}

impl MemoryServices {
    pub fn calls(&self) -> &[ServiceCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<ServiceCall> {
        std::mem::take(&mut self.calls)
    }

    /// Make every later call on `entity` fail.
    pub fn fail_target(&mut self, entity: impl Into<String>) {
        self.failing.insert(entity.into());
    }

    pub fn clear_failures(&mut self) {
        self.failing.clear();
    }
}

impl ServiceBus for MemoryServices {
    fn call(&mut self, call: ServiceCall) -> CoreResult<()> {
        if self.failing.contains(call.target().as_str()) {
            return Err(call.failed("injected failure"));
        }
        self.calls.push(call);
        Ok(())
    }
}

/// State shown by a climate display.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClimateView {
    pub current_temperature: Option<f64>,
    pub target_temperature: Option<f64>,
    pub hvac_mode: Option<HvacMode>,
    pub preset: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DisplayValue {
    Boolean(bool),
    Numeric(f64),
    Climate(ClimateView),
}

/// Every display value keyed by display id, with write counts.
#[derive(Debug, Default)]
pub struct DisplayBoard {
    values: BTreeMap<String, DisplayValue>,
    writes: HashMap<String, usize>,
}

impl DisplayBoard {
    pub fn value(&self, id: &str) -> Option<&DisplayValue> {
        self.values.get(id)
    }

    pub fn boolean(&self, id: &str) -> Option<bool> {
        match self.values.get(id)? {
            DisplayValue::Boolean(on) => Some(*on),
            _ => None,
        }
    }

    pub fn number(&self, id: &str) -> Option<f64> {
        match self.values.get(id)? {
            DisplayValue::Numeric(value) => Some(*value),
            _ => None,
        }
    }

    pub fn climate(&self, id: &str) -> Option<&ClimateView> {
        match self.values.get(id)? {
            DisplayValue::Climate(view) => Some(view),
            _ => None,
        }
    }

    /// Number of writes to a display.
    pub fn writes(&self, id: &str) -> usize {
        self.writes.get(id).copied().unwrap_or(0)
    }

    fn write(&mut self, id: &str, value: DisplayValue) {
        self.values.insert(id.to_string(), value);
        *self.writes.entry(id.to_string()).or_default() += 1;
    }

    fn update_climate(&mut self, id: &str, update: impl FnOnce(&mut ClimateView)) {
        let mut view = self.climate(id).cloned().unwrap_or_default();
        update(&mut view);
        self.write(id, DisplayValue::Climate(view));
    }
}

/// Display registry backed by a shared [`DisplayBoard`].
#[derive(Debug, Default, Clone)]
pub struct MemoryDisplays {
    board: Rc<RefCell<DisplayBoard>>,
}

impl MemoryDisplays {
    pub fn board(&self) -> Ref<'_, DisplayBoard> {
        self.board.borrow()
    }

    fn display(&self, device: &DeviceInfo, role: &str) -> MemoryDisplay {
        MemoryDisplay {
            id: device.display_id(role),
            board: Rc::clone(&self.board),
        }
    }
}

impl DisplayRegistry for MemoryDisplays {
    fn boolean(&mut self, device: &DeviceInfo, role: &str) -> Box<dyn BooleanDisplay> {
        Box::new(self.display(device, role))
    }

    fn numeric(&mut self, device: &DeviceInfo, role: &str) -> Box<dyn NumericDisplay> {
        Box::new(self.display(device, role))
    }

    fn climate(&mut self, device: &DeviceInfo, role: &str) -> Box<dyn ClimateDisplay> {
        Box::new(self.display(device, role))
    }
}

struct MemoryDisplay {
    id: String,
    board: Rc<RefCell<DisplayBoard>>,
}

impl BooleanDisplay for MemoryDisplay {
    fn set_on(&mut self, on: bool) {
        self.board.borrow_mut().write(&self.id, DisplayValue::Boolean(on));
    }
}

impl NumericDisplay for MemoryDisplay {
    fn set_value(&mut self, value: f64) {
        self.board.borrow_mut().write(&self.id, DisplayValue::Numeric(value));
    }
}

impl ClimateDisplay for MemoryDisplay {
    fn set_current_temperature(&mut self, value: Option<f64>) {
        self.board
            .borrow_mut()
            .update_climate(&self.id, |view| view.current_temperature = value);
    }

    fn set_target_temperature(&mut self, value: Option<f64>) {
        self.board
            .borrow_mut()
            .update_climate(&self.id, |view| view.target_temperature = value);
    }

    fn set_hvac_mode(&mut self, mode: Option<HvacMode>) {
        self.board
            .borrow_mut()
            .update_climate(&self.id, |view| view.hvac_mode = mode);
    }

    fn set_preset(&mut self, preset: Option<&str>) {
        let preset = preset.map(str::to_string);
        self.board
            .borrow_mut()
            .update_climate(&self.id, |view| view.preset = preset);
    }
}
