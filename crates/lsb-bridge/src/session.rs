use std::cell::Cell;
use std::fs;
use std::path::Path;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};

use mlua::{Lua, Value};
use tracing::info;

use crate::error::{interp, BridgeError};
use crate::host::{register_host_functions, Decision};

/// Process-wide READY slot. `create` claims it; `close`/`Drop` release it,
/// including on error exit paths, so the slot never leaks.
static SESSION_ACTIVE: AtomicBool = AtomicBool::new(false);

/// The single owned instance of the embedded interpreter plus the decision
/// cell mutated by the registered host functions.
///
/// `mlua::Lua` is `!Send`, so a session can never cross a thread boundary;
/// the process-wide slot above enforces that at most one exists at a time.
/// Consuming `close()` makes operations against a destroyed session
/// unrepresentable.
#[derive(Debug)]
pub struct Session {
    lua: Lua,
    decision: Rc<Cell<Decision>>,
}

impl Session {
    /// Start the interpreter, register the host functions, seed the
    /// script-side PRNG once, then run the strategy script's top-level
    /// statements (definitions, including the tick handler).
    pub fn create(script_path: &Path) -> Result<Self, BridgeError> {
        if SESSION_ACTIVE.swap(true, Ordering::SeqCst) {
            return Err(BridgeError::AlreadyActive);
        }

        let booted = Self::boot(script_path);
        if booted.is_err() {
            SESSION_ACTIVE.store(false, Ordering::SeqCst);
        }
        booted
    }

    fn boot(script_path: &Path) -> Result<Self, BridgeError> {
        info!(script = %script_path.display(), "starting lua session");

        let lua = Lua::new();
        let decision = Rc::new(Cell::new(Decision::Noop));
        register_host_functions(&lua, Rc::clone(&decision))?;

        // Seed math.random exactly once, before any user code runs. No
        // re-seeding happens later.
        lua.load("math.randomseed(get_nanoseconds())")
            .set_name("prng-seed")
            .exec()
            .map_err(|e| BridgeError::Load {
                op: "prng-seed",
                message: e.to_string(),
            })?;

        let session = Session { lua, decision };
        session.run_script_file(script_path, "strategy-load")?;
        Ok(session)
    }

    /// Execute a second script (configuration overrides, shared helpers)
    /// against the same interpreter state.
    pub fn load_auxiliary(&self, path: &Path) -> Result<(), BridgeError> {
        self.run_script_file(path, "auxiliary-load")
    }

    fn run_script_file(&self, path: &Path, op: &'static str) -> Result<(), BridgeError> {
        let source = fs::read_to_string(path).map_err(|e| BridgeError::Load {
            op,
            message: format!("{}: {e}", path.display()),
        })?;

        self.lua
            .load(source.as_str())
            .set_name(path.display().to_string())
            .exec()
            .map_err(|e| BridgeError::Load {
                op,
                message: e.to_string(),
            })
    }

    /// Release the interpreter. The process-wide slot frees in `Drop`, so a
    /// dropped-but-not-closed session cannot wedge the process either.
    pub fn close(self) {
        info!("stopping lua session");
    }

    pub(crate) fn lua(&self) -> &Lua {
        &self.lua
    }

    pub(crate) fn decision_cell(&self) -> &Cell<Decision> {
        &self.decision
    }

    // ----- variable functions ------------------------------------------------

    /// Bind a string global, overwriting any prior binding of that name.
    pub fn set_string_var(&self, name: &str, value: &str) -> Result<(), BridgeError> {
        self.lua
            .globals()
            .set(name, value)
            .map_err(|e| interp("set_string_var", e))
    }

    /// Bind a numeric global. Numbers are `f64` end-to-end; integral values
    /// round-trip exactly.
    pub fn set_number_var(&self, name: &str, value: f64) -> Result<(), BridgeError> {
        self.lua
            .globals()
            .set(name, value)
            .map_err(|e| interp("set_number_var", e))
    }

    /// Bind a boolean global.
    pub fn set_bool_var(&self, name: &str, value: bool) -> Result<(), BridgeError> {
        self.lua
            .globals()
            .set(name, value)
            .map_err(|e| interp("set_bool_var", e))
    }

    /// Read a string global. Absent or non-string globals are a type error.
    pub fn get_string_var(&self, name: &str) -> Result<String, BridgeError> {
        match self.lua.globals().get::<Value>(name) {
            Ok(Value::String(s)) => Ok(s.to_string_lossy().to_string()),
            _ => Err(BridgeError::TypeMismatch {
                name: name.to_string(),
                expected: "string",
            }),
        }
    }

    /// Read an integer global. Accepts Lua integers and integral floats;
    /// anything else (including an absent global) is a type error.
    pub fn get_int_var(&self, name: &str) -> Result<i64, BridgeError> {
        match self.lua.globals().get::<Value>(name) {
            Ok(Value::Integer(i)) => Ok(i),
            Ok(Value::Number(n)) if n == n.trunc() => Ok(n as i64),
            _ => Err(BridgeError::TypeMismatch {
                name: name.to_string(),
                expected: "integer",
            }),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        SESSION_ACTIVE.store(false, Ordering::SeqCst);
    }
}
