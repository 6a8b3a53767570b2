use mlua::Value;

use crate::error::BridgeError;
use crate::host::Decision;
use crate::session::Session;

/// Global name of the script's entry point. The strategy must define a
/// zero-argument callable under this name.
pub const TICK_HANDLER: &str = "on_tick";

impl Session {
    /// Drive one evaluation cycle: reset the decision to NOOP, invoke the
    /// script's tick handler with no arguments, and return the decision the
    /// handler left behind.
    pub fn tick(&self) -> Result<Decision, BridgeError> {
        self.decision_cell().set(Decision::Noop);

        let handler = match self.lua().globals().get::<Value>(TICK_HANDLER) {
            Ok(Value::Function(f)) => f,
            _ => {
                return Err(BridgeError::TypeMismatch {
                    name: TICK_HANDLER.to_string(),
                    expected: "function",
                })
            }
        };

        handler
            .call::<()>(())
            .map_err(|e| BridgeError::Invocation {
                message: e.to_string(),
            })?;

        Ok(self.decision_cell().get())
    }

    /// Current decision state, without resetting it.
    pub fn decision(&self) -> Decision {
        self.decision_cell().get()
    }

    /// True when the loaded script defines a callable tick handler.
    pub fn has_tick_handler(&self) -> bool {
        matches!(
            self.lua().globals().get::<Value>(TICK_HANDLER),
            Ok(Value::Function(_))
        )
    }
}
