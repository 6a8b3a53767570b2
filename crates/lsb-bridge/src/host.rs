use std::cell::Cell;
use std::rc::Rc;

use chrono::{Timelike, Utc};
use mlua::Lua;

use crate::error::{interp, BridgeError};

/// Categorical outcome of one tick.
///
/// Reset to `Noop` before every handler invocation; the last decision-setting
/// host function called during the invocation wins. The four states are
/// terminal per tick, not persistent across ticks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Decision {
    #[default]
    Noop,
    Long,
    Short,
    Close,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Noop => "NOOP",
            Decision::Long => "LONG",
            Decision::Short => "SHORT",
            Decision::Close => "CLOSE",
        }
    }
}

/// Nanosecond fraction of the current second, in [0, 1e9).
///
/// chrono represents a leap second as nanos >= 1e9; the modulo keeps the
/// contract range either way.
pub fn clock_nanoseconds() -> u32 {
    Utc::now().nanosecond() % 1_000_000_000
}

/// Expose the fixed host functions to script code.
///
/// Runs during session creation, before the strategy script's top-level
/// statements, so the script can reference these names unconditionally.
/// The decision setters take no arguments and return nothing; they
/// communicate only through the shared decision cell.
pub(crate) fn register_host_functions(
    lua: &Lua,
    decision: Rc<Cell<Decision>>,
) -> Result<(), BridgeError> {
    let setters = [
        ("open_long_trade", Decision::Long),
        ("open_short_trade", Decision::Short),
        ("close_trade", Decision::Close),
    ];

    for (name, target) in setters {
        let cell = Rc::clone(&decision);
        let func = lua
            .create_function(move |_, ()| {
                cell.set(target);
                Ok(())
            })
            .map_err(|e| interp("register-host-function", e))?;
        lua.globals()
            .set(name, func)
            .map_err(|e| interp("register-host-function", e))?;
    }

    let clock = lua
        .create_function(|_, ()| Ok(clock_nanoseconds()))
        .map_err(|e| interp("register-host-function", e))?;
    lua.globals()
        .set("get_nanoseconds", clock)
        .map_err(|e| interp("register-host-function", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_nanoseconds_stays_in_range() {
        for _ in 0..1000 {
            assert!(clock_nanoseconds() < 1_000_000_000);
        }
    }

    #[test]
    fn decision_defaults_to_noop() {
        assert_eq!(Decision::default(), Decision::Noop);
    }

    #[test]
    fn decision_as_str_matches_wire_names() {
        assert_eq!(Decision::Noop.as_str(), "NOOP");
        assert_eq!(Decision::Long.as_str(), "LONG");
        assert_eq!(Decision::Short.as_str(), "SHORT");
        assert_eq!(Decision::Close.as_str(), "CLOSE");
    }
}
