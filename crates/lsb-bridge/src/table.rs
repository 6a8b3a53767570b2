use mlua::{Lua, Table, Value};

use crate::error::{interp, BridgeError};
use crate::session::Session;

/// A staged key or value awaiting commit.
#[derive(Clone, Debug, PartialEq)]
enum Staged {
    Integer(i64),
    Number(f64),
    Str(String),
    Table {
        entries: Vec<(Staged, Staged)>,
        size_hint: usize,
    },
}

/// One table-under-construction: committed entries plus the pending buffer
/// of at most two staged values.
#[derive(Clone, Debug, PartialEq)]
struct Frame {
    entries: Vec<(Staged, Staged)>,
    pending: Vec<Staged>,
    size_hint: usize,
}

impl Frame {
    fn new(size_hint: usize) -> Self {
        Self {
            entries: Vec::new(),
            pending: Vec::new(),
            size_hint,
        }
    }
}

/// Incremental constructor for a composite value published as a named
/// global.
///
/// This replaces the interpreter-stack positional protocol with an explicit
/// in-memory buffer: entries are committed in strict key-then-value order
/// with checked arity, nested tables open their own frame, and nothing is
/// visible to the script until `finalize` materializes the whole structure
/// atomically. Out-of-order calls return `TableProtocol` instead of relying
/// on caller discipline.
#[derive(Clone, Debug)]
pub struct TableBuilder {
    frames: Vec<Frame>,
}

impl TableBuilder {
    /// Open the outermost table. `size_hint` only preallocates; the table
    /// remains dynamically growable.
    pub fn begin(size_hint: usize) -> Self {
        Self {
            frames: vec![Frame::new(size_hint)],
        }
    }

    /// Open a nested table. After `close_table` it becomes one staged value
    /// of the enclosing frame, to be consumed by the next `commit_entry`.
    pub fn begin_nested(&mut self, size_hint: usize) -> Result<(), BridgeError> {
        self.check_room_for_stage()?;
        self.frames.push(Frame::new(size_hint));
        Ok(())
    }

    pub fn stage_integer(&mut self, v: i64) -> Result<(), BridgeError> {
        self.stage(Staged::Integer(v))
    }

    pub fn stage_number(&mut self, v: f64) -> Result<(), BridgeError> {
        self.stage(Staged::Number(v))
    }

    pub fn stage_string(&mut self, v: &str) -> Result<(), BridgeError> {
        self.stage(Staged::Str(v.to_string()))
    }

    /// Consume the two staged values as (key, value) and insert them into
    /// the current table. Raw insertion: no coercion, overwrite on an
    /// existing key.
    pub fn commit_entry(&mut self) -> Result<(), BridgeError> {
        let frame = self.top_mut();
        if frame.pending.len() != 2 {
            return Err(BridgeError::TableProtocol(format!(
                "commit_entry needs a staged key and value, found {} staged value(s)",
                frame.pending.len()
            )));
        }
        let value = frame.pending.remove(1);
        let key = frame.pending.remove(0);
        frame.entries.push((key, value));
        Ok(())
    }

    /// Close the innermost nested table and stage it as a value in the
    /// enclosing frame.
    pub fn close_table(&mut self) -> Result<(), BridgeError> {
        if self.frames.len() < 2 {
            return Err(BridgeError::TableProtocol(
                "close_table without an open nested table".to_string(),
            ));
        }
        let frame = self.frames.remove(self.frames.len() - 1);
        if !frame.pending.is_empty() {
            return Err(BridgeError::TableProtocol(format!(
                "close_table with {} uncommitted staged value(s)",
                frame.pending.len()
            )));
        }
        self.stage(Staged::Table {
            entries: frame.entries,
            size_hint: frame.size_hint,
        })
    }

    /// Materialize the accumulated structure into the interpreter and bind
    /// it as a global under `name`, overwriting any prior binding. Consumes
    /// the builder; the table-under-construction's lifetime ends here.
    pub fn finalize(mut self, session: &Session, name: &str) -> Result<(), BridgeError> {
        if self.frames.len() != 1 {
            return Err(BridgeError::TableProtocol(format!(
                "finalize with {} unclosed nested table(s)",
                self.frames.len() - 1
            )));
        }
        let frame = self.frames.remove(0);
        if !frame.pending.is_empty() {
            return Err(BridgeError::TableProtocol(format!(
                "finalize with {} uncommitted staged value(s)",
                frame.pending.len()
            )));
        }

        let table = materialize(session.lua(), &frame.entries, frame.size_hint)?;
        session
            .lua()
            .globals()
            .set(name, table)
            .map_err(|e| interp("finalize_table", e))
    }

    fn stage(&mut self, staged: Staged) -> Result<(), BridgeError> {
        self.check_room_for_stage()?;
        self.top_mut().pending.push(staged);
        Ok(())
    }

    fn check_room_for_stage(&self) -> Result<(), BridgeError> {
        if self.top().pending.len() >= 2 {
            return Err(BridgeError::TableProtocol(
                "two values already staged; commit_entry before staging more".to_string(),
            ));
        }
        Ok(())
    }

    fn top(&self) -> &Frame {
        // frames is never empty: begin() seeds one and only finalize (which
        // consumes self) removes the last.
        &self.frames[self.frames.len() - 1]
    }

    fn top_mut(&mut self) -> &mut Frame {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }
}

fn materialize(
    lua: &Lua,
    entries: &[(Staged, Staged)],
    size_hint: usize,
) -> Result<Table, BridgeError> {
    let table = lua
        .create_table_with_capacity(size_hint, 0)
        .map_err(|e| interp("create_table", e))?;
    for (key, value) in entries {
        table
            .raw_set(to_value(lua, key)?, to_value(lua, value)?)
            .map_err(|e| interp("set_table", e))?;
    }
    Ok(table)
}

fn to_value(lua: &Lua, staged: &Staged) -> Result<Value, BridgeError> {
    Ok(match staged {
        Staged::Integer(i) => Value::Integer(*i),
        Staged::Number(n) => Value::Number(*n),
        Staged::Str(s) => Value::String(
            lua.create_string(s)
                .map_err(|e| interp("push_table_string", e))?,
        ),
        Staged::Table { entries, size_hint } => {
            Value::Table(materialize(lua, entries, *size_hint)?)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_without_two_staged_values_is_rejected() {
        let mut builder = TableBuilder::begin(0);
        assert!(matches!(
            builder.commit_entry(),
            Err(BridgeError::TableProtocol(_))
        ));

        builder.stage_integer(1).unwrap();
        assert!(matches!(
            builder.commit_entry(),
            Err(BridgeError::TableProtocol(_))
        ));
    }

    #[test]
    fn staging_a_third_value_is_rejected() {
        let mut builder = TableBuilder::begin(0);
        builder.stage_integer(1).unwrap();
        builder.stage_string("a").unwrap();
        assert!(matches!(
            builder.stage_number(2.0),
            Err(BridgeError::TableProtocol(_))
        ));
    }

    #[test]
    fn close_without_a_nested_table_is_rejected() {
        let mut builder = TableBuilder::begin(0);
        assert!(matches!(
            builder.close_table(),
            Err(BridgeError::TableProtocol(_))
        ));
    }

    #[test]
    fn close_with_uncommitted_values_is_rejected() {
        let mut builder = TableBuilder::begin(0);
        builder.stage_integer(1).unwrap();
        builder.begin_nested(0).unwrap();
        builder.stage_string("dangling").unwrap();
        assert!(matches!(
            builder.close_table(),
            Err(BridgeError::TableProtocol(_))
        ));
    }

    #[test]
    fn nested_commit_order_is_enforced() {
        let mut builder = TableBuilder::begin(1);
        builder.stage_integer(1).unwrap();
        builder.begin_nested(1).unwrap();
        builder.stage_string("volume").unwrap();
        builder.stage_integer(42).unwrap();
        builder.commit_entry().unwrap();
        builder.close_table().unwrap();
        builder.commit_entry().unwrap();
        // Both frames drained; a further commit has nothing staged.
        assert!(matches!(
            builder.commit_entry(),
            Err(BridgeError::TableProtocol(_))
        ));
    }
}
