//! Embedded scripting hook behind the `~` builtin.

use mlua::Lua;

/// Chunk name shown in interpreter error messages.
const CHUNK_NAME: &str = "scs";

/// An interpreter that runs source text handed over by the shell.
pub trait ScriptEngine {
    /// Loads and runs `source`, returning the interpreter's message on failure.
    fn execute(&mut self, source: &str) -> Result<(), String>;
}

/// Lua 5.4 state with the standard library loaded.
///
/// Globals persist between calls, so `~ x = 1` followed by `~ print(x)` prints `1`.
pub struct LuaEngine {
    lua: Lua,
}

impl LuaEngine {
    pub fn new() -> Self {
        Self { lua: Lua::new() }
    }
}

impl Default for LuaEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptEngine for LuaEngine {
    fn execute(&mut self, source: &str) -> Result<(), String> {
        self.lua
            .load(source)
            .set_name(CHUNK_NAME)
            .exec()
            .map_err(|e| e.to_string())
    }
}
