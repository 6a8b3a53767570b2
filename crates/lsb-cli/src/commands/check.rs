//! The `lsb check` handler: load a script and confirm the entry point.

use std::path::Path;

use anyhow::{bail, Result};

use lsb_bridge::{Session, TICK_HANDLER};

pub fn check(script: &str) -> Result<()> {
    let session = Session::create(Path::new(script))?;
    let has_handler = session.has_tick_handler();
    session.close();

    if !has_handler {
        bail!("script does not define a callable `{TICK_HANDLER}` handler");
    }

    println!("ok=true script={script}");
    Ok(())
}
