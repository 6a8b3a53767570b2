use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, OnceLock};

use lsb_bridge::{Decision, Session, TableBuilder};

/// One READY session per process: serialize the tests in this binary.
fn session_lock() -> MutexGuard<'static, ()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|e| e.into_inner())
}

fn write_script(dir: &tempfile::TempDir, source: &str) -> PathBuf {
    let path = dir.path().join("strategy.lua");
    std::fs::write(&path, source).unwrap();
    path
}

#[test]
fn flat_table_round_trips_with_exactly_the_committed_keys() {
    let _guard = session_lock();
    let dir = tempfile::tempdir().unwrap();
    let path = write_script(
        &dir,
        "function on_tick()\n\
           first = t[1]\n\
           second = t[2]\n\
           key_count = 0\n\
           for _ in pairs(t) do key_count = key_count + 1 end\n\
         end",
    );

    let session = Session::create(&path).unwrap();

    let mut builder = TableBuilder::begin(2);
    builder.stage_integer(1).unwrap();
    builder.stage_string("a").unwrap();
    builder.commit_entry().unwrap();
    builder.stage_integer(2).unwrap();
    builder.stage_string("b").unwrap();
    builder.commit_entry().unwrap();
    builder.finalize(&session, "t").unwrap();

    assert_eq!(session.tick().unwrap(), Decision::Noop);
    assert_eq!(session.get_string_var("first").unwrap(), "a");
    assert_eq!(session.get_string_var("second").unwrap(), "b");
    assert_eq!(session.get_int_var("key_count").unwrap(), 2);
    session.close();
}

#[test]
fn nested_candle_shaped_table_is_readable() {
    let _guard = session_lock();
    let dir = tempfile::tempdir().unwrap();
    let path = write_script(
        &dir,
        "function on_tick()\n\
           volume_0 = chart[0].volume\n\
           close_ok = (chart[0].close == 1.25) and 1 or 0\n\
         end",
    );

    let session = Session::create(&path).unwrap();

    let mut builder = TableBuilder::begin(1);
    builder.stage_integer(0).unwrap();
    builder.begin_nested(2).unwrap();
    builder.stage_string("close").unwrap();
    builder.stage_number(1.25).unwrap();
    builder.commit_entry().unwrap();
    builder.stage_string("volume").unwrap();
    builder.stage_integer(7).unwrap();
    builder.commit_entry().unwrap();
    builder.close_table().unwrap();
    builder.commit_entry().unwrap();
    builder.finalize(&session, "chart").unwrap();

    session.tick().unwrap();
    assert_eq!(session.get_int_var("volume_0").unwrap(), 7);
    assert_eq!(session.get_int_var("close_ok").unwrap(), 1);
    session.close();
}

#[test]
fn republishing_a_table_overwrites_the_prior_binding() {
    let _guard = session_lock();
    let dir = tempfile::tempdir().unwrap();
    let path = write_script(
        &dir,
        "function on_tick()\n\
           value = t[1]\n\
         end",
    );

    let session = Session::create(&path).unwrap();

    for generation in [10i64, 20i64] {
        let mut builder = TableBuilder::begin(1);
        builder.stage_integer(1).unwrap();
        builder.stage_integer(generation).unwrap();
        builder.commit_entry().unwrap();
        builder.finalize(&session, "t").unwrap();
    }

    session.tick().unwrap();
    assert_eq!(session.get_int_var("value").unwrap(), 20);
    session.close();
}
