//! End-to-end runs of the whole generation pipeline, driving the real
//! backends through the public entry point.

use std::fs;
use std::path::{Path, PathBuf};

use speculoos::prelude::*;

use glue_maker_rust::main_run;
use glue_maker_rust::opt::{LoggerOpt, Opt};

fn opt(inputs: Vec<PathBuf>, output_dir: &Path) -> Opt {
    Opt {
        inputs,
        output_dir: output_dir.to_path_buf(),
        only_subprograms: false,
        external_codecs: false,
        prune_artificial_members: false,
        logger: LoggerOpt { verbose: 0 },
    }
}

fn write_dataview(dir: &Path) -> PathBuf {
    let path = dir.join("dataview.yaml");
    fs::write(
        &path,
        "types:\n\
         \x20 - { name: T-POS, leaf: SEQUENCE, members: [ { name: x, type: T-Int } ] }\n\
         \x20 - { name: T-Int, leaf: INTEGER }\n\
         \x20 - { name: T-Flag, leaf: BOOLEAN }\n",
    )
    .unwrap();
    path
}

#[test]
fn test_full_run_generates_glue() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    fs::create_dir(&out).unwrap();
    let dataview = write_dataview(dir.path());

    let input = dir.path().join("system.yaml");
    fs::write(
        &input,
        format!(
            "signals:\n\
             \x20 - {{ name: pos, file: \"{dataview}\", type: T-POS, size: 16 }}\n\
             \x20 - {{ name: flag, file: \"{dataview}\", type: T-Flag }}\n\
             interfaces:\n\
             \x20 - {{ id: compute, params: [ {{ id: x, signal: pos }} ] }}\n\
             \x20 - {{ id: telemetry, params: [ {{ id: ready, signal: flag }} ] }}\n\
             implementations:\n\
             \x20 - {{ interface: compute, implementation: impl1, language: C }}\n\
             \x20 - {{ interface: telemetry, implementation: gui, language: gui_ri }}\n",
            dataview = dataview.display()
        ),
    )
    .unwrap();

    main_run(opt(vec![input], &out)).unwrap();

    // the main loop serves both entries through the c backend
    let glue = fs::read_to_string(out.join("compute_impl1_glue.c")).unwrap();
    assert_that!(glue.as_str()).contains("x_T_POS_convert");
    let glue = fs::read_to_string(out.join("telemetry_gui_glue.c")).unwrap();
    assert_that!(glue.as_str()).contains("ready_T_Flag_convert");

    // the dual-target pass adds the GUI pair artifacts
    let index = fs::read_to_string(out.join("gui_index.py")).unwrap();
    assert_that!(index.as_str()).contains("import telemetry_gui_gui");
    assert_that!(out.join("telemetry_gui_widgets.py").is_file()).is_true();
    assert_that!(out.join("gui_main_window.py").is_file()).is_true();
}

#[test]
fn test_unknown_signal_aborts_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    fs::create_dir(&out).unwrap();

    let input = dir.path().join("system.yaml");
    fs::write(
        &input,
        "interfaces:\n\
         \x20 - { id: compute, params: [ { id: x, signal: missing } ] }\n\
         implementations:\n\
         \x20 - { interface: compute, implementation: impl1, language: C }\n",
    )
    .unwrap();

    let err = main_run(opt(vec![input], &out)).unwrap_err();
    let message = err.to_string();
    assert_that!(message.as_str()).contains("missing");
    assert_that!(message.as_str()).contains("compute");
}

#[test]
fn test_output_dir_must_exist() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("system.yaml");
    fs::write(&input, "interfaces: []\n").unwrap();

    let err = main_run(opt(vec![input], &dir.path().join("nope"))).unwrap_err();
    assert_that!(err.to_string().as_str()).contains("is not a directory");
}
