//! End-to-end directive application against a temporary environment tree.
//!
//! Directives are parsed, resolved through the sample model document, and
//! applied to input files laid out the way a model environment stores them.

use std::fs;

use sensi::batch::{BatchContext, DirectiveOutcome, apply_directive, apply_directives};
use sensi::core::syntax::parse;
use sensi::io::config::{EngineConfig, WriteMode};
use sensi::io::resolver::resolve;
use sensi::mutate::FileMutator;
use sensi::test_support::{SAMPLE_CSV, TestEnv, input_root, sample_document, sample_settings, write_file};

#[test]
fn eco_driver_directive_rewrites_driver_table() {
    let env = TestEnv::new().expect("env");
    let path = env.write_input("E01/Nominal_rates/eur_ir_param.csv", SAMPLE_CSV);
    let document = sample_document();
    let settings = sample_settings();
    let config = EngineConfig::default();
    let ctx = BatchContext {
        document: &document,
        settings: &settings,
        env_dir: env.root(),
        config: &config,
    };

    let outcome = apply_directive(
        "file::eco[EUR].driver[IR].param['y'].where (x==1 || x==4) = (-0.25)",
        &ctx,
        &FileMutator::default(),
    )
    .expect("apply");

    assert_eq!(outcome, DirectiveOutcome::Applied(path.clone()));
    assert_eq!(
        fs::read_to_string(&path).expect("read"),
        "id,x,y,name\nrowA,1,4.75,alpha\nrowB,2,12,beta\nrowC,3,8,gamma\nrowD,4,19.75,delta\n"
    );
}

#[test]
fn key_addressed_driver_uses_subclass_folder() {
    let env = TestEnv::new().expect("env");
    let path = env.write_input("E01/Equity/eur_eq_param.csv", SAMPLE_CSV);
    let document = sample_document();
    let syntax = parse("file::eco_1.driver_2.param[3,'rowB'] = 0").expect("parse");

    let resolved = resolve(&document, &syntax.expression, env.root()).expect("resolve");
    assert_eq!(resolved, path);
    assert!(FileMutator::default().mutate(&resolved, &syntax, &sample_settings()));
    assert!(
        fs::read_to_string(&path)
            .expect("read")
            .contains("rowB,2,0,beta\n")
    );
}

#[test]
fn encrypted_layout_is_used_when_name_folder_is_absent() {
    let env = TestEnv::new().expect("env");
    let path = input_root(env.root(), "S001").join("Correlation/target_corr.csv");
    write_file(&path, SAMPLE_CSV);
    let document = sample_document();
    let settings = sample_settings();
    let config = EngineConfig {
        write_mode: WriteMode::Atomic,
        ..EngineConfig::default()
    };
    let ctx = BatchContext {
        document: &document,
        settings: &settings,
        env_dir: env.root(),
        config: &config,
    };

    let report = apply_directives(
        ["file::hist_corr.target_corr['name'].where y>10 = 'high'"],
        &ctx,
    )
    .expect("batch");

    assert!(report.is_success(), "failures: {:?}", report.failures);
    assert_eq!(report.applied, vec![path.clone()]);
    let contents = fs::read_to_string(&path).expect("read");
    assert!(contents.contains("rowB,2,12,high\n"));
    assert!(contents.contains("rowD,4,20,high\n"));
    assert!(contents.contains("rowC,3,8,gamma\n"));
}

#[test]
fn failing_directive_leaves_input_untouched() {
    let env = TestEnv::new().expect("env");
    let path = env.write_input("Roll_Forward/roll_forward.csv", SAMPLE_CSV);
    let document = sample_document();
    let settings = sample_settings();
    let config = EngineConfig::default();
    let ctx = BatchContext {
        document: &document,
        settings: &settings,
        env_dir: env.root(),
        config: &config,
    };

    let report = apply_directives(
        [
            "file::param.roll_forward[9] = 1",
            "file::param.roll_forward[2].where x<>1 = 1",
            "file::param.roll_forward[2] = (/0)",
        ],
        &ctx,
    )
    .expect("batch");

    assert_eq!(report.failures.len(), 3);
    assert!(report.applied.is_empty());
    assert_eq!(fs::read_to_string(&path).expect("read"), SAMPLE_CSV);
}

#[test]
fn repeated_value_less_directive_is_stable() {
    let env = TestEnv::new().expect("env");
    let path = env.write_input("Formats/formats.csv", "id,x\n\"rowA\",1\r\nrowB,\"a,b\"\r\n");
    let document = sample_document();
    let settings = sample_settings();
    let config = EngineConfig::default();
    let ctx = BatchContext {
        document: &document,
        settings: &settings,
        env_dir: env.root(),
        config: &config,
    };

    let directive = "file::param.table_format[*] =";
    apply_directives([directive], &ctx).expect("first");
    let first = fs::read(&path).expect("read");
    apply_directives([directive], &ctx).expect("second");
    assert_eq!(fs::read(&path).expect("read"), first);
    assert_eq!(first, b"id,x\nrowA,1\nrowB,\"a,b\"\n");
}
