//! Library integration tests.

use packwise::PackwiseError;

#[test]
fn error_types_are_public() {
    let err = PackwiseError::InterpreterNotFound {
        message: "no python3 on PATH".into(),
    };
    assert!(err.to_string().contains("python3"));
}

#[test]
fn result_type_alias_is_public() {
    fn test_fn() -> packwise::Result<()> {
        Ok(())
    }
    assert!(test_fn().is_ok());
}

#[test]
fn cli_types_are_public() {
    use clap::Parser;
    use packwise::cli::{Cli, Commands};

    let cli = Cli::parse_from(["packwise", "analyze", "app.py", "--json"]);
    let Commands::Analyze(args) = cli.command else {
        panic!("expected analyze");
    };
    assert!(args.json);
    assert_eq!(args.script, std::path::PathBuf::from("app.py"));
}

#[test]
fn config_defaults_validate() {
    let config = packwise::config::PackwiseConfig::default();
    assert!(packwise::config::validate(&config).is_ok());
    assert!(config.settings.cache.enabled);
}

#[test]
fn config_loads_from_project_dir() {
    let temp = tempfile::TempDir::new().unwrap();
    let dir = temp.path().join(".packwise");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("config.yml"),
        "settings:\n  probe:\n    strategy: pool\n    workers: 2\nregistry:\n  denied: [mylib]\n",
    )
    .unwrap();
    std::fs::write(
        dir.join("config.local.yml"),
        "settings:\n  probe:\n    workers: 4\n",
    )
    .unwrap();

    let config = packwise::config::load_config(temp.path(), None).unwrap();
    assert_eq!(
        config.settings.probe.strategy,
        packwise::probe::ProbeStrategyKind::Pool
    );
    assert_eq!(config.settings.probe.workers, 4);
    assert_eq!(config.registry.denied, vec!["mylib".to_string()]);
}

#[test]
fn builtin_registry_knows_common_packages() {
    let registry = packwise::registry::Registry::builtin();
    assert!(registry.is_stdlib("os"));
    assert_eq!(registry.distribution_name("yaml"), "PyYAML");
    assert!(registry.is_giant("numpy"));
    assert!(registry.is_denied("pytest"));
}

#[test]
fn extraction_survives_bad_syntax() {
    let extraction = packwise::extract::extract("import requests\ndef broken(:\n    import yaml\n");
    assert!(extraction.syntax_error.is_some());
    assert!(extraction.imports.top_level().contains("requests"));
    assert!(extraction.imports.top_level().contains("yaml"));
}
