use assert_cmd::Command;

fn libris() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("libris"));
    let database = std::path::Path::new(env!("CARGO_TARGET_TMPDIR")).join("libris-cli.db");
    cmd.env("LIBRIS_CONFIG_DIR", env!("CARGO_TARGET_TMPDIR"))
        .env(
            "LIBRIS_DATABASE__URL",
            format!("sqlite://{}", database.display()),
        )
        .env("LIBRIS_ENV", "local")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_lists_commands() {
    let output = libris().arg("--help").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    for command in ["serve", "migrate", "openapi", "check-config"] {
        assert!(stdout.contains(command), "missing {command} in help");
    }
}

#[test]
fn openapi_covers_both_collections() {
    let output = libris().arg("openapi").output().unwrap();
    assert!(output.status.success());

    let document: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(document["paths"]["/api/books"]["get"].is_object());
    assert!(document["paths"]["/api/authors/{id}"]["delete"].is_object());
}

#[test]
fn check_config_reports_defaults() {
    let output = libris().arg("check-config").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("default limit 3"));
    assert!(stdout.contains("(reachable)"));
}

#[test]
fn unknown_environment_is_rejected() {
    libris().arg("check-config").env("LIBRIS_ENV", "moon").assert().failure();
}
