//! Shared test helpers for integration tests

#![allow(dead_code)]

use assert_cmd::cargo;
use assert_cmd::Command;
use tempfile::TempDir;

/// Helper to get an idesk command with no identity set
pub fn idesk() -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("idesk"));
    cmd.env_remove("IDESK_USER")
        .env_remove("IDESK_ROLE")
        .env_remove("IDESK_DEPARTMENT")
        .env_remove("IDESK_LOG");
    cmd
}

/// Helper to get an idesk command acting as `user` under `role`, run in the project
pub fn idesk_as(tmp: &TempDir, user: &str, role: &str) -> Command {
    let mut cmd = idesk();
    cmd.current_dir(tmp.path())
        .env("IDESK_USER", user)
        .env("IDESK_ROLE", role);
    cmd
}

/// Helper to create a test project in a temp directory
pub fn setup_test_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    idesk().current_dir(tmp.path()).arg("init").assert().success();
    tmp
}

/// Run a command that prints a single id with `--format id` and return it
pub fn created_id(mut cmd: Command) -> String {
    let output = cmd.args(["--format", "id"]).output().unwrap();
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Register a company at the Accra test site with a 100 m radius
pub fn create_test_company(tmp: &TempDir) -> String {
    let mut cmd = idesk_as(tmp, "admin-1", "admin");
    cmd.args([
        "company",
        "add",
        "--name",
        "Volta Analytics",
        "--lat=5.6037",
        "--lng=-0.1870",
        "--radius",
        "100",
    ]);
    created_id(cmd)
}

/// Create a task for `student` on `date`
pub fn create_test_task(tmp: &TempDir, student: &str, date: &str, description: &str) -> String {
    let mut cmd = idesk_as(tmp, student, "student");
    cmd.args(["task", "new", "--date", date, "--description", description]);
    created_id(cmd)
}

/// Create a placement for `student` covering `start..=end`
pub fn create_test_placement(tmp: &TempDir, student: &str, start: &str, end: &str) -> String {
    let mut cmd = idesk_as(tmp, student, "student");
    cmd.args([
        "placement",
        "new",
        "--company-name",
        "Volta Analytics",
        "--supervisor-contact",
        "ama@volta.example",
        "--start",
        start,
        "--end",
        end,
    ]);
    created_id(cmd)
}
