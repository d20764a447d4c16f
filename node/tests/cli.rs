use std::process::Command;

fn node() -> Command {
    Command::new(env!("CARGO_BIN_EXE_bookshelf-node"))
}

#[test]
fn prints_the_schema() {
    let output = node()
        .arg("--print-schema")
        .output()
        .expect("node binary runs");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("type Book {"));
    assert!(stdout.contains("createBook(title: String!, author: String!): CreateBookPayload"));
}

#[test]
fn fails_to_start_with_a_broken_seed_file() {
    let dir = tempfile::tempdir().unwrap();
    let seed = dir.path().join("seed.json");
    std::fs::write(&seed, "{ not json").unwrap();

    let output = node()
        .args(["--http-port", "0", "--seed"])
        .arg(&seed)
        .output()
        .expect("node binary runs");
    assert!(!output.status.success());

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("is not a list of books"), "{}", stderr);
}

#[test]
fn fails_to_start_with_unknown_options() {
    let output = node()
        .arg("--postgres-url")
        .output()
        .expect("node binary runs");
    assert!(!output.status.success());
}
