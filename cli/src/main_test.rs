use super::*;
use clap::CommandFactory;

#[test]
fn cli_definition_is_valid() {
    Cli::command().debug_assert();
}

#[test]
fn base_url_defaults_to_localhost() {
    let cli = Cli::try_parse_from(["classroom-cli", "ping"]).unwrap();
    assert_eq!(cli.base_url, "http://127.0.0.1:3000");
}

#[test]
fn parses_student_create_with_connections() {
    let cli = Cli::try_parse_from([
        "classroom-cli",
        "student",
        "create",
        "Mina",
        "--class-id",
        "3",
        "--connect",
        "4,5",
    ])
    .unwrap();
    let Command::Student(StudentCommand {
        command: StudentSubcommand::Create { name, class_id, connections },
    }) = cli.command
    else {
        panic!("expected student create");
    };
    assert_eq!(name, "Mina");
    assert_eq!(class_id, Some(3));
    assert_eq!(connections, vec![4, 5]);
    assert_eq!(
        student_body(name, class_id, connections),
        json!({ "name": "Mina", "class_id": 3, "connections": [4, 5] })
    );
}

#[test]
fn batch_requires_names() {
    assert!(Cli::try_parse_from(["classroom-cli", "class", "batch"]).is_err());
}

#[test]
fn arrange_query_includes_only_given_flags() {
    let cli = Cli::try_parse_from(["classroom-cli", "arrange", "7", "--mode", "grid", "--width", "800"]).unwrap();
    let Command::Arrange(args) = cli.command else {
        panic!("expected arrange");
    };
    assert_eq!(arrange_query(&args), vec![("mode", "grid".to_owned()), ("width", "800".to_owned())]);
}

#[test]
fn arrange_query_is_encoded_by_the_request_builder() {
    let cli = Cli::try_parse_from(["classroom-cli", "arrange", "2", "--policy", "keep&mode=grid"]).unwrap();
    let Command::Arrange(args) = cli.command else {
        panic!("expected arrange");
    };
    let request = reqwest::Client::new()
        .post("http://127.0.0.1:3000/api/classes/2/arrange")
        .query(&arrange_query(&args))
        .build()
        .unwrap();
    assert_eq!(request.url().query(), Some("policy=keep%26mode%3Dgrid"));
}

#[test]
fn arrange_without_flags_sends_no_query() {
    let cli = Cli::try_parse_from(["classroom-cli", "arrange", "2"]).unwrap();
    let Command::Arrange(args) = cli.command else {
        panic!("expected arrange");
    };
    assert!(arrange_query(&args).is_empty());
}

#[test]
fn student_body_omits_empty_fields() {
    assert_eq!(student_body("Joon".into(), None, Vec::new()), json!({ "name": "Joon" }));
}
