use super::*;

#[test]
fn parses_products_with_defaults() {
    let cli = Cli::try_parse_from(["e3sync-cli", "products"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Products {
            category: None,
            query: None,
            in_stock: false,
            page: 1,
            limit: None,
            json: false,
        }
    ));
}

#[test]
fn parses_products_filters() {
    let cli = Cli::try_parse_from([
        "e3sync-cli",
        "products",
        "--category",
        "C12",
        "--query",
        "led",
        "--in-stock",
        "--page",
        "3",
        "--limit",
        "50",
    ])
    .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Products {
            category: Some(ref c),
            query: Some(ref q),
            in_stock: true,
            page: 3,
            limit: Some(50),
            ..
        } if c == "C12" && q == "led"
    ));
}

#[test]
fn parses_categories_and_check() {
    let cli = Cli::try_parse_from(["e3sync-cli", "categories"]).unwrap();
    assert!(matches!(cli.command, Commands::Categories));

    let cli = Cli::try_parse_from(["e3sync-cli", "check"]).unwrap();
    assert!(matches!(cli.command, Commands::Check));
}

#[test]
fn parses_import_from_file() {
    let cli = Cli::try_parse_from(["e3sync-cli", "import", "--file", "batch.json", "--dry-run"])
        .unwrap();
    assert!(matches!(
        cli.command,
        Commands::Import {
            file: Some(ref f),
            dry_run: true,
            concurrency: None,
            ..
        } if f.as_os_str() == "batch.json"
    ));
}

#[test]
fn parses_repeated_codes() {
    let cli = Cli::try_parse_from([
        "e3sync-cli",
        "import",
        "--code",
        "A1",
        "--code",
        "B2",
        "--concurrency",
        "4",
    ])
    .unwrap();
    match cli.command {
        Commands::Import {
            file,
            codes,
            dry_run,
            concurrency,
        } => {
            assert!(file.is_none());
            assert_eq!(codes, vec!["A1", "B2"]);
            assert!(!dry_run);
            assert_eq!(concurrency, Some(4));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn import_requires_a_source() {
    assert!(Cli::try_parse_from(["e3sync-cli", "import"]).is_err());
}

#[test]
fn import_rejects_file_and_codes_together() {
    assert!(
        Cli::try_parse_from(["e3sync-cli", "import", "--file", "a.json", "--code", "A1"]).is_err()
    );
}

#[test]
fn import_rejects_out_of_range_concurrency() {
    assert!(
        Cli::try_parse_from(["e3sync-cli", "import", "--code", "A1", "--concurrency", "9"])
            .is_err()
    );
    assert!(
        Cli::try_parse_from(["e3sync-cli", "import", "--code", "A1", "--concurrency", "0"])
            .is_err()
    );
}

#[test]
fn command_is_required() {
    assert!(Cli::try_parse_from(["e3sync-cli"]).is_err());
}
