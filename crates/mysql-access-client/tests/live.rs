//! End-to-end tests against a live MySQL server.
//!
//! Set `MYSQL_ACCESS_TEST_DSN`, for example:
//!
//! ```text
//! MYSQL_ACCESS_TEST_DSN='host=127.0.0.1;user=root;password=secret;database=test'
//! ```
//!
//! and run `cargo test -- --ignored`.

use mysql_access_client::{
    ConnectOptions, Database, DeleteQuery, Error, Literal, PoolConfig, SelectQuery, UpdateQuery,
};

fn test_options() -> ConnectOptions {
    let raw = std::env::var("MYSQL_ACCESS_TEST_DSN").expect("MYSQL_ACCESS_TEST_DSN not set");
    ConnectOptions::from_connection_string(&raw).expect("invalid test DSN")
}

#[test]
#[ignore = "requires a running MySQL server"]
fn crud_round_trip() {
    let mut db = Database::connect(test_options(), PoolConfig::default()).unwrap();

    db.admin().unwrap().execute("DROP TABLE IF EXISTS access_smoke").unwrap();
    assert!(
        db.admin()
            .unwrap()
            .create_table(
                "access_smoke",
                "id INT PRIMARY KEY AUTO_INCREMENT, name VARCHAR(64) NOT NULL, qty INT",
            )
            .unwrap()
    );
    // Second attempt is a no-op.
    assert!(!db.admin().unwrap().create_table("access_smoke", "id INT").unwrap());
    assert!(
        db.admin()
            .unwrap()
            .create_index("access_smoke", "idx_smoke_name", "name")
            .unwrap()
    );

    assert_eq!(
        db.insert(
            "access_smoke",
            &["name", "qty"],
            vec!["router".into(), 3.into()],
        )
        .unwrap(),
        1
    );
    assert_eq!(
        db.bulk_insert(
            "access_smoke",
            &["name", "qty"],
            vec![
                vec!["switch".into(), 8.into()],
                vec!["hub".into(), Literal::Null],
            ],
        )
        .unwrap(),
        2
    );

    let rows = db
        .select(
            &SelectQuery::new()
                .columns(&["name", "qty"])
                .from("access_smoke")
                .where_clause("qty IS NOT NULL"),
        )
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get_by_name("name"), Some("router"));

    assert_eq!(
        db.update(
            &UpdateQuery::new("access_smoke")
                .set("qty", 4)
                .where_eq("name", "router"),
        )
        .unwrap(),
        1
    );
    assert_eq!(
        db.delete(&DeleteQuery::new("access_smoke").where_eq("qty", Literal::Null))
            .unwrap(),
        1
    );

    db.admin().unwrap().execute("DROP TABLE access_smoke").unwrap();

    db.close();
    assert!(matches!(db.admin(), Err(Error::NotInitialized)));
    assert!(db.pool().is_closed());
}

#[test]
#[ignore = "requires a running MySQL server"]
fn exhausted_pool_reports_busy() {
    let config = PoolConfig::new().min_connections(1).max_connections(2);
    let db = Database::connect(test_options(), config).unwrap();

    let _a = db.pool().acquire().unwrap();
    let _b = db.pool().acquire().unwrap();

    let err = Error::from(db.pool().acquire().unwrap_err());
    assert!(err.is_busy());
}
