mod resource {
    pub mod mock;
    pub mod models;
}

#[cfg(test)]
mod tests {
    use crate::resource::{
        mock::{MockConnection, Response, row},
        models::{Note, Tag, User},
    };
    use indoc::indoc;
    use sift::{
        DbError, Error, Model, Pageable, QueryOptions, Repository, RowLabeled, Value, Values, filters,
        find_db_error, is_not_single_error, is_record_not_affected_error,
        is_record_not_found_error,
    };

    fn tag_row(id: i64, name: &str, weight: i32) -> RowLabeled {
        row([
            ("id", Value::Int64(Some(id))),
            ("name", name.into()),
            ("weight", Value::Int32(Some(weight))),
        ])
    }

    fn tag(id: i64) -> Tag {
        Tag {
            id,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create() {
        let mut connection = MockConnection::new();
        connection
            .respond(Response::Affected(1, Some(42)))
            .respond(Response::Affected(1, Some(99)));

        let mut rust = Tag {
            name: "rust".into(),
            weight: 3,
            ..Default::default()
        };
        let affected = rust.create(&mut connection, QueryOptions::new()).await.unwrap();
        assert_eq!(affected.rows_affected, 1);
        assert_eq!(rust.id, 42);

        let mut go = Tag {
            id: 7,
            name: "go".into(),
            weight: 1,
        };
        go.create(&mut connection, QueryOptions::new().omit(["weight"]))
            .await
            .unwrap();
        assert_eq!(go.id, 7);

        assert_eq!(
            connection.log,
            [
                r#"INSERT INTO "tag" ("name", "weight") VALUES ('rust', 3);"#,
                r#"INSERT INTO "tag" ("id", "name") VALUES (7, 'go');"#,
            ]
        );
    }

    #[tokio::test]
    async fn create_stamps_times() {
        let mut connection = MockConnection::new();
        let mut note = Note {
            code: "n-1".into(),
            body: "hello".into(),
            ..Default::default()
        };
        note.create(&mut connection, QueryOptions::new()).await.unwrap();
        assert!(note.created_at.is_some());
        assert!(note.touched > 0);
        assert!(connection.last().starts_with(
            r#"INSERT INTO "blog"."note" ("code", "body", "created_at", "touched", "removed") VALUES ('n-1', 'hello', '"#
        ));
    }

    #[tokio::test]
    async fn find_by_id() {
        let mut connection = MockConnection::new();
        connection.rows([tag_row(5, "rust", 3)]);
        let mut found = tag(5);
        assert!(found.find_by_id(&mut connection, QueryOptions::new()).await.unwrap());
        assert_eq!(
            found,
            Tag {
                id: 5,
                name: "rust".into(),
                weight: 3,
            }
        );
        assert_eq!(
            connection.last(),
            indoc! {r#"
                SELECT "tag"."id", "tag"."name", "tag"."weight"
                FROM "tag"
                WHERE "tag"."id" = 5
                LIMIT 1;"#}
        );

        let error = tag(6)
            .find_by_id(&mut connection, QueryOptions::new())
            .await
            .unwrap_err();
        assert!(is_record_not_found_error(&error));
        assert_eq!(error.to_string(), "record not found");

        let found = tag(6)
            .find_by_id(&mut connection, QueryOptions::new().ignore_not_found())
            .await
            .unwrap();
        assert!(!found);

        let error = tag(6)
            .find_by_id(
                &mut connection,
                QueryOptions::new().error_not_found(|| Error::msg("no such tag")),
            )
            .await
            .unwrap_err();
        assert_eq!(error.to_string(), "no such tag");
    }

    #[tokio::test]
    async fn find_by_id_needs_a_key() {
        let mut connection = MockConnection::new();
        let error = Tag::default()
            .find_by_id(&mut connection, QueryOptions::new())
            .await
            .unwrap_err();
        assert_eq!(find_db_error(&error), Some(&DbError::PrimaryKeyEmpty));
        assert!(connection.log.is_empty());
    }

    #[tokio::test]
    async fn soft_deleted_rows_are_hidden() {
        let mut connection = MockConnection::new();
        let mut user = User {
            id: 5,
            ..Default::default()
        };
        let error = user
            .find_by_id(&mut connection, QueryOptions::new().omit(["email", "phone", "nickname"]))
            .await
            .unwrap_err();
        assert_eq!(error.to_string(), "user not found");
        assert_eq!(
            connection.last(),
            indoc! {r#"
                SELECT "user"."id", "user"."name", "user"."age", "user"."created_by", "user"."updated_by", "user"."deleted"
                FROM "user"
                WHERE "user"."deleted" = 0 AND "user"."id" = 5
                LIMIT 1;"#}
        );
        let count = User::count(&mut connection, QueryOptions::new().with_deleted())
            .await
            .unwrap();
        assert_eq!(count, 0);
        assert_eq!(connection.last(), "SELECT COUNT(*)\nFROM \"user\";");
    }

    #[tokio::test]
    async fn find_one() {
        let mut connection = MockConnection::new();
        connection
            .rows([tag_row(1, "a", 3), tag_row(2, "b", 3)])
            .rows([tag_row(1, "a", 3), tag_row(2, "b", 3)])
            .rows([tag_row(2, "b", 3)]);
        let options = || QueryOptions::new().filters(filters! { "weight" => 3 });

        let error = Tag::default()
            .find_one(&mut connection, options())
            .await
            .unwrap_err();
        assert!(is_not_single_error(&error));
        assert_eq!(
            connection.last(),
            indoc! {r#"
                SELECT "tag"."id", "tag"."name", "tag"."weight"
                FROM "tag"
                WHERE "weight" = 3
                LIMIT 2;"#}
        );
        let error = Tag::default()
            .find_one(
                &mut connection,
                options().error_not_single(|| Error::msg("ambiguous tag")),
            )
            .await
            .unwrap_err();
        assert_eq!(error.to_string(), "ambiguous tag");

        let mut found = Tag::default();
        assert!(found.find_one(&mut connection, options()).await.unwrap());
        assert_eq!(found.name, "b");

        let error = Tag::default()
            .find_one(&mut connection, options())
            .await
            .unwrap_err();
        assert!(is_record_not_found_error(&error));
        let found = Tag::default()
            .find_one(&mut connection, options().ignore_not_found())
            .await
            .unwrap();
        assert!(!found);
    }

    #[tokio::test]
    async fn find_first_and_last() {
        let mut connection = MockConnection::new();
        let mut found = Tag::default();
        assert!(!found.find(&mut connection, QueryOptions::new().first()).await.unwrap());
        assert_eq!(
            connection.last(),
            indoc! {r#"
                SELECT "tag"."id", "tag"."name", "tag"."weight"
                FROM "tag"
                ORDER BY id asc
                LIMIT 1;"#}
        );
        connection.rows([tag_row(9, "z", 1)]);
        assert!(found.find(&mut connection, QueryOptions::new().last()).await.unwrap());
        assert_eq!(found.id, 9);
        assert!(connection.last().ends_with("ORDER BY id desc\nLIMIT 1;"));
    }

    #[tokio::test]
    async fn find_all_and_page() {
        let mut connection = MockConnection::new();
        connection
            .rows([tag_row(2, "b", 1), tag_row(1, "a", 1)])
            .rows([tag_row(4, "d", 1), tag_row(3, "c", 1)])
            .rows([row([("COUNT(*)", Value::Int64(Some(5)))])]);

        let tags = Tag::find_all(&mut connection, QueryOptions::new()).await.unwrap();
        assert_eq!(tags.iter().map(|v| v.id).collect::<Vec<_>>(), [2, 1]);
        assert_eq!(
            connection.last(),
            indoc! {r#"
                SELECT "tag"."id", "tag"."name", "tag"."weight"
                FROM "tag"
                ORDER BY id desc;"#}
        );

        let (tags, total) = Tag::find_page(&mut connection, QueryOptions::new().page(2, 2, ""))
            .await
            .unwrap();
        assert_eq!(tags.len(), 2);
        assert_eq!(total, 5);
        assert_eq!(
            connection.log[1..],
            [
                indoc! {r#"
                    SELECT "tag"."id", "tag"."name", "tag"."weight"
                    FROM "tag"
                    ORDER BY id desc
                    LIMIT 2
                    OFFSET 2;"#},
                "SELECT COUNT(*)\nFROM \"tag\";",
            ]
        );

        let (tags, total) = Tag::find_page(&mut connection, QueryOptions::new())
            .await
            .unwrap();
        assert!(tags.is_empty());
        assert_eq!(total, 0);
        assert_eq!(connection.log.len(), 4);

        connection
            .rows([tag_row(1, "a", 1), tag_row(2, "b", 1)])
            .rows([row([("COUNT(*)", Value::Int64(Some(2)))])]);
        let (tags, total) =
            Tag::find_page(&mut connection, QueryOptions::new().pageable(Pageable::new(1, 0, "")))
                .await
                .unwrap();
        assert_eq!(tags.len(), 2);
        assert_eq!(total, 2);
        assert_eq!(
            connection.log[4],
            "SELECT \"tag\".\"id\", \"tag\".\"name\", \"tag\".\"weight\"\nFROM \"tag\"\nORDER BY id desc;"
        );
    }

    #[tokio::test]
    async fn pluck() {
        let mut connection = MockConnection::new();
        connection.rows([row([("name", "a".into())]), row([("name", "b".into())])]);
        let names = Tag::pluck::<String, _>(
            &mut connection,
            QueryOptions::new().pluck("name").sort("name"),
        )
        .await
        .unwrap();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(connection.last(), "SELECT name\nFROM \"tag\"\nORDER BY name;");

        for options in [QueryOptions::new(), QueryOptions::new().pluck(" ")] {
            let error = Tag::pluck::<String, _>(&mut connection, options)
                .await
                .unwrap_err();
            assert_eq!(find_db_error(&error), Some(&DbError::Pluck));
        }
        assert_eq!(connection.log.len(), 1);
    }

    #[tokio::test]
    async fn update_writes_only_changes() {
        let mut connection = MockConnection::new();
        connection
            .rows([tag_row(5, "rust", 3)])
            .affected(1)
            .rows([tag_row(5, "rust", 3)]);
        let proposed = Tag {
            id: 5,
            name: "rust".into(),
            weight: 4,
        };
        let changes = proposed
            .update_by_id_with_changed_values(&mut connection, &proposed, QueryOptions::new())
            .await
            .unwrap();
        assert_eq!(
            changes,
            Some(Values::from([("weight".to_string(), Value::Int32(Some(4)))]))
        );
        assert_eq!(
            connection.last(),
            "UPDATE \"tag\" SET \"weight\" = 4\nWHERE \"tag\".\"id\" = 5;"
        );

        let unchanged = tag_row(5, "rust", 3);
        let unchanged = Tag::from_row(unchanged).unwrap();
        let affected = unchanged
            .update_by_id(&mut connection, &unchanged, QueryOptions::new())
            .await
            .unwrap();
        assert_eq!(affected, 0);
        assert_eq!(connection.log.len(), 3);
        assert!(connection.last().starts_with("SELECT"));

        let changes = tag(6)
            .update_by_id_with_changed_values(
                &mut connection,
                &proposed,
                QueryOptions::new().ignore_not_found(),
            )
            .await
            .unwrap();
        assert_eq!(changes, None);
    }

    #[tokio::test]
    async fn update_with_columns() {
        let mut connection = MockConnection::new();
        connection.affected(1).affected(0).affected(0);
        let values = Values::from([
            ("weight".to_string(), Value::Int32(Some(0))),
            ("name".to_string(), "kept".into()),
        ]);
        let affected = tag(5)
            .update_by_id(
                &mut connection,
                values.clone(),
                QueryOptions::new().attend(["weight"]),
            )
            .await
            .unwrap();
        assert_eq!(affected, 1);
        assert_eq!(
            connection.last(),
            "UPDATE \"tag\" SET \"weight\" = 0\nWHERE \"tag\".\"id\" = 5;"
        );

        let error = tag(5)
            .update_by_id(&mut connection, values.clone(), QueryOptions::new().must_affected())
            .await
            .unwrap_err();
        assert!(is_record_not_affected_error(&error));
        assert_eq!(error.to_string(), "record for update not found");

        let user = User {
            id: 5,
            ..Default::default()
        };
        let error = user
            .update_by_id(
                &mut connection,
                Values::from([("age".to_string(), Value::Int32(Some(40)))]),
                QueryOptions::new().must_affected(),
            )
            .await
            .unwrap_err();
        assert_eq!(error.to_string(), "user not updated");
    }

    #[tokio::test]
    async fn bulk_operations_need_a_condition() {
        let mut connection = MockConnection::new();
        let values = Values::from([("weight".to_string(), Value::Int32(Some(1)))]);
        let error = Tag::update_all(&mut connection, values, QueryOptions::new())
            .await
            .unwrap_err();
        assert_eq!(find_db_error(&error), Some(&DbError::MissingCondition));
        let error = User::delete_all(&mut connection, QueryOptions::new())
            .await
            .unwrap_err();
        assert_eq!(find_db_error(&error), Some(&DbError::MissingCondition));
        assert!(connection.log.is_empty());

        connection.affected(3).affected(2);
        let template = Tag {
            id: 9,
            name: String::new(),
            weight: 2,
        };
        let affected = Tag::update_all(
            &mut connection,
            &template,
            QueryOptions::new().filters(filters! { "name" => "old" }),
        )
        .await
        .unwrap();
        assert_eq!(affected, 3);
        let affected = Tag::delete_all(
            &mut connection,
            QueryOptions::new().where_raw("weight < ?", vec![2.into()]),
        )
        .await
        .unwrap();
        assert_eq!(affected, 2);
        assert_eq!(
            connection.log,
            [
                "UPDATE \"tag\" SET \"weight\" = 2\nWHERE \"name\" = 'old';",
                "DELETE FROM \"tag\"\nWHERE (weight < 2);",
            ]
        );
    }

    #[tokio::test]
    async fn single_row_writes_pin_the_key() {
        let mut connection = MockConnection::new();
        connection
            .rows([tag_row(9, "old", 1)])
            .affected(1)
            .rows([tag_row(9, "old", 1)])
            .affected(1)
            .rows([tag_row(9, "old", 1)])
            .affected(1);
        let options = || QueryOptions::new().filters(filters! { "name" => "old" });

        let affected = Tag::delete_one(&mut connection, options()).await.unwrap();
        assert_eq!(affected, 1);
        assert_eq!(
            connection.log[1],
            "DELETE FROM \"tag\"\nWHERE \"name\" = 'old' AND \"tag\".\"id\" = 9;"
        );

        let values = Values::from([("weight".to_string(), Value::Int32(Some(1)))]);
        Tag::default()
            .update_one(&mut connection, values, options())
            .await
            .unwrap();
        assert_eq!(
            connection.log[3],
            "UPDATE \"tag\" SET \"weight\" = 1\nWHERE \"name\" = 'old' AND \"tag\".\"id\" = 9;"
        );

        let probe = Tag {
            name: "old".into(),
            weight: 5,
            ..Default::default()
        };
        let changes = probe
            .update_one_with_changed_values(&mut connection, &probe, options())
            .await
            .unwrap();
        assert_eq!(
            changes,
            Some(Values::from([("weight".to_string(), Value::Int32(Some(5)))]))
        );
        assert_eq!(
            connection.log[5],
            "UPDATE \"tag\" SET \"weight\" = 5\nWHERE \"name\" = 'old' AND \"tag\".\"id\" = 9;"
        );

        let affected = Tag::delete_one(&mut connection, options().ignore_not_found())
            .await
            .unwrap();
        assert_eq!(affected, 0);
        assert_eq!(connection.log.len(), 7);
    }

    #[tokio::test]
    async fn driver_failures_are_query_errors() {
        let mut connection = MockConnection::new();
        connection.respond(Response::Failure("connection reset".into()));
        let error = Tag::find_all(&mut connection, QueryOptions::new())
            .await
            .unwrap_err();
        assert_eq!(find_db_error(&error), Some(&DbError::Query));
        assert!(format!("{error:#}").contains("connection reset"));
    }
}
