mod resource {
    pub mod mock;
    pub mod models;
}

#[cfg(test)]
mod tests {
    use crate::resource::{
        mock::{MockConnection, Response, row},
        models::{Tag, User},
    };
    use sift::{
        DbError, Filters, PageReq, RowLabeled, Service, UserId, Value, filters, find_db_error,
        is_record_not_found_error,
    };

    fn user_row(name: &str, updated_by: i64) -> RowLabeled {
        row([
            ("id", Value::Int64(Some(3))),
            ("email", "ann@example.com".into()),
            ("phone", "".into()),
            ("name", name.into()),
            ("age", Value::Int32(Some(30))),
            ("nick_name", Value::Null),
            ("created_by", Value::Int64(Some(7))),
            ("updated_by", Value::Int64(Some(updated_by))),
            ("deleted", Value::Int64(Some(0))),
        ])
    }

    #[tokio::test]
    async fn create_with_user_id() {
        let mut connection = MockConnection::new();
        connection.respond(Response::Affected(1, Some(3)));
        let service = Service::<User>::new();
        let mut user = User {
            email: "ann@example.com".into(),
            name: "Ann".into(),
            age: 30,
            ..Default::default()
        };
        service
            .create_with_user_id(&mut connection, &mut user, 7)
            .await
            .unwrap();
        assert_eq!(user.id, 3);
        assert_eq!(user.created_by, UserId::new(7));
        assert_eq!(user.updated_by, UserId::new(7));
        assert_eq!(
            connection.last(),
            "INSERT INTO \"user\" (\"email\", \"phone\", \"name\", \"age\", \"nick_name\", \
             \"created_by\", \"updated_by\", \"deleted\") \
             VALUES ('ann@example.com', '', 'Ann', 30, NULL, 7, 7, 0);"
        );
    }

    #[tokio::test]
    async fn update_with_user_id() {
        let mut connection = MockConnection::new();
        connection
            .rows([user_row("Ann", 7)])
            .affected(1)
            .rows([user_row("Ann Marie", 9)]);
        let service = Service::<User>::new();
        let mut user = User {
            id: 3,
            email: "ann@example.com".into(),
            name: "Ann Marie".into(),
            age: 30,
            ..Default::default()
        };
        service
            .update_with_user_id(&mut connection, &mut user, 9, Filters::new())
            .await
            .unwrap();
        assert_eq!(connection.log.len(), 3);
        assert_eq!(
            connection.log[1],
            "UPDATE \"user\" SET \"name\" = 'Ann Marie', \"updated_by\" = 9\n\
             WHERE \"user\".\"deleted\" = 0 AND \"user\".\"id\" = 3;"
        );
        assert_eq!(user.name, "Ann Marie");
        assert_eq!(user.created_by, UserId::new(7));
        assert_eq!(user.updated_by, UserId::new(9));
    }

    #[tokio::test]
    async fn update_or_create() {
        let mut connection = MockConnection::new();
        connection
            .respond(Response::Rows(Vec::new()))
            .affected(1);
        let service = Service::<User>::new();
        let mut user = User {
            id: 11,
            email: "carl@example.com".into(),
            name: "Carl".into(),
            ..Default::default()
        };
        service
            .update_or_create_with_user_id(&mut connection, &mut user, 5, Filters::new())
            .await
            .unwrap();
        assert_eq!(connection.log.len(), 2);
        assert!(connection.log[1].starts_with("INSERT INTO \"user\" (\"id\", "));
        assert_eq!(user.id, 11);
        assert_eq!(user.created_by, UserId::new(5));
    }

    #[tokio::test]
    async fn remove_marks_deleted() {
        let mut connection = MockConnection::new();
        connection.rows([user_row("Ann", 7)]).affected(1);
        let service = Service::<User>::new();
        service
            .remove_by_id_with_user_id(&mut connection, 3i64, 9, Filters::new())
            .await
            .unwrap();
        let update = &connection.log[1];
        assert!(update.starts_with("UPDATE \"user\" SET \"deleted\" = "));
        assert!(update.ends_with(
            ", \"updated_by\" = 9\nWHERE \"user\".\"deleted\" = 0 AND \"user\".\"id\" = 3;"
        ));
    }

    #[tokio::test]
    async fn remove_needs_a_deleted_column() {
        let mut connection = MockConnection::new();
        let error = Service::<Tag>::new()
            .remove_by_id(&mut connection, 1i64, Filters::new())
            .await
            .unwrap_err();
        assert_eq!(find_db_error(&error), Some(&DbError::Model));
        assert!(connection.log.is_empty());
    }

    #[tokio::test]
    async fn lookups() {
        let mut connection = MockConnection::new();
        connection
            .rows([user_row("Ann", 7)])
            .rows([user_row("Ann", 7)])
            .rows([row([("COUNT(*)", Value::Int64(Some(1)))])]);
        let service = Service::<User>::new().with_title(|v| format!("{} <{}>", v.name, v.email));

        let title = service
            .find_title(&mut connection, 3i64, filters! { "age$gte" => 18 })
            .await
            .unwrap();
        assert_eq!(title.title, "Ann <ann@example.com>");
        assert!(connection.last().contains("WHERE \"user\".\"deleted\" = 0 AND \"age\" >= 18 AND \"user\".\"id\" = 3"));

        let request: PageReq =
            serde_json::from_str(r#"{"page": 1, "size": 10, "filters": {"name$like": "an"}}"#)
                .unwrap();
        let page = service
            .find_page(&mut connection, request.pageable.clone(), request.filters())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.list[0].name, "Ann");

        let found = service
            .find_one(&mut connection, filters! { "email" => "nobody@example.com" })
            .await
            .unwrap();
        assert_eq!(found, None);

        let error = Service::<Tag>::new()
            .find_title(&mut connection, 1i64, Filters::new())
            .await
            .unwrap_err();
        assert_eq!(error.to_string(), "No title function for `tag`");
    }

    #[tokio::test]
    async fn custom_primary_key() {
        let mut connection = MockConnection::new();
        let service = Service::<User>::new().with_primary_key("email");
        assert_eq!(service.primary_key().unwrap(), "email");
        let error = service
            .find_by_id(&mut connection, "ann@example.com".to_string(), Filters::new())
            .await
            .unwrap_err();
        assert!(is_record_not_found_error(&error));
        assert_eq!(error.to_string(), "user not found");
        assert!(connection.last().ends_with(
            "WHERE \"user\".\"deleted\" = 0 AND \"user\".\"email\" = 'ann@example.com'\nLIMIT 1;"
        ));

        let model = service
            .new_model_with_value(&User {
                email: "bob@example.com".into(),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(model.email, "bob@example.com");
        assert_eq!(model.id, 0);
        assert_eq!(Service::<Tag>::new().primary_key().unwrap(), "id");
    }
}
