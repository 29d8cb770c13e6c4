mod resource {
    pub mod mock;
    pub mod models;
}

#[cfg(test)]
mod tests {
    use crate::resource::{
        mock::{MockConnection, Response},
        models::Tag,
    };
    use sift::{Error, QueryOptions, Repository, Result, transaction};

    #[tokio::test]
    async fn commit() {
        let mut connection = MockConnection::new();
        connection.respond(Response::Affected(1, Some(12)));
        let mut tag = Tag {
            name: "rust".into(),
            ..Default::default()
        };
        let id = transaction(&mut connection, async |tx| {
            tag.create(tx, QueryOptions::new()).await?;
            Ok(tag.id)
        })
        .await
        .unwrap();
        assert_eq!(id, 12);
        assert_eq!(
            connection.log,
            [
                "BEGIN;",
                "INSERT INTO \"tag\" (\"name\", \"weight\") VALUES ('rust', 0);",
                "COMMIT;",
            ]
        );
    }

    #[tokio::test]
    async fn rollback_on_error() {
        let mut connection = MockConnection::new();
        let result: Result<()> = transaction(&mut connection, async |tx| {
            Tag {
                name: "go".into(),
                ..Default::default()
            }
            .create(tx, QueryOptions::new())
            .await?;
            Err(Error::msg("stop here"))
        })
        .await;
        assert_eq!(result.unwrap_err().to_string(), "stop here");
        assert_eq!(connection.log.first().map(String::as_str), Some("BEGIN;"));
        assert_eq!(connection.last(), "ROLLBACK;");
        assert_eq!(connection.log.len(), 3);
    }

    #[tokio::test]
    async fn rollback_on_driver_failure() {
        let mut connection = MockConnection::new();
        connection.respond(Response::Failure("deadlock found".into()));
        let result = transaction(&mut connection, async |tx| {
            Tag::find_all(tx, QueryOptions::new()).await
        })
        .await;
        assert!(format!("{:#}", result.unwrap_err()).contains("deadlock found"));
        assert_eq!(connection.last(), "ROLLBACK;");
    }

    #[tokio::test]
    async fn rollback_on_panic() {
        let mut connection = MockConnection::new();
        let result: Result<()> = transaction(&mut connection, async |_tx| {
            let values: Vec<i32> = Vec::new();
            if values.is_empty() {
                panic!("nothing to write");
            }
            Ok(())
        })
        .await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "Transaction aborted by a panic: nothing to write"
        );
        assert_eq!(connection.log, ["BEGIN;", "ROLLBACK;"]);
    }
}
