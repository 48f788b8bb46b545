use crate::common::{MAX_UPLOAD_SIZE, TestApp, Upload, png, routes};

mod image_upload {
    use super::*;

    #[tokio::test]
    async fn upload_returns_created_record() {
        let mut app = TestApp::spawn().await;
        let data = b"\x89PNG fake image payload".to_vec();
        let res = app
            .upload(Upload {
                filename: "Sunset.PNG",
                content_type: Some("image/png"),
                data: data.clone(),
                uploader: Some("U"),
                tags: Some("a, b , ,c"),
                description: Some("d"),
            })
            .await;

        assert_eq!(res.status, 201, "{}", res.body);
        let id = res.id();
        assert_eq!(res.body["filename"], "Sunset.PNG");
        assert_eq!(res.body["file_size"].as_u64().unwrap(), data.len() as u64);
        assert_eq!(res.body["file_type"], "image/png");
        assert_eq!(res.body["uploader"], "U");
        assert_eq!(res.body["tags"], serde_json::json!(["a", "b", "c"]));
        assert_eq!(res.body["description"], "d");
        assert_eq!(res.body["url"], format!("/api/images/{id}/file"));
        assert_eq!(res.body["processed"], false);
        assert!(res.body["upload_date"].as_str().is_some());
        assert!(res.body.get("blob_key").is_none());
        assert!(res.body.get("width").is_none());

        let request = app.notified.recv().await.unwrap();
        assert_eq!(request.image_id.to_string(), id);
        assert_eq!(request.blob_key.as_str(), format!("{id}.png"));
    }

    #[tokio::test]
    async fn optional_fields_default_to_empty() {
        let app = TestApp::spawn().await;
        let res = app.upload(Upload::image("U")).await;

        assert_eq!(res.status, 201);
        assert_eq!(res.body["tags"], serde_json::json!([]));
        assert!(res.body["description"].is_null());
    }

    #[tokio::test]
    async fn non_image_content_type_is_rejected() {
        let app = TestApp::spawn().await;
        let res = app
            .upload(Upload {
                content_type: Some("text/plain"),
                ..Upload::image("U")
            })
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(res.body["message"], "Only image files are allowed");
        assert_eq!(app.blob_count(), 0);
    }

    #[tokio::test]
    async fn missing_uploader_is_rejected_before_storage() {
        let app = TestApp::spawn().await;
        let res = app
            .upload(Upload {
                uploader: None,
                ..Upload::image("U")
            })
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["message"], "Uploader name is required");
        assert_eq!(app.blob_count(), 0);

        let list = app.get(routes::IMAGES).await;
        assert_eq!(list.body, serde_json::json!([]));
    }

    #[tokio::test]
    async fn missing_file_is_rejected() {
        let app = TestApp::spawn().await;
        let form = reqwest::multipart::Form::new().text("uploader", "U");
        let res = app.post_form(routes::UPLOAD, form).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["message"], "No file provided");
    }

    #[tokio::test]
    async fn oversized_file_is_rejected() {
        let app = TestApp::spawn().await;
        let res = app
            .upload(Upload {
                data: vec![0u8; MAX_UPLOAD_SIZE as usize + 1],
                ..Upload::image("U")
            })
            .await;

        assert!(res.status == 400 || res.status == 413, "status {}", res.status);
        assert_eq!(app.blob_count(), 0);
    }

    #[tokio::test]
    async fn non_multipart_body_is_a_validation_error() {
        let app = TestApp::spawn().await;
        let res = app.post_raw(routes::UPLOAD, "text/plain", "hello").await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert!(res.body["message"].as_str().is_some());
        assert_eq!(app.blob_count(), 0);
    }

    #[tokio::test]
    async fn unknown_fields_are_ignored() {
        let app = TestApp::spawn().await;
        let part = reqwest::multipart::Part::bytes(b"img".to_vec())
            .file_name("a.gif")
            .mime_str("image/gif")
            .unwrap();
        let form = reqwest::multipart::Form::new()
            .text("album", "holidays")
            .part("file", part)
            .text("uploader", "U");
        let res = app.post_form(routes::UPLOAD, form).await;

        assert_eq!(res.status, 201, "{}", res.body);
        assert_eq!(res.body["file_type"], "image/gif");
    }
}

mod image_list {
    use super::*;

    #[tokio::test]
    async fn empty_store_lists_nothing() {
        let app = TestApp::spawn().await;
        let res = app.get(routes::IMAGES).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body, serde_json::json!([]));
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let app = TestApp::spawn().await;
        let first = app.create_image(Upload::image("U")).await;
        let second = app.create_image(Upload::image("U")).await;
        let third = app.create_image(Upload::image("U")).await;

        let res = app.get(routes::IMAGES).await;
        let ids: Vec<_> = res
            .body
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids, vec![third, second, first]);
        assert!(res.body[0]["url"].as_str().unwrap().ends_with("/file"));
    }

    #[tokio::test]
    async fn filter_by_uploader() {
        let app = TestApp::spawn().await;
        let x = app.create_image(Upload::image("X")).await;
        app.create_image(Upload::image("Y")).await;
        app.create_image(Upload::image("x")).await;

        let res = app.get_with_query(routes::IMAGES, &[("uploader", "X")]).await;
        let records = res.body.as_array().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["id"], x.as_str());
    }

    #[tokio::test]
    async fn padded_uploader_matches_verbatim() {
        let app = TestApp::spawn().await;
        let padded = app.create_image(Upload::image(" X ")).await;
        let plain = app.create_image(Upload::image("X")).await;

        let res = app.get_with_query(routes::IMAGES, &[("uploader", " X ")]).await;
        let records = res.body.as_array().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["id"], padded.as_str());
        assert_eq!(records[0]["uploader"], " X ");

        let res = app.get_with_query(routes::IMAGES, &[("uploader", "X")]).await;
        let records = res.body.as_array().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["id"], plain.as_str());
    }

    #[tokio::test]
    async fn filter_by_any_tag() {
        let app = TestApp::spawn().await;
        let id = app
            .create_image(Upload::image("U").tags("nature,forest"))
            .await;
        app.create_image(Upload::image("U").tags("city")).await;

        for (tags, expected) in [
            ("nature", true),
            ("nature,urban", true),
            ("urban", false),
        ] {
            let res = app.get_with_query(routes::IMAGES, &[("tags", tags)]).await;
            let found = res
                .body
                .as_array()
                .unwrap()
                .iter()
                .any(|r| r["id"] == id.as_str());
            assert_eq!(found, expected, "tags={tags}");
        }
    }

    #[tokio::test]
    async fn filters_compose_with_and() {
        let app = TestApp::spawn().await;
        let wanted = app.create_image(Upload::image("X").tags("nature")).await;
        app.create_image(Upload::image("X").tags("urban")).await;
        app.create_image(Upload::image("Y").tags("nature")).await;

        let res = app
            .get_with_query(routes::IMAGES, &[("uploader", "X"), ("tags", "nature")])
            .await;
        let records = res.body.as_array().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["id"], wanted.as_str());
    }

    #[tokio::test]
    async fn filter_by_date_range() {
        let app = TestApp::spawn().await;
        app.create_image(Upload::image("U")).await;

        let res = app
            .get_with_query(routes::IMAGES, &[("date_from", "2000-01-01"), ("date_to", "")])
            .await;
        assert_eq!(res.body.as_array().unwrap().len(), 1);

        let res = app
            .get_with_query(routes::IMAGES, &[("date_to", "2000-01-01T00:00:00Z")])
            .await;
        assert_eq!(res.body, serde_json::json!([]));
    }

    #[tokio::test]
    async fn malformed_query_is_a_validation_error() {
        let app = TestApp::spawn().await;
        let res = app
            .get_with_query(routes::IMAGES, &[("date_from", "a"), ("date_from", "b")])
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert!(res.body["message"].as_str().is_some());
    }

    #[tokio::test]
    async fn malformed_date_is_rejected() {
        let app = TestApp::spawn().await;
        let res = app
            .get_with_query(routes::IMAGES, &[("date_from", "last tuesday")])
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert!(res.body["message"].as_str().unwrap().contains("date_from"));
    }
}

mod image_get {
    use super::*;

    #[tokio::test]
    async fn get_returns_record() {
        let app = TestApp::spawn().await;
        let id = app.create_image(Upload::image("U").tags("a")).await;

        let res = app.get(&routes::image(&id)).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["id"], id.as_str());
        assert_eq!(res.body["tags"], serde_json::json!(["a"]));
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let app = TestApp::spawn().await;
        let res = app
            .get(&routes::image("0190a5c2-7c1e-7d2a-9a8e-3f2b1c4d5e6f"))
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn non_uuid_id_is_not_found() {
        let app = TestApp::spawn().await;
        let res = app.get(&routes::image("not-an-id")).await;
        assert_eq!(res.status, 404);
    }
}

mod image_download {
    use super::*;

    #[tokio::test]
    async fn download_round_trips_bytes() {
        let app = TestApp::spawn().await;
        let data: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
        let id = app
            .create_image(Upload {
                filename: "Été.jpg",
                content_type: Some("image/jpeg"),
                data: data.clone(),
                ..Upload::image("U")
            })
            .await;

        let res = app.get(&routes::image_file(&id)).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.bytes, data);
        assert_eq!(res.header("content-type"), Some("image/jpeg"));
        assert_eq!(res.header("content-length"), Some("10000"));
        let disposition = res.header("content-disposition").unwrap();
        assert!(disposition.starts_with("inline;"));
        assert!(disposition.contains("filename*=UTF-8''%C3%89t%C3%A9.jpg"));
    }

    #[tokio::test]
    async fn matching_etag_is_not_modified() {
        let app = TestApp::spawn().await;
        let id = app.create_image(Upload::image("U")).await;

        let res = app.get(&routes::image_file(&id)).await;
        let etag = res.header("etag").unwrap().to_string();

        let res = app
            .get_with_header(&routes::image_file(&id), "If-None-Match", &etag)
            .await;
        assert_eq!(res.status, 304);
        assert!(res.bytes.is_empty());
    }

    #[tokio::test]
    async fn missing_content_fails_even_for_wildcard_etag() {
        let app = TestApp::spawn().await;
        let id = app.create_image(Upload::image("U")).await;
        app.remove_blob(&format!("{id}.png"));

        let res = app
            .get_with_header(&routes::image_file(&id), "If-None-Match", "*")
            .await;
        assert_eq!(res.status, 500);
        assert_eq!(res.body["code"], "DOWNLOAD_FAILED");
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let app = TestApp::spawn().await;
        let res = app
            .get(&routes::image_file("0190a5c2-7c1e-7d2a-9a8e-3f2b1c4d5e6f"))
            .await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn unprocessed_image_has_no_thumbnail() {
        let app = TestApp::spawn().await;
        let id = app.create_image(Upload::image("U")).await;

        let res = app.get(&routes::image_thumbnail(&id)).await;
        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}

mod image_processing {
    use super::*;

    #[tokio::test]
    async fn processor_adds_dimensions_and_thumbnail() {
        let app = TestApp::spawn_with_processor().await;
        let id = app
            .create_image(Upload {
                filename: "wide.png",
                data: png(600, 400),
                ..Upload::image("U")
            })
            .await;

        let record = app.wait_until_processed(&id).await;
        assert_eq!(record["width"], 600);
        assert_eq!(record["height"], 400);
        assert_eq!(record["thumbnail_key"], format!("thumbnails/{id}.png"));
        assert_eq!(record["thumbnail_url"], format!("/api/images/{id}/thumbnail"));

        let res = app.get(&routes::image_thumbnail(&id)).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.header("content-type"), Some("image/png"));
        let thumb = image::load_from_memory(&res.bytes).unwrap();
        assert_eq!((thumb.width(), thumb.height()), (300, 200));
    }

    #[tokio::test]
    async fn undecodable_image_still_uploads() {
        let app = TestApp::spawn_with_processor().await;
        let res = app.upload(Upload::image("U")).await;
        assert_eq!(res.status, 201);

        let res = app.get(&routes::image(&res.id())).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["processed"], false);
    }
}

mod image_delete {
    use super::*;

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let app = TestApp::spawn().await;
        let id = app.create_image(Upload::image("U")).await;
        assert_eq!(app.blob_count(), 1);

        let res = app.delete(&routes::image(&id)).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["id"], id.as_str());
        assert!(
            res.body["message"]
                .as_str()
                .unwrap()
                .to_lowercase()
                .contains("deleted successfully")
        );
        assert_eq!(app.blob_count(), 0);

        assert_eq!(app.get(&routes::image(&id)).await.status, 404);
        assert_eq!(app.get(&routes::image_file(&id)).await.status, 404);
    }

    #[tokio::test]
    async fn second_delete_is_not_found() {
        let app = TestApp::spawn().await;
        let id = app.create_image(Upload::image("U")).await;

        assert_eq!(app.delete(&routes::image(&id)).await.status, 200);
        let res = app.delete(&routes::image(&id)).await;
        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn delete_removes_thumbnail() {
        let app = TestApp::spawn_with_processor().await;
        let id = app
            .create_image(Upload {
                data: png(40, 40),
                ..Upload::image("U")
            })
            .await;
        app.wait_until_processed(&id).await;

        assert_eq!(app.delete(&routes::image(&id)).await.status, 200);
        assert_eq!(app.get(&routes::image_thumbnail(&id)).await.status, 404);
    }
}
