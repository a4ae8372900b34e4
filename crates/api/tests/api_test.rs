#[cfg(test)]
mod api_tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        Router,
    };
    use chrono::{TimeZone, Utc};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use scheduler_api::{create_app, MetricsEndpoint};
    use scheduler_core::{traits::JobStore, ApiConfig, JobRegistry, ManualClock, SchedulerConfig};
    use scheduler_dispatcher::{SchedulerEngine, TaskController};
    use scheduler_infrastructure::{InMemoryJobStore, MetricsCollector};
    use scheduler_worker::{LoggingJobHandler, LOG_JOB};

    fn controller() -> Arc<TaskController> {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 30).unwrap());
        let store: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());
        let registry = JobRegistry::builder()
            .register(LOG_JOB, Arc::new(LoggingJobHandler))
            .build();
        let engine = Arc::new(SchedulerEngine::new(
            store.clone(),
            Arc::new(registry),
            Arc::new(clock.clone()),
            Arc::new(MetricsCollector::new()),
            &SchedulerConfig::default(),
        ));
        Arc::new(TaskController::new(engine, store, Arc::new(clock)))
    }

    fn app() -> Router {
        create_app(controller(), &ApiConfig::default(), None)
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    fn create_body(name: &str) -> Value {
        json!({
            "jobName": name,
            "jobGroup": "reports",
            "jobDescription": "hourly report",
            "cronExpression": "0 0 * * * ?",
            "handlerType": "LogJob"
        })
    }

    async fn create(app: &Router, name: &str) -> i64 {
        let (status, body) = send(
            app,
            Method::POST,
            "/api/v1/scheduling/create",
            Some(create_body(name)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["data"]["id"].as_i64().unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let (status, body) = send(&app(), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let app = app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/scheduling/create",
            Some(create_body("report")),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["statusCode"], 200);
        assert_eq!(body["message"], "添加任务成功");
        assert_eq!(body["data"]["jobName"], "report");
        assert_eq!(body["data"]["jobStatus"], "SCHEDULED");
        assert_eq!(body["data"]["cronExpression"], "0 0 * * * ?");
        assert!(body.get("errors").is_none());

        let (status, body) = send(&app, Method::GET, "/api/v1/scheduling/list", None).await;
        assert_eq!(status, StatusCode::OK);
        let tasks = body["data"].as_array().unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0]["jobGroup"], "reports");
        assert_eq!(tasks[0]["jobDescription"], "hourly report");
    }

    #[tokio::test]
    async fn test_duplicate_create_is_conflict() {
        let app = app();
        create(&app, "report").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/scheduling/create",
            Some(create_body("report")),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["success"], false);
        assert_eq!(body["statusCode"], 409);
        assert_eq!(
            body["message"],
            "添加任务失败: 任务已存在, jobName:report, jobGroup:reports"
        );
        assert_eq!(body["errors"][0], "任务已存在, jobName:report, jobGroup:reports");
        assert!(body["data"].is_null());
    }

    #[tokio::test]
    async fn test_create_validation_errors() {
        let app = app();

        let mut missing_name = create_body("report");
        missing_name["jobName"] = Value::Null;
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/scheduling/create",
            Some(missing_name),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["statusCode"], 400);

        let mut bad_cron = create_body("report");
        bad_cron["cronExpression"] = json!("every minute");
        let (status, _) = send(&app, Method::POST, "/api/v1/scheduling/create", Some(bad_cron)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/scheduling/create")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);

        let (_, body) = send(&app, Method::GET, "/api/v1/scheduling/list", None).await;
        assert!(body["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pause_resume_round_trip() {
        let app = app();
        let id = create(&app, "report").await;

        let (status, body) = send(
            &app,
            Method::PATCH,
            &format!("/api/v1/scheduling/pause/{id}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["jobStatus"], "PAUSED");

        let (status, body) = send(
            &app,
            Method::PATCH,
            &format!("/api/v1/scheduling/pause/{id}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);

        let (status, body) = send(
            &app,
            Method::PATCH,
            &format!("/api/v1/scheduling/resume/{id}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["jobStatus"], "SCHEDULED");
        assert_eq!(body["data"]["cronExpression"], "0 0 * * * ?");
    }

    #[tokio::test]
    async fn test_edit_task() {
        let app = app();
        let id = create(&app, "report").await;

        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/v1/scheduling/edit",
            Some(json!({
                "id": id,
                "jobName": "report",
                "jobGroup": "reports",
                "jobDescription": "every ten seconds",
                "cronExpression": "*/10 * * * * *"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "修改任务成功");
        assert_eq!(body["data"]["cronExpression"], "*/10 * * * * *");
        assert_eq!(body["data"]["jobDescription"], "every ten seconds");

        let (status, body) = send(
            &app,
            Method::GET,
            &format!("/api/v1/scheduling/task/{id}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["cronExpression"], "*/10 * * * * *");
    }

    #[tokio::test]
    async fn test_edit_without_id_is_bad_request() {
        let app = app();
        create(&app, "report").await;

        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/v1/scheduling/edit",
            Some(json!({
                "jobName": "report",
                "jobGroup": "reports",
                "cronExpression": "*/10 * * * * *"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["statusCode"], 400);
        assert!(body["message"].as_str().unwrap().starts_with("修改任务失败"));

        let (_, body) = send(&app, Method::GET, "/api/v1/scheduling/list", None).await;
        assert_eq!(body["data"][0]["cronExpression"], "0 0 * * * ?");
    }

    #[tokio::test]
    async fn test_delete_task() {
        let app = app();

        let (status, body) = send(&app, Method::DELETE, "/api/v1/scheduling/delete/42", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "删除任务失败: 任务未找到: 42");

        let (status, body) = send(&app, Method::DELETE, "/api/v1/scheduling/delete/abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let id = create(&app, "report").await;
        let (status, body) = send(
            &app,
            Method::DELETE,
            &format!("/api/v1/scheduling/delete/{id}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["id"], id);

        let (_, body) = send(&app, Method::GET, "/api/v1/scheduling/list", None).await;
        assert!(body["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_history_starts_empty() {
        let app = app();
        let id = create(&app, "report").await;

        let (status, body) = send(
            &app,
            Method::GET,
            &format!("/api/v1/scheduling/history/{id}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        metrics::with_local_recorder(&recorder, || {
            metrics::counter!("scheduler_job_fires_total", "job" => "reports.report").increment(1);
        });

        let app = create_app(
            controller(),
            &ApiConfig::default(),
            Some(MetricsEndpoint {
                path: "/metrics".to_string(),
                handle,
            }),
        );

        let request = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("scheduler_job_fires_total"));
    }

    #[tokio::test]
    async fn test_metrics_endpoint_absent_when_disabled() {
        let request = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
