use std::path::Path;

use student_insights::analyzers::{BinSpec, OutcomePolicy};
use student_insights::error::DashboardError;
use student_insights::infra::backend::BackendClient;
use student_insights::infra::gemini::GeminiClient;
use student_insights::ingest::{ingest_path, load_source};
use student_insights::markdown::{self, Block};
use student_insights::record::Schema;
use student_insights::services::dashboard_api::{DashboardApi, DateRange, PredictionInput};
use student_insights::services::summary::summarize_or_message;
use student_insights::session::Session;
use student_insights::view::{DashboardView, Page, Series};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

const ENGAGEMENT: &str = "tests/fixtures/engagement.csv";
const DEMOGRAPHIC: &str = "tests/fixtures/demographic.csv";

/// Serves one canned `(status, body)` per connection and returns each raw request.
async fn stub_server(responses: Vec<(u16, String)>) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let mut requests = Vec::new();
        for (status, body) in responses {
            let (mut socket, _) = listener.accept().await.unwrap();
            requests.push(read_request(&mut socket).await);

            let response = format!(
                "HTTP/1.1 {status} Stub\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        }
        requests
    });

    (format!("http://{addr}"), handle)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before headers");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
    let content_length = head
        .lines()
        .find_map(|l| l.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    String::from_utf8_lossy(&buf).into_owned()
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn test_engagement_pipeline() {
    let policy = OutcomePolicy::default();
    let records = ingest_path(Path::new(ENGAGEMENT), Schema::Engagement, &policy)
        .expect("Failed to ingest fixture");

    // row 5 has a non-numeric quiz score
    assert_eq!(records.len(), 5);

    let view = DashboardView::build(Page::Overview, &records, &policy, &BinSpec::grade_bands(100.0));
    assert_eq!(view.stats.total_students, 5);
    assert_eq!(view.stats.completion_rate, 40.0);
    assert_eq!(view.stats.dropout_rate, 20.0);
    assert_eq!(view.stats.active_students, 2);
    assert!(close(view.stats.average_score, 59.4));

    let Series::Counts(bins) = &view.charts[1].series else {
        panic!("score distribution should be counts");
    };
    let counts: Vec<_> = bins.iter().map(|b| (b.label.as_str(), b.count)).collect();
    assert_eq!(
        counts,
        vec![
            ("0-59 (Fail)", 3),
            ("60-69 (Pass)", 0),
            ("70-79 (Good)", 1),
            ("80-89 (Very Good)", 0),
            ("90-100 (Excellent)", 1),
        ]
    );
}

#[test]
fn test_demographic_pipeline() {
    let policy = OutcomePolicy::default();
    let records = ingest_path(Path::new(DEMOGRAPHIC), Schema::Demographic, &policy).unwrap();
    assert_eq!(records.len(), 4);
    assert_eq!(records[3].id(), "4");

    let view = DashboardView::build(Page::Dropouts, &records, &policy, &BinSpec::grade_bands(100.0));
    assert_eq!(view.stats.completion_rate, 50.0);
    assert_eq!(view.stats.dropout_rate, 25.0);

    let Series::Averages(by_education) = &view.charts[0].series else {
        panic!("dropout by education should be averages");
    };
    let rates: Vec<_> = by_education
        .iter()
        .map(|g| (g.label.as_str(), g.average_value))
        .collect();
    assert_eq!(
        rates,
        vec![
            ("bachelor's degree", 0.0),
            ("some college", 50.0),
            ("associate's degree", 0.0),
        ]
    );

    let scores = DashboardView::build(Page::Scores, &records, &policy, &BinSpec::grade_bands(100.0));
    let Series::Averages(prep) = &scores.charts[1].series else {
        panic!("test prep chart should be averages");
    };
    assert_eq!(prep[0].label, "No Prep");
    assert_eq!(prep[1].label, "Completed Prep");
    assert!(close(prep[1].average_value, (69.0 + 90.0 + 88.0) / 3.0));
}

#[test]
fn test_wrong_schema_reports_missing_columns() {
    let err = ingest_path(Path::new(DEMOGRAPHIC), Schema::Engagement, &OutcomePolicy::default())
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "CSV file is missing required columns: StudentID, CourseCategory, TimeSpentOnCourse, QuizScores, CompletionRate."
    );
}

#[test]
fn test_session_search_over_fixture() {
    let records =
        ingest_path(Path::new(DEMOGRAPHIC), Schema::Demographic, &OutcomePolicy::default()).unwrap();
    let mut session = Session::new();
    let ticket = session.begin();
    assert!(session.apply_records(ticket, records));

    let hits: Vec<_> = session.search("SOME COLLEGE").iter().map(|r| r.id()).collect();
    assert_eq!(hits, vec!["2", "4"]);
}

#[tokio::test]
async fn test_load_source_over_http() {
    let csv = std::fs::read_to_string(ENGAGEMENT).unwrap();
    let (base, server) = stub_server(vec![(200, csv)]).await;

    let records = load_source(
        &format!("{base}/exports/students.csv"),
        Schema::Engagement,
        &OutcomePolicy::default(),
    )
    .await
    .unwrap();
    assert_eq!(records.len(), 5);

    let requests = server.await.unwrap();
    assert!(requests[0].starts_with("GET /exports/students.csv HTTP/1.1"));
}

#[tokio::test]
async fn test_backend_dashboard_data_with_date_range() {
    let body = r#"{
        "stats": {"totalStudents": 2, "completionRate": 50.0, "averageScore": 61.5},
        "studentData": [
            {"gender": "female", "race_ethnicity": "group B", "parental_level_of_education": "some college",
             "lunch": "standard", "test_preparation_course": "none",
             "math_score": 80, "reading_score": 85, "writing_score": 90},
            {"gender": "male", "race_ethnicity": "group A", "parental_level_of_education": "high school",
             "lunch": "free/reduced", "test_preparation_course": "completed",
             "math_score": 30, "reading_score": 40, "writing_score": 44}
        ]
    }"#;
    let (base, server) = stub_server(vec![(200, body.to_string())]).await;

    let client = BackendClient::new(&format!("{base}/api/"));
    let range = DateRange {
        start: Some("2024-01-01".parse().unwrap()),
        end: Some("2024-02-01".parse().unwrap()),
    };
    let data = client.dashboard_data(range).await.unwrap();
    assert_eq!(data.stats.total_students, 2);
    assert_eq!(data.stats.dropout_rate, 0.0);

    let records = data.into_records(&OutcomePolicy::default());
    assert_eq!(records[1].id(), "2");
    assert_eq!(records[1].text_fields()[2], "high school");

    let requests = server.await.unwrap();
    assert!(requests[0].starts_with(
        "GET /api/dashboard-data?start_date=2024-01-01&end_date=2024-02-01 HTTP/1.1"
    ));
}

#[tokio::test]
async fn test_backend_error_message_is_surfaced() {
    let (base, server) =
        stub_server(vec![(500, r#"{"error":"Database unavailable"}"#.to_string())]).await;

    let client = BackendClient::new(&format!("{base}/api"));
    let err = client.scores_data().await.unwrap_err();
    assert_eq!(err, DashboardError::Network("Database unavailable".into()));
    server.await.unwrap();
}

#[tokio::test]
async fn test_backend_predict() {
    let (base, server) = stub_server(vec![
        (200, r#"{"completion_likelihood": 0.82}"#.to_string()),
        (200, r#"{"completion_likelihood": 1.7}"#.to_string()),
    ])
    .await;

    let client = BackendClient::new(&format!("{base}/api"));
    let input = PredictionInput {
        hours_watched: 12.0,
        average_score: 78.0,
        activity_level: 3.0,
    };
    assert!(close(client.predict(input).await.unwrap(), 0.82));
    assert!(matches!(
        client.predict(input).await,
        Err(DashboardError::Network(_))
    ));

    let requests = server.await.unwrap();
    assert!(requests[0].starts_with("POST /api/predict HTTP/1.1"));
    assert!(requests[0].ends_with(r#"{"hours_watched":12.0,"average_score":78.0,"activity_level":3.0}"#));
}

#[tokio::test]
async fn test_backend_ai_summary_renders_as_markdown() {
    let (base, server) = stub_server(vec![(
        200,
        r####"{"summary": "### Overview\n* **Strong** completion"}"####.to_string(),
    )])
    .await;

    let records =
        ingest_path(Path::new(DEMOGRAPHIC), Schema::Demographic, &OutcomePolicy::default()).unwrap();
    let client = BackendClient::new(&format!("{base}/api"));
    let text = summarize_or_message(&client, &records).await;

    let doc = markdown::parse(&text);
    assert!(matches!(doc.blocks[0], Block::Heading { level: 3, .. }));
    assert_eq!(doc.to_string(), "Overview\n--------\n\n  • Strong completion\n");

    let requests = server.await.unwrap();
    assert!(requests[0].starts_with("POST /api/ai-summary HTTP/1.1"));
    assert!(requests[0].contains(r#""studentData":[{"row":1,"#));
}

#[tokio::test]
async fn test_gemini_failure_becomes_message() {
    let (base, server) = stub_server(vec![(
        400,
        r#"{"error":{"code":400,"message":"API key not valid"}}"#.to_string(),
    )])
    .await;

    let records =
        ingest_path(Path::new(ENGAGEMENT), Schema::Engagement, &OutcomePolicy::default()).unwrap();
    let client = GeminiClient::new(&base, "test-model", "secret-key", OutcomePolicy::default()).unwrap();
    let text = summarize_or_message(&client, &records).await;
    assert_eq!(
        text,
        "### AI Insights Error\nFailed to get insights: AI summary unavailable: API key not valid"
    );

    let requests = server.await.unwrap();
    assert!(requests[0].starts_with("POST /v1beta/models/test-model:generateContent HTTP/1.1"));
    assert!(requests[0].to_lowercase().contains("x-goog-api-key: secret-key"));
}
