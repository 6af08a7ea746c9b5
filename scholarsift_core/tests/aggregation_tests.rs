use async_trait::async_trait;
use scholarsift_core::aggregate::ProgressEvent;
use scholarsift_core::pipeline::ProfileAffinity;
use scholarsift_core::{
    AggregationEngine, CancellationToken, Collector, CollectorHandle, DegreeLevel, EngineError,
    EngineSettings, FetchError, Profile, RawRecord,
};
use std::sync::Mutex;
use std::time::Duration;

enum Behaviour {
    Succeed(Vec<RawRecord>),
    Fail,
    Hang,
}

struct Scripted {
    name: &'static str,
    delay_ms: u64,
    behaviour: Behaviour,
}

#[async_trait]
impl Collector for Scripted {
    fn name(&self) -> &str {
        self.name
    }

    async fn collect(&self, _profile: &Profile) -> Result<Vec<RawRecord>, FetchError> {
        tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        match &self.behaviour {
            Behaviour::Succeed(records) => Ok(records.clone()),
            Behaviour::Fail => Err(FetchError::Status(reqwest::StatusCode::SERVICE_UNAVAILABLE)),
            Behaviour::Hang => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(vec![RawRecord::new("Too late", "Germany")])
            }
        }
    }
}

fn scripted(name: &'static str, delay_ms: u64, behaviour: Behaviour) -> CollectorHandle {
    CollectorHandle::from_collector(Scripted {
        name,
        delay_ms,
        behaviour,
    })
}

fn settings() -> EngineSettings {
    EngineSettings {
        collector_timeout_ms: 200,
        run_timeout_ms: None,
        ..EngineSettings::default()
    }
}

fn five_collectors() -> Vec<CollectorHandle> {
    vec![
        scripted(
            "daad",
            30,
            Behaviour::Succeed(vec![
                RawRecord::new("DAAD Scholarship Program 2024", "germany").with_degree("Master"),
                RawRecord::new("Daad   scholarship", "Germany"),
            ]),
        ),
        scripted("broken", 0, Behaviour::Fail),
        scripted(
            "fulbright",
            10,
            Behaviour::Succeed(vec![
                RawRecord::new("Fulbright Foreign Student Program", "usa").with_degree("Graduate"),
                RawRecord {
                    title: Some("No country listing".into()),
                    ..RawRecord::default()
                },
            ]),
        ),
        scripted("stuck", 0, Behaviour::Hang),
        scripted(
            "chevening",
            0,
            Behaviour::Succeed(vec![RawRecord::new("Chevening Scholarships", "UK")
                .with_degree("one-year master's")
                .with_url("www.chevening.org")]),
        ),
    ]
}

#[tokio::test]
async fn test_failures_are_isolated() {
    let engine = AggregationEngine::new(five_collectors(), settings());
    let report = engine
        .run_detailed(&Profile::new(), None, CancellationToken::new())
        .await
        .unwrap();

    let titles: Vec<&str> = report.records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "DAAD Scholarship Program 2024",
            "Fulbright Foreign Student Program",
            "Chevening Scholarships",
        ]
    );

    assert!(report.partial);
    let failed: Vec<&str> = report.errors.iter().map(|e| e.source.as_str()).collect();
    assert_eq!(failed, vec!["broken", "stuck"]);
    assert_eq!(report.errors[0].code, "bad_status");
    assert!(report.errors[1].is_timeout);

    let completed: Vec<(&str, usize)> = report
        .completed
        .iter()
        .map(|s| (s.source.as_str(), s.count))
        .collect();
    assert_eq!(completed, vec![("daad", 2), ("fulbright", 1), ("chevening", 1)]);
    assert_eq!(report.raw_count, 4);
    assert_eq!(report.unique_count, 3);

    let chevening = &report.records[2];
    assert_eq!(chevening.country, "United Kingdom");
    assert_eq!(chevening.degree_level, DegreeLevel::Master);
    assert_eq!(chevening.url, "https://www.chevening.org");
    assert_eq!(chevening.source, "chevening");
}

#[tokio::test]
async fn test_progress_is_monotonic_and_ends_at_one() {
    let engine = AggregationEngine::new(five_collectors(), settings());
    let events: Mutex<Vec<ProgressEvent>> = Mutex::new(Vec::new());
    let on_progress = |event: &ProgressEvent| events.lock().unwrap().push(event.clone());

    engine.run(&Profile::new(), Some(&on_progress)).await.unwrap();

    let events = events.into_inner().unwrap();
    assert_eq!(events.len(), 5 + 4);
    assert!(events.windows(2).all(|w| w[0].fraction <= w[1].fraction));
    assert_eq!(events.first().unwrap().fraction, 0.1);
    assert_eq!(events.last().unwrap().fraction, 1.0);
    assert_eq!(events.last().unwrap().message, "Complete!");
    assert!(events.iter().any(|e| e.message == "broken failed"));
    assert!(events.iter().any(|e| e.message == "stuck timed out"));
    assert!(events.iter().any(|e| e.message == "Found 4 scholarships"));
}

#[tokio::test]
async fn test_all_disabled_is_empty_not_error() {
    let handles = five_collectors()
        .into_iter()
        .map(|h| h.with_enabled(false))
        .collect();
    let engine = AggregationEngine::new(handles, settings());

    let events: Mutex<Vec<ProgressEvent>> = Mutex::new(Vec::new());
    let on_progress = |event: &ProgressEvent| events.lock().unwrap().push(event.clone());
    let records = engine.run(&Profile::new(), Some(&on_progress)).await.unwrap();

    assert!(records.is_empty());
    let fractions: Vec<f64> = events.into_inner().unwrap().iter().map(|e| e.fraction).collect();
    assert_eq!(fractions, vec![0.1, 0.6, 0.8, 1.0]);
}

#[tokio::test]
async fn test_zero_successes_is_empty_not_error() {
    let engine = AggregationEngine::new(
        vec![scripted("a", 0, Behaviour::Fail), scripted("b", 0, Behaviour::Fail)],
        settings(),
    );
    let records = engine.run(&Profile::new(), None).await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_cancelled_before_run_aborts() {
    let engine = AggregationEngine::new(five_collectors(), settings());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = engine.run_with_cancel(&Profile::new(), None, cancel).await;
    assert!(matches!(result, Err(EngineError::Aborted)));
}

#[tokio::test]
async fn test_cancel_during_run_aborts() {
    let engine = AggregationEngine::new(
        vec![scripted("stuck", 0, Behaviour::Hang)],
        EngineSettings {
            collector_timeout_ms: 30_000,
            ..settings()
        },
    );
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let result = engine.run_with_cancel(&Profile::new(), None, cancel).await;
    assert!(matches!(result, Err(EngineError::Aborted)));
}

#[tokio::test]
async fn test_profile_filters_and_affinity_ranking() {
    let engine = AggregationEngine::new(
        vec![scripted(
            "mixed",
            0,
            Behaviour::Succeed(vec![
                RawRecord::new("Eiffel Excellence Programme", "France").with_degree("Master"),
                RawRecord::new("DLR-DAAD Research Fellowships", "Federal Republic of Germany")
                    .with_degree("Postdoc"),
                RawRecord::new("Helmholtz Graduate School", "Germany")
                    .with_degree("PhD")
                    .with_funding("Fully funded"),
                RawRecord::new("Deutschlandstipendium", "Deutschland").with_degree("All levels"),
            ]),
        )],
        settings(),
    )
    .with_ranker(ProfileAffinity::ranker());

    let profile = Profile::new().with_country("Germany").with_degree_level("PhD");
    let records = engine.run(&profile, None).await.unwrap();
    let titles: Vec<&str> = records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Helmholtz Graduate School", "Deutschlandstipendium"]);
}
