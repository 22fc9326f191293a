use appcharts_core::{
    utc_today, ChartEntry, ChartRepository, ChartRequest, ChartService, ChartSource, ChartType,
    FetchError, FetchResult, ServiceError, SqliteChartRepository,
};
use chrono::Days;
use std::cell::RefCell;
use tempfile::TempDir;

/// In-process feed that records every request it serves.
struct FakeSource {
    apps: Vec<&'static str>,
    fail_with_status: Option<u16>,
    requests: RefCell<Vec<ChartRequest>>,
}

impl FakeSource {
    fn with_apps(apps: Vec<&'static str>) -> Self {
        Self {
            apps,
            fail_with_status: None,
            requests: RefCell::new(Vec::new()),
        }
    }

    fn failing(status: u16) -> Self {
        Self {
            apps: Vec::new(),
            fail_with_status: Some(status),
            requests: RefCell::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.requests.borrow().len()
    }
}

impl ChartSource for FakeSource {
    fn fetch_top_apps(&self, request: &ChartRequest) -> FetchResult<Vec<ChartEntry>> {
        self.requests.borrow_mut().push(request.clone());
        if let Some(status) = self.fail_with_status {
            return Err(FetchError::Status {
                url: format!("fake://{}/{}", request.country, request.chart_type),
                status,
            });
        }
        Ok(self
            .apps
            .iter()
            .zip(1u32..)
            .map(|(name, rank)| ChartEntry {
                rank,
                app_name: name.to_string(),
                artist: format!("{name} Studio"),
                icon_url: format!("https://img.example/{name}.png"),
                country: request.country.clone(),
                chart_type: request.chart_type,
                fetched_date: utc_today(),
            })
            .collect())
    }
}

fn service_with(source: FakeSource) -> (TempDir, ChartService<SqliteChartRepository, FakeSource>) {
    let dir = tempfile::tempdir().unwrap();
    let repo = SqliteChartRepository::try_new(dir.path().join("charts.db")).unwrap();
    (dir, ChartService::new(repo, source, 50, "apps"))
}

#[test]
fn update_stores_three_ranked_rows_for_today() {
    let (_dir, service) = service_with(FakeSource::with_apps(vec!["One", "Two", "Three"]));

    assert!(service.update_chart_data("us", ChartType::TopFree).unwrap());

    let stored = service.get_latest_apps("us", Some(ChartType::TopFree)).unwrap();
    assert_eq!(stored.len(), 3);
    assert_eq!(
        stored.iter().map(|e| e.rank).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    assert!(stored.iter().all(|e| e.fetched_date == utc_today()));
    assert_eq!(stored[0].app_name, "One");

    let requests = service.source().requests.borrow();
    let request = &requests[0];
    assert_eq!(request.country, "us");
    assert_eq!(request.limit, 50);
    assert_eq!(request.explicit, "apps");
}

#[test]
fn second_update_on_same_day_skips_fetch() {
    let (_dir, service) = service_with(FakeSource::with_apps(vec!["One", "Two"]));

    assert!(service.update_chart_data("us", ChartType::TopFree).unwrap());
    assert!(!service.update_chart_data("us", ChartType::TopFree).unwrap());
    assert_eq!(service.source().calls(), 1);

    assert!(service.update_chart_data("us", ChartType::TopPaid).unwrap());
    assert_eq!(service.source().calls(), 2);
}

#[test]
fn yesterdays_rows_do_not_make_chart_fresh() {
    let (_dir, service) = service_with(FakeSource::with_apps(vec!["Today"]));
    let yesterday = utc_today().checked_sub_days(Days::new(1)).unwrap();
    service
        .repo()
        .store_entries(&[ChartEntry {
            rank: 1,
            app_name: "Yesterday".to_string(),
            artist: String::new(),
            icon_url: String::new(),
            country: "jp".to_string(),
            chart_type: ChartType::TopFree,
            fetched_date: yesterday,
        }])
        .unwrap();

    assert!(service.update_chart_data("jp", ChartType::TopFree).unwrap());
    let latest = service.get_latest_apps("jp", Some(ChartType::TopFree)).unwrap();
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].app_name, "Today");
}

#[test]
fn fetch_failure_propagates_and_stores_nothing() {
    let (_dir, service) = service_with(FakeSource::failing(503));

    let err = service
        .update_chart_data("us", ChartType::TopFree)
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Fetch(FetchError::Status { status: 503, .. })
    ));
    assert!(service.get_latest_apps("us", None).unwrap().is_empty());
}

#[test]
fn get_latest_apps_without_data_is_empty() {
    let (_dir, service) = service_with(FakeSource::with_apps(vec![]));
    assert!(service.get_latest_apps("br", None).unwrap().is_empty());
}

#[test]
fn territory_ranking_orders_by_territory_count() {
    let (_dir, service) = service_with(FakeSource::with_apps(vec!["Shared", "Local"]));
    service.update_chart_data("us", ChartType::TopFree).unwrap();
    service.update_chart_data("gb", ChartType::TopFree).unwrap();

    let ranking = service.territory_ranking(ChartType::TopFree, 50, 10).unwrap();
    assert_eq!(ranking.len(), 2);
    assert!(ranking.iter().all(|count| count.territory_count == 2));
    assert_eq!(ranking[0].app_name, "Local");
    assert_eq!(
        ranking[1].icon_url.as_deref(),
        Some("https://img.example/Shared.png")
    );

    let top_only = service.territory_ranking(ChartType::TopFree, 1, 10).unwrap();
    assert_eq!(top_only.len(), 1);
    assert_eq!(top_only[0].app_name, "Shared");
    assert_eq!(top_only[0].territory_count, 2);

    let truncated = service.territory_ranking(ChartType::TopFree, 50, 1).unwrap();
    assert_eq!(truncated.len(), 1);
}

#[test]
fn territory_ranking_prefers_wider_reach() {
    let dir = tempfile::tempdir().unwrap();
    let repo = SqliteChartRepository::try_new(dir.path().join("charts.db")).unwrap();
    let today = utc_today();
    let row = |country: &str, rank: u32, name: &str| ChartEntry {
        rank,
        app_name: name.to_string(),
        artist: String::new(),
        icon_url: String::new(),
        country: country.to_string(),
        chart_type: ChartType::TopPaid,
        fetched_date: today,
    };
    repo.store_entries(&[
        row("us", 1, "Aardvark"),
        row("us", 2, "Zebra"),
        row("gb", 1, "Zebra"),
        row("de", 1, "Zebra"),
    ])
    .unwrap();

    let service = ChartService::new(repo, FakeSource::with_apps(vec![]), 50, "apps");
    let ranking = service.territory_ranking(ChartType::TopPaid, 50, 5).unwrap();
    let summary: Vec<(&str, usize)> = ranking
        .iter()
        .map(|count| (count.app_name.as_str(), count.territory_count))
        .collect();
    assert_eq!(summary, vec![("Zebra", 3), ("Aardvark", 1)]);
}
