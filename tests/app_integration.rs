use chrono::{Datelike, Duration, Local, NaiveDate, Weekday};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tracing::info;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FUND_ID: &str = "F00000PDC9";
const OTHER_FUND_ID: &str = "F00000PGCE";
const SCHEME_CODE: &str = "122639";

mod test_utils {
    use super::*;

    pub async fn mount(server: &MockServer, url_path: String, status: u16, body: String) {
        Mock::given(method("GET"))
            .and(path(url_path))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(server)
            .await;
    }

    /// Weekday NAVs for the last `days` days, newest first as the feed returns them.
    pub fn nav_history_json(days: i64) -> String {
        let today = Local::now().date_naive();
        let rows: Vec<String> = (0..days)
            .map(|i| today - Duration::days(i))
            .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
            .enumerate()
            .map(|(i, date)| {
                format!(
                    r#"{{"date": "{}", "nav": "{:.4}"}}"#,
                    date.format("%d-%m-%Y"),
                    200.0 - i as f64 * 0.05
                )
            })
            .collect();
        format!(
            r#"{{"meta": {{"scheme_name": "Parag Parikh Flexi Cap Fund - Direct Plan - Growth", "fund_house": "PPFAS Mutual Fund"}}, "data": [{}], "status": "SUCCESS"}}"#,
            rows.join(",")
        )
    }

    /// Weekday NAVs between `start` and `end`, 100 up to `step_date` and 125 after it.
    pub fn step_history_json(start: NaiveDate, end: NaiveDate, step_date: NaiveDate) -> String {
        let mut rows: Vec<String> = start
            .iter_days()
            .take_while(|d| *d <= end)
            .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
            .map(|date| {
                let nav = if date <= step_date { "100.0000" } else { "125.0000" };
                format!(r#"{{"date": "{}", "nav": "{nav}"}}"#, date.format("%d-%m-%Y"))
            })
            .collect();
        rows.reverse();
        format!(r#"{{"meta": {{}}, "data": [{}]}}"#, rows.join(","))
    }

    pub fn holdings_json(names: &[&str]) -> String {
        let holdings: Vec<String> = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                format!(
                    r#"{{"securityName": "{name}", "weighting": {}, "sector": "Financial Services"}}"#,
                    10.0 - i as f64
                )
            })
            .collect();
        format!(
            r#"{{"masterPortfolioId": "42", "holdingSummary": {{"numberOfHolding": {}}}, "equityHoldingPage": {{"holdingList": [{}]}}}}"#,
            names.len(),
            holdings.join(",")
        )
    }

    pub async fn research_server() -> MockServer {
        let server = MockServer::start().await;
        mount(
            &server,
            format!("/sal-service/v1/fund/quote/v3/{FUND_ID}/data"),
            200,
            r#"{"investmentName": "Parag Parikh Flexi Cap Fund Direct Growth", "expenseRatio": 0.63}"#
                .to_string(),
        )
        .await;
        mount(
            &server,
            format!("/sal-service/v1/fund/performance/riskVolatility/{FUND_ID}/data"),
            200,
            r#"{"fundRiskVolatility": {"for1Year": {"alpha": 3.1, "beta": 0.82}}}"#.to_string(),
        )
        .await;
        mount(
            &server,
            format!("/sal-service/v1/fund/portfolio/holding/v2/{FUND_ID}/data"),
            200,
            holdings_json(&["HDFC Bank Ltd", "ITC Ltd", "Infosys Ltd"]),
        )
        .await;
        mount(
            &server,
            format!("/sal-service/v1/fund/portfolio/holding/v2/{OTHER_FUND_ID}/data"),
            200,
            holdings_json(&["Infosys Ltd", "Reliance Industries Ltd", "ITC Ltd", "TCS Ltd"]),
        )
        .await;
        server
    }

    /// Writes a catalog and a config pointing at the mock servers, returns the config path.
    pub fn write_config(dir: &Path, mfapi_uri: &str, research_uri: &str) -> String {
        let catalog_path = dir.join("funds.csv");
        fs::write(
            &catalog_path,
            format!(
                "isin,scheme_name,scheme_code,ID\n\
                 INF879O01027,Parag Parikh Flexi Cap Fund - Direct Plan - Growth,{SCHEME_CODE},{FUND_ID}\n\
                 INF209K01YY7,Aditya Birla Sun Life Nifty 50 Index Fund,119648,{OTHER_FUND_ID}\n"
            ),
        )
        .expect("Failed to write catalog");

        let config_path = dir.join("config.yaml");
        let config = format!(
            r#"
catalog_path: "{}"
providers:
  mfapi:
    base_url: "{mfapi_uri}"
  morningstar:
    base_url: "{research_uri}"
    access_token: "test-token"
request:
  timeout_secs: 5
  retries: 0
"#,
            catalog_path.display()
        );
        fs::write(&config_path, config).expect("Failed to write config file");
        config_path.to_string_lossy().into_owned()
    }
}

#[test_log::test(tokio::test)]
async fn test_fund_flow_with_mock_providers() {
    let mfapi = MockServer::start().await;
    test_utils::mount(
        &mfapi,
        format!("/mf/{SCHEME_CODE}"),
        200,
        test_utils::nav_history_json(400),
    )
    .await;
    let research = test_utils::research_server().await;

    let dir = TempDir::new().unwrap();
    let config_path = test_utils::write_config(dir.path(), &mfapi.uri(), &research.uri());
    info!(%config_path, "Running fund command");

    let result = fundscope::run_command(
        fundscope::AppCommand::Fund {
            query: "parag".to_string(),
            period: fundscope::core::ReturnPeriod::OneYear,
        },
        Some(&config_path),
    )
    .await;
    assert!(result.is_ok(), "Fund command failed with: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_fund_flow_survives_provider_errors() {
    let mfapi = MockServer::start().await;
    test_utils::mount(&mfapi, format!("/mf/{SCHEME_CODE}"), 500, "Server Error".to_string()).await;
    // Nothing is mounted, so every research request gets a 404.
    let research = MockServer::start().await;

    let dir = TempDir::new().unwrap();
    let config_path = test_utils::write_config(dir.path(), &mfapi.uri(), &research.uri());

    let result = fundscope::run_command(
        fundscope::AppCommand::Fund {
            query: SCHEME_CODE.to_string(),
            period: fundscope::core::ReturnPeriod::ThreeYear,
        },
        Some(&config_path),
    )
    .await;
    assert!(result.is_ok(), "Provider failures should not be fatal: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_search_and_no_match() {
    let dir = TempDir::new().unwrap();
    let config_path = test_utils::write_config(dir.path(), "http://127.0.0.1:9", "http://127.0.0.1:9");

    for query in ["nifty", "no such fund"] {
        let result = fundscope::run_command(
            fundscope::AppCommand::Search {
                query: query.to_string(),
            },
            Some(&config_path),
        )
        .await;
        assert!(result.is_ok(), "Search failed with: {:?}", result.err());
    }
}

#[test_log::test(tokio::test)]
async fn test_research_commands_flow() {
    let research = test_utils::research_server().await;
    let dir = TempDir::new().unwrap();
    let config_path = test_utils::write_config(dir.path(), "http://127.0.0.1:9", &research.uri());

    let risk = fundscope::run_command(
        fundscope::AppCommand::Risk {
            fund_id: FUND_ID.to_string(),
        },
        Some(&config_path),
    )
    .await;
    assert!(risk.is_ok(), "Risk failed with: {:?}", risk.err());

    let holdings = fundscope::run_command(
        fundscope::AppCommand::Holdings {
            fund_id: FUND_ID.to_string(),
        },
        Some(&config_path),
    )
    .await;
    assert!(holdings.is_ok(), "Holdings failed with: {:?}", holdings.err());

    let overlap = fundscope::run_command(
        fundscope::AppCommand::Overlap {
            first: FUND_ID.to_string(),
            second: OTHER_FUND_ID.to_string(),
        },
        Some(&config_path),
    )
    .await;
    assert!(overlap.is_ok(), "Overlap failed with: {:?}", overlap.err());
}

#[test_log::test(tokio::test)]
async fn test_missing_catalog_is_an_error() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.yaml");
    fs::write(
        &config_path,
        format!("catalog_path: \"{}\"\n", dir.path().join("missing.csv").display()),
    )
    .unwrap();

    let result = fundscope::run_command(
        fundscope::AppCommand::Search {
            query: "parag".to_string(),
        },
        Some(config_path.to_str().unwrap()),
    )
    .await;
    let error = result.unwrap_err();
    assert!(format!("{error:#}").contains("Fund catalog unavailable"));
}

#[test_log::test(tokio::test)]
async fn test_missing_config_is_an_error() {
    let result = fundscope::run_command(
        fundscope::AppCommand::Holdings {
            fund_id: FUND_ID.to_string(),
        },
        Some("/no/such/fundscope/config.yaml"),
    )
    .await;
    assert!(result.is_err());
}

#[test_log::test(tokio::test)]
async fn test_report_figures_through_mocked_providers() {
    use fundscope::core::analytics::holdings_overlap;
    use fundscope::core::cache::Cache;
    use fundscope::core::config::{MorningstarProviderConfig, RequestConfig};
    use fundscope::core::{FundDataProvider, FundEntry, ReturnPeriod};
    use fundscope::providers::{MfApiProvider, MorningstarProvider};
    use rust_decimal::Decimal;

    let as_of = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    let anchor_date = as_of - ReturnPeriod::OneYear.lookback();

    let mfapi = MockServer::start().await;
    test_utils::mount(
        &mfapi,
        format!("/mf/{SCHEME_CODE}"),
        200,
        test_utils::step_history_json(NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(), as_of, anchor_date),
    )
    .await;
    let research = test_utils::research_server().await;

    let request = RequestConfig {
        timeout_secs: 5,
        retries: 0,
    };
    let market = MfApiProvider::new(&mfapi.uri(), &request, Arc::new(Cache::new())).unwrap();
    let research = MorningstarProvider::new(
        &MorningstarProviderConfig {
            base_url: research.uri(),
            access_token: Some("test-token".to_string()),
            client_id: "RSIN_SAL".to_string(),
        },
        &request,
        Arc::new(Cache::new()),
    )
    .unwrap();

    let entry = FundEntry {
        isin: "INF879O01027".to_string(),
        scheme_name: "Parag Parikh Flexi Cap Fund - Direct Plan - Growth".to_string(),
        scheme_code: SCHEME_CODE.to_string(),
        fund_id: FUND_ID.to_string(),
    };
    let report = fundscope::cli::fund::build_report(&entry, &market, &research, as_of).await;

    assert!(report.details.is_ok());
    assert!(report.risk.is_ok());
    let one_year = report.returns.detail(ReturnPeriod::OneYear).unwrap();
    assert_eq!(one_year.anchor_date, anchor_date);
    assert_eq!(one_year.percent, Decimal::new(2500, 2));
    assert_eq!(
        report.returns.annualized(ReturnPeriod::OneYear),
        Some(Decimal::new(2500, 2))
    );
    assert_eq!(report.returns.get(ReturnPeriod::ThreeYear), None);
    assert_eq!(report.returns.get(ReturnPeriod::FiveYear), None);

    let first = research.fetch_holdings(FUND_ID).await.unwrap();
    let second = research.fetch_holdings(OTHER_FUND_ID).await.unwrap();
    let overlap = holdings_overlap(&first.equity_holdings, &second.equity_holdings);
    assert_eq!(overlap.common, vec!["ITC Ltd".to_string(), "Infosys Ltd".to_string()]);
    assert_eq!(overlap.only_first(), 1);
    assert_eq!(overlap.only_second(), 2);
    let jaccard = overlap.overlap_pct.unwrap();
    assert!((jaccard - 40.0).abs() < 1e-9, "{jaccard}");
    let combined = overlap.combined_share_pct.unwrap();
    assert!((combined - 200.0 / 7.0).abs() < 1e-9, "{combined}");
}
