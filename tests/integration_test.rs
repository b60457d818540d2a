use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use case_study_scraper::browser::{BrowserSettings, ChromiumFactory};
use case_study_scraper::challenge::{ChallengeMarkers, HttpChallengeSolver};
use case_study_scraper::config::Config;
use case_study_scraper::error::{LoadFault, RendererError};
use case_study_scraper::{
    ChallengeResolver, ExtractionController, PageRenderer, RendererFactory, ReportWriter,
    RunStatus, SessionManager, StructuralExtractor, WriteOutcome,
};

const ORIGIN: &str = "https://cases.example.org";
const LISTING: &str = "https://cases.example.org/case-studies";

/// 每个 URL 固定返回一页；`flaky` 中的 URL 第一次加载会失败
#[derive(Clone, Default)]
struct FakeSite {
    pages: Arc<HashMap<String, String>>,
    flaky: Arc<Mutex<Vec<String>>>,
    launches: Arc<Mutex<usize>>,
}

struct FakeRenderer {
    site: FakeSite,
    markup: String,
}

#[async_trait]
impl RendererFactory for FakeSite {
    async fn create(&self) -> Result<Box<dyn PageRenderer>, RendererError> {
        *self.launches.lock().unwrap() += 1;
        Ok(Box::new(FakeRenderer {
            site: self.clone(),
            markup: String::new(),
        }))
    }
}

#[async_trait]
impl PageRenderer for FakeRenderer {
    async fn load(&mut self, url: &str, timeout: Duration) -> Result<(), LoadFault> {
        {
            let mut flaky = self.site.flaky.lock().unwrap();
            if let Some(pos) = flaky.iter().position(|u| u == url) {
                flaky.remove(pos);
                return Err(LoadFault::Timeout {
                    url: url.to_string(),
                    seconds: timeout.as_secs(),
                });
            }
        }
        match self.site.pages.get(url) {
            Some(markup) => {
                self.markup = markup.clone();
                Ok(())
            }
            None => Err(LoadFault::DriverFault {
                url: url.to_string(),
                reason: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            }),
        }
    }

    async fn current_markup(&mut self) -> Result<String, RendererError> {
        Ok(self.markup.clone())
    }

    async fn screenshot(&mut self, _selector: &str) -> Result<Vec<u8>, RendererError> {
        Ok(Vec::new())
    }

    async fn fill(&mut self, _selector: &str, _text: &str) -> Result<(), RendererError> {
        Ok(())
    }

    async fn click_text(&mut self, _selector: &str, _text: &str) -> Result<bool, RendererError> {
        Ok(false)
    }

    async fn dispose(&mut self) {}
}

fn site() -> FakeSite {
    let mut pages = HashMap::new();
    pages.insert(
        LISTING.to_string(),
        r#"<main>
            <div class="h5"><a href="/case/medication-error">Medication Error</a></div>
            <div class="h5"><a href="/case/missing">Missing</a></div>
            <div class="h5"><a href="https://cases.example.org/case/handoff">Handoff</a></div>
        </main>"#
            .to_string(),
    );
    pages.insert(
        format!("{}/case/medication-error", ORIGIN),
        r#"<h1>A Wrong Dose</h1>
           <h2>Background</h2>
           <h2 id="The-Case">The Case</h2>
           <p>A patient was admitted.</p>
           <p>The dose was doubled.</p>
           <h2>Commentary</h2>
           <p>Not part of the case.</p>"#
            .to_string(),
    );
    pages.insert(
        format!("{}/case/handoff", ORIGIN),
        r#"<h2>The Cases</h2><p>Two handoffs went wrong.</p>"#.to_string(),
    );
    FakeSite {
        pages: Arc::new(pages),
        ..Default::default()
    }
}

fn controller(site: &FakeSite, config: &Config) -> ExtractionController {
    let sessions = SessionManager::new(Box::new(site.clone()), Duration::from_secs(5), Duration::ZERO);
    let resolver = ChallengeResolver::new(
        Arc::new(HttpChallengeSolver::new(config)),
        ChallengeMarkers::default(),
        Duration::from_secs(1),
        Duration::ZERO,
    )
    .unwrap();
    ExtractionController::new(
        sessions,
        StructuralExtractor::case_studies(ORIGIN).unwrap(),
        resolver,
        LISTING,
        config.screenshot_path.clone(),
    )
}

#[tokio::test]
async fn test_end_to_end_run_writes_ordered_report() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        screenshot_path: dir.path().join("captcha.png"),
        ..Config::default()
    };
    let site = site();
    site.flaky
        .lock()
        .unwrap()
        .push(format!("{}/case/handoff", ORIGIN));

    let report = controller(&site, &config).run().await;

    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.targets.len(), 3);
    assert_eq!(report.results.len(), 3);
    // 第二个链接：失败后重建一次；第三个链接：先补上会话，超时后再重建一次
    assert_eq!(report.session_recreations, 3);
    assert_eq!(*site.launches.lock().unwrap(), 4);

    let titles: Vec<&str> = report.results.iter().map(|e| e.title()).collect();
    assert_eq!(
        titles,
        vec!["A Wrong Dose", "Error processing link 2", "Unknown Title 3"]
    );

    let first = report.results.get(0).unwrap();
    assert_eq!(first.headings(), ["Background", "The Case", "Commentary"]);
    assert_eq!(
        first.paragraphs(),
        ["A patient was admitted.", "The dose was doubled."]
    );
    assert_eq!(
        report.results.get(2).unwrap().paragraphs(),
        ["Two handoffs went wrong."]
    );

    let output = dir.path().join("case_studies.pdf");
    let outcome = ReportWriter::new().write(&report.results, &output);
    assert_eq!(outcome, WriteOutcome::Written(output.clone()));
    assert!(std::fs::metadata(&output).unwrap().len() > 0);
}

#[tokio::test]
async fn test_unreachable_listing_still_produces_empty_report() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::default();
    let site = FakeSite::default();

    let report = controller(&site, &config).run().await;
    assert_eq!(report.status, RunStatus::AbortedAtListing);
    assert!(report.results.is_empty());

    let outcome = ReportWriter::new().write(&report.results, &dir.path().join("empty.pdf"));
    assert!(!outcome.is_failed());
}

#[tokio::test]
#[ignore] // 需要本机安装 Chrome，手动运行：cargo test -- --ignored
async fn test_real_browser_loads_page() {
    let config = Config::default();
    let factory = ChromiumFactory::new(BrowserSettings::from_config(&config));
    let mut sessions = SessionManager::new(
        Box::new(factory),
        config.page_load_timeout(),
        config.settle_delay(),
    );

    sessions.create().await.expect("启动浏览器失败");
    sessions
        .load("data:text/html,<h1>Hello</h1>")
        .await
        .expect("加载页面失败");
    let markup = sessions.current_markup().await.expect("读取页面失败");
    sessions.dispose().await;

    assert!(markup.contains("Hello"));
}
