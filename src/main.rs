use anyhow::Result;
use case_study_scraper::config::Config;
use case_study_scraper::orchestrator::App;
use case_study_scraper::utils::logging;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::load()?;

    // 初始化日志
    logging::init(&config)?;

    // 初始化并运行应用
    let outcome = App::initialize(config)?.run().await;

    // 只有报告完全没写出来才算失败
    if outcome.write.is_failed() {
        std::process::exit(1);
    }

    Ok(())
}
