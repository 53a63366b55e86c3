use anyhow::Result;
use arxiv_paper_analysis::models::load_all_paper_files;
use arxiv_paper_analysis::services::{HistoryWriter, LlmAnalysisService, PersistenceSink};
use arxiv_paper_analysis::utils::logging;
use arxiv_paper_analysis::{Config, RunCoordinator};
use tracing::warn;

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    // 加载并校验配置（校验先于任何文件 I/O）
    let config = Config::load()?;
    config.validate()?;
    logging::init_log_file(&config.output_log_file)?;
    logging::log_startup(config.max_batch_size, config.max_concurrent_analysis);

    // 加载待分析的论文记录
    let records = load_all_paper_files(&config.papers_folder).await?;
    if records.is_empty() {
        warn!("⚠️ 没有找到待分析的论文记录，程序结束");
        return Ok(());
    }

    // 执行一次流水线运行
    let service = LlmAnalysisService::new(&config);
    let coordinator = RunCoordinator::new(config.clone(), service);
    let outcome = coordinator.run_once(records).await?;

    // 交付给持久化协作方（本地历史记录）
    let history = HistoryWriter::new(&config);
    history.persist(&outcome.accepted, &outcome.report).await?;

    Ok(())
}
