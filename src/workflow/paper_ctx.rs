//! 论文处理上下文
//!
//! 封装"我正在处理批次中第几篇、哪一篇论文"这一信息

use std::fmt::Display;

/// 论文处理上下文
#[derive(Debug, Clone)]
pub struct PaperCtx {
    /// 论文标识
    pub paper_id: String,

    /// 论文在批次中的位置（从 1 开始，仅用于日志显示）
    pub batch_index: usize,
}

impl PaperCtx {
    pub fn new(paper_id: String, batch_index: usize) -> Self {
        Self {
            paper_id,
            batch_index,
        }
    }
}

impl Display for PaperCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[论文 {} ID#{}]", self.batch_index, self.paper_id)
    }
}
