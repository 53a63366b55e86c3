//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责一次运行的整体调度，是整个系统的"指挥中心"。
//!
//! ## 层次关系
//!
//! ```text
//! run_coordinator (一次运行: 筛选 → 分析 → 校验 → 恢复 → 汇总)
//!     ↓
//! workflow::RecoveryOrchestrator (重驱单条被拒条目)
//!     ↓
//! services (能力层: selector / analysis / verifier / persistence)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：协调器只做调度和统计，不做具体业务判断
//! 2. **失败即数据**：条目失败进入报告，不中断运行
//! 3. **向下依赖**：编排层 → workflow → services

pub mod run_coordinator;

pub use run_coordinator::{RunCoordinator, RunState};
