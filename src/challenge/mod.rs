//! 验证码处理
//!
//! - `solver`: 把图片交给外部识别服务，拿回文本
//! - `resolver`: 在当前页面上检测验证码、截图、识别、填写并提交

pub mod resolver;
pub mod solver;

pub use resolver::{ChallengeMarkers, ChallengeOutcome, ChallengeResolver};
pub use solver::{ChallengeSolver, HttpChallengeSolver};
