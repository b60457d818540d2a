//! 单元测试用的脚本化渲染器 / 验证码服务

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::browser::{PageRenderer, RendererFactory};
use crate::challenge::ChallengeSolver;
use crate::error::{LoadFault, RendererError, SolverError};

/// 某个 URL 下一次导航的结果
#[derive(Debug, Clone)]
pub enum Step {
    Page(String),
    Timeout,
    Fault,
}

impl Step {
    pub fn page(markup: &str) -> Self {
        Step::Page(markup.to_string())
    }
}

#[derive(Default)]
struct Script {
    pages: HashMap<String, VecDeque<Step>>,
    after_submit: Option<String>,
    click_misses: bool,
    fail_creates: usize,
    created: usize,
    disposed: usize,
    loads: Vec<String>,
    filled: Vec<(String, String)>,
}

/// 所有实例共享同一份脚本
#[derive(Clone, Default)]
pub struct ScriptedFactory {
    script: Arc<Mutex<Script>>,
}

impl ScriptedFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按顺序消费；只剩最后一步时重复使用
    pub fn script(&self, url: &str, steps: Vec<Step>) {
        self.script
            .lock()
            .unwrap()
            .pages
            .insert(url.to_string(), steps.into());
    }

    /// 点击提交后页面变成的内容
    pub fn after_submit(&self, markup: &str) {
        self.script.lock().unwrap().after_submit = Some(markup.to_string());
    }

    /// 之后的点击都找不到目标
    pub fn miss_clicks(&self) {
        self.script.lock().unwrap().click_misses = true;
    }

    pub fn fail_next_creates(&self, count: usize) {
        self.script.lock().unwrap().fail_creates = count;
    }

    pub fn created(&self) -> usize {
        self.script.lock().unwrap().created
    }

    pub fn disposed(&self) -> usize {
        self.script.lock().unwrap().disposed
    }

    pub fn loads(&self) -> Vec<String> {
        self.script.lock().unwrap().loads.clone()
    }

    pub fn filled(&self) -> Vec<(String, String)> {
        self.script.lock().unwrap().filled.clone()
    }
}

#[async_trait]
impl RendererFactory for ScriptedFactory {
    async fn create(&self) -> Result<Box<dyn PageRenderer>, RendererError> {
        let mut script = self.script.lock().unwrap();
        if script.fail_creates > 0 {
            script.fail_creates -= 1;
            return Err(RendererError::LaunchFailed {
                reason: "scripted launch failure".to_string(),
            });
        }
        script.created += 1;
        Ok(Box::new(ScriptedRenderer {
            script: Arc::clone(&self.script),
            markup: String::new(),
        }))
    }
}

pub struct ScriptedRenderer {
    script: Arc<Mutex<Script>>,
    markup: String,
}

#[async_trait]
impl PageRenderer for ScriptedRenderer {
    async fn load(&mut self, url: &str, timeout: Duration) -> Result<(), LoadFault> {
        let mut script = self.script.lock().unwrap();
        script.loads.push(url.to_string());
        let step = match script.pages.get_mut(url) {
            Some(steps) if steps.len() > 1 => steps.pop_front(),
            Some(steps) => steps.front().cloned(),
            None => None,
        };
        match step {
            Some(Step::Page(markup)) => {
                self.markup = markup;
                Ok(())
            }
            Some(Step::Timeout) => Err(LoadFault::Timeout {
                url: url.to_string(),
                seconds: timeout.as_secs(),
            }),
            Some(Step::Fault) | None => Err(LoadFault::DriverFault {
                url: url.to_string(),
                reason: "invalid session id".to_string(),
            }),
        }
    }

    async fn current_markup(&mut self) -> Result<String, RendererError> {
        Ok(self.markup.clone())
    }

    async fn screenshot(&mut self, _selector: &str) -> Result<Vec<u8>, RendererError> {
        Ok(b"\x89PNG".to_vec())
    }

    async fn fill(&mut self, selector: &str, text: &str) -> Result<(), RendererError> {
        self.script
            .lock()
            .unwrap()
            .filled
            .push((selector.to_string(), text.to_string()));
        Ok(())
    }

    async fn click_text(&mut self, _selector: &str, text: &str) -> Result<bool, RendererError> {
        if !self.markup.contains(text) || self.script.lock().unwrap().click_misses {
            return Ok(false);
        }
        if let Some(next) = self.script.lock().unwrap().after_submit.clone() {
            self.markup = next;
        }
        Ok(true)
    }

    async fn dispose(&mut self) {
        self.script.lock().unwrap().disposed += 1;
    }
}

/// 固定返回同一个结果的验证码服务
pub struct FixedSolver {
    pub outcome: Result<String, SolverError>,
    pub calls: Arc<Mutex<usize>>,
}

impl FixedSolver {
    pub fn solved(text: &str) -> Self {
        Self {
            outcome: Ok(text.to_string()),
            calls: Arc::default(),
        }
    }

    pub fn failing(err: SolverError) -> Self {
        Self {
            outcome: Err(err),
            calls: Arc::default(),
        }
    }
}

#[async_trait]
impl ChallengeSolver for FixedSolver {
    async fn solve(&self, _image: &[u8], _timeout: Duration) -> Result<String, SolverError> {
        *self.calls.lock().unwrap() += 1;
        self.outcome.clone()
    }
}
