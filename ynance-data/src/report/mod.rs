//! LLM-drafted market commentary.
//!
//! [`ReportDrafter`] turns the latest closes into a fixed five-section prompt, forwards it to a
//! [`TextGenerator`] and always returns a [`Report`], substituting a fallback body when no key is
//! configured or generation fails.

/// In-memory session archive of generated reports.
pub mod archive;

/// OpenAI-compatible chat completions client.
pub mod llm;

/// Prompt assembly.
pub mod prompt;

pub use archive::ReportArchive;
pub use llm::{ChatCompletionsClient, TextGenerator};
pub use prompt::{Baseline, IndexClose, REPORT_SECTIONS, build_prompt};

use crate::{config::LlmConfig, error::DataError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{info, warn};

/// Body used whenever the model cannot be reached.
pub const FALLBACK_BODY: &str =
    "Report generation is unavailable right now. Configure LLM_API_KEY (or GEMINI_API_KEY) in \
     secrets.json and try again.";

/// Report cadence, used in the title and file name.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default, Deserialize, Serialize)]
pub enum ReportKind {
    #[default]
    Daily,
    Weekly,
}

impl ReportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Daily => "daily",
            ReportKind::Weekly => "weekly",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ReportKind::Daily => "Daily Market Report",
            ReportKind::Weekly => "Weekly Market Report",
        }
    }
}

impl std::fmt::Display for ReportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where the body of a [`Report`] came from.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Deserialize, Serialize)]
pub enum ReportSource {
    Model,
    Fallback,
}

/// Generated market commentary.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Report {
    pub kind: ReportKind,
    pub title: String,
    pub date: NaiveDate,
    pub body: String,
    pub source: ReportSource,
}

impl Report {
    /// File name of the form `<kind>_<YYYY-MM-DD>.md`.
    pub fn file_name(&self) -> String {
        format!("{}_{}.md", self.kind.as_str(), self.date.format("%Y-%m-%d"))
    }

    /// Markdown document with the title heading.
    pub fn to_markdown(&self) -> String {
        format!("# {} ({})\n\n{}\n", self.title, self.date, self.body.trim_end())
    }

    /// Write the report into `dir`, overwriting any report of the same kind and date.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<PathBuf, DataError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name());
        std::fs::write(&path, self.to_markdown())?;
        info!(path = %path.display(), kind = %self.kind, "report saved");
        Ok(path)
    }
}

/// Builds prompts and drafts reports, degrading to [`FALLBACK_BODY`].
#[derive(Clone)]
pub struct ReportDrafter {
    generator: Option<Arc<dyn TextGenerator>>,
}

impl std::fmt::Debug for ReportDrafter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportDrafter")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl ReportDrafter {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self { generator }
    }

    /// Drafter backed by a chat completions endpoint, or fallback-only without a key.
    pub fn from_config(config: &LlmConfig, api_key: Option<&str>) -> Result<Self, DataError> {
        let generator = match api_key {
            Some(api_key) => {
                let client = ChatCompletionsClient::new(config.clone(), api_key)?;
                Some(Arc::new(client) as Arc<dyn TextGenerator>)
            }
            None => None,
        };
        Ok(Self::new(generator))
    }

    pub fn is_enabled(&self) -> bool {
        self.generator.is_some()
    }

    /// Draft a report for `date` from the latest closes. Never fails.
    pub async fn draft(&self, kind: ReportKind, date: NaiveDate, closes: &[IndexClose]) -> Report {
        let (body, source) = match &self.generator {
            None => {
                warn!(%kind, "no LLM key configured, using fallback report");
                (FALLBACK_BODY.to_string(), ReportSource::Fallback)
            }
            Some(generator) => {
                let prompt = build_prompt(kind, date, closes);
                match generator.generate(&prompt).await {
                    Ok(text) if !text.trim().is_empty() => (text, ReportSource::Model),
                    Ok(_) => {
                        warn!(%kind, "model returned an empty report, using fallback");
                        (FALLBACK_BODY.to_string(), ReportSource::Fallback)
                    }
                    Err(error) => {
                        warn!(%kind, %error, "report generation failed, using fallback");
                        (FALLBACK_BODY.to_string(), ReportSource::Fallback)
                    }
                }
            }
        };

        Report {
            kind,
            title: kind.title().to_string(),
            date,
            body,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Debug)]
    struct Canned {
        response: Result<String, DataError>,
        prompts: Mutex<Vec<String>>,
    }

    impl Canned {
        fn new(response: Result<String, DataError>) -> Arc<Self> {
            Arc::new(Self {
                response,
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl TextGenerator for Canned {
        async fn generate(&self, prompt: &str) -> Result<String, DataError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.response.clone()
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 8).unwrap()
    }

    fn closes() -> Vec<IndexClose> {
        vec![IndexClose::new("SPY".into(), 510.0, Some(505.0))]
    }

    #[tokio::test]
    async fn test_draft_uses_model_text() {
        let generator = Canned::new(Ok("## Market issues\nAll quiet.".to_string()));
        let drafter = ReportDrafter::new(Some(generator.clone()));

        let report = drafter.draft(ReportKind::Daily, date(), &closes()).await;

        assert_eq!(report.source, ReportSource::Model);
        assert_eq!(report.body, "## Market issues\nAll quiet.");
        assert_eq!(report.title, "Daily Market Report");

        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("SPY"));
    }

    #[tokio::test]
    async fn test_draft_falls_back() {
        struct TestCase {
            generator: Option<Arc<dyn TextGenerator>>,
        }

        let tests = vec![
            TestCase {
                // TC0: no key configured
                generator: None,
            },
            TestCase {
                // TC1: generation error
                generator: Some(Canned::new(Err(DataError::Timeout))),
            },
            TestCase {
                // TC2: blank response
                generator: Some(Canned::new(Ok("  \n".to_string()))),
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let report = ReportDrafter::new(test.generator)
                .draft(ReportKind::Weekly, date(), &closes())
                .await;
            assert_eq!(report.source, ReportSource::Fallback, "TC{} failed", index);
            assert_eq!(report.body, FALLBACK_BODY, "TC{} failed", index);
        }
    }

    #[test]
    fn test_drafter_without_key_is_disabled() {
        let drafter = ReportDrafter::from_config(&LlmConfig::default(), None).unwrap();
        assert!(!drafter.is_enabled());

        let drafter = ReportDrafter::from_config(&LlmConfig::default(), Some("key")).unwrap();
        assert!(drafter.is_enabled());
    }

    #[test]
    fn test_report_save_writes_markdown() {
        let dir = tempfile::tempdir().unwrap();
        let report = Report {
            kind: ReportKind::Daily,
            title: ReportKind::Daily.title().to_string(),
            date: date(),
            body: "Body text".to_string(),
            source: ReportSource::Model,
        };

        let path = report.save(dir.path().join("reports")).unwrap();

        assert_eq!(path.file_name().unwrap(), "daily_2024-03-08.md");
        let written = std::fs::read_to_string(path).unwrap();
        assert_eq!(written, "# Daily Market Report (2024-03-08)\n\nBody text\n");
    }
}
