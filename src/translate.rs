//! Asynchronous translation.
//!
//! Translation is fire-and-forget: each accepted transcription spawns a
//! task on the dispatcher's runtime, and the result is applied to the
//! display whenever it arrives. A slow or failing translation service
//! must never delay the next transcription.

use crate::defaults;
use crate::error::{Result, TransvoxError};
use crate::types::TranslationResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Runtime;

/// Trait for translation services.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translates `text` from `source` to `target` language.
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String>;
}

/// Translator with a fallback service and a phrase cache.
///
/// The cache is keyed on `(source, target, text)`; live captions repeat
/// phrases often enough that caching saves real service calls. When the
/// primary service fails, the fallback (if any) is tried before giving
/// up.
pub struct TranslatorStack {
    primary: Box<dyn Translator>,
    fallback: Option<Box<dyn Translator>>,
    cache: Mutex<HashMap<(String, String, String), String>>,
}

impl TranslatorStack {
    /// Creates a stack with a single service.
    pub fn new(primary: Box<dyn Translator>) -> Self {
        Self {
            primary,
            fallback: None,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Adds a fallback service tried when the primary fails.
    pub fn with_fallback(mut self, fallback: Box<dyn Translator>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Number of cached translations.
    pub fn cache_len(&self) -> usize {
        self.cache.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl Translator for TranslatorStack {
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String> {
        if source == target {
            return Ok(text.to_string());
        }

        let key = (source.to_string(), target.to_string(), text.to_string());
        if let Some(cached) = self.cache.lock().unwrap_or_else(|e| e.into_inner()).get(&key).cloned() {
            return Ok(cached);
        }

        let translated = match self.primary.translate(text, source, target).await {
            Ok(translated) => translated,
            Err(primary_err) => match self.fallback {
                Some(ref fallback) => {
                    eprintln!(
                        "transvox: primary translator failed ({}), trying fallback",
                        primary_err
                    );
                    fallback.translate(text, source, target).await?
                }
                None => return Err(primary_err),
            },
        };

        self.cache.lock().unwrap_or_else(|e| e.into_inner()).insert(key, translated.clone());
        Ok(translated)
    }
}

/// Callback invoked with a completed translation, on a runtime thread.
pub type TranslationConsumer = Box<dyn FnOnce(TranslationResult) + Send>;

/// Owns the async runtime and spawns one task per translation request.
///
/// Shared behind an `Arc` between the supervisor (which shuts it down)
/// and the worker's result path (which dispatches requests).
pub struct TranslationDispatcher {
    runtime: Mutex<Option<Runtime>>,
    translator: Arc<dyn Translator>,
    target_language: String,
}

impl TranslationDispatcher {
    /// Creates a dispatcher with its own multi-threaded runtime.
    pub fn new(translator: Arc<dyn Translator>, target_language: String) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("transvox-translate")
            .enable_time()
            .build()
            .map_err(|e| TransvoxError::Translation {
                message: format!("failed to start translation runtime: {}", e),
            })?;

        Ok(Self {
            runtime: Mutex::new(Some(runtime)),
            translator,
            target_language,
        })
    }

    /// Target language translations are requested in.
    pub fn target_language(&self) -> &str {
        &self.target_language
    }

    /// Requests a translation without waiting for it.
    ///
    /// `consumer` runs on a runtime thread when the translation
    /// completes; failures are logged and the consumer is not called.
    pub fn dispatch(&self, text: String, source_language: String, consumer: TranslationConsumer) {
        let guard = self.runtime.lock().unwrap_or_else(|e| e.into_inner());
        let runtime = match guard.as_ref() {
            Some(runtime) => runtime,
            None => return,
        };
        let translator = self.translator.clone();
        let target = self.target_language.clone();

        runtime.spawn(async move {
            match translator.translate(&text, &source_language, &target).await {
                Ok(translated) => consumer(TranslationResult {
                    translated_text: translated,
                    source_language,
                    target_language: target,
                }),
                Err(e) => {
                    eprintln!("transvox: translation error: {}", e);
                }
            }
        });
    }

    /// Shuts the runtime down, giving in-flight tasks a bounded grace
    /// period before they are abandoned. Idempotent.
    pub fn shutdown(&self) {
        let runtime = self.runtime.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(runtime) = runtime {
            runtime.shutdown_timeout(Duration::from_millis(defaults::SHUTDOWN_GRACE_MS));
        }
    }
}

impl Drop for TranslationDispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Mock translator for testing.
///
/// Translates by bracketing the target language, e.g. "[pt] hello".
pub struct MockTranslator {
    should_fail: bool,
    delay: Option<Duration>,
    calls: Mutex<u64>,
}

impl MockTranslator {
    /// Create a mock translator that always succeeds.
    pub fn new() -> Self {
        Self {
            should_fail: false,
            delay: None,
            calls: Mutex::new(0),
        }
    }

    /// Configure the mock to fail every call.
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Configure a delay before each response.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of translate calls made so far.
    pub fn call_count(&self) -> u64 {
        *self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MockTranslator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate(&self, text: &str, _source: &str, target: &str) -> Result<String> {
        *self.calls.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.should_fail {
            return Err(TransvoxError::Translation {
                message: "mock translation error".to_string(),
            });
        }
        Ok(format!("[{}] {}", target, text))
    }
}
