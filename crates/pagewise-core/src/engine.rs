//! A configured entry point: worker pool, limits and log routing bound
//! together.

use tracing::Dispatch;

use crate::canvas::Canvas;
use crate::config::{ConfigError, EngineConfig};
use crate::decode::{self, DecodeError, DecodeLimits, DecodeOptions};
use crate::encode::{self, EncodeError, EncodeOptions};
use crate::logging::Logging;
use crate::pages::Pipeline;
use crate::stream::{SourceCapability, TargetCapability};
use crate::transform::{Transform, TransformError};

/// Runs decode, encode and page-aware transforms with one configuration.
///
/// Every call runs under the engine's own `tracing` dispatcher, including
/// the per-frame work on pool threads. Cloning shares the pool.
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    pipeline: Pipeline,
    dispatch: Dispatch,
}

impl Engine {
    /// Build an engine that logs to stderr at `config.log_level`.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        let logging = Logging::new(config.log_level).with_stderr(true);
        Self::with_logging(config, logging)
    }

    /// Build an engine with caller-provided log routing.
    ///
    /// The verbosity of `logging` wins over `config.log_level`.
    pub fn with_logging(config: EngineConfig, logging: Logging) -> Result<Self, ConfigError> {
        config.validate()?;
        let pipeline = match config.concurrency {
            0 => Pipeline::sequential(),
            n => Pipeline::with_threads(n).map_err(|e| match e {
                TransformError::Pool(msg) => ConfigError::Invalid(msg),
                other => ConfigError::Invalid(other.to_string()),
            })?,
        };
        Ok(Self {
            config,
            pipeline,
            dispatch: logging.dispatch(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Decode options seeded from the configured defaults.
    pub fn decode_options(&self) -> DecodeOptions {
        DecodeOptions {
            pages: self.config.decode.pages,
            autorotate: self.config.decode.autorotate,
            limits: self.config.limits,
            ..DecodeOptions::default()
        }
    }

    /// Decode from `source`. The configured limits apply on top of
    /// `options.limits`; the stricter bound wins.
    pub fn decode(
        &self,
        source: &mut dyn SourceCapability,
        options: &DecodeOptions,
    ) -> Result<Canvas, DecodeError> {
        let mut options = options.clone();
        options.limits = stricter(&options.limits, &self.config.limits);
        tracing::dispatcher::with_default(&self.dispatch, || {
            decode::decode_with(source, &options, &self.pipeline)
        })
    }

    pub fn encode(
        &self,
        canvas: &Canvas,
        target: &mut dyn TargetCapability,
        options: &EncodeOptions,
    ) -> Result<(), EncodeError> {
        tracing::dispatcher::with_default(&self.dispatch, || {
            encode::encode(canvas, target, options)
        })
    }

    pub fn apply_page_aware(
        &self,
        canvas: &Canvas,
        transform: &Transform,
    ) -> Result<Canvas, TransformError> {
        tracing::dispatcher::with_default(&self.dispatch, || {
            self.pipeline.apply_page_aware(canvas, transform)
        })
    }
}

fn stricter(a: &DecodeLimits, b: &DecodeLimits) -> DecodeLimits {
    fn min<T: Ord + Copy>(a: Option<T>, b: Option<T>) -> Option<T> {
        match (a, b) {
            (Some(x), Some(y)) => Some(x.min(y)),
            (x, y) => x.or(y),
        }
    }
    DecodeLimits {
        max_width: min(a.max_width, b.max_width),
        max_height: min(a.max_height, b.max_height),
        max_alloc: min(a.max_alloc, b.max_alloc),
        max_pages: min(a.max_pages, b.max_pages),
    }
}
