//! The cleaning pipeline and its builder.

use super::persistence::{FittedStep, PipelineSnapshot};
use crate::config::PipelineConfig;
use crate::error::{Result, ResultExt};
use crate::steps::{CleaningStep, Step};
use polars::prelude::*;
use std::path::Path;
use tracing::{Span, info, info_span, warn};

/// An ordered chain of cleaning steps.
///
/// The configured steps are a blueprint. [`Pipeline::fit`] clones each one,
/// fits it on the running frame, and records the fitted copy; the fitted
/// copies are what [`Pipeline::transform`] replays and what
/// [`Pipeline::save`] persists.
///
/// # Example
///
/// ```rust,ignore
/// use cleanit::{Deduplicator, Encoder, Imputer, Pipeline, Scaler};
///
/// let mut pipeline = Pipeline::builder()
///     .step(Deduplicator::on(["id"]))
///     .step(Imputer::default())
///     .step(Encoder::one_hot())
///     .step(Scaler::default())
///     .build()?;
///
/// let clean = pipeline.fit_transform(&train)?;
/// pipeline.save("pipeline.json")?;
/// let clean_test = pipeline.transform(&test)?;
/// ```
#[derive(Debug, Clone)]
pub struct Pipeline {
    steps: Vec<CleaningStep>,
    fitted_steps: Vec<FittedStep>,
    span: Span,
}

static_assertions::assert_impl_all!(Pipeline: Send);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Build an unfitted pipeline from a validated recipe.
    pub fn from_config(config: PipelineConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    /// Build a pipeline that only carries fitted state read from `path`.
    pub fn from_snapshot(path: impl AsRef<Path>) -> Result<Self> {
        let mut pipeline = Self::builder().build()?;
        pipeline.load(path)?;
        Ok(pipeline)
    }

    /// The configured (unfitted) steps.
    pub fn steps(&self) -> &[CleaningStep] {
        &self.steps
    }

    /// The fitted steps, in execution order.
    pub fn fitted_steps(&self) -> &[FittedStep] {
        &self.fitted_steps
    }

    pub fn is_fitted(&self) -> bool {
        !self.fitted_steps.is_empty()
    }

    /// Fit every configured step in order, feeding each step's transformed
    /// output to the next.
    ///
    /// Prior fitted state is discarded first. If a step fails, the fitted
    /// steps recorded before it remain and the error is returned.
    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        let span = self.span.clone();
        let _entered = span.enter();

        self.fitted_steps.clear();
        info!("Fitting pipeline with {} steps", self.steps.len());

        let mut current = df.clone();
        for blueprint in &self.steps {
            let mut step = blueprint.clone();
            let name = step.name();
            info!(step = name, "Fitting step: {}", name);

            step.fit(&current).context(format!("{} fit", name))?;
            current = step
                .transform(&current)
                .context(format!("{} transform", name))?;

            self.fitted_steps.push(FittedStep {
                name: name.to_string(),
                step,
            });
        }

        info!(
            rows = current.height(),
            columns = current.width(),
            "Pipeline fitted"
        );
        Ok(self)
    }

    /// Replay the fitted steps on `df` without refitting.
    ///
    /// An unfitted pipeline returns a copy of the input unchanged.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let _entered = self.span.enter();

        if self.fitted_steps.is_empty() {
            warn!("Pipeline has no fitted steps, returning input unchanged");
            return Ok(df.clone());
        }

        let mut current = df.clone();
        for fitted in &self.fitted_steps {
            info!(step = %fitted.name, "Applying step: {}", fitted.name);
            current = fitted
                .step
                .transform(&current)
                .context(format!("{} transform", fitted.name))?;
        }
        Ok(current)
    }

    /// `fit(df)` followed by `transform(df)`.
    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<DataFrame> {
        self.fit(df)?.transform(df)
    }

    /// Capture the fitted steps as a snapshot.
    pub fn snapshot(&self) -> PipelineSnapshot {
        PipelineSnapshot::new(self.fitted_steps.clone())
    }

    /// Replace the fitted steps wholesale with those of `snapshot`.
    pub fn restore(&mut self, snapshot: PipelineSnapshot) -> &mut Self {
        self.fitted_steps = snapshot.steps;
        self
    }

    /// Persist the fitted steps to `path`. The blueprint is not saved.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.snapshot()
            .write_to(path)
            .context(format!("saving pipeline to {}", path.display()))?;
        info!(
            steps = self.fitted_steps.len(),
            "Saved pipeline to {}",
            path.display()
        );
        Ok(())
    }

    /// Replace the fitted steps with those persisted at `path`.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<&mut Self> {
        let path = path.as_ref();
        let snapshot = PipelineSnapshot::read_from(path)
            .context(format!("loading pipeline from {}", path.display()))?;
        info!(
            steps = snapshot.steps.len(),
            "Loaded pipeline from {}",
            path.display()
        );
        Ok(self.restore(snapshot))
    }
}

/// Builder for creating a [`Pipeline`] instance.
///
/// Steps from a recipe passed to [`PipelineBuilder::config`] come first,
/// followed by steps added with [`PipelineBuilder::step`].
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
    steps: Vec<CleaningStep>,
    span: Option<Span>,
}

static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Start from a recipe.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Append a step.
    pub fn step(mut self, step: impl Into<CleaningStep>) -> Self {
        self.steps.push(step.into());
        self
    }

    /// Append several steps.
    pub fn steps<I, S>(mut self, steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<CleaningStep>,
    {
        self.steps.extend(steps.into_iter().map(Into::into));
        self
    }

    /// Span every fit and transform runs inside. Defaults to `pipeline`.
    pub fn span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Validate every step and build the pipeline.
    pub fn build(self) -> Result<Pipeline> {
        let mut steps: Vec<CleaningStep> = match self.config {
            Some(config) => config.steps.into_iter().map(CleaningStep::from).collect(),
            None => Vec::new(),
        };
        steps.extend(self.steps);

        for step in &steps {
            step.validate().context(format!("{} configuration", step.name()))?;
        }

        Ok(Pipeline {
            steps,
            fitted_steps: Vec::new(),
            span: self.span.unwrap_or_else(|| info_span!("pipeline")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DeduplicatorConfig, ImputerConfig, NumericStrategy, ScalingMethod};
    use crate::error::CleanError;
    use crate::steps::{Deduplicator, Encoder, Imputer, Scaler};
    use std::path::PathBuf;

    fn sample() -> DataFrame {
        df![
            "id" => [1, 1, 2, 3],
            "age" => [Some(20.0), Some(20.0), None, Some(40.0)],
            "city" => [Some("Oslo"), Some("Oslo"), Some("Rome"), None],
        ]
        .unwrap()
    }

    fn full_pipeline() -> Pipeline {
        Pipeline::builder()
            .step(Deduplicator::on(["id"]))
            .step(Imputer::default())
            .step(Encoder::one_hot())
            .step(Scaler::with_method(ScalingMethod::MinMax))
            .build()
            .unwrap()
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("cleanit-{}-{}.json", name, std::process::id()))
    }

    #[test]
    fn test_fit_records_steps_in_order() {
        let mut pipeline = full_pipeline();
        pipeline.fit(&sample()).unwrap();

        let names: Vec<&str> = pipeline
            .fitted_steps()
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, vec!["Deduplicator", "Imputer", "Encoder", "Scaler"]);
        assert!(pipeline.fitted_steps().iter().all(|s| s.step.is_fitted()));
        // Blueprint stays unfitted
        assert!(!pipeline.steps()[1].is_fitted());
    }

    #[test]
    fn test_fit_transform_cleans_frame() {
        let mut pipeline = full_pipeline();

        let out = pipeline.fit_transform(&sample()).unwrap();

        assert_eq!(out.height(), 3);
        assert_eq!(out.column("age").unwrap().null_count(), 0);
        assert!(out.column("city").is_err());
        assert!(out.column("city_Oslo").is_ok());
        assert!(out.column("city_Rome").is_ok());
    }

    #[test]
    fn test_transform_is_idempotent() {
        let mut pipeline = full_pipeline();
        pipeline.fit(&sample()).unwrap();

        let first = pipeline.transform(&sample()).unwrap();
        let second = pipeline.transform(&sample()).unwrap();

        assert!(first.equals_missing(&second));
    }

    #[test]
    fn test_transform_before_fit_returns_input() {
        let pipeline = full_pipeline();
        let df = sample();

        let out = pipeline.transform(&df).unwrap();

        assert!(out.equals_missing(&df));
    }

    #[test]
    fn test_refit_replaces_fitted_steps() {
        let mut pipeline = full_pipeline();
        pipeline.fit(&sample()).unwrap();
        pipeline.fit(&sample()).unwrap();

        assert_eq!(pipeline.fitted_steps().len(), 4);
    }

    #[test]
    fn test_failure_mid_fit_leaves_partial_state() {
        let mut pipeline = Pipeline::builder()
            .step(Imputer::default())
            .step(Deduplicator::on(["missing_col"]))
            .build()
            .unwrap();

        let err = pipeline.fit(&sample()).unwrap_err();

        assert_eq!(err.error_code(), "CONFIGURATION_ERROR");
        assert!(err.to_string().contains("Deduplicator fit"));
        assert_eq!(pipeline.fitted_steps().len(), 1);
    }

    #[test]
    fn test_failure_in_transform_keeps_fitted_state() {
        let mut pipeline = Pipeline::builder()
            .step(Scaler::default())
            .build()
            .unwrap();
        pipeline.fit(&df!["x" => [1.0, 2.0]].unwrap()).unwrap();

        let err = pipeline
            .transform(&df!["x" => ["a", "b"]].unwrap())
            .unwrap_err();

        assert!(matches!(err.root(), CleanError::SchemaMismatch { .. }));
        assert_eq!(pipeline.fitted_steps().len(), 1);
    }

    #[test]
    fn test_build_validates_steps() {
        let result = Pipeline::builder()
            .step(Deduplicator::new(DeduplicatorConfig {
                subset: Some(vec![]),
                ..Default::default()
            }))
            .build();

        assert_eq!(result.unwrap_err().error_code(), "CONFIGURATION_ERROR");
    }

    #[test]
    fn test_from_config_orders_recipe_steps() {
        let pipeline = Pipeline::from_config(PipelineConfig::default()).unwrap();
        let names: Vec<&str> = pipeline.steps().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["Deduplicator", "Imputer", "Encoder", "Scaler"]);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let path = temp_path("roundtrip");
        let mut pipeline = Pipeline::builder()
            .step(Imputer::new(ImputerConfig {
                numeric: NumericStrategy::Mean,
                ..Default::default()
            }))
            .step(Encoder::ordinal())
            .step(Scaler::default())
            .build()
            .unwrap();
        pipeline.fit(&sample()).unwrap();
        pipeline.save(&path).unwrap();

        let restored = Pipeline::from_snapshot(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(restored.fitted_steps(), pipeline.fitted_steps());
        assert!(restored.steps().is_empty());
        let expected = pipeline.transform(&sample()).unwrap();
        let actual = restored.transform(&sample()).unwrap();
        assert!(actual.equals_missing(&expected));
    }

    #[test]
    fn test_load_missing_file() {
        let mut pipeline = full_pipeline();
        let err = pipeline.load(temp_path("does-not-exist")).unwrap_err();
        assert_eq!(err.error_code(), "IO_ERROR");
    }
}
