//! Runs one document through one job on the shared worker pool.

use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use crate::config::ServiceConfig;
use crate::context::{Context, ContextConfiguration};
use crate::corpus::Corpus;
use crate::pipeline::{new_processor, JobParams, ProcessorKind};
use crate::pool::{JobOutcome, PooledJob, WorkerPool};

use super::merge::{merge_configuration, MergedConfiguration};
use super::sinks::OutputSinks;
use super::{BatchError, BatchRequest};

/// Single-use executor: one document, one run, one corpus.
///
/// ```ignore
/// let mut executor = BatchExecutor::new(service, pool, request);
/// executor.run(ProcessorKind::Dictionary, &context).await?;
/// let text = executor.annotated_text();
/// ```
pub struct BatchExecutor {
    service: Arc<ServiceConfig>,
    pool: Arc<dyn WorkerPool>,
    request: BatchRequest,
    interrupt: CancellationToken,
    corpus: Arc<Mutex<Corpus>>,
    configuration: Option<Arc<ContextConfiguration>>,
    annotated_text: Option<String>,
    has_run: bool,
}

impl BatchExecutor {
    pub fn new(
        service: Arc<ServiceConfig>,
        pool: Arc<dyn WorkerPool>,
        request: BatchRequest,
    ) -> Self {
        Self {
            service,
            pool,
            request,
            interrupt: CancellationToken::new(),
            corpus: Arc::new(Mutex::new(Corpus::default())),
            configuration: None,
            annotated_text: None,
            has_run: false,
        }
    }

    /// Abort the wait (not the job) when `token` is cancelled.
    pub fn with_interrupt(mut self, token: CancellationToken) -> Self {
        self.interrupt = token;
        self
    }

    /// Process the document and wait for the job to finish.
    ///
    /// Every format declared by the merged configuration is written; only
    /// the requested one is kept. Runs at most once per executor.
    pub async fn run(&mut self, kind: ProcessorKind, context: &Context) -> Result<(), BatchError> {
        if self.has_run {
            return Err(BatchError::AlreadyRun);
        }
        self.has_run = true;

        let MergedConfiguration {
            configuration,
            options,
        } = merge_configuration(&self.service, &self.request, context.configuration())?;
        self.configuration = Some(configuration.clone());

        let sinks = OutputSinks::allocate(configuration.output_formats());
        let params = JobParams {
            config: configuration,
            input: Box::new(Cursor::new(self.request.text.clone().into_bytes())),
            sinks: sinks.ordered().to_vec(),
            service: self.service.clone(),
            dictionaries: context.dictionaries().clone(),
            corpus: self.corpus.clone(),
            groups: self.request.groups.clone().unwrap_or_default(),
            filter_groups: self.request.is_filtering_groups(),
        };

        let job = new_processor(kind, params, options.xml_tags).map_err(|e| {
            tracing::error!("There was a problem creating the {} processor: {}", kind, e);
            BatchError::Construction(e)
        })?;

        tracing::info!("Started processing a new document ({})", job.label());
        let started = Instant::now();

        let (job, completion) = PooledJob::new(job);
        self.pool.submit(job)?;

        let outcome = tokio::select! {
            biased;
            _ = self.interrupt.cancelled() => {
                tracing::warn!("Interrupted after {:?}; the job keeps running", started.elapsed());
                return Err(BatchError::Interrupted);
            }
            outcome = completion.wait() => outcome,
        };
        tracing::info!("Processed document in {:?}", started.elapsed());

        match outcome {
            Some(JobOutcome::Completed) => {}
            Some(JobOutcome::Failed(message)) => return Err(BatchError::Processing(message)),
            None => return Err(BatchError::Signal),
        }

        if let Some(format) = self.request.output_format {
            let sink = sinks.get(format).ok_or(BatchError::MissingSink(format))?;
            self.annotated_text = Some(sink.to_text());
        }
        Ok(())
    }

    /// Output in the requested format. `None` in annotate mode or before a
    /// successful run.
    pub fn annotated_text(&self) -> Option<&str> {
        self.annotated_text.as_deref()
    }

    /// The single corpus this executor produced.
    pub fn processed_corpora(&self) -> Vec<Corpus> {
        let corpus = match self.corpus.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        vec![corpus]
    }

    /// Configuration the run used, once merged.
    pub fn effective_configuration(&self) -> Option<Arc<ContextConfiguration>> {
        self.configuration.clone()
    }

    pub fn is_filtering_groups(&self) -> bool {
        self.request.is_filtering_groups()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{InputFormat, OutputFormat};
    use crate::dictionary::{Dictionaries, Dictionary};
    use crate::pool::{PoolError, TokioWorkerPool};
    use std::collections::HashMap;

    struct DiscardingPool;

    impl WorkerPool for DiscardingPool {
        fn submit(&self, job: PooledJob) -> Result<(), PoolError> {
            drop(job);
            Ok(())
        }
    }

    fn context(formats: Vec<OutputFormat>) -> Context {
        let mut genes = Dictionary::new("genes");
        genes.insert("U:C1:T028:PRGE", "BRCA1");
        genes.insert("U:C2:T047:DISO", "breast cancer");
        Context::new(
            ContextConfiguration::builder()
                .with_output_formats(formats)
                .build(),
            Dictionaries {
                exact: vec![genes],
                regex: vec![],
            },
        )
    }

    fn executor(pool: Arc<dyn WorkerPool>, request: BatchRequest) -> BatchExecutor {
        BatchExecutor::new(Arc::new(ServiceConfig::default()), pool, request)
    }

    #[tokio::test]
    async fn test_group_filter_limits_corpus() {
        let pool = Arc::new(TokioWorkerPool::new(1).unwrap());
        let request = BatchRequest::new("BRCA1 and breast cancer.")
            .with_groups(HashMap::from([("DISO".to_string(), true)]));
        let mut executor = executor(pool, request);
        assert!(executor.is_filtering_groups());

        executor
            .run(ProcessorKind::Dictionary, &context(vec![OutputFormat::Json]))
            .await
            .unwrap();

        let corpora = executor.processed_corpora();
        let texts: Vec<&str> = corpora[0].annotations().map(|a| a.text.as_str()).collect();
        assert_eq!(texts, vec!["breast cancer"]);
    }

    #[tokio::test]
    async fn test_dropped_job_is_a_signal_error() {
        let mut executor = executor(Arc::new(DiscardingPool), BatchRequest::new("BRCA1"));
        let err = executor
            .run(ProcessorKind::Dictionary, &context(vec![OutputFormat::Json]))
            .await
            .unwrap_err();
        assert!(matches!(err, BatchError::Signal));
    }

    #[tokio::test]
    async fn test_effective_configuration_follows_request() {
        let pool = Arc::new(TokioWorkerPool::new(1).unwrap());
        let request = BatchRequest::new("<p>BRCA1</p>").with_input_format(InputFormat::Xml);
        let context = context(vec![OutputFormat::Pipe]);
        let mut executor = executor(pool, request);
        assert!(executor.effective_configuration().is_none());

        executor.run(ProcessorKind::Dictionary, &context).await.unwrap();

        let config = executor.effective_configuration().unwrap();
        assert_eq!(config.input_format(), InputFormat::Xml);
        assert_eq!(context.configuration().input_format(), InputFormat::Raw);
        assert_eq!(executor.processed_corpora()[0].text, "BRCA1");
    }

    #[tokio::test]
    async fn test_invalid_extra_parameter_fails_before_submission() {
        let mut executor = executor(
            Arc::new(DiscardingPool),
            BatchRequest::new("x").with_extra_parameter("xmltags", ","),
        );
        let err = executor
            .run(ProcessorKind::Dictionary, &context(vec![OutputFormat::Json]))
            .await
            .unwrap_err();
        assert!(matches!(err, BatchError::Configuration(_)));
    }
}
