use crate::config::TunerConfig;
use crate::consts::{COALESCED_PARCELS, DEFAULT_INITIAL_VALUE};
use crate::error::{TunerError, TunerResult};
use crate::history::{self, HistoryRecord};
use crate::metric::MetricSource;
use crate::param::TunableParam;
use crate::profile::ProfileSource;
use crate::registry::TuningRegistry;
use crate::report::{Summary, SummaryReporter};
use crate::request::{EventContext, EventId, TuningRequest, TuningSpec};
use crate::search::{GridSearchEngine, SearchEngine};
use crate::space::ParameterSpace;
use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, RwLock};
use tracing::{error, info, warn};

/// Event the coalescing policy listens on and binds new sessions to.
pub const POLICY_EVENT: EventId = EventId::CUSTOM_EVENT_1;

/// Everything that lives between `init` and `finalize`.
pub struct TuningContext {
    config: TunerConfig,
    space: Arc<ParameterSpace>,
    metrics: MetricSource,
    engine: Arc<dyn SearchEngine>,
    registry: TuningRegistry,
    history: HashMap<String, HistoryRecord>,
}

impl TuningContext {
    pub fn new(
        config: TunerConfig,
        space: ParameterSpace,
        profiles: Arc<dyn ProfileSource>,
        engine: Arc<dyn SearchEngine>,
        history: HashMap<String, HistoryRecord>,
    ) -> Self {
        let metrics = MetricSource::new(profiles, config.verbose);
        Self {
            config,
            space: Arc::new(space),
            metrics,
            engine,
            registry: TuningRegistry::new(),
            history,
        }
    }

    pub fn config(&self) -> &TunerConfig {
        &self.config
    }

    pub fn space(&self) -> &ParameterSpace {
        &self.space
    }

    pub fn registry(&self) -> &TuningRegistry {
        &self.registry
    }

    /// Writes the recommended `coalesced_parcels` for `region` into `slot`,
    /// starting a tuning session the first time the region is seen. Without
    /// a slot nothing is recorded.
    pub fn dispatch(&self, region: &str, slot: Option<&mut i64>) {
        let Some(slot) = slot else {
            return;
        };

        let (request, _) = self
            .registry
            .get_or_create(region, |sequence| self.create_request(region, sequence));

        *slot = request.long_value(COALESCED_PARCELS);
        if self.config.verbose {
            info!("name: {}, coalesced parcels: {}", region, *slot);
        }
    }

    /// Steps every session bound to `event`.
    pub fn advance(&self, event: EventId) {
        self.registry
            .for_each_triggered(event, |request| request.session().advance());
    }

    pub fn summary(&self) -> Summary {
        SummaryReporter::report(&self.registry)
    }

    /// History loaded at init updated with this run's outcomes, sorted by
    /// region. Regions untouched this run keep their records, and a region
    /// that did not converge this run keeps an earlier converged record.
    pub fn merged_history(&self, summary: &Summary) -> Vec<HistoryRecord> {
        let mut merged = self.history.clone();
        for record in summary.to_history() {
            let keep_previous = !record.converged
                && merged
                    .get(&record.region)
                    .is_some_and(|previous| previous.converged);
            if !keep_previous {
                merged.insert(record.region.clone(), record);
            }
        }

        let mut records: Vec<HistoryRecord> = merged.into_values().collect();
        records.sort_by(|a, b| a.region.cmp(&b.region));
        records
    }

    fn initial_value(&self, region: &str) -> i64 {
        match self.history.get(region) {
            Some(record)
                if record.converged
                    && record.parameter == COALESCED_PARCELS
                    && self.space.contains(record.value) =>
            {
                if self.config.verbose {
                    info!("Seeding {} from history: {}", region, record.value);
                }
                record.value
            }
            _ => DEFAULT_INITIAL_VALUE,
        }
    }

    fn create_request(&self, region: &str, sequence: usize) -> TuningRequest {
        if self.config.verbose {
            info!("Starting tuning session for {}", region);
        }

        let spec = TuningSpec {
            name: region.to_string(),
            trigger: POLICY_EVENT,
            metric: self.metrics.for_region(region),
            strategy: self.config.strategy,
            window: self.config.window,
            seed: self.config.seed.map(|s| s.wrapping_add(sequence as u64)),
            params: vec![TunableParam::from_space(
                &self.space,
                self.initial_value(region),
            )],
        };
        TuningRequest::start(spec, self.engine.as_ref(), sequence)
    }
}

/// Process-facing lifecycle around a [`TuningContext`].
pub struct TunerPlugin {
    config: TunerConfig,
    profiles: Arc<dyn ProfileSource>,
    engine: Arc<dyn SearchEngine>,
    context: RwLock<Option<Arc<TuningContext>>>,
    report_sink: Mutex<Box<dyn Write + Send>>,
}

impl TunerPlugin {
    pub fn new(config: TunerConfig, profiles: Arc<dyn ProfileSource>) -> Self {
        Self {
            config,
            profiles,
            engine: Arc::new(GridSearchEngine),
            context: RwLock::new(None),
            report_sink: Mutex::new(Box::new(io::stdout())),
        }
    }

    pub fn with_engine(mut self, engine: Arc<dyn SearchEngine>) -> Self {
        self.engine = engine;
        self
    }

    /// Destination for the summary written at finalize.
    pub fn with_report_sink(mut self, sink: Box<dyn Write + Send>) -> Self {
        self.report_sink = Mutex::new(sink);
        self
    }

    pub fn config(&self) -> &TunerConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.context.read().map(|c| c.is_some()).unwrap_or(false)
    }

    pub fn init(&self) -> TunerResult<()> {
        let mut guard = self
            .context
            .write()
            .map_err(|e| TunerError::Lifecycle(e.to_string()))?;

        if guard.is_some() {
            error!("Unable to start coalesce policy because it is already running.");
            return Err(TunerError::Lifecycle(
                "coalesce policy is already running".to_string(),
            ));
        }

        self.config.validate()?;
        info!("coalesce policy init");
        // Unusable space files fall back to the default with a warning.
        let space = ParameterSpace::resolve(self.config.space_file.as_deref());
        if self.config.verbose {
            info!("{}", space);
        }

        let history = match self.config.history_path() {
            Some(path) => history::load(path).unwrap_or_else(|e| {
                warn!(
                    "Unable to read tuning history {}: {}. Starting fresh.",
                    path.display(),
                    e
                );
                HashMap::new()
            }),
            None => HashMap::new(),
        };

        *guard = Some(Arc::new(TuningContext::new(
            self.config.clone(),
            space,
            Arc::clone(&self.profiles),
            Arc::clone(&self.engine),
            history,
        )));
        Ok(())
    }

    /// The live context, or a lifecycle error outside `init`..`finalize`.
    pub fn context(&self) -> TunerResult<Arc<TuningContext>> {
        let guard = self
            .context
            .read()
            .map_err(|e| TunerError::Lifecycle(e.to_string()))?;
        guard.as_ref().map(Arc::clone).ok_or_else(|| {
            TunerError::Lifecycle("coalesce policy is not running".to_string())
        })
    }

    /// Delivers one trigger firing: the policy event dispatches for the
    /// configured region, then every session bound to `event` advances.
    /// Sessions advance even without a slot, since the firing still marks
    /// a completed unit of work for regions that already exist.
    pub fn handle_event(&self, event: EventId, ctx: EventContext<'_>) -> TunerResult<()> {
        let context = self.context().inspect_err(|_| {
            error!("Event {:?} delivered while coalesce policy is not running.", event);
        })?;

        if event == POLICY_EVENT {
            context.dispatch(&self.config.region, ctx.slot);
        }
        context.advance(event);
        Ok(())
    }

    /// Reports final settings, persists history, and tears down the context.
    pub fn finalize(&self) -> TunerResult<Summary> {
        let context = {
            let mut guard = self
                .context
                .write()
                .map_err(|e| TunerError::Lifecycle(e.to_string()))?;
            guard.take()
        };

        let Some(context) = context else {
            error!("Unable to stop coalesce policy because it is not running.");
            return Err(TunerError::Lifecycle(
                "coalesce policy is not running".to_string(),
            ));
        };

        info!("coalesce policy finalize");
        let summary = context.summary();

        match self.report_sink.lock() {
            Ok(mut sink) => {
                if let Err(e) = writeln!(sink, "{}", summary).and_then(|_| sink.flush()) {
                    warn!("Unable to write tuning summary: {}", e);
                }
            }
            Err(e) => warn!("Unable to write tuning summary: {}", e),
        }

        if let Some(path) = self.config.history_path() {
            if let Err(e) = history::save(path, &context.merged_history(&summary)) {
                warn!("Unable to save tuning history {}: {}", path.display(), e);
            }
        }

        Ok(summary)
    }
}
