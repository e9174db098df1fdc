#![allow(dead_code)]

use coalesce_tuner::config::{Strategy, TunerConfig};
use coalesce_tuner::param::TunableParam;
use coalesce_tuner::request::{EventId, TuningRequest, TuningSpec};
use coalesce_tuner::search::{GridSearchEngine, SearchEngine, TuningSession};
use coalesce_tuner::space::ParameterSpace;
use coalesce_tuner::{ProfileStore, TunerPlugin};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Grid engine that counts how many sessions it has started.
#[derive(Default)]
pub struct CountingEngine {
    pub sessions: AtomicUsize,
}

impl CountingEngine {
    pub fn started(&self) -> usize {
        self.sessions.load(Ordering::SeqCst)
    }
}

impl SearchEngine for CountingEngine {
    fn setup_session(&self, spec: &TuningSpec) -> Box<dyn TuningSession> {
        self.sessions.fetch_add(1, Ordering::SeqCst);
        GridSearchEngine.setup_session(spec)
    }
}

/// Clonable in-memory writer for capturing the finalize report.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub fn test_config(region: &str, strategy: Strategy, window: usize) -> TunerConfig {
    TunerConfig {
        region: region.to_string(),
        strategy,
        window,
        seed: Some(7),
        ..Default::default()
    }
}

pub struct Harness {
    pub plugin: TunerPlugin,
    pub profiles: Arc<ProfileStore>,
    pub engine: Arc<CountingEngine>,
    pub output: SharedBuffer,
}

pub fn harness(config: TunerConfig) -> Harness {
    let profiles = Arc::new(ProfileStore::new());
    let engine = Arc::new(CountingEngine::default());
    let output = SharedBuffer::default();
    let plugin = TunerPlugin::new(config, profiles.clone())
        .with_engine(engine.clone())
        .with_report_sink(Box::new(output.clone()));
    Harness {
        plugin,
        profiles,
        engine,
        output,
    }
}

/// A request over the default space with a constant metric.
pub fn make_request(name: &str, sequence: usize, engine: &dyn SearchEngine) -> TuningRequest {
    make_request_on(name, sequence, engine, EventId::CUSTOM_EVENT_1)
}

pub fn make_request_on(
    name: &str,
    sequence: usize,
    engine: &dyn SearchEngine,
    trigger: EventId,
) -> TuningRequest {
    let spec = TuningSpec {
        name: name.to_string(),
        trigger,
        metric: Arc::new(|| 1.0),
        strategy: Strategy::Exhaustive,
        window: 1,
        seed: Some(1),
        params: vec![TunableParam::from_space(
            &ParameterSpace::default_space(),
            256,
        )],
    };
    TuningRequest::start(spec, engine, sequence)
}

pub fn default_candidates() -> Vec<i64> {
    vec![2, 4, 8, 16, 24, 32, 64, 128, 256, 512, 1024]
}

pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}
