use crate::config::{FileSink, LoggingConfig};
use std::{
    io::{IsTerminal, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use tracing::level_filters::LevelFilter;
use tracing::Level;
use tracing_subscriber::{filter::Targets, fmt, EnvFilter, Layer, Registry};

use file_rotate::{
    compression::Compression,
    suffix::{AppendTimestamp, FileLimit},
    ContentLimit, FileRotate,
};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

// -------- level helpers --------
fn parse_tracing_level(s: &str) -> Option<Level> {
    match s.to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        "off" | "none" => None,
        _ => Some(Level::INFO),
    }
}

fn level_filter(s: &str) -> LevelFilter {
    parse_tracing_level(s).map_or(LevelFilter::OFF, LevelFilter::from_level)
}

/// `default` applies to every target not listed in `overrides`.
fn build_targets<'a>(
    default: &str,
    overrides: impl IntoIterator<Item = (&'a String, &'a String)>,
) -> Targets {
    overrides
        .into_iter()
        .fold(Targets::new().with_default(level_filter(default)), |t, (target, level)| {
            t.with_target(target.clone(), level_filter(level))
        })
}

// -------- rotating writer for files --------
#[derive(Clone)]
struct RotWriter(Arc<Mutex<FileRotate<AppendTimestamp>>>);

impl<'a> fmt::MakeWriter<'a> for RotWriter {
    type Writer = RotWriterHandle;
    fn make_writer(&'a self) -> Self::Writer {
        RotWriterHandle(self.0.clone())
    }
}

struct RotWriterHandle(Arc<Mutex<FileRotate<AppendTimestamp>>>);

impl Write for RotWriterHandle {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| std::io::Error::other("log file lock poisoned"))?
            .write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.0
            .lock()
            .map_err(|_| std::io::Error::other("log file lock poisoned"))?
            .flush()
    }
}

/// Resolve a log file path against `base_dir`.
/// Absolute paths are kept as-is; relative paths are joined with `base_dir`.
fn resolve_log_path(file: &str, base_dir: &Path) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

/// Create a rotating writer, making sure the parent directory exists.
fn create_rotating_writer(sink: &FileSink, base_dir: &Path) -> std::io::Result<RotWriter> {
    let log_path = resolve_log_path(&sink.path, base_dir);
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let max_bytes = sink.max_size_mb.unwrap_or(100).saturating_mul(1024 * 1024);
    let files = match sink.max_backups {
        Some(n) => FileLimit::MaxFiles(n),
        None => FileLimit::Age(chrono::Duration::days(7)),
    };
    let rot = FileRotate::new(
        log_path,
        AppendTimestamp::default(files),
        ContentLimit::BytesSurpassed(usize::try_from(max_bytes).unwrap_or(usize::MAX)),
        Compression::None,
        #[cfg(unix)]
        None,
    );

    Ok(RotWriter(Arc::new(Mutex::new(rot))))
}

// -------- layers --------

/// `RUST_LOG`, when set and valid, replaces the configured console levels.
fn console_layer(cfg: &LoggingConfig) -> BoxedLayer {
    let ansi = std::io::stdout().is_terminal() && !cfg.json;
    let layer = fmt::layer()
        .with_ansi(ansi)
        .with_target(true)
        .with_level(true)
        .with_timer(fmt::time::UtcTime::rfc_3339());

    let env = std::env::var("RUST_LOG")
        .ok()
        .and_then(|v| EnvFilter::try_new(v).ok());

    match (cfg.json, env) {
        (true, Some(env)) => layer.json().with_filter(env).boxed(),
        (true, None) => layer
            .json()
            .with_filter(build_targets(&cfg.level, &cfg.targets))
            .boxed(),
        (false, Some(env)) => layer.with_filter(env).boxed(),
        (false, None) => layer
            .with_filter(build_targets(&cfg.level, &cfg.targets))
            .boxed(),
    }
}

fn file_layer(sink: &FileSink, cfg: &LoggingConfig, base_dir: &Path) -> Option<BoxedLayer> {
    match create_rotating_writer(sink, base_dir) {
        Ok(writer) => Some(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_target(true)
                .with_level(true)
                .with_timer(fmt::time::UtcTime::rfc_3339())
                .with_writer(writer)
                .with_filter(build_targets(&sink.level, &cfg.targets))
                .boxed(),
        ),
        Err(e) => {
            eprintln!("Failed to initialize log file '{}': {e}", sink.path);
            None
        }
    }
}

// -------- public init --------

/// Initialize logging from a configuration.
/// - `cfg`: console levels, optional JSON output and optional log file
/// - `base_dir`: base directory used to resolve a relative log file path
///
/// Installing a second subscriber is a no-op, so calling this twice is safe.
pub fn init_logging(cfg: &LoggingConfig, base_dir: &Path) {
    use tracing_subscriber::prelude::*;

    // Bridge `log` → `tracing` *before* installing the subscriber
    let _ = tracing_log::LogTracer::init();

    let mut layers = vec![console_layer(cfg)];
    if let Some(sink) = &cfg.file {
        layers.extend(file_layer(sink, cfg, base_dir));
    }

    let _ = Registry::default().with(layers).try_init();
}

// =================== tests ===================
