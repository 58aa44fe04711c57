use crate::settings::{LoggingConfig, RedactionConfig};
use regex::Regex;
use std::io;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer};

/// Masks applied when `use_default_pii` is on.
const DEFAULT_PII: [(&str, &str, &str); 3] = [
    (
        "email",
        r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}",
        "[EMAIL]",
    ),
    ("api_key", r"\b(?:sk|pk|rk)-[A-Za-z0-9_-]{8,}", "[API_KEY]"),
    ("bearer", r"(?i)bearer\s+[A-Za-z0-9._~+/-]+=*", "Bearer [REDACTED]"),
];

struct RedactingWriter<W> {
    inner: W,
    patterns: Vec<(Regex, String)>,
}

impl<W: io::Write> io::Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let s = String::from_utf8_lossy(buf);
        let redacted = redact(&s, &self.patterns);
        self.inner.write_all(redacted.as_bytes())?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

struct RedactingMakeWriter {
    patterns: Vec<(Regex, String)>,
}

impl<'a> fmt::MakeWriter<'a> for RedactingMakeWriter {
    type Writer = RedactingWriter<io::Stderr>;

    fn make_writer(&self) -> Self::Writer {
        RedactingWriter {
            inner: io::stderr(),
            patterns: self.patterns.clone(),
        }
    }
}

fn redact(line: &str, patterns: &[(Regex, String)]) -> String {
    let mut redacted = line.to_string();
    for (re, replacement) in patterns {
        redacted = re.replace_all(&redacted, replacement.as_str()).into_owned();
    }
    redacted
}

/// Compile the configured masks. Invalid user patterns are reported and skipped.
fn redaction_patterns(config: &RedactionConfig) -> Vec<(Regex, String)> {
    let mut patterns = Vec::new();
    if !config.enabled {
        return patterns;
    }
    if config.use_default_pii {
        for (_, regex, placeholder) in DEFAULT_PII {
            if let Ok(re) = Regex::new(regex) {
                patterns.push((re, placeholder.to_string()));
            }
        }
    }
    for p in &config.patterns {
        match Regex::new(&p.regex) {
            Ok(re) => patterns.push((re, p.placeholder.clone())),
            Err(e) => eprintln!("warning: skipping redaction pattern '{}': {}", p.name, e),
        }
    }
    patterns
}

/// Most verbose level enabled in config; `verbose` forces debug.
fn level_directive(config: &LoggingConfig) -> &'static str {
    let levels = &config.levels;
    if config.verbose || levels.debug {
        "debug"
    } else if levels.info {
        "info"
    } else if levels.warning {
        "warn"
    } else if levels.error || levels.critical {
        "error"
    } else {
        "off"
    }
}

pub fn init_logging(config: &LoggingConfig) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_directive(config)));

    let show_file = config.format.show_file;
    let show_line = config.format.show_line;
    let make_writer = RedactingMakeWriter {
        patterns: redaction_patterns(&config.redaction),
    };

    // Use Layer::boxed() to unify the types of the branches
    let fmt_layer = match (config.json, config.format.show_time) {
        (true, _) => fmt::layer()
            .json()
            .with_writer(make_writer)
            .with_file(show_file)
            .with_line_number(show_line)
            .boxed(),
        (false, false) => fmt::layer()
            .with_writer(make_writer)
            .with_target(show_file)
            .with_file(show_file)
            .with_line_number(show_line)
            .without_time()
            .boxed(),
        (false, true) => fmt::layer()
            .with_writer(make_writer)
            .with_target(show_file)
            .with_file(show_file)
            .with_line_number(show_line)
            .boxed(),
    };

    // A second init (e.g. in tests) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
