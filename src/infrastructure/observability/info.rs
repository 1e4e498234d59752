//! Info records: descriptive key/value metadata exposed as a gauge fixed at 1
//! with the payload rendered as labels.

use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{GaugeVec, Opts};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

struct InfoInner {
    vec: GaugeVec,
    // Serialises replace() against collect() so a scrape never sees the
    // record between the reset and the new payload.
    lock: Mutex<()>,
}

/// Single-valued info record whose payload is replaced wholesale on update
#[derive(Clone)]
pub struct InfoRecord {
    inner: Arc<InfoInner>,
}

impl InfoRecord {
    pub fn new(opts: Opts, keys: &[&str]) -> prometheus::Result<Self> {
        Ok(Self {
            inner: Arc::new(InfoInner {
                vec: GaugeVec::new(opts, keys)?,
                lock: Mutex::new(()),
            }),
        })
    }

    pub fn replace(&self, fields: &HashMap<&str, &str>) -> prometheus::Result<()> {
        let _guard = self
            .inner
            .lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.inner.vec.reset();
        self.inner.vec.get_metric_with(fields)?.set(1.0);
        Ok(())
    }
}

impl Collector for InfoRecord {
    fn desc(&self) -> Vec<&Desc> {
        self.inner.vec.desc()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let _guard = self
            .inner
            .lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.inner.vec.collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::{Registry, TextEncoder};
    use std::sync::atomic::{AtomicBool, Ordering};

    fn render(registry: &Registry) -> String {
        TextEncoder::new()
            .encode_to_string(&registry.gather())
            .expect("encode")
    }

    #[test]
    fn test_replace_drops_previous_payload() {
        let registry = Registry::new();
        let info = InfoRecord::new(Opts::new("software_version_info", "Version"), &["version"])
            .expect("info");
        registry.register(Box::new(info.clone())).expect("register");

        info.replace(&HashMap::from([("version", "1.0.0")]))
            .expect("replace");
        info.replace(&HashMap::from([("version", "1.1.0")]))
            .expect("replace");

        let output = render(&registry);
        assert!(output.contains("software_version_info{version=\"1.1.0\"} 1"));
        assert!(!output.contains("1.0.0"));
    }

    #[test]
    fn test_concurrent_scrapes_see_exactly_one_payload() {
        let registry = Registry::new();
        let info = InfoRecord::new(Opts::new("software_version_info", "Version"), &["version"])
            .expect("info");
        registry.register(Box::new(info.clone())).expect("register");
        info.replace(&HashMap::from([("version", "v0")]))
            .expect("replace");

        let done = AtomicBool::new(false);
        let scrapes = std::thread::scope(|s| {
            s.spawn(|| {
                for i in 1..5_000 {
                    let version = format!("v{}", i);
                    info.replace(&HashMap::from([("version", version.as_str())]))
                        .expect("replace");
                }
                done.store(true, Ordering::Release);
            });

            let mut scrapes = 0;
            while !done.load(Ordering::Acquire) || scrapes == 0 {
                let output = render(&registry);
                let series = output
                    .lines()
                    .filter(|l| l.starts_with("software_version_info{"))
                    .count();
                assert_eq!(series, 1, "torn scrape:\n{}", output);
                scrapes += 1;
            }
            scrapes
        });

        assert!(scrapes > 0);
        assert!(render(&registry).contains("software_version_info{version=\"v4999\"} 1"));
    }
}
