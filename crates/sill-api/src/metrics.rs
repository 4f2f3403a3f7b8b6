//! Prometheus metrics served on `/metrics`
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

pub struct ApiMetrics {
    registry: Registry,
    /// Catalog queries answered, by endpoint
    pub catalog_queries: IntCounterVec,
    /// Requests naming a software that is not in the catalog
    pub software_not_found: IntCounter,
}

impl ApiMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let catalog_queries = IntCounterVec::new(
            Opts::new("sill_catalog_queries_total", "Catalog queries answered"),
            &["endpoint"],
        )?;
        let software_not_found = IntCounter::new(
            "sill_software_not_found_total",
            "Lookups of a software absent from the catalog",
        )?;
        registry.register(Box::new(catalog_queries.clone()))?;
        registry.register(Box::new(software_not_found.clone()))?;
        Ok(Self {
            registry,
            catalog_queries,
            software_not_found,
        })
    }

    pub fn record_query(&self, endpoint: &str) {
        self.catalog_queries.with_label_values(&[endpoint]).inc();
    }

    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_counts() {
        let metrics = ApiMetrics::new().unwrap();
        metrics.record_query("softwares");
        metrics.record_query("softwares");
        metrics.software_not_found.inc();
        let text = metrics.encode().unwrap();
        assert!(text.contains("sill_catalog_queries_total{endpoint=\"softwares\"} 2"));
        assert!(text.contains("sill_software_not_found_total 1"));
    }
}
