//! Content-based hashing for run IDs.

use sha2::{Digest, Sha256};

use hk_project::SimulationConfig;

/// Run id for `config` executed for `total_ticks` of `dt` by kernel
/// `kernel_version`.
///
/// The config is hashed through `serde_json::Value`, whose object keys are
/// sorted, so two documents differing only in key order share an id.
/// Component declaration order breaks ties in the execution order, so it is
/// hashed separately.
pub fn compute_run_id(
    config: &SimulationConfig,
    total_ticks: u64,
    dt: f64,
    kernel_version: &str,
) -> String {
    let mut hasher = Sha256::new();

    let canonical = serde_json::to_value(config)
        .map(|value| value.to_string())
        .unwrap_or_default();
    hasher.update(canonical.as_bytes());
    for id in config.components.ids() {
        hasher.update(id.as_bytes());
        hasher.update([0u8]);
    }
    hasher.update(total_ticks.to_le_bytes());
    hasher.update(dt.to_bits().to_le_bytes());
    hasher.update(kernel_version.as_bytes());

    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(gain: f64) -> SimulationConfig {
        hk_project::from_json_str(&format!(
            r#"{{
                "simulationParams": {{"totalTime": 3.0, "dt": 1.0}},
                "components": {{
                    "A": {{"type": "constant", "properties": {{"value": 5.0}}}},
                    "B": {{"type": "gain", "properties": {{"gain": {gain}}}}}
                }},
                "connections": [{{"source": "A.output", "target": "B.input"}}]
            }}"#
        ))
        .unwrap()
    }

    #[test]
    fn hash_stability() {
        let a = compute_run_id(&config(2.0), 3, 1.0, "v1");
        let b = compute_run_id(&config(2.0), 3, 1.0, "v1");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn hash_differs_for_different_inputs() {
        let base = compute_run_id(&config(2.0), 3, 1.0, "v1");
        assert_ne!(base, compute_run_id(&config(3.0), 3, 1.0, "v1"));
        assert_ne!(base, compute_run_id(&config(2.0), 4, 1.0, "v1"));
        assert_ne!(base, compute_run_id(&config(2.0), 3, 0.5, "v1"));
        assert_ne!(base, compute_run_id(&config(2.0), 3, 1.0, "v2"));
    }

    #[test]
    fn property_key_order_does_not_matter() {
        let one = hk_project::from_json_str(
            r#"{"simulationParams": {"dt": 1.0, "totalTime": 2.0},
                "components": {"S": {"type": "series", "properties": {"values": [1.0], "hold": true}}}}"#,
        )
        .unwrap();
        let two = hk_project::from_json_str(
            r#"{"components": {"S": {"properties": {"hold": true, "values": [1.0]}, "type": "series"}},
                "simulationParams": {"totalTime": 2.0, "dt": 1.0}}"#,
        )
        .unwrap();
        assert_eq!(
            compute_run_id(&one, 2, 1.0, "v1"),
            compute_run_id(&two, 2, 1.0, "v1")
        );
    }
}
