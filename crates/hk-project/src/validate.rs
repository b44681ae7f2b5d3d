//! Structural validation of a simulation configuration.
//!
//! Checks what can be decided from the document alone. Type tags, property
//! contents and port names are checked later, when the topology is built
//! against a component registry.

use std::collections::HashSet;

use hk_core::{AgentId, AttrRef};

use crate::schema::SimulationConfig;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

fn invalid(field: impl Into<String>, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

pub fn validate_config(config: &SimulationConfig) -> Result<(), ValidationError> {
    let params = &config.simulation_params;
    if !params.dt.is_finite() || params.dt <= 0.0 {
        return Err(invalid("simulationParams.dt", params.dt, "must be positive and finite"));
    }
    if !params.total_time.is_finite() || params.total_time < 0.0 {
        return Err(invalid(
            "simulationParams.totalTime",
            params.total_time,
            "must be non-negative and finite",
        ));
    }

    for (id, def) in config.components.iter() {
        if let Err(err) = AgentId::new(id).validate() {
            return Err(invalid("components", id, &err.to_string()));
        }
        if def.type_tag.trim().is_empty() {
            return Err(invalid(format!("components.{id}.type"), "", "must not be empty"));
        }
        if let Some(dataset) = def.properties.get("dataset") {
            let name = dataset
                .as_str()
                .ok_or_else(|| invalid(format!("components.{id}.dataset"), dataset, "must be a string"))?;
            if !config.datasets.contains_key(name) {
                return Err(ValidationError::MissingReference {
                    id: name.to_string(),
                    context: format!("datasets (component '{id}')"),
                });
            }
        }
    }

    for (idx, conn) in config.connections.iter().enumerate() {
        for (field, reference) in [("source", &conn.source), ("target", &conn.target)] {
            let attr = parse_ref(&format!("connections[{idx}].{field}"), reference)?;
            require_component(config, &attr, &format!("connections[{idx}].{field}"))?;
        }
    }

    if let Some(order) = &config.execution_order {
        let mut seen = HashSet::new();
        for entry in order {
            if entry.ids().is_empty() {
                return Err(invalid("executionOrder", "[]", "stage groups must not be empty"));
            }
            for id in entry.ids() {
                if !config.components.contains(id) {
                    return Err(ValidationError::MissingReference {
                        id: id.clone(),
                        context: "executionOrder".to_string(),
                    });
                }
                if !seen.insert(id.as_str()) {
                    return Err(ValidationError::DuplicateId {
                        id: id.clone(),
                        context: "executionOrder".to_string(),
                    });
                }
            }
        }
    }

    if config.logger_config.record_every == 0 {
        return Err(invalid("loggerConfig.recordEvery", 0, "must be at least 1"));
    }

    for (idx, event) in config.events.iter().enumerate() {
        let field = format!("events[{idx}]");
        if !event.time.is_finite() || event.time < 0.0 {
            return Err(invalid(format!("{field}.time"), event.time, "must be non-negative and finite"));
        }
        if !event.value.is_finite() {
            return Err(invalid(format!("{field}.value"), event.value, "must be finite"));
        }
        let attr = parse_ref(&format!("{field}.target"), &event.target)?;
        require_component(config, &attr, &format!("{field}.target"))?;
    }

    for (name, values) in &config.datasets {
        if values.is_empty() {
            return Err(invalid(format!("datasets.{name}"), "[]", "must not be empty"));
        }
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(invalid(format!("datasets.{name}"), bad, "values must be finite"));
        }
    }

    if let Some(dispatch) = &config.dispatch
        && let Some(timeout) = dispatch.decision_timeout
        && (!timeout.is_finite() || timeout <= 0.0)
    {
        return Err(invalid("dispatch.decisionTimeout", timeout, "must be positive and finite"));
    }

    Ok(())
}

fn parse_ref(field: &str, reference: &str) -> Result<AttrRef, ValidationError> {
    AttrRef::parse(reference).map_err(|err| invalid(field, reference, &err.to_string()))
}

fn require_component(
    config: &SimulationConfig,
    attr: &AttrRef,
    context: &str,
) -> Result<(), ValidationError> {
    if config.components.contains(attr.agent.as_str()) {
        Ok(())
    } else {
        Err(ValidationError::MissingReference {
            id: attr.agent.to_string(),
            context: context.to_string(),
        })
    }
}
