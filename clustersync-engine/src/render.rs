//! Deterministic rendering of target file content.
//!
//! Idempotence rests on this module: the same desired state must always
//! render byte-identical output, so "has anything changed" can be an exact
//! byte comparison rather than a field-by-field merge.

use serde::Serialize;

use crate::error::EngineError;

/// Fixed connection parameters for a worker inventory line.
const CONNECTION_PARAMS: &str =
    "ansible_connection=ssh ansible_python_interpreter=/usr/bin/python3 ansible_user=ubuntu";

/// One `[workers]` connection line.
pub fn worker_line(ip: &str) -> String {
    format!("{ip} {CONNECTION_PARAMS}")
}

/// Replace the body of `[section]` in a line-oriented inventory wholesale.
///
/// All other sections pass through untouched. A missing section (or a missing
/// file, passed as empty content) gets the header appended at the end.
/// Wholesale replacement guarantees no duplicate or stale lines can
/// accumulate from prior partial runs.
pub fn replace_section(current: &str, section: &str, lines: &[String]) -> String {
    let header = format!("[{section}]");
    let mut out = String::new();
    let mut found = false;
    let mut skipping = false;

    for line in current.lines() {
        let trimmed = line.trim();
        if trimmed == header {
            skipping = true;
            // A duplicate header from a corrupted earlier run collapses into
            // the one section emitted here.
            if !found {
                found = true;
                push_line(&mut out, &header);
                for l in lines {
                    push_line(&mut out, l);
                }
            }
            continue;
        }
        if skipping {
            if trimmed.starts_with('[') {
                skipping = false;
            } else {
                continue;
            }
        }
        push_line(&mut out, line);
    }

    if !found {
        if !out.is_empty() && !out.ends_with("\n\n") {
            out.push('\n');
        }
        push_line(&mut out, &header);
        for l in lines {
            push_line(&mut out, l);
        }
    }
    out
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push('\n');
}

/// Render a desired variables document to YAML.
pub fn yaml_doc<T: Serialize>(value: &T) -> Result<String, EngineError> {
    Ok(serde_yaml::to_string(value)?)
}

/// Legacy per-host document for workers that only declare a volume list.
pub fn volumes_doc(volumes: &serde_json::Value) -> Result<String, EngineError> {
    let doc = serde_json::json!({ "volumes": volumes });
    yaml_doc(&doc)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
