//! Transform Compiler
//!
//! Builds one header-rewrite ruleset per domain and phase from the
//! transforms document.

use tracing::debug;

use crate::descriptor::{HeaderOperation, HeaderValue, Phase, Rule, RulesetDescriptor};
use crate::error::CompileError;
use crate::spec::{HeaderModification, TransformDocument};
use crate::zones::ZoneMap;

/// Condition shorthand for a rule that always runs
pub const ALWAYS: &str = "always";

/// Compiles transform documents against resolved zones
pub struct TransformCompiler<'a> {
    zones: &'a ZoneMap,
}

impl<'a> TransformCompiler<'a> {
    pub fn new(zones: &'a ZoneMap) -> Self {
        Self { zones }
    }

    /// Compile every domain in the document.
    ///
    /// A phase with no modifications produces no ruleset.
    pub fn compile(&self, document: &TransformDocument) -> Result<Vec<RulesetDescriptor>, CompileError> {
        let mut rulesets = Vec::new();

        for (domain, transform) in &document.domains {
            let zone_id = self.zones.require(domain)?;

            let phases = [
                (Phase::Request, &transform.request_headers),
                (Phase::Response, &transform.response_headers),
            ];

            for (phase, modifications) in phases {
                let Some(modifications) = modifications.as_ref().filter(|m| !m.is_empty()) else {
                    continue;
                };

                debug!(domain = %domain, phase = %phase, rules = modifications.len(), "Compiled ruleset");

                rulesets.push(RulesetDescriptor {
                    id: format!("ruleset-{}-headers-{}", phase.label(), domain),
                    zone_id: zone_id.to_string(),
                    kind: "zone".to_string(),
                    name: "default".to_string(),
                    phase,
                    rules: modifications.iter().map(header_rule).collect(),
                });
            }
        }

        Ok(rulesets)
    }
}

fn header_rule(modification: &HeaderModification) -> Rule {
    Rule {
        action: "rewrite".to_string(),
        description: modification.description.clone(),
        expression: condition(&modification.when),
        enabled: !modification.disabled,
        headers: header_operations(modification),
    }
}

/// Expand the `always` shorthand into an unconditional expression
pub fn condition(when: &str) -> String {
    if when == ALWAYS {
        "true".to_string()
    } else {
        when.to_string()
    }
}

/// Dynamic sets, then static sets, then removals.
///
/// The provider applies header operations in order, so a removal always wins
/// over a set of the same header within one rule.
pub fn header_operations(modification: &HeaderModification) -> Vec<HeaderOperation> {
    let dynamic = modification.dynamic.iter().map(|d| HeaderOperation::Set {
        name: d.name.clone(),
        value: HeaderValue::Expression(d.expression.clone()),
    });
    let statics = modification.static_headers.iter().map(|s| HeaderOperation::Set {
        name: s.name.clone(),
        value: HeaderValue::Value(s.value.clone()),
    });
    let removes = modification
        .remove
        .iter()
        .map(|name| HeaderOperation::Remove { name: name.clone() });

    dynamic.chain(statics).chain(removes).collect()
}
